pub mod audio;
pub mod input;
pub mod particles;
pub mod time;

pub use audio::{AudioEngine, AudioSink, MemorySink, NullSink, PlaybackEvent, SoundBank};
pub use input::{ControlMask, GamepadAxis, GamepadButton, InputEvent, InputRouter, Intent, Key};
pub use particles::{Emitter, EmitterKind, Particle, ParticleSystem, Rgb};
pub use time::TimeState;

#[cfg(feature = "kira")]
pub use audio::KiraSink;
