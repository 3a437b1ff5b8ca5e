//! Procedural sound effects and music loops.
//!
//! Every sound is synthesized from primitive waveforms into an f32 mono buffer
//! once, when the [`SoundBank`] is built. Playback goes through an
//! [`AudioSink`], so the engine runs the same way with real output, headless,
//! or under test.

use std::cell::RefCell;
use std::collections::HashMap;
use std::f32::consts::TAU;
use std::rc::Rc;
use std::sync::Arc;

pub const SAMPLE_RATE: u32 = 22_050;
pub const DEFAULT_TONE: &str = "default-tone";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// One sample at `phase` in cycles (only the fractional part matters).
    pub fn sample(self, phase: f32) -> f32 {
        let t = phase.fract();
        match self {
            Waveform::Sine => (t * TAU).sin(),
            Waveform::Square => {
                if t < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * t - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (t - 0.5).abs(),
        }
    }
}

/// Linear attack/release, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack: f32,
    pub release: f32,
}

impl Envelope {
    pub const PLUCK: Envelope = Envelope {
        attack: 0.005,
        release: 0.08,
    };

    fn gain(&self, t: f32, duration: f32) -> f32 {
        let attack = if self.attack > 0.0 {
            (t / self.attack).min(1.0)
        } else {
            1.0
        };
        let remaining = duration - t;
        let release = if self.release > 0.0 {
            (remaining / self.release).clamp(0.0, 1.0)
        } else {
            1.0
        };
        attack.min(release)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SoundRecipe {
    /// Single tone, optionally sliding linearly to `end_freq`.
    Tone {
        wave: Waveform,
        freq: f32,
        end_freq: Option<f32>,
        duration: f32,
    },
    /// Several frequencies mixed for the whole duration.
    Chord {
        wave: Waveform,
        freqs: Vec<f32>,
        duration: f32,
    },
    /// Notes played back to back as `(freq, seconds)`; a zero frequency rests.
    Melody {
        wave: Waveform,
        notes: Vec<(f32, f32)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundDef {
    pub recipe: SoundRecipe,
    pub envelope: Envelope,
    pub volume: f32,
    pub looping: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundBuffer {
    pub samples: Arc<[f32]>,
    pub sample_rate: u32,
    pub looping: bool,
}

impl SoundBuffer {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }
}

fn tone_into(
    out: &mut Vec<f32>,
    wave: Waveform,
    freqs: &[(f32, f32)],
    duration: f32,
    envelope: Envelope,
    volume: f32,
) {
    // `freqs` holds (start, end) pairs mixed together.
    let count = (duration * SAMPLE_RATE as f32).round().max(0.0) as usize;
    let mut phases = vec![0.0f32; freqs.len()];
    let norm = if freqs.is_empty() {
        0.0
    } else {
        volume / freqs.len() as f32
    };
    for i in 0..count {
        let t = i as f32 / SAMPLE_RATE as f32;
        let progress = if duration > 0.0 { t / duration } else { 0.0 };
        let mut mix = 0.0;
        for (phase, (start, end)) in phases.iter_mut().zip(freqs) {
            if *start <= 0.0 {
                continue;
            }
            mix += wave.sample(*phase);
            let freq = start + (end - start) * progress;
            *phase = (*phase + freq / SAMPLE_RATE as f32).fract();
        }
        out.push(mix * norm * envelope.gain(t, duration));
    }
}

pub fn render(def: &SoundDef) -> SoundBuffer {
    let mut samples = Vec::new();
    let volume = def.volume.clamp(0.0, 1.0);
    match &def.recipe {
        SoundRecipe::Tone {
            wave,
            freq,
            end_freq,
            duration,
        } => {
            let end = end_freq.unwrap_or(*freq);
            tone_into(&mut samples, *wave, &[(*freq, end)], *duration, def.envelope, volume);
        }
        SoundRecipe::Chord {
            wave,
            freqs,
            duration,
        } => {
            let pairs: Vec<(f32, f32)> = freqs.iter().map(|f| (*f, *f)).collect();
            tone_into(&mut samples, *wave, &pairs, *duration, def.envelope, volume);
        }
        SoundRecipe::Melody { wave, notes } => {
            for (freq, secs) in notes {
                tone_into(&mut samples, *wave, &[(*freq, *freq)], *secs, def.envelope, volume);
            }
        }
    }
    SoundBuffer {
        samples: samples.into(),
        sample_rate: SAMPLE_RATE,
        looping: def.looping,
    }
}

fn tone(wave: Waveform, freq: f32, end_freq: Option<f32>, duration: f32) -> SoundDef {
    SoundDef {
        recipe: SoundRecipe::Tone {
            wave,
            freq,
            end_freq,
            duration,
        },
        envelope: Envelope::PLUCK,
        volume: 0.5,
        looping: false,
    }
}

fn melody(wave: Waveform, notes: &[(f32, f32)], volume: f32, looping: bool) -> SoundDef {
    SoundDef {
        recipe: SoundRecipe::Melody {
            wave,
            notes: notes.to_vec(),
        },
        envelope: Envelope {
            attack: 0.01,
            release: 0.05,
        },
        volume,
        looping,
    }
}

// Note frequencies (Hz).
const C4: f32 = 261.63;
const D4: f32 = 293.66;
const E4: f32 = 329.63;
const F4: f32 = 349.23;
const G4: f32 = 392.00;
const A4: f32 = 440.00;
const B4: f32 = 493.88;
const C5: f32 = 523.25;
const E5: f32 = 659.25;
const G5: f32 = 783.99;
const C6: f32 = 1046.50;
const REST: f32 = 0.0;

/// The sound ids every theme refers to, with their recipes.
pub fn builtin_sounds() -> Vec<(&'static str, SoundDef)> {
    let q = 0.22;
    vec![
        (DEFAULT_TONE, tone(Waveform::Sine, A4, None, 0.15)),
        ("collect-chime", tone(Waveform::Sine, 880.0, Some(1320.0), 0.15)),
        ("collect-bubble", tone(Waveform::Sine, 400.0, Some(900.0), 0.12)),
        ("hurt-buzz", tone(Waveform::Square, 220.0, Some(110.0), 0.25)),
        ("jump-boing", tone(Waveform::Triangle, 300.0, Some(600.0), 0.18)),
        ("dash-whoosh", tone(Waveform::Sawtooth, 600.0, Some(200.0), 0.2)),
        (
            "win-fanfare",
            melody(Waveform::Square, &[(C5, 0.12), (E5, 0.12), (G5, 0.12), (C6, 0.35)], 0.4, false),
        ),
        (
            "lose-womp",
            melody(Waveform::Triangle, &[(G4, 0.2), (F4, 0.2), (E4, 0.2), (C4, 0.45)], 0.5, false),
        ),
        (
            "sparkle",
            SoundDef {
                recipe: SoundRecipe::Chord {
                    wave: Waveform::Sine,
                    freqs: vec![C6, E5 * 2.0, G5 * 2.0],
                    duration: 0.3,
                },
                envelope: Envelope::PLUCK,
                volume: 0.3,
                looping: false,
            },
        ),
        (
            "adventure-loop",
            melody(
                Waveform::Square,
                &[
                    (C4, q),
                    (E4, q),
                    (G4, q),
                    (E4, q),
                    (F4, q),
                    (A4, q),
                    (G4, q),
                    (REST, q),
                ],
                0.15,
                true,
            ),
        ),
        (
            "runner-loop",
            melody(
                Waveform::Sawtooth,
                &[
                    (E4, 0.15),
                    (E4, 0.15),
                    (G4, 0.15),
                    (A4, 0.15),
                    (G4, 0.15),
                    (E4, 0.15),
                    (D4, 0.15),
                    (REST, 0.15),
                ],
                0.12,
                true,
            ),
        ),
        (
            "gentle-loop",
            melody(
                Waveform::Triangle,
                &[
                    (C4, 0.35),
                    (E4, 0.35),
                    (G4, 0.35),
                    (C5, 0.35),
                    (G4, 0.35),
                    (E4, 0.35),
                ],
                0.2,
                true,
            ),
        ),
        (
            "space-theme",
            melody(
                Waveform::Sine,
                &[
                    (A4, q),
                    (E5, q),
                    (C5, q),
                    (B4, q),
                    (G4, q),
                    (E4, q),
                    (REST, q),
                ],
                0.18,
                true,
            ),
        ),
        (
            "ocean-theme",
            melody(
                Waveform::Triangle,
                &[
                    (D4, 0.3),
                    (F4, 0.3),
                    (A4, 0.3),
                    (F4, 0.3),
                    (E4, 0.3),
                    (C4, 0.3),
                ],
                0.2,
                true,
            ),
        ),
        (
            "forest-theme",
            melody(
                Waveform::Triangle,
                &[
                    (G4, q),
                    (B4, q),
                    (D4, q),
                    (G4, q),
                    (E4, q),
                    (C4, q),
                    (D4, q),
                    (REST, q),
                ],
                0.2,
                true,
            ),
        ),
    ]
}

/// Rendered buffers keyed by sound id.
#[derive(Debug, Clone)]
pub struct SoundBank {
    buffers: HashMap<String, SoundBuffer>,
    fallback: SoundBuffer,
}

impl SoundBank {
    pub fn from_defs(defs: impl IntoIterator<Item = (String, SoundDef)>) -> Self {
        let buffers: HashMap<String, SoundBuffer> = defs
            .into_iter()
            .map(|(id, def)| (id, render(&def)))
            .collect();
        let fallback = buffers
            .get(DEFAULT_TONE)
            .cloned()
            .unwrap_or_else(|| render(&tone(Waveform::Sine, A4, None, 0.15)));
        log::debug!("Rendered {} procedural sounds", buffers.len());
        Self { buffers, fallback }
    }

    pub fn builtin() -> Self {
        Self::from_defs(builtin_sounds().into_iter().map(|(id, def)| (id.to_string(), def)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.buffers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// The buffer for `id`, or the default tone when the id is unknown.
    pub fn get_or_default(&self, id: &str) -> (&str, &SoundBuffer) {
        match self.buffers.get_key_value(id) {
            Some((key, buffer)) => (key.as_str(), buffer),
            None => (DEFAULT_TONE, &self.fallback),
        }
    }
}

impl Default for SoundBank {
    fn default() -> Self {
        Self::builtin()
    }
}

pub trait AudioSink {
    fn play(&mut self, id: &str, buffer: &SoundBuffer, volume: f32);
    fn start_music(&mut self, id: &str, buffer: &SoundBuffer, volume: f32);
    fn stop_music(&mut self);
    fn set_music_volume(&mut self, volume: f32);
    fn release(&mut self) {}
}

/// Discards everything; used by headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, _id: &str, _buffer: &SoundBuffer, _volume: f32) {}
    fn start_music(&mut self, _id: &str, _buffer: &SoundBuffer, _volume: f32) {}
    fn stop_music(&mut self) {}
    fn set_music_volume(&mut self, _volume: f32) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Sound { id: String, volume: f32 },
    MusicStart { id: String, volume: f32 },
    MusicStop,
    MusicVolume(f32),
    Released,
}

/// Records playback. Clones share one log, so a test can keep a clone while
/// the engine owns the sink.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    log: Rc<RefCell<Vec<PlaybackEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.log.borrow().clone()
    }

    pub fn sounds(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Sound { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: PlaybackEvent) {
        self.log.borrow_mut().push(event);
    }
}

impl AudioSink for MemorySink {
    fn play(&mut self, id: &str, _buffer: &SoundBuffer, volume: f32) {
        self.record(PlaybackEvent::Sound {
            id: id.to_string(),
            volume,
        });
    }

    fn start_music(&mut self, id: &str, _buffer: &SoundBuffer, volume: f32) {
        self.record(PlaybackEvent::MusicStart {
            id: id.to_string(),
            volume,
        });
    }

    fn stop_music(&mut self) {
        self.record(PlaybackEvent::MusicStop);
    }

    fn set_music_volume(&mut self, volume: f32) {
        self.record(PlaybackEvent::MusicVolume(volume));
    }

    fn release(&mut self) {
        self.record(PlaybackEvent::Released);
    }
}

#[cfg(feature = "kira")]
pub use kira_sink::KiraSink;

#[cfg(feature = "kira")]
mod kira_sink {
    use super::{AudioSink, SoundBuffer};
    use kira::{
        dsp::Frame,
        manager::{backend::DefaultBackend, AudioManager, AudioManagerSettings},
        sound::static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings},
        tween::Tween,
        Volume,
    };
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    /// Device output through kira.
    pub struct KiraSink {
        manager: AudioManager,
        converted: HashMap<String, StaticSoundData>,
        music: Option<StaticSoundHandle>,
    }

    impl KiraSink {
        pub fn new() -> Result<Self, String> {
            let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
                .map_err(|e| format!("Failed to initialize audio manager: {e}"))?;
            Ok(Self {
                manager,
                converted: HashMap::new(),
                music: None,
            })
        }

        fn data(&mut self, id: &str, buffer: &SoundBuffer) -> StaticSoundData {
            self.converted
                .entry(id.to_string())
                .or_insert_with(|| {
                    let frames: Arc<[Frame]> = buffer
                        .samples
                        .iter()
                        .map(|s| Frame::from_mono(*s))
                        .collect();
                    StaticSoundData {
                        sample_rate: buffer.sample_rate,
                        frames,
                        settings: StaticSoundSettings::new(),
                        slice: None,
                    }
                })
                .clone()
        }
    }

    impl AudioSink for KiraSink {
        fn play(&mut self, id: &str, buffer: &SoundBuffer, volume: f32) {
            let mut settings = StaticSoundSettings::new();
            settings.volume = Volume::Amplitude(volume as f64).into();
            let data = self.data(id, buffer).with_settings(settings);
            if let Err(e) = self.manager.play(data) {
                log::warn!("Failed to play sound '{id}': {e}");
            }
        }

        fn start_music(&mut self, id: &str, buffer: &SoundBuffer, volume: f32) {
            self.stop_music();
            let mut settings = StaticSoundSettings::new().loop_region(0.0..);
            settings.volume = Volume::Amplitude(volume as f64).into();
            let data = self.data(id, buffer).with_settings(settings);
            match self.manager.play(data) {
                Ok(handle) => self.music = Some(handle),
                Err(e) => log::warn!("Failed to play music '{id}': {e}"),
            }
        }

        fn stop_music(&mut self) {
            if let Some(mut handle) = self.music.take() {
                let _ = handle.stop(Tween {
                    duration: Duration::from_secs_f32(0.3),
                    ..Default::default()
                });
            }
        }

        fn set_music_volume(&mut self, volume: f32) {
            if let Some(handle) = self.music.as_mut() {
                let _ = handle.set_volume(Volume::Amplitude(volume as f64), Tween::default());
            }
        }

        fn release(&mut self) {
            self.stop_music();
            self.converted.clear();
        }
    }
}

/// Volume-aware front end over a sink. Nothing is audible before
/// [`AudioEngine::unlock`]; music requested earlier starts on unlock.
pub struct AudioEngine {
    bank: SoundBank,
    sink: Box<dyn AudioSink>,
    unlocked: bool,
    destroyed: bool,
    master_volume: f32,
    music_volume: f32,
    sfx_volume: f32,
    requested_music: Option<String>,
    playing_music: Option<String>,
}

impl AudioEngine {
    pub fn new(bank: SoundBank, sink: Box<dyn AudioSink>) -> Self {
        Self {
            bank,
            sink,
            unlocked: false,
            destroyed: false,
            master_volume: 1.0,
            music_volume: 0.6,
            sfx_volume: 0.9,
            requested_music: None,
            playing_music: None,
        }
    }

    pub fn headless() -> Self {
        Self::new(SoundBank::builtin(), Box::new(NullSink))
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn current_music(&self) -> Option<&str> {
        self.playing_music.as_deref()
    }

    /// Returns `true` only on the call that actually unlocked.
    pub fn unlock(&mut self) -> bool {
        if self.unlocked || self.destroyed {
            return false;
        }
        self.unlocked = true;
        log::info!("Audio unlocked");
        if let Some(id) = self.requested_music.clone() {
            self.start_music(&id);
        }
        true
    }

    /// Returns whether the sound reached the sink.
    pub fn play_sound(&mut self, id: &str) -> bool {
        if !self.unlocked || self.destroyed {
            log::trace!("Dropping sound '{id}' while audio is locked");
            return false;
        }
        let (resolved, buffer) = self.bank.get_or_default(id);
        if resolved != id {
            log::debug!("Unknown sound '{id}', playing the default tone");
        }
        self.sink.play(resolved, buffer, self.master_volume * self.sfx_volume);
        true
    }

    pub fn play_music(&mut self, id: &str) {
        if self.destroyed {
            return;
        }
        self.requested_music = Some(id.to_string());
        if !self.unlocked || self.playing_music.as_deref() == Some(id) {
            return;
        }
        self.start_music(id);
    }

    fn start_music(&mut self, id: &str) {
        let (resolved, buffer) = self.bank.get_or_default(id);
        if resolved != id {
            log::warn!("Unknown music '{id}', looping the default tone");
        }
        self.sink
            .start_music(resolved, buffer, self.master_volume * self.music_volume);
        self.playing_music = Some(id.to_string());
    }

    pub fn stop_music(&mut self) {
        self.requested_music = None;
        if self.playing_music.take().is_some() {
            self.sink.stop_music();
        }
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = sanitize_volume(volume);
        self.push_music_volume();
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = sanitize_volume(volume);
        self.push_music_volume();
    }

    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = sanitize_volume(volume);
    }

    fn push_music_volume(&mut self) {
        if self.playing_music.is_some() && !self.destroyed {
            self.sink.set_music_volume(self.master_volume * self.music_volume);
        }
    }

    /// Stop everything and release the sink. Later calls are no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.stop_music();
        self.sink.release();
        self.destroyed = true;
        log::debug!("Audio released");
    }
}

fn sanitize_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
