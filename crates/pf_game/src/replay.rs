use pf_core::{InputEvent, Key};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    /// Keys held during this frame; anything not listed is released.
    #[serde(default)]
    pub held: Vec<Key>,
    /// Pointer held at this screen position, released when absent.
    #[serde(default)]
    pub pointer: Option<[f32; 2]>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn tick_count(&self) -> usize {
        self.frames.iter().map(|f| f.repeat.max(1) as usize).sum()
    }

    /// One batch of input events per tick, expressing the transitions between
    /// consecutive frames' held state.
    pub fn expanded_events(&self) -> Vec<Vec<InputEvent>> {
        let mut out = Vec::with_capacity(self.tick_count());
        let mut held: BTreeSet<Key> = BTreeSet::new();
        let mut pointer: Option<[f32; 2]> = None;
        for frame in &self.frames {
            let next: BTreeSet<Key> = frame.held.iter().copied().collect();
            for tick in 0..frame.repeat.max(1) {
                if tick > 0 {
                    out.push(Vec::new());
                    continue;
                }
                let mut events = Vec::new();
                events.extend(held.difference(&next).map(|k| InputEvent::KeyUp(*k)));
                events.extend(next.difference(&held).map(|k| InputEvent::KeyDown(*k)));
                match (pointer, frame.pointer) {
                    (None, Some([x, y])) => events.push(InputEvent::PointerDown { x, y }),
                    (Some(prev), Some([x, y])) if prev != [x, y] => {
                        events.push(InputEvent::PointerMove { x, y })
                    }
                    (Some(_), None) => events.push(InputEvent::PointerUp),
                    _ => {}
                }
                out.push(events);
            }
            held = next;
            pointer = frame.pointer;
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if !(replay.fixed_dt.is_finite() && replay.fixed_dt > 0.0) {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}
