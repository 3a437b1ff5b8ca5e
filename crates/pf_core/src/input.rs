//! Input routing from raw device events to a per-tick intent.
//!
//! Host callbacks only *enqueue* [`InputEvent`]s. The simulation calls
//! [`InputRouter::begin_tick`] once at the start of each tick, which clears the
//! previous tick's edges and applies the queue. That keeps every press visible
//! for exactly one tick and keeps the router free of host-thread concerns.
//!
//! - **Level-triggered (held):** keys, gamepad buttons and the primary pointer.
//! - **Edge-triggered (just_pressed / just_released):** true only during the tick
//!   in which the transition was applied.

use std::collections::{BTreeMap, HashSet, VecDeque};

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    W,
    A,
    S,
    D,
    Space,
    Enter,
    Shift,
    X,
    Z,
    P,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamepadButton {
    South,
    East,
    West,
    North,
    Start,
    DPadLeft,
    DPadRight,
    DPadUp,
    DPadDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamepadAxis {
    LeftStickX,
    /// Positive is up.
    LeftStickY,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    TouchStart { id: u64, x: f32, y: f32 },
    TouchMove { id: u64, x: f32, y: f32 },
    TouchEnd { id: u64 },
    GamepadButtonDown(GamepadButton),
    GamepadButtonUp(GamepadButton),
    GamepadAxisMoved { axis: GamepadAxis, value: f32 },
}

impl InputEvent {
    /// Presses count as user gestures; moves and releases do not.
    pub fn is_gesture(&self) -> bool {
        matches!(
            self,
            InputEvent::KeyDown(_)
                | InputEvent::PointerDown { .. }
                | InputEvent::TouchStart { .. }
                | InputEvent::GamepadButtonDown(_)
        )
    }
}

/// Which device families contribute to the intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlMask {
    pub keyboard: bool,
    pub touch: bool,
    pub gamepad: bool,
}

impl ControlMask {
    pub const ALL: ControlMask = ControlMask {
        keyboard: true,
        touch: true,
        gamepad: true,
    };
}

impl Default for ControlMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Unified per-tick player intent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Intent {
    /// -1..=1, right positive.
    pub move_x: f32,
    /// -1..=1, up positive.
    pub move_y: f32,
    pub jump: bool,
    pub jump_held: bool,
    pub action: bool,
    /// Primary pointer or first touch, in logical screen coordinates.
    pub pointer: Option<Vec2>,
    pub pointer_held: bool,
}

impl Intent {
    pub fn has_direction(&self) -> bool {
        self.move_x != 0.0 || self.move_y != 0.0
    }
}

const LEFT_KEYS: [Key; 2] = [Key::Left, Key::A];
const RIGHT_KEYS: [Key; 2] = [Key::Right, Key::D];
const UP_KEYS: [Key; 2] = [Key::Up, Key::W];
const DOWN_KEYS: [Key; 2] = [Key::Down, Key::S];
const JUMP_KEYS: [Key; 3] = [Key::Space, Key::Up, Key::W];
const ACTION_KEYS: [Key; 3] = [Key::Shift, Key::X, Key::Enter];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Waiting,
    Pending,
    Reported,
}

pub struct InputRouter {
    queue: VecDeque<InputEvent>,
    mask: ControlMask,
    deadzone: f32,

    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,

    pad_held: HashSet<GamepadButton>,
    pad_just_pressed: HashSet<GamepadButton>,
    stick: Vec2,

    pointer: Option<Vec2>,
    pointer_down: bool,
    pointer_just_pressed: bool,
    touches: BTreeMap<u64, Vec2>,
    touch_just_started: bool,

    gesture: GestureState,
}

impl InputRouter {
    pub fn new(mask: ControlMask) -> Self {
        Self {
            queue: VecDeque::new(),
            mask,
            deadzone: 0.25,
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            pad_held: HashSet::new(),
            pad_just_pressed: HashSet::new(),
            stick: Vec2::ZERO,
            pointer: None,
            pointer_down: false,
            pointer_just_pressed: false,
            touches: BTreeMap::new(),
            touch_just_started: false,
            gesture: GestureState::Waiting,
        }
    }

    pub fn with_deadzone(mut self, deadzone: f32) -> Self {
        self.deadzone = deadzone.clamp(0.0, 0.95);
        self
    }

    pub fn mask(&self) -> ControlMask {
        self.mask
    }

    pub fn push(&mut self, event: InputEvent) {
        self.queue.push_back(event);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Clear last tick's edges, then apply everything queued since.
    pub fn begin_tick(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
        self.pad_just_pressed.clear();
        self.pointer_just_pressed = false;
        self.touch_just_started = false;

        while let Some(event) = self.queue.pop_front() {
            if event.is_gesture() && self.gesture == GestureState::Waiting {
                self.gesture = GestureState::Pending;
            }
            self.apply(event);
        }
    }

    fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                if self.held.insert(key) {
                    self.just_pressed.insert(key);
                }
            }
            InputEvent::KeyUp(key) => {
                if self.held.remove(&key) {
                    self.just_released.insert(key);
                }
            }
            InputEvent::PointerDown { x, y } => {
                self.pointer = Some(Vec2::new(x, y));
                if !self.pointer_down {
                    self.pointer_down = true;
                    self.pointer_just_pressed = true;
                }
            }
            InputEvent::PointerMove { x, y } => self.pointer = Some(Vec2::new(x, y)),
            InputEvent::PointerUp => self.pointer_down = false,
            InputEvent::TouchStart { id, x, y } => {
                if self.touches.insert(id, Vec2::new(x, y)).is_none() {
                    self.touch_just_started = true;
                }
            }
            InputEvent::TouchMove { id, x, y } => {
                if let Some(pos) = self.touches.get_mut(&id) {
                    *pos = Vec2::new(x, y);
                }
            }
            InputEvent::TouchEnd { id } => {
                self.touches.remove(&id);
            }
            InputEvent::GamepadButtonDown(button) => {
                if self.pad_held.insert(button) {
                    self.pad_just_pressed.insert(button);
                }
            }
            InputEvent::GamepadButtonUp(button) => {
                self.pad_held.remove(&button);
            }
            InputEvent::GamepadAxisMoved { axis, value } => {
                let value = if value.is_finite() { value.clamp(-1.0, 1.0) } else { 0.0 };
                match axis {
                    GamepadAxis::LeftStickX => self.stick.x = value,
                    GamepadAxis::LeftStickY => self.stick.y = value,
                }
            }
        }
    }

    /// Reports the first press once, for unlocking audio.
    pub fn take_first_gesture(&mut self) -> bool {
        if self.gesture == GestureState::Pending {
            self.gesture = GestureState::Reported;
            true
        } else {
            false
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    fn any_held(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.held.contains(k))
    }

    fn any_just_pressed(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.just_pressed.contains(k))
    }

    fn axis(&self, value: f32) -> f32 {
        if value.abs() < self.deadzone {
            0.0
        } else {
            value
        }
    }

    fn key_axis(&self, negative: &[Key], positive: &[Key]) -> f32 {
        let mut v = 0.0;
        if self.any_held(negative) {
            v -= 1.0;
        }
        if self.any_held(positive) {
            v += 1.0;
        }
        v
    }

    fn pad_axis(&self, stick: f32, negative: GamepadButton, positive: GamepadButton) -> f32 {
        let mut dpad = 0.0;
        if self.pad_held.contains(&negative) {
            dpad -= 1.0;
        }
        if self.pad_held.contains(&positive) {
            dpad += 1.0;
        }
        if dpad != 0.0 {
            dpad
        } else {
            self.axis(stick)
        }
    }

    pub fn intent(&self) -> Intent {
        let mut intent = Intent::default();
        let mask = self.mask;

        if mask.keyboard {
            intent.move_x = self.key_axis(&LEFT_KEYS, &RIGHT_KEYS);
            intent.move_y = self.key_axis(&DOWN_KEYS, &UP_KEYS);
            intent.jump = self.any_just_pressed(&JUMP_KEYS);
            intent.jump_held = self.any_held(&JUMP_KEYS);
            intent.action = self.any_just_pressed(&ACTION_KEYS);
        }

        if mask.gamepad {
            if intent.move_x == 0.0 {
                intent.move_x =
                    self.pad_axis(self.stick.x, GamepadButton::DPadLeft, GamepadButton::DPadRight);
            }
            if intent.move_y == 0.0 {
                intent.move_y =
                    self.pad_axis(self.stick.y, GamepadButton::DPadDown, GamepadButton::DPadUp);
            }
            intent.jump |= self.pad_just_pressed.contains(&GamepadButton::South);
            intent.jump_held |= self.pad_held.contains(&GamepadButton::South);
            intent.action |= self.pad_just_pressed.contains(&GamepadButton::West);
        }

        if mask.touch {
            let touch = self.touches.values().next().copied();
            intent.pointer = touch.or(self.pointer);
            intent.pointer_held = self.pointer_down || touch.is_some();
            // A fresh tap doubles as a jump.
            intent.jump |= self.pointer_just_pressed || self.touch_just_started;
        }

        intent
    }

    /// Drop all held state and queued events.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.held.clear();
        self.just_pressed.clear();
        self.just_released.clear();
        self.pad_held.clear();
        self.pad_just_pressed.clear();
        self.stick = Vec2::ZERO;
        self.pointer_down = false;
        self.pointer_just_pressed = false;
        self.touches.clear();
        self.touch_just_started = false;
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new(ControlMask::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router_with(events: &[InputEvent]) -> InputRouter {
        let mut router = InputRouter::default();
        for e in events {
            router.push(*e);
        }
        router.begin_tick();
        router
    }

    #[test]
    fn events_apply_only_at_tick_start() {
        let mut router = InputRouter::default();
        router.push(InputEvent::KeyDown(Key::Right));
        assert!(!router.is_held(Key::Right));
        assert_eq!(router.pending(), 1);
        router.begin_tick();
        assert!(router.is_held(Key::Right));
        assert_eq!(router.intent().move_x, 1.0);
    }

    #[test]
    fn key_down_sets_held_and_just_pressed() {
        let router = router_with(&[InputEvent::KeyDown(Key::A)]);
        assert!(router.is_held(Key::A));
        assert!(router.is_just_pressed(Key::A));
    }

    #[test]
    fn edges_last_exactly_one_tick() {
        let mut router = router_with(&[InputEvent::KeyDown(Key::Space)]);
        assert!(router.intent().jump);
        router.begin_tick();
        assert!(!router.intent().jump);
        assert!(router.intent().jump_held);
    }

    #[test]
    fn key_repeat_does_not_double_press() {
        let mut router = router_with(&[InputEvent::KeyDown(Key::A)]);
        router.push(InputEvent::KeyDown(Key::A));
        router.begin_tick();
        assert!(router.is_held(Key::A));
        assert!(!router.is_just_pressed(Key::A));
    }

    #[test]
    fn key_up_without_down_is_no_op() {
        let router = router_with(&[InputEvent::KeyUp(Key::A)]);
        assert!(!router.is_just_released(Key::A));
    }

    #[test]
    fn opposing_keys_cancel() {
        let router = router_with(&[InputEvent::KeyDown(Key::Left), InputEvent::KeyDown(Key::D)]);
        assert_eq!(router.intent().move_x, 0.0);
    }

    #[test]
    fn gamepad_stick_respects_deadzone() {
        let router = router_with(&[InputEvent::GamepadAxisMoved {
            axis: GamepadAxis::LeftStickX,
            value: 0.1,
        }]);
        assert_eq!(router.intent().move_x, 0.0);

        let router = router_with(&[InputEvent::GamepadAxisMoved {
            axis: GamepadAxis::LeftStickX,
            value: -0.8,
        }]);
        assert!((router.intent().move_x + 0.8).abs() < 1e-6);
    }

    #[test]
    fn keyboard_wins_over_gamepad() {
        let router = router_with(&[
            InputEvent::KeyDown(Key::Right),
            InputEvent::GamepadAxisMoved {
                axis: GamepadAxis::LeftStickX,
                value: -1.0,
            },
        ]);
        assert_eq!(router.intent().move_x, 1.0);
    }

    #[test]
    fn masked_sources_do_not_contribute() {
        let mut router = InputRouter::new(ControlMask {
            keyboard: true,
            touch: false,
            gamepad: false,
        });
        router.push(InputEvent::GamepadButtonDown(GamepadButton::South));
        router.push(InputEvent::TouchStart { id: 1, x: 10.0, y: 10.0 });
        router.begin_tick();
        let intent = router.intent();
        assert!(!intent.jump);
        assert!(intent.pointer.is_none());
    }

    #[test]
    fn tap_is_a_jump_and_sets_pointer() {
        let router = router_with(&[InputEvent::TouchStart { id: 7, x: 120.0, y: 40.0 }]);
        let intent = router.intent();
        assert!(intent.jump);
        assert!(intent.pointer_held);
        assert_eq!(intent.pointer, Some(Vec2::new(120.0, 40.0)));
    }

    #[test]
    fn first_gesture_reported_once() {
        let mut router = InputRouter::default();
        router.push(InputEvent::PointerMove { x: 1.0, y: 1.0 });
        router.begin_tick();
        assert!(!router.take_first_gesture());

        router.push(InputEvent::KeyDown(Key::Z));
        router.push(InputEvent::KeyDown(Key::X));
        router.begin_tick();
        assert!(router.take_first_gesture());
        assert!(!router.take_first_gesture());

        router.push(InputEvent::PointerDown { x: 0.0, y: 0.0 });
        router.begin_tick();
        assert!(!router.take_first_gesture());
    }

    #[test]
    fn clear_drops_queue_and_held_state() {
        let mut router = router_with(&[InputEvent::KeyDown(Key::Right)]);
        router.push(InputEvent::KeyDown(Key::Left));
        router.clear();
        router.begin_tick();
        assert_eq!(router.intent(), Intent::default());
    }
}
