//! Input state tracker and the stage's input adapter.
//!
//! `InputState` tracks which keys are currently held down:
//!   - movement is continuous while a key is held
//!   - zoom, pause and quit are edge-triggered
//!   - a consumed key can be latched until it is released
//!
//! Uses crossterm's keyboard enhancement for Release events when available.
//! Falls back to timeout-based release detection on terminals that don't support it.
//!
//! `ControlState` merges keyboard and gamepad into the stage's `InputSource`.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::grid::Direction;
use crate::sim::control::{Action, InputSource};
use super::gamepad::GamepadState;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const ZOOM_KEYS: [KeyCode; 1] = [KeyCode::Enter];
pub const PAUSE_KEYS: [KeyCode; 1] = [KeyCode::Esc];
pub const QUIT_KEYS: [KeyCode; 2] = [KeyCode::Char('q'), KeyCode::Char('Q')];

pub fn move_keys(dir: Direction) -> [KeyCode; 3] {
    match dir {
        Direction::Up => [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')],
        Direction::Down => [KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')],
        Direction::Left => [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')],
        Direction::Right => [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')],
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Held keys that stay silent until released once.
    needs_release: HashSet<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Set from
    /// `Renderer::reports_key_release` once the terminal is initialized.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            needs_release: HashSet::new(),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the stage tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(key);
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        self.needs_release.retain(|code| self.last_active.contains_key(code));
    }

    fn handle_key(&mut self, key: KeyEvent) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => self.register_release(key.code),
            // without confirmed enhancement, rely on timeout expiry
            KeyEventKind::Release => {}
            _ => self.register_press(key.code),
        }
    }

    fn register_press(&mut self, code: KeyCode) {
        let was_held = self.is_held_inner(code);
        self.last_active.insert(code, Instant::now());
        if !was_held {
            self.fresh_presses.push(code);
        }
    }

    fn register_release(&mut self, code: KeyCode) {
        self.last_active.remove(&code);
        self.needs_release.remove(&code);
    }

    /// Is this key currently held down (and not latched)?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.is_held_inner(code) && !self.needs_release.contains(&code)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code) && !self.needs_release.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Forget this frame's fresh presses of `codes`; holds are untouched.
    pub fn clear_presses(&mut self, codes: &[KeyCode]) {
        self.fresh_presses.retain(|c| !codes.contains(c));
    }

    /// Silence held `codes` until they are released.
    pub fn set_needs_release(&mut self, codes: &[KeyCode]) {
        for code in codes {
            if self.is_held_inner(*code) {
                self.needs_release.insert(*code);
            }
        }
        self.clear_presses(codes);
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn is_held_inner(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

/// Keyboard + gamepad, as seen by the stage.
pub struct ControlState {
    pub keyboard: InputState,
    pub gamepad: GamepadState,
    /// Gamepad zoom press already used this frame.
    pad_zoom_used: bool,
}

impl ControlState {
    pub fn new(keyboard: InputState, gamepad: GamepadState) -> Self {
        ControlState { keyboard, gamepad, pad_zoom_used: false }
    }

    /// Poll both devices. Call once per frame.
    pub fn update(&mut self) {
        self.keyboard.drain_events();
        self.gamepad.update();
        self.pad_zoom_used = false;
    }

    pub fn pause_pressed(&self) -> bool {
        self.keyboard.any_pressed(&PAUSE_KEYS) || self.gamepad.pause_pressed()
    }

    pub fn quit_pressed(&self) -> bool {
        self.keyboard.any_pressed(&QUIT_KEYS)
            || self.keyboard.ctrl_c_pressed()
            || self.gamepad.quit_pressed()
    }
}

impl InputSource for ControlState {
    fn is_requested(&self, action: Action) -> bool {
        match action {
            Action::Move(dir) => {
                self.keyboard.any_held(&move_keys(dir)) || self.gamepad.direction_held(dir)
            }
            Action::ToggleZoom => {
                self.keyboard.any_held(&ZOOM_KEYS)
                    || (self.gamepad.zoom_pressed() && !self.pad_zoom_used)
            }
        }
    }

    fn consume(&mut self, action: Action) {
        match action {
            Action::Move(dir) => self.keyboard.clear_presses(&move_keys(dir)),
            Action::ToggleZoom => {
                self.keyboard.set_needs_release(&ZOOM_KEYS);
                self.pad_zoom_used = true;
            }
        }
    }
}
