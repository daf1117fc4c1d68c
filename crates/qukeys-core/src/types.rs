use serde::{Deserialize, Serialize};

/// Monotonic milliseconds.
pub type Millis = u64;

/// Keymap layer index.
pub type LayerId = u8;

/// Physical key position in the switch matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyAddr {
    pub row: u8,
    pub col: u8,
}

impl KeyAddr {
    /// Reserved address meaning "no key".
    pub const UNKNOWN: KeyAddr = KeyAddr::new(0xFF, 0xFF);

    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    pub const fn is_unknown(self) -> bool {
        self.row == Self::UNKNOWN.row && self.col == Self::UNKNOWN.col
    }
}

/// HID keyboard usage id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u8);

impl KeyCode {
    pub const NO_KEY: KeyCode = KeyCode(0x00);
    /// Keymap marker: fall through to the next lower active layer.
    pub const TRANSPARENT: KeyCode = KeyCode(0x01);

    pub const fn is_no_key(self) -> bool {
        self.0 == Self::NO_KEY.0
    }

    pub const fn is_transparent(self) -> bool {
        self.0 == Self::TRANSPARENT.0
    }

    /// Usages that end up in a report (everything but the two markers).
    pub const fn is_reportable(self) -> bool {
        !self.is_no_key() && !self.is_transparent()
    }

    pub const fn is_modifier(self) -> bool {
        self.0 >= 0xE0 && self.0 <= 0xE7
    }
}

impl std::fmt::Debug for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match crate::keycode::key_name(*self) {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "KeyCode({:#04X})", self.0),
        }
    }
}

/// Switch state for one scan: current level plus the level seen last scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeySwitchState {
    pub pressed: bool,
    pub was_pressed: bool,
}

impl KeySwitchState {
    pub const fn new(pressed: bool, was_pressed: bool) -> Self {
        Self {
            pressed,
            was_pressed,
        }
    }

    pub const fn toggled_on(self) -> bool {
        self.pressed && !self.was_pressed
    }

    pub const fn toggled_off(self) -> bool {
        !self.pressed && self.was_pressed
    }

    pub const fn is_held(self) -> bool {
        self.pressed && self.was_pressed
    }

    /// Pressed now or released this scan.
    pub const fn is_active(self) -> bool {
        self.pressed || self.was_pressed
    }

    pub const fn edge(self) -> KeyEdge {
        match (self.pressed, self.was_pressed) {
            (true, false) => KeyEdge::Down,
            (true, true) => KeyEdge::Held,
            (false, true) => KeyEdge::Up,
            (false, false) => KeyEdge::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEdge {
    Down,
    Held,
    Up,
    Idle,
}

impl KeyEdge {
    pub const fn state(self) -> KeySwitchState {
        match self {
            KeyEdge::Down => KeySwitchState::new(true, false),
            KeyEdge::Held => KeySwitchState::new(true, true),
            KeyEdge::Up => KeySwitchState::new(false, true),
            KeyEdge::Idle => KeySwitchState::new(false, false),
        }
    }

    pub const fn is_pressed(self) -> bool {
        matches!(self, KeyEdge::Down | KeyEdge::Held)
    }
}

/// Event produced by the matrix scan. Always classified by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub addr: KeyAddr,
    /// Code the active layer maps `addr` to.
    pub code: KeyCode,
    pub state: KeySwitchState,
}

impl RawEvent {
    pub const fn new(addr: KeyAddr, code: KeyCode, edge: KeyEdge) -> Self {
        Self {
            addr,
            code,
            state: edge.state(),
        }
    }
}

/// Event synthesized while resolving a queued key.
/// Merged straight into the report; never classified again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEvent {
    pub addr: KeyAddr,
    pub code: KeyCode,
    pub edge: KeyEdge,
}

impl ResolvedEvent {
    pub const fn press(addr: KeyAddr, code: KeyCode) -> Self {
        Self {
            addr,
            code,
            edge: KeyEdge::Down,
        }
    }

    pub const fn hold(addr: KeyAddr, code: KeyCode) -> Self {
        Self {
            addr,
            code,
            edge: KeyEdge::Held,
        }
    }

    pub const fn release(addr: KeyAddr, code: KeyCode) -> Self {
        Self {
            addr,
            code,
            edge: KeyEdge::Up,
        }
    }
}

/// Input to the host pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Raw(RawEvent),
    Resolved(ResolvedEvent),
}

/// Outcome of classifying a raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Continue down the pipeline with this code.
    Pass(KeyCode),
    /// Emit nothing for this key this cycle.
    Suppress,
}

impl Decision {
    pub const fn code(self) -> Option<KeyCode> {
        match self {
            Decision::Pass(code) => Some(code),
            Decision::Suppress => None,
        }
    }
}
