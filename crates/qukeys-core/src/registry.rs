use crate::types::{KeyAddr, KeyCode, LayerId};
use serde::{Deserialize, Serialize};

/// Which layers a qukey binding applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerMatch {
    All,
    Only(LayerId),
}

impl LayerMatch {
    pub const fn matches(self, layer: LayerId) -> bool {
        match self {
            LayerMatch::All => true,
            LayerMatch::Only(l) => l == layer,
        }
    }
}

impl From<Option<LayerId>> for LayerMatch {
    fn from(layer: Option<LayerId>) -> Self {
        layer.map_or(LayerMatch::All, LayerMatch::Only)
    }
}

/// A dual-role key binding. Immutable once registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Qukey {
    pub layer: LayerMatch,
    pub addr: KeyAddr,
    pub alternate: KeyCode,
}

impl Qukey {
    pub const fn new(layer: LayerMatch, addr: KeyAddr, alternate: KeyCode) -> Self {
        Self {
            layer,
            addr,
            alternate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QukeyState {
    #[default]
    Unresolved,
    Primary,
    Alternate,
}

/// Role a queued key resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Alternate,
}

impl From<Role> for QukeyState {
    fn from(role: Role) -> Self {
        match role {
            Role::Primary => QukeyState::Primary,
            Role::Alternate => QukeyState::Alternate,
        }
    }
}

/// Registered qukeys plus their resolution state, indexed by registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<Qukey>,
    states: Vec<QukeyState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a binding and returns its index.
    pub fn register(&mut self, qukey: Qukey) -> usize {
        self.entries.push(qukey);
        self.states.push(QukeyState::Unresolved);
        self.entries.len() - 1
    }

    /// First binding matching `addr` on `layer`, in registration order.
    pub fn lookup(&self, addr: KeyAddr, layer: LayerId) -> Option<usize> {
        if addr.is_unknown() {
            return None;
        }
        self.entries
            .iter()
            .position(|q| q.addr == addr && q.layer.matches(layer))
    }

    pub fn get(&self, index: usize) -> Option<&Qukey> {
        self.entries.get(index)
    }

    pub fn state(&self, index: usize) -> QukeyState {
        self.states.get(index).copied().unwrap_or_default()
    }

    pub fn set_state(&mut self, index: usize, state: QukeyState) {
        if let Some(slot) = self.states.get_mut(index) {
            *slot = state;
        }
    }

    /// Resets every binding on `addr`, whatever layer it belongs to.
    pub fn reset_addr(&mut self, addr: KeyAddr) {
        for (q, state) in self.entries.iter().zip(self.states.iter_mut()) {
            if q.addr == addr {
                *state = QukeyState::Unresolved;
            }
        }
    }

    pub fn reset_all(&mut self) {
        self.states.fill(QukeyState::Unresolved);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Qukey, QukeyState)> {
        self.entries.iter().zip(self.states.iter().copied())
    }
}
