use crate::host::{KeyboardHost, ReportShield};
use crate::queue::{KeyQueue, QueueEntry};
use crate::registry::{LayerMatch, Qukey, QukeyState, Registry, Role};
use crate::types::{Decision, KeyAddr, KeyCode, LayerId, Millis, RawEvent, ResolvedEvent};
use tracing::{debug, trace, warn};

pub const DEFAULT_TIMEOUT_MS: Millis = 500;

/// Whether a key being resolved is still down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Switch {
    Held,
    Released,
}

/// Dual-role key disambiguation engine.
pub struct Qukeys {
    registry: Registry,
    queue: KeyQueue,
    active: bool,
    timeout: Millis,
}

impl Default for Qukeys {
    fn default() -> Self {
        Self {
            registry: Registry::new(),
            queue: KeyQueue::new(),
            active: true,
            timeout: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl Qukeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, layer: LayerMatch, addr: KeyAddr, alternate: KeyCode) -> usize {
        self.registry.register(Qukey::new(layer, addr, alternate))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn toggle(&mut self) {
        self.active = !self.active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_timeout(&mut self, ms: Millis) {
        self.timeout = ms;
    }

    pub fn timeout(&self) -> Millis {
        self.timeout
    }

    /// Startup hook: forget anything pending and every resolution.
    pub fn begin(&mut self) {
        self.queue.clear();
        self.registry.reset_all();
    }

    /// Resolution state of the qukey bound to `addr` on `layer`.
    pub fn state_of(&self, addr: KeyAddr, layer: LayerId) -> Option<QukeyState> {
        self.registry
            .lookup(addr, layer)
            .map(|i| self.registry.state(i))
    }

    /// Queued entries, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &QueueEntry> {
        self.queue.iter()
    }

    /// Classifies one scanner event.
    pub fn on_event<H: KeyboardHost + ?Sized>(&mut self, host: &mut H, event: RawEvent) -> Decision {
        let pass = Decision::Pass(event.code);
        let state = event.state;
        if !state.is_active() {
            return pass;
        }

        let addr = event.addr;
        let qukey = self.registry.lookup(addr, host.active_layer(addr));

        if state.toggled_on() {
            // While inactive only new presses bypass the engine; keys already
            // queued or resolved keep their role until released.
            if !self.active || (self.queue.is_empty() && qukey.is_none()) {
                return pass;
            }
            self.enqueue(host, addr);
            trace!("Queued {:?} (qukey={:?}, depth={})", addr, qukey, self.queue.len());
            return Decision::Suppress;
        }

        let queued = self.queue.position(addr);

        if state.toggled_off() {
            match queued {
                Some(index) => self.flush_queue(host, index),
                None => self.registry.reset_addr(addr),
            }
            return pass;
        }

        match (qukey, queued) {
            // Still undecided, or blocked behind an earlier pending key.
            (_, Some(_)) => Decision::Suppress,
            (None, None) => pass,
            (Some(i), None) => match self.registry.state(i) {
                QukeyState::Alternate => Decision::Pass(self.alternate_code(i)),
                QukeyState::Primary | QukeyState::Unresolved => pass,
            },
        }
    }

    /// Pre-report hook: resolves queued keys whose wait is over, oldest first.
    /// Runs whether or not the engine is active.
    pub fn before_report<H: KeyboardHost + ?Sized>(&mut self, host: &mut H) {
        let now = host.now();
        while let Some(head) = self.queue.head().copied() {
            let is_qukey = self
                .registry
                .lookup(head.addr, host.active_layer(head.addr))
                .is_some();
            if !is_qukey {
                self.flush_key(host, Role::Primary, Switch::Held);
            } else if now > head.deadline {
                debug!("Qukey {:?} timed out at {}ms", head.addr, now);
                self.flush_key(host, Role::Alternate, Switch::Held);
            } else {
                break;
            }
        }
    }

    fn alternate_code(&self, index: usize) -> KeyCode {
        self.registry
            .get(index)
            .map_or(KeyCode::NO_KEY, |q| q.alternate)
    }

    fn enqueue<H: KeyboardHost + ?Sized>(&mut self, host: &mut H, addr: KeyAddr) {
        if self.queue.is_full() {
            warn!("Qukeys queue full; resolving head early to admit {:?}", addr);
            self.flush_key(host, Role::Primary, Switch::Held);
        }
        host.mask_key(addr);
        let deadline = host.now().saturating_add(self.timeout);
        if let Err(entry) = self.queue.push(addr, deadline) {
            // Unreachable after the eviction above; keep the key visible.
            host.unmask_key(entry.addr);
        }
    }

    /// Resolves the head of the queue.
    fn flush_key<H: KeyboardHost + ?Sized>(&mut self, host: &mut H, role: Role, switch: Switch) {
        let Some(head) = self.queue.head().copied() else {
            return;
        };
        let addr = head.addr;
        host.unmask_key(addr);

        let qukey = self.registry.lookup(addr, host.active_layer(addr));
        if let Some(i) = qukey {
            self.registry.set_state(i, role.into());
        }
        let code = match (qukey, role) {
            (Some(i), Role::Alternate) => self.alternate_code(i),
            _ => host.lookup_key(addr),
        };
        debug!("Resolved {:?} as {:?} -> {:?} ({:?})", addr, role, code, switch);

        {
            let mut shield = ReportShield::new(host);
            shield.inject(ResolvedEvent::press(addr, code));
        }

        match switch {
            // The scan may already be past this key; keep it in the rest of the cycle.
            Switch::Held => host.inject(ResolvedEvent::hold(addr, code)),
            Switch::Released => {
                host.inject(ResolvedEvent::release(addr, code));
                self.registry.reset_addr(addr);
            }
        }

        self.queue.pop_head();
    }

    /// A queued key at `index` was released: everything ahead of it is still
    /// held and acted as a modifier for it.
    fn flush_queue<H: KeyboardHost + ?Sized>(&mut self, host: &mut H, index: usize) {
        for _ in 0..index {
            if self.queue.is_empty() {
                break;
            }
            self.flush_key(host, Role::Alternate, Switch::Held);
        }
        self.flush_key(host, Role::Primary, Switch::Released);
    }
}
