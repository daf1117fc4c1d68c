use crate::host::{Clock, KeyboardHost};
use crate::keymap::Keymap;
use crate::qukeys::Qukeys;
use crate::report::{KeyReport, ReportBuilder};
use crate::types::{
    Decision, Event, KeyAddr, KeyCode, KeySwitchState, LayerId, Millis, RawEvent, ResolvedEvent,
};
use crossbeam_channel::Sender;
use std::collections::{BTreeSet, HashSet};
use tracing::trace;

/// Everything the engine talks to during a scan. Masked keys are skipped by
/// the scan except for their release.
pub struct Board<C: Clock> {
    keymap: Keymap,
    report: ReportBuilder,
    masked: HashSet<KeyAddr>,
    clock: C,
}

impl<C: Clock> KeyboardHost for Board<C> {
    fn active_layer(&self, addr: KeyAddr) -> LayerId {
        self.keymap.active_layer_for(addr)
    }

    fn lookup_key(&self, addr: KeyAddr) -> KeyCode {
        self.keymap.lookup(addr)
    }

    fn now(&self) -> Millis {
        self.clock.now()
    }

    fn mask_key(&mut self, addr: KeyAddr) {
        self.masked.insert(addr);
    }

    fn unmask_key(&mut self, addr: KeyAddr) {
        self.masked.remove(&addr);
    }

    fn report(&mut self) -> &mut ReportBuilder {
        &mut self.report
    }
}

/// Scan loop: simulated matrix, event pipeline and report assembly.
pub struct Keyboard<C: Clock> {
    qukeys: Qukeys,
    board: Board<C>,
    pressed: BTreeSet<KeyAddr>,
    was_pressed: BTreeSet<KeyAddr>,
}

impl<C: Clock> Keyboard<C> {
    pub fn new(keymap: Keymap, mut qukeys: Qukeys, clock: C, sink: Sender<KeyReport>) -> Self {
        qukeys.begin();
        Self {
            qukeys,
            board: Board {
                keymap,
                report: ReportBuilder::new(sink),
                masked: HashSet::new(),
                clock,
            },
            pressed: BTreeSet::new(),
            was_pressed: BTreeSet::new(),
        }
    }

    pub fn qukeys(&self) -> &Qukeys {
        &self.qukeys
    }

    pub fn qukeys_mut(&mut self) -> &mut Qukeys {
        &mut self.qukeys
    }

    pub fn keymap(&self) -> &Keymap {
        &self.board.keymap
    }

    pub fn keymap_mut(&mut self) -> &mut Keymap {
        &mut self.board.keymap
    }

    pub fn is_masked(&self, addr: KeyAddr) -> bool {
        self.board.masked.contains(&addr)
    }

    pub fn last_report(&self) -> &KeyReport {
        self.board.report.last_sent()
    }

    pub fn now(&self) -> Millis {
        self.board.clock.now()
    }

    /// Physical switch closes. Seen by the next scan.
    pub fn press(&mut self, addr: KeyAddr) {
        self.pressed.insert(addr);
    }

    /// Physical switch opens. Seen by the next scan.
    pub fn release(&mut self, addr: KeyAddr) {
        self.pressed.remove(&addr);
    }

    /// Runs one event through the pipeline. Returns the code that reached the
    /// report, if any.
    pub fn handle_event(&mut self, event: Event) -> Option<KeyCode> {
        match event {
            Event::Raw(raw) => {
                let decision = self.qukeys.on_event(&mut self.board, raw);
                trace!("{:?} {:?} -> {:?}", raw.addr, raw.state.edge(), decision);
                match decision {
                    Decision::Pass(code) if raw.state.pressed => {
                        self.board.report.press(code);
                        Some(code)
                    }
                    Decision::Pass(_) | Decision::Suppress => None,
                }
            }
            Event::Resolved(resolved) => {
                self.board.inject(resolved);
                Some(resolved.code).filter(|_| resolved.edge.is_pressed())
            }
        }
    }

    /// Merges an already-resolved event, bypassing classification.
    pub fn inject(&mut self, event: ResolvedEvent) {
        self.handle_event(Event::Resolved(event));
    }

    /// One full scan: every key in row-major order, then the timeout sweep,
    /// then the report.
    pub fn scan_cycle(&mut self) {
        let addrs: Vec<KeyAddr> = self.board.keymap.addrs().collect();
        for addr in addrs {
            let state = KeySwitchState::new(
                self.pressed.contains(&addr),
                self.was_pressed.contains(&addr),
            );
            if !state.is_active() {
                continue;
            }
            // A masked key is silent until its release.
            if self.is_masked(addr) && !state.toggled_off() {
                continue;
            }
            let code = self.board.keymap.lookup(addr);
            self.handle_event(Event::Raw(RawEvent {
                addr,
                code,
                state,
            }));
            if state.toggled_off() {
                self.board.unmask_key(addr);
            }
        }

        self.qukeys.before_report(&mut self.board);
        self.board.report.send();
        self.board.report.clear();
        self.was_pressed = self.pressed.clone();
    }
}
