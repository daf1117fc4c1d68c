use crate::types::{KeyCode, KeyEdge, ResolvedEvent};
use crossbeam_channel::Sender;
use tracing::{trace, warn};

/// NKRO keyboard report: one bit per usage id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyReport {
    bits: [u8; 32],
}

impl KeyReport {
    pub const fn empty() -> Self {
        Self { bits: [0; 32] }
    }

    pub fn press(&mut self, code: KeyCode) {
        if code.is_reportable() {
            self.bits[(code.0 >> 3) as usize] |= 1 << (code.0 & 7);
        }
    }

    pub fn release(&mut self, code: KeyCode) {
        self.bits[(code.0 >> 3) as usize] &= !(1 << (code.0 & 7));
    }

    pub fn contains(&self, code: KeyCode) -> bool {
        self.bits[(code.0 >> 3) as usize] & (1 << (code.0 & 7)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|b| *b == 0)
    }

    /// Active codes in ascending usage order.
    pub fn keys(&self) -> impl Iterator<Item = KeyCode> + '_ {
        (0..=u8::MAX).map(KeyCode).filter(|c| self.contains(*c))
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }
}

impl std::fmt::Debug for KeyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

impl FromIterator<KeyCode> for KeyReport {
    fn from_iter<I: IntoIterator<Item = KeyCode>>(iter: I) -> Self {
        let mut report = KeyReport::empty();
        for code in iter {
            report.press(code);
        }
        report
    }
}

/// Builds the report for the current scan and hands finished reports to the transport.
pub struct ReportBuilder {
    current: KeyReport,
    last_sent: KeyReport,
    sink: Sender<KeyReport>,
}

impl ReportBuilder {
    pub fn new(sink: Sender<KeyReport>) -> Self {
        Self {
            current: KeyReport::empty(),
            last_sent: KeyReport::empty(),
            sink,
        }
    }

    /// Report under construction.
    pub fn current(&self) -> &KeyReport {
        &self.current
    }

    pub fn last_sent(&self) -> &KeyReport {
        &self.last_sent
    }

    pub fn press(&mut self, code: KeyCode) {
        self.current.press(code);
    }

    pub fn release(&mut self, code: KeyCode) {
        self.current.release(code);
    }

    pub fn apply(&mut self, event: &ResolvedEvent) {
        match event.edge {
            KeyEdge::Down | KeyEdge::Held => self.press(event.code),
            KeyEdge::Up => self.release(event.code),
            KeyEdge::Idle => {}
        }
    }

    /// Sends the in-progress report if it differs from the last one sent.
    pub fn send(&mut self) -> bool {
        if self.current == self.last_sent {
            return false;
        }
        trace!("Sending report: {:?}", self.current);
        if self.sink.send(self.current).is_err() {
            warn!("Report receiver disconnected; dropping {:?}", self.current);
        }
        self.last_sent = self.current;
        true
    }

    /// Empties the in-progress report before a new scan.
    pub fn clear(&mut self) {
        self.current = KeyReport::empty();
    }

    /// Swaps the last-sent report in as the in-progress one and returns the
    /// previous in-progress report. Pair with [`ReportBuilder::end_shield`].
    pub fn begin_shield(&mut self) -> KeyReport {
        std::mem::replace(&mut self.current, self.last_sent)
    }

    /// Sends the shielded report, then puts `saved` back in progress.
    pub fn end_shield(&mut self, saved: KeyReport) {
        self.send();
        self.current = saved;
    }
}
