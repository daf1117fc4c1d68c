use crate::report::{KeyReport, ReportBuilder};
use crate::types::{KeyAddr, KeyCode, LayerId, Millis, ResolvedEvent};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Services the qukeys engine needs from the surrounding firmware.
pub trait KeyboardHost {
    /// Layer currently governing `addr`.
    fn active_layer(&self, addr: KeyAddr) -> LayerId;

    /// Layer-aware default code for `addr`.
    fn lookup_key(&self, addr: KeyAddr) -> KeyCode;

    fn now(&self) -> Millis;

    /// Stop reporting `addr` to the rest of the pipeline while it is queued.
    fn mask_key(&mut self, addr: KeyAddr);

    fn unmask_key(&mut self, addr: KeyAddr);

    fn report(&mut self) -> &mut ReportBuilder;

    /// Merges a resolved event into the live report, skipping classification.
    fn inject(&mut self, event: ResolvedEvent) {
        self.report().apply(&event);
    }
}

/// Scoped report shield.
///
/// While alive, the in-progress report holds a copy of the last-sent report,
/// so keys the scan has not reached yet stay pressed. Dropping the shield
/// sends that intermediate report and restores the in-progress one.
pub struct ReportShield<'a, H: KeyboardHost + ?Sized> {
    host: &'a mut H,
    saved: Option<KeyReport>,
}

impl<'a, H: KeyboardHost + ?Sized> ReportShield<'a, H> {
    pub fn new(host: &'a mut H) -> Self {
        let saved = host.report().begin_shield();
        Self {
            host,
            saved: Some(saved),
        }
    }
}

impl<H: KeyboardHost + ?Sized> Deref for ReportShield<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        &*self.host
    }
}

impl<H: KeyboardHost + ?Sized> DerefMut for ReportShield<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut *self.host
    }
}

impl<H: KeyboardHost + ?Sized> Drop for ReportShield<'_, H> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.host.report().end_shield(saved);
        }
    }
}

/// Monotonic millisecond clock.
pub trait Clock {
    fn now(&self) -> Millis;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        self.start.elapsed().as_millis() as Millis
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, t: Millis) {
        self.now.store(t, Ordering::Relaxed);
    }

    pub fn advance(&self, ms: Millis) {
        self.now.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keycode::{KEY_A, KEY_B};
    use crossbeam_channel::Receiver;

    struct Stub {
        report: ReportBuilder,
    }

    impl KeyboardHost for Stub {
        fn active_layer(&self, _addr: KeyAddr) -> LayerId {
            0
        }
        fn lookup_key(&self, _addr: KeyAddr) -> KeyCode {
            KEY_B
        }
        fn now(&self) -> Millis {
            0
        }
        fn mask_key(&mut self, _addr: KeyAddr) {}
        fn unmask_key(&mut self, _addr: KeyAddr) {}
        fn report(&mut self) -> &mut ReportBuilder {
            &mut self.report
        }
    }

    fn stub() -> (Stub, Receiver<KeyReport>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (
            Stub {
                report: ReportBuilder::new(tx),
            },
            rx,
        )
    }

    #[test]
    fn test_shield_restores_on_drop() {
        let (mut host, rx) = stub();
        host.report().press(KEY_A);
        host.report().send();
        host.report().clear();

        {
            let mut shield = ReportShield::new(&mut host);
            assert!(shield.report().current().contains(KEY_A));
            shield.inject(ResolvedEvent::press(KeyAddr::new(0, 0), KEY_B));
        }

        let sent: Vec<_> = rx.try_iter().collect();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].contains(KEY_A) && sent[1].contains(KEY_B));
        assert!(host.report().current().is_empty());
    }

    #[test]
    fn test_manual_clock_is_shared() {
        let clock = ManualClock::new(10);
        let other = clock.clone();
        clock.advance(5);
        assert_eq!(other.now(), 15);
        other.set(100);
        assert_eq!(clock.now(), 100);
    }
}
