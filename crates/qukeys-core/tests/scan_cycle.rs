use crossbeam_channel::Receiver;
use qukeys_core::config::{load_config, parse_config};
use qukeys_core::keycode::{
    KEY_A, KEY_D, KEY_F, KEY_LEFT_CTRL, KEY_LEFT_SHIFT, KEY_S, KEY_SPACE,
};
use qukeys_core::{KeyAddr, KeyCode, KeyReport, Keyboard, Keymap, ManualClock, QukeyState, Qukeys};

const A: KeyAddr = KeyAddr::new(0, 0);
const S: KeyAddr = KeyAddr::new(0, 1);
const D: KeyAddr = KeyAddr::new(0, 2);
const F: KeyAddr = KeyAddr::new(0, 3);
const J: KeyAddr = KeyAddr::new(1, 0);
const SPACE: KeyAddr = KeyAddr::new(1, 3);

const CONFIG: &str = r#"{
    "timeout_ms": 200,
    "qukeys": [
        { "row": 0, "col": 3, "alternate": "LeftShift" },
        { "row": 1, "col": 0, "alternate": "LeftCtrl" }
    ]
}"#;

struct Rig {
    kb: Keyboard<ManualClock>,
    clock: ManualClock,
    rx: Receiver<KeyReport>,
}

impl Rig {
    fn new() -> Self {
        let config = parse_config(CONFIG).expect("parse config");
        Self::with_qukeys(Qukeys::from_config(&config).expect("build qukeys"))
    }

    fn with_qukeys(qukeys: Qukeys) -> Self {
        let keymap = Keymap::from_names(&[
            vec![vec!["A", "S", "D", "F"], vec!["J", "K", "L", "Space"]],
            vec![vec!["1", "2", "3", "4"], vec!["___", "___", "___", "Enter"]],
        ])
        .expect("keymap");
        let clock = ManualClock::new(0);
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            kb: Keyboard::new(keymap, qukeys, clock.clone(), tx),
            clock,
            rx,
        }
    }

    /// Moves time to `t` and runs one scan.
    fn scan_at(&mut self, t: u64) {
        self.clock.set(t);
        self.kb.scan_cycle();
    }

    fn reports(&self) -> Vec<KeyReport> {
        self.rx.try_iter().collect()
    }
}

fn report(keys: &[KeyCode]) -> KeyReport {
    keys.iter().copied().collect()
}

#[test]
fn fast_tap_emits_primary() {
    let mut rig = Rig::new();
    rig.kb.press(F);
    rig.scan_at(0);
    assert!(rig.reports().is_empty());

    rig.kb.release(F);
    rig.scan_at(60);
    assert_eq!(rig.reports(), vec![report(&[KEY_F]), report(&[])]);
}

#[test]
fn hold_past_timeout_emits_alternate_once() {
    let mut rig = Rig::new();
    rig.kb.press(F);
    rig.scan_at(0);

    for t in (10..=200).step_by(10) {
        rig.scan_at(t);
    }
    assert!(rig.reports().is_empty(), "nothing before the deadline");

    rig.scan_at(201);
    assert_eq!(rig.reports(), vec![report(&[KEY_LEFT_SHIFT])]);

    for t in (210..=600).step_by(10) {
        rig.scan_at(t);
    }
    assert!(rig.reports().is_empty(), "alternate is sent exactly once");

    rig.kb.release(F);
    rig.scan_at(610);
    assert_eq!(rig.reports(), vec![report(&[])]);
}

#[test]
fn roll_under_frames_tap_with_alternate() {
    let mut rig = Rig::new();
    rig.kb.press(F);
    rig.scan_at(0);
    rig.kb.press(D);
    rig.scan_at(10);
    rig.kb.release(D);
    rig.scan_at(20);
    rig.kb.release(F);
    rig.scan_at(30);

    assert_eq!(
        rig.reports(),
        vec![
            report(&[KEY_LEFT_SHIFT]),
            report(&[KEY_LEFT_SHIFT, KEY_D]),
            report(&[KEY_LEFT_SHIFT]),
            report(&[]),
        ]
    );
}

#[test]
fn roll_under_with_interleaved_keys() {
    let mut rig = Rig::new();
    rig.kb.press(F);
    rig.scan_at(0);
    rig.kb.press(A);
    rig.scan_at(10);
    rig.kb.press(S);
    rig.scan_at(20);
    rig.kb.press(D);
    rig.scan_at(30);
    assert!(rig.reports().is_empty());

    rig.kb.release(D);
    rig.scan_at(40);
    assert_eq!(
        rig.reports(),
        vec![
            report(&[KEY_LEFT_SHIFT]),
            report(&[KEY_LEFT_SHIFT, KEY_A]),
            report(&[KEY_LEFT_SHIFT, KEY_A, KEY_S]),
            report(&[KEY_LEFT_SHIFT, KEY_A, KEY_S, KEY_D]),
            report(&[KEY_LEFT_SHIFT, KEY_A, KEY_S]),
        ]
    );
    assert_eq!(rig.kb.qukeys().pending().count(), 0);
}

#[test]
fn plain_key_with_empty_queue_has_no_latency() {
    let mut rig = Rig::new();
    rig.kb.press(SPACE);
    rig.scan_at(0);
    assert_eq!(rig.reports(), vec![report(&[KEY_SPACE])]);
    assert_eq!(rig.kb.qukeys().pending().count(), 0);
    assert!(!rig.kb.is_masked(SPACE));
}

#[test]
fn plain_key_behind_timed_out_qukey_follows_it() {
    let mut rig = Rig::new();
    rig.kb.press(F);
    rig.scan_at(0);
    rig.kb.press(A);
    rig.scan_at(50);
    assert!(rig.reports().is_empty());

    rig.scan_at(201);
    assert_eq!(
        rig.reports(),
        vec![
            report(&[KEY_LEFT_SHIFT]),
            report(&[KEY_LEFT_SHIFT, KEY_A]),
        ]
    );
    assert_eq!(rig.kb.qukeys().pending().count(), 0);
}

#[test]
fn second_qukey_waits_for_its_own_deadline() {
    let mut rig = Rig::new();
    rig.kb.press(J);
    rig.scan_at(0);
    rig.kb.press(F);
    rig.scan_at(150);

    rig.scan_at(201);
    assert_eq!(rig.reports(), vec![report(&[KEY_LEFT_CTRL])]);
    assert_eq!(rig.kb.qukeys().pending().count(), 1);

    rig.scan_at(351);
    assert_eq!(rig.reports(), vec![report(&[KEY_LEFT_CTRL, KEY_LEFT_SHIFT])]);
}

#[test]
fn release_resets_for_next_press() {
    let mut rig = Rig::new();
    rig.kb.press(F);
    rig.scan_at(0);
    rig.scan_at(300);
    rig.kb.release(F);
    rig.scan_at(310);
    assert_eq!(
        rig.reports(),
        vec![report(&[KEY_LEFT_SHIFT]), report(&[])]
    );
    assert_eq!(rig.kb.qukeys().state_of(F, 0), Some(QukeyState::Unresolved));

    rig.kb.press(F);
    rig.scan_at(400);
    rig.kb.release(F);
    rig.scan_at(420);
    assert_eq!(rig.reports(), vec![report(&[KEY_F]), report(&[])]);
}

#[test]
fn disabled_engine_is_transparent() {
    let mut rig = Rig::new();
    rig.kb.qukeys_mut().deactivate();
    rig.kb.press(F);
    rig.scan_at(0);
    assert_eq!(rig.reports(), vec![report(&[KEY_F])]);
    assert!(!rig.kb.is_masked(F));
}

#[test]
fn toggling_engine_mid_press_keeps_one_role() {
    let mut rig = Rig::new();
    rig.kb.press(F);
    rig.scan_at(0);
    rig.kb.qukeys_mut().deactivate();
    rig.scan_at(10);
    rig.kb.qukeys_mut().activate();
    rig.scan_at(20);
    assert!(rig.reports().is_empty());
    assert!(rig.kb.is_masked(F));

    rig.scan_at(300);
    assert_eq!(rig.reports(), vec![report(&[KEY_LEFT_SHIFT])]);

    rig.kb.release(F);
    rig.scan_at(310);
    assert_eq!(rig.reports(), vec![report(&[])]);
}

#[test]
fn deactivated_engine_still_times_out_queued_key() {
    let mut rig = Rig::new();
    rig.kb.press(F);
    rig.scan_at(0);
    rig.kb.qukeys_mut().deactivate();

    rig.kb.press(A);
    rig.scan_at(50);
    assert_eq!(rig.reports(), vec![report(&[KEY_A])]);

    rig.scan_at(201);
    assert_eq!(rig.reports(), vec![report(&[KEY_A, KEY_LEFT_SHIFT])]);
    rig.scan_at(202);
    assert!(rig.reports().is_empty(), "alternate stays put while inactive");
}

#[test]
fn layer_specific_qukey() {
    let mut qukeys = Qukeys::new();
    qukeys.register(qukeys_core::LayerMatch::Only(1), F, KEY_LEFT_SHIFT);
    let mut rig = Rig::with_qukeys(qukeys);

    rig.kb.press(F);
    rig.scan_at(0);
    assert_eq!(rig.reports(), vec![report(&[KEY_F])]);
    rig.kb.release(F);
    rig.scan_at(10);
    let _ = rig.reports();

    rig.kb.keymap_mut().activate_layer(1);
    rig.kb.press(F);
    rig.scan_at(20);
    assert!(rig.reports().is_empty());
    rig.kb.release(F);
    rig.scan_at(30);
    assert_eq!(
        rig.reports(),
        vec![report(&[KeyCode(0x21)]), report(&[])],
        "primary on layer 1 is the layer's own code"
    );
}

#[test]
fn config_file_round_trip() {
    let mut path = std::env::temp_dir();
    path.push(format!("qukeys-core-test-{}.json", std::process::id()));
    std::fs::write(&path, CONFIG).expect("write config");

    let config = load_config(&path).expect("load config");
    let _ = std::fs::remove_file(&path);

    let qukeys = Qukeys::from_config(&config).expect("build");
    assert_eq!(qukeys.timeout(), 200);
    assert_eq!(qukeys.registry().len(), 2);
    assert_eq!(
        qukeys.registry().get(0).map(|q| q.alternate),
        Some(KEY_LEFT_SHIFT)
    );
}
