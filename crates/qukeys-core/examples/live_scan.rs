use qukeys_core::config::load_config;
use qukeys_core::{KeyAddr, Keyboard, Keymap, Qukeys, SystemClock};
use std::path::Path;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = Path::new("qukeys.json");
    let qukeys = if path.exists() {
        println!("Loading qukeys from {:?}", path);
        Qukeys::from_config(&load_config(path)?)?
    } else {
        println!("No config at {:?}, using home-row shift on F.", path);
        let mut q = Qukeys::new();
        q.register(
            qukeys_core::LayerMatch::All,
            KeyAddr::new(0, 3),
            qukeys_core::keycode::KEY_LEFT_SHIFT,
        );
        q
    };

    let keymap = Keymap::from_names(&[vec![vec!["A", "S", "D", "F"]]])?;
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut kb = Keyboard::new(keymap, qukeys, SystemClock::default(), tx);

    // Hold F past the timeout while tapping D.
    let f = KeyAddr::new(0, 3);
    let d = KeyAddr::new(0, 2);
    let script = [(0, f, true), (30, d, true), (60, d, false), (700, f, false)];

    let mut step = 0;
    for ms in 0..800u64 {
        while step < script.len() && script[step].0 <= ms {
            let (_, addr, down) = script[step];
            if down {
                kb.press(addr);
            } else {
                kb.release(addr);
            }
            step += 1;
        }
        kb.scan_cycle();
        for report in rx.try_iter() {
            println!("t={:>4}ms {:?}", kb.now(), report);
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    Ok(())
}
