use anyhow::{bail, Context, Result};
use qukeys_core::config::QukeysConfig;
use qukeys_core::types::Millis;
use qukeys_core::{KeyAddr, KeyReport, Keyboard, Keymap, ManualClock, Qukeys};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Press,
    Release,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub at: Millis,
    pub action: Action,
    pub row: u8,
    pub col: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// `keymap[layer][row][col]` key names.
    pub keymap: Vec<Vec<Vec<String>>>,
    #[serde(default)]
    pub qukeys: Option<QukeysConfig>,
    pub steps: Vec<Step>,
    /// Keep scanning until this time. Defaults to the last step plus the timeout.
    #[serde(default)]
    pub run_until: Option<Millis>,
}

impl Script {
    pub fn parse(text: &str) -> Result<Self> {
        let script: Script = serde_json::from_str(text).context("invalid replay script")?;
        if script.steps.windows(2).any(|w| w[1].at < w[0].at) {
            bail!("replay steps must be in time order");
        }
        Ok(script)
    }

    /// Last scan time: `run_until`, or one past the last step's timeout.
    pub fn end_time(&self, timeout: Millis) -> Millis {
        self.run_until.unwrap_or_else(|| {
            let last = self.steps.last().map_or(0, |s| s.at);
            last.saturating_add(timeout).saturating_add(1)
        })
    }
}

/// Reports in the order they were sent, tagged with the scan time.
pub fn replay(script: &Script, config: &QukeysConfig) -> Result<Vec<(Millis, KeyReport)>> {
    let keymap = Keymap::from_names(&script.keymap).context("invalid keymap")?;
    let qukeys = Qukeys::from_config(config).context("invalid qukeys config")?;
    let timeout = qukeys.timeout();

    let clock = ManualClock::new(0);
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut kb = Keyboard::new(keymap, qukeys, clock.clone(), tx);

    let end = script.end_time(timeout);

    let mut out = Vec::new();
    let mut steps = script.steps.iter().peekable();
    for t in 0..=end {
        clock.set(t);
        while let Some(step) = steps.next_if(|s| s.at <= t) {
            let addr = KeyAddr::new(step.row, step.col);
            debug!("t={} {:?} {:?}", t, step.action, addr);
            match step.action {
                Action::Press => kb.press(addr),
                Action::Release => kb.release(addr),
            }
        }
        kb.scan_cycle();
        out.extend(rx.try_iter().map(|r| (t, r)));
    }
    Ok(out)
}

pub fn format_report(t: Millis, report: &KeyReport) -> String {
    format!("t={} {:?}", t, report)
}
