pub mod config;
pub mod host;
pub mod keyboard;
pub mod keycode;
pub mod keymap;
pub mod queue;
pub mod qukeys;
pub mod registry;
pub mod report;
pub mod types;

pub use host::{Clock, KeyboardHost, ManualClock, ReportShield, SystemClock};
pub use keyboard::Keyboard;
pub use keymap::Keymap;
pub use qukeys::Qukeys;
pub use registry::{LayerMatch, QukeyState, Role};
pub use report::{KeyReport, ReportBuilder};
pub use types::{Decision, Event, KeyAddr, KeyCode, KeyEdge, RawEvent, ResolvedEvent};
