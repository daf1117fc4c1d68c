use crate::keycode::key_from_name;
use crate::qukeys::{Qukeys, DEFAULT_TIMEOUT_MS};
use crate::types::{KeyAddr, KeyCode, LayerId, Millis};
use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("qukey #{index}: unknown key name {name:?}")]
    UnknownKey { index: usize, name: String },
    #[error("qukey #{index}: ({row}, {col}) is the reserved no-key address")]
    ReservedAddr { index: usize, row: u8, col: u8 },
}

/// A key given either by name ("LeftShift") or by raw usage id (225).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySpec {
    Code(u8),
    Name(String),
}

impl KeySpec {
    pub fn resolve(&self) -> Option<KeyCode> {
        match self {
            KeySpec::Code(c) => Some(KeyCode(*c)),
            KeySpec::Name(name) => key_from_name(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QukeyDef {
    /// Missing means every layer.
    #[serde(default)]
    pub layer: Option<LayerId>,
    pub row: u8,
    pub col: u8,
    pub alternate: KeySpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QukeysConfig {
    pub enabled: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: Millis,
    pub qukeys: Vec<QukeyDef>,
}

fn default_timeout_ms() -> Millis {
    DEFAULT_TIMEOUT_MS
}

impl Default for QukeysConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            qukeys: Vec::new(),
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<QukeysConfig, ConfigError> {
    let raw = std::fs::read(path.as_ref())?;
    let text = decode_config_bytes(&raw);
    let config = parse_config(text.as_ref())?;
    info!(
        "Loaded {} qukeys from {:?} (timeout {}ms)",
        config.qukeys.len(),
        path.as_ref(),
        config.timeout_ms
    );
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<QukeysConfig, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

/// Picks the encoding from a BOM, then UTF-8, then Shift_JIS for configs
/// saved by older Windows editors.
fn decode_config_bytes(raw: &[u8]) -> Cow<'_, str> {
    let (encoding, body) = match Encoding::for_bom(raw) {
        Some((encoding, bom_len)) => (encoding, &raw[bom_len..]),
        None if std::str::from_utf8(raw).is_ok() => (UTF_8, raw),
        None => (SHIFT_JIS, raw),
    };
    let (text, lossy) = encoding.decode_without_bom_handling(body);
    if lossy {
        warn!("Config is not clean {}; undecodable bytes replaced", encoding.name());
    } else if encoding != UTF_8 {
        debug!("Config decoded as {}", encoding.name());
    }
    text
}

impl Qukeys {
    /// Builds an engine from a config. Registration order follows the file.
    pub fn from_config(config: &QukeysConfig) -> Result<Self, ConfigError> {
        let mut qukeys = Qukeys::new();
        qukeys.set_timeout(config.timeout_ms);
        if !config.enabled {
            qukeys.deactivate();
        }

        for (index, def) in config.qukeys.iter().enumerate() {
            let addr = KeyAddr::new(def.row, def.col);
            if addr.is_unknown() {
                return Err(ConfigError::ReservedAddr {
                    index,
                    row: def.row,
                    col: def.col,
                });
            }
            let alternate = def.alternate.resolve().ok_or_else(|| ConfigError::UnknownKey {
                index,
                name: match &def.alternate {
                    KeySpec::Name(n) => n.clone(),
                    KeySpec::Code(c) => c.to_string(),
                },
            })?;
            qukeys.register(def.layer.into(), addr, alternate);
            debug!("Registered qukey {:?} -> {:?} (layer {:?})", addr, alternate, def.layer);
        }

        Ok(qukeys)
    }
}
