use crate::keycode::key_from_name;
use crate::types::{KeyAddr, KeyCode, LayerId};
use thiserror::Error;

pub const MAX_LAYERS: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeymapError {
    #[error("keymap has no layers")]
    Empty,
    #[error("too many layers ({0}, max {max})", max = MAX_LAYERS)]
    TooManyLayers(usize),
    #[error("layer {layer} row {row} has {found} keys, expected {expected}")]
    RaggedRow {
        layer: usize,
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("layer {layer} has {found} rows, expected {expected}")]
    RowCount {
        layer: usize,
        found: usize,
        expected: usize,
    },
    #[error("unknown key name {name:?} at layer {layer} ({row}, {col})")]
    UnknownKey {
        name: String,
        layer: usize,
        row: usize,
        col: usize,
    },
}

/// Layered key grid with a layer activation mask. Layer 0 is always active.
#[derive(Debug, Clone)]
pub struct Keymap {
    rows: usize,
    cols: usize,
    layers: Vec<Vec<KeyCode>>,
    active: u32,
}

impl Keymap {
    /// Builds a keymap from `layers[layer][row][col]`.
    pub fn new(layers: Vec<Vec<Vec<KeyCode>>>) -> Result<Self, KeymapError> {
        if layers.is_empty() {
            return Err(KeymapError::Empty);
        }
        if layers.len() > MAX_LAYERS {
            return Err(KeymapError::TooManyLayers(layers.len()));
        }
        let rows = layers[0].len();
        let cols = layers[0].first().map_or(0, |r| r.len());

        let mut flat = Vec::with_capacity(layers.len());
        for (l, layer) in layers.into_iter().enumerate() {
            if layer.len() != rows {
                return Err(KeymapError::RowCount {
                    layer: l,
                    found: layer.len(),
                    expected: rows,
                });
            }
            let mut grid = Vec::with_capacity(rows * cols);
            for (r, row) in layer.into_iter().enumerate() {
                if row.len() != cols {
                    return Err(KeymapError::RaggedRow {
                        layer: l,
                        row: r,
                        found: row.len(),
                        expected: cols,
                    });
                }
                grid.extend(row);
            }
            flat.push(grid);
        }

        Ok(Self {
            rows,
            cols,
            layers: flat,
            active: 1,
        })
    }

    /// Builds a keymap from key names (see [`crate::keycode`]).
    pub fn from_names<S: AsRef<str>>(layers: &[Vec<Vec<S>>]) -> Result<Self, KeymapError> {
        let mut codes = Vec::with_capacity(layers.len());
        for (l, layer) in layers.iter().enumerate() {
            let mut grid = Vec::with_capacity(layer.len());
            for (r, row) in layer.iter().enumerate() {
                let mut out = Vec::with_capacity(row.len());
                for (c, name) in row.iter().enumerate() {
                    let code = key_from_name(name.as_ref()).ok_or_else(|| {
                        KeymapError::UnknownKey {
                            name: name.as_ref().to_string(),
                            layer: l,
                            row: r,
                            col: c,
                        }
                    })?;
                    out.push(code);
                }
                grid.push(out);
            }
            codes.push(grid);
        }
        Self::new(codes)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Every address of the grid in row-major order.
    pub fn addrs(&self) -> impl Iterator<Item = KeyAddr> + '_ {
        (0..self.rows).flat_map(move |r| (0..self.cols).map(move |c| KeyAddr::new(r as u8, c as u8)))
    }

    fn index(&self, addr: KeyAddr) -> Option<usize> {
        let (r, c) = (addr.row as usize, addr.col as usize);
        if addr.is_unknown() || r >= self.rows || c >= self.cols {
            return None;
        }
        Some(r * self.cols + c)
    }

    pub fn activate_layer(&mut self, layer: LayerId) {
        if (layer as usize) < self.layers.len() {
            self.active |= 1 << layer;
        }
    }

    pub fn deactivate_layer(&mut self, layer: LayerId) {
        if layer != 0 && (layer as usize) < MAX_LAYERS {
            self.active &= !(1u32 << layer);
        }
    }

    pub fn is_layer_active(&self, layer: LayerId) -> bool {
        (layer as usize) < self.layers.len() && (self.active & (1 << layer)) != 0
    }

    /// Highest active layer with a non-transparent entry for `addr`.
    pub fn active_layer_for(&self, addr: KeyAddr) -> LayerId {
        let Some(i) = self.index(addr) else {
            return 0;
        };
        (0..self.layers.len())
            .rev()
            .find(|&l| (self.active & (1 << l)) != 0 && !self.layers[l][i].is_transparent())
            .unwrap_or(0) as LayerId
    }

    /// Code for `addr` on its governing layer.
    pub fn lookup(&self, addr: KeyAddr) -> KeyCode {
        match self.index(addr) {
            Some(i) => {
                let code = self.layers[self.active_layer_for(addr) as usize][i];
                if code.is_transparent() {
                    KeyCode::NO_KEY
                } else {
                    code
                }
            }
            None => KeyCode::NO_KEY,
        }
    }
}
