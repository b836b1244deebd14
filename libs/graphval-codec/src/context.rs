use graphval_api::{CodecConfig, ConversionError};

use crate::Result;

/// Per-call conversion state: the active config and the current nesting depth.
///
/// Copied into every recursive call. Holds no engine handles.
#[derive(Debug, Clone, Copy)]
pub struct Context<'c> {
    config: &'c CodecConfig,
    depth: usize,
}

impl<'c> Context<'c> {
    pub fn new(config: &'c CodecConfig) -> Self {
        Self { config, depth: 0 }
    }

    pub fn config(&self) -> &'c CodecConfig {
        self.config
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context for the children of a composite value.
    pub fn nested(self) -> Result<Self> {
        let depth = self.depth + 1;
        if depth > self.config.max_depth {
            return Err(ConversionError::failed(format!(
                "value nested deeper than max_depth ({})",
                self.config.max_depth
            )));
        }
        Ok(Self { depth, ..self })
    }
}
