use serde::Deserialize;

use crate::error::ConversionError;

/// How the byte length of a decoded blob is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobLength {
    /// Bytes up to the first NUL. Blobs with embedded NUL bytes come back
    /// truncated.
    #[default]
    NulTerminated,
    /// The whole buffer handed out by the engine.
    Exact,
}

fn default_max_depth() -> usize {
    64
}

/// Codec configuration, parsed from TOML or built in code.
///
/// ```toml
/// blob_length = "exact"
/// strict_numeric_width = true
/// max_depth = 32
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CodecConfig {
    #[serde(default)]
    pub blob_length: BlobLength,

    /// Reject generic numbers on encode; callers must use a width wrapper.
    #[serde(default)]
    pub strict_numeric_width: bool,

    /// Maximum composite nesting depth, for both directions.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            blob_length: BlobLength::default(),
            strict_numeric_width: false,
            max_depth: default_max_depth(),
        }
    }
}

impl CodecConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConversionError> {
        let config: Self = toml::from_str(s)
            .map_err(|e| ConversionError::failed(format!("invalid codec config: {e}")))?;
        if config.max_depth == 0 {
            return Err(ConversionError::failed("invalid codec config: max_depth must be > 0"));
        }
        Ok(config)
    }
}
