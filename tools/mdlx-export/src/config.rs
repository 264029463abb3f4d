//! mdlx.toml manifest parsing
//!
//! Carries the knobs that depend on the target hardware and the local tool
//! setup rather than on the input model. Every field has a default so the
//! manifest is optional; CLI flags override it.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// mdlx.toml manifest structure
#[derive(Debug, Default, Deserialize)]
pub struct ExportManifest {
    #[serde(default)]
    pub target: TargetSection,
    #[serde(default)]
    pub encoder: EncoderSection,
}

/// Target hardware section
#[derive(Debug, Deserialize)]
pub struct TargetSection {
    /// Coprocessor packet-buffer capacity in quadwords.
    ///
    /// Known tool revisions disagree on this value (100 and 255 have both
    /// shipped), so it is a configuration parameter rather than a baked-in
    /// constant. Check it against the target's actual buffer size.
    /// Default: 100
    #[serde(default = "default_capacity")]
    pub capacity_qwc: usize,
}

impl Default for TargetSection {
    fn default() -> Self {
        Self {
            capacity_qwc: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    100
}

/// External packet encoder section
#[derive(Debug, Deserialize)]
pub struct EncoderSection {
    /// Command invoked once per packet, with the packet file path appended.
    pub command: Option<String>,

    /// Extension of the payload file the command writes next to its input.
    /// Default: "kh2v"
    #[serde(default = "default_payload_extension")]
    pub payload_extension: String,
}

impl Default for EncoderSection {
    fn default() -> Self {
        Self {
            command: None,
            payload_extension: default_payload_extension(),
        }
    }
}

fn default_payload_extension() -> String {
    "kh2v".to_string()
}

impl ExportManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        toml::from_str(&content).context("Failed to parse mdlx.toml")
    }
}
