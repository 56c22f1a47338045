//! Machine configuration.
//!
//! Loaded from JSON; any field left out takes the stock COSMAC ELF value.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Stock ELF RAM: 256 bytes.
pub const DEFAULT_MEMORY_SIZE: usize = 256;

/// Stock ELF crystal.
pub const DEFAULT_CLOCK_HZ: u32 = 1_760_640;

pub const DEFAULT_FRAMES_PER_SECOND: u32 = 60;

/// Clock periods per machine cycle.
pub const CLOCKS_PER_CYCLE: u32 = 8;

/// Parameters of the emulated ELF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// RAM size in bytes, 1 to 65536.
    pub memory_size: usize,
    pub clock_hz: u32,
    pub frames_per_second: u32,
}

impl MachineConfig {
    /// Machine cycles executed per frame.
    pub fn cycles_per_frame(&self) -> u32 {
        self.clock_hz / CLOCKS_PER_CYCLE / self.frames_per_second.max(1)
    }

    /// Check every field is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory_size == 0 || self.memory_size > 0x10000 {
            return Err(ConfigError::Invalid(format!(
                "memory_size must be 1-65536, got {}",
                self.memory_size
            )));
        }
        if self.frames_per_second == 0 {
            return Err(ConfigError::Invalid("frames_per_second must be non-zero".into()));
        }
        if self.cycles_per_frame() == 0 {
            return Err(ConfigError::Invalid(format!(
                "clock_hz {} is too slow for {} frames per second",
                self.clock_hz, self.frames_per_second
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_json(&text)
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            clock_hz: DEFAULT_CLOCK_HZ,
            frames_per_second: DEFAULT_FRAMES_PER_SECOND,
        }
    }
}

/// Errors that can occur loading a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("invalid configuration file: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
