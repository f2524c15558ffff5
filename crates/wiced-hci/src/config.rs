//! Session configuration.
//!
//! Every field has a default matching the controller's documented bring-up
//! timings, so an empty YAML document is a valid configuration:
//!
//! ```yaml
//! max_payload: 1024
//! settle_delay_ms: 1000
//! timeouts:
//!   reset_ms: 110
//!   chunk_ack_ms: 220
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants::*;
use crate::error::{HciError, Result};

/// Read timeouts used during firmware bring-up, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BringUpTimeouts {
    /// Wait for the reset command complete event.
    pub reset_ms: u64,
    /// Wait for the bytes following a hardware error event.
    pub hardware_error_ms: u64,
    /// Wait for the minidriver command complete event.
    pub minidriver_ms: u64,
    /// Wait for each firmware chunk acknowledgement.
    pub chunk_ack_ms: u64,
}

impl Default for BringUpTimeouts {
    fn default() -> Self {
        BringUpTimeouts {
            reset_ms: RESET_TIMEOUT.as_millis() as u64,
            hardware_error_ms: HARDWARE_ERROR_TIMEOUT.as_millis() as u64,
            minidriver_ms: MINIDRIVER_TIMEOUT.as_millis() as u64,
            chunk_ack_ms: CHUNK_ACK_TIMEOUT.as_millis() as u64,
        }
    }
}

impl BringUpTimeouts {
    /// Reset response timeout.
    pub fn reset(&self) -> Duration {
        Duration::from_millis(self.reset_ms)
    }

    /// Hardware error follow-up timeout.
    pub fn hardware_error(&self) -> Duration {
        Duration::from_millis(self.hardware_error_ms)
    }

    /// Minidriver response timeout.
    pub fn minidriver(&self) -> Duration {
        Duration::from_millis(self.minidriver_ms)
    }

    /// Chunk acknowledgement timeout.
    pub fn chunk_ack(&self) -> Duration {
        Duration::from_millis(self.chunk_ack_ms)
    }
}

/// Configuration for a [`WicedHci`](crate::WicedHci) session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HciConfig {
    /// Payload capacity of the session's frame buffers.
    pub max_payload: usize,
    /// Delay between firmware launch and the start of the reader thread.
    pub settle_delay_ms: u64,
    /// Name given to the reader thread.
    pub reader_thread_name: String,
    /// Bring-up read timeouts.
    pub timeouts: BringUpTimeouts,
}

impl Default for HciConfig {
    fn default() -> Self {
        HciConfig {
            max_payload: DEFAULT_MAX_PAYLOAD,
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            reader_thread_name: "wiced-hci-reader".to_string(),
            timeouts: BringUpTimeouts::default(),
        }
    }
}

impl HciConfig {
    /// Parse a YAML document and validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: HciConfig =
            serde_yaml::from_str(yaml).map_err(|e| HciError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_payload == 0 || self.max_payload > MAX_PAYLOAD_LIMIT {
            return Err(HciError::Config(format!(
                "max_payload must be between 1 and {}, got {}",
                MAX_PAYLOAD_LIMIT, self.max_payload
            )));
        }
        if self.reader_thread_name.is_empty() {
            return Err(HciError::Config("reader_thread_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Settle delay as a duration.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = HciConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, HciConfig::default());
        assert_eq!(config.timeouts.reset(), Duration::from_millis(110));
        assert_eq!(config.timeouts.chunk_ack(), Duration::from_millis(220));
        assert_eq!(config.settle_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = "max_payload: 2048\nsettle_delay_ms: 0\ntimeouts:\n  chunk_ack_ms: 500\n";
        let config = HciConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.max_payload, 2048);
        assert_eq!(config.settle_delay_ms, 0);
        assert_eq!(config.timeouts.chunk_ack_ms, 500);
        assert_eq!(config.timeouts.reset_ms, 110);
    }

    #[test]
    fn test_validate_rejects_bad_payload_size() {
        assert!(matches!(
            HciConfig::from_yaml_str("max_payload: 4096"),
            Err(HciError::Config(_))
        ));
        assert!(matches!(
            HciConfig::from_yaml_str("max_payload: 0"),
            Err(HciError::Config(_))
        ));
        assert!(matches!(
            HciConfig::from_yaml_str("max_payload: [1, 2]"),
            Err(HciError::Config(_))
        ));
    }
}
