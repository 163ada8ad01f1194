//! Configuration for the Executor

use serde::{Deserialize, Serialize};

/// Configuration for one query's pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Capacity of the work queue between producer and processing stage.
    ///
    /// A full queue blocks the producer; this is the pipeline's only
    /// backpressure mechanism.
    pub work_queue_capacity: usize,

    /// Capacity of the result queue between processing and delivery.
    pub result_queue_capacity: usize,

    /// Upper bound on evaluation passes per key before the key is
    /// abandoned as non-convergent.
    pub max_evaluation_passes: usize,
}

impl ExecutorConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.work_queue_capacity == 0 {
            return Err("work_queue_capacity must be greater than 0".to_string());
        }
        if self.result_queue_capacity == 0 {
            return Err("result_queue_capacity must be greater than 0".to_string());
        }
        if self.max_evaluation_passes == 0 {
            return Err("max_evaluation_passes must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExecutorConfig {
    /// Defaults sized for a batch query over a relational source.
    fn default() -> Self {
        Self {
            work_queue_capacity: 64,
            result_queue_capacity: 64,
            max_evaluation_passes: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExecutorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let mut config = ExecutorConfig::default();
        config.work_queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_passes_is_rejected() {
        let mut config = ExecutorConfig::default();
        config.max_evaluation_passes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExecutorConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExecutorConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config.work_queue_capacity, parsed.work_queue_capacity);
        assert_eq!(config.result_queue_capacity, parsed.result_queue_capacity);
        assert_eq!(config.max_evaluation_passes, parsed.max_evaluation_passes);
    }
}
