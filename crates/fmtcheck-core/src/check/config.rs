use crate::validation::{ValidationMode, FAVOUR_ACCURACY, FAVOUR_SPEED};

/// Configuration for the checker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    /// Validation modes in priority order; the first one a format supports is used
    pub modes: Vec<ValidationMode>,
    /// Maximum number of bytes read per file (0 = whole file)
    pub max_bytes: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            modes: FAVOUR_SPEED.to_vec(),
            max_bytes: 0,
        }
    }
}

impl CheckConfig {
    /// Creates a new check config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the validation mode priority
    pub fn modes(mut self, modes: impl IntoIterator<Item = ValidationMode>) -> Self {
        self.modes = modes.into_iter().collect();
        self
    }

    /// Prefers leading-bytes validation
    pub fn favour_speed(self) -> Self {
        self.modes(FAVOUR_SPEED)
    }

    /// Prefers full-parse validation
    pub fn favour_accuracy(self) -> Self {
        self.modes(FAVOUR_ACCURACY)
    }

    /// Sets the per-file read limit
    pub fn max_bytes(mut self, max: usize) -> Self {
        self.max_bytes = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_config_builder() {
        let config = CheckConfig::new().favour_accuracy().max_bytes(4096);

        assert_eq!(config.modes, FAVOUR_ACCURACY.to_vec());
        assert_eq!(config.max_bytes, 4096);
        assert_eq!(CheckConfig::new().modes, FAVOUR_SPEED.to_vec());
        assert_eq!(CheckConfig::new().favour_accuracy().favour_speed(), CheckConfig::default());
    }
}
