//! Container log-driver configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Log-driver configuration shared by every module in a composition.
///
/// The driver name is validated once, when the composition is assembled,
/// rather than per module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    driver: String,
    #[serde(default)]
    options: BTreeMap<String, String>,
}

impl LoggingConfig {
    /// Creates a logging config with the given driver and no options.
    pub fn new(driver: impl Into<String>) -> Result<Self, ValidationError> {
        let driver = driver.into();
        if driver.trim().is_empty() {
            return Err(ValidationError::BlankLogDriver);
        }
        Ok(Self {
            driver,
            options: BTreeMap::new(),
        })
    }

    /// Adds a driver option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Driver name, e.g. `"json-file"`.
    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Driver options.
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }
}
