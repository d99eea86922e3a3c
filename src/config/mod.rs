//! Paging options loading and validation

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default cap on `first`/`last`
pub const DEFAULT_MAX_PAGE_SIZE: usize = 50;

/// Options shared by every paging call of a paginator
///
/// # Example
/// ```yaml
/// max_page_size: 100
/// default_page_size: 20
/// require_paging_boundaries: false
/// include_total_count: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingOptions {
    /// Largest accepted `first` or `last`
    pub max_page_size: usize,

    /// Page size used when neither `first` nor `last` is given
    ///
    /// `None` pages forward without a bound.
    pub default_page_size: Option<usize>,

    /// Reject requests that give neither `first` nor `last`
    pub require_paging_boundaries: bool,

    /// Count the whole source for every page
    pub include_total_count: bool,
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            default_page_size: None,
            require_paging_boundaries: false,
            include_total_count: false,
        }
    }
}

impl PagingOptions {
    /// Load options from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::parse(&content, Some(path.display().to_string()))
    }

    /// Load options from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse(yaml, None)
    }

    fn parse(yaml: &str, file: Option<String>) -> Result<Self, ConfigError> {
        let options: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file,
            message: e.to_string(),
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Check that the options are consistent
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_page_size".to_string(),
                value: "0".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if let Some(default) = self.default_page_size
            && default > self.max_page_size
        {
            return Err(ConfigError::InvalidValue {
                field: "default_page_size".to_string(),
                value: default.to_string(),
                message: format!("must not exceed max_page_size ({})", self.max_page_size),
            });
        }

        Ok(())
    }

    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    pub fn with_default_page_size(mut self, default_page_size: usize) -> Self {
        self.default_page_size = Some(default_page_size);
        self
    }

    pub fn with_required_boundaries(mut self) -> Self {
        self.require_paging_boundaries = true;
        self
    }

    pub fn with_total_count(mut self) -> Self {
        self.include_total_count = true;
        self
    }
}
