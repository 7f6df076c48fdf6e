// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Per-element construction settings.
//!
//! Settings are plain serde structs so they can be embedded in larger JSON
//! documents. Missing fields fall back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Default number of buffers in an element's pool.
pub const DEFAULT_POOL_SIZE: usize = 128;

/// Default initial byte capacity of each pooled buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Settings applied when an element is created.
///
/// # Examples
///
/// ```
/// use pushflow::config::{DEFAULT_POOL_SIZE, ElementConfig};
///
/// # fn main() -> pushflow::Result<()> {
/// let config = ElementConfig::from_json(r#"{ "name": "reader", "log_enabled": true }"#)?;
/// assert_eq!(config.name, "reader");
/// assert!(config.log_enabled);
/// assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementConfig {
    /// Element name, used as the worker thread name and in log records.
    pub name: String,
    /// Whether [`crate::Element::log`] emits anything.
    pub log_enabled: bool,
    /// Number of buffers a producing element allocates.
    pub pool_size: usize,
    /// Initial byte capacity of each buffer.
    pub buffer_capacity: usize,
}

impl Default for ElementConfig {
    fn default() -> Self {
        Self {
            name: String::from("element"),
            log_enabled: false,
            pool_size: DEFAULT_POOL_SIZE,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl ElementConfig {
    /// Default settings under the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_log_enabled(mut self, enabled: bool) -> Self {
        self.log_enabled = enabled;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    /// Parses settings from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
