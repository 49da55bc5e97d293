//! Runtime configuration
//!
//! ```text
//! STRATA_FILL_BYTE=0              initial byte of every materialized field buffer
//! STRATA_FIELD_REALLOCATION=reject  reject | replace
//! ```

use serde::{Deserialize, Serialize};
use std::env;

/// Decimal or `0x` hex byte every field buffer starts filled with
pub const FILL_BYTE_ENV: &str = "STRATA_FILL_BYTE";
/// `reject` or `replace`, see [`FieldReallocation`]
pub const FIELD_REALLOCATION_ENV: &str = "STRATA_FIELD_REALLOCATION";

/// What re-allocating an existing field id with a new size does once a live
/// region has materialized that field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldReallocation {
    /// Fail with `FieldInUse`
    #[default]
    Reject,
    /// Overwrite the size; existing buffers keep their element size
    Replace,
}

impl FieldReallocation {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reject" => Some(Self::Reject),
            "replace" => Some(Self::Replace),
            _ => None,
        }
    }
}

/// Settings a [`Runtime`](crate::Runtime) is created with.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Initial value of every byte of a newly materialized field buffer
    pub fill_byte: u8,
    pub field_reallocation: FieldReallocation,
}

impl RuntimeConfig {
    /// Returns the defaults overridden by any valid environment values.
    /// Invalid values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = env::var(FILL_BYTE_ENV) {
            match parse_byte(&raw) {
                Some(byte) => config.fill_byte = byte,
                None => tracing::warn!(value = %raw, "ignoring invalid {}", FILL_BYTE_ENV),
            }
        }

        if let Ok(raw) = env::var(FIELD_REALLOCATION_ENV) {
            match FieldReallocation::parse(&raw) {
                Some(policy) => config.field_reallocation = policy,
                None => tracing::warn!(value = %raw, "ignoring invalid {}", FIELD_REALLOCATION_ENV),
            }
        }

        config
    }

    /// Returns this config with a different fill byte.
    pub fn with_fill_byte(mut self, fill_byte: u8) -> Self {
        self.fill_byte = fill_byte;
        self
    }

    /// Returns this config with a different re-allocation policy.
    pub fn with_field_reallocation(mut self, policy: FieldReallocation) -> Self {
        self.field_reallocation = policy;
        self
    }
}

/// Decimal or `0x`-prefixed hex byte
fn parse_byte(raw: &str) -> Option<u8> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}
