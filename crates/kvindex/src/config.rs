//! Runtime configuration for the index layer.
//!
//! Configuration is plain data: deserialized once (usually from TOML) and
//! handed to `Db` by value. Nothing here is consulted through globals.

use crate::{
    PREFERRED_MAX_ID_COUNT_PER_BLOCK,
    error::{ErrorClass, ErrorOrigin, InternalError},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("prefix.preferred_max_ids_per_block must be at least 1")]
    EmptyBlock,
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Config, err.to_string())
    }
}

///
/// DbConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DbConfig {
    pub prefix: PrefixConfig,
}

impl DbConfig {
    /// Parse and validate a TOML configuration document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.preferred_max_ids_per_block == 0 {
            return Err(ConfigError::EmptyBlock);
        }

        Ok(())
    }
}

///
/// PrefixConfig
///
/// Postings block sizing for prefix indexes.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrefixConfig {
    /// Tail blocks holding this many ids start a new block on append.
    pub preferred_max_ids_per_block: usize,
}

impl Default for PrefixConfig {
    fn default() -> Self {
        Self {
            preferred_max_ids_per_block: PREFERRED_MAX_ID_COUNT_PER_BLOCK,
        }
    }
}

///
/// TESTS
///
