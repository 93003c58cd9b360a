use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::schema;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Compiler configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Schema prefix prepended to every table reference (empty = none)
    #[validate(custom(function = validate_schema_prefix))]
    pub schema_prefix: String,

    /// Dimension of the vector embeddings stored in kg_NodeEmbeddings
    #[validate(range(
        min = 1,
        max = 4096,
        message = "Embedding dimension must be between 1 and 4096"
    ))]
    pub embedding_dimension: u32,

    /// Largest fixed hop count a relationship pattern may request
    #[validate(range(
        min = 1,
        max = 4,
        message = "Max fixed hops must be between 1 and 4"
    ))]
    pub max_fixed_hops: u32,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            schema_prefix: String::new(),
            embedding_dimension: 768,
            max_fixed_hops: 4,
        }
    }
}

impl CompilerConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            schema_prefix: env::var("VECGRAPH_SCHEMA_PREFIX").unwrap_or_default(),
            embedding_dimension: parse_env_var("VECGRAPH_EMBEDDING_DIMENSION", "768")?,
            max_fixed_hops: parse_env_var("VECGRAPH_MAX_FIXED_HOPS", "4")?,
        };

        config.validate()?;
        Ok(config)
    }
}

fn validate_schema_prefix(prefix: &str) -> Result<(), ValidationError> {
    if prefix.is_empty() || schema::is_valid_identifier(prefix) {
        Ok(())
    } else {
        let mut error = ValidationError::new("schema_prefix");
        error.message = Some("Schema prefix must be identifier-shaped".into());
        Err(error)
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
