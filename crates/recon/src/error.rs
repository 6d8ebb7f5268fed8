use thiserror::Error;

use crate::model::Domain;

#[derive(Debug, Error)]
pub enum SettleError {
    /// TOML / JSON parse or deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty column name, duplicate marker, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A column the rules reference is absent from the input table.
    #[error("{domain} data: missing column '{column}'")]
    MissingColumn { domain: Domain, column: String },
}

impl SettleError {
    /// Stable name of the error variant, for operator-facing reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "ConfigParse",
            Self::ConfigValidation(_) => "ConfigValidation",
            Self::MissingColumn { .. } => "MissingColumn",
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::ConfigParse(_) | Self::ConfigValidation(_))
    }
}
