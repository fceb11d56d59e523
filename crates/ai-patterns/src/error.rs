use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("unknown archetype `{0}`")]
    UnknownArchetype(String),

    #[error("archetype `{archetype}` has no pattern named `{pattern}`")]
    UnknownPattern { archetype: String, pattern: String },

    #[error("archetype `{archetype}` already has a pattern named `{pattern}`")]
    DuplicatePattern { archetype: String, pattern: String },

    #[error("failed to read pattern tuning from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pattern tuning in {path}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type Result<T> = std::result::Result<T, PatternError>;
