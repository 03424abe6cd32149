use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config error: could not read [{path}]: {source}")]
    Read {
        path: String,
        source: std::io::Error
    },
    #[error("Config error: could not parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Config error: [{field}] must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: String
    }
}
