use thiserror::Error;

/// All errors that can occur in bestiary-core.
#[derive(Debug, Error)]
pub enum BestiaryError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Exit codes used by the `bestiary` binary on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    GeneralError = 1,
    InvalidArgs = 3,
    FileSystemError = 4,
    NetworkError = 6,
}

pub type Result<T> = std::result::Result<T, BestiaryError>;
