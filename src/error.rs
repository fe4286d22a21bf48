use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForgeError>;

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("{0}")]
    Usage(String),

    #[error("File not found: {0}")]
    InputNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ForgeError {
    /// Process exit code for this error: usage and configuration problems
    /// exit 2, runtime failures exit 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::InputNotFound(_) | Self::Config(_) | Self::Toml(_) => 2,
            Self::Output(_) | Self::Io(_) | Self::Json(_) => 1,
        }
    }
}
