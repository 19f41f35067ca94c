use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Deep pointer at {base:#x} could not be resolved by any strategy")]
    DeepPointerUnresolved { base: u64 },

    #[error("No layout matches main module size {module_size:#x} and no fallback is configured")]
    VersionMismatch { module_size: u32 },

    #[error("Unknown layout: {0}")]
    UnknownLayout(String),

    #[error("Config parse error: {0}")]
    ConfigParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a read failure for `address`.
    pub(crate) fn read_failed(address: u64, message: impl Into<String>) -> Self {
        Error::MemoryReadFailed {
            address,
            message: message.into(),
        }
    }
}
