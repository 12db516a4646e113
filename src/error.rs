use thiserror::Error;

/// configuration mistakes. these are operator errors and are never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown {family} policy '{name}'")]
    UnknownPolicy { family: &'static str, name: String },
    #[error("{field} = {value} is out of range (allowed: {allowed})")]
    OutOfRange {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("settings file: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn out_of_range(field: &'static str, value: impl ToString, allowed: &'static str) -> Self {
        ConfigError::OutOfRange {
            field,
            value: value.to_string(),
            allowed,
        }
    }
}

/// failures decoding or encoding a serialized genome
#[derive(Debug, Error)]
pub enum DnaError {
    #[error("failed to encode DNA: {0}")]
    Encode(#[source] bincode::Error),
    #[error("failed to decode DNA: {0}")]
    Decode(#[source] bincode::Error),
    #[error("not a DNA blob (bad magic)")]
    BadMagic,
    #[error("unsupported DNA version {0}")]
    UnsupportedVersion(u16),
    #[error("DNA shape mismatch: run expects {expected}, blob has {found}")]
    Mismatch { expected: String, found: String },
    #[error("malformed DNA: {0}")]
    Malformed(String),
    #[error("DNA file: {0}")]
    Io(#[from] std::io::Error),
}

/// failures writing rasters, mosaics or vector output
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("export i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("raster buffer does not match {width}x{height}")]
    Raster { width: u32, height: u32 },
}

/// umbrella error for a full run
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dna(#[from] DnaError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
