#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("string too long: {len} bytes (max {max})")]
    StringTooLong { len: usize, max: usize },

    #[error("invalid UTF-8 string")]
    InvalidString,

    #[error("invalid OTMM signature: {found:#010x}")]
    InvalidSignature { found: u32 },

    #[error("OTMM version {0} not supported")]
    UnsupportedVersion(u16),

    #[error("corrupt block: {0}")]
    CorruptBlock(String),

    #[error("block size mismatch: expected {expected} bytes, got {actual}")]
    BlockSizeMismatch { expected: usize, actual: usize },

    #[error("save file too small: {size} bytes (min {min}), target left untouched")]
    SaveTooSmall { size: u64, min: u64 },

    #[error("image error: {0}")]
    Image(String),

    #[error("malformed markers: {0}")]
    MalformedMarkers(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
