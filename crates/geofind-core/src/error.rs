use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GeoFindError>;

/// Which coordinate of a query was out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coordinate {
    Latitude,
    Longitude,
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coordinate::Latitude => write!(f, "Latitude must be between -90 and 90"),
            Coordinate::Longitude => write!(f, "Longitude must be between -180 and 180"),
        }
    }
}

/// Error type for every fallible operation in the crate.
///
/// The first five variants are the semantic kinds a caller is expected to
/// branch on; the remainder carry I/O and codec failures from the layer that
/// hit them. The HTTP adapter maps `OutOfRange` to 400, `NoResults` to 404
/// and everything else to 500 (`CorruptMeta` aborts startup instead).
#[derive(Debug, thiserror::Error)]
pub enum GeoFindError {
    /// A query coordinate was non-finite or outside its valid range.
    #[error("{0}")]
    OutOfRange(Coordinate),

    /// The index is empty or nothing matched the query.
    #[error("no results found")]
    NoResults,

    /// An edge id fell outside the parallel vectors. Indicates meta
    /// corruption; the caller should stop serving.
    #[error("record index {index} out of range (store has {len} records)")]
    IndexOutOfRange { index: usize, len: usize },

    /// The meta blob failed to decode or its parallel vectors disagree in
    /// length. Fatal at load time.
    #[error("corrupt meta: {0}")]
    CorruptMeta(String),

    /// A record could not be read back: short read, bad length prefix or a
    /// payload that fails to decode.
    #[error("corrupt record at offset {offset}: {reason}")]
    CorruptRecord { offset: i64, reason: String },

    /// The caller's cancellation token fired before the query completed.
    #[error("query cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode error: {0}")]
    Encode(#[source] bincode::Error),

    #[error("decode error: {0}")]
    Decode(#[source] bincode::Error),
}

impl GeoFindError {
    /// True for states that are not recoverable by retrying the query.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GeoFindError::IndexOutOfRange { .. } | GeoFindError::CorruptMeta(_)
        )
    }
}
