//! Error types for orbitview

use thiserror::Error;

/// Main error type for orbitview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Degenerate vector: length {length} is too small to normalize")]
    DegenerateVector { length: f32 },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Parse error: {reason}")]
    Parse { reason: String },

    #[error("Render dispatch error: {0}")]
    RenderDispatch(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of an [`Error`], suitable for display in a UI shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Math,
    UnsupportedFormat,
    Parse,
    RenderDispatch,
    InvalidData,
    Io,
    Config,
}

impl Error {
    /// Shorthand for building a [`Error::Parse`]
    pub fn parse(reason: impl Into<String>) -> Self {
        Error::Parse { reason: reason.into() }
    }

    /// Report a validation failure of decoded data as a parse failure of
    /// the `format` file it came from
    pub fn invalid_as_parse(self, format: &str) -> Self {
        match self {
            Error::InvalidData(reason) => Error::parse(format!("{}: {}", format, reason)),
            other => other,
        }
    }

    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DegenerateVector { .. } => ErrorKind::Math,
            Error::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::RenderDispatch(_) => ErrorKind::RenderDispatch,
            Error::InvalidData(_) => ErrorKind::InvalidData,
            Error::Io(_) => ErrorKind::Io,
            Error::Config(_) => ErrorKind::Config,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Math => "math",
            ErrorKind::UnsupportedFormat => "unsupported-format",
            ErrorKind::Parse => "parse",
            ErrorKind::RenderDispatch => "render-dispatch",
            ErrorKind::InvalidData => "invalid-data",
            ErrorKind::Io => "io",
            ErrorKind::Config => "config",
        };
        f.write_str(name)
    }
}

/// Result type alias for orbitview operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::parse("bad").kind(), ErrorKind::Parse);
        assert_eq!(
            Error::DegenerateVector { length: 0.0 }.kind(),
            ErrorKind::Math
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(Error::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_invalid_data_reported_as_parse() {
        let err = Error::InvalidData("vertex 0 has a non-finite position".into()).invalid_as_parse("STL");
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.to_string(), "Parse error: STL: vertex 0 has a non-finite position");
        let io = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(io.invalid_as_parse("STL").kind(), ErrorKind::Io);
    }

    #[test]
    fn test_parse_error_message() {
        let err = Error::parse("line 3: expected 3 coordinates");
        assert_eq!(err.to_string(), "Parse error: line 3: expected 3 coordinates");
    }
}
