//! Unified error types for amf3-rs

use std::fmt;
use std::io;

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by host collaborators (registries, externalizers,
/// document builders)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for all crate operations
#[derive(Debug)]
pub enum Error {
    /// I/O error while reading the byte source
    Io(io::Error),
    /// AMF decoding error
    Amf(AmfError),
    /// Invalid configuration
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Amf(e) => write!(f, "AMF error: {}", e),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Amf(e) => Some(e),
            Error::Config(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<AmfError> for Error {
    fn from(err: AmfError) -> Self {
        Error::Amf(err)
    }
}

/// The reference table an index was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    String,
    Object,
    Traits,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::String => write!(f, "string"),
            TableKind::Object => write!(f, "object"),
            TableKind::Traits => write!(f, "traits"),
        }
    }
}

/// AMF3 decoding errors
///
/// Every variant is fatal: the value being decoded is abandoned and the
/// decoder that produced the error must not be reused.
#[derive(Debug)]
pub enum AmfError {
    UnknownMarker(u8),
    UnexpectedEof,
    /// Malformed modified UTF-8, `offset` is relative to the string payload
    InvalidUtf8 { offset: usize },
    InvalidReference { table: TableKind, index: usize },
    NestingTooDeep,
    TableOverflow { table: TableKind, max: usize },
    Instantiation { class_name: String, source: BoxError },
    Property { class_name: String, property: String, source: BoxError },
    Externalizer { class_name: String, source: BoxError },
    Resolve { class_name: String, source: BoxError },
    NotExternalizable { class_name: String },
    Document(BoxError),
    Io(io::Error),
}

impl fmt::Display for AmfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmfError::UnknownMarker(m) => write!(f, "Unknown AMF3 marker: 0x{:02x}", m),
            AmfError::UnexpectedEof => write!(f, "Unexpected end of AMF data"),
            AmfError::InvalidUtf8 { offset } => {
                write!(f, "Malformed UTF-8 input around byte {}", offset)
            }
            AmfError::InvalidReference { table, index } => {
                write!(f, "Invalid AMF {} reference: {}", table, index)
            }
            AmfError::NestingTooDeep => write!(f, "AMF nesting too deep"),
            AmfError::TableOverflow { table, max } => {
                write!(f, "AMF {} table exceeds {} entries", table, max)
            }
            AmfError::Instantiation { class_name, source } => {
                write!(f, "Could not instantiate type '{}': {}", class_name, source)
            }
            AmfError::Property {
                class_name,
                property,
                source,
            } => write!(
                f,
                "Could not set property '{}' on type '{}': {}",
                property, class_name, source
            ),
            AmfError::Externalizer { class_name, source } => write!(
                f,
                "Could not read externalized object of type '{}': {}",
                class_name, source
            ),
            AmfError::Resolve { class_name, source } => {
                write!(f, "Could not resolve object of type '{}': {}", class_name, source)
            }
            AmfError::NotExternalizable { class_name } => {
                write!(f, "Type '{}' is not externalizable", class_name)
            }
            AmfError::Document(e) => write!(f, "Could not build XML document: {}", e),
            AmfError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for AmfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AmfError::Instantiation { source, .. }
            | AmfError::Property { source, .. }
            | AmfError::Externalizer { source, .. }
            | AmfError::Resolve { source, .. }
            | AmfError::Document(source) => Some(source.as_ref()),
            AmfError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for AmfError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            AmfError::UnexpectedEof
        } else {
            AmfError::Io(err)
        }
    }
}

/// Failure reported by a collaborator that reads an object's own content
///
/// Decode errors raised while the collaborator was reading nested values are
/// passed through untouched; anything else gets wrapped with the class name.
#[derive(Debug)]
pub enum ContentError {
    Decode(AmfError),
    Other(BoxError),
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::Decode(e) => write!(f, "{}", e),
            ContentError::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ContentError {}

impl From<AmfError> for ContentError {
    fn from(err: AmfError) -> Self {
        ContentError::Decode(err)
    }
}

impl From<BoxError> for ContentError {
    fn from(err: BoxError) -> Self {
        ContentError::Other(err)
    }
}

impl ContentError {
    /// Convert into a decode error, wrapping foreign failures with `class_name`
    pub fn into_amf(self, class_name: &str) -> AmfError {
        match self {
            ContentError::Decode(e) => e,
            ContentError::Other(source) => AmfError::Externalizer {
                class_name: class_name.to_string(),
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_error_display() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionReset, "connection reset");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error"));

        let err = Error::Amf(AmfError::UnknownMarker(0xFF));
        assert!(err.to_string().contains("AMF error"));
        assert!(err.to_string().contains("0xff"));

        let err = Error::Config("max_nesting_depth must be positive".into());
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_amf_error_display() {
        assert!(AmfError::UnknownMarker(0xAB).to_string().contains("0xab"));
        assert!(AmfError::UnexpectedEof.to_string().contains("end of AMF"));
        assert!(AmfError::InvalidUtf8 { offset: 3 }
            .to_string()
            .contains("around byte 3"));

        let err = AmfError::InvalidReference {
            table: TableKind::Traits,
            index: 42,
        };
        assert!(err.to_string().contains("traits"));
        assert!(err.to_string().contains("42"));

        assert!(AmfError::NestingTooDeep.to_string().contains("deep"));

        let err = AmfError::Instantiation {
            class_name: "com.example.User".into(),
            source: "no default constructor".into(),
        };
        assert!(err.to_string().contains("com.example.User"));
        assert!(err.to_string().contains("no default constructor"));
    }

    #[test]
    fn test_error_source() {
        let err = AmfError::Externalizer {
            class_name: "X".into(),
            source: "boom".into(),
        };
        assert!(StdError::source(&err).is_some());
        assert!(StdError::source(&AmfError::UnexpectedEof).is_none());

        let err = Error::Config("bad".into());
        assert!(StdError::source(&err).is_none());
    }

    #[test]
    fn test_io_eof_maps_to_unexpected_eof() {
        let err: AmfError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, AmfError::UnexpectedEof));

        let err: AmfError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(err, AmfError::Io(_)));
    }

    #[test]
    fn test_content_error_into_amf() {
        let err = ContentError::Decode(AmfError::NestingTooDeep).into_amf("A");
        assert!(matches!(err, AmfError::NestingTooDeep));

        let err = ContentError::Other("bad payload".into()).into_amf("com.example.Blob");
        match err {
            AmfError::Externalizer { class_name, .. } => {
                assert_eq!(class_name, "com.example.Blob")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
