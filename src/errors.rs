use std::fmt;

use crate::layout::FieldKind;

/// Errors surfaced while building codecs or shuttling records.
///
/// Per-record coding itself has no recoverable error path: a state
/// divergence between encoder and decoder is a silent corruption, which
/// the codecs prevent by construction rather than detect at runtime.
#[derive(Debug)]
pub enum Error {
    /// The stream declared a field id this crate does not know.
    UnknownFieldId(u16),
    /// The field is known but the requested codec version is not.
    UnsupportedFieldVersion(FieldKind, u16),
    /// Codec chains cannot mix pointwise and layered field versions.
    MixedFieldVersions,
    /// No builder exists for this point format id.
    UnsupportedPointFormat(u8),
    /// A record buffer's length is not a multiple of the record size.
    BufferLenNotMultipleOfRecordSize {
        buffer_len: usize,
        record_size: usize,
    },
    /// A record layout without any field.
    EmptyLayout,
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownFieldId(id) => write!(f, "field id {} is not known", id),
            Error::UnsupportedFieldVersion(kind, version) => {
                write!(f, "version {} of field {:?} is not supported", version, kind)
            }
            Error::MixedFieldVersions => {
                write!(f, "pointwise and layered fields cannot share a layout")
            }
            Error::UnsupportedPointFormat(id) => {
                write!(f, "point format {} is not supported", id)
            }
            Error::BufferLenNotMultipleOfRecordSize {
                buffer_len,
                record_size,
            } => write!(
                f,
                "buffer length ({}) is not a multiple of the record size ({})",
                buffer_len, record_size
            ),
            Error::EmptyLayout => write!(f, "the record layout has no fields"),
            Error::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
