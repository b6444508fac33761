//! Error types reported by the writer and its output layer.

use std::{borrow::Cow, fmt, io};

/// An error raised by [`XmlTextWriter`](crate::writer::XmlTextWriter) or
/// [`XmlOutputBuffer`](crate::io::XmlOutputBuffer).
///
/// The variants keep API-usage mistakes (`InvalidArgument`,
/// `UnsupportedEncoding`, `State`) apart from operational failures (`Io`)
/// and from failures to open a sink in the first place (`Construction`).
#[derive(Debug)]
pub enum XmlWriterError {
    /// A caller-supplied argument is malformed.
    ///
    /// `param` names the offending parameter, `expected` what it must be.
    InvalidArgument {
        param: &'static str,
        expected: &'static str,
        given: String,
    },
    /// The declared output encoding has no registered handler.
    UnsupportedEncoding(String),
    /// The operation is not allowed in the writer's current state.
    State(Cow<'static, str>),
    /// The sink failed to accept bytes.
    Io(io::Error),
    /// The sink could not be opened; no writer was produced.
    Construction(String),
}

impl XmlWriterError {
    pub(crate) fn invalid_name(param: &'static str, given: &str) -> Self {
        XmlWriterError::InvalidArgument {
            param,
            expected: "a valid XML name",
            given: given.to_owned(),
        }
    }

    pub(crate) fn state(msg: &'static str) -> Self {
        XmlWriterError::State(Cow::Borrowed(msg))
    }

    /// `true` for errors caused by how the API was called rather than by
    /// the data or the I/O channel.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            XmlWriterError::InvalidArgument { .. }
                | XmlWriterError::UnsupportedEncoding(_)
                | XmlWriterError::State(_)
        )
    }
}

impl fmt::Display for XmlWriterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlWriterError::InvalidArgument {
                param,
                expected,
                given,
            } => {
                write!(f, "{param} must be {expected}, \"{given}\" given")
            }
            XmlWriterError::UnsupportedEncoding(label) => {
                write!(f, "unsupported encoding \"{label}\"")
            }
            XmlWriterError::State(msg) => write!(f, "{msg}"),
            XmlWriterError::Io(err) => write!(f, "output error: {err}"),
            XmlWriterError::Construction(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for XmlWriterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XmlWriterError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for XmlWriterError {
    fn from(err: io::Error) -> Self {
        XmlWriterError::Io(err)
    }
}
