use std::fmt::Display;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    TypeMismatch,
    UnresolvedReference,
    StreamDesync,
    InvalidData,
    Io,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ErrorKind::NotFound => write!(f, "not found: {}", &self.message),
            ErrorKind::TypeMismatch => write!(f, "type mismatch: {}", &self.message),
            ErrorKind::UnresolvedReference => {
                write!(f, "unresolved reference: {}", &self.message)
            }
            ErrorKind::StreamDesync => write!(f, "stream desync: {}", &self.message),
            ErrorKind::InvalidData => write!(f, "invalid data: {}", &self.message),
            ErrorKind::Io => write!(f, "read error: {}", &self.message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl Error {
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::NotFound, message.into())
    }

    pub fn type_mismatch<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::TypeMismatch, message.into())
    }

    pub fn unresolved_reference<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::UnresolvedReference, message.into())
    }

    pub fn stream_desync<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::StreamDesync, message.into())
    }

    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::InvalidData, message.into())
    }

    pub fn with_cause<C: std::error::Error + Send + Sync + 'static>(mut self, cause: C) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Whether the stream position can no longer be trusted after this error.
    ///
    /// A fatal error aborts the property block it was raised in, and the loader must not
    /// continue reading sibling objects from the same stream.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::StreamDesync | ErrorKind::InvalidData | ErrorKind::Io
        )
    }

    fn new(kind: ErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
            cause: None,
        }
    }
}

impl From<binread::Error> for Error {
    fn from(err: binread::Error) -> Self {
        match err {
            binread::Error::Io(err) => err.into(),
            err => Self::invalid_data(err.to_string()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err.to_string()).with_cause(err)
    }
}
