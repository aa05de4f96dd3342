use crate::cursor::CursorError;
use std::fmt;

/// An error that can occur when decoding a Civilization V file
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    pub(crate) fn eof(section: &'static str, offset: usize) -> Error {
        Error::new(ErrorKind::Eof { section, offset })
    }

    pub(crate) fn malformed_count(section: &'static str, count: u32, offset: usize) -> Error {
        Error::new(ErrorKind::MalformedCount {
            section,
            count,
            offset,
        })
    }

    /// Return the specific type of error
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Returns the byte offset where the error occurred (if available)
    pub fn offset(&self) -> Option<usize> {
        self.0.offset()
    }
}

/// Specific type of error
#[derive(Debug)]
pub enum ErrorKind {
    /// A fixed-size read ran past the end of the buffer
    Eof {
        /// The decode phase that was in progress
        section: &'static str,
        /// The byte offset of the failed read
        offset: usize,
    },

    /// A declared array length exceeded the sanity cap
    MalformedCount {
        /// The name of the array whose length was implausible
        section: &'static str,
        /// The declared length
        count: u32,
        /// The byte offset of the length field
        offset: usize,
    },

    /// The zlib stream produced no output at all
    Decompression {
        /// The byte offset where the compressed payload begins
        offset: usize,
        /// The underlying decoder error
        source: std::io::Error,
    },

    /// An error occurred when converting to or from the JSON mirror
    #[cfg(feature = "json")]
    Json(serde_json::Error),
}

impl ErrorKind {
    pub fn offset(&self) -> Option<usize> {
        match *self {
            ErrorKind::Eof { offset, .. } => Some(offset),
            ErrorKind::MalformedCount { offset, .. } => Some(offset),
            ErrorKind::Decompression { offset, .. } => Some(offset),
            #[cfg(feature = "json")]
            ErrorKind::Json(_) => None,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self.0 {
            ErrorKind::Decompression { ref source, .. } => Some(source),
            #[cfg(feature = "json")]
            ErrorKind::Json(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Eof { section, offset } => write!(
                f,
                "unexpected end of file in {} (offset: {})",
                section, offset
            ),
            ErrorKind::MalformedCount {
                section,
                count,
                offset,
            } => write!(
                f,
                "array length for {} is implausible (length: {}, offset: {})",
                section, count, offset
            ),
            ErrorKind::Decompression { offset, ref source } => write!(
                f,
                "compressed payload yielded no data (offset: {}): {}",
                offset, source
            ),
            #[cfg(feature = "json")]
            ErrorKind::Json(ref err) => write!(f, "json error: {}", err),
        }
    }
}

impl CursorError {
    /// Attach the decode phase that was in progress when the read failed
    #[must_use]
    pub(crate) fn in_section(self, section: &'static str) -> Error {
        Error::eof(section, self.position())
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::new(ErrorKind::Json(error))
    }
}
