//! Error types

use crate::binary::read::ReadEof;
use crate::tag::DisplayTag;
use std::fmt;
use std::io;

/// Errors that originate when parsing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ParseError {
    BadEof,
    BadValue,
    BadVersion,
    BadOffset,
    BadIndex,
    MissingValue,
    MissingTable(u32),
    /// A format-4 character map subtable with a non-zero reserved pad.
    MalformedCmap,
    /// No decodable character map subtable was found.
    UnsuitableCmap,
    /// A kerning subtable advertised a format other than 0.
    UnsupportedKernFormat(u8),
}

impl From<ReadEof> for ParseError {
    fn from(_error: ReadEof) -> Self {
        ParseError::BadEof
    }
}

impl From<std::num::TryFromIntError> for ParseError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        ParseError::BadValue
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadEof => write!(f, "end of data reached unexpectedly"),
            ParseError::BadValue => write!(f, "invalid value"),
            ParseError::BadVersion => write!(f, "unexpected data version"),
            ParseError::BadOffset => write!(f, "invalid data offset"),
            ParseError::BadIndex => write!(f, "invalid data index"),
            ParseError::MissingValue => write!(f, "an expected data value was missing"),
            ParseError::MissingTable(tag) => {
                write!(f, "font is missing '{}' table", DisplayTag(*tag))
            }
            ParseError::MalformedCmap => write!(f, "malformed cmap subtable"),
            ParseError::UnsuitableCmap => write!(f, "no suitable cmap subtable"),
            ParseError::UnsupportedKernFormat(format) => {
                write!(f, "unsupported kerning subtable format {}", format)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors that originate when writing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum WriteError {
    BadValue,
    NotImplemented,
}

impl From<std::num::TryFromIntError> for WriteError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        WriteError::BadValue
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::BadValue => write!(f, "write: bad value"),
            WriteError::NotImplemented => write!(f, "writing in this format is not implemented"),
        }
    }
}

impl std::error::Error for WriteError {}

/// Error returned when loading and decoding a font
#[derive(Debug)]
pub enum FontError {
    Io(io::Error),
    Parse(ParseError),
}

impl From<io::Error> for FontError {
    fn from(error: io::Error) -> Self {
        FontError::Io(error)
    }
}

impl From<ParseError> for FontError {
    fn from(error: ParseError) -> Self {
        FontError::Parse(error)
    }
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::Io(err) => write!(f, "font read error: {}", err),
            FontError::Parse(err) => write!(f, "font parse error: {}", err),
        }
    }
}

impl std::error::Error for FontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FontError::Io(err) => Some(err),
            FontError::Parse(err) => Some(err),
        }
    }
}
