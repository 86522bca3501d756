use std::fmt::Display;
use std::io;

/// Failures while reading a P3 stream.
#[derive(Debug)]
pub enum DecodeError {
    /// The first line is not `P3`. Holds the line that was found.
    BadMagic(String),
    /// The width/height line is missing, malformed or declares a zero dimension.
    BadDimensions(String),
    /// The max value line is missing, unparsable or outside `1..=255`.
    BadMaxValue(String),
    /// A channel field is not an 8-bit integer within the declared max value.
    BadPixelValue {
        row: usize,
        column: usize,
        token: String,
    },
    /// Only raised by strict decoding.
    Truncated {
        expected_rows: usize,
        decoded_rows: usize,
    },
    Io(io::Error),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadMagic(line) => {
                write!(f, "Expected magic token 'P3', but found '{}'", line)
            }
            Self::BadDimensions(line) => {
                write!(f, "Invalid width/height line '{}'", line)
            }
            Self::BadMaxValue(line) => {
                write!(f, "Invalid max value line '{}'", line)
            }
            Self::BadPixelValue { row, column, token } => {
                write!(
                    f,
                    "Invalid channel value '{}' for pixel {} in row {}",
                    token, column, row
                )
            }
            Self::Truncated {
                expected_rows,
                decoded_rows,
            } => {
                write!(
                    f,
                    "Input ended after {} of {} rows",
                    decoded_rows, expected_rows
                )
            }
            Self::Io(error) => write!(f, "Reading of PPM stream failed: {}", error),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            _ => None,
        }
    }
}

impl From<io::Error> for DecodeError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Failures while writing a P3 stream.
#[derive(Debug)]
pub enum EncodeError {
    Io(io::Error),
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "Writing of PPM stream failed: {}", error),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
        }
    }
}

impl From<io::Error> for EncodeError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Violations of the raster invariants when assembling one in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    Empty,
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    ZeroMaxValue,
    OutOfBounds {
        column: usize,
        row: usize,
    },
    ChannelExceedsMaxValue {
        row: usize,
        column: usize,
        value: u8,
        max_value: u8,
    },
}

impl Display for RasterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "A raster needs at least one row and one column"),
            Self::RaggedRow {
                row,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Row {} has {} pixels, but the raster is {} pixels wide",
                    row, actual, expected
                )
            }
            Self::ZeroMaxValue => write!(f, "Max value must be at least 1"),
            Self::OutOfBounds { column, row } => {
                write!(f, "Pixel {} in row {} lies outside the raster", column, row)
            }
            Self::ChannelExceedsMaxValue {
                row,
                column,
                value,
                max_value,
            } => {
                write!(
                    f,
                    "Channel value {} of pixel {} in row {} exceeds max value {}",
                    value, column, row, max_value
                )
            }
        }
    }
}

impl std::error::Error for RasterError {}

#[derive(Debug)]
pub enum Error {
    UnableToOpenInputFileForReading(String, io::Error),
    UnableToOpenOutputFileForWriting(String, io::Error),
    UnableToMoveOutputFileIntoPlace(String, io::Error),
    InputFileHasNoFileName(String),
    DuplicateOutputFile(String),
    DecodingFailed(String, DecodeError),
    EncodingFailed(String, EncodeError),
    WorkerVanished(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnableToOpenInputFileForReading(path, error) => {
                write!(
                    f,
                    "Unable to open input file '{}' for reading: {}",
                    path, error
                )
            }
            Self::UnableToOpenOutputFileForWriting(path, error) => {
                write!(
                    f,
                    "Unable to open output file '{}' for writing: {}",
                    path, error
                )
            }
            Self::UnableToMoveOutputFileIntoPlace(path, error) => {
                write!(f, "Unable to move output file '{}' into place: {}", path, error)
            }
            Self::InputFileHasNoFileName(path) => {
                write!(f, "Input path '{}' does not name a file", path)
            }
            Self::DuplicateOutputFile(path) => {
                write!(f, "More than one input file would be written to '{}'", path)
            }
            Self::DecodingFailed(path, error) => {
                write!(f, "Decoding of '{}' failed: {}", path, error)
            }
            Self::EncodingFailed(path, error) => {
                write!(f, "Encoding of '{}' failed: {}", path, error)
            }
            Self::WorkerVanished(path) => {
                write!(f, "Worker processing '{}' stopped without a result", path)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnableToOpenInputFileForReading(_, error)
            | Self::UnableToOpenOutputFileForWriting(_, error)
            | Self::UnableToMoveOutputFileIntoPlace(_, error) => Some(error),
            Self::DecodingFailed(_, error) => Some(error),
            Self::EncodingFailed(_, error) => Some(error),
            Self::InputFileHasNoFileName(_)
            | Self::DuplicateOutputFile(_)
            | Self::WorkerVanished(_) => None,
        }
    }
}
