//! Contains the errors that can arise within mediaprobe
//!
//! The primary error is [`ProbeError`]. The type of error is determined by [`ErrorKind`],
//! which can be extended at any time.

use crate::probe::FileType;

use std::collections::TryReserveError;
use std::fmt::{Debug, Display, Formatter};

/// Alias for `Result<T, ProbeError>`
pub type Result<T> = std::result::Result<T, ProbeError>;

/// The types of errors that can occur
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
	// Primitive-layer errors
	/// A sub-range operation went past the end of a buffer
	OutOfRange,
	/// A buffer was too short for the requested decode
	InsufficientData,
	/// A bit-level read went past the end of its buffer, or requested more than 32 bits
	BitRangeExceeded,

	// Stream-level errors
	/// The leading magic bytes of a format were absent, or a bounded signature scan was exhausted
	SignatureMismatch(FileType),
	/// A chunk or header was internally inconsistent
	///
	/// This covers declared-size mismatches, invalid table indices, and truncated payloads.
	CorruptStream(CorruptStreamError),
	/// No recognizer claimed the input
	UnsupportedFormat,
	/// Attempting to read an abnormally large amount of data
	TooMuchData,

	// Conversions for external errors
	/// Represents all cases of [`std::io::Error`].
	Io(std::io::Error),
	/// Failure to allocate enough memory
	Alloc(TryReserveError),
}

/// An error tied to a specific container format and stream position
///
/// This is the error every recognizer produces for malformed input, carrying
/// enough context for a caller to log and skip the offending file.
pub struct CorruptStreamError {
	format: FileType,
	offset: u64,
	description: &'static str,
}

impl CorruptStreamError {
	/// Create a new `CorruptStreamError`
	///
	/// `offset` is the stream position at which parsing stopped.
	#[must_use]
	pub const fn new(format: FileType, offset: u64, description: &'static str) -> Self {
		Self {
			format,
			offset,
			description,
		}
	}

	/// Returns the associated [`FileType`]
	pub fn format(&self) -> FileType {
		self.format
	}

	/// Returns the stream position at which parsing stopped
	pub fn offset(&self) -> u64 {
		self.offset
	}

	/// Returns the error description
	pub fn description(&self) -> &str {
		self.description
	}
}

impl Debug for CorruptStreamError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"{} (offset {}): {:?}",
			self.format.name(),
			self.offset,
			self.description
		)
	}
}

impl Display for CorruptStreamError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"{} (offset {}): {}",
			self.format.name(),
			self.offset,
			self.description
		)
	}
}

/// Errors that could occur within mediaprobe
pub struct ProbeError {
	pub(crate) kind: ErrorKind,
}

impl ProbeError {
	/// Create a `ProbeError` from an [`ErrorKind`]
	///
	/// # Examples
	///
	/// ```rust
	/// use mediaprobe::error::{ErrorKind, ProbeError};
	///
	/// let unsupported = ProbeError::new(ErrorKind::UnsupportedFormat);
	/// ```
	#[must_use]
	pub const fn new(kind: ErrorKind) -> Self {
		Self { kind }
	}

	/// Returns the [`ErrorKind`]
	///
	/// # Examples
	///
	/// ```rust
	/// use mediaprobe::error::{ErrorKind, ProbeError};
	///
	/// let unsupported = ProbeError::new(ErrorKind::UnsupportedFormat);
	/// if let ErrorKind::UnsupportedFormat = unsupported.kind() {
	/// 	println!("What's the format?");
	/// }
	/// ```
	pub fn kind(&self) -> &ErrorKind {
		&self.kind
	}
}

impl std::error::Error for ProbeError {}

impl Debug for ProbeError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:?}", self.kind)
	}
}

impl From<CorruptStreamError> for ProbeError {
	fn from(input: CorruptStreamError) -> Self {
		Self {
			kind: ErrorKind::CorruptStream(input),
		}
	}
}

impl From<std::io::Error> for ProbeError {
	fn from(input: std::io::Error) -> Self {
		Self {
			kind: ErrorKind::Io(input),
		}
	}
}

impl From<std::collections::TryReserveError> for ProbeError {
	fn from(input: TryReserveError) -> Self {
		Self {
			kind: ErrorKind::Alloc(input),
		}
	}
}

impl Display for ProbeError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.kind {
			// Conversions
			ErrorKind::Io(ref err) => write!(f, "{err}"),
			ErrorKind::Alloc(ref err) => write!(f, "{err}"),

			// Primitives
			ErrorKind::OutOfRange => write!(f, "Requested a sub-range outside of the buffer"),
			ErrorKind::InsufficientData => {
				write!(f, "Buffer does not hold enough data for the requested decode")
			},
			ErrorKind::BitRangeExceeded => write!(f, "Bit-level read went out of range"),

			// Streams
			ErrorKind::SignatureMismatch(format) => {
				write!(f, "{}: Stream signature not found", format.name())
			},
			ErrorKind::CorruptStream(ref corrupt_err) => write!(f, "{corrupt_err}"),
			ErrorKind::UnsupportedFormat => {
				write!(f, "No format could be determined from the provided stream")
			},
			ErrorKind::TooMuchData => write!(
				f,
				"Attempted to read an abnormally large amount of data"
			),
		}
	}
}
