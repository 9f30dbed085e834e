//! The shared read pipeline every format recognizer runs through
//!
//! Non-container formats keep their describing structures at the head and/or
//! tail of the stream, so every recognizer decomposes into the same three
//! steps, invoked in fixed order exactly once per probe:
//!
//! 1. `read_start`: locate and parse the header material at the front
//! 2. `read_end`: locate and parse the material at the back (trailing tags,
//!    the final frame, total lengths)
//! 3. `compute_properties`: fuse both into the format's properties
//!
//! Step 3 only runs when the caller asked for properties
//! ([`ReadStyle::Average`]); with [`ReadStyle::None`] the pipeline stops after
//! validating the stream's structure.

use crate::config::ReadStyle;
use crate::error::{CorruptStreamError, ErrorKind, ProbeError, Result};
use crate::probe::FileType;

use std::io::{Read, Seek};

/// Run the three-step read pipeline over `reader`
///
/// Primitive-layer errors escaping a step (range/length/bit overruns, an
/// unexpected end of stream) are re-surfaced as `CorruptStream` bound to
/// `format` and the offset at which parsing stopped. Format-level errors
/// pass through untouched.
pub(crate) fn read_file<R, S, E, P, FS, FE, FP>(
	reader: &mut R,
	format: FileType,
	style: ReadStyle,
	read_start: FS,
	read_end: FE,
	compute_properties: FP,
) -> Result<Option<P>>
where
	R: Read + Seek,
	FS: FnOnce(&mut R, ReadStyle) -> Result<S>,
	FE: FnOnce(&mut R, &S, ReadStyle) -> Result<E>,
	FP: FnOnce(&mut R, S, E) -> Result<P>,
{
	let start = match read_start(reader, style) {
		Ok(start) => start,
		Err(e) => return Err(attach_format_context(e, format, reader)),
	};

	let end = match read_end(reader, &start, style) {
		Ok(end) => end,
		Err(e) => return Err(attach_format_context(e, format, reader)),
	};

	if style == ReadStyle::None {
		log::debug!("{}: Property read skipped by request", format.name());
		return Ok(None);
	}

	match compute_properties(reader, start, end) {
		Ok(properties) => Ok(Some(properties)),
		Err(e) => Err(attach_format_context(e, format, reader)),
	}
}

fn attach_format_context<R>(err: ProbeError, format: FileType, reader: &mut R) -> ProbeError
where
	R: Seek,
{
	let description = match err.kind() {
		ErrorKind::OutOfRange => "Buffer range exceeded",
		ErrorKind::InsufficientData => "Not enough data to decode a header field",
		ErrorKind::BitRangeExceeded => "Bit-packed header overran its buffer",
		ErrorKind::Io(io_err) if io_err.kind() == std::io::ErrorKind::UnexpectedEof => {
			"Unexpected end of stream"
		},
		_ => return err,
	};

	let offset = reader.stream_position().unwrap_or(0);
	CorruptStreamError::new(format, offset, description).into()
}
