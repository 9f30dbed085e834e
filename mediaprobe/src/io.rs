//! Traits and types for reading from seekable byte sources

use crate::buffer::ByteBuffer;
use crate::error::Result;
use crate::macros::try_vec;

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

// TODO: https://github.com/rust-lang/rust/issues/59359
pub(crate) trait SeekStreamLen: Seek {
	fn stream_len_hack(&mut self) -> crate::error::Result<u64> {
		let current_pos = self.stream_position()?;
		let len = self.seek(SeekFrom::End(0))?;

		self.seek(SeekFrom::Start(current_pos))?;

		Ok(len)
	}
}

impl<T> SeekStreamLen for T where T: Seek {}

/// Provides bounded block reads returning a [`ByteBuffer`]
///
/// Unlike `Read::read_exact`, a block read only comes up short at the end of
/// the stream, and a short final read is not an error.
pub(crate) trait ReadBlock: Read {
	fn read_block(&mut self, max_bytes: usize) -> Result<ByteBuffer> {
		let mut content = try_vec![0; max_bytes];

		let mut total_read = 0;
		while total_read < max_bytes {
			match self.read(&mut content[total_read..]) {
				Ok(0) => break,
				Ok(n) => total_read += n,
				Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(e.into()),
			}
		}

		content.truncate(total_read);
		Ok(ByteBuffer::new(content))
	}
}

impl<T> ReadBlock for T where T: Read {}

/// An open, position-tracking view over a seekable byte source
///
/// A `StreamHandle` is opened by the caller before probing starts and closed
/// (dropped) by the caller once probing is finished; the probing core never
/// holds on to one.
///
/// Any `Read + Seek` source works, so streams can come from places other
/// than the filesystem:
///
/// ```rust
/// use mediaprobe::io::StreamHandle;
/// use std::io::Cursor;
///
/// # fn main() -> mediaprobe::error::Result<()> {
/// let mut handle = StreamHandle::new(Cursor::new(b"FORM".to_vec()));
///
/// let block = handle.read_block(4)?;
/// assert!(block.starts_with(b"FORM"));
///
/// // Short reads only occur at the end of the stream
/// handle.seek_to(2)?;
/// assert_eq!(handle.read_block(10)?.len(), 2);
/// # Ok(()) }
/// ```
pub struct StreamHandle<R: Read + Seek> {
	inner: R,
}

impl StreamHandle<BufReader<File>> {
	/// Opens a file for reading
	///
	/// # Errors
	///
	/// * `path` does not exist
	pub fn open<P>(path: P) -> Result<Self>
	where
		P: AsRef<Path>,
	{
		Ok(Self {
			inner: BufReader::new(File::open(path)?),
		})
	}
}

impl<R: Read + Seek> StreamHandle<R> {
	/// Create a new `StreamHandle` from a reader
	#[must_use]
	pub fn new(reader: R) -> Self {
		Self { inner: reader }
	}

	/// Seek to an absolute stream position
	///
	/// # Errors
	///
	/// The source rejects the seek (`std::io::Error`).
	pub fn seek_to(&mut self, pos: u64) -> Result<u64> {
		Ok(self.inner.seek(SeekFrom::Start(pos))?)
	}

	/// Seek relative to the current stream position
	///
	/// # Errors
	///
	/// The source rejects the seek, e.g. when moving before the start of the stream.
	pub fn seek_by(&mut self, delta: i64) -> Result<u64> {
		Ok(self.inner.seek(SeekFrom::Current(delta))?)
	}

	/// The current stream position
	///
	/// # Errors
	///
	/// The source cannot report its position (`std::io::Error`).
	pub fn tell(&mut self) -> Result<u64> {
		Ok(self.inner.stream_position()?)
	}

	/// The total length of the stream
	///
	/// The current position is preserved.
	///
	/// # Errors
	///
	/// The source rejects seeking to its end and back.
	pub fn len(&mut self) -> Result<u64> {
		self.inner.stream_len_hack()
	}

	/// Read up to `max_bytes`, advancing the position
	///
	/// Returns fewer bytes than requested only at the end of the stream.
	///
	/// # Errors
	///
	/// The source fails mid-read, or `max_bytes` is abnormally large.
	pub fn read_block(&mut self, max_bytes: usize) -> Result<ByteBuffer> {
		ReadBlock::read_block(&mut self.inner, max_bytes)
	}

	/// Extract the reader
	pub fn into_inner(self) -> R {
		self.inner
	}
}

impl<R: Read + Seek> Read for StreamHandle<R> {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		self.inner.read(buf)
	}
}

impl<R: Read + Seek> Seek for StreamHandle<R> {
	fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
		self.inner.seek(pos)
	}
}

/// Skip over an ID3v2 tag, if one starts at the current position
///
/// Tag *contents* are never inspected; this exists so the recognizers can
/// reach the stream data buried behind leading tags. Returns the number of
/// bytes skipped (0 when no tag is present, in which case the position is
/// left untouched).
pub(crate) fn skip_id3v2<R>(reader: &mut R) -> Result<u64>
where
	R: Read + Seek,
{
	let header = reader.read_block(10)?;
	if header.len() < 10 || !header.starts_with(b"ID3") {
		reader.seek(SeekFrom::Current(-(header.len() as i64)))?;
		return Ok(0);
	}

	// Tag size is a 28-bit synchsafe integer (the high bit of each byte is always 0)
	let size = (u32::from(header[6] & 0x7F) << 21)
		| (u32::from(header[7] & 0x7F) << 14)
		| (u32::from(header[8] & 0x7F) << 7)
		| u32::from(header[9] & 0x7F);

	let mut to_skip = u64::from(size);
	if header[5] & 0x10 != 0 {
		// The tag carries a 10 byte footer
		to_skip += 10;
	}

	log::debug!("Skipping ID3v2 tag of {} bytes", 10 + to_skip);
	reader.seek(SeekFrom::Current(to_skip as i64))?;

	Ok(10 + to_skip)
}

/// The length of a trailing ID3v1 tag (128 bytes), or 0 if none is present
///
/// The current position is preserved.
pub(crate) fn trailing_id3v1_len<R>(reader: &mut R) -> Result<u64>
where
	R: Read + Seek,
{
	let current_pos = reader.stream_position()?;
	let len = reader.seek(SeekFrom::End(0))?;

	let mut tag_len = 0;
	if len >= 128 {
		reader.seek(SeekFrom::End(-128))?;

		let mut ident = [0; 3];
		reader.read_exact(&mut ident)?;

		if &ident == b"TAG" {
			tag_len = 128;
		}
	}

	reader.seek(SeekFrom::Start(current_pos))?;
	Ok(tag_len)
}
