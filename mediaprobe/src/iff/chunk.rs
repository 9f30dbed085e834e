use crate::buffer::ByteBuffer;
use crate::error::Result;
use crate::macros::{corrupt_err, try_vec};

use std::io::{Read, Seek, SeekFrom};
use std::marker::PhantomData;

use byteorder::{ByteOrder, ReadBytesExt};

const CHUNK_HEADER_SIZE: u64 = 8;

/// A fourcc + declared-size chunk walker
///
/// `remaining_size` tracks how much of the container is left, so a chunk
/// whose declared size runs past the end of the stream is rejected instead
/// of being silently truncated.
pub(crate) struct Chunks<B>
where
	B: ByteOrder,
{
	pub fourcc: [u8; 4],
	pub size: u32,
	pub start: u64,
	remaining_size: u64,
	_phantom: PhantomData<B>,
}

impl<B: ByteOrder> Chunks<B> {
	#[must_use]
	pub const fn new(file_size: u64) -> Self {
		Self {
			fourcc: [0; 4],
			size: 0,
			start: 0,
			remaining_size: file_size,
			_phantom: PhantomData,
		}
	}

	pub fn next<R>(&mut self, data: &mut R) -> Result<bool>
	where
		R: Read + Seek,
	{
		if self.remaining_size < CHUNK_HEADER_SIZE {
			return Ok(false);
		}

		self.start = data.stream_position()?;
		data.read_exact(&mut self.fourcc)?;
		self.size = data.read_u32::<B>()?;

		self.remaining_size = self.remaining_size.saturating_sub(CHUNK_HEADER_SIZE);

		Ok(true)
	}

	pub fn content<R>(&mut self, data: &mut R) -> Result<ByteBuffer>
	where
		R: Read,
	{
		let size = u64::from(self.size);
		if size > self.remaining_size {
			corrupt_err!(@BAIL Aiff, self.start, "Chunk size goes past the end of the stream");
		}

		let mut content = try_vec![0; size as usize];
		data.read_exact(&mut content)?;

		self.remaining_size = self.remaining_size.saturating_sub(size);
		Ok(ByteBuffer::new(content))
	}

	pub fn skip<R>(&mut self, data: &mut R) -> Result<()>
	where
		R: Read + Seek,
	{
		data.seek(SeekFrom::Current(i64::from(self.size)))?;
		self.remaining_size = self.remaining_size.saturating_sub(u64::from(self.size));

		self.correct_position(data)?;

		Ok(())
	}

	pub fn correct_position<R>(&mut self, data: &mut R) -> Result<()>
	where
		R: Read + Seek,
	{
		// Chunks are expected to start on even boundaries, and are padded
		// with a 0 if necessary. This is NOT included in the chunk's size.
		if self.size % 2 != 0 {
			data.seek(SeekFrom::Current(1))?;
			self.remaining_size = self.remaining_size.saturating_sub(1);
		}

		Ok(())
	}
}
