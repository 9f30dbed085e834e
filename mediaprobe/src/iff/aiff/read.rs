use super::properties::AiffProperties;
use crate::buffer::ByteBuffer;
use crate::config::ProbeOptions;
use crate::error::Result;
use crate::io::{ReadBlock, SeekStreamLen};
use crate::iff::chunk::Chunks;
use crate::macros::{corrupt_err, err};
use crate::pipeline;
use crate::probe::FileType;
use crate::properties::StreamProperties;

use std::io::{Read, Seek};

use byteorder::BigEndian;

fn verify_aiff<R>(data: &mut R) -> Result<()>
where
	R: Read + Seek,
{
	let id = data.read_block(12)?;

	if id.len() < 12 || !id.starts_with(b"FORM") || &id[8..] != b"AIFF" {
		err!(SignatureMismatch(FileType::Aiff));
	}

	log::debug!("Stream verified to be AIFF");
	Ok(())
}

struct AiffStart {
	comm: Option<(ByteBuffer, u64)>,
	stream_len: u32,
}

pub(crate) fn read_from<R>(
	reader: &mut R,
	options: ProbeOptions,
) -> Result<Option<StreamProperties>>
where
	R: Read + Seek,
{
	pipeline::read_file(
		reader,
		FileType::Aiff,
		options.read_style,
		|reader, _style| {
			verify_aiff(reader)?;

			let file_len = reader.stream_len_hack()?;

			let mut comm = None;
			let mut stream_len = 0;

			let mut chunks = Chunks::<BigEndian>::new(file_len);

			while let Ok(true) = chunks.next(reader) {
				match &chunks.fourcc {
					b"COMM" if comm.is_none() => {
						if chunks.size < 18 {
							corrupt_err!(@BAIL Aiff, chunks.start, "Stream has an invalid \"COMM\" chunk size (< 18)");
						}

						let start = chunks.start;
						comm = Some((chunks.content(reader)?, start));
						chunks.correct_position(reader)?;
					},
					b"SSND" => {
						stream_len = chunks.size;
						chunks.skip(reader)?;
					},
					_ => chunks.skip(reader)?,
				}
			}

			Ok(AiffStart { comm, stream_len })
		},
		// AIFF keeps everything needed up front; there is no trailing
		// material to read
		|_reader, _start, _style| Ok(()),
		|reader, start, ()| {
			let Some((comm, comm_start)) = start.comm else {
				corrupt_err!(@BAIL Aiff, reader.stream_position()?, "No COMM chunk");
			};

			if start.stream_len == 0 {
				corrupt_err!(@BAIL Aiff, reader.stream_position()?, "No Sound chunk");
			}

			let properties: AiffProperties =
				super::properties::read_properties(&comm, comm_start, start.stream_len)?;

			Ok(properties.into())
		},
	)
}

#[cfg(test)]
mod tests {
	use crate::config::ProbeOptions;
	use crate::error::ErrorKind;

	use std::io::Cursor;

	fn comm_content() -> Vec<u8> {
		let mut comm = Vec::new();
		comm.extend_from_slice(&2u16.to_be_bytes()); // channels
		comm.extend_from_slice(&44100u32.to_be_bytes()); // sample frames
		comm.extend_from_slice(&16u16.to_be_bytes()); // bits per sample
		comm.extend_from_slice(&[0x40, 0x0E, 0xAC, 0x44, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
		comm
	}

	fn aiff_file(with_ssnd: bool) -> Vec<u8> {
		let comm = comm_content();

		let mut data = Vec::new();
		data.extend_from_slice(b"FORM");
		data.extend_from_slice(&0u32.to_be_bytes()); // patched below
		data.extend_from_slice(b"AIFF");

		data.extend_from_slice(b"COMM");
		data.extend_from_slice(&(comm.len() as u32).to_be_bytes());
		data.extend_from_slice(&comm);

		if with_ssnd {
			data.extend_from_slice(b"SSND");
			data.extend_from_slice(&64u32.to_be_bytes());
			data.extend(std::iter::repeat_n(0u8, 64));
		}

		let form_size = (data.len() - 8) as u32;
		data[4..8].copy_from_slice(&form_size.to_be_bytes());
		data
	}

	#[test_log::test]
	fn read_valid_aiff() {
		let mut reader = Cursor::new(aiff_file(true));
		let properties = super::read_from(&mut reader, ProbeOptions::new())
			.unwrap()
			.unwrap();

		assert_eq!(properties.sample_rate(), 44100);
		assert_eq!(properties.channels(), 2);
		assert_eq!(properties.bit_depth(), 16);
		assert_eq!(properties.duration().as_secs(), 1);
	}

	#[test_log::test]
	fn missing_sound_chunk() {
		let mut reader = Cursor::new(aiff_file(false));
		let result = super::read_from(&mut reader, ProbeOptions::new());

		match result.unwrap_err().kind() {
			ErrorKind::CorruptStream(err) => {
				assert_eq!(err.description(), "No Sound chunk");
			},
			other => panic!("expected CorruptStream, got {other:?}"),
		}
	}

	#[test_log::test]
	fn aifc_is_not_claimed() {
		let mut data = aiff_file(true);
		data[8..12].copy_from_slice(b"AIFC");

		let mut reader = Cursor::new(data);
		let result = super::read_from(&mut reader, ProbeOptions::new());

		assert!(matches!(
			result.unwrap_err().kind(),
			ErrorKind::SignatureMismatch(_)
		));
	}
}
