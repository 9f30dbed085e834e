use super::sv7::MpcSv7Properties;
use super::sv8::MpcSv8Properties;
use super::{MpcProperties, MpcStreamVersion};
use crate::config::ProbeOptions;
use crate::error::Result;
use crate::io::{ReadBlock, skip_id3v2, trailing_id3v1_len};
use crate::macros::err;
use crate::pipeline;
use crate::probe::FileType;
use crate::properties::StreamProperties;

use std::io::{Read, Seek, SeekFrom};

pub(crate) fn read_from<R>(
	reader: &mut R,
	options: ProbeOptions,
) -> Result<Option<StreamProperties>>
where
	R: Read + Seek,
{
	pipeline::read_file(
		reader,
		FileType::Mpc,
		options.read_style,
		|reader, _style| {
			// ID3v2 tags are unsupported in MPC files, but still possible
			skip_id3v2(reader)?;

			let header = reader.read_block(4)?;
			if header.len() < 4 {
				err!(SignatureMismatch(FileType::Mpc));
			}

			let mut ident = [0; 4];
			ident.copy_from_slice(&header);

			let version;
			match &ident {
				b"MPCK" => {
					log::debug!("MPC stream version determined to be 8");
					version = MpcStreamVersion::Sv8;
				},
				[b'M', b'P', b'+', ..] => {
					log::debug!("MPC stream version determined to be 7");

					// Seek back the extra byte we read
					reader.seek(SeekFrom::Current(-1))?;
					version = MpcStreamVersion::Sv7;
				},
				_ => err!(SignatureMismatch(FileType::Mpc)),
			}

			let header_start = reader.stream_position()?;
			Ok((version, header_start))
		},
		|reader, start, _style| {
			// The audio stream runs to the end of the file, minus any
			// trailing tag
			let header_start = start.1;

			let tag_len = trailing_id3v1_len(reader)?;
			let end = reader.seek(SeekFrom::End(0))?;

			reader.seek(SeekFrom::Start(header_start))?;

			Ok(end.saturating_sub(tag_len).saturating_sub(header_start))
		},
		|reader, (version, _), stream_length| {
			let properties = match version {
				MpcStreamVersion::Sv8 => {
					MpcProperties::Sv8(MpcSv8Properties::read(reader, stream_length)?)
				},
				MpcStreamVersion::Sv7 => {
					MpcProperties::Sv7(MpcSv7Properties::read(reader, stream_length)?)
				},
			};

			Ok(properties.into())
		},
	)
}

#[cfg(test)]
mod tests {
	use crate::config::ProbeOptions;
	use crate::error::ErrorKind;

	use std::io::Cursor;

	#[test_log::test]
	fn sv7_signature_dispatch() {
		let mut data = b"MP+\x07".to_vec();
		data.extend_from_slice(&100u32.to_le_bytes());
		data.extend_from_slice(&((10u32 << 4) << 16).to_le_bytes());
		data.extend_from_slice(&[0; 8]);
		data.extend_from_slice(&[0; 4]);
		data.push(106);

		let mut reader = Cursor::new(data);
		let properties = super::read_from(&mut reader, ProbeOptions::new())
			.unwrap()
			.unwrap();

		assert_eq!(properties.sample_rate(), 44100);
		assert_eq!(properties.channels(), 2);
	}

	#[test_log::test]
	fn unknown_signature_falls_through() {
		let mut reader = Cursor::new(b"OggS....".to_vec());
		let result = super::read_from(&mut reader, ProbeOptions::new());

		assert!(matches!(
			result.unwrap_err().kind(),
			ErrorKind::SignatureMismatch(_)
		));
	}
}
