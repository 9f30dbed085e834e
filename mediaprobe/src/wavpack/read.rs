use super::properties::{parse_wv_header, read_properties};
use crate::config::ProbeOptions;
use crate::error::Result;
use crate::io::trailing_id3v1_len;
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
		FileType::WavPack,
		options.read_style,
		|reader, _style| {
			let header_start = reader.stream_position()?;
			let header = parse_wv_header(reader)?;

			Ok((header, header_start))
		},
		|reader, start, _style| {
			// The audio stream runs from the first block to the end of the
			// file, minus any trailing tag
			let header_start = start.1;

			let tag_len = trailing_id3v1_len(reader)?;
			let end = reader.seek(SeekFrom::End(0))?;

			Ok(end.saturating_sub(tag_len).saturating_sub(header_start))
		},
		|_reader, (header, _), stream_length| {
			Ok(read_properties(&header, stream_length).into())
		},
	)
}
