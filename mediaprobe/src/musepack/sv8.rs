//! MPC stream version 8 items

use super::constants::FREQUENCY_TABLE;
use crate::error::Result;
use crate::macros::{corrupt_err, err};
use crate::properties::{AudioCodec, StreamProperties};

use std::borrow::Cow;
use std::io::Read;
use std::time::Duration;

use byteorder::{BigEndian, ReadBytesExt};

/// A reader over an SV8 stream's packet sequence
///
/// Packet format:
///
/// Field 	| Size (bits)     | Value
/// Key 	| 16              | "EX"
/// Size 	| n*8; 0 < n < 10 |	0x1A
/// Payload | Size * 8        | "example"
pub(super) struct PacketReader<R> {
	reader: R,
	capacity: u64,
	// Bytes consumed so far, for error offsets
	consumed: u64,
}

impl<R: Read> PacketReader<R> {
	pub(super) fn new(reader: R) -> Self {
		Self {
			reader,
			capacity: 0,
			consumed: 0,
		}
	}

	/// Move the reader to the next packet, returning the next packet key and size
	pub(super) fn next(&mut self) -> Result<([u8; 2], u64)> {
		// Discard the rest of the current packet
		self.consumed += std::io::copy(
			&mut self.reader.by_ref().take(self.capacity),
			&mut std::io::sink(),
		)?;

		let key_offset = self.consumed;

		let mut key = [0; 2];
		self.reader.read_exact(&mut key)?;

		if !key[0].is_ascii_uppercase() || !key[1].is_ascii_uppercase() {
			corrupt_err!(@BAIL Mpc, key_offset, "Packet key contains invalid characters");
		}

		let (packet_size, packet_size_byte_count) = Self::read_size(&mut self.reader)?;
		self.consumed += 2 + u64::from(packet_size_byte_count);

		// The packet size contains the key (2) and the size (variable length <= 9)
		self.capacity = packet_size.saturating_sub(u64::from(2 + packet_size_byte_count));

		Ok((key, self.capacity))
	}

	/// Read a variable-length integer
	///
	/// bits, big-endian
	/// 0xxx xxxx                                  - value 0 to  2^7-1
	/// 1xxx xxxx  0xxx xxxx                       - value 0 to 2^14-1
	/// 1xxx xxxx  1xxx xxxx  0xxx xxxx            - value 0 to 2^21-1
	/// ...
	pub(super) fn read_size(reader: &mut R) -> Result<(u64, u8)> {
		let mut current;
		let mut size = 0u64;

		let mut bytes_read = 0;
		loop {
			current = reader.read_u8()?;
			bytes_read += 1;

			// Sizes cannot go above 9 bytes
			if bytes_read > 9 {
				err!(TooMuchData);
			}

			size = (size << 7) | u64::from(current & 0x7F);
			if current & 0x80 == 0 {
				break;
			}
		}

		Ok((size, bytes_read))
	}
}

impl<R: Read> Read for PacketReader<R> {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		let bytes_read = self.reader.by_ref().take(self.capacity).read(buf)?;
		self.capacity = self.capacity.saturating_sub(bytes_read as u64);
		self.consumed += bytes_read as u64;
		Ok(bytes_read)
	}
}

/// Information from a Stream Header packet
///
/// StreamHeader format:
///
/// Field              | Size (bits)     | Value | Comment
/// CRC                | 32              |       | CRC 32 of the block (this field excluded). 0 = invalid
/// Stream version     | 8               | 8     | Bitstream version
/// Sample count       | n*8; 0 < n < 10 |       | Number of samples in the stream. 0 = unknown
/// Beginning silence  | n*8; 0 < n < 10 |       | Number of samples to skip at the beginning of the stream
/// Sample frequency   | 3               | 0..7  | See the frequency table
/// Max used bands     | 5               | 1..32 | Maximum number of bands used in the file
/// Channel count      | 4               | 1..16 | Number of channels in the stream
/// MS used            | 1               |       | True if Mid Side Stereo is enabled
/// Audio block frames | 3               | 0..7  | Number of frames per audio packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) struct StreamHeader {
	pub(super) sample_count: u64,
	pub(super) beginning_silence: u64,
	pub(super) sample_rate: u32,
	pub(super) channels: u8,
}

impl StreamHeader {
	pub(super) fn parse<R: Read>(reader: &mut PacketReader<R>) -> Result<Self> {
		let _crc = reader.read_u32::<BigEndian>()?;
		let _stream_version = reader.read_u8()?;

		let (sample_count, _) = PacketReader::read_size(reader)?;
		let (beginning_silence, _) = PacketReader::read_size(reader)?;

		// Sample rate index and max used bands
		let remaining_flags_byte_1 = reader.read_u8()?;

		let sample_rate_index = (remaining_flags_byte_1 & 0xE0) >> 5;
		let sample_rate = FREQUENCY_TABLE[sample_rate_index as usize];

		// Channel count, MS used, audio block frames
		let remaining_flags_byte_2 = reader.read_u8()?;

		let channels = (remaining_flags_byte_2 >> 4) + 1;

		Ok(Self {
			sample_count,
			beginning_silence,
			sample_rate,
			channels,
		})
	}
}

/// MPC stream version 8 audio properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct MpcSv8Properties {
	pub(crate) duration: Duration,
	pub(crate) average_bitrate: u32,
	pub(crate) sample_rate: u32,
	pub(crate) channels: u8,
	pub(crate) sample_count: u64,
}

impl MpcSv8Properties {
	/// Duration of the audio
	pub fn duration(&self) -> Duration {
		self.duration
	}

	/// Average bitrate (kbps)
	pub fn average_bitrate(&self) -> u32 {
		self.average_bitrate
	}

	/// Sample rate (Hz)
	pub fn sample_rate(&self) -> u32 {
		self.sample_rate
	}

	/// Channel count
	pub fn channels(&self) -> u8 {
		self.channels
	}

	/// Number of samples in the stream
	pub fn sample_count(&self) -> u64 {
		self.sample_count
	}

	pub(crate) fn read<R>(reader: &mut R, stream_length: u64) -> Result<Self>
	where
		R: Read,
	{
		let mut packet_reader = PacketReader::new(reader);

		// Packets are read in sequence until the mandatory stream header
		// shows up. A stream end packet first means there is no audio to
		// describe at all.
		let stream_header;
		loop {
			let (packet_id, _packet_length) = packet_reader.next()?;

			match &packet_id {
				b"SH" => {
					stream_header = StreamHeader::parse(&mut packet_reader)?;
					break;
				},
				b"SE" => {
					log::warn!("MPC: Stream end packet with no prior stream header");
					err!(UnsupportedFormat);
				},
				_ => continue,
			}
		}

		let mut properties = MpcSv8Properties {
			sample_rate: stream_header.sample_rate,
			channels: stream_header.channels,
			sample_count: stream_header.sample_count,
			..MpcSv8Properties::default()
		};

		let samples = stream_header
			.sample_count
			.saturating_sub(stream_header.beginning_silence);

		if stream_header.sample_rate == 0 || samples == 0 {
			log::warn!("MPC: Unable to calculate duration and bitrate");
			return Ok(properties);
		}

		let duration_seconds = samples as f64 / f64::from(stream_header.sample_rate);

		properties.duration = Duration::from_secs_f64(duration_seconds);
		properties.average_bitrate =
			((stream_length as f64 * 8.0 / duration_seconds) as u64 / 1000) as u32;

		Ok(properties)
	}
}

impl AudioCodec for MpcSv8Properties {
	fn duration(&self) -> Duration {
		self.duration
	}

	fn audio_bitrate(&self) -> u32 {
		self.average_bitrate
	}

	fn sample_rate(&self) -> u32 {
		self.sample_rate
	}

	fn channels(&self) -> u8 {
		self.channels
	}

	fn description(&self) -> Cow<'static, str> {
		Cow::Borrowed("MusePack SV8")
	}
}

impl From<MpcSv8Properties> for StreamProperties {
	fn from(input: MpcSv8Properties) -> Self {
		let mut properties = Self::default();
		properties.fold_audio(&input);
		properties
	}
}

#[cfg(test)]
mod tests {
	use super::{MpcSv8Properties, PacketReader};
	use crate::error::ErrorKind;

	fn packet(key: &[u8; 2], payload: &[u8]) -> Vec<u8> {
		// Single-byte sizes are enough for test payloads
		let mut data = Vec::new();
		data.extend_from_slice(key);
		data.push((2 + 1 + payload.len()) as u8);
		data.extend_from_slice(payload);
		data
	}

	fn stream_header_payload() -> Vec<u8> {
		let mut payload = Vec::new();
		payload.extend_from_slice(&0u32.to_be_bytes()); // CRC
		payload.push(8); // stream version

		// Sample count: 44100 = 0b10_1011000_1000100 -> 3 varint bytes
		payload.extend_from_slice(&[0x82, 0xD8, 0x44]);
		payload.push(0); // beginning silence

		payload.push(0b0001_0000); // sample rate index 0, max bands
		payload.push(0b0001_0000); // channels - 1 = 1, flags
		payload
	}

	#[test_log::test]
	fn varint_sizes() {
		let data = [0x1A];
		assert_eq!(PacketReader::read_size(&mut &data[..]).unwrap(), (0x1A, 1));

		let data = [0x82, 0xD8, 0x44];
		assert_eq!(
			PacketReader::read_size(&mut &data[..]).unwrap(),
			(44100, 3)
		);

		// Sizes cap out at 9 bytes
		let data = [0xFF; 10];
		assert!(matches!(
			PacketReader::read_size(&mut &data[..]).unwrap_err().kind(),
			ErrorKind::TooMuchData
		));
	}

	#[test_log::test]
	fn stream_header_before_stream_end() {
		let mut data = packet(b"SH", &stream_header_payload());
		data.extend_from_slice(&packet(b"SE", &[]));

		let properties = MpcSv8Properties::read(&mut &data[..], 100_000).unwrap();

		assert_eq!(properties.sample_rate(), 44100);
		assert_eq!(properties.channels(), 2);
		assert_eq!(properties.sample_count(), 44100);
		assert_eq!(properties.duration().as_secs(), 1);

		// floor(100000 * 8 / 1.0) / 1000 = 800 kbps
		assert_eq!(properties.average_bitrate(), 800);
	}

	#[test_log::test]
	fn stream_end_with_no_stream_header() {
		let data = packet(b"SE", &[]);

		let result = MpcSv8Properties::read(&mut &data[..], 100_000);
		assert!(matches!(
			result.unwrap_err().kind(),
			ErrorKind::UnsupportedFormat
		));
	}

	#[test_log::test]
	fn unknown_packets_are_skipped() {
		let mut data = packet(b"RG", &[0; 9]);
		data.extend_from_slice(&packet(b"SH", &stream_header_payload()));

		let properties = MpcSv8Properties::read(&mut &data[..], 100_000).unwrap();
		assert_eq!(properties.sample_rate(), 44100);
	}
}
