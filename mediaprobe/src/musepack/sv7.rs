//! MPC stream version 7 items

use super::constants::{FREQUENCY_TABLE, MPC_FRAME_LENGTH, MPC_SYNTH_DELAY};
use crate::error::Result;
use crate::macros::corrupt_err;
use crate::properties::{AudioCodec, StreamProperties};

use std::borrow::Cow;
use std::io::{Read, Seek};
use std::time::Duration;

use byteorder::{LittleEndian, ReadBytesExt};

// http://trac.musepack.net/musepack/wiki/SV7Specification

/// Used profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
	/// No profile
	#[default]
	None,
	/// Unstable/Experimental
	Unstable,
	/// Profiles 2-4
	Unused,
	/// Below Telephone (q= 0.0)
	BelowTelephone0,
	/// Below Telephone (q= 1.0)
	BelowTelephone1,
	/// Telephone (q= 2.0)
	Telephone,
	/// Thumb (q= 3.0)
	Thumb,
	/// Radio (q= 4.0)
	Radio,
	/// Standard (q= 5.0)
	Standard,
	/// Xtreme (q= 6.0)
	Xtreme,
	/// Insane (q= 7.0)
	Insane,
	/// BrainDead (q= 8.0)
	BrainDead,
	/// Above BrainDead (q= 9.0)
	AboveBrainDead9,
	/// Above BrainDead (q= 10.0)
	AboveBrainDead10,
}

impl TryFrom<u8> for Profile {
	type Error = ();

	#[rustfmt::skip]
	fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
		match value {
			0         => Ok(Self::None),
			1         => Ok(Self::Unstable),
			2 | 3 | 4 => Ok(Self::Unused),
			5         => Ok(Self::BelowTelephone0),
			6         => Ok(Self::BelowTelephone1),
			7         => Ok(Self::Telephone),
			8         => Ok(Self::Thumb),
			9         => Ok(Self::Radio),
			10        => Ok(Self::Standard),
			11        => Ok(Self::Xtreme),
			12        => Ok(Self::Insane),
			13        => Ok(Self::BrainDead),
			14        => Ok(Self::AboveBrainDead9),
			15        => Ok(Self::AboveBrainDead10),
			_         => Err(()),
		}
	}
}

/// MPC stream version 7 audio properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct MpcSv7Properties {
	pub(crate) duration: Duration,
	pub(crate) average_bitrate: u32,
	pub(crate) channels: u8, // NOTE: always 2
	pub(crate) frame_count: u32,
	pub(crate) profile: Profile,
	pub(crate) sample_rate: u32,
}

impl MpcSv7Properties {
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

	/// Total number of audio frames
	pub fn frame_count(&self) -> u32 {
		self.frame_count
	}

	/// Profile used
	pub fn profile(&self) -> Profile {
		self.profile
	}

	pub(crate) fn read<R>(reader: &mut R, stream_length: u64) -> Result<Self>
	where
		R: Read + Seek,
	{
		let header_start = reader.stream_position()?;

		// The low nibble of the first byte selects the stream's sub-layout;
		// only version 7 is decodable here
		let version = reader.read_u8()? & 0x0F;
		if version != 7 {
			corrupt_err!(@BAIL Mpc, header_start, "Unexpected stream version");
		}

		// The SV7 header is split into 6 32-bit sections

		// -- Section 1 --
		let frame_count = reader.read_u32::<LittleEndian>()?;

		// -- Section 2 --
		let chunk = reader.read_u32::<LittleEndian>()?;

		let byte2 = ((chunk & 0xFF_0000) >> 16) as u8;

		let profile = Profile::try_from((byte2 & 0xF0) >> 4).unwrap(); // Infallible

		let sample_freq_index = byte2 & 0x03;
		let sample_rate = FREQUENCY_TABLE[sample_freq_index as usize];

		// -- Section 3 --
		// Title ReplayGain peak (2) and gain (2)
		let _ = reader.read_u32::<LittleEndian>()?;

		// -- Section 4 --
		// Album ReplayGain peak (2) and gain (2)
		let _ = reader.read_u32::<LittleEndian>()?;

		// -- Section 5 --
		let chunk = reader.read_u32::<LittleEndian>()?;

		let true_gapless = (chunk >> 31) == 1;
		if true_gapless {
			let last_frame_length = ((chunk >> 20) & 0x7FF) as u16;
			if u64::from(last_frame_length) > MPC_FRAME_LENGTH {
				corrupt_err!(@BAIL Mpc, header_start, "Invalid last frame length");
			}
		}

		// -- Section 6 --
		let _encoder_version = reader.read_u8()?;

		// -- End of parsing --

		let mut properties = MpcSv7Properties {
			channels: 2, // Always 2 channels
			frame_count,
			profile,
			sample_rate,
			..MpcSv7Properties::default()
		};

		if sample_rate == 0 {
			log::warn!("MPC: Sample rate is 0, unable to calculate duration and bitrate");
			return Ok(properties);
		}

		if frame_count == 0 {
			log::warn!("MPC: Frame count is 0, unable to calculate duration and bitrate");
			return Ok(properties);
		}

		let total_samples = u64::from(frame_count) * MPC_FRAME_LENGTH - MPC_SYNTH_DELAY;
		let duration_seconds = total_samples as f64 / f64::from(sample_rate);

		properties.duration = Duration::from_secs_f64(duration_seconds);

		// A degenerate stream can still produce a zero-length duration; the
		// bitrate stays 0 in that case rather than dividing through
		if properties.duration == Duration::ZERO {
			return Ok(properties);
		}

		properties.average_bitrate =
			((stream_length as f64 * 8.0 / duration_seconds) as u64 / 1000) as u32;

		Ok(properties)
	}
}

impl AudioCodec for MpcSv7Properties {
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
		Cow::Borrowed("MusePack SV7")
	}
}

impl From<MpcSv7Properties> for StreamProperties {
	fn from(input: MpcSv7Properties) -> Self {
		let mut properties = Self::default();
		properties.fold_audio(&input);
		properties
	}
}
