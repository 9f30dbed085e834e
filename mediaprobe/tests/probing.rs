//! End-to-end probing tests over synthetic in-memory streams

use mediaprobe::config::{ProbeOptions, ReadStyle};
use mediaprobe::error::ErrorKind;
use mediaprobe::probe::{FileType, Probe};
use mediaprobe::properties::StreamProperties;

use std::io::{Cursor, Write};

fn probe(data: Vec<u8>) -> StreamProperties {
	Probe::new(Cursor::new(data))
		.guess_file_type()
		.unwrap()
		.read()
		.unwrap()
}

// A complete FLAC stream: marker, STREAMINFO (flagged as the last metadata
// block), and two seconds worth of fake audio bytes
fn flac_stream() -> Vec<u8> {
	let mut data = Vec::new();
	data.extend_from_slice(b"fLaC");

	// Block header: last-block flag + type 0 + 34 byte length
	data.extend_from_slice(&[0x80, 0x00, 0x00, 0x22]);

	data.extend_from_slice(&[0x10, 0x00, 0x10, 0x00]);
	data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

	let packed: u32 = (44100 << 12) | (1 << 9) | (15 << 4);
	data.extend_from_slice(&packed.to_be_bytes());
	data.extend_from_slice(&88200u32.to_be_bytes());
	data.extend_from_slice(&[0; 16]);

	// Audio frames: only the byte count matters
	data.extend(std::iter::repeat_n(0xA5, 40_000));
	data
}

fn wavpack_stream() -> Vec<u8> {
	let mut data = Vec::new();
	data.extend_from_slice(b"wvpk");
	data.extend_from_slice(&(176_400u32 - 8).to_le_bytes()); // block size
	data.extend_from_slice(&0x410u16.to_le_bytes());
	data.extend_from_slice(&[0, 0]);
	data.extend_from_slice(&44100u32.to_le_bytes()); // total samples
	data.extend_from_slice(&0u32.to_le_bytes());
	data.extend_from_slice(&44100u32.to_le_bytes());
	data.extend_from_slice(&((9u32 << 23) | 1).to_le_bytes()); // flags
	data.extend_from_slice(&0u32.to_le_bytes());
	data.extend(std::iter::repeat_n(0u8, 176_400 - 32));
	data
}

fn aiff_stream(with_ssnd: bool) -> Vec<u8> {
	let mut data = Vec::new();
	data.extend_from_slice(b"FORM");
	data.extend_from_slice(&0u32.to_be_bytes());
	data.extend_from_slice(b"AIFF");

	data.extend_from_slice(b"COMM");
	data.extend_from_slice(&18u32.to_be_bytes());
	data.extend_from_slice(&2u16.to_be_bytes());
	data.extend_from_slice(&44100u32.to_be_bytes());
	data.extend_from_slice(&16u16.to_be_bytes());
	data.extend_from_slice(&[0x40, 0x0E, 0xAC, 0x44, 0, 0, 0, 0, 0, 0]);

	if with_ssnd {
		data.extend_from_slice(b"SSND");
		data.extend_from_slice(&176_400u32.to_be_bytes());
		data.extend(std::iter::repeat_n(0u8, 176_400));
	}

	let form_size = (data.len() - 8) as u32;
	data[4..8].copy_from_slice(&form_size.to_be_bytes());
	data
}

#[test_log::test]
fn probe_flac() {
	let properties = probe(flac_stream());

	assert!(properties.media_kinds().has_audio());
	assert_eq!(properties.sample_rate(), 44100);
	assert_eq!(properties.channels(), 2);
	assert_eq!(properties.bit_depth(), 16);
	assert_eq!(properties.duration().as_secs(), 2);
	assert_eq!(properties.codec_description(), "FLAC");
}

#[test_log::test]
fn probe_wavpack() {
	let properties = probe(wavpack_stream());

	assert_eq!(properties.duration().as_secs(), 1);
	assert_eq!(properties.audio_bitrate(), 1411);
	assert_eq!(properties.sample_rate(), 44100);
	assert_eq!(properties.bit_depth(), 16);
	assert_eq!(properties.codec_description(), "WavPack");
}

#[test_log::test]
fn probe_aiff() {
	let properties = probe(aiff_stream(true));

	assert_eq!(properties.sample_rate(), 44100);
	assert_eq!(properties.channels(), 2);
	assert_eq!(properties.duration().as_secs(), 1);

	// floor(176400 * 8 / 1.0) / 1000 = 1411 kbps
	assert_eq!(properties.audio_bitrate(), 1411);
}

#[test_log::test]
fn aiff_without_sound_chunk_is_corrupt() {
	let result = Probe::new(Cursor::new(aiff_stream(false)))
		.guess_file_type()
		.unwrap()
		.read();

	match result.unwrap_err().kind() {
		ErrorKind::CorruptStream(err) => {
			assert_eq!(err.format(), FileType::Aiff);
			assert_eq!(err.description(), "No Sound chunk");
		},
		other => panic!("expected CorruptStream, got {other:?}"),
	}
}

#[test_log::test]
fn probing_is_idempotent() {
	let data = flac_stream();

	let first = probe(data.clone());
	let second = probe(data);

	assert_eq!(first, second);
}

#[test_log::test]
fn skip_properties_by_request() {
	let options = ProbeOptions::new().read_style(ReadStyle::None);

	let properties = Probe::new(Cursor::new(flac_stream()))
		.options(options)
		.guess_file_type()
		.unwrap()
		.read()
		.unwrap();

	assert!(properties.media_kinds().is_empty());
	assert_eq!(properties.duration().as_millis(), 0);
}

#[test_log::test]
fn unsupported_format() {
	let result = Probe::new(Cursor::new(b"OggS junk that no recognizer claims".to_vec()))
		.guess_file_type()
		.unwrap()
		.read();

	assert!(matches!(
		result.unwrap_err().kind(),
		ErrorKind::UnsupportedFormat
	));
}

#[test_log::test]
fn mislabeled_file_type_falls_through() {
	// Claim the stream is MP3; the WavPack recognizer must still pick it up
	let properties = Probe::with_file_type(Cursor::new(wavpack_stream()), FileType::Mpeg)
		.read()
		.unwrap();

	assert_eq!(properties.codec_description(), "WavPack");
}

#[test_log::test]
fn id3v2_prefixed_stream_is_guessed() {
	// ID3v2 header with a 64 byte body, then a FLAC stream
	let mut data = vec![b'I', b'D', b'3', 4, 0, 0, 0, 0, 0, 64];
	data.extend(std::iter::repeat_n(0u8, 64));
	data.extend_from_slice(&flac_stream());

	let probe = Probe::new(Cursor::new(data)).guess_file_type().unwrap();
	assert_eq!(probe.file_type(), Some(FileType::Flac));

	let properties = probe.read().unwrap();
	assert_eq!(properties.sample_rate(), 44100);
}

#[test_log::test]
fn read_from_path_dispatches_by_extension() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("stream.flac");

	let mut file = std::fs::File::create(&path).unwrap();
	file.write_all(&flac_stream()).unwrap();
	drop(file);

	let properties = mediaprobe::read_from_path(&path).unwrap();
	assert_eq!(properties.sample_rate(), 44100);
	assert_eq!(properties.channels(), 2);
}

#[test_log::test]
fn read_from_reader() {
	let mut reader = Cursor::new(wavpack_stream());
	let properties = mediaprobe::read_from(&mut reader).unwrap();

	assert_eq!(properties.audio_bitrate(), 1411);
}
