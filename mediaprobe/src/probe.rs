//! Format-agnostic stream probing tools

use crate::config::ProbeOptions;
use crate::error::{ErrorKind, Result};
use crate::io::{ReadBlock, StreamHandle, skip_id3v2};
use crate::macros::err;
use crate::properties::StreamProperties;

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// List of common media file extensions
///
/// This contains a bunch of common extensions for all supported [`FileType`]s, and can be used as a filter
/// when scanning directories.
///
/// NOTE: This is **not** an exhaustive list, but it should work fine in most cases.
pub const EXTENSIONS: &[&str] = &[
	// Also update `FileType::from_ext()` below
	"aac", "aiff", "aif", "dsf", "flac", "mp3", "mp2", "mp1", "mpg", "mpeg", "m1v", "m2v", "mpc",
	"mp+", "mpp", "wv",
];

/// The type of stream read
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[allow(missing_docs)]
#[non_exhaustive]
pub enum FileType {
	Aac,
	Aiff,
	Dsf,
	Flac,
	Mpeg,
	Mpc,
	WavPack,
}

impl FileType {
	/// The format's display name, used in diagnostics
	pub fn name(self) -> &'static str {
		match self {
			FileType::Aac => "AAC",
			FileType::Aiff => "AIFF",
			FileType::Dsf => "DSF",
			FileType::Flac => "FLAC",
			FileType::Mpeg => "MPEG",
			FileType::Mpc => "MusePack",
			FileType::WavPack => "WavPack",
		}
	}

	/// Attempts to extract a [`FileType`] from an extension
	///
	/// # Examples
	///
	/// ```rust
	/// use mediaprobe::probe::FileType;
	///
	/// let extension = "mp3";
	/// assert_eq!(FileType::from_ext(extension), Some(FileType::Mpeg));
	/// ```
	pub fn from_ext<E>(ext: E) -> Option<Self>
	where
		E: AsRef<OsStr>,
	{
		let ext = ext.as_ref().to_str()?.to_ascii_lowercase();

		// Also update `EXTENSIONS` above
		match ext.as_str() {
			"aac" => Some(Self::Aac),
			"aiff" | "aif" => Some(Self::Aiff),
			"dsf" => Some(Self::Dsf),
			"flac" => Some(Self::Flac),
			"mp3" | "mp2" | "mp1" | "mpg" | "mpeg" | "m1v" | "m2v" => Some(Self::Mpeg),
			"mpc" | "mp+" | "mpp" => Some(Self::Mpc),
			"wv" => Some(Self::WavPack),
			_ => None,
		}
	}

	/// Attempts to determine a [`FileType`] from a path
	///
	/// # Examples
	///
	/// ```rust
	/// use mediaprobe::probe::FileType;
	/// use std::path::Path;
	///
	/// let path = Path::new("path/to/my.mp3");
	/// assert_eq!(FileType::from_path(path), Some(FileType::Mpeg));
	/// ```
	pub fn from_path<P>(path: P) -> Option<Self>
	where
		P: AsRef<Path>,
	{
		let ext = path.as_ref().extension();
		ext.and_then(Self::from_ext)
	}

	/// Attempts to extract a [`FileType`] from a buffer of leading stream bytes
	///
	/// NOTE: This **will not** search past tags at the start of the buffer.
	/// For that behavior, use [`Probe::guess_file_type`].
	///
	/// # Examples
	///
	/// ```rust
	/// use mediaprobe::probe::FileType;
	///
	/// let buf = b"fLaC\x80\x00\x00\x22";
	/// assert_eq!(FileType::from_buffer(buf), Some(FileType::Flac));
	/// ```
	pub fn from_buffer(buf: &[u8]) -> Option<Self> {
		use crate::mpeg::header::verify_frame_sync;

		if buf.is_empty() {
			return None;
		}

		match buf[0] {
			102 if buf.starts_with(b"fLaC") => Some(Self::Flac),
			70 if buf.len() >= 12 && &buf[..4] == b"FORM" => {
				if &buf[8..12] == b"AIFF" {
					return Some(Self::Aiff);
				}

				None
			},
			68 if buf.starts_with(b"DSD ") => Some(Self::Dsf),
			119 if buf.starts_with(b"wvpk") => Some(Self::WavPack),
			255 if buf.len() >= 2 && verify_frame_sync([buf[0], buf[1]]) => {
				// ADTS and MPEG frame headers are way too similar

				// ADTS (https://wiki.multimedia.cx/index.php/ADTS#Header):
				//
				// AAAAAAAA AAAABCCX
				//
				// Letter 	Length (bits) 	Description
				// A 	    12 	            Syncword, all bits must be set to 1.
				// B 	    1 	            MPEG Version, set to 0 for MPEG-4 and 1 for MPEG-2.
				// C 	    2 	            Layer, always set to 0.

				// MPEG (http://www.mp3-tech.org/programmer/frame_header.html):
				//
				// AAAAAAAA AAABBCCX
				//
				// Letter 	Length (bits) 	Description
				// A 	    11              Syncword, all bits must be set to 1.
				// B 	    2 	            MPEG Audio version ID
				// C 	    2 	            Layer description

				// The subtle overlap in the ADTS header's frame sync and MPEG's version ID
				// is the first condition to check. However, since 0b10 and 0b11 are valid versions
				// in MPEG, we have to also check the layer.

				// So, if we have a version 1 (0b11) or version 2 (0b10) MPEG frame AND a layer of 0b00,
				// we can assume we have an ADTS header. Awesome!

				if buf[1] & 0b10000 > 0 && buf[1] & 0b110 == 0 {
					return Some(Self::Aac);
				}

				Some(Self::Mpeg)
			},
			0 if buf.len() >= 4 && buf[1] == 0 && buf[2] == 1 && (buf[3] == 0xB3 || buf[3] == 0xBA) => {
				// A video sequence header or pack header start code
				Some(Self::Mpeg)
			},
			_ if buf.starts_with(b"MPCK") || buf.starts_with(b"MP+") => Some(Self::Mpc),
			_ => None,
		}
	}
}

pub(crate) struct FormatEntry<R: Read + Seek> {
	pub(crate) file_type: FileType,
	pub(crate) read: fn(&mut R, ProbeOptions) -> Result<Option<StreamProperties>>,
}

// The dispatch table. This is the only place format coverage is declared:
// a new format needs a recognizer module and one entry here.
//
// MPEG sits last since its frame sync search is the greediest of the probes.
pub(crate) fn format_table<R: Read + Seek>() -> [FormatEntry<R>; 7] {
	[
		FormatEntry {
			file_type: FileType::Flac,
			read: crate::flac::read_from,
		},
		FormatEntry {
			file_type: FileType::Aiff,
			read: crate::iff::aiff::read_from,
		},
		FormatEntry {
			file_type: FileType::Dsf,
			read: crate::dsf::read_from,
		},
		FormatEntry {
			file_type: FileType::WavPack,
			read: crate::wavpack::read_from,
		},
		FormatEntry {
			file_type: FileType::Mpc,
			read: crate::musepack::read_from,
		},
		FormatEntry {
			file_type: FileType::Aac,
			read: crate::aac::read_from,
		},
		FormatEntry {
			file_type: FileType::Mpeg,
			read: crate::mpeg::read_from,
		},
	]
}

/// A format-agnostic stream prober
///
/// This provides a way to determine the [`FileType`] of a reader, for when a concrete
/// type is not known, and to dispatch the property read to the right recognizer.
///
/// ## Usage
///
/// When reading from a path, the [`FileType`] will be inferred from the path, rather than the
/// open file.
///
/// ```rust,no_run
/// # fn main() -> mediaprobe::error::Result<()> {
/// use mediaprobe::probe::{FileType, Probe};
///
/// let probe = Probe::open("path/to/my.mp3")?;
///
/// // Inferred from the `mp3` extension
/// assert_eq!(probe.file_type(), Some(FileType::Mpeg));
/// # Ok(())
/// # }
/// ```
///
/// When a path isn't available, or is unreliable, content-based detection is also possible.
///
/// ```rust
/// # fn main() -> mediaprobe::error::Result<()> {
/// use mediaprobe::probe::{FileType, Probe};
/// use std::io::Cursor;
///
/// static FLAC_MARKER: &[u8; 4] = b"fLaC";
///
/// let probe = Probe::new(Cursor::new(FLAC_MARKER)).guess_file_type()?;
///
/// // Inferred from the stream marker
/// assert_eq!(probe.file_type(), Some(FileType::Flac));
/// # Ok(())
/// # }
/// ```
pub struct Probe<R: Read + Seek> {
	inner: R,
	options: Option<ProbeOptions>,
	f_ty: Option<FileType>,
}

impl<R: Read + Seek> Probe<R> {
	/// Create a new `Probe`
	///
	/// Before creating a `Probe`, consider wrapping the reader in a [`BufReader`] for better
	/// performance.
	#[must_use]
	pub const fn new(reader: R) -> Self {
		Self {
			inner: reader,
			options: None,
			f_ty: None,
		}
	}

	/// Create a new `Probe` with a specified [`FileType`]
	///
	/// # Examples
	///
	/// ```rust
	/// use mediaprobe::probe::{FileType, Probe};
	///
	/// # fn main() -> mediaprobe::error::Result<()> {
	/// # let reader = std::io::Cursor::new(&[]);
	/// // We know the stream is going to be FLAC,
	/// // so we can skip the format detection
	/// let probe = Probe::with_file_type(reader, FileType::Flac);
	/// # Ok(()) }
	/// ```
	pub fn with_file_type(reader: R, file_type: FileType) -> Self {
		Self {
			inner: reader,
			options: None,
			f_ty: Some(file_type),
		}
	}

	/// Returns the current [`FileType`]
	pub fn file_type(&self) -> Option<FileType> {
		self.f_ty
	}

	/// Set the [`FileType`] with which to read the stream
	pub fn set_file_type(mut self, file_type: FileType) -> Self {
		self.f_ty = Some(file_type);
		self
	}

	/// Set the [`ProbeOptions`] for the Probe
	///
	/// # Examples
	///
	/// ```rust
	/// use mediaprobe::config::{ProbeOptions, ReadStyle};
	/// use mediaprobe::probe::Probe;
	///
	/// # fn main() -> mediaprobe::error::Result<()> {
	/// # let reader = std::io::Cursor::new(&[]);
	/// // By default, properties will be read.
	/// // In this example, we want to turn this off.
	/// let options = ProbeOptions::new().read_style(ReadStyle::None);
	///
	/// let probe = Probe::new(reader).options(options);
	/// # Ok(()) }
	/// ```
	#[must_use]
	pub fn options(mut self, options: ProbeOptions) -> Self {
		self.options = Some(options);
		self
	}

	/// Extract the reader
	pub fn into_inner(self) -> R {
		self.inner
	}

	/// Attempts to get the [`FileType`] based on the data in the reader
	///
	/// On success, the file type will be replaced. A leading ID3v2 tag is
	/// skipped over for the guess; the reader's position is restored either way.
	///
	/// # Errors
	///
	/// The reader fails a read or seek, in which case the entire `Probe`
	/// should be discarded.
	///
	/// # Examples
	///
	/// ```rust
	/// use mediaprobe::probe::{FileType, Probe};
	/// use std::io::Cursor;
	///
	/// # fn main() -> mediaprobe::error::Result<()> {
	/// let probe = Probe::new(Cursor::new(b"wvpk".to_vec())).guess_file_type()?;
	///
	/// // Determined the stream is WavPack from the content
	/// assert_eq!(probe.file_type(), Some(FileType::WavPack));
	/// # Ok(()) }
	/// ```
	pub fn guess_file_type(mut self) -> Result<Self> {
		let starting_position = self.inner.stream_position()?;

		// A leading ID3v2 tag hides the real stream data; skip it for the guess
		skip_id3v2(&mut self.inner)?;

		// 36 bytes is a guess as to how much data estimating the file type might take.
		// It comfortably covers every magic signature checked.
		let buf = self.inner.read_block(36)?;

		self.inner.seek(SeekFrom::Start(starting_position))?;

		let f_ty = FileType::from_buffer(&buf);
		self.f_ty = f_ty.or(self.f_ty);

		log::debug!("Probe: Guessed file type: {:?}", self.f_ty);

		Ok(self)
	}

	/// Probe the stream and read its properties
	///
	/// The claimed [`FileType`] (from the extension or a guess) is tried
	/// first; on a signature mismatch the remaining recognizers are tried in
	/// declaration order, so a mislabeled file still resolves.
	///
	/// # Errors
	///
	/// * No recognizer claims the stream ([`ErrorKind::UnsupportedFormat`])
	/// * The claimed recognizer finds its signature but the stream is
	///   malformed ([`ErrorKind::CorruptStream`])
	///
	/// # Examples
	///
	/// ```rust,no_run
	/// use mediaprobe::probe::Probe;
	///
	/// # fn main() -> mediaprobe::error::Result<()> {
	/// let properties = Probe::open("path/to/my.flac")?.read()?;
	///
	/// println!("Sample rate: {} Hz", properties.sample_rate());
	/// # Ok(()) }
	/// ```
	pub fn read(mut self) -> Result<StreamProperties> {
		let options = self.options.unwrap_or_default();
		let starting_position = self.inner.stream_position()?;

		let table = format_table::<R>();

		// The claimed type gets the first try, the rest fall back in table order
		let claimed = self.f_ty;
		let ordered = table
			.iter()
			.filter(|entry| Some(entry.file_type) == claimed)
			.chain(
				table
					.iter()
					.filter(|entry| Some(entry.file_type) != claimed),
			);

		for entry in ordered {
			self.inner.seek(SeekFrom::Start(starting_position))?;

			match (entry.read)(&mut self.inner, options) {
				Ok(Some(properties)) => return Ok(properties),
				// Properties were skipped by request; the format itself was verified
				Ok(None) => return Ok(StreamProperties::default()),
				Err(e) if matches!(e.kind(), ErrorKind::SignatureMismatch(_)) => continue,
				Err(e) => return Err(e),
			}
		}

		err!(UnsupportedFormat)
	}
}

impl Probe<StreamHandle<BufReader<File>>> {
	/// Opens a file for reading
	///
	/// This will initially guess the [`FileType`] from the path, but
	/// this can be overwritten with [`Probe::guess_file_type`] or [`Probe::set_file_type`]
	///
	/// # Errors
	///
	/// * `path` does not exist
	///
	/// # Examples
	///
	/// ```rust,no_run
	/// use mediaprobe::probe::{FileType, Probe};
	///
	/// # fn main() -> mediaprobe::error::Result<()> {
	/// let probe = Probe::open("path/to/my.flac")?;
	///
	/// // Guessed from the "flac" extension, see `FileType::from_ext`
	/// assert_eq!(probe.file_type(), Some(FileType::Flac));
	/// # Ok(()) }
	/// ```
	pub fn open<P>(path: P) -> Result<Self>
	where
		P: AsRef<Path>,
	{
		let path = path.as_ref();
		log::debug!("Probe: Opening `{}` for reading", path.display());

		let file_type = FileType::from_path(path);
		log::debug!("Probe: Guessed file type `{:?}` from extension", file_type);

		Ok(Self {
			inner: StreamHandle::open(path)?,
			options: None,
			f_ty: file_type,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::FileType;

	#[test_log::test]
	fn file_type_from_buffer() {
		assert_eq!(FileType::from_buffer(b"fLaC"), Some(FileType::Flac));
		assert_eq!(
			FileType::from_buffer(b"FORM\x00\x00\x00\x00AIFF"),
			Some(FileType::Aiff)
		);
		assert_eq!(FileType::from_buffer(b"DSD "), Some(FileType::Dsf));
		assert_eq!(FileType::from_buffer(b"wvpk"), Some(FileType::WavPack));
		assert_eq!(FileType::from_buffer(b"MP+\x07"), Some(FileType::Mpc));
		assert_eq!(FileType::from_buffer(b"MPCK"), Some(FileType::Mpc));

		// MPEG audio frame sync vs ADTS
		assert_eq!(FileType::from_buffer(&[0xFF, 0xFB]), Some(FileType::Mpeg));
		assert_eq!(FileType::from_buffer(&[0xFF, 0xF1]), Some(FileType::Aac));
		assert_eq!(FileType::from_buffer(&[0xFF, 0xF9]), Some(FileType::Aac));

		// Video sequence header / pack header start codes
		assert_eq!(
			FileType::from_buffer(&[0x00, 0x00, 0x01, 0xB3]),
			Some(FileType::Mpeg)
		);
		assert_eq!(
			FileType::from_buffer(&[0x00, 0x00, 0x01, 0xBA]),
			Some(FileType::Mpeg)
		);

		assert_eq!(FileType::from_buffer(b"RIFF"), None);
		assert_eq!(FileType::from_buffer(&[]), None);
	}

	#[test_log::test]
	fn file_type_from_ext() {
		for (ext, expected) in [
			("flac", FileType::Flac),
			("AIFF", FileType::Aiff),
			("m2v", FileType::Mpeg),
			("mp+", FileType::Mpc),
			("wv", FileType::WavPack),
		] {
			assert_eq!(FileType::from_ext(ext), Some(expected));
		}

		assert_eq!(FileType::from_ext("ogg"), None);
	}
}
