//! Probe audio/video streams for their structural playback properties
//! (duration, bitrate, sample rate, channel count, bit depth, pixel
//! dimensions) without decoding any sample data.
//!
//! Each supported container's native stream-description structures are
//! located and interpreted directly; the result is one normalized
//! [`StreamProperties`](properties::StreamProperties) value per stream, or a
//! structured failure. Container internals never leak to the caller.
//!
//! # Examples
//!
//! ## Probing a path
//!
//! The format is inferred from the extension, falling back to every known
//! recognizer when the extension lies.
//!
//! ```rust,no_run
//! # fn main() -> mediaprobe::error::Result<()> {
//! let properties = mediaprobe::read_from_path("music.flac")?;
//!
//! println!("duration: {:?}", properties.duration());
//! println!("sample rate: {} Hz", properties.sample_rate());
//! println!("codec: {}", properties.codec_description());
//! # Ok(())
//! # }
//! ```
//!
//! ## Probing an existing reader
//!
//! Any `Read + Seek` source works; the format is detected from the content.
//!
//! ```rust,no_run
//! # fn main() -> mediaprobe::error::Result<()> {
//! use std::fs::File;
//!
//! let mut file = File::open("music.wv")?;
//! let properties = mediaprobe::read_from(&mut file)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Fine-grained control
//!
//! ```rust,no_run
//! # fn main() -> mediaprobe::error::Result<()> {
//! use mediaprobe::config::{ProbeOptions, ReadStyle};
//! use mediaprobe::probe::{FileType, Probe};
//!
//! // Verify the stream's structure, but skip the property computation
//! let options = ProbeOptions::new().read_style(ReadStyle::None);
//!
//! let probe = Probe::open("music.mpc")?.options(options).guess_file_type()?;
//! assert_eq!(probe.file_type(), Some(FileType::Mpc));
//!
//! let _ = probe.read()?;
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod io;
pub(crate) mod macros;
pub(crate) mod pipeline;
pub mod probe;
pub mod properties;
pub(crate) mod util;

pub mod aac;
pub mod dsf;
pub mod flac;
pub mod iff;
pub mod mpeg;
pub mod musepack;
pub mod wavpack;

use crate::error::Result;
use crate::probe::Probe;
use crate::properties::StreamProperties;

use std::io::{Read, Seek};
use std::path::Path;

/// Probe the file at `path` and read its properties
///
/// The format is guessed from the extension first, with content-based
/// fallback across every recognizer.
///
/// # Errors
///
/// * `path` does not exist
/// * No recognizer claims the file ([`ErrorKind::UnsupportedFormat`](crate::error::ErrorKind::UnsupportedFormat))
/// * The stream is malformed ([`ErrorKind::CorruptStream`](crate::error::ErrorKind::CorruptStream))
///
/// # Examples
///
/// ```rust,no_run
/// # fn main() -> mediaprobe::error::Result<()> {
/// let properties = mediaprobe::read_from_path("music.flac")?;
///
/// println!("channels: {}", properties.channels());
/// # Ok(())
/// # }
/// ```
pub fn read_from_path<P>(path: P) -> Result<StreamProperties>
where
	P: AsRef<Path>,
{
	Probe::open(path)?.read()
}

/// Probe `reader` and read its properties
///
/// The format is guessed from the stream's content.
///
/// # Errors
///
/// Same as [`Probe::read`].
///
/// # Examples
///
/// ```rust,no_run
/// # fn main() -> mediaprobe::error::Result<()> {
/// use std::fs::File;
///
/// let mut file = File::open("music.flac")?;
/// let properties = mediaprobe::read_from(&mut file)?;
/// # Ok(())
/// # }
/// ```
pub fn read_from<R>(reader: &mut R) -> Result<StreamProperties>
where
	R: Read + Seek,
{
	Probe::new(reader).guess_file_type()?.read()
}
