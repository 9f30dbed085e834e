//! Options to control how streams are probed

/// The accuracy level of a property read
///
/// Properties are always derived from a single representative header read,
/// rather than an exhaustive scan of the stream.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[non_exhaustive]
pub enum ReadStyle {
	/// Skip property computation entirely
	///
	/// The stream's format is still verified, but [`Probe::read`](crate::probe::Probe::read)
	/// will produce an empty [`StreamProperties`](crate::properties::StreamProperties).
	None,
	/// Derive properties from one representative header read
	#[default]
	Average,
}

/// Options to control how mediaprobe parses a stream
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct ProbeOptions {
	pub(crate) read_style: ReadStyle,
	pub(crate) max_junk_bytes: usize,
}

impl Default for ProbeOptions {
	/// The default implementation for `ProbeOptions`
	///
	/// The defaults are as follows:
	///
	/// ```rust,ignore
	/// ProbeOptions {
	/// 	read_style: ReadStyle::Average,
	/// 	max_junk_bytes: 1024,
	/// }
	/// ```
	fn default() -> Self {
		Self::new()
	}
}

impl ProbeOptions {
	/// Default number of junk bytes to read
	pub const DEFAULT_MAX_JUNK_BYTES: usize = 1024;

	/// Creates a new `ProbeOptions`, alias for `Default` implementation
	///
	/// See also: [`ProbeOptions::default`]
	///
	/// # Examples
	///
	/// ```rust
	/// use mediaprobe::config::ProbeOptions;
	///
	/// let probe_options = ProbeOptions::new();
	/// ```
	#[must_use]
	pub const fn new() -> Self {
		Self {
			read_style: ReadStyle::Average,
			max_junk_bytes: Self::DEFAULT_MAX_JUNK_BYTES,
		}
	}

	/// The accuracy level to use when reading properties, see [`ReadStyle`] for details
	///
	/// # Examples
	///
	/// ```rust
	/// use mediaprobe::config::{ProbeOptions, ReadStyle};
	///
	/// // We only want to verify the format, properties are not needed.
	/// let probe_options = ProbeOptions::new().read_style(ReadStyle::None);
	/// ```
	pub fn read_style(&mut self, read_style: ReadStyle) -> Self {
		self.read_style = read_style;
		*self
	}

	/// The maximum number of allowed junk bytes to search
	///
	/// Some information may be surrounded by junk bytes, such as tag padding remnants. This sets the maximum
	/// number of junk/unrecognized bytes mediaprobe will search for required information before giving up.
	///
	/// # Examples
	///
	/// ```rust
	/// use mediaprobe::config::ProbeOptions;
	///
	/// // I have files full of junk, I'll double the search window!
	/// let probe_options = ProbeOptions::new().max_junk_bytes(2048);
	/// ```
	pub fn max_junk_bytes(&mut self, max_junk_bytes: usize) -> Self {
		self.max_junk_bytes = max_junk_bytes;
		*self
	}
}
