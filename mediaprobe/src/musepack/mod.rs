//! MusePack specific items

mod constants;
mod read;
pub mod sv7;
pub mod sv8;

pub use sv7::MpcSv7Properties;
pub use sv8::MpcSv8Properties;

pub(crate) use read::read_from;

use crate::properties::StreamProperties;

/// Audio properties of an MPC stream
///
/// The information available differs between stream versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpcProperties {
	/// MPC stream version 8 properties
	Sv8(MpcSv8Properties),
	/// MPC stream version 7 properties
	Sv7(MpcSv7Properties),
}

impl From<MpcProperties> for StreamProperties {
	fn from(input: MpcProperties) -> Self {
		match input {
			MpcProperties::Sv8(sv8prop) => sv8prop.into(),
			MpcProperties::Sv7(sv7prop) => sv7prop.into(),
		}
	}
}

/// The version of the MPC stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MpcStreamVersion {
	/// Stream version 8
	#[default]
	Sv8,
	/// Stream version 7
	Sv7,
}
