//! AAC (ADTS) specific items

mod adts;
mod properties;
mod read;

pub use adts::AudioObjectType;
pub use properties::AacProperties;

pub(crate) use read::read_from;
