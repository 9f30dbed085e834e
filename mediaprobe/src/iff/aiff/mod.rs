//! AIFF specific items

mod properties;
mod read;

pub use properties::AiffProperties;

pub(crate) use read::read_from;
