//! Package metadata, platform names and console output
//!
//! Shared by every helper binary.

pub mod description;
pub mod naming;
pub mod output;
pub mod platform;

pub use description::{Description, MetadataError, TkVersion};
pub use platform::PlatformTag;
