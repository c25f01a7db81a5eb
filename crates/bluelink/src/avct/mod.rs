//! Audio/Video Control Transport Protocol (AVCTP) browsing channel

pub mod browse;

pub use self::browse::{AvctHeader, BrowsingRelay};
