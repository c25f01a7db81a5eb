//! Device addressing shared by every layer of the engine

pub mod types;

pub use self::types::{BdAddr, Transport};
