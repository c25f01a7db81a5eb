//! L2CAP boundary
//!
//! The channel/segmentation layer itself lives outside this crate. This module
//! describes what crosses the boundary:
//! - Channel identifiers, result codes and configuration parameters
//! - The `L2capInterface` trait through which the engine issues requests
//! - The effective payload size rule applied during configuration

pub mod constants;
pub mod interface;
pub mod psm;
pub mod types;

pub use self::interface::L2capInterface;
pub use self::psm::PSM;
pub use self::types::*;
