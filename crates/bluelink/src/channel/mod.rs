//! Channel core
//!
//! This module owns the per-link connection contexts and the logic driving
//! them:
//! - The control-block table and the channel state graph
//! - The state machine reacting to channel-layer callbacks
//! - Hold tracking and idle disconnects
//! - Congestion relay and the outbound command queue
//! - The event queue that serializes everything onto one thread

pub mod congestion;
pub mod context;
pub mod event;
pub mod handler;
pub mod idle;
pub mod lifecycle;
pub mod machine;
pub mod state;
pub mod table;

pub use self::context::{ConnectionContext, LinkInfo};
pub use self::event::{event_queue, CoreEvent, CoreHandle};
pub use self::handler::{PduHandler, PduOutcome};
pub use self::idle::{Clock, IdleTimers, SystemClock};
pub use self::machine::ChannelCore;
pub use self::state::ChannelState;
pub use self::table::ControlBlockTable;
