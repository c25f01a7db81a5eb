//! Engine configuration

use crate::l2cap::constants::*;
use crate::l2cap::{ChannelId, RetransmissionMode, PSM};
use std::time::Duration;

/// Idle grace period before an unused fixed channel is torn down
pub const LINK_IDLE_TIMEOUT_WHEN_NO_APP: Duration = Duration::from_secs(1);

/// Engine configuration
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Capacity of the control-block table (concurrent links)
    pub max_links: usize,
    /// Capacity of the client registry
    pub max_clients: usize,
    /// PSM of the dynamic channel terminated by this engine
    pub psm: PSM,
    /// Fixed channel served on LE links, if any
    pub fixed_cid: Option<ChannelId>,
    /// Whether dynamic channels over BR/EDR are accepted and initiated
    pub over_br_enabled: bool,
    /// Our MTU for dynamic channels
    pub default_mtu: u16,
    /// Payload size on the fixed channel before any MTU exchange
    pub le_default_mtu: u16,
    /// Platform buffer size, headers included
    pub max_buffer_size: u16,
    /// Channel mode requested during configuration
    pub preferred_mode: RetransmissionMode,
    /// Idle grace period for fixed channels nobody holds
    pub idle_timeout_when_no_app: Duration,
    /// Commands that may wait per context while one is in flight
    pub max_queued_commands: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::gatt()
    }
}

impl CoreConfig {
    /// ATT over the LE fixed channel and over PSM 0x001F on BR/EDR
    pub fn gatt() -> Self {
        Self {
            max_links: 16,
            max_clients: 32,
            psm: PSM::ATT,
            fixed_cid: Some(L2CAP_ATT_CID),
            over_br_enabled: true,
            default_mtu: L2CAP_DEFAULT_MTU,
            le_default_mtu: L2CAP_LE_DEFAULT_MTU,
            max_buffer_size: BT_DEFAULT_BUFFER_SIZE,
            preferred_mode: RetransmissionMode::Basic,
            idle_timeout_when_no_app: LINK_IDLE_TIMEOUT_WHEN_NO_APP,
            max_queued_commands: 64,
        }
    }

    /// AVCTP browsing channel; BR/EDR only, ERTM mandated
    pub fn avctp_browsing() -> Self {
        Self {
            psm: PSM::AVCTP_BROWSING,
            fixed_cid: None,
            preferred_mode: RetransmissionMode::EnhancedRetransmission,
            max_links: 6,
            ..Self::gatt()
        }
    }

    /// Largest payload that fits in one platform buffer
    pub fn max_payload_size(&self) -> u16 {
        self.max_buffer_size
            .saturating_sub(L2CAP_MIN_OFFSET)
            .saturating_sub(BT_HDR_SIZE)
    }
}
