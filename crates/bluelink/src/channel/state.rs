//! Channel state graph

use std::fmt;

/// State of the logical channel owned by a connection context
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelState {
    /// No channel (initial and terminal)
    Closed,
    /// A local or remote connect request is outstanding
    Connecting,
    /// Configuration parameters are being negotiated
    Configuring,
    /// Data may flow
    Open,
    /// A local disconnect request awaits confirmation
    Closing,
}

impl ChannelState {
    /// Whether `next` is an edge of the state graph.
    ///
    /// Fixed channels skip configuration, so CONNECTING may go straight to
    /// OPEN. Any live state may drop to CLOSED on failure or disconnect.
    pub fn can_transition_to(self, next: ChannelState) -> bool {
        use ChannelState::*;
        matches!(
            (self, next),
            (Closed, Connecting)
                | (Connecting, Configuring)
                | (Connecting, Open)
                | (Connecting, Closing)
                | (Configuring, Open)
                | (Configuring, Closing)
                | (Open, Closing)
                | (Connecting | Configuring | Open | Closing, Closed)
        )
    }

    /// Whether the channel has been accepted by both sides: CONFIGURING or
    /// later, CLOSING included.
    pub fn is_established(self) -> bool {
        self >= ChannelState::Configuring
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelState::Closed => "CLOSED",
            ChannelState::Connecting => "CONNECTING",
            ChannelState::Configuring => "CONFIGURING",
            ChannelState::Open => "OPEN",
            ChannelState::Closing => "CLOSING",
        };
        f.write_str(name)
    }
}
