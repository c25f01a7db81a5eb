//! Test doubles shared by the unit tests
//!
//! Every mock writes into one `CallLog`, so tests can assert on the relative
//! order of channel-layer requests and client callbacks.

use crate::att::AttHandler;
use crate::channel::{Clock, LinkInfo};
use crate::gap::{BdAddr, Transport};
use crate::l2cap::{ChannelId, DataWriteResult, L2capInterface, PSM};
use crate::registry::{Capabilities, ConnId, ConnParams, InterfaceId, LinkStatus, ProfileClient};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Request issued to the channel layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum L2capCall {
    ConnectReq { psm: PSM, peer: BdAddr },
    DisconnectReq(ChannelId),
    DataWrite { cid: ChannelId, peer: BdAddr, pdu: Vec<u8> },
    CreateLeConnection(BdAddr),
    CancelLeConnection(BdAddr),
    RemoveFixedChannel { cid: ChannelId, peer: BdAddr },
}

/// Callback received by a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Connected {
        peer: BdAddr,
        conn_id: ConnId,
        status: LinkStatus,
        transport: Transport,
    },
    Disconnected {
        peer: BdAddr,
        conn_id: ConnId,
        reason: LinkStatus,
        transport: Transport,
    },
    Congestion { conn_id: ConnId, congested: bool },
    Data { conn_id: ConnId, payload: Vec<u8> },
    ConnUpdate { conn_id: ConnId, params: ConnParams, status: u8 },
    PhyUpdated { conn_id: ConnId, tx_phy: u8, rx_phy: u8, status: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    L2cap(L2capCall),
    Client(InterfaceId, ClientEvent),
}

/// Shared, ordered record of everything the mocks saw
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    pub fn l2cap(&self) -> Vec<L2capCall> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::L2cap(call) => Some(call),
                Call::Client(..) => None,
            })
            .collect()
    }

    pub fn client(&self, id: InterfaceId) -> Vec<ClientEvent> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Client(who, event) if who == id => Some(event),
                _ => None,
            })
            .collect()
    }

    pub fn disconnect_reqs(&self) -> Vec<ChannelId> {
        self.l2cap()
            .into_iter()
            .filter_map(|call| match call {
                L2capCall::DisconnectReq(cid) => Some(cid),
                _ => None,
            })
            .collect()
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.l2cap()
            .into_iter()
            .filter_map(|call| match call {
                L2capCall::DataWrite { pdu, .. } => Some(pdu),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug)]
struct MockL2capState {
    next_cid: ChannelId,
    acl_connected: bool,
    accept_connect: bool,
    accept_disconnect: bool,
    write_result: DataWriteResult,
}

/// Recording channel layer. Clones share state, so a test keeps one clone to
/// steer the copy owned by the core.
#[derive(Debug, Clone)]
pub struct MockL2cap {
    log: CallLog,
    state: Arc<Mutex<MockL2capState>>,
}

impl MockL2cap {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            state: Arc::new(Mutex::new(MockL2capState {
                next_cid: 0x0040,
                acl_connected: true,
                accept_connect: true,
                accept_disconnect: true,
                write_result: DataWriteResult::Success,
            })),
        }
    }

    pub fn set_accept_disconnect(&self, accept: bool) {
        self.state.lock().unwrap().accept_disconnect = accept;
    }

    pub fn set_acl_connected(&self, connected: bool) {
        self.state.lock().unwrap().acl_connected = connected;
    }

    pub fn set_accept_connect(&self, accept: bool) {
        self.state.lock().unwrap().accept_connect = accept;
    }

    pub fn set_write_result(&self, result: DataWriteResult) {
        self.state.lock().unwrap().write_result = result;
    }
}

impl L2capInterface for MockL2cap {
    fn connect_req(&mut self, psm: PSM, peer: BdAddr) -> Option<ChannelId> {
        self.log.push(Call::L2cap(L2capCall::ConnectReq { psm, peer }));
        let mut state = self.state.lock().unwrap();
        if !state.accept_connect {
            return None;
        }
        let cid = state.next_cid;
        state.next_cid += 1;
        Some(cid)
    }

    fn disconnect_req(&mut self, cid: ChannelId) -> bool {
        self.log.push(Call::L2cap(L2capCall::DisconnectReq(cid)));
        self.state.lock().unwrap().accept_disconnect
    }

    fn data_write(&mut self, cid: ChannelId, peer: BdAddr, pdu: &[u8]) -> DataWriteResult {
        self.log.push(Call::L2cap(L2capCall::DataWrite {
            cid,
            peer,
            pdu: pdu.to_vec(),
        }));
        self.state.lock().unwrap().write_result
    }

    fn create_le_connection(&mut self, peer: BdAddr) -> bool {
        self.log.push(Call::L2cap(L2capCall::CreateLeConnection(peer)));
        self.state.lock().unwrap().accept_connect
    }

    fn cancel_le_connection(&mut self, peer: BdAddr) -> bool {
        self.log.push(Call::L2cap(L2capCall::CancelLeConnection(peer)));
        true
    }

    fn remove_fixed_channel(&mut self, cid: ChannelId, peer: BdAddr) -> bool {
        self.log.push(Call::L2cap(L2capCall::RemoveFixedChannel { cid, peer }));
        true
    }

    fn is_acl_connected(&self, _peer: BdAddr, _transport: Transport) -> bool {
        self.state.lock().unwrap().acl_connected
    }
}

/// Recording profile client
pub struct MockClient {
    log: CallLog,
    capabilities: Capabilities,
}

impl MockClient {
    pub fn new(log: CallLog) -> Self {
        Self::with_capabilities(log, Capabilities::all())
    }

    pub fn with_capabilities(log: CallLog, capabilities: Capabilities) -> Self {
        Self { log, capabilities }
    }

    fn record(&self, interface: InterfaceId, event: ClientEvent) {
        self.log.push(Call::Client(interface, event));
    }
}

impl ProfileClient for MockClient {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn on_connected(
        &mut self,
        interface: InterfaceId,
        peer: BdAddr,
        conn_id: ConnId,
        status: LinkStatus,
        transport: Transport,
    ) {
        self.record(
            interface,
            ClientEvent::Connected {
                peer,
                conn_id,
                status,
                transport,
            },
        );
    }

    fn on_disconnected(
        &mut self,
        interface: InterfaceId,
        peer: BdAddr,
        conn_id: ConnId,
        reason: LinkStatus,
        transport: Transport,
    ) {
        self.record(
            interface,
            ClientEvent::Disconnected {
                peer,
                conn_id,
                reason,
                transport,
            },
        );
    }

    fn on_congestion_changed(&mut self, conn_id: ConnId, congested: bool) {
        self.record(
            conn_id.interface_id(),
            ClientEvent::Congestion { conn_id, congested },
        );
    }

    fn on_data(&mut self, conn_id: ConnId, payload: &[u8]) {
        self.record(
            conn_id.interface_id(),
            ClientEvent::Data {
                conn_id,
                payload: payload.to_vec(),
            },
        );
    }

    fn on_conn_update(&mut self, interface: InterfaceId, conn_id: ConnId, params: ConnParams, status: u8) {
        self.record(
            interface,
            ClientEvent::ConnUpdate {
                conn_id,
                params,
                status,
            },
        );
    }

    fn on_phy_updated(&mut self, interface: InterfaceId, conn_id: ConnId, tx_phy: u8, rx_phy: u8, status: u8) {
        self.record(
            interface,
            ClientEvent::PhyUpdated {
                conn_id,
                tx_phy,
                rx_phy,
                status,
            },
        );
    }
}

/// What reached the ATT layers above the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttCall {
    Request { opcode: u8, payload: Vec<u8> },
    Response { opcode: u8, payload: Vec<u8> },
    SignedWrite(Vec<u8>),
}

/// Recording `AttHandler`; answers every request with `reply`, if set
#[derive(Debug, Clone, Default)]
pub struct MockAttHandler {
    pub calls: Arc<Mutex<Vec<AttCall>>>,
    pub reply: Option<Vec<u8>>,
}

impl MockAttHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AttCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl AttHandler for MockAttHandler {
    fn handle_request(
        &mut self,
        _link: &LinkInfo,
        _cid: ChannelId,
        opcode: u8,
        payload: &[u8],
    ) -> Option<Vec<u8>> {
        self.calls.lock().unwrap().push(AttCall::Request {
            opcode,
            payload: payload.to_vec(),
        });
        self.reply.clone()
    }

    fn handle_response(&mut self, _link: &LinkInfo, _cid: ChannelId, opcode: u8, payload: &[u8]) {
        self.calls.lock().unwrap().push(AttCall::Response {
            opcode,
            payload: payload.to_vec(),
        });
    }

    fn verify_signed_write(&mut self, _link: &LinkInfo, _cid: ChannelId, pdu: &[u8]) {
        self.calls
            .lock()
            .unwrap()
            .push(AttCall::SignedWrite(pdu.to_vec()));
    }
}

/// Hand-driven `Clock`
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}
