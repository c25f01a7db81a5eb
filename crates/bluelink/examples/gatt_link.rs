/// Example driving the ATT channel engine with simulated channel-layer events
use bluelink::att::RejectAllRequests;
use bluelink::*;
use std::thread;

/// Channel layer that just prints what the engine asks of it
struct PrintingL2cap {
    next_cid: ChannelId,
}

impl L2capInterface for PrintingL2cap {
    fn connect_req(&mut self, psm: PSM, peer: BdAddr) -> Option<ChannelId> {
        let cid = self.next_cid;
        self.next_cid += 1;
        println!("  -> connect request to {} on {} (CID=0x{:04x})", peer, psm, cid);
        Some(cid)
    }

    fn disconnect_req(&mut self, cid: ChannelId) -> bool {
        println!("  -> disconnect request for CID=0x{:04x}", cid);
        true
    }

    fn data_write(&mut self, cid: ChannelId, peer: BdAddr, pdu: &[u8]) -> DataWriteResult {
        println!("  -> write to {} on CID=0x{:04x}: {:02x?}", peer, cid, pdu);
        DataWriteResult::Success
    }

    fn create_le_connection(&mut self, peer: BdAddr) -> bool {
        println!("  -> create LE connection to {}", peer);
        true
    }

    fn cancel_le_connection(&mut self, peer: BdAddr) -> bool {
        println!("  -> cancel LE connection to {}", peer);
        true
    }

    fn remove_fixed_channel(&mut self, cid: ChannelId, peer: BdAddr) -> bool {
        println!("  -> remove fixed channel 0x{:04x} to {}", cid, peer);
        true
    }

    fn is_acl_connected(&self, _peer: BdAddr, _transport: Transport) -> bool {
        true
    }
}

struct PrintingClient;

impl ProfileClient for PrintingClient {
    fn capabilities(&self) -> Capabilities {
        Capabilities::CONNECTED | Capabilities::DISCONNECTED | Capabilities::CONGESTION
    }

    fn on_connected(
        &mut self,
        interface: InterfaceId,
        peer: BdAddr,
        conn_id: ConnId,
        status: LinkStatus,
        transport: Transport,
    ) {
        println!(
            "[{}] connected: peer={}, conn_id={}, status={}, transport={}",
            interface, peer, conn_id, status, transport
        );
    }

    fn on_disconnected(
        &mut self,
        interface: InterfaceId,
        peer: BdAddr,
        conn_id: ConnId,
        reason: LinkStatus,
        _transport: Transport,
    ) {
        println!(
            "[{}] disconnected: peer={}, conn_id={}, reason={}",
            interface, peer, conn_id, reason
        );
    }

    fn on_congestion_changed(&mut self, conn_id: ConnId, congested: bool) {
        println!("[{}] congested: {}", conn_id, congested);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("ATT Channel Engine Example");
    println!("--------------------------");

    let mut core = ChannelCore::new(
        CoreConfig::gatt(),
        Box::new(PrintingL2cap { next_cid: 0x0040 }),
        Box::new(AttDispatcher::new(RejectAllRequests)),
    );
    let client = core.register(Box::new(PrintingClient))?;
    println!("Registered client {}", client);

    let peer = BdAddr::new([0x55, 0x44, 0x33, 0x22, 0x11, 0x00]);
    println!("Simulating peer {}", peer);
    let (handle, rx) = event_queue();

    // Transport glue would normally feed these from the L2CAP callbacks
    let feeder = thread::spawn(move || {
        let events = vec![
            CoreEvent::ConnectIndication {
                peer,
                cid: 0x0041,
                psm: PSM::ATT,
                identifier: 1,
            },
            CoreEvent::ConfigIndication {
                cid: 0x0041,
                params: ConfigInfo::with_mtu(512),
            },
            CoreEvent::ConfigConfirm {
                cid: 0x0041,
                result: 0,
                params: ConfigInfo::with_mtu(512),
            },
            // Read Request, answered with an error response
            CoreEvent::Data {
                cid: 0x0041,
                payload: vec![0x0A, 0x03, 0x00],
            },
            CoreEvent::Congestion {
                cid: 0x0041,
                congested: true,
            },
            CoreEvent::Congestion {
                cid: 0x0041,
                congested: false,
            },
            CoreEvent::DisconnectIndication {
                cid: 0x0041,
                ack_needed: true,
            },
            CoreEvent::Shutdown,
        ];
        for event in events {
            if !handle.send(event) {
                break;
            }
        }
    });

    println!("Running event loop...");
    core.run(rx);

    if feeder.join().is_err() {
        eprintln!("Event feeder panicked");
    }
    println!("Links left: {}", core.table().len());
    Ok(())
}
