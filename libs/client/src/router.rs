use connect_core::Packet;
use tracing::{trace, warn};

use crate::correlation::CorrelationTable;
use crate::dispatcher::EventDispatcher;
use crate::event::Event;

/// What the read loop must do after routing a packet
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// Nothing left to do
    Handled,
    /// Write this packet back to the peer
    Reply(Packet),
}

/// Demultiplex one inbound packet
///
/// Results complete their pending record, events go to the subscribers of
/// their topic, keepalives are handed back to be echoed. Event handlers run
/// here, on the caller's thread, before the next packet is read.
pub fn route(
    packet: Packet,
    table: &CorrelationTable,
    events: &EventDispatcher<Event>,
) -> Routed {
    match packet {
        Packet::Keepalive { .. } => Routed::Reply(packet),
        Packet::Result {
            sequence_id,
            status_code,
            result,
        } => {
            if !table.resolve(sequence_id, status_code, result) {
                trace!(sequence_id, status_code, "result for unknown sequence id");
            }
            Routed::Handled
        }
        Packet::MessageEvent(payload) => publish(events, Event::Message(payload)),
        Packet::RedirectEvent(payload) => publish(events, Event::Redirect(payload)),
        Packet::ServerEvent(payload) => publish(events, Event::Server(payload)),
        Packet::Request { sequence_id, .. } => {
            warn!(sequence_id, "ignoring request sent by the authority");
            Routed::Handled
        }
    }
}

fn publish(events: &EventDispatcher<Event>, event: Event) -> Routed {
    let topic = event.topic();
    let delivered = events.dispatch(topic, &event);
    trace!(topic, delivered, "event dispatched");
    Routed::Handled
}
