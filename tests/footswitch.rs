use std::sync::Arc;

use tonelink::{
    FootswitchMapping, Link, LinkEvents, MemoryTransport, Session, SessionConfig, Slot,
    StateLayout, unwrap_frame, wrap_frame,
};

fn ready_link() -> (Link<MemoryTransport>, MemoryTransport) {
    let transport = MemoryTransport::new();
    let session = Arc::new(Session::new(transport.clone(), SessionConfig::default()));
    let link = Link::new(session);

    let layout = StateLayout::REVISION_2;
    let mut raw = vec![0u8; 24];
    raw[24 - layout.current_slot] = Slot::A.as_u8();
    let mut state = vec![0xB9, 0x03, 0x81, 0x06, 0x03, 0x82, 24, 0x00, 0x80, 0x0B];
    state.extend_from_slice(&raw);

    link.on_connect();
    link.on_receive(&wrap_frame(&[0xB9, 0x03, 0x02, 0x00, 0x80, 0x0B]));
    link.on_receive(&wrap_frame(&state));
    transport.take_sent();
    (link, transport)
}

fn sent_slot(frame: &[u8]) -> u8 {
    let payload = unwrap_frame(frame).unwrap();
    payload[payload.len() - StateLayout::REVISION_2.current_slot]
}

#[test]
fn target_program_selects_slot_b() {
    let (link, transport) = ready_link();
    let mapping = FootswitchMapping::default();

    let sent = mapping.dispatch(link.session(), &[0xC2, 0x01]);

    assert_eq!(sent, 1);
    assert_eq!(link.session().state().unwrap().current_slot(), Slot::B);
    assert_eq!(sent_slot(&transport.sent()[0]), Slot::B.as_u8());
}

#[test]
fn other_programs_select_slot_a_in_order() {
    let (link, transport) = ready_link();
    let mapping = FootswitchMapping::default();

    // B, clock tick, then back to A.
    let sent = mapping.dispatch(link.session(), &[0xC2, 0x01, 0xF8, 0xC2, 0x05]);

    assert_eq!(sent, 2);
    let frames = transport.sent();
    assert_eq!(sent_slot(&frames[0]), Slot::B.as_u8());
    assert_eq!(sent_slot(&frames[1]), Slot::A.as_u8());
    assert_eq!(link.session().state().unwrap().current_slot(), Slot::A);
}

#[test]
fn other_channels_are_ignored() {
    let (link, transport) = ready_link();
    let mapping = FootswitchMapping {
        channel: 0,
        target_program: 1,
    };

    assert_eq!(mapping.dispatch(link.session(), &[0xC2, 0x01, 0xC3, 0x01]), 0);
    assert_eq!(transport.sent_count(), 0);
}

#[test]
fn dispatch_before_handshake_sends_nothing() {
    let transport = MemoryTransport::new();
    let session = Session::new(transport.clone(), SessionConfig::default());

    assert_eq!(FootswitchMapping::default().dispatch(&session, &[0xC2, 0x01]), 0);
    assert_eq!(transport.sent_count(), 0);
}
