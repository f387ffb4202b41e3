use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tonelink::protocol::command::{HELLO, REQUEST_STATE};
use tonelink::{
    CommandRejected, ConnectionState, Link, LinkEvents, MemoryTransport, Session, SessionConfig,
    SessionError, Slot, StateLayout, unwrap_frame, wrap_frame,
};

const RAW_LEN: usize = 40;

/// Build a state blob with the given fields at the current-firmware offsets.
fn device_blob(presets: [u8; 3], slot: Slot) -> Vec<u8> {
    let layout = StateLayout::REVISION_2;
    let mut raw: Vec<u8> = (0..RAW_LEN).map(|i| (i as u8).wrapping_mul(37)).collect();
    raw[RAW_LEN - layout.slot_a_preset] = presets[0];
    raw[RAW_LEN - layout.slot_b_preset] = presets[1];
    raw[RAW_LEN - layout.slot_c_preset] = presets[2];
    raw[RAW_LEN - layout.current_slot] = slot.as_u8();
    raw
}

fn state_update_frame(raw: &[u8]) -> Vec<u8> {
    let size = (raw.len() as u16).to_le_bytes();
    let mut payload = vec![0xB9, 0x03, 0x81, 0x06, 0x03, 0x82, size[0], size[1], 0x80, 0x0B];
    payload.extend_from_slice(raw);
    wrap_frame(&payload)
}

fn hello_ack_frame() -> Vec<u8> {
    wrap_frame(&[0xB9, 0x03, 0x02, 0x00, 0x80, 0x0B])
}

fn setup() -> (Link<MemoryTransport>, MemoryTransport) {
    let transport = MemoryTransport::new();
    let session = Arc::new(Session::new(transport.clone(), SessionConfig::default()));
    (Link::new(session), transport)
}

#[test]
fn handshake_walks_every_state_in_order() {
    let (link, transport) = setup();
    let session = Arc::clone(link.session());
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);

    link.on_connect();
    assert_eq!(session.connection_state(), ConnectionState::Connected);

    link.on_receive(&hello_ack_frame());
    assert_eq!(session.connection_state(), ConnectionState::Helloed);

    link.on_receive(&state_update_frame(&device_blob([3, 7, 1], Slot::A)));
    assert_eq!(session.connection_state(), ConnectionState::StateInitialized);

    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(unwrap_frame(&sent[0]).unwrap(), HELLO.to_vec());
    assert_eq!(unwrap_frame(&sent[1]).unwrap(), REQUEST_STATE.to_vec());
}

#[test]
fn commands_before_ready_are_dropped() {
    let (link, transport) = setup();
    let session = Arc::clone(link.session());

    assert!(matches!(
        session.set_slot(Slot::B),
        Err(SessionError::Rejected(CommandRejected::NotReady {
            state: ConnectionState::Disconnected
        }))
    ));

    link.on_connect();
    link.on_receive(&hello_ack_frame());
    transport.take_sent();

    assert!(matches!(
        session.set_slot(Slot::B),
        Err(SessionError::Rejected(CommandRejected::NotReady {
            state: ConnectionState::Helloed
        }))
    ));
    assert!(session.change_preset(Slot::A, 2).is_err());
    assert_eq!(transport.sent_count(), 0);
    assert_eq!(session.metrics().commands_rejected, 2);
}

#[test]
fn preset_out_of_range_is_rejected_without_side_effects() {
    let (link, transport) = setup();
    let session = Arc::clone(link.session());
    link.on_connect();
    link.on_receive(&hello_ack_frame());
    link.on_receive(&state_update_frame(&device_blob([3, 7, 1], Slot::A)));
    transport.take_sent();
    let before = session.state().unwrap();

    for preset in [20, 21, 255] {
        assert!(matches!(
            session.change_preset(Slot::B, preset),
            Err(SessionError::Rejected(CommandRejected::InvalidPresetIndex { .. }))
        ));
    }

    assert_eq!(session.state().unwrap(), before);
    assert_eq!(transport.sent_count(), 0);

    session.change_preset(Slot::B, 19).unwrap();
    assert_eq!(session.state().unwrap().slot_b_preset(), 19);
}

#[test]
fn state_update_then_set_slot_patches_only_the_slot_byte() {
    let (link, transport) = setup();
    let session = Arc::clone(link.session());
    let blob = device_blob([3, 7, 1], Slot::A);

    link.on_connect();
    link.on_receive(&hello_ack_frame());
    link.on_receive(&state_update_frame(&blob));

    let state = session.state().unwrap();
    assert_eq!(state.slot_a_preset(), 3);
    assert_eq!(state.slot_b_preset(), 7);
    assert_eq!(state.slot_c_preset(), 1);
    assert_eq!(state.current_slot(), Slot::A);
    transport.take_sent();

    session.set_slot(Slot::B).unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    let payload = unwrap_frame(&sent[0]).unwrap();
    let (prefix, raw) = payload.split_at(11);
    assert_eq!(
        prefix,
        &[0xB9, 0x03, 0x81, 0x06, 0x03, 0x82, RAW_LEN as u8, 0x00, 0x80, 0x0B, 0x03]
    );

    let changed: Vec<usize> = (0..RAW_LEN).filter(|&i| raw[i] != blob[i]).collect();
    assert_eq!(changed, vec![RAW_LEN - 11]);
    assert_eq!(raw[RAW_LEN - 11], Slot::B.as_u8());
    assert_eq!(session.state().unwrap().current_slot(), Slot::B);
}

#[test]
fn fresh_state_update_overwrites_local_changes() {
    let (link, _transport) = setup();
    let session = Arc::clone(link.session());
    link.on_connect();
    link.on_receive(&hello_ack_frame());
    link.on_receive(&state_update_frame(&device_blob([3, 7, 1], Slot::A)));

    session.set_slot(Slot::B).unwrap();
    link.on_receive(&state_update_frame(&device_blob([4, 4, 4], Slot::C)));

    let state = session.state().unwrap();
    assert_eq!(state.current_slot(), Slot::C);
    assert_eq!(state.slot_a_preset(), 4);
}

#[test]
fn corrupt_frame_between_valid_ones_is_isolated() {
    let (link, _transport) = setup();
    let session = Arc::clone(link.session());
    link.on_connect();

    let mut corrupt = hello_ack_frame();
    corrupt[2] ^= 0x01;
    let mut stream = corrupt;
    stream.extend_from_slice(&hello_ack_frame());

    link.on_receive(&stream);

    assert_eq!(session.connection_state(), ConnectionState::Helloed);
    assert_eq!(session.metrics().frames_rejected, 1);
    assert_eq!(session.metrics().hello_messages, 1);
}

#[test]
fn stalled_partial_frame_is_flushed_by_timeout() {
    let (link, _transport) = setup();
    let session = Arc::clone(link.session());
    link.on_connect();
    let start = Instant::now();

    let hello = hello_ack_frame();
    link.receive_at(&hello[..4], start);
    link.receive_at(&hello, start + Duration::from_millis(1200));

    assert_eq!(session.connection_state(), ConnectionState::Helloed);
    assert_eq!(link.reassembly_stats().timeouts, 1);
}

#[test]
fn wait_ready_wakes_when_state_arrives() {
    let (link, _transport) = setup();
    let link = Arc::new(link);
    let session = Arc::clone(link.session());
    link.on_connect();

    let device = {
        let link = Arc::clone(&link);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            link.on_receive(&hello_ack_frame());
            link.on_receive(&state_update_frame(&device_blob([0, 1, 2], Slot::B)));
        })
    };

    session
        .wait_for(ConnectionState::StateInitialized, Duration::from_secs(5))
        .unwrap();
    device.join().unwrap();
    assert_eq!(session.state().unwrap().current_slot(), Slot::B);
}

#[test]
fn disconnect_requires_a_new_handshake() {
    let (link, transport) = setup();
    let session = Arc::clone(link.session());
    link.on_connect();
    link.on_receive(&hello_ack_frame());
    link.on_receive(&state_update_frame(&device_blob([3, 7, 1], Slot::A)));

    link.on_disconnect();
    transport.take_sent();

    assert!(session.set_slot(Slot::B).is_err());
    assert_eq!(transport.sent_count(), 0);

    link.on_connect();
    assert_eq!(session.connection_state(), ConnectionState::Connected);
    assert_eq!(unwrap_frame(&transport.sent()[0]).unwrap(), HELLO.to_vec());
}

#[test]
fn earlier_firmware_layout() {
    let transport = MemoryTransport::new();
    let config = SessionConfig::default().with_layout(StateLayout::REVISION_1);
    let session = Arc::new(Session::new(transport, config));
    let link = Link::new(Arc::clone(&session));

    let mut raw = vec![0u8; 16];
    raw[16 - 12] = 5;
    raw[16 - 10] = 6;
    raw[16 - 8] = 7;
    raw[16 - 5] = Slot::C.as_u8();

    link.on_connect();
    link.on_receive(&hello_ack_frame());
    link.on_receive(&state_update_frame(&raw));

    let state = session.state().unwrap();
    assert_eq!(
        (state.slot_a_preset(), state.slot_b_preset(), state.slot_c_preset()),
        (5, 6, 7)
    );
    assert_eq!(state.current_slot(), Slot::C);
}

fn ready_from(slot: Slot) -> (Link<MemoryTransport>, MemoryTransport) {
    let (link, transport) = setup();
    link.on_connect();
    link.on_receive(&hello_ack_frame());
    link.on_receive(&state_update_frame(&device_blob([3, 7, 1], slot)));
    transport.take_sent();
    (link, transport)
}

#[test]
fn switch_silently_loads_background_slot_a() {
    for start in [Slot::B, Slot::C] {
        let (link, transport) = ready_from(start);
        let session = link.session();

        let active = session.switch_silently(12).unwrap();

        assert_eq!(active, Slot::A, "starting from {start}");
        let state = session.state().unwrap();
        assert_eq!(state.slot_a_preset(), 12);
        assert_eq!((state.slot_b_preset(), state.slot_c_preset()), (7, 1));
        assert_eq!(state.current_slot(), Slot::A);

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        let preset_write = unwrap_frame(&sent[0]).unwrap();
        assert_eq!(preset_write[preset_write.len() - 18], 12);
        assert_eq!(preset_write[preset_write.len() - 11], start.as_u8());
        let slot_write = unwrap_frame(&sent[1]).unwrap();
        assert_eq!(slot_write[slot_write.len() - 11], Slot::A.as_u8());
    }
}

#[test]
fn line_noise_at_attach_does_not_stall_handshake() {
    let (link, transport) = setup();
    let session = Arc::clone(link.session());
    link.on_connect();
    let start = Instant::now();

    link.receive_at(&[0x00, 0x13], start);
    link.receive_at(&hello_ack_frame(), start + Duration::from_millis(50));
    link.receive_at(
        &state_update_frame(&device_blob([3, 7, 1], Slot::A)),
        start + Duration::from_millis(100),
    );

    assert_eq!(session.connection_state(), ConnectionState::StateInitialized);
    assert_eq!(link.reassembly_stats().discarded, 2);
    assert_eq!(transport.sent_count(), 2);
}
