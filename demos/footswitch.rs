//! Footswitch demo against a simulated amp.
//!
//! The "device" runs on its own thread, answers the handshake, and echoes
//! every state write back as a state update, the way real hardware does. MIDI
//! Program Changes on channel 3 then flip between slots A and B.
//!
//! Run with `cargo run --example footswitch`.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use tonelink::protocol::command::{HELLO, REQUEST_STATE};
use tonelink::{
    FootswitchMapping, Link, LinkEvents, Session, SessionConfig, Slot, StateLayout, Transport,
    TransportError, unwrap_frame, wrap_frame,
};

/// Host-side endpoint of the simulated USB pipe.
struct Pipe(Sender<Vec<u8>>);

impl Transport for Pipe {
    fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        self.0.send(frame.to_vec()).map_err(|_| TransportError::Disconnected)
    }
}

fn state_update(raw: &[u8]) -> Vec<u8> {
    let size = u16::try_from(raw.len()).unwrap_or(u16::MAX).to_le_bytes();
    let mut payload = vec![0xB9, 0x03, 0x81, 0x06, 0x03, 0x82, size[0], size[1], 0x80, 0x0B];
    payload.extend_from_slice(raw);
    wrap_frame(&payload)
}

fn run_device(inbox: Receiver<Vec<u8>>, link: Arc<Link<Pipe>>) {
    let layout = StateLayout::default();
    let mut raw = vec![0u8; 48];
    let len = raw.len();
    raw[len - layout.slot_a_preset] = 3;
    raw[len - layout.slot_b_preset] = 7;
    raw[len - layout.slot_c_preset] = 1;

    // The host never hangs up its end, so a quiet pipe ends the device.
    while let Ok(frame) = inbox.recv_timeout(Duration::from_millis(500)) {
        let Ok(payload) = unwrap_frame(&frame) else {
            tracing::warn!("device: corrupt frame");
            continue;
        };
        if payload == HELLO {
            link.on_receive(&wrap_frame(&[0xB9, 0x03, 0x02, 0x00, 0x80, 0x0B]));
        } else if payload == REQUEST_STATE {
            // Deliver in two chunks, as the USB driver often does.
            let reply = state_update(&raw);
            let (head, tail) = reply.split_at(reply.len() / 2);
            link.on_receive(head);
            link.on_receive(tail);
        } else if payload.len() > 11 {
            raw = payload[11..].to_vec();
            link.on_receive(&state_update(&raw));
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let (tx, rx) = mpsc::channel();
    let session = Arc::new(Session::new(Pipe(tx), SessionConfig::default()));
    let link = Arc::new(Link::new(Arc::clone(&session)));

    let device = {
        let link = Arc::clone(&link);
        thread::spawn(move || run_device(rx, link))
    };

    link.on_connect();
    session.wait_ready()?;
    println!("ready: {:?}", session.state().map(|s| s.current_slot()));

    let mapping = FootswitchMapping::default();
    // Program 1 on channel 3, a clock tick, then program 0.
    let inputs: [&[u8]; 3] = [&[0xC2, 0x01], &[0xF8], &[0xC2, 0x00]];
    for midi in inputs {
        let sent = mapping.dispatch(&session, midi);
        println!("midi {midi:02X?} -> {sent} slot switch(es)");
        thread::sleep(Duration::from_millis(50));
    }

    let active = session.switch_silently(12)?;
    thread::sleep(Duration::from_millis(50));
    let state = session.state().ok_or("device state lost")?;
    println!(
        "after silent switch: slot {active}, preset {}",
        state.preset(Slot::B)
    );
    println!("metrics: {:?}", session.metrics());

    link.on_disconnect();
    device.join().map_err(|_| "device thread panicked")?;
    Ok(())
}
