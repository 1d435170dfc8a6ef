//! Socket fabric scenarios, end to end.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use address::Address;
use encoding::{Encoding, EncodingRef};
use event::{EventQueue, EventRef, FnEvent};
use socket::{
    EmulatorSocket, MultiplexSocket, MultiplexerSocket, SharedMediaSocket, Socket, SocketBuilder,
    SocketRef, allocate_emulator_socket, allocate_leaf_socket, allocate_multiplex_socket,
    allocate_multiplexer_socket, allocate_shared_media, build_io_sockets,
};

#[test]
fn adapter_socket_kinds() {
    let queue = Arc::new(EventQueue::new());
    let net = [SocketBuilder::new(
        allocate_leaf_socket,
        Address::from_bytes(&[b'a', 0, 0, 0, 1]),
    )];
    let sockets = build_io_sockets(&queue, &net);

    assert!(sockets[0].downcast_ref::<socket::LeafSocket>().is_some());
    assert!(sockets[0].downcast_ref::<MultiplexSocket>().is_none());
}

/// Two leaves joined by emulated links over a shared medium:
/// `A(22) - emulator(11) - media - emulator(22) - B(11)`. What A sends,
/// B's receive handler sees, byte for byte.
#[test]
fn adapter_echo_across_shared_media() {
    let queue = Arc::new(EventQueue::new());
    let net = [
        SocketBuilder::new(allocate_leaf_socket, Address::U8(22)).bound(&[(0, 1)]),
        SocketBuilder::new(allocate_emulator_socket, Address::U8(11)).bound(&[(1, 2)]),
        SocketBuilder::new(allocate_shared_media, Address::invalid()),
        SocketBuilder::new(allocate_leaf_socket, Address::U8(11)).bound(&[(3, 4)]),
        SocketBuilder::new(allocate_emulator_socket, Address::U8(22)).bound(&[(4, 2)]),
    ];
    let sockets = build_io_sockets(&queue, &net);

    let result = Arc::new(AtomicU32::new(0));
    let observed = result.clone();
    let receiver: SocketRef = sockets[3].clone();
    let receiver_for_event = receiver.clone();
    let rx: EventRef = Arc::new(FnEvent(move || {
        if let Some(pipe) = receiver_for_event.receive_pipe(&receiver_for_event.address()) {
            if let Some(message) = pipe.peek() {
                if message.content_to_vec() == b"gook" {
                    observed.store(1, Ordering::Relaxed);
                }
            }
        }
    }));
    receiver.bind_inner(&Address::invalid(), None, Some(rx));

    assert!(sockets[0].open());
    assert!(sockets[3].open());

    let message = sockets[0].new_message().expect("a transmit message");
    assert!(message.append_bytes(b"gook"));
    assert!(sockets[0].send_message(message));

    queue.run_to_idle();
    assert_eq!(result.load(Ordering::Relaxed), 1);
}

/// The fabric addresses receptions: a third, unrelated station must not
/// hear a message addressed elsewhere.
#[test]
fn shared_media_respects_addressing() {
    let queue = Arc::new(EventQueue::new());
    let net = [
        SocketBuilder::new(allocate_leaf_socket, Address::U8(22)).bound(&[(0, 1)]),
        SocketBuilder::new(allocate_emulator_socket, Address::U8(11)).bound(&[(1, 2)]),
        SocketBuilder::new(allocate_shared_media, Address::invalid()),
        SocketBuilder::new(allocate_leaf_socket, Address::U8(11)).bound(&[(3, 4)]),
        SocketBuilder::new(allocate_emulator_socket, Address::U8(22)).bound(&[(4, 2)]),
        // the bystander
        SocketBuilder::new(allocate_leaf_socket, Address::U8(11)).bound(&[(5, 6)]),
        SocketBuilder::new(allocate_emulator_socket, Address::U8(33)).bound(&[(6, 2)]),
    ];
    let sockets = build_io_sockets(&queue, &net);

    let heard = Arc::new(AtomicU32::new(0));
    let bystander_heard = heard.clone();
    let bystander: SocketRef = sockets[5].clone();
    let bystander_for_event = bystander.clone();
    bystander.bind_inner(
        &Address::invalid(),
        None,
        Some(Arc::new(FnEvent(move || {
            if let Some(pipe) = bystander_for_event.receive_pipe(&bystander_for_event.address()) {
                if pipe.is_readable() {
                    bystander_heard.fetch_add(1, Ordering::Relaxed);
                }
            }
        }))),
    );

    let delivered = Arc::new(AtomicU32::new(0));
    let receiver_got = delivered.clone();
    let receiver: SocketRef = sockets[3].clone();
    receiver.bind_inner(
        &Address::invalid(),
        None,
        Some(Arc::new(FnEvent(move || {
            receiver_got.fetch_add(1, Ordering::Relaxed);
        }))),
    );

    let message = sockets[0].new_message().unwrap();
    message.append_bytes(b"direct");
    assert!(sockets[0].send_message(message));
    queue.run_to_idle();

    assert_eq!(delivered.load(Ordering::Relaxed), 1);
    assert_eq!(heard.load(Ordering::Relaxed), 0);
}

#[test]
fn multiplex_socket_binding_lookup() {
    let queue = Arc::new(EventQueue::new());
    let net = [SocketBuilder::new(
        allocate_multiplex_socket,
        Address::invalid(),
    )];
    let sockets = build_io_sockets(&queue, &net);
    let mux = sockets[0].downcast_ref::<MultiplexSocket>().unwrap();

    let ev: EventRef = Arc::new(FnEvent(|| {}));
    assert!(sockets[0].bind_inner(&Address::U8(2), None, Some(ev)));
    assert!(mux.find_binding(&Address::U8(2)).is_some());
    assert!(mux.find_binding(&Address::U8(3)).is_none());
    assert!(sockets[0].receive_pipe(&Address::U8(2)).is_some());
    assert!(sockets[0].receive_pipe(&Address::U8(3)).is_none());
}

#[test]
fn multiplexer_is_also_a_multiplex() {
    let queue = Arc::new(EventQueue::new());
    let net = [SocketBuilder::new(
        allocate_multiplexer_socket,
        Address::invalid(),
    )];
    let sockets = build_io_sockets(&queue, &net);

    let muxer = sockets[0].downcast_ref::<MultiplexerSocket>().unwrap();
    assert!(muxer.multiplex().binding_count() == 0);
    assert!(sockets[0].bind_inner(&Address::U8(9), None, None));
    assert_eq!(muxer.multiplex().binding_count(), 1);

    // no outer bound: nothing to forward to
    let message: EncodingRef = layer::PacketEncoding::new();
    assert!(!sockets[0].send_message(message));
}

#[test]
fn emulators_expose_their_multiplex_table() {
    let queue = Arc::new(EventQueue::new());
    let net = [
        SocketBuilder::new(allocate_leaf_socket, Address::U8(5)).bound(&[(0, 1)]),
        SocketBuilder::new(allocate_emulator_socket, Address::U8(1)).bound(&[(1, 2)]),
        SocketBuilder::new(allocate_shared_media, Address::invalid()),
    ];
    let sockets = build_io_sockets(&queue, &net);

    let emulator = sockets[1].downcast_ref::<EmulatorSocket>().unwrap();
    assert!(emulator.multiplex().find_binding(&Address::U8(5)).is_some());

    let media = sockets[2].downcast_ref::<SharedMediaSocket>().unwrap();
    assert!(media.multiplex().find_binding(&Address::U8(1)).is_some());
}

#[test]
fn closing_a_leaf_unbinds_it_from_the_outer_socket() {
    let queue = Arc::new(EventQueue::new());
    let net = [
        SocketBuilder::new(allocate_leaf_socket, Address::U8(5)).bound(&[(0, 1)]),
        SocketBuilder::new(allocate_emulator_socket, Address::U8(1)).bound(&[(1, 2)]),
        SocketBuilder::new(allocate_shared_media, Address::invalid()),
    ];
    let sockets = build_io_sockets(&queue, &net);
    let emulator = sockets[1].downcast_ref::<EmulatorSocket>().unwrap();

    assert!(emulator.multiplex().find_binding(&Address::U8(5)).is_some());
    sockets[0].close();
    assert!(sockets[0].is_closed());
    assert!(emulator.multiplex().find_binding(&Address::U8(5)).is_none());
}
