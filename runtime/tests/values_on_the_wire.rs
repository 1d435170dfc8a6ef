//! Values travelling through encodings and pipes.

use std::sync::Arc;

use encoding::{Encoding, EncodingPipe, EncodingRef, TextEncoding, X70Encoding, x70_decoder};
use runtime::{Io, IoConfig};
use value::{int64_of, int64_value, text_value};

#[test]
fn a_value_survives_the_x70_wire() {
    let io = Io::new(IoConfig {
        short_term_memory_id: 0,
        long_term_memory_id: 1,
        ..IoConfig::default()
    });
    let vm = io.get_short_term_value_memory();

    // sender side: serialize
    let wire = X70Encoding::new();
    let outgoing = int64_value(vm, 20260801);
    assert!(wire.append_value(vm, &outgoing));

    // the message crosses a pipe like any other encoding
    let pipe = EncodingPipe::new(4);
    let message: EncodingRef = wire;
    pipe.put(message).ok().unwrap();
    let arrived = pipe.get().unwrap();

    // receiver side: decode into the long-term memory
    let lt = io.get_long_term_value_memory();
    let decoded = arrived.decode_to_io_value(&mut x70_decoder, lt);
    assert!(decoded.is_valid());
    assert_eq!(decoded.containing_memory_id(), Some(lt.id()));
    assert_eq!(int64_of(lt, &decoded), Some(20260801));

    // and collected once the last reference is gone
    let baseline = lt.get_info().used_bytes;
    drop(decoded);
    io.do_gc(-1);
    assert!(lt.get_info().used_bytes < baseline);
}

#[test]
fn values_print_into_text_encodings() {
    let io = Io::new(IoConfig {
        short_term_memory_id: 2,
        long_term_memory_id: 3,
        ..IoConfig::default()
    });
    let vm = io.get_short_term_value_memory();

    let report = TextEncoding::new();
    assert!(report.print(format_args!("uptime ")));
    assert!(report.print_value(vm, &int64_value(vm, 42)));
    assert!(report.print(format_args!("s, device ")));
    assert!(report.print_value(vm, &text_value(vm, b"io-node")));
    assert_eq!(report.content_to_vec(), b"uptime 42s, device io-node");
}

#[test]
fn gc_reclaims_what_pipes_released() {
    let io = Io::new(IoConfig {
        short_term_memory_id: 4,
        long_term_memory_id: 5,
        ..IoConfig::default()
    });
    let vm = io.get_short_term_value_memory();
    let baseline = vm.get_info().used_bytes;

    let values = pipe::Pipe::new(8);
    for i in 0..5i64 {
        values.put(int64_value(vm, i)).ok().unwrap();
    }
    assert!(vm.get_info().used_bytes > baseline);

    // a reset drops the pipe's references, the sweep does the rest
    values.reset();
    io.do_gc(-1);
    assert_eq!(vm.get_info().used_bytes, baseline);
}

#[test]
fn refcount_symmetry_for_encodings() {
    let message: EncodingRef = X70Encoding::new();
    let reference = message.clone();
    assert_eq!(Arc::strong_count(&message), 2);
    drop(reference);
    assert_eq!(Arc::strong_count(&message), 1);
    // the final drop frees; Arc makes a second unreference unrepresentable
}
