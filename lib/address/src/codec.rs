//! Little-endian wire format: a length varint (7 bits per byte, bit 7 set
//! while more length bytes follow) and then the address bytes. The invalid
//! address encodes as a single zero byte.

use crate::Address;

/// Encode `address` into `dest`. Returns the number of bytes written, or 0
/// if the buffer cannot hold the encoding.
pub fn write_le_address(dest: &mut [u8], address: &Address) -> usize {
    let mut size = address.size();
    let mut at = 0;
    loop {
        if at >= dest.len() {
            return 0;
        }
        let more = size > 0x7f;
        dest[at] = (size & 0x7f) as u8 | ((more as u8) << 7);
        at += 1;
        size >>= 7;
        if !more {
            break;
        }
    }

    address.with_bytes(|bytes| {
        if at + bytes.len() > dest.len() {
            return 0;
        }
        dest[at..at + bytes.len()].copy_from_slice(bytes);
        at + bytes.len()
    })
}

/// Decode an address from `src`. Returns the address and the number of
/// bytes consumed, or `None` if the input is truncated.
pub fn read_le_address(src: &[u8]) -> Option<(Address, usize)> {
    let mut size = 0usize;
    let mut shift = 0u32;
    let mut at = 0;
    loop {
        let byte = *src.get(at)?;
        at += 1;
        size |= ((byte & 0x7f) as usize) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            break;
        }
    }

    if at + size > src.len() {
        return None;
    }
    let address = Address::from_bytes(&src[at..at + size]);
    Some((address, at + size))
}
