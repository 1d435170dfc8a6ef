//! Byte-memory geometry

/// Smallest supported block size, 8 bytes. Addresses up to 256KiB of heap.
pub const BLOCK_SIZE_1N: u32 = 3;
/// 16-byte blocks.
pub const BLOCK_SIZE_2N: u32 = 4;
/// 32-byte blocks.
pub const BLOCK_SIZE_3N: u32 = 5;
/// 64-byte blocks.
pub const BLOCK_SIZE_4N: u32 = 6;
/// 128-byte blocks.
pub const BLOCK_SIZE_5N: u32 = 7;
/// 256-byte blocks, heaps up to 8MiB.
pub const BLOCK_SIZE_6N: u32 = 8;
/// 1024-byte blocks, heaps up to 32MiB.
pub const BLOCK_SIZE_7N: u32 = 10;
/// 4096-byte blocks, heaps up to 128MiB.
pub const BLOCK_SIZE_8N: u32 = 12;

/// Block indices are 15 bits; the top bit of a block's `next` link is the
/// free marker.
pub const MAX_NUMBER_OF_BLOCKS: usize = 0x7fff;

/// Default byte-memory size for a runtime instance.
pub const DEFAULT_BYTE_MEMORY_SIZE: usize = 64 * 1024;

/// Default size of the heap backing a value memory.
pub const DEFAULT_VALUE_MEMORY_SIZE: usize = 16 * 1024;

/// Number of zero-reference values collected per garbage-collection pass.
pub const GC_BATCH_LENGTH: usize = 8;
