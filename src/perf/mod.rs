pub mod receiver;
pub mod report;
pub mod sender;
pub use self::report::*;

/// Payload moves in fixed chunks of this many bytes.
pub const CHUNK_SIZE: usize = 1000;

/// Reserved in-band byte value that closes the payload stream. Payload chunks
/// are all-zero, so this value never occurs as payload and the receiver may
/// recognize it anywhere in a read, independent of read boundaries.
pub const MARKER: u8 = 1;

/// The single byte the receiver answers the marker with.
pub const ACK: u8 = 1;
