//! Host-facing description of one master request and its completion path.

use crate::{EngineError, FunctionKind};


/// Most holding/input registers one read reply can carry (`256`-byte frame:
/// `qty * 2 + 5 <= 256`).
pub const MAX_READ_WORDS: usize = 125;

/// Most registers one write-multiple request can carry.
pub const MAX_WRITE_WORDS: usize = 123;


/// One master request.
///
/// For the write functions the values travel inside the telegram:
/// `payload[0]` for FC 5 (non-zero means *set*) and FC 6, word-packed bits
/// for FC 15, one word per register for FC 16. Read functions leave the
/// payload empty; the values come back through the originator's [`Reply`].
#[derive(Clone)]
pub struct Telegram {
    /// Station id of the addressed slave, `1..=247`.
    pub target: u8,

    /// Requested operation.
    pub function: FunctionKind,

    /// First coil or register address.
    pub start_address: u16,

    /// Number of coils or registers. Ignored for the single-write functions.
    pub quantity: u16,

    /// Values for write requests, see type docs.
    pub payload: heapless::Vec<u16, MAX_WRITE_WORDS>,

    /// Completion callback of the task that submitted this telegram.
    pub originator: &'static dyn Originator,
}


/// Payload of a successful master transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Write confirmed by the slave's echo.
    Done,

    /// Read coils / discrete inputs: `count` bits, packed into words using
    /// the bank convention (bit `k % 16` of word `k / 16`).
    Bits { words: heapless::Vec<u16, MAX_READ_WORDS>, count: u16 },

    /// Read holding / input registers, one element per register.
    Registers(heapless::Vec<u16, MAX_READ_WORDS>),
}


/// Completion sink of a telegram.
///
/// Called from the master worker task exactly once per accepted telegram,
/// after the transaction ends in a reply, an error or a timeout.
pub trait Originator: Sync {
    fn completed(&self, result: Result<Reply, EngineError>);
}
