use crate::Exception;


/// Engine-internal error codes. These are surfaced to the host through
/// [`Rtu::last_error`](crate::Rtu::last_error), synchronous query results and
/// originator completions; they are never put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError {
    /// A query entry point was called on an instance that is not a master.
    NotMaster,

    /// A transaction was started while a previous one was still in flight.
    Polling,

    /// The receive ring buffer overflowed while a frame was arriving.
    BufferOverflow,

    /// CRC bytes of the received frame do not match its content.
    BadCrc,

    /// The remote slave answered with a Modbus exception response.
    Exception(Exception),

    /// The received frame is too short to be a Modbus RTU frame.
    BadSize,

    /// A telegram targets slave id 0 or an id above 247.
    BadSlaveId,

    /// No response arrived within the configured response timeout.
    Timeout,
}


impl EngineError {
    /// Stable numeric code for this error, used as the task-notification
    /// value where the kernel transports errors as plain integers.
    pub const fn code(&self) -> u8 {
        match self {
            EngineError::NotMaster => 1,
            EngineError::Polling => 2,
            EngineError::BufferOverflow => 3,
            EngineError::BadCrc => 4,
            EngineError::Exception(_) => 5,
            EngineError::BadSize => 6,
            EngineError::BadSlaveId => 7,
            EngineError::Timeout => 8,
        }
    }
}


impl core::fmt::Display for EngineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EngineError::NotMaster => f.write_str("instance is not a master"),
            EngineError::Polling => f.write_str("previous transaction still in flight"),
            EngineError::BufferOverflow => f.write_str("receive ring buffer overflowed"),
            EngineError::BadCrc => f.write_str("frame CRC mismatch"),
            EngineError::Exception(exception) => write!(f, "slave responded {exception}"),
            EngineError::BadSize => f.write_str("frame too short"),
            EngineError::BadSlaveId => f.write_str("telegram targets an invalid slave id"),
            EngineError::Timeout => f.write_str("no response before timeout"),
        }
    }
}


impl core::error::Error for EngineError {}


impl From<crate::crc::CrcMismatch> for EngineError {
    fn from(_: crate::crc::CrcMismatch) -> Self {
        EngineError::BadCrc
    }
}


/// Fatal conditions detected while starting an instance.
///
/// Start-up failures are surfaced as a distinguishable error instead of
/// halting in place; the instance stays unstarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartError {
    /// The station id does not fit the role: masters use id 0, slaves use
    /// 1..=247.
    RoleStationMismatch { station_id: u8 },

    /// A slave requires at least the holding-register bank.
    MissingHoldingBank,
}


impl core::fmt::Display for StartError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StartError::RoleStationMismatch { station_id } => {
                write!(f, "station id {station_id} does not fit the configured role")
            }
            StartError::MissingHoldingBank => {
                f.write_str("slave instances require a holding-register bank")
            }
        }
    }
}


impl core::error::Error for StartError {}
