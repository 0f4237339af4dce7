/// Modbus application exceptions carried in the byte after `FUNC | 0x80` of
/// an exception response.
///
/// A slave built from this engine only ever raises `IllegalFunction`,
/// `IllegalDataAddress` and `IllegalDataValue`; the remaining codes are kept
/// so a master can report what a foreign slave answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Exception {
    /// An undefined exception code not covered by this crate.
    Undefined(u8),

    /// The function code received is not supported by the device or is invalid in the current state.
    IllegalFunction = 0x01,

    /// The requested address range is invalid for the device.
    IllegalDataAddress = 0x02,

    /// A value in the request is not valid or does not match the expected structure.
    IllegalDataValue = 0x03,

    /// An unrecoverable device error occurred during processing.
    DeviceFailure = 0x04,

    /// The request was accepted but requires a long time to complete. Prevents master timeout.
    Acknowledge = 0x05,

    /// The device is busy processing a long-duration command. Try again later.
    DeviceBusy = 0x06,

    /// The device detected a memory parity error while reading extended records.
    MemoryParityError = 0x08,

    /// The gateway could not establish a communication path. Check configuration or load.
    GatewayPathUnavailable = 0x0A,

    /// The gateway received no response from the target device.
    GatewayTargetDeviceFailedToRespond = 0x0B,
}


impl Exception {
    /// Returns the Modbus exception code associated with this variant.
    ///
    /// # Examples
    /// ```rust
    /// use modbus_rtu_engine::Exception;
    ///
    /// assert_eq!(Exception::IllegalDataAddress.as_code(), 0x02);
    /// assert_eq!(Exception::Undefined(0x7F).as_code(), 0x7F);
    /// ```
    ///
    pub const fn as_code(&self) -> u8 {
        match self {
            Exception::Undefined(code) => *code,
            Exception::IllegalFunction => 0x01,
            Exception::IllegalDataAddress => 0x02,
            Exception::IllegalDataValue => 0x03,
            Exception::DeviceFailure => 0x04,
            Exception::Acknowledge => 0x05,
            Exception::DeviceBusy => 0x06,
            Exception::MemoryParityError => 0x08,
            Exception::GatewayPathUnavailable => 0x0A,
            Exception::GatewayTargetDeviceFailedToRespond => 0x0B,
        }
    }

    /// Converts a Modbus exception code into its corresponding [`Exception`]
    /// variant. Undefined codes are wrapped in [`Exception::Undefined`].
    ///
    /// # Examples
    /// ```rust
    /// use modbus_rtu_engine::Exception;
    ///
    /// assert_eq!(Exception::from_code(0x05), Exception::Acknowledge);
    /// assert_eq!(Exception::from_code(0xFF), Exception::Undefined(0xFF));
    /// ```
    ///
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::IllegalFunction,
            0x02 => Self::IllegalDataAddress,
            0x03 => Self::IllegalDataValue,
            0x04 => Self::DeviceFailure,
            0x05 => Self::Acknowledge,
            0x06 => Self::DeviceBusy,
            0x08 => Self::MemoryParityError,
            0x0A => Self::GatewayPathUnavailable,
            0x0B => Self::GatewayTargetDeviceFailedToRespond,
            code => Self::Undefined(code),
        }
    }
}


impl core::fmt::Display for Exception {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "exception 0x{:02X}", self.as_code())
    }
}
