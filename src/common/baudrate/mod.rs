

/// Represents supported baudrates for Modbus RTU communication.
///
/// The variants cover the speeds commonly wired on RS-485 field buses. The
/// main job of this type is deriving the T3.5 end-of-frame silence for the
/// configured speed, in microseconds or in kernel ticks.
///
/// ---
/// # Supports
/// - [`u32`] -> [`Baudrate`]
/// - [`Baudrate`] -> [`u32`]
///
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Baudrate {
    BR1200,
    BR2400,
    BR4800,
    BR9600,
    BR19200,
    BR38400,
    BR57600,
    BR115200,
}


impl Baudrate {
    /// One character time in microseconds, assuming the 8N1 encoding used on
    /// Modbus RTU links (10 bits per character).
    ///
    /// ---
    /// # Examples
    /// ```
    /// use modbus_rtu_engine::Baudrate;
    ///
    /// assert_eq!(Baudrate::BR9600.char_time_us(), 1042);
    /// ```
    ///
    pub const fn char_time_us(&self) -> u64 {
        let bps: u64 = self.to_u32() as u64;
        (10_000_000 + bps - 1) / bps
    }

    /// The T3.5 inter-frame silence in microseconds: the idle time after
    /// which a receiver must treat the line as between frames.
    ///
    /// ---
    /// # Examples
    /// ```
    /// use modbus_rtu_engine::Baudrate;
    ///
    /// let t35_us: u64 = Baudrate::BR9600.t35_us();
    /// assert_eq!(t35_us, 3646);
    /// ```
    ///
    pub const fn t35_us(&self) -> u64 {
        let bps: u64 = self.to_u32() as u64;
        (35_000_000 + bps - 1) / bps
    }

    /// The T3.5 silence converted to kernel ticks, rounded up so the timer
    /// never undershoots the required gap. Never returns 0.
    ///
    /// ---
    /// # Examples
    /// ```
    /// use modbus_rtu_engine::Baudrate;
    ///
    /// // 1 kHz tick: 3.646 ms rounds up to 4 ticks
    /// assert_eq!(Baudrate::BR9600.t35_ticks(1_000), 4);
    /// ```
    ///
    pub const fn t35_ticks(&self, tick_hz: u32) -> u32 {
        let us = self.t35_us();
        let ticks = (us * tick_hz as u64 + 999_999) / 1_000_000;
        if ticks == 0 { 1 } else { ticks as u32 }
    }

    /// [`Baudrate`] : [`u32`] map
    ///
    /// ---
    /// # Returns
    /// [`u32`] value corresponding to [`Baudrate`]
    ///
    pub const fn to_u32(&self) -> u32 {
        match self {
            Baudrate::BR1200   =>   1_200,
            Baudrate::BR2400   =>   2_400,
            Baudrate::BR4800   =>   4_800,
            Baudrate::BR9600   =>   9_600,
            Baudrate::BR19200  =>  19_200,
            Baudrate::BR38400  =>  38_400,
            Baudrate::BR57600  =>  57_600,
            Baudrate::BR115200 => 115_200,
        }
    }
}


// u32 -> Baudrate
impl TryFrom<u32> for Baudrate {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        use Baudrate::*;
        match value {
              1_200 => Ok(BR1200),
              2_400 => Ok(BR2400),
              4_800 => Ok(BR4800),
              9_600 => Ok(BR9600),
             19_200 => Ok(BR19200),
             38_400 => Ok(BR38400),
             57_600 => Ok(BR57600),
            115_200 => Ok(BR115200),
            _ => Err(())
        }
    }
}


// Baudrate -> u32
impl From<Baudrate> for u32 {
    fn from(value: Baudrate) -> Self {
        value.to_u32()
    }
}


// Display
impl core::fmt::Display for Baudrate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Baudrate({})", self.to_u32())
    }
}
