//! Hosted [`SerialLink`] backed by the `serialport` crate, for masters
//! running on a PC (gateways, commissioning tools, bench tests against real
//! slaves).
//!
//! The integration still owns the receive pump: a reader thread feeds
//! [`Rtu::on_rx_byte`](crate::Rtu::on_rx_byte) and the hosted kernel supplies
//! the T3.5 timer. The failsafe in the send path covers the missing
//! TX-complete interrupt.

use std::time::Duration;

use super::SerialLink;


/// Blocking serial port configured for Modbus RTU (8N1).
pub struct SerialPortLink {
    /// Serial port handle used for request/response traffic.
    port: Box<dyn serialport::SerialPort>,

    /// Cached baud rate so higher-level code can inspect the active speed.
    baud_rate: u32,
}


impl SerialPortLink {
    /// Opens `path` for an RS-485 style setup (8N1, blocking I/O).
    ///
    /// The port timeout is pinned to the Modbus RTU silent interval (T3.5)
    /// for the supplied baud rate so a reader thread can detect frame
    /// boundaries.
    ///
    /// ---
    /// # Examples
    /// ```ignore
    /// use modbus_rtu_engine::link::SerialPortLink;
    ///
    /// # fn demo() -> serialport::Result<()> {
    /// let link = SerialPortLink::new_rs485("/dev/ttyUSB0", 9_600)?;
    /// assert_eq!(link.baud_rate(), 9_600);
    /// # Ok(())
    /// # }
    /// ```
    ///
    pub fn new_rs485(path: &str, baud_rate: u32) -> serialport::Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(Self::idle_time_rs485(baud_rate))
            .open()?;
        Ok(Self { port, baud_rate })
    }

    /// Returns the baud rate currently configured on the serial link.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Updates the serial baud rate and matching Modbus idle timeout.
    pub fn set_baudrate(&mut self, baud_rate: u32) -> serialport::Result<()> {
        self.port.set_baud_rate(baud_rate)?;
        self.port.set_timeout(Self::idle_time_rs485(baud_rate))?;
        self.baud_rate = baud_rate;
        Ok(())
    }

    /// Reads whatever the port has buffered; pump these bytes into
    /// [`Rtu::on_rx_byte`](crate::Rtu::on_rx_byte).
    pub fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        use std::io::Read;
        self.port.read(buf)
    }

    /// Computes the Modbus RTU T3.5 idle time for a link running 8N1
    /// encoding.
    fn idle_time_rs485(baud_rate: u32) -> Duration {
        const BITS_PER_CHAR: f64 = 10.0;
        let seconds = 3.5 * BITS_PER_CHAR / baud_rate as f64;
        Duration::from_secs_f64(seconds)
    }
}


impl SerialLink for SerialPortLink {
    fn enable_receiver(&mut self) {
        if self.port.clear(serialport::ClearBuffer::Input).is_err() {
            warn!("failed to clear serial input buffer");
        }
    }

    fn enable_transmitter(&mut self) {
        if self.port.clear(serialport::ClearBuffer::Output).is_err() {
            warn!("failed to clear serial output buffer");
        }
    }

    fn start_transmit(&mut self, frame: &[u8]) {
        use std::io::Write;
        if self.port.write_all(frame).and_then(|_| self.port.flush()).is_err() {
            warn!("serial write failed");
        }
    }

    fn is_transmit_complete(&self) -> bool {
        self.port.bytes_to_write().map_or(true, |pending| pending == 0)
    }
}
