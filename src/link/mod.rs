//! Contract of the half-duplex serial device an instance drives.

#[cfg(all(feature = "serial", not(feature = "no_std")))]
mod serial;
#[cfg(all(feature = "serial", not(feature = "no_std")))]
pub use serial::SerialPortLink;

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};


/// How received bytes reach the ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HwMode {
    /// One RX interrupt per received byte.
    Interrupt,

    /// DMA circular reception with an idle-line interrupt marking the end of
    /// a burst.
    #[cfg(feature = "dma")]
    DmaIdle,
}


/// Operations of the underlying UART/DMA driver.
///
/// Implementations map these onto their HAL. `start_transmit` must start a
/// non-blocking transfer matching the instance's [`HwMode`] and signal its
/// completion by calling [`Rtu::on_tx_complete`](crate::Rtu::on_tx_complete)
/// from the TX-complete interrupt.
pub trait SerialLink: Send {
    /// Switches the half-duplex transceiver to receive and arms reception
    /// (the first byte interrupt, or the circular DMA transfer).
    fn enable_receiver(&mut self);

    /// Switches the half-duplex transceiver to transmit.
    fn enable_transmitter(&mut self);

    /// Starts transmitting `frame`.
    fn start_transmit(&mut self, frame: &[u8]);

    /// `true` once the transmit shift register has fully drained.
    ///
    /// This is the hardware TC flag, not the "last byte loaded" event: the
    /// RS-485 direction line must not flip while the final character is
    /// still shifting out.
    fn is_transmit_complete(&self) -> bool;
}


/// Placeholder for instances whose transceiver needs no direction line
/// (for example auto-direction RS-485 adapters).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
