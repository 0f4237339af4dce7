//! The per-port protocol instance: lifecycle, worker loops, send path and
//! the interrupt-side surface.


use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use embedded_hal::digital::OutputPin;

use crate::banks::Banks;
use crate::frame::FrameBuf;
use crate::kernel::{Guarded, Kernel, MAX_TELEGRAMS, Notifier, OneShot, signal};
use crate::link::{HwMode, NoPin, SerialLink};
use crate::ring::SharedRing;
use crate::validate;
use crate::{EngineError, StartError, frame};
#[cfg(feature = "master")]
use crate::{kernel::TelegramQueue, master, telegram::Telegram};


/// Upper bound on the TC-flag spin after the TX-complete notification. The
/// flag normally arrives within one character time.
const TX_DRAIN_SPIN_LIMIT: u32 = 1_000_000;

/// Shortest frame a slave considers: ID + FUNC + 4 data bytes + CRC.
const MIN_REQUEST: usize = 7;

/// Shortest response a master considers.
const MIN_RESPONSE: usize = 6;

const COM_IDLE: u8 = 0;
const COM_WAITING: u8 = 1;


/// Protocol role of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Client: owns the bus, sends queries, awaits responses.
    Master,

    /// Server: answers requests addressed to its station id.
    Slave,
}


/// Per-instance configuration.
///
/// `t35_ticks` is the T3.5 end-of-frame silence in kernel ticks; derive it
/// with [`Baudrate::t35_ticks`](crate::Baudrate::t35_ticks). The response
/// timeout only matters for masters.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub role: Role,
    /// 0 for a master, `1..=247` for a slave.
    pub station_id: u8,
    pub hw_mode: HwMode,
    pub t35_ticks: u32,
    pub response_timeout_ticks: u32,
    /// Failsafe on the TX-complete notification wait, so a lost TX
    /// interrupt cannot park the worker forever. 250 ticks in the reference
    /// setup.
    pub tx_complete_ticks: u32,
}


/// State the engine only touches with the instance semaphore held. The host
/// contends on the same semaphore through [`Rtu::banks`].
struct Inner<L, D> {
    link: L,
    direction: Option<D>,
    frame: FrameBuf,
    banks: Banks,
    last_error: Option<EngineError>,
}


/// One Modbus RTU port.
///
/// Construction wires the kernel objects, [`start`](Rtu::start) arms
/// reception, and a dedicated worker task drives [`run`](Rtu::run). The
/// `on_*` methods are the interrupt-side surface; everything else may be
/// called from any task.
pub struct Rtu<K: Kernel, L: SerialLink, D: OutputPin = NoPin> {
    cfg: Config,
    ring: SharedRing,
    shared: Guarded<K::Semaphore, Inner<L, D>>,
    notifier: K::Notifier,
    t35: K::Timer,
    timeout: Option<K::Timer>,
    #[cfg_attr(not(feature = "master"), allow(dead_code))]
    queue: Option<K::Queue>,
    state: AtomicU8,
    in_count: AtomicU32,
    out_count: AtomicU32,
    err_count: AtomicU32,
}


impl<K: Kernel, L: SerialLink, D: OutputPin> Rtu<K, L, D> {
    /// Binds an instance to its serial device, optional direction pin and
    /// host-owned register banks, and creates its kernel objects.
    ///
    /// The timer expiry actions capture the objects they act on, so no
    /// global instance registry is needed to route timer callbacks.
    pub fn new(kernel: &K, cfg: Config, link: L, direction: Option<D>, banks: Banks) -> Self
    where
        K::Notifier: 'static,
        K::Timer: 'static,
    {
        let notifier = kernel.notifier();
        let (t35, timeout, queue) = match cfg.role {
            Role::Master => {
                let timeout = kernel.one_shot(cfg.response_timeout_ticks, {
                    let worker = notifier.clone();
                    move || worker.post(signal::TIMEOUT)
                });
                let t35 = kernel.one_shot(cfg.t35_ticks, {
                    let worker = notifier.clone();
                    let pending = timeout.clone();
                    // T3.5 on a master means the response is arriving, so
                    // the response timeout no longer applies
                    move || {
                        pending.stop();
                        worker.post(signal::FRAME);
                    }
                });
                (t35, Some(timeout), Some(kernel.telegram_queue(MAX_TELEGRAMS)))
            }
            Role::Slave => {
                let t35 = kernel.one_shot(cfg.t35_ticks, {
                    let worker = notifier.clone();
                    move || worker.post(signal::FRAME)
                });
                (t35, None, None)
            }
        };

        Rtu {
            cfg,
            ring: SharedRing::new(),
            shared: Guarded::new(
                kernel.semaphore(),
                Inner { link, direction, frame: FrameBuf::new(), banks, last_error: None },
            ),
            notifier,
            t35,
            timeout,
            queue,
            state: AtomicU8::new(COM_IDLE),
            in_count: AtomicU32::new(0),
            out_count: AtomicU32::new(0),
            err_count: AtomicU32::new(0),
        }
    }

    /// Validates the configuration and arms reception.
    ///
    /// Masters must use station id 0, slaves `1..=247` and at least a
    /// holding-register bank. Failures leave the instance unstarted.
    pub fn start(&self) -> Result<(), StartError> {
        match self.cfg.role {
            Role::Master if self.cfg.station_id != 0 => {
                warn!("start refused: station id {} on a master", self.cfg.station_id);
                return Err(StartError::RoleStationMismatch { station_id: self.cfg.station_id });
            }
            Role::Slave if self.cfg.station_id == 0 || self.cfg.station_id > 247 => {
                warn!("start refused: station id {} on a slave", self.cfg.station_id);
                return Err(StartError::RoleStationMismatch { station_id: self.cfg.station_id });
            }
            _ => {}
        }
        if self.cfg.role == Role::Slave
            && self.shared.lock(|inner| inner.banks.sizes().holding == 0)
        {
            warn!("start refused: slave has no holding-register bank");
            return Err(StartError::MissingHoldingBank);
        }

        self.ring.clear();
        self.shared.lock(|inner| {
            if let Some(pin) = inner.direction.as_mut() {
                if pin.set_low().is_err() {
                    warn!("direction pin unresponsive");
                }
            }
            inner.link.enable_receiver();
        });
        debug!("instance started, station {}", self.cfg.station_id);
        Ok(())
    }

    /// Worker task body; never returns.
    pub fn run(&self) -> ! {
        loop {
            match self.cfg.role {
                #[cfg(feature = "slave")]
                Role::Slave => self.slave_poll(),
                #[cfg(feature = "master")]
                Role::Master => self.master_poll(),
                #[allow(unreachable_patterns)]
                // role support compiled out; park instead of spinning
                _ => {
                    self.notifier.wait(None);
                }
            }
        }
    }

    // ---- interrupt-side surface -------------------------------------------

    /// UART RX interrupt body for [`HwMode::Interrupt`]: buffer the byte and
    /// rearm the end-of-frame silence. The caller rearms the next byte
    /// reception in its HAL.
    pub fn on_rx_byte(&self, byte: u8) {
        self.ring.push(byte);
        self.t35.restart();
    }

    /// DMA idle-line callback for [`HwMode::DmaIdle`]: buffer the burst and
    /// signal the frame boundary directly, taking the place of the per-byte
    /// T3.5 timer.
    #[cfg(feature = "dma")]
    pub fn on_dma_idle(&self, data: &[u8]) {
        for &byte in data {
            self.ring.push(byte);
        }
        if let Some(timeout) = &self.timeout {
            timeout.stop();
        }
        self.notifier.post(signal::FRAME);
    }

    /// UART TX-complete interrupt body.
    pub fn on_tx_complete(&self) {
        self.notifier.post(signal::TX_DONE);
    }

    // ---- host surface -----------------------------------------------------

    /// Runs `f` with exclusive access to the register banks. Holding the
    /// closure short keeps the worker responsive; the engine takes the same
    /// semaphore for every transaction.
    pub fn banks<R>(&self, f: impl FnOnce(&mut Banks) -> R) -> R {
        self.shared.lock(|inner| f(&mut inner.banks))
    }

    /// The configuration this instance was created with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Frames accepted by this instance.
    pub fn in_count(&self) -> u32 {
        self.in_count.load(Ordering::Relaxed)
    }

    /// Frames transmitted by this instance.
    pub fn out_count(&self) -> u32 {
        self.out_count.load(Ordering::Relaxed)
    }

    /// Errors observed by this instance.
    pub fn err_count(&self) -> u32 {
        self.err_count.load(Ordering::Relaxed)
    }

    /// Most recent error, if any.
    pub fn last_error(&self) -> Option<EngineError> {
        self.shared.lock(|inner| inner.last_error)
    }

    /// Enqueues a telegram at the tail of the queue, blocking while the
    /// queue is full. The originator is notified when the transaction
    /// completes.
    #[cfg(feature = "master")]
    pub fn query(&self, telegram: Telegram) -> Result<(), EngineError> {
        self.check_query(&telegram)?;
        if let Some(queue) = &self.queue {
            queue.send(telegram);
        }
        Ok(())
    }

    /// Flushes the queue and enqueues at the head, for urgent polls.
    #[cfg(feature = "master")]
    pub fn query_inject(&self, telegram: Telegram) -> Result<(), EngineError> {
        self.check_query(&telegram)?;
        if let Some(queue) = &self.queue {
            queue.inject(telegram);
        }
        Ok(())
    }

    #[cfg(feature = "master")]
    fn check_query(&self, telegram: &Telegram) -> Result<(), EngineError> {
        let refusal = if self.cfg.role != Role::Master {
            Some(EngineError::NotMaster)
        } else if telegram.target == 0 || telegram.target > 247 {
            Some(EngineError::BadSlaveId)
        } else {
            None
        };
        if let Some(error) = refusal {
            self.shared.lock(|inner| self.record_error(inner, error));
            return Err(error);
        }
        Ok(())
    }

    // ---- worker internals -------------------------------------------------

    fn record_error(&self, inner: &mut Inner<L, D>, error: EngineError) {
        inner.last_error = Some(error);
        self.err_count.fetch_add(1, Ordering::Relaxed);
    }

    /// One slave cycle: wait for a frame boundary, then receive, validate,
    /// dispatch and respond.
    #[cfg(feature = "slave")]
    fn slave_poll(&self) {
        let Some(value) = self.notifier.wait(None) else { return };
        if value != signal::FRAME {
            warn!("unexpected notification {} while idle", value);
            return;
        }

        self.shared.lock(|inner| {
            inner.frame.clear();
            let (len, overflowed) = self.ring.drain_into(&mut inner.frame);
            if overflowed {
                self.ring.clear();
                self.record_error(inner, EngineError::BufferOverflow);
                warn!("rx ring overflow, frame dropped");
                return;
            }
            if len < MIN_REQUEST {
                self.record_error(inner, EngineError::BadSize);
                return;
            }
            if inner.frame[frame::offset::ID] != self.cfg.station_id {
                // not addressed to us, not an error; broadcasts (id 0) fall
                // through here and are dropped
                trace!("frame for station {} ignored", inner.frame[frame::offset::ID]);
                return;
            }
            self.in_count.fetch_add(1, Ordering::Relaxed);

            let sizes = inner.banks.sizes();
            match validate::validate_request(&inner.frame, &sizes) {
                Err(validate::RequestFault::Silent(error)) => {
                    self.record_error(inner, error);
                }
                Err(validate::RequestFault::Exception(exception)) => {
                    self.record_error(inner, EngineError::Exception(exception));
                    debug!("request rejected, exception {}", exception.as_code());
                    frame::into_exception(&mut inner.frame, exception);
                    self.send(inner);
                }
                Ok(kind) => {
                    let Inner { frame: buf, banks, .. } = &mut *inner;
                    if crate::slave::process_request(buf, kind, banks).is_ok() {
                        self.send(inner);
                    } else {
                        // response could not fit a frame
                        self.record_error(inner, EngineError::BadSize);
                        inner.frame.clear();
                    }
                }
            }
        });
    }

    /// One master cycle: dequeue a telegram, run the transaction, complete
    /// the originator.
    #[cfg(feature = "master")]
    fn master_poll(&self) {
        let Some(queue) = &self.queue else { return };
        let telegram = queue.recv();
        match self.send_query(&telegram) {
            Ok(()) => self.master_await(&telegram),
            Err(error) => {
                self.shared.lock(|inner| self.record_error(inner, error));
                telegram.originator.completed(Err(error));
            }
        }
    }

    /// Builds and transmits the request frame, arming the response timeout.
    #[cfg(feature = "master")]
    fn send_query(&self, telegram: &Telegram) -> Result<(), EngineError> {
        if self.cfg.role != Role::Master || self.cfg.station_id != 0 {
            return Err(EngineError::NotMaster);
        }
        if self.state.load(Ordering::SeqCst) != COM_IDLE {
            return Err(EngineError::Polling);
        }
        if telegram.target == 0 || telegram.target > 247 {
            return Err(EngineError::BadSlaveId);
        }

        self.shared.lock(|inner| {
            master::build_request(&mut inner.frame, telegram)
                .map_err(|_| EngineError::BadSize)?;
            // drop line noise collected while idle
            self.ring.clear();
            self.send(inner);
            Ok::<(), EngineError>(())
        })?;
        self.state.store(COM_WAITING, Ordering::SeqCst);
        Ok(())
    }

    /// Blocks until the transaction ends in a response frame or the timeout,
    /// then completes the originator.
    #[cfg(feature = "master")]
    fn master_await(&self, telegram: &Telegram) {
        loop {
            let Some(value) = self.notifier.wait(None) else { continue };
            if value == signal::TIMEOUT {
                self.state.store(COM_IDLE, Ordering::SeqCst);
                self.shared.lock(|inner| self.record_error(inner, EngineError::Timeout));
                debug!("response timeout");
                telegram.originator.completed(Err(EngineError::Timeout));
                return;
            }
            if value != signal::FRAME {
                warn!("unexpected notification {} while waiting", value);
                continue;
            }

            let outcome = self.shared.lock(|inner| {
                inner.frame.clear();
                let (len, overflowed) = self.ring.drain_into(&mut inner.frame);
                if let Some(timeout) = &self.timeout {
                    timeout.stop();
                }
                if overflowed {
                    self.ring.clear();
                    self.record_error(inner, EngineError::BufferOverflow);
                    return Err(EngineError::BufferOverflow);
                }
                if len < MIN_RESPONSE {
                    self.record_error(inner, EngineError::BadSize);
                    return Err(EngineError::BadSize);
                }
                let result = validate::validate_answer(&inner.frame)
                    .and_then(|_| master::parse_answer(&inner.frame, telegram));
                if let Err(error) = &result {
                    self.record_error(inner, *error);
                }
                inner.frame.clear();
                result
            });

            if outcome.is_ok() {
                self.in_count.fetch_add(1, Ordering::Relaxed);
            }
            self.state.store(COM_IDLE, Ordering::SeqCst);
            telegram.originator.completed(outcome);
            return;
        }
    }

    /// Appends the CRC and pushes the frame out, honoring the half-duplex
    /// direction discipline.
    fn send(&self, inner: &mut Inner<L, D>) {
        if frame::append_crc(&mut inner.frame).is_err() {
            self.record_error(inner, EngineError::BadSize);
            inner.frame.clear();
            return;
        }

        if let Some(pin) = inner.direction.as_mut() {
            if pin.set_high().is_err() {
                warn!("direction pin unresponsive");
            }
        }
        inner.link.enable_transmitter();
        inner.link.start_transmit(&inner.frame);

        // failsafe so a lost TX interrupt cannot park the worker forever
        if self.notifier.wait(Some(self.cfg.tx_complete_ticks)) != Some(signal::TX_DONE) {
            warn!("tx-complete notification missing, relying on the TC flag");
        }
        // the TX event fires when the shift register is loaded, not drained;
        // flipping the direction line early truncates the last character
        let mut spins = 0u32;
        while !inner.link.is_transmit_complete() && spins < TX_DRAIN_SPIN_LIMIT {
            spins += 1;
        }

        if let Some(pin) = inner.direction.as_mut() {
            if pin.set_low().is_err() {
                warn!("direction pin unresponsive");
            }
        }
        inner.link.enable_receiver();
        if let Some(timeout) = &self.timeout {
            timeout.restart();
        }
        inner.frame.clear();
        self.out_count.fetch_add(1, Ordering::Relaxed);
    }
}
