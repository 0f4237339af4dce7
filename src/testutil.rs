//! Hosted mock implementations of the kernel and link contracts, for unit
//! tests. Timers never fire on their own; tests fire them explicitly.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::kernel::{BinarySemaphore, Kernel, Notifier, OneShot, TelegramQueue};
use crate::link::SerialLink;
use crate::telegram::{Originator, Reply, Telegram};
use crate::EngineError;


pub(crate) struct MockSemaphore(Mutex<bool>, Condvar);

impl BinarySemaphore for MockSemaphore {
    fn take(&self) {
        let mut free = self.0.lock().unwrap();
        while !*free {
            free = self.1.wait(free).unwrap();
        }
        *free = false;
    }

    fn give(&self) {
        *self.0.lock().unwrap() = true;
        self.1.notify_one();
    }
}


#[derive(Clone)]
pub(crate) struct MockNotifier(Arc<(Mutex<Option<u32>>, Condvar)>);

impl MockNotifier {
    fn new() -> Self {
        MockNotifier(Arc::new((Mutex::new(None), Condvar::new())))
    }
}

impl Notifier for MockNotifier {
    fn post(&self, value: u32) {
        *self.0.0.lock().unwrap() = Some(value);
        self.0.1.notify_one();
    }

    fn wait(&self, timeout_ticks: Option<u32>) -> Option<u32> {
        let mut pending = self.0.0.lock().unwrap();
        loop {
            if let Some(value) = pending.take() {
                return Some(value);
            }
            match timeout_ticks {
                // one mock tick is one millisecond
                Some(ticks) => {
                    let (guard, result) = self
                        .0
                        .1
                        .wait_timeout(pending, Duration::from_millis(ticks.into()))
                        .unwrap();
                    pending = guard;
                    if result.timed_out() && pending.is_none() {
                        return None;
                    }
                }
                None => pending = self.0.1.wait(pending).unwrap(),
            }
        }
    }
}


pub(crate) struct MockTimerInner {
    period_ticks: u32,
    armed: Mutex<bool>,
    callback: Box<dyn Fn() + Send + Sync>,
}

#[derive(Clone)]
pub(crate) struct MockTimer(Arc<MockTimerInner>);

impl MockTimer {
    /// Runs the expiry action if the timer is armed, as the kernel would on
    /// expiry.
    pub(crate) fn fire(&self) {
        let was_armed = {
            let mut armed = self.0.armed.lock().unwrap();
            std::mem::replace(&mut *armed, false)
        };
        if was_armed {
            (self.0.callback)();
        }
    }

    pub(crate) fn is_armed(&self) -> bool {
        *self.0.armed.lock().unwrap()
    }

    pub(crate) fn period_ticks(&self) -> u32 {
        self.0.period_ticks
    }
}

impl OneShot for MockTimer {
    fn restart(&self) {
        *self.0.armed.lock().unwrap() = true;
    }

    fn stop(&self) {
        *self.0.armed.lock().unwrap() = false;
    }
}


pub(crate) struct MockQueue {
    depth: usize,
    items: Mutex<Vec<Telegram>>,
    ready: Condvar,
}

impl TelegramQueue for MockQueue {
    fn send(&self, telegram: Telegram) {
        let mut items = self.items.lock().unwrap();
        while items.len() >= self.depth {
            items = self.ready.wait(items).unwrap();
        }
        items.push(telegram);
        self.ready.notify_all();
    }

    fn recv(&self) -> Telegram {
        let mut items = self.items.lock().unwrap();
        while items.is_empty() {
            items = self.ready.wait(items).unwrap();
        }
        let telegram = items.remove(0);
        self.ready.notify_all();
        telegram
    }

    fn inject(&self, telegram: Telegram) {
        let mut items = self.items.lock().unwrap();
        items.clear();
        items.push(telegram);
        self.ready.notify_all();
    }
}


/// Kernel whose timers are fired by the test and whose notifier is shared,
/// so the mock link can deliver the TX-complete event synchronously.
pub(crate) struct MockKernel {
    notifier: MockNotifier,
    timers: Mutex<Vec<MockTimer>>,
}

impl MockKernel {
    pub(crate) fn new() -> Self {
        MockKernel { notifier: MockNotifier::new(), timers: Mutex::new(Vec::new()) }
    }

    /// Timers in creation order. For a master instance the response timeout
    /// is created first, then T3.5.
    pub(crate) fn timer(&self, index: usize) -> MockTimer {
        self.timers.lock().unwrap()[index].clone()
    }

    pub(crate) fn shared_notifier(&self) -> MockNotifier {
        self.notifier.clone()
    }
}

impl Kernel for MockKernel {
    type Semaphore = MockSemaphore;
    type Timer = MockTimer;
    type Notifier = MockNotifier;
    type Queue = MockQueue;

    fn semaphore(&self) -> MockSemaphore {
        MockSemaphore(Mutex::new(true), Condvar::new())
    }

    fn notifier(&self) -> MockNotifier {
        self.notifier.clone()
    }

    fn one_shot<F>(&self, period_ticks: u32, on_expiry: F) -> MockTimer
    where
        F: Fn() + Send + Sync + 'static,
    {
        let timer = MockTimer(Arc::new(MockTimerInner {
            period_ticks,
            armed: Mutex::new(false),
            callback: Box::new(on_expiry),
        }));
        self.timers.lock().unwrap().push(timer.clone());
        timer
    }

    fn telegram_queue(&self, depth: usize) -> MockQueue {
        MockQueue { depth, items: Mutex::new(Vec::new()), ready: Condvar::new() }
    }
}


/// Link that records transmitted frames and reports TX completion through
/// the shared notifier the moment a transfer starts.
pub(crate) struct MockLink {
    pub(crate) sent: Arc<Mutex<Vec<Vec<u8>>>>,
    pub(crate) rx_enabled: Arc<Mutex<bool>>,
    tx_done: MockNotifier,
}

impl MockLink {
    pub(crate) fn new(kernel: &MockKernel) -> Self {
        MockLink {
            sent: Arc::new(Mutex::new(Vec::new())),
            rx_enabled: Arc::new(Mutex::new(false)),
            tx_done: kernel.shared_notifier(),
        }
    }
}

impl SerialLink for MockLink {
    fn enable_receiver(&mut self) {
        *self.rx_enabled.lock().unwrap() = true;
    }

    fn enable_transmitter(&mut self) {
        *self.rx_enabled.lock().unwrap() = false;
    }

    fn start_transmit(&mut self, frame: &[u8]) {
        self.sent.lock().unwrap().push(frame.to_vec());
        self.tx_done.post(crate::kernel::signal::TX_DONE);
    }

    fn is_transmit_complete(&self) -> bool {
        true
    }
}


/// Originator recording every completion it receives.
#[derive(Default)]
pub(crate) struct RecordingOriginator {
    pub(crate) completions: Mutex<Vec<Result<Reply, EngineError>>>,
}

impl RecordingOriginator {
    pub(crate) fn leaked() -> &'static RecordingOriginator {
        Box::leak(Box::new(RecordingOriginator::default()))
    }

    pub(crate) fn take(&self) -> Vec<Result<Reply, EngineError>> {
        std::mem::take(&mut *self.completions.lock().unwrap())
    }
}

impl Originator for RecordingOriginator {
    fn completed(&self, result: Result<Reply, EngineError>) {
        self.completions.lock().unwrap().push(result);
    }
}


/// A telegram with an empty payload.
pub(crate) fn telegram(
    target: u8,
    function: crate::FunctionKind,
    start_address: u16,
    quantity: u16,
    originator: &'static dyn Originator,
) -> Telegram {
    Telegram {
        target,
        function,
        start_address,
        quantity,
        payload: heapless::Vec::new(),
        originator,
    }
}
