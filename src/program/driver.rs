//! Threaded front end for a [`ProgramEngine`].
//!
//! Frames, ticks and the stop request all arrive on one channel, so the
//! engine only ever sees them one at a time and in arrival order.

use crate::pose::Frame;
use crate::program::engine::{ProgramEngine, ProgramEvent};
use crate::program::live::LiveCounters;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Input accepted by the driver thread.
#[derive(Debug, Clone)]
pub enum DriverInput {
    Frame(Frame),
    Tick,
    Stop { flush: bool },
}

/// Owns the engine on a worker thread.
pub struct ProgramDriver {
    sender: Sender<DriverInput>,
    events: Receiver<ProgramEvent>,
    live: Arc<RwLock<LiveCounters>>,
    thread_handle: Option<JoinHandle<ProgramEngine>>,
}

impl ProgramDriver {
    /// Move the engine onto a new thread and start consuming input.
    pub fn spawn(mut engine: ProgramEngine) -> Self {
        // Bounded so a stalled engine pushes back on the frame source
        let (sender, receiver) = bounded::<DriverInput>(1_024);
        let (event_tx, events) = unbounded();
        let live = Arc::new(RwLock::new(engine.live()));

        let shared = live.clone();
        let handle = thread::spawn(move || {
            forward(&mut engine, &event_tx, &shared);

            while !engine.is_finished() {
                let Ok(input) = receiver.recv() else {
                    // Every sender is gone
                    engine.stop(false);
                    forward(&mut engine, &event_tx, &shared);
                    break;
                };

                match input {
                    DriverInput::Frame(frame) => engine.process_frame(&frame),
                    DriverInput::Tick => engine.tick(),
                    DriverInput::Stop { flush } => engine.stop(flush),
                }
                forward(&mut engine, &event_tx, &shared);
            }

            tracing::debug!(run_id = %engine.run_id(), "driver thread exiting");
            engine
        });

        Self {
            sender,
            events,
            live,
            thread_handle: Some(handle),
        }
    }

    /// A handle for feeding input; clone freely.
    pub fn sender(&self) -> Sender<DriverInput> {
        self.sender.clone()
    }

    /// Events published by the engine, in order.
    pub fn events(&self) -> &Receiver<ProgramEvent> {
        &self.events
    }

    /// Latest display counters.
    pub fn live(&self) -> LiveCounters {
        self.live.read().clone()
    }

    /// Whether the worker has stopped taking input.
    pub fn is_finished(&self) -> bool {
        self.live.read().finished
    }

    /// Wait for the worker to exit and hand back the engine.
    ///
    /// Returns `None` if the worker panicked.
    pub fn join(mut self) -> Option<ProgramEngine> {
        let handle = self.thread_handle.take()?;
        if !self.is_finished() {
            let _ = self.sender.send(DriverInput::Stop { flush: false });
        }
        handle.join().ok()
    }
}

impl Drop for ProgramDriver {
    fn drop(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = self.sender.send(DriverInput::Stop { flush: false });
            let _ = handle.join();
        }
    }
}

fn forward(
    engine: &mut ProgramEngine,
    events: &Sender<ProgramEvent>,
    live: &RwLock<LiveCounters>,
) {
    *live.write() = engine.live();
    for event in engine.take_events() {
        // The receiver may already be gone on shutdown
        let _ = events.send(event);
    }
}

/// Sends a [`DriverInput::Tick`] every `interval` until stopped.
pub struct Ticker {
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start ticking into `sender`.
    pub fn start(sender: Sender<DriverInput>, interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = thread::spawn(move || {
            let ticks = crossbeam_channel::tick(interval);
            while flag.load(Ordering::SeqCst) {
                match ticks.recv_timeout(Duration::from_millis(100)) {
                    Ok(_) => {
                        if sender.send(DriverInput::Tick).is_err() {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            flag.store(false, Ordering::SeqCst);
        });

        Self {
            running,
            thread_handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop ticking and wait for the thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
