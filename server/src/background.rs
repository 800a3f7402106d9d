use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Sender};
use std::thread::{self, JoinHandle};

use log::warn;

use crate::error::PostError;
use crate::work_queue::{EventContext, ServerHandle};

/// What `perform` asks to happen with its unit afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Post the unit back to the processing sequence and run
    /// `complete` there.
    Complete,
    /// Drop the unit; no completion runs.
    Discard,
}

/// Work that must leave the processing sequence (blocking I/O, slow
/// computation). `perform` runs on the worker thread and must not
/// touch object state; `complete` runs back on the processing
/// sequence with full access. Fallible units carry their error across
/// in their own fields and surface it inside `complete`.
pub trait WorkUnit: Send {
    fn perform(&mut self) -> Outcome;
    fn complete(self: Box<Self>, ctx: &mut EventContext);
}

enum WorkerMessage {
    Unit(Box<dyn WorkUnit>),
    Stop,
}

/// Owns the background worker thread and the bridge back into the
/// processing sequence. Units run strictly in post order on a single
/// worker; a panicking unit is logged and its completion suppressed,
/// the worker survives.
pub struct BackgroundRunner {
    sender: Sender<WorkerMessage>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundRunner {
    pub fn start(handle: ServerHandle) -> Self {
        let (sender, receiver) = channel();
        let worker = thread::spawn(move || {
            while let Ok(message) = receiver.recv() {
                let mut unit = match message {
                    WorkerMessage::Unit(unit) => unit,
                    WorkerMessage::Stop => break,
                };
                match catch_unwind(AssertUnwindSafe(|| unit.perform())) {
                    Ok(Outcome::Complete) => {
                        if handle.post(move |ctx| unit.complete(ctx)).is_err() {
                            warn!("Background completion after server shutdown, dropped");
                        }
                    }
                    Ok(Outcome::Discard) => {}
                    Err(_) => warn!("Background unit panicked, completion suppressed"),
                }
            }
        });
        Self {
            sender,
            worker: Some(worker),
        }
    }

    pub fn post(&self, unit: Box<dyn WorkUnit>) -> Result<(), PostError> {
        self.sender
            .send(WorkerMessage::Unit(unit))
            .map_err(|_| PostError)
    }

    /// Posts the stop sentinel behind everything already queued and
    /// waits for the worker to drain.
    pub fn shutdown(mut self) {
        let _ = self.sender.send(WorkerMessage::Stop);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for BackgroundRunner {
    fn drop(&mut self) {
        let _ = self.sender.send(WorkerMessage::Stop);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
