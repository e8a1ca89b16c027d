//! `rdev` listener thread and the key/pointer → command translation.
//!
//! `rdev::listen` has no shutdown API.  Dropping [`HoldListener`] sets a flag
//! that makes the callback discard events; the thread stays parked in rdev
//! until the process exits.

use std::io;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rdev::EventType;
use tokio::sync::mpsc;

use crate::capture::Point;
use crate::pipeline::PipelineCommand;

// ---------------------------------------------------------------------------
// HoldTracker
// ---------------------------------------------------------------------------

/// Turns raw input events into hold commands for one key.
///
/// Keyboard auto-repeat sends extra presses while the key is down; only the
/// first one starts a hold.
#[derive(Debug, Clone)]
pub struct HoldTracker {
    key: rdev::Key,
    pointer: Point,
    held: bool,
}

impl HoldTracker {
    pub fn new(key: rdev::Key) -> Self {
        Self {
            key,
            pointer: Point::default(),
            held: false,
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn on_event(&mut self, event: &EventType) -> Option<PipelineCommand> {
        match *event {
            EventType::MouseMove { x, y } => {
                self.pointer = Point::new(x, y);
                self.held.then_some(PipelineCommand::HoldMoved(self.pointer))
            }
            EventType::KeyPress(k) if k == self.key && !self.held => {
                self.held = true;
                Some(PipelineCommand::HoldStarted(self.pointer))
            }
            EventType::KeyRelease(k) if k == self.key && self.held => {
                self.held = false;
                Some(PipelineCommand::HoldReleased)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// HoldListener
// ---------------------------------------------------------------------------

/// Handle to the running listener thread.  Drop it to stop forwarding.
pub struct HoldListener {
    stop: Arc<AtomicBool>,
    _thread: std::thread::JoinHandle<()>,
}

impl HoldListener {
    /// Spawn the `hotkey-listener` thread.  Commands go out with
    /// `blocking_send` since the rdev callback is not async.
    pub fn start(key: rdev::Key, tx: mpsc::Sender<PipelineCommand>) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("hotkey-listener".into())
            .spawn(move || {
                let mut tracker = HoldTracker::new(key);
                let result = rdev::listen(move |event| {
                    if stop_flag.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Some(command) = tracker.on_event(&event.event_type) {
                        if tx.blocking_send(command).is_err() {
                            stop_flag.store(true, Ordering::Relaxed);
                        }
                    }
                });

                if let Err(e) = result {
                    log::error!("hotkey-listener: rdev::listen exited with error: {:?}", e);
                }
            })?;

        log::info!("hotkey-listener: hold {:?} to talk", key);
        Ok(Self {
            stop,
            _thread: thread,
        })
    }
}

impl Drop for HoldListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
