//! One utterance at a time: permissions, audio, recognition, teardown.
//!
//! # Lifecycle
//!
//! ```text
//! start()  ── speech permission ── microphone permission ── locale check
//!          ── AudioCaptureProvider::start ── SpeechToTextProvider::recognize
//!          ──▶ Listening
//!
//! next_event() / handle()   partial → transcript, final → release audio,
//!                           failure → release audio, Error
//!
//! stop(false) ── stop audio, finish recognition, drain queued events ──▶ transcript
//! stop(true)  ── stop audio, cancel recognition, discard transcript
//! ```
//!
//! Audio and recognition are held by an [`ActiveCapture`] guard.  It is
//! released on stop, cancel and failure, and its `Drop` stops both if the
//! session itself is dropped mid-capture.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::providers::{
    AudioCaptureProvider, CaptureHandle, PermissionGate, RecognitionEvent, RecognitionTask,
    SessionEvent, SpeechToTextProvider, TranscriptSink,
};
use super::state::{CaptureEvent, CaptureState};
use super::CaptureError;

// ---------------------------------------------------------------------------
// ActiveCapture
// ---------------------------------------------------------------------------

struct ActiveCapture {
    audio: Option<Box<dyn CaptureHandle>>,
    recognition: Option<Box<dyn RecognitionTask>>,
}

impl ActiveCapture {
    fn stop_audio(&mut self) {
        if let Some(mut audio) = self.audio.take() {
            audio.stop();
        }
    }

    /// Stop audio, then wait for the recognizer to flush its last result.
    async fn finish(mut self) {
        self.stop_audio();
        if let Some(task) = self.recognition.take() {
            if let Err(e) = tokio::task::spawn_blocking(move || task.finish()).await {
                log::warn!("capture: recognizer did not finish cleanly: {e}");
            }
        }
    }
}

impl Drop for ActiveCapture {
    fn drop(&mut self) {
        self.stop_audio();
        if let Some(task) = self.recognition.take() {
            task.cancel();
        }
    }
}

// ---------------------------------------------------------------------------
// SessionUpdate
// ---------------------------------------------------------------------------

/// Effect of one recognition event on the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// From an earlier capture or arriving while idle; ignored.
    Stale,
    Transcript(String),
    Failed(CaptureError),
}

// ---------------------------------------------------------------------------
// CaptureSession
// ---------------------------------------------------------------------------

pub struct CaptureSession {
    audio: Arc<dyn AudioCaptureProvider>,
    recognizer: Arc<dyn SpeechToTextProvider>,
    permissions: Arc<dyn PermissionGate>,
    locale: String,
    state: CaptureState,
    transcript: String,
    error: Option<CaptureError>,
    generation: u64,
    active: Option<ActiveCapture>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl CaptureSession {
    pub fn new(
        audio: Arc<dyn AudioCaptureProvider>,
        recognizer: Arc<dyn SpeechToTextProvider>,
        permissions: Arc<dyn PermissionGate>,
        locale: impl Into<String>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            audio,
            recognizer,
            permissions,
            locale: locale.into(),
            state: CaptureState::Idle,
            transcript: String::new(),
            error: None,
            generation: 0,
            active: None,
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn error(&self) -> Option<&CaptureError> {
        self.error.as_ref()
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Takes effect on the next `start`.
    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
    }

    /// `true` while audio and recognition resources are held.
    pub fn holds_resources(&self) -> bool {
        self.active.is_some()
    }

    /// Leave `Error` for `Idle`.
    pub fn clear_error(&mut self) {
        self.error = None;
        if self.state == CaptureState::Error {
            self.state = CaptureState::Idle;
        }
    }

    // -----------------------------------------------------------------------
    // Start
    // -----------------------------------------------------------------------

    /// Begin listening.  A no-op unless `Idle` or `Error`.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if !matches!(self.state, CaptureState::Idle | CaptureState::Error) {
            log::debug!("capture: start ignored in {:?}", self.state);
            return Ok(());
        }

        self.transcript.clear();
        self.error = None;
        self.transition(CaptureEvent::Start);

        match self.acquire().await {
            Ok(active) => {
                self.active = Some(active);
                self.transition(CaptureEvent::PermissionGranted);
                log::info!("capture: listening ({})", self.locale);
                Ok(())
            }
            Err(e) => {
                self.fail(e.clone());
                Err(e)
            }
        }
    }

    async fn acquire(&mut self) -> Result<ActiveCapture, CaptureError> {
        if !self.permissions.request_speech().await {
            return Err(CaptureError::PermissionDenied);
        }
        if !self.permissions.request_microphone().await {
            return Err(CaptureError::MicrophoneDenied);
        }
        if !self.recognizer.supports_locale(&self.locale) {
            return Err(CaptureError::UnsupportedLocale(self.locale.clone()));
        }

        self.generation += 1;
        let stream = self.audio.start()?;
        let mut active = ActiveCapture {
            audio: Some(stream.handle),
            recognition: None,
        };

        // On error `active` drops here and stops the audio it holds.
        let sink = TranscriptSink::new(self.generation, self.events_tx.clone());
        let task = self.recognizer.recognize(stream.buffers, &self.locale, sink)?;
        active.recognition = Some(task);
        Ok(active)
    }

    // -----------------------------------------------------------------------
    // Recognition events
    // -----------------------------------------------------------------------

    /// Next queued recognition event.  Pending forever while nothing is
    /// queued, since the session keeps a sender.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    pub fn handle(&mut self, event: SessionEvent) -> SessionUpdate {
        let live = matches!(self.state, CaptureState::Listening | CaptureState::Stopping);
        if event.generation != self.generation || !live {
            log::debug!("capture: dropped stale event from generation {}", event.generation);
            return SessionUpdate::Stale;
        }

        match event.event {
            RecognitionEvent::Partial(text) => {
                self.transcript = text;
                SessionUpdate::Transcript(self.transcript.clone())
            }
            RecognitionEvent::Final(text) => {
                self.transcript = text;
                if self.state == CaptureState::Listening {
                    // The recognizer is done; keep listening state until the
                    // hold ends but give the microphone back now.
                    self.release();
                }
                SessionUpdate::Transcript(self.transcript.clone())
            }
            RecognitionEvent::Failure(message) => {
                let error = CaptureError::Recognizer(message);
                self.fail(error.clone());
                SessionUpdate::Failed(error)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// End the capture.
    ///
    /// Always tears down audio and recognition before returning.  Returns
    /// the final transcript unless `cancelled`, or `Ok(None)` when not
    /// listening.  A recognizer failure that surfaces while flushing is
    /// returned as the error.
    pub async fn stop(&mut self, cancelled: bool) -> Result<Option<String>, CaptureError> {
        if self.state != CaptureState::Listening {
            return Ok(None);
        }
        self.transition(CaptureEvent::Stop);

        if let Some(active) = self.active.take() {
            if cancelled {
                drop(active);
            } else {
                active.finish().await;
            }
        }

        if !cancelled {
            while let Ok(event) = self.events_rx.try_recv() {
                if let SessionUpdate::Failed(e) = self.handle(event) {
                    return Err(e);
                }
            }
        }

        let transcript = std::mem::take(&mut self.transcript);
        self.transition(CaptureEvent::Stopped);

        if cancelled {
            log::info!("capture: cancelled, transcript discarded");
            Ok(None)
        } else {
            Ok(Some(transcript))
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn release(&mut self) {
        self.active = None;
    }

    fn fail(&mut self, error: CaptureError) {
        self.release();
        log::error!("capture: {error}");
        self.error = Some(error);
        self.transition(CaptureEvent::Failure);
    }

    fn transition(&mut self, event: CaptureEvent) {
        let next = self.state.next(event);
        if next != self.state {
            log::debug!("capture: {:?} --{:?}--> {:?}", self.state, event, next);
        }
        self.state = next;
    }
}
