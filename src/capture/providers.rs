//! Capability contracts for audio capture, speech recognition and
//! permissions, plus the typed event channel they report through.
//!
//! Audio buffers arrive on the capture thread and are handed straight to the
//! recognizer over a `std::sync::mpsc` channel.  The recognizer reports on
//! its own thread through a [`TranscriptSink`], which pushes
//! [`SessionEvent`]s onto the session's single-consumer queue.  Nothing on
//! those threads touches session state directly.

use std::sync::mpsc as std_mpsc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::CaptureError;

// ---------------------------------------------------------------------------
// Audio capture
// ---------------------------------------------------------------------------

/// Interleaved PCM in `[-1.0, 1.0]`, as delivered by the device.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Keeps a capture running.  `stop` must be idempotent; after it returns no
/// more buffers are sent.
pub trait CaptureHandle: Send {
    fn stop(&mut self);
}

/// A started capture: the buffer stream and the handle that ends it.
pub struct AudioStream {
    pub buffers: std_mpsc::Receiver<AudioBuffer>,
    pub handle: Box<dyn CaptureHandle>,
}

pub trait AudioCaptureProvider: Send + Sync {
    fn start(&self) -> Result<AudioStream, CaptureError>;
}

// ---------------------------------------------------------------------------
// Speech recognition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Best transcript so far; replaces any earlier partial.
    Partial(String),
    Final(String),
    Failure(String),
}

/// A recognition event tagged with the capture generation that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub generation: u64,
    pub event: RecognitionEvent,
}

/// Where a recognizer reports.  Cheap to clone; sends never block and are
/// dropped silently once the session is gone.
#[derive(Debug, Clone)]
pub struct TranscriptSink {
    generation: u64,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl TranscriptSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn partial(&self, text: impl Into<String>) {
        self.send(RecognitionEvent::Partial(text.into()));
    }

    pub fn finish(&self, text: impl Into<String>) {
        self.send(RecognitionEvent::Final(text.into()));
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.send(RecognitionEvent::Failure(message.into()));
    }

    fn send(&self, event: RecognitionEvent) {
        let _ = self.tx.send(SessionEvent {
            generation: self.generation,
            event,
        });
    }
}

/// A running recognition.
pub trait RecognitionTask: Send {
    /// The audio stream has ended.  Block until the recognizer's last event
    /// has been sent to the sink.
    fn finish(self: Box<Self>);

    /// Abandon recognition; no further events are wanted.
    fn cancel(self: Box<Self>);
}

pub trait SpeechToTextProvider: Send + Sync {
    fn supports_locale(&self, locale: &str) -> bool;

    /// Start recognizing `buffers` in `locale`, reporting through `sink`.
    fn recognize(
        &self,
        buffers: std_mpsc::Receiver<AudioBuffer>,
        locale: &str,
        sink: TranscriptSink,
    ) -> Result<Box<dyn RecognitionTask>, CaptureError>;
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn request_speech(&self) -> bool;
    async fn request_microphone(&self) -> bool;
}

/// For platforms without a permission prompt.
pub struct AlwaysGranted;

#[async_trait]
impl PermissionGate for AlwaysGranted {
    async fn request_speech(&self) -> bool {
        true
    }

    async fn request_microphone(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Unconfigured
// ---------------------------------------------------------------------------

/// Stand-in for builds without audio support.  Every start fails.
pub struct Unconfigured;

impl AudioCaptureProvider for Unconfigured {
    fn start(&self) -> Result<AudioStream, CaptureError> {
        Err(CaptureError::Audio("no audio input in this build".into()))
    }
}

impl SpeechToTextProvider for Unconfigured {
    fn supports_locale(&self, _locale: &str) -> bool {
        false
    }

    fn recognize(
        &self,
        _buffers: std_mpsc::Receiver<AudioBuffer>,
        _locale: &str,
        _sink: TranscriptSink,
    ) -> Result<Box<dyn RecognitionTask>, CaptureError> {
        Err(CaptureError::Recognizer("no speech recognizer in this build".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_tags_events_with_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = TranscriptSink::new(7, tx);
        sink.partial("Cof");
        sink.finish("Coffee 35");
        sink.fail("mic unplugged");

        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent { generation: 7, event: RecognitionEvent::Partial("Cof".into()) }
        );
        assert_eq!(rx.try_recv().unwrap().event, RecognitionEvent::Final("Coffee 35".into()));
        assert_eq!(
            rx.try_recv().unwrap().event,
            RecognitionEvent::Failure("mic unplugged".into())
        );
    }

    #[test]
    fn sink_survives_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        TranscriptSink::new(1, tx).partial("ignored");
    }

    #[tokio::test]
    async fn always_granted_grants() {
        assert!(AlwaysGranted.request_speech().await);
        assert!(AlwaysGranted.request_microphone().await);
    }

    #[test]
    fn unconfigured_refuses_everything() {
        assert!(Unconfigured.start().is_err());
        assert!(!Unconfigured.supports_locale("en-US"));
    }
}
