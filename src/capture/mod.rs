//! Voice capture: the listening lifecycle for one utterance.
//!
//! # Architecture
//!
//! ```text
//! AudioCaptureProvider ──AudioBuffer (std mpsc)──▶ SpeechToTextProvider
//!   [audio-capture thread]                           [recognizer thread]
//!                                                          │ TranscriptSink
//!                                                          ▼
//!                         CaptureSession ◀──SessionEvent (tokio mpsc)──
//!                         (single consumer)
//! ```
//!
//! [`CaptureSession`] owns the [`CaptureState`] machine and the scoped
//! audio/recognition resources.  [`HoldGesture`] turns pointer movement into
//! a cancel decision at release time.
//!
//! With the `cpal` feature, [`CpalCapture`] reads the default microphone;
//! with `whisper`, [`WhisperRecognizer`] transcribes locally.

pub mod audio;
pub mod gesture;
pub mod providers;
pub mod scripted;
pub mod session;
pub mod state;

#[cfg(feature = "cpal")]
pub mod microphone;
#[cfg(feature = "whisper")]
pub mod whisper;

pub use gesture::{HoldGesture, HoldRelease, Point};
pub use providers::{
    AlwaysGranted, AudioBuffer, AudioCaptureProvider, AudioStream, CaptureHandle, PermissionGate,
    RecognitionEvent, RecognitionTask, SessionEvent, SpeechToTextProvider, TranscriptSink,
    Unconfigured,
};
pub use scripted::{ScriptedAudio, ScriptedPermissions, ScriptedRecognizer};
pub use session::{CaptureSession, SessionUpdate};
pub use state::{CaptureEvent, CaptureState};

#[cfg(feature = "cpal")]
pub use microphone::CpalCapture;
#[cfg(feature = "whisper")]
pub use whisper::WhisperRecognizer;

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Speech recognition permission denied")]
    PermissionDenied,

    #[error("Microphone permission denied")]
    MicrophoneDenied,

    #[error("Speech recognition is not available for {0}")]
    UnsupportedLocale(String),

    #[error("Audio capture failed: {0}")]
    Audio(String),

    #[error("Speech recognition failed: {0}")]
    Recognizer(String),
}
