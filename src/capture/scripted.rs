//! Deterministic capture doubles: audio that never touches a device, a
//! recognizer that replays scripted text, and fixed permission answers.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};

use async_trait::async_trait;

use super::providers::{
    AudioBuffer, AudioCaptureProvider, AudioStream, CaptureHandle, PermissionGate,
    RecognitionTask, SpeechToTextProvider, TranscriptSink,
};
use super::CaptureError;

// ---------------------------------------------------------------------------
// ScriptedAudio
// ---------------------------------------------------------------------------

/// Counts starts and stops; sends one second of silence per start.
#[derive(Default)]
pub struct ScriptedAudio {
    starts: AtomicUsize,
    stops: Arc<AtomicUsize>,
    failure: Option<CaptureError>,
}

impl ScriptedAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: CaptureError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Captures started and not yet stopped.
    pub fn active_captures(&self) -> usize {
        self.starts().saturating_sub(self.stops())
    }
}

struct ScriptedHandle {
    stops: Arc<AtomicUsize>,
    tx: Option<std_mpsc::Sender<AudioBuffer>>,
}

impl CaptureHandle for ScriptedHandle {
    fn stop(&mut self) {
        if self.tx.take().is_some() {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl AudioCaptureProvider for ScriptedAudio {
    fn start(&self) -> Result<AudioStream, CaptureError> {
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        self.starts.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = std_mpsc::channel();
        let _ = tx.send(AudioBuffer {
            samples: vec![0.0; 16_000],
            sample_rate: 16_000,
            channels: 1,
        });
        Ok(AudioStream {
            buffers: rx,
            handle: Box::new(ScriptedHandle {
                stops: Arc::clone(&self.stops),
                tx: Some(tx),
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// ScriptedRecognizer
// ---------------------------------------------------------------------------

/// Emits scripted partials as soon as recognition starts and an optional
/// final result when the task is finished.
#[derive(Default)]
pub struct ScriptedRecognizer {
    locales: Option<HashSet<String>>,
    partials: Vec<String>,
    final_text: Option<String>,
    start_failure: Option<String>,
    last_sink: Mutex<Option<TranscriptSink>>,
    recognize_calls: AtomicUsize,
    finished: Arc<AtomicUsize>,
    cancelled: Arc<AtomicUsize>,
}

impl ScriptedRecognizer {
    /// Supports every locale and emits nothing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn only_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = Some(locales.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_partials<I, S>(mut self, partials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partials = partials.into_iter().map(Into::into).collect();
        self
    }

    pub fn final_on_finish(mut self, text: impl Into<String>) -> Self {
        self.final_text = Some(text.into());
        self
    }

    pub fn failing_start(mut self, message: impl Into<String>) -> Self {
        self.start_failure = Some(message.into());
        self
    }

    /// Sink of the most recent recognition, for pushing extra events.
    pub fn sink(&self) -> Option<TranscriptSink> {
        self.last_sink.lock().ok().and_then(|sink| sink.clone())
    }

    pub fn recognize_calls(&self) -> usize {
        self.recognize_calls.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

struct ScriptedTask {
    sink: TranscriptSink,
    final_text: Option<String>,
    finished: Arc<AtomicUsize>,
    cancelled: Arc<AtomicUsize>,
    _buffers: std_mpsc::Receiver<AudioBuffer>,
}

impl RecognitionTask for ScriptedTask {
    fn finish(self: Box<Self>) {
        if let Some(text) = &self.final_text {
            self.sink.finish(text.clone());
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    fn cancel(self: Box<Self>) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }
}

impl SpeechToTextProvider for ScriptedRecognizer {
    fn supports_locale(&self, locale: &str) -> bool {
        self.locales
            .as_ref()
            .map_or(true, |locales| locales.contains(locale))
    }

    fn recognize(
        &self,
        buffers: std_mpsc::Receiver<AudioBuffer>,
        _locale: &str,
        sink: TranscriptSink,
    ) -> Result<Box<dyn RecognitionTask>, CaptureError> {
        self.recognize_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.start_failure {
            return Err(CaptureError::Recognizer(message.clone()));
        }

        for partial in &self.partials {
            sink.partial(partial.clone());
        }
        if let Ok(mut last) = self.last_sink.lock() {
            *last = Some(sink.clone());
        }

        Ok(Box::new(ScriptedTask {
            sink,
            final_text: self.final_text.clone(),
            finished: Arc::clone(&self.finished),
            cancelled: Arc::clone(&self.cancelled),
            _buffers: buffers,
        }))
    }
}

// ---------------------------------------------------------------------------
// ScriptedPermissions
// ---------------------------------------------------------------------------

pub struct ScriptedPermissions {
    speech: bool,
    microphone: bool,
}

impl ScriptedPermissions {
    pub fn new(speech: bool, microphone: bool) -> Self {
        Self { speech, microphone }
    }
}

#[async_trait]
impl PermissionGate for ScriptedPermissions {
    async fn request_speech(&self) -> bool {
        self.speech
    }

    async fn request_microphone(&self) -> bool {
        self.microphone
    }
}
