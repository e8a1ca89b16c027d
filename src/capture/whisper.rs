//! Local speech recognition via `whisper-rs`.
//!
//! Each recognition runs on a `speech-recognizer` thread that accumulates
//! 16 kHz mono audio, emits a partial transcript for every further second
//! of speech, and a final transcript once the audio stream ends.  Audio
//! past the recording cap is dropped.
//!
//! A `WhisperContext` is loaded once and shared; every inference creates its
//! own `WhisperState`.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::config::SpeechLanguage;

use super::audio::{to_recognizer_input, RECOGNIZER_RATE};
use super::providers::{AudioBuffer, RecognitionTask, SpeechToTextProvider, TranscriptSink};
use super::CaptureError;

/// Below 0.5 s Whisper output is noise.
const MIN_SAMPLES: usize = RECOGNIZER_RATE as usize / 2;
const PARTIAL_STEP: usize = RECOGNIZER_RATE as usize;
const POLL: Duration = Duration::from_millis(100);

pub struct WhisperRecognizer {
    ctx: Arc<WhisperContext>,
    max_samples: usize,
    n_threads: i32,
}

impl WhisperRecognizer {
    /// Load a GGML model.
    pub fn load(
        model_path: impl AsRef<Path>,
        use_gpu: bool,
        max_recording_secs: f32,
    ) -> Result<Self, CaptureError> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(CaptureError::Recognizer(format!(
                "model not found: {}",
                path.display()
            )));
        }
        let path_str = path.to_str().ok_or_else(|| {
            CaptureError::Recognizer(format!("non-UTF-8 model path: {}", path.display()))
        })?;

        let mut params = WhisperContextParameters::default();
        params.use_gpu(use_gpu);
        let ctx = WhisperContext::new_with_params(path_str, params)
            .map_err(|e| CaptureError::Recognizer(e.to_string()))?;

        Ok(Self {
            ctx: Arc::new(ctx),
            max_samples: (max_recording_secs.max(1.0) * RECOGNIZER_RATE as f32) as usize,
            n_threads: optimal_threads(),
        })
    }
}

fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

impl SpeechToTextProvider for WhisperRecognizer {
    fn supports_locale(&self, locale: &str) -> bool {
        SpeechLanguage::from_code(locale).is_some()
    }

    fn recognize(
        &self,
        buffers: mpsc::Receiver<AudioBuffer>,
        locale: &str,
        sink: TranscriptSink,
    ) -> Result<Box<dyn RecognitionTask>, CaptureError> {
        let language = SpeechLanguage::from_code(locale)
            .ok_or_else(|| CaptureError::UnsupportedLocale(locale.to_string()))?;

        let cancel = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            ctx: Arc::clone(&self.ctx),
            language: language.whisper_language(),
            max_samples: self.max_samples,
            n_threads: self.n_threads,
            cancel: Arc::clone(&cancel),
        };

        let thread = std::thread::Builder::new()
            .name("speech-recognizer".into())
            .spawn(move || worker.run(buffers, sink))
            .map_err(|e| CaptureError::Recognizer(format!("cannot spawn recognizer: {e}")))?;

        Ok(Box::new(WhisperTask {
            cancel,
            thread: Some(thread),
        }))
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

struct Worker {
    ctx: Arc<WhisperContext>,
    language: &'static str,
    max_samples: usize,
    n_threads: i32,
    cancel: Arc<AtomicBool>,
}

impl Worker {
    fn run(self, buffers: mpsc::Receiver<AudioBuffer>, sink: TranscriptSink) {
        let mut audio: Vec<f32> = Vec::new();
        let mut transcribed_len = 0;
        let mut capped = false;

        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return;
            }
            match buffers.recv_timeout(POLL) {
                Ok(buffer) => {
                    if capped {
                        continue;
                    }
                    audio.extend(to_recognizer_input(&buffer));
                    if audio.len() >= self.max_samples {
                        audio.truncate(self.max_samples);
                        capped = true;
                        log::warn!("speech-recognizer: recording cap reached");
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }

            if audio.len() >= MIN_SAMPLES && audio.len() - transcribed_len >= PARTIAL_STEP {
                transcribed_len = audio.len();
                match self.transcribe(&audio) {
                    Ok(text) => sink.partial(text),
                    Err(e) => {
                        sink.fail(e);
                        return;
                    }
                }
            }
        }

        if self.cancel.load(Ordering::Relaxed) {
            return;
        }
        if audio.len() < MIN_SAMPLES {
            sink.finish(String::new());
            return;
        }
        match self.transcribe(&audio) {
            Ok(text) => sink.finish(text),
            Err(e) => sink.fail(e),
        }
    }

    fn transcribe(&self, audio: &[f32]) -> Result<String, String> {
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(self.language));
        params.set_n_threads(self.n_threads);
        params.set_print_progress(false);
        params.set_print_realtime(false);

        let mut state = self.ctx.create_state().map_err(|e| e.to_string())?;
        state.full(params, audio).map_err(|e| e.to_string())?;

        let segments = state.full_n_segments().map_err(|e| e.to_string())?;
        let mut text = String::new();
        for i in 0..segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| format!("segment {i}: {e}"))?;
            text.push_str(&segment);
        }
        Ok(text.trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// WhisperTask
// ---------------------------------------------------------------------------

struct WhisperTask {
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl RecognitionTask for WhisperTask {
    fn finish(mut self: Box<Self>) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("speech-recognizer thread panicked");
            }
        }
    }

    fn cancel(self: Box<Self>) {
        // The worker notices within one poll interval; not joined.
        self.cancel.store(true, Ordering::Relaxed);
    }
}
