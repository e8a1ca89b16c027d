//! Microphone capture via `cpal`.
//!
//! `cpal::Stream` is not `Send`, so each capture owns a dedicated
//! `audio-capture` thread that builds, plays and finally drops the stream.
//! [`CpalHandle::stop`] signals that thread and joins it; once it returns
//! the buffer sender is gone and the recognizer sees end of stream.

use std::sync::mpsc;
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::providers::{AudioBuffer, AudioCaptureProvider, AudioStream, CaptureHandle};
use super::CaptureError;

/// System default input device.
#[derive(Debug, Default)]
pub struct CpalCapture;

impl CpalCapture {
    pub fn new() -> Self {
        Self
    }
}

pub struct CpalHandle {
    stop_tx: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CaptureHandle for CpalHandle {
    fn stop(&mut self) {
        // Dropping the sender wakes the capture thread.
        self.stop_tx.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("audio-capture thread panicked");
            }
        }
    }
}

impl Drop for CpalHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl AudioCaptureProvider for CpalCapture {
    fn start(&self) -> Result<AudioStream, CaptureError> {
        let (buf_tx, buf_rx) = mpsc::channel::<AudioBuffer>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), CaptureError>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || {
                let stream = match open_stream(buf_tx) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                // Blocks until the handle drops its sender.
                let _ = stop_rx.recv();
                drop(stream);
                log::debug!("audio-capture: stream closed");
            })
            .map_err(|e| CaptureError::Audio(format!("cannot spawn capture thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(AudioStream {
                buffers: buf_rx,
                handle: Box::new(CpalHandle {
                    stop_tx: Some(stop_tx),
                    thread: Some(thread),
                }),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => Err(CaptureError::Audio("capture thread exited early".into())),
        }
    }
}

fn open_stream(tx: mpsc::Sender<AudioBuffer>) -> Result<cpal::Stream, CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| CaptureError::Audio("no input device found".into()))?;

    let supported = device
        .default_input_config()
        .map_err(|e| CaptureError::Audio(e.to_string()))?;
    let channels = supported.channels();
    let sample_rate = supported.sample_rate().0;
    let config: cpal::StreamConfig = supported.into();

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = tx.send(AudioBuffer {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                });
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None,
        )
        .map_err(|e| CaptureError::Audio(e.to_string()))?;

    stream
        .play()
        .map_err(|e| CaptureError::Audio(e.to_string()))?;

    log::info!("audio-capture: {sample_rate} Hz, {channels} channel(s)");
    Ok(stream)
}
