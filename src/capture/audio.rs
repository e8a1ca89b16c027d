//! Conversion of device buffers to recognizer input: 16 kHz mono `f32`.

use super::providers::AudioBuffer;

pub const RECOGNIZER_RATE: u32 = 16_000;

/// Downmix and resample one device buffer for the recognizer.
pub fn to_recognizer_input(buffer: &AudioBuffer) -> Vec<f32> {
    let mono = downmix(&buffer.samples, buffer.channels);
    resample_to_16k(&mono, buffer.sample_rate)
}

/// Average interleaved channels into one.  Zero channels yields nothing.
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

/// Linear-interpolation resample from `source_rate` to 16 kHz.
///
/// ```
/// use voice_ledger::capture::audio::resample_to_16k;
///
/// assert_eq!(resample_to_16k(&[0.5_f32; 480], 48_000).len(), 160);
/// ```
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Vec<f32> {
    if source_rate == RECOGNIZER_RATE || source_rate == 0 {
        return samples.to_vec();
    }
    if samples.is_empty() {
        return Vec::new();
    }

    let ratio = RECOGNIZER_RATE as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let pos = i as f64 / ratio;
            let idx = pos as usize;
            let frac = (pos - idx as f64) as f32;
            match (samples.get(idx), samples.get(idx + 1)) {
                (Some(a), Some(b)) => a * (1.0 - frac) + b * frac,
                (Some(a), None) => *a,
                _ => 0.0,
            }
        })
        .collect()
}
