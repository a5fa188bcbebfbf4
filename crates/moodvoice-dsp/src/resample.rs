//! Band-limited sample-rate conversion.

use crate::error::StageError;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Input frames fed to the resampler per call.
const CHUNK_SIZE: usize = 1024;

/// Resamples `samples` so that the output holds `ceil(len * ratio)` values.
///
/// `ratio` is `target_rate / source_rate`. Output sample `i` lines up with
/// input time `i / ratio` to within one output sample.
///
/// # Errors
///
/// `InvalidParameter` for a non-positive or non-finite ratio, `Resample` if
/// the resampler rejects the ratio or fails mid-stream.
pub fn resample(samples: &[f32], ratio: f64) -> Result<Vec<f32>, StageError> {
    if !(ratio.is_finite() && ratio > 0.0) {
        return Err(StageError::InvalidParameter {
            name: "resample ratio",
            value: ratio as f32,
        });
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }
    if (ratio - 1.0).abs() < f64::EPSILON {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_SIZE, 1)
        .map_err(|e| StageError::Resample(e.to_string()))?;

    // SincFixedIn starts its read position half a filter length before the
    // first frame, so the stream is already aligned. `output_delay()` reports
    // the filter length and must not be skipped here.
    let expected = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(expected + CHUNK_SIZE);

    for chunk in samples.chunks(CHUNK_SIZE) {
        let input: [&[f32]; 1] = [chunk];
        let frames = if chunk.len() == CHUNK_SIZE {
            resampler.process(&input[..], None)
        } else {
            resampler.process_partial(Some(&input[..]), None)
        }
        .map_err(|e| StageError::Resample(e.to_string()))?;
        output.extend_from_slice(&frames[0]);
    }

    // Flush the samples still held back by the filter.
    while output.len() < expected {
        let frames = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| StageError::Resample(e.to_string()))?;
        if frames[0].is_empty() {
            break;
        }
        output.extend_from_slice(&frames[0]);
    }

    output.resize(expected, 0.0);
    Ok(output)
}
