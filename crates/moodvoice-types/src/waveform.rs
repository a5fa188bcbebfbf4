use serde::{Deserialize, Serialize};

/// Mono audio: samples in \[-1.0, 1.0\] plus a sample rate in Hz.
///
/// Treated as a value. Every processing stage takes a `Waveform` and
/// returns a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Replaces the samples, keeping the sample rate.
    pub fn with_samples(&self, samples: Vec<f32>) -> Self {
        Self::new(samples, self.sample_rate)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds. Zero when the sample rate is zero.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Maximum absolute sample value, or 0.0 for an empty waveform.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_sample_count_over_rate() {
        let wave = Waveform::new(vec![0.0; 22_050], 22_050);
        assert!((wave.duration_seconds() - 1.0).abs() < 1e-12);

        let wave = Waveform::new(vec![0.0; 11_025], 22_050);
        assert!((wave.duration_seconds() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn zero_rate_has_zero_duration() {
        assert_eq!(Waveform::new(vec![0.1; 10], 0).duration_seconds(), 0.0);
    }

    #[test]
    fn peak_ignores_sign() {
        let wave = Waveform::new(vec![0.2, -0.7, 0.5], 16_000);
        assert_eq!(wave.peak(), 0.7);
        assert_eq!(Waveform::new(Vec::new(), 16_000).peak(), 0.0);
    }

    #[test]
    fn with_samples_keeps_rate() {
        let wave = Waveform::new(vec![1.0], 24_000);
        let next = wave.with_samples(vec![0.5, 0.5]);
        assert_eq!(next.sample_rate, 24_000);
        assert_eq!(next.len(), 2);
        assert_eq!(wave.len(), 1);
    }
}
