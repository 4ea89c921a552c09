use std::f32::consts::PI;
use std::time::Duration;

pub const CHIME_SAMPLE_RATE: u32 = 44_100;
pub const FIRST_TONE_HZ: f32 = 800.0;
pub const SECOND_TONE_HZ: f32 = 1_000.0;
pub const TONE_DURATION: Duration = Duration::from_millis(100);

const START_GAIN: f32 = 0.3;
const END_GAIN: f32 = 0.01;

/// Two short sine tones played back to back, each decaying exponentially.
/// Mono, finite: 200 ms in total.
pub struct TwoToneChime {
    sample_rate: u32,
    tone_samples: usize,
    num_sample: usize,
}

impl TwoToneChime {
    pub fn new() -> Self {
        let tone_samples =
            (CHIME_SAMPLE_RATE as u64 * TONE_DURATION.as_millis() as u64 / 1_000) as usize;
        Self {
            sample_rate: CHIME_SAMPLE_RATE,
            tone_samples,
            num_sample: 0,
        }
    }

    pub fn total_samples(&self) -> usize {
        self.tone_samples * 2
    }

    fn remaining(&self) -> usize {
        self.total_samples().saturating_sub(self.num_sample)
    }
}

impl Default for TwoToneChime {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for TwoToneChime {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples() {
            return None;
        }

        let (freq, index) = if self.num_sample < self.tone_samples {
            (FIRST_TONE_HZ, self.num_sample)
        } else {
            (SECOND_TONE_HZ, self.num_sample - self.tone_samples)
        };
        self.num_sample += 1;

        let t = index as f32 / self.sample_rate as f32;
        let progress = index as f32 / self.tone_samples as f32;
        let gain = START_GAIN * (END_GAIN / START_GAIN).powf(progress);

        Some((2.0 * PI * freq * t).sin() * gain)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TwoToneChime {}

#[cfg(feature = "audio")]
impl rodio::Source for TwoToneChime {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.remaining())
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(TONE_DURATION * 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_crossings(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|pair| (pair[0] <= 0.0) != (pair[1] <= 0.0))
            .count()
    }

    #[test]
    fn lasts_two_hundred_milliseconds() {
        let chime = TwoToneChime::new();
        assert_eq!(chime.total_samples(), 8_820);
        assert_eq!(chime.len(), 8_820);
        assert_eq!(TwoToneChime::new().count(), 8_820);
    }

    #[test]
    fn stays_within_starting_gain() {
        let samples: Vec<f32> = TwoToneChime::new().collect();
        assert_eq!(samples[0], 0.0);
        assert!(samples.iter().all(|s| s.abs() <= START_GAIN + f32::EPSILON));
    }

    #[test]
    fn each_tone_decays() {
        let samples: Vec<f32> = TwoToneChime::new().collect();
        let (first, second) = samples.split_at(4_410);

        let peak = |slice: &[f32]| slice.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        assert!(peak(&first[..441]) > 0.2);
        assert!(peak(&first[first.len() - 441..]) < 0.02);
        assert!(peak(&second[..441]) > 0.2);
        assert!(peak(&second[second.len() - 441..]) < 0.02);
    }

    #[test]
    fn second_tone_is_higher() {
        let samples: Vec<f32> = TwoToneChime::new().collect();
        let (first, second) = samples.split_at(4_410);

        // A 100 ms sine crosses zero about twice per cycle.
        let low = zero_crossings(first);
        let high = zero_crossings(second);
        assert!((155..=165).contains(&low), "800 Hz crossings: {low}");
        assert!((195..=205).contains(&high), "1000 Hz crossings: {high}");
    }
}
