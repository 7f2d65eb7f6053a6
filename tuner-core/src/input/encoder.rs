//! Rotary encoder conditioning.
//!
//! Quadrature decoding happens in the platform layer; this module receives
//! one pulse per detected detent and decides which pulses are trusted. Cheap
//! mechanical encoders bounce, so only the n-th reading inside a debounce
//! window is applied and the others are discarded outright. Discarded
//! readings are expected filtering, not errors.

use crate::config::{ENCODER_VALID_READING, STEPPER_INCREMENT};

/// Direction of a single encoder detent.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EncoderPulse {
    Clockwise,
    CounterClockwise,
}

impl EncoderPulse {
    /// Signed unit value of the pulse; clockwise is positive.
    #[must_use]
    pub const fn unit(self) -> i8 {
        match self {
            EncoderPulse::Clockwise => 1,
            EncoderPulse::CounterClockwise => -1,
        }
    }

    /// Builds a pulse from a raw signed reading, if it is non-zero.
    #[must_use]
    pub const fn from_raw(delta: i32) -> Option<Self> {
        if delta > 0 {
            Some(EncoderPulse::Clockwise)
        } else if delta < 0 {
            Some(EncoderPulse::CounterClockwise)
        } else {
            None
        }
    }
}

/// Bounce-rejection policy for encoder readings.
///
/// Readings are counted 0, 1, 2, … within a window; exactly the reading whose
/// index equals `valid_index` is applied, then the window resets. The device
/// default of `1` keeps only the second reading, and `0` disables filtering.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DebouncePolicy {
    valid_index: u8,
}

impl DebouncePolicy {
    /// Creates a policy that applies the reading at `valid_index`.
    #[must_use]
    pub const fn new(valid_index: u8) -> Self {
        Self { valid_index }
    }

    /// Policy matching the device constants.
    #[must_use]
    pub const fn device_default() -> Self {
        Self::new(ENCODER_VALID_READING)
    }

    /// Returns the index of the reading treated as valid.
    #[must_use]
    pub const fn valid_index(&self) -> u8 {
        self.valid_index
    }
}

impl Default for DebouncePolicy {
    fn default() -> Self {
        Self::device_default()
    }
}

/// Outcome of feeding one raw reading through the reader.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EncoderReading {
    /// Reading accepted; carries the step delta scaled by the configured
    /// increment.
    Applied(i32),
    /// Reading discarded by the bounce-rejection policy.
    BounceRejected,
}

/// Conditions raw detent pulses into motor step deltas.
pub struct EncoderReader {
    policy: DebouncePolicy,
    window_index: u8,
    detents: i16,
    rejected: u32,
}

impl EncoderReader {
    /// Creates a reader with the supplied policy.
    #[must_use]
    pub const fn new(policy: DebouncePolicy) -> Self {
        Self {
            policy,
            window_index: 0,
            detents: 0,
            rejected: 0,
        }
    }

    /// Feeds one detent pulse, returning the scaled delta when the reading
    /// survives the bounce filter.
    pub fn feed(&mut self, pulse: EncoderPulse) -> EncoderReading {
        if self.window_index == self.policy.valid_index() {
            self.window_index = 0;
            self.detents = self.detents.wrapping_add(i16::from(pulse.unit()));
            EncoderReading::Applied(i32::from(pulse.unit()) * STEPPER_INCREMENT)
        } else {
            self.window_index = self.window_index.wrapping_add(1);
            self.rejected = self.rejected.wrapping_add(1);
            EncoderReading::BounceRejected
        }
    }

    /// Net count of applied detents since boot, kept only so status queries
    /// can report the last decoded encoder value.
    #[must_use]
    pub const fn detents(&self) -> i16 {
        self.detents
    }

    /// Number of readings discarded by the bounce filter.
    #[must_use]
    pub const fn rejected_count(&self) -> u32 {
        self.rejected
    }
}

impl Default for EncoderReader {
    fn default() -> Self {
        Self::new(DebouncePolicy::device_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_reading_is_applied_by_default() {
        let mut reader = EncoderReader::default();

        assert_eq!(
            reader.feed(EncoderPulse::Clockwise),
            EncoderReading::BounceRejected
        );
        assert_eq!(
            reader.feed(EncoderPulse::Clockwise),
            EncoderReading::Applied(STEPPER_INCREMENT)
        );
        assert_eq!(reader.rejected_count(), 1);
        assert_eq!(reader.detents(), 1);
    }

    #[test]
    fn window_resets_after_each_applied_reading() {
        let mut reader = EncoderReader::default();

        for _ in 0..3 {
            assert_eq!(
                reader.feed(EncoderPulse::CounterClockwise),
                EncoderReading::BounceRejected
            );
            assert_eq!(
                reader.feed(EncoderPulse::CounterClockwise),
                EncoderReading::Applied(-STEPPER_INCREMENT)
            );
        }

        assert_eq!(reader.detents(), -3);
        assert_eq!(reader.rejected_count(), 3);
    }

    #[test]
    fn zero_index_disables_filtering() {
        let mut reader = EncoderReader::new(DebouncePolicy::new(0));

        assert_eq!(
            reader.feed(EncoderPulse::Clockwise),
            EncoderReading::Applied(STEPPER_INCREMENT)
        );
        assert_eq!(
            reader.feed(EncoderPulse::CounterClockwise),
            EncoderReading::Applied(-STEPPER_INCREMENT)
        );
        assert_eq!(reader.rejected_count(), 0);
    }

    #[test]
    fn higher_threshold_discards_more_readings() {
        let mut reader = EncoderReader::new(DebouncePolicy::new(2));

        assert_eq!(
            reader.feed(EncoderPulse::Clockwise),
            EncoderReading::BounceRejected
        );
        assert_eq!(
            reader.feed(EncoderPulse::Clockwise),
            EncoderReading::BounceRejected
        );
        assert_eq!(
            reader.feed(EncoderPulse::Clockwise),
            EncoderReading::Applied(STEPPER_INCREMENT)
        );
    }

    #[test]
    fn pulse_from_raw_reading() {
        assert_eq!(EncoderPulse::from_raw(3), Some(EncoderPulse::Clockwise));
        assert_eq!(
            EncoderPulse::from_raw(-1),
            Some(EncoderPulse::CounterClockwise)
        );
        assert_eq!(EncoderPulse::from_raw(0), None);
    }
}
