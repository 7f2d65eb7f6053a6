//! Panel switch scanning.
//!
//! The scan path samples every switch each poll and diffs successive samples
//! into transitions. Only transitions are forwarded to the controller; the
//! arbiter decides whether they apply directly or force a hand-back from the
//! remote client.

use heapless::Vec;
use tuner_core::arbiter::{PanelEvent, SynthChannel, SynthId, SynthMode, SynthSettings};
use tuner_core::config::SYNTH_CHANNELS;

/// Upper bound on transitions a single scan pass can produce.
pub const MAX_PANEL_EVENTS: usize = 2 * SYNTH_CHANNELS + 1;

/// Raw switch levels captured in one scan pass.
///
/// Mode switches read high in the wave position; enable and sound switches
/// read high when on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SwitchSample {
    pub mode: [bool; SYNTH_CHANNELS],
    pub enable: [bool; SYNTH_CHANNELS],
    pub sound_on: bool,
}

impl SwitchSample {
    /// Maps the raw levels into a settings image.
    #[must_use]
    pub fn settings(&self) -> SynthSettings {
        let mut channels = [SynthChannel::boot_default(); SYNTH_CHANNELS];
        for (index, channel) in channels.iter_mut().enumerate() {
            channel.mode = mode_from_level(self.mode[index]);
            channel.enabled = self.enable[index];
        }
        SynthSettings {
            channels,
            sound_on: self.sound_on,
        }
    }
}

/// Diffs successive switch scans into panel transitions.
pub struct PanelScanner {
    last: SwitchSample,
}

impl PanelScanner {
    /// Creates a scanner seeded with the boot-time sample.
    #[must_use]
    pub const fn new(initial: SwitchSample) -> Self {
        Self { last: initial }
    }

    /// Settings image of the most recent sample.
    #[must_use]
    pub fn settings(&self) -> SynthSettings {
        self.last.settings()
    }

    /// Compares a fresh sample against the previous one, emitting one event
    /// per moved switch.
    pub fn diff(&mut self, sample: SwitchSample) -> Vec<PanelEvent, MAX_PANEL_EVENTS> {
        let mut transitions = Vec::new();

        for id in SynthId::ALL {
            let index = id.as_index();
            if sample.mode[index] != self.last.mode[index] {
                let _ = transitions.push(PanelEvent::Mode(id, mode_from_level(sample.mode[index])));
            }
            if sample.enable[index] != self.last.enable[index] {
                let _ = transitions.push(PanelEvent::Enable(id, sample.enable[index]));
            }
        }
        if sample.sound_on != self.last.sound_on {
            let _ = transitions.push(PanelEvent::SoundOn(sample.sound_on));
        }

        self.last = sample;
        transitions
    }
}

const fn mode_from_level(high: bool) -> SynthMode {
    if high { SynthMode::Wave } else { SynthMode::Pwm }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ON: SwitchSample = SwitchSample {
        mode: [true; SYNTH_CHANNELS],
        enable: [true; SYNTH_CHANNELS],
        sound_on: true,
    };

    #[test]
    fn sample_maps_to_settings() {
        let mut sample = ALL_ON;
        sample.mode[1] = false;
        sample.enable[2] = false;

        let settings = sample.settings();
        assert_eq!(settings.channel(SynthId::One).mode, SynthMode::Wave);
        assert_eq!(settings.channel(SynthId::Two).mode, SynthMode::Pwm);
        assert!(!settings.channel(SynthId::Three).enabled);
        assert!(settings.sound_on);
    }

    #[test]
    fn unchanged_scan_produces_no_transitions() {
        let mut scanner = PanelScanner::new(ALL_ON);
        assert!(scanner.diff(ALL_ON).is_empty());
    }

    #[test]
    fn each_moved_switch_produces_one_transition() {
        let mut scanner = PanelScanner::new(ALL_ON);

        let mut sample = ALL_ON;
        sample.mode[0] = false;
        sample.sound_on = false;

        let transitions = scanner.diff(sample);
        assert_eq!(transitions.len(), 2);
        assert_eq!(
            transitions[0],
            PanelEvent::Mode(SynthId::One, SynthMode::Pwm)
        );
        assert_eq!(transitions[1], PanelEvent::SoundOn(false));

        // The sample becomes the new baseline.
        assert!(scanner.diff(sample).is_empty());
    }
}
