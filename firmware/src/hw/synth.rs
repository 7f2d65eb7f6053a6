//! Control lines into the synth sound module.
//!
//! The module itself generates the audio; the controller only drives its
//! mode, enable, and master sound lines to match the active settings image.
//! Mode lines read high for wave, low for PWM; enable and sound lines are
//! high when on.

use embassy_stm32::gpio::Output;

use tuner_core::arbiter::{SynthDriver, SynthId, SynthMode, SynthSettings};
use tuner_core::config::SYNTH_CHANNELS;

/// GPIO-backed driver for the sound module's control lines.
pub struct SynthControlLines<'d> {
    mode_lines: [Output<'d>; SYNTH_CHANNELS],
    enable_lines: [Output<'d>; SYNTH_CHANNELS],
    sound_line: Output<'d>,
}

impl<'d> SynthControlLines<'d> {
    pub fn new(
        mode_lines: [Output<'d>; SYNTH_CHANNELS],
        enable_lines: [Output<'d>; SYNTH_CHANNELS],
        sound_line: Output<'d>,
    ) -> Self {
        Self {
            mode_lines,
            enable_lines,
            sound_line,
        }
    }
}

impl SynthDriver for SynthControlLines<'_> {
    fn apply(&mut self, settings: &SynthSettings) {
        for id in SynthId::ALL {
            let channel = settings.channel(id);
            let index = id.as_index();
            match channel.mode {
                SynthMode::Wave => self.mode_lines[index].set_high(),
                SynthMode::Pwm => self.mode_lines[index].set_low(),
            }
            if channel.enabled {
                self.enable_lines[index].set_high();
            } else {
                self.enable_lines[index].set_low();
            }
        }

        if settings.sound_on {
            self.sound_line.set_high();
        } else {
            self.sound_line.set_low();
        }
    }
}
