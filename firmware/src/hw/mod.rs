//! Hardware bindings for the control surface and the actuators.
//!
//! Pin assignments live with the structs that own them; everything electrical
//! stays behind `target_os = "none"` so the crate still builds and unit-tests
//! on the host.

pub mod stepper;

#[cfg(target_os = "none")]
pub mod synth;

#[cfg(target_os = "none")]
use embassy_stm32::gpio::Input;

#[cfg(target_os = "none")]
use tuner_core::config::SYNTH_CHANNELS;
#[cfg(target_os = "none")]
use tuner_core::input::Level;

#[cfg(target_os = "none")]
use crate::panel::SwitchSample;

/// Input pins for the encoder, the two buttons, and the panel switches.
///
/// Buttons and switches are wired active-low with the internal pull-ups, so a
/// low level means pressed/on; mode switches read low in the PWM position.
#[cfg(target_os = "none")]
pub struct ControlSurface<'d> {
    encoder_clk: Input<'d>,
    encoder_data: Input<'d>,
    select_button: Input<'d>,
    loop_button: Input<'d>,
    mode_switches: [Input<'d>; SYNTH_CHANNELS],
    enable_switches: [Input<'d>; SYNTH_CHANNELS],
    sound_switch: Input<'d>,
}

#[cfg(target_os = "none")]
impl<'d> ControlSurface<'d> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        encoder_clk: Input<'d>,
        encoder_data: Input<'d>,
        select_button: Input<'d>,
        loop_button: Input<'d>,
        mode_switches: [Input<'d>; SYNTH_CHANNELS],
        enable_switches: [Input<'d>; SYNTH_CHANNELS],
        sound_switch: Input<'d>,
    ) -> Self {
        Self {
            encoder_clk,
            encoder_data,
            select_button,
            loop_button,
            mode_switches,
            enable_switches,
            sound_switch,
        }
    }

    /// Samples the encoder CLK/DATA pair.
    pub fn encoder_levels(&self) -> (bool, bool) {
        (self.encoder_clk.is_high(), self.encoder_data.is_high())
    }

    /// Samples the SELECT button level.
    pub fn select_level(&self) -> Level {
        Level::from_high(self.select_button.is_high())
    }

    /// Samples the LOOP button level.
    pub fn loop_level(&self) -> Level {
        Level::from_high(self.loop_button.is_high())
    }

    /// Samples every panel switch in one pass.
    ///
    /// Switches are active-low, so the sample records the inverted level.
    pub fn scan(&self) -> SwitchSample {
        let mut mode = [false; SYNTH_CHANNELS];
        let mut enable = [false; SYNTH_CHANNELS];
        for (level, pin) in mode.iter_mut().zip(self.mode_switches.iter()) {
            *level = pin.is_low();
        }
        for (level, pin) in enable.iter_mut().zip(self.enable_switches.iter()) {
            *level = pin.is_low();
        }

        SwitchSample {
            mode,
            enable,
            sound_on: self.sound_switch.is_low(),
        }
    }
}
