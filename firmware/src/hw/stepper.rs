//! Four-coil stepper drive.
//!
//! The tuner motor sits behind an L298-style H-bridge driven by four GPIO
//! lines. Full-step two-phase excitation keeps the torque high enough to
//! drag the tuning capacitor; one step call advances the excitation pattern
//! by one entry.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

#[cfg(target_os = "none")]
use embassy_stm32::gpio::Output;

use tuner_core::tuner::StepDirection;
#[cfg(target_os = "none")]
use tuner_core::tuner::StepperDriver;

/// Full-step two-phase excitation sequence, one row per phase.
const COIL_SEQUENCE: [[bool; 4]; 4] = [
    [true, true, false, false],
    [false, true, true, false],
    [false, false, true, true],
    [true, false, false, true],
];

/// Coil pattern for a phase index.
pub(crate) const fn coil_pattern(phase: u8) -> [bool; 4] {
    COIL_SEQUENCE[(phase & 0x03) as usize]
}

/// Advances the phase index one entry in the requested direction.
pub(crate) const fn next_phase(phase: u8, direction: StepDirection) -> u8 {
    match direction {
        StepDirection::Cw => (phase + 1) % 4,
        StepDirection::Ccw => (phase + 3) % 4,
    }
}

/// GPIO-backed stepper driver for the tuner motor.
#[cfg(target_os = "none")]
pub struct CoilStepper<'d> {
    coils: [Output<'d>; 4],
    phase: u8,
}

#[cfg(target_os = "none")]
impl<'d> CoilStepper<'d> {
    /// Creates the driver with the coils released.
    pub fn new(coils: [Output<'d>; 4]) -> Self {
        let mut stepper = Self { coils, phase: 0 };
        stepper.set_coils([false; 4]);
        stepper
    }

    fn set_coils(&mut self, pattern: [bool; 4]) {
        for (coil, energized) in self.coils.iter_mut().zip(pattern) {
            if energized {
                coil.set_high();
            } else {
                coil.set_low();
            }
        }
    }
}

#[cfg(target_os = "none")]
impl StepperDriver for CoilStepper<'_> {
    fn step(&mut self, direction: StepDirection) {
        self.phase = next_phase(self.phase, direction);
        self.set_coils(coil_pattern(self.phase));
    }

    fn release(&mut self) {
        self.set_coils([false; 4]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_energizes_two_adjacent_coils() {
        for phase in 0..4u8 {
            let pattern = coil_pattern(phase);
            let energized = pattern.iter().filter(|&&coil| coil).count();
            assert_eq!(energized, 2, "phase {phase}");
        }
    }

    #[test]
    fn phase_wraps_in_both_directions() {
        assert_eq!(next_phase(3, StepDirection::Cw), 0);
        assert_eq!(next_phase(0, StepDirection::Ccw), 3);
    }

    #[test]
    fn one_step_each_way_returns_to_start() {
        let start = 2u8;
        let forward = next_phase(start, StepDirection::Cw);
        assert_eq!(next_phase(forward, StepDirection::Ccw), start);
    }
}
