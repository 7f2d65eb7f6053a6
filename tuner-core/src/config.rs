//! Compile-time configuration shared by every target.
//!
//! There is no runtime configuration surface: pin numbers live in the
//! firmware crate, everything else is a constant here. All state is volatile
//! and the sweep range must be re-programmed after every power cycle.

/// Steps per revolution, according to the motor specifications.
pub const STEPS_PER_REV: u16 = 200;

/// Preset tuner stepper speed in RPM.
pub const STEPPER_SPEED_RPM: u16 = 90;

/// Motor steps per rotary encoder detent. Encoder deltas are scaled by this
/// increment before they reach the sweep state machine.
pub const STEPPER_INCREMENT: i32 = 100;

/// Index of the encoder reading inside a debounce window that is treated as
/// valid (0-based, so `1` keeps only the second reading). Earlier readings in
/// the window are discarded, not accumulated.
pub const ENCODER_VALID_READING: u8 = 1;

/// Number of synth channels on the sound module.
pub const SYNTH_CHANNELS: usize = 3;

/// Depth of the input event queue between the platform layer and the tick
/// loop.
pub const INPUT_QUEUE_DEPTH: usize = 16;

/// Events retained by the in-memory event ring.
pub const EVENT_RING_CAPACITY: usize = 64;

/// Scheduler tick period in milliseconds. One tick advances the sweep by at
/// most one motor increment.
pub const TICK_PERIOD_MS: u64 = 10;
