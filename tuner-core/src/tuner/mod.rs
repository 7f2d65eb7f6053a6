//! Tuner sweep programming and looping.
//!
//! The sweep range is captured with two SELECT presses: the first press arms
//! the capture, encoder deltas then accumulate algebraically, and the second
//! press commits the range. Once programmed, the loop driver walks the
//! stepper back and forth between the captured bounds, one increment per
//! scheduler tick, reversing exactly at each bound.

use crate::config::STEPPER_INCREMENT;
use crate::events::IgnoredReason;

/// Calibration phases for the sweep range capture.
///
/// The phases are mutually exclusive by construction; a programmed tuner can
/// never simultaneously be mid-selection.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CalibrationPhase {
    /// Waiting for the first SELECT press.
    Idle,
    /// Accumulating encoder deltas until the second SELECT press.
    Selecting,
    /// Bounds are valid and the loop driver may run.
    Programmed,
}

/// Direction of a single motor step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StepDirection {
    Cw,
    Ccw,
}

/// Direction the loop driver is currently sweeping.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LoopDirection {
    Cw,
    Ccw,
    /// No sweep in progress.
    Idle,
}

impl LoopDirection {
    /// Signed multiplier applied to the step increment.
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            LoopDirection::Cw => 1,
            LoopDirection::Ccw => -1,
            LoopDirection::Idle => 0,
        }
    }

    /// Physical step direction, when a sweep is in progress.
    #[must_use]
    pub const fn step(self) -> Option<StepDirection> {
        match self {
            LoopDirection::Cw => Some(StepDirection::Cw),
            LoopDirection::Ccw => Some(StepDirection::Ccw),
            LoopDirection::Idle => None,
        }
    }
}

/// Abstraction over the physical stepper driver.
///
/// The loop driver is the motor's sole writer; implementations only translate
/// step requests into coil activity.
pub trait StepperDriver {
    /// Advances the motor one physical step in `direction`.
    fn step(&mut self, direction: StepDirection);

    /// Releases the coils so the motor can freewheel.
    fn release(&mut self);
}

/// Stepper driver that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopStepperDriver;

impl NoopStepperDriver {
    /// Creates a new no-op stepper driver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl StepperDriver for NoopStepperDriver {
    fn step(&mut self, _: StepDirection) {}

    fn release(&mut self) {}
}

/// Outcome of a SELECT press.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SelectOutcome {
    /// A fresh capture started; deltas accumulate from zero.
    SelectionStarted,
    /// The capture committed with the normalized bounds.
    Programmed { min: i32, max: i32 },
    /// The capture collapsed to a zero-width range and was abandoned.
    InvalidCalibration,
}

/// Outcome of a loop start/stop request.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LoopRequest {
    /// The sweep loop started.
    Started,
    /// The sweep loop halted; calibration is preserved.
    Halted,
    /// The request was dropped; visible only through status queries.
    Ignored(IgnoredReason),
    /// The request matched the current state and changed nothing.
    Unchanged,
}

/// Result of one loop-driver tick that moved the motor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SweepStep {
    /// Direction the motor was stepped.
    pub direction: StepDirection,
    /// Set when this step landed on a sweep bound and reversed the sweep.
    pub reversed_to: Option<StepDirection>,
}

/// Sweep state for the motorized tuner.
///
/// Single instance, owned by the controller for the process lifetime; mode
/// transitions reset it in place. Everything is volatile, so the range must
/// be re-programmed after a power cycle.
#[derive(Copy, Clone, Debug)]
pub struct TunerState {
    phase: CalibrationPhase,
    position: i32,
    loop_direction: LoopDirection,
    loop_steps: i32,
    min_steps: i32,
    max_steps: i32,
    looping: bool,
}

impl TunerState {
    /// Creates an unprogrammed tuner at the idle phase.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: CalibrationPhase::Idle,
            position: 0,
            loop_direction: LoopDirection::Idle,
            loop_steps: 0,
            min_steps: 0,
            max_steps: 0,
            looping: false,
        }
    }

    /// Current calibration phase.
    #[must_use]
    pub const fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    /// Returns `true` once a sweep range has been committed.
    #[must_use]
    pub const fn is_programmed(&self) -> bool {
        matches!(self.phase, CalibrationPhase::Programmed)
    }

    /// Returns `true` while a capture is in progress.
    #[must_use]
    pub const fn is_selecting(&self) -> bool {
        matches!(self.phase, CalibrationPhase::Selecting)
    }

    /// Returns `true` while the loop driver is sweeping.
    #[must_use]
    pub const fn is_looping(&self) -> bool {
        self.looping
    }

    /// Current signed offset from the captured start point.
    #[must_use]
    pub const fn position(&self) -> i32 {
        self.position
    }

    /// Current sweep direction.
    #[must_use]
    pub const fn loop_direction(&self) -> LoopDirection {
        self.loop_direction
    }

    /// Accumulated signed delta; the sweep width once programmed.
    #[must_use]
    pub const fn loop_steps(&self) -> i32 {
        self.loop_steps
    }

    /// Normalized sweep bounds, valid once programmed.
    #[must_use]
    pub const fn bounds(&self) -> Option<(i32, i32)> {
        if self.is_programmed() {
            Some((self.min_steps, self.max_steps))
        } else {
            None
        }
    }

    /// Lower sweep bound; zero until programmed.
    #[must_use]
    pub const fn min_steps(&self) -> i32 {
        self.min_steps
    }

    /// Upper sweep bound; zero until programmed.
    #[must_use]
    pub const fn max_steps(&self) -> i32 {
        self.max_steps
    }

    /// Handles a SELECT press, advancing the calibration state machine.
    ///
    /// A press while programmed discards the committed range and any
    /// in-flight loop, then starts a fresh capture. A commit with zero
    /// accumulated deltas is invalid and reverts to idle rather than
    /// programming a stalled zero-width sweep.
    pub fn press_select(&mut self) -> SelectOutcome {
        match self.phase {
            CalibrationPhase::Idle => {
                self.begin_selection();
                SelectOutcome::SelectionStarted
            }
            CalibrationPhase::Selecting => {
                if self.loop_steps == 0 {
                    self.phase = CalibrationPhase::Idle;
                    SelectOutcome::InvalidCalibration
                } else {
                    // Sign-normalize so min <= max; the sweep always starts
                    // from the captured start point going clockwise.
                    let width = if self.loop_steps > 0 {
                        self.loop_steps
                    } else {
                        -self.loop_steps
                    };
                    self.min_steps = 0;
                    self.max_steps = width;
                    self.position = 0;
                    self.loop_direction = LoopDirection::Idle;
                    self.phase = CalibrationPhase::Programmed;
                    SelectOutcome::Programmed {
                        min: self.min_steps,
                        max: self.max_steps,
                    }
                }
            }
            CalibrationPhase::Programmed => {
                self.halt_loop();
                self.begin_selection();
                SelectOutcome::SelectionStarted
            }
        }
    }

    /// Adds a conditioned encoder delta to the pending sweep width.
    ///
    /// Deltas are only meaningful while selecting; outside the capture they
    /// are dropped and `false` is returned.
    pub fn apply_delta(&mut self, steps: i32) -> bool {
        if self.is_selecting() {
            self.loop_steps = self.loop_steps.saturating_add(steps);
            true
        } else {
            false
        }
    }

    /// Starts or halts the sweep loop.
    ///
    /// Starting before the range is programmed is dropped as a no-op; the
    /// serving layer surfaces that through status queries, not the core.
    /// Halting preserves the calibration.
    pub fn request_loop(&mut self, enable: bool) -> LoopRequest {
        if enable {
            if !self.is_programmed() {
                return LoopRequest::Ignored(IgnoredReason::NotProgrammed);
            }
            if self.looping {
                return LoopRequest::Unchanged;
            }
            self.looping = true;
            self.loop_direction = if self.position >= self.max_steps {
                LoopDirection::Ccw
            } else {
                LoopDirection::Cw
            };
            LoopRequest::Started
        } else if self.looping {
            self.halt_loop();
            LoopRequest::Halted
        } else {
            LoopRequest::Unchanged
        }
    }

    /// Advances the sweep by one increment, stepping the motor.
    ///
    /// Returns `None` while no sweep is in progress. The position is bounded
    /// by the programmed range and the direction flips exactly when a bound
    /// is reached.
    pub fn tick<D: StepperDriver>(&mut self, driver: &mut D) -> Option<SweepStep> {
        if !self.looping {
            return None;
        }

        let direction = self.loop_direction.step()?;
        driver.step(direction);
        self.position += self.loop_direction.sign() * STEPPER_INCREMENT;

        let mut reversed_to = None;
        if self.position >= self.max_steps {
            self.position = self.max_steps;
            self.loop_direction = LoopDirection::Ccw;
            if direction == StepDirection::Cw {
                reversed_to = Some(StepDirection::Ccw);
            }
        } else if self.position <= self.min_steps {
            self.position = self.min_steps;
            self.loop_direction = LoopDirection::Cw;
            if direction == StepDirection::Ccw {
                reversed_to = Some(StepDirection::Cw);
            }
        }

        Some(SweepStep {
            direction,
            reversed_to,
        })
    }

    fn begin_selection(&mut self) {
        self.phase = CalibrationPhase::Selecting;
        self.loop_steps = 0;
        self.min_steps = 0;
        self.max_steps = 0;
        self.position = 0;
    }

    fn halt_loop(&mut self) {
        self.looping = false;
        self.loop_direction = LoopDirection::Idle;
    }
}

impl Default for TunerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_press_arms_selection() {
        let mut tuner = TunerState::new();

        assert_eq!(tuner.press_select(), SelectOutcome::SelectionStarted);
        assert!(tuner.is_selecting());
        assert_eq!(tuner.loop_steps(), 0);
    }

    #[test]
    fn zero_width_commit_reverts_to_idle() {
        let mut tuner = TunerState::new();

        tuner.press_select();
        assert_eq!(tuner.press_select(), SelectOutcome::InvalidCalibration);
        assert_eq!(tuner.phase(), CalibrationPhase::Idle);
        assert!(!tuner.is_programmed());
    }

    #[test]
    fn negative_capture_normalizes_bounds() {
        let mut tuner = TunerState::new();

        tuner.press_select();
        tuner.apply_delta(-STEPPER_INCREMENT);
        tuner.apply_delta(-STEPPER_INCREMENT);
        assert_eq!(
            tuner.press_select(),
            SelectOutcome::Programmed {
                min: 0,
                max: 2 * STEPPER_INCREMENT
            }
        );
        assert_eq!(tuner.bounds(), Some((0, 2 * STEPPER_INCREMENT)));
    }

    #[test]
    fn deltas_outside_selection_are_dropped() {
        let mut tuner = TunerState::new();

        assert!(!tuner.apply_delta(STEPPER_INCREMENT));
        tuner.press_select();
        assert!(tuner.apply_delta(STEPPER_INCREMENT));
        tuner.press_select();
        assert!(!tuner.apply_delta(STEPPER_INCREMENT));
        assert_eq!(tuner.bounds(), Some((0, STEPPER_INCREMENT)));
    }

    #[test]
    fn loop_start_before_programming_is_ignored() {
        let mut tuner = TunerState::new();

        assert_eq!(
            tuner.request_loop(true),
            LoopRequest::Ignored(IgnoredReason::NotProgrammed)
        );
        assert!(!tuner.is_looping());
    }

    #[test]
    fn repress_while_programmed_discards_loop() {
        let mut tuner = TunerState::new();

        tuner.press_select();
        tuner.apply_delta(STEPPER_INCREMENT);
        tuner.press_select();
        assert_eq!(tuner.request_loop(true), LoopRequest::Started);

        assert_eq!(tuner.press_select(), SelectOutcome::SelectionStarted);
        assert!(!tuner.is_looping());
        assert!(!tuner.is_programmed());
        assert_eq!(tuner.loop_direction(), LoopDirection::Idle);
    }

    #[test]
    fn halt_preserves_calibration() {
        let mut tuner = TunerState::new();

        tuner.press_select();
        tuner.apply_delta(STEPPER_INCREMENT);
        tuner.press_select();
        tuner.request_loop(true);
        assert_eq!(tuner.request_loop(false), LoopRequest::Halted);
        assert!(tuner.is_programmed());
        assert_eq!(tuner.bounds(), Some((0, STEPPER_INCREMENT)));
    }

    #[test]
    fn redundant_requests_change_nothing() {
        let mut tuner = TunerState::new();

        assert_eq!(tuner.request_loop(false), LoopRequest::Unchanged);
        tuner.press_select();
        tuner.apply_delta(STEPPER_INCREMENT);
        tuner.press_select();
        tuner.request_loop(true);
        assert_eq!(tuner.request_loop(true), LoopRequest::Unchanged);
    }
}
