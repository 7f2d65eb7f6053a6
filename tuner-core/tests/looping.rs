use tuner_core::arbiter::{NoopSynthDriver, SynthSettings};
use tuner_core::command::RemoteCommand;
use tuner_core::config::STEPPER_INCREMENT;
use tuner_core::events::{ControlEvent, IgnoredReason};
use tuner_core::input::{ButtonId, DebouncePolicy, EncoderPulse};
use tuner_core::status::StatusProvider;
use tuner_core::tuner::{StepDirection, StepperDriver};

/// Stepper double that records every issued step.
#[derive(Default)]
struct RecordingStepper {
    steps: Vec<StepDirection>,
    releases: usize,
}

impl StepperDriver for RecordingStepper {
    fn step(&mut self, direction: StepDirection) {
        self.steps.push(direction);
    }

    fn release(&mut self) {
        self.releases += 1;
    }
}

type Controller = tuner_core::controller::TunerController<u64, RecordingStepper, NoopSynthDriver>;

fn controller() -> Controller {
    Controller::new(
        DebouncePolicy::new(0),
        SynthSettings::boot_defaults(),
        RecordingStepper::default(),
        NoopSynthDriver::new(),
    )
}

fn program(controller: &mut Controller, detents: usize) {
    controller.on_button_press(ButtonId::Select).unwrap();
    for _ in 0..detents {
        controller.on_encoder_pulse(EncoderPulse::Clockwise).unwrap();
    }
    controller.on_button_press(ButtonId::Select).unwrap();
    controller.tick(0);
    assert!(controller.tuner_snapshot().phase == tuner_core::tuner::CalibrationPhase::Programmed);
}

#[test]
fn tune_before_programming_never_steps() {
    let mut controller = controller();

    controller
        .on_remote_command(RemoteCommand::WebControl(true))
        .unwrap();
    controller
        .on_remote_command(RemoteCommand::Tune(true))
        .unwrap();
    controller.tick(0);

    let snapshot = controller.tuner_snapshot();
    assert!(!snapshot.looping);
    assert!(controller.stepper().steps.is_empty());
    assert_eq!(
        controller.events().latest().unwrap().event,
        ControlEvent::CommandIgnored(IgnoredReason::NotProgrammed)
    );
}

#[test]
fn loop_button_before_programming_never_steps() {
    let mut controller = controller();

    controller.on_button_press(ButtonId::Loop).unwrap();
    controller.tick(0);

    assert!(!controller.tuner_snapshot().looping);
    assert!(controller.stepper().steps.is_empty());
}

#[test]
fn sweep_reverses_exactly_at_bounds() {
    let mut controller = controller();
    program(&mut controller, 3);

    controller.on_button_press(ButtonId::Loop).unwrap();
    let mut positions = Vec::new();
    for now in 1..=7u64 {
        controller.tick(now);
        positions.push(controller.tuner_snapshot().position);
    }

    assert_eq!(
        positions,
        vec![
            STEPPER_INCREMENT,
            2 * STEPPER_INCREMENT,
            3 * STEPPER_INCREMENT,
            2 * STEPPER_INCREMENT,
            STEPPER_INCREMENT,
            0,
            STEPPER_INCREMENT,
        ]
    );
    assert_eq!(
        controller.stepper().steps,
        vec![
            StepDirection::Cw,
            StepDirection::Cw,
            StepDirection::Cw,
            StepDirection::Ccw,
            StepDirection::Ccw,
            StepDirection::Ccw,
            StepDirection::Cw,
        ]
    );

    let reversals: Vec<_> = controller
        .events()
        .oldest_first()
        .filter_map(|record| match record.event {
            ControlEvent::BoundReached(direction) => Some((record.timestamp, direction)),
            _ => None,
        })
        .collect();
    assert_eq!(reversals, vec![(3, StepDirection::Ccw), (6, StepDirection::Cw)]);
}

#[test]
fn position_never_leaves_programmed_range() {
    let mut controller = controller();
    program(&mut controller, 3);

    controller.on_button_press(ButtonId::Loop).unwrap();
    for now in 1..=50u64 {
        controller.tick(now);
        let snapshot = controller.tuner_snapshot();
        assert!(snapshot.position >= snapshot.min_steps);
        assert!(snapshot.position <= snapshot.max_steps);
    }
}

#[test]
fn halt_is_immediate_and_preserves_calibration() {
    let mut controller = controller();
    program(&mut controller, 3);

    controller
        .on_remote_command(RemoteCommand::WebControl(true))
        .unwrap();
    controller
        .on_remote_command(RemoteCommand::Tune(true))
        .unwrap();
    controller.tick(1);
    controller.tick(2);

    let steps_before = controller.stepper().steps.len();
    controller
        .on_remote_command(RemoteCommand::Tune(false))
        .unwrap();
    controller.tick(3);
    controller.tick(4);

    let snapshot = controller.tuner_snapshot();
    assert!(!snapshot.looping);
    assert_eq!(snapshot.phase, tuner_core::tuner::CalibrationPhase::Programmed);
    assert_eq!(snapshot.position, 2 * STEPPER_INCREMENT);
    // The halt tick consumes the command before advancing, so no extra step
    // sneaks out.
    assert_eq!(controller.stepper().steps.len(), steps_before);
    assert!(controller.stepper().releases >= 1);
    assert_eq!(
        controller.events().latest().unwrap().event,
        ControlEvent::LoopHalted
    );
}

#[test]
fn restart_from_max_bound_sweeps_counter_clockwise() {
    let mut controller = controller();
    program(&mut controller, 2);

    controller.on_button_press(ButtonId::Loop).unwrap();
    controller.tick(1);
    controller.tick(2);
    assert_eq!(
        controller.tuner_snapshot().position,
        2 * STEPPER_INCREMENT
    );

    controller.on_button_press(ButtonId::Loop).unwrap();
    controller.tick(3);
    assert!(!controller.tuner_snapshot().looping);

    controller.on_button_press(ButtonId::Loop).unwrap();
    controller.tick(4);
    let snapshot = controller.tuner_snapshot();
    assert_eq!(snapshot.position, STEPPER_INCREMENT);
    assert_eq!(
        controller.stepper().steps.last().copied(),
        Some(StepDirection::Ccw)
    );
}

#[test]
fn negative_capture_still_sweeps_clockwise_first() {
    let mut controller = controller();

    controller.on_button_press(ButtonId::Select).unwrap();
    for _ in 0..2 {
        controller
            .on_encoder_pulse(EncoderPulse::CounterClockwise)
            .unwrap();
    }
    controller.on_button_press(ButtonId::Select).unwrap();
    controller.tick(0);

    controller.on_button_press(ButtonId::Loop).unwrap();
    controller.tick(1);

    assert_eq!(controller.stepper().steps, vec![StepDirection::Cw]);
    assert_eq!(controller.tuner_snapshot().position, STEPPER_INCREMENT);
}

#[test]
fn loop_button_toggles_sweep() {
    let mut controller = controller();
    program(&mut controller, 3);

    controller.on_button_press(ButtonId::Loop).unwrap();
    controller.tick(1);
    assert!(controller.tuner_snapshot().looping);

    controller.on_button_press(ButtonId::Loop).unwrap();
    controller.tick(2);
    assert!(!controller.tuner_snapshot().looping);
}
