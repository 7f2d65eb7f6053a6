//! Tick-loop glue binding inputs, the tuner, and the arbiter together.
//!
//! The controller is driven by a single cooperative tick: each invocation
//! drains the pending input events (consuming every notification exactly
//! once), routes them through the calibration state machine and the control
//! arbiter, then advances the sweep loop by at most one motor step. Nothing
//! here blocks, and both owned state structures are mutated only from this
//! one code path.

use heapless::Deque;

use crate::arbiter::{ControlArbiter, ControlOwner, PanelEvent, SynthDriver, SynthSettings};
use crate::command::RemoteCommand;
use crate::config::INPUT_QUEUE_DEPTH;
use crate::events::{ControlEvent, EventRecorder, IgnoredReason};
use crate::input::{ButtonId, DebouncePolicy, EncoderPulse, EncoderReader, EncoderReading};
use crate::status::{StatusProvider, SynthSnapshot, TunerSnapshot};
use crate::tuner::{LoopRequest, SelectOutcome, StepperDriver, TunerState};

/// Input notifications fed to the controller between ticks.
///
/// The platform layer (interrupt handlers, the switch scan, the bridge UART)
/// produces these; the tick loop consumes them. Encoder pulses are queued
/// individually and never coalesced, so the accumulated delta stays exact.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputEvent {
    /// Decoded encoder detent from the platform quadrature decoder.
    Encoder(EncoderPulse),
    /// Debounced button press.
    Press(ButtonId),
    /// Panel switch transition from the scan path.
    Panel(PanelEvent),
    /// Parsed remote command.
    Remote(RemoteCommand),
}

/// Owns every state structure and drives them from the scheduler tick.
pub struct TunerController<TInstant, D, S, const QUEUE: usize = INPUT_QUEUE_DEPTH>
where
    TInstant: Copy,
    D: StepperDriver,
    S: SynthDriver,
{
    tuner: TunerState,
    arbiter: ControlArbiter,
    encoder: EncoderReader,
    stepper: D,
    synth: S,
    events: EventRecorder<TInstant>,
    pending: Deque<InputEvent, QUEUE>,
}

impl<TInstant, D, S, const QUEUE: usize> TunerController<TInstant, D, S, QUEUE>
where
    TInstant: Copy,
    D: StepperDriver,
    S: SynthDriver,
{
    /// Creates a controller seeded with the boot-time switch scan and pushes
    /// that image out to the sound module.
    pub fn new(policy: DebouncePolicy, boot_scan: SynthSettings, stepper: D, mut synth: S) -> Self {
        synth.apply(&boot_scan);
        Self {
            tuner: TunerState::new(),
            arbiter: ControlArbiter::new(boot_scan),
            encoder: EncoderReader::new(policy),
            stepper,
            synth,
            events: EventRecorder::new(),
            pending: Deque::new(),
        }
    }

    /// Queues an input notification for the next tick.
    ///
    /// Returns the event back when the queue is full; the caller decides
    /// whether dropping it is acceptable.
    pub fn push_event(&mut self, event: InputEvent) -> Result<(), InputEvent> {
        self.pending.push_back(event)
    }

    /// Queues a raw encoder detent.
    pub fn on_encoder_pulse(&mut self, pulse: EncoderPulse) -> Result<(), InputEvent> {
        self.push_event(InputEvent::Encoder(pulse))
    }

    /// Queues a debounced button press.
    pub fn on_button_press(&mut self, button: ButtonId) -> Result<(), InputEvent> {
        self.push_event(InputEvent::Press(button))
    }

    /// Queues a parsed remote command.
    pub fn on_remote_command(&mut self, command: RemoteCommand) -> Result<(), InputEvent> {
        self.push_event(InputEvent::Remote(command))
    }

    /// Queues a panel switch transition.
    pub fn on_panel_switch_change(&mut self, event: PanelEvent) -> Result<(), InputEvent> {
        self.push_event(InputEvent::Panel(event))
    }

    /// Runs one scheduler tick: drain inputs, then advance the sweep by at
    /// most one motor step.
    pub fn tick(&mut self, now: TInstant) {
        let settings_before = *self.arbiter.settings();

        while let Some(event) = self.pending.pop_front() {
            match event {
                InputEvent::Encoder(pulse) => self.handle_encoder(pulse),
                InputEvent::Press(button) => self.handle_press(button, now),
                InputEvent::Panel(panel) => self.handle_panel(panel, now),
                InputEvent::Remote(command) => self.handle_remote(command, now),
            }
        }

        if let Some(step) = self.tuner.tick(&mut self.stepper) {
            if let Some(direction) = step.reversed_to {
                self.events.record(ControlEvent::BoundReached(direction), now);
            }
        }

        let (min, max) = self.tuner.bounds().unwrap_or((0, 0));
        self.arbiter.mirror_tuner(self.tuner.is_programmed(), min, max);

        if *self.arbiter.settings() != settings_before {
            self.synth.apply(self.arbiter.settings());
        }
    }

    /// Recorded event history.
    pub fn events(&self) -> &EventRecorder<TInstant> {
        &self.events
    }

    /// Read access to the stepper driver, mainly for recording test doubles.
    pub fn stepper(&self) -> &D {
        &self.stepper
    }

    /// Mutable access to the stepper driver.
    pub fn stepper_mut(&mut self) -> &mut D {
        &mut self.stepper
    }

    /// Read access to the synth driver, mainly for recording test doubles.
    pub fn synth(&self) -> &S {
        &self.synth
    }

    /// Mutable access to the synth driver.
    pub fn synth_mut(&mut self) -> &mut S {
        &mut self.synth
    }

    fn handle_encoder(&mut self, pulse: EncoderPulse) {
        match self.encoder.feed(pulse) {
            EncoderReading::Applied(delta) => {
                self.tuner.apply_delta(delta);
            }
            // Expected bounce filtering; counted by the reader, not an error.
            EncoderReading::BounceRejected => {}
        }
    }

    fn handle_press(&mut self, button: ButtonId, now: TInstant) {
        if self.arbiter.observe_panel_actuation() {
            self.events
                .record(ControlEvent::ControlTransferred(ControlOwner::Panel), now);
        }

        match button {
            ButtonId::Select => {
                let was_looping = self.tuner.is_looping();
                let outcome = self.tuner.press_select();
                if was_looping && !self.tuner.is_looping() {
                    self.stepper.release();
                    self.events.record(ControlEvent::LoopHalted, now);
                }
                match outcome {
                    SelectOutcome::SelectionStarted => {
                        self.events.record(ControlEvent::SelectionStarted, now);
                    }
                    SelectOutcome::Programmed { min, max } => {
                        self.events
                            .record(ControlEvent::CalibrationCommitted { min, max }, now);
                    }
                    SelectOutcome::InvalidCalibration => {
                        self.events.record(ControlEvent::CalibrationInvalid, now);
                    }
                }
            }
            ButtonId::Loop => {
                let enable = !self.tuner.is_looping();
                self.apply_loop_request(enable, now);
            }
        }
    }

    fn handle_panel(&mut self, event: PanelEvent, now: TInstant) {
        if self.arbiter.observe_panel(event) {
            self.events
                .record(ControlEvent::ControlTransferred(ControlOwner::Panel), now);
        }
    }

    fn handle_remote(&mut self, command: RemoteCommand, now: TInstant) {
        match command {
            RemoteCommand::WebControl(true) => {
                if !self.arbiter.is_remote_controlling() {
                    self.arbiter.grant_remote();
                    self.events
                        .record(ControlEvent::ControlTransferred(ControlOwner::Remote), now);
                }
            }
            RemoteCommand::WebControl(false) => {
                if self.arbiter.revoke_remote() {
                    self.events
                        .record(ControlEvent::ControlTransferred(ControlOwner::Panel), now);
                }
            }
            RemoteCommand::Tune(enable) => {
                if self.arbiter.is_remote_controlling() {
                    self.apply_loop_request(enable, now);
                } else {
                    self.events.record(
                        ControlEvent::CommandIgnored(IgnoredReason::OwnerMismatch),
                        now,
                    );
                }
            }
            RemoteCommand::SoundOn(on) => {
                let result = self.arbiter.remote_set_sound(on);
                self.record_remote_write(result, now);
            }
            RemoteCommand::Enable(id, enabled) => {
                let result = self.arbiter.remote_set_enabled(id, enabled);
                self.record_remote_write(result, now);
            }
            RemoteCommand::Mode(id, mode) => {
                let result = self.arbiter.remote_set_mode(id, mode);
                self.record_remote_write(result, now);
            }
        }
    }

    fn record_remote_write(&mut self, result: Result<(), IgnoredReason>, now: TInstant) {
        if let Err(reason) = result {
            self.events.record(ControlEvent::CommandIgnored(reason), now);
        }
    }

    fn apply_loop_request(&mut self, enable: bool, now: TInstant) {
        match self.tuner.request_loop(enable) {
            LoopRequest::Started => {
                self.events.record(ControlEvent::LoopStarted, now);
            }
            LoopRequest::Halted => {
                self.stepper.release();
                self.events.record(ControlEvent::LoopHalted, now);
            }
            LoopRequest::Ignored(reason) => {
                self.events.record(ControlEvent::CommandIgnored(reason), now);
            }
            LoopRequest::Unchanged => {}
        }
    }
}

impl<TInstant, D, S, const QUEUE: usize> StatusProvider for TunerController<TInstant, D, S, QUEUE>
where
    TInstant: Copy,
    D: StepperDriver,
    S: SynthDriver,
{
    fn tuner_snapshot(&self) -> TunerSnapshot {
        TunerSnapshot {
            phase: self.tuner.phase(),
            looping: self.tuner.is_looping(),
            position: self.tuner.position(),
            direction: self.tuner.loop_direction(),
            loop_steps: self.tuner.loop_steps(),
            min_steps: self.tuner.min_steps(),
            max_steps: self.tuner.max_steps(),
            detents: self.encoder.detents(),
            bounce_rejected: self.encoder.rejected_count(),
        }
    }

    fn synth_snapshot(&self) -> SynthSnapshot {
        let (programmed, min, max) = self.arbiter.tuner_mirror();
        SynthSnapshot {
            owner: self.arbiter.owner(),
            settings: *self.arbiter.settings(),
            tuner_programmed: programmed,
            min_tuner_steps: min,
            max_tuner_steps: max,
        }
    }
}
