//! Interactive session driving the controller with a simulated clock.
//!
//! Every input command lands in the controller queue and one scheduler tick
//! runs immediately, exactly as the firmware tick loop would consume it.
//! Further `tick` commands advance the sweep.

use std::fmt::Write as _;

use tuner_core::arbiter::{PanelEvent, SynthDriver, SynthId, SynthMode, SynthSettings};
use tuner_core::command;
use tuner_core::config::TICK_PERIOD_MS;
use tuner_core::controller::TunerController;
use tuner_core::input::{ButtonId, DebouncePolicy, EncoderPulse};
use tuner_core::status::{StatusFormatter, StatusProvider};
use tuner_core::tuner::{StepDirection, StepperDriver};

/// Stepper double that records issued steps for the transcript.
#[derive(Default)]
pub struct RecordingStepper {
    steps: Vec<StepDirection>,
    released: bool,
}

impl RecordingStepper {
    fn take_steps(&mut self) -> Vec<StepDirection> {
        std::mem::take(&mut self.steps)
    }

    fn take_release(&mut self) -> bool {
        std::mem::take(&mut self.released)
    }
}

impl StepperDriver for RecordingStepper {
    fn step(&mut self, direction: StepDirection) {
        self.steps.push(direction);
    }

    fn release(&mut self) {
        self.released = true;
    }
}

/// Synth double that records every settings image pushed to the module.
#[derive(Default)]
pub struct RecordingSynth {
    applied: Vec<SynthSettings>,
}

impl RecordingSynth {
    fn take_applied(&mut self) -> Vec<SynthSettings> {
        std::mem::take(&mut self.applied)
    }
}

impl SynthDriver for RecordingSynth {
    fn apply(&mut self, settings: &SynthSettings) {
        self.applied.push(*settings);
    }
}

type Controller = TunerController<u64, RecordingStepper, RecordingSynth>;

pub struct Session {
    controller: Controller,
    now: u64,
}

impl Session {
    pub fn new(policy: DebouncePolicy) -> Self {
        let mut controller = Controller::new(
            policy,
            SynthSettings::boot_defaults(),
            RecordingStepper::default(),
            RecordingSynth::default(),
        );
        // Swallow the boot-time image push; the transcript starts clean.
        controller.synth_mut().take_applied();

        Self { controller, now: 0 }
    }

    pub fn handle_command(&mut self, input: &str) -> Vec<String> {
        let mut responses = Vec::new();
        let mut words = input.split_whitespace();
        let Some(keyword) = words.next() else {
            return responses;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "help" => help(&mut responses),
            "status" => self.status(&mut responses),
            "events" => self.events(&mut responses),
            "tick" => match parse_count(words.next()) {
                Ok(count) => self.run_ticks(count, &mut responses),
                Err(message) => responses.push(message),
            },
            "turn" => match parse_turn(words.next()) {
                Ok((pulse, count)) => {
                    for _ in 0..count {
                        self.queue_pulse(pulse, &mut responses);
                    }
                    self.run_ticks(1, &mut responses);
                }
                Err(message) => responses.push(message),
            },
            "press" => match parse_button(words.next()) {
                Ok(button) => {
                    if self.controller.on_button_press(button).is_err() {
                        responses.push("input queue full, press dropped".to_string());
                    }
                    self.run_ticks(1, &mut responses);
                }
                Err(message) => responses.push(message),
            },
            "switch" => match parse_switch(words.next(), words.next()) {
                Ok(event) => {
                    if self.controller.on_panel_switch_change(event).is_err() {
                        responses.push("input queue full, transition dropped".to_string());
                    }
                    self.run_ticks(1, &mut responses);
                }
                Err(message) => responses.push(message),
            },
            _ if input.contains('=') => self.remote(input, &mut responses),
            _ => responses.push(format!("Unknown command `{input}`; type `help`.")),
        }

        responses
    }

    fn remote(&mut self, line: &str, responses: &mut Vec<String>) {
        let result = command::parse_line(line);
        responses.push(command::ack(&result).to_string());

        if let Ok(cmd) = result {
            if self.controller.on_remote_command(cmd).is_err() {
                responses.push("input queue full, command dropped".to_string());
                return;
            }
            self.run_ticks(1, responses);
        }
    }

    fn queue_pulse(&mut self, pulse: EncoderPulse, responses: &mut Vec<String>) {
        if self.controller.on_encoder_pulse(pulse).is_err() {
            responses.push("input queue full, pulse dropped".to_string());
        }
    }

    fn run_ticks(&mut self, count: u64, responses: &mut Vec<String>) {
        for _ in 0..count {
            self.now += TICK_PERIOD_MS;
            self.controller.tick(self.now);

            let position = self.controller.tuner_snapshot().position;
            for step in self.controller.stepper_mut().take_steps() {
                responses.push(format!(
                    "motor: step {} pos={position}",
                    direction_label(step)
                ));
            }
            if self.controller.stepper_mut().take_release() {
                responses.push("motor: coils released".to_string());
            }
            for settings in self.controller.synth_mut().take_applied() {
                let mut line = String::from("synth <- ");
                render_settings(&mut line, &settings);
                responses.push(line);
            }
        }
    }

    fn status(&self, responses: &mut Vec<String>) {
        let tuner = self.controller.tuner_snapshot();
        let synth = self.controller.synth_snapshot();
        let formatter = StatusFormatter::new(&tuner, &synth);

        let mut line = String::new();
        formatter.write_tuner_line(&mut line).expect("write to string");
        responses.push(std::mem::take(&mut line));
        formatter
            .write_encoder_line(&mut line)
            .expect("write to string");
        responses.push(std::mem::take(&mut line));
        formatter
            .write_synth_line(&mut line)
            .expect("write to string");
        responses.push(std::mem::take(&mut line));
        formatter
            .write_control_line(&mut line)
            .expect("write to string");
        responses.push(line);
    }

    fn events(&self, responses: &mut Vec<String>) {
        if self.controller.events().is_empty() {
            responses.push("no events recorded".to_string());
            return;
        }

        for record in self.controller.events().oldest_first() {
            responses.push(format!(
                "#{} t={}ms {}",
                record.id, record.timestamp, record.event
            ));
        }
    }
}

fn help(responses: &mut Vec<String>) {
    responses.push("Commands:".to_string());
    responses.push("  turn <±n>          rotate the encoder n detents".to_string());
    responses.push("  press select|loop  press a panel button".to_string());
    responses.push("  switch <name> <v>  move a panel switch (mode1..3 wave|pwm,".to_string());
    responses.push("                     en1..3 on|off, sound on|off)".to_string());
    responses.push("  tick [n]           advance the scheduler n ticks (default 1)".to_string());
    responses.push("  Name=value         send a remote command (Tune=1, WebControl=0,".to_string());
    responses.push("                     SoundOn=1, EnSynth2=0, WavePWM3=2, ...)".to_string());
    responses.push("  status             print the live snapshots".to_string());
    responses.push("  events             print the recorded event ring".to_string());
    responses.push("  exit               quit".to_string());
}

fn parse_count(word: Option<&str>) -> Result<u64, String> {
    match word {
        None => Ok(1),
        Some(word) => word
            .parse::<u64>()
            .map_err(|_| format!("Invalid tick count `{word}`")),
    }
}

fn parse_turn(word: Option<&str>) -> Result<(EncoderPulse, u32), String> {
    let word = word.ok_or("Expected a signed detent count, e.g. `turn +3`")?;
    let detents = word
        .parse::<i32>()
        .map_err(|_| format!("Invalid detent count `{word}`"))?;

    match EncoderPulse::from_raw(detents) {
        Some(pulse) => Ok((pulse, detents.unsigned_abs())),
        None => Err("Detent count must be non-zero".to_string()),
    }
}

fn parse_button(word: Option<&str>) -> Result<ButtonId, String> {
    match word.map(str::to_ascii_lowercase).as_deref() {
        Some("select") => Ok(ButtonId::Select),
        Some("loop") => Ok(ButtonId::Loop),
        other => Err(format!(
            "Expected `select` or `loop`, got `{}`",
            other.unwrap_or("")
        )),
    }
}

fn parse_switch(name: Option<&str>, value: Option<&str>) -> Result<PanelEvent, String> {
    let name = name.ok_or("Expected a switch name, e.g. `switch mode1 pwm`")?;
    let value = value.ok_or("Expected a switch value, e.g. `switch mode1 pwm`")?;
    let lower_name = name.to_ascii_lowercase();
    let lower_value = value.to_ascii_lowercase();

    if lower_name == "sound" {
        return flag_from(&lower_value)
            .map(PanelEvent::SoundOn)
            .ok_or_else(|| format!("Expected on|off for `sound`, got `{value}`"));
    }

    if let Some(channel) = lower_name.strip_prefix("mode") {
        let id = channel_from(channel)?;
        return match lower_value.as_str() {
            "wave" => Ok(PanelEvent::Mode(id, SynthMode::Wave)),
            "pwm" => Ok(PanelEvent::Mode(id, SynthMode::Pwm)),
            _ => Err(format!("Expected wave|pwm for `{name}`, got `{value}`")),
        };
    }

    if let Some(channel) = lower_name.strip_prefix("en") {
        let id = channel_from(channel)?;
        return flag_from(&lower_value)
            .map(|on| PanelEvent::Enable(id, on))
            .ok_or_else(|| format!("Expected on|off for `{name}`, got `{value}`"));
    }

    Err(format!("Unknown switch `{name}`"))
}

fn channel_from(digit: &str) -> Result<SynthId, String> {
    match digit {
        "1" => Ok(SynthId::One),
        "2" => Ok(SynthId::Two),
        "3" => Ok(SynthId::Three),
        _ => Err(format!("Unknown synth channel `{digit}`")),
    }
}

fn flag_from(value: &str) -> Option<bool> {
    match value {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

fn direction_label(direction: StepDirection) -> &'static str {
    match direction {
        StepDirection::Cw => "cw",
        StepDirection::Ccw => "ccw",
    }
}

fn render_settings(line: &mut String, settings: &SynthSettings) {
    let _ = write!(
        line,
        "sound={}",
        if settings.sound_on { "on" } else { "off" }
    );
    for id in SynthId::ALL {
        let channel = settings.channel(id);
        let mode = match channel.mode {
            SynthMode::Wave => "wave",
            SynthMode::Pwm => "pwm",
        };
        let gate = if channel.enabled { "on" } else { "off" };
        let _ = write!(line, " {}={mode}/{gate}", id.number());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(DebouncePolicy::new(0))
    }

    fn drive(session: &mut Session, commands: &[&str]) -> Vec<String> {
        let mut all = Vec::new();
        for command in commands {
            all.extend(session.handle_command(command));
        }
        all
    }

    #[test]
    fn full_programming_and_loop_transcript() {
        let mut session = session();

        drive(&mut session, &["press select", "turn +3", "press select"]);
        let responses = drive(&mut session, &["WebControl=1", "Tune=1", "tick 2"]);

        assert!(responses.contains(&"Ok".to_string()));
        assert!(
            responses
                .iter()
                .any(|line| line.starts_with("motor: step cw"))
        );

        let status = drive(&mut session, &["status"]);
        assert!(status[0].contains("phase=programmed"));
        assert!(status[0].contains("range=[0, 300]"));
    }

    #[test]
    fn invalid_remote_command_is_acknowledged_with_error() {
        let mut session = session();
        let responses = drive(&mut session, &["Tune=7"]);
        assert_eq!(responses, vec!["Error code 001".to_string()]);
    }

    #[test]
    fn unknown_keyword_is_reported() {
        let mut session = session();
        let responses = drive(&mut session, &["warp 9"]);
        assert_eq!(responses.len(), 1);
        assert!(responses[0].starts_with("Unknown command"));
    }

    #[test]
    fn events_command_lists_history() {
        let mut session = session();
        drive(&mut session, &["press select"]);
        let responses = drive(&mut session, &["events"]);
        assert!(responses[0].contains("selection-started"));
    }
}
