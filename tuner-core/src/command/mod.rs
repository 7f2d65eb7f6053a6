//! Remote command grammar.
//!
//! The external WiFi bridge forwards each remote request as a single
//! `Name=value` line. This module parses those lines into typed commands with
//! `winnow` combinators and renders the acknowledgement string the bridge
//! sends back. Parse failures never disturb controller state.

use core::fmt;

use winnow::ascii::Caseless;
use winnow::combinator::alt;
use winnow::{ModalResult, Parser};

use crate::arbiter::{SynthId, SynthMode};

/// Remote command decoded from one request line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RemoteCommand {
    /// Start (`true`) or stop the tuner sweep loop.
    Tune(bool),
    /// Grant (`true`) or surrender remote control of the settings.
    WebControl(bool),
    /// Gate the sound output as a whole.
    SoundOn(bool),
    /// Enable or disable one synth channel.
    Enable(SynthId, bool),
    /// Select the waveform or PWM mode for one synth channel.
    Mode(SynthId, SynthMode),
}

/// Why a request line was rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CommandError {
    /// The parameter name matches no known command.
    UnknownParameter,
    /// The value is missing or outside the accepted set.
    InvalidValue,
    /// Valid command followed by unexpected trailing input.
    TrailingInput,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownParameter => f.write_str("unknown parameter name"),
            CommandError::InvalidValue => f.write_str("missing or invalid value"),
            CommandError::TrailingInput => f.write_str("unexpected trailing input"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Param {
    Tune,
    WebControl,
    SoundOn,
    Enable(SynthId),
    Mode(SynthId),
}

fn parameter(input: &mut &str) -> ModalResult<Param> {
    alt((
        Caseless("EnSynth1").value(Param::Enable(SynthId::One)),
        Caseless("EnSynth2").value(Param::Enable(SynthId::Two)),
        Caseless("EnSynth3").value(Param::Enable(SynthId::Three)),
        Caseless("WavePWM1").value(Param::Mode(SynthId::One)),
        Caseless("WavePWM2").value(Param::Mode(SynthId::Two)),
        Caseless("WavePWM3").value(Param::Mode(SynthId::Three)),
        Caseless("WebControl").value(Param::WebControl),
        Caseless("SoundOn").value(Param::SoundOn),
        Caseless("Tune").value(Param::Tune),
    ))
    .parse_next(input)
}

fn equals(input: &mut &str) -> ModalResult<char> {
    '='.parse_next(input)
}

fn flag_value(input: &mut &str) -> ModalResult<bool> {
    alt(('0'.value(false), '1'.value(true))).parse_next(input)
}

fn mode_value(input: &mut &str) -> ModalResult<SynthMode> {
    alt(('1'.value(SynthMode::Wave), '2'.value(SynthMode::Pwm))).parse_next(input)
}

/// Parses one request line into a [`RemoteCommand`].
///
/// Leading and trailing ASCII whitespace (including the line terminator) is
/// ignored; parameter names are case-insensitive.
pub fn parse_line(line: &str) -> Result<RemoteCommand, CommandError> {
    let mut input = line.trim_ascii();

    let param = parameter(&mut input).map_err(|_| CommandError::UnknownParameter)?;

    // A known name followed by more name characters is a different, unknown
    // parameter (`Tunes=`), not a malformed value.
    if input
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric())
    {
        return Err(CommandError::UnknownParameter);
    }

    equals(&mut input).map_err(|_| CommandError::InvalidValue)?;

    let command = match param {
        Param::Tune => RemoteCommand::Tune(parse_flag(&mut input)?),
        Param::WebControl => RemoteCommand::WebControl(parse_flag(&mut input)?),
        Param::SoundOn => RemoteCommand::SoundOn(parse_flag(&mut input)?),
        Param::Enable(id) => RemoteCommand::Enable(id, parse_flag(&mut input)?),
        Param::Mode(id) => {
            let mode = mode_value(&mut input).map_err(|_| CommandError::InvalidValue)?;
            RemoteCommand::Mode(id, mode)
        }
    };

    if input.is_empty() {
        Ok(command)
    } else {
        Err(CommandError::TrailingInput)
    }
}

fn parse_flag(input: &mut &str) -> Result<bool, CommandError> {
    flag_value(input).map_err(|_| CommandError::InvalidValue)
}

/// Acknowledgement line for a parse attempt, as sent back to the bridge.
///
/// The numbered codes match what the serving layer reports to remote
/// clients: `001` for a malformed argument, `002` for an unknown parameter.
#[must_use]
pub fn ack(result: &Result<RemoteCommand, CommandError>) -> &'static str {
    match result {
        Ok(_) => "Ok",
        Err(CommandError::UnknownParameter) => "Error code 002",
        Err(CommandError::InvalidValue | CommandError::TrailingInput) => "Error code 001",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(line: &str) -> RemoteCommand {
        parse_line(line).expect("command should parse")
    }

    #[test]
    fn parses_tune_flags() {
        assert_eq!(parse_ok("Tune=1"), RemoteCommand::Tune(true));
        assert_eq!(parse_ok("Tune=0"), RemoteCommand::Tune(false));
    }

    #[test]
    fn parses_web_control() {
        assert_eq!(parse_ok("WebControl=1"), RemoteCommand::WebControl(true));
        assert_eq!(parse_ok("WebControl=0"), RemoteCommand::WebControl(false));
    }

    #[test]
    fn parses_sound_gate() {
        assert_eq!(parse_ok("SoundOn=0"), RemoteCommand::SoundOn(false));
    }

    #[test]
    fn parses_channel_enables() {
        assert_eq!(
            parse_ok("EnSynth1=1"),
            RemoteCommand::Enable(SynthId::One, true)
        );
        assert_eq!(
            parse_ok("EnSynth3=0"),
            RemoteCommand::Enable(SynthId::Three, false)
        );
    }

    #[test]
    fn parses_channel_modes() {
        assert_eq!(
            parse_ok("WavePWM1=1"),
            RemoteCommand::Mode(SynthId::One, SynthMode::Wave)
        );
        assert_eq!(
            parse_ok("WavePWM2=2"),
            RemoteCommand::Mode(SynthId::Two, SynthMode::Pwm)
        );
    }

    #[test]
    fn supports_case_insensitive_names_and_padding() {
        assert_eq!(parse_ok("  tune=1\r\n"), RemoteCommand::Tune(true));
        assert_eq!(
            parse_ok("WAVEPWM3=2"),
            RemoteCommand::Mode(SynthId::Three, SynthMode::Pwm)
        );
    }

    #[test]
    fn rejects_unknown_parameter() {
        assert_eq!(parse_line("Volume=1"), Err(CommandError::UnknownParameter));
        assert_eq!(parse_line("Tunes=1"), Err(CommandError::UnknownParameter));
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(parse_line("Tune=2"), Err(CommandError::InvalidValue));
        assert_eq!(parse_line("WavePWM1=0"), Err(CommandError::InvalidValue));
        assert_eq!(parse_line("Tune="), Err(CommandError::InvalidValue));
        assert_eq!(parse_line("Tune"), Err(CommandError::InvalidValue));
    }

    #[test]
    fn rejects_trailing_input() {
        assert_eq!(parse_line("Tune=11"), Err(CommandError::TrailingInput));
        assert_eq!(parse_line("Tune=1 now"), Err(CommandError::TrailingInput));
    }

    #[test]
    fn renders_acknowledgements() {
        assert_eq!(ack(&parse_line("Tune=1")), "Ok");
        assert_eq!(ack(&parse_line("Tune=9")), "Error code 001");
        assert_eq!(ack(&parse_line("Bogus=1")), "Error code 002");
    }
}
