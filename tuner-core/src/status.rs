//! Shared status surface for the serving layer and the emulator.
//!
//! Snapshots are plain `Copy` views taken between ticks, so a status query
//! never observes a half-applied transition. [`StatusFormatter`] keeps the
//! textual rendering consistent across front-ends.

use core::fmt;

use crate::arbiter::{ControlOwner, SynthId, SynthMode, SynthSettings};
use crate::tuner::{CalibrationPhase, LoopDirection};

/// Point-in-time view of the tuner sweep state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TunerSnapshot {
    pub phase: CalibrationPhase,
    pub looping: bool,
    pub position: i32,
    pub direction: LoopDirection,
    pub loop_steps: i32,
    pub min_steps: i32,
    pub max_steps: i32,
    /// Net applied encoder detents since boot.
    pub detents: i16,
    /// Encoder readings discarded by the bounce filter.
    pub bounce_rejected: u32,
}

/// Point-in-time view of the synth settings and control ownership.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SynthSnapshot {
    pub owner: ControlOwner,
    pub settings: SynthSettings,
    /// Tuner mirror carried for remote status queries.
    pub tuner_programmed: bool,
    pub min_tuner_steps: i32,
    pub max_tuner_steps: i32,
}

/// Platform hook that supplies live snapshots.
pub trait StatusProvider {
    /// Returns the current tuner sweep view.
    fn tuner_snapshot(&self) -> TunerSnapshot;

    /// Returns the current settings/ownership view.
    fn synth_snapshot(&self) -> SynthSnapshot;
}

/// Renders snapshots into stable, human-readable lines.
#[derive(Copy, Clone, Debug)]
pub struct StatusFormatter<'a> {
    tuner: &'a TunerSnapshot,
    synth: &'a SynthSnapshot,
}

impl<'a> StatusFormatter<'a> {
    /// Creates a formatter over the provided snapshots.
    #[must_use]
    pub const fn new(tuner: &'a TunerSnapshot, synth: &'a SynthSnapshot) -> Self {
        Self { tuner, synth }
    }

    /// Writes the tuner line, e.g.
    /// `tuner phase=programmed looping=true pos=200 dir=cw range=[0, 300]`.
    pub fn write_tuner_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        writer.write_str("tuner phase=")?;
        writer.write_str(match self.tuner.phase {
            CalibrationPhase::Idle => "idle",
            CalibrationPhase::Selecting => "selecting",
            CalibrationPhase::Programmed => "programmed",
        })?;

        write!(writer, " looping={}", self.tuner.looping)?;
        write!(writer, " pos={}", self.tuner.position)?;

        writer.write_str(" dir=")?;
        writer.write_str(match self.tuner.direction {
            LoopDirection::Cw => "cw",
            LoopDirection::Ccw => "ccw",
            LoopDirection::Idle => "idle",
        })?;

        if matches!(self.tuner.phase, CalibrationPhase::Selecting) {
            write!(writer, " steps={}", self.tuner.loop_steps)?;
        }
        if matches!(self.tuner.phase, CalibrationPhase::Programmed) {
            write!(
                writer,
                " range=[{}, {}]",
                self.tuner.min_steps, self.tuner.max_steps
            )?;
        }

        Ok(())
    }

    /// Writes the encoder line, e.g. `encoder detents=3 rejected=3`.
    pub fn write_encoder_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write!(
            writer,
            "encoder detents={} rejected={}",
            self.tuner.detents, self.tuner.bounce_rejected
        )
    }

    /// Writes the synth line, e.g.
    /// `synth sound=on 1=wave/on 2=pwm/on 3=wave/off`.
    pub fn write_synth_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        writer.write_str("synth sound=")?;
        writer.write_str(if self.synth.settings.sound_on {
            "on"
        } else {
            "off"
        })?;

        for id in SynthId::ALL {
            let channel = self.synth.settings.channel(id);
            let mode = match channel.mode {
                SynthMode::Wave => "wave",
                SynthMode::Pwm => "pwm",
            };
            let gate = if channel.enabled { "on" } else { "off" };
            write!(writer, " {}={}/{}", id.number(), mode, gate)?;
        }

        Ok(())
    }

    /// Writes the control line, e.g.
    /// `control owner=remote tuner-programmed=true range=[0, 300]`.
    pub fn write_control_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        writer.write_str("control owner=")?;
        writer.write_str(match self.synth.owner {
            ControlOwner::Panel => "panel",
            ControlOwner::Remote => "remote",
        })?;

        write!(
            writer,
            " tuner-programmed={}",
            self.synth.tuner_programmed
        )?;
        if self.synth.tuner_programmed {
            write!(
                writer,
                " range=[{}, {}]",
                self.synth.min_tuner_steps, self.synth.max_tuner_steps
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;

    fn programmed_snapshots() -> (TunerSnapshot, SynthSnapshot) {
        let tuner = TunerSnapshot {
            phase: CalibrationPhase::Programmed,
            looping: true,
            position: 200,
            direction: LoopDirection::Cw,
            loop_steps: 300,
            min_steps: 0,
            max_steps: 300,
            detents: 3,
            bounce_rejected: 3,
        };
        let synth = SynthSnapshot {
            owner: ControlOwner::Remote,
            settings: SynthSettings::boot_defaults(),
            tuner_programmed: true,
            min_tuner_steps: 0,
            max_tuner_steps: 300,
        };
        (tuner, synth)
    }

    #[test]
    fn tuner_line_includes_range_once_programmed() {
        let (tuner, synth) = programmed_snapshots();
        let formatter = StatusFormatter::new(&tuner, &synth);

        let mut line: String<96> = String::new();
        formatter.write_tuner_line(&mut line).unwrap();
        assert_eq!(
            line.as_str(),
            "tuner phase=programmed looping=true pos=200 dir=cw range=[0, 300]"
        );
    }

    #[test]
    fn synth_line_lists_every_channel() {
        let (tuner, synth) = programmed_snapshots();
        let formatter = StatusFormatter::new(&tuner, &synth);

        let mut line: String<96> = String::new();
        formatter.write_synth_line(&mut line).unwrap();
        assert_eq!(
            line.as_str(),
            "synth sound=on 1=wave/on 2=wave/on 3=wave/on"
        );
    }

    #[test]
    fn control_line_reports_owner_and_mirror() {
        let (tuner, synth) = programmed_snapshots();
        let formatter = StatusFormatter::new(&tuner, &synth);

        let mut line: String<96> = String::new();
        formatter.write_control_line(&mut line).unwrap();
        assert_eq!(
            line.as_str(),
            "control owner=remote tuner-programmed=true range=[0, 300]"
        );
    }
}
