//! Quadrature decoding for the rotary encoder.
//!
//! Decodes the CLK/DATA pin pair into detent pulses using a small state
//! machine that requires the full transition sequence before emitting a
//! pulse, so partial transitions from contact noise fall back to idle
//! instead of producing phantom detents. The emitted pulses still pass
//! through the core bounce-rejection policy before they count.

use tuner_core::input::EncoderPulse;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Idle,
    CwHalf,
    CwFull,
    CcwHalf,
    CcwFull,
}

/// Tracks the CLK/DATA pair across polls and emits one pulse per detent.
pub struct QuadratureDecoder {
    state: State,
    last_clk: bool,
    last_data: bool,
}

impl QuadratureDecoder {
    /// Creates a decoder seeded with the current pin levels.
    #[must_use]
    pub const fn new(clk: bool, data: bool) -> Self {
        Self {
            state: State::Idle,
            last_clk: clk,
            last_data: data,
        }
    }

    /// Feeds the sampled pin levels; returns a pulse when a detent completes.
    pub fn update(&mut self, clk: bool, data: bool) -> Option<EncoderPulse> {
        if clk == self.last_clk && data == self.last_data {
            return None;
        }

        let pulse = self.advance(clk, data);
        self.last_clk = clk;
        self.last_data = data;
        pulse
    }

    // Clockwise rotation drops CLK first: (1,1) -> (0,1) -> (0,0) -> rising.
    // Counter-clockwise drops DATA first: (1,1) -> (1,0) -> (0,0) -> rising.
    // Any sequence that returns to (1,1) early is noise and resets to idle.
    fn advance(&mut self, clk: bool, data: bool) -> Option<EncoderPulse> {
        match self.state {
            State::Idle => {
                if !clk && data {
                    self.state = State::CwHalf;
                } else if clk && !data {
                    self.state = State::CcwHalf;
                }
                None
            }
            State::CwHalf => {
                if !clk && !data {
                    self.state = State::CwFull;
                } else if clk && data {
                    self.state = State::Idle;
                }
                None
            }
            State::CwFull => {
                if clk || data {
                    self.state = State::Idle;
                    return Some(EncoderPulse::Clockwise);
                }
                None
            }
            State::CcwHalf => {
                if !clk && !data {
                    self.state = State::CcwFull;
                } else if clk && data {
                    self.state = State::Idle;
                }
                None
            }
            State::CcwFull => {
                if clk || data {
                    self.state = State::Idle;
                    return Some(EncoderPulse::CounterClockwise);
                }
                None
            }
        }
    }
}
