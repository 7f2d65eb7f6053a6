//! Panel button edge detection.
//!
//! Buttons are wired active-low with pull-ups. The platform layer samples the
//! pin level each poll; this detector turns level changes into discrete press
//! events, exactly one per physical action. Presses are rare, so edges lost
//! between two samples coalesce into the latest observed level.

/// Panel buttons observed by the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ButtonId {
    /// Rotary encoder push button; arms and commits the sweep capture.
    Select,
    /// Looper button; toggles the sweep loop.
    Loop,
}

/// Logic level sampled from a button pin.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Helper converting a boolean high flag into a [`Level`].
    #[must_use]
    pub const fn from_high(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// Converts sampled levels into press events.
#[derive(Copy, Clone, Debug, Default)]
pub struct ButtonEdge {
    pressed: bool,
}

impl ButtonEdge {
    /// Creates a detector assuming the button starts released.
    #[must_use]
    pub const fn new() -> Self {
        Self { pressed: false }
    }

    /// Feeds one sampled level; returns `true` exactly once per press.
    pub fn update(&mut self, level: Level) -> bool {
        match (self.pressed, level) {
            (false, Level::Low) => {
                self.pressed = true;
                true
            }
            (true, Level::High) => {
                self.pressed = false;
                false
            }
            _ => false,
        }
    }

    /// Returns `true` while the button is held down.
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_event_per_press() {
        let mut button = ButtonEdge::new();

        assert!(button.update(Level::Low));
        assert!(!button.update(Level::Low));
        assert!(!button.update(Level::High));
        assert!(button.update(Level::Low));
    }

    #[test]
    fn held_button_reports_pressed() {
        let mut button = ButtonEdge::new();

        assert!(!button.is_pressed());
        button.update(Level::Low);
        assert!(button.is_pressed());
        button.update(Level::High);
        assert!(!button.is_pressed());
    }

    #[test]
    fn coalesced_bounce_yields_single_press() {
        let mut button = ButtonEdge::new();

        // A press with missed intermediate edges still produces one event per
        // observed low level following a high level.
        assert!(button.update(Level::Low));
        assert!(!button.update(Level::High));
        assert!(button.update(Level::Low));
        assert!(!button.update(Level::Low));
    }
}
