//! Dual-path control arbitration between the physical panel and the remote
//! client.
//!
//! Every mutable setting has two images: the ACTIVE image that drives the
//! sound module, and the SHADOW image tracking the last physical switch scan.
//! While the remote client owns control, panel observations land only in the
//! shadow; the first physical actuation hands control back and promotes the
//! whole shadow to active in a single transfer event, so actuating one manual
//! control regains control for all of them.

use crate::config::SYNTH_CHANNELS;
use crate::events::IgnoredReason;

/// Output mode for a synth channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SynthMode {
    Wave,
    Pwm,
}

/// Identifier for one of the three synth channels.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SynthId {
    One,
    Two,
    Three,
}

impl SynthId {
    /// Every channel, in panel order.
    pub const ALL: [SynthId; SYNTH_CHANNELS] = [SynthId::One, SynthId::Two, SynthId::Three];

    /// Deterministic index for lookups into the channel array.
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            SynthId::One => 0,
            SynthId::Two => 1,
            SynthId::Three => 2,
        }
    }

    /// Attempts to construct a [`SynthId`] from a raw index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SynthId::One),
            1 => Some(SynthId::Two),
            2 => Some(SynthId::Three),
            _ => None,
        }
    }

    /// One-based channel number as printed on the panel.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            SynthId::One => 1,
            SynthId::Two => 2,
            SynthId::Three => 3,
        }
    }
}

/// Mode and gate state for one synth channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SynthChannel {
    pub mode: SynthMode,
    pub enabled: bool,
}

impl SynthChannel {
    /// Factory defaults, overridden by the boot-time switch scan.
    #[must_use]
    pub const fn boot_default() -> Self {
        Self {
            mode: SynthMode::Wave,
            enabled: true,
        }
    }
}

/// Complete switch image for the sound module.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SynthSettings {
    pub channels: [SynthChannel; SYNTH_CHANNELS],
    pub sound_on: bool,
}

impl SynthSettings {
    /// Factory defaults, overridden by the boot-time switch scan.
    #[must_use]
    pub const fn boot_defaults() -> Self {
        Self {
            channels: [SynthChannel::boot_default(); SYNTH_CHANNELS],
            sound_on: true,
        }
    }

    /// Returns the channel settings for `id`.
    #[must_use]
    pub const fn channel(&self, id: SynthId) -> SynthChannel {
        self.channels[id.as_index()]
    }
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self::boot_defaults()
    }
}

/// Which path currently owns the mutable settings.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ControlOwner {
    /// The physical switches and buttons.
    Panel,
    /// The remote client behind the WiFi bridge.
    Remote,
}

/// Panel observation delivered by the switch scan path.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PanelEvent {
    /// A mode switch moved.
    Mode(SynthId, SynthMode),
    /// An enable switch moved.
    Enable(SynthId, bool),
    /// The master sound switch moved.
    SoundOn(bool),
}

/// Abstraction over the sound module's control lines.
pub trait SynthDriver {
    /// Pushes the active settings image out to the module's control lines.
    fn apply(&mut self, settings: &SynthSettings);
}

/// Synth driver that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopSynthDriver;

impl NoopSynthDriver {
    /// Creates a new no-op synth driver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SynthDriver for NoopSynthDriver {
    fn apply(&mut self, _: &SynthSettings) {}
}

/// Arbitrates writes between the panel scan path and the remote command path.
///
/// Both images and the owner are reset in place; the arbiter is created once
/// at boot from the first physical switch scan and lives for the process
/// duration.
#[derive(Copy, Clone, Debug)]
pub struct ControlArbiter {
    owner: ControlOwner,
    active: SynthSettings,
    shadow: SynthSettings,
    tuner_programmed: bool,
    tuner_min: i32,
    tuner_max: i32,
}

impl ControlArbiter {
    /// Seeds both images from the boot-time switch scan; the panel owns the
    /// settings until a remote client takes over.
    #[must_use]
    pub const fn new(initial: SynthSettings) -> Self {
        Self {
            owner: ControlOwner::Panel,
            active: initial,
            shadow: initial,
            tuner_programmed: false,
            tuner_min: 0,
            tuner_max: 0,
        }
    }

    /// Current control owner.
    #[must_use]
    pub const fn owner(&self) -> ControlOwner {
        self.owner
    }

    /// Returns `true` while the remote client owns the settings.
    #[must_use]
    pub const fn is_remote_controlling(&self) -> bool {
        matches!(self.owner, ControlOwner::Remote)
    }

    /// Active settings image driving the sound module.
    #[must_use]
    pub const fn settings(&self) -> &SynthSettings {
        &self.active
    }

    /// Shadow image tracking the last physical scan.
    #[must_use]
    pub const fn shadow(&self) -> &SynthSettings {
        &self.shadow
    }

    /// Mirrored tuner programming status for remote status queries.
    #[must_use]
    pub const fn tuner_mirror(&self) -> (bool, i32, i32) {
        (self.tuner_programmed, self.tuner_min, self.tuner_max)
    }

    /// Applies a panel observation.
    ///
    /// The shadow always records the observation. While the panel owns the
    /// settings it applies directly; while the remote owns them the
    /// transition forces the owner back to the panel and promotes the whole
    /// shadow atomically. Returns `true` when control transferred.
    pub fn observe_panel(&mut self, event: PanelEvent) -> bool {
        match event {
            PanelEvent::Mode(id, mode) => self.shadow.channels[id.as_index()].mode = mode,
            PanelEvent::Enable(id, enabled) => {
                self.shadow.channels[id.as_index()].enabled = enabled;
            }
            PanelEvent::SoundOn(on) => self.shadow.sound_on = on,
        }

        let transferred = matches!(self.owner, ControlOwner::Remote);
        self.owner = ControlOwner::Panel;
        self.active = self.shadow;
        transferred
    }

    /// Records a full switch scan.
    ///
    /// A scan reports absolute positions, not transitions, so it never
    /// transfers control: while the remote owns the settings the image lands
    /// in the shadow only, ready for the next hand-back.
    pub fn record_scan(&mut self, image: SynthSettings) {
        self.shadow = image;
        if !self.is_remote_controlling() {
            self.active = image;
        }
    }

    /// Notes a physical actuation that carries no settings value, such as a
    /// button press. Returns `true` when it reclaimed control for the panel.
    pub fn observe_panel_actuation(&mut self) -> bool {
        if self.is_remote_controlling() {
            self.owner = ControlOwner::Panel;
            self.active = self.shadow;
            true
        } else {
            false
        }
    }

    /// Grants control to the remote client, inheriting the last-known active
    /// values untouched.
    pub fn grant_remote(&mut self) {
        self.owner = ControlOwner::Remote;
    }

    /// Remote client surrenders control; the last panel scan is restored
    /// exactly as a physical actuation would restore it. Returns `true` when
    /// the remote actually held control.
    pub fn revoke_remote(&mut self) -> bool {
        self.observe_panel_actuation()
    }

    /// Applies a remote mode write, honoring ownership.
    ///
    /// The write is recorded even when the channel is disabled, so the mode
    /// sticks for when the channel is enabled later.
    pub fn remote_set_mode(&mut self, id: SynthId, mode: SynthMode) -> Result<(), IgnoredReason> {
        self.remote_write(|settings| settings.channels[id.as_index()].mode = mode)
    }

    /// Applies a remote enable write, honoring ownership.
    pub fn remote_set_enabled(&mut self, id: SynthId, enabled: bool) -> Result<(), IgnoredReason> {
        self.remote_write(|settings| settings.channels[id.as_index()].enabled = enabled)
    }

    /// Applies a remote master sound write, honoring ownership.
    pub fn remote_set_sound(&mut self, on: bool) -> Result<(), IgnoredReason> {
        self.remote_write(|settings| settings.sound_on = on)
    }

    /// Updates the tuner mirror exposed through status queries.
    pub fn mirror_tuner(&mut self, programmed: bool, min: i32, max: i32) {
        self.tuner_programmed = programmed;
        self.tuner_min = min;
        self.tuner_max = max;
    }

    fn remote_write<F>(&mut self, write: F) -> Result<(), IgnoredReason>
    where
        F: FnOnce(&mut SynthSettings),
    {
        if self.is_remote_controlling() {
            write(&mut self.active);
            Ok(())
        } else {
            Err(IgnoredReason::OwnerMismatch)
        }
    }
}
