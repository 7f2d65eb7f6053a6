//! Event ring shared by the firmware log task and the emulator.
//!
//! The controller records every externally visible transition into a
//! fixed-size ring so status tooling can replay recent history without any
//! allocation. Records carry whatever monotonic instant the platform uses.

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::arbiter::ControlOwner;
use crate::config::EVENT_RING_CAPACITY;
use crate::tuner::StepDirection;

/// Identifier assigned to recorded events in order of occurrence.
pub type EventId = u32;

/// Reason a request was dropped without acting on it.
///
/// Ignored requests are not failures; they degrade to no-ops preserving the
/// last good state and surface only through status queries.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IgnoredReason {
    /// Loop start requested before a sweep range was programmed.
    NotProgrammed,
    /// Remote write arrived while the panel owned the settings.
    OwnerMismatch,
}

impl fmt::Display for IgnoredReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoredReason::NotProgrammed => f.write_str("not-programmed"),
            IgnoredReason::OwnerMismatch => f.write_str("owner-mismatch"),
        }
    }
}

/// Discriminated events recorded by the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ControlEvent {
    /// A sweep capture armed.
    SelectionStarted,
    /// A sweep capture committed with normalized bounds.
    CalibrationCommitted { min: i32, max: i32 },
    /// A capture collapsed to zero width and was abandoned.
    CalibrationInvalid,
    /// The sweep loop started.
    LoopStarted,
    /// The sweep loop halted.
    LoopHalted,
    /// The sweep reached a bound and reversed into `direction`.
    BoundReached(StepDirection),
    /// Settings ownership moved to `owner`.
    ControlTransferred(ControlOwner),
    /// A request was dropped.
    CommandIgnored(IgnoredReason),
}

impl fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlEvent::SelectionStarted => f.write_str("selection-started"),
            ControlEvent::CalibrationCommitted { min, max } => {
                write!(f, "calibration-committed [{min}, {max}]")
            }
            ControlEvent::CalibrationInvalid => f.write_str("calibration-invalid"),
            ControlEvent::LoopStarted => f.write_str("loop-started"),
            ControlEvent::LoopHalted => f.write_str("loop-halted"),
            ControlEvent::BoundReached(direction) => {
                let next = match direction {
                    StepDirection::Cw => "cw",
                    StepDirection::Ccw => "ccw",
                };
                write!(f, "bound-reached next={next}")
            }
            ControlEvent::ControlTransferred(owner) => {
                let owner = match owner {
                    ControlOwner::Panel => "panel",
                    ControlOwner::Remote => "remote",
                };
                write!(f, "control-transferred {owner}")
            }
            ControlEvent::CommandIgnored(reason) => write!(f, "command-ignored {reason}"),
        }
    }
}

/// Event record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EventRecord<TInstant>
where
    TInstant: Copy,
{
    pub id: EventId,
    pub timestamp: TInstant,
    pub event: ControlEvent,
}

/// Records control events into a fixed-size ring buffer.
pub struct EventRecorder<TInstant, const CAPACITY: usize = EVENT_RING_CAPACITY>
where
    TInstant: Copy,
{
    ring: HistoryBuf<EventRecord<TInstant>, CAPACITY>,
    next_event_id: EventId,
}

impl<TInstant, const CAPACITY: usize> EventRecorder<TInstant, CAPACITY>
where
    TInstant: Copy,
{
    /// Creates a recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Records an event, returning its identifier.
    pub fn record(&mut self, event: ControlEvent, timestamp: TInstant) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(EventRecord {
            id,
            timestamp,
            event,
        });

        id
    }

    /// Returns the most recent record, if any.
    pub fn latest(&self) -> Option<&EventRecord<TInstant>> {
        self.ring.recent()
    }

    /// Returns an iterator over records in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, EventRecord<TInstant>> {
        self.ring.oldest_ordered()
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<TInstant, const CAPACITY: usize> Default for EventRecorder<TInstant, CAPACITY>
where
    TInstant: Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_in_recording_order() {
        let mut recorder = EventRecorder::<u64>::new();

        assert_eq!(recorder.record(ControlEvent::SelectionStarted, 10), 0);
        assert_eq!(recorder.record(ControlEvent::CalibrationInvalid, 20), 1);
        assert_eq!(recorder.len(), 2);

        let latest = recorder.latest().copied().unwrap();
        assert_eq!(latest.event, ControlEvent::CalibrationInvalid);
        assert_eq!(latest.timestamp, 20);
    }

    #[test]
    fn ring_drops_oldest_beyond_capacity() {
        let mut recorder = EventRecorder::<u64, 4>::new();

        for stamp in 0..6u64 {
            recorder.record(ControlEvent::LoopStarted, stamp);
        }

        assert_eq!(recorder.len(), 4);
        let oldest = recorder.oldest_first().next().copied().unwrap();
        assert_eq!(oldest.timestamp, 2);
        assert_eq!(oldest.id, 2);
    }

    #[test]
    fn empty_recorder_reports_no_records() {
        let recorder = EventRecorder::<u64>::new();
        assert!(recorder.is_empty());
        assert!(recorder.latest().is_none());
    }
}
