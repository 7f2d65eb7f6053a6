use embassy_time::{Duration, Instant, Ticker};

use tuner_core::arbiter::ControlOwner;
use tuner_core::config::TICK_PERIOD_MS;
use tuner_core::events::{ControlEvent, EventId, IgnoredReason};
use tuner_core::tuner::StepDirection;

use super::{FirmwareController, InputReceiver};

/// Fixed-rate scheduler tick: drain queued notifications, advance the
/// controller by at most one motor step, then log whatever changed.
#[embassy_executor::task]
pub async fn run(mut controller: FirmwareController, receiver: InputReceiver) -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(TICK_PERIOD_MS));
    let mut last_logged: Option<EventId> = None;
    let mut last_dropped = 0u32;

    loop {
        ticker.next().await;

        while let Ok(event) = receiver.try_receive() {
            if controller.push_event(event).is_err() {
                super::note_dropped_input();
                defmt::warn!("tick: controller queue full, notification dropped");
            }
        }

        controller.tick(Instant::now());
        log_new_events(&controller, &mut last_logged);

        let dropped = super::dropped_inputs();
        if dropped != last_dropped {
            defmt::warn!("tick: {} notifications dropped since boot", dropped);
            last_dropped = dropped;
        }
    }
}

fn log_new_events(controller: &FirmwareController, last_logged: &mut Option<EventId>) {
    for record in controller.events().oldest_first() {
        if last_logged.is_some_and(|id| record.id <= id) {
            continue;
        }
        *last_logged = Some(record.id);
        log_event(record.event, record.timestamp);
    }
}

fn log_event(event: ControlEvent, timestamp: Instant) {
    let micros = timestamp.as_micros();
    match event {
        ControlEvent::SelectionStarted => {
            defmt::info!("tuner: selection started t={}us", micros);
        }
        ControlEvent::CalibrationCommitted { min, max } => {
            defmt::info!("tuner: calibration committed [{}, {}] t={}us", min, max, micros);
        }
        ControlEvent::CalibrationInvalid => {
            defmt::warn!("tuner: zero-width calibration discarded t={}us", micros);
        }
        ControlEvent::LoopStarted => {
            defmt::info!("tuner: loop started t={}us", micros);
        }
        ControlEvent::LoopHalted => {
            defmt::info!("tuner: loop halted t={}us", micros);
        }
        ControlEvent::BoundReached(StepDirection::Cw) => {
            defmt::debug!("tuner: lower bound reached, sweeping cw t={}us", micros);
        }
        ControlEvent::BoundReached(StepDirection::Ccw) => {
            defmt::debug!("tuner: upper bound reached, sweeping ccw t={}us", micros);
        }
        ControlEvent::ControlTransferred(ControlOwner::Panel) => {
            defmt::info!("control: panel reclaimed the controls t={}us", micros);
        }
        ControlEvent::ControlTransferred(ControlOwner::Remote) => {
            defmt::info!("control: remote client granted control t={}us", micros);
        }
        ControlEvent::CommandIgnored(IgnoredReason::NotProgrammed) => {
            defmt::warn!("command ignored: tuner not programmed t={}us", micros);
        }
        ControlEvent::CommandIgnored(IgnoredReason::OwnerMismatch) => {
            defmt::warn!("command ignored: sender does not own control t={}us", micros);
        }
    }
}
