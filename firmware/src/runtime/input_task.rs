use embassy_time::{Duration, Ticker};

use tuner_core::controller::InputEvent;
use tuner_core::input::{ButtonEdge, ButtonId};

use crate::hw::ControlSurface;
use crate::panel::{PanelScanner, SwitchSample};
use crate::quadrature::QuadratureDecoder;

use super::InputSender;

/// Poll period for the encoder, buttons, and switch scan. The encoder needs
/// the fastest attention; everything else just rides along.
const POLL_PERIOD_MS: u64 = 2;

#[embassy_executor::task]
pub async fn run(
    surface: ControlSurface<'static>,
    boot_scan: SwitchSample,
    sender: InputSender,
) -> ! {
    let (clk, data) = surface.encoder_levels();
    let mut decoder = QuadratureDecoder::new(clk, data);
    let mut select = ButtonEdge::new();
    let mut looper = ButtonEdge::new();
    let mut scanner = PanelScanner::new(boot_scan);

    let mut ticker = Ticker::every(Duration::from_millis(POLL_PERIOD_MS));
    loop {
        ticker.next().await;

        let (clk, data) = surface.encoder_levels();
        if let Some(pulse) = decoder.update(clk, data) {
            forward(&sender, InputEvent::Encoder(pulse));
        }

        if select.update(surface.select_level()) {
            forward(&sender, InputEvent::Press(ButtonId::Select));
        }
        if looper.update(surface.loop_level()) {
            forward(&sender, InputEvent::Press(ButtonId::Loop));
        }

        for event in scanner.diff(surface.scan()) {
            forward(&sender, InputEvent::Panel(event));
        }
    }
}

// Encoder deltas must not be silently coalesced, so a full queue is worth a
// log line even though the tick loop usually drains it within 10 ms.
fn forward(sender: &InputSender, event: InputEvent) {
    if sender.try_send(event).is_err() {
        super::note_dropped_input();
        defmt::warn!("input: queue full, notification dropped");
    }
}
