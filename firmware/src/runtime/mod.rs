use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::Instant;

use tuner_core::config::INPUT_QUEUE_DEPTH;
use tuner_core::controller::{InputEvent, TunerController};
use tuner_core::input::DebouncePolicy;

use crate::hw::stepper::CoilStepper;
use crate::hw::synth::SynthControlLines;
use crate::hw::ControlSurface;

mod control_task;
mod input_task;
mod tick_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// Controller instantiated with the firmware clock and GPIO drivers.
pub type FirmwareController =
    TunerController<Instant, CoilStepper<'static>, SynthControlLines<'static>>;

/// Queue carrying input notifications from the platform tasks to the tick
/// loop. Each notification is consumed exactly once.
pub type InputQueue = Channel<ThreadModeRawMutex, InputEvent, INPUT_QUEUE_DEPTH>;

/// Convenience sender type alias for the input queue.
pub type InputSender = Sender<'static, ThreadModeRawMutex, InputEvent, INPUT_QUEUE_DEPTH>;

/// Convenience receiver type alias for the input queue.
pub type InputReceiver = Receiver<'static, ThreadModeRawMutex, InputEvent, INPUT_QUEUE_DEPTH>;

pub(super) static INPUT_QUEUE: InputQueue = Channel::new();

static DROPPED_INPUTS: portable_atomic::AtomicU32 = portable_atomic::AtomicU32::new(0);

/// Counts notifications lost to queue overflow so the tick loop can report
/// the running total instead of flooding the log.
fn note_dropped_input() {
    DROPPED_INPUTS.fetch_add(1, portable_atomic::Ordering::Relaxed);
}

fn dropped_inputs() -> u32 {
    DROPPED_INPUTS.load(portable_atomic::Ordering::Relaxed)
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA4,
        PA5,
        PA6,
        PA7,
        PA8,
        PA9,
        PA10,
        PA12,
        PA15,
        PB0,
        PB1,
        PB2,
        PB3,
        PB4,
        PB5,
        PB6,
        PB7,
        PB8,
        PB9,
        PC6,
        PC14,
        PC15,
        USART5,
        ..
    } = hal::init(config);

    let stepper = CoilStepper::new([
        Output::new(PA0, Level::Low, Speed::Low),
        Output::new(PA1, Level::Low, Speed::Low),
        Output::new(PA4, Level::Low, Speed::Low),
        Output::new(PA5, Level::Low, Speed::Low),
    ]);

    let synth_lines = SynthControlLines::new(
        [
            Output::new(PA9, Level::High, Speed::Low),
            Output::new(PA10, Level::High, Speed::Low),
            Output::new(PA12, Level::High, Speed::Low),
        ],
        [
            Output::new(PB2, Level::High, Speed::Low),
            Output::new(PC6, Level::High, Speed::Low),
            Output::new(PC14, Level::High, Speed::Low),
        ],
        Output::new(PC15, Level::High, Speed::Low),
    );

    let surface = ControlSurface::new(
        Input::new(PA6, Pull::Up),
        Input::new(PA7, Pull::Up),
        Input::new(PA8, Pull::Up),
        Input::new(PA15, Pull::Up),
        [
            Input::new(PB3, Pull::Up),
            Input::new(PB4, Pull::Up),
            Input::new(PB5, Pull::Up),
        ],
        [
            Input::new(PB6, Pull::Up),
            Input::new(PB7, Pull::Up),
            Input::new(PB8, Pull::Up),
        ],
        Input::new(PB9, Pull::Up),
    );

    // First physical scan seeds both settings images; the panel owns the
    // controls until a remote client takes over.
    let boot_scan = surface.scan();
    let controller = FirmwareController::new(
        DebouncePolicy::device_default(),
        boot_scan.settings(),
        stepper,
        synth_lines,
    );

    defmt::info!("radio tuner controller up, panel owns the controls");

    spawner
        .spawn(tick_task::run(controller, INPUT_QUEUE.receiver()))
        .expect("failed to spawn tick task");
    spawner
        .spawn(input_task::run(surface, boot_scan, INPUT_QUEUE.sender()))
        .expect("failed to spawn input task");
    spawner
        .spawn(control_task::run(USART5, PB0, PB1, INPUT_QUEUE.sender()))
        .expect("failed to spawn control link task");

    core::future::pending::<()>().await;
}
