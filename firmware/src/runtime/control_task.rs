use embassy_stm32 as hal;
use embassy_stm32::Peri;
use embassy_stm32::usart::{BufferedUart, Config as UartConfig, DataBits, Parity, StopBits};
use embassy_time::{Duration, Timer};
use embedded_io_async::{Read, Write};
use heapless::Vec;

use tuner_core::command::{self, CommandError};
use tuner_core::controller::InputEvent;

use super::InputSender;

/// Longest accepted request line, terminator excluded.
const MAX_LINE: usize = 32;
const UART_BUFFER_SIZE: usize = 128;
const BRIDGE_UART_BAUD: u32 = 115_200;

static mut UART_TX_BUFFER: [u8; UART_BUFFER_SIZE] = [0; UART_BUFFER_SIZE];
static mut UART_RX_BUFFER: [u8; UART_BUFFER_SIZE] = [0; UART_BUFFER_SIZE];

embassy_stm32::bind_interrupts!(struct UartIrqs {
    USART3_4_5_6_LPUART1 => embassy_stm32::usart::BufferedInterruptHandler<hal::peripherals::USART5>;
});

/// Receives `Name=value` request lines from the WiFi bridge, answers each
/// with its acknowledgement, and forwards accepted commands to the tick loop.
#[embassy_executor::task]
pub async fn run(
    usart: Peri<'static, hal::peripherals::USART5>,
    tx_pin: Peri<'static, hal::peripherals::PB0>,
    rx_pin: Peri<'static, hal::peripherals::PB1>,
    sender: InputSender,
) -> ! {
    let mut config = UartConfig::default();
    config.baudrate = BRIDGE_UART_BAUD;
    config.data_bits = DataBits::DataBits8;
    config.stop_bits = StopBits::STOP1;
    config.parity = Parity::ParityNone;

    let uart = unsafe {
        BufferedUart::new(
            usart,
            rx_pin,
            tx_pin,
            &mut UART_TX_BUFFER,
            &mut UART_RX_BUFFER,
            UartIrqs,
            config,
        )
        .expect("failed to initialize bridge UART")
    };

    let (mut uart_tx, mut uart_rx) = uart.split();

    let mut line: Vec<u8, MAX_LINE> = Vec::new();
    let mut overflowed = false;
    let mut ingress = [0u8; 32];

    loop {
        match uart_rx.read(&mut ingress).await {
            Ok(count) if count > 0 => {
                for &byte in &ingress[..count] {
                    if byte == b'\n' || byte == b'\r' {
                        if overflowed {
                            write_line(&mut uart_tx, "Error code 001").await;
                            overflowed = false;
                            line.clear();
                        } else if !line.is_empty() {
                            handle_line(&line, &sender, &mut uart_tx).await;
                            line.clear();
                        }
                    } else if !overflowed && line.push(byte).is_err() {
                        defmt::warn!("control: request line overflow, discarding");
                        overflowed = true;
                    }
                }
            }
            Ok(_) => {}
            Err(_) => {
                defmt::warn!("control: UART read error");
                Timer::after(Duration::from_millis(5)).await;
            }
        }
    }
}

async fn handle_line<W: Write>(line: &[u8], sender: &InputSender, uart_tx: &mut W) {
    let result = match core::str::from_utf8(line) {
        Ok(text) => command::parse_line(text),
        Err(_) => Err(CommandError::InvalidValue),
    };

    write_line(uart_tx, command::ack(&result)).await;

    match result {
        Ok(cmd) => {
            if sender.try_send(InputEvent::Remote(cmd)).is_err() {
                super::note_dropped_input();
                defmt::warn!("control: queue full, command dropped");
            }
        }
        Err(_) => {
            defmt::warn!("control: rejected request line");
        }
    }
}

async fn write_line<W: Write>(uart_tx: &mut W, response: &str) {
    for chunk in [response.as_bytes(), b"\r\n"] {
        let mut written = 0usize;
        while written < chunk.len() {
            match uart_tx.write(&chunk[written..]).await {
                Ok(count) if count > 0 => written += count,
                Ok(_) => {}
                Err(_) => {
                    defmt::warn!("control: UART write error");
                    return;
                }
            }
        }
    }

    if uart_tx.flush().await.is_err() {
        defmt::warn!("control: UART flush error");
    }
}
