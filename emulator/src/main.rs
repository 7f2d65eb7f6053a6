mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use session::Session;

use tuner_core::input::DebouncePolicy;

fn main() -> io::Result<()> {
    let policy = parse_policy().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: tuner-emulator [--debounce <valid-reading-index>]");
        process::exit(2);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut session = Session::new(policy);
    let mut line = String::new();

    writeln!(
        writer,
        "Radio Tuner Emulator ready. Type `help` for commands or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        for response in session.handle_command(trimmed) {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_policy() -> Result<DebouncePolicy, String> {
    let mut args = env::args().skip(1);
    match args.next() {
        None => Ok(DebouncePolicy::device_default()),
        Some(arg) => {
            let value = if let Some(value) = arg.strip_prefix("--debounce=") {
                value.to_string()
            } else if arg == "--debounce" {
                args.next().ok_or("Expected value after --debounce")?
            } else {
                return Err(format!("Unknown argument `{arg}`"));
            };

            value
                .parse::<u8>()
                .map(DebouncePolicy::new)
                .map_err(|_| format!("Invalid debounce index `{value}`"))
        }
    }
}
