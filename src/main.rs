use std::io::Write;

use log::{debug, info};

use prom_textfile::*;

fn main() -> Result<(), String> {
    cli::init_logging();

    let invocation = cli::parse_args().map_err(|e| {
        eprintln!("{}", cli::usage());
        e.to_string()
    })?;
    if invocation.help {
        debug!("Help requested, showing usage and exiting.");
        eprintln!("{}", cli::usage());
        return Ok(());
    }

    info!(
        "Starting up with {} options, output to {:?}",
        invocation.flags.len(),
        invocation.output
    );

    let buffer = translate(invocation.flags).map_err(|e| e.to_string())?;
    match invocation.output {
        Some(path) => textfile::write_atomically(&path, &buffer),
        None => std::io::stdout()
            .lock()
            .write_all(buffer.as_bytes())
            .map_err(|e| format!("Can't write to standard output: {}", e)),
    }
}
