//! UPS-Link Status Demo
//!
//! Opens a port, switches the UPS to smart mode, prints the common
//! readings and returns it to simple mode.
//!
//! Usage:
//!   cargo run --example status_demo -- [OPTIONS] [PORT]
//!
//! Options:
//!   --port PORT       Serial port (default: /dev/ttyS0)
//!   --config FILE     Load link settings from a JSON file
//!   --json            Print one JSON snapshot instead of a table
//!   --list            List serial ports and exit
//!
//! Set RUST_LOG=upslink_core=debug to see every exchange.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use upslink_core::config::LinkConfig;
use upslink_core::protocol::{list_ports, CommandError, UpsLink};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut port_name = "/dev/ttyS0".to_string();
    let mut config_path: Option<String> = None;
    let mut as_json = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                i += 1;
                if i < args.len() {
                    port_name = args[i].clone();
                }
            }
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(args[i].clone());
                }
            }
            "--json" => as_json = true,
            "--list" => {
                for port in list_ports() {
                    println!("{}", port.name);
                }
                return Ok(());
            }
            arg if !arg.starts_with('-') => port_name = arg.to_string(),
            other => anyhow::bail!("unknown option {}", other),
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => {
            LinkConfig::load(&path).with_context(|| format!("loading {}", path))?
        }
        None => LinkConfig::for_port(port_name),
    };

    let mut ups = UpsLink::serial(config);
    ups.open()
        .with_context(|| format!("opening {}", ups.config().port_name))?;
    ups.enter_smart_mode().context("entering smart mode")?;

    if as_json {
        println!("{}", ups.snapshot().to_json()?);
    } else {
        print_reading("Line voltage", ups.line_voltage(), "V");
        print_reading("Output voltage", ups.output_voltage(), "V");
        print_reading("Frequency", ups.frequency(), "Hz");
        print_reading("Load", ups.load_power(), "%");
        print_reading("Battery capacity", ups.battery_capacity(), "%");
        print_reading("Battery voltage", ups.battery_voltage(), "V");
        print_reading("Temperature", ups.internal_temperature(), "°C");
        match ups.ups_status() {
            Ok(status) => println!(
                "{:<18} {} (on line: {}, on battery: {})",
                "Status",
                status.value(),
                status.on_line(),
                status.on_battery()
            ),
            Err(e) => println!("{:<18} error {} ({})", "Status", e.legacy_code(), e),
        }
    }

    ups.return_to_simple_mode()
        .context("returning to simple mode")?;
    ups.close()?;
    Ok(())
}

fn print_reading(label: &str, reading: Result<f64, CommandError>, unit: &str) {
    match reading {
        Ok(value) => println!("{:<18} {:.2} {}", label, value, unit),
        Err(e) => println!("{:<18} error {} ({})", label, e.legacy_code(), e),
    }
}
