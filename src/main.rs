//! hapticc - compile tactile patterns into actuator frames
//!
//! # Usage
//!
//! ```bash
//! # Three actuators on for 500 ms at 60% duty, 150 Hz
//! hapticc static 0,1,2 --duty 60% --hz 150 --duration-ms 500
//!
//! # Apparent motion from actuator 0 through a phantom point to actuator 10
//! hapticc trajectory 0 90,90 10 --intensity 0.8 --step-s 0.06
//!
//! # Inspect a frame captured from the link
//! hapticc decode 0b153abcd6
//!
//! # Play a pulse pattern on a serial device
//! hapticc --send /dev/ttyUSB0 pulse 4,5 --duty 20 --pulse-ms 100 --pause-ms 50 --repetitions 3
//! ```
//!
//! # Environment Variables
//!
//! - `HAPTIC_CONFIG`: Path to the render config (default: ./haptic.toml, then built-ins)
//! - `RUST_LOG`: Logging level (default: info)
//!
//! Frames go to stdout as lowercase hex, one frame per line; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use haptic_render::config::RenderConfig;
use haptic_render::protocol::DutyLevel;
use haptic_render::transport::{dispatch, dispatch_paced, schedule};
use haptic_render::{ActuatorId, HapticRenderer, LogicalCommand, Waypoint};
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::info;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "hapticc")]
#[command(about = "Compile vibrotactile patterns into actuator command frames")]
#[command(version)]
struct CliArgs {
    /// Render config TOML (overrides HAPTIC_CONFIG and ./haptic.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the configured maximum frame size in bytes
    #[arg(long, global = true)]
    max_frame_bytes: Option<usize>,

    /// Print logical commands as JSON instead of hex frames
    #[arg(long, global = true)]
    json: bool,

    /// Write frames to this file or device instead of stdout.
    /// Layouts without a delay field are paced on the host.
    #[arg(long, global = true, value_name = "PATH")]
    send: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

/// Frequency given either as a table index or in Hz.
#[derive(clap::Args, Debug)]
struct FreqArgs {
    /// Frequency table index
    #[arg(long, default_value_t = 0, conflicts_with = "hz")]
    freq_index: u8,

    /// Frequency in Hz, mapped to the nearest table entry
    #[arg(long)]
    hz: Option<f64>,
}

#[derive(clap::Args, Debug)]
struct DriveArgs {
    /// Actuator ids, comma separated
    #[arg(value_delimiter = ',', required = true)]
    actuators: Vec<ActuatorId>,

    /// Duty as a raw protocol value ("12") or a percentage ("60%")
    #[arg(long, value_parser = parse_duty)]
    duty: DutyLevel,

    #[command(flatten)]
    freq: FreqArgs,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Every listed actuator on for one duration
    Static {
        #[command(flatten)]
        drive: DriveArgs,
        #[arg(long)]
        duration_ms: u32,
    },

    /// Synchronous on/off bursts
    Pulse {
        #[command(flatten)]
        drive: DriveArgs,
        #[arg(long)]
        pulse_ms: u32,
        #[arg(long)]
        pause_ms: u32,
        #[arg(long, default_value_t = 1)]
        repetitions: u32,
    },

    /// One actuator after another
    Sequential {
        #[command(flatten)]
        drive: DriveArgs,
        #[arg(long)]
        duration_ms: u32,
        #[arg(long, default_value_t = 0)]
        pause_ms: u32,
    },

    /// Apparent motion through actuator ids ("5") and points ("30,45.5")
    Trajectory {
        #[arg(required = true, allow_hyphen_values = true)]
        waypoints: Vec<Waypoint>,
        /// Normalized intensity, 0.0 to 1.0
        #[arg(long, default_value_t = 1.0)]
        intensity: f64,
        /// Per-step vibration duration in seconds
        #[arg(long)]
        step_s: f64,
        #[command(flatten)]
        freq: FreqArgs,
    },

    /// Stop the listed actuators, or every actuator in the layout
    StopAll {
        #[arg(value_delimiter = ',')]
        actuators: Vec<ActuatorId>,
    },

    /// Decode a hex frame into logical commands
    Decode { hex: String },

    /// Show the table index nearest to a frequency
    Freq { hz: f64 },
}

fn parse_duty(s: &str) -> Result<DutyLevel, String> {
    let s = s.trim();
    if let Some(pct) = s.strip_suffix('%') {
        pct.trim()
            .parse::<f64>()
            .map(DutyLevel::Percent)
            .map_err(|e| format!("invalid percentage '{s}': {e}"))
    } else {
        s.parse::<u8>()
            .map(DutyLevel::Raw)
            .map_err(|e| format!("invalid raw duty '{s}': {e}"))
    }
}

fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(&digits);
    hex::decode(digits).with_context(|| format!("invalid hex frame '{s}'"))
}

// ============================================================================
// Helpers
// ============================================================================

fn load_config(args: &CliArgs) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RenderConfig::load(),
    };
    if let Some(max) = args.max_frame_bytes {
        config.protocol.max_frame_bytes = max;
    }
    Ok(config)
}

fn freq_index(renderer: &HapticRenderer, freq: &FreqArgs) -> u8 {
    freq.hz.map_or(freq.freq_index, |hz| renderer.hz_to_index(hz))
}

fn resolve_duty(renderer: &HapticRenderer, duty: DutyLevel) -> Result<u8> {
    duty.resolve(renderer.duty_scale().max_duty)
        .context("resolving duty")
}

fn describe(cmd: &LogicalCommand) -> String {
    format!(
        "addr={:<3} {:<5} duty={:<3} freq={:<2} delay={}ms flags={}",
        cmd.address,
        if cmd.is_start() { "start" } else { "stop" },
        cmd.duty,
        cmd.freq_index,
        cmd.delay_ms,
        cmd.flags
    )
}

/// Print, or send, a compiled command list.
fn emit(renderer: &HapticRenderer, args: &CliArgs, commands: &[LogicalCommand]) -> Result<()> {
    if commands.is_empty() {
        info!("Pattern compiled to no commands");
        return Ok(());
    }

    if let Some(path) = &args.send {
        let mut link = OpenOptions::new()
            .write(true)
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening link {}", path.display()))?;

        let needs_pacing = renderer.codec().descriptor().delay_max().is_none()
            && commands.iter().any(|c| c.delay_ms > 0);
        let written = if needs_pacing {
            let batches = schedule(commands);
            info!(batches = batches.len(), "Pacing pattern on the host");
            dispatch_paced(
                renderer.codec(),
                &batches,
                renderer.max_frame_bytes(),
                &mut link,
                std::thread::sleep,
            )?
        } else {
            let frames = renderer.encode_batch(commands)?;
            dispatch(&frames, &mut link)?
        };
        info!(bytes = written, link = %path.display(), "Pattern sent");
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(commands)?);
        return Ok(());
    }

    let frames = renderer.encode_batch(commands)?;
    info!(
        commands = commands.len(),
        frames = frames.len(),
        "Pattern encoded"
    );
    for frame in &frames {
        println!("{}", frame.to_hex());
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    // Logs on stderr so stdout carries only frames
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    let renderer = HapticRenderer::from_config(&config).context("building renderer")?;

    match &args.command {
        SubCommand::Static { drive, duration_ms } => {
            let duty = resolve_duty(&renderer, drive.duty)?;
            let freq = freq_index(&renderer, &drive.freq);
            let cmds = renderer.compile_static(&drive.actuators, duty, freq, *duration_ms);
            emit(&renderer, &args, &cmds)
        }
        SubCommand::Pulse {
            drive,
            pulse_ms,
            pause_ms,
            repetitions,
        } => {
            let duty = resolve_duty(&renderer, drive.duty)?;
            let freq = freq_index(&renderer, &drive.freq);
            let cmds = renderer.compile_pulse(
                &drive.actuators,
                duty,
                freq,
                *pulse_ms,
                *pause_ms,
                *repetitions,
            )?;
            emit(&renderer, &args, &cmds)
        }
        SubCommand::Sequential {
            drive,
            duration_ms,
            pause_ms,
        } => {
            let duty = resolve_duty(&renderer, drive.duty)?;
            let freq = freq_index(&renderer, &drive.freq);
            let cmds =
                renderer.compile_sequential(&drive.actuators, duty, freq, *duration_ms, *pause_ms)?;
            emit(&renderer, &args, &cmds)
        }
        SubCommand::Trajectory {
            waypoints,
            intensity,
            step_s,
            freq,
        } => {
            let freq = freq_index(&renderer, freq);
            let cmds = renderer
                .compile_trajectory(waypoints, *intensity, freq, *step_s)
                .context("compiling trajectory")?;
            emit(&renderer, &args, &cmds)
        }
        SubCommand::StopAll { actuators } => {
            let cmds = if actuators.is_empty() {
                renderer.compile_stop_all()
            } else {
                haptic_render::patterns::compile_stop_all(actuators)
            };
            emit(&renderer, &args, &cmds)
        }
        SubCommand::Decode { hex } => {
            let bytes = parse_hex(hex)?;
            let cmds = renderer.decode_batch(&bytes).context("decoding frame")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&cmds)?);
            } else {
                for cmd in &cmds {
                    println!("{}", describe(cmd));
                }
            }
            Ok(())
        }
        SubCommand::Freq { hz } => {
            let index = renderer.hz_to_index(*hz);
            let actual = renderer.index_to_hz(i64::from(index));
            if args.json {
                println!(
                    "{}",
                    serde_json::json!({ "requested_hz": hz, "index": index, "hz": actual })
                );
            } else {
                println!("{hz} Hz -> index {index} ({actual:.1} Hz)");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duty_units() {
        assert_eq!(parse_duty("12").unwrap(), DutyLevel::Raw(12));
        assert_eq!(parse_duty("60%").unwrap(), DutyLevel::Percent(60.0));
        assert!(parse_duty("300").is_err());
        assert!(parse_duty("abc%").is_err());
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("0b15 3abc").unwrap(), vec![0x0b, 0x15, 0x3a, 0xbc]);
        assert_eq!(parse_hex("0xff").unwrap(), vec![0xff]);
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
        assert!(parse_hex("é1").is_err());
        assert_eq!(parse_hex("0XAB").unwrap(), vec![0xab]);
    }

    #[test]
    fn test_cli_parses_trajectory_tokens() {
        let args = CliArgs::try_parse_from([
            "hapticc", "trajectory", "0", "90,90", "10", "--step-s", "0.06", "--hz", "150",
        ])
        .unwrap();
        match args.command {
            SubCommand::Trajectory { waypoints, freq, .. } => {
                assert_eq!(waypoints.len(), 3);
                assert_eq!(waypoints[0], Waypoint::Actuator(0));
                assert_eq!(freq.hz, Some(150.0));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }
}
