//! # Servo Control Demo Binary
//!
//! Brings one simulated CiA-402 axis up and runs the bench scenarios
//! against it: profile position, profile velocity and brake cycling.
//!
//! # Usage
//!
//! ```bash
//! # All scenarios with built-in defaults
//! servo_control
//!
//! # One scenario from a config file, debug logs as JSON
//! servo_control --config config/axis.toml --scenario velocity -v --json
//! ```

#![deny(warnings)]

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use servo_common::consts::DEFAULT_SAVE_TIMEOUT;
use servo_common::prelude::*;
use servo_control::config::{BrakeConfig, ControllerConfig, MotionProfile};
use servo_control::{AxisConfig, AxisHandle, Session};
use servo_sim::SimulatedLink;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Profile used when the config file has none.
const DEMO_PROFILE: MotionProfile = MotionProfile {
    velocity: 5.0,
    acceleration: 10.0,
    deceleration: 10.0,
};

const MOVE_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Servo Control - single-axis CiA-402 controller demo
#[derive(Parser, Debug)]
#[command(name = "servo_control")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Runs position, velocity and brake scenarios on a simulated servo axis")]
#[command(long_about = None)]
struct Args {
    /// Controller configuration file (TOML). Built-in defaults when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Scenario to run
    #[arg(short, long, value_enum, default_value = "all")]
    scenario: Scenario,

    /// Pause between steps, in milliseconds
    #[arg(long, default_value_t = 1000)]
    dwell_ms: u64,

    /// Persist drive parameters after the scenarios complete
    #[arg(long)]
    save_params: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    Position,
    Velocity,
    Brake,
    All,
}

impl Scenario {
    fn steps(self) -> &'static [Scenario] {
        match self {
            Self::Position => &[Self::Position],
            Self::Velocity => &[Self::Velocity],
            Self::Brake => &[Self::Brake],
            Self::All => &[Self::Position, Self::Velocity, Self::Brake],
        }
    }
}

fn main() {
    if let Err(e) = run() {
        error!("Servo control failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => ControllerConfig::load_validated(path),
        None => Ok(default_config()),
    };
    let default_level = loaded
        .as_ref()
        .map(|config| Level::from(config.shared.log_level))
        .unwrap_or(Level::INFO);
    setup_tracing(&args, default_level);
    let config = loaded?;

    info!(
        "Servo Control v{} starting ({})",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    let link = SimulatedLink::with_nodes([config.axis.node_id]);
    let session = Session::open(link, &config.link)?.with_timing(config.axis.timing);
    let dwell = Duration::from_millis(args.dwell_ms);

    let outcome = run_scenarios(&session, &config, &args, dwell);

    let link = session.close()?;
    info!(calls = link.journal().len(), "Link released");
    outcome
}

fn run_scenarios<L: DeviceLink>(
    session: &Session<L>,
    config: &ControllerConfig,
    args: &Args,
    dwell: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut axis = session.initialize_axis(&config.axis, &config.link.scan)?;
    let profile = config.axis.profile.unwrap_or(DEMO_PROFILE);

    for (i, step) in args.scenario.steps().iter().enumerate() {
        if i > 0 {
            thread::sleep(dwell);
        }
        info!("--- {:?} scenario ---", step);
        let result = match step {
            Scenario::Position => position_scenario(&mut axis, &profile, dwell),
            Scenario::Velocity => velocity_scenario(&mut axis, &profile, dwell),
            Scenario::Brake => brake_scenario(&mut axis, dwell),
            Scenario::All => Ok(()),
        };
        if let Err(e) = result {
            error!("{:?} scenario aborted: {}", step, e);
            // Leave the axis held and unpowered before reporting.
            if let Err(e) = axis.engage_brake() {
                warn!("Brake engage after abort failed: {}", e);
            }
            axis.close()?;
            return Err(e);
        }
    }

    if args.save_params {
        axis.save_parameters(DEFAULT_SAVE_TIMEOUT)?;
    }
    axis.close()?;
    Ok(())
}

fn position_scenario<L: DeviceLink>(
    axis: &mut AxisHandle<'_, L>,
    profile: &MotionProfile,
    dwell: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    axis.switch_mode(WorkMode::ProfilePosition)?;
    axis.set_motion_profile(profile)?;
    axis.enable()?;
    axis.release_brake()?;

    info!("Relative move +10.0");
    axis.move_relative(10.0, true)?;
    report_move(axis)?;

    thread::sleep(dwell);

    info!("Absolute move to 0.0");
    axis.move_absolute(0.0, true)?;
    report_move(axis)?;

    axis.engage_brake()?;
    axis.disable()?;
    Ok(())
}

fn velocity_scenario<L: DeviceLink>(
    axis: &mut AxisHandle<'_, L>,
    profile: &MotionProfile,
    dwell: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    axis.switch_mode(WorkMode::ProfileVelocity)?;
    axis.set_motion_profile(profile)?;
    axis.enable()?;
    axis.release_brake()?;

    for velocity in [3.0, -3.0] {
        info!("Velocity run {velocity:+.1}");
        axis.run_velocity(velocity)?;
        for _ in 0..5 {
            thread::sleep(dwell / 2);
            print_status(axis)?;
        }
    }

    info!("Stopping");
    axis.run_velocity(0.0)?;
    thread::sleep(dwell);
    print_status(axis)?;

    axis.engage_brake()?;
    axis.disable()?;
    Ok(())
}

fn brake_scenario<L: DeviceLink>(
    axis: &mut AxisHandle<'_, L>,
    dwell: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    axis.switch_mode(WorkMode::ProfilePosition)?;
    axis.enable()?;

    for _ in 0..2 {
        axis.release_brake()?;
        thread::sleep(dwell);
        axis.engage_brake()?;
        thread::sleep(dwell);
    }

    axis.disable()?;
    Ok(())
}

fn report_move<L: DeviceLink>(axis: &AxisHandle<'_, L>) -> Result<(), Box<dyn std::error::Error>> {
    if axis.wait_target_reached(MOVE_TIMEOUT, POLL_INTERVAL)? {
        info!("Move complete");
        print_status(axis)?;
    } else {
        warn!("Move did not complete within {:?}", MOVE_TIMEOUT);
    }
    Ok(())
}

fn print_status<L: DeviceLink>(axis: &AxisHandle<'_, L>) -> Result<(), Box<dyn std::error::Error>> {
    let status = axis.get_status()?;
    println!("{}", serde_json::to_string(&status)?);
    Ok(())
}

/// Vendor bench defaults: node 1 with a brake on DO bit 0.
fn default_config() -> ControllerConfig {
    let mut axis = AxisConfig::new(NodeId::new_const(1));
    axis.brake = Some(BrakeConfig::default());
    ControllerConfig {
        shared: Default::default(),
        link: Default::default(),
        axis,
    }
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args, default_level: Level) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        default_level
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
