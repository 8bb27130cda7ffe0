//! CLI argument definitions using clap.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use contracts::{AgentKind, Behavior, ClientBlueprint};
use tracing::info;

use crate::error::CliError;

/// CARLA HUD - live sensor overlay client
#[derive(Parser, Debug)]
#[command(
    name = "carla-hud",
    author,
    version,
    about = "Live sensor overlay client for the CARLA simulator",
    long_about = "Connects to the simulator, spawns a vehicle driven by a navigation agent, \n\
                  attaches sensors and draws their latest readings over the camera feed."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CARLA_HUD_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "CARLA_HUD_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect, spawn the player and run the render loop
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Optional configuration file (TOML or JSON); flags override its values
    #[arg(short, long, env = "CARLA_HUD_CONFIG")]
    pub config: Option<PathBuf>,

    /// IP of the host server
    #[arg(long, env = "CARLA_HOST")]
    pub host: Option<String>,

    /// TCP port to listen to
    #[arg(short, long, env = "CARLA_PORT")]
    pub port: Option<u16>,

    /// Window resolution
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_resolution)]
    pub res: Option<Resolution>,

    /// Actor filter
    #[arg(long, env = "CARLA_HUD_FILTER")]
    pub filter: Option<String>,

    /// Gamma correction of the camera
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Sets a new random destination upon reaching the previous one
    #[arg(short = 'l', long = "loop")]
    pub loop_route: bool,

    /// Choose one of the possible agent behaviors
    #[arg(short, long, value_parser = parse_behavior)]
    pub behavior: Option<Behavior>,

    /// Select which agent to run
    #[arg(short, long, value_parser = parse_agent)]
    pub agent: Option<AgentKind>,

    /// Set seed for repeating executions
    #[arg(short, long, env = "CARLA_HUD_SEED")]
    pub seed: Option<u64>,

    /// Start recording camera frames immediately
    #[arg(long)]
    pub record: bool,

    /// Directory for recorded frames
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CARLA_HUD_METRICS_PORT")]
    pub metrics_port: u16,
}

impl RunArgs {
    /// Apply flag values on top of the configuration file
    pub fn apply_overrides(&self, blueprint: &mut ClientBlueprint) {
        if let Some(ref host) = self.host {
            info!(host = %host, "Overriding simulator host from CLI");
            blueprint.client.host = host.clone();
        }
        if let Some(port) = self.port {
            blueprint.client.port = port;
        }
        if let Some(res) = self.res {
            blueprint.display.width = res.width;
            blueprint.display.height = res.height;
        }
        if let Some(ref filter) = self.filter {
            blueprint.vehicle.filter = filter.clone();
        }
        if let Some(gamma) = self.gamma {
            blueprint.vehicle.gamma = gamma;
        }
        if self.loop_route {
            blueprint.agent.loop_route = true;
        }
        if let Some(behavior) = self.behavior {
            blueprint.agent.behavior = behavior;
        }
        if let Some(kind) = self.agent {
            blueprint.agent.kind = kind;
        }
        if self.seed.is_some() {
            blueprint.agent.seed = self.seed;
        }
        if self.record {
            blueprint.recording.enabled = true;
        }
        if let Some(ref dir) = self.output_dir {
            blueprint.recording.output_dir = dir.clone();
        }
    }

    pub fn metrics_port(&self) -> Option<u16> {
        (self.metrics_port != 0).then_some(self.metrics_port)
    }
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "client.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Display resolution given as `WIDTHxHEIGHT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = CliError;

    /// Digits only on both sides of a single `x`, both non-zero
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CliError::invalid_resolution(s);
        let (w, h) = s.split_once('x').ok_or_else(invalid)?;
        let parse = |part: &str| -> Result<u32, CliError> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            match part.parse::<u32>() {
                Ok(0) | Err(_) => Err(invalid()),
                Ok(v) => Ok(v),
            }
        };
        Ok(Self {
            width: parse(w)?,
            height: parse(h)?,
        })
    }
}

fn parse_resolution(s: &str) -> Result<Resolution, CliError> {
    s.parse()
}

fn parse_behavior(s: &str) -> Result<Behavior, String> {
    s.parse()
}

fn parse_agent(s: &str) -> Result<AgentKind, String> {
    s.parse()
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_strict() {
        assert_eq!(
            "1280x720".parse::<Resolution>().unwrap(),
            Resolution {
                width: 1280,
                height: 720
            }
        );
        for bad in ["1280X720", "1280x", "x720", "0x720", "12 80x720", "+1280x720", "1280x720x2", ""] {
            assert!(bad.parse::<Resolution>().is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "carla-hud", "-v", "run", "--res", "800x600", "--loop", "-b", "aggressive", "-a",
            "Roaming", "-s", "7", "--filter", "vehicle.tesla.*",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };

        let mut blueprint = ClientBlueprint::default();
        args.apply_overrides(&mut blueprint);
        assert_eq!((blueprint.display.width, blueprint.display.height), (800, 600));
        assert!(blueprint.agent.loop_route);
        assert_eq!(blueprint.agent.behavior, Behavior::Aggressive);
        assert_eq!(blueprint.agent.kind, AgentKind::Roaming);
        assert_eq!(blueprint.agent.seed, Some(7));
        assert_eq!(blueprint.vehicle.filter, "vehicle.tesla.*");
        // untouched values keep the file/default value
        assert_eq!(blueprint.client.port, 2000);
        assert_eq!(args.metrics_port(), None);
    }

    #[test]
    fn test_rejects_bad_enums() {
        assert!(Cli::try_parse_from(["carla-hud", "run", "-b", "reckless"]).is_err());
        assert!(Cli::try_parse_from(["carla-hud", "run", "-a", "roaming"]).is_err());
        assert!(Cli::try_parse_from(["carla-hud", "run", "--res", "800*600"]).is_err());
    }
}
