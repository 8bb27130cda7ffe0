//! `run` command implementation.

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::ClientBlueprint;
use recorder::{ImageFileSink, RecorderHandle};
use simulator::{MockSimulator, SimulatorClient};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::game::{ExitReason, GameLoop, InputEvent};

/// Key presses buffered between two frames
const INPUT_CAPACITY: usize = 32;

/// Execute the `run` command
pub async fn run_client(args: &RunArgs) -> Result<()> {
    let blueprint = load_blueprint(args)?;

    if let Some(port) = args.metrics_port() {
        observability::init_metrics_only(port)?;
    }

    info!(
        host = %blueprint.client.host,
        port = blueprint.client.port,
        res = %format!("{}x{}", blueprint.display.width, blueprint.display.height),
        agent = %blueprint.agent.kind,
        "Connecting to simulator"
    );

    let mut client = MockSimulator::new(blueprint.world.clone());
    connect_within(&mut client, &blueprint).await?;

    let recorder = RecorderHandle::spawn(
        ImageFileSink::new("png", &blueprint.recording.output_dir),
        blueprint.recording.queue_capacity,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(true);
            }
            Err(e) => warn!(error = %e, "Failed to install Ctrl+C handler"),
        }
    });

    let (input_tx, input_rx) = async_channel::bounded(INPUT_CAPACITY);
    spawn_stdin_reader(input_tx);

    let outcome = match GameLoop::new(
        Arc::new(client),
        &blueprint,
        input_rx,
        shutdown_rx,
        Some(recorder.frame_callback()),
    ) {
        Ok(game) => game.run().await,
        Err(e) => Err(e),
    };

    let recorded = Arc::clone(recorder.metrics());
    recorder.shutdown().await;
    let recorded = recorded.snapshot();
    if recorded.dropped > 0 {
        warn!(
            recorded = recorded.recorded,
            dropped = recorded.dropped,
            dir = %blueprint.recording.output_dir,
            "Recorder could not keep up, frames dropped"
        );
    } else if recorded.recorded > 0 {
        info!(
            recorded = recorded.recorded,
            dir = %blueprint.recording.output_dir,
            "Recording saved"
        );
    }

    match outcome? {
        ExitReason::Interrupted => println!("\nCancelled by user. Bye!"),
        ExitReason::RouteFinished => debug!("Route finished"),
        ExitReason::Quit => debug!("Quit requested"),
    }
    Ok(())
}

/// Connect, giving up after `client.connect_timeout_secs`
async fn connect_within<C: SimulatorClient>(
    client: &mut C,
    blueprint: &ClientBlueprint,
) -> Result<()> {
    let (host, port) = (&blueprint.client.host, blueprint.client.port);
    let timeout = Duration::from_secs_f64(blueprint.client.connect_timeout_secs);

    tokio::time::timeout(timeout, client.connect(host, port, timeout))
        .await
        .map_err(|_| anyhow::anyhow!("timed out after {timeout:?}"))
        .and_then(|connected| connected.map_err(anyhow::Error::from))
        .with_context(|| format!("Failed to connect to simulator at {host}:{port}"))
}

/// Defaults, then the optional config file, then flags
fn load_blueprint(args: &RunArgs) -> Result<ClientBlueprint> {
    let mut blueprint = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => ClientBlueprint::default(),
    };

    args.apply_overrides(&mut blueprint);
    ConfigLoader::validate(&blueprint).context("Invalid client settings")?;
    Ok(blueprint)
}

/// One key per line, e.g. `tab`, `shift+c`, `esc`
///
/// Runs on a detached thread so a pending read never delays process exit.
fn spawn_stdin_reader(tx: async_channel::Sender<InputEvent>) {
    let spawned = std::thread::Builder::new()
        .name("keyboard".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "Failed to read keyboard input");
                        break;
                    }
                };
                match InputEvent::parse(&line) {
                    Some(event) => {
                        if tx.send_blocking(event).is_err() {
                            break;
                        }
                    }
                    None => debug!(input = %line.trim(), "unrecognised key"),
                }
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "Keyboard input unavailable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use contracts::{
        ActorControl, ActorId, ContractError, SensorSource, SensorSpawner, SensorSpec, Transform,
        WeatherParameters, WorldSnapshot,
    };
    use simulator::{ActorBlueprint, SpawnRequest, TickCallback, TickCallbackId};

    /// Server that accepts the connection but never answers
    struct UnresponsiveServer;

    impl SensorSpawner for UnresponsiveServer {
        fn spawn_sensor(
            &self,
            spec: &SensorSpec,
            _parent: ActorId,
        ) -> std::result::Result<Box<dyn SensorSource>, ContractError> {
            Err(ContractError::spawn(&spec.blueprint, "not connected"))
        }
    }

    impl SimulatorClient for UnresponsiveServer {
        async fn connect(
            &mut self,
            _host: &str,
            _port: u16,
            _timeout: Duration,
        ) -> simulator::Result<()> {
            std::future::pending().await
        }

        fn map_name(&self) -> simulator::Result<String> {
            Err(simulator::SimulatorError::NotConnected)
        }

        fn spawn_points(&self) -> simulator::Result<Vec<Transform>> {
            Err(simulator::SimulatorError::NotConnected)
        }

        fn blueprints(&self, _filter: &str) -> Vec<ActorBlueprint> {
            Vec::new()
        }

        async fn try_spawn_actor(
            &self,
            _request: &SpawnRequest,
        ) -> simulator::Result<Option<ActorId>> {
            Err(simulator::SimulatorError::NotConnected)
        }

        async fn destroy_actor(&self, _actor_id: ActorId) -> simulator::Result<()> {
            Ok(())
        }

        async fn wait_for_tick(
            &self,
            _timeout: Duration,
        ) -> simulator::Result<Option<WorldSnapshot>> {
            Ok(None)
        }

        fn on_tick(&self, _callback: TickCallback) -> TickCallbackId {
            TickCallbackId(0)
        }

        fn remove_on_tick(&self, _id: TickCallbackId) {}

        fn apply_control(
            &self,
            _actor_id: ActorId,
            _control: ActorControl,
        ) -> simulator::Result<()> {
            Err(simulator::SimulatorError::NotConnected)
        }

        fn set_weather(&self, _weather: WeatherParameters) {}

        fn snapshot(&self) -> WorldSnapshot {
            WorldSnapshot {
                timestamp: Default::default(),
                map_name: String::new(),
                player: None,
                actors: Vec::new(),
            }
        }
    }

    #[tokio::test]
    async fn test_connect_gives_up_after_timeout() {
        let mut blueprint = ClientBlueprint::default();
        blueprint.client.connect_timeout_secs = 0.05;

        let started = std::time::Instant::now();
        let err = connect_within(&mut UnresponsiveServer, &blueprint)
            .await
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(format!("{err:#}").contains("timed out"));
        assert!(err.to_string().contains("127.0.0.1:2000"));
    }

    #[tokio::test]
    async fn test_connect_within_timeout() {
        let blueprint = ClientBlueprint::default();
        let mut client = MockSimulator::manual(blueprint.world.clone());
        connect_within(&mut client, &blueprint).await.unwrap();
        assert!(client.map_name().is_ok());
    }

    #[test]
    fn test_load_blueprint_file_then_flags() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[client]\nport = 3000\n\n[display]\nwidth = 640\nheight = 480\n"
        )
        .unwrap();

        let args = RunArgs {
            config: Some(file.path().to_path_buf()),
            port: Some(4000),
            ..Default::default()
        };
        let blueprint = load_blueprint(&args).unwrap();
        assert_eq!(blueprint.client.port, 4000);
        assert_eq!(blueprint.display.width, 640);
    }

    #[test]
    fn test_missing_config_file() {
        let args = RunArgs {
            config: Some("/nonexistent/client.toml".into()),
            ..Default::default()
        };
        let err = load_blueprint(&args).unwrap_err();
        assert!(err.downcast_ref::<CliError>().is_some());
    }

    #[test]
    fn test_invalid_flags_rejected() {
        let args = RunArgs {
            gamma: Some(-1.0),
            ..Default::default()
        };
        assert!(load_blueprint(&args).is_err());
    }
}
