//! Mock simulator client
//!
//! In-process stand-in for the simulator server. The world advances on a
//! background ticking thread (or by explicit `step` calls in manual mode),
//! delivering sensor data and tick callbacks from that thread exactly like
//! a real server's delivery thread would.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use contracts::{
    ActorControl, ActorId, ContractError, MockWorldConfig, SensorSource, SensorSpawner,
    SensorSpec, Timestamp, Transform, WeatherParameters, WorldSnapshot,
};
use parking_lot::Mutex;
use slab::Slab;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::client::{
    wildcard_match, ActorBlueprint, SimulatorClient, SpawnRequest, TickCallback, TickCallbackId,
};
use crate::error::{Result, SimulatorError};
use crate::mock_sensor::{MockSensor, SensorHub};
use crate::mock_world::WorldState;

/// Blueprint library of the mock server: (id, recommended colors)
const BLUEPRINT_LIBRARY: &[(&str, &[&str])] = &[
    ("vehicle.audi.a2", &["255,255,255", "20,20,20"]),
    ("vehicle.audi.tt", &["255,0,0", "0,0,255", "200,200,200"]),
    ("vehicle.lincoln.mkz_2017", &["17,37,103", "120,120,120"]),
    ("vehicle.mercedes.coupe_2020", &["0,0,0", "255,255,255"]),
    ("vehicle.nissan.patrol", &["100,100,100"]),
    ("vehicle.tesla.model3", &["255,255,255", "10,10,10", "180,0,0"]),
    ("walker.pedestrian.0001", &[]),
    ("walker.pedestrian.0002", &[]),
    ("sensor.camera.rgb", &[]),
    ("sensor.camera.depth", &[]),
    ("sensor.camera.semantic_segmentation", &[]),
    ("sensor.lidar.ray_cast", &[]),
    ("sensor.other.collision", &[]),
    ("sensor.other.lane_invasion", &[]),
    ("sensor.other.gnss", &[]),
];

/// State shared with the ticking thread
struct Shared {
    world: Mutex<WorldState>,
    sensors: Arc<SensorHub>,
    tick_callbacks: Mutex<Slab<TickCallback>>,
    snapshots: watch::Sender<WorldSnapshot>,
}

impl Shared {
    /// Advance one tick and deliver everything it produced
    fn step(&self) -> Timestamp {
        let (snapshot, events) = {
            let mut world = self.world.lock();
            let events = world.advance();
            (world.snapshot(), events)
        };
        let timestamp = snapshot.timestamp;

        self.sensors.deliver(&snapshot, &events);
        {
            let callbacks = self.tick_callbacks.lock();
            for (_, callback) in callbacks.iter() {
                callback(timestamp);
            }
        }
        self.snapshots.send_replace(snapshot);
        timestamp
    }
}

struct Ticker {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Mock simulator client
pub struct MockSimulator {
    shared: Arc<Shared>,
    connected: AtomicBool,
    manual: bool,
    ticker: Mutex<Option<Ticker>>,
}

impl MockSimulator {
    /// Create a mock server that ticks on its own thread once connected
    pub fn new(config: MockWorldConfig) -> Self {
        Self::build(config, false)
    }

    /// Create a mock server that only advances on `step`
    pub fn manual(config: MockWorldConfig) -> Self {
        Self::build(config, true)
    }

    fn build(config: MockWorldConfig, manual: bool) -> Self {
        let world = WorldState::new(config);
        let (snapshots, _) = watch::channel(world.snapshot());
        Self {
            shared: Arc::new(Shared {
                world: Mutex::new(world),
                sensors: Arc::new(SensorHub::default()),
                tick_callbacks: Mutex::new(Slab::new()),
                snapshots,
            }),
            connected: AtomicBool::new(false),
            manual,
            ticker: Mutex::new(None),
        }
    }

    /// Advance the world by one tick on the calling thread
    pub fn step(&self) -> Timestamp {
        self.shared.step()
    }

    /// Number of sensors spawned and not yet destroyed
    pub fn sensor_count(&self) -> usize {
        self.shared.sensors.sensor_count()
    }

    /// Number of sensors with a registered callback
    pub fn listening_sensor_count(&self) -> usize {
        self.shared.sensors.listening_count()
    }

    /// Number of actors (vehicles and walkers) alive in the world
    pub fn actor_count(&self) -> usize {
        self.shared.world.lock().snapshot().actors.len()
    }

    pub fn weather(&self) -> WeatherParameters {
        self.shared.world.lock().weather()
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SimulatorError::NotConnected)
        }
    }

    fn start_ticking(&self) {
        let mut ticker = self.ticker.lock();
        if ticker.is_some() {
            return;
        }

        let tick_hz = self.shared.world.lock().tick_hz();
        let interval = Duration::from_secs_f64(1.0 / tick_hz);
        let running = Arc::new(AtomicBool::new(true));
        let shared = self.shared.clone();
        let flag = running.clone();

        let handle = thread::spawn(move || {
            debug!(tick_hz, "mock simulator ticking");
            while flag.load(Ordering::Relaxed) {
                shared.step();
                thread::sleep(interval);
            }
            debug!("mock simulator stopped ticking");
        });

        *ticker = Some(Ticker { running, handle });
    }

    fn stop_ticking(&self) {
        if let Some(ticker) = self.ticker.lock().take() {
            ticker.running.store(false, Ordering::SeqCst);
            if ticker.handle.join().is_err() {
                warn!("mock simulator ticking thread panicked");
            }
        }
    }
}

impl Drop for MockSimulator {
    fn drop(&mut self) {
        self.stop_ticking();
    }
}

impl SensorSpawner for MockSimulator {
    #[instrument(
        name = "mock_simulator_spawn_sensor",
        skip(self, spec),
        fields(blueprint = %spec.blueprint, parent)
    )]
    fn spawn_sensor(
        &self,
        spec: &SensorSpec,
        parent: ActorId,
    ) -> std::result::Result<Box<dyn SensorSource>, ContractError> {
        self.ensure_connected()?;

        let sensor_type = spec
            .sensor_type()
            .ok_or_else(|| ContractError::spawn(&spec.blueprint, "unknown sensor blueprint"))?;

        let actor_id = {
            let mut world = self.shared.world.lock();
            if !world.contains(parent) {
                return Err(ContractError::spawn(
                    &spec.blueprint,
                    format!("parent actor {parent} not found"),
                ));
            }
            world.allocate_sensor_id()
        };

        let key = self
            .shared
            .sensors
            .register(spec, sensor_type, parent, actor_id);
        let sensor = MockSensor::new(self.shared.sensors.clone(), key)
            .ok_or_else(|| ContractError::spawn(&spec.blueprint, "sensor vanished during spawn"))?;
        Ok(Box::new(sensor))
    }
}

impl SimulatorClient for MockSimulator {
    #[instrument(name = "mock_simulator_connect", skip(self), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        if host.trim().is_empty() || port == 0 {
            return Err(SimulatorError::ConnectionFailed {
                host: host.to_string(),
                port,
                message: "invalid address".into(),
            });
        }
        if timeout.is_zero() {
            return Err(SimulatorError::ConnectionFailed {
                host: host.to_string(),
                port,
                message: "time-out while waiting for the simulator".into(),
            });
        }

        self.connected.store(true, Ordering::SeqCst);
        if !self.manual {
            self.start_ticking();
        }
        info!(map = %self.shared.world.lock().map_name(), "connected to mock simulator");
        Ok(())
    }

    fn map_name(&self) -> Result<String> {
        self.ensure_connected()?;
        let world = self.shared.world.lock();
        if !world.map_available() {
            return Err(ContractError::MapUnavailable {
                message: "the server could not send the OpenDRIVE (.xodr) file".into(),
            }
            .into());
        }
        Ok(world.map_name().to_string())
    }

    fn spawn_points(&self) -> Result<Vec<Transform>> {
        self.ensure_connected()?;
        Ok(self.shared.world.lock().spawn_points().to_vec())
    }

    fn blueprints(&self, filter: &str) -> Vec<ActorBlueprint> {
        BLUEPRINT_LIBRARY
            .iter()
            .filter(|(id, _)| wildcard_match(filter, id))
            .map(|(id, colors)| ActorBlueprint {
                id: id.to_string(),
                recommended_colors: colors.iter().map(|c| c.to_string()).collect(),
            })
            .collect()
    }

    #[instrument(
        name = "mock_simulator_try_spawn_actor",
        skip(self, request),
        fields(blueprint = %request.blueprint)
    )]
    async fn try_spawn_actor(&self, request: &SpawnRequest) -> Result<Option<ActorId>> {
        self.ensure_connected()?;
        if !BLUEPRINT_LIBRARY
            .iter()
            .any(|(id, _)| *id == request.blueprint)
        {
            return Err(SimulatorError::spawn_failed(
                &request.blueprint,
                "blueprint not found in library",
            ));
        }

        let spawned = self.shared.world.lock().try_spawn(
            &request.blueprint,
            &request.role_name,
            request.transform,
        );
        match spawned {
            Some(id) => debug!(actor_id = id, "actor spawned"),
            None => debug!("spawn point occupied"),
        }
        Ok(spawned)
    }

    #[instrument(name = "mock_simulator_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        self.shared.sensors.detach_parent(actor_id);
        // 幂等：即使不存在也返回 Ok
        self.shared.world.lock().destroy(actor_id);
        Ok(())
    }

    async fn wait_for_tick(&self, timeout: Duration) -> Result<Option<WorldSnapshot>> {
        let mut rx = self.shared.snapshots.subscribe();
        match tokio::time::timeout(timeout, rx.changed()).await {
            Ok(Ok(())) => Ok(Some(rx.borrow_and_update().clone())),
            Ok(Err(_)) | Err(_) => Ok(None),
        }
    }

    fn on_tick(&self, callback: TickCallback) -> TickCallbackId {
        TickCallbackId(self.shared.tick_callbacks.lock().insert(callback))
    }

    fn remove_on_tick(&self, id: TickCallbackId) {
        self.shared.tick_callbacks.lock().try_remove(id.0);
    }

    fn apply_control(&self, actor_id: ActorId, control: ActorControl) -> Result<()> {
        self.ensure_connected()?;
        if self.shared.world.lock().apply_control(actor_id, control) {
            Ok(())
        } else {
            Err(SimulatorError::ActorNotFound { actor_id })
        }
    }

    fn set_weather(&self, weather: WeatherParameters) {
        self.shared.world.lock().set_weather(weather);
    }

    fn snapshot(&self) -> WorldSnapshot {
        self.shared.world.lock().snapshot()
    }
}
