//! Simulator client abstraction
//!
//! Defines the Event Source boundary: world queries, actor lifecycle, tick
//! delivery and sensor spawning. Implemented in-process by `MockSimulator`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    ActorControl, ActorId, SensorSpawner, Timestamp, Transform, WeatherParameters, WorldSnapshot,
};

use crate::error::Result;

/// Callback invoked on the simulator's delivery thread after every world tick
pub type TickCallback = Arc<dyn Fn(Timestamp) + Send + Sync>;

/// Handle returned by `on_tick`, used to unregister the callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickCallbackId(pub usize);

/// Blueprint available in the simulator's library
#[derive(Debug, Clone, PartialEq)]
pub struct ActorBlueprint {
    /// Blueprint id (e.g., "vehicle.tesla.model3")
    pub id: String,
    /// Recommended values of the `color` attribute, empty if not paintable
    pub recommended_colors: Vec<String>,
}

/// Actor spawn request
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub blueprint: String,
    pub role_name: String,
    pub color: Option<String>,
    pub transform: Transform,
}

/// Simulator client trait
///
/// Abstracts the simulator core operations. Callbacks registered through
/// `on_tick` and through sensors run on the simulator's own thread and must
/// never block nor call back into the client.
pub trait SimulatorClient: SensorSpawner + Send + Sync {
    /// Connect to the server within `timeout`
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Name of the loaded map
    ///
    /// # Errors
    /// `ContractError::MapUnavailable` when the server cannot provide map data.
    fn map_name(&self) -> Result<String>;

    /// Recommended spawn points of the loaded map
    fn spawn_points(&self) -> Result<Vec<Transform>>;

    /// Blueprints whose id matches a wildcard filter (e.g., "vehicle.*")
    fn blueprints(&self, filter: &str) -> Vec<ActorBlueprint>;

    /// Try to spawn an actor; `Ok(None)` when the spawn point is occupied
    fn try_spawn_actor(
        &self,
        request: &SpawnRequest,
    ) -> impl Future<Output = Result<Option<ActorId>>> + Send;

    /// Destroy actor
    ///
    /// Idempotent operation: returns Ok if actor doesn't exist
    fn destroy_actor(&self, actor_id: ActorId) -> impl Future<Output = Result<()>> + Send;

    /// Wait until the simulation advances by one tick
    ///
    /// Returns `Ok(None)` when `timeout` expires first.
    fn wait_for_tick(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<WorldSnapshot>>> + Send;

    /// Register a world tick callback
    fn on_tick(&self, callback: TickCallback) -> TickCallbackId;

    /// Unregister a world tick callback; synchronous like `SensorSource::stop`
    fn remove_on_tick(&self, id: TickCallbackId);

    /// Apply a control command to an actor
    fn apply_control(&self, actor_id: ActorId, control: ActorControl) -> Result<()>;

    /// Change the world weather
    fn set_weather(&self, weather: WeatherParameters);

    /// Latest world state without waiting
    fn snapshot(&self) -> WorldSnapshot;
}

/// Shell-style wildcard match supporting `*` and `?`
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
