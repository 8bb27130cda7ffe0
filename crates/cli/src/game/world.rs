//! World: the player actor, its sensors, the weather and the seeded RNG

use std::sync::Arc;

use anyhow::{Context, Result};
use contracts::{
    actor_display_name, preset_display_name, ActorControl, ActorId, ClientBlueprint,
    ContractError, FrameCallback, Transform, VehicleControl, WorldSnapshot, WEATHER_PRESETS,
};
use hud::FrameSnapshot;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use sensors::{
    CameraManager, CollisionSensor, GnssSensor, LaneInvasionSensor, SensorContext, Surface,
};
use simulator::{SimulatorClient, SpawnRequest, TickCallback, TickCallbackId};
use tracing::{debug, info, instrument, warn};

use crate::error::CliError;

/// Spawn points tried before giving up on placing the player
const MAX_SPAWN_ATTEMPTS: usize = 64;
/// Truncation of the actor name shown when the player spawns
const DISPLAY_NAME_LENGTH: usize = 250;

struct Player {
    id: ActorId,
    type_id: String,
}

/// Sensors attached to the player; dropping the rig destroys them in order
struct SensorRig {
    collision: CollisionSensor,
    lane_invasion: LaneInvasionSensor,
    gnss: GnssSensor,
    camera: CameraManager,
}

pub struct World<C: SimulatorClient> {
    client: Arc<C>,
    map_name: String,
    spawn_points: Vec<Transform>,
    filter: String,
    role_name: String,
    gamma: f64,
    display: (u32, u32),
    ctx: SensorContext,
    recorder: Option<FrameCallback>,
    record_on_start: bool,
    rng: StdRng,
    weather_index: usize,
    player: Option<Player>,
    sensors: Option<SensorRig>,
    tick_callback: Option<TickCallbackId>,
}

impl<C: SimulatorClient> World<C> {
    /// Load the map and its spawn points; nothing is spawned yet
    ///
    /// # Errors
    /// Map data unavailable or a map without spawn points; both are fatal.
    #[instrument(name = "world_new", skip_all)]
    pub fn new(
        client: Arc<C>,
        blueprint: &ClientBlueprint,
        ctx: SensorContext,
        recorder: Option<FrameCallback>,
    ) -> Result<Self> {
        let map_name = client.map_name().context("failed to load the map")?;
        let spawn_points = client
            .spawn_points()
            .context("failed to read the spawn points")?;
        if spawn_points.is_empty() {
            return Err(ContractError::NoSpawnPoints { map: map_name }.into());
        }

        let rng = match blueprint.agent.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        info!(map = %map_name, spawn_points = spawn_points.len(), "world loaded");

        Ok(Self {
            client,
            map_name,
            spawn_points,
            filter: blueprint.vehicle.filter.clone(),
            role_name: blueprint.vehicle.role_name.clone(),
            gamma: blueprint.vehicle.gamma,
            display: (blueprint.display.width, blueprint.display.height),
            ctx,
            recorder,
            record_on_start: blueprint.recording.enabled,
            rng,
            weather_index: 0,
            player: None,
            sensors: None,
            tick_callback: None,
        })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn spawn_points(&self) -> &[Transform] {
        &self.spawn_points
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn player_id(&self) -> Option<ActorId> {
        self.player.as_ref().map(|p| p.id)
    }

    pub fn player_type(&self) -> Option<&str> {
        self.player.as_ref().map(|p| p.type_id.as_str())
    }

    pub fn weather_index(&self) -> usize {
        self.weather_index
    }

    /// (Re)spawn the player and its sensors
    ///
    /// Keeps the camera variant, mount point and recording state of the
    /// previous player.
    #[instrument(name = "world_restart", skip(self), fields(map = %self.map_name))]
    pub async fn restart(&mut self) -> Result<()> {
        let previous = self.sensors.as_ref().map(|rig| {
            (
                rig.camera.index().unwrap_or(0),
                rig.camera.transform_index(),
                rig.camera.is_recording(),
            )
        });

        let blueprints = self.client.blueprints(&self.filter);
        let blueprint = blueprints.choose(&mut self.rng).cloned().ok_or_else(|| {
            ContractError::spawn(&self.filter, "no blueprint matches the actor filter")
        })?;
        let color = blueprint.recommended_colors.choose(&mut self.rng).cloned();

        self.destroy_player().await;

        let mut attempts = 0;
        let id = loop {
            if attempts == MAX_SPAWN_ATTEMPTS {
                return Err(CliError::PlayerSpawn { attempts }.into());
            }
            attempts += 1;
            let Some(&transform) = self.spawn_points.choose(&mut self.rng) else {
                return Err(ContractError::NoSpawnPoints {
                    map: self.map_name.clone(),
                }
                .into());
            };
            let request = SpawnRequest {
                blueprint: blueprint.id.clone(),
                role_name: self.role_name.clone(),
                color: color.clone(),
                transform,
            };
            if let Some(id) = self.client.try_spawn_actor(&request).await? {
                break id;
            }
        };
        self.player = Some(Player {
            id,
            type_id: blueprint.id.clone(),
        });
        debug!(actor_id = id, blueprint = %blueprint.id, attempts, "player spawned");

        let client = Arc::clone(&self.client);
        let spawner = client.as_ref();
        let collision = CollisionSensor::spawn(spawner, id, &self.ctx)?;
        let lane_invasion = LaneInvasionSensor::spawn(spawner, id, &self.ctx)?;
        let gnss = GnssSensor::spawn(spawner, id, &self.ctx)?;

        let mut camera = CameraManager::new(
            id,
            self.display,
            self.gamma,
            &self.ctx,
            self.recorder.clone(),
        );
        let (cam_index, recording) = match previous {
            Some((index, mount, recording)) => {
                camera = camera.with_transform_index(mount);
                (index, recording)
            }
            None => (0, self.record_on_start),
        };
        camera.set_sensor(spawner, cam_index, false, false)?;
        if recording {
            camera.toggle_recording();
        }

        self.sensors = Some(SensorRig {
            collision,
            lane_invasion,
            gnss,
            camera,
        });

        self.ctx
            .notifications
            .notify(actor_display_name(&blueprint.id, DISPLAY_NAME_LENGTH));
        info!(actor_id = id, blueprint = %blueprint.id, color = ?color, "player ready");
        Ok(())
    }

    /// Register the HUD's server clock on the world tick
    pub fn on_world_tick(&mut self, callback: TickCallback) {
        if let Some(previous) = self.tick_callback.take() {
            self.client.remove_on_tick(previous);
        }
        self.tick_callback = Some(self.client.on_tick(callback));
    }

    /// Cycle through the weather presets
    pub fn next_weather(&mut self, reverse: bool) {
        let len = WEATHER_PRESETS.len();
        self.weather_index = if reverse {
            (self.weather_index + len - 1) % len
        } else {
            (self.weather_index + 1) % len
        };
        let (ident, weather) = WEATHER_PRESETS[self.weather_index];
        self.client.set_weather(weather);
        self.ctx
            .notifications
            .notify(format!("Weather: {}", preset_display_name(ident)));
        debug!(preset = ident, "weather changed");
    }

    pub fn toggle_camera(&mut self) -> Result<()> {
        let client = Arc::clone(&self.client);
        if let Some(rig) = self.sensors.as_mut() {
            rig.camera.toggle_camera(client.as_ref())?;
        }
        Ok(())
    }

    pub fn next_sensor(&mut self) -> Result<()> {
        let client = Arc::clone(&self.client);
        if let Some(rig) = self.sensors.as_mut() {
            rig.camera.next_sensor(client.as_ref())?;
        }
        Ok(())
    }

    pub fn toggle_recording(&mut self) {
        if let Some(rig) = self.sensors.as_mut() {
            rig.camera.toggle_recording();
        }
    }

    pub fn is_recording(&self) -> bool {
        self.sensors
            .as_ref()
            .is_some_and(|rig| rig.camera.is_recording())
    }

    pub fn camera(&self) -> Option<&CameraManager> {
        self.sensors.as_ref().map(|rig| &rig.camera)
    }

    /// Latest camera or lidar frame
    pub fn surface(&self) -> Option<Arc<Surface>> {
        self.camera().and_then(CameraManager::surface)
    }

    /// Read every observation cache once for this frame
    pub fn frame_snapshot(&self, world: &WorldSnapshot) -> Option<FrameSnapshot> {
        let rig = self.sensors.as_ref()?;
        FrameSnapshot::from_world(world, rig.gnss.fix(), rig.collision.collision_history())
    }

    pub fn apply_control(&self, control: VehicleControl) -> Result<()> {
        let Some(player) = &self.player else {
            return Ok(());
        };
        self.client
            .apply_control(player.id, ActorControl::Vehicle(control))
            .context("failed to apply control to the player")?;
        Ok(())
    }

    /// Sensors first, then the player actor
    async fn destroy_player(&mut self) {
        if let Some(rig) = self.sensors.take() {
            let SensorRig {
                collision,
                lane_invasion,
                gnss,
                mut camera,
            } = rig;
            camera.destroy();
            collision.destroy();
            lane_invasion.destroy();
            gnss.destroy();
        }
        if let Some(player) = self.player.take() {
            if let Err(e) = self.client.destroy_actor(player.id).await {
                warn!(actor_id = player.id, error = %e, "failed to destroy player");
            }
        }
    }

    /// Release everything spawned by this client
    #[instrument(name = "world_destroy", skip(self), fields(map = %self.map_name))]
    pub async fn destroy(&mut self) {
        if let Some(id) = self.tick_callback.take() {
            self.client.remove_on_tick(id);
        }
        self.destroy_player().await;
        debug!("world destroyed");
    }
}
