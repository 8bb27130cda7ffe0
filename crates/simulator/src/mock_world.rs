//! 模拟世界状态
//!
//! 简化的运动学：玩家车辆按施加的控制前进，交通车辆沿圆轨迹行驶。
//! 地图、路网与物理由真实仿真器负责，这里只保证数据形状一致。

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use contracts::{
    ActorControl, ActorId, ActorSnapshot, Location, MockWorldConfig, PlayerState, Rotation,
    Timestamp, Transform, Vector3, VehicleControl, WeatherParameters, WorldSnapshot,
};

/// 默认出生点数量 (未配置时)
const GENERATED_SPAWN_POINTS: usize = 12;
/// 默认出生点环半径 (米)
const SPAWN_RING_RADIUS: f64 = 120.0;
/// 交通车辆环半径 (米)
const TRAFFIC_RING_RADIUS: f64 = 60.0;
/// 两个 actor 之间的最小间距，小于该值视为出生点被占用
const SPAWN_CLEARANCE: f64 = 2.0;

/// 交通车辆使用的蓝图
const TRAFFIC_BLUEPRINTS: &[&str] = &[
    "vehicle.audi.tt",
    "vehicle.nissan.patrol",
    "vehicle.mercedes.coupe_2020",
    "vehicle.lincoln.mkz_2017",
];

/// 圆轨迹
#[derive(Debug, Clone, Copy)]
pub(crate) struct Orbit {
    radius: f64,
    /// 角速度 (rad/s)，负值为顺时针
    angular_speed: f64,
    phase: f64,
}

/// 模拟 actor
#[derive(Debug, Clone)]
pub(crate) struct MockActor {
    pub id: ActorId,
    pub type_id: String,
    pub role_name: String,
    pub transform: Transform,
    pub velocity: Vector3,
    pub control: ActorControl,
    orbit: Option<Orbit>,
}

impl MockActor {
    fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot {
            id: self.id,
            type_id: self.type_id.clone(),
            transform: self.transform,
            velocity: self.velocity,
        }
    }
}

/// 脚本化的碰撞/压线事件，每帧由世界生成一次
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedEvents {
    pub collision: Option<(String, Vector3)>,
    pub lane_invasion: bool,
}

pub(crate) struct WorldState {
    config: MockWorldConfig,
    spawn_points: Vec<Transform>,
    frame: u64,
    elapsed: f64,
    actors: BTreeMap<ActorId, MockActor>,
    next_actor_id: ActorId,
    weather: WeatherParameters,
}

impl WorldState {
    pub fn new(config: MockWorldConfig) -> Self {
        let spawn_points = config
            .spawn_points
            .clone()
            .unwrap_or_else(|| ring_spawn_points(GENERATED_SPAWN_POINTS, SPAWN_RING_RADIUS));

        let mut state = Self {
            config,
            spawn_points,
            frame: 0,
            elapsed: 0.0,
            actors: BTreeMap::new(),
            // Actor IDs start at 1000 to stand out in logs
            next_actor_id: 1000,
            weather: WeatherParameters::default(),
        };
        state.populate_traffic();
        state
    }

    fn populate_traffic(&mut self) {
        let count = self.config.traffic_vehicles;
        for i in 0..count {
            let phase = TAU * i as f64 / count.max(1) as f64;
            let orbit = Orbit {
                radius: TRAFFIC_RING_RADIUS + 4.0 * (i % 2) as f64,
                angular_speed: if i % 2 == 0 { 0.12 } else { -0.1 },
                phase,
            };
            let id = self.allocate_id();
            let mut actor = MockActor {
                id,
                type_id: TRAFFIC_BLUEPRINTS[i % TRAFFIC_BLUEPRINTS.len()].to_string(),
                role_name: "autopilot".to_string(),
                transform: Transform::default(),
                velocity: Vector3::default(),
                control: ActorControl::default(),
                orbit: Some(orbit),
            };
            place_on_orbit(&mut actor, orbit, 0.0);
            self.actors.insert(id, actor);
        }
    }

    fn allocate_id(&mut self) -> ActorId {
        let id = self.next_actor_id;
        self.next_actor_id += 1;
        id
    }

    /// Sensors are actors too and share the id sequence
    pub fn allocate_sensor_id(&mut self) -> ActorId {
        self.allocate_id()
    }

    pub fn map_name(&self) -> &str {
        &self.config.map_name
    }

    pub fn map_available(&self) -> bool {
        self.config.map_available
    }

    pub fn spawn_points(&self) -> &[Transform] {
        &self.spawn_points
    }

    pub fn tick_hz(&self) -> f64 {
        self.config.tick_hz
    }

    pub fn weather(&self) -> WeatherParameters {
        self.weather
    }

    pub fn set_weather(&mut self, weather: WeatherParameters) {
        self.weather = weather;
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Spawn unless another actor stands within the clearance radius
    pub fn try_spawn(
        &mut self,
        type_id: &str,
        role_name: &str,
        transform: Transform,
    ) -> Option<ActorId> {
        let occupied = self
            .actors
            .values()
            .any(|a| a.transform.location.distance(&transform.location) < SPAWN_CLEARANCE);
        if occupied {
            return None;
        }

        let id = self.allocate_id();
        let control = if type_id.starts_with("walker.") {
            ActorControl::Walker(Default::default())
        } else {
            ActorControl::Vehicle(VehicleControl::default())
        };
        self.actors.insert(
            id,
            MockActor {
                id,
                type_id: type_id.to_string(),
                role_name: role_name.to_string(),
                transform,
                velocity: Vector3::default(),
                control,
                orbit: None,
            },
        );
        Some(id)
    }

    pub fn destroy(&mut self, id: ActorId) -> bool {
        self.actors.remove(&id).is_some()
    }

    pub fn apply_control(&mut self, id: ActorId, control: ActorControl) -> bool {
        match self.actors.get_mut(&id) {
            Some(actor) => {
                actor.control = control;
                true
            }
            None => false,
        }
    }

    /// Advance the simulation by one fixed step
    pub fn advance(&mut self) -> ScriptedEvents {
        let dt = 1.0 / self.config.tick_hz;
        self.frame += 1;
        self.elapsed += dt;
        let elapsed = self.elapsed;

        for actor in self.actors.values_mut() {
            match actor.orbit {
                Some(orbit) => place_on_orbit(actor, orbit, elapsed),
                None => integrate(actor, dt),
            }
        }

        self.scripted_events()
    }

    fn scripted_events(&self) -> ScriptedEvents {
        let mut events = ScriptedEvents::default();
        let frame = self.frame;

        let every = self.config.collision_interval_frames;
        if every > 0 && frame % every == 0 {
            let other = self
                .actors
                .values()
                .find(|a| a.orbit.is_some())
                .map(|a| a.type_id.clone())
                .unwrap_or_else(|| "static.prop.streetbarrier".to_string());
            let strength = ((frame / every) % 5 + 1) as f64;
            events.collision = Some((other, Vector3::new(300.0 * strength, 400.0 * strength, 0.0)));
        }

        let every = self.config.lane_invasion_interval_frames;
        events.lane_invasion = every > 0 && frame % every == 0;
        events
    }

    pub fn timestamp(&self) -> Timestamp {
        Timestamp {
            frame: self.frame,
            elapsed_seconds: self.elapsed,
            delta_seconds: 1.0 / self.config.tick_hz,
            platform_timestamp: self.elapsed,
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let player = self
            .actors
            .values()
            .find(|a| a.role_name == "hero")
            .map(|a| PlayerState {
                id: a.id,
                type_id: a.type_id.clone(),
                transform: a.transform,
                velocity: a.velocity,
                control: a.control,
                speed_limit: self.config.speed_limit_kmh,
            });

        WorldSnapshot {
            timestamp: self.timestamp(),
            map_name: self.config.map_name.clone(),
            player,
            actors: self.actors.values().map(MockActor::snapshot).collect(),
        }
    }
}

/// Spawn points spread evenly on a ring, heading tangent to it
pub(crate) fn ring_spawn_points(count: usize, radius: f64) -> Vec<Transform> {
    (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64;
            Transform::new(
                Location::new(radius * angle.cos(), radius * angle.sin(), 0.3),
                Rotation::new(0.0, normalize_yaw(angle.to_degrees() + 90.0), 0.0),
            )
        })
        .collect()
}

fn place_on_orbit(actor: &mut MockActor, orbit: Orbit, elapsed: f64) {
    let angle = orbit.phase + orbit.angular_speed * elapsed;
    let heading = if orbit.angular_speed >= 0.0 {
        angle + TAU / 4.0
    } else {
        angle - TAU / 4.0
    };
    let speed = orbit.radius * orbit.angular_speed.abs();

    actor.transform = Transform::new(
        Location::new(orbit.radius * angle.cos(), orbit.radius * angle.sin(), 0.0),
        Rotation::new(0.0, normalize_yaw(heading.to_degrees()), 0.0),
    );
    actor.velocity = Vector3::new(speed * heading.cos(), speed * heading.sin(), 0.0);
}

fn integrate(actor: &mut MockActor, dt: f64) {
    match actor.control {
        ActorControl::Vehicle(control) => integrate_vehicle(actor, control, dt),
        ActorControl::Walker(control) => {
            let dir = control.direction;
            let len = dir.length();
            actor.velocity = if len > f64::EPSILON {
                Vector3::new(
                    dir.x / len * control.speed,
                    dir.y / len * control.speed,
                    0.0,
                )
            } else {
                Vector3::default()
            };
            actor.transform.location.x += actor.velocity.x * dt;
            actor.transform.location.y += actor.velocity.y * dt;
        }
    }
}

fn integrate_vehicle(actor: &mut MockActor, control: VehicleControl, dt: f64) {
    let control = control.clamped();
    let mut speed = actor.velocity.length();

    let drive = if control.gear == 0 { 0.0 } else { control.throttle * 3.5 };
    speed += (drive - control.brake * 7.0 - 0.05 * speed) * dt;
    if control.hand_brake {
        speed -= 10.0 * dt;
    }
    let speed = speed.max(0.0);

    let turn_rate = 50.0 * control.steer * (speed / 5.0).min(1.0);
    let yaw = normalize_yaw(actor.transform.rotation.yaw + turn_rate * dt);
    actor.transform.rotation.yaw = yaw;

    let direction = if control.reverse { -1.0 } else { 1.0 };
    let forward = actor.transform.forward_vector();
    actor.velocity = Vector3::new(
        forward.x * speed * direction,
        forward.y * speed * direction,
        0.0,
    );
    actor.transform.location.x += actor.velocity.x * dt;
    actor.transform.location.y += actor.velocity.y * dt;
}

/// Wrap into [-180, 180)
pub(crate) fn normalize_yaw(yaw: f64) -> f64 {
    (yaw + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MockWorldConfig {
        MockWorldConfig {
            traffic_vehicles: 2,
            tick_hz: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_generated_spawn_points() {
        let world = WorldState::new(config());
        assert_eq!(world.spawn_points().len(), GENERATED_SPAWN_POINTS);
    }

    #[test]
    fn test_spawn_point_occupied() {
        let mut world = WorldState::new(config());
        let point = world.spawn_points()[0];
        assert!(world.try_spawn("vehicle.audi.tt", "hero", point).is_some());
        assert!(world.try_spawn("vehicle.audi.tt", "other", point).is_none());
    }

    #[test]
    fn test_throttle_moves_player_forward() {
        let mut world = WorldState::new(config());
        let start = Transform::new(Location::new(0.0, 0.0, 0.3), Rotation::default());
        let id = world.try_spawn("vehicle.audi.tt", "hero", start).unwrap();
        world.apply_control(
            id,
            ActorControl::Vehicle(VehicleControl {
                throttle: 1.0,
                ..Default::default()
            }),
        );
        for _ in 0..20 {
            world.advance();
        }
        let snapshot = world.snapshot();
        let player = snapshot.player.unwrap();
        assert!(player.transform.location.x > 1.0);
        assert!(player.velocity.x > 0.0);
        assert_eq!(snapshot.timestamp.frame, 20);
        assert!((snapshot.timestamp.elapsed_seconds - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_scripted_collision_interval() {
        let mut world = WorldState::new(MockWorldConfig {
            collision_interval_frames: 3,
            ..config()
        });
        let hits: Vec<bool> = (0..6).map(|_| world.advance().collision.is_some()).collect();
        assert_eq!(hits, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn test_normalize_yaw() {
        assert_eq!(normalize_yaw(190.0), -170.0);
        assert_eq!(normalize_yaw(-190.0), 170.0);
        assert_eq!(normalize_yaw(45.0), 45.0);
    }
}
