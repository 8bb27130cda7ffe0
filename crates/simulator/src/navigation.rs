//! Stand-in navigation agents
//!
//! Minimal versions of the simulator's agent library: a local planner that
//! follows a queue of waypoints with proportional steering, and the three
//! agent kinds built on top of it. Route planning ignores the road network.

use std::collections::VecDeque;

use contracts::{
    Behavior, DrivingAgent, Location, PlayerState, Transform, VehicleControl, WorldSnapshot,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Distance between consecutive waypoints (m)
pub const SAMPLING_RESOLUTION: f64 = 2.0;
/// A waypoint closer than this is considered reached (m)
const MIN_DISTANCE: f64 = 3.0;
/// Waypoints inspected ahead of the queue front when purging reached ones
const LOOKAHEAD: usize = 10;
/// Default cruise speed of the basic and roaming agents (km/h)
const DEFAULT_TARGET_SPEED: f64 = 20.0;
/// Roaming agents keep at least this many waypoints queued
const ROAMING_HORIZON: usize = 10;

/// Follows a queue of waypoints
#[derive(Debug, Default)]
pub struct LocalPlanner {
    waypoints: VecDeque<Location>,
}

impl LocalPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn last(&self) -> Option<Location> {
        self.waypoints.back().copied()
    }

    /// Replace the queue with a route from `start` to `end`
    pub fn set_route(&mut self, start: Location, end: Location) {
        self.waypoints.clear();
        self.extend_route(start, end);
    }

    /// Append a route from `start` to `end`
    pub fn extend_route(&mut self, start: Location, end: Location) {
        let distance = start.distance(&end);
        let steps = (distance / SAMPLING_RESOLUTION).ceil() as usize;
        for i in 1..=steps {
            let t = i as f64 / steps as f64;
            self.waypoints.push_back(Location::new(
                start.x + (end.x - start.x) * t,
                start.y + (end.y - start.y) * t,
                start.z + (end.z - start.z) * t,
            ));
        }
    }

    /// Drop reached waypoints and steer towards the next one
    pub fn run_step(&mut self, vehicle: &PlayerState, target_speed: f64) -> VehicleControl {
        let here = vehicle.transform.location;
        let reached = self
            .waypoints
            .iter()
            .take(LOOKAHEAD)
            .rposition(|w| w.distance(&here) < MIN_DISTANCE);
        if let Some(index) = reached {
            self.waypoints.drain(..=index);
        }

        let Some(target) = self.waypoints.front() else {
            return emergency_stop();
        };

        let desired = (target.y - here.y).atan2(target.x - here.x).to_degrees();
        let diff = wrap_degrees(desired - vehicle.transform.rotation.yaw);
        let steer = (diff / 45.0).clamp(-1.0, 1.0);

        let error = target_speed - vehicle.speed_kmh();
        let (throttle, brake) = if error >= 0.0 {
            ((0.1 * error + 0.2).clamp(0.0, 0.75), 0.0)
        } else if error < -2.0 {
            (0.0, (-0.05 * error).clamp(0.0, 0.3))
        } else {
            (0.0, 0.0)
        };

        VehicleControl {
            throttle,
            steer,
            brake,
            ..Default::default()
        }
    }
}

fn emergency_stop() -> VehicleControl {
    VehicleControl {
        throttle: 0.0,
        steer: 0.0,
        brake: 1.0,
        hand_brake: false,
        ..Default::default()
    }
}

fn wrap_degrees(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Speed parameters of one driving style: (max speed, margin below the limit)
fn behavior_speeds(behavior: Behavior) -> (f64, f64) {
    match behavior {
        Behavior::Cautious => (40.0, 6.0),
        Behavior::Normal => (50.0, 3.0),
        Behavior::Aggressive => (70.0, 1.0),
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// State shared by every agent kind
struct AgentCore {
    planner: LocalPlanner,
    vehicle: Option<PlayerState>,
    rng: StdRng,
}

impl AgentCore {
    fn new(seed: Option<u64>) -> Self {
        Self {
            planner: LocalPlanner::new(),
            vehicle: None,
            rng: seeded_rng(seed),
        }
    }

    fn update(&mut self, world: &WorldSnapshot) {
        if let Some(player) = &world.player {
            self.vehicle = Some(player.clone());
        }
    }

    fn location(&self) -> Location {
        self.vehicle
            .as_ref()
            .map(|v| v.transform.location)
            .unwrap_or_default()
    }

    fn step(&mut self, target_speed: f64) -> VehicleControl {
        match &self.vehicle {
            Some(vehicle) => self.planner.run_step(vehicle, target_speed),
            None => emergency_stop(),
        }
    }

    /// Continue from the end of the route to a shuffled spawn point
    fn reroute(&mut self, spawn_points: &[Transform]) {
        let start = self.planner.last().unwrap_or_else(|| self.location());
        let mut candidates = spawn_points.to_vec();
        candidates.shuffle(&mut self.rng);

        let destination = candidates
            .iter()
            .map(|t| t.location)
            .find(|l| *l != start);
        if let Some(destination) = destination {
            self.planner.extend_route(start, destination);
        }
    }
}

/// Agent that adapts its speed to the limit and the driving style
pub struct BehaviorAgent {
    core: AgentCore,
    behavior: Behavior,
    speed_limit: f64,
}

impl BehaviorAgent {
    pub fn new(behavior: Behavior, seed: Option<u64>) -> Self {
        Self {
            core: AgentCore::new(seed),
            behavior,
            speed_limit: DEFAULT_TARGET_SPEED,
        }
    }

    /// Speed the agent aims for: the lower of the style's max speed and the
    /// speed limit minus the style's margin
    pub fn target_speed(&self) -> f64 {
        let (max_speed, margin) = behavior_speeds(self.behavior);
        max_speed.min(self.speed_limit - margin).max(0.0)
    }
}

impl DrivingAgent for BehaviorAgent {
    fn update_information(&mut self, world: &WorldSnapshot) {
        self.core.update(world);
        if let Some(player) = &world.player {
            self.speed_limit = player.speed_limit;
        }
    }

    fn run_step(&mut self) -> VehicleControl {
        let target = self.target_speed();
        self.core.step(target)
    }

    fn remaining_waypoints(&self) -> Option<usize> {
        Some(self.core.planner.len())
    }

    fn set_destination(&mut self, destination: Location) {
        let start = self.core.location();
        self.core.planner.set_route(start, destination);
    }

    fn reroute(&mut self, spawn_points: &[Transform]) {
        self.core.reroute(spawn_points);
    }

    fn set_target_speed(&mut self, speed_kmh: f64) {
        self.speed_limit = speed_kmh;
    }
}

/// Agent that drives to one destination and stops there
pub struct BasicAgent {
    core: AgentCore,
    target_speed: f64,
}

impl BasicAgent {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            core: AgentCore::new(seed),
            target_speed: DEFAULT_TARGET_SPEED,
        }
    }
}

impl DrivingAgent for BasicAgent {
    fn update_information(&mut self, world: &WorldSnapshot) {
        self.core.update(world);
    }

    fn run_step(&mut self) -> VehicleControl {
        self.core.step(self.target_speed)
    }

    fn remaining_waypoints(&self) -> Option<usize> {
        Some(self.core.planner.len())
    }

    fn set_destination(&mut self, destination: Location) {
        let start = self.core.location();
        self.core.planner.set_route(start, destination);
    }

    fn reroute(&mut self, spawn_points: &[Transform]) {
        self.core.reroute(spawn_points);
    }

    fn set_target_speed(&mut self, speed_kmh: f64) {
        self.target_speed = speed_kmh;
    }
}

/// Agent that wanders without a destination
pub struct RoamingAgent {
    core: AgentCore,
    target_speed: f64,
}

impl RoamingAgent {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            core: AgentCore::new(seed),
            target_speed: DEFAULT_TARGET_SPEED,
        }
    }
}

impl DrivingAgent for RoamingAgent {
    fn update_information(&mut self, world: &WorldSnapshot) {
        self.core.update(world);
    }

    fn run_step(&mut self) -> VehicleControl {
        if self.core.planner.len() < ROAMING_HORIZON {
            if let Some(vehicle) = &self.core.vehicle {
                let start = self
                    .core
                    .planner
                    .last()
                    .unwrap_or(vehicle.transform.location);
                let forward = vehicle.transform.forward_vector();
                let reach = SAMPLING_RESOLUTION * (ROAMING_HORIZON * 3) as f64;
                let end = Location::new(
                    start.x + forward.x * reach,
                    start.y + forward.y * reach,
                    start.z,
                );
                self.core.planner.extend_route(start, end);
            }
        }
        self.core.step(self.target_speed)
    }

    fn remaining_waypoints(&self) -> Option<usize> {
        None
    }

    fn set_destination(&mut self, destination: Location) {
        let start = self.core.location();
        self.core.planner.set_route(start, destination);
    }

    fn reroute(&mut self, spawn_points: &[Transform]) {
        self.core.reroute(spawn_points);
    }

    fn set_target_speed(&mut self, speed_kmh: f64) {
        self.target_speed = speed_kmh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ActorControl, Rotation, Timestamp, Vector3};

    fn world_at(location: Location, speed_limit: f64) -> WorldSnapshot {
        WorldSnapshot {
            timestamp: Timestamp::default(),
            map_name: "Town01".into(),
            player: Some(PlayerState {
                id: 1,
                type_id: "vehicle.tesla.model3".into(),
                transform: Transform::new(location, Rotation::default()),
                velocity: Vector3::default(),
                control: ActorControl::default(),
                speed_limit,
            }),
            actors: vec![],
        }
    }

    #[test]
    fn test_route_sampling() {
        let mut planner = LocalPlanner::new();
        planner.set_route(Location::default(), Location::new(20.0, 0.0, 0.0));
        assert_eq!(planner.len(), 10);
        assert_eq!(planner.last(), Some(Location::new(20.0, 0.0, 0.0)));
    }

    #[test]
    fn test_reached_waypoints_are_consumed() {
        let mut agent = BehaviorAgent::new(Behavior::Normal, Some(1));
        agent.update_information(&world_at(Location::default(), 30.0));
        agent.set_destination(Location::new(40.0, 0.0, 0.0));
        assert_eq!(agent.remaining_waypoints(), Some(20));

        agent.update_information(&world_at(Location::new(10.0, 0.0, 0.0), 30.0));
        let control = agent.run_step();
        // everything up to the waypoint at x=12 counts as reached
        assert_eq!(agent.remaining_waypoints(), Some(14));
        assert!(control.throttle > 0.0);
        assert!(control.steer.abs() < 1e-9);
    }

    #[test]
    fn test_behavior_target_speed() {
        let mut agent = BehaviorAgent::new(Behavior::Cautious, Some(1));
        agent.set_target_speed(30.0);
        assert_eq!(agent.target_speed(), 24.0);
        agent.set_target_speed(90.0);
        assert_eq!(agent.target_speed(), 40.0);
    }

    #[test]
    fn test_reroute_extends_from_route_end() {
        let mut agent = BehaviorAgent::new(Behavior::Normal, Some(7));
        agent.update_information(&world_at(Location::default(), 30.0));
        agent.set_destination(Location::new(10.0, 0.0, 0.0));
        let before = agent.remaining_waypoints().unwrap();

        let spawn_points = vec![
            Transform::new(Location::new(10.0, 0.0, 0.0), Rotation::default()),
            Transform::new(Location::new(10.0, 40.0, 0.0), Rotation::default()),
        ];
        agent.reroute(&spawn_points);
        // the only destination different from the route end is (10, 40)
        assert_eq!(agent.remaining_waypoints(), Some(before + 20));
    }

    #[test]
    fn test_empty_route_brakes() {
        let mut agent = BasicAgent::new(Some(3));
        agent.update_information(&world_at(Location::default(), 30.0));
        let control = agent.run_step();
        assert_eq!(control.brake, 1.0);
        assert_eq!(control.throttle, 0.0);
    }

    #[test]
    fn test_roaming_keeps_a_horizon() {
        let mut agent = RoamingAgent::new(Some(3));
        agent.update_information(&world_at(Location::default(), 30.0));
        let control = agent.run_step();
        assert!(control.throttle > 0.0);
        assert_eq!(agent.remaining_waypoints(), None);
    }
}
