//! Agent adapter
//!
//! Feeds the world snapshot to the external driving agent, applies the route
//! policy and hands back the control to apply.

use contracts::{AgentKind, DrivingAgent, Location, Transform, VehicleControl, WorldSnapshot};
use metrics::counter;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, instrument};

use crate::policy::{RouteDecision, RoutePolicy};

/// Seconds the target counter stays on screen
pub const TARGET_NOTIFICATION_SECONDS: f64 = 4.0;

pub const MISSION_ACCOMPLISHED: &str = "Target reached, mission accomplished...";

/// Outcome of one adapter step
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStep {
    /// Apply `control`; show `notification` if any
    Drive {
        control: VehicleControl,
        notification: Option<String>,
    },
    /// The route is done and not looping; leave the loop
    Finished,
}

pub struct AgentAdapter {
    agent: Box<dyn DrivingAgent>,
    kind: AgentKind,
    policy: RoutePolicy,
    spawn_points: Vec<Transform>,
    targets_reached: u32,
}

impl AgentAdapter {
    pub fn new(
        agent: Box<dyn DrivingAgent>,
        kind: AgentKind,
        policy: RoutePolicy,
        spawn_points: Vec<Transform>,
    ) -> Self {
        Self {
            agent,
            kind,
            policy,
            spawn_points,
            targets_reached: 0,
        }
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn targets_reached(&self) -> u32 {
        self.targets_reached
    }

    /// Give the agent its first destination
    ///
    /// Behavior: a shuffled spawn point other than the player's location.
    /// Basic: the first spawn point. Roaming: none.
    #[instrument(name = "agent_start", skip_all, fields(kind = %self.kind))]
    pub fn start<R: Rng + ?Sized>(&mut self, world: &WorldSnapshot, rng: &mut R) {
        self.agent.update_information(world);
        let own = world
            .player
            .as_ref()
            .map(|p| p.transform.location)
            .unwrap_or_default();

        let destination = match self.kind {
            AgentKind::Roaming => None,
            AgentKind::Basic => self.spawn_points.first().map(|t| t.location),
            AgentKind::Behavior => {
                let mut candidates = self.spawn_points.clone();
                candidates.shuffle(rng);
                pick_destination(&candidates, own)
            }
        };

        if let Some(destination) = destination {
            debug!(x = destination.x, y = destination.y, "destination set");
            self.agent.set_destination(destination);
        }
    }

    /// Run one decision step against the latest world snapshot
    pub fn step(&mut self, world: &WorldSnapshot) -> AgentStep {
        self.agent.update_information(world);

        if self.kind != AgentKind::Behavior {
            let mut control = self.agent.run_step();
            control.manual_gear_shift = false;
            return AgentStep::Drive {
                control,
                notification: None,
            };
        }

        let mut notification = None;
        match self.policy.decide(self.agent.remaining_waypoints()) {
            RouteDecision::Reroute => {
                self.agent.reroute(&self.spawn_points);
                self.targets_reached += 1;
                counter!("carla_hud_reroutes_total").increment(1);
                debug!(targets_reached = self.targets_reached, "rerouted");
                notification = Some(format!(
                    "The target has been reached {} times.",
                    self.targets_reached
                ));
            }
            RouteDecision::Finish => {
                info!("{}", MISSION_ACCOMPLISHED);
                return AgentStep::Finished;
            }
            RouteDecision::Continue => {}
        }

        if let Some(player) = &world.player {
            self.agent.set_target_speed(player.speed_limit);
        }

        AgentStep::Drive {
            control: self.agent.run_step(),
            notification,
        }
    }
}

/// First candidate unless it is where the player stands
fn pick_destination(candidates: &[Transform], own: Location) -> Option<Location> {
    match candidates {
        [] => None,
        [first, ..] if first.location != own => Some(first.location),
        [_, second, ..] => Some(second.location),
        [_] => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use contracts::{ActorControl, PlayerState, Rotation, Timestamp, Vector3};
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[derive(Default)]
    struct Log {
        entries: Mutex<Vec<String>>,
    }

    impl Log {
        fn push(&self, s: impl Into<String>) {
            self.entries.lock().unwrap().push(s.into());
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.entries.lock().unwrap())
        }
    }

    /// Agent whose route length follows a script, one entry per step
    struct ScriptedAgent {
        lengths: Vec<Option<usize>>,
        step: usize,
        log: Arc<Log>,
        control: VehicleControl,
    }

    impl DrivingAgent for ScriptedAgent {
        fn update_information(&mut self, _world: &WorldSnapshot) {}

        fn run_step(&mut self) -> VehicleControl {
            self.step += 1;
            self.control
        }

        fn remaining_waypoints(&self) -> Option<usize> {
            self.lengths.get(self.step).copied().flatten()
        }

        fn set_destination(&mut self, destination: Location) {
            self.log.push(format!("dest {} {}", destination.x, destination.y));
        }

        fn reroute(&mut self, spawn_points: &[Transform]) {
            self.log.push(format!("reroute {}", spawn_points.len()));
        }

        fn set_target_speed(&mut self, speed_kmh: f64) {
            self.log.push(format!("speed {speed_kmh}"));
        }
    }

    fn world(at: Location, speed_limit: f64) -> WorldSnapshot {
        WorldSnapshot {
            timestamp: Timestamp::default(),
            map_name: "Town10HD_Opt".into(),
            player: Some(PlayerState {
                id: 1,
                type_id: "vehicle.audi.tt".into(),
                transform: Transform::new(at, Rotation::default()),
                velocity: Vector3::default(),
                control: ActorControl::default(),
                speed_limit,
            }),
            actors: Vec::new(),
        }
    }

    fn spawn_points() -> Vec<Transform> {
        (0..4)
            .map(|i| Transform::new(Location::new(i as f64 * 10.0, 0.0, 0.0), Rotation::default()))
            .collect()
    }

    fn adapter(
        kind: AgentKind,
        lengths: Vec<Option<usize>>,
        loop_route: bool,
    ) -> (AgentAdapter, Arc<Log>) {
        let log = Arc::new(Log::default());
        let agent = ScriptedAgent {
            lengths,
            step: 0,
            log: log.clone(),
            control: VehicleControl {
                throttle: 0.7,
                manual_gear_shift: true,
                ..Default::default()
            },
        };
        let adapter = AgentAdapter::new(
            Box::new(agent),
            kind,
            RoutePolicy::new(21, loop_route),
            spawn_points(),
        );
        (adapter, log)
    }

    #[test]
    fn test_reroute_once_with_counter() {
        let (mut adapter, log) = adapter(
            AgentKind::Behavior,
            vec![Some(22), Some(20), Some(20), Some(20)],
            true,
        );
        let w = world(Location::default(), 30.0);

        let mut notes = Vec::new();
        for _ in 0..4 {
            match adapter.step(&w) {
                AgentStep::Drive { notification, .. } => notes.push(notification),
                AgentStep::Finished => panic!("looping agent finished"),
            }
        }

        assert_eq!(
            notes,
            vec![
                None,
                Some("The target has been reached 1 times.".to_string()),
                None,
                None
            ]
        );
        assert_eq!(adapter.targets_reached(), 1);
        let entries = log.take();
        assert_eq!(entries.iter().filter(|e| e.starts_with("reroute")).count(), 1);
        assert!(entries.contains(&"speed 30".to_string()));
    }

    #[test]
    fn test_finish_without_loop() {
        let (mut adapter, _log) = adapter(AgentKind::Behavior, vec![Some(3), Some(0)], false);
        let w = world(Location::default(), 30.0);
        assert!(matches!(adapter.step(&w), AgentStep::Drive { .. }));
        assert_eq!(adapter.step(&w), AgentStep::Finished);
    }

    #[test]
    fn test_roaming_forces_automatic_gears() {
        let (mut adapter, log) = adapter(AgentKind::Roaming, vec![Some(0)], false);
        match adapter.step(&world(Location::default(), 30.0)) {
            AgentStep::Drive { control, .. } => {
                assert!(!control.manual_gear_shift);
                assert_eq!(control.throttle, 0.7);
            }
            AgentStep::Finished => panic!("roaming agent finished"),
        }
        // no speed passthrough or route policy outside Behavior
        assert!(log.take().is_empty());
    }

    #[test]
    fn test_basic_start_uses_first_spawn_point() {
        let (mut adapter, log) = adapter(AgentKind::Basic, vec![], false);
        adapter.start(&world(Location::default(), 30.0), &mut StdRng::seed_from_u64(1));
        assert_eq!(log.take(), vec!["dest 0 0".to_string()]);
    }

    #[test]
    fn test_behavior_start_avoids_own_location() {
        for seed in 0..16 {
            let own = Location::new(10.0, 0.0, 0.0);
            let (mut adapter, log) = adapter(AgentKind::Behavior, vec![], false);
            adapter.start(&world(own, 30.0), &mut StdRng::seed_from_u64(seed));
            let entries = log.take();
            assert_eq!(entries.len(), 1);
            assert_ne!(entries[0], "dest 10 0");
        }
    }

    #[test]
    fn test_roaming_start_has_no_destination() {
        let (mut adapter, log) = adapter(AgentKind::Roaming, vec![], false);
        adapter.start(&world(Location::default(), 30.0), &mut StdRng::seed_from_u64(1));
        assert!(log.take().is_empty());
    }

    #[test]
    fn test_pick_destination() {
        let pts = spawn_points();
        assert_eq!(pick_destination(&pts, Location::new(0.0, 0.0, 0.0)), Some(pts[1].location));
        assert_eq!(pick_destination(&pts, Location::new(5.0, 0.0, 0.0)), Some(pts[0].location));
        assert_eq!(pick_destination(&[], Location::default()), None);
    }
}
