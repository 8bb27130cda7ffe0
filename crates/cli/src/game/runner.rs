//! Render loop state machine
//!
//! `Initializing → Running → Destroying`. Destroying is entered from every
//! exit path (quit, route finished, interrupt, failure) and releases the
//! sensors, then the player, then the display.

use std::sync::Arc;
use std::time::{Duration, Instant};

use agent::{AgentAdapter, AgentStep, RoutePolicy, TARGET_NOTIFICATION_SECONDS};
use anyhow::{Context, Result};
use async_channel::Receiver;
use contracts::{AgentConfig, AgentKind, ClientBlueprint, DrivingAgent, FrameCallback};
use hud::{Display, FpsClock, Hud};
use observability::{
    record_frame_presented, record_loop_state, record_server_clock, LoopMetricsAggregator,
};
use sensors::{notification_channel, SensorContext};
use simulator::{BasicAgent, BehaviorAgent, RoamingAgent, SimulatorClient};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument};

use super::keyboard::{InputEvent, InputOutcome, KeyboardControl};
use super::world::World;

/// Pending notifications kept between two frames
const NOTIFICATION_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Initializing,
    Running,
    Destroying,
}

impl LoopState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Destroying => "destroying",
        }
    }
}

/// Why the render loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Window closed, Escape or Ctrl+Q
    Quit,
    /// The agent reached its destination without looping
    RouteFinished,
    /// Ctrl+C
    Interrupted,
}

/// External decision object for the configured agent kind
pub fn build_agent(config: &AgentConfig) -> Box<dyn DrivingAgent> {
    match config.kind {
        AgentKind::Behavior => Box::new(BehaviorAgent::new(config.behavior, config.seed)),
        AgentKind::Roaming => Box::new(RoamingAgent::new(config.seed)),
        AgentKind::Basic => Box::new(BasicAgent::new(config.seed)),
    }
}

pub struct GameLoop<C: SimulatorClient> {
    state: LoopState,
    world: World<C>,
    hud: Hud,
    display: Display,
    keyboard: KeyboardControl,
    adapter: AgentAdapter,
    shutdown: watch::Receiver<bool>,
    frame_interval: Duration,
    tick_timeout: Duration,
    fps: FpsClock,
    metrics: LoopMetricsAggregator,
}

impl<C: SimulatorClient + 'static> GameLoop<C> {
    /// Load the world and set up the HUD; nothing is spawned yet
    ///
    /// `client` must already be connected.
    #[instrument(name = "game_loop_new", skip_all)]
    pub fn new(
        client: Arc<C>,
        blueprint: &ClientBlueprint,
        input: Receiver<InputEvent>,
        shutdown: watch::Receiver<bool>,
        recorder: Option<FrameCallback>,
    ) -> Result<Self> {
        record_loop_state(LoopState::Initializing.as_str());
        let (width, height) = (blueprint.display.width, blueprint.display.height);

        let (notifications, mailbox) = notification_channel(NOTIFICATION_CAPACITY);
        let ctx = SensorContext::new(notifications);
        let mut hud = Hud::new(width, height, mailbox);
        let display = Display::new(width, height);

        let world = World::new(client, blueprint, ctx, recorder)?;
        let keyboard = KeyboardControl::new(input, &mut hud);
        let adapter = AgentAdapter::new(
            build_agent(&blueprint.agent),
            blueprint.agent.kind,
            RoutePolicy::new(blueprint.agent.min_waypoints, blueprint.agent.loop_route),
            world.spawn_points().to_vec(),
        );

        Ok(Self {
            state: LoopState::Initializing,
            world,
            hud,
            display,
            keyboard,
            adapter,
            shutdown,
            frame_interval: Duration::from_secs_f64(
                1.0 / f64::from(blueprint.display.fps_cap.max(1)),
            ),
            tick_timeout: Duration::from_secs_f64(blueprint.client.tick_timeout_secs),
            fps: FpsClock::new(),
            metrics: LoopMetricsAggregator::new(),
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run until quit, route completion, interrupt or failure; always tears down
    pub async fn run(mut self) -> Result<ExitReason> {
        let result = self.start_and_loop().await;
        self.teardown().await;
        info!(summary = %self.metrics.summary(), "render loop finished");
        result
    }

    async fn start_and_loop(&mut self) -> Result<ExitReason> {
        self.world.restart().await.context("failed to spawn the player")?;
        self.world.on_world_tick(self.hud.world_tick_callback());

        let snapshot = self.world.client().snapshot();
        let (adapter, world) = (&mut self.adapter, &mut self.world);
        adapter.start(&snapshot, world.rng());

        self.transition(LoopState::Running);
        self.running().await
    }

    async fn running(&mut self) -> Result<ExitReason> {
        let mut frame_cap = tokio::time::interval(self.frame_interval);
        frame_cap.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = frame_cap.tick() => {}
                Ok(()) = self.shutdown.changed() => return Ok(ExitReason::Interrupted),
            }
            let frame_start = Instant::now();
            let delta = self.fps.tick();

            if self.keyboard.parse_events(&mut self.world, &mut self.hud) == InputOutcome::Quit {
                return Ok(ExitReason::Quit);
            }

            let waited = tokio::select! {
                result = self.world.client().wait_for_tick(self.tick_timeout) => result?,
                Ok(()) = self.shutdown.changed() => return Ok(ExitReason::Interrupted),
            };
            let Some(snapshot) = waited else {
                self.metrics.record_tick_timeout();
                debug!(timeout = ?self.tick_timeout, "no world tick, retrying");
                continue;
            };

            let frame = self.world.frame_snapshot(&snapshot);
            self.hud.tick(frame.as_ref(), self.fps.fps(), delta);

            let mut canvas = self.display.canvas();
            let surface = self.world.surface();
            self.hud.render(surface.as_deref(), &mut canvas);
            self.display.present(canvas);

            let clock = self.hud.server_clock();
            record_server_clock(clock.fps, clock.frame);
            record_frame_presented(self.fps.fps());

            match self.adapter.step(&snapshot) {
                AgentStep::Drive {
                    control,
                    notification,
                } => {
                    if let Some(text) = notification {
                        self.hud.notification(text, TARGET_NOTIFICATION_SECONDS);
                    }
                    self.world.apply_control(control)?;
                }
                AgentStep::Finished => return Ok(ExitReason::RouteFinished),
            }

            self.metrics
                .record_frame(frame_start.elapsed().as_secs_f64() * 1000.0, clock.fps);
        }
    }

    fn transition(&mut self, state: LoopState) {
        debug!(from = self.state.as_str(), to = state.as_str(), "loop state");
        self.state = state;
        record_loop_state(state.as_str());
    }

    /// Sensors, then the player, then the display
    #[instrument(name = "game_loop_teardown", skip(self))]
    async fn teardown(&mut self) {
        self.transition(LoopState::Destroying);
        self.world.destroy().await;
        self.display.close();
    }

    #[cfg(test)]
    fn frames_presented(&self) -> u64 {
        self.display.frames_presented()
    }
}
