//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置到模拟世界的装配
//! - 模拟 e2e 测试：MockSimulator -> 传感器缓存 -> HUD / Agent / Recorder

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{AgentKind, ClientBlueprint, ConfigVersion};

    #[test]
    fn test_blueprint_version_round_trip() {
        let mut blueprint = ClientBlueprint::default();
        blueprint.agent.kind = AgentKind::Basic;
        blueprint.agent.loop_route = true;

        let toml = ConfigLoader::to_toml(&blueprint).unwrap();
        assert!(toml.contains("version = \"V1\""));
        let back = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(back.version, ConfigVersion::V1);
        assert_eq!(back, blueprint);

        let json = ConfigLoader::to_json(&back).unwrap();
        assert_eq!(ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap(), blueprint);
    }

    #[test]
    fn test_config_drives_mock_world() {
        let content = r#"
[world]
map_name = "Town04"
traffic_vehicles = 2
"#;
        let blueprint = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        let sim = simulator::MockSimulator::manual(blueprint.world.clone());
        let world = simulator::SimulatorClient::snapshot(&sim);
        assert_eq!(world.map_name, "Town04");
        // two traffic vehicles, no player yet
        assert_eq!(world.actors.len(), 2);
        assert!(world.player.is_none());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use agent::{AgentAdapter, AgentStep, RoutePolicy};
    use contracts::{ActorControl, ActorId, AgentKind, Behavior, MockWorldConfig};
    use hud::{Canvas, FrameSnapshot, Hud, InfoItem};
    use recorder::{ImageFileSink, RecorderHandle};
    use sensors::{
        notification_channel, CameraManager, CollisionSensor, GnssSensor, SensorContext,
    };
    use simulator::{BehaviorAgent, MockSimulator, SimulatorClient, SpawnRequest};

    async fn connected(config: MockWorldConfig, manual: bool) -> MockSimulator {
        let mut sim = if manual {
            MockSimulator::manual(config)
        } else {
            MockSimulator::new(config)
        };
        sim.connect("127.0.0.1", 2000, Duration::from_secs(4))
            .await
            .unwrap();
        sim
    }

    async fn spawn_hero(sim: &MockSimulator) -> ActorId {
        let transform = sim.spawn_points().unwrap()[0];
        sim.try_spawn_actor(&SpawnRequest {
            blueprint: "vehicle.tesla.model3".into(),
            role_name: "hero".into(),
            color: None,
            transform,
        })
        .await
        .unwrap()
        .unwrap()
    }

    /// Scripted collisions reach the cache as per-frame magnitudes and
    /// surface in the HUD as a normalised sparkline
    #[tokio::test]
    async fn test_e2e_collisions_to_hud() {
        let sim = connected(
            MockWorldConfig {
                collision_interval_frames: 5,
                ..Default::default()
            },
            true,
        )
        .await;
        let hero = spawn_hero(&sim).await;

        let (tx, mailbox) = notification_channel(16);
        let ctx = SensorContext::new(tx);
        let collision = CollisionSensor::spawn(&sim, hero, &ctx).unwrap();
        let gnss = GnssSensor::spawn(&sim, hero, &ctx).unwrap();
        let mut hud = Hud::new(320, 240, mailbox);
        sim.on_tick(hud.world_tick_callback());

        let mut last = None;
        for _ in 0..10 {
            sim.step();
            last = Some(sim.snapshot());
        }
        let world = last.unwrap();

        // strength cycles 2, 3, ... on every fifth frame; |(300s, 400s, 0)| = 500s
        let history = collision.collision_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[&5], 1000.0);
        assert_eq!(history[&10], 1500.0);
        assert_ne!(gnss.fix(), contracts::GnssData::default());

        let frame = FrameSnapshot::from_world(&world, gnss.fix(), history).unwrap();
        hud.tick(Some(&frame), 60.0, Duration::from_millis(16));
        assert_eq!(hud.server_clock().frame, 10);

        assert!(hud.notification_text().starts_with("Collision with '"));
        let sparkline = hud
            .info_items()
            .iter()
            .find_map(|item| match item {
                InfoItem::Sparkline(values) => Some(values.clone()),
                _ => None,
            })
            .unwrap();
        assert!(sparkline.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(sparkline.iter().cloned().fold(0.0, f64::max), 1.0);

        let mut canvas = Canvas::new(320, 240);
        hud.render(None, &mut canvas);
        assert!(!canvas.texts().is_empty());

        let events = ctx.metrics.snapshot().events_received;
        assert!(events >= 12, "10 gnss fixes plus 2 collisions, got {events}");
    }

    /// Dropping the wrappers while the world keeps ticking on its own thread
    /// leaves no listener behind and never touches freed state
    #[tokio::test]
    async fn test_e2e_teardown_while_ticking() {
        let sim = connected(
            MockWorldConfig {
                tick_hz: 200.0,
                collision_interval_frames: 2,
                lane_invasion_interval_frames: 3,
                ..Default::default()
            },
            false,
        )
        .await;
        let hero = spawn_hero(&sim).await;

        let (tx, mailbox) = notification_channel(64);
        let ctx = SensorContext::new(tx);
        let collision = CollisionSensor::spawn(&sim, hero, &ctx).unwrap();
        let gnss = GnssSensor::spawn(&sim, hero, &ctx).unwrap();
        let lane = sensors::LaneInvasionSensor::spawn(&sim, hero, &ctx).unwrap();
        let mut camera = CameraManager::new(hero, (32, 24), 2.2, &ctx, None);
        camera.set_sensor(&sim, 0, false, false).unwrap();
        assert_eq!(sim.listening_sensor_count(), 4);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(collision.history_len() > 0);
        assert!(camera.surface().is_some());

        drop(collision);
        gnss.destroy();
        lane.destroy();
        camera.destroy();
        assert_eq!(sim.listening_sensor_count(), 0);

        let received = ctx.metrics.snapshot().events_received;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ctx.metrics.snapshot().events_received, received);
        assert!(!mailbox.is_empty());
        assert!(camera.surface().is_none());
    }

    /// A looping behavior agent keeps driving the player through the mock
    /// world without ever finishing
    #[tokio::test]
    async fn test_e2e_looping_agent_drives_player() {
        let sim = connected(MockWorldConfig::default(), true).await;
        let hero = spawn_hero(&sim).await;
        sim.step();

        let mut adapter = AgentAdapter::new(
            Box::new(BehaviorAgent::new(Behavior::Normal, Some(5))),
            AgentKind::Behavior,
            RoutePolicy::new(21, true),
            sim.spawn_points().unwrap(),
        );
        let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(5);
        adapter.start(&sim.snapshot(), &mut rng);

        for _ in 0..200 {
            let world = sim.snapshot();
            match adapter.step(&world) {
                AgentStep::Drive { control, .. } => {
                    sim.apply_control(hero, ActorControl::Vehicle(control))
                        .unwrap();
                }
                AgentStep::Finished => panic!("looping route must not finish"),
            }
            sim.step();
        }
        assert_eq!(sim.snapshot().timestamp.frame, 201);
    }

    /// Recording on: every decoded frame lands on disk as `%08d.png`
    #[tokio::test]
    async fn test_e2e_recording_to_png() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = RecorderHandle::spawn(ImageFileSink::new("png", dir.path()), 16);

        let sim = connected(MockWorldConfig::default(), true).await;
        let hero = spawn_hero(&sim).await;
        let (tx, mailbox) = notification_channel(8);
        let ctx = SensorContext::new(tx);

        let mut camera =
            CameraManager::new(hero, (32, 24), 2.2, &ctx, Some(recorder.frame_callback()));
        camera.set_sensor(&sim, 0, false, false).unwrap();
        sim.step();
        assert!(camera.toggle_recording());
        assert_eq!(mailbox.latest().unwrap().text, "Recording On");
        for _ in 0..3 {
            sim.step();
        }
        camera.destroy();

        let metrics = recorder.metrics().clone();
        recorder.shutdown().await;
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.recorded, 3);
        assert_eq!(snapshot.dropped, 0);

        for frame in 2..=4u64 {
            let path = dir.path().join(format!("{frame:08}.png"));
            let dims = image::image_dimensions(&path).unwrap();
            assert_eq!(dims, (32, 24), "{}", path.display());
        }
        assert!(!dir.path().join(format!("{:08}.png", 1)).exists());
        assert_eq!(ctx.metrics.snapshot().frames_queued, 3);
    }
}
