//! Frame compositor

use std::sync::Arc;
use std::time::Duration;

use contracts::Timestamp;
use sensors::{NotificationLevel, NotificationReceiver, Surface, DEFAULT_NOTIFICATION_SECONDS};
use tracing::trace;

use crate::canvas::{Canvas, RED, WHITE};
use crate::fading::FadingText;
use crate::fps::{server_clock_callback, ServerClock, ServerClockSnapshot};
use crate::help::HelpText;
use crate::info::{build_info, render_info, InfoItem};
use crate::snapshot::FrameSnapshot;

/// Height of the notification strip at the bottom of the display
const NOTIFICATION_HEIGHT: u32 = 40;

/// Gathers the latest sensor values once per frame and draws them
pub struct Hud {
    width: u32,
    height: u32,
    notifications: FadingText,
    help: HelpText,
    server_clock: Arc<ServerClock>,
    mailbox: NotificationReceiver,
    show_info: bool,
    info: Vec<InfoItem>,
}

impl Hud {
    pub fn new(width: u32, height: u32, mailbox: NotificationReceiver) -> Self {
        Self {
            width,
            height,
            notifications: FadingText::new(
                (width, NOTIFICATION_HEIGHT),
                (0, height as i32 - NOTIFICATION_HEIGHT as i32),
            ),
            help: HelpText::new(width, height),
            server_clock: Arc::new(ServerClock::new()),
            mailbox,
            show_info: true,
            info: Vec::new(),
        }
    }

    pub fn dim(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Callback for the simulator's world tick; safe to outlive the HUD
    pub fn world_tick_callback(&self) -> Arc<dyn Fn(Timestamp) + Send + Sync> {
        server_clock_callback(&self.server_clock)
    }

    pub fn server_clock(&self) -> ServerClockSnapshot {
        self.server_clock.snapshot()
    }

    /// Per-frame update
    ///
    /// `delta` is the wall-clock time since the previous frame and drives the
    /// notification fade. Without a frame snapshot only the fade advances.
    pub fn tick(&mut self, frame: Option<&FrameSnapshot>, client_fps: f64, delta: Duration) {
        for n in self.mailbox.drain() {
            let color = match n.level {
                NotificationLevel::Info => WHITE,
                NotificationLevel::Error => RED,
            };
            self.notifications.set_text(n.text, color, n.seconds);
        }
        self.notifications.tick(delta);

        if !self.show_info {
            return;
        }
        if let Some(frame) = frame {
            self.info = build_info(frame, &self.server_clock.snapshot(), client_fps);
            trace!(rows = self.info.len(), "info panel rebuilt");
        }
    }

    pub fn notification(&mut self, text: impl Into<String>, seconds: f64) {
        self.notifications.set_text(text, WHITE, seconds);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.notifications.set_text(
            format!("Error: {}", text.into()),
            RED,
            DEFAULT_NOTIFICATION_SECONDS,
        );
    }

    pub fn toggle_info(&mut self) {
        self.show_info = !self.show_info;
    }

    pub fn toggle_help(&mut self) {
        self.help.toggle();
    }

    pub fn is_info_visible(&self) -> bool {
        self.show_info
    }

    pub fn is_help_visible(&self) -> bool {
        self.help.is_visible()
    }

    pub fn info_items(&self) -> &[InfoItem] {
        &self.info
    }

    pub fn notification_text(&self) -> &str {
        self.notifications.text()
    }

    pub fn notification_alpha(&self) -> u8 {
        self.notifications.alpha()
    }

    /// Compose one frame: sensor surface, info panel, notification, help
    pub fn render(&self, surface: Option<&Surface>, canvas: &mut Canvas) {
        if let Some(surface) = surface {
            canvas.blit_surface(surface);
        }
        if self.show_info {
            render_info(&self.info, canvas);
        }
        self.notifications.render(canvas);
        self.help.render(canvas);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use contracts::{GnssData, WorldSnapshot};
    use sensors::notification_channel;

    use super::*;

    fn world() -> WorldSnapshot {
        WorldSnapshot {
            timestamp: Timestamp::default(),
            map_name: "Town10HD_Opt".into(),
            player: Some(contracts::PlayerState {
                id: 1,
                type_id: "vehicle.audi.tt".into(),
                transform: Default::default(),
                velocity: Default::default(),
                control: Default::default(),
                speed_limit: 30.0,
            }),
            actors: Vec::new(),
        }
    }

    #[test]
    fn test_mailbox_feeds_fading_text() {
        let (tx, rx) = notification_channel(8);
        let mut hud = Hud::new(640, 480, rx);

        tx.notify("Weather: Clear Noon");
        tx.error("boom");
        hud.tick(None, 60.0, Duration::ZERO);

        assert_eq!(hud.notification_text(), "Error: boom");
        assert_eq!(hud.notification_alpha(), 255);

        for _ in 0..4 {
            hud.tick(None, 60.0, Duration::from_millis(500));
        }
        assert_eq!(hud.notification_alpha(), 0);
    }

    #[test]
    fn test_backlog_shows_newest_notification() {
        let (tx, rx) = notification_channel(64);
        let mut hud = Hud::new(640, 480, rx);

        for i in 0..70 {
            tx.notify(format!("Weather: preset {i}"));
        }
        hud.tick(None, 60.0, Duration::ZERO);

        assert_eq!(hud.notification_text(), "Weather: preset 69");
    }

    #[test]
    fn test_info_toggle() {
        let (_tx, rx) = notification_channel(8);
        let mut hud = Hud::new(640, 480, rx);
        let frame = FrameSnapshot::from_world(&world(), GnssData::default(), BTreeMap::new()).unwrap();

        hud.tick(Some(&frame), 60.0, Duration::ZERO);
        assert!(!hud.info_items().is_empty());

        let mut canvas = Canvas::new(640, 480);
        hud.render(None, &mut canvas);
        assert!(canvas
            .texts()
            .iter()
            .any(|t| t.text.starts_with("Map:")));

        hud.toggle_info();
        let mut canvas = Canvas::new(640, 480);
        hud.render(None, &mut canvas);
        assert!(canvas.texts().is_empty());
    }

    #[test]
    fn test_world_tick_updates_clock() {
        let (_tx, rx) = notification_channel(8);
        let hud = Hud::new(640, 480, rx);
        let cb = hud.world_tick_callback();
        cb(Timestamp {
            frame: 12,
            elapsed_seconds: 0.6,
            delta_seconds: 0.05,
            platform_timestamp: 0.0,
        });
        assert_eq!(hud.server_clock().frame, 12);
    }
}
