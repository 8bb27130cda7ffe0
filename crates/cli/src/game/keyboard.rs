//! Keyboard control
//!
//! The display is headless, so key presses arrive as [`InputEvent`]s on a
//! channel (fed from stdin by the `run` command, or directly by tests).

use async_channel::Receiver;
use hud::Hud;
use simulator::SimulatorClient;
use tracing::{debug, warn};

use super::world::World;

/// Seconds the startup hint stays on screen
pub const HELP_HINT_SECONDS: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    F1,
    Tab,
    Backquote,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
        }
    }

    /// Escape or Ctrl+Q
    pub fn is_quit_shortcut(&self) -> bool {
        self.key == Key::Escape || (self.key == Key::Char('q') && self.ctrl)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// The display window was closed
    Close,
    Key(KeyPress),
}

impl InputEvent {
    /// Parse one line of textual input, e.g. `esc`, `ctrl+q`, `shift+c`, `?`
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let lower = token.to_ascii_lowercase();
        if lower == "close" {
            return Some(Self::Close);
        }

        let mut ctrl = false;
        let mut shift = false;
        let mut rest = lower.as_str();
        loop {
            if let Some(r) = rest.strip_prefix("ctrl+") {
                ctrl = true;
                rest = r;
            } else if let Some(r) = rest.strip_prefix("shift+") {
                shift = true;
                rest = r;
            } else {
                break;
            }
        }

        let key = match rest {
            "esc" | "escape" => Key::Escape,
            "f1" => Key::F1,
            "tab" => Key::Tab,
            "`" | "backquote" => Key::Backquote,
            _ => {
                let mut chars = rest.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return None,
                }
            }
        };
        // a bare upper-case letter means shift
        if token.len() == 1 && token.chars().all(|c| c.is_ascii_uppercase()) {
            shift = true;
        }
        Some(Self::Key(KeyPress { key, ctrl, shift }))
    }
}

/// What the render loop should do after pumping input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Continue,
    Quit,
}

pub struct KeyboardControl {
    events: Receiver<InputEvent>,
}

impl KeyboardControl {
    /// Posts the "Press 'H' or '?' for help." hint
    pub fn new(events: Receiver<InputEvent>, hud: &mut Hud) -> Self {
        hud.notification("Press 'H' or '?' for help.", HELP_HINT_SECONDS);
        Self { events }
    }

    /// Handle every pending event without waiting
    pub fn parse_events<C: SimulatorClient>(
        &mut self,
        world: &mut World<C>,
        hud: &mut Hud,
    ) -> InputOutcome {
        while let Ok(event) = self.events.try_recv() {
            if handle_event(event, world, hud) == InputOutcome::Quit {
                return InputOutcome::Quit;
            }
        }
        InputOutcome::Continue
    }
}

fn handle_event<C: SimulatorClient>(
    event: InputEvent,
    world: &mut World<C>,
    hud: &mut Hud,
) -> InputOutcome {
    let press = match event {
        InputEvent::Close => return InputOutcome::Quit,
        InputEvent::Key(press) if press.is_quit_shortcut() => return InputOutcome::Quit,
        InputEvent::Key(press) => press,
    };
    debug!(key = ?press.key, ctrl = press.ctrl, shift = press.shift, "key pressed");

    let result = match press.key {
        Key::F1 => {
            hud.toggle_info();
            Ok(())
        }
        Key::Char('h') | Key::Char('?') => {
            hud.toggle_help();
            Ok(())
        }
        Key::Char('c') => {
            world.next_weather(press.shift);
            Ok(())
        }
        Key::Tab => world.toggle_camera(),
        Key::Backquote | Key::Char('n') => world.next_sensor(),
        Key::Char('r') => {
            world.toggle_recording();
            Ok(())
        }
        _ => Ok(()),
    };

    if let Err(e) = result {
        warn!(error = %e, "input action failed");
        hud.error(e.to_string());
    }
    InputOutcome::Continue
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{ClientBlueprint, MockWorldConfig, WEATHER_PRESETS};
    use sensors::{notification_channel, SensorContext};
    use simulator::MockSimulator;

    use super::*;

    async fn ready_world() -> (World<MockSimulator>, Hud) {
        let mut sim = MockSimulator::manual(MockWorldConfig::default());
        sim.connect("127.0.0.1", 2000, Duration::from_secs(4))
            .await
            .unwrap();
        let (tx, rx) = notification_channel(16);
        let mut blueprint = ClientBlueprint::default();
        blueprint.agent.seed = Some(7);
        blueprint.display.width = 64;
        blueprint.display.height = 48;

        let mut world = World::new(Arc::new(sim), &blueprint, SensorContext::new(tx), None).unwrap();
        world.restart().await.unwrap();
        (world, Hud::new(64, 48, rx))
    }

    fn press(
        keyboard: &mut KeyboardControl,
        input: &async_channel::Sender<InputEvent>,
        token: &str,
        world: &mut World<MockSimulator>,
        hud: &mut Hud,
    ) -> InputOutcome {
        input.try_send(InputEvent::parse(token).unwrap()).unwrap();
        keyboard.parse_events(world, hud)
    }

    fn key(token: &str) -> KeyPress {
        match InputEvent::parse(token) {
            Some(InputEvent::Key(press)) => press,
            other => panic!("{token} parsed to {other:?}"),
        }
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!(InputEvent::parse("close"), Some(InputEvent::Close));
        assert_eq!(key("esc").key, Key::Escape);
        assert_eq!(key("F1").key, Key::F1);
        assert_eq!(key("`").key, Key::Backquote);
        assert_eq!(key("?").key, Key::Char('?'));

        let ctrl_q = key("ctrl+q");
        assert!(ctrl_q.ctrl && ctrl_q.is_quit_shortcut());
        assert!(!key("q").is_quit_shortcut());

        let shift_c = key("shift+c");
        assert_eq!(shift_c.key, Key::Char('c'));
        assert!(shift_c.shift);
        assert!(key("C").shift);
        assert!(!key("c").shift);

        assert_eq!(InputEvent::parse(""), None);
        assert_eq!(InputEvent::parse("hello"), None);
    }

    #[tokio::test]
    async fn test_key_actions() {
        let (mut world, mut hud) = ready_world().await;
        let (input, events) = async_channel::unbounded();
        let mut keyboard = KeyboardControl::new(events, &mut hud);
        let k = &mut keyboard;

        assert!(hud.is_info_visible());
        assert_eq!(press(k, &input, "f1", &mut world, &mut hud), InputOutcome::Continue);
        assert!(!hud.is_info_visible());

        assert!(!hud.is_help_visible());
        press(k, &input, "h", &mut world, &mut hud);
        assert!(hud.is_help_visible());
        press(k, &input, "?", &mut world, &mut hud);
        assert!(!hud.is_help_visible());

        assert_eq!(world.weather_index(), 0);
        press(k, &input, "c", &mut world, &mut hud);
        assert_eq!(world.weather_index(), 1);
        press(k, &input, "shift+c", &mut world, &mut hud);
        press(k, &input, "C", &mut world, &mut hud);
        assert_eq!(world.weather_index(), WEATHER_PRESETS.len() - 1);

        let mount = world.camera().unwrap().transform_index();
        press(k, &input, "tab", &mut world, &mut hud);
        assert_eq!(
            world.camera().unwrap().transform_index(),
            (mount + 1) % sensors::camera_mounts().len()
        );

        assert_eq!(world.camera().unwrap().index(), Some(0));
        press(k, &input, "n", &mut world, &mut hud);
        assert_eq!(world.camera().unwrap().index(), Some(1));
        press(k, &input, "`", &mut world, &mut hud);
        assert_eq!(world.camera().unwrap().index(), Some(2));

        assert!(!world.is_recording());
        press(k, &input, "r", &mut world, &mut hud);
        assert!(world.is_recording());
        press(k, &input, "r", &mut world, &mut hud);
        assert!(!world.is_recording());

        assert_eq!(press(k, &input, "q", &mut world, &mut hud), InputOutcome::Continue);
        assert_eq!(press(k, &input, "ctrl+q", &mut world, &mut hud), InputOutcome::Quit);
        world.destroy().await;
    }

    #[tokio::test]
    async fn test_escape_and_close_quit() {
        let (mut world, mut hud) = ready_world().await;
        let (input, events) = async_channel::unbounded();
        let mut keyboard = KeyboardControl::new(events, &mut hud);

        assert_eq!(hud.notification_text(), "Press 'H' or '?' for help.");
        assert_eq!(press(&mut keyboard, &input, "esc", &mut world, &mut hud), InputOutcome::Quit);
        assert_eq!(
            press(&mut keyboard, &input, "close", &mut world, &mut hud),
            InputOutcome::Quit
        );
        world.destroy().await;
    }
}
