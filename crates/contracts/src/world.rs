//! World-side state: tick timestamps, actor snapshots, weather presets.

use serde::{Deserialize, Serialize};

use crate::{ActorControl, Transform, Vector3};

/// Simulator-assigned actor id
pub type ActorId = u32;

/// Timestamp delivered with every world tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Timestamp {
    /// Simulation frame index
    pub frame: u64,
    /// Simulation seconds since the episode started
    pub elapsed_seconds: f64,
    /// Simulation seconds since the previous tick
    pub delta_seconds: f64,
    /// Wall-clock seconds on the server when the tick happened
    pub platform_timestamp: f64,
}

/// Read-only view of one actor in the world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub id: ActorId,
    /// Blueprint id (e.g., "vehicle.audi.tt", "walker.pedestrian.0001")
    pub type_id: String,
    pub transform: Transform,
    pub velocity: Vector3,
}

impl ActorSnapshot {
    pub fn is_vehicle(&self) -> bool {
        self.type_id.starts_with("vehicle.")
    }

    pub fn is_walker(&self) -> bool {
        self.type_id.starts_with("walker.")
    }
}

/// The controlled actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: ActorId,
    pub type_id: String,
    pub transform: Transform,
    pub velocity: Vector3,
    /// Last control applied to the actor
    pub control: ActorControl,
    /// Speed limit at the actor's location (km/h)
    pub speed_limit: f64,
}

impl PlayerState {
    /// Speed in km/h: `3.6 * |velocity|`
    pub fn speed_kmh(&self) -> f64 {
        3.6 * self.velocity.length()
    }
}

/// What the world looks like after one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub timestamp: Timestamp,
    pub map_name: String,
    pub player: Option<PlayerState>,
    /// Every actor except the sensors, including the player
    pub actors: Vec<ActorSnapshot>,
}

impl WorldSnapshot {
    pub fn vehicles(&self) -> impl Iterator<Item = &ActorSnapshot> {
        self.actors.iter().filter(|a| a.is_vehicle())
    }
}

/// Human-readable name for a blueprint id
///
/// `"vehicle.tesla.model3"` becomes `"Tesla Model3"`. Names longer than
/// `truncate` characters are cut to `truncate - 1` characters plus an ellipsis.
pub fn actor_display_name(type_id: &str, truncate: usize) -> String {
    let titled = title_case(&type_id.replace('_', "."));
    let name = titled.split('.').skip(1).collect::<Vec<_>>().join(" ");
    if name.chars().count() > truncate {
        let mut cut: String = name.chars().take(truncate.saturating_sub(1)).collect();
        cut.push('\u{2026}');
        cut
    } else {
        name
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Weather parameters sent to the simulator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherParameters {
    pub cloudiness: f32,
    pub precipitation: f32,
    pub precipitation_deposits: f32,
    pub wind_intensity: f32,
    pub sun_azimuth_angle: f32,
    pub sun_altitude_angle: f32,
}

impl WeatherParameters {
    const fn new(
        cloudiness: f32,
        precipitation: f32,
        precipitation_deposits: f32,
        wind_intensity: f32,
        sun_azimuth_angle: f32,
        sun_altitude_angle: f32,
    ) -> Self {
        Self {
            cloudiness,
            precipitation,
            precipitation_deposits,
            wind_intensity,
            sun_azimuth_angle,
            sun_altitude_angle,
        }
    }
}

impl Default for WeatherParameters {
    fn default() -> Self {
        WEATHER_PRESETS[0].1
    }
}

/// Named weather presets in alphabetical order of their identifiers
pub const WEATHER_PRESETS: &[(&str, WeatherParameters)] = &[
    ("ClearNoon", WeatherParameters::new(5.0, 0.0, 0.0, 10.0, -1.0, 45.0)),
    ("ClearSunset", WeatherParameters::new(5.0, 0.0, 0.0, 10.0, -1.0, 15.0)),
    ("CloudyNoon", WeatherParameters::new(60.0, 0.0, 0.0, 10.0, -1.0, 45.0)),
    ("CloudySunset", WeatherParameters::new(60.0, 0.0, 0.0, 10.0, -1.0, 15.0)),
    ("Default", WeatherParameters::new(-1.0, -1.0, -1.0, -1.0, -1.0, -1.0)),
    ("HardRainNoon", WeatherParameters::new(100.0, 100.0, 90.0, 100.0, -1.0, 45.0)),
    ("HardRainSunset", WeatherParameters::new(100.0, 100.0, 90.0, 100.0, -1.0, 15.0)),
    ("MidRainSunset", WeatherParameters::new(60.0, 60.0, 60.0, 60.0, -1.0, 15.0)),
    ("MidRainyNoon", WeatherParameters::new(60.0, 60.0, 60.0, 60.0, -1.0, 45.0)),
    ("SoftRainNoon", WeatherParameters::new(20.0, 30.0, 50.0, 30.0, -1.0, 45.0)),
    ("SoftRainSunset", WeatherParameters::new(20.0, 30.0, 50.0, 30.0, -1.0, 15.0)),
    ("WetCloudyNoon", WeatherParameters::new(60.0, 0.0, 50.0, 10.0, -1.0, 45.0)),
    ("WetCloudySunset", WeatherParameters::new(60.0, 0.0, 50.0, 10.0, -1.0, 15.0)),
    ("WetNoon", WeatherParameters::new(5.0, 0.0, 50.0, 10.0, -1.0, 45.0)),
    ("WetSunset", WeatherParameters::new(5.0, 0.0, 50.0, 10.0, -1.0, 15.0)),
];

/// Split a CamelCase preset identifier into words: "HardRainNoon" -> "Hard Rain Noon"
pub fn preset_display_name(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || (prev.is_uppercase() && next_lower) {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}
