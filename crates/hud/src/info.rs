//! Info panel: content and layout

use contracts::{actor_display_name, ActorControl, WALKER_MAX_SPEED};

use crate::canvas::{Canvas, Rect, BLACK, ORANGE, WHITE};
use crate::fps::ServerClockSnapshot;
use crate::format::{
    collision_sparkline, fmt_signed, fmt_signed_int, format_sim_time, heading_letters,
};
use crate::snapshot::FrameSnapshot;

pub const PANEL_WIDTH: u32 = 220;
pub const PANEL_ALPHA: u8 = 100;
pub const LINE_HEIGHT: i32 = 18;
const BAR_H_OFFSET: i32 = 100;
const BAR_WIDTH: u32 = 106;

/// Vehicles farther than this are left out of the nearby list
pub const NEARBY_RADIUS: f64 = 200.0;

/// One row of the info panel
#[derive(Debug, Clone, PartialEq)]
pub enum InfoItem {
    /// Plain text; an empty string is a spacer
    Text(String),
    /// Label with a horizontal gauge between `min` and `max`
    Gauge {
        label: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Label with a filled (true) or empty (false) box
    Flag { label: &'static str, value: bool },
    /// Normalised values in [0, 1], drawn as a line chart
    Sparkline(Vec<f64>),
}

impl InfoItem {
    fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    fn blank() -> Self {
        Self::Text(String::new())
    }

    /// Text shown for this row, if any
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::Gauge { label, .. } | Self::Flag { label, .. } => Some(*label),
            Self::Sparkline(_) => None,
        }
    }
}

/// Build the info panel rows for one frame
pub fn build_info(
    frame: &FrameSnapshot,
    server: &ServerClockSnapshot,
    client_fps: f64,
) -> Vec<InfoItem> {
    let player = &frame.player;
    let t = &player.transform;
    let yaw = t.rotation.yaw;

    let mut items = vec![
        InfoItem::text(format!("Server:  {} FPS", fmt_signed(server.fps, 16, 0))),
        InfoItem::text(format!("Client:  {} FPS", fmt_signed(client_fps, 16, 0))),
        InfoItem::blank(),
        InfoItem::text(format!(
            "Vehicle: {:>20}",
            actor_display_name(&player.type_id, 20)
        )),
        InfoItem::text(format!("Map:     {:>20}", frame.map_name)),
        InfoItem::text(format!(
            "Simulation time: {:>12}",
            format_sim_time(server.simulation_time)
        )),
        InfoItem::blank(),
        InfoItem::text(format!("Speed:   {} km/h", fmt_signed(player.speed_kmh(), 15, 0))),
        InfoItem::text(format!(
            "Heading:{}\u{b0} {:>2}",
            fmt_signed(yaw, 16, 0),
            heading_letters(yaw)
        )),
        InfoItem::text(format!(
            "Location:{:>20}",
            format!(
                "({}, {})",
                fmt_signed(t.location.x, 5, 1),
                fmt_signed(t.location.y, 5, 1)
            )
        )),
        InfoItem::text(format!(
            "GNSS:{:>24}",
            format!(
                "({}, {})",
                fmt_signed(frame.gnss.latitude, 2, 6),
                fmt_signed(frame.gnss.longitude, 3, 6)
            )
        )),
        InfoItem::text(format!("Height:  {} m", fmt_signed(t.location.z, 18, 0))),
        InfoItem::blank(),
    ];

    match &player.control {
        ActorControl::Vehicle(c) => items.extend([
            InfoItem::Gauge {
                label: "Throttle:",
                value: c.throttle,
                min: 0.0,
                max: 1.0,
            },
            InfoItem::Gauge {
                label: "Steer:",
                value: c.steer,
                min: -1.0,
                max: 1.0,
            },
            InfoItem::Gauge {
                label: "Brake:",
                value: c.brake,
                min: 0.0,
                max: 1.0,
            },
            InfoItem::Flag {
                label: "Reverse:",
                value: c.reverse,
            },
            InfoItem::Flag {
                label: "Hand brake:",
                value: c.hand_brake,
            },
            InfoItem::Flag {
                label: "Manual:",
                value: c.manual_gear_shift,
            },
            InfoItem::text(format!("Gear:        {}", c.gear_label())),
        ]),
        ActorControl::Walker(c) => items.extend([
            InfoItem::Gauge {
                label: "Speed:",
                value: c.speed,
                min: 0.0,
                max: WALKER_MAX_SPEED,
            },
            InfoItem::Flag {
                label: "Jump:",
                value: c.jump,
            },
        ]),
    }

    let vehicle_count = frame.vehicles().count();
    items.extend([
        InfoItem::blank(),
        InfoItem::text("Collision:"),
        InfoItem::Sparkline(collision_sparkline(&frame.collision_history, server.frame)),
        InfoItem::blank(),
        InfoItem::text(format!(
            "Number of vehicles: {}",
            fmt_signed_int(vehicle_count as i64, 8)
        )),
    ]);
    if vehicle_count > 1 {
        items.push(InfoItem::text("Nearby vehicles:"));
    }

    let mut nearby: Vec<(f64, &str)> = frame
        .vehicles()
        .filter(|v| v.id != player.id)
        .map(|v| (v.transform.location.distance(&t.location), v.type_id.as_str()))
        .collect();
    nearby.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (dist, type_id) in nearby {
        if dist > NEARBY_RADIUS {
            break;
        }
        items.push(InfoItem::text(format!(
            "{}m {}",
            fmt_signed_int(dist as i64, 4),
            actor_display_name(type_id, 22)
        )));
    }

    items
}

/// Draw the translucent panel and its rows, stopping at the bottom edge
pub fn render_info(items: &[InfoItem], canvas: &mut Canvas) {
    let height = canvas.height() as i32;
    canvas.fill_rect(Rect::new(0, 0, PANEL_WIDTH, height as u32), BLACK, PANEL_ALPHA);

    let mut v_offset = 4;
    for item in items {
        if v_offset + LINE_HEIGHT > height {
            break;
        }
        match item {
            InfoItem::Sparkline(values) => {
                if values.len() > 1 {
                    let points: Vec<(f64, f64)> = values
                        .iter()
                        .enumerate()
                        .map(|(x, y)| {
                            (x as f64 + 8.0, v_offset as f64 + 8.0 + (1.0 - y) * 30.0)
                        })
                        .collect();
                    canvas.draw_polyline(&points, ORANGE, 2);
                }
                v_offset += LINE_HEIGHT;
            }
            InfoItem::Flag { value, .. } => {
                let rect = Rect::new(BAR_H_OFFSET, v_offset + 8, 6, 6);
                if *value {
                    canvas.fill_rect(rect, WHITE, 255);
                } else {
                    canvas.stroke_rect(rect, WHITE, 1);
                }
            }
            InfoItem::Gauge {
                value, min, max, ..
            } => {
                canvas.stroke_rect(Rect::new(BAR_H_OFFSET, v_offset + 8, BAR_WIDTH, 6), WHITE, 1);
                let fig = ((value - min) / (max - min)).clamp(0.0, 1.0);
                let rect = if *min < 0.0 {
                    let x = BAR_H_OFFSET + (fig * (BAR_WIDTH - 6) as f64) as i32;
                    Rect::new(x, v_offset + 8, 6, 6)
                } else {
                    Rect::new(BAR_H_OFFSET, v_offset + 8, (fig * BAR_WIDTH as f64) as u32, 6)
                };
                canvas.fill_rect(rect, WHITE, 255);
            }
            InfoItem::Text(_) => {}
        }
        if let Some(label) = item.label().filter(|l| !l.is_empty()) {
            canvas.draw_text(8, v_offset, label, WHITE, 255);
        }
        v_offset += LINE_HEIGHT;
    }
}
