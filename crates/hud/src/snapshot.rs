//! Per-frame read-only view gathered for the HUD

use std::collections::BTreeMap;

use contracts::{ActorSnapshot, GnssData, PlayerState, WorldSnapshot};

/// Everything the info panel shows for one frame
///
/// Built by the render loop from the latest world snapshot and the sensor
/// caches, then discarded after drawing. Values from different caches may
/// come from different simulation frames.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub player: PlayerState,
    pub map_name: String,
    pub actors: Vec<ActorSnapshot>,
    pub gnss: GnssData,
    /// Summed impulse magnitude per simulation frame
    pub collision_history: BTreeMap<u64, f64>,
}

impl FrameSnapshot {
    /// `None` while the world has no controlled actor
    pub fn from_world(
        world: &WorldSnapshot,
        gnss: GnssData,
        collision_history: BTreeMap<u64, f64>,
    ) -> Option<Self> {
        let player = world.player.clone()?;
        Some(Self {
            player,
            map_name: world.map_name.clone(),
            actors: world.actors.clone(),
            gnss,
            collision_history,
        })
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &ActorSnapshot> {
        self.actors.iter().filter(|a| a.is_vehicle())
    }
}
