//! Nav-map input events and the replication signals it emits.
//!
//! Inputs are queued into [`NavMapEvents`] by the host engine and drained
//! once per tick by [`nav_map_system`](super::nav_map_system), in the order
//! they were sent. Each replication signal becomes one [`NavMapDirtied`].

use bevy_ecs::prelude::*;
use glam::IVec2;

use crate::beacon::BeaconConfiguration;
use crate::chunk::Tick;

/// A grid joined a station and needs a nav-map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationGridAdded {
    /// The grid.
    pub grid: Entity,
}

/// A grid split into several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSplit {
    /// The grid that was split.
    pub grid: Entity,
    /// Grids produced by the split.
    pub new_grids: Vec<Entity>,
}

/// A grid tile was replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileChanged {
    /// Grid holding the tile.
    pub grid: Entity,
    /// Tile position.
    pub tile: IVec2,
    /// Whether the tile switched between space and floor.
    pub empty_changed: bool,
}

/// An anchored airtight entity changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirtightChanged {
    /// The entity.
    pub entity: Entity,
    /// Grid it is anchored to.
    pub grid: Entity,
    /// Tile it is anchored at.
    pub tile: IVec2,
    /// Only the open/sealed state toggled.
    pub air_blocked_changed: bool,
}

/// Player request to reconfigure a beacon.
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconConfigureMessage {
    /// Who sent the request.
    pub actor: Entity,
    /// Target beacon.
    pub beacon: Entity,
    /// Requested settings.
    pub config: BeaconConfiguration,
}

/// Any input the nav-map layer reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum NavMapInput {
    /// See [`StationGridAdded`].
    StationGridAdded(StationGridAdded),
    /// See [`GridSplit`].
    GridSplit(GridSplit),
    /// See [`TileChanged`].
    TileChanged(TileChanged),
    /// See [`AirtightChanged`].
    AirtightChanged(AirtightChanged),
    /// An entity finished map initialization.
    MapInit(Entity),
    /// An entity was anchored or unanchored.
    AnchorStateChanged(Entity),
    /// See [`BeaconConfigureMessage`].
    BeaconConfigure(BeaconConfigureMessage),
}

/// A nav-map changed and must be replicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavMapDirtied {
    /// Grid whose nav-map changed.
    pub grid: Entity,
    /// Tick of the change.
    pub tick: Tick,
}

/// Per-tick inbox of inputs and outbox of replication signals.
#[derive(Resource, Debug, Default)]
pub struct NavMapEvents {
    pending: Vec<NavMapInput>,
    dirtied: Vec<NavMapDirtied>,
}

impl NavMapEvents {
    /// Creates empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an input for the next system run.
    pub fn send(&mut self, input: NavMapInput) {
        self.pending.push(input);
    }

    /// Number of queued inputs.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Takes every queued input.
    pub(crate) fn take_pending(&mut self) -> Vec<NavMapInput> {
        std::mem::take(&mut self.pending)
    }

    /// Records a replication signal.
    pub(crate) fn push_dirtied(&mut self, grid: Entity, tick: Tick) {
        self.dirtied.push(NavMapDirtied { grid, tick });
    }

    /// Replication signals recorded so far.
    pub fn dirtied(&self) -> &[NavMapDirtied] {
        &self.dirtied
    }

    /// Takes every replication signal.
    pub fn drain_dirtied(&mut self) -> Vec<NavMapDirtied> {
        std::mem::take(&mut self.dirtied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queues_preserve_order_and_drain() {
        let mut events = NavMapEvents::new();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        events.send(NavMapInput::MapInit(a));
        events.send(NavMapInput::AnchorStateChanged(b));
        assert_eq!(events.pending_len(), 2);

        let taken = events.take_pending();
        assert_eq!(taken[0], NavMapInput::MapInit(a));
        assert_eq!(taken[1], NavMapInput::AnchorStateChanged(b));
        assert_eq!(events.pending_len(), 0);

        events.push_dirtied(a, Tick(3));
        assert_eq!(events.dirtied().len(), 1);
        assert_eq!(events.drain_dirtied(), vec![NavMapDirtied { grid: a, tick: Tick(3) }]);
        assert!(events.dirtied().is_empty());
    }
}
