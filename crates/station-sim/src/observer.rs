//! Simulated clients that keep a nav-map replica in sync over encoded
//! state messages.

use bevy_ecs::prelude::*;
use station_navmap::ecs::{GameTiming, get_state};
use station_navmap::{
    NavMap, NavMapComponentState, NavMapError, NavMapReplica, SnapshotError, StateMessage,
    encode_state,
};

/// Failure while syncing one observer.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    NavMap(#[from] NavMapError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// One simulated client.
pub struct Observer {
    pub id: u32,
    /// Sync every `period` ticks.
    pub period: u64,
    replica: NavMapReplica,
    bytes_received: usize,
    full_states: u32,
    delta_states: u32,
}

impl Observer {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            period: u64::from(id) + 1,
            replica: NavMapReplica::new(),
            bytes_received: 0,
            full_states: 0,
            delta_states: 0,
        }
    }

    /// Whether this observer syncs on `tick`.
    pub fn due(&self, tick: u64) -> bool {
        tick % self.period == 0
    }

    /// Requests a state from the replica's last tick, encodes it, and applies
    /// the bytes.
    pub fn sync(&mut self, world: &World, grid: Entity) -> Result<(), SyncError> {
        let tick = world.resource::<GameTiming>().cur_tick;
        let state = get_state(world, grid, self.replica.last_tick())?;
        match state {
            NavMapComponentState::Full(_) => self.full_states += 1,
            NavMapComponentState::Delta(_) => self.delta_states += 1,
        }

        let bytes = encode_state(&StateMessage::new(tick, state))?;
        self.bytes_received += bytes.len();
        self.replica.apply_bytes(&bytes)?;
        Ok(())
    }

    /// Whether the replica matches the server-side nav-map exactly.
    pub fn in_sync(&self, nav: &NavMap) -> bool {
        self.replica.state() == Some(&nav.full_state())
    }

    pub fn log_summary(&self) {
        tracing::info!(
            observer = self.id,
            full = self.full_states,
            deltas = self.delta_states,
            bytes = self.bytes_received,
            last_tick = %self.replica.last_tick(),
            "observer summary"
        );
    }
}
