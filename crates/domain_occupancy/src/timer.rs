//! The one-shot cleaning timer
//!
//! Entering cleaning arms a delayed job keyed by room id. On fire, the job
//! re-reads the room and applies available only if the status is still
//! cleaning; an earlier manual override makes the fire a no-op. Re-arming
//! replaces the pending job instead of stacking a second one. The
//! reconciliation sweep covers rooms whose timer was lost (e.g. across a
//! process restart).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use core_kernel::RoomId;

use crate::service::OccupancyService;

/// Housekeeping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HousekeepingPolicy {
    /// Minimum time a room stays in cleaning before returning to available
    pub dwell: Duration,
}

impl Default for HousekeepingPolicy {
    fn default() -> Self {
        Self {
            dwell: Duration::from_secs(2 * 60 * 60),
        }
    }
}

/// Arms and replaces the per-room delayed cleaning→available jobs
pub struct CleaningTimer {
    service: Arc<OccupancyService>,
    dwell: Duration,
    armed: Mutex<HashMap<RoomId, JoinHandle<()>>>,
}

impl CleaningTimer {
    pub fn new(service: Arc<OccupancyService>, policy: &HousekeepingPolicy) -> Self {
        Self {
            service,
            dwell: policy.dwell,
            armed: Mutex::new(HashMap::new()),
        }
    }

    /// Arms a fresh one-shot timer for the room, replacing any pending one
    pub fn arm(&self, room_id: RoomId) {
        let service = Arc::clone(&self.service);
        let dwell = self.dwell;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(dwell).await;
            match service.try_complete_cleaning(room_id).await {
                Ok(true) => {
                    tracing::info!(%room_id, "cleaning dwell elapsed, room released");
                }
                Ok(false) => {
                    tracing::debug!(%room_id, "cleaning timer fired but was superseded");
                }
                Err(e) => {
                    // The sweep will pick the room up on its next pass.
                    tracing::warn!(%room_id, error = %e, "cleaning timer failed to release room");
                }
            }
        });

        let mut armed = self.armed.lock().expect("timer registry poisoned");
        if let Some(previous) = armed.insert(room_id, handle) {
            previous.abort();
        }
    }

    /// Cancels a pending timer, if one is armed
    pub fn disarm(&self, room_id: RoomId) {
        let mut armed = self.armed.lock().expect("timer registry poisoned");
        if let Some(handle) = armed.remove(&room_id) {
            handle.abort();
        }
    }
}

impl Drop for CleaningTimer {
    fn drop(&mut self) {
        let armed = self.armed.lock().expect("timer registry poisoned");
        for handle in armed.values() {
            handle.abort();
        }
    }
}
