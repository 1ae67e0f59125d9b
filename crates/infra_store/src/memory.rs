//! The in-memory adapter
//!
//! Every entity map stores `(document, version)`; `update` compares the
//! caller's version against the stored one and bumps it on success, which
//! gives the engines the same conflict semantics a real document store's
//! compare-and-set would.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use core_kernel::{BillId, DomainPort, GuestId, PortError, RoomId, Versioned};
use domain_ledger::{Bill, BillStore};
use domain_occupancy::{Room, RoomStatus, RoomStore, StayLookup, TicketPort};
use domain_stay::{Guest, GuestStatus, GuestStore};

/// A versioned entity map with compare-and-set updates
struct Collection<K, V> {
    entity: &'static str,
    rows: RwLock<HashMap<K, (V, u64)>>,
}

impl<K, V> Collection<K, V>
where
    K: std::hash::Hash + Eq + Copy + std::fmt::Display,
    V: Clone,
{
    fn new(entity: &'static str) -> Self {
        Self {
            entity,
            rows: RwLock::new(HashMap::new()),
        }
    }

    async fn insert(&self, key: K, value: V) -> Result<Versioned<V>, PortError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&key) {
            return Err(PortError::conflict(format!(
                "{} {key} already exists",
                self.entity
            )));
        }
        rows.insert(key, (value.clone(), 1));
        Ok(Versioned::new(value, 1))
    }

    async fn get(&self, key: K) -> Result<Versioned<V>, PortError> {
        let rows = self.rows.read().await;
        rows.get(&key)
            .map(|(value, version)| Versioned::new(value.clone(), *version))
            .ok_or_else(|| PortError::not_found(self.entity, key))
    }

    async fn update(
        &self,
        key: K,
        expected_version: u64,
        value: V,
    ) -> Result<Versioned<V>, PortError> {
        let mut rows = self.rows.write().await;
        let (stored, version) = rows
            .get_mut(&key)
            .ok_or_else(|| PortError::not_found(self.entity, key))?;
        if *version != expected_version {
            return Err(PortError::conflict(format!(
                "{} {key}: expected version {expected_version}, store has {version}",
                self.entity
            )));
        }
        *stored = value.clone();
        *version += 1;
        Ok(Versioned::new(value, *version))
    }

    async fn filter(&self, keep: impl Fn(&V) -> bool) -> Vec<Versioned<V>> {
        let rows = self.rows.read().await;
        rows.values()
            .filter(|(value, _)| keep(value))
            .map(|(value, version)| Versioned::new(value.clone(), *version))
            .collect()
    }
}

/// One tenant's worth of state behind every domain port
pub struct MemoryStore {
    bills: Collection<BillId, Bill>,
    rooms: Collection<RoomId, Room>,
    guests: Collection<GuestId, Guest>,
    open_tickets: RwLock<HashSet<RoomId>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            bills: Collection::new("Bill"),
            rooms: Collection::new("Room"),
            guests: Collection::new("Guest"),
            open_tickets: RwLock::new(HashSet::new()),
        }
    }

    /// Marks or clears open tickets against a room (ticketing is external;
    /// this stands in for its feed)
    pub async fn set_open_tickets(&self, room_id: RoomId, open: bool) {
        let mut tickets = self.open_tickets.write().await;
        if open {
            tickets.insert(room_id);
        } else {
            tickets.remove(&room_id);
        }
    }
}

impl DomainPort for MemoryStore {}

#[async_trait]
impl BillStore for MemoryStore {
    async fn create(&self, bill: Bill) -> Result<Versioned<Bill>, PortError> {
        {
            let rows = self.bills.rows.read().await;
            for (existing, _) in rows.values() {
                if existing.bill_number == bill.bill_number {
                    return Err(PortError::conflict(format!(
                        "bill number {} already exists",
                        bill.bill_number
                    )));
                }
                if existing.guest_id == bill.guest_id && existing.status().is_open() {
                    return Err(PortError::conflict(format!(
                        "guest {} already has open bill {}",
                        bill.guest_id, existing.bill_number
                    )));
                }
            }
        }
        self.bills.insert(bill.id, bill).await
    }

    async fn get(&self, id: BillId) -> Result<Versioned<Bill>, PortError> {
        self.bills.get(id).await
    }

    async fn find_open_for_guest(
        &self,
        guest_id: GuestId,
    ) -> Result<Option<Versioned<Bill>>, PortError> {
        let mut open = self
            .bills
            .filter(|bill| bill.guest_id == guest_id && bill.status().is_open())
            .await;
        Ok(open.pop())
    }

    async fn update(
        &self,
        expected_version: u64,
        bill: Bill,
    ) -> Result<Versioned<Bill>, PortError> {
        self.bills.update(bill.id, expected_version, bill).await
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn create(&self, room: Room) -> Result<Versioned<Room>, PortError> {
        {
            let rows = self.rooms.rows.read().await;
            if rows.values().any(|(existing, _)| existing.number == room.number) {
                return Err(PortError::conflict(format!(
                    "room number {} already exists",
                    room.number
                )));
            }
        }
        self.rooms.insert(room.id, room).await
    }

    async fn get(&self, id: RoomId) -> Result<Versioned<Room>, PortError> {
        self.rooms.get(id).await
    }

    async fn list_by_status(&self, status: RoomStatus) -> Result<Vec<Versioned<Room>>, PortError> {
        Ok(self
            .rooms
            .filter(|room| room.active && room.status == status)
            .await)
    }

    async fn update(
        &self,
        expected_version: u64,
        room: Room,
    ) -> Result<Versioned<Room>, PortError> {
        self.rooms.update(room.id, expected_version, room).await
    }
}

#[async_trait]
impl GuestStore for MemoryStore {
    async fn create(&self, guest: Guest) -> Result<Versioned<Guest>, PortError> {
        self.guests.insert(guest.id, guest).await
    }

    async fn get(&self, id: GuestId) -> Result<Versioned<Guest>, PortError> {
        self.guests.get(id).await
    }

    async fn update(
        &self,
        expected_version: u64,
        guest: Guest,
    ) -> Result<Versioned<Guest>, PortError> {
        self.guests.update(guest.id, expected_version, guest).await
    }

    async fn find_checked_in_by_room(
        &self,
        room_id: RoomId,
    ) -> Result<Option<Versioned<Guest>>, PortError> {
        let mut matches = self
            .guests
            .filter(|guest| guest.room_id == room_id && guest.status == GuestStatus::CheckedIn)
            .await;
        Ok(matches.pop())
    }

    async fn list_checked_in(&self) -> Result<Vec<Versioned<Guest>>, PortError> {
        Ok(self
            .guests
            .filter(|guest| guest.status == GuestStatus::CheckedIn)
            .await)
    }
}

#[async_trait]
impl StayLookup for MemoryStore {
    async fn checked_in_guest_for_room(
        &self,
        room_id: RoomId,
    ) -> Result<Option<GuestId>, PortError> {
        Ok(self
            .find_checked_in_by_room(room_id)
            .await?
            .map(|guest| guest.data.id))
    }
}

#[async_trait]
impl TicketPort for MemoryStore {
    async fn has_open_tickets(&self, room_id: RoomId) -> Result<bool, PortError> {
        Ok(self.open_tickets.read().await.contains(&room_id))
    }
}
