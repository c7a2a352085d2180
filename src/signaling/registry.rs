use std::collections::HashMap;
use std::time::Instant;

use crate::signaling::errors::JoinError;
use crate::signaling::protocol::RoomId;
use crate::signaling::types::ClientId;

/// A room never holds more than this many connections.
pub const ROOM_CAPACITY: usize = 2;

#[derive(Debug)]
pub struct Room {
    pub room_id: RoomId,
    /// Join order; the first entry is the pre-existing member.
    pub members: Vec<ClientId>,
    pub created_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub member_count: usize,
    /// Members that were already in the room, in join order.
    pub others: Vec<ClientId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub room_id: RoomId,
    pub member_count: usize,
    pub remaining: Vec<ClientId>,
}

/// Room id → ordered members, plus the reverse index. Owned by the single
/// server-loop thread, so joins and leaves are already serialised.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    rooms: HashMap<RoomId, Room>,
    membership: HashMap<ClientId, RoomId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `client` to `room_id`, creating the room on first join.
    ///
    /// On error nothing changes.
    pub fn join(&mut self, room_id: &RoomId, client: ClientId) -> Result<JoinOutcome, JoinError> {
        if room_id.is_empty() {
            return Err(JoinError::InvalidRoom);
        }
        if let Some(current) = self.membership.get(&client) {
            return Err(JoinError::AlreadyInRoom {
                room: current.clone(),
            });
        }
        if self
            .rooms
            .get(room_id)
            .is_some_and(|r| r.members.len() >= ROOM_CAPACITY)
        {
            return Err(JoinError::RoomFull);
        }

        let room = self.rooms.entry(room_id.clone()).or_insert_with(|| Room {
            room_id: room_id.clone(),
            members: Vec::with_capacity(ROOM_CAPACITY),
            created_at: Instant::now(),
        });
        let others = room.members.clone();
        room.members.push(client);
        let member_count = room.members.len();
        self.membership.insert(client, room_id.clone());

        Ok(JoinOutcome {
            member_count,
            others,
        })
    }

    /// Removes `client` from its room, deleting the room when it empties.
    /// `None` when the client was in no room.
    pub fn leave(&mut self, client: ClientId) -> Option<LeaveOutcome> {
        let room_id = self.membership.remove(&client)?;
        let room = self.rooms.get_mut(&room_id)?;
        room.members.retain(|m| *m != client);

        let remaining = room.members.clone();
        if remaining.is_empty() {
            self.rooms.remove(&room_id);
        }

        Some(LeaveOutcome {
            room_id,
            member_count: remaining.len(),
            remaining,
        })
    }

    pub fn member_count(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map_or(0, |r| r.members.len())
    }

    pub fn room_of(&self, client: ClientId) -> Option<&RoomId> {
        self.membership.get(&client)
    }

    /// Other members of `client`'s room; empty when it is in none.
    pub fn peers_of(&self, client: ClientId) -> Vec<ClientId> {
        self.membership
            .get(&client)
            .and_then(|rid| self.rooms.get(rid))
            .map(|r| r.members.iter().copied().filter(|m| *m != client).collect())
            .unwrap_or_default()
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
