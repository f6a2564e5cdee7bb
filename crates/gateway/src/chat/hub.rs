//! Per-room fan-out of outbound events.
//!
//! Each room gets a `broadcast` channel created on first use.  Connections
//! subscribe once per joined room; a frame can exclude one connection
//! (typing indicators are not echoed to the typist).

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::protocol::ServerEvent;

/// Identifies one WebSocket connection.
pub type ConnId = Uuid;

#[derive(Debug, Clone)]
pub struct RoomFrame {
    /// Connection that must not receive this frame.
    pub skip: Option<ConnId>,
    pub event: ServerEvent,
}

pub struct RoomHub {
    capacity: usize,
    rooms: RwLock<HashMap<String, broadcast::Sender<RoomFrame>>>,
}

impl RoomHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            rooms: RwLock::new(HashMap::new()),
        }
    }

    fn sender(&self, room_id: &str) -> broadcast::Sender<RoomFrame> {
        if let Some(tx) = self.rooms.read().get(room_id) {
            return tx.clone();
        }
        self.rooms
            .write()
            .entry(room_id.to_owned())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    pub fn subscribe(&self, room_id: &str) -> broadcast::Receiver<RoomFrame> {
        self.sender(room_id).subscribe()
    }

    /// Send to every subscriber of the room.  Returns the receiver count.
    pub fn publish(&self, room_id: &str, event: ServerEvent) -> usize {
        self.send(room_id, RoomFrame { skip: None, event })
    }

    /// Send to every subscriber except `conn`.
    pub fn publish_except(&self, room_id: &str, conn: ConnId, event: ServerEvent) -> usize {
        self.send(
            room_id,
            RoomFrame {
                skip: Some(conn),
                event,
            },
        )
    }

    fn send(&self, room_id: &str, frame: RoomFrame) -> usize {
        // No subscribers is not an error: the room may simply be empty.
        self.sender(room_id).send(frame).unwrap_or(0)
    }
}

impl Default for RoomHub {
    fn default() -> Self {
        Self::new(256)
    }
}
