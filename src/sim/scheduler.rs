//! Delayed callbacks
//!
//! One-shot timers keyed by absolute fire time on the sim clock. Periodic
//! behaviour is built by the handler re-arming its own next timer. A timer
//! owned by an entity is dropped, not delivered, once that entity has
//! expired; the owner check happens right before each delivery so an owner
//! expired by an earlier timer in the same batch is caught.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use super::entity::{EntityId, PickupKind};

/// Who a timer is delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerOwner {
    Entity(EntityId),
    /// The game session itself; never expires
    Session,
}

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerPayload {
    /// Owner's lifetime is over
    Expire,
    /// Hostile craft picks a new direction
    AlienTurn,
    /// Hostile craft shoots
    AlienFire,
    /// Hostile craft starts homing on the ship
    AlienPursue,
    /// Hostile craft doubles its speed
    AlienSpeedUp,
    SpawnAlien,
    SpawnPickup,
    /// A pickup modifier runs out
    ModifierOver(PickupKind),
    /// Next ambient beat
    Beat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    /// Absolute sim time (ms)
    pub fire_at: u64,
    pub owner: TimerOwner,
    pub payload: TimerPayload,
    /// Arm order, breaks ties between timers due at the same instant
    seq: u64,
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at
            .cmp(&other.fire_at)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending timers
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Timer>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot timer `delay_ms` after `now`. A zero delay is
    /// treated as 1 ms so a handler re-arming itself cannot fire twice in
    /// the same batch.
    pub fn arm(&mut self, now: u64, delay_ms: u64, owner: TimerOwner, payload: TimerPayload) {
        let timer = Timer {
            fire_at: now.saturating_add(delay_ms.max(1)),
            owner,
            payload,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.queue.push(Reverse(timer));
    }

    /// Remove and return the earliest timer due at or before `now`
    pub fn pop_due(&mut self, now: u64) -> Option<Timer> {
        match self.queue.peek() {
            Some(Reverse(timer)) if timer.fire_at <= now => self.queue.pop().map(|Reverse(t)| t),
            _ => None,
        }
    }

    /// Fire time of the earliest pending timer
    pub fn next_due(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(t)| t.fire_at)
    }

    /// Whether a timer for this owner and payload is pending
    pub fn is_armed(&self, owner: TimerOwner, payload: TimerPayload) -> bool {
        self.queue
            .iter()
            .any(|Reverse(t)| t.owner == owner && t.payload == payload)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
