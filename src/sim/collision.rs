//! Capability-gated collision resolution
//!
//! Every entity declares what it can destroy (`capabilities`) and what can
//! destroy it (`vulnerable_to`). A contact between A and B invokes B's
//! reaction when A's capabilities intersect B's vulnerabilities, and A's
//! reaction when the inverse holds. Entities with no relation pass through
//! each other.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::shape::{Bounds, polygons_overlap};

/// Destroyer capability tags as a bitset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Capabilities(pub u8);

impl Capabilities {
    pub const NONE: Self = Self(0);
    /// Breaks asteroids
    pub const ASTEROID_DESTROYER: Self = Self(1 << 0);
    /// Destroys the player ship
    pub const SHIP_DESTROYER: Self = Self(1 << 1);
    /// Destroys hostile craft
    pub const ALIEN_DESTROYER: Self = Self(1 << 2);
    /// Picks up power-ups
    pub const PICKUP_COLLECTOR: Self = Self(1 << 3);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// An entity as the resolver sees it for one pass
#[derive(Debug, Clone)]
pub struct Body {
    pub id: EntityId,
    pub capabilities: Capabilities,
    pub vulnerable_to: Capabilities,
    /// World-space outline
    pub outline: Vec<Vec2>,
    pub bounds: Bounds,
}

impl Body {
    pub fn new(
        id: EntityId,
        capabilities: Capabilities,
        vulnerable_to: Capabilities,
        outline: Vec<Vec2>,
    ) -> Self {
        let bounds = Bounds::of(&outline);
        Self {
            id,
            capabilities,
            vulnerable_to,
            outline,
            bounds,
        }
    }

    /// Whether this body can destroy `other`
    #[inline]
    pub fn destroys(&self, other: &Body) -> bool {
        self.capabilities.intersects(other.vulnerable_to)
    }

    /// Bodies that can neither hurt nor be hurt never need testing
    #[inline]
    fn is_inert(&self) -> bool {
        self.capabilities.is_empty() && self.vulnerable_to.is_empty()
    }
}

/// Receives the reactions raised by a collision pass
pub trait ContactHandler {
    /// Whether the entity is still live (not expired earlier in this pass)
    fn is_live(&self, id: EntityId) -> bool;
    /// `victim` was hit by something that destroys it
    fn react(&mut self, victim: EntityId, destroyer: EntityId);
}

/// Test every unordered pair once and dispatch reactions.
///
/// `bodies` is a snapshot taken before the pass; reactions may expire or
/// spawn entities, but spawns are not part of the snapshot and expired
/// bodies are skipped for the rest of the pass. Returns the number of
/// reactions dispatched.
pub fn resolve<H: ContactHandler>(bodies: &[Body], handler: &mut H) -> usize {
    let mut reactions = 0;
    for (i, a) in bodies.iter().enumerate() {
        if a.is_inert() {
            continue;
        }
        for b in &bodies[i + 1..] {
            let a_hits_b = a.destroys(b);
            let b_hits_a = b.destroys(a);
            if !a_hits_b && !b_hits_a {
                continue;
            }
            if !handler.is_live(a.id) {
                break;
            }
            if !handler.is_live(b.id) {
                continue;
            }
            if !a.bounds.intersects(&b.bounds) || !polygons_overlap(&a.outline, &b.outline) {
                continue;
            }

            // Both directions are decided before either reaction runs
            if a_hits_b {
                handler.react(b.id, a.id);
                reactions += 1;
            }
            if b_hits_a {
                handler.react(a.id, b.id);
                reactions += 1;
            }
        }
    }
    reactions
}
