//! Entity record and per-kind tables
//!
//! Entities are plain data: a kind tag, a `Motion` and an outline scale.
//! Behaviour that differs between kinds or game variants is looked up in
//! the tables here rather than dispatched through trait objects.

use glam::{Vec2, vec2};
use serde::{Deserialize, Serialize};

use super::collision::Capabilities;
use super::motion::Motion;
use super::shape::{self, OutlineTable};
use crate::consts::*;
use crate::settings::GameVariant;

/// Stable entity handle. Ids are never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Hostile craft strength class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlienTier {
    Weak,
    Strong,
}

impl AlienTier {
    #[inline]
    fn index(self) -> usize {
        match self {
            AlienTier::Weak => 0,
            AlienTier::Strong => 1,
        }
    }

    pub fn score(self) -> u64 {
        ALIEN_SCORE[self.index()]
    }

    pub fn scale(self) -> f32 {
        ALIEN_SCALE[self.index()]
    }

    /// Tier for a level, `None` below the level floor
    pub fn for_level(level: u32) -> Option<Self> {
        match level {
            0 | 1 => None,
            2 => Some(AlienTier::Weak),
            _ => Some(AlienTier::Strong),
        }
    }
}

/// Hostile craft state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlienCraft {
    pub tier: AlienTier,
    /// Homing on the ship; direction changes are suppressed while set
    pub pursuing: bool,
}

/// Power-up kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    /// Fire boost projectiles that ignore the in-flight limit
    BulletTime,
    /// Shield around the ship
    ForceField,
    /// Score increments doubled
    DoubleScore,
}

impl PickupKind {
    pub const ALL: [PickupKind; 3] = [
        PickupKind::BulletTime,
        PickupKind::ForceField,
        PickupKind::DoubleScore,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Ship,
    /// Standard projectile, counted against the in-flight limit
    Bullet,
    /// Projectile fired during bullet time, never counted
    BoostBullet,
    AlienBullet,
    Asteroid {
        /// Size class, 0 is smallest
        tier: u8,
        /// Which outline to draw
        variety: u8,
    },
    Alien(AlienCraft),
    /// Explosion fragment; the line length is the entity scale
    Debris,
    Pickup(PickupKind),
    Shield,
}

impl EntityKind {
    /// `(capabilities, vulnerable_to)` for this kind
    pub fn capabilities(&self) -> (Capabilities, Capabilities) {
        use Capabilities as C;
        match self {
            EntityKind::Ship => (
                C::ASTEROID_DESTROYER | C::ALIEN_DESTROYER | C::PICKUP_COLLECTOR,
                C::SHIP_DESTROYER,
            ),
            EntityKind::Asteroid { .. } => (C::SHIP_DESTROYER, C::ASTEROID_DESTROYER),
            EntityKind::Bullet | EntityKind::BoostBullet => {
                (C::ASTEROID_DESTROYER | C::ALIEN_DESTROYER, C::SHIP_DESTROYER)
            }
            EntityKind::Alien(_) => (
                C::ASTEROID_DESTROYER | C::SHIP_DESTROYER,
                C::ALIEN_DESTROYER,
            ),
            EntityKind::AlienBullet => (
                C::SHIP_DESTROYER | C::ASTEROID_DESTROYER,
                C::ALIEN_DESTROYER,
            ),
            EntityKind::Debris => (C::NONE, C::NONE),
            EntityKind::Pickup(_) => (C::NONE, C::PICKUP_COLLECTOR),
            EntityKind::Shield => (C::ASTEROID_DESTROYER | C::ALIEN_DESTROYER, C::NONE),
        }
    }

    /// Whether this kind of entity is a standard projectile
    #[inline]
    pub fn is_counted_bullet(&self) -> bool {
        matches!(self, EntityKind::Bullet)
    }
}

/// Per-variant parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantProfile {
    pub alien_outline: OutlineTable,
    /// Aim error of a strong craft (degrees, either side)
    pub alien_aim_error_deg: i32,
    /// Craft start pursuing the ship and later speed up
    pub alien_pursuit: bool,
    pub pickups: bool,
    pub tracks_high_score: bool,
}

pub const CLASSIC_PROFILE: VariantProfile = VariantProfile {
    alien_outline: shape::ALIEN_OUTLINE_CLASSIC,
    alien_aim_error_deg: ALIEN_AIM_ERROR_DEG,
    alien_pursuit: false,
    pickups: false,
    tracks_high_score: false,
};

pub const ENHANCED_PROFILE: VariantProfile = VariantProfile {
    alien_outline: shape::ALIEN_OUTLINE_ENHANCED,
    alien_aim_error_deg: 0,
    alien_pursuit: true,
    pickups: true,
    tracks_high_score: true,
};

impl VariantProfile {
    pub fn of(variant: GameVariant) -> &'static VariantProfile {
        match variant {
            GameVariant::Classic => &CLASSIC_PROFILE,
            GameVariant::Enhanced => &ENHANCED_PROFILE,
        }
    }
}

/// A simulated object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub motion: Motion,
    /// Outline scale
    pub scale: f32,
    /// Inert and awaiting removal at the next flush
    pub expired: bool,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, motion: Motion) -> Self {
        let scale = match kind {
            EntityKind::Asteroid { tier, .. } => {
                ASTEROID_SCALE[usize::from(tier).min(ASTEROID_TIERS - 1)]
            }
            EntityKind::Alien(craft) => craft.tier.scale(),
            _ => 1.0,
        };
        Self {
            id,
            kind,
            motion,
            scale,
            expired: false,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.motion.position
    }

    /// Local-space outline for this entity
    pub fn outline(&self, profile: &VariantProfile) -> OutlineTable {
        match self.kind {
            EntityKind::Ship => shape::SHIP_OUTLINE,
            EntityKind::Bullet | EntityKind::BoostBullet | EntityKind::AlienBullet => {
                shape::BULLET_OUTLINE
            }
            EntityKind::Asteroid { variety, .. } => {
                shape::ASTEROID_OUTLINES[usize::from(variety) % shape::ASTEROID_OUTLINES.len()]
            }
            EntityKind::Alien(_) => profile.alien_outline,
            EntityKind::Debris => shape::DEBRIS_OUTLINE,
            EntityKind::Pickup(PickupKind::DoubleScore) => shape::PICKUP_OCTAGON_OUTLINE,
            EntityKind::Pickup(_) => shape::PICKUP_SQUARE_OUTLINE,
            EntityKind::Shield => shape::SHIELD_OUTLINE,
        }
    }

    /// Current world-space outline (what collision and rendering use)
    pub fn world_outline(&self, profile: &VariantProfile) -> Vec<Vec2> {
        shape::to_world(self.outline(profile), &self.motion.transform(self.scale))
    }

    /// World-space projectile spawn point of a ship
    pub fn nose(&self) -> Vec2 {
        self.motion.to_world(self.scale, vec2(SHIP_NOSE.0, SHIP_NOSE.1))
    }
}
