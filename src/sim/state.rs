//! Game session state and spawn policy
//!
//! `GameSession` is the single mutable context of a game: counters, phase,
//! the entity registry and the scheduler. Nothing here is global; the
//! host owns the session and passes it to `tick`.

use glam::{Vec2, vec2};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use super::entity::{
    AlienCraft, AlienTier, Entity, EntityId, EntityKind, PickupKind, VariantProfile,
};
use super::events::GameEvent;
use super::motion::Motion;
use super::registry::Registry;
use super::scheduler::{Scheduler, TimerOwner, TimerPayload};
use super::shape::ASTEROID_OUTLINES;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::settings::Settings;

/// Legend shown on the intro screen
pub const LEGEND_INTRO: &str = "Asteroids";
/// Legend shown after losing a ship
pub const LEGEND_SHIP_LOST: &str = "Ouch!";
pub const LEGEND_GAME_OVER: &str = "Game Over";

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Asteroids drifting, no ship, waiting for start
    Intro,
    /// Ship present, input active
    Playing,
    /// Ship destroyed, waiting for the transition deadline
    ShipLost,
    /// Last asteroid destroyed, waiting for the transition deadline
    LevelClear,
    /// No lives left (terminal)
    GameOver,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Intro => "intro",
            GamePhase::Playing => "playing",
            GamePhase::ShipLost => "ship-lost",
            GamePhase::LevelClear => "level-clear",
            GamePhase::GameOver => "game-over",
        }
    }
}

/// Time-boxed pickup effects, as absolute end times on the sim clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub bullet_time_until: Option<u64>,
    pub force_field_until: Option<u64>,
    pub double_score_until: Option<u64>,
}

impl Modifiers {
    #[inline]
    pub fn bullet_time(&self) -> bool {
        self.bullet_time_until.is_some()
    }

    #[inline]
    pub fn double_score(&self) -> bool {
        self.double_score_until.is_some()
    }

    pub(crate) fn slot(&mut self, kind: PickupKind) -> &mut Option<u64> {
        match kind {
            PickupKind::BulletTime => &mut self.bullet_time_until,
            PickupKind::ForceField => &mut self.force_field_until,
            PickupKind::DoubleScore => &mut self.double_score_until,
        }
    }
}

/// Timer delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStats {
    /// Handlers invoked
    pub fired: u64,
    /// Timers dropped because their owner had expired
    pub dropped: u64,
}

/// One game, from intro screen to game over
#[derive(Debug, Clone)]
pub struct GameSession {
    pub settings: Settings,
    pub phase: GamePhase,
    pub lives: u32,
    /// Current level (1-based)
    pub level: u32,
    pub score: u64,
    /// Best score seen by this session (tracked by the enhanced rules)
    pub high_score: u64,
    /// The player ship, if one is live
    pub ship: Option<EntityId>,
    /// Force field entity, if active
    pub shield: Option<EntityId>,
    /// The hostile craft, if one is live
    pub alien: Option<EntityId>,
    /// Sim time at which the pending phase transition fires
    pub transition_deadline: Option<u64>,
    /// Standard projectiles currently alive
    pub bullets_in_flight: u32,
    pub modifiers: Modifiers,
    /// Sim clock (ms)
    pub now_ms: u64,
    pub registry: Registry,
    pub scheduler: Scheduler,
    pub stats: TimerStats,
    /// Score accumulated towards the next bonus life
    pub(crate) bonus_progress: u64,
    pub(crate) beat_interval_ms: u64,
    pub(crate) beat_high: bool,
    pub(crate) rng: Pcg32,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// Create a session on the intro screen. Invalid settings are replaced
    /// by defaults.
    pub fn new(settings: Settings) -> Self {
        let settings = settings.sanitized();
        let mut session = Self {
            phase: GamePhase::Intro,
            lives: settings.starting_lives,
            level: 1,
            score: 0,
            high_score: 0,
            ship: None,
            shield: None,
            alien: None,
            transition_deadline: None,
            bullets_in_flight: 0,
            modifiers: Modifiers::default(),
            now_ms: 0,
            registry: Registry::new(),
            scheduler: Scheduler::new(),
            stats: TimerStats::default(),
            bonus_progress: 0,
            beat_interval_ms: BEAT_START_MS,
            beat_high: false,
            rng: Pcg32::seed_from_u64(settings.seed),
            events: Vec::new(),
            settings,
        };

        session.place_asteroids(INTRO_ASTEROIDS);
        session.registry.flush();
        session.set_legend(LEGEND_INTRO);
        session.emit(GameEvent::Score(0));
        session.emit(GameEvent::Lives(session.lives));
        session.emit(GameEvent::Level(1));
        log::info!(
            "New {} session (seed {:#x})",
            session.settings.variant.as_str(),
            session.settings.seed
        );
        session
    }

    /// Leave the intro screen and begin play. Returns false (and does
    /// nothing) in any other phase; a finished game stays finished.
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::Intro {
            log::debug!("Start ignored in phase {}", self.phase.as_str());
            return false;
        }

        self.clear_entities();
        self.lives = self.settings.starting_lives;
        self.level = 1;
        self.score = 0;
        self.bonus_progress = 0;
        self.transition_deadline = None;
        self.modifiers = Modifiers::default();

        self.place_asteroids(self.level + 3);
        self.place_ship();
        self.emit(GameEvent::Score(0));
        self.emit(GameEvent::Lives(self.lives));
        self.emit(GameEvent::Level(self.level));
        self.set_phase(GamePhase::Playing);

        self.beat_interval_ms = BEAT_START_MS;
        self.arm(TimerOwner::Session, self.beat_interval_ms, TimerPayload::Beat);
        self.arm_alien_spawn();
        if self.profile().pickups {
            let delay = self.random_delay(PICKUP_SPAWN_MIN_MS, PICKUP_SPAWN_MAX_MS);
            self.arm(TimerOwner::Session, delay, TimerPayload::SpawnPickup);
        }
        true
    }

    /// Per-variant parameter table
    #[inline]
    pub fn profile(&self) -> &'static VariantProfile {
        VariantProfile::of(self.settings.variant)
    }

    #[inline]
    pub fn world(&self) -> Vec2 {
        vec2(self.settings.world_width, self.settings.world_height)
    }

    /// Live entities in insertion order (what a renderer draws)
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.registry.iter()
    }

    /// Non-expired asteroids, fragments spawned this tick included
    pub fn asteroid_count(&self) -> usize {
        self.registry
            .count(|kind| matches!(kind, EntityKind::Asteroid { .. }))
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events queued since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        log::info!("Phase {} -> {}", from.as_str(), to.as_str());
        self.emit(GameEvent::PhaseChanged { from, to });
    }

    pub(crate) fn set_legend(&mut self, legend: &'static str) {
        self.emit(GameEvent::Legend(legend));
    }

    pub(crate) fn play(&mut self, effect: SoundEffect) {
        self.emit(GameEvent::Sound(effect));
    }

    pub(crate) fn arm(&mut self, owner: TimerOwner, delay_ms: u64, payload: TimerPayload) {
        self.scheduler.arm(self.now_ms, delay_ms, owner, payload);
    }

    /// Schedule the pending phase transition unless one is already pending
    pub(crate) fn schedule_transition(&mut self) {
        if self.transition_deadline.is_none() {
            self.transition_deadline =
                Some(self.now_ms.saturating_add(self.settings.transition_delay_ms));
        }
    }

    pub(crate) fn random_delay(&mut self, min_ms: u64, max_ms: u64) -> u64 {
        self.rng.random_range(min_ms..=max_ms)
    }

    #[inline]
    pub(crate) fn random_angle(&mut self) -> f32 {
        self.rng.random::<f32>() * TAU
    }

    /// Arm the next hostile craft spawn unless one is already pending
    pub(crate) fn arm_alien_spawn(&mut self) {
        if self.phase == GamePhase::GameOver
            || self
                .scheduler
                .is_armed(TimerOwner::Session, TimerPayload::SpawnAlien)
        {
            return;
        }
        let delay = self.random_delay(ALIEN_SPAWN_MIN_MS, ALIEN_SPAWN_MAX_MS);
        self.arm(TimerOwner::Session, delay, TimerPayload::SpawnAlien);
    }

    /// Expire an entity, keeping the projectile counter and the ship /
    /// craft / shield handles in step. Returns the kind if this call
    /// expired it.
    pub fn expire(&mut self, id: EntityId) -> Option<EntityKind> {
        let kind = self.registry.expire(id)?;
        if kind.is_counted_bullet() {
            self.bullets_in_flight = self.bullets_in_flight.saturating_sub(1);
        }
        if self.ship == Some(id) {
            self.ship = None;
        }
        if self.alien == Some(id) {
            self.alien = None;
        }
        if self.shield == Some(id) {
            self.shield = None;
        }
        Some(kind)
    }

    /// Remove every entity, pending ones included
    pub(crate) fn clear_entities(&mut self) {
        if self.alien.is_some() {
            self.play(SoundEffect::SaucerLoopStop);
        }
        let removed = self.registry.clear();
        log::debug!("Cleared {removed} entities");
        self.ship = None;
        self.alien = None;
        self.shield = None;
        self.bullets_in_flight = 0;
        self.modifiers.force_field_until = None;
    }

    /// Place a fresh ship at the centre of the world, replacing any existing one
    pub fn place_ship(&mut self) -> EntityId {
        if let Some(old) = self.ship {
            self.expire(old);
        }
        let motion = Motion::at(self.world() * 0.5)
            .with_rotation(-PI / 2.0)
            .with_friction(SHIP_FRICTION);
        let id = self.registry.spawn(EntityKind::Ship, motion);
        self.ship = Some(id);
        self.set_legend("");
        log::debug!("Ship placed ({id:?})");
        id
    }

    /// Seed `count` large asteroids, cycling through the four corners
    pub fn place_asteroids(&mut self, count: u32) {
        let world = self.world();
        let corners = [
            vec2(EDGE_OFFSET, EDGE_OFFSET),
            vec2(world.x - EDGE_OFFSET, EDGE_OFFSET),
            vec2(EDGE_OFFSET, world.y - EDGE_OFFSET),
            vec2(world.x - EDGE_OFFSET, world.y - EDGE_OFFSET),
        ];
        for i in 0..count as usize {
            let jitter = vec2(
                self.rng.random_range(-25.0..25.0),
                self.rng.random_range(-25.0..25.0),
            );
            let variety = self.rng.random_range(0..ASTEROID_OUTLINES.len()) as u8;
            let tier = (ASTEROID_TIERS - 1) as u8;
            self.spawn_asteroid(tier, variety, corners[i % corners.len()] + jitter);
        }
    }

    /// Spawn one asteroid drifting in a random direction at its tier's speed
    pub fn spawn_asteroid(&mut self, tier: u8, variety: u8, position: Vec2) -> EntityId {
        let tier = tier.min((ASTEROID_TIERS - 1) as u8);
        let heading = self.random_angle();
        let rotation = self.random_angle();
        let motion = Motion::at(position)
            .with_velocity(ASTEROID_SPEED[tier as usize], heading)
            .with_rotation(rotation);
        self.registry
            .spawn(EntityKind::Asteroid { tier, variety }, motion)
    }

    /// Scatter debris lines from `position`
    pub(crate) fn spawn_debris(&mut self, position: Vec2, lengths: &[f32]) {
        for &length in lengths {
            let rotation = self.random_angle();
            let heading = self.random_angle();
            let speed = self.rng.random::<f32>() * DEBRIS_MAX_SPEED;
            let id = self.registry.next_id();
            let motion = Motion::at(position)
                .with_velocity(speed, heading)
                .with_rotation(rotation);
            self.registry
                .add(Entity::new(id, EntityKind::Debris, motion).with_scale(length));
            self.arm(TimerOwner::Entity(id), DEBRIS_DURATION_MS, TimerPayload::Expire);
        }
    }

    /// Spawn a projectile of the given kind with a lifetime
    pub(crate) fn spawn_projectile(
        &mut self,
        kind: EntityKind,
        position: Vec2,
        heading: f32,
    ) -> EntityId {
        let mut motion = Motion::at(position)
            .with_velocity(BULLET_SPEED, heading)
            .with_rotation(heading);
        if !matches!(kind, EntityKind::AlienBullet) {
            motion = motion.with_friction(SHIP_FRICTION);
        }
        let id = self.registry.spawn(kind, motion);
        if kind.is_counted_bullet() {
            self.bullets_in_flight += 1;
        }
        self.arm(TimerOwner::Entity(id), BULLET_DURATION_MS, TimerPayload::Expire);
        id
    }

    /// Spawn a hostile craft at the origin and start its behaviour timers
    pub(crate) fn spawn_alien(&mut self, tier: AlienTier) -> EntityId {
        let heading = if self.rng.random::<bool>() { 0.0 } else { PI };
        let craft = AlienCraft {
            tier,
            pursuing: false,
        };
        let motion = Motion::at(Vec2::ZERO).with_velocity(ALIEN_SPEED, heading);
        let id = self.registry.spawn(EntityKind::Alien(craft), motion);
        self.alien = Some(id);

        let owner = TimerOwner::Entity(id);
        self.arm(owner, ALIEN_TURN_MS, TimerPayload::AlienTurn);
        self.arm(owner, ALIEN_FIRST_SHOT_MS, TimerPayload::AlienFire);
        if self.profile().alien_pursuit {
            self.arm(owner, ALIEN_PURSUE_MS, TimerPayload::AlienPursue);
            self.arm(owner, ALIEN_SPEED_UP_MS, TimerPayload::AlienSpeedUp);
        }

        self.play(match tier {
            AlienTier::Weak => SoundEffect::SaucerLoopWeak,
            AlienTier::Strong => SoundEffect::SaucerLoopStrong,
        });
        self.emit(GameEvent::AlienSpawned { id, tier });
        log::debug!("Hostile craft {id:?} ({tier:?}) spawned at level {}", self.level);
        id
    }

    /// Spawn a random pickup at a random position
    pub(crate) fn spawn_pickup(&mut self) -> EntityId {
        let kind = PickupKind::ALL[self.rng.random_range(0..PickupKind::ALL.len())];
        let world = self.world();
        let position = vec2(
            self.rng.random::<f32>() * world.x,
            self.rng.random::<f32>() * world.y,
        );
        let id = self
            .registry
            .spawn(EntityKind::Pickup(kind), Motion::at(position));
        self.arm(TimerOwner::Entity(id), PICKUP_DURATION_MS, TimerPayload::Expire);
        log::debug!("Pickup {kind:?} spawned at {position}");
        id
    }

    /// Add to the score, doubling while the modifier is active, and grant
    /// a bonus life for each threshold of base points crossed since the
    /// last one. A finished game no longer scores.
    pub fn add_score(&mut self, base: u64) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        let increment = if self.modifiers.double_score() {
            base * 2
        } else {
            base
        };
        self.score += increment;
        self.emit(GameEvent::Score(self.score));

        self.bonus_progress += base;
        if self.bonus_progress >= self.settings.bonus_life_every {
            self.bonus_progress -= self.settings.bonus_life_every;
            self.lives += 1;
            log::debug!("Bonus life at {} points", self.score);
            self.emit(GameEvent::BonusLife);
            self.emit(GameEvent::Lives(self.lives));
        }
    }

    /// Serializable view of the session for rendering and logging
    pub fn snapshot(&self) -> SessionSnapshot {
        let profile = self.profile();
        SessionSnapshot {
            now_ms: self.now_ms,
            phase: self.phase,
            lives: self.lives,
            level: self.level,
            score: self.score,
            high_score: self.high_score,
            bullets_in_flight: self.bullets_in_flight,
            entities: self
                .registry
                .iter()
                .map(|e| EntityView {
                    id: e.id,
                    kind: e.kind,
                    position: e.position(),
                    rotation: e.motion.rotation,
                    outline: e.world_outline(profile),
                })
                .collect(),
        }
    }
}

/// A live entity as a renderer sees it
#[derive(Debug, Clone, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub rotation: f32,
    /// World-space outline to draw
    pub outline: Vec<Vec2>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub now_ms: u64,
    pub phase: GamePhase,
    pub lives: u32,
    pub level: u32,
    pub score: u64,
    pub high_score: u64,
    pub bullets_in_flight: u32,
    pub entities: Vec<EntityView>,
}
