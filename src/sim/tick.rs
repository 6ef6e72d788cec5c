//! Fixed timestep simulation tick
//!
//! One call to `tick` advances the session by one frame interval:
//! timers, input, motion, collisions, flush, then the phase transition
//! check. Collaborator hooks are queued as events and handed out by
//! `run_frame`.

use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;

use super::collision::{self, Body, ContactHandler};
use super::entity::{AlienTier, EntityId, EntityKind, PickupKind};
use super::events::GameEvent;
use super::motion::Motion;
use super::scheduler::{Timer, TimerOwner, TimerPayload};
use super::shape::ASTEROID_OUTLINES;
use super::state::{GamePhase, GameSession, LEGEND_GAME_OVER, LEGEND_SHIP_LOST};
use crate::audio::{AudioSink, SoundEffect};
use crate::consts::*;
use crate::hud::Hud;

/// Input sampled for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub turn_left: bool,
    pub turn_right: bool,
    pub thrust: bool,
    pub fire: bool,
    /// Start a game (only honoured on the intro screen)
    pub start: bool,
}

/// Advance the session by one frame interval
pub fn tick(session: &mut GameSession, input: &TickInput) {
    session.now_ms += session.settings.frame_interval_ms;

    if input.start {
        session.start();
    }

    run_timers(session);
    apply_input(session, input);
    move_entities(session);
    resolve_collisions(session);
    session.registry.flush();
    check_transition(session);
}

/// Tick once, then hand this tick's events to the collaborators.
/// Returns the events that were dispatched.
pub fn run_frame<A, H>(
    session: &mut GameSession,
    input: &TickInput,
    audio: &mut A,
    hud: &mut H,
) -> Vec<GameEvent>
where
    A: AudioSink + ?Sized,
    H: Hud + ?Sized,
{
    tick(session, input);
    let events = session.drain_events();
    for event in &events {
        match event {
            GameEvent::Sound(effect) => audio.play(*effect),
            other => {
                other.apply_to_hud(hud);
            }
        }
    }
    events
}

// ============================================================================
// Timers
// ============================================================================

fn run_timers(session: &mut GameSession) {
    while let Some(timer) = session.scheduler.pop_due(session.now_ms) {
        if let TimerOwner::Entity(id) = timer.owner {
            // Owner may have expired earlier in this batch
            if !session.registry.is_live(id) {
                session.stats.dropped += 1;
                log::trace!("Dropped {:?} for expired {id:?}", timer.payload);
                continue;
            }
        }
        session.stats.fired += 1;
        fire_timer(session, timer);
    }
}

fn fire_timer(session: &mut GameSession, timer: Timer) {
    match (timer.owner, timer.payload) {
        (TimerOwner::Entity(id), TimerPayload::Expire) => {
            session.expire(id);
        }
        (TimerOwner::Entity(id), TimerPayload::AlienTurn) => alien_turn(session, id),
        (TimerOwner::Entity(id), TimerPayload::AlienFire) => alien_fire(session, id),
        (TimerOwner::Entity(id), TimerPayload::AlienPursue) => {
            if let Some(EntityKind::Alien(craft)) =
                session.registry.get_mut(id).map(|e| &mut e.kind)
            {
                craft.pursuing = true;
                log::debug!("Hostile craft {id:?} pursuing");
            }
        }
        (TimerOwner::Entity(id), TimerPayload::AlienSpeedUp) => {
            if let Some(e) = session.registry.get_mut(id) {
                e.motion.speed *= 2.0;
            }
        }
        (TimerOwner::Session, TimerPayload::SpawnAlien) => spawn_alien_due(session),
        (TimerOwner::Session, TimerPayload::SpawnPickup) => spawn_pickup_due(session),
        (TimerOwner::Session, TimerPayload::ModifierOver(kind)) => modifier_over(session, kind),
        (TimerOwner::Session, TimerPayload::Beat) => beat(session),
        (owner, payload) => log::warn!("Unhandled timer {payload:?} for {owner:?}"),
    }
}

/// Zig-zag: a new heading within a radian of the current direction of travel
fn alien_turn(session: &mut GameSession, id: EntityId) {
    let Some((heading, pursuing)) = session.registry.get(id).and_then(|e| match e.kind {
        EntityKind::Alien(craft) => Some((e.motion.heading, craft.pursuing)),
        _ => None,
    }) else {
        return;
    };

    if !pursuing {
        let offset = session.rng.random_range(-1..=1) as f32;
        let heading = if heading.cos() > 0.0 { offset } else { PI + offset };
        if let Some(e) = session.registry.get_mut(id) {
            let speed = e.motion.speed;
            e.motion.set_velocity(speed, heading);
        }
    }
    session.arm(TimerOwner::Entity(id), ALIEN_TURN_MS, TimerPayload::AlienTurn);
}

fn alien_fire(session: &mut GameSession, id: EntityId) {
    let Some((origin, tier)) = session.registry.get(id).and_then(|e| match e.kind {
        EntityKind::Alien(craft) => Some((e.position(), craft.tier)),
        _ => None,
    }) else {
        return;
    };
    let target = session
        .ship
        .and_then(|ship| session.registry.get(ship))
        .map(|ship| ship.position());

    if let Some(target) = target {
        let heading = match tier {
            AlienTier::Strong => {
                let to_ship = target - origin;
                let error = session.profile().alien_aim_error_deg;
                let jitter = if error > 0 {
                    session.rng.random_range(-error..=error) as f32
                } else {
                    0.0
                };
                to_ship.y.atan2(to_ship.x) + jitter.to_radians()
            }
            AlienTier::Weak => session.random_angle(),
        };
        session.spawn_projectile(EntityKind::AlienBullet, origin, heading);
    }
    session.arm(TimerOwner::Entity(id), ALIEN_SHOT_MS, TimerPayload::AlienFire);
}

fn spawn_alien_due(session: &mut GameSession) {
    if session.phase == GamePhase::GameOver || session.alien.is_some() {
        // A live craft re-arms the spawn when it is destroyed
        return;
    }
    match AlienTier::for_level(session.level) {
        Some(tier) => {
            session.spawn_alien(tier);
        }
        None => session.arm_alien_spawn(),
    }
}

fn spawn_pickup_due(session: &mut GameSession) {
    if session.phase == GamePhase::GameOver {
        return;
    }
    if session.phase == GamePhase::Playing {
        session.spawn_pickup();
    }
    let delay = session.random_delay(PICKUP_SPAWN_MIN_MS, PICKUP_SPAWN_MAX_MS);
    session.arm(TimerOwner::Session, delay, TimerPayload::SpawnPickup);
}

fn modifier_over(session: &mut GameSession, kind: PickupKind) {
    let now = session.now_ms;
    let slot = session.modifiers.slot(kind);
    // A later pickup of the same kind extends the end time
    if !slot.is_some_and(|until| until <= now) {
        return;
    }
    *slot = None;
    if kind == PickupKind::ForceField {
        if let Some(shield) = session.shield {
            session.expire(shield);
        }
    }
    log::debug!("{kind:?} over");
}

fn beat(session: &mut GameSession) {
    if session.phase == GamePhase::GameOver {
        return;
    }
    let cue = if session.beat_high {
        SoundEffect::Beat2
    } else {
        SoundEffect::Beat1
    };
    session.beat_high = !session.beat_high;
    session.play(cue);
    session.arm(TimerOwner::Session, session.beat_interval_ms, TimerPayload::Beat);
}

// ============================================================================
// Input and motion
// ============================================================================

/// The ship answers the controls whenever it is present, including while
/// the level-clear deadline runs
fn apply_input(session: &mut GameSession, input: &TickInput) {
    if session.phase == GamePhase::GameOver {
        return;
    }
    let Some(ship) = session.ship.and_then(|id| session.registry.get_mut(id)) else {
        return;
    };

    if input.turn_left {
        ship.motion.rotate(-SHIP_TURN);
    }
    if input.turn_right {
        ship.motion.rotate(SHIP_TURN);
    }
    if input.thrust {
        ship.motion.accelerate(SHIP_ACCELERATION, SHIP_SPEED_LIMIT);
    }
    let nose = ship.nose();
    let rotation = ship.motion.rotation;

    if input.thrust {
        session.play(SoundEffect::Thrust);
    }
    if input.fire {
        fire(session, nose, rotation);
    }
}

/// Fire from the ship's nose. Standard projectiles are capped by the
/// in-flight limit; bullet time fires uncounted boost projectiles.
fn fire(session: &mut GameSession, nose: Vec2, rotation: f32) -> bool {
    let kind = if session.modifiers.bullet_time() {
        EntityKind::BoostBullet
    } else if session.bullets_in_flight < session.settings.bullet_limit {
        EntityKind::Bullet
    } else {
        log::trace!("Fire rejected: {} in flight", session.bullets_in_flight);
        return false;
    };
    session.spawn_projectile(kind, nose, rotation);
    session.play(SoundEffect::Fire);
    true
}

fn move_entities(session: &mut GameSession) {
    let world = session.world();
    let ship_position = session
        .ship
        .and_then(|id| session.registry.get(id))
        .map(|e| e.position());

    for e in session.registry.iter_mut() {
        if let (EntityKind::Alien(craft), Some(target)) = (e.kind, ship_position) {
            if craft.pursuing {
                let to_ship = target - e.position();
                let speed = e.motion.speed;
                e.motion.set_velocity(speed, to_ship.y.atan2(to_ship.x));
            }
        }
        e.motion.step(world);
    }

    // The force field rides on the ship
    let ship_position = session
        .ship
        .and_then(|id| session.registry.get(id))
        .map(|e| e.position());
    if let (Some(shield), Some(position)) = (session.shield, ship_position) {
        if let Some(e) = session.registry.get_mut(shield) {
            e.motion.position = position;
        }
    }
}

// ============================================================================
// Collisions and reactions
// ============================================================================

fn resolve_collisions(session: &mut GameSession) {
    let profile = session.profile();
    let bodies: Vec<Body> = session
        .registry
        .iter()
        .filter_map(|e| {
            let (capabilities, vulnerable_to) = e.kind.capabilities();
            if capabilities.is_empty() && vulnerable_to.is_empty() {
                return None;
            }
            Some(Body::new(e.id, capabilities, vulnerable_to, e.world_outline(profile)))
        })
        .collect();

    collision::resolve(&bodies, session);
}

impl ContactHandler for GameSession {
    fn is_live(&self, id: EntityId) -> bool {
        self.registry.is_live(id)
    }

    fn react(&mut self, victim: EntityId, _destroyer: EntityId) {
        let Some((kind, position)) = self.registry.get(victim).map(|e| (e.kind, e.position()))
        else {
            return;
        };
        match kind {
            EntityKind::Ship => ship_destroyed(self, victim, position),
            EntityKind::Asteroid { tier, .. } => asteroid_destroyed(self, victim, tier, position),
            EntityKind::Alien(craft) => alien_destroyed(self, victim, craft.tier, position),
            EntityKind::Pickup(kind) => pickup_collected(self, victim, kind),
            EntityKind::Bullet
            | EntityKind::BoostBullet
            | EntityKind::AlienBullet
            | EntityKind::Debris
            | EntityKind::Shield => {
                self.expire(victim);
            }
        }
    }
}

/// Break an asteroid into two of the next size down (none for the
/// smallest) and clear the level when it was the last one
fn asteroid_destroyed(session: &mut GameSession, id: EntityId, tier: u8, position: Vec2) {
    if session.expire(id).is_none() {
        return;
    }
    let tier_index = usize::from(tier).min(ASTEROID_TIERS - 1);
    session.add_score(ASTEROID_SCORE[tier_index]);

    let children = if tier > 0 { 2 } else { 0 };
    for _ in 0..children {
        let variety = session.rng.random_range(0..ASTEROID_OUTLINES.len()) as u8;
        session.spawn_asteroid(tier - 1, variety, position);
    }
    session.play(SoundEffect::asteroid_explosion(tier));
    session.emit(GameEvent::AsteroidDestroyed { id, tier, children });

    if session.asteroid_count() == 0 {
        level_cleared(session);
    }
}

fn level_cleared(session: &mut GameSession) {
    if !matches!(session.phase, GamePhase::Playing | GamePhase::ShipLost) {
        return;
    }
    log::info!("Level {} cleared", session.level);
    session.set_phase(GamePhase::LevelClear);
    session.schedule_transition();
}

fn ship_destroyed(session: &mut GameSession, id: EntityId, position: Vec2) {
    if session.expire(id).is_none() {
        return;
    }
    if let Some(shield) = session.shield {
        session.expire(shield);
    }
    session.modifiers.force_field_until = None;

    session.spawn_debris(position, &SHIP_DEBRIS);
    session.play(SoundEffect::ShipExplosion);
    session.emit(GameEvent::ShipDestroyed { id });

    session.lives = session.lives.saturating_sub(1);
    session.emit(GameEvent::Lives(session.lives));
    session.set_legend(LEGEND_SHIP_LOST);
    log::info!("Ship lost, {} lives left", session.lives);

    if session.phase == GamePhase::Playing {
        session.set_phase(GamePhase::ShipLost);
    }
    session.schedule_transition();
}

fn alien_destroyed(session: &mut GameSession, id: EntityId, tier: AlienTier, position: Vec2) {
    if session.expire(id).is_none() {
        return;
    }
    session.add_score(tier.score());
    session.spawn_debris(position, &ALIEN_DEBRIS);
    session.play(SoundEffect::SaucerLoopStop);
    session.play(SoundEffect::AlienExplosion);
    session.emit(GameEvent::AlienDestroyed { id, tier });
    session.arm_alien_spawn();
}

fn pickup_collected(session: &mut GameSession, id: EntityId, kind: PickupKind) {
    if session.expire(id).is_none() {
        return;
    }
    session.play(SoundEffect::PickupCollect);
    session.emit(GameEvent::PickupCollected { kind });

    let duration = match kind {
        PickupKind::BulletTime => BULLET_TIME_MS,
        PickupKind::ForceField => FORCE_FIELD_MS,
        PickupKind::DoubleScore => DOUBLE_SCORE_MS,
    };
    if kind == PickupKind::ForceField {
        let Some(position) = session
            .ship
            .and_then(|ship| session.registry.get(ship))
            .map(|e| e.position())
        else {
            return;
        };
        if session.shield.is_none() {
            let shield = session.registry.spawn(EntityKind::Shield, Motion::at(position));
            session.shield = Some(shield);
        }
    }
    *session.modifiers.slot(kind) = Some(session.now_ms.saturating_add(duration));
    session.arm(TimerOwner::Session, duration, TimerPayload::ModifierOver(kind));
    log::debug!("{kind:?} active for {duration} ms");
}

// ============================================================================
// Phase transitions
// ============================================================================

fn check_transition(session: &mut GameSession) {
    let Some(deadline) = session.transition_deadline else {
        return;
    };
    if session.now_ms < deadline {
        return;
    }
    session.transition_deadline = None;

    if session.lives == 0 {
        game_over(session);
        return;
    }
    match session.phase {
        GamePhase::LevelClear => next_level(session),
        GamePhase::ShipLost => {
            session.place_ship();
            session.set_phase(GamePhase::Playing);
        }
        _ => {}
    }
}

fn next_level(session: &mut GameSession) {
    session.clear_entities();
    session.level += 1;
    session.emit(GameEvent::Level(session.level));
    session.place_asteroids(session.level + 3);
    session.place_ship();
    session.set_phase(GamePhase::Playing);

    session.beat_interval_ms = beat_interval_for_level(session.level);
    session.arm_alien_spawn();
    log::info!(
        "Level {} with {} asteroids",
        session.level,
        session.asteroid_count()
    );
}

fn game_over(session: &mut GameSession) {
    session.set_phase(GamePhase::GameOver);
    session.set_legend(LEGEND_GAME_OVER);
    if session.profile().tracks_high_score && session.score > session.high_score {
        session.high_score = session.score;
        session.emit(GameEvent::HighScore(session.high_score));
    }
    log::info!(
        "Game over at level {} with {} points",
        session.level,
        session.score
    );
}

/// Ambient beat interval after advancing to `level`
pub fn beat_interval_for_level(level: u32) -> u64 {
    1050_u64
        .saturating_sub(50 * u64::from(level))
        .max(BEAT_MIN_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hud::HudState;
    use crate::settings::{GameVariant, Settings};
    use crate::sim::entity::{AlienCraft, Entity};
    use glam::vec2;

    /// A started session with every entity removed
    fn empty_session(settings: Settings) -> GameSession {
        let mut session = GameSession::new(settings);
        session.start();
        session.clear_entities();
        session.drain_events();
        session
    }

    /// Add a motionless entity, visible immediately
    fn place(session: &mut GameSession, kind: EntityKind, position: Vec2) -> EntityId {
        let id = session.registry.next_id();
        session
            .registry
            .add(Entity::new(id, kind, Motion::at(position)));
        session.registry.flush();
        id
    }

    /// Add an entity already travelling, visible immediately
    fn place_moving(
        session: &mut GameSession,
        kind: EntityKind,
        position: Vec2,
        speed: f32,
        heading: f32,
    ) -> EntityId {
        let id = session.registry.next_id();
        let motion = Motion::at(position).with_velocity(speed, heading);
        session.registry.add(Entity::new(id, kind, motion));
        session.registry.flush();
        id
    }

    fn place_alien(session: &mut GameSession, position: Vec2, heading: f32) -> EntityId {
        let craft = AlienCraft {
            tier: AlienTier::Strong,
            pursuing: false,
        };
        let id = place_moving(session, EntityKind::Alien(craft), position, ALIEN_SPEED, heading);
        session.alien = Some(id);
        id
    }

    fn place_ship_at(session: &mut GameSession, position: Vec2) -> EntityId {
        let id = place(session, EntityKind::Ship, position);
        session.ship = Some(id);
        id
    }

    fn count(session: &GameSession, pred: impl Fn(&EntityKind) -> bool) -> usize {
        session.entities().filter(|e| pred(&e.kind)).count()
    }

    fn ticks(session: &mut GameSession, n: usize, input: TickInput) {
        for _ in 0..n {
            tick(session, &input);
        }
    }

    fn idle(session: &mut GameSession, n: usize) {
        ticks(session, n, TickInput::default());
    }

    fn rock(tier: u8) -> EntityKind {
        EntityKind::Asteroid { tier, variety: 0 }
    }

    #[test]
    fn test_tick_intro_to_playing() {
        let mut session = GameSession::new(Settings::default());
        idle(&mut session, 3);
        assert_eq!(session.phase, GamePhase::Intro);
        assert!(session.ship.is_none());

        tick(
            &mut session,
            &TickInput {
                start: true,
                ..Default::default()
            },
        );
        assert_eq!(session.phase, GamePhase::Playing);
        assert!(session.ship.is_some());
    }

    #[test]
    fn test_large_asteroid_splits_in_place() {
        let mut session = empty_session(Settings::default());
        let big = place(&mut session, rock(2), vec2(400.0, 300.0));
        place(&mut session, EntityKind::Bullet, vec2(400.0, 300.0));
        // Keep the level alive
        place(&mut session, rock(0), vec2(100.0, 650.0));

        tick(&mut session, &TickInput::default());

        assert!(!session.registry.is_live(big));
        let children: Vec<_> = session
            .entities()
            .filter(|e| matches!(e.kind, EntityKind::Asteroid { tier: 1, .. }))
            .collect();
        assert_eq!(children.len(), 2);
        for child in children {
            assert_eq!(child.position(), vec2(400.0, 300.0));
        }
        assert_eq!(count(&session, |k| matches!(k, EntityKind::Asteroid { tier: 2, .. })), 0);
        assert_eq!(count(&session, |k| matches!(k, EntityKind::Bullet)), 0);
        assert_eq!(session.score, ASTEROID_SCORE[2]);
    }

    #[test]
    fn test_split_counts_per_tier() {
        let site = vec2(400.0, 300.0);
        for (tier, expected) in [(2u8, 2usize), (1, 2), (0, 0)] {
            let mut session = empty_session(Settings::default());
            place(&mut session, rock(tier), site);
            place(&mut session, EntityKind::Bullet, site);
            place(&mut session, rock(2), vec2(100.0, 650.0));

            tick(&mut session, &TickInput::default());

            let fragments: Vec<_> = session
                .entities()
                .filter(|e| e.position() == site)
                .map(|e| e.kind)
                .collect();
            assert_eq!(fragments.len(), expected, "tier {tier}");
            for kind in fragments {
                assert!(matches!(kind, EntityKind::Asteroid { tier: t, .. } if t + 1 == tier));
            }
        }
    }

    #[test]
    fn test_last_two_asteroids_one_transition() {
        let mut session = empty_session(Settings::default());
        place(&mut session, rock(0), vec2(200.0, 200.0));
        place(&mut session, EntityKind::Bullet, vec2(200.0, 200.0));
        place(&mut session, rock(0), vec2(500.0, 500.0));
        place(&mut session, EntityKind::Bullet, vec2(500.0, 500.0));

        tick(&mut session, &TickInput::default());
        assert_eq!(session.phase, GamePhase::LevelClear);
        let deadline = session.transition_deadline.expect("transition scheduled");
        assert_eq!(deadline, session.now_ms + session.settings.transition_delay_ms);

        let mut events = session.drain_events();
        while session.now_ms < deadline {
            tick(&mut session, &TickInput::default());
            events.extend(session.drain_events());
        }

        let cleared = events
            .iter()
            .filter(|e| matches!(e, GameEvent::PhaseChanged { to: GamePhase::LevelClear, .. }))
            .count();
        let levels = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Level(_)))
            .count();
        assert_eq!(cleared, 1);
        assert_eq!(levels, 1);
        assert_eq!(session.level, 2);
        assert_eq!(session.phase, GamePhase::Playing);
        assert_eq!(session.asteroid_count(), 5);
        assert!(session.ship.is_some());
        assert!(session.transition_deadline.is_none());
    }

    #[test]
    fn test_bullet_limit() {
        let mut session = empty_session(Settings::default());
        place_ship_at(&mut session, vec2(375.0, 375.0));

        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        ticks(&mut session, 9, fire);

        assert_eq!(count(&session, |k| matches!(k, EntityKind::Bullet)), 8);
        assert_eq!(session.bullets_in_flight, 8);

        // Once they expire the counter drains
        idle(&mut session, 40);
        assert_eq!(session.bullets_in_flight, 0);
        assert_eq!(count(&session, |k| matches!(k, EntityKind::Bullet)), 0);
    }

    #[test]
    fn test_bullet_time_ignores_limit() {
        let mut session = empty_session(Settings::default());
        place_ship_at(&mut session, vec2(375.0, 375.0));
        session.modifiers.bullet_time_until = Some(u64::MAX);

        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        ticks(&mut session, 12, fire);
        assert_eq!(count(&session, |k| matches!(k, EntityKind::BoostBullet)), 12);
        assert_eq!(session.bullets_in_flight, 0);
    }

    #[test]
    fn test_game_over_is_one_way() {
        let mut session = empty_session(Settings {
            starting_lives: 1,
            ..Settings::default()
        });
        session.lives = 1;
        place(&mut session, rock(0), vec2(100.0, 650.0));
        let ship = place_ship_at(&mut session, vec2(375.0, 375.0));
        place(&mut session, EntityKind::AlienBullet, vec2(375.0, 375.0));

        tick(&mut session, &TickInput::default());
        assert!(!session.registry.is_live(ship));
        assert_eq!(session.lives, 0);
        assert_eq!(session.phase, GamePhase::ShipLost);

        idle(&mut session, 100);
        assert_eq!(session.phase, GamePhase::GameOver);

        assert!(!session.start());
        ticks(
            &mut session,
            200,
            TickInput {
                start: true,
                fire: true,
                ..Default::default()
            },
        );
        assert_eq!(session.phase, GamePhase::GameOver);
        assert!(session.ship.is_none());
        assert_eq!(count(&session, |k| matches!(k, EntityKind::Ship)), 0);
    }

    #[test]
    fn test_ship_respawns_after_delay() {
        let mut session = empty_session(Settings::default());
        let lives = session.lives;
        place(&mut session, rock(0), vec2(100.0, 650.0));
        place_ship_at(&mut session, vec2(375.0, 375.0));
        place(&mut session, EntityKind::AlienBullet, vec2(375.0, 375.0));

        tick(&mut session, &TickInput::default());
        assert_eq!(session.phase, GamePhase::ShipLost);
        assert_eq!(session.lives, lives - 1);
        assert!(session.events().contains(&GameEvent::Legend(LEGEND_SHIP_LOST)));
        assert_eq!(count(&session, |k| matches!(k, EntityKind::Debris)), SHIP_DEBRIS.len());

        idle(&mut session, 100);
        assert_eq!(session.phase, GamePhase::Playing);
        assert!(session.ship.is_some());
        assert_eq!(session.lives, lives - 1);
    }

    #[test]
    fn test_timer_on_expired_owner_dropped() {
        let mut session = empty_session(Settings::default());
        let debris = place(&mut session, EntityKind::Debris, vec2(10.0, 10.0));
        // The first delivery expires the owner; the second must not run
        session.arm(TimerOwner::Entity(debris), 5, TimerPayload::Expire);
        session.arm(TimerOwner::Entity(debris), 5, TimerPayload::Expire);

        let before = session.stats;
        tick(&mut session, &TickInput::default());
        assert_eq!(session.stats.fired - before.fired, 1);
        assert_eq!(session.stats.dropped - before.dropped, 1);
        assert!(!session.registry.is_live(debris));
    }

    #[test]
    fn test_destroyed_alien_never_fires() {
        let mut session = empty_session(Settings::default());
        place(&mut session, rock(0), vec2(100.0, 650.0));
        place_ship_at(&mut session, vec2(700.0, 50.0));
        let craft = AlienCraft {
            tier: AlienTier::Strong,
            pursuing: false,
        };
        let alien = place(&mut session, EntityKind::Alien(craft), vec2(375.0, 375.0));
        session.alien = Some(alien);
        session.arm(TimerOwner::Entity(alien), 100, TimerPayload::AlienFire);
        place(&mut session, EntityKind::Bullet, vec2(375.0, 375.0));

        tick(&mut session, &TickInput::default());
        assert!(session.alien.is_none());
        assert_eq!(session.score, AlienTier::Strong.score());

        let before = session.stats.dropped;
        idle(&mut session, 10);
        assert!(session.stats.dropped > before);
        assert_eq!(count(&session, |k| matches!(k, EntityKind::AlienBullet)), 0);
    }

    #[test]
    fn test_strong_alien_aims_at_ship() {
        let mut session = empty_session(Settings::for_variant(GameVariant::Enhanced));
        place(&mut session, rock(0), vec2(100.0, 650.0));
        place_ship_at(&mut session, vec2(375.0, 200.0));
        let craft = AlienCraft {
            tier: AlienTier::Strong,
            pursuing: false,
        };
        let alien = place(&mut session, EntityKind::Alien(craft), vec2(375.0, 500.0));
        session.alien = Some(alien);
        session.arm(TimerOwner::Entity(alien), 1, TimerPayload::AlienFire);

        tick(&mut session, &TickInput::default());
        let shot = session
            .entities()
            .find(|e| matches!(e.kind, EntityKind::AlienBullet))
            .expect("craft fired");
        assert!((shot.motion.heading + PI / 2.0).abs() < 1e-4);
        assert!(
            session
                .scheduler
                .is_armed(TimerOwner::Entity(alien), TimerPayload::AlienFire)
        );
    }

    #[test]
    fn test_alien_spawn_follows_level() {
        let mut session = empty_session(Settings::default());
        place(&mut session, rock(0), vec2(100.0, 650.0));
        session.arm(TimerOwner::Session, 1, TimerPayload::SpawnAlien);
        tick(&mut session, &TickInput::default());
        assert!(session.alien.is_none());
        assert!(
            session
                .scheduler
                .is_armed(TimerOwner::Session, TimerPayload::SpawnAlien)
        );

        session.scheduler.clear();
        session.level = 2;
        session.arm(TimerOwner::Session, 1, TimerPayload::SpawnAlien);
        tick(&mut session, &TickInput::default());
        let alien = session.alien.expect("weak craft at level 2");
        let kind = session.registry.get(alien).map(|e| e.kind);
        assert!(matches!(
            kind,
            Some(EntityKind::Alien(AlienCraft {
                tier: AlienTier::Weak,
                ..
            }))
        ));
        assert!(session.events().contains(&GameEvent::Sound(SoundEffect::SaucerLoopWeak)));
    }

    #[test]
    fn test_pickups_grant_modifiers() {
        let mut session = empty_session(Settings::default());
        place(&mut session, rock(0), vec2(100.0, 650.0));
        place_ship_at(&mut session, vec2(375.0, 375.0));
        place(
            &mut session,
            EntityKind::Pickup(PickupKind::DoubleScore),
            vec2(375.0, 375.0),
        );

        tick(&mut session, &TickInput::default());
        assert!(session.modifiers.double_score());
        assert!(
            session
                .events()
                .contains(&GameEvent::PickupCollected {
                    kind: PickupKind::DoubleScore
                })
        );
        session.add_score(50);
        assert_eq!(session.score, 100);

        // Runs out after its duration
        let ticks_needed = (DOUBLE_SCORE_MS / session.settings.frame_interval_ms + 2) as usize;
        idle(&mut session, ticks_needed);
        assert!(!session.modifiers.double_score());
    }

    #[test]
    fn test_force_field_destroys_but_survives() {
        let mut session = empty_session(Settings::default());
        place(&mut session, rock(0), vec2(100.0, 650.0));
        place_ship_at(&mut session, vec2(375.0, 375.0));
        place(
            &mut session,
            EntityKind::Pickup(PickupKind::ForceField),
            vec2(375.0, 375.0),
        );
        tick(&mut session, &TickInput::default());
        let shield = session.shield.expect("shield up");

        // A rock touching the field but clear of the hull
        place(&mut session, rock(0), vec2(420.0, 375.0));
        tick(&mut session, &TickInput::default());
        assert!(session.registry.is_live(shield));
        assert!(session.ship.is_some());
        assert_eq!(session.score, ASTEROID_SCORE[0]);

        let ticks_needed = (FORCE_FIELD_MS / session.settings.frame_interval_ms + 2) as usize;
        idle(&mut session, ticks_needed);
        assert!(session.shield.is_none());
        assert!(!session.registry.is_live(shield));
    }

    #[test]
    fn test_beat_alternates_and_speeds_up() {
        let mut session = GameSession::new(Settings::default());
        session.start();
        session.drain_events();

        let mut beats = Vec::new();
        for _ in 0..70 {
            tick(&mut session, &TickInput::default());
            beats.extend(session.drain_events().into_iter().filter_map(|e| match e {
                GameEvent::Sound(cue @ (SoundEffect::Beat1 | SoundEffect::Beat2)) => Some(cue),
                _ => None,
            }));
        }
        assert!(beats.len() >= 2);
        assert_eq!(beats[0], SoundEffect::Beat1);
        assert_eq!(beats[1], SoundEffect::Beat2);

        assert_eq!(beat_interval_for_level(2), 950);
        assert_eq!(beat_interval_for_level(30), BEAT_MIN_MS);
    }

    #[test]
    fn test_ship_controls() {
        let mut session = empty_session(Settings::default());
        let ship = place_ship_at(&mut session, vec2(375.0, 375.0));
        tick(
            &mut session,
            &TickInput {
                turn_right: true,
                thrust: true,
                ..Default::default()
            },
        );
        let e = session.registry.get(ship).expect("ship alive");
        assert!((e.motion.rotation - SHIP_TURN).abs() < 1e-5);
        assert!(e.motion.speed > 0.0);
        assert!(session.events().contains(&GameEvent::Sound(SoundEffect::Thrust)));
    }

    #[test]
    fn test_run_frame_dispatches() {
        let mut session = GameSession::new(Settings::default());
        let mut hud = HudState::default();
        let mut cues = Vec::new();
        let mut audio = |e: SoundEffect| cues.push(e);

        run_frame(
            &mut session,
            &TickInput {
                start: true,
                fire: true,
                ..Default::default()
            },
            &mut audio,
            &mut hud,
        );
        assert_eq!(hud.lives, STARTING_LIVES);
        assert_eq!(hud.level, 1);
        assert_eq!(hud.legend, "");
        assert!(cues.contains(&SoundEffect::Fire));
        assert!(session.events().is_empty());
    }

    #[test]
    fn test_high_score_enhanced_only() {
        for (variant, expected) in [(GameVariant::Enhanced, 1234), (GameVariant::Classic, 0)] {
            let mut session = empty_session(Settings::for_variant(variant));
            session.score = 1234;
            session.lives = 0;
            session.phase = GamePhase::ShipLost;
            session.schedule_transition();
            idle(&mut session, 100);
            assert_eq!(session.phase, GamePhase::GameOver);
            assert_eq!(session.high_score, expected);
        }
    }

    #[test]
    fn test_ship_answers_controls_during_level_clear() {
        let mut session = empty_session(Settings::default());
        let ship = place_ship_at(&mut session, vec2(375.0, 375.0));
        session.phase = GamePhase::LevelClear;

        tick(
            &mut session,
            &TickInput {
                turn_right: true,
                fire: true,
                ..Default::default()
            },
        );
        let e = session.registry.get(ship).expect("ship alive");
        assert!((e.motion.rotation - SHIP_TURN).abs() < 1e-5);
        assert_eq!(session.bullets_in_flight, 1);
        assert_eq!(count(&session, |k| matches!(k, EntityKind::Bullet)), 1);
    }

    #[test]
    fn test_game_over_freezes_score() {
        let mut session = empty_session(Settings::default());
        session.phase = GamePhase::GameOver;
        let rock_id = place(&mut session, rock(0), vec2(200.0, 200.0));
        place(&mut session, EntityKind::AlienBullet, vec2(200.0, 200.0));

        tick(&mut session, &TickInput::default());
        assert!(!session.registry.is_live(rock_id));
        assert_eq!(session.score, 0);
        assert!(
            !session
                .events()
                .iter()
                .any(|e| matches!(e, GameEvent::Score(_) | GameEvent::Lives(_)))
        );
        assert_eq!(session.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_alien_turn_zig_zags_and_rearms() {
        for (start, center) in [(0.0, 0.0), (PI, PI)] {
            let mut session = empty_session(Settings::default());
            let alien = place_alien(&mut session, vec2(375.0, 375.0), start);
            session.arm(TimerOwner::Entity(alien), 1, TimerPayload::AlienTurn);

            tick(&mut session, &TickInput::default());
            let heading = session.registry.get(alien).expect("craft alive").motion.heading;
            let offset = crate::normalize_angle(heading - center);
            assert!(
                [-1.0, 0.0, 1.0].iter().any(|o| (offset - o).abs() < 1e-4),
                "heading {heading} from {start}"
            );
            assert!(
                session
                    .scheduler
                    .is_armed(TimerOwner::Entity(alien), TimerPayload::AlienTurn)
            );
        }
    }

    #[test]
    fn test_pursuing_alien_homes_on_ship() {
        let mut session = empty_session(Settings::for_variant(GameVariant::Enhanced));
        place_ship_at(&mut session, vec2(375.0, 200.0));
        let alien = place_alien(&mut session, vec2(375.0, 500.0), 0.0);
        session.arm(TimerOwner::Entity(alien), 1, TimerPayload::AlienPursue);

        tick(&mut session, &TickInput::default());
        let e = session.registry.get(alien).expect("craft alive");
        assert!(matches!(e.kind, EntityKind::Alien(AlienCraft { pursuing: true, .. })));
        assert!((e.motion.heading + PI / 2.0).abs() < 1e-4);
        assert!(e.position().y < 500.0);

        // Turning no longer changes course
        session.arm(TimerOwner::Entity(alien), 1, TimerPayload::AlienTurn);
        idle(&mut session, 3);
        let e = session.registry.get(alien).expect("craft alive");
        assert!((e.motion.heading + PI / 2.0).abs() < 1e-4);
        assert!((e.position().x - 375.0).abs() < 1e-3);
    }

    #[test]
    fn test_alien_speed_up_doubles_once() {
        let mut session = empty_session(Settings::for_variant(GameVariant::Enhanced));
        let alien = place_alien(&mut session, vec2(375.0, 375.0), 0.0);
        session.arm(TimerOwner::Entity(alien), 1, TimerPayload::AlienSpeedUp);

        tick(&mut session, &TickInput::default());
        let speed = |s: &GameSession| s.registry.get(alien).map(|e| e.motion.speed);
        assert_eq!(speed(&session), Some(ALIEN_SPEED * 2.0));
        assert!(
            !session
                .scheduler
                .is_armed(TimerOwner::Entity(alien), TimerPayload::AlienSpeedUp)
        );

        idle(&mut session, 30);
        assert_eq!(speed(&session), Some(ALIEN_SPEED * 2.0));
    }

    #[test]
    fn test_alien_behaviour_timers_per_variant() {
        for (variant, pursues) in [(GameVariant::Enhanced, true), (GameVariant::Classic, false)] {
            let mut session = empty_session(Settings::for_variant(variant));
            let alien = session.spawn_alien(AlienTier::Strong);
            let owner = TimerOwner::Entity(alien);
            let s = &session.scheduler;
            assert!(s.is_armed(owner, TimerPayload::AlienTurn));
            assert!(s.is_armed(owner, TimerPayload::AlienFire));
            assert_eq!(s.is_armed(owner, TimerPayload::AlienPursue), pursues);
            assert_eq!(s.is_armed(owner, TimerPayload::AlienSpeedUp), pursues);
        }
    }

    #[test]
    fn test_bullet_time_runs_out() {
        let mut session = empty_session(Settings::default());
        place_ship_at(&mut session, vec2(375.0, 375.0));
        place(
            &mut session,
            EntityKind::Pickup(PickupKind::BulletTime),
            vec2(375.0, 375.0),
        );
        tick(&mut session, &TickInput::default());
        assert!(session.modifiers.bullet_time());

        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut session, &fire);
        assert_eq!(count(&session, |k| matches!(k, EntityKind::BoostBullet)), 1);
        assert_eq!(session.bullets_in_flight, 0);

        let ticks_needed = (BULLET_TIME_MS / session.settings.frame_interval_ms + 2) as usize;
        idle(&mut session, ticks_needed);
        assert!(!session.modifiers.bullet_time());

        tick(&mut session, &fire);
        assert_eq!(count(&session, |k| matches!(k, EntityKind::Bullet)), 1);
        assert_eq!(session.bullets_in_flight, 1);
    }

    #[test]
    fn test_determinism() {
        let mut a = GameSession::new(Settings::default());
        let mut b = GameSession::new(Settings::default());
        let script = [
            TickInput {
                start: true,
                ..Default::default()
            },
            TickInput {
                thrust: true,
                fire: true,
                ..Default::default()
            },
            TickInput {
                turn_left: true,
                fire: true,
                ..Default::default()
            },
        ];
        for i in 0..600 {
            let input = if i == 0 { script[0] } else { script[1 + i % 2] };
            tick(&mut a, &input);
            tick(&mut b, &input);
        }
        assert_eq!(a.score, b.score);
        assert_eq!(a.phase, b.phase);
        let pa: Vec<_> = a.entities().map(|e| e.position()).collect();
        let pb: Vec<_> = b.entities().map(|e| e.position()).collect();
        assert_eq!(pa, pb);
    }
}
