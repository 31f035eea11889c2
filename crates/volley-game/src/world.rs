//! ECS bullet world: bevy_ecs World, bullet creation, tick systems, and event bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bevy_ecs::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;
use volley_proto::types::Vec2;

use crate::bullet_type::{BulletType, BulletTypeId};
use crate::components::*;
use crate::error::BulletError;
use crate::homing;
use crate::net::{ReplicationOutbox, Role};
use crate::registry::BulletRegistry;
use crate::spatial::{SpatialEntry, SpatialGrid};
use crate::tables::{EffectId, SoundId, StatusId};

/// Length of one simulation step, in ticks.
pub const TICK_DELTA: f32 = 1.0;

/// World units per tile edge.
pub const TILE_SIZE: f32 = 8.0;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Outgoing events queued by ECS operations for the host to consume.
#[derive(Resource, Default)]
pub struct OutgoingEvents {
    pub events: Vec<WorldEvent>,
}

/// Global tick counter.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

/// Runtime id allocator shared by bullets and units.
#[derive(Resource)]
pub struct EntityIdAllocator {
    next: AtomicU64,
}

impl EntityIdAllocator {
    pub fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    pub fn allocate(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Next id that will be allocated.
    pub fn current(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

/// A solid tile. Terrain walls have no team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub team: Option<Team>,
}

/// Solid tiles keyed by tile coordinate.
#[derive(Resource, Default)]
pub struct TileMap {
    tiles: HashMap<(i32, i32), Tile>,
}

impl TileMap {
    pub fn get(&self, tile: (i32, i32)) -> Option<&Tile> {
        self.tiles.get(&tile)
    }

    pub fn set(&mut self, tile: (i32, i32), value: Tile) {
        self.tiles.insert(tile, value);
    }

    pub fn clear(&mut self, tile: (i32, i32)) -> Option<Tile> {
        self.tiles.remove(&tile)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32), &Tile)> + '_ {
        self.tiles.iter().map(|(k, v)| (*k, v))
    }
}

/// Tile coordinate containing a world position.
pub fn tile_coord(position: Vec2) -> (i32, i32) {
    (
        (position.x / TILE_SIZE).floor() as i32,
        (position.y / TILE_SIZE).floor() as i32,
    )
}

// ---------------------------------------------------------------------------
// World events (ECS → host)
// ---------------------------------------------------------------------------

/// Why a bullet left the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Stopped by a unit or a tile.
    Collided,
    /// Ran out of lifetime.
    Expired,
}

/// Events produced by the bullet world. The host plays effects, applies area
/// damage and ignition, and spawns discharges from these.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    /// A bullet entered the world at its muzzle position.
    BulletCreated {
        runtime_id: u64,
        type_id: BulletTypeId,
        team: Team,
        x: f32,
        y: f32,
    },
    Effect {
        effect: EffectId,
        x: f32,
        y: f32,
        rotation: f32,
    },
    Sound {
        sound: SoundId,
        /// Runtime id of the emitting bullet.
        source: u64,
        x: f32,
        y: f32,
    },
    Shake {
        intensity: f32,
        x: f32,
        y: f32,
    },
    /// Damage every unit hostile to `team` within `radius`.
    AreaDamage {
        team: Team,
        x: f32,
        y: f32,
        radius: f32,
        amount: f32,
    },
    Ignite {
        x: f32,
        y: f32,
        radius: f32,
        amount: u32,
    },
    /// Chained energy discharge.
    Discharge {
        seed: i32,
        team: Team,
        color: u32,
        damage: f32,
        x: f32,
        y: f32,
        angle: f32,
        length: u32,
    },
    UnitDamaged {
        runtime_id: u64,
        amount: f32,
        /// Health after the hit, for damageable units.
        remaining: Option<f32>,
    },
    StatusApplied {
        runtime_id: u64,
        status: StatusId,
        duration: f32,
    },
    UnitKilled {
        runtime_id: u64,
    },
    TileDamaged {
        tile: (i32, i32),
        team: Option<Team>,
        amount: f32,
    },
    BulletRemoved {
        runtime_id: u64,
        reason: RemovalReason,
    },
}

// ---------------------------------------------------------------------------
// Creation parameters and snapshots
// ---------------------------------------------------------------------------

/// Arguments of a bullet creation. `BulletSpawn::new` fills the defaults.
#[derive(Debug, Clone, Copy)]
pub struct BulletSpawn {
    pub owner: Option<Entity>,
    pub team: Team,
    pub x: f32,
    pub y: f32,
    /// Heading in degrees; any value, wrapped.
    pub angle: f32,
    pub velocity_scale: f32,
    pub lifetime_scale: f32,
    pub data: Option<BulletData>,
}

impl BulletSpawn {
    pub fn new(team: Team, x: f32, y: f32, angle: f32) -> Self {
        Self {
            owner: None,
            team,
            x,
            y,
            angle,
            velocity_scale: 1.0,
            lifetime_scale: 1.0,
            data: None,
        }
    }

    pub fn owner(mut self, owner: Entity) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn velocity_scale(mut self, scale: f32) -> Self {
        self.velocity_scale = scale;
        self
    }

    pub fn lifetime_scale(mut self, scale: f32) -> Self {
        self.lifetime_scale = scale;
        self
    }

    pub fn data(mut self, data: BulletData) -> Self {
        self.data = Some(data);
        self
    }

    /// Non-finite inputs would leave a bullet that never moves sensibly or
    /// never reaches its lifetime.
    fn check(&self) -> Result<(), BulletError> {
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("angle", self.angle),
            ("velocity_scale", self.velocity_scale),
            ("lifetime_scale", self.lifetime_scale),
        ];
        match fields.into_iter().find(|(_, v)| !v.is_finite()) {
            Some((field, value)) => Err(BulletError::InvalidSpawn { field, value }),
            None => Ok(()),
        }
    }
}

/// A unit mirrored into the bullet world.
#[derive(Debug, Clone, Copy)]
pub struct UnitSpawn {
    pub team: Team,
    pub x: f32,
    pub y: f32,
    pub hit_size: f32,
    pub velocity: Option<Vec2>,
    pub health: Option<f32>,
    pub flying: bool,
    pub damage_multiplier: Option<f32>,
}

impl UnitSpawn {
    pub fn new(team: Team, x: f32, y: f32) -> Self {
        Self {
            team,
            x,
            y,
            hit_size: 8.0,
            velocity: None,
            health: None,
            flying: false,
            damage_multiplier: None,
        }
    }

    pub fn hit_size(mut self, size: f32) -> Self {
        self.hit_size = size;
        self
    }

    pub fn velocity(mut self, x: f32, y: f32) -> Self {
        self.velocity = Some(Vec2::new(x, y));
        self
    }

    pub fn health(mut self, health: f32) -> Self {
        self.health = Some(health);
        self
    }

    pub fn flying(mut self) -> Self {
        self.flying = true;
        self
    }

    pub fn damage_multiplier(mut self, multiplier: f32) -> Self {
        self.damage_multiplier = Some(multiplier);
        self
    }
}

/// Snapshot of a live bullet.
#[derive(Debug, Clone)]
pub struct BulletSnapshot {
    pub entity: Entity,
    pub runtime_id: u64,
    pub type_id: BulletTypeId,
    pub team: Team,
    pub owner: Option<Entity>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub rotation: f32,
    pub time: f32,
    pub velocity_scale: f32,
    pub lifetime_scale: f32,
    pub damage_multiplier: f32,
    pub data: Option<BulletData>,
}

// ---------------------------------------------------------------------------
// BulletWorld
// ---------------------------------------------------------------------------

/// The ECS bullet world.
pub struct BulletWorld {
    pub world: World,
    pub(crate) registry: Arc<BulletRegistry>,
    pub(crate) role: Role,
    pub(crate) rng: StdRng,
    /// Units as of the start of the current tick, minus those killed since.
    pub(crate) grid: SpatialGrid,
}

impl BulletWorld {
    /// Create a world sharing `registry`. `seed` drives every random roll.
    pub fn new(registry: Arc<BulletRegistry>, role: Role, seed: u64) -> Self {
        let mut world = World::new();
        world.insert_resource(OutgoingEvents::default());
        world.insert_resource(TickCounter::default());
        world.insert_resource(EntityIdAllocator::new(1));
        world.insert_resource(TileMap::default());
        world.insert_resource(ReplicationOutbox::default());

        Self {
            world,
            registry,
            role,
            rng: StdRng::seed_from_u64(seed),
            grid: SpatialGrid::new(),
        }
    }

    pub fn registry(&self) -> &Arc<BulletRegistry> {
        &self.registry
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Run one tick: rebuild the target grid, update every bullet that existed
    /// when the tick started, then clean up dead units.
    pub fn tick(&mut self) {
        self.world.resource_mut::<TickCounter>().0 += 1;
        self.grid = build_grid(&mut self.world);

        let mut bullets: Vec<(RuntimeId, Entity)> = self
            .world
            .query_filtered::<(&RuntimeId, Entity), With<Bullet>>()
            .iter(&self.world)
            .map(|(rid, entity)| (*rid, entity))
            .collect();
        bullets.sort_by_key(|(rid, _)| *rid);

        for (_, entity) in bullets {
            self.update_bullet(entity);
        }

        system_cleanup_dead(&mut self.world);
    }

    /// Drain all pending outgoing events.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.world.resource_mut::<OutgoingEvents>().events)
    }

    pub fn current_tick(&self) -> u64 {
        self.world.resource::<TickCounter>().0
    }

    /// Mirror a unit into the world. Returns the entity and its runtime id.
    pub fn spawn_unit(&mut self, spawn: UnitSpawn) -> (Entity, u64) {
        let runtime_id = self.world.resource::<EntityIdAllocator>().allocate();
        let mut entity = self.world.spawn((
            Unit,
            RuntimeId(runtime_id),
            spawn.team,
            Position {
                x: spawn.x,
                y: spawn.y,
            },
            HitSize(spawn.hit_size),
        ));
        if let Some(v) = spawn.velocity {
            entity.insert(Velocity::from(v));
        }
        if let Some(health) = spawn.health {
            entity.insert(Health {
                current: health,
                max: health,
            });
        }
        if let Some(multiplier) = spawn.damage_multiplier {
            entity.insert(DamageMultiplier(multiplier));
        }
        if spawn.flying {
            entity.insert(Flying);
        }
        (entity.id(), runtime_id)
    }

    /// Update a unit's mirrored position.
    pub fn set_unit_position(&mut self, unit: Entity, x: f32, y: f32) {
        if let Some(mut pos) = self.world.get_mut::<Position>(unit) {
            pos.x = x;
            pos.y = y;
        }
    }

    pub fn unit_health(&self, unit: Entity) -> Option<f32> {
        self.world.get::<Health>(unit).map(|h| h.current)
    }

    pub fn unit_velocity(&self, unit: Entity) -> Option<Vec2> {
        self.world.get::<Velocity>(unit).map(|v| v.vec())
    }

    pub fn is_dead(&self, unit: Entity) -> bool {
        self.world.get::<Dead>(unit).is_some()
    }

    /// Place a solid tile.
    pub fn set_tile(&mut self, tile: (i32, i32), team: Option<Team>) {
        self.world.resource_mut::<TileMap>().set(tile, Tile { team });
    }

    pub fn clear_tile(&mut self, tile: (i32, i32)) {
        self.world.resource_mut::<TileMap>().clear(tile);
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create a bullet of `type_id`. Velocity points along `spawn.angle`, and
    /// the bullet starts one tick behind the muzzle so its first move lands on it.
    pub fn create(&mut self, type_id: BulletTypeId, spawn: BulletSpawn) -> Result<Entity, BulletError> {
        let registry = Arc::clone(&self.registry);
        let ty = registry
            .get(type_id)
            .ok_or(BulletError::UnknownType(type_id))?;
        spawn.check()?;

        let mut velocity = Vec2::from_angle(spawn.angle, ty.speed) * spawn.velocity_scale;
        if ty.keep_velocity {
            if let Some(owner_vel) = spawn.owner.and_then(|o| self.world.get::<Velocity>(o)) {
                velocity = velocity + owner_vel.vec();
            }
        }
        for (field, value) in [("velocity.x", velocity.x), ("velocity.y", velocity.y)] {
            if !value.is_finite() {
                return Err(BulletError::InvalidSpawn { field, value });
            }
        }
        let rotation = if velocity.length() > f32::EPSILON {
            velocity.angle()
        } else {
            homing::wrap_angle(spawn.angle)
        };
        let muzzle = Vec2::new(spawn.x, spawn.y);
        let damage_multiplier = spawn
            .owner
            .and_then(|o| self.world.get::<DamageMultiplier>(o))
            .map(|m| m.0)
            .unwrap_or(1.0);

        let runtime_id = self.world.resource::<EntityIdAllocator>().allocate();
        let entity = self
            .world
            .spawn((
                RuntimeId(runtime_id),
                spawn.team,
                Position::from(muzzle - velocity * TICK_DELTA),
                Velocity::from(velocity),
                Rotation(rotation),
                Bullet {
                    type_id,
                    owner: spawn.owner,
                    time: 0.0,
                    lifetime_scale: spawn.lifetime_scale,
                    velocity_scale: spawn.velocity_scale,
                    damage_multiplier,
                    data: spawn.data,
                    collided: Vec::new(),
                },
            ))
            .id();

        debug!(bullet = %ty.name, runtime_id, team = spawn.team.0, "bullet created");
        self.push_event(WorldEvent::BulletCreated {
            runtime_id,
            type_id,
            team: spawn.team,
            x: spawn.x,
            y: spawn.y,
        });

        self.init(entity, ty);
        Ok(entity)
    }

    /// Create a bullet fired by `owner`, on the owner's team.
    pub fn create_for_owner(
        &mut self,
        type_id: BulletTypeId,
        owner: Entity,
        x: f32,
        y: f32,
        angle: f32,
    ) -> Result<Entity, BulletError> {
        let team = *self
            .world
            .get::<Team>(owner)
            .ok_or(BulletError::InvalidOwner(owner))?;
        self.create(type_id, BulletSpawn::new(team, x, y, angle).owner(owner))
    }

    /// Create a bullet inheriting owner and team from `parent` (fragmentation).
    pub fn create_from_parent(
        &mut self,
        type_id: BulletTypeId,
        parent: Entity,
        x: f32,
        y: f32,
        angle: f32,
        velocity_scale: f32,
    ) -> Result<Entity, BulletError> {
        let team = *self
            .world
            .get::<Team>(parent)
            .ok_or(BulletError::InvalidOwner(parent))?;
        let owner = self
            .world
            .get::<Bullet>(parent)
            .ok_or(BulletError::InvalidOwner(parent))?
            .owner;

        let mut spawn = BulletSpawn::new(team, x, y, angle).velocity_scale(velocity_scale);
        spawn.owner = owner;
        self.create(type_id, spawn)
    }

    /// Creation side effects: suicide shots kill their owner, instant bullets
    /// are aged to their lifetime and placed at the muzzle so the next tick
    /// expires them there.
    fn init(&mut self, entity: Entity, ty: &BulletType) {
        if ty.kill_shooter {
            let owner = self.world.get::<Bullet>(entity).and_then(|b| b.owner);
            if let Some(owner) = owner {
                if self.world.get::<Health>(owner).is_some() && !self.is_dead(owner) {
                    self.kill_unit(owner);
                }
            }
        }
        if ty.instant_disappear {
            if let Some(mut bullet) = self.world.get_mut::<Bullet>(entity) {
                bullet.time = ty.lifetime * bullet.lifetime_scale;
            }
            let vel = self.world.get::<Velocity>(entity).map(|v| v.vec());
            if let (Some(vel), Some(mut pos)) = (vel, self.world.get_mut::<Position>(entity)) {
                *pos = Position::from(pos.vec() + vel * TICK_DELTA);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    pub fn bullet_snapshot(&self, entity: Entity) -> Option<BulletSnapshot> {
        let bullet = self.world.get::<Bullet>(entity)?;
        let pos = self.world.get::<Position>(entity)?;
        let vel = self.world.get::<Velocity>(entity)?;
        Some(BulletSnapshot {
            entity,
            runtime_id: self.world.get::<RuntimeId>(entity)?.0,
            type_id: bullet.type_id,
            team: *self.world.get::<Team>(entity)?,
            owner: bullet.owner,
            position: pos.vec(),
            velocity: vel.vec(),
            rotation: self.world.get::<Rotation>(entity)?.0,
            time: bullet.time,
            velocity_scale: bullet.velocity_scale,
            lifetime_scale: bullet.lifetime_scale,
            damage_multiplier: bullet.damage_multiplier,
            data: bullet.data,
        })
    }

    /// Snapshots of every live bullet, ordered by runtime id.
    pub fn all_bullets(&mut self) -> Vec<BulletSnapshot> {
        let entities: Vec<Entity> = self
            .world
            .query_filtered::<Entity, With<Bullet>>()
            .iter(&self.world)
            .collect();
        let mut result: Vec<BulletSnapshot> = entities
            .into_iter()
            .filter_map(|e| self.bullet_snapshot(e))
            .collect();
        result.sort_by_key(|s| s.runtime_id);
        result
    }

    pub fn bullet_count(&mut self) -> usize {
        self.world
            .query_filtered::<Entity, With<Bullet>>()
            .iter(&self.world)
            .count()
    }

    // -----------------------------------------------------------------------
    // Internals shared with hit resolution and replication
    // -----------------------------------------------------------------------

    pub(crate) fn push_event(&mut self, event: WorldEvent) {
        self.world.resource_mut::<OutgoingEvents>().events.push(event);
    }

    pub(crate) fn emit_effect(&mut self, effect: EffectId, x: f32, y: f32, rotation: f32) {
        if !effect.is_none() {
            self.push_event(WorldEvent::Effect {
                effect,
                x,
                y,
                rotation,
            });
        }
    }

    pub(crate) fn emit_sound(&mut self, sound: SoundId, source: u64, x: f32, y: f32) {
        if !sound.is_none() {
            self.push_event(WorldEvent::Sound { sound, source, x, y });
        }
    }

    /// Mark a unit dead and stop targeting it for the rest of the tick.
    pub(crate) fn kill_unit(&mut self, unit: Entity) {
        if let Some(mut health) = self.world.get_mut::<Health>(unit) {
            health.current = 0.0;
        }
        self.world.entity_mut(unit).insert(Dead);
        if let Some(rid) = self.world.get::<RuntimeId>(unit).map(|r| r.0) {
            self.grid.remove(rid);
            self.push_event(WorldEvent::UnitKilled { runtime_id: rid });
        }
    }

    /// Despawn a bullet entity. No hit resolution runs here.
    pub(crate) fn remove_bullet(&mut self, entity: Entity, reason: RemovalReason) {
        let Some(runtime_id) = self.world.get::<RuntimeId>(entity).map(|r| r.0) else {
            return;
        };
        self.push_event(WorldEvent::BulletRemoved { runtime_id, reason });
        self.world.despawn(entity);
        debug!(runtime_id, ?reason, "bullet removed");
    }

    fn is_live_bullet(&self, entity: Entity) -> bool {
        self.world.get::<Bullet>(entity).is_some()
    }

    /// One tick of one bullet: expiry check, homing, movement, collisions, aging.
    fn update_bullet(&mut self, entity: Entity) {
        let registry = Arc::clone(&self.registry);
        let Some(bullet) = self.world.get::<Bullet>(entity) else {
            return;
        };
        let Some(ty) = registry.get(bullet.type_id) else {
            return;
        };
        let lifetime = ty.lifetime * bullet.lifetime_scale;

        if bullet.time >= lifetime {
            self.despawned(entity);
            self.remove_bullet(entity, RemovalReason::Expired);
            return;
        }

        let (Some(team), Some(pos), Some(vel)) = (
            self.world.get::<Team>(entity).copied(),
            self.world.get::<Position>(entity).map(|p| p.vec()),
            self.world.get::<Velocity>(entity).map(|v| v.vec()),
        ) else {
            return;
        };
        let mut vel = vel;

        if ty.is_homing() {
            let data = self.world.get::<Bullet>(entity).and_then(|b| b.data);
            if let Some(target) = homing::find_target(&self.grid, ty, team, pos, data.as_ref()) {
                vel = homing::steer(vel, pos, Vec2::new(target.x, target.y));
            }
        }

        let new_pos = pos + vel * TICK_DELTA;
        let new_vel = vel * (1.0 - ty.drag * TICK_DELTA).clamp(0.0, 1.0);
        if let Some(mut p) = self.world.get_mut::<Position>(entity) {
            *p = Position::from(new_pos);
        }
        if let Some(mut v) = self.world.get_mut::<Velocity>(entity) {
            *v = Velocity::from(new_vel);
        }
        if new_vel.length() > f32::EPSILON {
            if let Some(mut r) = self.world.get_mut::<Rotation>(entity) {
                r.0 = new_vel.angle();
            }
        }

        if ty.collides {
            self.collide_units(entity, ty, team, pos, new_pos);
            if !self.is_live_bullet(entity) {
                return;
            }
        }

        if ty.collides_tiles {
            let solid = tiles_crossed(self.world.resource::<TileMap>(), pos, new_pos);
            for tile in solid {
                if self.collides(entity, tile) {
                    self.hit_tile(entity, tile);
                    return;
                }
            }
        }

        let expired = match self.world.get_mut::<Bullet>(entity) {
            Some(mut bullet) => {
                bullet.time += TICK_DELTA;
                bullet.time >= lifetime
            }
            None => false,
        };
        if expired {
            self.despawned(entity);
            self.remove_bullet(entity, RemovalReason::Expired);
        }
    }

    /// Hit hostile units along the path travelled this tick, nearest first.
    fn collide_units(&mut self, entity: Entity, ty: &BulletType, team: Team, from: Vec2, to: Vec2) {
        let collided = self
            .world
            .get::<Bullet>(entity)
            .map(|b| b.collided.clone())
            .unwrap_or_default();
        let candidates: Vec<SpatialEntry> = self
            .grid
            .swept(from.x, from.y, to.x, to.y, ty.hit_size / 2.0)
            .into_iter()
            .filter(|e| team.is_hostile_to(e.team))
            .filter(|e| ty.targets(e.flying))
            .filter(|e| !collided.contains(&e.runtime_id))
            .cloned()
            .collect();

        for unit in candidates {
            if self.is_dead(unit.entity) {
                continue;
            }
            self.hit_unit(entity, unit.entity);
            if !self.is_live_bullet(entity) {
                return;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Systems (manual, called by BulletWorld::tick)
// ---------------------------------------------------------------------------

/// Index every live unit for targeting and direct hits.
fn build_grid(world: &mut World) -> SpatialGrid {
    let mut grid = SpatialGrid::new();
    let mut query = world.query_filtered::<(
        Entity,
        &RuntimeId,
        &Team,
        &Position,
        &HitSize,
        Has<Flying>,
    ), (With<Unit>, Without<Dead>)>();
    for (entity, rid, team, pos, size, flying) in query.iter(world) {
        grid.insert(SpatialEntry {
            entity,
            runtime_id: rid.0,
            team: *team,
            x: pos.x,
            y: pos.y,
            hit_size: size.0,
            flying,
        });
    }
    grid
}

/// Remove dead units after their death events have been emitted.
fn system_cleanup_dead(world: &mut World) {
    let dead_entities: Vec<Entity> = world
        .query_filtered::<Entity, With<Dead>>()
        .iter(world)
        .collect();
    for entity in dead_entities {
        world.despawn(entity);
    }
}

/// Solid tiles touched moving from `from` to `to`, in travel order, excluding
/// the starting tile.
///
/// Walks the tile grid one boundary at a time. A path crossing more tiles
/// than the map holds tests each solid tile against the segment instead, so
/// the work stays bounded by whichever is smaller.
fn tiles_crossed(map: &TileMap, from: Vec2, to: Vec2) -> Vec<(i32, i32)> {
    let start = tile_coord(from);
    let end = tile_coord(to);
    let span = (i64::from(end.0) - i64::from(start.0)).unsigned_abs()
        + (i64::from(end.1) - i64::from(start.1)).unsigned_abs();
    if span == 0 || map.is_empty() {
        return Vec::new();
    }
    if span > map.len() as u64 {
        return scan_tiles(map, from, to, start);
    }

    let size = f64::from(TILE_SIZE);
    let (ox, oy) = (f64::from(from.x) / size, f64::from(from.y) / size);
    let (dx, dy) = (
        f64::from(to.x) / size - ox,
        f64::from(to.y) / size - oy,
    );
    let axis = |origin: f64, dir: f64, cell: i32| -> (i32, f64, f64) {
        if dir > 0.0 {
            (1, (f64::from(cell) + 1.0 - origin) / dir, 1.0 / dir)
        } else if dir < 0.0 {
            (-1, (origin - f64::from(cell)) / -dir, -1.0 / dir)
        } else {
            (0, f64::INFINITY, f64::INFINITY)
        }
    };
    let (step_x, mut next_x, delta_x) = axis(ox, dx, start.0);
    let (step_y, mut next_y, delta_y) = axis(oy, dy, start.1);

    let (mut tx, mut ty) = start;
    let mut tiles = Vec::new();
    for _ in 0..span {
        if next_x < next_y {
            tx = tx.saturating_add(step_x);
            next_x += delta_x;
        } else {
            ty = ty.saturating_add(step_y);
            next_y += delta_y;
        }
        if map.get((tx, ty)).is_some() {
            tiles.push((tx, ty));
        }
    }
    tiles
}

/// Every solid tile the segment passes through, ordered by entry point.
fn scan_tiles(map: &TileMap, from: Vec2, to: Vec2, start: (i32, i32)) -> Vec<(i32, i32)> {
    let size = f64::from(TILE_SIZE);
    let origin = [f64::from(from.x), f64::from(from.y)];
    let dir = [
        f64::from(to.x) - origin[0],
        f64::from(to.y) - origin[1],
    ];

    let mut hits: Vec<(f64, (i32, i32))> = map
        .iter()
        .filter(|(tile, _)| *tile != start)
        .filter_map(|(tile, _)| {
            let lo = [f64::from(tile.0) * size, f64::from(tile.1) * size];
            let (mut enter, mut exit) = (0.0_f64, 1.0_f64);
            for i in 0..2 {
                if dir[i] == 0.0 {
                    if origin[i] < lo[i] || origin[i] >= lo[i] + size {
                        return None;
                    }
                    continue;
                }
                let a = (lo[i] - origin[i]) / dir[i];
                let b = (lo[i] + size - origin[i]) / dir[i];
                enter = enter.max(a.min(b));
                exit = exit.min(a.max(b));
            }
            (enter <= exit).then_some((enter, tile))
        })
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    hits.into_iter().map(|(_, tile)| tile).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with(types: Vec<BulletType>) -> BulletWorld {
        let registry = BulletRegistry::new(types).unwrap();
        BulletWorld::new(Arc::new(registry), Role::Server, 7)
    }

    fn removals(events: &[WorldEvent]) -> Vec<(u64, RemovalReason)> {
        events
            .iter()
            .filter_map(|e| match e {
                WorldEvent::BulletRemoved { runtime_id, reason } => Some((*runtime_id, *reason)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn bullet_world_new() {
        let bw = world_with(vec![BulletType::new("a", 1.0, 1.0)]);
        assert_eq!(bw.current_tick(), 0);
        assert_eq!(bw.world.resource::<EntityIdAllocator>().current(), 1);
        assert_eq!(bw.role(), Role::Server);
    }

    #[test]
    fn create_unknown_type() {
        let mut bw = world_with(vec![BulletType::new("a", 1.0, 1.0)]);
        let err = bw
            .create(BulletTypeId(3), BulletSpawn::new(Team(1), 0.0, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, BulletError::UnknownType(BulletTypeId(3))));
        assert_eq!(bw.bullet_count(), 0);
    }

    #[test]
    fn create_sets_velocity_and_back_projects() {
        let mut bw = world_with(vec![BulletType::new("a", 4.0, 1.0)]);
        let e = bw
            .create(
                BulletTypeId(0),
                BulletSpawn::new(Team(1), 10.0, 20.0, 90.0).velocity_scale(0.5),
            )
            .unwrap();
        let s = bw.bullet_snapshot(e).unwrap();
        assert!(s.velocity.x.abs() < 1e-4);
        assert!((s.velocity.y - 2.0).abs() < 1e-4);
        assert!((s.position.x - 10.0).abs() < 1e-4);
        assert!((s.position.y - 18.0).abs() < 1e-4);
        assert!((s.rotation - 90.0).abs() < 1e-3);
        assert!(s.owner.is_none());
        assert_eq!(s.damage_multiplier, 1.0);

        // First tick lands on the muzzle
        bw.tick();
        let s = bw.bullet_snapshot(e).unwrap();
        assert!((s.position.y - 20.0).abs() < 1e-4);
    }

    #[test]
    fn angle_is_wrapped() {
        let mut bw = world_with(vec![BulletType::new("a", 2.0, 1.0)]);
        let e = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 0.0, 0.0, -270.0))
            .unwrap();
        let s = bw.bullet_snapshot(e).unwrap();
        assert!((s.rotation - 90.0).abs() < 1e-3);
    }

    #[test]
    fn keep_velocity_adds_owner_velocity() {
        let mut bw = world_with(vec![BulletType::new("a", 2.0, 1.0)]);
        let (owner, _) = bw.spawn_unit(UnitSpawn::new(Team(1), 0.0, 0.0).velocity(1.0, 0.5));
        let e = bw
            .create_for_owner(BulletTypeId(0), owner, 0.0, 0.0, 0.0)
            .unwrap();
        let s = bw.bullet_snapshot(e).unwrap();
        assert!((s.velocity.x - 3.0).abs() < 1e-4);
        assert!((s.velocity.y - 0.5).abs() < 1e-4);
        assert_eq!(s.team, Team(1));
        assert_eq!(s.owner, Some(owner));
    }

    #[test]
    fn keep_velocity_off_ignores_owner() {
        let mut ty = BulletType::new("a", 2.0, 1.0);
        ty.keep_velocity = false;
        let mut bw = world_with(vec![ty]);
        let (owner, _) = bw.spawn_unit(UnitSpawn::new(Team(1), 0.0, 0.0).velocity(5.0, 5.0));
        let e = bw
            .create_for_owner(BulletTypeId(0), owner, 0.0, 0.0, 0.0)
            .unwrap();
        let s = bw.bullet_snapshot(e).unwrap();
        assert!((s.velocity.x - 2.0).abs() < 1e-4);
        assert!(s.velocity.y.abs() < 1e-4);
    }

    #[test]
    fn owner_without_velocity_counts_as_zero() {
        let mut bw = world_with(vec![BulletType::new("a", 2.0, 1.0)]);
        let (owner, _) = bw.spawn_unit(UnitSpawn::new(Team(1), 0.0, 0.0).damage_multiplier(1.5));
        let e = bw
            .create_for_owner(BulletTypeId(0), owner, 0.0, 0.0, 0.0)
            .unwrap();
        let s = bw.bullet_snapshot(e).unwrap();
        assert!((s.velocity.x - 2.0).abs() < 1e-4);
        assert_eq!(s.damage_multiplier, 1.5);
    }

    #[test]
    fn end_to_end_expires_once_at_lifetime() {
        let mut ty = BulletType::new("plain", 5.0, 1.0);
        ty.lifetime = 40.0;
        let mut bw = world_with(vec![ty]);
        let e = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 0.0, 0.0, 0.0))
            .unwrap();
        let rid = bw.bullet_snapshot(e).unwrap().runtime_id;
        bw.drain_events();

        for tick in 1..=39 {
            bw.tick();
            assert!(removals(&bw.drain_events()).is_empty(), "removed early at {tick}");
        }
        bw.tick();
        let events = bw.drain_events();
        assert_eq!(removals(&events), vec![(rid, RemovalReason::Expired)]);
        assert_eq!(
            events.iter().filter(|e| matches!(e, WorldEvent::Effect { .. })).count(),
            1,
            "despawn effect only, no hit"
        );
        assert!(!events.iter().any(|e| matches!(e, WorldEvent::AreaDamage { .. })));
        assert_eq!(bw.bullet_count(), 0);

        for _ in 0..10 {
            bw.tick();
        }
        assert!(removals(&bw.drain_events()).is_empty());
    }

    #[test]
    fn travel_distance_matches_range() {
        let mut ty = BulletType::new("plain", 5.0, 1.0);
        ty.lifetime = 40.0;
        ty.collides = false;
        let mut bw = world_with(vec![ty]);
        let e = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 0.0, 0.0, 0.0))
            .unwrap();
        for _ in 0..39 {
            bw.tick();
        }
        let s = bw.bullet_snapshot(e).unwrap();
        // First move lands on the muzzle, 38 more after it
        assert!((s.position.x - 190.0).abs() < 1e-2);
    }

    #[test]
    fn lifetime_scale_shortens_life() {
        let mut ty = BulletType::new("plain", 1.0, 1.0);
        ty.lifetime = 10.0;
        let mut bw = world_with(vec![ty]);
        bw.create(
            BulletTypeId(0),
            BulletSpawn::new(Team(1), 0.0, 0.0, 0.0).lifetime_scale(0.5),
        )
        .unwrap();
        for _ in 0..5 {
            bw.tick();
        }
        assert_eq!(bw.bullet_count(), 0);
    }

    #[test]
    fn drag_slows_bullet() {
        let mut ty = BulletType::new("draggy", 4.0, 1.0);
        ty.drag = 0.5;
        let mut bw = world_with(vec![ty]);
        let e = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 0.0, 0.0, 0.0))
            .unwrap();
        bw.tick();
        let s = bw.bullet_snapshot(e).unwrap();
        assert!((s.velocity.x - 2.0).abs() < 1e-4);
    }

    #[test]
    fn instant_disappear_expires_next_tick() {
        let mut ty = BulletType::new("arc", 0.0, 5.0);
        ty.instant_disappear = true;
        ty.lightning = 3;
        let mut bw = world_with(vec![ty]);
        let e = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 4.0, 4.0, 30.0))
            .unwrap();
        assert!(bw.bullet_snapshot(e).is_some());
        bw.drain_events();

        bw.tick();
        let events = bw.drain_events();
        assert_eq!(removals(&events).len(), 1);
        assert_eq!(
            events.iter().filter(|e| matches!(e, WorldEvent::Discharge { .. })).count(),
            3
        );
        assert!(bw.bullet_snapshot(e).is_none());
    }

    #[test]
    fn instant_disappear_resolves_at_muzzle() {
        let mut ty = BulletType::new("arc", 3.0, 5.0);
        ty.instant_disappear = true;
        ty.lightning = 2;
        let mut bw = world_with(vec![ty]);
        let e = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 4.0, 4.0, 0.0))
            .unwrap();
        assert_eq!(bw.bullet_snapshot(e).unwrap().position, Vec2::new(4.0, 4.0));
        bw.drain_events();

        bw.tick();
        let spots: Vec<(f32, f32)> = bw
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                WorldEvent::Discharge { x, y, .. } => Some((x, y)),
                _ => None,
            })
            .collect();
        assert_eq!(spots, vec![(4.0, 4.0); 2]);
    }

    #[test]
    fn non_finite_spawn_rejected() {
        let mut bw = world_with(vec![BulletType::new("slug", 3.0, 1.0)]);
        let spawns = [
            BulletSpawn::new(Team(1), f32::NAN, 0.0, 0.0),
            BulletSpawn::new(Team(1), 0.0, 0.0, f32::INFINITY),
            BulletSpawn::new(Team(1), 0.0, 0.0, 0.0).velocity_scale(f32::INFINITY),
            BulletSpawn::new(Team(1), 0.0, 0.0, 0.0).lifetime_scale(f32::NAN),
            // Finite scale, but speed times scale overflows
            BulletSpawn::new(Team(1), 0.0, 0.0, 0.0).velocity_scale(f32::MAX),
        ];
        for spawn in spawns {
            assert!(matches!(
                bw.create(BulletTypeId(0), spawn),
                Err(BulletError::InvalidSpawn { .. })
            ));
        }
        assert_eq!(bw.bullet_count(), 0);
        assert!(bw.drain_events().is_empty());
    }

    #[test]
    fn kill_shooter_kills_damageable_owner() {
        let mut ty = BulletType::new("crawler-blast", 0.0, 5.0);
        ty.kill_shooter = true;
        let mut bw = world_with(vec![ty]);
        let (owner, owner_rid) = bw.spawn_unit(UnitSpawn::new(Team(2), 0.0, 0.0).health(30.0));
        bw.create_for_owner(BulletTypeId(0), owner, 0.0, 0.0, 0.0)
            .unwrap();

        assert_eq!(bw.unit_health(owner), Some(0.0));
        assert!(bw.is_dead(owner));
        let events = bw.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, WorldEvent::UnitKilled { runtime_id } if *runtime_id == owner_rid)));

        bw.tick();
        assert!(bw.unit_health(owner).is_none(), "dead owner cleaned up");
    }

    #[test]
    fn kill_shooter_ignores_undamageable_owner() {
        let mut ty = BulletType::new("crawler-blast", 0.0, 5.0);
        ty.kill_shooter = true;
        let mut bw = world_with(vec![ty]);
        let (owner, _) = bw.spawn_unit(UnitSpawn::new(Team(2), 0.0, 0.0));
        bw.create_for_owner(BulletTypeId(0), owner, 0.0, 0.0, 0.0)
            .unwrap();
        assert!(!bw.is_dead(owner));
    }

    #[test]
    fn create_for_owner_requires_team() {
        let mut bw = world_with(vec![BulletType::new("a", 1.0, 1.0)]);
        let stray = bw.world.spawn_empty().id();
        let err = bw
            .create_for_owner(BulletTypeId(0), stray, 0.0, 0.0, 0.0)
            .unwrap_err();
        assert!(matches!(err, BulletError::InvalidOwner(_)));
    }

    #[test]
    fn non_piercing_removed_on_first_unit() {
        let mut ty = BulletType::new("slug", 2.0, 10.0);
        ty.lifetime = 100.0;
        let mut bw = world_with(vec![ty]);
        let (first, _) = bw.spawn_unit(UnitSpawn::new(Team(2), 10.0, 0.0).health(100.0));
        let (second, _) = bw.spawn_unit(UnitSpawn::new(Team(2), 30.0, 0.0).health(100.0));
        let e = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 0.0, 0.0, 0.0))
            .unwrap();
        bw.drain_events();

        for _ in 0..20 {
            bw.tick();
        }
        assert!(bw.bullet_snapshot(e).is_none());
        assert_eq!(bw.unit_health(first), Some(90.0));
        assert_eq!(bw.unit_health(second), Some(100.0));
        let events = bw.drain_events();
        assert_eq!(removals(&events).len(), 1);
        assert_eq!(removals(&events)[0].1, RemovalReason::Collided);
    }

    #[test]
    fn piercing_hits_each_unit_once() {
        let mut ty = BulletType::new("rail", 2.0, 10.0);
        ty.lifetime = 30.0;
        ty.pierce = true;
        let mut bw = world_with(vec![ty]);
        let (first, _) = bw.spawn_unit(UnitSpawn::new(Team(2), 10.0, 0.0).health(100.0));
        let (second, _) = bw.spawn_unit(UnitSpawn::new(Team(2), 30.0, 0.0).health(100.0));
        bw.create(BulletTypeId(0), BulletSpawn::new(Team(1), 0.0, 0.0, 0.0))
            .unwrap();

        for _ in 0..30 {
            bw.tick();
        }
        assert_eq!(bw.unit_health(first), Some(90.0));
        assert_eq!(bw.unit_health(second), Some(90.0));
    }

    #[test]
    fn friendly_and_air_units_are_ignored() {
        let mut ty = BulletType::new("ground-slug", 2.0, 10.0);
        ty.collides_air = false;
        let mut bw = world_with(vec![ty]);
        let (friend, _) = bw.spawn_unit(UnitSpawn::new(Team(1), 6.0, 0.0).health(50.0));
        let (flyer, _) = bw.spawn_unit(UnitSpawn::new(Team(2), 12.0, 0.0).health(50.0).flying());
        bw.create(BulletTypeId(0), BulletSpawn::new(Team(1), 0.0, 0.0, 0.0))
            .unwrap();
        for _ in 0..15 {
            bw.tick();
        }
        assert_eq!(bw.unit_health(friend), Some(50.0));
        assert_eq!(bw.unit_health(flyer), Some(50.0));
    }

    #[test]
    fn lethal_hit_kills_and_cleans_up() {
        let mut bw = world_with(vec![BulletType::new("slug", 2.0, 25.0)]);
        let (target, rid) = bw.spawn_unit(UnitSpawn::new(Team(2), 8.0, 0.0).health(20.0));
        bw.create(BulletTypeId(0), BulletSpawn::new(Team(1), 0.0, 0.0, 0.0))
            .unwrap();
        for _ in 0..6 {
            bw.tick();
        }
        let events = bw.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, WorldEvent::UnitKilled { runtime_id } if *runtime_id == rid)));
        assert!(bw.unit_health(target).is_none());
    }

    #[test]
    fn tile_hit_removes_bullet() {
        let mut bw = world_with(vec![BulletType::new("slug", 2.0, 7.0)]);
        bw.set_tile((3, 0), Some(Team(2)));
        let e = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 0.0, 4.0, 0.0))
            .unwrap();
        bw.drain_events();
        for _ in 0..20 {
            bw.tick();
        }
        assert!(bw.bullet_snapshot(e).is_none());
        let events = bw.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            WorldEvent::TileDamaged { tile: (3, 0), team: Some(Team(2)), .. }
        )));
        assert_eq!(removals(&events)[0].1, RemovalReason::Collided);
    }

    #[test]
    fn own_team_tiles_pass_unless_collides_team() {
        let mut ty = BulletType::new("slug", 2.0, 7.0);
        ty.lifetime = 20.0;
        let mut team_hitter = ty.clone();
        team_hitter.name = "team-hitter".into();
        team_hitter.collides_team = true;
        let mut bw = world_with(vec![ty, team_hitter]);
        bw.set_tile((3, 0), Some(Team(1)));

        let passes = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 0.0, 4.0, 0.0))
            .unwrap();
        let stops = bw
            .create(BulletTypeId(1), BulletSpawn::new(Team(1), 0.0, 4.0, 0.0))
            .unwrap();
        for _ in 0..16 {
            bw.tick();
        }
        assert!(bw.bullet_snapshot(passes).is_some());
        assert!(bw.bullet_snapshot(stops).is_none());
    }

    #[test]
    fn cleared_tile_no_longer_blocks() {
        let mut bw = world_with(vec![BulletType::new("slug", 2.0, 7.0)]);
        bw.set_tile((3, 0), None);
        bw.clear_tile((3, 0));
        assert!(bw.world.resource::<TileMap>().is_empty());
        let e = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 0.0, 4.0, 0.0))
            .unwrap();
        for _ in 0..20 {
            bw.tick();
        }
        assert!(bw.bullet_snapshot(e).is_some());
    }

    #[test]
    fn fast_bullet_does_not_tunnel() {
        let mut bw = world_with(vec![BulletType::new("fast", 20.0, 1.0)]);
        bw.set_tile((5, 0), None);
        let e = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 30.0, 4.0, 0.0))
            .unwrap();
        bw.tick(); // at muzzle
        bw.tick(); // 30 -> 50, crosses tile x in [40, 48)
        assert!(bw.bullet_snapshot(e).is_none());
    }

    #[test]
    fn fast_bullet_hits_unit_between_positions() {
        let mut bw = world_with(vec![BulletType::new("fast", 20.0, 10.0)]);
        let (unit, _) = bw.spawn_unit(UnitSpawn::new(Team(2), 42.0, 4.0).health(100.0));
        let e = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 30.0, 4.0, 0.0))
            .unwrap();
        for _ in 0..10 {
            bw.tick();
        }
        // Ends at 30 then 50, never within reach of x = 42 at a tick boundary
        assert_eq!(bw.unit_health(unit), Some(90.0));
        assert!(bw.bullet_snapshot(e).is_none());
    }

    #[test]
    fn huge_velocity_scale_still_hits_tiles() {
        let mut bw = world_with(vec![BulletType::new("fast", 20.0, 1.0)]);
        bw.set_tile((5, 0), None);
        let e = bw
            .create_net(BulletTypeId(0), Team(1), 4.0, 4.0, 0.0, 1.0e12, 1.0)
            .unwrap();
        bw.tick();
        bw.tick();
        let events = bw.drain_events();
        assert!(bw.bullet_snapshot(e).is_none());
        assert!(events
            .iter()
            .any(|e| matches!(e, WorldEvent::TileDamaged { tile: (5, 0), .. })));
    }

    #[test]
    fn tiles_crossed_in_order() {
        let mut map = TileMap::default();
        for x in 1..=3 {
            map.set((x, 0), Tile { team: None });
        }
        let tiles = tiles_crossed(&map, Vec2::new(1.0, 1.0), Vec2::new(25.0, 1.0));
        assert_eq!(tiles, vec![(1, 0), (2, 0), (3, 0)]);
        let back = tiles_crossed(&map, Vec2::new(25.0, 1.0), Vec2::new(1.0, 1.0));
        assert_eq!(back, vec![(2, 0), (1, 0)]);
        assert!(tiles_crossed(&map, Vec2::new(1.0, 1.0), Vec2::new(2.0, 1.0)).is_empty());
    }

    #[test]
    fn tiles_crossed_diagonal_skips_empty() {
        let mut map = TileMap::default();
        map.set((2, 2), Tile { team: None });
        map.set((2, 0), Tile { team: None });
        map.set((9, 9), Tile { team: None });
        map.set((4, 4), Tile { team: None });
        // Walked cell by cell: span 4, map holds 4
        let walked = tiles_crossed(&map, Vec2::new(4.0, 4.0), Vec2::new(20.0, 20.0));
        // Scanned: span 16 exceeds the map
        let scanned = tiles_crossed(&map, Vec2::new(4.0, 4.0), Vec2::new(68.0, 68.0));
        assert_eq!(walked, vec![(2, 2)]);
        assert_eq!(scanned, vec![(2, 2), (4, 4)]);
    }

    #[test]
    fn unbounded_homing_range_finds_target() {
        let mut ty = BulletType::new("missile", 2.0, 1.0);
        ty.homing_power = 0.5;
        ty.homing_range = 1.0e30;
        ty.collides = false;
        let mut bw = world_with(vec![ty]);
        bw.spawn_unit(UnitSpawn::new(Team(2), 0.0, 100.0));
        let e = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 0.0, 0.0, 0.0))
            .unwrap();
        bw.tick();
        assert!(bw.bullet_snapshot(e).unwrap().velocity.y > 0.0);
    }

    #[test]
    fn homing_bends_toward_target() {
        let mut ty = BulletType::new("missile", 2.0, 1.0);
        ty.homing_power = 0.08;
        ty.homing_range = 200.0;
        ty.collides = false;
        let mut bw = world_with(vec![ty]);
        bw.spawn_unit(UnitSpawn::new(Team(2), 0.0, 100.0));
        let e = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 0.0, 0.0, 0.0))
            .unwrap();

        let mut last_gap = 90.0_f32;
        for _ in 0..5 {
            bw.tick();
            let s = bw.bullet_snapshot(e).unwrap();
            let bearing = (Vec2::new(0.0, 100.0) - s.position).angle();
            let gap = homing::angle_delta(s.rotation, bearing).abs();
            assert!(gap < last_gap);
            last_gap = gap;
        }
    }

    #[test]
    fn non_homing_flies_straight() {
        let mut bw = world_with(vec![BulletType::new("plain", 2.0, 1.0)]);
        bw.spawn_unit(UnitSpawn::new(Team(2), 0.0, 100.0));
        let e = bw
            .create(BulletTypeId(0), BulletSpawn::new(Team(1), 0.0, 0.0, 0.0))
            .unwrap();
        for _ in 0..5 {
            bw.tick();
        }
        let s = bw.bullet_snapshot(e).unwrap();
        assert!(s.position.y.abs() < 1e-4);
    }

    #[test]
    fn all_bullets_sorted() {
        let mut bw = world_with(vec![BulletType::new("a", 1.0, 1.0)]);
        for i in 0..4 {
            bw.create(
                BulletTypeId(0),
                BulletSpawn::new(Team(1), i as f32, 0.0, 0.0),
            )
            .unwrap();
        }
        let all = bw.all_bullets();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].runtime_id < w[1].runtime_id));
    }
}
