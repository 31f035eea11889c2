//! A turret on the server fires every loaded bullet type at a ring of
//! orbiting targets; an observer world rebuilds the shots from replication.

use std::fmt;
use std::sync::Arc;

use bevy_ecs::entity::Entity;
use tracing::{debug, warn};
use volley_game::{
    BulletError, BulletRegistry, BulletTypeId, BulletWorld, Role, Team, UnitSpawn, WorldEvent,
};

use crate::link::{LinkStats, LossyLink};

const TURRET_TEAM: Team = Team::SHARDED;
const TARGET_TEAM: Team = Team::CRUX;

/// Heading change between consecutive volleys, in degrees.
const VOLLEY_SWEEP: f32 = 37.0;
const TARGET_HEALTH: f32 = 200.0;
/// Orbit speed of targets, degrees per tick.
const ORBIT_RATE: f32 = 0.5;

/// Counts of world events by kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventTally {
    pub created: u64,
    pub expired: u64,
    pub collided: u64,
    pub effects: u64,
    pub sounds: u64,
    pub area_damage: u64,
    pub ignites: u64,
    pub discharges: u64,
    pub unit_hits: u64,
    pub kills: u64,
    pub tile_hits: u64,
}

impl EventTally {
    pub fn record(&mut self, event: &WorldEvent) {
        use volley_game::RemovalReason;
        match event {
            WorldEvent::BulletCreated { .. } => self.created += 1,
            WorldEvent::BulletRemoved { reason, .. } => match reason {
                RemovalReason::Expired => self.expired += 1,
                RemovalReason::Collided => self.collided += 1,
            },
            WorldEvent::Effect { .. } | WorldEvent::Shake { .. } => self.effects += 1,
            WorldEvent::Sound { .. } => self.sounds += 1,
            WorldEvent::AreaDamage { .. } => self.area_damage += 1,
            WorldEvent::Ignite { .. } => self.ignites += 1,
            WorldEvent::Discharge { .. } => self.discharges += 1,
            WorldEvent::UnitDamaged { .. } | WorldEvent::StatusApplied { .. } => {
                self.unit_hits += 1
            }
            WorldEvent::UnitKilled { .. } => self.kills += 1,
            WorldEvent::TileDamaged { .. } => self.tile_hits += 1,
        }
    }
}

impl fmt::Display for EventTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} expired={} collided={} unit_hits={} kills={} tile_hits={} splash={} ignites={} discharges={}",
            self.created,
            self.expired,
            self.collided,
            self.unit_hits,
            self.kills,
            self.tile_hits,
            self.area_damage,
            self.ignites,
            self.discharges
        )
    }
}

/// Parameters of a scenario run.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioParams {
    pub seed: u64,
    pub fire_interval: u64,
    pub targets: u32,
    pub drop_rate: f64,
}

struct Target {
    server: Entity,
    client: Entity,
    radius: f32,
    phase: f32,
}

pub struct Scenario {
    server: BulletWorld,
    client: BulletWorld,
    link: LossyLink,
    targets: Vec<Target>,
    fire_interval: u64,
    types: Vec<BulletTypeId>,
    volleys: u64,
    server_tally: EventTally,
    client_tally: EventTally,
}

impl Scenario {
    pub fn new(registry: Arc<BulletRegistry>, params: ScenarioParams) -> Self {
        let types: Vec<BulletTypeId> = registry.all().iter().map(|t| t.id).collect();
        let mut server = BulletWorld::new(Arc::clone(&registry), Role::Server, params.seed);
        let mut client = BulletWorld::new(registry, Role::Client, params.seed.wrapping_add(1));

        let mut targets = Vec::with_capacity(params.targets as usize);
        for i in 0..params.targets {
            let radius = 60.0 + 20.0 * (i % 4) as f32;
            let phase = i as f32 * 360.0 / params.targets.max(1) as f32;
            let (x, y) = orbit(radius, phase, 0);
            let mut spawn = UnitSpawn::new(TARGET_TEAM, x, y)
                .health(TARGET_HEALTH)
                .velocity(0.0, 0.0);
            if i % 3 == 2 {
                spawn = spawn.flying();
            }
            let (server_unit, _) = server.spawn_unit(spawn);
            let (client_unit, _) = client.spawn_unit(spawn);
            targets.push(Target {
                server: server_unit,
                client: client_unit,
                radius,
                phase,
            });
        }

        // A broken ring of walls and enemy buildings beyond the targets
        for step in 0..24 {
            if step % 4 == 3 {
                continue;
            }
            let a = (step as f32 * 15.0).to_radians();
            let tile = ((a.cos() * 22.0).round() as i32, (a.sin() * 22.0).round() as i32);
            let team = if step % 2 == 0 { None } else { Some(TARGET_TEAM) };
            server.set_tile(tile, team);
            client.set_tile(tile, team);
        }

        Self {
            server,
            client,
            link: LossyLink::new(params.drop_rate, params.seed ^ 0x5eed),
            targets,
            fire_interval: params.fire_interval.max(1),
            types,
            volleys: 0,
            server_tally: EventTally::default(),
            client_tally: EventTally::default(),
        }
    }

    /// Advance both worlds by one tick.
    pub fn step(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let tick = self.server.current_tick();

        for target in &self.targets {
            let (x, y) = orbit(target.radius, target.phase, tick);
            self.server.set_unit_position(target.server, x, y);
            self.client.set_unit_position(target.client, x, y);
        }

        if tick % self.fire_interval == 0 && !self.types.is_empty() {
            self.fire()?;
        }

        self.server.tick();
        for msg in self.link.transmit(self.server.drain_replication())? {
            if let Err(e) = self.client.apply_replicated(&msg) {
                warn!(error = %e, "replicated bullet rejected");
            }
        }
        self.client.tick();

        for event in self.server.drain_events() {
            self.server_tally.record(&event);
        }
        for event in self.client.drain_events() {
            self.client_tally.record(&event);
        }
        Ok(())
    }

    fn fire(&mut self) -> Result<(), BulletError> {
        let index = (self.volleys % self.types.len() as u64) as usize;
        let type_id = self.types[index];
        let angle = self.volleys as f32 * VOLLEY_SWEEP;
        self.server
            .create_net(type_id, TURRET_TEAM, 0.0, 0.0, angle, 1.0, 1.0)?;
        debug!(%type_id, angle, "volley");
        self.volleys += 1;
        Ok(())
    }

    pub fn current_tick(&self) -> u64 {
        self.server.current_tick()
    }

    pub fn volleys(&self) -> u64 {
        self.volleys
    }

    pub fn server_tally(&self) -> EventTally {
        self.server_tally
    }

    pub fn client_tally(&self) -> EventTally {
        self.client_tally
    }

    pub fn link_stats(&self) -> LinkStats {
        self.link.stats()
    }

    pub fn live_bullets(&mut self) -> (usize, usize) {
        (self.server.bullet_count(), self.client.bullet_count())
    }
}

/// Position on a circle around the turret at `tick`.
fn orbit(radius: f32, phase: f32, tick: u64) -> (f32, f32) {
    let a = (phase + tick as f32 * ORBIT_RATE).to_radians();
    (a.cos() * radius, a.sin() * radius)
}
