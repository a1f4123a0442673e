//! Player viewpoint, zipline transit and control transfer.
//!
//! The rig is the player's presence in the world: which vessel they command
//! and where their viewpoint sits. A zipline ride moves the viewpoint down an
//! attached grapple rope and, on arrival, hands control to the vessel at the
//! far end. Cancelling snaps the viewpoint back aboard with no forces left
//! behind. The wind and spark effects belong to the ride and stop with it.

use broadside_logic::config::{PoolConfig, ZiplineConfig};
use broadside_logic::constants::effects;
use broadside_logic::grapple::{Zipline, ZiplineError};
use broadside_logic::movement::ControlInput;
use broadside_logic::scoring::SessionStats;
use glam::Vec3;
use hecs::{Entity, World};

use super::grapple::rope_ends;
use super::lifecycle::{spawn_effect, stop_effect};
use crate::components::*;
use crate::events::{EventQueue, GameEvent, ReleaseReason};
use crate::pool::ObjectPool;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transit {
    /// Vessel the ride started from; it owns the grapple.
    pub from: Entity,
    pub to: Entity,
    pub start: Vec3,
    pub zipline: Zipline,
    /// Wind and sparks, when the effect pool had room for them.
    pub effects: [Option<Entity>; 2],
}

/// What a ride touches besides the world and the rig.
pub struct RideContext<'a> {
    pub pool: &'a mut ObjectPool,
    pub events: &'a mut EventQueue,
    pub zipline: &'a ZiplineConfig,
    pub pools: &'a PoolConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerRig {
    /// Vessel under the player's command.
    pub vessel: Option<Entity>,
    /// Smoothed viewpoint, for rendering.
    pub viewpoint: Vec3,
    /// Where the simulation wants the viewpoint.
    pub target_viewpoint: Vec3,
    pub transit: Option<Transit>,
}

impl PlayerRig {
    pub fn is_riding(&self) -> bool {
        self.transit.is_some()
    }

    /// Visual pass: ease the viewpoint toward its target.
    pub fn ease(&mut self, config: &ZiplineConfig, dt: f32) {
        let k = (config.camera_smoothing * dt).clamp(0.0, 1.0);
        self.viewpoint += (self.target_viewpoint - self.viewpoint) * k;
    }
}

fn eye(world: &World, vessel: Entity, config: &ZiplineConfig) -> Option<Vec3> {
    world
        .get::<&RigidBody>(vessel)
        .ok()
        .map(|b| b.position + Vec3::Y * config.eye_height)
}

/// Begin riding the rope of the commanded vessel's attached grapple.
pub fn start_zipline(world: &mut World, rig: &mut PlayerRig, ctx: &mut RideContext<'_>) -> Result<(), ZiplineError> {
    if rig.transit.is_some() {
        return Err(ZiplineError::AlreadyRiding);
    }
    let from = rig.vessel.ok_or(ZiplineError::NoController)?;
    let to = world
        .get::<&GrappleLauncher>(from)
        .ok()
        .filter(|g| g.grapple.is_attached())
        .and_then(|g| g.target)
        .ok_or(ZiplineError::NotAttached)?;
    let (_, anchor) = rope_ends(world, from).ok_or(ZiplineError::NotAttached)?;

    let start = rig.target_viewpoint;
    let end = anchor + Vec3::Y * ctx.zipline.eye_height;
    let zipline = Zipline::start(start.distance(end), ctx.zipline);
    ctx.events.push(GameEvent::ZiplineStarted { from, to });

    // Outlive the ride so the effects end when it does, not before.
    let lifetime = ctx.pools.effect_lifetime.max(zipline.travel.duration + 1.0);
    let effects = [effects::ZIPLINE_WIND, effects::ZIPLINE_SPARKS]
        .map(|name| spawn_effect(world, ctx.pool, ctx.events, name, start, lifetime));
    rig.transit = Some(Transit {
        from,
        to,
        start,
        zipline,
        effects,
    });
    log::debug!("zipline {:?} -> {:?} over {:.1}m", from, to, start.distance(end));
    Ok(())
}

fn stop_transit_effects(world: &mut World, transit: &Transit, ctx: &mut RideContext<'_>) {
    for entity in transit.effects.into_iter().flatten() {
        stop_effect(world, ctx.pool, ctx.events, entity);
    }
}

/// Abort a ride. The viewpoint returns aboard the source vessel.
pub fn cancel_zipline(world: &mut World, rig: &mut PlayerRig, ctx: &mut RideContext<'_>) -> bool {
    let Some(transit) = rig.transit.take() else {
        return false;
    };
    if let Some(eye) = eye(world, transit.from, ctx.zipline) {
        rig.target_viewpoint = eye;
        rig.viewpoint = eye;
    }
    ctx.events.push(GameEvent::ZiplineCancelled { from: transit.from });
    stop_transit_effects(world, &transit, ctx);
    true
}

/// Move control authority from one vessel to another.
pub fn transfer_control(
    world: &mut World,
    rig: &mut PlayerRig,
    from: Option<Entity>,
    to: Entity,
    events: &mut EventQueue,
) {
    if let Some(from) = from {
        if let Ok(mut control) = world.get::<&mut PlayerControl>(from) {
            control.enabled = false;
        }
        if let Ok(mut helm) = world.get::<&mut Helm>(from) {
            helm.input = ControlInput::idle();
        }
        if let Ok(mut faction) = world.get::<&mut Faction>(from) {
            if *faction == Faction::Player {
                *faction = Faction::Friendly;
            }
        }
    }

    let has_control = match world.get::<&mut PlayerControl>(to) {
        Ok(mut control) => {
            control.enabled = true;
            true
        }
        Err(_) => false,
    };
    if !has_control {
        if let Err(e) = world.insert_one(to, PlayerControl { enabled: true }) {
            log::warn!("{:?}: cannot take control: {}", to, e);
        }
    }
    if let Ok(mut ai) = world.get::<&mut AiController>(to) {
        ai.enabled = false;
        ai.target = None;
        ai.brain.reset();
    }
    if let Ok(mut capturable) = world.get::<&mut Capturable>(to) {
        capturable.enabled = false;
    }
    if let Ok(mut faction) = world.get::<&mut Faction>(to) {
        *faction = Faction::Player;
    }

    rig.vessel = Some(to);
    if let Some(from) = from {
        events.push(GameEvent::ControlTransferred { from, to });
    }
    let name = world
        .get::<&Vessel>(to)
        .map(|v| v.name.clone())
        .unwrap_or_default();
    log::info!("player now commands {}", name);
}

/// Advance an active ride, or keep the viewpoint aboard when idle.
pub fn zipline_system(
    world: &mut World,
    rig: &mut PlayerRig,
    stats: &mut SessionStats,
    ctx: &mut RideContext<'_>,
    dt: f32,
) {
    let config = ctx.zipline;
    let Some(mut transit) = rig.transit else {
        if let Some(eye) = rig.vessel.and_then(|v| eye(world, v, config)) {
            rig.target_viewpoint = eye;
        }
        return;
    };

    // The rope must still join the same two vessels.
    let linked = world
        .get::<&GrappleLauncher>(transit.from)
        .map_or(false, |g| g.grapple.is_attached() && g.target == Some(transit.to));
    let ends = if linked { rope_ends(world, transit.from) } else { None };
    let Some((_, anchor)) = ends else {
        log::debug!("zipline rope lost mid-ride");
        cancel_zipline(world, rig, ctx);
        return;
    };

    let end = anchor + Vec3::Y * config.eye_height;
    let arrived = transit.zipline.tick(dt);
    rig.target_viewpoint = transit.zipline.position(transit.start, end);
    rig.transit = Some(transit);
    if !arrived {
        return;
    }

    rig.transit = None;
    rig.target_viewpoint = end;
    if let Ok(mut launcher) = world.get::<&mut GrappleLauncher>(transit.from) {
        launcher.release();
    }
    ctx.events.push(GameEvent::GrappleReleased {
        launcher: transit.from,
        reason: ReleaseReason::Boarded,
    });
    ctx.events.push(GameEvent::ZiplineArrived {
        from: transit.from,
        to: transit.to,
    });
    stop_transit_effects(world, &transit, ctx);
    transfer_control(world, rig, Some(transit.from), transit.to, ctx.events);
    stats.record_boarded();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolTag;
    use crate::systems::grapple::grapple_system;
    use broadside_logic::config::GrappleConfig;

    struct Ride {
        pool: ObjectPool,
        events: EventQueue,
        zipline: ZiplineConfig,
        pools: PoolConfig,
        stats: SessionStats,
    }

    impl Ride {
        fn new() -> Self {
            let pools = PoolConfig::default();
            Self {
                pool: ObjectPool::new(&pools),
                events: EventQueue::new(),
                zipline: ZiplineConfig::default(),
                pools,
                stats: SessionStats::default(),
            }
        }

        fn ctx(&mut self) -> RideContext<'_> {
            RideContext {
                pool: &mut self.pool,
                events: &mut self.events,
                zipline: &self.zipline,
                pools: &self.pools,
            }
        }

        fn start(&mut self, world: &mut World, rig: &mut PlayerRig) -> Result<(), ZiplineError> {
            start_zipline(world, rig, &mut self.ctx())
        }

        fn cancel(&mut self, world: &mut World, rig: &mut PlayerRig) -> bool {
            cancel_zipline(world, rig, &mut self.ctx())
        }

        fn tick(&mut self, world: &mut World, rig: &mut PlayerRig) {
            let mut ctx = RideContext {
                pool: &mut self.pool,
                events: &mut self.events,
                zipline: &self.zipline,
                pools: &self.pools,
            };
            zipline_system(world, rig, &mut self.stats, &mut ctx, 0.02);
        }

        fn stopped(&self, effect: &str) -> usize {
            self.events
                .iter()
                .filter(|ev| matches!(ev, GameEvent::EffectStopped { name } if *name == effect))
                .count()
        }
    }

    fn live_effects(world: &World) -> usize {
        world.query::<&Effect>().iter().count()
    }

    fn attached() -> (World, PlayerRig, Entity, Entity) {
        let mut world = World::new();
        let player = crate::builder::VesselBuilder::new("Player", Faction::Player)
            .grapple(GrappleConfig::default())
            .player_control(true)
            .build(&mut world);
        let target = crate::builder::VesselBuilder::new("Prize", Faction::Enemy)
            .at(Vec3::new(0.0, 0.0, 20.0))
            .build(&mut world);
        {
            let mut gear = world.get::<&mut GrappleLauncher>(player).unwrap();
            let g = &mut *gear;
            g.grapple
                .launch(Vec3::new(0.0, 1.5, 1.0), Vec3::new(0.0, 1.0, 18.0), &g.config)
                .unwrap();
        }
        let mut events = EventQueue::new();
        for _ in 0..50 {
            grapple_system(&mut world, &mut events, 0.02);
        }
        let rig = PlayerRig {
            vessel: Some(player),
            ..PlayerRig::default()
        };
        (world, rig, player, target)
    }

    #[test]
    fn test_ride_transfers_control() {
        let (mut world, mut rig, player, target) = attached();
        let mut ride = Ride::new();
        ride.tick(&mut world, &mut rig);
        ride.start(&mut world, &mut rig).unwrap();
        assert_eq!(ride.start(&mut world, &mut rig), Err(ZiplineError::AlreadyRiding));
        assert_eq!(live_effects(&world), 2);

        for _ in 0..500 {
            ride.tick(&mut world, &mut rig);
        }
        assert!(!rig.is_riding());
        assert_eq!(rig.vessel, Some(target));
        assert!(!world.get::<&PlayerControl>(player).unwrap().enabled);
        assert!(world.get::<&PlayerControl>(target).unwrap().enabled);
        assert_eq!(*world.get::<&Faction>(target).unwrap(), Faction::Player);
        assert!(!world.get::<&GrappleLauncher>(player).unwrap().grapple.is_attached());
        assert_eq!(ride.stats.vessels_boarded, 1);

        // Arrival ends both transit effects exactly once.
        assert_eq!(live_effects(&world), 0);
        assert_eq!(ride.pool.in_use(PoolTag::Effect), 0);
        assert_eq!(ride.stopped(effects::ZIPLINE_WIND), 1);
        assert_eq!(ride.stopped(effects::ZIPLINE_SPARKS), 1);
    }

    #[test]
    fn test_cancel_restores_viewpoint() {
        let (mut world, mut rig, player, _) = attached();
        let mut ride = Ride::new();
        ride.tick(&mut world, &mut rig);
        let aboard = rig.target_viewpoint;
        ride.start(&mut world, &mut rig).unwrap();
        for _ in 0..20 {
            ride.tick(&mut world, &mut rig);
        }
        assert_ne!(rig.target_viewpoint, aboard);

        assert!(ride.cancel(&mut world, &mut rig));
        assert_eq!(rig.target_viewpoint, aboard);
        assert_eq!(rig.vessel, Some(player));
        assert!(world.get::<&GrappleLauncher>(player).unwrap().grapple.is_attached());
        assert!(!ride.cancel(&mut world, &mut rig));

        assert_eq!(live_effects(&world), 0);
        assert_eq!(ride.pool.in_use(PoolTag::Effect), 0);
        assert_eq!(ride.stopped(effects::ZIPLINE_WIND), 1);
        assert_eq!(ride.stopped(effects::ZIPLINE_SPARKS), 1);
    }

    #[test]
    fn test_ride_without_effect_room() {
        let (mut world, mut rig, _, target) = attached();
        let mut ride = Ride::new();
        ride.pools.effect_capacity = 1;
        ride.pool = ObjectPool::new(&ride.pools);
        ride.tick(&mut world, &mut rig);
        ride.start(&mut world, &mut rig).unwrap();
        assert_eq!(live_effects(&world), 1);
        for _ in 0..500 {
            ride.tick(&mut world, &mut rig);
        }
        assert_eq!(rig.vessel, Some(target));
        assert_eq!(ride.pool.in_use(PoolTag::Effect), 0);
        assert_eq!(ride.stopped(effects::ZIPLINE_SPARKS), 0);
    }

    #[test]
    fn test_requires_attached_grapple() {
        let mut world = World::new();
        let player = crate::builder::VesselBuilder::new("Player", Faction::Player)
            .grapple(GrappleConfig::default())
            .build(&mut world);
        let mut rig = PlayerRig {
            vessel: Some(player),
            ..PlayerRig::default()
        };
        let mut ride = Ride::new();
        assert_eq!(ride.start(&mut world, &mut rig), Err(ZiplineError::NotAttached));
        rig.vessel = None;
        assert_eq!(ride.start(&mut world, &mut rig), Err(ZiplineError::NoController));
        assert_eq!(live_effects(&world), 0);
    }
}
