//! Ready-made duel setup used by the demo and the integration tests.
//!
//! A flat stone floor at y=64 with a handful of obsidian pads between an
//! armored agent at the origin and an unarmored opponent five blocks east.

use crystal_core::{
    ArmorPiece, ArmorSlot, Attribute, BlockGrid, BlockKind, BlockPos, EntityId, EntitySnapshot,
    GameRules, TargetProfile, Vec3,
};
use crystal_runtime::{AgentStatus, Hand, Item};

use crate::error::SimError;
use crate::session::SimSession;

pub const AGENT_ID: EntityId = EntityId(1);
pub const TARGET_ID: EntityId = EntityId(2);

pub const AGENT_POSITION: Vec3 = Vec3::new(0.5, 65.0, 0.5);
pub const TARGET_POSITION: Vec3 = Vec3::new(5.5, 65.0, 0.5);

/// Obsidian pads; all within five blocks of the agent.
pub const PADS: [BlockPos; 3] = [
    BlockPos::new(3, 64, 3),
    BlockPos::new(4, 64, 2),
    BlockPos::new(3, 64, -3),
];

pub const STARTING_CRYSTALS: u32 = 64;

pub fn duel_world() -> Result<BlockGrid, SimError> {
    let mut world = BlockGrid::new();
    world.fill(BlockPos::new(-10, 64, -10), BlockPos::new(10, 64, 10), BlockKind::Solid)?;
    for pad in PADS {
        world.set(pad, BlockKind::Obsidian);
    }
    Ok(world)
}

/// Agent in full protection IV netherite with resistance III.
pub fn armored_agent() -> AgentStatus {
    let body = EntitySnapshot::player(AGENT_ID, "agent", AGENT_POSITION);
    let mut profile = TargetProfile::from_entity(&body)
        .with_health(20.0)
        .with_armor(Attribute::new(20.0), Attribute::new(12.0))
        .with_resistance(3);
    for slot in [ArmorSlot::Head, ArmorSlot::Torso, ArmorSlot::Legs, ArmorSlot::Feet] {
        profile = profile.with_piece(slot, ArmorPiece::new(4, 0));
    }
    AgentStatus {
        profile,
        team: None,
        rules: GameRules::default(),
    }
}

/// Unarmored opponent. `None` health means the session never learns it.
pub fn opponent(health: Option<f64>) -> TargetProfile {
    let body = EntitySnapshot::player(TARGET_ID, "opponent", TARGET_POSITION);
    let mut profile =
        TargetProfile::from_entity(&body).with_armor(Attribute::new(0.0), Attribute::new(0.0));
    profile.health = health;
    profile
}

/// Session with both players in place and a stack of crystals in the main hand.
pub fn duel(target_health: Option<f64>) -> Result<SimSession, SimError> {
    let session = SimSession::new(duel_world()?, armored_agent())?;
    session.add_player(opponent(target_health), None)?;
    session.give(Item::EndCrystal, STARTING_CRYSTALS);
    session.hold(Hand::Main, Some(Item::EndCrystal));
    Ok(session)
}
