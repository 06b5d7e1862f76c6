//! Pure decision core for automated end-crystal combat.
//!
//! Everything here is synchronous and side-effect free: an explosion damage
//! model, a placement search over a read-only [`WorldView`], and safe-hole
//! detection. The async scheduler that drives a live session lives in
//! `crystal-runtime`.

pub mod attributes;
pub mod damage;
pub mod entity;
pub mod game;
pub mod geometry;
pub mod holes;
pub mod profile;
pub mod search;
pub mod world;

pub use attributes::{Attribute, AttributeModifier, ModifierOperation};
pub use damage::{DamageModel, END_CRYSTAL_POWER, MODERN_DAMAGE_MULTIPLIER, exposure};
pub use entity::{EntityId, EntityKind, EntitySnapshot};
pub use game::{Difficulty, GameMode, GameRules};
pub use geometry::{Aabb, BlockPos, Vec3};
pub use holes::{HoleMode, find_holes, is_hole, is_in_hole};
pub use profile::{ArmorPiece, ArmorSlot, TargetProfile};
pub use search::{
    PlacementCandidate, PlacementPlan, PlacementPriority, SafetyMode, SearchContext, SearchSettings,
    find_candidates, possible_positions,
};
pub use world::{BlockGrid, BlockKind, WorldError, WorldView};
