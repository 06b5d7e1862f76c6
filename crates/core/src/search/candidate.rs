use std::cell::OnceCell;

use super::SearchContext;
use crate::geometry::{Aabb, BlockPos, Vec3};
use crate::world::WorldView;

/// A block a detonatable entity could be placed on this cycle.
///
/// Damage values are computed on first use and cached for the lifetime of the
/// candidate, which never outlives one search.
#[derive(Clone, Debug)]
pub struct PlacementCandidate {
    block: BlockPos,
    self_damage: OnceCell<Option<f64>>,
    raw_self_damage: OnceCell<f64>,
    target_damage: OnceCell<Option<f64>>,
    raw_target_damage: OnceCell<f64>,
}

impl PlacementCandidate {
    pub fn new(block: BlockPos) -> Self {
        Self {
            block,
            self_damage: OnceCell::new(),
            raw_self_damage: OnceCell::new(),
            target_damage: OnceCell::new(),
            raw_target_damage: OnceCell::new(),
        }
    }

    pub fn block(&self) -> BlockPos {
        self.block
    }

    /// Explosion origin once the entity is placed.
    pub fn spawn_point(&self) -> Vec3 {
        self.block.spawn_point()
    }

    pub fn spawn_volume(&self) -> Aabb {
        Aabb::spawn_volume(self.block)
    }

    /// Mitigated damage to the agent; `None` when unknown.
    pub fn self_damage<W>(&self, ctx: &SearchContext<'_, W>) -> Option<f64>
    where
        W: WorldView + ?Sized,
    {
        *self.self_damage.get_or_init(|| {
            ctx.model
                .estimate(ctx.world, ctx.agent, self.spawn_point(), false)
        })
    }

    pub fn raw_self_damage<W>(&self, ctx: &SearchContext<'_, W>) -> f64
    where
        W: WorldView + ?Sized,
    {
        *self.raw_self_damage.get_or_init(|| {
            ctx.model
                .estimate(ctx.world, ctx.agent, self.spawn_point(), true)
                .unwrap_or(0.0)
        })
    }

    /// Mitigated damage to the target; `None` when unknown.
    pub fn target_damage<W>(&self, ctx: &SearchContext<'_, W>) -> Option<f64>
    where
        W: WorldView + ?Sized,
    {
        *self.target_damage.get_or_init(|| {
            ctx.model
                .estimate(ctx.world, ctx.target, self.spawn_point(), false)
        })
    }

    pub fn raw_target_damage<W>(&self, ctx: &SearchContext<'_, W>) -> f64
    where
        W: WorldView + ?Sized,
    {
        *self.raw_target_damage.get_or_init(|| {
            ctx.model
                .estimate(ctx.world, ctx.target, self.spawn_point(), true)
                .unwrap_or(0.0)
        })
    }

    /// Self-damage used by safety gates: the raw value stands in when the
    /// mitigated one is unknown, since raw is an upper bound.
    pub fn self_damage_bound<W>(&self, ctx: &SearchContext<'_, W>) -> f64
    where
        W: WorldView + ?Sized,
    {
        self.self_damage(ctx)
            .unwrap_or_else(|| self.raw_self_damage(ctx))
    }

    /// Target damage used for ordering; raw when the mitigated value is unknown.
    pub fn ranking_damage<W>(&self, ctx: &SearchContext<'_, W>) -> f64
    where
        W: WorldView + ?Sized,
    {
        self.target_damage(ctx)
            .unwrap_or_else(|| self.raw_target_damage(ctx))
    }
}

/// Placements chosen for one tick, in execution order.
///
/// Spawn volumes of the contained candidates never intersect.
#[derive(Clone, Debug)]
pub struct PlacementPlan {
    candidates: Vec<PlacementCandidate>,
    used_backup: bool,
}

impl PlacementPlan {
    pub(crate) fn new(candidates: Vec<PlacementCandidate>, used_backup: bool) -> Self {
        debug_assert!(!candidates.is_empty());
        Self {
            candidates,
            used_backup,
        }
    }

    pub fn candidates(&self) -> &[PlacementCandidate] {
        &self.candidates
    }

    pub fn positions(&self) -> Vec<BlockPos> {
        self.candidates.iter().map(PlacementCandidate::block).collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// True when the backup scan produced this plan.
    pub fn used_backup(&self) -> bool {
        self.used_backup
    }

    pub fn is_collision_free(&self) -> bool {
        self.candidates.iter().enumerate().all(|(i, a)| {
            self.candidates[i + 1..]
                .iter()
                .all(|b| !a.spawn_volume().intersects(&b.spawn_volume()))
        })
    }
}
