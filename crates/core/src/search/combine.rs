//! Multi-placement grouping.

use super::{PlacementCandidate, SearchContext};
use crate::geometry::Aabb;
use crate::world::WorldView;

/// Number of highest-damage candidates tried as group seeds.
pub const SEED_COUNT: usize = 5;

const AGENT_HALF_WIDTH: f64 = 0.5;
const AGENT_HEIGHT: f64 = 1.0;

/// Picks up to `wanted` candidates with pairwise disjoint spawn volumes,
/// maximizing summed raw target damage over groups grown from each seed.
///
/// Additions must also stay clear of the agent's own body.
pub fn best_group<W>(
    ctx: &SearchContext<'_, W>,
    pool: Vec<PlacementCandidate>,
    wanted: usize,
) -> Vec<PlacementCandidate>
where
    W: WorldView + ?Sized,
{
    if pool.is_empty() || wanted == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..pool.len()).collect();
    order.sort_by(|&a, &b| {
        pool[b]
            .raw_target_damage(ctx)
            .total_cmp(&pool[a].raw_target_damage(ctx))
    });

    let agent_box = Aabb::anchored(ctx.agent.position, AGENT_HALF_WIDTH, AGENT_HEIGHT);
    let mut best: Option<(f64, Vec<usize>)> = None;

    for &seed in order.iter().take(SEED_COUNT) {
        let mut group = vec![seed];
        let mut occupied = vec![agent_box, pool[seed].spawn_volume()];

        while group.len() < wanted {
            let next = order.iter().copied().find(|i| {
                let volume = pool[*i].spawn_volume();
                !group.contains(i) && occupied.iter().all(|o| !o.intersects(&volume))
            });
            let Some(next) = next else { break };
            occupied.push(pool[next].spawn_volume());
            group.push(next);
        }

        let score: f64 = group.iter().map(|&i| pool[i].raw_target_damage(ctx)).sum();
        if best.as_ref().is_none_or(|(top, _)| score > *top) {
            best = Some((score, group));
        }
    }

    let Some((_, group)) = best else {
        return Vec::new();
    };
    let mut slots: Vec<Option<PlacementCandidate>> = pool.into_iter().map(Some).collect();
    group.into_iter().filter_map(|i| slots[i].take()).collect()
}

/// Greedy prefix of `ordered` whose spawn volumes do not intersect.
pub fn take_non_colliding(ordered: Vec<PlacementCandidate>, wanted: usize) -> Vec<PlacementCandidate> {
    let mut chosen: Vec<PlacementCandidate> = Vec::with_capacity(wanted);
    for candidate in ordered {
        if chosen.len() >= wanted {
            break;
        }
        let volume = candidate.spawn_volume();
        if chosen.iter().all(|c| !c.spawn_volume().intersects(&volume)) {
            chosen.push(candidate);
        }
    }
    chosen
}
