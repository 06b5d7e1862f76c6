//! Detonation shared by the cycle and the fast-break listener.

use tracing::debug;

use crystal_core::{EntitySnapshot, SafetyMode};

use crate::api::{GameSession, Result};
use crate::events::ActionEvent;
use crate::scheduler::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Detonation {
    Detonated,
    /// The break-mode gate judged the explosion too costly for the agent.
    Skipped,
    /// The session refused the attack; the entity may still be there.
    Rejected,
}

/// Attacks `entity` unless the break-mode gate forbids it.
///
/// Transient session failures come back as [`Detonation::Rejected`]; anything
/// else is returned as an error for the caller to fault on.
pub(crate) async fn detonate<S: GameSession>(
    scheduler: &Scheduler<S>,
    entity: &EntitySnapshot,
) -> Result<Detonation> {
    let session = scheduler.session();
    let config = scheduler.config();
    let agent = session.agent();

    if config.break_mode == SafetyMode::Safe && !agent.rules.ignores_self_damage() {
        let model = config.damage_model(agent.rules.difficulty);
        let self_damage = session.with_world(|world| {
            model
                .estimate(world, &agent.profile, entity.position, false)
                .or_else(|| model.estimate(world, &agent.profile, entity.position, true))
                .unwrap_or(0.0)
        });
        let too_much = self_damage >= config.max_self_damage
            || agent.profile.health.is_some_and(|health| self_damage > health);
        if too_much {
            debug!(target: "crystal::cycle", entity = %entity.id, self_damage, "detonation skipped");
            scheduler.bus().publish(ActionEvent::DetonationSkipped {
                entity: entity.id,
                self_damage,
            });
            return Ok(Detonation::Skipped);
        }
    }

    let attacked = match session.look_at(entity.position).await {
        Ok(()) => session.attack(entity.id).await,
        Err(err) => Err(err),
    };
    match attacked {
        Ok(()) => {
            scheduler
                .bus()
                .publish(ActionEvent::Detonated { entity: entity.id });
            Ok(Detonation::Detonated)
        }
        Err(err) if err.is_transient() => {
            debug!(target: "crystal::cycle", entity = %entity.id, error = %err, "detonation rejected");
            Ok(Detonation::Rejected)
        }
        Err(err) => Err(err.into()),
    }
}
