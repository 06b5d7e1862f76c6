//! In-memory [`GameSession`] backed by a [`BlockGrid`].
//!
//! Placements spawn end crystals immediately, attacks detonate them and apply
//! explosion damage to every profiled player in range. Time advances through
//! an explicit tick counter, driven by [`SimSession::start_ticker`] or by hand
//! through [`SimSession::tick`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crystal_core::{
    Aabb, BlockGrid, BlockKind, BlockPos, DamageModel, EntityId, EntityKind, EntitySnapshot, TargetProfile,
    Vec3, WorldView,
};
use crystal_runtime::{AgentStatus, BlockFace, EntityEvent, GameSession, Hand, Item, SessionError};

use crate::error::SimError;

/// First id handed out to spawned crystals.
const FIRST_SPAWN_ID: u32 = 10_000;

/// Every action the session accepted or refused, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SimAction {
    Equip { item: Item, hand: Hand },
    LookAt(Vec3),
    Place { block: BlockPos, entity: EntityId },
    PlaceRejected { block: BlockPos, reason: String },
    Attack(EntityId),
    Explosion { entity: EntityId, at: Vec3 },
    Damaged { entity: EntityId, amount: f64 },
    Killed(EntityId),
}

#[derive(Debug)]
struct AgentState {
    status: AgentStatus,
    hands: [Option<Item>; 2],
    inventory: HashMap<Item, u32>,
    damage_taken: f64,
}

impl AgentState {
    fn hand_slot(hand: Hand) -> usize {
        match hand {
            Hand::Main => 0,
            Hand::Off => 1,
        }
    }
}

pub struct SimSession {
    world: RwLock<BlockGrid>,
    agent: Mutex<AgentState>,
    profiles: RwLock<HashMap<EntityId, TargetProfile>>,
    entity_feed: broadcast::Sender<EntityEvent>,
    ticks: watch::Sender<u64>,
    next_id: AtomicU32,
    confirm_spawns: AtomicBool,
    fault: Mutex<Option<SessionError>>,
    attack_fault: Mutex<Option<SessionError>>,
    /// Accepted and refused actions, stamped with the tick they happened on.
    actions: Mutex<Vec<(u64, SimAction)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SimSession {
    /// Wraps `world` and inserts the agent's body into it.
    pub fn new(mut world: BlockGrid, agent: AgentStatus) -> Result<Self, SimError> {
        if !agent.profile.is_player() {
            return Err(SimError::AgentNotPlayer(agent.profile.kind.to_string()));
        }
        let mut body = EntitySnapshot::player(agent.id(), agent.profile.name.clone(), agent.position());
        body.team = agent.team.clone();
        world.spawn(body)?;

        Ok(Self {
            world: RwLock::new(world),
            agent: Mutex::new(AgentState {
                status: agent,
                hands: [None, None],
                inventory: HashMap::new(),
                damage_taken: 0.0,
            }),
            profiles: RwLock::new(HashMap::new()),
            entity_feed: broadcast::channel(256).0,
            ticks: watch::channel(0).0,
            next_id: AtomicU32::new(FIRST_SPAWN_ID),
            confirm_spawns: AtomicBool::new(true),
            fault: Mutex::new(None),
            attack_fault: Mutex::new(None),
            actions: Mutex::new(Vec::new()),
        })
    }

    /// Adds a player with a full combat profile.
    pub fn add_player(&self, profile: TargetProfile, team: Option<&str>) -> Result<(), SimError> {
        let mut body = EntitySnapshot::player(profile.id, profile.name.clone(), profile.position);
        body.team = team.map(str::to_owned);
        self.write_world().spawn(body.clone())?;
        self.profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.id, profile);
        let _ = self.entity_feed.send(EntityEvent::Spawned(body));
        Ok(())
    }

    /// Adds a bare entity without a combat profile.
    pub fn add_entity(&self, entity: EntitySnapshot) -> Result<(), SimError> {
        self.write_world().spawn(entity.clone())?;
        let _ = self.entity_feed.send(EntityEvent::Spawned(entity));
        Ok(())
    }

    /// Removes an entity as if it left render distance.
    pub fn remove_entity(&self, id: EntityId) -> Result<(), SimError> {
        let gone = self.write_world().despawn(id)?;
        let _ = self.entity_feed.send(EntityEvent::Gone(gone));
        Ok(())
    }

    pub fn give(&self, item: Item, count: u32) {
        *lock(&self.agent).inventory.entry(item).or_default() += count;
    }

    pub fn hold(&self, hand: Hand, item: Option<Item>) {
        lock(&self.agent).hands[AgentState::hand_slot(hand)] = item;
    }

    pub fn item_count(&self, item: Item) -> u32 {
        lock(&self.agent).inventory.get(&item).copied().unwrap_or(0)
    }

    /// When disabled, placements succeed but no spawn notification is sent.
    pub fn set_confirm_spawns(&self, confirm: bool) {
        self.confirm_spawns.store(confirm, Ordering::Relaxed);
    }

    /// Makes every following placement fail with `fault` until cleared.
    pub fn set_place_fault(&self, fault: Option<SessionError>) {
        *lock(&self.fault) = fault;
    }

    /// Makes the next attack fail with `fault`, leaving the entity in place.
    pub fn fail_next_attack(&self, fault: SessionError) {
        *lock(&self.attack_fault) = Some(fault);
    }

    pub fn health(&self, id: EntityId) -> Option<f64> {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .and_then(|profile| profile.health)
    }

    /// Explosion damage the agent would have taken so far.
    pub fn agent_damage_taken(&self) -> f64 {
        lock(&self.agent).damage_taken
    }

    pub fn actions(&self) -> Vec<SimAction> {
        lock(&self.actions).iter().map(|(_, action)| action.clone()).collect()
    }

    /// Actions paired with the tick count at the moment they were taken.
    pub fn timeline(&self) -> Vec<(u64, SimAction)> {
        lock(&self.actions).clone()
    }

    /// Replaces a block, e.g. to break a pad mid-fight.
    pub fn set_block(&self, pos: BlockPos, kind: BlockKind) {
        self.write_world().set(pos, kind);
    }

    pub fn tick_count(&self) -> u64 {
        *self.ticks.borrow()
    }

    /// Advances the world by one tick.
    pub fn tick(&self) {
        self.ticks.send_modify(|tick| *tick += 1);
    }

    /// Advances one tick every `period` until the session is dropped.
    pub fn start_ticker(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let session = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                match session.upgrade() {
                    Some(session) => session.tick(),
                    None => break,
                }
            }
        })
    }

    fn write_world(&self) -> std::sync::RwLockWriteGuard<'_, BlockGrid> {
        self.world.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, action: SimAction) {
        let tick = self.tick_count();
        trace!(target: "crystal::sim", tick, ?action, "action");
        lock(&self.actions).push((tick, action));
    }

    fn reject(&self, block: BlockPos, reason: impl Into<String>) -> SessionError {
        let reason = reason.into();
        self.record(SimAction::PlaceRejected {
            block,
            reason: reason.clone(),
        });
        SessionError::Rejected(reason)
    }

    fn spawn_crystal(&self, block: BlockPos) -> Result<EntitySnapshot, SessionError> {
        let id = EntityId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let crystal = EntitySnapshot::end_crystal(id, block.spawn_point());

        let mut world = self.write_world();
        match world.block_at(block) {
            Some(kind) if kind.supports_placement() => {}
            _ => return Err(self.reject(block, format!("cannot place on {block}"))),
        }
        if !world.is_air(block.above()) {
            return Err(self.reject(block, "no room above"));
        }
        let cell = Aabb::placement_cell(block);
        if world.entities().iter().any(|e| e.hitbox().intersects(&cell)) {
            return Err(self.reject(block, "placement cell obstructed"));
        }
        world
            .spawn(crystal.clone())
            .map_err(|err| SessionError::Internal(err.to_string()))?;
        Ok(crystal)
    }

    /// Detonates `crystal` and applies its damage to everyone in range.
    fn explode(&self, crystal: EntitySnapshot) {
        let mut world = self.write_world();
        if world.despawn(crystal.id).is_err() {
            return;
        }
        let _ = self.entity_feed.send(EntityEvent::Gone(crystal.clone()));
        self.record(SimAction::Explosion {
            entity: crystal.id,
            at: crystal.position,
        });

        let mut agent = lock(&self.agent);
        let model = DamageModel::new(agent.status.rules.difficulty);
        let mut agent_profile = agent.status.profile.clone();
        if let Some(body) = world.entity(agent_profile.id) {
            agent_profile.position = body.position;
        }
        let to_agent = model
            .estimate(&*world, &agent_profile, crystal.position, false)
            .unwrap_or_else(|| model.raw(&*world, agent_profile.position, crystal.position));
        agent.damage_taken += to_agent;
        drop(agent);

        let mut profiles = self.profiles.write().unwrap_or_else(PoisonError::into_inner);
        let mut killed = Vec::new();
        for profile in profiles.values_mut() {
            let Some(body) = world.entity(profile.id) else {
                continue;
            };
            profile.position = body.position;
            let damage = model
                .estimate(&*world, profile, crystal.position, false)
                .unwrap_or_else(|| model.raw(&*world, profile.position, crystal.position));
            if damage <= 0.0 {
                continue;
            }
            self.record(SimAction::Damaged {
                entity: profile.id,
                amount: damage,
            });
            if let Some(health) = profile.health.as_mut() {
                *health -= damage;
                if *health <= 0.0 {
                    killed.push(profile.id);
                }
            }
        }
        for id in killed {
            profiles.remove(&id);
            if let Ok(body) = world.despawn(id) {
                debug!(target: "crystal::sim", entity = %id, "player killed");
                self.record(SimAction::Killed(id));
                let _ = self.entity_feed.send(EntityEvent::Gone(body));
            }
        }
    }
}

#[async_trait]
impl GameSession for SimSession {
    fn with_world<R>(&self, read: impl FnOnce(&dyn WorldView) -> R) -> R {
        let world = self.world.read().unwrap_or_else(PoisonError::into_inner);
        read(&*world)
    }

    fn agent(&self) -> AgentStatus {
        let mut status = lock(&self.agent).status.clone();
        if let Some(body) = self.with_world(|world| {
            world.entities().into_iter().find(|e| e.id == status.id())
        }) {
            status.profile.position = body.position;
        }
        status
    }

    fn target_profile(&self, id: EntityId) -> Option<TargetProfile> {
        let body = self.with_world(|world| world.entities().into_iter().find(|e| e.id == id))?;
        let profiles = self.profiles.read().unwrap_or_else(PoisonError::into_inner);
        let mut profile = profiles.get(&id)?.clone();
        profile.position = body.position;
        Some(profile)
    }

    fn held_item(&self, hand: Hand) -> Option<Item> {
        lock(&self.agent).hands[AgentState::hand_slot(hand)]
    }

    fn has_item(&self, item: Item) -> bool {
        self.item_count(item) > 0
    }

    fn subscribe_entities(&self) -> broadcast::Receiver<EntityEvent> {
        self.entity_feed.subscribe()
    }

    async fn equip(&self, item: Item, hand: Hand) -> Result<(), SessionError> {
        let mut agent = lock(&self.agent);
        if agent.inventory.get(&item).copied().unwrap_or(0) == 0 {
            return Err(SessionError::ItemMissing(item));
        }
        agent.hands[AgentState::hand_slot(hand)] = Some(item);
        drop(agent);
        self.record(SimAction::Equip { item, hand });
        Ok(())
    }

    async fn look_at(&self, point: Vec3) -> Result<(), SessionError> {
        self.record(SimAction::LookAt(point));
        Ok(())
    }

    async fn place_entity(&self, against: BlockPos, face: BlockFace, hand: Hand) -> Result<(), SessionError> {
        if let Some(fault) = lock(&self.fault).clone() {
            return Err(fault);
        }
        if face != BlockFace::Up {
            return Err(self.reject(against, format!("cannot place against {face:?} face")));
        }

        let slot = AgentState::hand_slot(hand);
        {
            let agent = lock(&self.agent);
            let held = agent.hands[slot];
            let stock = held.and_then(|item| agent.inventory.get(&item).copied()).unwrap_or(0);
            if !held.is_some_and(Item::is_detonatable) || stock == 0 {
                return Err(SessionError::ItemMissing(Item::EndCrystal));
            }
        }

        let crystal = self.spawn_crystal(against)?;

        {
            let mut agent = lock(&self.agent);
            let remaining = agent.inventory.entry(Item::EndCrystal).or_default();
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                agent.hands[slot] = None;
            }
        }
        self.record(SimAction::Place {
            block: against,
            entity: crystal.id,
        });
        if self.confirm_spawns.load(Ordering::Relaxed) {
            let _ = self.entity_feed.send(EntityEvent::Spawned(crystal));
        }
        Ok(())
    }

    async fn attack(&self, entity: EntityId) -> Result<(), SessionError> {
        let target = self
            .with_world(|world| world.entities().into_iter().find(|e| e.id == entity))
            .ok_or(SessionError::EntityMissing(entity))?;
        if let Some(fault) = lock(&self.attack_fault).take() {
            return Err(fault);
        }
        self.record(SimAction::Attack(entity));
        match target.kind {
            EntityKind::Detonatable => {
                self.explode(target);
                Ok(())
            }
            kind => Err(SessionError::Rejected(format!("{kind} does not react to attacks"))),
        }
    }

    async fn wait_ticks(&self, ticks: u32) {
        let mut rx = self.ticks.subscribe();
        let until = *rx.borrow_and_update() + u64::from(ticks);
        let _ = rx.wait_for(|tick| *tick >= until).await;
    }
}
