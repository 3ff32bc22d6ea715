//! Reusable project components and the canonical job bodies built from them.
//!
//! Every component issues at most one mutating host action per call and
//! suspends with [`Step::Continue`] while its goal is not met. A component
//! that ends the project with a transaction still attached to its cursor
//! cancels that transaction first, since the cursor is cleared on
//! completion.
//!
//! # Projects
//!
//! - [`build_fetch_resource_and_do_something_project`]: drop foreign cargo,
//!   fetch the job's resource, walk to the target, work until out of it.
//! - [`transfer_project`]: haul a resource list from one store to another.
//! - [`controller_project`]: walk to a room and claim or reserve its
//!   controller.
//! - [`scout_project`]: walk to a room.

use std::rc::Rc;

use tracing::{debug, warn};

use hive_ledger::TransactionBuilder;
use hive_resources::QueryOptions;
use hive_types::{ActionCode, ObjectId, ObjectKind, Position, ResourceType, RoomName, TransactionId};
use hive_world::World;
use hive_world::state::ADJACENT_RANGE;

use crate::project::{Component, JobContext, Project, Step, StepData, component, pass};
use crate::services::Services;
use crate::signal::JobSignal;
use crate::task::TaskData;

/// Units a job still needs, computed from the live world each time.
pub type AmountFn = Rc<dyn Fn(&dyn World, &TaskData) -> u32>;

/// Wrap a closure as an [`AmountFn`].
pub fn amount_fn<F>(f: F) -> AmountFn
where
    F: Fn(&dyn World, &TaskData) -> u32 + 'static,
{
    Rc::new(f)
}

/// What a worker does once it stands next to the job's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkAction {
    /// Spend energy on a construction site.
    Build,
    /// Spend energy restoring hits.
    Repair,
    /// Put the carried resource into the target; the target pays for it.
    Deliver,
}

/// Parameters of a fetch-and-work job body.
#[derive(Clone)]
pub struct FetchAndDo {
    /// Resource fetched and worked with.
    pub resource: ResourceType,
    /// Range at which `action` works.
    pub range: u32,
    /// How sources are searched.
    pub fetch: QueryOptions,
    /// Units still needed.
    pub amount: AmountFn,
    /// Work done at the target.
    pub action: WorkAction,
}

impl core::fmt::Debug for FetchAndDo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FetchAndDo")
            .field("resource", &self.resource)
            .field("range", &self.range)
            .field("fetch", &self.fetch)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

// ---- helpers ----

/// Units of `resource` the worker carries and its free capacity.
fn cargo(world: &dyn World, worker: ObjectId, resource: ResourceType) -> Option<(u32, u32)> {
    world
        .object(worker)
        .map(|o| (o.stored(resource), o.free_capacity()))
}

fn worker_pos(world: &dyn World, worker: ObjectId) -> Option<Position> {
    world.object(worker).map(|o| o.pos.clone())
}

/// Cancel the transaction attached to the cursor, if any.
fn abandon(services: &mut Services<'_>, carry: &StepData) {
    if let Some(tx) = carry.transaction {
        services.resources.cancel(services.ledger, tx);
    }
}

/// Flag the job unreachable and keep workers out of `room` for a while.
fn unreachable(services: &mut Services<'_>, ctx: &mut JobContext<'_>, room: &RoomName) -> Step {
    abandon(services, ctx.carry);
    ctx.data.unreachable = true;
    let until = services
        .tick()
        .saturating_add(services.settings.unreachable_ticks);
    services.world.mark_unreachable(room, until);
    warn!(worker = %ctx.worker, room = %room, until, "destination unreachable");
    Step::signal(JobSignal::NoPath)
}

/// Walk toward `target`. Emits `Ok` with `data` once within `range`.
fn travel(
    services: &mut Services<'_>,
    ctx: &mut JobContext<'_>,
    target: &Position,
    range: u32,
    data: StepData,
) -> Step {
    let Some(here) = worker_pos(&*services.world, ctx.worker) else {
        abandon(services, ctx.carry);
        return Step::signal(JobSignal::NotFound);
    };
    if here.in_range_to(target, range) {
        return Step::with(JobSignal::Ok, data);
    }
    match services.world.move_to(ctx.worker, target, range) {
        ActionCode::Ok => Step::Continue,
        ActionCode::NoPath => unreachable(services, ctx, &target.room),
        code => {
            abandon(services, ctx.carry);
            Step::signal(code.into())
        }
    }
}

/// Pay `seller` for `amount` units handed to `buyer` on the spot.
fn pay(
    services: &mut Services<'_>,
    buyer: ObjectId,
    seller: ObjectId,
    resource: ResourceType,
    amount: u32,
) {
    if amount == 0 {
        return;
    }
    let built = TransactionBuilder::new(buyer, seller)
        .resource(resource, amount)
        .money(services.settings.price(amount))
        .tick(services.tick())
        .build();
    let Ok(tx) = built else {
        return;
    };
    let id = services.ledger.open(tx);
    if services.ledger.confirm(id, amount) {
        services.ledger.done(id);
    }
}

/// Take the job's transactions for `resource` out of its payload.
fn split_off_resource(
    services: &Services<'_>,
    data: &mut TaskData,
    resource: ResourceType,
) -> Vec<TransactionId> {
    let ledger = &*services.ledger;
    let (matching, rest): (Vec<_>, Vec<_>) = data.transactions.iter().copied().partition(|id| {
        ledger
            .transaction(*id)
            .is_some_and(|tx| tx.resource() == resource)
    });
    data.transactions = rest;
    matching
}

/// Complete the job's transactions for a resource whose list entry ran out.
fn settle_resource(services: &mut Services<'_>, data: &mut TaskData, resource: ResourceType) {
    for id in split_off_resource(services, data, resource) {
        services.resources.done(services.ledger, id);
    }
}

/// Cancel the job's transactions for a resource the source no longer has.
fn cancel_resource(services: &mut Services<'_>, data: &mut TaskData, resource: ResourceType) {
    for id in split_off_resource(services, data, resource) {
        services.resources.cancel(services.ledger, id);
    }
}

fn controller_in(world: &dyn World, room: &RoomName) -> Option<(ObjectId, Position)> {
    world
        .room_objects(room)
        .into_iter()
        .find(|o| o.kind == ObjectKind::Controller)
        .map(|o| (o.id, o.pos.clone()))
}

// ---- fetch and work ----

/// Drop everything carried that is not `resource`.
pub fn drop_foreign(resource: ResourceType) -> Component {
    component(move |services, ctx| {
        let foreign: Vec<ResourceType> = services
            .world
            .object(ctx.worker)
            .and_then(|o| o.store.as_ref())
            .map(|store| {
                store
                    .carried()
                    .filter(|(r, _)| *r != resource)
                    .map(|(r, _)| r)
                    .collect()
            })
            .unwrap_or_default();
        for r in foreign {
            let code = services.world.drop_resource(ctx.worker, r, None);
            debug!(worker = %ctx.worker, resource = ?r, code = ?code, "dropped foreign cargo");
        }
        Step::signal(JobSignal::Ok)
    })
}

/// `Done` when nothing is needed, `Full` when the worker already carries
/// enough, otherwise `Ok` with the shortfall to fetch.
pub fn check_store(resource: ResourceType, amount: AmountFn) -> Component {
    component(move |services, ctx| {
        let need = amount(&*services.world, &*ctx.data);
        if need == 0 {
            return Step::signal(JobSignal::Done);
        }
        let Some((carried, free)) = cargo(&*services.world, ctx.worker, resource) else {
            return Step::signal(JobSignal::NotFound);
        };
        let mut data = StepData {
            resource: Some(resource),
            ..StepData::default()
        };
        if carried >= need || free == 0 {
            data.amount = carried;
            return Step::with(JobSignal::Full, data);
        }
        data.amount = need.saturating_sub(carried).min(free);
        Step::with(JobSignal::Ok, data)
    })
}

/// Find a source for the shortfall and pay for it up front.
///
/// A store is bought through a confirmed transaction, which reserves the
/// amount against other jobs. Harvestable deposits need no transaction. A
/// confirm refused because the stock moved since the query retries next
/// tick.
pub fn find_source(resource: ResourceType, fetch: QueryOptions) -> Component {
    component(move |services, ctx| {
        let wanted = ctx.carry.amount;
        let hit = services
            .resources
            .query(&*services.world, ctx.worker, resource, wanted, &fetch);
        let Some(hit) = hit else {
            let carried = cargo(&*services.world, ctx.worker, resource).map_or(0, |(c, _)| c);
            if carried > 0 {
                let data = StepData {
                    resource: Some(resource),
                    amount: carried,
                    ..StepData::default()
                };
                return Step::with(JobSignal::Full, data);
            }
            return Step::signal(JobSignal::NotFound);
        };

        let mut data = StepData {
            target: Some(hit.object),
            resource: Some(resource),
            amount: wanted,
            ..StepData::default()
        };
        if hit.harvest {
            data.harvest = true;
            return Step::with(JobSignal::Ok, data);
        }

        let amount = wanted.min(hit.available);
        let built = TransactionBuilder::new(ctx.worker, hit.object)
            .resource(resource, amount)
            .money(services.settings.price(amount))
            .cancel_fee(services.settings.cancel_fee)
            .tick(services.tick())
            .build();
        let Ok(tx) = built else {
            return Step::signal(JobSignal::Invalid);
        };
        let id = services.ledger.open(tx);
        if !services.resources.confirm(services.ledger, &*services.world, id) {
            services.resources.cancel(services.ledger, id);
            return Step::Continue;
        }
        debug!(worker = %ctx.worker, source = %hit.object, transaction = %id, amount, "source reserved");
        data.transaction = Some(id);
        data.amount = amount;
        Step::with(JobSignal::Ok, data)
    })
}

/// Walk to the object named by the incoming data.
pub fn move_to_carry(range: u32) -> Component {
    component(move |services, ctx| {
        let pos = ctx
            .carry
            .target
            .and_then(|id| worker_pos(&*services.world, id));
        let Some(pos) = pos else {
            abandon(services, ctx.carry);
            return Step::signal(JobSignal::NotFound);
        };
        let data = ctx.carry.clone();
        travel(services, ctx, &pos, range, data)
    })
}

/// Walk to the job's target.
pub fn move_to_object(range: u32) -> Component {
    component(move |services, ctx| {
        let pos = ctx
            .data
            .target
            .and_then(|id| worker_pos(&*services.world, id));
        let Some(pos) = pos else {
            abandon(services, ctx.carry);
            return Step::signal(JobSignal::NotFound);
        };
        let data = ctx.carry.clone();
        travel(services, ctx, &pos, range, data)
    })
}

/// Withdraw the paid amount, or harvest until full. Emits `Full` once the
/// worker has its cargo.
pub fn withdraw_or_harvest(resource: ResourceType) -> Component {
    component(move |services, ctx| {
        let Some(source) = ctx.carry.target else {
            return Step::signal(JobSignal::NotFound);
        };
        let Some((carried, free)) = cargo(&*services.world, ctx.worker, resource) else {
            abandon(services, ctx.carry);
            return Step::signal(JobSignal::NotFound);
        };

        if ctx.carry.harvest {
            if free == 0 {
                return Step::with(JobSignal::Full, ctx.carry.clone());
            }
            return match services.world.harvest(ctx.worker, source) {
                ActionCode::Ok => Step::Continue,
                ActionCode::NotEnoughResources if carried > 0 => {
                    Step::with(JobSignal::Full, ctx.carry.clone())
                }
                ActionCode::NotEnoughResources => Step::Continue,
                code => Step::signal(code.into()),
            };
        }

        let stock = services.world.object(source).map_or(0, |o| o.stored(resource));
        let wanted = ctx.carry.amount.min(free).min(stock);
        if wanted == 0 {
            abandon(services, ctx.carry);
            if carried > 0 {
                let data = StepData {
                    transaction: None,
                    ..ctx.carry.clone()
                };
                return Step::with(JobSignal::Full, data);
            }
            return Step::signal(JobSignal::Empty);
        }

        match services.world.withdraw(ctx.worker, source, resource, Some(wanted)) {
            ActionCode::Ok => {
                if let Some(tx) = ctx.carry.transaction {
                    services.resources.done(services.ledger, tx);
                }
                let data = StepData {
                    transaction: None,
                    amount: wanted,
                    ..ctx.carry.clone()
                };
                Step::with(JobSignal::Full, data)
            }
            code => {
                abandon(services, ctx.carry);
                Step::signal(code.into())
            }
        }
    })
}

/// Work at the job's target until the action stops returning `Ok`.
pub fn act(action: WorkAction, resource: ResourceType) -> Component {
    component(move |services, ctx| {
        let Some(target) = ctx.data.target else {
            return Step::signal(JobSignal::NotFound);
        };
        let code = match action {
            WorkAction::Build => services.world.build(ctx.worker, target),
            WorkAction::Repair => services.world.repair(ctx.worker, target),
            WorkAction::Deliver => return deliver(services, ctx, target, resource),
        };
        match code {
            ActionCode::Ok => Step::Continue,
            code => Step::signal(code.into()),
        }
    })
}

fn deliver(
    services: &mut Services<'_>,
    ctx: &mut JobContext<'_>,
    target: ObjectId,
    resource: ResourceType,
) -> Step {
    let Some((before, _)) = cargo(&*services.world, ctx.worker, resource) else {
        return Step::signal(JobSignal::NotFound);
    };
    let wanted = if ctx.data.list.is_empty() {
        before
    } else {
        before.min(ctx.data.remaining(resource))
    };
    if before == 0 {
        return Step::signal(JobSignal::Empty);
    }
    if wanted == 0 {
        return Step::signal(JobSignal::Done);
    }
    match services
        .world
        .transfer(ctx.worker, target, resource, Some(wanted))
    {
        ActionCode::Ok => {
            let after = cargo(&*services.world, ctx.worker, resource).map_or(0, |(c, _)| c);
            let moved = before.saturating_sub(after);
            ctx.data.deliver(resource, moved);
            pay(services, target, ctx.worker, resource, moved);
            debug!(worker = %ctx.worker, target = %target, resource = ?resource, moved, "delivered");
            Step::Continue
        }
        code => Step::signal(code.into()),
    }
}

/// The standard walk-and-work job body.
///
/// | layer | key          | component                    |
/// |-------|--------------|------------------------------|
/// | 0     | Ok, Empty    | [`drop_foreign`]             |
/// | 1     | Ok           | [`check_store`]              |
/// | 2     | Ok / Full    | [`find_source`] / pass       |
/// | 3     | Ok / Full    | [`move_to_carry`] / pass     |
/// | 4     | Ok / Full    | [`withdraw_or_harvest`] / pass |
/// | 5     | Full         | [`move_to_object`]           |
/// | 6     | Ok           | [`act`]                      |
///
/// `Empty` from the last layer loops back to refetch.
pub fn build_fetch_resource_and_do_something_project(spec: &FetchAndDo) -> Project {
    let resource = spec.resource;
    Project::new()
        .layer(vec![
            (JobSignal::Ok, drop_foreign(resource)),
            (JobSignal::Empty, drop_foreign(resource)),
        ])
        .layer(vec![(JobSignal::Ok, check_store(resource, Rc::clone(&spec.amount)))])
        .layer(vec![
            (JobSignal::Ok, find_source(resource, spec.fetch.clone())),
            (JobSignal::Full, pass(JobSignal::Full)),
        ])
        .layer(vec![
            (JobSignal::Ok, move_to_carry(ADJACENT_RANGE)),
            (JobSignal::Full, pass(JobSignal::Full)),
        ])
        .layer(vec![
            (JobSignal::Ok, withdraw_or_harvest(resource)),
            (JobSignal::Full, pass(JobSignal::Full)),
        ])
        .layer(vec![(JobSignal::Full, move_to_object(spec.range))])
        .layer(vec![(JobSignal::Ok, act(spec.action, resource))])
        .cyclize(JobSignal::Empty)
}

// ---- transfer ----

/// Choose the next resource to haul. Prefers one the worker already
/// carries and drops cargo that is not on the list. `Done` when the list is
/// empty.
pub fn pick_transfer() -> Component {
    component(|services, ctx| {
        let Some(from) = ctx.data.source else {
            return Step::signal(JobSignal::NotFound);
        };
        let carried: Vec<(ResourceType, u32)> = services
            .world
            .object(ctx.worker)
            .and_then(|o| o.store.as_ref())
            .map(|s| s.carried().collect())
            .unwrap_or_default();

        for (r, _) in carried.iter().filter(|(r, _)| ctx.data.remaining(*r) == 0) {
            let code = services.world.drop_resource(ctx.worker, *r, None);
            debug!(worker = %ctx.worker, resource = ?r, code = ?code, "dropped cargo off the list");
        }

        let held = carried
            .iter()
            .map(|(r, _)| *r)
            .find(|r| ctx.data.remaining(*r) > 0);
        let Some(resource) = held.or_else(|| ctx.data.list.keys().next().copied()) else {
            return Step::signal(JobSignal::Done);
        };
        let Some((have, free)) = cargo(&*services.world, ctx.worker, resource) else {
            return Step::signal(JobSignal::NotFound);
        };

        let data = StepData {
            target: Some(from),
            resource: Some(resource),
            amount: ctx.data.remaining(resource).min(have.saturating_add(free)),
            ..StepData::default()
        };
        if have >= data.amount || free == 0 {
            return Step::with(JobSignal::Full, data);
        }
        Step::with(JobSignal::Ok, data)
    })
}

/// Withdraw the chosen resource from the giving store.
pub fn withdraw_for_transfer() -> Component {
    component(|services, ctx| {
        let (Some(from), Some(resource)) = (ctx.carry.target, ctx.carry.resource) else {
            return Step::signal(JobSignal::NotFound);
        };
        let Some((have, free)) = cargo(&*services.world, ctx.worker, resource) else {
            return Step::signal(JobSignal::NotFound);
        };
        let stock = services.world.object(from).map_or(0, |o| o.stored(resource));
        let wanted = ctx.carry.amount.saturating_sub(have).min(free).min(stock);
        if wanted == 0 {
            if have > 0 {
                return Step::with(JobSignal::Full, ctx.carry.clone());
            }
            ctx.data.list.remove(&resource);
            cancel_resource(services, ctx.data, resource);
            debug!(worker = %ctx.worker, from = %from, resource = ?resource, "transfer source ran dry");
            return Step::signal(JobSignal::Empty);
        }
        match services.world.withdraw(ctx.worker, from, resource, Some(wanted)) {
            ActionCode::Ok => Step::with(JobSignal::Full, ctx.carry.clone()),
            code => Step::signal(code.into()),
        }
    })
}

/// Put the carried resource into the receiving store and tick it off the
/// list. A resource whose entry reaches zero completes its transactions.
pub fn deliver_transfer() -> Component {
    component(|services, ctx| {
        let (Some(resource), Some(to)) = (ctx.carry.resource, ctx.data.target) else {
            return Step::signal(JobSignal::NotFound);
        };
        let Some((before, _)) = cargo(&*services.world, ctx.worker, resource) else {
            return Step::signal(JobSignal::NotFound);
        };
        let wanted = before.min(ctx.data.remaining(resource));
        if wanted == 0 {
            return Step::signal(JobSignal::Ok);
        }
        match services.world.transfer(ctx.worker, to, resource, Some(wanted)) {
            ActionCode::Ok => {
                let after = cargo(&*services.world, ctx.worker, resource).map_or(0, |(c, _)| c);
                let moved = before.saturating_sub(after);
                ctx.data.deliver(resource, moved);
                if ctx.data.remaining(resource) == 0 {
                    settle_resource(services, ctx.data, resource);
                }
                debug!(worker = %ctx.worker, to = %to, resource = ?resource, moved, "transfer leg delivered");
                Step::signal(JobSignal::Ok)
            }
            code => Step::signal(code.into()),
        }
    })
}

/// Haul the job's list from `data.source` to `data.target`, looping until
/// the list is empty.
pub fn transfer_project() -> Project {
    Project::new()
        .layer(vec![(JobSignal::Ok, pick_transfer())])
        .layer(vec![
            (JobSignal::Ok, move_to_carry(ADJACENT_RANGE)),
            (JobSignal::Full, pass(JobSignal::Full)),
        ])
        .layer(vec![
            (JobSignal::Ok, withdraw_for_transfer()),
            (JobSignal::Full, pass(JobSignal::Full)),
        ])
        .layer(vec![(JobSignal::Full, move_to_object(ADJACENT_RANGE))])
        .layer(vec![(JobSignal::Ok, deliver_transfer())])
        .cyclize(JobSignal::Ok)
}

// ---- rooms ----

/// Walk into the job's room. `Ok` once inside.
pub fn move_to_room() -> Component {
    component(|services, ctx| {
        let Some(room) = ctx.data.room.clone() else {
            return Step::signal(JobSignal::NotFound);
        };
        let Some(here) = worker_pos(&*services.world, ctx.worker) else {
            return Step::signal(JobSignal::NotFound);
        };
        if here.room == room {
            return Step::signal(JobSignal::Ok);
        }
        travel(services, ctx, &Position::center_of(&room), 0, StepData::default())
    })
}

/// Walk next to the room's controller.
pub fn move_to_controller() -> Component {
    component(|services, ctx| {
        let found = ctx
            .data
            .room
            .as_ref()
            .and_then(|room| controller_in(&*services.world, room));
        let Some((id, pos)) = found else {
            return Step::signal(JobSignal::NotFound);
        };
        let data = StepData {
            target: Some(id),
            ..StepData::default()
        };
        travel(services, ctx, &pos, ADJACENT_RANGE, data)
    })
}

/// Claim the controller (`Done` on success) or keep reserving it.
pub fn work_controller(claim: bool) -> Component {
    component(move |services, ctx| {
        let Some(controller) = ctx.carry.target else {
            return Step::signal(JobSignal::NotFound);
        };
        if claim {
            return match services.world.claim_controller(ctx.worker, controller) {
                ActionCode::Ok => Step::signal(JobSignal::Done),
                code => Step::signal(code.into()),
            };
        }
        match services.world.reserve_controller(ctx.worker, controller) {
            ActionCode::Ok => Step::Continue,
            code => Step::signal(code.into()),
        }
    })
}

/// Walk to `data.room`, then claim or reserve its controller.
pub fn controller_project(claim: bool) -> Project {
    Project::new()
        .layer(vec![(JobSignal::Ok, move_to_room())])
        .layer(vec![(JobSignal::Ok, move_to_controller())])
        .layer(vec![(JobSignal::Ok, work_controller(claim))])
}

/// Walk to `data.room`. The worker stays there until rehired, which keeps
/// the room in sight.
pub fn scout_project() -> Project {
    Project::new()
        .layer(vec![(JobSignal::Ok, move_to_room())])
        .layer(vec![(JobSignal::Ok, pass(JobSignal::Done))])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::project::{Cursor, Progress};
    use crate::settings::TaskSettings;
    use crate::timer::Timer;
    use hive_ledger::{Ledger, LendingPolicy, TransactionState};
    use hive_resources::{Direction, Possession, ResourceDescriptor, ResourceManager, StoringDescriptor};
    use hive_types::{BodyPart, ControllerInfo, GameObject, Store};
    use hive_world::state::WORK_RANGE;
    use hive_world::{RoomState, WorldMap, WorldState, objects};

    struct Rig {
        world: WorldState,
        ledger: Ledger,
        resources: ResourceManager,
        timer: Timer,
        settings: TaskSettings,
    }

    impl Rig {
        fn new() -> Self {
            let mut map = WorldMap::new();
            map.add_room(RoomState::new("W1N1").owned()).unwrap();
            map.add_room(RoomState::new("W2N1")).unwrap();
            map.connect(&"W1N1".into(), &"W2N1".into()).unwrap();
            Self {
                world: WorldState::new(map),
                ledger: Ledger::new(LendingPolicy::Unlimited),
                resources: ResourceManager::new(),
                timer: Timer::new(),
                settings: TaskSettings::default(),
            }
        }

        fn add(&mut self, object: GameObject) -> ObjectId {
            self.world.add_object(object).unwrap()
        }

        fn run(&mut self, project: &Project, worker: ObjectId, data: &mut TaskData, cursor: &mut Cursor) -> Progress {
            let mut services = Services {
                world: &mut self.world,
                ledger: &mut self.ledger,
                resources: &mut self.resources,
                timer: &mut self.timer,
                settings: &self.settings,
            };
            project.run(&mut services, worker, data, cursor, 16)
        }
    }

    fn hauler(rig: &mut Rig, x: u8) -> ObjectId {
        rig.add(objects::creep(
            Position::new("W1N1", x, 10),
            vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move],
            String::new(),
            0,
        ))
    }

    fn container(rig: &mut Rig, x: u8, energy: u32) -> ObjectId {
        let mut object = objects::structure(ObjectKind::Container, Position::new("W1N1", x, 10));
        object.store = Some(Store::new(2_000).with(ResourceType::Energy, energy));
        rig.add(object)
    }

    #[test]
    fn repair_job_fetches_then_works() {
        let mut rig = Rig::new();
        let source = container(&mut rig, 12, 100);
        rig.resources.register(ResourceDescriptor::new(
            "W1N1",
            source,
            Possession::Storing,
            ResourceType::Energy,
        ));
        let mut road = objects::structure(ObjectKind::Road, Position::new("W1N1", 14, 10));
        road.hits = 100;
        road.hits_max = 5_000;
        let road = rig.add(road);
        let worker = hauler(&mut rig, 10);

        let spec = FetchAndDo {
            resource: ResourceType::Energy,
            range: WORK_RANGE,
            fetch: QueryOptions::default(),
            amount: amount_fn(|_, _| 50),
            action: WorkAction::Repair,
        };
        let project = build_fetch_resource_and_do_something_project(&spec);
        assert!(project.validate().is_ok());
        let mut data = TaskData {
            target: Some(road),
            ..TaskData::default()
        };
        let mut cursor = Cursor::default();

        // Walks one step toward the container, holding a reservation.
        assert_eq!(rig.run(&project, worker, &mut data, &mut cursor), Progress::Suspended);
        assert_eq!(cursor.layer, 3);
        let tx = cursor.data.transaction.unwrap();
        assert_eq!(rig.ledger.state(tx), Some(TransactionState::Working));
        assert_eq!(
            rig.resources.available(&rig.world, source, ResourceType::Energy),
            50
        );

        // Arrives, withdraws, and starts repairing in range.
        for _ in 0..4 {
            let _ = rig.run(&project, worker, &mut data, &mut cursor);
        }
        assert_eq!(rig.ledger.state(tx), Some(TransactionState::Dead));
        assert!(rig.world.object(road).unwrap().hits > 100);
        assert_eq!(rig.world.object(source).unwrap().stored(ResourceType::Energy), 50);
    }

    #[test]
    fn abandoned_fetch_cancels_its_transaction() {
        let mut rig = Rig::new();
        let source = container(&mut rig, 12, 100);
        rig.resources.register(ResourceDescriptor::new(
            "W1N1",
            source,
            Possession::Storing,
            ResourceType::Energy,
        ));
        let worker = hauler(&mut rig, 10);
        let spec = FetchAndDo {
            resource: ResourceType::Energy,
            range: WORK_RANGE,
            fetch: QueryOptions::default(),
            amount: amount_fn(|_, _| 40),
            action: WorkAction::Build,
        };
        let project = build_fetch_resource_and_do_something_project(&spec);
        let mut data = TaskData::default();
        let mut cursor = Cursor::default();
        assert_eq!(rig.run(&project, worker, &mut data, &mut cursor), Progress::Suspended);
        let tx = cursor.data.transaction.unwrap();

        rig.world.remove_object(source);
        assert_eq!(
            rig.run(&project, worker, &mut data, &mut cursor),
            Progress::Complete(JobSignal::NotFound)
        );
        assert_eq!(rig.ledger.state(tx), Some(TransactionState::Dead));
        assert_eq!(rig.resources.reserved(source, ResourceType::Energy, Direction::Retrieve), 0);
    }

    #[test]
    fn nothing_needed_completes_with_done() {
        let mut rig = Rig::new();
        let worker = hauler(&mut rig, 10);
        let spec = FetchAndDo {
            resource: ResourceType::Energy,
            range: ADJACENT_RANGE,
            fetch: QueryOptions::default(),
            amount: amount_fn(|_, _| 0),
            action: WorkAction::Deliver,
        };
        let project = build_fetch_resource_and_do_something_project(&spec);
        let mut data = TaskData::default();
        let mut cursor = Cursor::default();
        assert_eq!(
            rig.run(&project, worker, &mut data, &mut cursor),
            Progress::Complete(JobSignal::Done)
        );
    }

    #[test]
    fn deliver_pays_the_worker_and_ticks_off_the_list() {
        let mut rig = Rig::new();
        let mut spawn = objects::structure(ObjectKind::Spawn, Position::new("W1N1", 11, 10));
        spawn.store = Some(Store::new(300));
        let spawn = rig.add(spawn);
        rig.resources
            .register(StoringDescriptor::new("W1N1", spawn, ResourceType::Energy));
        let worker = hauler(&mut rig, 10);
        if let Some(store) = rig.world.object_mut(worker).and_then(|o| o.store.as_mut()) {
            store.add(ResourceType::Energy, 50);
        }

        let spec = FetchAndDo {
            resource: ResourceType::Energy,
            range: ADJACENT_RANGE,
            fetch: QueryOptions::default(),
            amount: amount_fn(|_, data| data.remaining(ResourceType::Energy)),
            action: WorkAction::Deliver,
        };
        let project = build_fetch_resource_and_do_something_project(&spec);
        let mut data = TaskData {
            target: Some(spawn),
            list: [(ResourceType::Energy, 30)].into_iter().collect(),
            ..TaskData::default()
        };
        let mut cursor = Cursor::default();
        assert_eq!(rig.run(&project, worker, &mut data, &mut cursor), Progress::Suspended);
        assert!(data.list.is_empty());
        assert_eq!(rig.world.object(spawn).unwrap().stored(ResourceType::Energy), 30);
        assert_eq!(rig.ledger.balance(worker), rig.settings.price(30));
    }

    #[test]
    fn transfer_moves_the_list_and_settles() {
        let mut rig = Rig::new();
        let from = container(&mut rig, 11, 200);
        let to = container(&mut rig, 13, 0);
        let worker = hauler(&mut rig, 12);
        let tx = TransactionBuilder::new(to, from)
            .resource(ResourceType::Energy, 40)
            .money(rig.settings.price(40))
            .build()
            .unwrap();
        let tx = rig.ledger.open(tx);
        assert!(rig.resources.confirm(&mut rig.ledger, &rig.world, tx));

        let project = transfer_project();
        let mut data = TaskData {
            source: Some(from),
            target: Some(to),
            list: [(ResourceType::Energy, 40)].into_iter().collect(),
            transactions: vec![tx],
            ..TaskData::default()
        };
        let mut cursor = Cursor::default();
        let mut last = Progress::Suspended;
        for _ in 0..6 {
            last = rig.run(&project, worker, &mut data, &mut cursor);
            if last != Progress::Suspended {
                break;
            }
        }
        assert_eq!(last, Progress::Complete(JobSignal::Done));
        assert_eq!(rig.world.object(to).unwrap().stored(ResourceType::Energy), 40);
        assert_eq!(rig.ledger.state(tx), Some(TransactionState::Dead));
        assert!(data.transactions.is_empty());
    }

    #[test]
    fn claim_walks_over_and_takes_the_controller() {
        let mut rig = Rig::new();
        rig.add(objects::controller(
            Position::new("W2N1", 20, 20),
            ControllerInfo::default(),
        ));
        let claimer = rig.add(objects::creep(
            Position::new("W1N1", 25, 25),
            vec![BodyPart::Claim, BodyPart::Move],
            String::new(),
            0,
        ));
        let project = controller_project(true);
        let mut data = TaskData {
            room: Some("W2N1".into()),
            ..TaskData::default()
        };
        let mut cursor = Cursor::default();
        let mut last = Progress::Suspended;
        for _ in 0..40 {
            last = rig.run(&project, claimer, &mut data, &mut cursor);
            if last != Progress::Suspended {
                break;
            }
        }
        assert_eq!(last, Progress::Complete(JobSignal::Done));
        assert!(rig.world.owned_rooms().contains(&"W2N1".into()));
    }

    #[test]
    fn missing_route_marks_the_room_unreachable() {
        let mut rig = Rig::new();
        rig.world.map_mut().add_room(RoomState::new("W9N9")).unwrap();
        let scout = rig.add(objects::creep(
            Position::new("W1N1", 25, 25),
            vec![BodyPart::Move],
            String::new(),
            0,
        ));
        let project = scout_project();
        let mut data = TaskData {
            room: Some("W9N9".into()),
            ..TaskData::default()
        };
        let mut cursor = Cursor::default();
        assert_eq!(
            rig.run(&project, scout, &mut data, &mut cursor),
            Progress::Complete(JobSignal::NoPath)
        );
        assert!(data.unreachable);
        assert!(rig.world.is_unreachable(&"W9N9".into()));
    }
}
