use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, info};

use hive_ledger::TransactionBuilder;
use hive_types::{BodyPart, ObjectId, ResourceType, TaskIndex, TransactionId};
use hive_world::World;

use super::request::HAULER_TAG;
use super::{Issue, defer, existing};
use crate::components::transfer_project;
use crate::descriptor::{BodySpec, RoleConstructor, TaskDescriptor};
use crate::manager::TaskManager;
use crate::services::Services;
use crate::task::{Liveness, Task, TaskData};
use crate::timer::DeferredRequest;

const TAG: &str = "transfer";

fn key(to: ObjectId) -> String {
    format!("transfer:{to}")
}

/// Open and confirm a transaction paying `from` for `amount` units
/// delivered to `to`. `None` when the stock cannot cover it.
fn reserve_leg(
    services: &mut Services<'_>,
    from: ObjectId,
    to: ObjectId,
    resource: ResourceType,
    amount: u32,
) -> Option<TransactionId> {
    let tx = TransactionBuilder::new(to, from)
        .resource(resource, amount)
        .money(services.settings.price(amount))
        .cancel_fee(services.settings.cancel_fee)
        .tick(services.tick())
        .build()
        .ok()?;
    let id = services.ledger.open(tx);
    if services.resources.confirm(services.ledger, &*services.world, id) {
        return Some(id);
    }
    services.resources.cancel(services.ledger, id);
    None
}

/// Issue a job moving `list` from `from` to `to`.
///
/// A repeat request for the same pair merges into the existing job using
/// the configured [`MergeStrategy`](crate::MergeStrategy). When both stores
/// belong to the same room's center group, orders are queued with the
/// center instead and no hauler is involved.
pub fn transfer_task(
    tasks: &mut TaskManager,
    services: &mut Services<'_>,
    from: ObjectId,
    to: ObjectId,
    list: BTreeMap<ResourceType, u32>,
) -> Issue {
    transfer_task_with(tasks, services, from, to, list, true)
}

/// [`transfer_task`] with merging chosen per call. With `merge` off a
/// repeat request leaves the open job untouched and reports it as
/// [`Issue::Existing`].
pub fn transfer_task_with(
    tasks: &mut TaskManager,
    services: &mut Services<'_>,
    from: ObjectId,
    to: ObjectId,
    list: BTreeMap<ResourceType, u32>,
    merge: bool,
) -> Issue {
    let list: BTreeMap<ResourceType, u32> = list.into_iter().filter(|(_, n)| *n > 0).collect();
    if list.is_empty() {
        return Issue::Skipped("nothing to transfer");
    }
    if from == to {
        return Issue::Skipped("source and destination are the same");
    }
    let (Some(source), Some(_)) = (services.world.object(from), services.world.object(to)) else {
        return Issue::Skipped("endpoint not visible");
    };
    let room = source.room().clone();

    if services.resources.center().shared_room(from, to).is_some() {
        return delegate(services, from, to, list, merge);
    }

    let key = key(to);
    if let Some(index) = existing(tasks, Some(from), &key) {
        if !merge {
            return Issue::Existing(index);
        }
        fold(tasks, services, index, from, to, &list);
        return Issue::Merged(index);
    }

    let stocked = list
        .keys()
        .any(|r| services.resources.available(&*services.world, from, *r) > 0);
    if !stocked {
        return defer(
            services,
            DeferredRequest::Transfer {
                from,
                to,
                list,
                merge,
            },
        );
    }

    let mut transactions = Vec::new();
    for (resource, amount) in &list {
        let available = services.resources.available(&*services.world, from, *resource);
        let covered = (*amount).min(available);
        if covered == 0 {
            continue;
        }
        if let Some(id) = reserve_leg(services, from, to, *resource, covered) {
            transactions.push(id);
        }
    }

    let role = RoleConstructor::new(
        "hauler",
        BodySpec::scaled(vec![BodyPart::Carry, BodyPart::Carry, BodyPart::Move], 8),
    )
    .tag(HAULER_TAG)
    .headcount(1, 2)
    .profit(Decimal::ONE);
    let descriptor = TaskDescriptor::new(TAG).role(role).key(key);

    let check = Box::new(move |world: &dyn World, data: &TaskData| {
        let alive = !data.unreachable
            && !data.list.is_empty()
            && world.object(from).is_some()
            && world.object(to).is_some();
        if alive {
            Liveness::Working
        } else {
            Liveness::Dead
        }
    });

    let task = Task::new(room.clone(), descriptor, transfer_project(), check)
        .mount(from)
        .data(TaskData {
            source: Some(from),
            target: Some(to),
            list,
            transactions,
            ..TaskData::default()
        });
    let index = tasks.register(task);
    debug!(task = %index, room = %room, from = %from, to = %to, "transfer task issued");
    Issue::Registered(index)
}

/// Fold a repeat request into an existing job and reserve the increase.
fn fold(
    tasks: &mut TaskManager,
    services: &mut Services<'_>,
    index: TaskIndex,
    from: ObjectId,
    to: ObjectId,
    list: &BTreeMap<ResourceType, u32>,
) {
    let strategy = services.settings.merge_strategy;
    let Some(task) = tasks.task_mut(index) else {
        return;
    };
    let data = task.task_data_mut();
    let mut increases = Vec::new();
    for (resource, amount) in list {
        let entry = data.list.entry(*resource).or_insert(0);
        let merged = strategy.merge(*entry, *amount);
        let increase = merged.saturating_sub(*entry);
        *entry = merged;
        if increase > 0 {
            increases.push((*resource, increase));
        }
    }

    let mut opened = Vec::new();
    for (resource, increase) in increases {
        let available = services.resources.available(&*services.world, from, resource);
        let covered = increase.min(available);
        if covered == 0 {
            continue;
        }
        if let Some(id) = reserve_leg(services, from, to, resource, covered) {
            opened.push(id);
        }
    }
    task.task_data_mut().transactions.extend(opened);
    debug!(task = %index, from = %from, to = %to, strategy = ?strategy, "transfer merged");
}

/// Pay for and queue center orders. Resources the source cannot cover are
/// deferred.
fn delegate(
    services: &mut Services<'_>,
    from: ObjectId,
    to: ObjectId,
    list: BTreeMap<ResourceType, u32>,
    merge: bool,
) -> Issue {
    let mut short = BTreeMap::new();
    for (resource, amount) in list {
        if reserve_leg(services, from, to, resource, amount).is_none() {
            short.insert(resource, amount);
        }
    }
    if short.is_empty() {
        info!(from = %from, to = %to, "transfer delegated to center");
        return Issue::Delegated;
    }
    defer(
        services,
        DeferredRequest::Transfer {
            from,
            to,
            list: short,
            merge,
        },
    )
}
