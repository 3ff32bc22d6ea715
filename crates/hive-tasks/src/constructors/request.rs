use rust_decimal::Decimal;
use tracing::debug;

use hive_resources::QueryOptions;
use hive_types::{BodyPart, ObjectId, ResourceType};
use hive_world::World;
use hive_world::state::ADJACENT_RANGE;

use super::{Issue, defer, existing, supply_near};
use crate::components::{
    FetchAndDo, WorkAction, amount_fn, build_fetch_resource_and_do_something_project,
};
use crate::descriptor::{BodySpec, DEFAULT_TAG, RoleConstructor, TaskDescriptor};
use crate::manager::TaskManager;
use crate::services::Services;
use crate::task::{Liveness, Task, TaskData};
use crate::timer::DeferredRequest;

/// Tag of workers spawned for hauling jobs.
pub const HAULER_TAG: &str = "hauler";

fn key(resource: ResourceType) -> String {
    format!("request:{resource:?}")
}

/// Issue a job filling `target` with `amount` units of `resource`.
///
/// Request jobs sit under the default tag, so they are never held back by
/// saturation.
pub fn request_task(
    tasks: &mut TaskManager,
    services: &mut Services<'_>,
    target: ObjectId,
    resource: ResourceType,
    amount: u32,
) -> Issue {
    let key = key(resource);
    if let Some(index) = existing(tasks, Some(target), &key) {
        return Issue::Existing(index);
    }
    if amount == 0 {
        return Issue::Skipped("nothing requested");
    }
    let Some(object) = services.world.object(target) else {
        return Issue::Skipped("target not visible");
    };
    if object.store.is_none() {
        return Issue::Skipped("target has no store");
    }
    let room = object.room().clone();

    if supply_near(services, &room, resource) == 0 {
        return defer(
            services,
            DeferredRequest::Request {
                target,
                resource,
                amount,
            },
        );
    }

    let role = RoleConstructor::new(
        "filler",
        BodySpec::scaled(vec![BodyPart::Carry, BodyPart::Carry, BodyPart::Move], 4),
    )
    .tag(HAULER_TAG)
    .headcount(1, 2)
    .profit(Decimal::new(30, 1));
    let descriptor = TaskDescriptor::new(DEFAULT_TAG).role(role).key(key);

    let project = build_fetch_resource_and_do_something_project(&FetchAndDo {
        resource,
        range: ADJACENT_RANGE,
        fetch: QueryOptions::default(),
        amount: amount_fn(move |world, data| {
            let room_left = data
                .target
                .and_then(|id| world.object(id))
                .map_or(0, |o| o.free_capacity());
            data.remaining(resource).min(room_left)
        }),
        action: WorkAction::Deliver,
    });
    let check = Box::new(move |world: &dyn World, data: &TaskData| {
        let open = world
            .object(target)
            .is_some_and(|o| o.free_capacity() > 0);
        if !data.unreachable && open && data.remaining(resource) > 0 {
            Liveness::Working
        } else {
            Liveness::Dead
        }
    });

    let task = Task::new(room.clone(), descriptor, project, check)
        .mount(target)
        .data(TaskData {
            target: Some(target),
            list: [(resource, amount)].into_iter().collect(),
            ..TaskData::default()
        });
    let index = tasks.register(task);
    debug!(task = %index, room = %room, target = %target, resource = ?resource, amount, "request task issued");
    Issue::Registered(index)
}
