use rust_decimal::Decimal;
use tracing::debug;

use hive_resources::QueryOptions;
use hive_types::{BodyPart, GameObject, ObjectId, ResourceType};
use hive_world::World;
use hive_world::state::{REPAIR_HITS_PER_ENERGY, WORK_RANGE};

use super::{Issue, defer, existing, supply_near};
use crate::components::{
    FetchAndDo, WorkAction, amount_fn, build_fetch_resource_and_do_something_project,
};
use crate::descriptor::{BodySpec, RoleConstructor, TaskDescriptor, WorkEstimate};
use crate::manager::TaskManager;
use crate::services::Services;
use crate::task::{Liveness, Task, TaskData};
use crate::timer::DeferredRequest;

const KEY: &str = "repair";
const TAG: &str = "repair";

/// Energy needed to bring a structure back to full hits.
fn energy_missing(object: &GameObject) -> u32 {
    object
        .hits_max
        .saturating_sub(object.hits)
        .div_ceil(REPAIR_HITS_PER_ENERGY)
}

/// Issue a job repairing `target` to full hits.
pub fn repair_task(tasks: &mut TaskManager, services: &mut Services<'_>, target: ObjectId) -> Issue {
    if let Some(index) = existing(tasks, Some(target), KEY) {
        return Issue::Existing(index);
    }
    let Some(object) = services.world.object(target) else {
        return Issue::Skipped("structure not visible");
    };
    if !object.kind.is_structure() {
        return Issue::Skipped("not a structure");
    }
    let needed = energy_missing(object);
    if needed == 0 {
        return Issue::Skipped("structure at full hits");
    }
    let room = object.room().clone();

    if supply_near(services, &room, ResourceType::Energy) == 0 {
        return defer(services, DeferredRequest::Repair { target });
    }

    let role = RoleConstructor::new(
        "repairer",
        BodySpec::scaled(vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move], 3),
    )
    .profit(Decimal::new(15, 1))
    .working(WorkEstimate::ByParts {
        part: BodyPart::Work,
        work: needed,
        per_part: 1,
    });
    let descriptor = TaskDescriptor::new(TAG).role(role).key(KEY);

    let project = build_fetch_resource_and_do_something_project(&FetchAndDo {
        resource: ResourceType::Energy,
        range: WORK_RANGE,
        fetch: QueryOptions::default(),
        amount: amount_fn(|world, data| {
            data.target
                .and_then(|id| world.object(id))
                .map_or(0, energy_missing)
        }),
        action: WorkAction::Repair,
    });
    let check = Box::new(move |world: &dyn World, data: &TaskData| {
        match world.object(target) {
            Some(object) if !data.unreachable && object.hits < object.hits_max => {
                Liveness::Working
            }
            _ => Liveness::Dead,
        }
    });

    let task = Task::new(room.clone(), descriptor, project, check)
        .mount(target)
        .data(TaskData {
            target: Some(target),
            ..TaskData::default()
        });
    let index = tasks.register(task);
    debug!(task = %index, room = %room, target = %target, needed, "repair task issued");
    Issue::Registered(index)
}
