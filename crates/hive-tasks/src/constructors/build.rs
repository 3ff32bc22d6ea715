use rust_decimal::Decimal;
use tracing::debug;

use hive_resources::QueryOptions;
use hive_types::{BodyPart, ObjectId, ResourceType};
use hive_world::World;
use hive_world::state::{BUILD_PER_WORK, WORK_RANGE};

use super::{Issue, defer, existing, supply_near};
use crate::components::{
    FetchAndDo, WorkAction, amount_fn, build_fetch_resource_and_do_something_project,
};
use crate::descriptor::{BodySpec, RoleConstructor, TaskDescriptor, WorkEstimate};
use crate::manager::TaskManager;
use crate::services::Services;
use crate::task::{Liveness, Task, TaskData};
use crate::timer::DeferredRequest;

const KEY: &str = "build";
const TAG: &str = "build";

/// Issue a job finishing construction site `site`.
pub fn build_task(tasks: &mut TaskManager, services: &mut Services<'_>, site: ObjectId) -> Issue {
    if let Some(index) = existing(tasks, Some(site), KEY) {
        return Issue::Existing(index);
    }
    let Some(object) = services.world.object(site) else {
        return Issue::Skipped("construction site not visible");
    };
    let Some(info) = object.site() else {
        return Issue::Skipped("not a construction site");
    };
    let room = object.room().clone();
    let remaining = info.remaining();

    if supply_near(services, &room, ResourceType::Energy) == 0 {
        return defer(services, DeferredRequest::Build { site });
    }

    let role = RoleConstructor::new(
        "builder",
        BodySpec::scaled(vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move], 5),
    )
    .headcount(1, 3)
    .profit(Decimal::new(20, 1))
    .working(WorkEstimate::ByParts {
        part: BodyPart::Work,
        work: remaining,
        per_part: BUILD_PER_WORK,
    });
    let descriptor = TaskDescriptor::new(TAG).role(role).key(KEY);

    let project = build_fetch_resource_and_do_something_project(&FetchAndDo {
        resource: ResourceType::Energy,
        range: WORK_RANGE,
        fetch: QueryOptions::default(),
        amount: amount_fn(|world, data| {
            data.target
                .and_then(|id| world.object(id))
                .and_then(|o| o.site().map(|s| s.remaining()))
                .unwrap_or(0)
        }),
        action: WorkAction::Build,
    });
    let check = Box::new(move |world: &dyn World, data: &TaskData| {
        if !data.unreachable && world.object(site).and_then(|o| o.site()).is_some() {
            Liveness::Working
        } else {
            Liveness::Dead
        }
    });

    let task = Task::new(room.clone(), descriptor, project, check)
        .mount(site)
        .data(TaskData {
            target: Some(site),
            ..TaskData::default()
        });
    let index = tasks.register(task);
    debug!(task = %index, room = %room, site = %site, remaining, "build task issued");
    Issue::Registered(index)
}
