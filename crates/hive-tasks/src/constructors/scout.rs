use rust_decimal::Decimal;
use tracing::debug;

use hive_types::{BodyPart, RoomName};
use hive_world::World;

use super::{Issue, existing, nearest_owned};
use crate::components::scout_project;
use crate::descriptor::{BodySpec, RoleConstructor, TaskDescriptor};
use crate::manager::TaskManager;
use crate::services::Services;
use crate::task::{Liveness, Task, TaskData};

const TAG: &str = "scout";

/// Issue a job sending a worker into `room` to gain sight of it. The job
/// ends as soon as the room is visible.
pub fn scout_task(tasks: &mut TaskManager, services: &mut Services<'_>, room: &RoomName) -> Issue {
    let key = format!("{TAG}:{room}");
    if let Some(index) = existing(tasks, None, &key) {
        return Issue::Existing(index);
    }
    if services.world.is_visible(room) {
        return Issue::Skipped("room already visible");
    }
    if services.world.is_unreachable(room) {
        return Issue::Skipped("room marked unreachable");
    }
    let Some(home) = nearest_owned(services, room) else {
        return Issue::Skipped("no owned room to spawn from");
    };

    let role = RoleConstructor::new(TAG, BodySpec::fixed(vec![BodyPart::Move]))
        .tag(TAG)
        .profit(Decimal::ONE)
        .spawn_room(home);
    let descriptor = TaskDescriptor::new(TAG).role(role).key(key);

    let target = room.clone();
    let check = Box::new(move |world: &dyn World, data: &TaskData| {
        if data.unreachable || world.is_visible(&target) {
            Liveness::Dead
        } else {
            Liveness::Working
        }
    });

    let task = Task::new(room.clone(), descriptor, scout_project(), check).data(TaskData {
        room: Some(room.clone()),
        ..TaskData::default()
    });
    let index = tasks.register(task);
    debug!(task = %index, room = %room, "scout task issued");
    Issue::Registered(index)
}
