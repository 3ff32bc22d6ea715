use rust_decimal::Decimal;
use tracing::debug;

use hive_types::{BodyPart, ObjectKind, RoomName};
use hive_world::World;

use super::{Issue, existing, nearest_owned};
use crate::components::controller_project;
use crate::descriptor::{BodySpec, RoleConstructor, TaskDescriptor, WorkEstimate};
use crate::manager::TaskManager;
use crate::services::Services;
use crate::task::{Liveness, Task, TaskData};

/// Tag of workers spawned with claim parts.
pub const CLAIMER_TAG: &str = "claimer";

fn room_owned(world: &dyn World, room: &RoomName) -> bool {
    world.room_objects(room).iter().any(|o| {
        o.kind == ObjectKind::Controller && o.controller().is_some_and(|c| c.owned)
    }) || world.owned_rooms().contains(room)
}

/// Issue a job claiming the controller of `room`.
pub fn claim_task(tasks: &mut TaskManager, services: &mut Services<'_>, room: &RoomName) -> Issue {
    controller_task(tasks, services, room, true)
}

/// Issue a job keeping the controller of `room` reserved.
pub fn reserve_task(tasks: &mut TaskManager, services: &mut Services<'_>, room: &RoomName) -> Issue {
    controller_task(tasks, services, room, false)
}

fn controller_task(
    tasks: &mut TaskManager,
    services: &mut Services<'_>,
    room: &RoomName,
    claim: bool,
) -> Issue {
    let (tag, profit) = if claim {
        ("claim", Decimal::new(50, 1))
    } else {
        ("reserve", Decimal::new(20, 1))
    };
    let key = format!("{tag}:{room}");
    if let Some(index) = existing(tasks, None, &key) {
        return Issue::Existing(index);
    }
    if room_owned(&*services.world, room) {
        return Issue::Skipped("room already owned");
    }
    if services.world.is_unreachable(room) {
        return Issue::Skipped("room marked unreachable");
    }
    let Some(home) = nearest_owned(services, room) else {
        return Issue::Skipped("no owned room to spawn from");
    };

    let body = if claim {
        BodySpec::fixed(vec![BodyPart::Claim, BodyPart::Move])
    } else {
        BodySpec::scaled(vec![BodyPart::Claim, BodyPart::Move], 2)
    };
    let role = RoleConstructor::new(tag, body)
        .exclusive(CLAIMER_TAG)
        .profit(profit)
        .working(WorkEstimate::Fixed { ticks: 1 })
        .spawn_room(home.clone());
    let descriptor = TaskDescriptor::new(tag).role(role).key(key);

    let target = room.clone();
    let check = Box::new(move |world: &dyn World, data: &TaskData| {
        if data.unreachable || room_owned(world, &target) {
            Liveness::Dead
        } else {
            Liveness::Working
        }
    });

    let task = Task::new(room.clone(), descriptor, controller_project(claim), check).data(TaskData {
        room: Some(room.clone()),
        ..TaskData::default()
    });
    let index = tasks.register(task);
    debug!(task = %index, room = %room, home = %home, claim, "controller task issued");
    Issue::Registered(index)
}
