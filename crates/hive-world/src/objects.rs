//! Templates for freshly placed game objects.
//!
//! Hit points and store capacities follow the host's published numbers for
//! a fully upgraded room.

use hive_types::{
    BodyPart, ControllerInfo, CreepInfo, GameObject, ObjectDetail, ObjectId, ObjectKind, Position,
    ResourceType, SiteInfo, Store,
};

/// Maximum hit points and store capacity of a finished structure.
pub const fn structure_profile(kind: ObjectKind) -> (u32, Option<u32>) {
    match kind {
        ObjectKind::Spawn => (5_000, Some(300)),
        ObjectKind::Extension => (1_000, Some(50)),
        ObjectKind::Container => (250_000, Some(2_000)),
        ObjectKind::Storage => (10_000, Some(1_000_000)),
        ObjectKind::Terminal => (3_000, Some(300_000)),
        ObjectKind::Link => (1_000, Some(800)),
        ObjectKind::Tower => (3_000, Some(1_000)),
        ObjectKind::Lab => (500, Some(3_000)),
        ObjectKind::Factory => (1_000, Some(50_000)),
        ObjectKind::Road => (5_000, None),
        ObjectKind::Wall | ObjectKind::Rampart => (1, None),
        ObjectKind::Creep
        | ObjectKind::Source
        | ObjectKind::Mineral
        | ObjectKind::ConstructionSite
        | ObjectKind::Controller => (0, None),
    }
}

/// Progress needed to finish a construction site of the given kind.
pub const fn build_cost(kind: ObjectKind) -> u32 {
    match kind {
        ObjectKind::Extension => 3_000,
        ObjectKind::Container | ObjectKind::Wall | ObjectKind::Rampart => 5_000,
        ObjectKind::Spawn => 15_000,
        ObjectKind::Storage => 30_000,
        ObjectKind::Terminal | ObjectKind::Factory => 100_000,
        ObjectKind::Link | ObjectKind::Tower => 5_000,
        ObjectKind::Lab => 50_000,
        ObjectKind::Road => 300,
        ObjectKind::Creep
        | ObjectKind::Source
        | ObjectKind::Mineral
        | ObjectKind::ConstructionSite
        | ObjectKind::Controller => 0,
    }
}

/// A finished structure at full hits with an empty store.
pub fn structure(kind: ObjectKind, pos: Position) -> GameObject {
    let (hits_max, capacity) = structure_profile(kind);
    GameObject {
        id: ObjectId::new(),
        kind,
        pos,
        hits: hits_max,
        hits_max,
        store: capacity.map(Store::new),
        detail: ObjectDetail::Structure,
    }
}

/// A construction site with no progress.
pub fn site(target_kind: ObjectKind, pos: Position) -> GameObject {
    GameObject {
        id: ObjectId::new(),
        kind: ObjectKind::ConstructionSite,
        pos,
        hits: 0,
        hits_max: 0,
        store: None,
        detail: ObjectDetail::Site(SiteInfo {
            target_kind,
            progress: 0,
            progress_total: build_cost(target_kind),
        }),
    }
}

/// A full harvestable deposit.
pub fn deposit(
    kind: ObjectKind,
    resource: ResourceType,
    pos: Position,
    capacity: u32,
    regen_per_tick: u32,
) -> GameObject {
    GameObject {
        id: ObjectId::new(),
        kind,
        pos,
        hits: 0,
        hits_max: 0,
        store: Some(Store::new(capacity).with(resource, capacity)),
        detail: ObjectDetail::Deposit {
            resource,
            regen_per_tick,
        },
    }
}

/// A room controller.
pub fn controller(pos: Position, info: ControllerInfo) -> GameObject {
    GameObject {
        id: ObjectId::new(),
        kind: ObjectKind::Controller,
        pos,
        hits: 0,
        hits_max: 0,
        store: None,
        detail: ObjectDetail::Controller(info),
    }
}

/// A creep with an empty store sized by its carry parts.
pub fn creep(pos: Position, body: Vec<BodyPart>, tag: String, spawned_at: u64) -> GameObject {
    let hits = u32::try_from(body.len())
        .unwrap_or(u32::MAX)
        .saturating_mul(100);
    let info = CreepInfo {
        body,
        tag,
        spawned_at,
        home: pos.room.clone(),
    };
    GameObject {
        id: ObjectId::new(),
        kind: ObjectKind::Creep,
        pos,
        hits,
        hits_max: hits,
        store: Some(Store::new(info.carry_capacity())),
        detail: ObjectDetail::Creep(info),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creep_store_matches_carry_parts() {
        let obj = creep(
            Position::new("W1N1", 10, 10),
            vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move],
            String::new(),
            5,
        );
        assert_eq!(obj.store.as_ref().map(Store::capacity), Some(50));
        assert_eq!(obj.hits_max, 300);
        assert_eq!(obj.creep().map(|c| c.spawned_at), Some(5));
    }

    #[test]
    fn site_needs_build_cost() {
        let obj = site(ObjectKind::Extension, Position::new("W1N1", 1, 1));
        assert_eq!(obj.site().map(SiteInfo::remaining), Some(3_000));
    }

    #[test]
    fn deposit_starts_full() {
        let obj = deposit(
            ObjectKind::Source,
            ResourceType::Energy,
            Position::new("W1N1", 1, 1),
            3_000,
            10,
        );
        assert_eq!(obj.stored(ResourceType::Energy), 3_000);
        assert_eq!(obj.deposit(), Some((ResourceType::Energy, 10)));
    }
}
