//! Default starting colony.
//!
//! Four rooms: the owned home room `W1N1`, a visible neighbour `W2N1` with
//! a neutral controller, a hidden neighbour `W1N2` with a neutral
//! controller, and a hidden `W3N1` beyond `W2N1`. Source and site
//! placement is drawn from a seeded RNG so runs are reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hive_types::{
    BodyPart, ControllerInfo, GameObject, ObjectId, ObjectKind, Position, ResourceType, RoomName,
};

use crate::error::WorldError;
use crate::host::World;
use crate::objects;
use crate::state::WorldState;
use crate::world_map::{RoomState, WorldMap};

/// Capacity of an energy source.
pub const SOURCE_CAPACITY: u32 = 3_000;
/// Energy regenerated per tick by a source.
pub const SOURCE_REGEN: u32 = 10;

/// Identifiers of notable starting objects.
#[derive(Debug, Clone)]
pub struct StartingColonyIds {
    /// The owned room.
    pub home: RoomName,
    /// Neighbour with a neutral controller, worth reserving.
    pub remote: RoomName,
    /// Hidden neighbour with a neutral controller, worth claiming.
    pub expansion: RoomName,
    /// Hidden room two exits away, worth scouting.
    pub frontier: RoomName,
    /// The home spawn.
    pub spawn: ObjectId,
    /// Home extensions.
    pub extensions: Vec<ObjectId>,
    /// Home storage.
    pub storage: ObjectId,
    /// Home terminal.
    pub terminal: ObjectId,
    /// Home center link.
    pub link: ObjectId,
    /// Home tower.
    pub tower: ObjectId,
    /// Container next to the first home source.
    pub container: ObjectId,
    /// Home sources.
    pub sources: Vec<ObjectId>,
    /// Construction sites placed at start.
    pub sites: Vec<ObjectId>,
    /// A damaged road.
    pub road: ObjectId,
    /// Controllers by room.
    pub controllers: Vec<(RoomName, ObjectId)>,
    /// Starting creeps.
    pub creeps: Vec<ObjectId>,
}

fn random_pos(rng: &mut StdRng, room: &RoomName) -> Position {
    Position {
        room: room.clone(),
        x: rng.random_range(5..=44),
        y: rng.random_range(5..=44),
    }
}

fn filled(mut object: GameObject, amount: u32) -> GameObject {
    if let Some(store) = object.store.as_mut() {
        store.add(ResourceType::Energy, amount);
    }
    object
}

/// Create the default starting colony.
///
/// # Errors
///
/// Returns [`WorldError`] if map construction fails (should not happen
/// with the fixed layout).
pub fn create_starting_colony(seed: u64) -> Result<(WorldState, StartingColonyIds), WorldError> {
    let mut rng = StdRng::seed_from_u64(seed);

    let home = RoomName::from("W1N1");
    let remote = RoomName::from("W2N1");
    let expansion = RoomName::from("W1N2");
    let frontier = RoomName::from("W3N1");

    let mut map = WorldMap::new();
    map.add_room(RoomState::new(home.clone()).owned())?;
    map.add_room(RoomState::new(remote.clone()))?;
    map.add_room(RoomState::new(expansion.clone()).hidden())?;
    map.add_room(RoomState::new(frontier.clone()).hidden())?;
    map.connect(&home, &remote)?;
    map.connect(&home, &expansion)?;
    map.connect(&remote, &frontier)?;

    let mut world = WorldState::new(map);

    // --- Home core ---
    let spawn = world.add_object(filled(
        objects::structure(ObjectKind::Spawn, Position::new(home.clone(), 25, 25)),
        300,
    ))?;
    let storage = world.add_object(filled(
        objects::structure(ObjectKind::Storage, Position::new(home.clone(), 24, 27)),
        5_000,
    ))?;
    let terminal = world.add_object(filled(
        objects::structure(ObjectKind::Terminal, Position::new(home.clone(), 26, 27)),
        1_000,
    ))?;
    let link = world.add_object(objects::structure(
        ObjectKind::Link,
        Position::new(home.clone(), 25, 28),
    ))?;
    let tower = world.add_object(filled(
        objects::structure(ObjectKind::Tower, Position::new(home.clone(), 27, 24)),
        200,
    ))?;

    let mut extensions = Vec::new();
    for x in 21..=23 {
        extensions.push(world.add_object(objects::structure(
            ObjectKind::Extension,
            Position::new(home.clone(), x, 23),
        ))?);
    }

    // --- Home economy ---
    let mut sources = Vec::new();
    for _ in 0..2 {
        sources.push(world.add_object(objects::deposit(
            ObjectKind::Source,
            ResourceType::Energy,
            random_pos(&mut rng, &home),
            SOURCE_CAPACITY,
            SOURCE_REGEN,
        ))?);
    }
    let container_pos = sources
        .first()
        .and_then(|id| world.object(*id).map(|o| o.pos.clone()))
        .map_or_else(
            || Position::new(home.clone(), 10, 10),
            |p| Position {
                x: p.x.saturating_add(1),
                ..p
            },
        );
    let container = world.add_object(filled(
        objects::structure(ObjectKind::Container, container_pos),
        500,
    ))?;
    world.add_object(objects::deposit(
        ObjectKind::Mineral,
        ResourceType::Hydrogen,
        random_pos(&mut rng, &home),
        50_000,
        0,
    ))?;

    let mut road_object = objects::structure(ObjectKind::Road, random_pos(&mut rng, &home));
    road_object.hits = 1_500;
    let road = world.add_object(road_object)?;

    let sites = vec![
        world.add_object(objects::site(
            ObjectKind::Extension,
            Position::new(home.clone(), 24, 23),
        ))?,
        world.add_object(objects::site(ObjectKind::Road, random_pos(&mut rng, &home)))?,
    ];

    // --- Controllers and remote sources ---
    let mut controllers = Vec::new();
    for (room, owned) in [
        (&home, true),
        (&remote, false),
        (&expansion, false),
        (&frontier, false),
    ] {
        let info = ControllerInfo {
            owned,
            level: if owned { 4 } else { 0 },
            reservation: 0,
        };
        let id = world.add_object(objects::controller(random_pos(&mut rng, room), info))?;
        controllers.push((room.clone(), id));
    }
    for room in [&remote, &expansion, &frontier] {
        world.add_object(objects::deposit(
            ObjectKind::Source,
            ResourceType::Energy,
            random_pos(&mut rng, room),
            SOURCE_CAPACITY,
            SOURCE_REGEN,
        ))?;
    }

    // --- Starting creeps ---
    let mut creeps = Vec::new();
    for (i, tag) in ["", "", "hauler"].iter().enumerate() {
        let x = u8::try_from(i).unwrap_or(0).saturating_add(24);
        let creep = objects::creep(
            Position::new(home.clone(), x, 26),
            vec![
                BodyPart::Work,
                BodyPart::Work,
                BodyPart::Carry,
                BodyPart::Carry,
                BodyPart::Move,
                BodyPart::Move,
            ],
            (*tag).to_owned(),
            0,
        );
        creeps.push(world.add_object(creep)?);
    }

    let ids = StartingColonyIds {
        home,
        remote,
        expansion,
        frontier,
        spawn,
        extensions,
        storage,
        terminal,
        link,
        tower,
        container,
        sources,
        sites,
        road,
        controllers,
        creeps,
    };
    Ok((world, ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_colony_builds() {
        let result = create_starting_colony(7);
        assert!(result.is_ok());
        if let Ok((world, ids)) = result {
            assert!(world.map().is_connected());
            assert_eq!(world.owned_rooms(), vec![ids.home.clone()]);
            assert_eq!(ids.sources.len(), 2);
            assert_eq!(ids.creeps.len(), 3);
            assert_eq!(ids.controllers.len(), 4);
            assert!(!world.is_visible(&ids.expansion));
            assert!(world.is_visible(&ids.remote));
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let a = create_starting_colony(42);
        let b = create_starting_colony(42);
        assert!(a.is_ok() && b.is_ok());
        if let (Ok((wa, ia)), Ok((wb, ib))) = (a, b) {
            let pa: Vec<Position> = ia
                .sources
                .iter()
                .filter_map(|id| wa.object(*id).map(|o| o.pos.clone()))
                .collect();
            let pb: Vec<Position> = ib
                .sources
                .iter()
                .filter_map(|id| wb.object(*id).map(|o| o.pos.clone()))
                .collect();
            assert_eq!(pa, pb);
        }
    }
}
