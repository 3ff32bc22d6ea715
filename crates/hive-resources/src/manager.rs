//! The resource directory.
//!
//! [`ResourceManager`] files descriptors in a four-level index
//! (room → resource → key → list), answers [`sum`](ResourceManager::sum)
//! and [`query`](ResourceManager::query) lookups, and owns the explicit
//! reservation counters that keep two jobs from claiming the same units.
//!
//! # Reservations
//!
//! Confirming a transaction reserves the amount on the seller (outgoing)
//! and on the buyer (incoming). Every amount the directory reports is the
//! live world amount minus those reservations, so for any object:
//!
//! ```text
//! sum(amounts of working transactions selling from it) <= raw stock at confirm time
//! ```
//!
//! Completing or cancelling the transaction releases both reservations.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use hive_ledger::{Ledger, TransactionState};
use hive_types::{GameObject, ObjectId, ObjectKind, Position, ResourceType, RoomName, TransactionId};
use hive_world::World;

use crate::center::{CenterOrder, CenterTransfer};
use crate::descriptor::{
    DEFAULT_KEY, Described, Direction, Possession, Registration, ResourceDescriptor,
    StoringDescriptor,
};

/// Score penalty for candidates found only under the default key.
pub const DEFAULT_KEY_PENALTY: i64 = 1_000;
/// Score penalty for harvesting instead of withdrawing.
pub const HARVEST_PENALTY: i64 = 1_000_000;
/// Rooms farther than this from the subject are never searched.
pub const MAX_QUERY_DISTANCE: u32 = 1;

type Index<T> = BTreeMap<RoomName, BTreeMap<ResourceType, BTreeMap<String, Vec<T>>>>;

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

/// Filters for [`ResourceManager::sum`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SumOptions {
    /// Key to total.
    pub key: String,
    /// Leave out the default key when `key` is something else.
    pub exclude_default: bool,
    /// Only count objects of these kinds.
    pub allowed_kinds: Option<BTreeSet<ObjectKind>>,
    /// Count harvestable deposits.
    pub allow_harvest: bool,
    /// Count stores.
    pub allow_store: bool,
    /// Total what can be given or what can be accepted.
    pub direction: Direction,
}

impl Default for SumOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY.to_owned(),
            exclude_default: false,
            allowed_kinds: None,
            allow_harvest: true,
            allow_store: true,
            direction: Direction::Retrieve,
        }
    }
}

/// Filters for [`ResourceManager::query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Key to search, with the default key as a penalized fallback.
    pub key: String,
    /// Find a giver or an acceptor.
    pub direction: Direction,
    /// Only search the subject's own room.
    pub confined_in_room: bool,
    /// Only consider objects of these kinds.
    pub allowed_kinds: Option<BTreeSet<ObjectKind>>,
    /// Consider harvestable deposits.
    pub allow_harvest: bool,
    /// Prefer the smallest candidate that covers the full amount.
    pub ensure_amount: bool,
    /// Ask the terminal to buy the resource when nothing is found.
    pub allow_purchase: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY.to_owned(),
            direction: Direction::Retrieve,
            confined_in_room: false,
            allowed_kinds: None,
            allow_harvest: true,
            ensure_amount: false,
            allow_purchase: false,
        }
    }
}

impl QueryOptions {
    /// Options for finding an acceptor.
    pub fn store() -> Self {
        Self {
            direction: Direction::Store,
            allow_harvest: false,
            ..Self::default()
        }
    }
}

/// The object chosen by [`ResourceManager::query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryHit {
    /// The chosen object.
    pub object: ObjectId,
    /// Its room.
    pub room: RoomName,
    /// Its position.
    pub pos: Position,
    /// Unreserved amount (retrieve) or free capacity (store).
    pub available: u32,
    /// Whether the object must be harvested.
    pub harvest: bool,
}

/// A resource the directory could not find, for the terminal to buy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// Room that needs the resource.
    pub room: RoomName,
    /// Resource needed.
    pub resource: ResourceType,
    /// Units needed.
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SumKey {
    room: RoomName,
    resource: ResourceType,
    options: SumOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Held {
    seller: ObjectId,
    buyer: ObjectId,
    resource: ResourceType,
    amount: u32,
}

#[derive(Debug, Clone)]
struct Candidate {
    object: ObjectId,
    pos: Position,
    available: u32,
    harvest: bool,
    penalty: i64,
    score: i64,
    range: u32,
}

/// Parameters of one room search.
struct Search<'a> {
    subject: ObjectId,
    origin: &'a Position,
    resource: ResourceType,
    amount: u32,
    options: &'a QueryOptions,
}

fn lookup<'a, T>(index: &'a Index<T>, room: &RoomName, resource: ResourceType, key: &str) -> &'a [T] {
    index
        .get(room)
        .and_then(|by_resource| by_resource.get(&resource))
        .and_then(|by_key| by_key.get(key))
        .map_or(&[], Vec::as_slice)
}

/// Descriptors under `key`, then under the default key when folded in.
/// The flag marks default-key fallbacks.
fn keyed<'a, T>(
    index: &'a Index<T>,
    room: &RoomName,
    resource: ResourceType,
    key: &str,
    include_default: bool,
) -> Vec<(&'a T, bool)> {
    let mut found: Vec<(&T, bool)> = lookup(index, room, resource, key)
        .iter()
        .map(|d| (d, false))
        .collect();
    if include_default && key != DEFAULT_KEY {
        found.extend(
            lookup(index, room, resource, DEFAULT_KEY)
                .iter()
                .map(|d| (d, true)),
        );
    }
    found
}

fn insert<T>(index: &mut Index<T>, room: RoomName, resource: ResourceType, key: String, d: T) {
    index
        .entry(room)
        .or_default()
        .entry(resource)
        .or_default()
        .entry(key)
        .or_default()
        .push(d);
}

fn prune<T: Described>(index: &mut Index<T>, room: &RoomName, world: &dyn World) -> usize {
    let Some(by_resource) = index.get_mut(room) else {
        return 0;
    };
    let mut pruned = 0_usize;
    for by_key in by_resource.values_mut() {
        for list in by_key.values_mut() {
            let before = list.len();
            list.retain(|d| world.object(d.object()).is_some());
            pruned = pruned.saturating_add(before.saturating_sub(list.len()));
        }
        by_key.retain(|_, list| !list.is_empty());
    }
    by_resource.retain(|_, by_key| !by_key.is_empty());
    pruned
}

fn filed<T>(index: &Index<T>, room: &RoomName) -> usize {
    index.get(room).map_or(0, |by_resource| {
        by_resource
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .fold(0_usize, usize::saturating_add)
    })
}

fn admits(
    object: &GameObject,
    possession: Possession,
    allowed_kinds: Option<&BTreeSet<ObjectKind>>,
    allow_harvest: bool,
    allow_store: bool,
) -> bool {
    if allowed_kinds.is_some_and(|kinds| !kinds.contains(&object.kind)) {
        return false;
    }
    match possession {
        Possession::Producing => allow_harvest,
        Possession::Storing => allow_store,
    }
}

// ---------------------------------------------------------------------------
// ResourceManager
// ---------------------------------------------------------------------------

/// Registry of resource givers and takers.
#[derive(Debug, Clone, Default)]
pub struct ResourceManager {
    retrieve: Index<ResourceDescriptor>,
    store: Index<StoringDescriptor>,
    reservations: BTreeMap<(ObjectId, ResourceType, Direction), u32>,
    held: BTreeMap<TransactionId, Held>,
    sum_cache: BTreeMap<SumKey, Vec<ObjectId>>,
    purchase_requests: Vec<PurchaseRequest>,
    center: CenterTransfer,
}

impl ResourceManager {
    /// Create an empty directory.
    pub const fn new() -> Self {
        Self {
            retrieve: BTreeMap::new(),
            store: BTreeMap::new(),
            reservations: BTreeMap::new(),
            held: BTreeMap::new(),
            sum_cache: BTreeMap::new(),
            purchase_requests: Vec::new(),
            center: CenterTransfer::new(),
        }
    }

    // -------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------

    /// File a descriptor. Duplicates are not detected.
    pub fn register(&mut self, registration: impl Into<Registration>) {
        match registration.into() {
            Registration::Retrieve(d) => {
                let room = d.room.clone();
                debug!(room = %room, object = %d.object, resource = ?d.resource, key = %d.key, "giver registered");
                insert(&mut self.retrieve, d.room.clone(), d.resource, d.key.clone(), d);
                self.invalidate(&room);
            }
            Registration::Store(d) => {
                let room = d.room.clone();
                debug!(room = %room, object = %d.object, resource = ?d.resource, key = %d.key, "acceptor registered");
                insert(&mut self.store, d.room.clone(), d.resource, d.key.clone(), d);
                self.invalidate(&room);
            }
        }
    }

    /// React to structures vanishing in a room: drop cached sums and prune
    /// descriptors whose objects are gone. Returns descriptors pruned.
    pub fn on_structure_destroyed(&mut self, world: &dyn World, room: &RoomName) -> usize {
        self.invalidate(room);
        if !world.is_visible(room) {
            return 0;
        }
        let pruned = prune(&mut self.retrieve, room, world)
            .saturating_add(prune(&mut self.store, room, world));
        self.center
            .retain_members(room, |id| world.object(id).is_some());
        if pruned > 0 {
            debug!(room = %room, pruned, "descriptors pruned");
        }
        pruned
    }

    /// Number of descriptors filed for a room, both directions.
    pub fn registrations(&self, room: &RoomName) -> usize {
        filed(&self.retrieve, room).saturating_add(filed(&self.store, room))
    }

    fn invalidate(&mut self, room: &RoomName) {
        self.sum_cache.retain(|key, _| key.room != *room);
    }

    // -------------------------------------------------------------------
    // Reservations
    // -------------------------------------------------------------------

    /// Hold `amount` of `resource` on an object.
    pub fn reserve(
        &mut self,
        object: ObjectId,
        resource: ResourceType,
        direction: Direction,
        amount: u32,
    ) {
        let held = self
            .reservations
            .entry((object, resource, direction))
            .or_insert(0);
        *held = held.saturating_add(amount);
    }

    /// Release a hold placed by [`reserve`](Self::reserve).
    pub fn release(
        &mut self,
        object: ObjectId,
        resource: ResourceType,
        direction: Direction,
        amount: u32,
    ) {
        let key = (object, resource, direction);
        if let Some(held) = self.reservations.get_mut(&key) {
            *held = held.saturating_sub(amount);
            if *held == 0 {
                self.reservations.remove(&key);
            }
        }
    }

    /// Units currently held on an object.
    pub fn reserved(&self, object: ObjectId, resource: ResourceType, direction: Direction) -> u32 {
        self.reservations
            .get(&(object, resource, direction))
            .copied()
            .unwrap_or(0)
    }

    fn reserved_total(&self, object: ObjectId, direction: Direction) -> u32 {
        self.reservations
            .iter()
            .filter(|((id, _, dir), _)| *id == object && *dir == direction)
            .fold(0_u32, |acc, (_, held)| acc.saturating_add(*held))
    }

    /// Unreserved stock of a resource on an object.
    pub fn available(&self, world: &dyn World, object: ObjectId, resource: ResourceType) -> u32 {
        world
            .object(object)
            .map_or(0, |o| o.stored(resource))
            .saturating_sub(self.reserved(object, resource, Direction::Retrieve))
    }

    /// Unreserved free capacity of an object.
    pub fn free(&self, world: &dyn World, object: ObjectId) -> u32 {
        world
            .object(object)
            .map_or(0, GameObject::free_capacity)
            .saturating_sub(self.reserved_total(object, Direction::Store))
    }

    fn amount(
        &self,
        world: &dyn World,
        direction: Direction,
        object: ObjectId,
        resource: ResourceType,
    ) -> u32 {
        match direction {
            Direction::Retrieve => self.available(world, object, resource),
            Direction::Store => self.free(world, object),
        }
    }

    // -------------------------------------------------------------------
    // Sum
    // -------------------------------------------------------------------

    /// Total unreserved amount (retrieve) or free capacity (store) under a
    /// key in a room. Zero for rooms out of sight or without registrations.
    pub fn sum(
        &mut self,
        world: &dyn World,
        room: &RoomName,
        resource: ResourceType,
        options: &SumOptions,
    ) -> u32 {
        if !world.is_visible(room) {
            return 0;
        }
        let key = SumKey {
            room: room.clone(),
            resource,
            options: options.clone(),
        };
        if !self.sum_cache.contains_key(&key) {
            let candidates = self.sum_candidates(world, room, resource, options);
            self.sum_cache.insert(key.clone(), candidates);
        }
        self.sum_cache.get(&key).map_or(0, |candidates| {
            candidates.iter().fold(0_u32, |acc, id| {
                acc.saturating_add(self.amount(world, options.direction, *id, resource))
            })
        })
    }

    fn sum_candidates(
        &self,
        world: &dyn World,
        room: &RoomName,
        resource: ResourceType,
        options: &SumOptions,
    ) -> Vec<ObjectId> {
        let include_default = !options.exclude_default;
        let described: Vec<(ObjectId, Possession)> = match options.direction {
            Direction::Retrieve => keyed(&self.retrieve, room, resource, &options.key, include_default)
                .into_iter()
                .map(|(d, _)| (d.object(), d.possession()))
                .collect(),
            Direction::Store => keyed(&self.store, room, resource, &options.key, include_default)
                .into_iter()
                .map(|(d, _)| (d.object(), d.possession()))
                .collect(),
        };
        let unique: BTreeSet<ObjectId> = described
            .into_iter()
            .filter(|(id, possession)| {
                world.object(*id).is_some_and(|o| {
                    admits(
                        o,
                        *possession,
                        options.allowed_kinds.as_ref(),
                        options.allow_harvest,
                        options.allow_store,
                    )
                })
            })
            .map(|(id, _)| id)
            .collect();
        unique.into_iter().collect()
    }

    // -------------------------------------------------------------------
    // Query
    // -------------------------------------------------------------------

    /// Find the best single giver or acceptor for `subject`.
    ///
    /// Rooms are searched nearest first, skipping rooms out of sight,
    /// outside the subject's room when confined, or farther than
    /// [`MAX_QUERY_DISTANCE`]. The first room with any candidate wins. The
    /// subject itself is never returned. When nothing is found and
    /// purchases are allowed, a [`PurchaseRequest`] is recorded.
    pub fn query(
        &mut self,
        world: &dyn World,
        subject: ObjectId,
        resource: ResourceType,
        amount: u32,
        options: &QueryOptions,
    ) -> Option<QueryHit> {
        let origin = world.object(subject)?.pos.clone();
        let search = Search {
            subject,
            origin: &origin,
            resource,
            amount,
            options,
        };

        for (room, distance) in world.rooms_by_distance(&origin.room) {
            if distance > MAX_QUERY_DISTANCE {
                break;
            }
            if options.confined_in_room && room != origin.room {
                continue;
            }
            if !world.is_visible(&room) {
                continue;
            }
            if let Some(hit) = self.best_in_room(world, &room, &search) {
                return Some(hit);
            }
        }

        if options.direction == Direction::Retrieve && options.allow_purchase {
            self.request_purchase(origin.room, resource, amount);
        }
        None
    }

    fn best_in_room(&self, world: &dyn World, room: &RoomName, search: &Search<'_>) -> Option<QueryHit> {
        let options = search.options;
        let described: Vec<(ObjectId, Possession, bool)> = match options.direction {
            Direction::Retrieve => keyed(&self.retrieve, room, search.resource, &options.key, true)
                .into_iter()
                .map(|(d, fallback)| (d.object(), d.possession(), fallback))
                .collect(),
            Direction::Store => keyed(&self.store, room, search.resource, &options.key, true)
                .into_iter()
                .map(|(d, fallback)| (d.object(), d.possession(), fallback))
                .collect(),
        };

        let mut seen = BTreeSet::new();
        let mut candidates = Vec::new();
        for (id, possession, fallback) in described {
            if id == search.subject || !seen.insert(id) {
                continue;
            }
            let Some(object) = world.object(id) else {
                continue;
            };
            let allow_harvest = options.allow_harvest && options.direction == Direction::Retrieve;
            if !admits(object, possession, options.allowed_kinds.as_ref(), allow_harvest, true) {
                continue;
            }
            let available = self.amount(world, options.direction, id, search.resource);
            if available == 0 {
                continue;
            }
            let harvest = possession == Possession::Producing;
            let mut penalty = 0_i64;
            if fallback {
                penalty = penalty.saturating_add(DEFAULT_KEY_PENALTY);
            }
            if harvest {
                penalty = penalty.saturating_add(HARVEST_PENALTY);
            }
            let score = i64::from(available)
                .saturating_sub(i64::from(search.amount))
                .saturating_sub(penalty);
            let range = world
                .path_length(search.origin, &object.pos)
                .unwrap_or(u32::MAX);
            candidates.push(Candidate {
                object: id,
                pos: object.pos.clone(),
                available,
                harvest,
                penalty,
                score,
                range,
            });
        }

        let best_score = candidates
            .iter()
            .max_by_key(|c| (c.score, Reverse(c.range)));
        let pick = if options.ensure_amount {
            candidates
                .iter()
                .filter(|c| c.available >= search.amount)
                .min_by_key(|c| (c.penalty, c.available.saturating_sub(search.amount), c.range))
                .or(best_score)
        } else {
            best_score
        }?;

        Some(QueryHit {
            object: pick.object,
            room: room.clone(),
            pos: pick.pos.clone(),
            available: pick.available,
            harvest: pick.harvest,
        })
    }

    fn request_purchase(&mut self, room: RoomName, resource: ResourceType, amount: u32) {
        if self
            .purchase_requests
            .iter()
            .any(|r| r.room == room && r.resource == resource)
        {
            return;
        }
        info!(room = %room, resource = ?resource, amount, "purchase requested");
        self.purchase_requests.push(PurchaseRequest {
            room,
            resource,
            amount,
        });
    }

    /// Pending purchase requests.
    pub fn purchase_requests(&self) -> &[PurchaseRequest] {
        &self.purchase_requests
    }

    /// Hand pending purchase requests to the terminal.
    pub fn take_purchase_requests(&mut self) -> Vec<PurchaseRequest> {
        std::mem::take(&mut self.purchase_requests)
    }

    // -------------------------------------------------------------------
    // Settlement
    // -------------------------------------------------------------------

    /// Confirm a waiting transaction against the seller's unreserved stock
    /// and reserve its amount. Between two center members of one room the
    /// transaction is delegated to the center queue instead.
    pub fn confirm(&mut self, ledger: &mut Ledger, world: &dyn World, id: TransactionId) -> bool {
        let Some(tx) = ledger.transaction(id) else {
            return false;
        };
        if tx.state != TransactionState::WaitingForConfirm {
            return false;
        }
        let held = Held {
            seller: tx.seller,
            buyer: tx.buyer,
            resource: tx.resource(),
            amount: tx.amount(),
        };
        let available = self.available(world, held.seller, held.resource);

        if let Some(room) = self.center.shared_room(held.seller, held.buyer).cloned() {
            if !ledger.delegate(id, available) {
                return false;
            }
            self.hold(id, held);
            self.center.push(CenterOrder {
                room,
                from: held.seller,
                to: held.buyer,
                resource: held.resource,
                amount: held.amount,
                transaction: Some(id),
            });
            return true;
        }

        if !ledger.confirm(id, available) {
            debug!(transaction = %id, available, wanted = held.amount, "confirm refused");
            return false;
        }
        self.hold(id, held);
        true
    }

    /// Complete a working transaction and release its reservations.
    pub fn done(&mut self, ledger: &mut Ledger, id: TransactionId) -> bool {
        let settled = ledger.done(id);
        if settled {
            self.unhold(id);
        }
        settled
    }

    /// Cancel a transaction and release its reservations.
    pub fn cancel(&mut self, ledger: &mut Ledger, id: TransactionId) -> bool {
        let cancelled = ledger.cancel(id);
        if cancelled {
            self.unhold(id);
        }
        cancelled
    }

    fn hold(&mut self, id: TransactionId, held: Held) {
        self.reserve(held.seller, held.resource, Direction::Retrieve, held.amount);
        self.reserve(held.buyer, held.resource, Direction::Store, held.amount);
        self.held.insert(id, held);
    }

    fn unhold(&mut self, id: TransactionId) {
        if let Some(held) = self.held.remove(&id) {
            self.release(held.seller, held.resource, Direction::Retrieve, held.amount);
            self.release(held.buyer, held.resource, Direction::Store, held.amount);
        }
    }

    // -------------------------------------------------------------------
    // Center transfer
    // -------------------------------------------------------------------

    /// The same-room fast-path registry.
    pub const fn center(&self) -> &CenterTransfer {
        &self.center
    }

    /// Enroll a structure in its room's fast-path group.
    pub fn register_center(&mut self, room: RoomName, object: ObjectId) {
        self.center.register(room, object);
    }

    /// Queue an order that was not paid through a transaction.
    pub fn push_center_order(&mut self, order: CenterOrder) {
        self.center.push(order);
    }

    /// Execute one queued order per room. Returns units moved per room.
    pub fn run_center_transfers(&mut self, world: &mut dyn World) -> Vec<(RoomName, u32)> {
        let mut moved = Vec::new();
        for room in self.center.busy_rooms() {
            let Some(order) = self.center.pop(&room) else {
                continue;
            };
            let units = world.transfer_direct(order.from, order.to, order.resource, order.amount);
            if let Some(tx) = order.transaction {
                self.unhold(tx);
            }
            debug!(
                room = %room,
                from = %order.from,
                to = %order.to,
                resource = ?order.resource,
                units,
                "center transfer"
            );
            moved.push((room, units));
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_ledger::{LendingPolicy, TransactionBuilder};
    use hive_types::{BodyPart, Store};
    use hive_world::objects;
    use hive_world::{RoomState, WorldMap, WorldState};
    use rust_decimal::Decimal;

    fn world() -> WorldState {
        let mut map = WorldMap::new();
        assert!(map.add_room(RoomState::new("W1N1").owned()).is_ok());
        assert!(map.add_room(RoomState::new("W2N1")).is_ok());
        assert!(map.add_room(RoomState::new("W3N1")).is_ok());
        assert!(map.connect(&"W1N1".into(), &"W2N1".into()).is_ok());
        assert!(map.connect(&"W2N1".into(), &"W3N1".into()).is_ok());
        WorldState::new(map)
    }

    fn add(world: &mut WorldState, object: GameObject) -> ObjectId {
        let id = world.add_object(object);
        assert!(id.is_ok());
        id.unwrap_or_default()
    }

    fn container(world: &mut WorldState, room: &str, x: u8, energy: u32) -> ObjectId {
        let mut obj = objects::structure(ObjectKind::Container, Position::new(room, x, 10));
        obj.store = Some(Store::new(2_000).with(ResourceType::Energy, energy));
        add(world, obj)
    }

    fn creep(world: &mut WorldState, room: &str) -> ObjectId {
        add(
            world,
            objects::creep(
                Position::new(room, 10, 12),
                vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move],
                String::new(),
                0,
            ),
        )
    }

    fn giver(room: &str, id: ObjectId) -> ResourceDescriptor {
        ResourceDescriptor::new(room, id, Possession::Storing, ResourceType::Energy)
    }

    fn open(ledger: &mut Ledger, buyer: ObjectId, seller: ObjectId, amount: u32) -> TransactionId {
        let tx = TransactionBuilder::new(buyer, seller)
            .resource(ResourceType::Energy, amount)
            .money(Decimal::new(i64::from(amount), 2))
            .build();
        assert!(tx.is_ok());
        tx.map(|t| ledger.open(t)).unwrap_or_default()
    }

    #[test]
    fn confirmed_amount_is_subtracted_from_sum() {
        let mut world = world();
        let mut ledger = Ledger::new(LendingPolicy::Unlimited);
        let mut resources = ResourceManager::new();
        let box_id = container(&mut world, "W1N1", 10, 100);
        let worker = creep(&mut world, "W1N1");
        resources.register(giver("W1N1", box_id));

        let room = RoomName::from("W1N1");
        let opts = SumOptions::default();
        assert_eq!(resources.sum(&world, &room, ResourceType::Energy, &opts), 100);

        let hit = resources.query(&world, worker, ResourceType::Energy, 50, &QueryOptions::default());
        assert_eq!(hit.as_ref().map(|h| h.object), Some(box_id));

        let tx = open(&mut ledger, worker, box_id, 50);
        assert!(resources.confirm(&mut ledger, &world, tx));
        assert_eq!(resources.sum(&world, &room, ResourceType::Energy, &opts), 50);

        assert!(resources.cancel(&mut ledger, tx));
        assert_eq!(resources.sum(&world, &room, ResourceType::Energy, &opts), 100);
    }

    #[test]
    fn confirm_never_overcommits_a_seller() {
        let mut world = world();
        let mut ledger = Ledger::new(LendingPolicy::Unlimited);
        let mut resources = ResourceManager::new();
        let box_id = container(&mut world, "W1N1", 10, 100);
        resources.register(giver("W1N1", box_id));

        let first = open(&mut ledger, ObjectId::new(), box_id, 60);
        let second = open(&mut ledger, ObjectId::new(), box_id, 60);
        assert!(resources.confirm(&mut ledger, &world, first));
        assert!(!resources.confirm(&mut ledger, &world, second));
        assert_eq!(resources.reserved(box_id, ResourceType::Energy, Direction::Retrieve), 60);

        assert!(resources.done(&mut ledger, first));
        assert_eq!(resources.reserved(box_id, ResourceType::Energy, Direction::Retrieve), 0);
    }

    #[test]
    fn query_excludes_subject() {
        let mut world = world();
        let mut resources = ResourceManager::new();
        let box_id = container(&mut world, "W1N1", 10, 100);
        resources.register(giver("W1N1", box_id));
        let hit = resources.query(&world, box_id, ResourceType::Energy, 10, &QueryOptions::default());
        assert!(hit.is_none());
    }

    #[test]
    fn stores_beat_harvesting() {
        let mut world = world();
        let mut resources = ResourceManager::new();
        let worker = creep(&mut world, "W1N1");
        let source = add(
            &mut world,
            objects::deposit(
                ObjectKind::Source,
                ResourceType::Energy,
                Position::new("W1N1", 10, 11),
                3_000,
                10,
            ),
        );
        let box_id = container(&mut world, "W1N1", 30, 20);
        resources.register(ResourceDescriptor::new(
            "W1N1",
            source,
            Possession::Producing,
            ResourceType::Energy,
        ));
        resources.register(giver("W1N1", box_id));

        let hit = resources.query(&world, worker, ResourceType::Energy, 50, &QueryOptions::default());
        assert_eq!(hit.as_ref().map(|h| h.object), Some(box_id));

        let no_harvest = QueryOptions {
            allow_harvest: false,
            ..QueryOptions::default()
        };
        let only_source = resources.query(&world, worker, ResourceType::Energy, 50, &no_harvest);
        assert_eq!(only_source.map(|h| h.harvest), Some(false));
    }

    #[test]
    fn ensure_amount_picks_best_fit() {
        let mut world = world();
        let mut resources = ResourceManager::new();
        let worker = creep(&mut world, "W1N1");
        let small = container(&mut world, "W1N1", 11, 40);
        let snug = container(&mut world, "W1N1", 12, 60);
        let large = container(&mut world, "W1N1", 13, 500);
        for id in [small, snug, large] {
            resources.register(giver("W1N1", id));
        }

        let fit = QueryOptions {
            ensure_amount: true,
            ..QueryOptions::default()
        };
        let hit = resources.query(&world, worker, ResourceType::Energy, 50, &fit);
        assert_eq!(hit.map(|h| h.object), Some(snug));

        let greedy = resources.query(&world, worker, ResourceType::Energy, 50, &QueryOptions::default());
        assert_eq!(greedy.map(|h| h.object), Some(large));

        let too_much = resources.query(&world, worker, ResourceType::Energy, 900, &fit);
        assert_eq!(too_much.map(|h| h.object), Some(large));
    }

    #[test]
    fn nearer_room_wins_and_far_rooms_are_skipped() {
        let mut world = world();
        let mut resources = ResourceManager::new();
        let worker = creep(&mut world, "W1N1");
        let near = container(&mut world, "W2N1", 10, 10);
        let far = container(&mut world, "W3N1", 10, 1_000);
        resources.register(giver("W2N1", near));
        resources.register(giver("W3N1", far));

        let hit = resources.query(&world, worker, ResourceType::Energy, 50, &QueryOptions::default());
        assert_eq!(hit.map(|h| h.object), Some(near));

        let confined = QueryOptions {
            confined_in_room: true,
            allow_purchase: true,
            ..QueryOptions::default()
        };
        assert!(
            resources
                .query(&world, worker, ResourceType::Energy, 50, &confined)
                .is_none()
        );
        assert_eq!(resources.purchase_requests().len(), 1);
        assert_eq!(resources.take_purchase_requests().len(), 1);
        assert!(resources.purchase_requests().is_empty());
    }

    #[test]
    fn keyed_lookup_prefers_exact_key() {
        let mut world = world();
        let mut resources = ResourceManager::new();
        let worker = creep(&mut world, "W1N1");
        let plain = container(&mut world, "W1N1", 11, 900);
        let labelled = container(&mut world, "W1N1", 12, 100);
        resources.register(giver("W1N1", plain));
        resources.register(giver("W1N1", labelled).key("lab"));

        let opts = QueryOptions {
            key: "lab".to_owned(),
            ..QueryOptions::default()
        };
        let hit = resources.query(&world, worker, ResourceType::Energy, 50, &opts);
        assert_eq!(hit.map(|h| h.object), Some(labelled));

        let room = RoomName::from("W1N1");
        let keyed = SumOptions {
            key: "lab".to_owned(),
            ..SumOptions::default()
        };
        assert_eq!(resources.sum(&world, &room, ResourceType::Energy, &keyed), 1_000);
        let exclusive = SumOptions {
            exclude_default: true,
            ..keyed
        };
        assert_eq!(resources.sum(&world, &room, ResourceType::Energy, &exclusive), 100);
    }

    #[test]
    fn store_query_finds_free_capacity() {
        let mut world = world();
        let mut resources = ResourceManager::new();
        let worker = creep(&mut world, "W1N1");
        let full = container(&mut world, "W1N1", 11, 2_000);
        let roomy = container(&mut world, "W1N1", 12, 0);
        for id in [full, roomy] {
            resources.register(StoringDescriptor::new("W1N1", id, ResourceType::Energy));
        }
        let hit = resources.query(&world, worker, ResourceType::Energy, 50, &QueryOptions::store());
        assert_eq!(hit.map(|h| h.object), Some(roomy));
    }

    #[test]
    fn destroyed_structure_is_pruned() {
        let mut world = world();
        let mut resources = ResourceManager::new();
        let box_id = container(&mut world, "W1N1", 10, 100);
        resources.register(giver("W1N1", box_id));
        let room = RoomName::from("W1N1");
        assert_eq!(resources.sum(&world, &room, ResourceType::Energy, &SumOptions::default()), 100);

        assert!(world.remove_object(box_id).is_some());
        assert_eq!(resources.on_structure_destroyed(&world, &room), 1);
        assert_eq!(resources.registrations(&room), 0);
        assert_eq!(resources.sum(&world, &room, ResourceType::Energy, &SumOptions::default()), 0);
    }

    #[test]
    fn center_members_delegate_and_transfer() {
        let mut world = world();
        let mut ledger = Ledger::new(LendingPolicy::Unlimited);
        let mut resources = ResourceManager::new();
        let from = container(&mut world, "W1N1", 10, 100);
        let to = container(&mut world, "W1N1", 11, 0);
        resources.register_center("W1N1".into(), from);
        resources.register_center("W1N1".into(), to);

        let tx = open(&mut ledger, to, from, 40);
        assert!(resources.confirm(&mut ledger, &world, tx));
        assert_eq!(ledger.state(tx), Some(TransactionState::Delegated));
        assert_eq!(resources.reserved(from, ResourceType::Energy, Direction::Retrieve), 40);

        let moved = resources.run_center_transfers(&mut world);
        assert_eq!(moved, vec![(RoomName::from("W1N1"), 40)]);
        assert_eq!(resources.reserved(from, ResourceType::Energy, Direction::Retrieve), 0);
        assert_eq!(world.object(to).map(|o| o.stored(ResourceType::Energy)), Some(40));
    }
}
