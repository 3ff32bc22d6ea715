//! Regeneration and harvesting for deposits (sources and minerals).
//!
//! A deposit keeps its stock in a [`Store`] whose capacity is the deposit's
//! ceiling. Regeneration adds `regen_per_tick` each tick, capped at the
//! ceiling. Harvesting removes up to the requested amount.

use hive_types::{ResourceType, Store};

use crate::error::WorldError;

/// Apply one tick of regeneration. Returns the units actually added.
///
/// # Errors
///
/// Returns [`WorldError::ArithmeticOverflow`] if checked arithmetic fails.
pub fn regenerate(
    store: &mut Store,
    resource: ResourceType,
    regen_per_tick: u32,
) -> Result<u32, WorldError> {
    let headroom = store
        .capacity()
        .checked_sub(store.used())
        .ok_or(WorldError::ArithmeticOverflow)?;
    let added = regen_per_tick.min(headroom);
    if added == 0 {
        return Ok(0);
    }
    Ok(store.add(resource, added))
}

/// Take up to `requested` units from a deposit. Returns the units removed.
pub fn harvest(store: &mut Store, resource: ResourceType, requested: u32) -> u32 {
    store.remove(resource, requested)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regen_adds_rate() {
        let mut store = Store::new(3000).with(ResourceType::Energy, 100);
        let added = regenerate(&mut store, ResourceType::Energy, 10);
        assert_eq!(added.ok(), Some(10));
        assert_eq!(store.get(ResourceType::Energy), 110);
    }

    #[test]
    fn regen_capped_at_capacity() {
        let mut store = Store::new(100).with(ResourceType::Energy, 95);
        let added = regenerate(&mut store, ResourceType::Energy, 10);
        assert_eq!(added.ok(), Some(5));
        assert_eq!(store.free(), 0);
    }

    #[test]
    fn regen_full_deposit_is_noop() {
        let mut store = Store::new(100).with(ResourceType::Energy, 100);
        assert_eq!(regenerate(&mut store, ResourceType::Energy, 10).ok(), Some(0));
    }

    #[test]
    fn harvest_partial_when_scarce() {
        let mut store = Store::new(100).with(ResourceType::Hydrogen, 3);
        assert_eq!(harvest(&mut store, ResourceType::Hydrogen, 10), 3);
        assert!(store.is_empty());
    }
}
