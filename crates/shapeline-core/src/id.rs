use slotmap::new_key_type;

new_key_type! {
    /// Identifies a building entity registered with the engine.
    pub struct EntityId;

    /// Identifies a transfer link between an ejector slot and an acceptor slot.
    pub struct LinkId;
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn entity_ids_are_stable_across_removals() {
        let mut map: SlotMap<EntityId, u32> = SlotMap::with_key();
        let a = map.insert(1);
        let b = map.insert(2);
        map.remove(a);
        // b stays valid, a's slot is reusable but the old key is dead.
        assert_eq!(map.get(b), Some(&2));
        assert_eq!(map.get(a), None);
    }
}
