//! Entity trait: records identified by id rather than by value.

/// A record whose identity is its id; every other field may change.
///
/// Stores use this to locate records in their owned collections.
pub trait Entity {
    /// Strongly-typed identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the identifier.
    fn id(&self) -> Self::Id;
}

/// Position of the entity with `id` inside `records`, if present.
pub fn position_of<E: Entity>(records: &[E], id: E::Id) -> Option<usize> {
    records.iter().position(|r| r.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Row(u32);

    impl Entity for Row {
        type Id = u32;

        fn id(&self) -> u32 {
            self.0
        }
    }

    #[test]
    fn position_of_finds_by_id() {
        let rows = vec![Row(3), Row(9), Row(4)];
        assert_eq!(position_of(&rows, 9), Some(1));
        assert_eq!(position_of(&rows, 7), None);
    }
}
