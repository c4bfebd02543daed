//! Tuning knobs for a [`Forest`](crate::Forest).

/// Options controlling how a forest allocates and checks itself.
///
/// ```
/// use flatforest::{Forest, ForestOptions};
///
/// let options = ForestOptions::default()
///     .with_sequence_capacity(32)
///     .with_verify_invariants(true);
/// let forest: Forest<&str> = Forest::with_options(options);
/// assert!(forest.options().verify_invariants);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ForestOptions {
    /// Initial capacity of the flattened sequence a new root allocates.
    pub sequence_capacity: usize,
    /// Run the full invariant check after every structural mutation. A failed check
    /// is treated as corruption and panics.
    pub verify_invariants: bool,
}

impl ForestOptions {
    pub const DEFAULT_SEQUENCE_CAPACITY: usize = 8;

    pub fn with_sequence_capacity(mut self, capacity: usize) -> Self {
        self.sequence_capacity = capacity;
        self
    }

    pub fn with_verify_invariants(mut self, verify: bool) -> Self {
        self.verify_invariants = verify;
        self
    }
}

impl Default for ForestOptions {
    fn default() -> Self {
        ForestOptions {
            sequence_capacity: Self::DEFAULT_SEQUENCE_CAPACITY,
            verify_invariants: cfg!(debug_assertions),
        }
    }
}

#[cfg(test)]
mod test {
    use super::ForestOptions;

    #[test]
    fn defaults() {
        let options = ForestOptions::default();
        assert_eq!(options.sequence_capacity, 8);
        assert_eq!(options.verify_invariants, cfg!(debug_assertions));
    }

    #[test]
    fn builder_overrides() {
        let options = ForestOptions::default()
            .with_sequence_capacity(1)
            .with_verify_invariants(false);
        assert_eq!(options.sequence_capacity, 1);
        assert!(!options.verify_invariants);
    }
}
