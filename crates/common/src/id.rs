//! ID generation utilities.

use ulid::Ulid;

/// ID generator for entity primary keys.
///
/// IDs are lowercase ULIDs: 26 characters, sortable by creation time.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ID.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Whether `value` looks like an ID produced by [`Self::generate`].
    ///
    /// Used to tell IDs apart from slugs in `/{idOrSlug}` routes.
    #[must_use]
    pub fn is_id(value: &str) -> bool {
        value.len() == 26 && Ulid::from_string(&value.to_uppercase()).is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_lowercase());
    }

    #[test]
    fn test_is_id_distinguishes_slugs() {
        let id = IdGenerator::new().generate();
        assert!(IdGenerator::is_id(&id));
        assert!(!IdGenerator::is_id("sea-view-flat"));
        assert!(!IdGenerator::is_id("sea-view-flat-with-garden-1"));
    }
}
