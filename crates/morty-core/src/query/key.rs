use crate::models::CharacterFilters;

/// Resource family a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    CharacterList,
    Character,
    EpisodeBatch,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::CharacterList => "characters",
            QueryKind::Character => "character",
            QueryKind::EpisodeBatch => "episodes",
        }
    }
}

/// Cache address: resource kind plus its resolved parameters.
///
/// Keys are plain values, so two requests with field-wise equal parameters
/// always land on the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKey {
    Characters(CharacterFilters),
    Character(i64),
    Episodes(Vec<i64>),
}

impl QueryKey {
    pub fn characters(filters: &CharacterFilters) -> Self {
        QueryKey::Characters(filters.clone())
    }

    pub fn character(id: i64) -> Self {
        QueryKey::Character(id)
    }

    pub fn episodes(ids: &[i64]) -> Self {
        QueryKey::Episodes(ids.to_vec())
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            QueryKey::Characters(_) => QueryKind::CharacterList,
            QueryKey::Character(_) => QueryKind::Character,
            QueryKey::Episodes(_) => QueryKind::EpisodeBatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use super::*;
    use crate::models::StatusFilter;

    fn hash_of(key: &QueryKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equal_filters_produce_identical_keys() {
        // Built in a different order, from separate allocations.
        let a = CharacterFilters::new().with_name("rick").with_page(1);
        let b = CharacterFilters::new().with_page(1).with_name("rick");
        let ka = QueryKey::characters(&a);
        let kb = QueryKey::characters(&b);
        assert_eq!(ka, kb);
        assert_eq!(hash_of(&ka), hash_of(&kb));
    }

    #[test]
    fn test_filters_differing_in_any_field_produce_distinct_keys() {
        let base = CharacterFilters::new().with_name("rick").with_page(1);
        let variants = [
            base.clone().with_name("morty"),
            base.clone().with_page(2),
            base.clone().with_status(Some(StatusFilter::Alive)),
            base.clone().with_species("Human"),
            base.clone().with_type("Clone"),
            CharacterFilters::new().with_page(1),
        ];
        let base_key = QueryKey::characters(&base);
        for filters in &variants {
            assert_ne!(QueryKey::characters(filters), base_key, "{:?}", filters);
        }
    }

    #[test]
    fn test_kinds_never_collide() {
        assert_ne!(QueryKey::character(1), QueryKey::episodes(&[1]));
        assert_eq!(QueryKey::episodes(&[1, 2]).kind(), QueryKind::EpisodeBatch);
        assert_eq!(QueryKey::character(7).kind().as_str(), "character");
    }
}
