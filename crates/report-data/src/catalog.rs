//! Reference tables used for foreign-key resolution.

use std::collections::HashMap;

use report_core::models::{CourseEntry, MembershipEntry};

/// A catalog row that can be looked up by identifier.
pub trait CatalogEntry {
    /// The identifier column, if the row has one.
    fn key(&self) -> Option<&str>;
}

impl CatalogEntry for CourseEntry {
    fn key(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl CatalogEntry for MembershipEntry {
    fn key(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Read-only table indexed by identifier. The first row wins on duplicates.
#[derive(Debug, Clone)]
pub struct Catalog<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

pub type CourseCatalog = Catalog<CourseEntry>;
pub type MembershipCatalog = Catalog<MembershipEntry>;

impl<T: CatalogEntry> Catalog<T> {
    pub fn new(entries: Vec<T>) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            if let Some(key) = entry.key() {
                index.entry(key.to_string()).or_insert(pos);
            }
        }
        Self { entries, index }
    }

    /// Exact-match lookup on the identifier column.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: CatalogEntry> FromIterator<T> for Catalog<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(id: &str, name: &str) -> MembershipEntry {
        MembershipEntry {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
        }
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let catalog: MembershipCatalog =
            vec![membership("m1", "Pro"), membership("m2", "Basic")].into_iter().collect();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("m2").and_then(|m| m.name.as_deref()), Some("Basic"));
        assert!(catalog.get("m3").is_none());
    }

    #[test]
    fn test_first_duplicate_wins() {
        let catalog = MembershipCatalog::new(vec![membership("m1", "First"), membership("m1", "Second")]);
        assert_eq!(catalog.get("m1").and_then(|m| m.name.as_deref()), Some("First"));
    }

    #[test]
    fn test_rows_without_id_are_not_indexed() {
        let catalog = CourseCatalog::new(vec![CourseEntry::default()]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("").is_none());
    }
}
