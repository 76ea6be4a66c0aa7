//! Field registry: the static placement table consumed by both the overlay
//! and the fill engine

mod dqf_packet;

use crate::coords::{denormalize, normalize};
use crate::error::DqfError;
use dqf_types::{CoordinateSpace, FieldDefinition, PageDimensions};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

pub use dqf_packet::{dqf_packet, PACKET_PAGE_COUNT};

/// Serialized form of a registry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    space: CoordinateSpace,
    #[serde(default)]
    internal_pages: BTreeSet<u32>,
    fields: Vec<FieldDefinition>,
}

/// Immutable, validated set of field placements in a single coordinate space
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    space: CoordinateSpace,
    fields: Vec<FieldDefinition>,
    internal_pages: BTreeSet<u32>,
    index: HashMap<String, usize>,
}

impl FieldRegistry {
    /// Build a registry, asserting unique ids and 1-indexed pages
    pub fn new(
        space: CoordinateSpace,
        fields: Vec<FieldDefinition>,
        internal_pages: impl IntoIterator<Item = u32>,
    ) -> Result<Self, DqfError> {
        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if field.id.is_empty() {
                return Err(DqfError::Registry(format!("field #{} has an empty id", i)));
            }
            if field.page == 0 {
                return Err(DqfError::Registry(format!(
                    "field '{}' has page 0 (pages are 1-indexed)",
                    field.id
                )));
            }
            if index.insert(field.id.clone(), i).is_some() {
                return Err(DqfError::Registry(format!(
                    "duplicate field id '{}'",
                    field.id
                )));
            }
        }

        Ok(Self {
            space,
            fields,
            internal_pages: internal_pages.into_iter().collect(),
            index,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, DqfError> {
        let document: RegistryDocument = serde_json::from_str(json)?;
        Self::new(document.space, document.fields, document.internal_pages)
    }

    pub fn to_json(&self) -> Result<String, DqfError> {
        let document = RegistryDocument {
            space: self.space,
            internal_pages: self.internal_pages.clone(),
            fields: self.fields.clone(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn space(&self) -> CoordinateSpace {
        self.space
    }

    /// All fields in registry order
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&FieldDefinition> {
        self.index.get(id).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Fields on a page, in registry order
    pub fn fields_on_page(&self, page: u32) -> Vec<&FieldDefinition> {
        self.fields.iter().filter(|f| f.page == page).collect()
    }

    /// Pages flagged for carrier use only
    pub fn internal_pages(&self) -> &BTreeSet<u32> {
        &self.internal_pages
    }

    pub fn is_internal_page(&self, page: u32) -> bool {
        self.internal_pages.contains(&page)
    }

    /// First page after `after` that the applicant fills in
    pub fn next_user_page(&self, after: u32, page_count: u32) -> Option<u32> {
        (after + 1..=page_count).find(|p| !self.is_internal_page(*p))
    }

    /// Last user-facing page before `before`
    pub fn previous_user_page(&self, before: u32) -> Option<u32> {
        (1..before).rev().find(|p| !self.is_internal_page(*p))
    }

    /// Highest page referenced by any field
    pub fn max_page(&self) -> u32 {
        self.fields.iter().map(|f| f.page).max().unwrap_or(0)
    }

    /// Fields that a template with `page_count` pages cannot hold
    pub fn pages_out_of_range(&self, page_count: u32) -> Vec<&FieldDefinition> {
        self.fields.iter().filter(|f| f.page > page_count).collect()
    }

    /// Sections in first-seen order
    pub fn sections(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.fields
            .iter()
            .map(|f| f.section.as_str())
            .filter(|s| !s.is_empty() && seen.insert(*s))
            .collect()
    }

    /// Re-express every placement in another coordinate space.
    ///
    /// `page_dims` gives each page's native size; pages not listed use Letter.
    pub fn convert_to(
        &self,
        space: CoordinateSpace,
        page_dims: impl Fn(u32) -> PageDimensions,
    ) -> FieldRegistry {
        if space == self.space {
            return self.clone();
        }

        let fields = self
            .fields
            .iter()
            .map(|field| {
                let dims = page_dims(field.page);
                let abs = normalize(field, self.space, dims);
                let (x, y, width, height) = denormalize(&abs, space, dims);
                FieldDefinition {
                    x,
                    y,
                    width,
                    height,
                    ..field.clone()
                }
            })
            .collect();

        FieldRegistry {
            space,
            fields,
            internal_pages: self.internal_pages.clone(),
            index: self.index.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dqf_types::FieldKind;
    use pretty_assertions::assert_eq;

    fn sample() -> FieldRegistry {
        FieldRegistry::new(
            CoordinateSpace::PdfPoints,
            vec![
                FieldDefinition::text("firstName", 1, 72.0, 650.0, 120.0).required(),
                FieldDefinition::text("lastName", 1, 250.0, 650.0, 120.0),
                FieldDefinition::checkbox("felony_yes", 4, 400.0, 500.0),
                FieldDefinition::checkbox("felony_no", 4, 440.0, 500.0),
            ],
            [2, 3],
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_and_page_enumeration() {
        let registry = sample();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get("felony_no").unwrap().page, 4);
        assert!(registry.get("missing").is_none());

        let ids: Vec<&str> = registry
            .fields_on_page(1)
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(ids, vec!["firstName", "lastName"]);
        assert!(registry.fields_on_page(2).is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = FieldRegistry::new(
            CoordinateSpace::PdfPoints,
            vec![
                FieldDefinition::text("ssn", 1, 0.0, 0.0, 50.0),
                FieldDefinition::text("ssn", 2, 0.0, 0.0, 50.0),
            ],
            [],
        );
        assert!(matches!(result, Err(DqfError::Registry(msg)) if msg.contains("duplicate")));
    }

    #[test]
    fn test_page_zero_rejected() {
        let result = FieldRegistry::new(
            CoordinateSpace::PdfPoints,
            vec![FieldDefinition::new("x", FieldKind::Text, 0, 0.0, 0.0)],
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_user_page_navigation() {
        let registry = sample();
        assert_eq!(registry.next_user_page(1, 5), Some(4));
        assert_eq!(registry.next_user_page(4, 5), Some(5));
        assert_eq!(registry.next_user_page(5, 5), None);
        assert_eq!(registry.previous_user_page(4), Some(1));
        assert_eq!(registry.previous_user_page(1), None);
    }

    #[test]
    fn test_out_of_range() {
        let registry = sample();
        let out: Vec<&str> = registry
            .pages_out_of_range(3)
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(out, vec!["felony_yes", "felony_no"]);
        assert!(registry.pages_out_of_range(4).is_empty());
    }

    #[test]
    fn test_json_roundtrip_preserves_table() {
        let registry = sample();
        let json = registry.to_json().unwrap();
        let restored = FieldRegistry::from_json(&json).unwrap();
        assert_eq!(restored.fields(), registry.fields());
        assert_eq!(restored.internal_pages(), registry.internal_pages());
        assert_eq!(restored.space(), CoordinateSpace::PdfPoints);
    }

    #[test]
    fn test_from_json_validates() {
        let json = r#"{"fields":[
            {"id":"a","page":1,"x":0,"y":0,"width":10,"height":10,"kind":"text","font_size":9},
            {"id":"a","page":1,"x":0,"y":0,"width":10,"height":10,"kind":"text","font_size":9}
        ]}"#;
        assert!(FieldRegistry::from_json(json).is_err());
    }

    #[test]
    fn test_convert_to_percent_and_back() {
        let registry = sample();
        let letter = |_| PageDimensions::letter();
        let percent = registry.convert_to(CoordinateSpace::PagePercent, letter);
        assert_eq!(percent.space(), CoordinateSpace::PagePercent);

        let first = percent.get("firstName").unwrap();
        assert!((first.x - 72.0 / 612.0 * 100.0).abs() < 1e-9);

        let back = percent.convert_to(CoordinateSpace::PdfPoints, letter);
        for (a, b) in registry.fields().iter().zip(back.fields()) {
            assert!((a.x - b.x).abs() < 1e-9);
            assert!((a.y - b.y).abs() < 1e-9);
            assert!((a.width - b.width).abs() < 1e-9);
            assert!((a.height - b.height).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sections_first_seen_order() {
        let registry = FieldRegistry::new(
            CoordinateSpace::PdfPoints,
            vec![
                FieldDefinition::text("a", 1, 0.0, 0.0, 10.0).section("Applicant"),
                FieldDefinition::text("b", 1, 0.0, 0.0, 10.0).section("License"),
                FieldDefinition::text("c", 2, 0.0, 0.0, 10.0).section("Applicant"),
            ],
            [],
        )
        .unwrap();
        assert_eq!(registry.sections(), vec!["Applicant", "License"]);
    }
}
