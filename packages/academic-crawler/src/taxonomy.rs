//! Field/specialty taxonomy used to translate configured filter ids into
//! the exact names candidate labels are compared against.

use serde::{Deserialize, Serialize};

use crate::traits::TaxonomyResolver;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialtyEntry {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEntry {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub specialties: Vec<SpecialtyEntry>,
}

/// Taxonomy backed by a static field list, typically deserialized from
/// the directory's published `fields.json`.
#[derive(Debug, Clone, Default)]
pub struct StaticTaxonomy {
    fields: Vec<FieldEntry>,
}

impl StaticTaxonomy {
    pub fn new(fields: Vec<FieldEntry>) -> Self {
        Self { fields }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        Ok(Self {
            fields: serde_json::from_str(json)?,
        })
    }

    pub fn fields(&self) -> &[FieldEntry] {
        &self.fields
    }
}

impl TaxonomyResolver for StaticTaxonomy {
    fn field_name_by_id(&self, field_id: u32) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.id == field_id)
            .map(|field| field.name.as_str())
    }

    fn specialty_name_by_id(&self, field_id: u32, specialty_id: u32) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.id == field_id)?
            .specialties
            .iter()
            .find(|specialty| specialty.id == specialty_id)
            .map(|specialty| specialty.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS_JSON: &str = r#"[
        {
            "id": 1,
            "name": "Fen Bilimleri",
            "specialties": [
                { "id": 10, "name": "Biyoloji" },
                { "id": 11, "name": "Kimya" }
            ]
        },
        { "id": 2, "name": "Mühendislik" }
    ]"#;

    #[test]
    fn resolves_names_by_id() {
        let taxonomy = StaticTaxonomy::from_json(FIELDS_JSON).unwrap();
        assert_eq!(taxonomy.field_name_by_id(1), Some("Fen Bilimleri"));
        assert_eq!(taxonomy.field_name_by_id(99), None);
        assert_eq!(taxonomy.specialty_name_by_id(1, 11), Some("Kimya"));
        assert_eq!(taxonomy.specialty_name_by_id(1, 99), None);
        // Specialties resolve within their field only.
        assert_eq!(taxonomy.specialty_name_by_id(2, 10), None);
    }

    #[test]
    fn fields_without_specialties_deserialize() {
        let taxonomy = StaticTaxonomy::from_json(FIELDS_JSON).unwrap();
        assert_eq!(taxonomy.fields()[1].specialties.len(), 0);
    }
}
