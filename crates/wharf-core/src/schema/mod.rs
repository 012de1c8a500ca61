//! Contract interface schema value types.
//!
//! An interface schema describes a contract's on-chain surface: the record
//! layouts (structs) it serializes and the tables that store them. Schemas are
//! parsed from the JSON `.abi` artifact or fetched from the chain's read API,
//! and compared structurally by [`diff`](crate::schema::diff::diff).

pub mod codec;
pub mod diff;

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// One field of a record layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Field-level structural definition of one record type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructDef {
    pub name: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A named on-chain table and the record type it stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub index_type: String,
}

/// Immutable description of a contract's tables and record layouts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterfaceSchema {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub structs: Vec<StructDef>,
    #[serde(default)]
    pub tables: Vec<TableDef>,
}

impl InterfaceSchema {
    /// Parse a schema from its JSON text form.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("Failed to parse interface schema JSON")
    }

    /// Read and parse a schema artifact file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Invalid schema file: {}", path.display()))
    }

    /// Look up a table by name.
    pub fn find_table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Look up a record layout by name.
    pub fn find_struct(&self, name: &str) -> Option<&StructDef> {
        self.structs.iter().find(|s| s.name == name)
    }
}

/// Deep structural equality of two (possibly unresolved) record layouts.
///
/// The comparison is an explicit recursive field-by-field walk rather than a
/// derived `Eq`, so its semantics stay auditable: names, base types, field
/// order, field names and field types must all agree. An unresolved layout
/// never equals a resolved one; two unresolved layouts compare equal.
pub fn records_structurally_equal(a: Option<&StructDef>, b: Option<&StructDef>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => struct_eq(a, b),
        _ => false,
    }
}

fn struct_eq(a: &StructDef, b: &StructDef) -> bool {
    if a.name != b.name || a.base != b.base || a.fields.len() != b.fields.len() {
        return false;
    }
    a.fields
        .iter()
        .zip(&b.fields)
        .all(|(fa, fb)| fa.name == fb.name && fa.type_name == fb.type_name)
}
