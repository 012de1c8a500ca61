//! Structural diffing of a deployed schema against a candidate.

use std::collections::BTreeSet;

use super::{InterfaceSchema, records_structurally_equal};

/// Tables in the deployed schema that a candidate schema would regress.
///
/// `removed` and `updated` are disjoint by construction: a table is either
/// absent from the candidate, present with a changed record layout, or
/// present unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    /// Tables that exist on chain but are absent from the candidate.
    pub removed: BTreeSet<String>,
    /// Tables whose record layout differs structurally in the candidate.
    pub updated: BTreeSet<String>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.updated.is_empty()
    }
}

/// Compare a deployed schema against a candidate.
///
/// Only regressions against what is already live are reported; tables newly
/// added by the candidate are ignored. Pure, no I/O.
pub fn diff(existing: &InterfaceSchema, candidate: &InterfaceSchema) -> SchemaDiff {
    let mut result = SchemaDiff::default();

    for table in &existing.tables {
        let Some(counterpart) = candidate.find_table(&table.name) else {
            result.removed.insert(table.name.clone());
            continue;
        };

        // A record lookup miss is tolerated: the unresolved side compares as
        // never-equal to a resolved layout, which lands the table in
        // `updated` rather than failing the diff.
        let existing_record = existing.find_struct(&table.record_type);
        let candidate_record = candidate.find_struct(&counterpart.record_type);
        if !records_structurally_equal(existing_record, candidate_record) {
            result.updated.insert(table.name.clone());
        }
    }

    result
}
