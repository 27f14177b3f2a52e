//! Translation of localized answer tokens into canonical labels.

use crate::models::Table;
use std::collections::BTreeMap;
use tracing::debug;

/// Rewrites whole-cell tokens table-wide.
///
/// Every cell of every column equal to a mapped key is replaced, so a
/// column unrelated to the yes/no questions holding the same token is
/// rewritten too. Headers are left alone.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelNormalizer {
    replacements: BTreeMap<String, String>,
}

impl Default for LabelNormalizer {
    fn default() -> Self {
        Self::new(default_replacements())
    }
}

/// Built-in German to English answer tokens.
pub fn default_replacements() -> BTreeMap<String, String> {
    [("Ja", "Yes"), ("Nein", "No"), ("Unentschlossen", "Don't know")]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

impl LabelNormalizer {
    pub fn new(replacements: BTreeMap<String, String>) -> Self {
        Self { replacements }
    }

    /// Replaces matching cells in place and returns how many were changed.
    pub fn normalize(&self, table: &mut Table) -> usize {
        let mut replaced = 0;
        for cell in table.cells_mut() {
            let Some(value) = cell.as_deref() else {
                continue;
            };
            if let Some(canonical) = self.replacements.get(value) {
                if canonical != value {
                    *cell = Some(canonical.clone());
                    replaced += 1;
                }
            }
        }
        debug!("Normalized {} cells", replaced);
        replaced
    }
}
