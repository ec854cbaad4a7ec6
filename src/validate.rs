//! Structural validation of a document model.
//!
//! Advisory only: nothing in the pipeline calls this automatically. It is
//! meant for hand-built or deserialised documents.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{BlockType, DocumentModel, SCHEMA_VERSION};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Check a document for the structure every stage relies on.
pub fn validate_document(doc: &DocumentModel) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if doc.version.is_empty() {
        errors.push("Missing version".to_string());
    } else if doc.version != SCHEMA_VERSION {
        warnings.push(format!(
            "Document version {} differs from current schema {SCHEMA_VERSION}",
            doc.version
        ));
    }
    if !doc.layout.is_set() {
        errors.push("Missing layout configuration".to_string());
    }

    if !doc.has_block_type(BlockType::Header) {
        errors.push("Missing header block".to_string());
    }
    match doc.blocks_of_type(BlockType::Footer).count() {
        0 => errors.push("Missing footer block".to_string()),
        1 => {}
        n => errors.push(format!("Expected one footer block, found {n}")),
    }

    let mut seen = HashSet::new();
    let mut last_order = None;
    for (index, block) in doc.blocks.iter().enumerate() {
        if block.id.is_empty() {
            errors.push(format!("Block at index {index} missing id"));
        } else if !seen.insert(block.id.as_str()) {
            errors.push(format!("Duplicate block id {}", block.id));
        }
        if last_order.is_some_and(|prev| block.order <= prev) {
            errors.push(format!(
                "Block {} has order {} after {}",
                block.id,
                block.order,
                last_order.unwrap_or_default()
            ));
        }
        last_order = Some(block.order);

        if block.content.is_empty() {
            warnings.push(format!("Block {} has no content", block.id));
        }
    }

    if doc.meta.block_count != doc.blocks.len() {
        warnings.push(format!(
            "Metadata block count {} does not match {} block(s)",
            doc.meta.block_count,
            doc.blocks.len()
        ));
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::compose;
    use crate::fields::ProposalFields;
    use crate::model::deserialize_document;

    #[test]
    fn composed_document_is_valid() {
        let report = validate_document(&compose(&ProposalFields::default()));
        assert!(report.valid, "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn missing_footer_and_duplicates_are_errors() {
        let mut doc = compose(&ProposalFields::default());
        doc.blocks.retain(|b| b.block_type != BlockType::Footer);
        let dup = doc.blocks[0].clone();
        doc.blocks.push(dup);

        let report = validate_document(&doc);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e == "Missing footer block"));
        assert!(report.errors.iter().any(|e| e.starts_with("Duplicate block id")));
        assert!(report.errors.iter().any(|e| e.contains("has order")));
    }

    #[test]
    fn bare_json_document_is_reported() {
        let doc = deserialize_document(r#"{"version": "1.0", "blocks": []}"#).unwrap();
        let report = validate_document(&doc);
        assert!(!report.valid);
        assert!(report.errors.contains(&"Missing layout configuration".to_string()));
        assert!(report.errors.contains(&"Missing header block".to_string()));
        assert!(report.warnings.iter().any(|w| w.contains("differs")));
    }
}
