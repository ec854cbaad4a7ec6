//! Pipeline – ties together composition, layout, flow, pagination, and
//! rendering into a single function call.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compose::Composer;
use crate::error::{Error, Result};
use crate::fields::ProposalFields;
use crate::flow::apply_flow;
use crate::layout::apply_layout;
use crate::model::{DocumentModel, PageOrientation, PageSetup, PAGE_HEIGHT, PAGE_WIDTH};
use crate::page_layout::{MultiPageLayout, PaginationResult};
use crate::pagination::{attach_placements, create_multi_page_layout, paginate_by_groups, PageGeometry};
use crate::render::{generate_html_document, render_document_with, RenderedDocument};

/// Configuration for the generation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Overrides the `<title>` of the generated markup. Defaults to the
    /// project title.
    pub title: Option<String>,
    /// Page width in logical pixels (default: A4 = 794).
    pub page_width: f32,
    /// Page height in logical pixels (default: A4 = 1123).
    pub page_height: f32,
    /// Page orientation; swaps effective width/height when `Landscape`.
    pub orientation: PageOrientation,
    /// Fixed generation instant. Pins the header date and id suffixes so
    /// output is reproducible.
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: None,
            page_width: PAGE_WIDTH,
            page_height: PAGE_HEIGHT,
            orientation: PageOrientation::Portrait,
            timestamp: None,
        }
    }
}

impl PipelineConfig {
    /// Effective page width after applying orientation.
    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_width,
            PageOrientation::Landscape => self.page_height,
        }
    }

    /// Effective page height after applying orientation.
    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_height,
            PageOrientation::Landscape => self.page_width,
        }
    }

    /// Create an A4 landscape config.
    pub fn a4_landscape() -> Self {
        Self {
            orientation: PageOrientation::Landscape,
            ..Self::default()
        }
    }

    /// Reject geometry no page could be laid out on.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("pageWidth", self.page_width), ("pageHeight", self.page_height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Page setup stamped onto composed documents.
    pub fn page_setup(&self) -> PageSetup {
        let width = self.effective_width();
        let height = self.effective_height();
        let is_a4 = (self.page_width, self.page_height) == (PAGE_WIDTH, PAGE_HEIGHT);
        PageSetup {
            format: if is_a4 { "A4" } else { "custom" }.to_string(),
            orientation: self.orientation,
            width,
            height,
            ..PageSetup::a4()
        }
    }

    fn composer(&self) -> Composer {
        let composer = Composer::new().with_page(self.page_setup());
        match self.timestamp {
            Some(ts) => composer.with_timestamp(ts),
            None => composer,
        }
    }
}

/// Compose, lay out and flow a fields record. The result is ready for
/// pagination.
pub fn build_document(fields: &ProposalFields, config: &PipelineConfig) -> DocumentModel {
    let composed = config.composer().compose(fields);
    let laid_out = apply_layout(&composed);
    let flowed = apply_flow(&laid_out);
    log::debug!(
        "Built document with {} block(s) for {}x{} pages",
        flowed.blocks.len(),
        flowed.layout.width,
        flowed.layout.height
    );
    flowed
}

/// Paginate a flowed document against its own page setup.
pub fn paginate(doc: &DocumentModel) -> PaginationResult {
    paginate_by_groups(doc, PageGeometry::of(doc))
}

/// Paginate and write each block's placement and the page count back onto
/// a copy of the document.
pub fn paginate_document_model(doc: &DocumentModel) -> DocumentModel {
    attach_placements(doc, &paginate(doc))
}

/// Generate only the paginated layout (no markup) – useful for testing and
/// for consumers that render from JSON.
pub fn compute_page_layout(fields: &ProposalFields, config: &PipelineConfig) -> MultiPageLayout {
    let doc = build_document(fields, config);
    create_multi_page_layout(&doc, PageGeometry::of(&doc))
}

/// Full pipeline: fields → self-contained HTML document.
///
/// Returns `(html, rendered_document)`.
pub fn generate_html(
    fields: &ProposalFields,
    config: &PipelineConfig,
) -> Result<(String, RenderedDocument)> {
    config.validate()?;
    let rendered = render_document_with(fields, config);
    let html = generate_html_document(&rendered);
    log::debug!(
        "Rendered {} page(s), {} bytes of markup",
        rendered.meta.page_count,
        html.len()
    );
    Ok((html, rendered))
}

/// Convenience: generate HTML with the default A4 config.
pub fn generate_html_from_fields(fields: &ProposalFields) -> String {
    generate_html_document(&render_document_with(fields, &PipelineConfig::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates;

    #[test]
    fn pipeline_basic() {
        let (html, rendered) =
            generate_html(&ProposalFields::default(), &PipelineConfig::default()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert_eq!(rendered.pages.len(), 1);
        assert_eq!(rendered.pages[0].blocks.len(), 3);
    }

    #[test]
    fn paginated_model_carries_placements() {
        let doc = build_document(&templates::multi_page_template(), &PipelineConfig::default());
        let result = paginate(&doc);
        let placed = paginate_document_model(&doc);

        assert!(result.page_count > 1);
        assert_eq!(placed.meta.page_count, result.page_count);
        for block in &placed.blocks {
            let p = block.placement.unwrap();
            assert_eq!(Some(p.page_number), result.page_of(&block.id), "{}", block.id);
        }
        assert_eq!(placed.blocks.last().unwrap().placement.unwrap().page_number, result.page_count);
        assert!(doc.blocks.iter().all(|b| b.placement.is_none()));
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let cfg = PipelineConfig::a4_landscape();
        assert_eq!(cfg.effective_width(), PAGE_HEIGHT);
        assert_eq!(cfg.effective_height(), PAGE_WIDTH);
        let doc = build_document(&ProposalFields::default(), &cfg);
        assert_eq!(doc.layout.width, PAGE_HEIGHT);
        assert_eq!(doc.layout.orientation, PageOrientation::Landscape);
    }

    #[test]
    fn config_json_defaults_and_validation() {
        let cfg = PipelineConfig::from_json(r#"{"pageHeight": 600}"#).unwrap();
        assert_eq!(cfg.page_width, PAGE_WIDTH);
        assert_eq!(cfg.page_height, 600.0);
        assert_eq!(cfg.page_setup().format, "custom");

        let err = PipelineConfig::from_json(r#"{"pageWidth": 0}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(matches!(
            PipelineConfig::from_json("[").unwrap_err(),
            Error::Json(_)
        ));
    }

    #[test]
    fn fixed_timestamp_is_reproducible() {
        let cfg = PipelineConfig {
            timestamp: Some("2026-01-05T12:00:00Z".parse().unwrap()),
            ..PipelineConfig::default()
        };
        let fields = ProposalFields {
            scope_of_work: Some("Design\nBuild".into()),
            ..Default::default()
        };
        let (a, _) = generate_html(&fields, &cfg).unwrap();
        let (b, _) = generate_html(&fields, &cfg).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("January 5, 2026"));
    }
}
