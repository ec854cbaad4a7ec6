//! Document model – the typed blocks and the root aggregate every pipeline
//! stage reads and enriches.
//!
//! Each stage owns the optional fields it introduces on [`Block`]:
//! the composer fills `layout_rules`, `flow_rules` and `grouping`, the layout
//! calculator fills `computed_layout`, the flow engine fills `flow` and
//! `flow_position`, and the paginator fills `placement`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::flow::{FlowData, FlowMeta, FlowPosition};
use crate::layout::{ComputedLayout, LayoutMeta};
use crate::page_layout::Placement;
use crate::rules::{FlowRules, Grouping, LayoutRules};

/// Current document schema version.
pub const SCHEMA_VERSION: &str = "2.0";

/// A4 width in logical pixels at 96 DPI.
pub const PAGE_WIDTH: f32 = 794.0;

/// A4 height in logical pixels at 96 DPI.
pub const PAGE_HEIGHT: f32 = 1123.0;

// ---------------------------------------------------------------------------
// Classification enums
// ---------------------------------------------------------------------------

/// Semantic purpose of a block. The set is closed; every dispatch over it is
/// an exhaustive `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Header,
    Client,
    Section,
    Timeline,
    Investment,
    Footer,
    TwoColumn,
    Grid,
    Divider,
    Spacer,
}

impl BlockType {
    pub const ALL: [BlockType; 10] = [
        BlockType::Header,
        BlockType::Client,
        BlockType::Section,
        BlockType::Timeline,
        BlockType::Investment,
        BlockType::Footer,
        BlockType::TwoColumn,
        BlockType::Grid,
        BlockType::Divider,
        BlockType::Spacer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Header => "header",
            BlockType::Client => "client",
            BlockType::Section => "section",
            BlockType::Timeline => "timeline",
            BlockType::Investment => "investment",
            BlockType::Footer => "footer",
            BlockType::TwoColumn => "two_column",
            BlockType::Grid => "grid",
            BlockType::Divider => "divider",
            BlockType::Spacer => "spacer",
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic payload classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    Text,
    List,
    TimelineItems,
    GridItems,
    Pricing,
    Contact,
    Branding,
    Signature,
}

/// Requested width/alignment class for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutHint {
    #[default]
    FullWidth,
    HalfWidth,
    ThirdWidth,
    TwoThirdsWidth,
    Centered,
    Padded,
    Tight,
    Bleed,
}

impl LayoutHint {
    /// Relative container width as a CSS percentage.
    pub fn percent_width(&self) -> &'static str {
        match self {
            LayoutHint::HalfWidth => "50%",
            LayoutHint::ThirdWidth => "33.333%",
            LayoutHint::TwoThirdsWidth => "66.666%",
            LayoutHint::Centered => "80%",
            LayoutHint::Padded => "90%",
            LayoutHint::FullWidth | LayoutHint::Tight | LayoutHint::Bleed => "100%",
        }
    }
}

/// Visual weight tier. Drives typography and colour downstream, never layout
/// arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Hero,
    Primary,
    #[default]
    Secondary,
    Tertiary,
    Muted,
}

/// Hierarchical region, independent of pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Header,
    Body,
    Highlight,
    Footer,
}

/// Depth of a node in the document hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLevel {
    Document,
    Region,
    Section,
    Block,
    Item,
}

impl HierarchyLevel {
    pub fn depth(&self) -> u8 {
        match self {
            HierarchyLevel::Document => 0,
            HierarchyLevel::Region => 1,
            HierarchyLevel::Section => 2,
            HierarchyLevel::Block => 3,
            HierarchyLevel::Item => 4,
        }
    }
}

/// Page orientation for the generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOrientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width > height.
    Landscape,
}

// ---------------------------------------------------------------------------
// Block payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderContent {
    pub brand: String,
    pub title: String,
    pub subtitle: String,
    pub badge: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientContent {
    pub label: String,
    pub name: String,
    pub company: String,
}

/// One side of the challenge/solution layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub title: String,
    pub body: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoColumnContent {
    pub columns: Vec<Column>,
    pub column_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionContent {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub anchor: bool,
}

/// A scope-of-work deliverable. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridItem {
    pub id: String,
    pub index: usize,
    pub content: String,
    pub marker: bool,
    pub display_index: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridContent {
    pub title: String,
    pub items: Vec<GridItem>,
    pub columns: usize,
    pub anchor: bool,
}

/// A timeline phase. `phase` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePhase {
    pub id: String,
    pub phase: usize,
    pub label: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineContent {
    pub title: String,
    pub phases: Vec<TimelinePhase>,
    pub phase_count: usize,
    pub anchor: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentContent {
    pub label: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedBy {
    pub label: String,
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureLine {
    pub label: String,
    pub line: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branding {
    pub mark: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterContent {
    pub prepared_by: PreparedBy,
    pub signature: SignatureLine,
    pub branding: Branding,
}

/// Type-specific payload of a block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockContent {
    Header(HeaderContent),
    Client(ClientContent),
    TwoColumn(TwoColumnContent),
    Section(SectionContent),
    Grid(GridContent),
    Timeline(TimelineContent),
    Investment(InvestmentContent),
    Footer(FooterContent),
    /// Dividers, spacers, and blocks deserialised without a payload.
    #[default]
    Empty,
}

impl BlockContent {
    pub fn is_empty(&self) -> bool {
        matches!(self, BlockContent::Empty)
    }

    /// Every piece of human-readable text carried by the payload, in
    /// reading order.
    pub fn text_fragments(&self) -> Vec<&str> {
        match self {
            BlockContent::Header(h) => vec![&h.brand, &h.title, &h.subtitle, &h.badge, &h.date],
            BlockContent::Client(c) => vec![&c.label, &c.name, &c.company],
            BlockContent::TwoColumn(t) => t
                .columns
                .iter()
                .flat_map(|c| [c.title.as_str(), c.body.as_str()])
                .collect(),
            BlockContent::Section(s) => vec![&s.title, &s.body],
            BlockContent::Grid(g) => std::iter::once(g.title.as_str())
                .chain(g.items.iter().map(|i| i.content.as_str()))
                .collect(),
            BlockContent::Timeline(t) => std::iter::once(t.title.as_str())
                .chain(
                    t.phases
                        .iter()
                        .flat_map(|p| [p.label.as_str(), p.content.as_str()]),
                )
                .collect(),
            BlockContent::Investment(i) => vec![&i.label, &i.amount],
            BlockContent::Footer(f) => vec![
                &f.prepared_by.label,
                &f.prepared_by.contact,
                &f.signature.label,
                &f.branding.text,
            ],
            BlockContent::Empty => Vec::new(),
        }
    }

    /// Whitespace-delimited word count over [`Self::text_fragments`].
    pub fn word_count(&self) -> usize {
        self.text_fragments()
            .iter()
            .map(|s| s.split_whitespace().count())
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// Free-form per-block presentation flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMetadata {
    #[serde(default)]
    pub alternate_background: bool,
}

fn default_visible() -> bool {
    true
}

/// The atomic unit of document content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub content: BlockContent,
    #[serde(default)]
    pub layout_hint: LayoutHint,
    #[serde(default)]
    pub emphasis: Emphasis,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub metadata: BlockMetadata,
    #[serde(default)]
    pub break_before: bool,
    #[serde(default)]
    pub keep_together: bool,

    // Composer rule passes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_rules: Option<LayoutRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_rules: Option<FlowRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping: Option<Grouping>,

    // Layout calculator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_layout: Option<ComputedLayout>,

    // Flow engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<FlowData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_position: Option<FlowPosition>,

    // Paginator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
}

impl Block {
    /// A bare block with default presentation and no stage data attached.
    pub fn new(id: impl Into<String>, block_type: BlockType, content: BlockContent) -> Self {
        Self {
            id: id.into(),
            block_type,
            content_type: ContentType::default(),
            content,
            layout_hint: LayoutHint::default(),
            emphasis: Emphasis::default(),
            visible: true,
            order: 0,
            metadata: BlockMetadata::default(),
            break_before: false,
            keep_together: false,
            layout_rules: None,
            flow_rules: None,
            grouping: None,
            computed_layout: None,
            flow: None,
            flow_position: None,
            placement: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Document aggregate
// ---------------------------------------------------------------------------

/// Four-sided spacing in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const ZERO: Self = Self::all(0.0);

    pub const fn all(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    /// Vertical value first, horizontal second (CSS two-value shorthand).
    pub const fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

/// Physical page setup carried by a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSetup {
    pub format: String,
    pub orientation: PageOrientation,
    pub width: f32,
    pub height: f32,
    pub margins: Edges,
    pub dpi: u32,
    pub scale_factor: f32,
}

impl PageSetup {
    /// A4 portrait at 96 DPI with no margins.
    pub fn a4() -> Self {
        Self {
            format: "A4".to_string(),
            orientation: PageOrientation::Portrait,
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            margins: Edges::ZERO,
            dpi: 96,
            scale_factor: 1.0,
        }
    }

    /// Placeholder used when a deserialised document carries no page setup;
    /// validation reports it.
    pub fn unset() -> Self {
        Self {
            format: String::new(),
            width: 0.0,
            height: 0.0,
            dpi: 0,
            ..Self::a4()
        }
    }

    pub fn is_set(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::a4()
    }
}

/// Aggregate facts about a composed document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub client_name: String,
    pub client_company: String,
    pub project_title: String,
    pub block_count: usize,
    pub page_count: usize,
    pub word_count: usize,
    pub has_timeline: bool,
    pub has_pricing: bool,
}

/// A block's position in the region hierarchy. Blocks are referenced by id,
/// never copied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyEntry {
    pub block_id: String,
    pub region: Region,
    pub level: HierarchyLevel,
    pub depth: u8,
}

/// Blocks partitioned into header/body/highlight/footer regions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Hierarchy {
    pub header: Vec<HierarchyEntry>,
    pub body: Vec<HierarchyEntry>,
    pub highlight: Vec<HierarchyEntry>,
    pub footer: Vec<HierarchyEntry>,
}

impl Hierarchy {
    pub fn region(&self, region: Region) -> &[HierarchyEntry] {
        match region {
            Region::Header => &self.header,
            Region::Body => &self.body,
            Region::Highlight => &self.highlight,
            Region::Footer => &self.footer,
        }
    }

    pub(crate) fn region_mut(&mut self, region: Region) -> &mut Vec<HierarchyEntry> {
        match region {
            Region::Header => &mut self.header,
            Region::Body => &mut self.body,
            Region::Highlight => &mut self.highlight,
            Region::Footer => &mut self.footer,
        }
    }

    pub fn len(&self) -> usize {
        self.header.len() + self.body.len() + self.highlight.len() + self.footer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakPosition {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBreakHint {
    pub block_id: String,
    pub position: BreakPosition,
}

/// Document-level pagination hints derived by the composer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFlowRules {
    pub page_break_hints: Vec<PageBreakHint>,
    /// Runs of consecutive keep-together block ids.
    pub keep_together_groups: Vec<Vec<String>>,
}

fn default_doc_type() -> String {
    "proposal".to_string()
}

/// The root aggregate produced by the composer and enriched by every later
/// stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentModel {
    #[serde(default)]
    pub version: String,
    #[serde(rename = "type", default = "default_doc_type")]
    pub doc_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meta: DocumentMeta,
    #[serde(default = "PageSetup::unset")]
    pub layout: PageSetup,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub hierarchy: Hierarchy,
    #[serde(default)]
    pub flow_rules: DocumentFlowRules,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_meta: Option<LayoutMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_meta: Option<FlowMeta>,
}

impl DocumentModel {
    /// Look a block up by id.
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// All blocks of one type, in document order.
    pub fn blocks_of_type(&self, block_type: BlockType) -> impl Iterator<Item = &Block> {
        self.blocks
            .iter()
            .filter(move |b| b.block_type == block_type)
    }

    pub fn has_block_type(&self, block_type: BlockType) -> bool {
        self.blocks.iter().any(|b| b.block_type == block_type)
    }
}

/// Pretty-printed JSON form of a document.
pub fn serialize_document(doc: &DocumentModel) -> String {
    serde_json::to_string_pretty(doc).unwrap_or_default()
}

/// Parse a document previously produced by [`serialize_document`] (or
/// hand-written). Structural problems are left for
/// [`crate::validate::validate_document`] to report.
pub fn deserialize_document(json: &str) -> crate::error::Result<DocumentModel> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_type_names_match_serde() {
        for t in BlockType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn word_count_covers_nested_text() {
        let content = BlockContent::Section(SectionContent {
            title: "Terms & Conditions".to_string(),
            body: "Net 30 days".to_string(),
            icon: None,
            anchor: true,
        });
        assert_eq!(content.word_count(), 6);
        assert_eq!(BlockContent::Empty.word_count(), 0);
    }

    #[test]
    fn minimal_document_json_deserialises() {
        let doc = deserialize_document(r#"{"blocks":[{"type":"header"}]}"#).unwrap();
        assert_eq!(doc.blocks.len(), 1);
        assert!(doc.blocks[0].visible);
        assert!(doc.blocks[0].content.is_empty());
        assert!(!doc.layout.is_set());
        assert_eq!(doc.doc_type, "proposal");
    }

    #[test]
    fn layout_hint_widths() {
        assert_eq!(LayoutHint::FullWidth.percent_width(), "100%");
        assert_eq!(LayoutHint::Centered.percent_width(), "80%");
        assert_eq!(LayoutHint::Padded.percent_width(), "90%");
    }
}
