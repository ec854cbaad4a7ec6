//! Composer – turns a flat [`ProposalFields`] record into an ordered list of
//! typed blocks, then stamps layout, flow and grouping rules on them and
//! builds the region hierarchy.
//!
//! Block ids are `{type}_{n}_{suffix}` where `n` counts from 1 within a
//! single [`Composer::compose`] call and `suffix` is the generation instant
//! in base-36 milliseconds. The counter lives on the stack of that call, so
//! concurrent compositions never share it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::{non_empty, ProposalFields};
use crate::model::{
    Block, BlockContent, BlockMetadata, BlockType, BreakPosition, Branding, ClientContent,
    Column, ContentType, DocumentFlowRules, DocumentMeta, DocumentModel, Emphasis, FooterContent,
    GridContent, GridItem, HeaderContent, Hierarchy, HierarchyEntry, InvestmentContent,
    LayoutHint, PageBreakHint, PageSetup, PreparedBy, Region, SectionContent, SignatureLine,
    TimelineContent, TimelinePhase, TwoColumnContent, SCHEMA_VERSION,
};
use crate::rules::{hierarchy_rule, FlowHint, FlowRules, GroupType, Grouping, LayoutRules};

pub const DEFAULT_TITLE: &str = "Project Proposal";
pub const DEFAULT_CLIENT_NAME: &str = "Client Name";
pub const DEFAULT_COMPANY: &str = "Company Name";
pub const DEFAULT_CONTACT: &str = "Your Name\nCompany\ncontact@email.com";
pub const BRAND_NAME: &str = "pitchPDF";

/// Builds document models from field records.
#[derive(Debug, Clone)]
pub struct Composer {
    page: PageSetup,
    now: Option<DateTime<Utc>>,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-call id state.
struct IdGen {
    counter: u32,
    suffix: String,
}

impl IdGen {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            counter: 0,
            suffix: to_base36(now.timestamp_millis().max(0) as u64),
        }
    }

    fn block(&mut self, block_type: BlockType) -> String {
        self.counter += 1;
        format!("{}_{}_{}", block_type.as_str(), self.counter, self.suffix)
    }

    fn child(&self, prefix: &str, index: usize) -> String {
        format!("{prefix}_{index}_{}", self.suffix)
    }
}

impl Composer {
    /// A4 portrait, stamped with the current time.
    pub fn new() -> Self {
        Self {
            page: PageSetup::a4(),
            now: None,
        }
    }

    /// Fix the generation instant so dates and id suffixes are reproducible.
    pub fn with_timestamp(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn with_page(mut self, page: PageSetup) -> Self {
        self.page = page;
        self
    }

    /// Compose a fresh document. Never fails: absent or blank fields suppress
    /// their block, except header, client and footer which fall back to
    /// placeholders.
    pub fn compose(&self, fields: &ProposalFields) -> DocumentModel {
        let now = self.now.unwrap_or_else(Utc::now);
        let mut ids = IdGen::new(now);
        let mut blocks = Vec::new();

        let title = non_empty(&fields.project_title).unwrap_or(DEFAULT_TITLE);
        blocks.push(Block {
            content_type: ContentType::Branding,
            emphasis: Emphasis::Hero,
            keep_together: true,
            ..Block::new(
                ids.block(BlockType::Header),
                BlockType::Header,
                BlockContent::Header(HeaderContent {
                    brand: BRAND_NAME.to_string(),
                    title: title.to_string(),
                    subtitle: "Professional Services Proposal".to_string(),
                    badge: "PROPOSAL".to_string(),
                    date: now.format("%B %-d, %Y").to_string(),
                }),
            )
        });

        blocks.push(Block {
            content_type: ContentType::Contact,
            emphasis: Emphasis::Primary,
            layout_hint: LayoutHint::Padded,
            keep_together: true,
            ..Block::new(
                ids.block(BlockType::Client),
                BlockType::Client,
                BlockContent::Client(ClientContent {
                    label: "Prepared For".to_string(),
                    name: non_empty(&fields.client_name)
                        .unwrap_or(DEFAULT_CLIENT_NAME)
                        .to_string(),
                    company: non_empty(&fields.client_company)
                        .unwrap_or(DEFAULT_COMPANY)
                        .to_string(),
                }),
            )
        });

        let problem = non_empty(&fields.problem_statement);
        let solution = non_empty(&fields.proposed_solution);
        if problem.is_some() || solution.is_some() {
            let mut columns = Vec::with_capacity(2);
            if let Some(body) = problem {
                columns.push(Column {
                    id: "challenge_col".to_string(),
                    title: "The Challenge".to_string(),
                    body: body.to_string(),
                    icon: "challenge".to_string(),
                });
            }
            if let Some(body) = solution {
                columns.push(Column {
                    id: "solution_col".to_string(),
                    title: "Our Solution".to_string(),
                    body: body.to_string(),
                    icon: "solution".to_string(),
                });
            }
            let column_count = columns.len();
            blocks.push(Block::new(
                ids.block(BlockType::TwoColumn),
                BlockType::TwoColumn,
                BlockContent::TwoColumn(TwoColumnContent {
                    columns,
                    column_count,
                }),
            ));
        }

        let items: Vec<GridItem> = split_lines(fields.scope_of_work.as_deref())
            .enumerate()
            .map(|(i, line)| GridItem {
                id: ids.child("item", i),
                index: i + 1,
                content: line.to_string(),
                marker: true,
                display_index: format!("{:02}", i + 1),
            })
            .collect();
        if !items.is_empty() {
            blocks.push(Block {
                content_type: ContentType::GridItems,
                metadata: BlockMetadata {
                    alternate_background: true,
                },
                ..Block::new(
                    ids.block(BlockType::Grid),
                    BlockType::Grid,
                    BlockContent::Grid(GridContent {
                        title: "Scope of Work".to_string(),
                        columns: items.len().min(2),
                        items,
                        anchor: true,
                    }),
                )
            });
        }

        let phases: Vec<TimelinePhase> = split_lines(fields.timeline.as_deref())
            .enumerate()
            .map(|(i, line)| TimelinePhase {
                id: ids.child("phase", i),
                phase: i + 1,
                label: format!("Phase {}", i + 1),
                content: line.to_string(),
            })
            .collect();
        if !phases.is_empty() {
            blocks.push(Block {
                content_type: ContentType::TimelineItems,
                ..Block::new(
                    ids.block(BlockType::Timeline),
                    BlockType::Timeline,
                    BlockContent::Timeline(TimelineContent {
                        title: "Timeline".to_string(),
                        phase_count: phases.len(),
                        phases,
                        anchor: true,
                    }),
                )
            });
        }

        if let Some(pricing) = non_empty(&fields.pricing) {
            blocks.push(Block {
                content_type: ContentType::Pricing,
                emphasis: Emphasis::Primary,
                layout_hint: LayoutHint::Centered,
                keep_together: true,
                ..Block::new(
                    ids.block(BlockType::Investment),
                    BlockType::Investment,
                    BlockContent::Investment(InvestmentContent {
                        label: "Total Investment".to_string(),
                        amount: pricing.to_string(),
                    }),
                )
            });
        }

        if let Some(terms) = non_empty(&fields.terms) {
            blocks.push(Block {
                emphasis: Emphasis::Tertiary,
                metadata: BlockMetadata {
                    alternate_background: true,
                },
                ..Block::new(
                    ids.block(BlockType::Section),
                    BlockType::Section,
                    BlockContent::Section(SectionContent {
                        title: "Terms & Conditions".to_string(),
                        body: terms.to_string(),
                        icon: None,
                        anchor: true,
                    }),
                )
            });
        }

        blocks.push(Block {
            content_type: ContentType::Contact,
            emphasis: Emphasis::Muted,
            keep_together: true,
            ..Block::new(
                ids.block(BlockType::Footer),
                BlockType::Footer,
                BlockContent::Footer(FooterContent {
                    prepared_by: PreparedBy {
                        label: "Prepared By".to_string(),
                        contact: non_empty(&fields.contact_info)
                            .unwrap_or(DEFAULT_CONTACT)
                            .to_string(),
                    },
                    signature: SignatureLine {
                        label: "Authorized Signature".to_string(),
                        line: true,
                    },
                    branding: Branding {
                        mark: "p".to_string(),
                        text: format!("{BRAND_NAME} Premium Document"),
                    },
                }),
            )
        });

        for (order, block) in blocks.iter_mut().enumerate() {
            block.order = order as u32;
        }
        let blocks = apply_grouping_rules(apply_flow_rules(apply_layout_rules(blocks)));
        let hierarchy = build_hierarchy(&blocks);

        log::debug!(
            "Composed {} blocks: {}",
            blocks.len(),
            blocks
                .iter()
                .map(|b| b.block_type.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        DocumentModel {
            version: SCHEMA_VERSION.to_string(),
            doc_type: "proposal".to_string(),
            created_at: Some(now),
            meta: document_meta(fields, &blocks),
            layout: self.page.clone(),
            flow_rules: DocumentFlowRules {
                page_break_hints: page_break_hints(&blocks),
                keep_together_groups: keep_together_runs(&blocks),
            },
            hierarchy,
            blocks,
            layout_meta: None,
            flow_meta: None,
        }
    }
}

/// Compose with a default [`Composer`] (A4 portrait, current time).
pub fn compose(fields: &ProposalFields) -> DocumentModel {
    Composer::new().compose(fields)
}

/// Non-blank lines of a multi-line field, trimmed.
fn split_lines(text: Option<&str>) -> impl Iterator<Item = &str> {
    text.unwrap_or_default()
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Rule passes
// ---------------------------------------------------------------------------

pub fn apply_layout_rules(blocks: Vec<Block>) -> Vec<Block> {
    blocks
        .into_iter()
        .map(|block| Block {
            layout_rules: Some(LayoutRules::for_type(block.block_type)),
            ..block
        })
        .collect()
}

/// Stamp flow hints, with neighbour flags computed over the whole sequence.
pub fn apply_flow_rules(blocks: Vec<Block>) -> Vec<Block> {
    let len = blocks.len();
    blocks
        .into_iter()
        .enumerate()
        .map(|(i, block)| Block {
            flow_rules: Some(FlowRules::at_position(block.block_type, i, len)),
            ..block
        })
        .collect()
}

pub fn apply_grouping_rules(blocks: Vec<Block>) -> Vec<Block> {
    blocks
        .into_iter()
        .map(|block| Block {
            grouping: Some(Grouping::for_group(GroupType::for_block(block.block_type))),
            ..block
        })
        .collect()
}

/// Partition block ids into regions.
pub fn build_hierarchy(blocks: &[Block]) -> Hierarchy {
    let mut hierarchy = Hierarchy::default();
    for block in blocks {
        let (region, level) = hierarchy_rule(block.block_type);
        hierarchy.region_mut(region).push(HierarchyEntry {
            block_id: block.id.clone(),
            region,
            level,
            depth: level.depth(),
        });
    }
    hierarchy
}

fn document_meta(fields: &ProposalFields, blocks: &[Block]) -> DocumentMeta {
    DocumentMeta {
        client_name: non_empty(&fields.client_name)
            .unwrap_or(DEFAULT_CLIENT_NAME)
            .to_string(),
        client_company: non_empty(&fields.client_company)
            .unwrap_or_default()
            .to_string(),
        project_title: non_empty(&fields.project_title)
            .unwrap_or("Untitled Proposal")
            .to_string(),
        block_count: blocks.len(),
        page_count: 1,
        word_count: blocks.iter().map(|b| b.content.word_count()).sum(),
        has_timeline: blocks.iter().any(|b| b.block_type == BlockType::Timeline),
        has_pricing: blocks.iter().any(|b| b.block_type == BlockType::Investment),
    }
}

fn page_break_hints(blocks: &[Block]) -> Vec<PageBreakHint> {
    blocks
        .iter()
        .filter(|b| {
            b.break_before || b.flow_rules.is_some_and(|f| f.hint == FlowHint::BreakBefore)
        })
        .map(|b| PageBreakHint {
            block_id: b.id.clone(),
            position: BreakPosition::Before,
        })
        .collect()
}

/// Runs of consecutive keep-together block ids.
fn keep_together_runs(blocks: &[Block]) -> Vec<Vec<String>> {
    let mut runs = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for block in blocks {
        let keep = block.keep_together || block.grouping.is_some_and(|g| g.keep_together);
        if keep {
            current.push(block.id.clone());
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

// ---------------------------------------------------------------------------
// Layout-ready representation
// ---------------------------------------------------------------------------

/// A block reduced to what a renderer needs before flow runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: BlockContent,
    pub layout: Option<LayoutRules>,
    pub emphasis: Emphasis,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderRegions {
    pub header: Vec<RenderNode>,
    pub body: Vec<RenderNode>,
    pub highlight: Vec<RenderNode>,
    pub footer: Vec<RenderNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReadyDocument {
    pub version: String,
    pub format: String,
    pub width: f32,
    pub height: f32,
    pub regions: RenderRegions,
    pub flow_hints: DocumentFlowRules,
    pub meta: DocumentMeta,
}

/// Region-keyed render tree of a composed document. Hierarchy entries whose
/// block id no longer resolves are skipped.
pub fn layout_ready_representation(doc: &DocumentModel) -> LayoutReadyDocument {
    let nodes = |region: Region| -> Vec<RenderNode> {
        doc.hierarchy
            .region(region)
            .iter()
            .filter_map(|entry| doc.block(&entry.block_id))
            .map(|b| RenderNode {
                id: b.id.clone(),
                block_type: b.block_type,
                content: b.content.clone(),
                layout: b.layout_rules.clone(),
                emphasis: b.emphasis,
                visible: b.visible,
            })
            .collect()
    };
    LayoutReadyDocument {
        version: doc.version.clone(),
        format: doc.layout.format.clone(),
        width: doc.layout.width,
        height: doc.layout.height,
        regions: RenderRegions {
            header: nodes(Region::Header),
            body: nodes(Region::Body),
            highlight: nodes(Region::Highlight),
            footer: nodes(Region::Footer),
        },
        flow_hints: doc.flow_rules.clone(),
        meta: doc.meta.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> Composer {
        Composer::new().with_timestamp(Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap())
    }

    fn types(doc: &DocumentModel) -> Vec<BlockType> {
        doc.blocks.iter().map(|b| b.block_type).collect()
    }

    #[test]
    fn empty_fields_yield_header_client_footer() {
        let doc = fixed().compose(&ProposalFields::default());
        assert_eq!(
            types(&doc),
            vec![BlockType::Header, BlockType::Client, BlockType::Footer]
        );
        match &doc.blocks[1].content {
            BlockContent::Client(c) => {
                assert_eq!(c.name, "Client Name");
                assert_eq!(c.company, "Company Name");
            }
            other => panic!("unexpected content {other:?}"),
        }
        assert_eq!(doc.meta.project_title, "Untitled Proposal");
    }

    #[test]
    fn canonical_order_with_all_fields() {
        let fields = ProposalFields {
            problem_statement: Some("p".into()),
            scope_of_work: Some("a".into()),
            timeline: Some("t".into()),
            pricing: Some("$1".into()),
            terms: Some("net 30".into()),
            ..Default::default()
        };
        let doc = fixed().compose(&fields);
        assert_eq!(
            types(&doc),
            vec![
                BlockType::Header,
                BlockType::Client,
                BlockType::TwoColumn,
                BlockType::Grid,
                BlockType::Timeline,
                BlockType::Investment,
                BlockType::Section,
                BlockType::Footer,
            ]
        );
        let orders: Vec<u32> = doc.blocks.iter().map(|b| b.order).collect();
        assert_eq!(orders, (0..8).collect::<Vec<u32>>());
        assert!(doc.meta.has_pricing && doc.meta.has_timeline);
    }

    #[test]
    fn scope_lines_become_grid_items() {
        let fields = ProposalFields {
            scope_of_work: Some("Design\n\n  Development \n   \nTesting".into()),
            ..Default::default()
        };
        let doc = fixed().compose(&fields);
        let grid = doc.blocks_of_type(BlockType::Grid).next().unwrap();
        let BlockContent::Grid(g) = &grid.content else {
            panic!("grid content expected");
        };
        let idx: Vec<&str> = g.items.iter().map(|i| i.display_index.as_str()).collect();
        assert_eq!(idx, vec!["01", "02", "03"]);
        assert_eq!(g.items[1].content, "Development");
        assert_eq!(g.columns, 2);
        assert!(grid.metadata.alternate_background);
    }

    #[test]
    fn blank_multiline_field_suppresses_block() {
        let fields = ProposalFields {
            timeline: Some("\n  \n".into()),
            ..Default::default()
        };
        let doc = fixed().compose(&fields);
        assert!(!doc.has_block_type(BlockType::Timeline));
    }

    #[test]
    fn ids_are_scoped_per_call() {
        let c = fixed();
        let a = c.compose(&ProposalFields::default());
        let b = c.compose(&ProposalFields::default());
        assert_eq!(a.blocks[0].id, b.blocks[0].id);
        assert!(a.blocks[0].id.starts_with("header_1_"));
        assert!(a.blocks[2].id.starts_with("footer_3_"));
    }

    #[test]
    fn header_date_is_long_form() {
        let doc = fixed().compose(&ProposalFields::default());
        let BlockContent::Header(h) = &doc.blocks[0].content else {
            panic!("header content expected");
        };
        assert_eq!(h.date, "January 5, 2026");
    }

    #[test]
    fn rules_and_hierarchy_are_attached() {
        let doc = fixed().compose(&ProposalFields {
            pricing: Some("$5".into()),
            ..Default::default()
        });
        assert!(doc.blocks.iter().all(|b| b.layout_rules.is_some()
            && b.flow_rules.is_some()
            && b.grouping.is_some()));
        assert_eq!(doc.hierarchy.header.len(), 2);
        assert_eq!(doc.hierarchy.highlight.len(), 1);
        assert_eq!(doc.hierarchy.footer.len(), 1);
        assert_eq!(doc.hierarchy.len(), doc.blocks.len());
        // no content block interrupts header, client, investment, footer
        assert_eq!(doc.flow_rules.keep_together_groups.len(), 1);
        assert_eq!(doc.flow_rules.keep_together_groups[0].len(), 4);
    }

    #[test]
    fn base36_suffix() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn layout_ready_representation_groups_by_region() {
        let doc = fixed().compose(&ProposalFields {
            terms: Some("x".into()),
            ..Default::default()
        });
        let rep = layout_ready_representation(&doc);
        assert_eq!(rep.regions.header.len(), 2);
        assert_eq!(rep.regions.body.len(), 1);
        assert_eq!(rep.regions.footer.len(), 1);
        assert_eq!(rep.format, "A4");
    }
}
