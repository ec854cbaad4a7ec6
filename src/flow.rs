//! Flow engine – estimates block heights, derives per-block flow
//! constraints, clusters blocks into keep-together groups and stacks them
//! vertically.

use serde::{Deserialize, Serialize};

use crate::metrics::TextMetrics;
use crate::model::{Block, BlockContent, BlockType, DocumentModel};
use crate::model::{PAGE_HEIGHT, PAGE_WIDTH};
use crate::rules::{FlowHint, GroupType, LayoutRules};
use crate::style::SpacingScale;

/// Height reserved for a block or column title line.
const TITLE_HEIGHT: f32 = 30.0;
/// Estimated height of one grid cell.
const GRID_ITEM_HEIGHT: f32 = 80.0;
/// Estimated height of one timeline phase.
const TIMELINE_PHASE_HEIGHT: f32 = 60.0;
/// Floor for the tallest two-column card.
const MIN_COLUMN_HEIGHT: f32 = 100.0;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Pagination constraints derived for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowConstraints {
    pub keep_together: bool,
    pub keep_with_next: bool,
    pub keep_with_previous: bool,
    pub avoid_orphan: bool,
    /// Informational only; blocks are never split.
    pub min_lines_on_page: u32,
    pub anchor_bottom: bool,
}

impl Default for FlowConstraints {
    fn default() -> Self {
        Self {
            keep_together: false,
            keep_with_next: false,
            keep_with_previous: false,
            avoid_orphan: false,
            min_lines_on_page: 2,
            anchor_bottom: false,
        }
    }
}

/// Estimated height and constraints attached by [`apply_flow`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowData {
    pub height: f32,
    pub constraints: FlowConstraints,
}

/// Vertical slot of a block in the unpaginated stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowPosition {
    pub y: f32,
    pub height: f32,
}

/// A contiguous cluster of blocks sharing a pagination policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowGroup {
    pub id: String,
    #[serde(rename = "type")]
    pub group_type: GroupType,
    pub block_ids: Vec<String>,
    pub block_count: usize,
    pub total_height: f32,
    pub keep_together: bool,
    pub break_before: bool,
    pub break_after: bool,
    pub anchor_bottom: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowMeta {
    pub total_height: f32,
    pub page_height: f32,
    pub page_count: usize,
    pub is_single_page: bool,
    pub groups: Vec<FlowGroup>,
    pub group_count: usize,
}

// ---------------------------------------------------------------------------
// Height estimation
// ---------------------------------------------------------------------------

/// Starting estimate before content is taken into account.
pub fn base_height(block_type: BlockType) -> f32 {
    match block_type {
        BlockType::Header => 280.0,
        BlockType::Client => 100.0,
        BlockType::TwoColumn => 180.0,
        BlockType::Section => 120.0,
        BlockType::Grid => 150.0,
        BlockType::Timeline => 120.0,
        BlockType::Investment => 140.0,
        BlockType::Footer => 120.0,
        BlockType::Divider | BlockType::Spacer => 100.0,
    }
}

/// Estimated rendered height of `block`, clamped to its layout rules.
///
/// Text is measured against the block's computed content width when layout
/// has run, otherwise against `container_width`.
pub fn calculate_block_height(block: &Block, container_width: f32) -> f32 {
    let layout = block.computed_layout.as_ref();
    let width = layout.map(|l| l.content_width).unwrap_or(container_width);
    let body = TextMetrics::body();
    let vertical_padding = SpacingScale::XL * 2.0;

    let content_height = match (&block.content, block.block_type) {
        (BlockContent::Section(s), BlockType::Section) => {
            TITLE_HEIGHT + body.text_height(&s.body, width) + vertical_padding
        }
        (BlockContent::TwoColumn(tc), BlockType::TwoColumn) => {
            let column_width = layout
                .and_then(|l| l.columns.as_ref())
                .map(|c| c.column_width)
                .unwrap_or(width / 2.0 - 20.0);
            let tallest = tc
                .columns
                .iter()
                .map(|col| {
                    TITLE_HEIGHT + body.text_height(&col.body, column_width) + SpacingScale::LG
                })
                .fold(MIN_COLUMN_HEIGHT, f32::max);
            tallest + vertical_padding
        }
        (BlockContent::Grid(g), BlockType::Grid) => {
            let rows = g.items.len().div_ceil(g.columns.max(1));
            rows as f32 * GRID_ITEM_HEIGHT + vertical_padding + TITLE_HEIGHT
        }
        (BlockContent::Timeline(t), BlockType::Timeline) => {
            t.phases.len() as f32 * TIMELINE_PHASE_HEIGHT + vertical_padding + TITLE_HEIGHT
        }
        (_, block_type) => base_height(block_type),
    };

    let fallback;
    let rules = match &block.layout_rules {
        Some(rules) => rules,
        None => {
            fallback = LayoutRules::for_type(block.block_type);
            &fallback
        }
    };
    let clamped = content_height.max(rules.min_height);
    rules.max_height.map_or(clamped, |max| clamped.min(max))
}

/// Height used for stacking and pagination: the flow estimate when present,
/// then the stacked height, then a fresh estimate.
pub fn block_height(block: &Block) -> f32 {
    block
        .flow
        .map(|f| f.height)
        .or_else(|| block.flow_position.map(|p| p.height))
        .unwrap_or_else(|| calculate_block_height(block, PAGE_WIDTH))
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

pub fn get_flow_constraints(block: &Block) -> FlowConstraints {
    let mut c = FlowConstraints {
        keep_together: block.keep_together,
        ..FlowConstraints::default()
    };

    match block.block_type {
        BlockType::Header | BlockType::Investment => c.keep_together = true,
        BlockType::Client => c.keep_with_previous = true,
        BlockType::Footer => {
            c.keep_together = true;
            c.anchor_bottom = true;
        }
        BlockType::Section | BlockType::Grid | BlockType::Timeline => {
            c.avoid_orphan = true;
            c.min_lines_on_page = 3;
        }
        BlockType::TwoColumn | BlockType::Divider | BlockType::Spacer => {}
    }

    if let Some(rules) = &block.flow_rules {
        match rules.hint {
            FlowHint::KeepWithNext => c.keep_with_next = true,
            FlowHint::KeepWithPrevious => c.keep_with_previous = true,
            _ => {}
        }
        if rules.anchor_to_bottom {
            c.anchor_bottom = true;
        }
    }
    c
}

/// Constraints attached by the flow stage, derived on demand otherwise.
pub fn constraints_of(block: &Block) -> FlowConstraints {
    block
        .flow
        .map(|f| f.constraints)
        .unwrap_or_else(|| get_flow_constraints(block))
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

fn make_group(group_type: GroupType, members: &[&Block], index: usize) -> FlowGroup {
    let keep_together = group_type != GroupType::ContentGroup;
    FlowGroup {
        id: format!("group_{}_{index}", group_type.as_str()),
        group_type,
        block_ids: members.iter().map(|b| b.id.clone()).collect(),
        block_count: members.len(),
        total_height: members.iter().map(|b| block_height(b)).sum(),
        keep_together,
        break_before: false,
        break_after: false,
        anchor_bottom: group_type == GroupType::FooterGroup,
    }
}

/// Cluster blocks into flow groups in one left-to-right scan.
///
/// A header joins an immediately following client; investment and footer
/// each close the running content group and form their own group. Every
/// block lands in exactly one group.
pub fn create_flow_groups(blocks: &[Block]) -> Vec<FlowGroup> {
    let mut groups: Vec<FlowGroup> = Vec::new();
    let mut content: Vec<&Block> = Vec::new();
    let mut pending_header: Option<&Block> = None;

    fn flush_header(groups: &mut Vec<FlowGroup>, pending: &mut Option<&Block>) {
        if let Some(header) = pending.take() {
            let idx = groups.len();
            groups.push(make_group(GroupType::HeaderGroup, &[header], idx));
        }
    }
    fn flush_content(groups: &mut Vec<FlowGroup>, content: &mut Vec<&Block>) {
        if !content.is_empty() {
            let idx = groups.len();
            groups.push(make_group(GroupType::ContentGroup, content, idx));
            content.clear();
        }
    }

    for block in blocks {
        match block.block_type {
            BlockType::Header => {
                flush_header(&mut groups, &mut pending_header);
                flush_content(&mut groups, &mut content);
                pending_header = Some(block);
            }
            BlockType::Client => {
                flush_content(&mut groups, &mut content);
                let members: Vec<&Block> = pending_header.take().into_iter().chain([block]).collect();
                let idx = groups.len();
                groups.push(make_group(GroupType::HeaderGroup, &members, idx));
            }
            BlockType::Investment | BlockType::Footer => {
                flush_header(&mut groups, &mut pending_header);
                flush_content(&mut groups, &mut content);
                let group_type = GroupType::for_block(block.block_type);
                let idx = groups.len();
                groups.push(make_group(group_type, &[block], idx));
            }
            BlockType::TwoColumn
            | BlockType::Section
            | BlockType::Grid
            | BlockType::Timeline
            | BlockType::Divider
            | BlockType::Spacer => {
                flush_header(&mut groups, &mut pending_header);
                content.push(block);
            }
        }
    }
    flush_header(&mut groups, &mut pending_header);
    flush_content(&mut groups, &mut content);
    groups
}

// ---------------------------------------------------------------------------
// Stacking
// ---------------------------------------------------------------------------

/// Assign each block a `flow_position` at the running sum of its
/// predecessors' heights, starting from `start_y`.
pub fn stack_blocks(blocks: &[Block], start_y: f32) -> Vec<Block> {
    let mut y = start_y;
    blocks
        .iter()
        .map(|block| {
            let height = block.flow.map(|f| f.height).unwrap_or_else(|| {
                calculate_block_height(block, PAGE_WIDTH)
            });
            let positioned = Block {
                flow_position: Some(FlowPosition { y, height }),
                ..block.clone()
            };
            y += height;
            positioned
        })
        .collect()
}

pub fn get_total_stack_height(blocks: &[Block]) -> f32 {
    blocks.iter().map(block_height).sum()
}

// ---------------------------------------------------------------------------
// Overflow
// ---------------------------------------------------------------------------

pub fn check_overflow(block_height: f32, available: f32) -> bool {
    block_height > available
}

pub fn check_group_overflow(group: &FlowGroup, available: f32) -> bool {
    check_overflow(group.total_height, available)
}

/// Result of [`find_break_point`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakPoint {
    /// Index of the last block that can end the current page.
    pub break_index: Option<usize>,
    pub fits_count: usize,
    pub remaining_count: usize,
}

/// Largest prefix of `blocks` that fits in `available` without ending on a
/// block that must stay with its successor.
pub fn find_break_point(blocks: &[Block], available: f32) -> BreakPoint {
    let mut used = 0.0;
    let mut break_index = None;

    for (i, block) in blocks.iter().enumerate() {
        let height = block_height(block);
        if used + height > available {
            break;
        }
        used += height;
        if !constraints_of(block).keep_with_next || i + 1 == blocks.len() {
            break_index = Some(i);
        }
    }

    let fits_count = break_index.map_or(0, |i| i + 1);
    BreakPoint {
        break_index,
        fits_count,
        remaining_count: blocks.len() - fits_count,
    }
}

// ---------------------------------------------------------------------------
// Stage entry point
// ---------------------------------------------------------------------------

/// Estimate heights, stack blocks and build flow groups.
pub fn apply_flow(doc: &DocumentModel) -> DocumentModel {
    let (container_width, page_height) = if doc.layout.is_set() {
        (doc.layout.width, doc.layout.height)
    } else {
        (PAGE_WIDTH, PAGE_HEIGHT)
    };

    let measured: Vec<Block> = doc
        .blocks
        .iter()
        .map(|block| Block {
            flow: Some(FlowData {
                height: calculate_block_height(block, container_width),
                constraints: get_flow_constraints(block),
            }),
            ..block.clone()
        })
        .collect();

    let blocks = stack_blocks(&measured, 0.0);
    let groups = create_flow_groups(&blocks);
    let total_height = get_total_stack_height(&blocks);
    let page_count = ((total_height / page_height).ceil() as usize).max(1);

    log::debug!(
        "Flow: {:.0}px across {} group(s), ~{} page(s)",
        total_height,
        groups.len(),
        page_count
    );

    DocumentModel {
        blocks,
        flow_meta: Some(FlowMeta {
            total_height,
            page_height,
            page_count,
            is_single_page: page_count == 1,
            group_count: groups.len(),
            groups,
        }),
        ..doc.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowReadyBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: BlockContent,
    pub position: Option<FlowPosition>,
    pub constraints: FlowConstraints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowReadyDocument {
    pub blocks: Vec<FlowReadyBlock>,
    pub groups: Vec<FlowGroup>,
    pub total_height: f32,
    pub page_count: usize,
    pub is_single_page: bool,
}

/// Flattened view of a flowed document; runs [`apply_flow`] first when the
/// document has not been through it yet.
pub fn flow_ready_representation(doc: &DocumentModel) -> FlowReadyDocument {
    let flowed;
    let doc = if doc.flow_meta.is_some() {
        doc
    } else {
        flowed = apply_flow(doc);
        &flowed
    };
    let (groups, total_height, page_count, is_single_page) = match &doc.flow_meta {
        Some(m) => (m.groups.clone(), m.total_height, m.page_count, m.is_single_page),
        None => (Vec::new(), 0.0, 1, true),
    };
    FlowReadyDocument {
        blocks: doc
            .blocks
            .iter()
            .map(|b| FlowReadyBlock {
                id: b.id.clone(),
                block_type: b.block_type,
                content: b.content.clone(),
                position: b.flow_position,
                constraints: constraints_of(b),
            })
            .collect(),
        groups,
        total_height,
        page_count,
        is_single_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::Composer;
    use crate::fields::ProposalFields;
    use crate::layout::apply_layout;
    use crate::model::SectionContent;
    use crate::rules::FlowRules;

    fn flowed(fields: ProposalFields) -> DocumentModel {
        apply_flow(&apply_layout(&Composer::new().compose(&fields)))
    }

    fn section(id: &str, body: &str) -> Block {
        Block::new(
            id,
            BlockType::Section,
            BlockContent::Section(SectionContent {
                title: "T".into(),
                body: body.into(),
                icon: None,
                anchor: true,
            }),
        )
    }

    #[test]
    fn fixed_heights_are_clamped() {
        let doc = flowed(ProposalFields::default());
        let heights: Vec<f32> = doc.blocks.iter().map(block_height).collect();
        // footer base 120 is raised to its 150 minimum
        assert_eq!(heights, vec![280.0, 100.0, 150.0]);
        assert_eq!(doc.flow_meta.as_ref().unwrap().total_height, 530.0);
    }

    #[test]
    fn section_height_grows_with_text() {
        let short = calculate_block_height(&section("a", "hi"), 794.0);
        let long = calculate_block_height(&section("b", &"word ".repeat(200)), 794.0);
        // 30 title + one 22.4px line + 64 padding
        assert!((short - 116.4).abs() < 0.01);
        assert!(long > short);
    }

    #[test]
    fn grid_rows_drive_height() {
        let doc = flowed(ProposalFields {
            scope_of_work: Some("a\nb\nc".into()),
            ..Default::default()
        });
        let grid = doc.blocks_of_type(BlockType::Grid).next().unwrap();
        assert_eq!(block_height(grid), 2.0 * 80.0 + 64.0 + 30.0);
    }

    #[test]
    fn header_and_client_form_one_group() {
        let doc = flowed(ProposalFields {
            pricing: Some("$1".into()),
            terms: Some("t".into()),
            ..Default::default()
        });
        let groups = &doc.flow_meta.as_ref().unwrap().groups;
        let kinds: Vec<GroupType> = groups.iter().map(|g| g.group_type).collect();
        assert_eq!(
            kinds,
            vec![
                GroupType::HeaderGroup,
                GroupType::HighlightGroup,
                GroupType::ContentGroup,
                GroupType::FooterGroup,
            ]
        );
        assert_eq!(groups[0].block_count, 2);
        assert!(groups[0].keep_together);
        assert!(!groups[2].keep_together);
        assert!(groups[3].anchor_bottom);
    }

    #[test]
    fn every_block_is_in_exactly_one_group() {
        let blocks = vec![
            section("s0", "x"),
            Block::new("h", BlockType::Header, BlockContent::Empty),
            section("s1", "x"),
            Block::new("f", BlockType::Footer, BlockContent::Empty),
        ];
        let groups = create_flow_groups(&blocks);
        let mut ids: Vec<&str> = groups
            .iter()
            .flat_map(|g| g.block_ids.iter().map(String::as_str))
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["f", "h", "s0", "s1"]);
    }

    #[test]
    fn stacking_is_running_sum() {
        let doc = flowed(ProposalFields {
            timeline: Some("a\nb".into()),
            ..Default::default()
        });
        let mut expected_y = 0.0;
        for block in &doc.blocks {
            let pos = block.flow_position.unwrap();
            assert_eq!(pos.y, expected_y);
            expected_y += pos.height;
        }
        assert_eq!(get_total_stack_height(&doc.blocks), expected_y);
    }

    #[test]
    fn stack_honours_origin() {
        let stacked = stack_blocks(&[section("a", "x"), section("b", "y")], 100.0);
        assert_eq!(stacked[0].flow_position.unwrap().y, 100.0);
        assert!(stacked[1].flow_position.unwrap().y > 100.0);
    }

    #[test]
    fn constraints_by_type() {
        let client = Block::new("c", BlockType::Client, BlockContent::Empty);
        assert!(get_flow_constraints(&client).keep_with_previous);
        let footer = Block::new("f", BlockType::Footer, BlockContent::Empty);
        let c = get_flow_constraints(&footer);
        assert!(c.keep_together && c.anchor_bottom);
        let grid = Block::new("g", BlockType::Grid, BlockContent::Empty);
        assert_eq!(get_flow_constraints(&grid).min_lines_on_page, 3);
    }

    #[test]
    fn break_point_takes_fitting_prefix() {
        let blocks = stack_blocks(&[section("a", "x"), section("b", "x"), section("c", "x")], 0.0);
        let h = block_height(&blocks[0]);
        let bp = find_break_point(&blocks, h * 2.0 + 1.0);
        assert_eq!(bp.break_index, Some(1));
        assert_eq!(bp.fits_count, 2);
        assert_eq!(bp.remaining_count, 1);
        assert_eq!(find_break_point(&blocks, 1.0).break_index, None);
    }

    #[test]
    fn break_point_never_ends_on_keep_with_next() {
        let linked = Block {
            flow_rules: Some(FlowRules {
                hint: FlowHint::KeepWithNext,
                ..FlowRules::for_type(BlockType::Section)
            }),
            ..section("b", "x")
        };
        let blocks = stack_blocks(&[section("a", "x"), linked, section("c", "x")], 0.0);
        let h = block_height(&blocks[0]);
        let bp = find_break_point(&blocks, h * 2.0 + 1.0);
        assert_eq!(bp.break_index, Some(0));
        assert_eq!(bp.fits_count, 1);
        assert_eq!(bp.remaining_count, 2);
    }

    #[test]
    fn overflow_checks() {
        assert!(check_overflow(101.0, 100.0));
        assert!(!check_overflow(100.0, 100.0));
    }

    #[test]
    fn flow_ready_runs_flow_when_missing() {
        let doc = apply_layout(&Composer::new().compose(&ProposalFields::default()));
        let rep = flow_ready_representation(&doc);
        assert_eq!(rep.blocks.len(), 3);
        assert!(rep.blocks.iter().all(|b| b.position.is_some()));
        assert!(rep.is_single_page);
    }
}
