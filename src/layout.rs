//! Layout calculator – attaches box-model data (widths, padding, collapsed
//! margins, container styling, typography roles) to every block, and column
//! geometry to multi-column blocks.
//!
//! Column geometry is solved with Taffy: a flex row of equally growing
//! children separated by a fixed gap.

use serde::{Deserialize, Serialize};
use taffy::prelude::*;

use crate::model::{Block, BlockContent, BlockType, DocumentModel, Edges, LayoutHint};
use crate::model::{PAGE_HEIGHT, PAGE_WIDTH};
use crate::rules::{LayoutRules, RuleAlignment};
use crate::style::{
    block_typography, container_for, Alignment, ContainerKind, HorizontalAlign, SpacingScale,
    TypographyMap, VerticalAlign,
};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Visual container attached to a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxModel {
    pub container: ContainerKind,
    pub border_radius: f32,
    pub background: String,
    pub shadow: String,
}

/// One column slot inside a multi-column block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnSlot {
    pub index: usize,
    pub x: f32,
    pub width: f32,
    /// Gap to the next column; zero for the last one.
    pub gap: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLayout {
    pub column_count: usize,
    pub column_width: f32,
    pub gap: f32,
    pub total_width: f32,
    pub columns: Vec<ColumnSlot>,
}

/// Box model computed for one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedLayout {
    pub width: f32,
    pub content_width: f32,
    pub min_height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f32>,
    pub padding: Edges,
    pub margin: Edges,
    pub position: Position,
    pub box_model: BoxModel,
    pub typography: TypographyMap,
    pub alignment: Alignment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnLayout>,
}

/// Document-level layout summary. `page_count` is only an estimate; the
/// paginator produces the real one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMeta {
    pub total_height: f32,
    pub page_count: usize,
    pub page_width: f32,
    pub page_height: f32,
}

// ---------------------------------------------------------------------------
// Margins
// ---------------------------------------------------------------------------

/// Outer spacing before collapse.
pub fn base_margins(block_type: BlockType) -> Edges {
    match block_type {
        BlockType::TwoColumn => Edges::symmetric(SpacingScale::LG, 0.0),
        BlockType::Investment => Edges::symmetric(SpacingScale::LG, SpacingScale::XL),
        BlockType::Header
        | BlockType::Client
        | BlockType::Section
        | BlockType::Grid
        | BlockType::Timeline
        | BlockType::Footer
        | BlockType::Divider
        | BlockType::Spacer => Edges::ZERO,
    }
}

/// Margins with the top collapsed against the previous block's bottom,
/// floored at zero.
pub fn calculate_margins(block_type: BlockType, previous: Option<BlockType>) -> Edges {
    let mut margins = base_margins(block_type);
    if let Some(prev) = previous {
        margins.top = (margins.top - base_margins(prev).bottom).max(0.0);
    }
    margins
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// Split `container_width` into `column_count` equal columns separated by
/// `gap`.
pub fn calculate_column_layout(column_count: usize, container_width: f32, gap: f32) -> ColumnLayout {
    let solved = if column_count == 0 {
        Some(Vec::new())
    } else {
        solve_columns(column_count, container_width, gap)
    };
    let spans = solved.unwrap_or_else(|| {
        log::warn!("Column solver failed for {column_count} columns; using arithmetic split");
        arithmetic_columns(column_count, container_width, gap)
    });

    let columns: Vec<ColumnSlot> = spans
        .iter()
        .enumerate()
        .map(|(index, &(x, width))| ColumnSlot {
            index,
            x,
            width,
            gap: if index + 1 < column_count { gap } else { 0.0 },
        })
        .collect();

    ColumnLayout {
        column_count,
        column_width: columns.first().map(|c| c.width).unwrap_or(0.0),
        gap,
        total_width: container_width,
        columns,
    }
}

pub fn calculate_two_column_layout(container_width: f32, gap: f32) -> ColumnLayout {
    calculate_column_layout(2, container_width, gap)
}

/// (x, width) of each column from a Taffy flex row.
fn solve_columns(count: usize, container_width: f32, gap: f32) -> Option<Vec<(f32, f32)>> {
    let mut tree: TaffyTree<()> = TaffyTree::new();
    tree.disable_rounding();

    let column_style = Style {
        flex_grow: 1.0,
        flex_shrink: 1.0,
        flex_basis: taffy::Dimension::Length(0.0),
        ..Default::default()
    };
    let children = (0..count)
        .map(|_| tree.new_leaf(column_style.clone()))
        .collect::<std::result::Result<Vec<NodeId>, _>>()
        .ok()?;

    let row = tree
        .new_with_children(
            Style {
                display: taffy::Display::Flex,
                flex_direction: taffy::FlexDirection::Row,
                size: Size {
                    width: taffy::Dimension::Length(container_width),
                    height: taffy::Dimension::Auto,
                },
                gap: Size {
                    width: LengthPercentage::Length(gap),
                    height: LengthPercentage::Length(0.0),
                },
                ..Default::default()
            },
            &children,
        )
        .ok()?;

    tree.compute_layout(
        row,
        Size {
            width: AvailableSpace::Definite(container_width),
            height: AvailableSpace::MaxContent,
        },
    )
    .ok()?;

    children
        .iter()
        .map(|&child| {
            let layout = tree.layout(child).ok()?;
            Some((layout.location.x, layout.size.width))
        })
        .collect()
}

fn arithmetic_columns(count: usize, container_width: f32, gap: f32) -> Vec<(f32, f32)> {
    if count == 0 {
        return Vec::new();
    }
    let width = (container_width - gap * (count as f32 - 1.0)) / count as f32;
    (0..count)
        .map(|i| (i as f32 * (width + gap), width))
        .collect()
}

/// Column geometry for blocks that lay their content out side by side.
fn columns_for(block: &Block, rules: &LayoutRules, content_width: f32) -> Option<ColumnLayout> {
    let inner_width = content_width - rules.padding.horizontal();
    match &block.content {
        BlockContent::TwoColumn(tc) if !tc.columns.is_empty() => Some(calculate_column_layout(
            tc.columns.len(),
            inner_width,
            rules.column_gap.unwrap_or(SpacingScale::LG),
        )),
        BlockContent::Grid(grid) if !grid.items.is_empty() => Some(calculate_column_layout(
            grid.columns.max(1),
            inner_width,
            rules.column_gap.unwrap_or(SpacingScale::MD),
        )),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Running state threaded block to block.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutContext {
    pub page_width: f32,
    pub page_height: f32,
    pub container_width: f32,
    pub current_y: f32,
    pub total_height: f32,
    pub previous: Option<BlockType>,
}

impl LayoutContext {
    pub fn new(page_width: f32, page_height: f32) -> Self {
        Self {
            page_width,
            page_height,
            container_width: page_width,
            current_y: 0.0,
            total_height: 0.0,
            previous: None,
        }
    }

    /// Context after `block` has been laid out.
    pub fn advance(&self, block: &Block, layout: &ComputedLayout) -> Self {
        let height = layout.min_height
            + layout.padding.vertical()
            + layout.margin.top
            + layout.margin.bottom;
        Self {
            current_y: self.current_y + height,
            total_height: self.total_height + height,
            previous: Some(block.block_type),
            ..self.clone()
        }
    }
}

impl Default for LayoutContext {
    fn default() -> Self {
        Self::new(PAGE_WIDTH, PAGE_HEIGHT)
    }
}

// ---------------------------------------------------------------------------
// Block layout
// ---------------------------------------------------------------------------

fn alignment_for(rule: RuleAlignment) -> Alignment {
    match rule {
        RuleAlignment::Left => Alignment::new(HorizontalAlign::Left, VerticalAlign::Top),
        RuleAlignment::Center => Alignment::new(HorizontalAlign::Center, VerticalAlign::Middle),
        RuleAlignment::Stretch => Alignment::new(HorizontalAlign::Stretch, VerticalAlign::Top),
    }
}

/// Box model for one block at the context's current position.
pub fn calculate_block_layout(block: &Block, ctx: &LayoutContext) -> ComputedLayout {
    let rules = block
        .layout_rules
        .clone()
        .unwrap_or_else(|| LayoutRules::for_type(block.block_type));
    let container = container_for(block.block_type, &block.metadata).style();

    let width = ctx.container_width;
    let side = match block.layout_hint {
        LayoutHint::Padded => Some(SpacingScale::XL),
        LayoutHint::Centered => Some(SpacingScale::SECTION),
        _ => None,
    };
    let (content_width, side_padding) = match side {
        Some(pad) => (width - 2.0 * pad, pad),
        None => (width, container.padding),
    };

    ComputedLayout {
        width,
        content_width,
        min_height: rules.min_height,
        max_height: rules.max_height,
        padding: Edges {
            top: container.padding,
            right: side_padding,
            bottom: container.padding,
            left: side_padding,
        },
        margin: calculate_margins(block.block_type, ctx.previous),
        position: Position {
            x: 0.0,
            y: ctx.current_y,
        },
        box_model: BoxModel {
            container: container.kind,
            border_radius: container.border_radius,
            background: container.background,
            shadow: container.shadow,
        },
        typography: block_typography(block.block_type),
        alignment: alignment_for(rules.alignment),
        columns: columns_for(block, &rules, content_width),
    }
}

/// Attach a [`ComputedLayout`] to every block and summarise the document in
/// [`LayoutMeta`].
pub fn apply_layout(doc: &DocumentModel) -> DocumentModel {
    let (page_width, page_height) = if doc.layout.is_set() {
        (doc.layout.width, doc.layout.height)
    } else {
        (PAGE_WIDTH, PAGE_HEIGHT)
    };
    let mut ctx = LayoutContext::new(page_width, page_height);

    let blocks: Vec<Block> = doc
        .blocks
        .iter()
        .map(|block| {
            let layout = calculate_block_layout(block, &ctx);
            ctx = ctx.advance(block, &layout);
            Block {
                computed_layout: Some(layout),
                ..block.clone()
            }
        })
        .collect();

    let page_count = ((ctx.total_height / page_height).ceil() as usize).max(1);
    log::debug!(
        "Layout: {} blocks, {:.0}px estimated, ~{} page(s)",
        blocks.len(),
        ctx.total_height,
        page_count
    );

    DocumentModel {
        blocks,
        layout_meta: Some(LayoutMeta {
            total_height: ctx.total_height,
            page_count,
            page_width,
            page_height,
        }),
        ..doc.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::Composer;
    use crate::fields::ProposalFields;

    #[test]
    fn two_columns_split_evenly() {
        let cols = calculate_two_column_layout(730.0, 20.0);
        assert_eq!(cols.column_count, 2);
        assert!((cols.column_width - 355.0).abs() < 0.5);
        assert!((cols.columns[1].x - 375.0).abs() < 0.5);
        assert_eq!(cols.columns[1].gap, 0.0);
    }

    #[test]
    fn three_columns_cover_container() {
        let cols = calculate_column_layout(3, 600.0, 30.0);
        let last = cols.columns.last().unwrap();
        assert!((last.x + last.width - 600.0).abs() < 0.5);
    }

    #[test]
    fn zero_columns_is_empty() {
        let cols = calculate_column_layout(0, 600.0, 30.0);
        assert!(cols.columns.is_empty());
        assert_eq!(cols.column_width, 0.0);
    }

    #[test]
    fn margin_collapse_floors_at_zero() {
        // two_column bottom 24 collapses investment top 24 to 0
        let m = calculate_margins(BlockType::Investment, Some(BlockType::TwoColumn));
        assert_eq!(m.top, 0.0);
        assert_eq!(m.left, 32.0);
        let m = calculate_margins(BlockType::Investment, Some(BlockType::Section));
        assert_eq!(m.top, 24.0);
    }

    #[test]
    fn padded_and_centered_shrink_content_width() {
        let doc = apply_layout(&Composer::new().compose(&ProposalFields {
            pricing: Some("$10".into()),
            ..Default::default()
        }));
        let client = &doc.blocks[1].computed_layout.as_ref().unwrap();
        assert_eq!(client.content_width, 730.0);
        assert_eq!(client.padding.left, 32.0);
        let investment = doc
            .blocks_of_type(BlockType::Investment)
            .next()
            .and_then(|b| b.computed_layout.as_ref())
            .unwrap();
        assert_eq!(investment.content_width, 666.0);
        assert_eq!(investment.padding.left, 64.0);
    }

    #[test]
    fn layout_is_non_destructive() {
        let composed = Composer::new().compose(&ProposalFields::default());
        let laid_out = apply_layout(&composed);
        assert!(composed.blocks.iter().all(|b| b.computed_layout.is_none()));
        assert!(laid_out.blocks.iter().all(|b| b.computed_layout.is_some()));
        let meta = laid_out.layout_meta.unwrap();
        assert_eq!(meta.page_count, 1);
        assert_eq!(meta.page_width, 794.0);
    }

    #[test]
    fn positions_follow_context() {
        let doc = apply_layout(&Composer::new().compose(&ProposalFields::default()));
        // header: min 200 + hero padding 80*2
        let client = doc.blocks[1].computed_layout.as_ref().unwrap();
        assert_eq!(client.position.y, 360.0);
    }

    #[test]
    fn grid_gets_column_geometry() {
        let doc = apply_layout(&Composer::new().compose(&ProposalFields {
            scope_of_work: Some("a\nb\nc".into()),
            ..Default::default()
        }));
        let grid = doc.blocks_of_type(BlockType::Grid).next().unwrap();
        let cols = grid.computed_layout.as_ref().unwrap().columns.as_ref().unwrap();
        assert_eq!(cols.column_count, 2);
        assert_eq!(cols.gap, 16.0);
        assert!((cols.column_width - 357.0).abs() < 0.5);
    }
}
