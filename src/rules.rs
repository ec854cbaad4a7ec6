//! Per-type rule tables the composer stamps onto every block: box
//! defaults, pagination flow hints, keep-together group membership and the
//! region hierarchy.
//!
//! Every table is an exhaustive `match` over [`BlockType`], so adding a block
//! type fails to compile until each table has an entry for it.

use serde::{Deserialize, Serialize};

use crate::model::{BlockType, Edges, HierarchyLevel, LayoutHint, Region};

// ---------------------------------------------------------------------------
// Layout rules
// ---------------------------------------------------------------------------

/// Coarse alignment of a block's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAlignment {
    #[default]
    Left,
    Center,
    Stretch,
}

/// Semantic background token requested by a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundToken {
    Primary,
    Accent,
}

/// Box defaults for one block type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRules {
    pub width: LayoutHint,
    pub computed_width: String,
    pub min_height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f32>,
    pub padding: Edges,
    pub margin: Edges,
    pub alignment: RuleAlignment,
    #[serde(default)]
    pub overflow_hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundToken>,
    /// Horizontal gap between columns (two-column) or grid cells (grid).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_gap: Option<f32>,
    /// Preferred grid column count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<usize>,
    /// Timeline phase spacing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_gap: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f32>,
}

impl LayoutRules {
    fn base(padding: Edges) -> Self {
        let width = LayoutHint::FullWidth;
        Self {
            width,
            computed_width: width.percent_width().to_string(),
            min_height: 0.0,
            max_height: None,
            padding,
            margin: Edges::ZERO,
            alignment: RuleAlignment::Left,
            overflow_hidden: false,
            background: None,
            column_gap: None,
            columns: None,
            item_gap: None,
            marker_size: None,
            line_width: None,
        }
    }

    /// Box defaults for `block_type`. Dividers and spacers share the section
    /// defaults.
    pub fn for_type(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Header => Self {
                min_height: 200.0,
                max_height: Some(350.0),
                alignment: RuleAlignment::Center,
                overflow_hidden: true,
                ..Self::base(Edges::ZERO)
            },
            BlockType::Client => Self {
                min_height: 80.0,
                background: Some(BackgroundToken::Primary),
                ..Self::base(Edges::symmetric(24.0, 32.0))
            },
            BlockType::TwoColumn => Self {
                alignment: RuleAlignment::Stretch,
                column_gap: Some(20.0),
                ..Self::base(Edges::symmetric(24.0, 32.0))
            },
            BlockType::Grid => Self {
                columns: Some(2),
                column_gap: Some(16.0),
                ..Self::base(Edges::all(32.0))
            },
            BlockType::Timeline => Self {
                item_gap: Some(16.0),
                marker_size: Some(12.0),
                line_width: Some(2.0),
                ..Self::base(Edges::all(32.0))
            },
            BlockType::Investment => Self {
                min_height: 120.0,
                alignment: RuleAlignment::Center,
                background: Some(BackgroundToken::Accent),
                ..Self::base(Edges::all(40.0))
            },
            BlockType::Footer => Self {
                min_height: 150.0,
                ..Self::base(Edges {
                    top: 32.0,
                    right: 32.0,
                    bottom: 24.0,
                    left: 32.0,
                })
            },
            BlockType::Section | BlockType::Divider | BlockType::Spacer => {
                Self::base(Edges::all(32.0))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Grouping rules
// ---------------------------------------------------------------------------

/// Keep-together cluster a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    HeaderGroup,
    ContentGroup,
    HighlightGroup,
    FooterGroup,
}

impl GroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::HeaderGroup => "header_group",
            GroupType::ContentGroup => "content_group",
            GroupType::HighlightGroup => "highlight_group",
            GroupType::FooterGroup => "footer_group",
        }
    }

    /// Group a block type is a member of.
    pub fn for_block(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Header | BlockType::Client => GroupType::HeaderGroup,
            BlockType::Investment => GroupType::HighlightGroup,
            BlockType::Footer => GroupType::FooterGroup,
            BlockType::TwoColumn
            | BlockType::Section
            | BlockType::Grid
            | BlockType::Timeline
            | BlockType::Divider
            | BlockType::Spacer => GroupType::ContentGroup,
        }
    }
}

/// Group membership stamped onto a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grouping {
    pub group: GroupType,
    pub keep_together: bool,
    pub priority: u8,
    pub break_before: bool,
    pub break_after: bool,
    #[serde(default)]
    pub anchor_to_bottom: bool,
    #[serde(default)]
    pub min_orphan_lines: u32,
}

impl Grouping {
    pub fn for_group(group: GroupType) -> Self {
        let base = Self {
            group,
            keep_together: true,
            priority: 1,
            break_before: false,
            break_after: false,
            anchor_to_bottom: false,
            min_orphan_lines: 0,
        };
        match group {
            GroupType::HeaderGroup => base,
            GroupType::ContentGroup => Self {
                keep_together: false,
                priority: 2,
                min_orphan_lines: 3,
                ..base
            },
            GroupType::HighlightGroup => Self {
                priority: 3,
                break_before: true,
                ..base
            },
            GroupType::FooterGroup => Self {
                priority: 4,
                anchor_to_bottom: true,
                ..base
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Hierarchy rules
// ---------------------------------------------------------------------------

/// Region and level a block type lives at.
pub fn hierarchy_rule(block_type: BlockType) -> (Region, HierarchyLevel) {
    match block_type {
        BlockType::Header => (Region::Header, HierarchyLevel::Section),
        BlockType::Client => (Region::Header, HierarchyLevel::Block),
        BlockType::TwoColumn | BlockType::Section | BlockType::Grid | BlockType::Timeline => {
            (Region::Body, HierarchyLevel::Section)
        }
        BlockType::Divider | BlockType::Spacer => (Region::Body, HierarchyLevel::Block),
        BlockType::Investment => (Region::Highlight, HierarchyLevel::Section),
        BlockType::Footer => (Region::Footer, HierarchyLevel::Section),
    }
}

// ---------------------------------------------------------------------------
// Flow rules
// ---------------------------------------------------------------------------

/// Pagination hint for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowHint {
    #[default]
    Normal,
    BreakBefore,
    BreakAfter,
    KeepWithNext,
    KeepWithPrevious,
    AvoidBreak,
}

/// Pagination hints stamped onto a block by the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRules {
    pub hint: FlowHint,
    pub min_content_height: u32,
    pub orphan_lines: u32,
    pub widow_lines: u32,
    #[serde(default)]
    pub min_items_on_page: u32,
    pub anchor_to_bottom: bool,
    pub has_next: bool,
    pub has_prev: bool,
}

impl FlowRules {
    /// Table entry for `block_type`; neighbour flags are left unset.
    pub fn for_type(block_type: BlockType) -> Self {
        let normal = Self::default();
        match block_type {
            BlockType::Header => Self {
                hint: FlowHint::AvoidBreak,
                min_content_height: 200,
                ..normal
            },
            BlockType::Client => Self {
                hint: FlowHint::KeepWithPrevious,
                min_content_height: 80,
                ..normal
            },
            BlockType::TwoColumn => Self {
                min_content_height: 150,
                orphan_lines: 2,
                ..normal
            },
            BlockType::Section => Self {
                min_content_height: 100,
                orphan_lines: 3,
                widow_lines: 2,
                ..normal
            },
            BlockType::Grid => Self {
                min_items_on_page: 2,
                ..normal
            },
            BlockType::Timeline => Self {
                min_items_on_page: 1,
                ..normal
            },
            BlockType::Investment => Self {
                hint: FlowHint::AvoidBreak,
                min_content_height: 120,
                ..normal
            },
            BlockType::Footer => Self {
                hint: FlowHint::AvoidBreak,
                anchor_to_bottom: true,
                ..normal
            },
            BlockType::Divider | BlockType::Spacer => normal,
        }
    }

    /// Table entry with neighbour flags filled from the block's position in a
    /// sequence of `len` blocks.
    pub fn at_position(block_type: BlockType, index: usize, len: usize) -> Self {
        Self {
            has_prev: index > 0,
            has_next: index + 1 < len,
            ..Self::for_type(block_type)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_client_share_keep_together_group() {
        for t in [BlockType::Header, BlockType::Client] {
            let g = Grouping::for_group(GroupType::for_block(t));
            assert_eq!(g.group, GroupType::HeaderGroup);
            assert!(g.keep_together);
            assert_eq!(g.priority, 1);
        }
    }

    #[test]
    fn content_group_is_loose() {
        let g = Grouping::for_group(GroupType::for_block(BlockType::Timeline));
        assert!(!g.keep_together);
        assert_eq!(g.min_orphan_lines, 3);
    }

    #[test]
    fn footer_anchors_to_bottom() {
        let g = Grouping::for_group(GroupType::FooterGroup);
        assert!(g.anchor_to_bottom);
        assert!(FlowRules::for_type(BlockType::Footer).anchor_to_bottom);
    }

    #[test]
    fn header_box_is_clamped() {
        let r = LayoutRules::for_type(BlockType::Header);
        assert_eq!(r.min_height, 200.0);
        assert_eq!(r.max_height, Some(350.0));
        assert_eq!(r.computed_width, "100%");
    }

    #[test]
    fn neighbour_flags_follow_position() {
        let first = FlowRules::at_position(BlockType::Header, 0, 3);
        let last = FlowRules::at_position(BlockType::Footer, 2, 3);
        assert!(!first.has_prev && first.has_next);
        assert!(last.has_prev && !last.has_next);
        assert_eq!(last.hint, FlowHint::AvoidBreak);
    }

    #[test]
    fn spacer_lives_in_body() {
        assert_eq!(
            hierarchy_rule(BlockType::Spacer),
            (Region::Body, HierarchyLevel::Block)
        );
    }
}
