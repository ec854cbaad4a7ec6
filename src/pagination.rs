//! Pagination – distributes flowed blocks across fixed-size pages.
//!
//! Handles:
//! - Keep-together flow groups (header+client, investment, footer)
//! - No-split policy: a block is never divided between pages
//! - Break restrictions (keep-with-previous, keep-with-next, client after header)
//! - Overflow: a block that cannot be moved is placed anyway and its page is
//!   flagged, so no block is ever lost or duplicated

use std::collections::{HashMap, HashSet};

use crate::flow::{block_height, constraints_of, create_flow_groups, FlowGroup};
use crate::model::{Block, BlockType, DocumentModel, PAGE_HEIGHT, PAGE_WIDTH};
use crate::page_layout::{
    BlockSpan, MultiPageLayout, Page, PageSize, PageView, PaginationResult, Placement,
    PlacedBlockView,
};

/// Block types that must never be split across pages.
pub const NO_SPLIT_BLOCKS: &[BlockType] = &[
    BlockType::Header,
    BlockType::Client,
    BlockType::Investment,
    BlockType::Timeline,
    BlockType::Footer,
    BlockType::TwoColumn,
    BlockType::Grid,
];

/// Block types allowed to split when they straddle a page boundary. Empty:
/// no splitting strategy exists yet.
pub const SPLITTABLE_BLOCKS: &[BlockType] = &[];

/// Page dimensions in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
        }
    }
}

impl PageGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The document's own page setup, or A4 when it has none.
    pub fn of(doc: &DocumentModel) -> Self {
        if doc.layout.is_set() {
            Self::new(doc.layout.width, doc.layout.height)
        } else {
            Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Break rules
// ---------------------------------------------------------------------------

pub fn can_split_block(block: &Block) -> bool {
    if NO_SPLIT_BLOCKS.contains(&block.block_type) {
        return false;
    }
    if constraints_of(block).keep_together {
        return false;
    }
    SPLITTABLE_BLOCKS.contains(&block.block_type)
}

/// Whether a page break may fall between `previous` and `block`.
pub fn can_break_before(block: &Block, previous: Option<&Block>) -> bool {
    let Some(previous) = previous else {
        return false;
    };
    if block.block_type == BlockType::Client {
        return false;
    }
    if constraints_of(previous).keep_with_next {
        return false;
    }
    !constraints_of(block).keep_with_previous
}

pub fn block_fits_on_page(height: f32, available: f32) -> bool {
    height <= available
}

// ---------------------------------------------------------------------------
// Page builder
// ---------------------------------------------------------------------------

struct PageBuilder {
    geometry: PageGeometry,
    pages: Vec<Page>,
    current: Page,
}

impl PageBuilder {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: Vec::new(),
            current: Page::new(1, geometry.width, geometry.height),
        }
    }

    fn new_page(&mut self) {
        let next = Page::new(
            self.current.number + 1,
            self.geometry.width,
            self.geometry.height,
        );
        let done = std::mem::replace(&mut self.current, next);
        self.pages.push(done);
    }

    fn place(&mut self, block: &Block, height: f32) {
        let fitted = self.current.fits(height);
        self.current.push(&block.id, block.block_type, height);
        if !fitted {
            log::warn!(
                "Block {} ({:.0}px) overflows page {} by {:.0}px",
                block.id,
                height,
                self.current.number,
                -self.current.available_height
            );
        }
    }

    /// Place one block, opening a new page when it does not fit and a break
    /// is allowed.
    fn place_with_break(&mut self, block: &Block, previous: Option<&Block>) {
        let height = block_height(block);
        if !self.current.fits(height) && !self.current.is_empty() {
            if can_break_before(block, previous) {
                self.new_page();
            } else {
                log::warn!(
                    "No break allowed before {}; keeping it on page {}",
                    block.id,
                    self.current.number
                );
            }
        }
        self.place(block, height);
    }

    fn finish(mut self, total_blocks: usize, group_count: usize) -> PaginationResult {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        if let Some(last) = self.pages.last_mut() {
            last.is_last = true;
        }
        let page_count = self.pages.len();
        let overflowing = self.pages.iter().filter(|p| p.overflow).count();
        log::debug!(
            "Paginated {total_blocks} blocks onto {page_count} page(s), {overflowing} overflowing"
        );
        PaginationResult {
            pages: self.pages,
            page_count,
            total_blocks,
            group_count,
            is_single_page: page_count == 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Pagination algorithms
// ---------------------------------------------------------------------------

/// Paginate group by group. A group that fits is placed whole; a
/// keep-together group that does not fit starts a fresh page; otherwise its
/// blocks are placed one at a time.
pub fn paginate_by_groups(doc: &DocumentModel, geometry: PageGeometry) -> PaginationResult {
    let by_id: HashMap<&str, &Block> = doc.blocks.iter().map(|b| (b.id.as_str(), b)).collect();
    let computed;
    let groups: &[FlowGroup] = match &doc.flow_meta {
        Some(meta) => &meta.groups,
        None => {
            computed = create_flow_groups(&doc.blocks);
            &computed
        }
    };

    let mut builder = PageBuilder::new(geometry);
    let mut placed: HashSet<&str> = HashSet::new();
    let mut previous: Option<&Block> = None;

    for group in groups {
        let members: Vec<&Block> = group
            .block_ids
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).copied())
            .filter(|b| !placed.contains(b.id.as_str()))
            .collect();
        let Some(first) = members.first() else {
            continue;
        };

        let total: f32 = members.iter().map(|&b| block_height(b)).sum();
        if builder.current.fits(total) {
            for &block in &members {
                builder.place(block, block_height(block));
            }
        } else {
            if group.keep_together
                && !builder.current.is_empty()
                && can_break_before(first, previous)
            {
                builder.new_page();
            }
            let mut prev = previous;
            for &block in &members {
                builder.place_with_break(block, prev);
                prev = Some(block);
            }
        }

        placed.extend(members.iter().map(|&b| b.id.as_str()));
        previous = members.last().copied();
    }

    for block in &doc.blocks {
        if placed.insert(block.id.as_str()) {
            log::warn!("Block {} was not in any flow group; appending", block.id);
            builder.place_with_break(block, previous);
            previous = Some(block);
        }
    }

    builder.finish(doc.blocks.len(), groups.len())
}

/// Paginate block by block. When a block cannot break from its predecessor,
/// the predecessor is pulled onto a new page with it; if the predecessor is
/// alone on its page the block overflows instead.
pub fn paginate_document(doc: &DocumentModel, geometry: PageGeometry) -> PaginationResult {
    let mut builder = PageBuilder::new(geometry);
    let mut previous: Option<&Block> = None;

    for block in &doc.blocks {
        let height = block_height(block);
        if builder.current.fits(height) || builder.current.is_empty() {
            builder.place(block, height);
        } else if can_break_before(block, previous) {
            builder.new_page();
            builder.place(block, height);
        } else if let (Some(prev), true) = (previous, builder.current.blocks.len() > 1) {
            builder.current.pop();
            builder.new_page();
            builder.place(prev, block_height(prev));
            builder.place(block, height);
        } else {
            builder.place(block, height);
        }
        previous = Some(block);
    }

    let group_count = doc.flow_meta.as_ref().map_or(0, |m| m.group_count);
    builder.finish(doc.blocks.len(), group_count)
}

/// Copy placements back onto the document's blocks.
pub fn attach_placements(doc: &DocumentModel, result: &PaginationResult) -> DocumentModel {
    let placements: HashMap<&str, Placement> = result
        .pages
        .iter()
        .flat_map(|p| p.blocks.iter())
        .map(|b| {
            (
                b.id.as_str(),
                Placement {
                    page_number: b.page_number,
                    page_y: b.page_y,
                    height: b.height,
                },
            )
        })
        .collect();

    let mut out = doc.clone();
    for block in &mut out.blocks {
        block.placement = placements.get(block.id.as_str()).copied();
    }
    out.meta.page_count = result.page_count;
    out
}

/// Paginate by groups and project the result into a serialisable
/// per-page view carrying block content.
pub fn create_multi_page_layout(doc: &DocumentModel, geometry: PageGeometry) -> MultiPageLayout {
    let result = paginate_by_groups(doc, geometry);
    let pages = result
        .pages
        .iter()
        .map(|page| PageView {
            number: page.number,
            is_first: page.is_first,
            is_last: page.is_last,
            dimensions: PageSize {
                width: page.width,
                height: page.height,
            },
            used_height: page.used_height,
            overflow: page.overflow,
            blocks: page
                .blocks
                .iter()
                .filter_map(|placed| {
                    let block = doc.block(&placed.id)?;
                    Some(PlacedBlockView {
                        id: block.id.clone(),
                        block_type: block.block_type,
                        content: block.content.clone(),
                        position: BlockSpan {
                            y: placed.page_y,
                            height: placed.height,
                        },
                        emphasis: block.emphasis,
                    })
                })
                .collect(),
        })
        .collect();

    let document_id = if doc.meta.client_name.is_empty() {
        "document".to_string()
    } else {
        doc.meta.client_name.clone()
    };

    MultiPageLayout {
        version: "1.0".to_string(),
        document_id,
        page_count: result.page_count,
        is_single_page: result.is_single_page,
        page_size: PageSize {
            width: geometry.width,
            height: geometry.height,
        },
        pages,
    }
}

pub fn get_page_for_block(layout: &MultiPageLayout, block_id: &str) -> Option<usize> {
    layout
        .pages
        .iter()
        .find(|p| p.blocks.iter().any(|b| b.id == block_id))
        .map(|p| p.number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{get_flow_constraints, FlowData};
    use crate::model::BlockContent;
    use crate::rules::{FlowHint, FlowRules};

    fn sized(id: &str, block_type: BlockType, height: f32) -> Block {
        let block = Block::new(id, block_type, BlockContent::Empty);
        Block {
            flow: Some(FlowData {
                height,
                constraints: get_flow_constraints(&block),
            }),
            ..block
        }
    }

    fn doc_of(blocks: Vec<Block>) -> DocumentModel {
        let mut doc = crate::compose::Composer::new()
            .compose(&crate::fields::ProposalFields::default());
        doc.blocks = blocks;
        doc.flow_meta = None;
        doc
    }

    fn ids(page: &Page) -> Vec<&str> {
        page.blocks.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn nothing_is_ever_split() {
        for t in crate::model::BlockType::ALL {
            assert!(!can_split_block(&Block::new("x", t, BlockContent::Empty)));
        }
    }

    #[test]
    fn break_rules() {
        let header = sized("h", BlockType::Header, 10.0);
        let client = sized("c", BlockType::Client, 10.0);
        let section = sized("s", BlockType::Section, 10.0);
        assert!(!can_break_before(&section, None));
        assert!(!can_break_before(&client, Some(&header)));
        assert!(can_break_before(&section, Some(&client)));
    }

    fn keep_with_next(id: &str, height: f32) -> Block {
        let block = Block {
            flow_rules: Some(FlowRules {
                hint: FlowHint::KeepWithNext,
                ..FlowRules::for_type(BlockType::Section)
            }),
            ..Block::new(id, BlockType::Section, BlockContent::Empty)
        };
        Block {
            flow: Some(FlowData {
                height,
                constraints: get_flow_constraints(&block),
            }),
            ..block
        }
    }

    #[test]
    fn no_break_after_keep_with_next() {
        let lead = keep_with_next("lead", 10.0);
        let next = sized("next", BlockType::Section, 10.0);
        assert!(!can_break_before(&next, Some(&lead)));

        let doc = doc_of(vec![
            keep_with_next("lead", 1000.0),
            sized("next", BlockType::Section, 200.0),
        ]);
        let result = paginate_by_groups(&doc, PageGeometry::default());
        assert_eq!(result.page_count, 1);
        assert_eq!(ids(&result.pages[0]), vec!["lead", "next"]);
        assert!(result.pages[0].overflow);
    }

    #[test]
    fn empty_document_gets_one_page() {
        let result = paginate_by_groups(&doc_of(Vec::new()), PageGeometry::default());
        assert_eq!(result.page_count, 1);
        assert!(result.pages[0].is_first && result.pages[0].is_last);
    }

    #[test]
    fn keep_together_group_moves_to_new_page() {
        let doc = doc_of(vec![
            sized("h", BlockType::Header, 280.0),
            sized("c", BlockType::Client, 100.0),
            sized("s1", BlockType::Section, 500.0),
            sized("s2", BlockType::Section, 200.0),
            sized("i", BlockType::Investment, 140.0),
            sized("f", BlockType::Footer, 150.0),
        ]);
        let result = paginate_by_groups(&doc, PageGeometry::default());
        // 280 + 100 + 500 + 200 = 1080; investment needs 140 with 43 left
        assert_eq!(result.page_count, 2);
        assert_eq!(ids(&result.pages[0]), vec!["h", "c", "s1", "s2"]);
        assert_eq!(ids(&result.pages[1]), vec!["i", "f"]);
        assert_eq!(result.pages[1].blocks[0].page_y, 0.0);
        assert!(result.pages.iter().all(|p| !p.overflow));
    }

    #[test]
    fn content_group_splits_between_blocks() {
        let doc = doc_of(vec![
            sized("h", BlockType::Header, 280.0),
            sized("c", BlockType::Client, 100.0),
            sized("s1", BlockType::Section, 600.0),
            sized("s2", BlockType::Section, 600.0),
            sized("f", BlockType::Footer, 150.0),
        ]);
        let result = paginate_by_groups(&doc, PageGeometry::default());
        assert_eq!(ids(&result.pages[0]), vec!["h", "c", "s1"]);
        assert_eq!(ids(&result.pages[1]), vec!["s2", "f"]);
        assert!(!result.is_single_page);
    }

    #[test]
    fn oversized_block_overflows_but_is_kept() {
        let doc = doc_of(vec![
            sized("h", BlockType::Header, 280.0),
            sized("s", BlockType::Section, 2000.0),
            sized("f", BlockType::Footer, 150.0),
        ]);
        let result = paginate_by_groups(&doc, PageGeometry::default());
        assert_eq!(result.page_count, 3);
        assert_eq!(ids(&result.pages[1]), vec!["s"]);
        assert!(result.pages[1].overflow);
        assert_eq!(result.overflow_pages().count(), 1);
    }

    #[test]
    fn client_that_cannot_break_overflows() {
        let doc = doc_of(vec![
            sized("s", BlockType::Section, 1000.0),
            sized("c", BlockType::Client, 200.0),
        ]);
        let result = paginate_by_groups(&doc, PageGeometry::default());
        assert_eq!(result.page_count, 1);
        assert!(result.pages[0].overflow);
        assert_eq!(result.total_blocks, 2);
    }

    #[test]
    fn block_pagination_pulls_predecessor_forward() {
        let doc = doc_of(vec![
            sized("a", BlockType::Section, 500.0),
            sized("b", BlockType::Section, 500.0),
            sized("c", BlockType::Client, 200.0),
        ]);
        let result = paginate_document(&doc, PageGeometry::default());
        assert_eq!(result.page_count, 2);
        assert_eq!(ids(&result.pages[0]), vec!["a"]);
        assert_eq!(ids(&result.pages[1]), vec!["b", "c"]);
        assert_eq!(result.pages[1].blocks[1].page_y, 500.0);
    }

    #[test]
    fn block_pagination_overflows_lone_predecessor() {
        let doc = doc_of(vec![
            sized("a", BlockType::Section, 1000.0),
            sized("c", BlockType::Client, 200.0),
        ]);
        let result = paginate_document(&doc, PageGeometry::default());
        assert_eq!(result.page_count, 1);
        assert!(result.pages[0].overflow);
    }

    #[test]
    fn placements_and_lookup() {
        let doc = doc_of(vec![
            sized("h", BlockType::Header, 280.0),
            sized("s", BlockType::Section, 900.0),
            sized("f", BlockType::Footer, 150.0),
        ]);
        let result = paginate_by_groups(&doc, PageGeometry::default());
        let placed = attach_placements(&doc, &result);
        let s = placed.block("s").unwrap().placement.unwrap();
        assert_eq!((s.page_number, s.page_y), (2, 0.0));
        assert_eq!(placed.meta.page_count, 2);

        let layout = create_multi_page_layout(&doc, PageGeometry::default());
        assert_eq!(get_page_for_block(&layout, "f"), Some(2));
        assert_eq!(get_page_for_block(&layout, "missing"), None);
        assert_eq!(result.page_of("h"), Some(1));
    }

    #[test]
    fn custom_geometry_is_respected() {
        let doc = doc_of(vec![
            sized("h", BlockType::Header, 280.0),
            sized("f", BlockType::Footer, 150.0),
        ]);
        let result = paginate_by_groups(&doc, PageGeometry::new(500.0, 300.0));
        assert_eq!(result.page_count, 2);
        assert_eq!(result.pages[0].width, 500.0);
    }
}
