//! Page layout – the frozen output of pagination. Encodes exactly which
//! blocks sit on which page and at what offset, ready for the renderer or
//! for serialisation to an external rasteriser.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{BlockContent, BlockType, Emphasis};
use crate::model::{PAGE_HEIGHT, PAGE_WIDTH};

/// Where a block landed after pagination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub page_number: usize,
    /// Offset from the top of the page, not the document.
    pub page_y: f32,
    pub height: f32,
}

/// A block reference placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub page_number: usize,
    pub page_y: f32,
    pub height: f32,
}

/// One fixed-size page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub number: usize,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<PlacedBlock>,
    pub used_height: f32,
    pub available_height: f32,
    pub is_first: bool,
    pub is_last: bool,
    /// Set when content was forced past the page bottom.
    #[serde(default)]
    pub overflow: bool,
}

impl Page {
    pub fn new(number: usize, width: f32, height: f32) -> Self {
        Self {
            id: format!("page_{number}"),
            number,
            width,
            height,
            blocks: Vec::new(),
            used_height: 0.0,
            available_height: height,
            is_first: number == 1,
            is_last: false,
            overflow: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn fits(&self, height: f32) -> bool {
        height <= self.available_height
    }

    /// Append a block at the current fill line.
    pub fn push(&mut self, id: &str, block_type: BlockType, height: f32) {
        self.blocks.push(PlacedBlock {
            id: id.to_string(),
            block_type,
            page_number: self.number,
            page_y: self.used_height,
            height,
        });
        self.used_height += height;
        self.available_height = self.height - self.used_height;
        if self.used_height > self.height {
            self.overflow = true;
        }
    }

    /// Remove the most recently placed block.
    pub fn pop(&mut self) -> Option<PlacedBlock> {
        let removed = self.blocks.pop()?;
        self.used_height -= removed.height;
        self.available_height = self.height - self.used_height;
        self.overflow = self.used_height > self.height;
        Some(removed)
    }
}

/// Output of the paginator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResult {
    pub pages: Vec<Page>,
    pub page_count: usize,
    pub total_blocks: usize,
    pub group_count: usize,
    pub is_single_page: bool,
}

impl PaginationResult {
    pub fn overflow_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|p| p.overflow)
    }

    /// Page a block was placed on.
    pub fn page_of(&self, block_id: &str) -> Option<usize> {
        self.pages
            .iter()
            .find(|p| p.blocks.iter().any(|b| b.id == block_id))
            .map(|p| p.number)
    }
}

// ---------------------------------------------------------------------------
// Multi-page layout (serialisable view)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl Default for PageSize {
    fn default() -> Self {
        Self {
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockSpan {
    pub y: f32,
    pub height: f32,
}

/// A placed block with its content, for consumers that render from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedBlockView {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: BlockContent,
    pub position: BlockSpan,
    pub emphasis: Emphasis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub number: usize,
    pub is_first: bool,
    pub is_last: bool,
    pub dimensions: PageSize,
    pub used_height: f32,
    #[serde(default)]
    pub overflow: bool,
    pub blocks: Vec<PlacedBlockView>,
}

/// The complete paginated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiPageLayout {
    pub version: String,
    pub document_id: String,
    pub page_count: usize,
    pub is_single_page: bool,
    pub page_size: PageSize,
    pub pages: Vec<PageView>,
}

impl MultiPageLayout {
    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_tracks_fill_and_overflow() {
        let mut page = Page::new(1, 794.0, 100.0);
        page.push("a", BlockType::Section, 60.0);
        assert_eq!(page.available_height, 40.0);
        assert!(!page.fits(41.0));
        page.push("b", BlockType::Section, 60.0);
        assert!(page.overflow);
        assert_eq!(page.blocks[1].page_y, 60.0);

        let removed = page.pop().unwrap();
        assert_eq!(removed.id, "b");
        assert!(!page.overflow);
        assert_eq!(page.used_height, 60.0);
    }

    #[test]
    fn first_flag_derives_from_number() {
        assert!(Page::new(1, 1.0, 1.0).is_first);
        assert!(!Page::new(2, 1.0, 1.0).is_first);
    }

    #[test]
    fn multi_page_layout_json() {
        let layout = MultiPageLayout {
            version: "1.0".into(),
            document_id: "Acme".into(),
            page_count: 1,
            is_single_page: true,
            page_size: PageSize::default(),
            pages: Vec::new(),
        };
        let json = layout.to_json();
        assert!(json.contains("\"documentId\": \"Acme\""));
        assert_eq!(MultiPageLayout::from_json(&json).unwrap(), layout);
        assert!(MultiPageLayout::from_json("{").is_err());
    }
}
