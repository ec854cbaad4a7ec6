//! Design tokens – spacing, typography, colour, radius and container
//! presets shared by the layout calculator and the renderer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{BlockMetadata, BlockType};

// ---------------------------------------------------------------------------
// Spacing
// ---------------------------------------------------------------------------

/// Base unit for every spacing value.
pub const SPACING_UNIT: f32 = 4.0;

/// 4px-based spacing scale.
pub struct SpacingScale;

impl SpacingScale {
    pub const NONE: f32 = 0.0;
    pub const XXS: f32 = SPACING_UNIT;
    pub const XS: f32 = SPACING_UNIT * 2.0;
    pub const SM: f32 = SPACING_UNIT * 3.0;
    pub const MD: f32 = SPACING_UNIT * 4.0;
    pub const LG: f32 = SPACING_UNIT * 6.0;
    pub const XL: f32 = SPACING_UNIT * 8.0;
    pub const XXL: f32 = SPACING_UNIT * 10.0;
    pub const XXXL: f32 = SPACING_UNIT * 12.0;
    pub const SECTION: f32 = SPACING_UNIT * 16.0;
    pub const HERO: f32 = SPACING_UNIT * 20.0;
}

/// Named gap sizes for flex/grid containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gap {
    Tight,
    #[default]
    Normal,
    Relaxed,
    Loose,
}

impl Gap {
    pub fn px(&self) -> f32 {
        match self {
            Gap::Tight => SpacingScale::XS,
            Gap::Normal => SpacingScale::MD,
            Gap::Relaxed => SpacingScale::LG,
            Gap::Loose => SpacingScale::XL,
        }
    }
}

// ---------------------------------------------------------------------------
// Typography
// ---------------------------------------------------------------------------

pub const FONT_STACK: &str = "'Inter', system-ui, -apple-system, sans-serif";

/// A semantic text style level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypographyLevel {
    Hero,
    H1,
    H2,
    H3,
    H4,
    Body,
    BodyLarge,
    Caption,
    Label,
    Badge,
}

/// Concrete text metrics for a [`TypographyLevel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub font_weight: u16,
    pub line_height: f32,
    /// In em.
    pub letter_spacing: f32,
    pub color: &'static str,
    pub uppercase: bool,
}

impl TypographyLevel {
    pub fn style(&self) -> TextStyle {
        let (font_size, font_weight, line_height, letter_spacing, color, uppercase) = match self {
            TypographyLevel::Hero => (42.0, 700, 1.1, -0.02, "#ffffff", false),
            TypographyLevel::H1 => (32.0, 700, 1.2, -0.01, "#1a1a2e", false),
            TypographyLevel::H2 => (24.0, 600, 1.3, -0.005, "#1a1a2e", false),
            TypographyLevel::H3 => (20.0, 600, 1.4, 0.0, "#1a1a2e", false),
            TypographyLevel::H4 => (16.0, 600, 1.4, 0.0, "#1a1a2e", false),
            TypographyLevel::Body => (14.0, 400, 1.6, 0.0, "#4a4a6a", false),
            TypographyLevel::BodyLarge => (16.0, 400, 1.6, 0.0, "#4a4a6a", false),
            TypographyLevel::Caption => (12.0, 500, 1.4, 0.02, "#8a8aaa", true),
            TypographyLevel::Label => (11.0, 600, 1.3, 0.05, "#6a6a8a", true),
            TypographyLevel::Badge => (10.0, 700, 1.0, 0.1, "#ffffff", true),
        };
        TextStyle {
            font_size,
            font_weight,
            line_height,
            letter_spacing,
            color,
            uppercase,
        }
    }
}

/// Which typography level each named text role of a block uses.
pub type TypographyMap = BTreeMap<String, TypographyLevel>;

/// Role → level table per block type. Types without their own table use the
/// section table.
pub fn block_typography(block_type: BlockType) -> TypographyMap {
    use TypographyLevel::*;
    let roles: &[(&str, TypographyLevel)] = match block_type {
        BlockType::Header => &[("title", Hero), ("subtitle", BodyLarge), ("badge", Badge)],
        BlockType::Client => &[("label", Label), ("name", H2), ("company", Body)],
        BlockType::TwoColumn => &[("title", H3), ("body", Body)],
        BlockType::Grid => &[("title", H2), ("index", Caption), ("content", Body)],
        BlockType::Timeline => &[("title", H2), ("phase", Label), ("content", Body)],
        BlockType::Investment => &[("label", Label), ("amount", H1)],
        BlockType::Footer => &[("label", Label), ("contact", Body), ("brand", Caption)],
        BlockType::Section | BlockType::Divider | BlockType::Spacer => {
            &[("title", H2), ("body", Body)]
        }
    };
    roles
        .iter()
        .map(|(role, level)| (role.to_string(), *level))
        .collect()
}

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
    Baseline,
}

/// CSS alignment properties derived from a horizontal/vertical pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alignment {
    pub text_align: String,
    pub justify_content: String,
    pub align_items: String,
}

impl Alignment {
    pub fn new(horizontal: HorizontalAlign, vertical: VerticalAlign) -> Self {
        let (text_align, justify_content) = match horizontal {
            HorizontalAlign::Left => ("left", "flex-start"),
            HorizontalAlign::Center => ("center", "center"),
            HorizontalAlign::Right => ("right", "flex-end"),
            HorizontalAlign::Stretch => ("left", "stretch"),
        };
        let align_items = match vertical {
            VerticalAlign::Top => "flex-start",
            VerticalAlign::Middle => "center",
            VerticalAlign::Bottom => "flex-end",
            VerticalAlign::Baseline => "baseline",
        };
        Self {
            text_align: text_align.to_string(),
            justify_content: justify_content.to_string(),
            align_items: align_items.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Colour
// ---------------------------------------------------------------------------

/// Brand palette as CSS hex strings.
pub mod palette {
    pub const PRIMARY: &str = "#6366f1";
    pub const PRIMARY_DARK: &str = "#4f46e5";
    pub const PRIMARY_LIGHT: &str = "#818cf8";
    pub const ACCENT: &str = "#10b981";
    pub const ACCENT_DARK: &str = "#059669";
    pub const BACKGROUND: &str = "#ffffff";
    pub const BACKGROUND_ALT: &str = "#f8fafc";
    pub const BACKGROUND_DARK: &str = "#1a1a2e";
    pub const TEXT_PRIMARY: &str = "#1a1a2e";
    pub const TEXT_SECONDARY: &str = "#4a4a6a";
    pub const TEXT_MUTED: &str = "#8a8aaa";
    pub const TEXT_INVERSE: &str = "#ffffff";
    pub const BORDER: &str = "#e2e8f0";
    pub const BORDER_LIGHT: &str = "#f1f5f9";
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match hex.len() {
            6 => Some(Self {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
                a: 1.0,
            }),
            3 => Some(Self {
                r: channel(&hex[0..1].repeat(2))?,
                g: channel(&hex[1..2].repeat(2))?,
                b: channel(&hex[2..3].repeat(2))?,
                a: 1.0,
            }),
            _ => None,
        }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// `rgba(r, g, b, a)` with 0–255 channels.
    pub fn to_css(&self) -> String {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "rgba({}, {}, {}, {})",
            to_byte(self.r),
            to_byte(self.g),
            to_byte(self.b),
            self.a
        )
    }
}

// ---------------------------------------------------------------------------
// Shadows, radii, containers
// ---------------------------------------------------------------------------

pub mod shadow {
    pub const NONE: &str = "none";
    pub const SM: &str = "0 1px 2px rgba(0, 0, 0, 0.05)";
    pub const MD: &str = "0 4px 6px -1px rgba(0, 0, 0, 0.1)";
    pub const LG: &str = "0 10px 15px -3px rgba(0, 0, 0, 0.1)";
    pub const XL: &str = "0 20px 25px -5px rgba(0, 0, 0, 0.1)";
    pub const INNER: &str = "inset 0 2px 4px rgba(0, 0, 0, 0.05)";
}

pub struct BorderRadius;

impl BorderRadius {
    pub const NONE: f32 = 0.0;
    pub const SM: f32 = 4.0;
    pub const MD: f32 = 8.0;
    pub const LG: f32 = 12.0;
    pub const XL: f32 = 16.0;
    pub const FULL: f32 = 9999.0;
}

/// Visual container presets a block can be drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContainerKind {
    Card,
    Panel,
    Highlight,
    Hero,
    Section,
    SectionAlt,
}

/// Resolved container styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStyle {
    pub kind: ContainerKind,
    pub background: String,
    pub border_radius: f32,
    pub shadow: String,
    pub padding: f32,
}

impl ContainerKind {
    pub fn style(&self) -> ContainerStyle {
        let (background, border_radius, shadow, padding) = match self {
            ContainerKind::Card => (
                palette::BACKGROUND.to_string(),
                BorderRadius::LG,
                shadow::MD,
                SpacingScale::LG,
            ),
            ContainerKind::Panel => (
                palette::BACKGROUND_ALT.to_string(),
                BorderRadius::MD,
                shadow::NONE,
                SpacingScale::LG,
            ),
            ContainerKind::Highlight => (
                format!(
                    "linear-gradient(135deg, {} 0%, {} 100%)",
                    palette::PRIMARY,
                    palette::PRIMARY_DARK
                ),
                BorderRadius::LG,
                shadow::LG,
                SpacingScale::XL,
            ),
            ContainerKind::Hero => (
                format!(
                    "linear-gradient(135deg, {} 0%, #2d2d44 100%)",
                    palette::BACKGROUND_DARK
                ),
                BorderRadius::NONE,
                shadow::NONE,
                SpacingScale::HERO,
            ),
            ContainerKind::Section => (
                "transparent".to_string(),
                BorderRadius::NONE,
                shadow::NONE,
                SpacingScale::LG,
            ),
            ContainerKind::SectionAlt => (
                palette::BACKGROUND_ALT.to_string(),
                BorderRadius::NONE,
                shadow::NONE,
                SpacingScale::LG,
            ),
        };
        ContainerStyle {
            kind: *self,
            background,
            border_radius,
            shadow: shadow.to_string(),
            padding,
        }
    }
}

/// Container preset for a block, honouring the zebra-stripe flag on
/// sections and grids.
pub fn container_for(block_type: BlockType, metadata: &BlockMetadata) -> ContainerKind {
    match block_type {
        BlockType::Header => ContainerKind::Hero,
        BlockType::Client => ContainerKind::Panel,
        BlockType::Investment => ContainerKind::Highlight,
        BlockType::Section | BlockType::Grid if metadata.alternate_background => {
            ContainerKind::SectionAlt
        }
        BlockType::Section
        | BlockType::Grid
        | BlockType::TwoColumn
        | BlockType::Timeline
        | BlockType::Footer
        | BlockType::Divider
        | BlockType::Spacer => ContainerKind::Section,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_scale_is_unit_based() {
        assert_eq!(SpacingScale::LG, 24.0);
        assert_eq!(SpacingScale::SECTION, 64.0);
        assert_eq!(Gap::Relaxed.px(), 24.0);
    }

    #[test]
    fn color_from_hex() {
        let c = Color::from_hex("#ff8800").unwrap();
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.533).abs() < 0.01);
        assert!(Color::from_hex("#12345").is_none());
    }

    #[test]
    fn color_to_css_rgba() {
        let c = Color::from_hex(palette::PRIMARY).unwrap().with_alpha(0.15);
        assert_eq!(c.to_css(), "rgba(99, 102, 241, 0.15)");
    }

    #[test]
    fn alternate_background_switches_container() {
        let alt = BlockMetadata {
            alternate_background: true,
        };
        assert_eq!(
            container_for(BlockType::Grid, &alt),
            ContainerKind::SectionAlt
        );
        assert_eq!(
            container_for(BlockType::Timeline, &alt),
            ContainerKind::Section
        );
        assert_eq!(
            container_for(BlockType::Header, &BlockMetadata::default()),
            ContainerKind::Hero
        );
    }

    #[test]
    fn typography_falls_back_to_section_roles() {
        let roles = block_typography(BlockType::Divider);
        assert_eq!(roles.get("body"), Some(&TypographyLevel::Body));
        assert_eq!(TypographyLevel::Hero.style().font_size, 42.0);
    }
}
