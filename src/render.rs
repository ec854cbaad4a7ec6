//! HTML renderer – turns paginated blocks into markup fragments plus scoped
//! stylesheet fragments, and assembles them into one self-contained HTML
//! document for an external rasteriser.
//!
//! All user-supplied text passes through [`escape_html`] before it is
//! interpolated. Nothing else in the crate writes markup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compose::{BRAND_NAME, DEFAULT_CLIENT_NAME, DEFAULT_CONTACT, DEFAULT_TITLE};
use crate::fields::{non_empty, ProposalFields};
use crate::flow::block_height;
use crate::model::{Block, BlockContent, BlockType, DocumentModel};
use crate::page_layout::{PageSize, PaginationResult};
use crate::pipeline::{self, PipelineConfig};
use crate::style::{palette, shadow, BorderRadius, Color, ContainerKind, Gap, SpacingScale, FONT_STACK};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Markup and stylesheet emitted for one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub html: String,
    pub styles: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    pub number: usize,
    pub is_first: bool,
    pub is_last: bool,
    pub dimensions: PageSize,
    #[serde(default)]
    pub overflow: bool,
    pub blocks: Vec<RenderedBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderMeta {
    pub client_name: String,
    pub project_title: String,
    pub page_count: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedPageSize {
    pub width: f32,
    pub height: f32,
    pub format: String,
}

/// Render-ready output of the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    pub version: String,
    pub meta: RenderMeta,
    pub page_size: RenderedPageSize,
    pub pages: Vec<RenderedPage>,
    /// Global stylesheet shared by every page.
    pub styles: String,
}

// ---------------------------------------------------------------------------
// Pipeline entry points
// ---------------------------------------------------------------------------

/// Run every stage with default settings and render the result.
pub fn render_document(fields: &ProposalFields) -> RenderedDocument {
    render_document_with(fields, &PipelineConfig::default())
}

/// Run every stage with `config` and render the result.
pub fn render_document_with(fields: &ProposalFields, config: &PipelineConfig) -> RenderedDocument {
    let doc = pipeline::build_document(fields, config);
    let pagination = pipeline::paginate(&doc);
    let pages = render_pages(&doc, &pagination);

    RenderedDocument {
        version: "1.0".to_string(),
        meta: RenderMeta {
            client_name: non_empty(&fields.client_name)
                .unwrap_or(DEFAULT_CLIENT_NAME)
                .to_string(),
            project_title: config
                .title
                .as_deref()
                .or(non_empty(&fields.project_title))
                .unwrap_or("Proposal")
                .to_string(),
            page_count: pagination.page_count,
            generated_at: doc.created_at.unwrap_or_else(Utc::now),
        },
        page_size: RenderedPageSize {
            width: doc.layout.width,
            height: doc.layout.height,
            format: doc.layout.format.clone(),
        },
        styles: global_styles(doc.layout.width, doc.layout.height),
        pages,
    }
}

/// Render every paginated page of a flowed document.
pub fn render_pages(doc: &DocumentModel, pagination: &PaginationResult) -> Vec<RenderedPage> {
    pagination
        .pages
        .iter()
        .map(|page| RenderedPage {
            number: page.number,
            is_first: page.is_first,
            is_last: page.is_last,
            dimensions: PageSize {
                width: page.width,
                height: page.height,
            },
            overflow: page.overflow,
            blocks: page
                .blocks
                .iter()
                .filter_map(|placed| doc.block(&placed.id))
                .map(render_block)
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Block renderers
// ---------------------------------------------------------------------------

/// Dispatch to the renderer for the block's type.
pub fn render_block(block: &Block) -> RenderedBlock {
    let (html, styles) = match block.block_type {
        BlockType::Header => render_header(block),
        BlockType::Client => render_client(block),
        BlockType::TwoColumn => render_two_column(block),
        BlockType::Section => render_section(block),
        BlockType::Grid => render_grid(block),
        BlockType::Timeline => render_timeline(block),
        BlockType::Investment => render_investment(block),
        BlockType::Footer => render_footer(block),
        BlockType::Divider => render_divider(),
        BlockType::Spacer => render_spacer(block),
    };
    RenderedBlock {
        id: block.id.clone(),
        block_type: block.block_type,
        html,
        styles,
    }
}

fn or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|s| !s.is_empty()).unwrap_or(fallback)
}

fn alt_bg(block: &Block) -> &'static str {
    if block.metadata.alternate_background {
        " alt-bg"
    } else {
        ""
    }
}

fn render_header(block: &Block) -> (String, String) {
    let c = match &block.content {
        BlockContent::Header(h) => Some(h),
        _ => None,
    };
    let brand = or(c.map(|h| h.brand.as_str()), BRAND_NAME);
    let title = or(c.map(|h| h.title.as_str()), DEFAULT_TITLE);
    let subtitle = or(c.map(|h| h.subtitle.as_str()), "");
    let badge = or(c.map(|h| h.badge.as_str()), "PROPOSAL");
    let date = or(c.map(|h| h.date.as_str()), "");

    let html = format!(
        r#"<div class="block-header">
  <div class="header-overlay"></div>
  <div class="header-content">
    <div class="header-brand"><span class="brand-dot"></span><span class="brand-name">{brand}</span></div>
    <h1 class="header-title">{title}</h1>
    <p class="header-subtitle">{subtitle}</p>
    <div class="header-meta"><span class="header-badge">{badge}</span><span class="header-date">{date}</span></div>
  </div>
  <div class="header-shape"></div>
</div>"#,
        brand = escape_html(brand),
        title = escape_html(title),
        subtitle = escape_html(subtitle),
        badge = escape_html(badge),
        date = escape_html(date),
    );
    (html, header_styles())
}

fn render_client(block: &Block) -> (String, String) {
    let c = match &block.content {
        BlockContent::Client(c) => Some(c),
        _ => None,
    };
    let html = format!(
        r#"<div class="block-client">
  <div class="client-card">
    <span class="client-label">{}</span>
    <h3 class="client-name">{}</h3>
    <p class="client-company">{}</p>
  </div>
</div>"#,
        escape_html(or(c.map(|c| c.label.as_str()), "Prepared For")),
        escape_html(or(c.map(|c| c.name.as_str()), DEFAULT_CLIENT_NAME)),
        escape_html(or(c.map(|c| c.company.as_str()), "")),
    );
    (html, client_styles())
}

fn render_two_column(block: &Block) -> (String, String) {
    let columns = match &block.content {
        BlockContent::TwoColumn(tc) => tc.columns.as_slice(),
        _ => &[][..],
    };
    let cards: String = columns
        .iter()
        .map(|col| {
            format!(
                r#"
    <div class="column-card">
      <div class="column-header"><div class="column-icon"><span class="icon-dot"></span></div><h2 class="column-title">{}</h2></div>
      <p class="column-body">{}</p>
    </div>"#,
                escape_html(&col.title),
                escape_html(&col.body)
            )
        })
        .collect();
    let html = format!(
        r#"<div class="block-two-column">
  <div class="two-column-grid">{cards}
  </div>
</div>"#
    );
    (html, two_column_styles())
}

fn render_section(block: &Block) -> (String, String) {
    let (title, body) = match &block.content {
        BlockContent::Section(s) => (s.title.as_str(), s.body.as_str()),
        _ => ("", ""),
    };
    let html = format!(
        r#"<div class="block-section{}">
  <div class="section-header"><div class="section-anchor"></div><h2 class="section-title">{}</h2></div>
  <p class="section-body">{}</p>
</div>"#,
        alt_bg(block),
        escape_html(title),
        escape_html(body)
    );
    (html, section_styles())
}

fn render_grid(block: &Block) -> (String, String) {
    let (title, items) = match &block.content {
        BlockContent::Grid(g) => (g.title.as_str(), g.items.as_slice()),
        _ => ("", &[][..]),
    };
    let cells: String = items
        .iter()
        .map(|item| {
            let index = if item.display_index.is_empty() {
                format!("{:02}", item.index)
            } else {
                item.display_index.clone()
            };
            format!(
                r#"
    <div class="grid-item">
      <div class="grid-item-header"><span class="grid-dot"></span><span class="grid-index">{}</span></div>
      <p class="grid-content">{}</p>
    </div>"#,
                escape_html(&index),
                escape_html(&item.content)
            )
        })
        .collect();
    let html = format!(
        r#"<div class="block-grid{}">
  <div class="grid-header"><div class="grid-anchor"></div><h2 class="grid-title">{}</h2></div>
  <div class="grid-container">{cells}
  </div>
</div>"#,
        alt_bg(block),
        escape_html(title)
    );
    (html, grid_styles())
}

fn render_timeline(block: &Block) -> (String, String) {
    let (title, phases) = match &block.content {
        BlockContent::Timeline(t) => (t.title.as_str(), t.phases.as_slice()),
        _ => ("", &[][..]),
    };
    let items: String = phases
        .iter()
        .map(|phase| {
            format!(
                r#"
    <div class="timeline-item">
      <div class="timeline-marker"></div>
      <div class="timeline-content"><span class="timeline-phase">{}</span><p class="timeline-text">{}</p></div>
    </div>"#,
                escape_html(&phase.label),
                escape_html(&phase.content)
            )
        })
        .collect();
    let html = format!(
        r#"<div class="block-timeline">
  <div class="timeline-header"><div class="timeline-anchor"></div><h2 class="timeline-title">{}</h2></div>
  <div class="timeline-container">
    <div class="timeline-line"></div>{items}
  </div>
</div>"#,
        escape_html(or(Some(title), "Timeline"))
    );
    (html, timeline_styles())
}

fn render_investment(block: &Block) -> (String, String) {
    let c = match &block.content {
        BlockContent::Investment(i) => Some(i),
        _ => None,
    };
    let html = format!(
        r#"<div class="block-investment">
  <div class="investment-overlay"></div>
  <div class="investment-content">
    <span class="investment-label">{}</span>
    <p class="investment-amount">{}</p>
  </div>
</div>"#,
        escape_html(or(c.map(|i| i.label.as_str()), "Total Investment")),
        escape_html(or(c.map(|i| i.amount.as_str()), "")),
    );
    (html, investment_styles())
}

fn render_footer(block: &Block) -> (String, String) {
    let c = match &block.content {
        BlockContent::Footer(f) => Some(f),
        _ => None,
    };
    let label = or(c.map(|f| f.prepared_by.label.as_str()), "Prepared By");
    let contact = or(c.map(|f| f.prepared_by.contact.as_str()), DEFAULT_CONTACT);
    let signature = or(c.map(|f| f.signature.label.as_str()), "Authorized Signature");
    let mark = or(c.map(|f| f.branding.mark.as_str()), "p");
    let default_brand = format!("{BRAND_NAME} Premium Document");
    let brand = or(c.map(|f| f.branding.text.as_str()), &default_brand);

    let html = format!(
        r#"<div class="block-footer">
  <div class="footer-brand-strip"></div>
  <div class="footer-content">
    <div class="footer-left">
      <span class="footer-label">{}</span>
      <p class="footer-contact">{}</p>
    </div>
    <div class="footer-right">
      <div class="signature-box"><div class="signature-line"></div><span class="signature-label">{}</span></div>
    </div>
  </div>
  <div class="footer-bottom"><span class="footer-logo-mark">{}</span><span class="footer-brand-text">{}</span></div>
</div>"#,
        escape_html(label),
        escape_html(contact).replace('\n', "<br>"),
        escape_html(signature),
        escape_html(mark),
        escape_html(brand),
    );
    (html, footer_styles())
}

fn render_divider() -> (String, String) {
    (
        r#"<div class="block-divider"><hr class="divider-line"></div>"#.to_string(),
        format!(
            ".block-divider {{ padding: {md}px {xl}px; }}\n\
             .divider-line {{ border: none; border-top: 1px solid {border}; }}",
            md = SpacingScale::MD,
            xl = SpacingScale::XL,
            border = palette::BORDER,
        ),
    )
}

fn render_spacer(block: &Block) -> (String, String) {
    (
        format!(
            r#"<div class="block-spacer" style="height: {:.0}px"></div>"#,
            block_height(block)
        ),
        String::new(),
    )
}

// ---------------------------------------------------------------------------
// Stylesheets
// ---------------------------------------------------------------------------

/// A palette colour at reduced opacity.
fn tint(hex: &str, alpha: f32) -> String {
    Color::from_hex(hex)
        .map(|c| c.with_alpha(alpha).to_css())
        .unwrap_or_else(|| hex.to_string())
}

fn global_styles(page_width: f32, page_height: f32) -> String {
    format!(
        "* {{ box-sizing: border-box; margin: 0; padding: 0; }}\n\
         body {{ font-family: {FONT_STACK}; color: {text}; }}\n\
         .page {{ width: {page_width}px; min-height: {page_height}px; background: {bg}; position: relative; page-break-after: always; }}\n\
         .page:last-child {{ page-break-after: auto; }}",
        text = palette::TEXT_PRIMARY,
        bg = palette::BACKGROUND,
    )
}

fn header_styles() -> String {
    format!(
        ".block-header {{ position: relative; min-height: 280px; background: {hero}; overflow: hidden; display: flex; align-items: center; justify-content: center; }}\n\
         .header-overlay {{ position: absolute; inset: 0; background: radial-gradient(circle at 30% 50%, {glow}, transparent 50%); }}\n\
         .header-content {{ position: relative; z-index: 2; text-align: center; padding: {xl}px; }}\n\
         .header-brand {{ display: flex; align-items: center; justify-content: center; gap: 8px; margin-bottom: {lg}px; }}\n\
         .brand-dot {{ width: 8px; height: 8px; background: {primary}; border-radius: 50%; }}\n\
         .brand-name {{ font-size: 14px; font-weight: 600; color: rgba(255,255,255,0.7); letter-spacing: 0.05em; }}\n\
         .header-title {{ font-size: 42px; font-weight: 700; color: #fff; line-height: 1.1; margin-bottom: 12px; }}\n\
         .header-subtitle {{ font-size: 16px; color: rgba(255,255,255,0.7); margin-bottom: {lg}px; }}\n\
         .header-meta {{ display: flex; align-items: center; justify-content: center; gap: 16px; }}\n\
         .header-badge {{ font-size: 10px; font-weight: 700; color: #fff; background: {primary}; padding: 4px 12px; border-radius: 4px; letter-spacing: 0.1em; }}\n\
         .header-date {{ font-size: 13px; color: rgba(255,255,255,0.6); }}\n\
         .header-shape {{ position: absolute; bottom: -50%; right: -10%; width: 60%; height: 200%; background: {shape}; border-radius: 50%; }}",
        hero = ContainerKind::Hero.style().background,
        glow = tint(palette::PRIMARY, 0.15),
        shape = tint(palette::PRIMARY, 0.08),
        primary = palette::PRIMARY,
        xl = SpacingScale::XL,
        lg = SpacingScale::LG,
    )
}

fn client_styles() -> String {
    format!(
        ".block-client {{ background: {alt}; padding: {lg}px {xl}px; }}\n\
         .client-label {{ font-size: 11px; font-weight: 600; color: {muted}; text-transform: uppercase; letter-spacing: 0.05em; }}\n\
         .client-name {{ font-size: 24px; font-weight: 600; color: {text}; margin-top: 8px; }}\n\
         .client-company {{ font-size: 14px; color: {secondary}; margin-top: 4px; }}",
        alt = palette::BACKGROUND_ALT,
        muted = palette::TEXT_MUTED,
        text = palette::TEXT_PRIMARY,
        secondary = palette::TEXT_SECONDARY,
        lg = SpacingScale::LG,
        xl = SpacingScale::XL,
    )
}

fn two_column_styles() -> String {
    format!(
        ".block-two-column {{ padding: {lg}px {xl}px; }}\n\
         .two-column-grid {{ display: grid; grid-template-columns: 1fr 1fr; gap: {gap}px; }}\n\
         .column-card {{ background: {bg}; border: 1px solid {border}; border-radius: {radius}px; padding: {lg}px; box-shadow: {shadow}; }}\n\
         .column-header {{ display: flex; align-items: center; gap: 12px; margin-bottom: 12px; }}\n\
         .column-icon {{ width: 32px; height: 32px; background: {alt}; border-radius: 8px; display: flex; align-items: center; justify-content: center; }}\n\
         .icon-dot {{ width: 8px; height: 8px; background: {primary}; border-radius: 50%; }}\n\
         .column-title {{ font-size: 18px; font-weight: 600; color: {text}; }}\n\
         .column-body {{ font-size: 14px; line-height: 1.6; color: {secondary}; }}",
        gap = Gap::Relaxed.px(),
        bg = palette::BACKGROUND,
        alt = palette::BACKGROUND_ALT,
        border = palette::BORDER,
        primary = palette::PRIMARY,
        text = palette::TEXT_PRIMARY,
        secondary = palette::TEXT_SECONDARY,
        radius = BorderRadius::LG,
        shadow = shadow::SM,
        lg = SpacingScale::LG,
        xl = SpacingScale::XL,
    )
}

/// Shared title row used by section, grid and timeline blocks.
fn anchored_title_styles(prefix: &str, margin_bottom: u32) -> String {
    format!(
        ".{prefix}-header {{ display: flex; align-items: center; gap: 12px; margin-bottom: {margin_bottom}px; }}\n\
         .{prefix}-anchor {{ width: 4px; height: 24px; background: {primary}; border-radius: 2px; }}\n\
         .{prefix}-title {{ font-size: 20px; font-weight: 600; color: {text}; }}",
        primary = palette::PRIMARY,
        text = palette::TEXT_PRIMARY,
    )
}

fn section_styles() -> String {
    format!(
        ".block-section {{ padding: {xl}px; }}\n\
         .block-section.alt-bg {{ background: {alt}; }}\n\
         {title}\n\
         .section-body {{ font-size: 14px; line-height: 1.6; color: {secondary}; }}",
        xl = SpacingScale::XL,
        alt = palette::BACKGROUND_ALT,
        title = anchored_title_styles("section", 16),
        secondary = palette::TEXT_SECONDARY,
    )
}

fn grid_styles() -> String {
    format!(
        ".block-grid {{ padding: {xl}px; }}\n\
         .block-grid.alt-bg {{ background: {alt}; }}\n\
         {title}\n\
         .grid-container {{ display: grid; grid-template-columns: 1fr 1fr; gap: {gap}px; }}\n\
         .grid-item {{ background: {bg}; border: 1px solid {border}; border-radius: {radius}px; padding: 16px; }}\n\
         .grid-item-header {{ display: flex; align-items: center; gap: 8px; margin-bottom: 8px; }}\n\
         .grid-dot {{ width: 6px; height: 6px; background: {primary}; border-radius: 50%; }}\n\
         .grid-index {{ font-size: 12px; font-weight: 600; color: {muted}; }}\n\
         .grid-content {{ font-size: 14px; line-height: 1.5; color: {secondary}; }}",
        xl = SpacingScale::XL,
        alt = palette::BACKGROUND_ALT,
        title = anchored_title_styles("grid", 20),
        gap = Gap::Normal.px(),
        bg = palette::BACKGROUND,
        border = palette::BORDER,
        radius = BorderRadius::MD,
        primary = palette::PRIMARY,
        muted = palette::TEXT_MUTED,
        secondary = palette::TEXT_SECONDARY,
    )
}

fn timeline_styles() -> String {
    format!(
        ".block-timeline {{ padding: {xl}px; }}\n\
         {title}\n\
         .timeline-container {{ position: relative; padding-left: 24px; }}\n\
         .timeline-line {{ position: absolute; left: 5px; top: 8px; bottom: 8px; width: 2px; background: {border}; }}\n\
         .timeline-item {{ position: relative; padding-bottom: 16px; }}\n\
         .timeline-item:last-child {{ padding-bottom: 0; }}\n\
         .timeline-marker {{ position: absolute; left: -24px; top: 4px; width: 12px; height: 12px; background: {primary}; border-radius: 50%; border: 2px solid {bg}; }}\n\
         .timeline-phase {{ font-size: 11px; font-weight: 600; color: {primary}; text-transform: uppercase; letter-spacing: 0.05em; }}\n\
         .timeline-text {{ font-size: 14px; line-height: 1.5; color: {secondary}; margin-top: 4px; }}",
        xl = SpacingScale::XL,
        title = anchored_title_styles("timeline", 20),
        border = palette::BORDER,
        primary = palette::PRIMARY,
        bg = palette::BACKGROUND,
        secondary = palette::TEXT_SECONDARY,
    )
}

fn investment_styles() -> String {
    format!(
        ".block-investment {{ position: relative; min-height: 120px; background: {highlight}; display: flex; align-items: center; justify-content: center; margin: {lg}px {xl}px; border-radius: {radius}px; box-shadow: {shadow}; overflow: hidden; }}\n\
         .investment-overlay {{ position: absolute; inset: 0; background: radial-gradient(circle at 70% 50%, {sheen}, transparent 50%); }}\n\
         .investment-content {{ position: relative; z-index: 2; text-align: center; padding: {xl}px; }}\n\
         .investment-label {{ font-size: 11px; font-weight: 600; color: rgba(255,255,255,0.8); text-transform: uppercase; letter-spacing: 0.1em; }}\n\
         .investment-amount {{ font-size: 32px; font-weight: 700; color: #fff; margin-top: 8px; }}",
        highlight = ContainerKind::Highlight.style().background,
        shadow = shadow::LG,
        sheen = Color::WHITE.with_alpha(0.1).to_css(),
        radius = BorderRadius::LG,
        lg = SpacingScale::LG,
        xl = SpacingScale::XL,
    )
}

fn footer_styles() -> String {
    format!(
        ".block-footer {{ padding: 0 32px 24px 32px; margin-top: 16px; border-top: 1px solid {border}; }}\n\
         .footer-brand-strip {{ height: 3px; background: linear-gradient(90deg, {primary}, {accent}); margin: 0 -32px 24px; }}\n\
         .footer-content {{ display: flex; justify-content: space-between; align-items: flex-end; margin-bottom: 20px; }}\n\
         .footer-label {{ font-size: 10px; font-weight: 700; color: {muted}; text-transform: uppercase; letter-spacing: 0.1em; display: block; margin-bottom: 6px; }}\n\
         .footer-contact {{ font-size: 13px; line-height: 1.5; color: {text}; font-weight: 500; }}\n\
         .signature-box {{ width: 180px; }}\n\
         .signature-line {{ height: 1px; background: {border}; margin-bottom: 8px; }}\n\
         .signature-label {{ font-size: 10px; font-weight: 600; color: {muted}; text-transform: uppercase; letter-spacing: 0.05em; display: block; }}\n\
         .footer-bottom {{ display: flex; align-items: center; justify-content: center; gap: 8px; padding-top: 16px; border-top: 1px solid {border_light}; }}\n\
         .footer-logo-mark {{ width: 18px; height: 18px; background: {dark}; color: #fff; font-size: 10px; font-weight: 700; display: flex; align-items: center; justify-content: center; border-radius: 4px; }}\n\
         .footer-brand-text {{ font-size: 11px; font-weight: 500; color: {muted}; letter-spacing: 0.02em; }}",
        border = palette::BORDER,
        border_light = palette::BORDER_LIGHT,
        primary = palette::PRIMARY,
        accent = palette::ACCENT,
        muted = palette::TEXT_MUTED,
        text = palette::TEXT_PRIMARY,
        dark = palette::BACKGROUND_DARK,
    )
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Escape `& < > " '` for safe interpolation into markup and attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Global stylesheet followed by every block stylesheet, deduplicated in
/// first-seen order.
pub fn combine_styles(doc: &RenderedDocument) -> String {
    let mut seen: Vec<&str> = Vec::new();
    let fragments = std::iter::once(doc.styles.as_str()).chain(
        doc.pages
            .iter()
            .flat_map(|p| p.blocks.iter().map(|b| b.styles.as_str())),
    );
    for fragment in fragments {
        if !fragment.is_empty() && !seen.contains(&fragment) {
            seen.push(fragment);
        }
    }
    seen.join("\n")
}

/// One complete HTML document: doctype, head with inline stylesheet, and one
/// page container per page.
pub fn generate_html_document(doc: &RenderedDocument) -> String {
    let styles = combine_styles(doc);
    let pages = doc
        .pages
        .iter()
        .map(|page| {
            let blocks = page
                .blocks
                .iter()
                .map(|b| b.html.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                r#"<div class="page" data-page="{}">{}</div>"#,
                page.number, blocks
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{styles}</style>
</head>
<body>
{pages}
</body>
</html>"#,
        title = escape_html(&doc.meta.project_title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::Composer;

    #[test]
    fn escapes_all_five_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
    }

    #[test]
    fn investment_markup_carries_amount() {
        let doc = Composer::new().compose(&ProposalFields {
            pricing: Some("$10,000".into()),
            ..Default::default()
        });
        let block = doc.blocks_of_type(BlockType::Investment).next().unwrap();
        let rendered = render_block(block);
        assert!(rendered.html.contains("$10,000"));
        assert!(rendered.html.contains("Total Investment"));
        assert!(rendered.styles.contains(".block-investment"));
    }

    #[test]
    fn footer_contact_keeps_line_breaks() {
        let doc = Composer::new().compose(&ProposalFields {
            contact_info: Some("Ada <ada@x.io>\nAcme".into()),
            ..Default::default()
        });
        let footer = doc.blocks_of_type(BlockType::Footer).next().unwrap();
        let html = render_block(footer).html;
        assert!(html.contains("Ada &lt;ada@x.io&gt;<br>Acme"));
    }

    #[test]
    fn footer_uses_branding_payload() {
        let doc = Composer::new().compose(&ProposalFields::default());
        let mut footer = doc.blocks_of_type(BlockType::Footer).next().unwrap().clone();
        let html = render_block(&footer).html;
        assert!(html.contains(r#"<span class="footer-logo-mark">p</span>"#));
        assert!(html.contains("pitchPDF Premium Document"));

        if let BlockContent::Footer(f) = &mut footer.content {
            f.branding.mark = "A&B".into();
            f.branding.text = "Acme <Studio>".into();
        }
        let html = render_block(&footer).html;
        assert!(html.contains(r#"<span class="footer-logo-mark">A&amp;B</span>"#));
        assert!(html.contains("Acme &lt;Studio&gt;"));
        assert!(!html.contains("Premium Document"));

        let bare = Block::new("f", BlockType::Footer, BlockContent::Empty);
        assert!(render_block(&bare).html.contains("pitchPDF Premium Document"));
    }

    #[test]
    fn empty_payload_falls_back_to_defaults() {
        let header = Block::new("h", BlockType::Header, BlockContent::Empty);
        assert!(render_block(&header).html.contains("Project Proposal"));
        let spacer = Block::new("s", BlockType::Spacer, BlockContent::Empty);
        let rendered = render_block(&spacer);
        assert!(rendered.html.contains("block-spacer"));
        assert!(rendered.styles.is_empty());
    }

    #[test]
    fn styles_are_deduplicated_in_order() {
        let rendered = render_document(&ProposalFields {
            terms: Some("a".into()),
            ..Default::default()
        });
        let combined = combine_styles(&rendered);
        assert!(combined.starts_with("* {"));
        assert_eq!(combined.matches(".block-header {").count(), 1);
    }

    #[test]
    fn html_document_wraps_pages() {
        let rendered = render_document(&ProposalFields {
            project_title: Some("Q3 <Plan>".into()),
            ..Default::default()
        });
        let html = generate_html_document(&rendered);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Q3 &lt;Plan&gt;</title>"));
        assert!(html.contains(r#"<div class="page" data-page="1">"#));
        assert_eq!(rendered.meta.page_count, 1);
    }
}
