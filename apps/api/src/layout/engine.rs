//! Contract layout engine: turns a rendered contract into absolutely positioned pages.
//!
//! # Page flow
//! 1. Cover page (always page 1): accent band, company, title, metadata, contact line.
//! 2. Body pages: markup lines classified by `markup::classify_line`, wrapped
//!    greedily, flowed down the page. `ensure_space` runs before every vertical
//!    step and breaks the page when the step would cross `LayoutConfig::bottom_limit`.
//! 3. Signature block: its full height is reserved up front so both columns
//!    always land on the same page at the same rows.
//!
//! Every page gets exactly one footer, drawn when the page is closed.
//!
//! The engine is pure and synchronous. A `LayoutSession` is built per call and
//! owns all cursor/page state; nothing is shared between calls.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CompanyProfile;
use crate::layout::font_metrics::{get_metrics, FontFace};
use crate::layout::markup::{parse_blocks, Block};
use crate::layout::page::{Color, DrawOp, LaidOutDocument, LayoutConfig, Page, Point};
use crate::layout::wrap::wrap_text;

// ────────────────────────────────────────────────────────────────────────────
// Input
// ────────────────────────────────────────────────────────────────────────────

/// Fully substituted contract, ready for layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub title: String,
    pub body: String,
    pub client_name: String,
    pub client_email: Option<String>,
    pub project_title: String,
    pub contract_date: String,
    pub signer_name: Option<String>,
    pub signer_email: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Fixed decoration sizes
// ────────────────────────────────────────────────────────────────────────────

/// Baseline offset below the top of a line box, as a fraction of font size.
const ASCENT: f32 = 0.8;

const COVER_BAND_HEIGHT: f32 = 140.0;
const COVER_TITLE_SIZE: f32 = 30.0;
const COVER_TITLE_SIZE_LONG: f32 = 22.0;
/// Titles with more words than this get the smaller cover size.
const COVER_TITLE_MAX_WORDS: usize = 4;
const COVER_TITLE_MAX_LINES: usize = 3;
const COVER_VALUE_MAX_LINES: usize = 2;

const HEADER_SIZE: f32 = 8.0;
const FOOTER_SIZE: f32 = 8.0;
const NOTICE_SIZE: f32 = 7.0;
const CONFIDENTIALITY_NOTICE: &str =
    "Confidential. This document is intended solely for the parties named herein.";

const SECTION_PADDING: f32 = 5.0;
const RULE_SPACE: f32 = 6.0;
const BULLET_GLYPH: &str = "•";

/// Lead gap + heading + instruction + five column rows.
const SIGNATURE_BLOCK_HEIGHT: f32 = 190.0;
const SIGNATURE_GUTTER: f32 = 30.0;
pub const PROVIDER_LABEL: &str = "SERVICE PROVIDER";
pub const CLIENT_LABEL: &str = "CLIENT";
const SIGNATURE_INSTRUCTION: &str =
    "By signing below, the parties agree to the terms and conditions set out in this agreement.";

// ────────────────────────────────────────────────────────────────────────────
// Public entry point
// ────────────────────────────────────────────────────────────────────────────

/// Lays out a rendered contract: cover page, body pages, signature block.
///
/// Never fails. An empty body yields the cover plus one body page holding only
/// the signature block.
pub fn layout_document(
    doc: &RenderedDocument,
    company: &CompanyProfile,
    config: &LayoutConfig,
) -> LaidOutDocument {
    let mut session = LayoutSession::new(doc, company, config);
    session.cover_page();
    session.break_page();
    for block in parse_blocks(&doc.body) {
        session.block(block);
    }
    session.signature_block();
    let laid_out = session.finish();

    debug!(
        pages = laid_out.pages.len(),
        title = %doc.title,
        "Contract layout complete"
    );
    laid_out
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

struct LayoutSession<'a> {
    config: &'a LayoutConfig,
    doc: &'a RenderedDocument,
    company: &'a CompanyProfile,
    pages: Vec<Page>,
    page: Page,
    /// Top of the next line box.
    y: f32,
}

impl<'a> LayoutSession<'a> {
    fn new(doc: &'a RenderedDocument, company: &'a CompanyProfile, config: &'a LayoutConfig) -> Self {
        Self {
            config,
            doc,
            company,
            pages: Vec::new(),
            page: Page::new(0),
            y: config.page_height - config.margin,
        }
    }

    // ── primitives ──────────────────────────────────────────────────────────

    fn text(&mut self, x: f32, baseline: f32, content: String, font: FontFace, size: f32, color: Color) {
        if content.is_empty() {
            return;
        }
        self.page.ops.push(DrawOp::Text {
            x,
            y: baseline,
            content,
            font,
            size,
            color,
        });
    }

    fn rule(&mut self, x1: f32, x2: f32, y: f32, thickness: f32, color: Color) {
        self.page.ops.push(DrawOp::Line {
            from: Point::new(x1, y),
            to: Point::new(x2, y),
            thickness,
            color,
        });
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.page.ops.push(DrawOp::Rect { x, y, w, h, color });
    }

    fn at_page_top(&self) -> bool {
        self.y >= self.config.content_top()
    }

    /// Breaks to a new page if `height` more points would cross the bottom limit.
    /// Returns true when a break happened.
    fn ensure_space(&mut self, height: f32) -> bool {
        if self.y - height < self.config.bottom_limit() {
            self.break_page();
            true
        } else {
            false
        }
    }

    /// Closes the current page (footer) and opens the next body page (header).
    fn break_page(&mut self) {
        self.draw_footer();
        let next = Page::new(self.page.index + 1);
        self.pages.push(std::mem::replace(&mut self.page, next));
        self.draw_header();
        self.y = self.config.content_top();
    }

    /// Vertical whitespace; swallowed at the top of a page.
    fn gap(&mut self, height: f32) {
        if self.at_page_top() {
            return;
        }
        if !self.ensure_space(height) {
            self.y -= height;
        }
    }

    /// Wraps `content` at `indent` and flows it line by line, breaking pages as
    /// needed. If `marker` is set it is drawn beside the first line.
    fn flow(
        &mut self,
        content: &str,
        font: FontFace,
        size: f32,
        color: Color,
        indent: f32,
        marker: Option<(&str, f32)>,
    ) {
        let metrics = get_metrics(font);
        let x = self.config.margin + indent;
        let available = self.config.content_width() - indent;
        let line_height = size + self.config.line_gap;

        for (i, line) in wrap_text(content, metrics, size, available)
            .into_iter()
            .enumerate()
        {
            self.ensure_space(line_height);
            let baseline = self.y - size * ASCENT;
            if i == 0 {
                if let Some((glyph, glyph_indent)) = marker {
                    self.text(
                        self.config.margin + glyph_indent,
                        baseline,
                        glyph.to_string(),
                        font,
                        size,
                        color,
                    );
                }
            }
            self.text(x, baseline, line, font, size, color);
            self.y -= line_height;
        }
    }

    // ── body blocks ─────────────────────────────────────────────────────────

    fn block(&mut self, block: Block<'_>) {
        match block {
            Block::Gap => self.gap(self.config.paragraph_gap),
            Block::Section(title) => self.section(title),
            Block::Subsection(title) => self.subsection(title),
            Block::Bullet(item) => self.flow(
                item,
                FontFace::Helvetica,
                self.config.body_size,
                Color::INK,
                self.config.bullet_text_indent,
                Some((BULLET_GLYPH, self.config.bullet_indent)),
            ),
            Block::Paragraph(text) => {
                self.flow(text, FontFace::Helvetica, self.config.body_size, Color::INK, 0.0, None)
            }
        }
    }

    /// Heading on a light band. Each wrapped line gets its own band slice so a
    /// heading of any length can still split across pages.
    fn section(&mut self, title: &str) {
        let size = self.config.section_size;
        let font = FontFace::HelveticaBold;
        let band_height = size + 2.0 * SECTION_PADDING;
        let available = self.config.content_width() - 2.0 * SECTION_PADDING;
        let lines = wrap_text(title, get_metrics(font), size, available);
        if lines.is_empty() {
            return;
        }

        self.gap(self.config.paragraph_gap);
        // Keep the heading with the first body line that follows it.
        let body_line = self.config.body_size + self.config.line_gap;
        self.ensure_space(band_height + body_line);

        for line in lines {
            self.ensure_space(band_height);
            let top = self.y;
            self.rect(
                self.config.margin,
                top - band_height,
                self.config.content_width(),
                band_height,
                Color::BAND,
            );
            self.text(
                self.config.margin + SECTION_PADDING,
                top - SECTION_PADDING - size * ASCENT,
                line,
                font,
                size,
                Color::ACCENT,
            );
            self.y -= band_height;
        }
        self.gap(self.config.line_gap);
    }

    /// Bold subheading followed by a thin divider rule.
    fn subsection(&mut self, title: &str) {
        if title.is_empty() {
            return;
        }
        self.gap(self.config.paragraph_gap / 2.0);
        let size = self.config.subsection_size;
        self.ensure_space(size + self.config.line_gap + RULE_SPACE);
        self.flow(title, FontFace::HelveticaBold, size, Color::INK, 0.0, None);

        self.ensure_space(RULE_SPACE);
        let rule_y = self.y - RULE_SPACE / 2.0;
        self.rule(
            self.config.margin,
            self.config.margin + self.config.content_width(),
            rule_y,
            0.5,
            Color::RULE,
        );
        self.y -= RULE_SPACE;
    }

    // ── cover page ──────────────────────────────────────────────────────────

    fn cover_page(&mut self) {
        let cfg = self.config;
        let width = cfg.content_width();
        let bold = get_metrics(FontFace::HelveticaBold);
        let regular = get_metrics(FontFace::Helvetica);

        self.rect(
            0.0,
            cfg.page_height - COVER_BAND_HEIGHT,
            cfg.page_width,
            COVER_BAND_HEIGHT,
            Color::ACCENT,
        );
        let company_name = bold.truncate_to_width(&self.company.name, 16.0, width);
        self.text(
            cfg.margin,
            cfg.page_height - 70.0,
            company_name,
            FontFace::HelveticaBold,
            16.0,
            Color::WHITE,
        );

        // Title
        let title_size = if self.doc.title.split_whitespace().count() > COVER_TITLE_MAX_WORDS {
            COVER_TITLE_SIZE_LONG
        } else {
            COVER_TITLE_SIZE
        };
        self.y = cfg.page_height - COVER_BAND_HEIGHT - 60.0;
        let title_lines = clamp_lines(
            wrap_text(&self.doc.title, bold, title_size, width),
            COVER_TITLE_MAX_LINES,
            FontFace::HelveticaBold,
            title_size,
            width,
        );
        for line in title_lines {
            let baseline = self.y - title_size * ASCENT;
            self.text(cfg.margin, baseline, line, FontFace::HelveticaBold, title_size, Color::INK);
            self.y -= title_size + 6.0;
        }

        self.y -= 10.0;
        self.rule(cfg.margin, cfg.margin + 80.0, self.y, 3.0, Color::ACCENT);
        self.y -= 30.0;

        // Metadata block
        let mut meta = vec![
            ("Prepared for", self.doc.client_name.clone()),
            ("Prepared by", self.company.name.clone()),
            ("Date", self.doc.contract_date.clone()),
        ];
        if !self.doc.project_title.trim().is_empty() {
            meta.push(("Project", self.doc.project_title.clone()));
        }
        for (label, value) in meta {
            let label = label.to_uppercase();
            self.text(
                cfg.margin,
                self.y - 8.0 * ASCENT,
                label,
                FontFace::HelveticaBold,
                8.0,
                Color::MUTED,
            );
            self.y -= 12.0;
            let lines = clamp_lines(
                wrap_text(&value, regular, 12.0, width),
                COVER_VALUE_MAX_LINES,
                FontFace::Helvetica,
                12.0,
                width,
            );
            for line in lines {
                self.text(cfg.margin, self.y - 12.0 * ASCENT, line, FontFace::Helvetica, 12.0, Color::INK);
                self.y -= 16.0;
            }
            self.y -= 10.0;
        }

        // Contact line, pinned just above the footer.
        let contact = [&self.company.address, &self.company.email, &self.company.website]
            .into_iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" · ");
        let contact_y = cfg.bottom_limit() + 12.0;
        self.rule(cfg.margin, cfg.margin + width, contact_y + 14.0, 0.5, Color::RULE);
        let contact = regular.truncate_to_width(&contact, 9.0, width);
        self.text(cfg.margin, contact_y, contact, FontFace::Helvetica, 9.0, Color::MUTED);
    }

    // ── recurring decoration ────────────────────────────────────────────────

    fn draw_header(&mut self) {
        let cfg = self.config;
        let half = cfg.content_width() / 2.0 - 10.0;
        let bold = get_metrics(FontFace::HelveticaBold);
        let regular = get_metrics(FontFace::Helvetica);
        let baseline = cfg.page_height - cfg.margin - HEADER_SIZE;

        let company = bold.truncate_to_width(&self.company.name, HEADER_SIZE, half);
        self.text(cfg.margin, baseline, company, FontFace::HelveticaBold, HEADER_SIZE, Color::ACCENT);

        let title = regular.truncate_to_width(&self.doc.title, HEADER_SIZE, half);
        let title_x = cfg.margin + cfg.content_width() - regular.text_width(&title, HEADER_SIZE);
        self.text(title_x, baseline, title, FontFace::Helvetica, HEADER_SIZE, Color::MUTED);

        self.rule(
            cfg.margin,
            cfg.margin + cfg.content_width(),
            baseline - 6.0,
            0.5,
            Color::RULE,
        );
    }

    /// Author line, page number and confidentiality notice.
    fn draw_footer(&mut self) {
        let cfg = self.config;
        let width = cfg.content_width();
        let regular = get_metrics(FontFace::Helvetica);

        self.rule(cfg.margin, cfg.margin + width, cfg.margin + 22.0, 0.5, Color::RULE);

        let page_label = format!("Page {}", self.page.index + 1);
        let page_width = regular.text_width(&page_label, FOOTER_SIZE);
        let author = regular.truncate_to_width(
            &format!("Prepared by {}", self.company.name),
            FOOTER_SIZE,
            width - page_width - 20.0,
        );
        self.text(cfg.margin, cfg.margin + 10.0, author, FontFace::Helvetica, FOOTER_SIZE, Color::MUTED);
        self.text(
            cfg.margin + width - page_width,
            cfg.margin + 10.0,
            page_label,
            FontFace::Helvetica,
            FOOTER_SIZE,
            Color::MUTED,
        );

        let notice = regular.truncate_to_width(CONFIDENTIALITY_NOTICE, NOTICE_SIZE, width);
        let notice_x = cfg.margin + (width - regular.text_width(&notice, NOTICE_SIZE)) / 2.0;
        self.text(notice_x, cfg.margin, notice, FontFace::Helvetica, NOTICE_SIZE, Color::MUTED);
    }

    // ── signature block ─────────────────────────────────────────────────────

    fn signature_block(&mut self) {
        self.ensure_space(SIGNATURE_BLOCK_HEIGHT);
        if !self.at_page_top() {
            self.y -= 2.0 * self.config.paragraph_gap;
        }

        let cfg = self.config;
        let regular = get_metrics(FontFace::Helvetica);

        self.text(
            cfg.margin,
            self.y - cfg.section_size * ASCENT,
            "SIGNATURES".to_string(),
            FontFace::HelveticaBold,
            cfg.section_size,
            Color::ACCENT,
        );
        self.y -= cfg.section_size + 6.0;

        let instruction = regular.truncate_to_width(SIGNATURE_INSTRUCTION, 9.0, cfg.content_width());
        self.text(cfg.margin, self.y - 9.0 * ASCENT, instruction, FontFace::Helvetica, 9.0, Color::MUTED);
        self.y -= 9.0 + 14.0;

        let provider_contact = non_empty_or_na(Some(self.company.email.as_str()));
        let client_name = self
            .doc
            .signer_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(self.doc.client_name.as_str())
            .to_string();
        let client_contact = non_empty_or_na(
            self.doc
                .signer_email
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .or(self.doc.client_email.as_deref()),
        );
        let provider_name = self.company.name.clone();

        self.signature_row([PROVIDER_LABEL, CLIENT_LABEL], FontFace::HelveticaBold, 8.0, Color::ACCENT, 14.0);
        self.signature_row(
            [provider_name.as_str(), client_name.as_str()],
            FontFace::HelveticaBold,
            11.0,
            Color::INK,
            15.0,
        );
        self.signature_row(
            [provider_contact.as_str(), client_contact.as_str()],
            FontFace::Helvetica,
            9.0,
            Color::MUTED,
            37.0,
        );
        self.signature_line("Signature", 40.0);
        self.signature_line("Date", 18.0);
    }

    fn column_layout(&self) -> ([f32; 2], f32) {
        let col_width = (self.config.content_width() - SIGNATURE_GUTTER) / 2.0;
        let left = self.config.margin;
        ([left, left + col_width + SIGNATURE_GUTTER], col_width)
    }

    /// One text row across both columns, on a shared baseline.
    fn signature_row(&mut self, cells: [&str; 2], font: FontFace, size: f32, color: Color, advance: f32) {
        let (xs, col_width) = self.column_layout();
        let metrics = get_metrics(font);
        let baseline = self.y - size * ASCENT;
        for (x, cell) in xs.into_iter().zip(cells) {
            let content = metrics.truncate_to_width(cell, size, col_width);
            self.text(x, baseline, content, font, size, color);
        }
        self.y -= advance;
    }

    /// A rule in each column with a caption underneath.
    fn signature_line(&mut self, caption: &str, advance: f32) {
        let (xs, col_width) = self.column_layout();
        let rule_y = self.y;
        for x in xs {
            self.rule(x, x + col_width, rule_y, 0.75, Color::INK);
            self.text(x, rule_y - 10.0, caption.to_string(), FontFace::Helvetica, 8.0, Color::MUTED);
        }
        self.y -= advance;
    }

    fn finish(mut self) -> LaidOutDocument {
        self.draw_footer();
        self.pages.push(self.page);
        LaidOutDocument {
            width: self.config.page_width,
            height: self.config.page_height,
            margin: self.config.margin,
            pages: self.pages,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Keeps at most `max` lines; the last kept line absorbs the rest and is cut with "...".
fn clamp_lines(mut lines: Vec<String>, max: usize, font: FontFace, size: f32, width: f32) -> Vec<String> {
    if lines.len() <= max || max == 0 {
        return lines;
    }
    let rest = lines.split_off(max).join(" ");
    if let Some(last) = lines.last_mut() {
        let joined = format!("{last} {rest}");
        *last = get_metrics(font).truncate_to_width(&joined, size, width);
    }
    lines
}

fn non_empty_or_na(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "N/A".to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
