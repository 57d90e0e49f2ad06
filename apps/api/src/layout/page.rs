//! Page model handed to the document encoder, plus the fixed page geometry.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner of the
//! page, so the layout cursor moves *down* by subtracting from `y`.

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::FontFace;

// ────────────────────────────────────────────────────────────────────────────
// Primitives
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const INK: Color = Color::rgb(0x1f, 0x29, 0x37);
    pub const MUTED: Color = Color::rgb(0x6b, 0x72, 0x80);
    pub const ACCENT: Color = Color::rgb(0x1e, 0x40, 0xaf);
    pub const BAND: Color = Color::rgb(0xee, 0xf2, 0xff);
    pub const RULE: Color = Color::rgb(0xd1, 0xd5, 0xdb);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A single absolute-position drawing instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    /// Text run; `y` is the baseline.
    Text {
        x: f32,
        y: f32,
        content: String,
        font: FontFace,
        size: f32,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        thickness: f32,
        color: Color,
    },
    /// Filled rectangle; (`x`, `y`) is the bottom-left corner.
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
    },
}

/// One page of output. `index` is zero-based; the cover page is index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub index: usize,
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ops: Vec::new(),
        }
    }

    /// Text runs on this page, in emission order.
    #[cfg(test)]
    pub fn texts(&self) -> impl Iterator<Item = (&str, f32, f32, FontFace, f32)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text {
                x,
                y,
                content,
                font,
                size,
                ..
            } => Some((content.as_str(), *x, *y, *font, *size)),
            _ => None,
        })
    }
}

/// The engine's output: every page shares `width` × `height` and `margin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaidOutDocument {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub pages: Vec<Page>,
}

// ────────────────────────────────────────────────────────────────────────────
// Geometry
// ────────────────────────────────────────────────────────────────────────────

/// Fixed page geometry and type scale for contract documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub body_size: f32,
    pub line_gap: f32,
    pub paragraph_gap: f32,
    pub section_size: f32,
    pub subsection_size: f32,
    /// Space between the bottom margin and the lowest line of flowing content.
    pub footer_reserve: f32,
    /// Height of the recurring header on body pages, measured from the top margin.
    pub header_height: f32,
    pub bullet_indent: f32,
    pub bullet_text_indent: f32,
}

impl Default for LayoutConfig {
    /// US Letter, 50pt margins, 10.5pt body.
    fn default() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            margin: 50.0,
            body_size: 10.5,
            line_gap: 4.0,
            paragraph_gap: 8.0,
            section_size: 13.0,
            subsection_size: 11.5,
            footer_reserve: 40.0,
            header_height: 30.0,
            bullet_indent: 8.0,
            bullet_text_indent: 22.0,
        }
    }
}

impl LayoutConfig {
    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Flowing content may not be drawn below this y.
    pub fn bottom_limit(&self) -> f32 {
        self.margin + self.footer_reserve
    }

    /// Cursor position at the start of every body page.
    pub fn content_top(&self) -> f32 {
        self.page_height - self.margin - self.header_height
    }
}
