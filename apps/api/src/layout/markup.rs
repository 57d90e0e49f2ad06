//! Line-oriented contract markup.
//!
//! A marker is only recognised at the very start of a trimmed line:
//! `"# "` section, `"## "` subsection, `"- "` bullet, empty line = paragraph break.
//! Anything else is paragraph text.

/// One classified markup line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    Gap,
    Section(&'a str),
    Subsection(&'a str),
    Bullet(&'a str),
    Paragraph(&'a str),
}

pub fn classify_line(line: &str) -> Block<'_> {
    let line = line.trim();
    if line.is_empty() {
        Block::Gap
    } else if let Some(rest) = line.strip_prefix("## ") {
        Block::Subsection(rest.trim())
    } else if let Some(rest) = line.strip_prefix("# ") {
        Block::Section(rest.trim())
    } else if let Some(rest) = line.strip_prefix("- ") {
        Block::Bullet(rest.trim())
    } else {
        Block::Paragraph(line)
    }
}

/// Classifies every line of a rendered body, in order.
pub fn parse_blocks(body: &str) -> impl Iterator<Item = Block<'_>> {
    body.lines().map(classify_line)
}
