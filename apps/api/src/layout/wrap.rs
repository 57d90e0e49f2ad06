//! Greedy word wrap.
//!
//! Words are packed onto a line until the candidate `current + " " + word`
//! measures wider than `max_width`; the current line is then flushed and the
//! overflowing word starts the next one. A line always holds at least one word,
//! so a word wider than `max_width` is emitted alone instead of stalling.

use crate::layout::font_metrics::FontMetricTable;

/// Breaks `text` into lines no wider than `max_width` points at `size`.
///
/// Whitespace runs collapse to single spaces. Empty or all-whitespace input
/// yields no lines.
pub fn wrap_text(text: &str, metrics: &FontMetricTable, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if metrics.text_width(&candidate, size) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::{get_metrics, FontFace};

    const SIZE: f32 = 10.5;

    fn metrics() -> &'static FontMetricTable {
        get_metrics(FontFace::Helvetica)
    }

    #[test]
    fn test_empty_text_has_no_lines() {
        assert!(wrap_text("", metrics(), SIZE, 500.0).is_empty());
        assert!(wrap_text("   \t ", metrics(), SIZE, 500.0).is_empty());
    }

    #[test]
    fn test_short_text_is_one_line() {
        let lines = wrap_text("We will build a website.", metrics(), SIZE, 512.0);
        assert_eq!(lines, vec!["We will build a website."]);
    }

    #[test]
    fn test_long_text_wraps_within_width() {
        let text = "The service provider shall deliver all work product described in this \
                    agreement in a professional and workmanlike manner, consistent with \
                    generally accepted industry standards, and within the agreed schedule.";
        let max = 200.0;
        assert!(metrics().text_width(text, SIZE) > max);

        let lines = wrap_text(text, metrics(), SIZE, max);
        assert!(lines.len() >= 2, "expected a wrap, got {lines:?}");
        for line in &lines {
            let w = metrics().text_width(line, SIZE);
            assert!(w <= max, "line '{line}' is {w}pt wide, limit {max}");
        }
    }

    #[test]
    fn test_wrap_preserves_every_word_once() {
        let text = "alpha beta  gamma\tdelta epsilon zeta eta theta iota kappa lambda mu";
        let lines = wrap_text(text, metrics(), SIZE, 60.0);
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split(' ')).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_oversized_word_is_emitted_alone() {
        let word = "Supercalifragilisticexpialidocious";
        let lines = wrap_text(&format!("a {word} b"), metrics(), SIZE, 20.0);
        assert_eq!(lines, vec!["a", word, "b"]);
    }

    #[test]
    fn test_zero_width_falls_back_to_one_word_per_line() {
        let lines = wrap_text("one two three", metrics(), SIZE, 0.0);
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_negative_width_still_terminates() {
        let lines = wrap_text("one two", metrics(), SIZE, -50.0);
        assert_eq!(lines.len(), 2);
    }
}
