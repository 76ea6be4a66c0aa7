//! Standard-14 font metrics and fit-to-box text handling
//!
//! Widths are in 1/1000 of the font size, taken from the Adobe AFM files for
//! the printable ASCII range (0x20..=0x7E).

/// Marker appended when a value is cut to fit its box
pub const ELLIPSIS: &str = "...";

/// Check mark in ZapfDingbats (glyph `a20`)
pub const CHECK_GLYPH: char = '4';

/// Fonts the fill engine draws with. None are embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    TimesItalic,
    ZapfDingbats,
}

impl StandardFont {
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::TimesItalic => "Times-Italic",
            StandardFont::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Resource name used in page content streams
    pub fn resource_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "DqfHelv",
            StandardFont::TimesItalic => "DqfTiIt",
            StandardFont::ZapfDingbats => "DqfZaDb",
        }
    }

    /// Symbolic fonts carry their own encoding
    pub fn uses_win_ansi(&self) -> bool {
        !matches!(self, StandardFont::ZapfDingbats)
    }

    pub fn char_width(&self, ch: char) -> u16 {
        let code = ch as u32;
        match self {
            StandardFont::Helvetica => ascii_width(&HELVETICA_WIDTHS, code, 556),
            StandardFont::TimesItalic => ascii_width(&TIMES_ITALIC_WIDTHS, code, 500),
            StandardFont::ZapfDingbats => match ch {
                CHECK_GLYPH => 760,
                ' ' => 278,
                _ => 788,
            },
        }
    }
}

fn ascii_width(table: &[u16; 95], code: u32, default: u16) -> u16 {
    if (0x20..=0x7E).contains(&code) {
        table[(code - 0x20) as usize]
    } else {
        default
    }
}

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const TIMES_ITALIC_WIDTHS: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

/// Rendered width of `text` in points
pub fn text_width(font: StandardFont, text: &str, size: f64) -> f64 {
    text.chars()
        .map(|ch| f64::from(font.char_width(ch)))
        .sum::<f64>()
        * size
        / 1000.0
}

/// Result of fitting a value into a fixed-width box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fitted {
    pub text: String,
    pub truncated: bool,
}

/// Greedy truncation: drop trailing characters until the text fits, then,
/// if anything was dropped and more than 3 characters remain, replace the
/// last 3 with [`ELLIPSIS`]. May cut mid-word.
pub fn truncate_to_width(font: StandardFont, text: &str, size: f64, max_width: f64) -> Fitted {
    let mut chars: Vec<char> = text.chars().collect();
    let mut width = text_width(font, text, size);
    let mut truncated = false;

    while width > max_width {
        let Some(ch) = chars.pop() else { break };
        width -= f64::from(font.char_width(ch)) * size / 1000.0;
        truncated = true;
    }

    if truncated && chars.len() > 3 {
        chars.truncate(chars.len() - 3);
        chars.extend(ELLIPSIS.chars());
    }

    Fitted {
        text: chars.into_iter().collect(),
        truncated,
    }
}

/// Greedy word wrap into at most `max_lines` lines. Overflow is folded into
/// the last line, which is then truncated like a single-line value.
pub fn wrap_lines(
    font: StandardFont,
    text: &str,
    size: f64,
    max_width: f64,
    max_lines: usize,
) -> Vec<String> {
    let max_lines = max_lines.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if current.is_empty() || text_width(font, &candidate, size) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        let overflow = lines.split_off(max_lines - 1).join(" ");
        lines.push(overflow);
    }

    lines
        .into_iter()
        .map(|line| truncate_to_width(font, &line, size, max_width).text)
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: an overflowing value comes back shorter, ending in the marker
        /// whenever more than 3 characters survive
        #[test]
        fn overflow_is_truncated(
            text in "[A-Za-z ]{1,80}",
            size in 6.0f64..14.0,
            max_width in 0.0f64..200.0,
        ) {
            let fitted = truncate_to_width(StandardFont::Helvetica, &text, size, max_width);
            let overflowed = text_width(StandardFont::Helvetica, &text, size) > max_width;
            prop_assert_eq!(fitted.truncated, overflowed);
            if overflowed {
                prop_assert!(fitted.text.chars().count() < text.chars().count());
                if fitted.text.chars().count() > 3 {
                    prop_assert!(fitted.text.ends_with(ELLIPSIS));
                }
            } else {
                prop_assert_eq!(&fitted.text, &text);
            }
        }
    }
}
