//! Multi-line node labels.

use regex::Regex;
use std::sync::OnceLock;

/// Wraps `label` into at most `rows` lines of roughly `width` characters.
///
/// Labels too long to fit keep their head (wrapped over `rows - 1` lines) and
/// their last `width` characters, joined by an ellipsis line break.
pub fn wrap_label(label: &str, width: usize, rows: usize) -> String {
    let chars: Vec<char> = label.chars().collect();
    let rows = rows.max(1);
    if chars.len().saturating_sub(3) > width * rows {
        let tail: String = chars[chars.len().saturating_sub(width)..].iter().collect();
        let head = if rows <= 2 {
            chars[..width.min(chars.len())].iter().collect()
        } else {
            split_label(&chars[..(width * 2).min(chars.len())], width, rows - 1)
        };
        format!("{head}...\n{tail}")
    } else {
        split_label(&chars, width, rows)
    }
}

fn split_label(label: &[char], width: usize, mut rows: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut remaining = label;
    let brk_range = width / 3;

    while remaining.len() > width && rows > 1 {
        if remaining.len() < width + 3 {
            // close enough, don't wrap
            lines.push(remaining.iter().collect());
            remaining = &[];
        } else {
            let lo = (width - brk_range).min(remaining.len());
            let hi = (lo + brk_range * 2).min(remaining.len());
            let found = remaining[lo..hi]
                .iter()
                .position(|c| !c.is_ascii_alphanumeric());
            match found {
                Some(brk) => {
                    let brk = (width + brk + 1)
                        .saturating_sub(brk_range)
                        .clamp(1, remaining.len());
                    lines.push(remaining[..brk].iter().collect());
                    remaining = &remaining[brk..];
                }
                None => {
                    let mut line: String = remaining[..width].iter().collect();
                    line.push('-');
                    lines.push(line);
                    remaining = &remaining[width..];
                }
            }
        }
        rows -= 1;
    }
    if !remaining.is_empty() {
        lines.push(remaining.iter().collect());
    }
    lines.join("\n")
}

fn generated_tail_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9a-fA-F]{8,10}-[0-9a-zA-Z]{4,5}$").expect("valid regex"))
}

/// Replaces a generated `<hash>-<suffix>` tail with `{uid}` so replicas share a label.
pub fn display_name(name: &str) -> String {
    generated_tail_regex().replace(name, "{uid}").into_owned()
}
