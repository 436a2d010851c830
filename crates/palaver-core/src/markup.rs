//! Markup tokenizer and HTML renderer for assistant messages.
//!
//! Assistant replies use a small subset of markdown: `**bold**`, `*italic*`,
//! fenced and inline code, newlines, and `* ` bullets. The text is split into
//! [`Line`]s of [`Inline`] spans first; renderers walk the spans. The HTML
//! renderer escapes every payload unless [`MarkupMode::Legacy`] is selected.

use serde::{Deserialize, Serialize};

/// Glyph substituted for a leading `* ` bullet marker.
pub const BULLET: &str = "•";

/// A run of text with a single style.
///
/// Bold and italic runs hold their own spans so inline code inside them
/// keeps its styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    /// Inline or fenced code. Fenced code may contain newlines.
    Code(String),
}

/// One display line of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub bullet: bool,
    pub spans: Vec<Inline>,
}

/// Whether the HTML renderer encodes text before inserting tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkupMode {
    /// Every payload is HTML-escaped.
    #[default]
    Escaped,
    /// Payloads are inserted verbatim. Markup embedded in a reply is live.
    Legacy,
}

impl MarkupMode {
    pub fn from_escape_flag(escape_html: bool) -> Self {
        if escape_html {
            MarkupMode::Escaped
        } else {
            MarkupMode::Legacy
        }
    }
}

/// Split a message into styled lines.
pub fn tokenize(text: &str) -> Vec<Line> {
    let mut lines = vec![Line::default()];
    let mut rest = text;

    while !rest.is_empty() {
        match split_fence(rest) {
            Some((before, code, after)) => {
                push_plain(&mut lines, before);
                current(&mut lines).spans.push(Inline::Code(code.to_string()));
                rest = after;
            }
            None => {
                push_plain(&mut lines, rest);
                break;
            }
        }
    }

    lines
}

/// Render a message as an HTML fragment.
pub fn render_html(text: &str, mode: MarkupMode) -> String {
    tokenize(text)
        .iter()
        .map(|line| render_line(line, mode))
        .collect::<Vec<_>>()
        .join("<br>")
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn render_line(line: &Line, mode: MarkupMode) -> String {
    let encode = |s: &str| match mode {
        MarkupMode::Escaped => escape_html(s),
        MarkupMode::Legacy => s.to_string(),
    };

    let mut out = String::new();
    if line.bullet {
        out.push_str(BULLET);
        out.push(' ');
    }
    render_spans(&line.spans, &encode, &mut out);
    out
}

fn render_spans(spans: &[Inline], encode: &dyn Fn(&str) -> String, out: &mut String) {
    for span in spans {
        match span {
            Inline::Text(s) => out.push_str(&encode(s)),
            Inline::Bold(inner) => {
                out.push_str("<strong>");
                render_spans(inner, encode, out);
                out.push_str("</strong>");
            }
            Inline::Italic(inner) => {
                out.push_str("<em>");
                render_spans(inner, encode, out);
                out.push_str("</em>");
            }
            Inline::Code(s) => {
                out.push_str(r#"<code class="inline-code">"#);
                out.push_str(&encode(s).replace('\n', "<br>"));
                out.push_str("</code>");
            }
        }
    }
}

fn current(lines: &mut [Line]) -> &mut Line {
    let last = lines.len() - 1;
    &mut lines[last]
}

/// Append un-fenced text, starting a new line at each `\n`.
fn push_plain(lines: &mut Vec<Line>, text: &str) {
    for (i, piece) in text.split('\n').enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        let line = current(lines);
        let mut piece = piece;
        if line.spans.is_empty() && !line.bullet {
            if let Some(item) = piece.strip_prefix("* ") {
                line.bullet = true;
                piece = item;
            }
        }
        line.spans.extend(scan_inline(piece));
    }
}

/// Find the first ```` ```code``` ```` block. Returns (before, code, after).
fn split_fence(text: &str) -> Option<(&str, &str, &str)> {
    let open = text.find("```")?;
    let body_start = open + 3;
    let close = body_start + text[body_start..].find("```")?;
    let body = &text[body_start..close];
    if body.is_empty() || body.contains('`') {
        return None;
    }
    Some((&text[..open], body, &text[close + 3..]))
}

/// Tokenize a single line without fences.
///
/// Markers are ASCII, so byte offsets found here are always char boundaries.
fn scan_inline(s: &str) -> Vec<Inline> {
    let bytes = s.as_bytes();
    let mut spans = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let matched = match bytes[i] {
            b'`' => inline_code(s, i),
            b'*' if s[i..].starts_with("**") => bold(s, i),
            b'*' => italic(s, i),
            _ => None,
        };
        match matched {
            Some((span, next)) => {
                if text_start < i {
                    spans.push(Inline::Text(s[text_start..i].to_string()));
                }
                spans.push(span);
                i = next;
                text_start = next;
            }
            None => i += 1,
        }
    }
    if text_start < bytes.len() {
        spans.push(Inline::Text(s[text_start..].to_string()));
    }
    spans
}

/// Split emphasis content into text and inline code.
fn emphasis_spans(s: &str) -> Vec<Inline> {
    let mut spans = Vec::new();
    let mut text_start = 0;
    let mut i = 0;
    while let Some(offset) = s[i..].find('`') {
        let at = i + offset;
        match inline_code(s, at) {
            Some((code, next)) => {
                if text_start < at {
                    spans.push(Inline::Text(s[text_start..at].to_string()));
                }
                spans.push(code);
                i = next;
                text_start = next;
            }
            None => i = at + 1,
        }
    }
    if text_start < s.len() {
        spans.push(Inline::Text(s[text_start..].to_string()));
    }
    spans
}

fn inline_code(s: &str, at: usize) -> Option<(Inline, usize)> {
    let start = at + 1;
    let end = start + s[start..].find('`')?;
    (end > start).then(|| (Inline::Code(s[start..end].to_string()), end + 1))
}

fn bold(s: &str, at: usize) -> Option<(Inline, usize)> {
    let start = at + 2;
    let end = start + s[start..].find('*')?;
    if end == start || !s[end..].starts_with("**") {
        return None;
    }
    Some((Inline::Bold(emphasis_spans(&s[start..end])), end + 2))
}

fn italic(s: &str, at: usize) -> Option<(Inline, usize)> {
    let bytes = s.as_bytes();
    if at > 0 && bytes[at - 1] == b'*' {
        return None;
    }
    let start = at + 1;
    let end = start + s[start..].find('*')?;
    if end == start || bytes.get(end + 1) == Some(&b'*') {
        return None;
    }
    Some((Inline::Italic(emphasis_spans(&s[start..end])), end + 1))
}
