//! Minimal tag-slicing helpers for the holdings page.
//!
//! The page is server-rendered and regular, so string scanning over a
//! lowercased copy is enough. Lowercasing only touches ASCII, which keeps
//! byte offsets valid between the copy and the original.

pub fn to_lower_ascii(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

/// Position of the next `<tag` opening (followed by whitespace, `>` or `/`)
/// at or after `from`. `lc` must already be lowercased.
pub fn find_open_tag(lc: &str, tag: &str, from: usize) -> Option<usize> {
    let needle = format!("<{tag}");
    let mut pos = from;
    while let Some(rel) = lc.get(pos..)?.find(&needle) {
        let at = pos + rel;
        let next = lc[at + needle.len()..].chars().next();
        if matches!(next, Some(c) if c.is_whitespace() || c == '>' || c == '/') {
            return Some(at);
        }
        pos = at + needle.len();
    }
    None
}

/// The element starting at `start`: `(start, end)` where `end` is just past
/// the matching close tag. Nested elements of the same tag are counted.
pub fn element_span(lc: &str, tag: &str, start: usize) -> Option<(usize, usize)> {
    let close = format!("</{tag}>");
    let open_end = lc[start..].find('>')? + start + 1;
    let mut depth = 1usize;
    let mut pos = open_end;
    loop {
        let next_close = lc[pos..].find(&close).map(|r| pos + r)?;
        match find_open_tag(lc, tag, pos) {
            Some(next_open) if next_open < next_close => {
                depth += 1;
                pos = next_open + tag.len() + 1;
            }
            _ => {
                depth -= 1;
                pos = next_close + close.len();
                if depth == 0 {
                    return Some((start, pos));
                }
            }
        }
    }
}

/// Every `(start, end)` element span of `tag` whose class list contains all
/// of `classes`, in document order. Matched elements are not searched for
/// nested matches.
pub fn elements_with_classes(html: &str, tag: &str, classes: &[&str]) -> Vec<(usize, usize)> {
    let lc = to_lower_ascii(html);
    let mut out = Vec::new();
    let mut pos = 0usize;
    while let Some(start) = find_open_tag(&lc, tag, pos) {
        let Some(open_end) = lc[start..].find('>').map(|r| start + r + 1) else {
            break;
        };
        let open_tag = &lc[start..open_end];
        if has_classes(open_tag, classes) {
            if let Some(span) = element_span(&lc, tag, start) {
                out.push(span);
                pos = span.1;
                continue;
            }
        }
        pos = open_end;
    }
    out
}

fn has_classes(open_tag: &str, classes: &[&str]) -> bool {
    let Some(value) = attr_value(open_tag, "class") else {
        return false;
    };
    let present: Vec<&str> = value.split_whitespace().collect();
    classes
        .iter()
        .all(|want| present.iter().any(|c| c.eq_ignore_ascii_case(want)))
}

/// Value of `name="..."` (or single-quoted, or bare) inside an open tag.
pub fn attr_value<'a>(open_tag: &'a str, name: &str) -> Option<&'a str> {
    let lc = to_lower_ascii(open_tag);
    let mut pos = 0usize;
    while let Some(rel) = lc[pos..].find(name) {
        let at = pos + rel;
        pos = at + name.len();
        let boundary = at == 0 || lc[..at].ends_with(|c: char| c.is_whitespace());
        let rest = lc[pos..].trim_start();
        if !boundary || !rest.starts_with('=') {
            continue;
        }
        let value_start = open_tag.len() - rest.len() + 1;
        let tail = open_tag[value_start..].trim_start();
        let tail_start = open_tag.len() - tail.len();
        return match tail.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let end = tail[1..].find(q)?;
                Some(&open_tag[tail_start + 1..tail_start + 1 + end])
            }
            _ => {
                let end = tail
                    .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
                    .unwrap_or(tail.len());
                Some(&open_tag[tail_start..tail_start + end])
            }
        };
    }
    None
}

/// Content between the end of the open tag and the start of the close tag.
pub fn inner_after_open_tag(block: &str) -> &str {
    match (block.find('>'), block.rfind('<')) {
        (Some(oe), Some(cs)) if cs > oe => &block[oe + 1..cs],
        _ => "",
    }
}

/// Blank out the content of every `tag` element carrying `class`.
pub fn clear_elements(html: &str, tag: &str, class: &str) -> String {
    let spans = elements_with_classes(html, tag, &[class]);
    if spans.is_empty() {
        return html.to_string();
    }
    let mut out = String::with_capacity(html.len());
    let mut last = 0usize;
    for (start, end) in spans {
        let block = &html[start..end];
        let open_end = block.find('>').map(|i| start + i + 1).unwrap_or(start);
        let close_start = block.rfind('<').map(|i| start + i).unwrap_or(end);
        out.push_str(&html[last..open_end]);
        out.push_str(&html[close_start..end]);
        last = end;
    }
    out.push_str(&html[last..]);
    out
}

pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

pub fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&aelig;", "æ")
        .replace("&oslash;", "ø")
        .replace("&aring;", "å")
        .replace("&AElig;", "Æ")
        .replace("&Oslash;", "Ø")
        .replace("&Aring;", "Å")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Collapse runs of whitespace (including non-breaking space) to one space.
pub fn normalize_ws(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Visible text of an HTML fragment.
pub fn text_of(fragment: &str) -> String {
    normalize_ws(&normalize_entities(&strip_tags(fragment)))
}
