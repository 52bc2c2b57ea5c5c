//! Inline item markers (`[item:<id>]`) embedded in narrative text.
//!
//! Presentation layers replace each marker with a rich item card, so the text
//! returned to callers must only reference ids that are part of the response.

use std::collections::BTreeSet;

use crate::domain::catalog::ItemId;

const MARKER_OPEN: &str = "[item:";

/// `id` is `None` when the digits do not fit an id; such markers can never
/// resolve and are always removed on rewrite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkerSpan {
    pub start: usize,
    pub end: usize,
    pub id: Option<ItemId>,
}

pub fn marker(id: ItemId) -> String {
    format!("{MARKER_OPEN}{}]", id.0)
}

/// Finds every well-formed marker. Spaces around the number are tolerated
/// (`[item: 12 ]`); anything else inside the brackets is not a marker.
pub fn find_markers(text: &str) -> Vec<MarkerSpan> {
    let mut spans = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find(MARKER_OPEN) {
        let start = cursor + offset;
        let body_start = start + MARKER_OPEN.len();

        match parse_marker_body(&text[body_start..]) {
            Some((id, consumed)) => {
                let end = body_start + consumed;
                spans.push(MarkerSpan { start, end, id });
                cursor = end;
            }
            None => cursor = body_start,
        }
    }

    spans
}

fn parse_marker_body(rest: &str) -> Option<(Option<ItemId>, usize)> {
    let close = rest.find(']')?;
    let inner = rest[..close].trim();
    if inner.is_empty() || !inner.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((inner.parse::<i64>().ok().map(ItemId), close + 1))
}

/// Ids referenced by markers, in order of first appearance.
pub fn extract_marker_ids(text: &str) -> Vec<ItemId> {
    let mut seen = BTreeSet::new();
    find_markers(text)
        .into_iter()
        .filter_map(|span| span.id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Removes markers whose id is not in `allowed`, returning the cleaned text
/// and the ids that were removed. Markers with out-of-range ids are removed
/// without being reported.
pub fn strip_unknown_markers(text: &str, allowed: &BTreeSet<ItemId>) -> (String, Vec<ItemId>) {
    let mut removed = Vec::new();
    let cleaned = rewrite_markers(text, |id| {
        if allowed.contains(&id) {
            true
        } else {
            removed.push(id);
            false
        }
    });
    (cleaned, removed)
}

pub fn strip_all_markers(text: &str) -> String {
    rewrite_markers(text, |_| false)
}

fn rewrite_markers(text: &str, mut keep: impl FnMut(ItemId) -> bool) -> String {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;

    for span in find_markers(text) {
        output.push_str(&text[cursor..span.start]);
        if let Some(id) = span.id.filter(|id| keep(*id)) {
            output.push_str(&marker(id));
            cursor = span.end;
        } else {
            // Swallow one trailing space so "[item:9] Reason" collapses cleanly.
            cursor = if text[span.end..].starts_with(' ') { span.end + 1 } else { span.end };
        }
    }
    output.push_str(&text[cursor..]);

    output
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
