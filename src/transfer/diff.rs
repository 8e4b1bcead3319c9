//! Segment-level alignment of a rewrite against its source.
//!
//! The longest common subsequence of segments is kept; every maximal run of
//! unmatched segments between two kept segments becomes one change. A run
//! with no source segments is an insertion anchored at the byte offset of
//! the next kept source segment.

use edit_distance::edit_distance;

use super::segments::segment_texts;
use super::{ChangeStatus, ChangeType, StyleChange};

/// Normalized edit distance at or below which a change is a style adjustment.
pub const ADJUSTMENT_MAX_DISTANCE: f64 = 0.5;

/// Changes turning `source` into `rewritten`, in document order.
///
/// `rationale` is attached to every change; ids are `{prefix}-{n}` from 1.
pub fn align_changes(
    source: &str,
    rewritten: &str,
    rationale: &str,
    prefix: &str,
) -> Vec<StyleChange> {
    let a = segment_texts(source);
    let b = segment_texts(rewritten);
    let matches = lcs_pairs(&a, &b);

    let a_offsets: Vec<usize> = a
        .iter()
        .scan(0, |offset, s| {
            let start = *offset;
            *offset += s.len();
            Some(start)
        })
        .collect();
    let offset_of = |i: usize| a_offsets.get(i).copied().unwrap_or(source.len());

    let mut changes = Vec::new();
    let (mut i, mut j) = (0, 0);
    for (mi, mj) in matches.into_iter().chain(std::iter::once((a.len(), b.len()))) {
        if mi > i || mj > j {
            let start = offset_of(i);
            let end = offset_of(mi);
            let original = &source[start..end];
            let proposed: String = b[j..mj].concat();
            changes.push(StyleChange {
                id: format!("{prefix}-{}", changes.len() + 1),
                change_type: classify_change(original, &proposed),
                start,
                end,
                original_span: original.to_string(),
                proposed_span: proposed,
                rationale: rationale.to_string(),
                status: ChangeStatus::Pending,
            });
        }
        i = mi + 1;
        j = mj + 1;
    }
    changes
}

/// Index pairs of a longest common subsequence, ascending.
fn lcs_pairs(a: &[&str], b: &[&str]) -> Vec<(usize, usize)> {
    let (n, m) = (a.len(), b.len());
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if a[i] == b[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(table[0][0]);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

/// Classify an edit by how much of the wording it touches.
pub fn classify_change(original: &str, proposed: &str) -> ChangeType {
    let strip = |s: &str| -> String {
        s.chars()
            .filter(|c| !c.is_whitespace() && !c.is_ascii_punctuation() && !is_cjk_punctuation(*c))
            .collect()
    };
    if strip(original) == strip(proposed) {
        return ChangeType::FormatChange;
    }

    let (original, proposed) = (original.trim(), proposed.trim());
    let longest = original.chars().count().max(proposed.chars().count()).max(1);
    let distance = edit_distance(original, proposed) as f64 / longest as f64;
    if distance <= ADJUSTMENT_MAX_DISTANCE {
        ChangeType::StyleAdjustment
    } else {
        ChangeType::TextReplacement
    }
}

fn is_cjk_punctuation(c: char) -> bool {
    matches!(c, '\u{3000}'..='\u{303F}' | '\u{FF01}'..='\u{FF0F}' | '\u{FF1A}'..='\u{FF20}')
        || matches!(c, '“' | '”' | '‘' | '’' | '…' | '—' | '～')
}

/// Apply `changes` to `source`; only changes for which `include` holds.
///
/// Changes must be in document order and non-overlapping.
pub fn apply_changes<'a>(
    source: &str,
    changes: impl IntoIterator<Item = &'a StyleChange>,
    include: impl Fn(&StyleChange) -> bool,
) -> String {
    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;
    for change in changes {
        if !include(change) {
            continue;
        }
        output.push_str(&source[cursor..change.start]);
        output.push_str(&change.proposed_span);
        cursor = change.end;
    }
    output.push_str(&source[cursor..]);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SOURCE: &str = "嗨，今天聊聊合同吧。条款挺多的！我们慢慢看。";

    #[test]
    fn unchanged_text_has_no_changes() {
        assert!(align_changes(SOURCE, SOURCE, "r", "change").is_empty());
    }

    #[test]
    fn replaced_sentence_becomes_one_change() {
        let rewritten = "您好，今天讨论合同事宜。条款挺多的！我们慢慢看。";
        let changes = align_changes(SOURCE, rewritten, "more formal", "change");
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.id, "change-1");
        assert_eq!(change.original_span, "嗨，今天聊聊合同吧。");
        assert_eq!(change.proposed_span, "您好，今天讨论合同事宜。");
        assert_eq!(&SOURCE[change.start..change.end], change.original_span);
        assert_eq!(apply_changes(SOURCE, &changes, |_| true), rewritten);
        assert_eq!(apply_changes(SOURCE, &changes, |_| false), SOURCE);
    }

    #[test]
    fn replacement_and_append_are_anchored() {
        let rewritten = "嗨，今天聊聊合同吧。首先说明背景。我们慢慢看。";
        let changes = align_changes(SOURCE, rewritten, "r", "c");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].original_span, "条款挺多的！");
        assert_eq!(apply_changes(SOURCE, &changes, |_| true), rewritten);

        let appended = format!("{SOURCE}谢谢。");
        let changes = align_changes(SOURCE, &appended, "r", "c");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].start, SOURCE.len());
        assert_eq!(changes[0].end, SOURCE.len());
        assert!(changes[0].original_span.is_empty());
    }

    #[test]
    fn change_types_follow_edit_size() {
        assert_eq!(classify_change("你好，世界。", "你好 世界！"), ChangeType::FormatChange);
        assert_eq!(
            classify_change("We start the meeting now.", "We begin the meeting now."),
            ChangeType::StyleAdjustment
        );
        assert_eq!(
            classify_change("嗨，最近怎么样？", "兹通知各部门。"),
            ChangeType::TextReplacement
        );
    }

    proptest! {
        #[test]
        fn accept_all_reproduces_rewrite(
            keep in prop::collection::vec(any::<bool>(), 5),
            extra in prop::collection::vec("[a-z]{1,6}\\.", 0..3),
        ) {
            let sentences = ["One here. ", "Two there. ", "Three now. ", "Four later. ", "Five done."];
            let source: String = sentences.concat();
            let mut rewritten = String::new();
            for (sentence, kept) in sentences.iter().zip(&keep) {
                if *kept {
                    rewritten.push_str(sentence);
                } else {
                    rewritten.push_str("Changed words here. ");
                }
            }
            for e in &extra {
                rewritten.push(' ');
                rewritten.push_str(e);
            }
            let changes = align_changes(&source, &rewritten, "r", "c");
            prop_assert_eq!(apply_changes(&source, &changes, |_| true), rewritten);
            prop_assert_eq!(apply_changes(&source, &changes, |_| false), source);
        }
    }
}
