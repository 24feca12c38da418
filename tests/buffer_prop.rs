//! バッファのマーカー追従とアンドゥの性質テスト

use proptest::prelude::*;
use tsuzuri::buffer::DynString;
use tsuzuri::Buffer;

#[derive(Debug, Clone)]
enum Edit {
    Insert { at: usize, text: String },
    Delete { at: usize, size: usize },
    Replace { at: usize, size: usize, text: String },
}

fn text_strategy() -> impl Strategy<Value = String> {
    "[a-c\n]{0,24}"
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0usize..32, "[xy\n]{0,5}").prop_map(|(at, text)| Edit::Insert { at, text }),
        (0usize..32, 0usize..5).prop_map(|(at, size)| Edit::Delete { at, size }),
        (0usize..32, 0usize..4, "[z\n]{0,3}").prop_map(|(at, size, text)| Edit::Replace { at, size, text }),
    ]
}

fn apply(buffer: &mut Buffer, edit: &Edit) {
    match edit {
        Edit::Insert { at, text } => {
            buffer.goto_offset((*at).min(buffer.len_chars()));
            buffer.insert_string(text).unwrap();
        }
        Edit::Delete { at, size } => {
            buffer.goto_offset((*at).min(buffer.len_chars()));
            buffer.delete_nstring(*size).unwrap();
        }
        Edit::Replace { at, size, text } => {
            buffer.goto_offset((*at).min(buffer.len_chars()));
            buffer.replace_nstring(*size, text).unwrap();
        }
    }
}

fn marker_offset(buffer: &Buffer, id: tsuzuri::buffer::MarkerId) -> usize {
    buffer.point_to_offset(buffer.marker_point(id).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn markers_follow_insertions(
        text in text_strategy(),
        marker in 0usize..32,
        at in 0usize..32,
        inserted in "[xy\n]{1,6}",
    ) {
        let mut buffer = Buffer::from_text(1, "prop", &text);
        let len = buffer.len_chars();
        let (marker, at) = (marker.min(len), at.min(len));
        prop_assume!(marker != at);

        let id = buffer.create_marker(buffer.offset_to_point(marker));
        buffer.goto_offset(at);
        buffer.insert_string(&inserted).unwrap();

        let expected = if marker < at { marker } else { marker + inserted.chars().count() };
        prop_assert_eq!(marker_offset(&buffer, id), expected);
        prop_assert!(buffer.check_consistency().is_ok());
    }

    #[test]
    fn markers_collapse_into_deletions(
        text in text_strategy(),
        marker in 0usize..32,
        at in 0usize..32,
        size in 0usize..8,
    ) {
        let mut buffer = Buffer::from_text(1, "prop", &text);
        let len = buffer.len_chars();
        let (marker, at) = (marker.min(len), at.min(len));
        let removed = size.min(len - at);

        let id = buffer.create_marker(buffer.offset_to_point(marker));
        buffer.goto_offset(at);
        buffer.delete_nstring(size).unwrap();

        let expected = if marker <= at {
            marker
        } else if marker <= at + removed {
            at
        } else {
            marker - removed
        };
        prop_assert_eq!(marker_offset(&buffer, id), expected);
        prop_assert_eq!(buffer.len_chars(), len - removed);
        prop_assert!(buffer.check_consistency().is_ok());
    }

    #[test]
    fn marker_line_numbers_stay_in_sync(
        text in text_strategy(),
        marker in 0usize..32,
        edits in prop::collection::vec(edit_strategy(), 1..12),
    ) {
        let mut buffer = Buffer::from_text(1, "prop", &text);
        let id = buffer.create_marker(buffer.offset_to_point(marker.min(buffer.len_chars())));
        for edit in &edits {
            apply(&mut buffer, edit);
        }
        let pt = buffer.marker_point(id).unwrap();
        let recomputed = buffer.offset_to_point(buffer.point_to_offset(pt));
        prop_assert_eq!(pt.n, recomputed.n);
        prop_assert!(buffer.check_consistency().is_ok());
    }

    #[test]
    fn undoing_everything_restores_text(
        text in text_strategy(),
        edits in prop::collection::vec(edit_strategy(), 1..10),
    ) {
        let mut buffer = Buffer::from_text(1, "prop", &text);
        for edit in &edits {
            buffer.undo_start_sequence();
            apply(&mut buffer, edit);
            buffer.undo_end_sequence();
        }

        let mut continuing = false;
        for _ in 0..64 {
            if buffer.undo(continuing).is_err() {
                break;
            }
            continuing = true;
        }
        prop_assert_eq!(buffer.text(), text);
        prop_assert!(!buffer.is_modified());
        prop_assert!(buffer.check_consistency().is_ok());
    }

    #[test]
    fn insert_position_is_clamped(
        base in "[a-z]{0,12}",
        pos in -40isize..40,
        text in "[A-Z]{0,4}",
    ) {
        let mut line = DynString::from(base.as_str());
        let len = line.len() as isize;
        let clamped = if pos < 0 { (len + pos).max(0) } else { pos.min(len) };
        let mut expected = DynString::from(base.as_str());
        expected.insert(clamped, &text);

        line.insert(pos, &text);
        prop_assert_eq!(&line, &expected);
        prop_assert_eq!(line.len(), base.chars().count() + text.chars().count());
    }

    #[test]
    fn substring_never_runs_past_end(
        base in "[a-z]{0,12}",
        pos in -40isize..40,
        len in 0usize..40,
    ) {
        let line = DynString::from(base.as_str());
        let start = line.clamp(pos);
        let sub = line.substring(pos, len);
        prop_assert!(start + sub.len() <= line.len());
        prop_assert_eq!(sub.as_chars(), &line.as_chars()[start..start + sub.len()]);
    }
}
