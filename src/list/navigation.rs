use crossterm::event::KeyCode;

use super::item::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Up,
    Down,
}

impl NavDirection {
    /// Only the arrow keys drive list navigation.
    pub fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Up => Some(Self::Up),
            KeyCode::Down => Some(Self::Down),
            _ => None,
        }
    }

    fn step(self, index: usize, len: usize) -> usize {
        match self {
            Self::Down => (index + 1) % len,
            Self::Up if index > 0 => index - 1,
            Self::Up => len - 1,
        }
    }
}

/// Keyboard focus position over `[-1, len)`; `-1` means nothing focused yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusCursor(isize);

impl FocusCursor {
    pub const NONE: Self = Self(-1);

    pub fn at(index: usize) -> Self {
        Self(isize::try_from(index).unwrap_or(isize::MAX))
    }

    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    pub fn raw(self) -> isize {
        self.0
    }

    pub fn is_set(self) -> bool {
        self.0 >= 0
    }
}

impl Default for FocusCursor {
    fn default() -> Self {
        Self::NONE
    }
}

/// Computes the index the cursor moves to for one key press.
///
/// A header at the first target is skipped with exactly one extra step in the
/// same direction. The second target is not re-checked, so two consecutive
/// headers (or a list made only of headers) can still yield a header index.
pub fn next_focus(items: &[Item], cursor: FocusCursor, direction: NavDirection) -> Option<usize> {
    let len = items.len();
    if len == 0 {
        return None;
    }
    let mut target = match cursor.index() {
        Some(index) if index < len => direction.step(index, len),
        _ => 0,
    };
    if items[target].is_header() {
        target = direction.step(target, len);
    }
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::item::{Content, TagSummary};

    fn note(id: &str) -> Item {
        Item::content(id, id, Content::Tag(TagSummary { note_count: 0 }))
    }

    fn press(items: &[Item], cursor: &mut FocusCursor, direction: NavDirection) -> usize {
        let target = next_focus(items, *cursor, direction).expect("non-empty list");
        *cursor = FocusCursor::at(target);
        target
    }

    fn grouped_fixture() -> Vec<Item> {
        vec![
            Item::header("A"),
            note("n1"),
            note("n2"),
            Item::header("B"),
            note("n3"),
        ]
    }

    #[test]
    fn down_presses_from_unset_cursor_walk_headerless_lists() {
        for len in 1..6 {
            let items: Vec<Item> = (0..len).map(|i| note(&format!("n{i}"))).collect();
            let mut cursor = FocusCursor::NONE;
            for presses in 1..(len * 3) {
                let landed = press(&items, &mut cursor, NavDirection::Down);
                assert_eq!(landed, (presses - 1) % len, "len {len}, presses {presses}");
            }
        }
    }

    #[test]
    fn wraps_at_both_ends() {
        let items: Vec<Item> = (0..4).map(|i| note(&format!("n{i}"))).collect();
        assert_eq!(
            next_focus(&items, FocusCursor::at(0), NavDirection::Up),
            Some(3)
        );
        assert_eq!(
            next_focus(&items, FocusCursor::at(3), NavDirection::Down),
            Some(0)
        );
    }

    #[test]
    fn grouped_walkthrough_skips_headers() {
        let items = grouped_fixture();
        let mut cursor = FocusCursor::NONE;
        assert_eq!(press(&items, &mut cursor, NavDirection::Down), 1);
        assert_eq!(press(&items, &mut cursor, NavDirection::Down), 2);
        assert_eq!(press(&items, &mut cursor, NavDirection::Down), 4);
        assert_eq!(press(&items, &mut cursor, NavDirection::Down), 1);
    }

    #[test]
    fn up_from_first_content_row_wraps_past_leading_header() {
        let items = grouped_fixture();
        assert_eq!(
            next_focus(&items, FocusCursor::at(1), NavDirection::Up),
            Some(4)
        );
        assert_eq!(
            next_focus(&items, FocusCursor::at(4), NavDirection::Up),
            Some(2)
        );
    }

    #[test]
    fn up_from_unset_cursor_starts_at_first_row() {
        let items: Vec<Item> = (0..3).map(|i| note(&format!("n{i}"))).collect();
        assert_eq!(
            next_focus(&items, FocusCursor::NONE, NavDirection::Up),
            Some(0)
        );
        let grouped = grouped_fixture();
        // index 0 is a header, so the single hop goes up and wraps to the end
        assert_eq!(
            next_focus(&grouped, FocusCursor::NONE, NavDirection::Up),
            Some(4)
        );
    }

    #[test]
    fn never_rests_on_a_header_when_headers_are_isolated() {
        let items = vec![
            Item::header("A"),
            note("a1"),
            Item::header("B"),
            note("b1"),
            note("b2"),
            Item::header("C"),
            note("c1"),
        ];
        for direction in [NavDirection::Up, NavDirection::Down] {
            let mut cursor = FocusCursor::NONE;
            for _ in 0..20 {
                let landed = press(&items, &mut cursor, direction);
                assert!(!items[landed].is_header(), "{direction:?} landed on {landed}");
            }
        }
    }

    #[test]
    fn consecutive_headers_defeat_the_single_hop() {
        // Intended: skip every header and land on n1 (index 2).
        // Actual: one extra hop only, so the cursor rests on header B.
        let items = vec![Item::header("A"), Item::header("B"), note("n1")];
        let landed = next_focus(&items, FocusCursor::NONE, NavDirection::Down);
        assert_eq!(landed, Some(1));
        assert!(items[1].is_header());
    }

    #[test]
    fn header_only_list_lands_on_the_header() {
        // Intended: no focusable row, so no movement.
        // Actual: the hop wraps back onto the only row.
        let items = vec![Item::header("Only")];
        assert_eq!(
            next_focus(&items, FocusCursor::NONE, NavDirection::Down),
            Some(0)
        );
        assert_eq!(
            next_focus(&items, FocusCursor::at(0), NavDirection::Up),
            Some(0)
        );
    }

    #[test]
    fn empty_list_has_no_target() {
        assert_eq!(next_focus(&[], FocusCursor::NONE, NavDirection::Down), None);
        assert_eq!(next_focus(&[], FocusCursor::at(3), NavDirection::Up), None);
    }

    #[test]
    fn stale_cursor_beyond_the_end_restarts_at_zero() {
        let items: Vec<Item> = (0..2).map(|i| note(&format!("n{i}"))).collect();
        assert_eq!(
            next_focus(&items, FocusCursor::at(9), NavDirection::Down),
            Some(0)
        );
    }

    #[test]
    fn only_arrow_keys_map_to_directions() {
        assert_eq!(NavDirection::from_key(KeyCode::Up), Some(NavDirection::Up));
        assert_eq!(
            NavDirection::from_key(KeyCode::Down),
            Some(NavDirection::Down)
        );
        assert_eq!(NavDirection::from_key(KeyCode::Char('j')), None);
        assert_eq!(FocusCursor::default().raw(), -1);
        assert!(!FocusCursor::default().is_set());
    }
}
