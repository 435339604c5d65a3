//! Adjacent-swap reordering for chapters and sections.

use serde::{Deserialize, Serialize};

use crate::outline::{Chapter, ChapterId, Section, SectionId};

/// Which neighbour to swap with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// Result of a move request on an item that exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    Moved { from: usize, to: usize },
    /// Up at the first position or down at the last; nothing changed.
    BoundaryNoop,
}

/// Anything that lives in an ordered sequence and is addressed by id.
pub trait Keyed {
    type Key: PartialEq;

    fn key(&self) -> &Self::Key;
}

impl Keyed for Chapter {
    type Key = ChapterId;

    fn key(&self) -> &ChapterId {
        &self.id
    }
}

impl Keyed for Section {
    type Key = SectionId;

    fn key(&self) -> &SectionId {
        &self.id
    }
}

/// Work out what moving `key` would do, without touching `items`.
///
/// Returns `None` if `key` is not in `items`.
pub fn plan_move<T: Keyed>(items: &[T], key: &T::Key, direction: Direction) -> Option<MoveOutcome> {
    let from = items.iter().position(|item| item.key() == key)?;
    let to = match direction {
        Direction::Up if from == 0 => return Some(MoveOutcome::BoundaryNoop),
        Direction::Up => from - 1,
        Direction::Down if from + 1 == items.len() => return Some(MoveOutcome::BoundaryNoop),
        Direction::Down => from + 1,
    };
    Some(MoveOutcome::Moved { from, to })
}

/// Swap `key` with its neighbour in `direction`.
///
/// Returns `None` if `key` is not in `items`.
pub fn move_item<T: Keyed>(items: &mut [T], key: &T::Key, direction: Direction) -> Option<MoveOutcome> {
    let outcome = plan_move(items, key, direction)?;
    if let MoveOutcome::Moved { from, to } = outcome {
        items.swap(from, to);
    }
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections(ids: &[&str]) -> Vec<Section> {
        ids.iter().map(|id| Section::new(*id, *id)).collect()
    }

    fn ids(items: &[Section]) -> Vec<&str> {
        items.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_move_up_swaps_with_previous() {
        let mut items = sections(&["a", "b", "c"]);
        let outcome = move_item(&mut items, &"c".into(), Direction::Up);
        assert_eq!(outcome, Some(MoveOutcome::Moved { from: 2, to: 1 }));
        assert_eq!(ids(&items), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_move_down_swaps_with_next() {
        let mut items = sections(&["a", "b", "c"]);
        move_item(&mut items, &"a".into(), Direction::Down);
        assert_eq!(ids(&items), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_boundaries_are_noops() {
        let mut items = sections(&["a", "b"]);
        assert_eq!(
            move_item(&mut items, &"a".into(), Direction::Up),
            Some(MoveOutcome::BoundaryNoop)
        );
        assert_eq!(
            move_item(&mut items, &"b".into(), Direction::Down),
            Some(MoveOutcome::BoundaryNoop)
        );
        assert_eq!(ids(&items), vec!["a", "b"]);
    }

    #[test]
    fn test_single_item_is_boundary_both_ways() {
        let items = sections(&["only"]);
        assert_eq!(
            plan_move(&items, &"only".into(), Direction::Up),
            Some(MoveOutcome::BoundaryNoop)
        );
        assert_eq!(
            plan_move(&items, &"only".into(), Direction::Down),
            Some(MoveOutcome::BoundaryNoop)
        );
    }

    #[test]
    fn test_missing_key() {
        let mut items = sections(&["a"]);
        assert_eq!(move_item(&mut items, &"z".into(), Direction::Up), None);
    }

    #[test]
    fn test_direction_strings() {
        assert_eq!(Direction::Up.as_str(), "up");
        assert_eq!(Direction::Down.as_str(), "down");
    }
}
