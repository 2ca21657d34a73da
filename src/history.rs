//! Reversible move records and the linear undo/redo history.

use crate::card::{CardId, CardIds};
use crate::pile::PileId;

/// Step size used when a move is replayed from the history.
pub const REPLAY_STEP: f64 = 40.0;

/// Something that can put cards back onto a pile; implemented by the board.
pub trait Rehome {
    fn rehome(&mut self, cards: &[CardId], pile: PileId, faceup: bool, step: f64);
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleMove {
    pub from_pile: PileId,
    pub from_cards: CardIds,
    pub from_faceup: bool,
    pub to_pile: PileId,
    pub to_cards: CardIds,
    pub to_faceup: bool,
}

/// A reversible record of one user action.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveInfo {
    Simple(SimpleMove),
    /// Two moves made as one action; undone in reverse order.
    Multi(Box<MoveInfo>, Box<MoveInfo>),
}

impl MoveInfo {
    pub fn simple(
        from_pile: PileId,
        from_cards: CardIds,
        from_faceup: bool,
        to_pile: PileId,
        to_cards: CardIds,
        to_faceup: bool,
    ) -> Self {
        MoveInfo::Simple(SimpleMove {
            from_pile,
            from_cards,
            from_faceup,
            to_pile,
            to_cards,
            to_faceup,
        })
    }

    /// Cards keep their order and face.
    pub fn transfer(cards: CardIds, from_pile: PileId, to_pile: PileId, faceup: bool) -> Self {
        Self::simple(from_pile, cards.clone(), faceup, to_pile, cards, faceup)
    }

    /// Turns one card over in place.
    pub fn flip(card: CardId, pile: PileId, faceup: bool) -> Self {
        let cards: CardIds = std::iter::once(card).collect();
        Self::simple(pile, cards.clone(), !faceup, pile, cards, faceup)
    }

    pub fn then(self, next: MoveInfo) -> Self {
        MoveInfo::Multi(Box::new(self), Box::new(next))
    }

    pub fn undo<R: Rehome + ?Sized>(&self, target: &mut R) {
        match self {
            MoveInfo::Simple(m) => {
                target.rehome(&m.from_cards, m.from_pile, m.from_faceup, REPLAY_STEP)
            }
            MoveInfo::Multi(first, second) => {
                second.undo(target);
                first.undo(target);
            }
        }
    }

    pub fn redo<R: Rehome + ?Sized>(&self, target: &mut R) {
        match self {
            MoveInfo::Simple(m) => target.rehome(&m.to_cards, m.to_pile, m.to_faceup, REPLAY_STEP),
            MoveInfo::Multi(first, second) => {
                first.redo(target);
                second.redo(target);
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            MoveInfo::Simple(m) => format!(
                "{} card(s) {} -> {}",
                m.to_cards.len(),
                m.from_pile,
                m.to_pile
            ),
            MoveInfo::Multi(first, second) => {
                format!("{}; {}", first.describe(), second.describe())
            }
        }
    }
}

/// Moves before `move_index` can be undone, moves from `move_index` up to
/// `num_moves` can be redone.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<MoveInfo>,
    move_index: usize,
    num_moves: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `info` at the cursor and drops every redoable move.
    pub fn save(&mut self, info: MoveInfo) {
        self.entries.truncate(self.move_index);
        self.entries.push(info);
        self.move_index += 1;
        self.num_moves = self.move_index;
    }

    /// Steps the cursor back and returns the move to undo.
    pub fn undo(&mut self) -> Option<&MoveInfo> {
        if self.move_index == 0 {
            return None;
        }
        self.move_index -= 1;
        self.entries.get(self.move_index)
    }

    /// Returns the move to redo and steps the cursor forward.
    pub fn redo(&mut self) -> Option<&MoveInfo> {
        if self.move_index == self.num_moves {
            return None;
        }
        let info = self.entries.get(self.move_index)?;
        self.move_index += 1;
        Some(info)
    }

    pub fn move_index(&self) -> usize {
        self.move_index
    }

    pub fn num_moves(&self) -> usize {
        self.num_moves
    }

    pub fn can_redo(&self) -> bool {
        self.move_index < self.num_moves
    }

    pub fn is_at_head(&self) -> bool {
        self.move_index == self.num_moves
    }

    pub fn entries(&self) -> &[MoveInfo] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use smallvec::smallvec;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(Vec<CardId>, PileId, bool)>,
    }

    impl Rehome for Recorder {
        fn rehome(&mut self, cards: &[CardId], pile: PileId, faceup: bool, step: f64) {
            assert_eq!(step, REPLAY_STEP);
            self.calls.push((cards.to_vec(), pile, faceup));
        }
    }

    fn sample(card: CardId) -> MoveInfo {
        MoveInfo::transfer(smallvec![card], PileId::Tableau(0), PileId::Tableau(1), true)
    }

    #[test]
    fn test_simple_move_replay() {
        let info = MoveInfo::simple(
            PileId::Stock,
            smallvec![1, 2, 3],
            false,
            PileId::Waste,
            smallvec![3, 2, 1],
            true,
        );
        let mut recorder = Recorder::default();
        info.redo(&mut recorder);
        info.undo(&mut recorder);
        assert_eq!(
            recorder.calls,
            vec![
                (vec![3, 2, 1], PileId::Waste, true),
                (vec![1, 2, 3], PileId::Stock, false),
            ]
        );
    }

    #[test]
    fn test_multi_move_order() {
        let info = sample(7).then(MoveInfo::flip(4, PileId::Tableau(0), true));
        let mut recorder = Recorder::default();
        info.redo(&mut recorder);
        assert_eq!(
            recorder.calls,
            vec![
                (vec![7], PileId::Tableau(1), true),
                (vec![4], PileId::Tableau(0), true),
            ]
        );

        recorder.calls.clear();
        info.undo(&mut recorder);
        assert_eq!(
            recorder.calls,
            vec![
                (vec![4], PileId::Tableau(0), false),
                (vec![7], PileId::Tableau(0), true),
            ]
        );
    }

    #[test]
    fn test_undo_at_start_is_noop() {
        let mut history = History::new();
        assert!(history.undo().is_none());
        assert_eq!(history.move_index(), 0);
        assert_eq!(history.num_moves(), 0);
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_undo_redo_cursor() {
        let mut history = History::new();
        history.save(sample(1));
        history.save(sample(2));
        assert_eq!((history.move_index(), history.num_moves()), (2, 2));

        assert_eq!(history.undo(), Some(&sample(2)));
        assert_eq!(history.undo(), Some(&sample(1)));
        assert!(history.undo().is_none());
        assert!(history.can_redo());

        assert_eq!(history.redo(), Some(&sample(1)));
        assert_eq!((history.move_index(), history.num_moves()), (1, 2));
        assert!(!history.is_at_head());
        assert_eq!(history.redo(), Some(&sample(2)));
        assert!(history.redo().is_none());
        assert!(history.is_at_head());
    }

    #[test]
    fn test_save_truncates_redo_tail() {
        let mut history = History::new();
        for card in 1..=4 {
            history.save(sample(card));
        }
        history.undo();
        history.undo();
        history.undo();
        history.save(sample(9));

        assert_eq!((history.move_index(), history.num_moves()), (2, 2));
        assert_eq!(history.entries(), &[sample(1), sample(9)]);
        assert!(history.redo().is_none());
    }
}
