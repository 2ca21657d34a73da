use crate::geometry::Point;
use crate::pile::PileId;

use anyhow::{Context, Result, bail};
use smallvec::SmallVec;
use std::fmt;

pub const MAX_RANK: u8 = 13;
pub const MAX_SUIT: u8 = 4;
pub const MAX_CARD: u8 = MAX_SUIT * MAX_RANK;

/// Fragment id of the card back inside the deck document.
pub const CARD_BACK: &str = "card-back";

const SUIT_IDS: [char; 4] = ['d', 'c', 'h', 's'];

// A remaining distance within this factor of the per-tick delta counts as arrived.
const ARRIVAL_TOLERANCE: f64 = 1.01;
const ARRIVAL_EPSILON: f64 = 1e-9;

/// Index of a card in the board's card arena.
pub type CardId = usize;

pub type CardIds = SmallVec<[CardId; 13]>;

/// Identity of a playing card: rank and suit packed as `suit * 13 + rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Face(u8);

impl Face {
    pub fn new_with_id(id: u8) -> Self {
        Self(id % MAX_CARD)
    }

    /// `rank` is zero based (ace = 0), `suit` follows diamond, club, heart, spade.
    pub fn new_with_rank_suit(rank: u8, suit: u8) -> Self {
        Self(suit * MAX_RANK + rank)
    }

    /// Parses a deck fragment id such as `h5` or `s13`.
    pub fn parse(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let suit_char = chars
            .next()
            .with_context(|| format!("Invalid card '{s}'"))?;
        let suit = SUIT_IDS
            .iter()
            .position(|&c| c == suit_char.to_ascii_lowercase())
            .with_context(|| format!("Invalid suit at card '{s}'"))?;
        let value = chars
            .as_str()
            .parse::<u8>()
            .with_context(|| format!("Invalid value at card '{s}'"))?;
        if !(1..=MAX_RANK).contains(&value) {
            bail!("Card value out of range at card '{s}'");
        }
        Ok(Self::new_with_rank_suit(value - 1, suit as u8))
    }

    pub fn rank(&self) -> u8 {
        self.0 % MAX_RANK
    }

    /// Face value, 1 for an ace up to 13 for a king.
    pub fn value(&self) -> u8 {
        self.rank() + 1
    }

    pub fn suit(&self) -> u8 {
        self.0 / MAX_RANK
    }

    pub fn is_red(&self) -> bool {
        matches!(self.suit(), 0 | 2)
    }

    pub fn is_ace(&self) -> bool {
        self.rank() == 0
    }

    pub fn is_king(&self) -> bool {
        self.rank() == MAX_RANK - 1
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", SUIT_IDS[self.suit() as usize], self.value())
    }
}

/// Outcome of [`Card::move_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// Reached the destination on the first step.
    Arrived,
    /// Started moving; the card must join the moving set.
    Started,
    /// Was already moving; only the destination changed.
    Retargeted,
}

/// A playing card on the table together with its animation state.
#[derive(Debug, Clone)]
pub struct Card {
    face: Face,
    faceup: bool,
    pos: Point,
    dest: Point,
    delta: Point,
    moving: bool,
    pub pile: PileId,
}

impl Card {
    pub fn new(face: Face, pile: PileId) -> Self {
        Self {
            face,
            faceup: false,
            pos: Point::ZERO,
            dest: Point::ZERO,
            delta: Point::ZERO,
            moving: false,
            pile,
        }
    }

    pub fn face(&self) -> Face {
        self.face
    }

    pub fn is_faceup(&self) -> bool {
        self.faceup
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn pos(&self) -> Point {
        self.pos
    }

    pub fn set_pos(&mut self, pos: Point) {
        self.pos = pos;
    }

    /// Returns whether the face changed.
    pub fn flip_card(&mut self, faceup: bool) -> bool {
        if self.faceup == faceup {
            return false;
        }
        self.faceup = faceup;
        true
    }

    /// Fragment reference of the visible side, e.g. `cards.svg#h5`.
    pub fn href(&self, deck: &str) -> String {
        if self.faceup {
            format!("{deck}#{}", self.face)
        } else {
            format!("{deck}#{CARD_BACK}")
        }
    }

    pub fn transform(&self) -> String {
        format!("translate({},{})", self.pos.x, self.pos.y)
    }

    /// Heads for `dest` in straight steps of about `step` length. The first step is
    /// taken immediately.
    pub fn move_to(&mut self, dest: Point, step: f64) -> Motion {
        self.dest = dest;
        let diff = dest - self.pos;
        let dist = diff.x.hypot(diff.y);
        let steps = if step > 0.0 {
            (dist / step).floor().max(1.0)
        } else {
            1.0
        };
        self.delta = Point::new(diff.x / steps, diff.y / steps);
        if self.moving {
            return Motion::Retargeted;
        }
        if self.update_display() {
            Motion::Started
        } else {
            Motion::Arrived
        }
    }

    /// Advances one step. Returns whether the card is still moving.
    pub fn update_display(&mut self) -> bool {
        let (x, arrived_x) = step_axis(self.pos.x, self.dest.x, self.delta.x);
        let (y, arrived_y) = step_axis(self.pos.y, self.dest.y, self.delta.y);
        self.pos = Point::new(x, y);
        self.moving = !(arrived_x && arrived_y);
        self.moving
    }
}

fn step_axis(pos: f64, dest: f64, delta: f64) -> (f64, bool) {
    let remaining = dest - pos;
    if remaining.abs() <= delta.abs() * ARRIVAL_TOLERANCE + ARRIVAL_EPSILON {
        (dest, true)
    } else {
        (pos + delta, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn card_at(x: f64, y: f64) -> Card {
        let mut card = Card::new(Face::parse("h5").unwrap(), PileId::Stock);
        card.set_pos(Point::new(x, y));
        card
    }

    #[test]
    fn test_parse_face() {
        let face = Face::parse("h5").unwrap();
        assert_eq!(face.value(), 5);
        assert_eq!(face.suit(), 2);
        assert!(face.is_red());
        assert_eq!(face.to_string(), "h5");

        let king = Face::parse("s13").unwrap();
        assert!(king.is_king());
        assert!(!king.is_red());
        assert!(Face::parse("d1").unwrap().is_ace());

        assert!(Face::parse("x3").is_err());
        assert!(Face::parse("c14").is_err());
        assert!(Face::parse("c0").is_err());
        assert!(Face::parse("").is_err());
    }

    #[test]
    fn test_face_ids_are_unique() {
        let mut names: Vec<String> = (0..MAX_CARD)
            .map(|id| Face::new_with_id(id).to_string())
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), MAX_CARD as usize);
    }

    #[test]
    fn test_flip_card() {
        let mut card = card_at(0.0, 0.0);
        assert_eq!(card.href("deck.svg"), "deck.svg#card-back");
        assert!(card.flip_card(true));
        assert!(!card.flip_card(true));
        assert_eq!(card.href("deck.svg"), "deck.svg#h5");
    }

    #[test]
    fn test_move_in_steps_of_ten() {
        let mut card = card_at(0.0, 0.0);
        assert_eq!(card.move_to(Point::new(100.0, 0.0), 10.0), Motion::Started);
        assert_eq!(card.pos(), Point::new(10.0, 0.0));

        let mut expected = 10.0;
        while card.update_display() {
            expected += 10.0;
            assert_eq!(card.pos().y, 0.0);
            assert!((card.pos().x - expected).abs() < 1e-9);
        }
        assert_eq!(card.pos(), Point::new(100.0, 0.0));
        assert!(!card.is_moving());
    }

    #[test]
    fn test_move_to_current_position_arrives() {
        let mut card = card_at(40.0, 40.0);
        assert_eq!(card.move_to(Point::new(40.0, 40.0), 40.0), Motion::Arrived);
        assert!(!card.is_moving());
    }

    #[test]
    fn test_short_move_arrives_at_once() {
        let mut card = card_at(0.0, 0.0);
        assert_eq!(card.move_to(Point::new(3.0, 4.0), 40.0), Motion::Arrived);
        assert_eq!(card.pos(), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_retarget_while_moving() {
        let mut card = card_at(0.0, 0.0);
        assert_eq!(card.move_to(Point::new(400.0, 0.0), 40.0), Motion::Started);
        assert_eq!(card.move_to(Point::new(0.0, 400.0), 40.0), Motion::Retargeted);
        while card.update_display() {}
        assert_eq!(card.pos(), Point::new(0.0, 400.0));
    }

    proptest! {
        #[test]
        fn prop_motion_terminates(
            sx in -2000.0..2000.0f64,
            sy in -2000.0..2000.0f64,
            dx in -2000.0..2000.0f64,
            dy in -2000.0..2000.0f64,
            step in 0.5..200.0f64,
        ) {
            let mut card = card_at(sx, sy);
            let dest = Point::new(dx, dy);
            let dist = (dx - sx).hypot(dy - sy);
            let bound = (dist / step).floor() as usize + 2;
            let mut ticks = 0;
            if card.move_to(dest, step) == Motion::Started {
                while card.update_display() {
                    ticks += 1;
                    prop_assert!(ticks <= bound);
                }
            }
            prop_assert_eq!(card.pos(), dest);
        }
    }
}
