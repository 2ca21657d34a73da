use crate::card::{CardId, CardIds};
use crate::geometry::{Point, Rect, Size};

use smallvec::SmallVec;
use std::fmt;

pub const TOTAL_FOUNDATIONS: usize = 4;
pub const TOTAL_TABLEAUS: usize = 7;
pub const TOTAL_PILES: usize = TOTAL_FOUNDATIONS + TOTAL_TABLEAUS + 2;
pub const TALON_SIZE: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PileId {
    Stock,
    Waste,
    Foundation(usize),
    Tableau(usize),
}

impl PileId {
    pub fn all() -> impl Iterator<Item = PileId> {
        [PileId::Stock, PileId::Waste]
            .into_iter()
            .chain((0..TOTAL_FOUNDATIONS).map(PileId::Foundation))
            .chain((0..TOTAL_TABLEAUS).map(PileId::Tableau))
    }

    pub fn foundations() -> impl Iterator<Item = PileId> {
        (0..TOTAL_FOUNDATIONS).map(PileId::Foundation)
    }

    pub fn tableaus() -> impl Iterator<Item = PileId> {
        (0..TOTAL_TABLEAUS).map(PileId::Tableau)
    }

    /// Position in [`PileId::all`].
    pub fn index(&self) -> usize {
        match self {
            PileId::Stock => 0,
            PileId::Waste => 1,
            PileId::Foundation(i) => 2 + i,
            PileId::Tableau(i) => 2 + TOTAL_FOUNDATIONS + i,
        }
    }

    pub fn is_tableau(&self) -> bool {
        matches!(self, PileId::Tableau(_))
    }
}

impl fmt::Display for PileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PileId::Stock => write!(f, "stock"),
            PileId::Waste => write!(f, "waste"),
            PileId::Foundation(i) => write!(f, "foundation-{}", i + 1),
            PileId::Tableau(i) => write!(f, "tableau-{}", i + 1),
        }
    }
}

/// How the cards of a pile spread out from its origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fan {
    Stacked,
    /// Every card sits `offset` below the previous one.
    Down(f64),
    /// The top `visible` cards spread `offset` to the right, the rest stay stacked.
    Right { offset: f64, visible: usize },
}

/// An ordered stack of cards rendered at one board location.
///
/// `cards` is the logical order, bottom first. `layer` is the z-order of the card
/// elements currently attached to the pile's group; cards that are animating or
/// being dragged are detached from it.
#[derive(Debug, Clone)]
pub struct Pile {
    id: PileId,
    origin: Point,
    fan: Fan,
    cards: SmallVec<[CardId; TALON_SIZE]>,
    layer: Vec<CardId>,
}

impl Pile {
    pub fn new(id: PileId, origin: Point, fan: Fan) -> Self {
        Self {
            id,
            origin,
            fan,
            cards: SmallVec::new(),
            layer: Vec::new(),
        }
    }

    pub fn id(&self) -> PileId {
        self.id
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn cards(&self) -> &[CardId] {
        &self.cards
    }

    pub fn layer(&self) -> &[CardId] {
        &self.layer
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn top(&self) -> Option<CardId> {
        self.cards.last().copied()
    }

    pub fn contains(&self, card: CardId) -> bool {
        self.cards.contains(&card)
    }

    pub fn position(&self, card: CardId) -> Option<usize> {
        self.cards.iter().position(|&c| c == card)
    }

    /// The card right above `card`, if any.
    pub fn next_card(&self, card: CardId) -> Option<CardId> {
        let idx = self.position(card)?;
        self.cards.get(idx + 1).copied()
    }

    /// `card` and every card above it.
    pub fn run_from(&self, card: CardId) -> CardIds {
        match self.position(card) {
            Some(idx) => self.cards[idx..].iter().copied().collect(),
            None => CardIds::new(),
        }
    }

    pub fn push(&mut self, card: CardId) {
        self.cards.push(card);
    }

    /// Removes `card` from the pile and its layer. Returns its former index.
    pub fn remove(&mut self, card: CardId) -> Option<usize> {
        self.detach(card);
        let idx = self.position(card)?;
        self.cards.remove(idx);
        Some(idx)
    }

    pub fn detach(&mut self, card: CardId) {
        self.layer.retain(|c| *c != card);
    }

    /// Inserts the element of `card` before the next attached card above it,
    /// or on top when there is none.
    pub fn attach(&mut self, card: CardId) {
        self.detach(card);
        let mut next = self.next_card(card);
        while let Some(nc) = next {
            if let Some(at) = self.layer.iter().position(|&c| c == nc) {
                self.layer.insert(at, card);
                return;
            }
            next = self.next_card(nc);
        }
        self.layer.push(card);
    }

    /// Board position of the card at `index` given the current pile size.
    pub fn slot(&self, index: usize) -> Point {
        match self.fan {
            Fan::Stacked => self.origin,
            Fan::Down(offset) => self.origin + Point::new(0.0, index as f64 * offset),
            Fan::Right { offset, visible } => {
                let first_visible = self.cards.len().saturating_sub(visible.max(1));
                let shift = index.saturating_sub(first_visible);
                self.origin + Point::new(shift as f64 * offset, 0.0)
            }
        }
    }

    /// Area that accepts dropped cards: the slot outline stretched to the top card.
    pub fn drop_area(&self, card_size: Size) -> Rect {
        let last = self.slot(self.cards.len().saturating_sub(1));
        let extent = last - self.origin;
        Rect::from_min_size(
            self.origin,
            Size::new(
                card_size.width + extent.x,
                card_size.height + extent.y,
            ),
        )
    }
}
