use crate::geometry::{Point, Size, Viewport};
use crate::history::REPLAY_STEP;
use crate::pile::{Fan, PileId, TOTAL_TABLEAUS};

use anyhow::{Result, bail};

pub const CARD_SIZE: Size = Size::new(90.0, 130.0);
pub const CARD_PADDING: f64 = 10.0;
pub const TABLE_MARGIN: f64 = 10.0;
pub const TABLEAU_CARD_V_OFFSET: f64 = 25.0; // Vertical offset of cards in tableau pile
pub const WASTE_CARD_H_OFFSET: f64 = 20.0; // Horizontal offset of cards in waste pile
const MAX_TABLEAU_CARDS: usize = 19;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Document holding the card faces, referenced as `deck#h5`.
    pub deck: String,
    pub card_size: Size,
    /// Animation step length of user moves.
    pub step: f64,
    /// Cards drawn per stock click (1 or 3).
    pub draw_count: usize,
    pub viewport: Viewport,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deck: "cards.svg".into(),
            card_size: CARD_SIZE,
            step: REPLAY_STEP,
            draw_count: 1,
            viewport: Viewport::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.draw_count != 1 && self.draw_count != 3 {
            bail!("Draw count must be 1 or 3.");
        }
        if !(self.step > 0.0) {
            bail!("Step size must be positive.");
        }
        if !(self.card_size.width > 0.0 && self.card_size.height > 0.0) {
            bail!("Card size must be positive.");
        }
        if !(self.viewport.scale > 0.0) {
            bail!("Viewport scale must be positive.");
        }
        if self.deck.is_empty() {
            bail!("Deck reference must not be empty.");
        }
        Ok(())
    }

    fn column_x(&self, column: usize) -> f64 {
        TABLE_MARGIN + column as f64 * (self.card_size.width + CARD_PADDING)
    }

    pub fn pile_origin(&self, id: PileId) -> Point {
        let top = TABLE_MARGIN;
        match id {
            PileId::Stock => Point::new(self.column_x(0), top),
            PileId::Waste => Point::new(self.column_x(1), top),
            PileId::Foundation(i) => Point::new(self.column_x(TOTAL_TABLEAUS - 4 + i), top),
            PileId::Tableau(i) => Point::new(
                self.column_x(i),
                top + self.card_size.height + 2.0 * CARD_PADDING,
            ),
        }
    }

    pub fn pile_fan(&self, id: PileId) -> Fan {
        match id {
            PileId::Stock | PileId::Foundation(_) => Fan::Stacked,
            PileId::Waste => Fan::Right {
                offset: WASTE_CARD_H_OFFSET,
                visible: self.draw_count,
            },
            PileId::Tableau(_) => Fan::Down(TABLEAU_CARD_V_OFFSET),
        }
    }

    /// Size of the whole table, room for the longest possible tableau included.
    pub fn table_size(&self) -> Size {
        let width = self.column_x(TOTAL_TABLEAUS) - CARD_PADDING + TABLE_MARGIN;
        let tableau_top = self.pile_origin(PileId::Tableau(0)).y;
        let height = tableau_top
            + self.card_size.height
            + (MAX_TABLEAU_CARDS - 1) as f64 * TABLEAU_CARD_V_OFFSET
            + TABLE_MARGIN;
        Size::new(width, height)
    }
}
