//! Drag and drop of face-up cards with the mouse.

use crate::board::Board;
use crate::card::{CardId, CardIds};
use crate::config::TABLEAU_CARD_V_OFFSET;
use crate::geometry::Point;
use crate::pile::PileId;

use smallvec::smallvec;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Drag {
    pub source: PileId,
    pub cards: CardIds,
    /// Offset from the pointer to the first picked card.
    pub grab: Point,
}

impl Board {
    /// Picks up the card under `at` together with the cards above it. Nothing is
    /// picked while cards are animating.
    pub fn mouse_down(&mut self, at: Point) -> bool {
        if self.drag.is_some() || !self.moving.is_idle() {
            return false;
        }
        let Some(card) = self.card_at(at) else {
            return false;
        };
        let picked = &self.cards[card];
        if !picked.is_faceup() {
            return false;
        }
        let source = picked.pile;
        let grab = picked.pos() - at;
        let cards: CardIds = match source {
            PileId::Stock => return false,
            PileId::Tableau(_) => self.pile(source).run_from(card),
            PileId::Waste | PileId::Foundation(_) => {
                if self.pile(source).top() != Some(card) {
                    return false;
                }
                smallvec![card]
            }
        };
        for &card in &cards {
            self.pile_mut(source).detach(card);
        }
        debug!(%source, cards = cards.len(), "drag started");
        self.drag = Some(Drag {
            source,
            cards,
            grab,
        });
        true
    }

    /// Moves the picked cards along with the pointer.
    pub fn mouse_move(&mut self, at: Point) -> bool {
        let Some(drag) = self.drag.as_ref() else {
            return false;
        };
        let origin = at + drag.grab;
        for (i, &card) in drag.cards.iter().enumerate() {
            self.cards[card].set_pos(origin + Point::new(0.0, i as f64 * TABLEAU_CARD_V_OFFSET));
        }
        true
    }

    /// Drops the picked cards. A legal drop is recorded as a move, anything else
    /// sends the cards back to where they came from.
    pub fn mouse_up(&mut self, at: Point) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let target = self
            .drop_target(at)
            .filter(|&dest| dest != drag.source && self.can_drop(dest, &drag.cards));
        match target {
            Some(dest) => {
                debug!(source = %drag.source, %dest, "drop accepted");
                self.move_run(drag.source, drag.cards, dest);
                true
            }
            None => {
                debug!(source = %drag.source, "drop rejected");
                let step = self.config.step;
                self.relayout(drag.source, step);
                false
            }
        }
    }

    /// Abandons a drag in progress, if any.
    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            let step = self.config.step;
            self.relayout(drag.source, step);
        }
    }

    fn drop_target(&self, at: Point) -> Option<PileId> {
        PileId::foundations()
            .chain(PileId::tableaus())
            .find(|&id| self.pile(id).drop_area(self.config.card_size).contains(at))
    }

    fn can_drop(&self, dest: PileId, cards: &[CardId]) -> bool {
        let Some(&first) = cards.first() else {
            return false;
        };
        match dest {
            PileId::Foundation(_) => cards.len() == 1 && self.can_place_on_foundation(dest, first),
            PileId::Tableau(_) => self.can_place_on_tableau(dest, first),
            PileId::Stock | PileId::Waste => false,
        }
    }
}
