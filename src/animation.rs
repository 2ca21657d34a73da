//! The set of cards currently animating, advanced by the host's timer.

use crate::card::{Card, CardId};

use std::collections::VecDeque;
use std::time::Duration;

/// Period of the host timer while the set is not empty.
pub const TICK_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Default)]
pub struct MovingSet {
    queue: VecDeque<CardId>,
}

impl MovingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `card` once. Returns true when the set goes from empty to non-empty,
    /// which is when the host has to arm its timer.
    pub fn register(&mut self, card: CardId) -> bool {
        if self.queue.contains(&card) {
            return false;
        }
        self.queue.push_back(card);
        self.queue.len() == 1
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = CardId> + '_ {
        self.queue.iter().copied()
    }

    /// Advances every member by one step. Cards still on their way are queued for
    /// the next tick; the ones that arrived are returned in drain order.
    pub fn tick(&mut self, cards: &mut [Card]) -> Vec<CardId> {
        let mut arrived = Vec::new();
        for _ in 0..self.queue.len() {
            let Some(id) = self.queue.pop_front() else {
                break;
            };
            if cards[id].update_display() {
                self.queue.push_back(id);
            } else {
                arrived.push(id);
            }
        }
        arrived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::card::{Face, Motion};
    use crate::geometry::Point;
    use crate::pile::PileId;

    fn moving_card(dest: Point) -> Card {
        let mut card = Card::new(Face::new_with_id(0), PileId::Stock);
        assert_eq!(card.move_to(dest, 10.0), Motion::Started);
        card
    }

    #[test]
    fn test_register_arms_once() {
        let mut set = MovingSet::new();
        assert!(set.is_idle());
        assert!(set.register(3));
        assert!(!set.register(5));
        assert!(!set.register(3));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_tick_drains_until_idle() {
        let mut cards = vec![
            moving_card(Point::new(30.0, 0.0)),
            moving_card(Point::new(0.0, 60.0)),
        ];
        let mut set = MovingSet::new();
        set.register(0);
        set.register(1);

        // (30, 0): 10 on move_to, 20 on tick 1, arrives on tick 2.
        assert!(set.tick(&mut cards).is_empty());
        assert_eq!(set.tick(&mut cards), vec![0]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1]);

        let mut ticks = 2;
        while !set.is_idle() {
            set.tick(&mut cards);
            ticks += 1;
        }
        assert_eq!(ticks, 5);
        assert_eq!(cards[0].pos(), Point::new(30.0, 0.0));
        assert_eq!(cards[1].pos(), Point::new(0.0, 60.0));
    }

    #[test]
    fn test_tick_on_idle_set() {
        let mut set = MovingSet::new();
        assert!(set.tick(&mut []).is_empty());
        assert!(set.is_idle());
    }
}
