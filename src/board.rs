use crate::animation::MovingSet;
use crate::card::{Card, CardId, CardIds, Face, MAX_CARD, MAX_RANK, Motion};
use crate::config::Config;
use crate::drag::Drag;
use crate::event::Event;
use crate::geometry::{Point, Rect};
use crate::history::{History, MoveInfo, Rehome};
use crate::pile::{Pile, PileId, TOTAL_TABLEAUS};

use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;
use smallvec::{SmallVec, smallvec};
use tracing::{debug, info, trace};

type Layout = Vec<(PileId, Vec<(Face, bool)>)>;

/// The card table: cards, piles, move history, running animations and overlays.
#[derive(Debug, Clone)]
pub struct Board {
    pub(crate) config: Config,
    pub(crate) cards: Vec<Card>,
    pub(crate) piles: Vec<Pile>,
    pub(crate) moving: MovingSet,
    pub(crate) drag: Option<Drag>,
    index: FxHashMap<Face, CardId>,
    history: History,
    help_visible: bool,
    win_visible: bool,
    is_won: bool,
}

impl Board {
    /// Deals a new game. The same seed always yields the same deal.
    pub fn deal(config: Config, seed: u32) -> Self {
        let deck = shuffled_deck(seed);
        let mut layout: Layout = Vec::new();
        let mut m = 0;
        for t in 0..TOTAL_TABLEAUS {
            let cards = (0..=t).map(|k| (deck[m + k], k == t)).collect();
            layout.push((PileId::Tableau(t), cards));
            m += t + 1;
        }
        layout.push((
            PileId::Stock,
            deck[m..].iter().map(|&face| (face, false)).collect(),
        ));
        info!(seed, draw_count = config.draw_count, "dealt new game");
        Self::build(config, layout)
    }

    fn build(config: Config, layout: Layout) -> Self {
        let piles = PileId::all()
            .map(|id| Pile::new(id, config.pile_origin(id), config.pile_fan(id)))
            .collect();
        let mut board = Self {
            config,
            cards: Vec::with_capacity(MAX_CARD as usize),
            piles,
            moving: MovingSet::new(),
            drag: None,
            index: FxHashMap::default(),
            history: History::new(),
            help_visible: false,
            win_visible: false,
            is_won: false,
        };
        for (pile, faces) in layout {
            for (face, faceup) in faces {
                let id = board.cards.len();
                let mut card = Card::new(face, pile);
                card.flip_card(faceup);
                board.cards.push(card);
                board.index.insert(face, id);
                board.pile_mut(pile).push(id);
            }
        }
        for id in PileId::all() {
            let pile = &mut board.piles[id.index()];
            for index in 0..pile.len() {
                let card = pile.cards()[index];
                board.cards[card].set_pos(pile.slot(index));
                pile.attach(card);
            }
        }
        board
    }

    /// Loads a game state such as
    ///
    /// ```text
    /// Stock: c3 d4
    /// Waste: h9
    /// Foundation1: d1 d2
    /// Tableau1: s3 h7 | d5 c4
    /// DrawCount: 3
    /// ```
    ///
    /// Tableau cards left of `|` are face down.
    pub fn parse(content: &str, mut config: Config) -> Result<Self> {
        let mut layout: Layout = Vec::new();
        for line in content
            .split('\n')
            .map(|v| v.trim())
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
        {
            let line_context = || format!("Failed to parse at '{line}'");
            let Some((name, rest)) = line.split_once(':') else {
                bail!("Missing ':' at '{line}'");
            };
            let name = name.trim();
            if name == "DrawCount" {
                config.draw_count = rest
                    .trim()
                    .parse::<usize>()
                    .context("Invalid DrawCount")
                    .with_context(line_context)?;
                continue;
            }
            let pile = parse_pile_name(name).with_context(line_context)?;
            let faces = match pile {
                PileId::Stock => with_face(parse_faces(rest).with_context(line_context)?, false),
                PileId::Waste | PileId::Foundation(_) => {
                    with_face(parse_faces(rest).with_context(line_context)?, true)
                }
                PileId::Tableau(_) => {
                    let (down, up) = rest.split_once('|').unwrap_or(("", rest));
                    let mut faces =
                        with_face(parse_faces(down).with_context(line_context)?, false);
                    faces.extend(with_face(
                        parse_faces(up).with_context(line_context)?,
                        true,
                    ));
                    faces
                }
            };
            layout.push((pile, faces));
        }
        config.validate()?;

        let mut seen = FxHashMap::default();
        for (pile, faces) in &layout {
            for (face, _) in faces {
                if let Some(other) = seen.insert(*face, *pile) {
                    bail!("Card '{face}' appears in both {other} and {pile}");
                }
            }
        }
        Ok(Self::build(config, layout))
    }

    pub fn pretty_print(&self) -> String {
        let mut output = String::new();
        for pile in &self.piles {
            if pile.is_empty() {
                continue;
            }
            let name = match pile.id() {
                PileId::Stock => "Stock".to_string(),
                PileId::Waste => "Waste".to_string(),
                PileId::Foundation(i) => format!("Foundation{}", i + 1),
                PileId::Tableau(i) => format!("Tableau{}", i + 1),
            };
            output.push_str(&name);
            output.push(':');
            let mut separated = !pile.id().is_tableau();
            for &card in pile.cards() {
                let card = &self.cards[card];
                if !separated && card.is_faceup() {
                    output.push_str(" |");
                    separated = true;
                }
                output.push(' ');
                output.push_str(&card.face().to_string());
            }
            if !separated {
                output.push_str(" |");
            }
            output.push('\n');
        }
        output.push_str(&format!("DrawCount: {}", self.config.draw_count));
        output
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: CardId) -> &Card {
        &self.cards[id]
    }

    pub fn find_card(&self, face: Face) -> Option<CardId> {
        self.index.get(&face).copied()
    }

    pub fn piles(&self) -> &[Pile] {
        &self.piles
    }

    pub fn pile(&self, id: PileId) -> &Pile {
        &self.piles[id.index()]
    }

    pub(crate) fn pile_mut(&mut self, id: PileId) -> &mut Pile {
        &mut self.piles[id.index()]
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn moving(&self) -> &MovingSet {
        &self.moving
    }

    pub fn drag(&self) -> Option<&Drag> {
        self.drag.as_ref()
    }

    pub fn is_help_visible(&self) -> bool {
        self.help_visible
    }

    pub fn is_win_visible(&self) -> bool {
        self.win_visible
    }

    pub fn is_won(&self) -> bool {
        self.is_won
    }

    /// All four foundations are complete.
    pub fn is_complete(&self) -> bool {
        PileId::foundations().all(|f| self.pile(f).len() == MAX_RANK as usize)
    }

    pub fn handle_event(&mut self, event: Event) {
        let viewport = self.config.viewport;
        match event {
            Event::KeyPress(key) => self.handle_key(key),
            Event::MouseDown(p) => {
                self.mouse_down(viewport.to_board(p));
            }
            Event::MouseMove(p) => {
                self.mouse_move(viewport.to_board(p));
            }
            Event::MouseUp(p) => {
                self.mouse_up(viewport.to_board(p));
            }
            Event::Click(p) => {
                self.click(viewport.to_board(p));
            }
        }
    }

    fn handle_key(&mut self, key: char) {
        match key {
            'z' | 'Z' => {
                self.cancel_drag();
                self.undo_move();
            }
            'r' | 'R' => {
                self.cancel_drag();
                self.redo_move();
            }
            '?' => self.toggle_help(),
            _ => trace!(?key, "ignored key"),
        }
    }

    pub fn toggle_help(&mut self) {
        self.help_visible = !self.help_visible;
    }

    /// Records a move that has just been applied. Redoable moves are dropped.
    pub fn save_move(&mut self, info: MoveInfo) {
        debug!(
            move_index = self.history.move_index() + 1,
            "save move: {}",
            info.describe()
        );
        self.history.save(info);
        self.unwon();
    }

    /// Returns false when there is nothing to undo.
    pub fn undo_move(&mut self) -> bool {
        let Some(info) = self.history.undo().cloned() else {
            return false;
        };
        debug!(
            move_index = self.history.move_index(),
            "undo move: {}",
            info.describe()
        );
        info.undo(self);
        if self.win_visible {
            self.win_visible = false;
        }
        true
    }

    /// Returns false when there is nothing to redo.
    pub fn redo_move(&mut self) -> bool {
        let Some(info) = self.history.redo().cloned() else {
            return false;
        };
        debug!(
            move_index = self.history.move_index(),
            "redo move: {}",
            info.describe()
        );
        info.redo(self);
        if self.history.is_at_head() && self.is_won && !self.win_visible {
            self.won();
        }
        true
    }

    /// Shows the win banner. Calling it while the banner is shown hides it again.
    pub fn won(&mut self) {
        if self.win_visible {
            self.win_visible = false;
            return;
        }
        self.win_visible = true;
        self.is_won = true;
        info!(moves = self.history.num_moves(), "game won");
    }

    pub fn unwon(&mut self) {
        self.win_visible = false;
        self.is_won = false;
    }

    /// Applies a user move, records it and checks for a win.
    fn perform(&mut self, info: MoveInfo) {
        info.redo(self);
        self.save_move(info);
        if self.is_complete() && !self.win_visible {
            self.won();
        }
    }

    /// Moves `run` from `source` onto `dest`, turning over the card it uncovers.
    pub(crate) fn move_run(&mut self, source: PileId, run: CardIds, dest: PileId) {
        let pile = self.pile(source);
        let below = pile
            .len()
            .checked_sub(run.len() + 1)
            .map(|i| pile.cards()[i])
            .filter(|&card| source.is_tableau() && !self.cards[card].is_faceup());
        let mut info = MoveInfo::transfer(run, source, dest, true);
        if let Some(card) = below {
            info = info.then(MoveInfo::flip(card, source, true));
        }
        self.perform(info);
    }

    /// Handles a click at a board position.
    pub fn click(&mut self, at: Point) -> bool {
        if self.drag.is_some() {
            return false;
        }
        if self
            .pile(PileId::Stock)
            .drop_area(self.config.card_size)
            .contains(at)
        {
            return self.click_stock();
        }
        match self.card_at(at) {
            Some(card) => self.click_card(card),
            None => false,
        }
    }

    /// Draws from the stock, or turns the waste over when the stock is empty.
    /// Refused while cards are dragged.
    pub fn click_stock(&mut self) -> bool {
        if self.drag.is_some() {
            return false;
        }
        let stock = self.pile(PileId::Stock);
        if stock.is_empty() {
            let waste = self.pile(PileId::Waste);
            if waste.is_empty() {
                return false;
            }
            let from: CardIds = waste.cards().iter().copied().collect();
            let to = from.iter().rev().copied().collect();
            self.perform(MoveInfo::simple(
                PileId::Waste,
                from,
                true,
                PileId::Stock,
                to,
                false,
            ));
        } else {
            let count = self.config.draw_count.min(stock.len());
            let from: CardIds = stock.cards()[stock.len() - count..].iter().copied().collect();
            let to = from.iter().rev().copied().collect();
            self.perform(MoveInfo::simple(
                PileId::Stock,
                from,
                false,
                PileId::Waste,
                to,
                true,
            ));
        }
        true
    }

    /// Sends a face-up card (with the cards above it) to a foundation, or else to
    /// the first tableau that takes it.
    pub fn click_card(&mut self, card: CardId) -> bool {
        if self.drag.is_some() {
            return false;
        }
        let Some(c) = self.cards.get(card) else {
            return false;
        };
        if !c.is_faceup() || c.is_moving() {
            return false;
        }
        let source = c.pile;
        let run = self.pile(source).run_from(card);
        match source {
            PileId::Stock => return false,
            PileId::Waste | PileId::Foundation(_) if run.len() != 1 => return false,
            _ => {}
        }

        if run.len() == 1
            && !matches!(source, PileId::Foundation(_))
            && let Some(dest) = PileId::foundations().find(|&f| self.can_place_on_foundation(f, card))
        {
            self.move_run(source, run, dest);
            return true;
        }
        if let Some(dest) = PileId::tableaus()
            .filter(|&t| t != source)
            .find(|&t| self.can_place_on_tableau(t, card))
        {
            self.move_run(source, run, dest);
            return true;
        }
        false
    }

    pub fn can_place_on_foundation(&self, foundation: PileId, card: CardId) -> bool {
        let face = self.cards[card].face();
        match self.pile(foundation).top() {
            None => face.is_ace(),
            Some(top) => {
                let top = self.cards[top].face();
                top.suit() == face.suit() && face.rank() == top.rank() + 1
            }
        }
    }

    pub fn can_place_on_tableau(&self, tableau: PileId, card: CardId) -> bool {
        let face = self.cards[card].face();
        match self.pile(tableau).top() {
            None => face.is_king(),
            Some(top) => {
                let top_card = &self.cards[top];
                let top = top_card.face();
                top_card.is_faceup() && top.is_red() != face.is_red() && top.rank() == face.rank() + 1
            }
        }
    }

    pub fn card_rect(&self, card: CardId) -> Rect {
        Rect::from_min_size(self.cards[card].pos(), self.config.card_size)
    }

    /// Topmost attached card under `at`.
    pub fn card_at(&self, at: Point) -> Option<CardId> {
        self.piles.iter().find_map(|pile| {
            pile.layer()
                .iter()
                .rev()
                .copied()
                .find(|&card| self.card_rect(card).contains(at))
        })
    }

    /// Advances running animations by one step, meant to be called every
    /// [`TICK_INTERVAL`](crate::animation::TICK_INTERVAL). Returns whether cards
    /// are still moving, i.e. whether the host should keep its timer armed.
    pub fn tick(&mut self) -> bool {
        for card in self.moving.tick(&mut self.cards) {
            let pile = self.cards[card].pile;
            trace!(card = %self.cards[card].face(), %pile, "card arrived");
            self.pile_mut(pile).attach(card);
        }
        !self.moving.is_idle()
    }

    /// Ticks until no card moves. Returns the number of ticks.
    pub fn settle(&mut self) -> usize {
        let mut ticks = 0;
        while !self.moving.is_idle() {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    /// Sends every card of the pile towards its slot.
    pub(crate) fn relayout(&mut self, id: PileId, step: f64) {
        let cards: SmallVec<[CardId; 24]> = self.pile(id).cards().iter().copied().collect();
        for (index, card) in cards.into_iter().enumerate() {
            let slot = self.pile(id).slot(index);
            self.animate(card, slot, step);
        }
    }

    fn animate(&mut self, card: CardId, dest: Point, step: f64) {
        let pile = self.cards[card].pile;
        match self.cards[card].move_to(dest, step) {
            Motion::Started => {
                self.pile_mut(pile).detach(card);
                if self.moving.register(card) {
                    trace!("moving set armed");
                }
            }
            Motion::Retargeted => {}
            Motion::Arrived => self.pile_mut(pile).attach(card),
        }
    }
}

impl Rehome for Board {
    fn rehome(&mut self, cards: &[CardId], pile: PileId, faceup: bool, step: f64) {
        let mut touched: SmallVec<[PileId; 4]> = smallvec![pile];
        for &card in cards {
            let from = self.cards[card].pile;
            if !touched.contains(&from) {
                touched.push(from);
            }
            self.pile_mut(from).remove(card);
            self.pile_mut(pile).push(card);
            let card = &mut self.cards[card];
            card.pile = pile;
            card.flip_card(faceup);
        }
        for id in touched {
            self.relayout(id, step);
        }
    }
}

fn parse_pile_name(name: &str) -> Result<PileId> {
    let index = |rest: &str, limit: usize| -> Result<usize> {
        let i = rest
            .trim()
            .parse::<usize>()
            .with_context(|| format!("Invalid pile index: {rest}"))?;
        if i == 0 || i > limit {
            bail!("Pile index out of range: {i}");
        }
        Ok(i - 1)
    };
    match name {
        "Stock" => Ok(PileId::Stock),
        "Waste" => Ok(PileId::Waste),
        _ => {
            if let Some(rest) = name.strip_prefix("Foundation") {
                Ok(PileId::Foundation(index(rest, 4)?))
            } else if let Some(rest) = name.strip_prefix("Tableau") {
                Ok(PileId::Tableau(index(rest, TOTAL_TABLEAUS)?))
            } else {
                bail!("Unknown pile '{name}'")
            }
        }
    }
}

fn parse_faces(s: &str) -> Result<Vec<Face>> {
    s.split_whitespace().map(Face::parse).collect()
}

fn with_face(faces: Vec<Face>, faceup: bool) -> Vec<(Face, bool)> {
    faces.into_iter().map(|face| (face, faceup)).collect()
}

fn shuffled_deck(seed: u32) -> [Face; MAX_CARD as usize] {
    let mut current_seed = seed;
    let mut rnd = || {
        current_seed = ((current_seed as u64 * 16807) % 0x7fffffff) as u32;
        current_seed
    };
    let mut deck: [Face; MAX_CARD as usize] = std::array::from_fn(|i| Face::new_with_id(i as u8));

    for _ in 0..7 {
        for j in 0..deck.len() {
            let k = (rnd() % MAX_CARD as u32) as usize;
            deck.swap(j, k);
        }
    }

    deck.rotate_left(24);

    let mut orig: i32 = 27;
    for i in 0..7_i32 {
        let mut pos = (i + 1) * (i + 2) / 2 - 1;
        for j in (0..=(6 - i)).rev() {
            if j >= i {
                deck.swap(pos as usize, orig as usize);
            }
            orig -= 1;
            pos += 6 - j + 1;
        }
    }
    deck
}
