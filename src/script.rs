//! Line based event scripts that drive a board without a host UI.
//!
//! ```text
//! # draw, then send the ace home
//! draw
//! click h1
//! key z
//! down 15 190
//! move 120 200
//! up 120 200
//! tick 5
//! settle
//! ```

use crate::board::Board;
use crate::card::Face;
use crate::event::Event;
use crate::geometry::Point;

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Event(Event),
    ClickCard(Face),
    Draw,
    Tick(usize),
    Settle,
}

pub fn parse_script(s: &str) -> Result<Vec<Command>> {
    let mut commands = Vec::new();
    for (number, line) in s.lines().enumerate() {
        let line = match line.split_once('#') {
            Some((code, _)) => code,
            None => line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }
        let line_ctx = || format!("Failed to parse line {}: '{line}'", number + 1);
        commands.push(parse_command(line).with_context(line_ctx)?);
    }
    Ok(commands)
}

fn parse_command(line: &str) -> Result<Command> {
    let mut parts = line.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();
    let command = match (name, args.as_slice()) {
        ("key", [key]) => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Command::Event(Event::KeyPress(c)),
                _ => bail!("Expected a single character, got '{key}'"),
            }
        }
        ("click", [card]) => Command::ClickCard(Face::parse(card)?),
        ("click", [x, y]) => Command::Event(Event::Click(parse_point(x, y)?)),
        ("down", [x, y]) => Command::Event(Event::MouseDown(parse_point(x, y)?)),
        ("move", [x, y]) => Command::Event(Event::MouseMove(parse_point(x, y)?)),
        ("up", [x, y]) => Command::Event(Event::MouseUp(parse_point(x, y)?)),
        ("draw", []) => Command::Draw,
        ("tick", []) => Command::Tick(1),
        ("tick", [n]) => Command::Tick(n.parse::<usize>().context("Invalid tick count")?),
        ("settle", []) => Command::Settle,
        ("key" | "click" | "down" | "move" | "up" | "draw" | "tick" | "settle", _) => {
            bail!("Wrong number of arguments for '{name}'")
        }
        _ => bail!("Unknown command '{name}'"),
    };
    Ok(command)
}

fn parse_point(x: &str, y: &str) -> Result<Point> {
    let x = x.parse::<f64>().with_context(|| format!("Invalid x '{x}'"))?;
    let y = y.parse::<f64>().with_context(|| format!("Invalid y '{y}'"))?;
    Ok(Point::new(x, y))
}

/// Feeds the commands to the board. With `auto_settle` every command runs its
/// animations to completion, as if the host timer fired in between.
pub fn run(board: &mut Board, commands: &[Command], auto_settle: bool) -> Result<()> {
    for (i, command) in commands.iter().enumerate() {
        debug!(step = i + 1, ?command, "run command");
        match *command {
            Command::Event(event) => board.handle_event(event),
            Command::ClickCard(face) => {
                let Some(card) = board.find_card(face) else {
                    bail!("Card '{face}' is not on the board");
                };
                if !board.click_card(card) {
                    warn!(%face, "no move for card");
                }
            }
            Command::Draw => {
                if !board.click_stock() {
                    warn!("stock and waste are empty");
                }
            }
            Command::Tick(n) => {
                for _ in 0..n {
                    if !board.tick() {
                        break;
                    }
                }
            }
            Command::Settle => {
                board.settle();
            }
        }
        if auto_settle && board.drag().is_none() {
            board.settle();
        }
    }
    Ok(())
}
