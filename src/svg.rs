//! Serializes a board into an SVG document.

use crate::board::Board;
use crate::card::{Card, CardId};
use crate::pile::Pile;

use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const TABLE_FILL: &str = "fill:#0b6623";
const SLOT_STYLE: &str = "fill:none; stroke:#d0e0d0; stroke-width:1";
const HIT_RECT_STYLE: &str = "visibility:hidden; pointer-events:fill";

const HELP_LINES: [&str; 6] = [
    "Klondike Solitaire",
    "Click the stock to draw cards",
    "Click a card to send it home",
    "Drag cards between piles",
    "z: undo    r: redo",
    "?: show or hide this help",
];

type XmlWriter = Writer<Cursor<Vec<u8>>>;

pub fn render(board: &Board) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    write_document(&mut writer, board).context("Failed to write SVG document")?;
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).context("SVG document is not valid UTF-8")
}

fn display(visible: bool) -> &'static str {
    if visible {
        "display:inline"
    } else {
        "display:none"
    }
}

fn start(writer: &mut XmlWriter, elem: BytesStart) -> Result<()> {
    writer.write_event(Event::Start(elem))?;
    Ok(())
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn empty(writer: &mut XmlWriter, elem: BytesStart) -> Result<()> {
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

fn write_document(writer: &mut XmlWriter, board: &Board) -> Result<()> {
    let config = board.config();
    let size = config.table_size();
    let (width, height) = (size.width.to_string(), size.height.to_string());
    let view_box = format!("0 0 {width} {height}");

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    start(
        writer,
        BytesStart::new("svg").with_attributes([
            ("xmlns", SVG_NS),
            ("xmlns:xlink", XLINK_NS),
            ("version", "1.1"),
            ("width", width.as_str()),
            ("height", height.as_str()),
            ("viewBox", view_box.as_str()),
        ]),
    )?;
    empty(
        writer,
        BytesStart::new("rect").with_attributes([
            ("id", "table"),
            ("width", "100%"),
            ("height", "100%"),
            ("style", TABLE_FILL),
        ]),
    )?;

    start(writer, BytesStart::new("g").with_attributes([("id", "piles")]))?;
    for pile in board.piles() {
        write_pile(writer, board, pile)?;
    }
    end(writer, "g")?;

    start(writer, BytesStart::new("g").with_attributes([("id", "moving")]))?;
    for card in floating_cards(board) {
        write_card(writer, board, board.card(card))?;
    }
    end(writer, "g")?;

    write_help(writer, board)?;
    write_win(writer, board)?;

    end(writer, "svg")
}

/// Cards detached from every pile: animating ones first, dragged ones on top.
fn floating_cards(board: &Board) -> Vec<CardId> {
    let mut cards: Vec<CardId> = board.moving().iter().collect();
    if let Some(drag) = board.drag() {
        cards.extend(drag.cards.iter().copied());
    }
    cards
}

fn write_pile(writer: &mut XmlWriter, board: &Board, pile: &Pile) -> Result<()> {
    let size = board.config().card_size;
    let id = pile.id().to_string();
    let origin = pile.origin();
    let (x, y) = (origin.x.to_string(), origin.y.to_string());
    let (width, height) = (size.width.to_string(), size.height.to_string());

    start(writer, BytesStart::new("g").with_attributes([("id", id.as_str())]))?;
    empty(
        writer,
        BytesStart::new("rect").with_attributes([
            ("class", "slot"),
            ("x", x.as_str()),
            ("y", y.as_str()),
            ("width", width.as_str()),
            ("height", height.as_str()),
            ("rx", "5"),
            ("style", SLOT_STYLE),
        ]),
    )?;
    for &card in pile.layer() {
        write_card(writer, board, board.card(card))?;
    }
    end(writer, "g")
}

fn write_card(writer: &mut XmlWriter, board: &Board, card: &Card) -> Result<()> {
    let config = board.config();
    let id = format!("card-{}", card.face());
    let transform = card.transform();
    let href = card.href(&config.deck);
    let (width, height) = (
        config.card_size.width.to_string(),
        config.card_size.height.to_string(),
    );

    start(
        writer,
        BytesStart::new("g").with_attributes([
            ("id", id.as_str()),
            ("transform", transform.as_str()),
        ]),
    )?;
    start(
        writer,
        BytesStart::new("svg").with_attributes([
            ("x", "0"),
            ("y", "0"),
            ("width", width.as_str()),
            ("height", height.as_str()),
        ]),
    )?;
    empty(
        writer,
        BytesStart::new("use").with_attributes([
            ("xlink:href", href.as_str()),
            ("x", "0"),
            ("y", "0"),
            ("width", "100%"),
            ("height", "100%"),
        ]),
    )?;
    empty(
        writer,
        BytesStart::new("rect").with_attributes([
            ("x", "0"),
            ("y", "0"),
            ("width", "100%"),
            ("height", "100%"),
            ("style", HIT_RECT_STYLE),
        ]),
    )?;
    end(writer, "svg")?;
    end(writer, "g")
}

fn write_help(writer: &mut XmlWriter, board: &Board) -> Result<()> {
    start(
        writer,
        BytesStart::new("g").with_attributes([
            ("id", "help"),
            ("style", display(board.is_help_visible())),
        ]),
    )?;
    empty(
        writer,
        BytesStart::new("rect").with_attributes([
            ("x", "150"),
            ("y", "200"),
            ("width", "410"),
            ("height", "200"),
            ("rx", "10"),
            ("style", "fill:#ffffe0; stroke:#000000"),
        ]),
    )?;
    for (i, line) in HELP_LINES.iter().enumerate() {
        let y = (240 + i * 28).to_string();
        start(
            writer,
            BytesStart::new("text").with_attributes([
                ("x", "175"),
                ("y", y.as_str()),
                ("style", "font-family:sans-serif; font-size:18px"),
            ]),
        )?;
        writer.write_event(Event::Text(BytesText::new(line)))?;
        end(writer, "text")?;
    }
    end(writer, "g")
}

fn write_win(writer: &mut XmlWriter, board: &Board) -> Result<()> {
    let center_x = (board.config().table_size().width / 2.0).to_string();
    start(
        writer,
        BytesStart::new("g").with_attributes([
            ("id", "win"),
            ("style", display(board.is_win_visible())),
        ]),
    )?;
    start(
        writer,
        BytesStart::new("text").with_attributes([
            ("x", center_x.as_str()),
            ("y", "400"),
            ("text-anchor", "middle"),
            ("style", "font-family:sans-serif; font-size:48px; fill:#ffd700"),
        ]),
    )?;
    writer.write_event(Event::Text(BytesText::new("You won!")))?;
    end(writer, "text")?;
    end(writer, "g")
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::card::Face;
    use crate::config::Config;
    use crate::event::Event as BoardEvent;

    #[test]
    fn test_render_card_fragment() {
        let board = Board::parse("Tableau1: s3 | h7", Config::default()).unwrap();
        let svg = render(&board).unwrap();
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(svg.contains(r#"<g id="card-h7" transform="translate(10,185)">"#));
        assert!(svg.contains(r#"xlink:href="cards.svg#h7""#));
        assert!(svg.contains(r#"xlink:href="cards.svg#card-back""#));
        assert!(svg.contains(HIT_RECT_STYLE));
        assert!(svg.contains(r#"viewBox="0 0 710 750""#));

        // Face-down card comes first in the tableau group.
        let s3 = svg.find("card-s3").unwrap();
        let h7 = svg.find("card-h7").unwrap();
        assert!(s3 < h7);
    }

    #[test]
    fn test_render_overlays() {
        let mut board = Board::parse("Waste: h1", Config::default()).unwrap();
        let svg = render(&board).unwrap();
        assert!(svg.contains(r#"<g id="help" style="display:none">"#));
        assert!(svg.contains(r#"<g id="win" style="display:none">"#));

        board.handle_event(BoardEvent::KeyPress('?'));
        board.won();
        let svg = render(&board).unwrap();
        assert!(svg.contains(r#"<g id="help" style="display:inline">"#));
        assert!(svg.contains(r#"<g id="win" style="display:inline">"#));
    }

    #[test]
    fn test_render_moving_layer() {
        let mut board = Board::parse("Stock: c2 d9", Config::default()).unwrap();
        board.click_stock();
        let svg = render(&board).unwrap();
        let moving = svg.find(r#"<g id="moving">"#).unwrap();
        let d9 = svg.find("card-d9").unwrap();
        assert!(d9 > moving);

        board.settle();
        let svg = render(&board).unwrap();
        let moving = svg.find(r#"<g id="moving">"#).unwrap();
        assert!(svg.find("card-d9").unwrap() < moving);
        assert!(board.find_card(Face::parse("d9").unwrap()).is_some());
    }
}
