use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{IsTerminal, Read};
use svg_solitaire::{
    board::Board,
    config::Config,
    geometry::{Point, Viewport},
    script::{parse_script, run},
    svg::render,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a freshly dealt or loaded game
    Render {
        #[command(flatten)]
        game: GameArgs,
    },
    /// Play an event script against the game and render the result
    Play {
        #[command(flatten)]
        game: GameArgs,
        /// Leave animations to explicit `tick`/`settle` commands
        #[arg(long)]
        manual_ticks: bool,
        /// Script to play; read from stdin when omitted
        script: Option<String>,
    },
}

#[derive(Args)]
struct GameArgs {
    /// Seed of the deal; random when omitted
    #[arg(long, value_name = "NUM")]
    seed: Option<u32>,
    /// Cards drawn per stock click
    #[arg(long, default_value_t = 1, value_name = "1|3")]
    draw: usize,
    /// Document referenced for card faces
    #[arg(long, default_value = "cards.svg", value_name = "HREF")]
    deck: String,
    /// Screen pixels per board unit, used to map pointer positions
    #[arg(long, default_value_t = 1.0)]
    scale: f64,
    /// Load the game state from a file instead of dealing
    #[arg(long, value_name = "FILE")]
    file: Option<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Svg)]
    format: Format,
    /// Write to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Svg,
    Text,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Render { game } => {
            let board = load_board(game)?;
            write_output(game, &board)?;
        }
        Commands::Play {
            game,
            manual_ticks,
            script,
        } => {
            let mut board = load_board(game)?;
            let content = read_script(script.as_deref())?;
            let commands = parse_script(&content)?;
            info!(commands = commands.len(), "playing script");
            run(&mut board, &commands, !manual_ticks)?;
            write_output(game, &board)?;
        }
    }

    Ok(())
}

fn load_board(game: &GameArgs) -> Result<Board> {
    let config = Config {
        deck: game.deck.clone(),
        draw_count: game.draw,
        viewport: Viewport {
            scale: game.scale,
            offset: Point::ZERO,
        },
        ..Default::default()
    };
    config.validate()?;
    match &game.file {
        Some(file) => {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read '{file}'"))?;
            Board::parse(&content, config).context("Failed to parse board")
        }
        None => Ok(Board::deal(config, game.seed.unwrap_or_else(rand::random))),
    }
}

fn read_script(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script '{path}'")),
        None => {
            let mut stdin = std::io::stdin();
            if stdin.is_terminal() {
                bail!("The 'play' command requires a script file or a script piped to stdin.");
            }
            let mut content = String::new();
            stdin
                .read_to_string(&mut content)
                .context("Failed to read script from stdin")?;
            Ok(content)
        }
    }
}

fn write_output(game: &GameArgs, board: &Board) -> Result<()> {
    let output = match game.format {
        Format::Svg => render(board)?,
        Format::Text => board.pretty_print(),
    };
    match &game.output {
        Some(path) => {
            std::fs::write(path, output).with_context(|| format!("Failed to write '{path}'"))
        }
        None => {
            println!("{output}");
            Ok(())
        }
    }
}
