use anyhow::Context;
use clap::{Parser, ValueEnum};
use minesweeper_ai::*;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "minesweeper-ai")]
#[command(about = "Autonomous minesweeper player driven by logical inference", long_about = None)]
struct Cli {
    /// Board height
    #[arg(long, default_value_t = 8)]
    height: usize,

    /// Board width
    #[arg(long, default_value_t = 8)]
    width: usize,

    /// Number of mines
    #[arg(long, default_value_t = 8)]
    mines: usize,

    /// Seed for mine placement and guesses
    #[arg(long)]
    seed: Option<u64>,

    /// How subset inference is scheduled
    #[arg(long, value_enum, default_value = "one-per-pass")]
    strategy: StrategyArg,

    /// Number of games to play; more than one prints a summary only
    #[arg(short, long, default_value_t = 1)]
    games: usize,

    /// Pause between moves when watching a single game
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Don't print the board
    #[arg(short, long)]
    quiet: bool,

    /// Cross-check every deduction with a SAT solver
    #[arg(long)]
    audit: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    OnePerPass,
    Exhaustive,
}

impl From<StrategyArg> for SubsetStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::OnePerPass => SubsetStrategy::OnePerPass,
            StrategyArg::Exhaustive => SubsetStrategy::Exhaustive,
        }
    }
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            height: self.height,
            width: self.width,
            mines: self.mines,
            seed: self.seed,
            strategy: self.strategy.into(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    config.validate().context("invalid board")?;

    let mut rng = config.rng();

    if cli.games == 1 {
        let mut session = Session::new(&config, &mut rng)?;
        return watch(&mut session, &mut rng, &cli);
    }

    let (mut won, mut lost) = (0usize, 0usize);
    for game in 0..cli.games {
        let mut session = Session::new(&config, &mut rng)?;
        while session.step(&mut rng)?.is_some() {
            if cli.audit {
                check(&session)?;
            }
        }
        match session.game.game_state {
            GameState::Won => won += 1,
            GameState::Lost => lost += 1,
            GameState::Playing => tracing::warn!(game, "game stalled"),
        }
    }

    tracing::info!(
        games = cli.games,
        won,
        lost,
        win_rate = %format!("{:.1}%", 100.0 * won as f64 / cli.games as f64),
        "done"
    );
    Ok(())
}

fn watch(session: &mut Session, rng: &mut impl rand::Rng, cli: &Cli) -> anyhow::Result<()> {
    println!("--- Autonomous Minesweeper Bot ---");
    println!("Strategy: Prioritize logically safe moves, guess randomly otherwise.");
    if !cli.quiet {
        print_board(session, false);
    }

    while let Some(turn) = session.step(rng)? {
        println!("\n--- Move #{} ---", session.moves);
        match turn.mv {
            Move::Safe(cell) => println!("Logic found a guaranteed safe cell: {cell}"),
            Move::Guess(cell) => println!("No logically safe move found. Guessing {cell}..."),
        }
        if !turn.deductions.is_empty() {
            println!(
                "Deduced {} safe cell(s) and {} mine(s).",
                turn.deductions.safes.len(),
                turn.deductions.mines.len()
            );
        }

        if cli.audit {
            check(session)?;
        }
        if !cli.quiet {
            print_board(session, false);
        }
        thread::sleep(Duration::from_millis(cli.delay_ms));
    }

    println!("\n--- Game Over ---");
    print_board(session, true);
    match session.game.game_state {
        GameState::Won => println!("Result: The bot won!"),
        GameState::Lost => println!("Result: The bot hit a mine and lost."),
        GameState::Playing => println!("Result: The game ended unexpectedly."),
    }
    Ok(())
}

fn check(session: &Session) -> anyhow::Result<()> {
    let report = audit(&session.engine)?;
    if !report.is_sound() {
        anyhow::bail!("unsound deductions at {:?}", report.unsound);
    }
    if !report.missed.is_empty() {
        tracing::debug!(missed = ?report.missed, "solver forces cells the rules left open");
    }
    Ok(())
}

fn print_board(session: &Session, show_mines: bool) {
    let game = &session.game;
    let kb = session.engine.knowledge();

    // Print header
    print!("   ");
    for col in 0..game.width {
        print!("{:^3}", col);
    }
    println!("\n  +{}", "---".repeat(game.width));

    // Print rows
    for row in 0..game.height {
        print!("{:^2}|", row);
        for col in 0..game.width {
            let cell = Cell::new(row, col);
            let display = match game.revealed(cell) {
                Some(n) => format!(" {} ", n),
                None if game.is_flagged(cell) => " F ".to_string(),
                None if show_mines && game.is_mine(cell) => " * ".to_string(),
                None if kb.known_safe().contains(&cell) => " · ".to_string(),
                None => " ■ ".to_string(),
            };
            print!("{}", display);
        }
        println!();
    }
    println!();
}
