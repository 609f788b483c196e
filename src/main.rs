//! Terminal front-end: play against a UCI engine from the command line.
//!
//! Run with: `cargo run -- --engine stockfish --skill medium`

use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{channel, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use plum_versus::engines::skill_level::SkillLevel;
use plum_versus::game_state::chess_types::color_name;
use plum_versus::interaction::state_machine::GestureOutcome;
use plum_versus::session::config::{HumanSide, SessionConfig};
use plum_versus::session::session::{Session, SessionEvent};
use plum_versus::session::turn_scheduler::TurnOwner;
use plum_versus::utils::render_game_state::render_annotated;
use plum_versus::utils::terminal_commands::{parse_command, TerminalCommand, HELP_TEXT};

const TICK_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Parser, Debug)]
#[command(name = "plum_versus")]
#[command(about = "Play chess against a UCI engine in the terminal")]
struct Args {
    /// UCI engine executable (e.g. stockfish)
    #[arg(long)]
    engine: Option<String>,

    /// Extra argument for the engine; repeat for several
    #[arg(long = "engine-arg")]
    engine_args: Vec<String>,

    /// random, easy, medium, hard, or a search depth
    #[arg(long)]
    skill: Option<SkillLevel>,

    #[arg(long)]
    think_delay_ms: Option<u64>,

    /// 0 waits for the engine forever
    #[arg(long)]
    engine_timeout_ms: Option<u64>,

    /// JSON settings file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Side you play: white or black
    #[arg(long)]
    human: Option<HumanSide>,
}

impl Args {
    fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::default(),
        };
        if let Some(engine) = &self.engine {
            config.engine_command = Some(engine.clone());
        }
        if !self.engine_args.is_empty() {
            config.engine_args = self.engine_args.clone();
        }
        if let Some(skill) = self.skill {
            config.skill_level = skill;
        }
        if let Some(delay) = self.think_delay_ms {
            config.think_delay_ms = delay;
        }
        if let Some(timeout) = self.engine_timeout_ms {
            config.engine_timeout_ms = (timeout > 0).then_some(timeout);
        }
        if let Some(side) = self.human {
            config.human_side = side;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env().add_directive("plum_versus=info".parse()?))
        .init();

    let args = Args::parse();
    let config = args.session_config()?;
    let mut session = Session::start(config, Instant::now());

    match session.engine_name() {
        Some(name) => println!("engine: {name}"),
        None if session.has_engine() => println!("engine started"),
        None => println!("no engine running; the computer plays random moves"),
    }
    println!(
        "you play {}, skill {}. Type 'help' for commands.",
        color_name(session.human_side()),
        session.skill()
    );
    print_board(&session);

    let (line_tx, line_rx) = channel::<String>();
    thread::Builder::new()
        .name("stdin-reader".to_owned())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if line_tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        })?;

    loop {
        match line_rx.try_recv() {
            Ok(line) => {
                if !handle_line(&mut session, &line) {
                    break;
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }

        session.tick(Instant::now());
        report_events(&mut session);
        thread::sleep(TICK_INTERVAL);
    }

    tracing::info!("session closed");
    Ok(())
}

/// Returns false when the user asked to quit.
fn handle_line(session: &mut Session, line: &str) -> bool {
    let command = match parse_command(line) {
        Ok(Some(command)) => command,
        Ok(None) => return true,
        Err(e) => {
            println!("{e}");
            return true;
        }
    };

    let now = Instant::now();
    match command {
        TerminalCommand::Click(square) => {
            let outcome = session.click(square, now);
            describe_gesture(session, outcome);
        }
        TerminalCommand::Drop(from, to) => {
            let outcome = session.drop_piece(from, to, now);
            describe_gesture(session, outcome);
        }
        TerminalCommand::Promote(piece) => {
            let outcome = session.choose_promotion(piece, now);
            describe_gesture(session, outcome);
        }
        TerminalCommand::Cancel => {
            let outcome = session.cancel_promotion();
            describe_gesture(session, outcome);
        }
        TerminalCommand::Mark(square) => {
            session.right_click(square);
            print_board(session);
        }
        TerminalCommand::Undo => {
            if !session.undo(now) {
                println!("nothing to undo");
            }
        }
        TerminalCommand::NewGame => session.new_game(now),
        TerminalCommand::Level(level) => {
            if let Err(e) = session.set_skill(level, now) {
                println!("{e}");
            }
        }
        TerminalCommand::Fen(text) | TerminalCommand::Pgn(text) => {
            if let Err(e) = session.import(&text, now) {
                println!("{e}");
            }
        }
        TerminalCommand::Load(path) => match fs::read_to_string(&path) {
            Ok(text) => {
                if let Err(e) = session.import(&text, now) {
                    println!("{e}");
                }
            }
            Err(e) => println!("{}: {e}", path.display()),
        },
        TerminalCommand::Export => println!("{}", session.export_pgn()),
        TerminalCommand::Board => print_board(session),
        TerminalCommand::Help => println!("{HELP_TEXT}"),
        TerminalCommand::Quit => return false,
    }
    true
}

fn describe_gesture(session: &Session, outcome: GestureOutcome) {
    match outcome {
        GestureOutcome::Ignored if session.turn_owner() == TurnOwner::Engine => {
            println!("the engine is on move");
        }
        GestureOutcome::Ignored if !session.status().is_ongoing() => {
            println!("{}", session.status());
        }
        GestureOutcome::Ignored if session.selection().is_awaiting_promotion() => {
            println!("choose a promotion piece first (promote q|r|b|n, or cancel)");
        }
        GestureOutcome::Ignored => {}
        GestureOutcome::PromotionRequired { from, to } => {
            print_board(session);
            println!("{from}{to}: promote to? (q|r|b|n)");
        }
        GestureOutcome::Rejected { from, to } => {
            println!("{from}{to} is not a legal move");
        }
        // Commits are reported through the event queue.
        GestureOutcome::Commit(_) => {}
        GestureOutcome::Selected(_) | GestureOutcome::Deselected | GestureOutcome::Cancelled => {
            print_board(session);
        }
    }
}

fn report_events(session: &mut Session) {
    let mut redraw = false;
    for event in session.drain_events() {
        match event {
            SessionEvent::MoveCommitted { san, by, .. } => {
                let who = match by {
                    TurnOwner::Human => "you",
                    TurnOwner::Engine => "engine",
                };
                println!("{who}: {san}");
                redraw = true;
            }
            SessionEvent::IllegalMove { mv, reason } => println!("{mv} rejected: {reason}"),
            SessionEvent::GameOver(status) => println!("game over: {status}"),
            SessionEvent::EngineRequested { depth, .. } => println!("engine thinking (depth {depth})..."),
            SessionEvent::EngineProtocolError(message) => println!("engine error: {message}"),
            SessionEvent::EngineStalled { .. } => {
                println!("engine did not answer in time; a random move was played")
            }
            SessionEvent::PositionImported { fen } => {
                println!("imported {fen}");
                redraw = true;
            }
            SessionEvent::NewGame => {
                println!("new game");
                redraw = true;
            }
            SessionEvent::Undone { .. } => {
                println!("move taken back");
                redraw = true;
            }
            SessionEvent::SkillChanged(level) => println!("skill: {level}"),
        }
    }
    if redraw {
        print_board(session);
    }
}

fn print_board(session: &Session) {
    let state = session.snapshot();
    println!("{}", render_annotated(&state, &session.annotations()));
}
