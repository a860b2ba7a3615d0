/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Command-line arguments.
mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use simple_logger::SimpleLogger;
use tadpole::{Engine, LineChannel, NewGame, SearchOptions};

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    SimpleLogger::new()
        .with_level(cli.log_level())
        .init()
        .context("Failed to initialize logger")?;

    let mut engine = Engine::spawn(&cli.engine, &cli.engine_args, cli.timeout())
        .with_context(|| format!("Failed to start engine {:?}", cli.engine))?;

    // Quit even if something went wrong along the way
    let res = if cli.info {
        print_info(&engine);
        Ok(())
    } else {
        best_move(&mut engine, &cli)
    };
    let quit = engine.quit().context("Failed to quit engine");

    first_failure(res, quit)
}

/// Combines the outcome of a run with the outcome of quitting afterwards, preferring the run's error.
fn first_failure(run: Result<()>, quit: Result<()>) -> Result<()> {
    run.and(quit)
}

/// Prints the engine's identity and options the way the engine itself declared them.
fn print_info<C: LineChannel>(engine: &Engine<C>) {
    let meta = engine.metadata();
    println!("id name {}", meta.name);
    println!("id author {}", meta.author);

    for opt in &meta.options {
        println!("option {opt}");
    }
}

/// Configures the engine, sets up the requested position, and prints the engine's best move.
fn best_move<C: LineChannel>(engine: &mut Engine<C>, cli: &Cli) -> Result<()> {
    for (name, raw) in &cli.options {
        let Some(opt) = engine.metadata().option(name) else {
            bail!("{:?} has no option named {name:?}", engine.metadata().name);
        };

        // Buttons take no value; everything else is typed by the option's declaration
        if raw.is_empty() {
            engine.press_button(name)?;
        } else {
            let value = opt.typed_value(raw);
            engine.set_option(name, value)?;
        }
    }

    if !engine.is_ready()? {
        bail!("{:?} is not ready", engine.metadata().name);
    }

    if let Some(fen) = &cli.fen {
        engine.new_game(NewGame::fen(cli.side_to_move()))?;
        engine.advance_position(fen)?;
    } else {
        engine.new_game(NewGame::moves())?;
        for mv in &cli.moves {
            engine.advance_position(mv)?;
        }
    }

    let options = SearchOptions::from(cli.limits);
    info!("Searching with `{options}`");

    let bestmove = engine
        .search(&options)
        .context("Engine did not report a best move")?;

    println!("{bestmove}");
    Ok(())
}
