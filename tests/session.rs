/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{cell::RefCell, collections::VecDeque, io, rc::Rc, time::Duration};

use tadpole::{
    Engine, LineChannel, NewGame, OptionKind, OptionValue, SearchOptions, Side, UciError,
    FEN_STARTPOS_BLACK, FEN_STARTPOS_WHITE,
};
use uci_parser::UciCommand;

/// Everything that crossed the channel, kept outside the engine so it survives `quit`.
#[derive(Debug, Default)]
struct Wire {
    sent: Vec<String>,
    reads: usize,
    closed: bool,
}

/// A pretend engine that understands just enough UCI to be driven through a session.
///
/// Every line it receives is run through `uci_parser`, so anything the client sends must be valid UCI.
#[derive(Debug)]
struct FakeEngine {
    wire: Rc<RefCell<Wire>>,
    handshake: Vec<&'static str>,
    bestmove: &'static str,
    pending: VecDeque<String>,
    /// When set, reads fail with a timeout once `pending` runs dry instead of reporting end-of-stream.
    stall: bool,
}

impl FakeEngine {
    fn new(wire: &Rc<RefCell<Wire>>) -> Self {
        Self {
            wire: Rc::clone(wire),
            handshake: vec![
                "id name Fake 1.0",
                "id author Tadpole Tests",
                "option name Threads type spin default 1 min 1 max 512",
                "option name Ponder type check default false",
                "option name Clear Hash type button",
                "option name Style type combo default Normal var Solid var Normal var Risky",
                "uciok",
            ],
            bestmove: "bestmove e2e4 ponder e7e5",
            pending: VecDeque::new(),
            stall: false,
        }
    }
}

impl LineChannel for FakeEngine {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.wire.borrow_mut().sent.push(line.to_string());

        let cmd = match UciCommand::new(line) {
            Ok(cmd) => cmd,
            Err(e) => panic!("client sent invalid UCI {line:?}: {e:?}"),
        };

        let replies = match cmd {
            UciCommand::Uci => self.handshake.clone(),
            UciCommand::IsReady => vec!["readyok"],
            UciCommand::Go(_) => vec![
                "info depth 1 seldepth 1 score cp 20 nodes 20 pv e2e4",
                "info depth 2 seldepth 2 score cp 15 nodes 80 pv e2e4 e7e5",
                self.bestmove,
            ],
            _ => vec![],
        };

        self.pending.extend(replies.into_iter().map(String::from));
        Ok(())
    }

    fn read_line(&mut self, _timeout: Option<Duration>) -> io::Result<Option<String>> {
        self.wire.borrow_mut().reads += 1;

        match self.pending.pop_front() {
            None if self.stall => Err(io::Error::from(io::ErrorKind::TimedOut)),
            line => Ok(line),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.wire.borrow_mut().closed = true;
        Ok(())
    }
}

fn connect() -> (Engine<FakeEngine>, Rc<RefCell<Wire>>) {
    let wire = Rc::default();
    let engine = Engine::with_channel(FakeEngine::new(&wire)).unwrap();
    (engine, wire)
}

fn last_sent(wire: &Rc<RefCell<Wire>>) -> String {
    wire.borrow().sent.last().cloned().unwrap_or_default()
}

#[test]
fn test_handshake() {
    let (engine, wire) = connect();
    let meta = engine.metadata();

    assert_eq!(wire.borrow().sent, ["uci"]);
    assert_eq!(meta.name, "Fake 1.0");
    assert_eq!(meta.author, "Tadpole Tests");
    assert_eq!(meta.unparsed, 0);

    let names = meta.options.iter().map(|o| o.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["Threads", "Ponder", "Clear Hash", "Style"]);

    let threads = meta.option("Threads").unwrap();
    assert_eq!(threads.kind, OptionKind::Spin);
    assert_eq!(threads.default, Some(OptionValue::Int(1)));
    assert_eq!((threads.min, threads.max), (1, 512));

    let style = meta.option("Style").unwrap();
    assert_eq!(style.vars, ["Solid", "Normal", "Risky"]);
}

#[test]
fn test_handshake_tolerates_junk() {
    let wire = Rc::default();
    let mut fake = FakeEngine::new(&wire);
    fake.handshake = vec![
        "Fake 1.0 by Tadpole Tests",
        "id name Fake 1.0",
        "option name Hash spin default 16",
        "option name Threads type spin default 1 min 1 max 512",
        "uciok",
    ];

    let engine = Engine::with_channel(fake).unwrap();
    assert_eq!(engine.metadata().name, "Fake 1.0");
    assert_eq!(engine.metadata().unparsed, 2);
    assert!(engine.metadata().option("Threads").is_some());
}

#[test]
fn test_set_option() {
    let (mut engine, wire) = connect();

    // Unknown options send nothing
    assert!(!engine.set_option("Hash", 128).unwrap());
    assert_eq!(wire.borrow().sent.len(), 1);

    assert!(engine.set_option("Threads", 4).unwrap());
    assert_eq!(wire.borrow().sent.len(), 2);
    assert_eq!(last_sent(&wire), "setoption name Threads value 4");

    match UciCommand::new(&last_sent(&wire)).unwrap() {
        UciCommand::SetOption { name, value } => {
            assert_eq!(name, "Threads");
            assert_eq!(value.as_deref(), Some("4"));
        }
        other => panic!("expected setoption, got {other:?}"),
    }

    assert!(engine.set_option("Ponder", false).unwrap());
    assert_eq!(last_sent(&wire), "setoption name Ponder value false");

    assert!(engine.set_option("Style", "Risky").unwrap());
    assert_eq!(last_sent(&wire), "setoption name Style value Risky");

    assert!(engine.press_button("Clear Hash").unwrap());
    assert_eq!(last_sent(&wire), "setoption name Clear Hash");

    // Names must match exactly
    assert!(!engine.set_option("threads", 4).unwrap());
    assert_eq!(wire.borrow().sent.len(), 5);
}

#[test]
fn test_is_ready() {
    let (mut engine, wire) = connect();
    assert!(engine.is_ready().unwrap());
    assert_eq!(last_sent(&wire), "isready");
}

#[test]
fn test_algebraic_game() {
    let (mut engine, wire) = connect();

    engine.new_game(NewGame::moves()).unwrap();
    assert!(engine.position().moves().is_empty());
    assert_eq!(wire.borrow().sent[1..], ["ucinewgame", "position startpos"]);

    engine.advance_position("e2e4").unwrap();
    engine.advance_position("d7d6").unwrap();
    assert_eq!(engine.position().moves(), ["e2e4", "d7d6"]);
    assert_eq!(last_sent(&wire), "position startpos moves e2e4 d7d6");

    match UciCommand::new(&last_sent(&wire)).unwrap() {
        UciCommand::Position { fen, moves } => {
            assert!(fen.is_none());
            assert_eq!(moves.len(), 2);
        }
        other => panic!("expected position, got {other:?}"),
    }

    // A new game forgets the old moves
    engine.new_game(NewGame::moves()).unwrap();
    assert!(engine.position().moves().is_empty());
    assert_eq!(last_sent(&wire), "position startpos");
}

#[test]
fn test_fen_game() {
    let (mut engine, wire) = connect();

    engine.new_game(NewGame::fen(Side::White)).unwrap();
    assert_eq!(last_sent(&wire), format!("position fen {FEN_STARTPOS_WHITE}"));

    engine.new_game(NewGame::fen(Side::Black)).unwrap();
    assert_eq!(last_sent(&wire), format!("position fen {FEN_STARTPOS_BLACK}"));

    let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
    engine.advance_position(fen).unwrap();
    assert_eq!(last_sent(&wire), format!("position fen {fen}"));
    assert_eq!(engine.position().fen(), Some(fen));
    assert!(engine.position().moves().is_empty());
}

#[test]
fn test_advance_before_new_game() {
    let (mut engine, wire) = connect();
    let err = engine.advance_position("e2e4").unwrap_err();
    assert!(matches!(err, UciError::NoGame), "{err:?}");
    assert_eq!(wire.borrow().sent.len(), 1);
}

#[test]
fn test_search() {
    let (mut engine, wire) = connect();
    engine.new_game(NewGame::moves()).unwrap();

    let res = engine.search(&SearchOptions::new().movetime(100)).unwrap();
    assert_eq!(res.best, "e2e4");
    assert_eq!(res.ponder, "e7e5");
    assert_eq!(last_sent(&wire), "go movetime 100");

    match UciCommand::new(&last_sent(&wire)).unwrap() {
        UciCommand::Go(opts) => {
            assert_eq!(opts.movetime, Some(Duration::from_millis(100)));
            assert_eq!(opts.wtime, None);
            assert_eq!(opts.depth, None);
            assert_eq!(opts.nodes, None);
        }
        other => panic!("expected go, got {other:?}"),
    }
}

#[test]
fn test_search_clock() {
    let (mut engine, wire) = connect();

    let opts = SearchOptions::new()
        .wtime(60_000)
        .btime(55_000)
        .winc(0)
        .binc(0)
        .depth(20);
    engine.search(&opts).unwrap();
    assert_eq!(last_sent(&wire), "go wtime 60000 btime 55000 depth 20");

    match UciCommand::new(&last_sent(&wire)).unwrap() {
        UciCommand::Go(opts) => {
            assert_eq!(opts.wtime, Some(Duration::from_millis(60_000)));
            assert_eq!(opts.btime, Some(Duration::from_millis(55_000)));
            assert_eq!(opts.winc, None);
            assert_eq!(opts.depth, Some(20));
        }
        other => panic!("expected go, got {other:?}"),
    }
}

#[test]
fn test_search_without_ponder() {
    let wire = Rc::default();
    let mut fake = FakeEngine::new(&wire);
    fake.bestmove = "bestmove d2d4";

    let mut engine = Engine::with_channel(fake).unwrap();
    let res = engine.search(&SearchOptions::new().depth(1)).unwrap();
    assert_eq!(res.best, "d2d4");
    assert_eq!(res.ponder, "");
}

#[test]
fn test_search_protocol_violation() {
    let wire = Rc::default();
    let mut fake = FakeEngine::new(&wire);
    fake.bestmove = "bestmove";

    let mut engine = Engine::with_channel(fake).unwrap();
    let err = engine.search(&SearchOptions::new().depth(1)).unwrap_err();
    assert!(
        matches!(&err, UciError::ProtocolViolation { line } if line == "bestmove"),
        "{err:?}"
    );
}

#[test]
fn test_timeout() {
    let wire = Rc::default();
    let mut fake = FakeEngine::new(&wire);
    fake.stall = true;
    fake.bestmove = "info string thinking very hard";

    let timeout = Duration::from_millis(10);
    let mut engine = Engine::connect(fake, Some(timeout)).unwrap();
    assert_eq!(engine.timeout(), Some(timeout));

    let err = engine.search(&SearchOptions::new().depth(30)).unwrap_err();
    match err {
        UciError::Timeout { marker, after } => {
            assert_eq!(marker, "bestmove");
            assert_eq!(after, timeout);
        }
        other => panic!("expected a timeout, got {other:?}"),
    }

    // The session is still usable afterwards, after an extra `isready` to flush late output
    assert!(engine.is_ready().unwrap());
    let sent = wire.borrow().sent.clone();
    assert_eq!(sent[sent.len() - 3..], ["go depth 30", "isready", "isready"]);
}

#[test]
fn test_quit_invalidates_session() {
    let (mut engine, wire) = connect();
    engine.new_game(NewGame::moves()).unwrap();
    engine.advance_position("e2e4").unwrap();

    engine.quit().unwrap();
    assert_eq!(last_sent(&wire), "quit");
    assert!(wire.borrow().closed);
    assert!(engine.is_terminated());
    assert!(engine.metadata().options.is_empty());
    assert!(engine.metadata().name.is_empty());
    assert!(!engine.position().is_started());

    let (sent, reads) = {
        let wire = wire.borrow();
        (wire.sent.len(), wire.reads)
    };

    fn invalid<T>(res: Result<T, UciError>) -> bool {
        matches!(res, Err(UciError::InvalidSession))
    }

    assert!(invalid(engine.set_option("Threads", 2)));
    assert!(invalid(engine.press_button("Clear Hash")));
    assert!(invalid(engine.is_ready()));
    assert!(invalid(engine.new_game(NewGame::moves())));
    assert!(invalid(engine.advance_position("e7e5")));
    assert!(invalid(engine.search(&SearchOptions::new().depth(1))));
    assert!(invalid(engine.quit()));

    // No I/O happened after quitting
    assert_eq!(wire.borrow().sent.len(), sent);
    assert_eq!(wire.borrow().reads, reads);
}
