// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#[macro_use]
extern crate clap;

use std::fs::File;
use std::io::Read;
use std::process;
use std::time::Instant;

use clap::{App, Arg, ArgMatches, SubCommand};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use chesskit::notation::{read_pgn, write_pgn, PgnGame, START_FEN};
use chesskit::record::GameRecord;
use chesskit::{load_suite, perft, perft_divide, Board, GameResult, History};

fn fen_arg() -> Arg<'static, 'static> {
    Arg::with_name("FEN")
        .help("FEN string for a board position")
        .index(1)
}

fn main() {
    env_logger::init();
    let matches = App::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .subcommand(
            SubCommand::with_name("perft")
                .about("PERFT analysis of board positions")
                .arg(fen_arg().required(true))
                .arg(
                    Arg::with_name("depth")
                        .help("Depth of move tree to search")
                        .value_name("DEPTH")
                        .short("-d")
                        .long("--depth")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("divide")
                        .help("Split the final count by root move")
                        .long("--divide"),
                ),
        )
        .subcommand(
            SubCommand::with_name("moves")
                .about("Lists the legal moves of a position")
                .arg(fen_arg()),
        )
        .subcommand(
            SubCommand::with_name("suite")
                .about("Runs a CSV perft suite (fen,depth,nodes)")
                .arg(
                    Arg::with_name("FILE")
                        .help("CSV file of perft cases")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            SubCommand::with_name("random")
                .about("Plays a random game and prints it as PGN")
                .arg(
                    Arg::with_name("seed")
                        .help("Seed for the move picker")
                        .value_name("SEED")
                        .long("--seed")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("plies")
                        .help("Maximum number of plies to play")
                        .value_name("PLIES")
                        .long("--plies")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("pgn")
                .about("Converts the games of a PGN file to JSON records")
                .arg(
                    Arg::with_name("FILE")
                        .help("PGN file to load games from")
                        .required(true)
                        .index(1),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("perft", Some(matches)) => run_perft(matches),
        ("moves", Some(matches)) => run_moves(matches),
        ("suite", Some(matches)) => run_suite(matches),
        ("random", Some(matches)) => run_random(matches),
        ("pgn", Some(matches)) => run_pgn(matches),
        _ => {
            println!("{}", matches.usage());
            process::exit(1);
        }
    }
}

fn load_board(matches: &ArgMatches) -> Board {
    let fen = matches.value_of("FEN").unwrap_or(START_FEN);
    match Board::from_fen(fen) {
        Ok(board) => board,
        Err(e) => {
            println!("invalid fen: {}", e);
            process::exit(1);
        }
    }
}

fn run_perft(matches: &ArgMatches) -> ! {
    let depth = value_t!(matches, "depth", u32).unwrap_or(1);
    let board = load_board(matches);

    println!("fen:   {}", board.as_fen());
    println!("depth: {}", depth);
    println!();
    println!("{}", board);
    println!();
    if matches.is_present("divide") {
        let split = match perft_divide(&board, depth) {
            Ok(split) => split,
            Err(e) => {
                println!("perft failed: {}", e);
                process::exit(1);
            }
        };

        let mut moves: Vec<_> = split.into_iter().collect();
        moves.sort();
        let total: u64 = moves.iter().map(|(_, nodes)| nodes).sum();
        for (mov, nodes) in moves {
            println!("{}: {}", mov, nodes);
        }

        println!();
        println!("total: {}", total);
        process::exit(0);
    }

    for i in 1..depth + 1 {
        let start = Instant::now();
        let results = match perft(&board, i) {
            Ok(nodes) => nodes,
            Err(e) => {
                println!("perft({}) failed: {}", i, e);
                process::exit(1);
            }
        };
        let ms = start.elapsed().as_millis();
        println!("perft({}) = {} ({} ms)", i, results, ms);
    }

    process::exit(0);
}

fn run_moves(matches: &ArgMatches) -> ! {
    let board = load_board(matches);
    println!("{}", board);
    println!();
    let mut moves = board.legal_moves();
    moves.sort_by_key(|mov| mov.uci());
    for mov in &moves {
        println!("{:<8} {}", mov.san(), mov.uci());
    }

    println!();
    println!("{} legal moves", board.legal_move_count());
    if board.is_checkmate() {
        println!("checkmate");
    } else if board.is_stalemate() {
        println!("stalemate");
    } else if board.is_check() {
        println!("check");
    }

    process::exit(0);
}

fn run_suite(matches: &ArgMatches) -> ! {
    let cases = match load_suite(matches.value_of("FILE").unwrap()) {
        Ok(cases) => cases,
        Err(e) => {
            println!("could not read suite: {}", e);
            process::exit(1);
        }
    };

    let mut failures = 0;
    for case in &cases {
        let board = match Board::from_fen(&case.fen) {
            Ok(board) => board,
            Err(e) => {
                println!("FAIL {} ({})", case.fen, e);
                failures += 1;
                continue;
            }
        };

        let start = Instant::now();
        match perft(&board, case.depth) {
            Ok(nodes) if nodes == case.nodes => {
                println!(
                    " ok  {} depth {} = {} ({} ms)",
                    case.fen,
                    case.depth,
                    nodes,
                    start.elapsed().as_millis()
                );
            }
            Ok(nodes) => {
                println!(
                    "FAIL {} depth {}: expected {}, got {}",
                    case.fen, case.depth, case.nodes, nodes
                );
                failures += 1;
            }
            Err(e) => {
                println!("FAIL {} depth {} ({})", case.fen, case.depth, e);
                failures += 1;
            }
        }
    }

    println!();
    println!("{} of {} cases passed", cases.len() - failures, cases.len());
    process::exit(if failures == 0 { 0 } else { 1 });
}

fn run_random(matches: &ArgMatches) -> ! {
    let seed = value_t!(matches, "seed", u64).unwrap_or_else(|_| rand::random());
    let plies = value_t!(matches, "plies", usize).unwrap_or(200);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut history = History::new(Board::new());
    let mut result = None;
    for _ in 0..plies {
        let board = history.board();
        if board.is_checkmate() {
            result = Some(GameResult::win_for(board.side_to_move().toggle()));
            break;
        }

        if board.is_stalemate() || board.is_fifty_move_draw() {
            result = Some(GameResult::Draw);
            break;
        }

        let moves = board.legal_moves();
        let mov = match moves.choose(&mut rng) {
            Some(mov) => mov.clone(),
            None => break,
        };

        if let Err(e) = history.add(mov) {
            println!("random game stopped: {}", e);
            process::exit(1);
        }
    }

    if let Err(e) = history.rewind() {
        println!("could not rewind: {}", e);
        process::exit(1);
    }

    let mut game = PgnGame::new(history);
    game.set_tag("Event", "Random game");
    game.set_tag("Seed", seed.to_string());
    game.result = result;
    print!("{}", write_pgn(&game));
    process::exit(0);
}

fn run_pgn(matches: &ArgMatches) -> ! {
    let mut file = File::open(matches.value_of("FILE").unwrap()).unwrap();
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).unwrap();
    let contents = String::from_utf8_lossy(&buf);

    let games = match read_pgn(&contents) {
        Ok(games) => games,
        Err(e) => {
            println!("could not read PGN: {}", e);
            process::exit(1);
        }
    };

    for game in &games {
        let record = GameRecord::from_history(&game.history, game.result);
        match record.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                println!("could not write record: {}", e);
                process::exit(1);
            }
        }
    }

    process::exit(0);
}
