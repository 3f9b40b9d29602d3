// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use chesskit::{Board, CastleSide, CastleStatus, Color, File, Move, MoveError, PieceKind, Square};

fn play(board: &mut Board, origin: Square, destination: Square) -> Move {
    let mut mov = Move::new(board, origin, destination, None).unwrap();
    mov.execute(board).unwrap();
    mov
}

type Snapshot = ([[char; 8]; 8], Color, Option<File>, CastleStatus, u32, u32);

fn snapshot(board: &Board) -> Snapshot {
    (
        board.to_char_array(),
        board.side_to_move(),
        board.en_passant_file(),
        board.castle_status(),
        board.halfmove_clock(),
        board.fullmove_number(),
    )
}

/// Walks the legal move tree, checking that every unexecute restores the
/// position. The full dump is compared only above the last ply.
fn round_trip(board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut nodes = 0;
    for mut mov in board.legal_moves() {
        let before = snapshot(board);
        let dump = if depth > 1 { Some(board.dump()) } else { None };
        mov.execute(board).unwrap();
        nodes += round_trip(board, depth - 1);
        mov.unexecute(board).unwrap();
        assert_eq!(before, snapshot(board), "after unexecuting {}", mov.uci());
        if let Some(dump) = dump {
            assert_eq!(dump, board.dump(), "after unexecuting {}", mov.uci());
        }
    }

    nodes
}

#[test]
fn execute_unexecute_restores_through_depth_4() {
    let mut board = Board::new();
    assert_eq!(197_281, round_trip(&mut board, 4));
    assert!(board.is_standard_start());
}

#[test]
fn tricky_positions_round_trip() {
    for fen in &[
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    ] {
        let mut board = Board::from_fen(fen).unwrap();
        round_trip(&mut board, 2);
        assert_eq!(*fen, board.as_fen());
    }
}

#[test]
fn fools_mate() {
    let mut board = Board::new();
    play(&mut board, Square::F2, Square::F3);
    play(&mut board, Square::E7, Square::E5);
    play(&mut board, Square::G2, Square::G4);
    let mate = play(&mut board, Square::D8, Square::H4);
    assert!(board.is_checkmate());
    assert_eq!(0, board.legal_move_count());
    assert!(board.legal_moves().is_empty());
    assert_eq!(Ok(true), mate.is_checkmate());
    assert_eq!("Qh4#", mate.san());
}

#[test]
fn lone_king_stalemate() {
    let board = Board::from_fen("8/8/1q6/8/8/k7/8/K7 w - - 0 1").unwrap();
    assert!(!board.is_check());
    assert!(board.is_stalemate());
    assert!(!board.is_checkmate());
    assert_eq!(0, board.legal_move_count());
}

#[test]
fn en_passant_capture() {
    let mut board = Board::new();
    play(&mut board, Square::E2, Square::E4);
    play(&mut board, Square::G8, Square::F6);
    play(&mut board, Square::E4, Square::E5);
    play(&mut board, Square::D7, Square::D5);

    let pawn = board.occupant(Square::E5).unwrap();
    assert!(board.piece(pawn).destinations().contains(Square::D6));
    assert!(board.is_legal_destination(pawn, Square::D6));

    let victim = board.occupant(Square::D5).unwrap();
    let before = board.clone();
    let mut mov = Move::new(&board, Square::E5, Square::D6, None).unwrap();
    assert!(mov.is_en_passant());
    assert_eq!(Some(victim), mov.casualty());
    mov.execute(&mut board).unwrap();
    assert_eq!(None, board.occupant(Square::D5));
    assert!(board.piece(victim).is_captured());
    assert_eq!("exd6", mov.san());

    mov.unexecute(&mut board).unwrap();
    assert_eq!(before, board);
    assert_eq!(Some(victim), board.occupant(Square::D5));
}

#[test]
fn en_passant_expires_after_one_ply() {
    let mut board = Board::new();
    play(&mut board, Square::E2, Square::E4);
    play(&mut board, Square::A7, Square::A6);
    play(&mut board, Square::E4, Square::E5);
    play(&mut board, Square::D7, Square::D5);
    play(&mut board, Square::H2, Square::H3);
    play(&mut board, Square::A6, Square::A5);
    match Move::new(&board, Square::E5, Square::D6, None) {
        Err(MoveError::IllegalMove(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn rook_out_and_back_revokes_castling() {
    let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    assert!(Move::new(&board, Square::E1, Square::E3, None).is_err());
    assert!(board.can_castle(Color::White, CastleSide::Kingside));
    assert!(board.can_castle(Color::White, CastleSide::Queenside));

    play(&mut board, Square::H1, Square::H2);
    play(&mut board, Square::A8, Square::B8);
    play(&mut board, Square::H2, Square::H1);
    play(&mut board, Square::B8, Square::A8);
    assert!(!board.can_castle(Color::White, CastleSide::Kingside));
    assert!(board.can_castle(Color::White, CastleSide::Queenside));
    assert!(!board.can_castle(Color::Black, CastleSide::Queenside));
    assert!(board.can_castle(Color::Black, CastleSide::Kingside));
    assert_eq!("r3k2r/8/8/8/8/8/8/R3K2R w Qk - 4 3", board.as_fen());
    assert!(Move::castle(&board, CastleSide::Kingside).is_err());
    assert!(Move::castle(&board, CastleSide::Queenside).is_ok());
}

#[test]
fn pinned_bishop_keeps_pin_line() {
    let board = Board::from_fen("4k3/8/8/8/7b/8/5B2/4K3 w - - 0 1").unwrap();
    let bishop = board.occupant(Square::F2).unwrap();
    let destinations: Vec<Square> = board.piece(bishop).destinations().iter().collect();
    assert_eq!(2, destinations.len());
    assert!(destinations.contains(&Square::G3));
    assert!(destinations.contains(&Square::H4));
    assert!(Move::new(&board, Square::F2, Square::E3, None).is_err());
}

#[test]
fn promotion_defaults_to_queen() {
    let mut board = Board::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
    let mut mov = Move::new(&board, Square::E7, Square::E8, None).unwrap();
    mov.execute(&mut board).unwrap();
    assert_eq!(Some(PieceKind::Queen), mov.promotion());
    assert_eq!(PieceKind::Queen, board.piece_at(Square::E8).unwrap().kind());
    assert_eq!("e8=Q", mov.san());

    mov.unexecute(&mut board).unwrap();
    assert_eq!(PieceKind::Pawn, board.piece_at(Square::E7).unwrap().kind());

    let under = Move::new(&board, Square::E7, Square::E8, Some(PieceKind::Knight)).unwrap();
    assert_eq!("e7e8n", under.uci());
    for &kind in &[PieceKind::King, PieceKind::Pawn] {
        match Move::new(&board, Square::E7, Square::E8, Some(kind)) {
            Err(MoveError::IllegalMove(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}

#[test]
fn every_promotion_is_a_legal_move() {
    let board = Board::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
    let promotions = board
        .legal_moves()
        .into_iter()
        .filter(|mov| mov.origin() == Square::E7)
        .count();
    assert_eq!(4, promotions);
    assert_eq!(board.legal_moves().len() as u32, board.legal_move_count());
}

#[test]
fn ambiguous_knights() {
    let board = Board::from_fen("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1").unwrap();
    match board.get_origin(PieceKind::Knight, None, None, Square::D2) {
        Err(MoveError::Ambiguous { candidates }) => {
            assert_eq!(2, candidates.len());
            assert!(candidates.contains(&board.occupant(Square::B1).unwrap()));
            assert!(candidates.contains(&board.occupant(Square::F1).unwrap()));
        }
        other => panic!("unexpected {:?}", other),
    }

    let knight = board
        .get_origin(PieceKind::Knight, Some(File::B), None, Square::D2)
        .unwrap();
    assert_eq!(Some(knight), board.occupant(Square::B1));

    let mov = Move::new(&board, Square::F1, Square::D2, None).unwrap();
    assert_eq!("Nfd2", mov.san());
}

#[test]
fn chess960_castle_onto_rook_square() {
    let mut board = Board::from_fen("4k3/8/8/8/8/8/8/5KR1 w G - 0 1").unwrap();
    assert!(board.can_castle(Color::White, CastleSide::Kingside));
    assert_eq!(
        vec![(CastleSide::Kingside, Square::G1)],
        board.castle_destinations()
    );

    let before = board.clone();
    let mut mov = Move::new(&board, Square::F1, Square::G1, None).unwrap();
    assert!(mov.is_castle());
    assert_eq!("O-O", mov.san());
    mov.execute(&mut board).unwrap();
    assert_eq!(PieceKind::King, board.piece_at(Square::G1).unwrap().kind());
    assert_eq!(PieceKind::Rook, board.piece_at(Square::F1).unwrap().kind());
    assert!(!board.can_castle(Color::White, CastleSide::Kingside));

    mov.unexecute(&mut board).unwrap();
    assert_eq!(before, board);
    assert_eq!(before.dump(), board.dump());
}

#[test]
fn chess960_queenside_with_adjacent_rook() {
    let mut board = Board::from_fen("4k3/8/8/8/8/8/8/RK6 w A - 0 1").unwrap();
    let mut mov = Move::castle(&board, CastleSide::Queenside).unwrap();
    assert_eq!(Square::C1, mov.destination());
    mov.execute(&mut board).unwrap();
    assert_eq!(PieceKind::King, board.piece_at(Square::C1).unwrap().kind());
    assert_eq!(PieceKind::Rook, board.piece_at(Square::D1).unwrap().kind());
    assert_eq!(None, board.occupant(Square::A1));
    assert_eq!(None, board.occupant(Square::B1));
    assert_eq!("O-O-O", mov.san());
}

#[test]
fn castling_through_check_is_refused() {
    let board = Board::from_fen("4k3/8/8/8/8/8/5r2/R3K2R w KQ - 0 1").unwrap();
    assert_eq!(
        vec![(CastleSide::Queenside, Square::C1)],
        board.castle_destinations()
    );
    assert!(Move::castle(&board, CastleSide::Kingside).is_err());
}

#[test]
fn moves_out_of_turn_are_refused() {
    let board = Board::new();
    match Move::new(&board, Square::E7, Square::E5, None) {
        Err(MoveError::OutOfTurn(Color::Black)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn outcome_is_unverified_until_played() {
    let board = Board::new();
    let mov = Move::prepare(&board, Square::E2, Square::E4, None).unwrap();
    assert_eq!(Err(MoveError::Unverified), mov.is_check());
}

#[test]
fn random_games_unwind_to_the_start() {
    for seed in 0..4 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = Board::new();
        let mut played = Vec::new();
        for _ in 0..120 {
            let moves = board.legal_moves();
            assert_eq!(moves.len() as u32, board.legal_move_count());
            let mut mov = match moves.choose(&mut rng) {
                Some(mov) => mov.clone(),
                None => break,
            };

            let mover = board.side_to_move();
            mov.execute(&mut board).unwrap();
            let king = board.king_square(mover).unwrap();
            assert!(!board.is_threatened(king, mover.toggle()), "{} left its king in check", mov);
            played.push(mov);
        }

        while let Some(mut mov) = played.pop() {
            mov.unexecute(&mut board).unwrap();
        }

        assert!(board.is_standard_start());
        assert_eq!(Board::new(), board);
    }
}
