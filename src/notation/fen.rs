// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Forsyth-Edwards Notation. Castling fields accept the usual `KQkq` as well
//! as Shredder/X-FEN rook file letters for Chess960 positions.
use std::convert::TryFrom;
use std::fmt::Write;
use std::iter::Peekable;
use std::str::Chars;

use crate::board::{Board, BoardSetup};
use crate::error::FenParseError;
use crate::types::{self, CastleSide, CastleStatus, Color, File, PieceKind, Rank, Square};
use crate::types::{TableIndex, FILES, RANKS};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

type Stream<'a> = Peekable<Chars<'a>>;

fn eat(iter: &mut Stream, expected: char) -> Result<(), FenParseError> {
    match iter.next() {
        Some(c) if c == expected => Ok(()),
        Some(c) => Err(FenParseError::UnexpectedChar(c)),
        None => Err(FenParseError::UnexpectedEnd),
    }
}

fn advance(iter: &mut Stream) {
    let _ = iter.next();
}

fn peek(iter: &mut Stream) -> Result<char, FenParseError> {
    iter.peek().cloned().ok_or(FenParseError::UnexpectedEnd)
}

fn eat_placement(iter: &mut Stream, setup: &mut BoardSetup) -> Result<(), FenParseError> {
    for &rank in RANKS.iter().rev() {
        let mut file = File::A as usize;
        while file <= File::H as usize {
            let c = peek(iter)?;
            // digits 1 through 8 indicate empty squares.
            if c.is_digit(10) {
                if c < '1' || c > '8' {
                    return Err(FenParseError::InvalidDigit);
                }

                file += c as usize - '0' as usize;
                if file > 8 {
                    return Err(FenParseError::FileDoesNotSumToEight);
                }

                advance(iter);
                continue;
            }

            if types::piece_from_char(c).is_none() {
                return Err(FenParseError::UnknownPiece);
            }

            setup.placement[file][rank.as_index()] = c;
            advance(iter);
            file += 1;
        }

        if rank != Rank::One {
            eat(iter, '/')?;
        }
    }

    Ok(())
}

fn eat_side_to_move(iter: &mut Stream) -> Result<Color, FenParseError> {
    let side = match peek(iter)? {
        'w' => Color::White,
        'b' => Color::Black,
        _ => return Err(FenParseError::InvalidSideToMove),
    };

    advance(iter);
    Ok(side)
}

/// Which wing a Shredder-style rook file names, judged by the king's file.
fn castle_side_for_file(
    setup: &BoardSetup,
    color: Color,
    rook_file: File,
) -> Result<CastleSide, FenParseError> {
    let back = color.back_rank().as_index();
    let king = types::piece_char(PieceKind::King, color);
    let king_file = FILES
        .iter()
        .find(|f| setup.placement[f.as_index()][back] == king)
        .ok_or(FenParseError::InvalidCastle)?;
    if rook_file > *king_file {
        Ok(CastleSide::Kingside)
    } else if rook_file < *king_file {
        Ok(CastleSide::Queenside)
    } else {
        Err(FenParseError::InvalidCastle)
    }
}

fn eat_castle_status(iter: &mut Stream, setup: &BoardSetup) -> Result<CastleStatus, FenParseError> {
    if peek(iter)? == '-' {
        advance(iter);
        return Ok(CastleStatus::NONE);
    }

    let mut status = CastleStatus::NONE;
    for _ in 0..4 {
        let c = peek(iter)?;
        let mask = match c {
            'K' => CastleStatus::WHITE_KINGSIDE,
            'k' => CastleStatus::BLACK_KINGSIDE,
            'Q' => CastleStatus::WHITE_QUEENSIDE,
            'q' => CastleStatus::BLACK_QUEENSIDE,
            ' ' => break,
            _ => {
                let color = if c.is_ascii_uppercase() {
                    Color::White
                } else {
                    Color::Black
                };
                let file = File::try_from(c.to_ascii_lowercase())
                    .map_err(|_| FenParseError::InvalidCastle)?;
                CastleStatus::mask(color, castle_side_for_file(setup, color, file)?)
            }
        };

        status |= mask;
        advance(iter);
    }

    Ok(status)
}

fn eat_en_passant(iter: &mut Stream, side_to_move: Color) -> Result<Option<File>, FenParseError> {
    let c = peek(iter)?;
    if c == '-' {
        advance(iter);
        return Ok(None);
    }

    let file = File::try_from(c).map_err(|_| FenParseError::InvalidEnPassant)?;
    advance(iter);
    let rank = Rank::try_from(peek(iter)?).map_err(|_| FenParseError::InvalidEnPassant)?;
    advance(iter);
    let expected = match side_to_move {
        Color::White => Rank::Six,
        Color::Black => Rank::Three,
    };

    if rank != expected {
        return Err(FenParseError::InvalidEnPassant);
    }

    Ok(Some(file))
}

fn eat_halfmove(iter: &mut Stream) -> Result<u32, FenParseError> {
    let mut buf = String::new();
    loop {
        let c = peek(iter)?;
        if !c.is_digit(10) {
            break;
        }

        buf.push(c);
        advance(iter);
    }

    if buf.is_empty() {
        return Err(FenParseError::EmptyHalfmove);
    }

    buf.parse::<u32>()
        .map_err(|_| FenParseError::InvalidHalfmove)
}

fn eat_fullmove(iter: &mut Stream) -> Result<u32, FenParseError> {
    let mut buf = String::new();
    for ch in iter {
        if !ch.is_digit(10) {
            break;
        }

        buf.push(ch);
    }

    if buf.is_empty() {
        return Err(FenParseError::EmptyFullmove);
    }

    buf.parse::<u32>()
        .map_err(|_| FenParseError::InvalidFullmove)
}

/// Parses a FEN string into a position description without building a
/// board.
pub fn parse_fen(fen: &str) -> Result<BoardSetup, FenParseError> {
    let mut setup = BoardSetup::empty();
    let iter = &mut fen.trim().chars().peekable();
    eat_placement(iter, &mut setup)?;
    eat(iter, ' ')?;
    setup.side_to_move = eat_side_to_move(iter)?;
    eat(iter, ' ')?;
    setup.castling = eat_castle_status(iter, &setup)?;
    eat(iter, ' ')?;
    setup.en_passant_file = eat_en_passant(iter, setup.side_to_move)?;
    eat(iter, ' ')?;
    setup.halfmove_clock = eat_halfmove(iter)?;
    eat(iter, ' ')?;
    setup.fullmove_number = eat_fullmove(iter)?;
    Ok(setup)
}

impl Board {
    /// Constructs a new board from a FEN representation of a position.
    pub fn from_fen<S: AsRef<str>>(fen: S) -> Result<Board, FenParseError> {
        let setup = parse_fen(fen.as_ref())?;
        Board::from_setup(&setup).map_err(FenParseError::InvalidPosition)
    }

    pub fn as_fen(&self) -> String {
        let mut buf = String::new();
        let placement = self.to_char_array();
        for &rank in RANKS.iter().rev() {
            let mut empty_squares = 0;
            for &file in &FILES {
                let c = placement[file.as_index()][rank.as_index()];
                if c == ' ' {
                    empty_squares += 1;
                    continue;
                }

                if empty_squares != 0 {
                    let _ = write!(&mut buf, "{}", empty_squares);
                }

                buf.push(c);
                empty_squares = 0;
            }

            if empty_squares != 0 {
                let _ = write!(&mut buf, "{}", empty_squares);
            }

            if rank != Rank::One {
                buf.push('/');
            }
        }

        buf.push(' ');
        match self.side_to_move() {
            Color::White => buf.push('w'),
            Color::Black => buf.push('b'),
        }

        buf.push(' ');
        let castling = self.castle_status();
        if castling.is_empty() {
            buf.push('-');
        }

        for &(mask, c) in &[
            (CastleStatus::WHITE_KINGSIDE, 'K'),
            (CastleStatus::WHITE_QUEENSIDE, 'Q'),
            (CastleStatus::BLACK_KINGSIDE, 'k'),
            (CastleStatus::BLACK_QUEENSIDE, 'q'),
        ] {
            if castling.contains(mask) {
                buf.push(c);
            }
        }

        buf.push(' ');
        match self.en_passant_file() {
            Some(file) => {
                let rank = match self.side_to_move() {
                    Color::White => Rank::Six,
                    Color::Black => Rank::Three,
                };
                let _ = write!(&mut buf, "{}", Square::of(rank, file));
            }
            None => buf.push('-'),
        }

        let _ = write!(
            &mut buf,
            " {} {}",
            self.halfmove_clock(),
            self.fullmove_number()
        );
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MoveError;
    use crate::types::SQUARES;

    #[test]
    fn fen_smoke() {
        let board = Board::from_fen("8/8/8/8/8/8/8/8 w - - 0 0").unwrap();

        // white's turn to move.
        assert_eq!(Color::White, board.side_to_move());

        // no castling.
        assert!(board.castle_status().is_empty());

        // no en passant.
        assert!(board.en_passant_file().is_none());

        // both clocks are zero.
        assert_eq!(0, board.halfmove_clock());
        assert_eq!(0, board.fullmove_number());
    }

    #[test]
    fn starting_position() {
        let board = Board::from_fen(START_FEN).unwrap();
        assert_eq!(Board::new(), board);
        assert!(board.is_standard_start());
        for &sq in SQUARES.iter() {
            let rank = sq.rank();
            let occupied = rank == Rank::One || rank == Rank::Two || rank == Rank::Seven || rank == Rank::Eight;
            assert_eq!(occupied, board.occupant(sq).is_some(), "{}", sq);
        }

        assert_eq!(START_FEN, board.as_fen());
    }

    #[test]
    fn round_trip() {
        for fen in &[
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2",
            "4k3/8/8/8/3Pp3/8/8/4K3 b - d3 0 1",
        ] {
            assert_eq!(*fen, Board::from_fen(fen).unwrap().as_fen());
        }
    }

    #[test]
    fn shredder_castling() {
        let board = Board::from_fen("1r2k1r1/8/8/8/8/8/8/1R2K1R1 w GBgb - 0 1").unwrap();
        assert!(board.can_castle(Color::White, CastleSide::Kingside));
        assert!(board.can_castle(Color::White, CastleSide::Queenside));
        assert!(board.can_castle(Color::Black, CastleSide::Kingside));
        assert_eq!("1r2k1r1/8/8/8/8/8/8/1R2K1R1 w KQkq - 0 1", board.as_fen());
    }

    #[test]
    fn empty() {
        let err = Board::from_fen("").unwrap_err();
        assert_eq!(FenParseError::UnexpectedEnd, err);
    }

    #[test]
    fn unknown_piece() {
        let err = Board::from_fen("z7/8/8/8/8/8/8/8 w - - 0 0").unwrap_err();
        assert_eq!(FenParseError::UnknownPiece, err);
    }

    #[test]
    fn invalid_digit() {
        let err = Board::from_fen("9/8/8/8/8/8/8/8 w - - 0 0").unwrap_err();
        assert_eq!(FenParseError::InvalidDigit, err);
    }

    #[test]
    fn not_sum_to_8() {
        let err = Board::from_fen("pppp5/8/8/8/8/8/8/8 w - - 0 0").unwrap_err();
        assert_eq!(FenParseError::FileDoesNotSumToEight, err);
    }

    #[test]
    fn bad_side_to_move() {
        let err = Board::from_fen("8/8/8/8/8/8/8/8 c - - 0 0").unwrap_err();
        assert_eq!(FenParseError::InvalidSideToMove, err);
    }

    #[test]
    fn bad_castle_status() {
        let err = Board::from_fen("8/8/8/8/8/8/8/8 w a - 0 0").unwrap_err();
        assert_eq!(FenParseError::InvalidCastle, err);
    }

    #[test]
    fn bad_en_passant() {
        let err = Board::from_fen("8/8/8/8/8/8/8/8 w - 88 0 0").unwrap_err();
        assert_eq!(FenParseError::InvalidEnPassant, err);
        let err = Board::from_fen("8/8/8/8/8/8/8/8 w - e3 0 0").unwrap_err();
        assert_eq!(FenParseError::InvalidEnPassant, err);
    }

    #[test]
    fn empty_halfmove() {
        let err = Board::from_fen("8/8/8/8/8/8/8/8 w - - q 0").unwrap_err();
        assert_eq!(FenParseError::EmptyHalfmove, err);
    }

    #[test]
    fn invalid_halfmove() {
        let err = Board::from_fen("8/8/8/8/8/8/8/8 w - - 4294967296 0").unwrap_err();
        assert_eq!(FenParseError::InvalidHalfmove, err);
    }

    #[test]
    fn empty_fullmove() {
        let err = Board::from_fen("8/8/8/8/8/8/8/8 w - - 0 q").unwrap_err();
        assert_eq!(FenParseError::EmptyFullmove, err);
    }

    #[test]
    fn fullmove_early_end() {
        let err = Board::from_fen("8/8/8/8/8/8/8/8 w - - 0").unwrap_err();
        assert_eq!(FenParseError::UnexpectedEnd, err);
    }

    #[test]
    fn invalid_fullmove() {
        let err = Board::from_fen("8/8/8/8/8/8/8/8 w - - 0 4294967296").unwrap_err();
        assert_eq!(FenParseError::InvalidFullmove, err);
    }

    #[test]
    fn invalid_position() {
        let err = Board::from_fen("4k3/8/8/8/8/8/8/4K2K w - - 0 1").unwrap_err();
        match err {
            FenParseError::InvalidPosition(MoveError::IllegalState(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        let err = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w K - 0 1").unwrap_err();
        match err {
            FenParseError::InvalidPosition(MoveError::IllegalState(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
