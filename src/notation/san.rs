// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Reading moves written in standard algebraic notation and in the
//! coordinate notation UCI uses. Writing SAN is `Move::san`.
use std::convert::TryFrom;

use regex::Regex;

use crate::board::Board;
use crate::error::MoveError;
use crate::moves::Move;
use crate::types::{CastleSide, File, PieceKind, Rank, Square};

lazy_static! {
    static ref SAN_REGEX: Regex = Regex::new(concat!(
        r"^(?:(O-O-O|0-0-0)|(O-O|0-0)|",
        r"([NBRQK])?([a-h])?([1-8])?(x)?([a-h][1-8])(?:=?([NBRQ]))?)",
        r"[+#]?[!?]*$"
    ))
    .unwrap();
}

fn unreadable(text: &str) -> MoveError {
    MoveError::IllegalMove(format!("can't read move '{}'", text))
}

/// Reads a SAN move against the side to move on `board` and returns it
/// verified. Fails with `Ambiguous` when the text fits more than one piece.
pub fn parse_san(board: &Board, text: &str) -> Result<Move, MoveError> {
    let text = text.trim();
    let caps = SAN_REGEX.captures(text).ok_or_else(|| unreadable(text))?;
    if caps.get(1).is_some() {
        return Move::castle(board, CastleSide::Queenside);
    }

    if caps.get(2).is_some() {
        return Move::castle(board, CastleSide::Kingside);
    }

    let first_char = |idx: usize| caps.get(idx).and_then(|m| m.as_str().chars().next());
    let kind = match first_char(3) {
        Some(c) => PieceKind::from_san_char(c).ok_or_else(|| unreadable(text))?,
        None => PieceKind::Pawn,
    };
    let file = match first_char(4) {
        Some(c) => Some(File::try_from(c).map_err(|_| unreadable(text))?),
        None => None,
    };
    let rank = match first_char(5) {
        Some(c) => Some(Rank::try_from(c).map_err(|_| unreadable(text))?),
        None => None,
    };
    let destination = caps
        .get(7)
        .and_then(|m| Square::try_from(m.as_str()).ok())
        .ok_or_else(|| unreadable(text))?;
    let promotion = match first_char(8) {
        Some(c) => Some(PieceKind::from_san_char(c).ok_or_else(|| unreadable(text))?),
        None => None,
    };

    let piece = board.get_origin(kind, file, rank, destination)?;
    let origin = board
        .piece(piece)
        .square()
        .ok_or_else(|| unreadable(text))?;
    Move::new(board, origin, destination, promotion)
}

/// Reads a move in coordinate notation, like `e2e4` or `e7e8q`. Castles are
/// written as the king's move, to its destination or onto its rook.
pub fn parse_uci(board: &Board, text: &str) -> Result<Move, MoveError> {
    let text = text.trim();
    if text.len() < 4 || text.len() > 5 || !text.is_ascii() {
        return Err(unreadable(text));
    }

    let origin = Square::try_from(&text[0..2]).map_err(|_| unreadable(text))?;
    let destination = Square::try_from(&text[2..4]).map_err(|_| unreadable(text))?;
    let promotion = match text[4..].chars().next() {
        Some(c) => Some(
            PieceKind::from_san_char(c.to_ascii_uppercase()).ok_or_else(|| unreadable(text))?,
        ),
        None => None,
    };

    Move::new(board, origin, destination, promotion)
}
