// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use thiserror::Error;

use crate::piece::PieceId;
use crate::types::Color;

/// Errors raised by the rules engine when building, executing or undoing a
/// move, or when mutating a position.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    /// The move breaks a rule of chess: wrong geometry, a blocked or
    /// forfeited castle, a bad promotion piece, or no piece to move.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// A piece of the given color tried to move when it was not its turn.
    #[error("{0} moved out of turn")]
    OutOfTurn(Color),

    /// More than one piece fits a short-form move description.
    #[error("ambiguous move: {} pieces fit", .candidates.len())]
    Ambiguous { candidates: Vec<PieceId> },

    /// A move's outcome was queried before it was ever executed.
    #[error("move has not been verified by execution")]
    Unverified,

    /// The board can't accept the operation in its current state.
    #[error("illegal state: {0}")]
    IllegalState(String),
}

/// Possible errors that can arise when parsing a FEN string into a `Board`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FenParseError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("invalid digit in piece placement")]
    InvalidDigit,
    #[error("rank does not sum to eight files")]
    FileDoesNotSumToEight,
    #[error("unknown piece")]
    UnknownPiece,
    #[error("invalid side to move")]
    InvalidSideToMove,
    #[error("invalid castling field")]
    InvalidCastle,
    #[error("invalid en-passant square")]
    InvalidEnPassant,
    #[error("empty halfmove clock")]
    EmptyHalfmove,
    #[error("invalid halfmove clock")]
    InvalidHalfmove,
    #[error("empty fullmove number")]
    EmptyFullmove,
    #[error("invalid fullmove number")]
    InvalidFullmove,
    #[error("invalid position: {0}")]
    InvalidPosition(#[source] MoveError),
}
