// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A chess rules engine and game model. A `Board` owns the pieces and knows
//! every legal move of the side to move; a `Move` is a reversible command
//! against a board; a `History` is a tree of moves with variations that
//! drives the board back and forth through them.

#[macro_use]
extern crate num_derive;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate pest_derive;
#[macro_use]
extern crate serde_derive;

mod board;
mod error;
mod geometry;
mod history;
mod movegen;
mod moves;
pub mod notation;
mod perft;
mod piece;
pub mod record;
mod square_set;
mod types;

pub use board::{Board, BoardEvent, BoardListener, BoardSetup};
pub use error::{FenParseError, MoveError};
pub use history::{ContinuationList, History, NodeId};
pub use moves::Move;
pub use perft::{load_suite, perft, perft_divide, PerftCase};
pub use piece::{Piece, PieceId};
pub use square_set::{SquareSet, SquareSetIterator};
pub use types::{
    CastleSide, CastleStatus, Color, Direction, File, GameResult, PieceKind, Rank, Square,
};
pub use types::{CASTLE_SIDES, COLORS, FILES, PIECE_KINDS, RANKS, SQUARES};
