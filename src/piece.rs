// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::fmt;

use crate::square_set::SquareSet;
use crate::types::{self, Color, PieceKind, Square};

/// Index of a piece in its board's piece arena. Ids stay valid for the
/// lifetime of the board (and its clones); captured and promoted-away pieces
/// keep their slot so moves can put them back.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub(crate) usize);

impl PieceId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A piece owned by a board.
#[derive(Clone, Debug)]
pub struct Piece {
    pub(crate) kind: PieceKind,
    pub(crate) color: Color,
    pub(crate) captured: bool,
    pub(crate) move_count: u32,
    pub(crate) square: Option<Square>,

    // Per-ply sets, rebuilt by the board after every change of position.
    pub(crate) destinations: SquareSet,
    pub(crate) guards: SquareSet,
    pub(crate) quiet: SquareSet,
    pub(crate) castles: SquareSet,
}

impl Piece {
    pub(crate) fn new(kind: PieceKind, color: Color) -> Piece {
        Piece {
            kind,
            color,
            captured: false,
            move_count: 0,
            square: None,
            destinations: SquareSet::empty(),
            guards: SquareSet::empty(),
            quiet: SquareSet::empty(),
            castles: SquareSet::empty(),
        }
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    /// The square this piece stands on, or `None` once it is off the board.
    pub fn square(&self) -> Option<Square> {
        self.square
    }

    pub fn is_on_board(&self) -> bool {
        self.square.is_some()
    }

    /// Squares this piece may move to this ply, castling hops included.
    pub fn destinations(&self) -> SquareSet {
        self.destinations | self.castles
    }

    /// Friendly-occupied squares this piece could recapture on.
    pub fn guards(&self) -> SquareSet {
        self.guards
    }

    /// Destinations that are also attacks: pawn pushes and castling hops
    /// are left out.
    pub fn attacks(&self) -> SquareSet {
        self.destinations.without(self.quiet)
    }

    pub fn letter(&self) -> char {
        types::piece_char(self.kind, self.color)
    }

    pub(crate) fn clear_sets(&mut self) {
        self.destinations = SquareSet::empty();
        self.guards = SquareSet::empty();
        self.quiet = SquareSet::empty();
        self.castles = SquareSet::empty();
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.square {
            Some(sq) => write!(f, "{}{}", self.letter(), sq),
            None if self.captured => write!(f, "{}x", self.letter()),
            None => write!(f, "{}-", self.letter()),
        }
    }
}
