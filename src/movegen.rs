// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Raw destination generation for each kind of piece.
//!
//! The sets produced here follow each piece's movement geometry and
//! nothing else: check, pins and king safety are applied afterwards by the
//! board. Pieces of the side *not* to move get sets that describe what they
//! threaten rather than where they could go:
//!
//!  * their pawns attack empty diagonal squares too, and
//!  * their sliding pieces see through the enemy king, so a king can't step
//!    backwards along the line of the piece checking it.
use crate::board::Board;
use crate::geometry;
use crate::piece::PieceId;
use crate::square_set::SquareSet;
use crate::types::{Color, Direction, PieceKind, Square};

/// The sets a piece produces for one ply, before the board trims them.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct RawSets {
    pub destinations: SquareSet,
    pub guards: SquareSet,
    pub quiet: SquareSet,
}

pub(crate) fn generate(board: &Board, id: PieceId) -> RawSets {
    let piece = board.piece(id);
    let square = match piece.square() {
        Some(sq) if !piece.is_captured() => sq,
        _ => return RawSets::default(),
    };

    match piece.kind() {
        PieceKind::Pawn => pawn(board, square, piece.color()),
        PieceKind::Knight => steps(board, geometry::knight_steps(square), piece.color()),
        PieceKind::King => steps(board, geometry::king_steps(square), piece.color()),
        kind => slides(board, square, piece.color(), kind.directions()),
    }
}

/// Knights and kings: a fixed set of squares, each one either a destination
/// or, when a friend stands there, a guard.
fn steps(board: &Board, candidates: SquareSet, color: Color) -> RawSets {
    let mut sets = RawSets::default();
    for sq in candidates {
        match board.occupant(sq) {
            Some(other) if board.piece(other).color() == color => sets.guards.insert(sq),
            _ => sets.destinations.insert(sq),
        }
    }

    sets
}

fn slides(board: &Board, square: Square, color: Color, directions: &[Direction]) -> RawSets {
    let mut sets = RawSets::default();
    let our_turn = board.side_to_move() == color;
    for &dir in directions {
        for sq in geometry::ray(square, dir) {
            let other = match board.occupant(sq) {
                Some(other) => board.piece(other),
                None => {
                    sets.destinations.insert(sq);
                    continue;
                }
            };

            if other.color() == color {
                sets.guards.insert(sq);
                break;
            }

            sets.destinations.insert(sq);
            if our_turn || other.kind() != PieceKind::King {
                break;
            }
        }
    }

    sets
}

fn pawn(board: &Board, square: Square, color: Color) -> RawSets {
    let mut sets = RawSets::default();
    let forward = color.forward();
    let our_turn = board.side_to_move() == color;

    if let Some(one) = square.try_step(0, forward) {
        if board.occupant(one).is_none() {
            sets.destinations.insert(one);
            sets.quiet.insert(one);
            if square.rank() == color.pawn_rank() {
                if let Some(two) = one.try_step(0, forward) {
                    if board.occupant(two).is_none() {
                        sets.destinations.insert(two);
                        sets.quiet.insert(two);
                    }
                }
            }
        }
    }

    for sq in geometry::pawn_attacks(square, color) {
        match board.occupant(sq) {
            Some(other) if board.piece(other).color() == color => sets.guards.insert(sq),
            Some(_) => sets.destinations.insert(sq),
            None if !our_turn => sets.destinations.insert(sq),
            None => {
                if en_passant_victim(board, square, sq, color).is_some() {
                    sets.destinations.insert(sq);
                }
            }
        }
    }

    sets
}

/// If a pawn of `color` on `origin` moving diagonally to the empty square
/// `destination` is an en-passant capture, returns the square of the pawn it
/// captures.
pub(crate) fn en_passant_victim(
    board: &Board,
    origin: Square,
    destination: Square,
    color: Color,
) -> Option<Square> {
    if origin.rank() != color.en_passant_rank()
        || board.en_passant_file() != Some(destination.file())
        || board.side_to_move() != color
    {
        return None;
    }

    let victim_square = Square::of(origin.rank(), destination.file());
    let victim = board.piece(board.occupant(victim_square)?);
    if victim.kind() == PieceKind::Pawn && victim.color() != color {
        Some(victim_square)
    } else {
        None
    }
}
