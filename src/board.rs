// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::fmt::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::MoveError;
use crate::geometry;
use crate::movegen::{self, RawSets};
use crate::moves::Move;
use crate::piece::{Piece, PieceId};
use crate::square_set::SquareSet;
use crate::types::{CastleSide, CastleStatus, Color, File, PieceKind, Rank, Square, TableIndex};
use crate::types::{CASTLE_SIDES, COLORS, DIRECTIONS, FILES, RANKS, SQUARES};

static NEXT_BOARD_ID: AtomicU64 = AtomicU64::new(1);

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// Events delivered to board listeners, synchronously, after the board has
/// changed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoardEvent {
    Move,
    Unmove,
    TraversalBegin,
    TraversalEnd,
}

pub trait BoardListener: Send + Sync {
    fn board_event(&self, board: &Board, event: BoardEvent);
}

/// Everything needed to describe a position, piece letters first. This is
/// what position importers (FEN, for one) produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardSetup {
    /// Piece letters indexed `[file][rank]`; a space is an empty square.
    pub placement: [[char; 8]; 8],
    pub side_to_move: Color,
    pub castling: CastleStatus,
    pub en_passant_file: Option<File>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl BoardSetup {
    pub fn empty() -> BoardSetup {
        BoardSetup {
            placement: [[' '; 8]; 8],
            side_to_move: Color::White,
            castling: CastleStatus::NONE,
            en_passant_file: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn standard() -> BoardSetup {
        let mut setup = BoardSetup::empty();
        for &file in &FILES {
            let kind = BACK_RANK[file.as_index()];
            setup.placement[file.as_index()][0] = crate::types::piece_char(kind, Color::White);
            setup.placement[file.as_index()][1] = 'P';
            setup.placement[file.as_index()][6] = 'p';
            setup.placement[file.as_index()][7] = crate::types::piece_char(kind, Color::Black);
        }

        setup.castling = CastleStatus::WHITE | CastleStatus::BLACK;
        setup
    }
}

impl Default for BoardSetup {
    fn default() -> Self {
        BoardSetup::empty()
    }
}

/// A castle the board has worked out coordinates for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct CastlePlan {
    pub side: CastleSide,
    pub king: PieceId,
    pub king_from: Square,
    pub king_to: Square,
    pub rook: PieceId,
    pub rook_from: Square,
    pub rook_to: Square,
}

/// What the last regeneration learned about the side to move.
#[derive(Copy, Clone, Debug, Default)]
struct Status {
    has_king: bool,
    checkers: SquareSet,
    legal_moves: u32,
    castles: [Option<CastlePlan>; 2],
}

pub struct Board {
    id: u64,
    pub(crate) grid: [Option<PieceId>; 64],
    pub(crate) pieces: Vec<Piece>,
    rosters: [Vec<PieceId>; 2],
    kings: [Option<PieceId>; 2],
    pub(crate) side_to_move: Color,
    pub(crate) en_passant_file: Option<File>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) played: Vec<(Square, Square)>,
    pub(crate) started: bool,
    status: Status,
    listeners: Vec<Arc<dyn BoardListener>>,
}

//
// Construction and position setup
//

impl Board {
    /// A board with no pieces on it, White to move.
    pub fn empty() -> Board {
        let mut board = Board {
            id: NEXT_BOARD_ID.fetch_add(1, Ordering::Relaxed),
            grid: [None; 64],
            pieces: Vec::new(),
            rosters: [Vec::new(), Vec::new()],
            kings: [None, None],
            side_to_move: Color::White,
            en_passant_file: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            played: Vec::new(),
            started: false,
            status: Status::default(),
            listeners: Vec::new(),
        };
        board.regenerate();
        board
    }

    /// The standard starting position.
    pub fn new() -> Board {
        let mut board = Board::empty();
        for &color in &COLORS {
            for &file in &FILES {
                let back = Square::of(color.back_rank(), file);
                let pawns = Square::of(color.pawn_rank(), file);
                board.spawn(BACK_RANK[file.as_index()], color, back);
                board.spawn(PieceKind::Pawn, color, pawns);
            }
        }

        board.regenerate();
        board
    }

    /// Builds a board from a full description of a position.
    pub fn from_setup(setup: &BoardSetup) -> Result<Board, MoveError> {
        let mut board = Board::empty();
        for &rank in &RANKS {
            for &file in &FILES {
                let letter = setup.placement[file.as_index()][rank.as_index()];
                if letter == ' ' {
                    continue;
                }

                let (kind, color) = crate::types::piece_from_char(letter).ok_or_else(|| {
                    MoveError::IllegalState(format!("unknown piece letter '{}'", letter))
                })?;
                board.place_piece(kind, color, Square::of(rank, file))?;
            }
        }

        board.side_to_move = setup.side_to_move;
        board.en_passant_file = setup.en_passant_file;
        board.halfmove_clock = setup.halfmove_clock;
        board.fullmove_number = setup.fullmove_number;
        for &color in &COLORS {
            for &side in &CASTLE_SIDES {
                let allowed = setup.castling.contains(CastleStatus::mask(color, side));
                board.apply_castle_rights(color, side, allowed)?;
            }
        }

        board.regenerate();
        Ok(board)
    }

    /// Whether this board holds the untouched standard starting position.
    pub fn is_standard_start(&self) -> bool {
        let standard = BoardSetup::standard();
        self.to_char_array() == standard.placement
            && self.side_to_move == Color::White
            && self.castle_status() == standard.castling
            && self.en_passant_file.is_none()
    }

    fn ensure_setup(&self) -> Result<(), MoveError> {
        if self.started {
            return Err(MoveError::IllegalState(
                "position setup after play has begun".to_owned(),
            ));
        }

        Ok(())
    }

    /// Adds a new piece to the arena, the roster and the grid without any
    /// checks or regeneration.
    fn spawn(&mut self, kind: PieceKind, color: Color, square: Square) -> PieceId {
        let id = self.create_piece(kind, color);
        self.rosters[color.as_index()].push(id);
        if kind == PieceKind::King {
            self.kings[color.as_index()] = Some(id);
        }

        self.put(id, square);
        id
    }

    /// Puts a new piece on an empty square.
    pub fn place_piece(
        &mut self,
        kind: PieceKind,
        color: Color,
        square: Square,
    ) -> Result<PieceId, MoveError> {
        self.ensure_setup()?;
        if self.grid[square.as_index()].is_some() {
            return Err(MoveError::IllegalState(format!("{} is occupied", square)));
        }

        if kind == PieceKind::King && self.kings[color.as_index()].is_some() {
            return Err(MoveError::IllegalState(format!("{} already has a king", color)));
        }

        let rank = square.rank();
        if kind == PieceKind::Pawn && (rank == Rank::One || rank == Rank::Eight) {
            return Err(MoveError::IllegalState(format!(
                "pawn can't stand on {}",
                square
            )));
        }

        let id = self.spawn(kind, color, square);
        self.regenerate();
        Ok(id)
    }

    /// Takes the piece on `square` off the board and out of its roster.
    pub fn remove_piece(&mut self, square: Square) -> Result<PieceId, MoveError> {
        self.ensure_setup()?;
        let id = self.grid[square.as_index()]
            .ok_or_else(|| MoveError::IllegalState(format!("{} is empty", square)))?;
        let color = self.pieces[id.0].color;
        self.lift(id);
        self.rosters[color.as_index()].retain(|&other| other != id);
        if self.kings[color.as_index()] == Some(id) {
            self.kings[color.as_index()] = None;
        }

        self.regenerate();
        Ok(id)
    }

    /// Stands a piece of this board on `square`, updating both the grid and
    /// the piece. A captured piece is brought back into play.
    pub fn set_occupant(&mut self, square: Square, id: PieceId) -> Result<(), MoveError> {
        self.ensure_setup()?;
        if id.0 >= self.pieces.len() {
            return Err(MoveError::IllegalState(format!("no piece {}", id)));
        }

        match self.grid[square.as_index()] {
            Some(other) if other == id => return Ok(()),
            Some(_) => return Err(MoveError::IllegalState(format!("{} is occupied", square))),
            None => {}
        }

        let color = self.pieces[id.0].color;
        if !self.rosters[color.as_index()].contains(&id) {
            return Err(MoveError::IllegalState(format!("{} is not in play", id)));
        }

        self.lift(id);
        self.pieces[id.0].captured = false;
        self.put(id, square);
        self.regenerate();
        Ok(())
    }

    pub fn set_side_to_move(&mut self, color: Color) -> Result<(), MoveError> {
        self.ensure_setup()?;
        self.side_to_move = color;
        self.regenerate();
        Ok(())
    }

    pub fn set_en_passant_file(&mut self, file: Option<File>) -> Result<(), MoveError> {
        self.ensure_setup()?;
        self.en_passant_file = file;
        self.regenerate();
        Ok(())
    }

    pub fn set_halfmove_clock(&mut self, clock: u32) -> Result<(), MoveError> {
        self.ensure_setup()?;
        self.halfmove_clock = clock;
        Ok(())
    }

    pub fn set_fullmove_number(&mut self, number: u32) -> Result<(), MoveError> {
        self.ensure_setup()?;
        self.fullmove_number = number;
        Ok(())
    }

    /// Grants or revokes a castling right. Rights live in the move counts of
    /// the king and the castling rook, so granting one resets both counts and
    /// needs a rook to be there.
    pub fn set_castle_rights(
        &mut self,
        color: Color,
        side: CastleSide,
        allowed: bool,
    ) -> Result<(), MoveError> {
        self.ensure_setup()?;
        self.apply_castle_rights(color, side, allowed)?;
        self.regenerate();
        Ok(())
    }

    fn apply_castle_rights(
        &mut self,
        color: Color,
        side: CastleSide,
        allowed: bool,
    ) -> Result<(), MoveError> {
        // Rooks further in than the castling rook count as moved, so that
        // none of them inherits the right once the castling rook leaves.
        let rooks = self.wing_rooks(color, side);
        for &rook in rooks.iter().skip(if allowed { 1 } else { 0 }) {
            self.pieces[rook.0].move_count = self.pieces[rook.0].move_count.max(1);
        }

        if !allowed {
            return Ok(());
        }

        let rook = *rooks.first().ok_or_else(|| {
            MoveError::IllegalState(format!("{} has no rook to castle {:?}", color, side))
        })?;
        let king = self.kings[color.as_index()].ok_or_else(|| {
            MoveError::IllegalState(format!("{} has no king to castle with", color))
        })?;
        self.pieces[king.0].move_count = 0;
        self.pieces[rook.0].move_count = 0;
        Ok(())
    }
}

//
// Low-level mutation used by moves. None of these regenerate.
//

impl Board {
    pub(crate) fn create_piece(&mut self, kind: PieceKind, color: Color) -> PieceId {
        self.pieces.push(Piece::new(kind, color));
        PieceId(self.pieces.len() - 1)
    }

    pub(crate) fn lift(&mut self, id: PieceId) {
        if let Some(sq) = self.pieces[id.0].square.take() {
            if self.grid[sq.as_index()] == Some(id) {
                self.grid[sq.as_index()] = None;
            }
        }
    }

    pub(crate) fn put(&mut self, id: PieceId, square: Square) {
        debug_assert!(self.grid[square.as_index()].is_none());
        self.grid[square.as_index()] = Some(id);
        self.pieces[id.0].square = Some(square);
    }

    pub(crate) fn capture(&mut self, id: PieceId) {
        self.lift(id);
        self.pieces[id.0].captured = true;
    }

    pub(crate) fn uncapture(&mut self, id: PieceId, square: Square) {
        self.pieces[id.0].captured = false;
        self.put(id, square);
    }

    /// Swaps `old` for `new` in place in `old`'s roster, keeping the order.
    pub(crate) fn replace_in_roster(&mut self, old: PieceId, new: PieceId) {
        let color = self.pieces[old.0].color;
        for slot in self.rosters[color.as_index()].iter_mut() {
            if *slot == old {
                *slot = new;
            }
        }
    }
}

//
// Board state getters
//

impl Board {
    /// Identity of this board's piece arena. Clones share it, since piece
    /// ids mean the same thing in a clone.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn en_passant_file(&self) -> Option<File> {
        self.en_passant_file
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Origin and destination of the most recently executed move.
    pub fn last_move(&self) -> Option<(Square, Square)> {
        self.played.last().cloned()
    }

    /// Number of moves currently executed on this board.
    pub fn ply_count(&self) -> usize {
        self.played.len()
    }

    /// Whether a move has ever been executed on this board. Position setup
    /// is refused from then on.
    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn occupant(&self, square: Square) -> Option<PieceId> {
        self.grid[square.as_index()]
    }

    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.0]
    }

    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.occupant(square).map(|id| self.piece(id))
    }

    pub fn king(&self, color: Color) -> Option<PieceId> {
        self.kings[color.as_index()]
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.king(color).and_then(|k| self.pieces[k.0].square)
    }

    /// The team list of a color, in setup order, captured pieces included.
    pub fn roster(&self, color: Color) -> &[PieceId] {
        &self.rosters[color.as_index()]
    }

    pub fn captured_pieces(&self, color: Color) -> Vec<PieceId> {
        self.roster(color)
            .iter()
            .cloned()
            .filter(|&id| self.pieces[id.0].captured)
            .collect()
    }

    pub fn uncaptured_pieces(&self, color: Color) -> Vec<PieceId> {
        self.roster(color)
            .iter()
            .cloned()
            .filter(|&id| !self.pieces[id.0].captured)
            .collect()
    }

    /// Material on the board for one side: pawn 1, knight and bishop 3,
    /// rook 5, queen 9. Kings don't count.
    pub fn material(&self, color: Color) -> u32 {
        self.uncaptured_pieces(color)
            .into_iter()
            .map(|id| self.pieces[id.0].kind.value())
            .sum()
    }

    /// A draw may be claimed once a hundred plies pass without a pawn move
    /// or a capture.
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock > 99
    }

    pub(crate) fn occupancy(&self) -> SquareSet {
        SQUARES
            .iter()
            .cloned()
            .filter(|sq| self.grid[sq.as_index()].is_some())
            .collect()
    }

    /// Piece letters indexed `[file][rank]`, a space for empty squares.
    pub fn to_char_array(&self) -> [[char; 8]; 8] {
        let mut chars = [[' '; 8]; 8];
        for &sq in SQUARES.iter() {
            if let Some(piece) = self.piece_at(sq) {
                chars[sq.file().as_index()][sq.rank().as_index()] = piece.letter();
            }
        }

        chars
    }
}

//
// Castling
//

impl Board {
    /// The rook a king castles with on one wing: the first friendly rook
    /// met walking from that edge of the back rank toward the king.
    pub(crate) fn castle_rook(&self, color: Color, side: CastleSide) -> Option<PieceId> {
        self.wing_rooks(color, side).first().cloned()
    }

    /// The friendly rooks on the back rank between a wing's edge and the
    /// king, edge first.
    fn wing_rooks(&self, color: Color, side: CastleSide) -> Vec<PieceId> {
        let king_square = match self.king_square(color) {
            Some(sq) => sq,
            None => return Vec::new(),
        };

        let back = color.back_rank();
        if king_square.rank() != back {
            return Vec::new();
        }

        let king_file = king_square.file().as_index();
        let files: Vec<usize> = match side {
            CastleSide::Kingside => (king_file + 1..8).rev().collect(),
            CastleSide::Queenside => (0..king_file).collect(),
        };

        files
            .into_iter()
            .filter_map(|file| self.grid[Square::of(back, File::from_index(file)).as_index()])
            .filter(|id| {
                let piece = &self.pieces[id.0];
                piece.color == color && piece.kind == PieceKind::Rook
            })
            .collect()
    }

    /// Whether a side still holds the right to castle on a wing: neither its
    /// king nor that wing's rook has ever moved. Says nothing about whether
    /// the castle is playable right now.
    pub fn can_castle(&self, color: Color, side: CastleSide) -> bool {
        let king = match self.king(color) {
            Some(king) => king,
            None => return false,
        };

        if self.pieces[king.0].move_count != 0 {
            return false;
        }

        match self.castle_rook(color, side) {
            Some(rook) => self.pieces[rook.0].move_count == 0,
            None => false,
        }
    }

    pub fn castle_status(&self) -> CastleStatus {
        let mut status = CastleStatus::NONE;
        for &color in &COLORS {
            for &side in &CASTLE_SIDES {
                if self.can_castle(color, side) {
                    status |= CastleStatus::mask(color, side);
                }
            }
        }

        status
    }

    pub(crate) fn castle_plan(&self, color: Color, side: CastleSide) -> Option<CastlePlan> {
        if !self.can_castle(color, side) {
            return None;
        }

        let king = self.king(color)?;
        let rook = self.castle_rook(color, side)?;
        let back = color.back_rank();
        Some(CastlePlan {
            side,
            king,
            king_from: self.pieces[king.0].square?,
            king_to: Square::of(back, side.king_destination()),
            rook,
            rook_from: self.pieces[rook.0].square?,
            rook_to: Square::of(back, side.rook_destination()),
        })
    }

    /// Whether a castle can be played in the current position: the squares
    /// the king and rook cross and land on hold nothing but the two of them,
    /// and no square the king stands on, crosses or lands on is attacked.
    pub(crate) fn castle_is_legal(&self, plan: &CastlePlan, color: Color) -> bool {
        let travel = |from: Square, to: Square| {
            geometry::squares_between(from, to) | SquareSet::single(to)
        };

        let must_be_clear = travel(plan.king_from, plan.king_to) | travel(plan.rook_from, plan.rook_to);
        for sq in must_be_clear {
            if let Some(id) = self.grid[sq.as_index()] {
                if id != plan.king && id != plan.rook {
                    return false;
                }
            }
        }

        let mut lifted = self.occupancy();
        lifted.remove(plan.king_from);
        lifted.remove(plan.rook_from);
        let king_path = travel(plan.king_from, plan.king_to) | SquareSet::single(plan.king_from);
        king_path
            .iter()
            .all(|sq| !self.is_attacked_with(sq, color.toggle(), lifted))
    }

    /// The castle the side to move may play on a wing this ply, if any.
    pub(crate) fn legal_castle(&self, side: CastleSide) -> Option<CastlePlan> {
        self.status.castles[side_index(side)]
    }

    /// The king destination of every castle the side to move may play.
    pub fn castle_destinations(&self) -> Vec<(CastleSide, Square)> {
        CASTLE_SIDES
            .iter()
            .filter_map(|&side| self.legal_castle(side).map(|plan| (side, plan.king_to)))
            .collect()
    }
}

fn side_index(side: CastleSide) -> usize {
    match side {
        CastleSide::Kingside => 0,
        CastleSide::Queenside => 1,
    }
}

//
// Legal destination generation
//

impl Board {
    /// Rebuilds every piece's destination and guard sets for the current
    /// position and records check, mate and the legal move count of the side
    /// to move. Runs after every change to the position.
    pub(crate) fn regenerate(&mut self) {
        let raw: Vec<RawSets> = (0..self.pieces.len())
            .map(|idx| movegen::generate(self, PieceId(idx)))
            .collect();
        for (piece, sets) in self.pieces.iter_mut().zip(raw) {
            piece.clear_sets();
            piece.destinations = sets.destinations;
            piece.guards = sets.guards;
            piece.quiet = sets.quiet;
        }

        self.status = Status::default();
        let us = self.side_to_move;
        let them = us.toggle();
        let (king, king_square) = match self.king(us) {
            Some(king) => match self.pieces[king.0].square {
                Some(sq) => (king, sq),
                None => {
                    self.status.legal_moves = self.count_legal_moves();
                    return;
                }
            },
            None => {
                self.status.legal_moves = self.count_legal_moves();
                return;
            }
        };

        self.status.has_king = true;
        self.finalize_king(king, them);
        self.adjust_pins_for_check(king_square, them);

        let checkers: SquareSet = self
            .get_threats(king_square, them)
            .into_iter()
            .filter_map(|id| self.pieces[id.0].square)
            .collect();
        self.status.checkers = checkers;
        match checkers.len() {
            0 => {}
            1 => {
                if let Some(checker) = checkers.first() {
                    self.restrict_to_check_resolutions(king, king_square, checker);
                }
            }
            _ => {
                for id in self.rosters[us.as_index()].clone() {
                    if id != king {
                        self.pieces[id.0].destinations = SquareSet::empty();
                    }
                }
            }
        }

        self.drop_exposing_en_passant(king_square);
        if checkers.is_empty() {
            for &side in &CASTLE_SIDES {
                if let Some(plan) = self.castle_plan(us, side) {
                    if self.castle_is_legal(&plan, us) {
                        self.status.castles[side_index(side)] = Some(plan);
                        self.pieces[king.0].castles.insert(plan.king_to);
                    }
                }
            }
        }

        self.status.legal_moves = self.count_legal_moves();
        trace!(
            "regenerated {} legal moves for {} ({} checkers)",
            self.status.legal_moves,
            us,
            checkers.len()
        );
    }

    /// Keeps only the king destinations the opponent neither threatens nor
    /// guards.
    fn finalize_king(&mut self, king: PieceId, them: Color) {
        let safe: SquareSet = self.pieces[king.0]
            .destinations
            .iter()
            .filter(|&sq| !self.is_threatened(sq, them) && !self.is_guarded(sq, them))
            .collect();
        self.pieces[king.0].destinations = safe;
    }

    /// For every enemy slider with exactly one of our pieces between it and
    /// our king, restricts that piece to the line, the pinner's square
    /// included.
    fn adjust_pins_for_check(&mut self, king_square: Square, them: Color) {
        for &enemy in &self.rosters[them.as_index()] {
            let piece = &self.pieces[enemy.0];
            let origin = match piece.square {
                Some(sq) if piece.kind.is_sliding() => sq,
                _ => continue,
            };

            let line = match geometry::line_of_sight(
                origin,
                king_square,
                piece.kind.directions(),
                false,
            ) {
                Some(line) => line,
                None => continue,
            };

            let mut pinned = None;
            let mut blocked = false;
            for &sq in &line[1..] {
                if let Some(id) = self.grid[sq.as_index()] {
                    if pinned.is_some() || self.pieces[id.0].color == them {
                        blocked = true;
                        break;
                    }

                    pinned = Some(id);
                }
            }

            if let (Some(pinned), false) = (pinned, blocked) {
                let allowed: SquareSet = line.iter().cloned().collect();
                self.pieces[pinned.0].destinations &= allowed;
            }
        }
    }

    /// Under a single check, every piece but the king may only capture the
    /// checker (en-passant included) or step between it and the king.
    fn restrict_to_check_resolutions(&mut self, king: PieceId, king_square: Square, checker: Square) {
        let us = self.side_to_move;
        let mut allowed = SquareSet::single(checker);
        if self.piece_at(checker).map_or(false, |p| p.kind.is_sliding()) {
            allowed |= geometry::squares_between(checker, king_square);
        }

        for id in self.rosters[us.as_index()].clone() {
            let piece = &self.pieces[id.0];
            let origin = match piece.square {
                Some(sq) if id != king => sq,
                _ => continue,
            };

            let destinations = piece.destinations;
            let mut kept = destinations & allowed;
            if piece.kind == PieceKind::Pawn {
                for sq in destinations.without(allowed) {
                    if self.grid[sq.as_index()].is_none()
                        && movegen::en_passant_victim(self, origin, sq, us) == Some(checker)
                    {
                        kept.insert(sq);
                    }
                }
            }

            self.pieces[id.0].destinations = kept;
        }
    }

    /// An en-passant capture takes two pawns off one rank at once, which the
    /// one-blocker pin rule can't see. Tries each one out on the occupancy
    /// and drops those that leave the king attacked.
    fn drop_exposing_en_passant(&mut self, king_square: Square) {
        let us = self.side_to_move;
        let occupancy = self.occupancy();
        for id in self.rosters[us.as_index()].clone() {
            let piece = &self.pieces[id.0];
            let origin = match piece.square {
                Some(sq) if piece.kind == PieceKind::Pawn => sq,
                _ => continue,
            };

            let mut destinations = piece.destinations;
            for sq in piece.destinations {
                if sq.file() == origin.file() || self.grid[sq.as_index()].is_some() {
                    continue;
                }

                if let Some(victim) = movegen::en_passant_victim(self, origin, sq, us) {
                    let mut after = occupancy;
                    after.remove(origin);
                    after.remove(victim);
                    after.insert(sq);
                    if self.is_attacked_with(king_square, us.toggle(), after) {
                        destinations.remove(sq);
                    }
                }
            }

            self.pieces[id.0].destinations = destinations;
        }
    }

    /// Whether a piece of color `by` attacks `target` if exactly the squares
    /// in `occupancy` were occupied. Pieces standing outside `occupancy` are
    /// ignored; squares inside it with nobody on them only block.
    pub(crate) fn is_attacked_with(&self, target: Square, by: Color, occupancy: SquareSet) -> bool {
        let attacker = |sq: Square| -> Option<&Piece> {
            if !occupancy.contains(sq) {
                return None;
            }

            self.piece_at(sq).filter(|p| p.color == by)
        };

        for &dir in &DIRECTIONS {
            for sq in geometry::ray(target, dir) {
                if !occupancy.contains(sq) {
                    continue;
                }

                if let Some(piece) = attacker(sq) {
                    if piece.kind.directions().contains(&dir) {
                        return true;
                    }
                }

                break;
            }
        }

        let is_kind = |sq: Square, kind: PieceKind| attacker(sq).map_or(false, |p| p.kind == kind);
        geometry::knight_steps(target)
            .iter()
            .any(|sq| is_kind(sq, PieceKind::Knight))
            || geometry::king_steps(target)
                .iter()
                .any(|sq| is_kind(sq, PieceKind::King))
            || geometry::pawn_attacks(target, by.toggle())
                .iter()
                .any(|sq| is_kind(sq, PieceKind::Pawn))
    }

    fn count_legal_moves(&self) -> u32 {
        let us = self.side_to_move;
        let mut count = 0;
        for &id in &self.rosters[us.as_index()] {
            let piece = &self.pieces[id.0];
            for sq in piece.destinations {
                if piece.kind == PieceKind::Pawn && sq.rank() == us.promotion_rank() {
                    count += 4;
                } else {
                    count += 1;
                }
            }
        }

        count + self.status.castles.iter().filter(|c| c.is_some()).count() as u32
    }

    /// Every legal move of the side to move. Promotions appear once per
    /// promotion piece; castles appear once per wing.
    pub fn legal_moves(&self) -> Vec<Move> {
        let us = self.side_to_move;
        let mut moves = Vec::with_capacity(self.status.legal_moves as usize);
        for &id in &self.rosters[us.as_index()] {
            let piece = &self.pieces[id.0];
            let origin = match piece.square {
                Some(sq) => sq,
                None => continue,
            };

            for sq in piece.destinations {
                if piece.kind == PieceKind::Pawn && sq.rank() == us.promotion_rank() {
                    for &kind in &[
                        PieceKind::Queen,
                        PieceKind::Rook,
                        PieceKind::Bishop,
                        PieceKind::Knight,
                    ] {
                        moves.push(Move::known_legal(self, id, origin, sq, Some(kind), None));
                    }
                } else {
                    moves.push(Move::known_legal(self, id, origin, sq, None, None));
                }
            }
        }

        for &side in &CASTLE_SIDES {
            if let Some(plan) = self.legal_castle(side) {
                moves.push(Move::known_legal(
                    self,
                    plan.king,
                    plan.king_from,
                    plan.king_to,
                    None,
                    Some(side),
                ));
            }
        }

        moves
    }

    pub fn legal_move_count(&self) -> u32 {
        self.status.legal_moves
    }

    pub fn is_check(&self) -> bool {
        !self.status.checkers.is_empty()
    }

    pub fn is_double_check(&self) -> bool {
        self.status.checkers.len() > 1
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_check() && self.status.legal_moves == 0
    }

    pub fn is_stalemate(&self) -> bool {
        self.status.has_king && !self.is_check() && self.status.legal_moves == 0
    }

    /// The pieces giving check to the side to move.
    pub fn checkers(&self) -> Vec<PieceId> {
        self.status
            .checkers
            .iter()
            .filter_map(|sq| self.occupant(sq))
            .collect()
    }
}

//
// Per-piece queries
//

impl Board {
    pub fn is_legal_destination(&self, id: PieceId, square: Square) -> bool {
        self.pieces[id.0].destinations().contains(square)
    }

    pub fn is_legal_attack(&self, id: PieceId, square: Square) -> bool {
        self.pieces[id.0].attacks().contains(square)
    }

    /// For a sliding piece, the squares from it toward `target` along one of
    /// its lines, its own square first and `target` last only when
    /// `inclusive`. `None` for other pieces or when `target` is off its
    /// lines.
    pub fn line_of_sight(&self, id: PieceId, target: Square, inclusive: bool) -> Option<Vec<Square>> {
        let piece = &self.pieces[id.0];
        if !piece.kind.is_sliding() {
            return None;
        }

        geometry::line_of_sight(piece.square?, target, piece.kind.directions(), inclusive)
            .map(|line| line.to_vec())
    }

    /// Every piece of color `by` that attacks `square` this ply.
    pub fn get_threats(&self, square: Square, by: Color) -> Vec<PieceId> {
        self.rosters[by.as_index()]
            .iter()
            .cloned()
            .filter(|&id| self.pieces[id.0].attacks().contains(square))
            .collect()
    }

    pub fn is_threatened(&self, square: Square, by: Color) -> bool {
        self.rosters[by.as_index()]
            .iter()
            .any(|&id| self.pieces[id.0].attacks().contains(square))
    }

    pub fn is_guarded(&self, square: Square, by: Color) -> bool {
        self.rosters[by.as_index()]
            .iter()
            .any(|&id| self.pieces[id.0].guards.contains(square))
    }

    /// Whether naming the origin file alone, or the origin rank alone, is
    /// enough to tell `id` apart from every other piece of its kind and
    /// color that can also reach `destination`. Both are true when no other
    /// piece can. When the rivals can be told apart by file, the rank is
    /// reported as not unique so that notation names the file.
    pub fn disambiguation(&self, id: PieceId, destination: Square) -> (bool, bool) {
        let piece = &self.pieces[id.0];
        let origin = match piece.square {
            Some(sq) => sq,
            None => return (true, true),
        };

        let mut file_unique = true;
        let mut rank_unique = true;
        for &other in &self.rosters[piece.color.as_index()] {
            let rival = &self.pieces[other.0];
            if other == id || rival.kind != piece.kind || rival.captured {
                continue;
            }

            let rival_square = match rival.square {
                Some(sq) if rival.destinations.contains(destination) => sq,
                _ => continue,
            };

            if rival_square.file() == origin.file() {
                file_unique = false;
            }

            if rival_square.rank() == origin.rank() {
                rank_unique = false;
            }

            if file_unique && rank_unique {
                rank_unique = false;
            }
        }

        (file_unique, rank_unique)
    }

    /// Finds the piece of the side to move that a short-form move names:
    /// its kind, optionally its file and rank, and where it goes.
    pub fn get_origin(
        &self,
        kind: PieceKind,
        file: Option<File>,
        rank: Option<Rank>,
        destination: Square,
    ) -> Result<PieceId, MoveError> {
        let candidates: Vec<PieceId> = self.rosters[self.side_to_move.as_index()]
            .iter()
            .cloned()
            .filter(|&id| {
                let piece = &self.pieces[id.0];
                let square = match piece.square {
                    Some(sq) => sq,
                    None => return false,
                };

                piece.kind == kind
                    && piece.destinations().contains(destination)
                    && file.map_or(true, |f| square.file() == f)
                    && rank.map_or(true, |r| square.rank() == r)
            })
            .collect();

        match candidates.len() {
            0 => Err(MoveError::IllegalMove(format!(
                "no {} of {} can reach {}",
                kind, self.side_to_move, destination
            ))),
            1 => Ok(candidates[0]),
            _ => Err(MoveError::Ambiguous { candidates }),
        }
    }
}

//
// Listeners
//

impl Board {
    pub fn add_listener(&mut self, listener: Arc<dyn BoardListener>) {
        self.listeners.push(listener);
    }

    pub fn remove_listener(&mut self, listener: &Arc<dyn BoardListener>) {
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub fn fire(&self, event: BoardEvent) {
        for listener in &self.listeners {
            listener.board_event(self, event);
        }
    }
}

//
// Diagnostics
//

impl Board {
    /// Everything the board knows, as text. Two boards with equal dumps are
    /// indistinguishable to the rules engine.
    pub fn dump(&self) -> String {
        let mut buf = self.to_string();
        let _ = writeln!(&mut buf, "side to move: {}", self.side_to_move);
        let _ = writeln!(&mut buf, "castling: {:?}", self.castle_status());
        let _ = writeln!(&mut buf, "en passant: {:?}", self.en_passant_file);
        let _ = writeln!(
            &mut buf,
            "halfmove: {} fullmove: {}",
            self.halfmove_clock, self.fullmove_number
        );
        let _ = writeln!(&mut buf, "last move: {:?}", self.last_move());
        let _ = writeln!(
            &mut buf,
            "check: {} mate: {} stalemate: {} legal moves: {}",
            self.is_check(),
            self.is_checkmate(),
            self.is_stalemate(),
            self.legal_move_count()
        );
        for &color in &COLORS {
            let _ = write!(&mut buf, "{}:", color);
            for &id in self.roster(color) {
                let piece = &self.pieces[id.0];
                let _ = write!(&mut buf, " {}({})", piece, piece.move_count);
            }

            let _ = writeln!(&mut buf);
        }

        buf
    }
}

//
// Trait implementations
//

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &rank in RANKS.iter().rev() {
            for &file in &FILES {
                if let Some(piece) = self.piece_at(Square::of(rank, file)) {
                    write!(f, " {} ", piece.letter())?;
                } else {
                    write!(f, " . ")?;
                }
            }

            writeln!(f, "| {}", rank)?;
        }

        for _ in &FILES {
            write!(f, "---")?;
        }

        writeln!(f)?;
        for &file in &FILES {
            write!(f, " {} ", file)?;
        }

        writeln!(f)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

impl Clone for Board {
    /// Clones share the arena identity so moves prepared against one can be
    /// played on the other. Listeners are not carried over.
    fn clone(&self) -> Board {
        Board {
            id: self.id,
            grid: self.grid,
            pieces: self.pieces.clone(),
            rosters: self.rosters.clone(),
            kings: self.kings,
            side_to_move: self.side_to_move,
            en_passant_file: self.en_passant_file,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            played: self.played.clone(),
            started: self.started,
            status: self.status,
            listeners: Vec::new(),
        }
    }
}

/// Boards are equal when the same pieces stand on the same squares with the
/// same side to move, castling rights and en-passant file.
impl PartialEq for Board {
    fn eq(&self, other: &Board) -> bool {
        self.side_to_move == other.side_to_move
            && self.en_passant_file == other.en_passant_file
            && self.to_char_array() == other.to_char_array()
            && self.castle_status() == other.castle_status()
    }
}

impl Eq for Board {}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}
