// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::fmt::{self, Write};

use crate::board::{Board, BoardEvent};
use crate::error::MoveError;
use crate::movegen;
use crate::piece::PieceId;
use crate::types::{
    CastleSide, Color, File, GameResult, PieceKind, Square, TableIndex, CASTLE_SIDES,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct CastleRook {
    rook: PieceId,
    from: Square,
    to: Square,
}

/// What the position looked like right after the move was first played.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct Outcome {
    check: bool,
    double_check: bool,
    checkmate: bool,
    stalemate: bool,
}

/// A single move, bound to the board (arena) it was built against. A move
/// can be executed and unexecuted any number of times, as long as each
/// unexecute undoes the move most recently executed on the board.
#[derive(Clone, Debug)]
pub struct Move {
    board_id: u64,
    piece: PieceId,
    kind: PieceKind,
    color: Color,
    origin: Square,
    destination: Square,
    promotion: Option<PieceKind>,
    promoted: Option<PieceId>,
    castle: Option<CastleSide>,
    castle_rook: Option<CastleRook>,
    casualty: Option<PieceId>,
    casualty_square: Option<Square>,
    prev_en_passant: Option<File>,
    prev_halfmove: u32,
    prev_fullmove: u32,
    file_unique: bool,
    rank_unique: bool,
    outcome: Option<Outcome>,
    executed: bool,
    verified: bool,
}

impl Move {
    fn build(
        board: &Board,
        piece: PieceId,
        origin: Square,
        destination: Square,
        promotion: Option<PieceKind>,
        castle: Option<CastleSide>,
    ) -> Move {
        let p = board.piece(piece);
        let (file_unique, rank_unique) = board.disambiguation(piece, destination);
        let mut mov = Move {
            board_id: board.id(),
            piece,
            kind: p.kind(),
            color: p.color(),
            origin,
            destination,
            promotion,
            promoted: None,
            castle,
            castle_rook: None,
            casualty: None,
            casualty_square: None,
            prev_en_passant: board.en_passant_file(),
            prev_halfmove: board.halfmove_clock(),
            prev_fullmove: board.fullmove_number(),
            file_unique,
            rank_unique,
            outcome: None,
            executed: false,
            verified: false,
        };

        if let Some((casualty, square)) = mov.find_casualty(board) {
            mov.casualty = Some(casualty);
            mov.casualty_square = Some(square);
        }

        if let Some(side) = castle {
            mov.castle_rook = board.castle_plan(mov.color, side).map(|plan| CastleRook {
                rook: plan.rook,
                from: plan.rook_from,
                to: plan.rook_to,
            });
        }

        mov
    }

    /// A move taken from a board's own legal move list.
    pub(crate) fn known_legal(
        board: &Board,
        piece: PieceId,
        origin: Square,
        destination: Square,
        promotion: Option<PieceKind>,
        castle: Option<CastleSide>,
    ) -> Move {
        let mut mov = Move::build(board, piece, origin, destination, promotion, castle);
        mov.verified = true;
        mov
    }

    /// Builds a move from `origin` to `destination` without checking that it
    /// is legal. Execution checks it.
    ///
    /// A king moving onto one of its castle squares, onto its own castling
    /// rook, or two or more files along its back rank onto the g- or c-file
    /// is read as a castle.
    pub fn prepare(
        board: &Board,
        origin: Square,
        destination: Square,
        promotion: Option<PieceKind>,
    ) -> Result<Move, MoveError> {
        let id = board
            .occupant(origin)
            .ok_or_else(|| MoveError::IllegalMove(format!("no piece on {}", origin)))?;
        let piece = board.piece(id);
        if let Some(kind) = promotion {
            if !kind.is_promotion_target() {
                return Err(MoveError::IllegalMove(format!("can't promote to {}", kind)));
            }

            if piece.kind() != PieceKind::Pawn
                || destination.rank() != piece.color().promotion_rank()
            {
                return Err(MoveError::IllegalMove(format!(
                    "{}{} is not a promotion",
                    origin, destination
                )));
            }
        }

        if piece.kind() == PieceKind::King {
            if let Some((side, king_to)) = castle_intent(board, id, origin, destination) {
                return Ok(Move::build(board, id, origin, king_to, None, Some(side)));
            }
        }

        Ok(Move::build(board, id, origin, destination, promotion, None))
    }

    /// Builds a move and verifies it by playing it out on a scratch copy of
    /// the board. Listeners of `board` hear nothing.
    pub fn new(
        board: &Board,
        origin: Square,
        destination: Square,
        promotion: Option<PieceKind>,
    ) -> Result<Move, MoveError> {
        let mut mov = Move::prepare(board, origin, destination, promotion)?;
        mov.verify(board)?;
        Ok(mov)
    }

    /// A verified castle for the side to move.
    pub fn castle(board: &Board, side: CastleSide) -> Result<Move, MoveError> {
        let color = board.side_to_move();
        let king = board
            .king(color)
            .ok_or_else(|| MoveError::IllegalMove(format!("{} has no king", color)))?;
        let origin = board
            .piece(king)
            .square()
            .ok_or_else(|| MoveError::IllegalMove(format!("{} has no king", color)))?;
        let destination = Square::of(color.back_rank(), side.king_destination());
        let mut mov = Move::build(board, king, origin, destination, None, Some(side));
        mov.verify(board)?;
        Ok(mov)
    }

    fn verify(&mut self, board: &Board) -> Result<(), MoveError> {
        let mut scratch = board.clone();
        self.execute(&mut scratch)?;
        self.unexecute(&mut scratch)?;
        debug_assert_eq!(board.dump(), scratch.dump());
        self.promoted = None;
        Ok(())
    }

    fn find_casualty(&self, board: &Board) -> Option<(PieceId, Square)> {
        if self.castle.is_some() {
            return None;
        }

        if let Some(id) = board.occupant(self.destination) {
            if board.piece(id).color() != self.color {
                return Some((id, self.destination));
            }

            return None;
        }

        if self.kind == PieceKind::Pawn && self.origin.file() != self.destination.file() {
            let square = movegen::en_passant_victim(board, self.origin, self.destination, self.color)?;
            return board.occupant(square).map(|id| (id, square));
        }

        None
    }

    /// Plays the move on `board`, then notifies its listeners.
    pub fn execute(&mut self, board: &mut Board) -> Result<(), MoveError> {
        if board.id() != self.board_id {
            return Err(MoveError::IllegalState(
                "move belongs to another board".to_owned(),
            ));
        }

        if self.executed {
            return Err(MoveError::IllegalState(format!("{} is already executed", self)));
        }

        if board.occupant(self.origin) != Some(self.piece) {
            return Err(MoveError::IllegalMove(format!(
                "{} is not on {}",
                self.piece, self.origin
            )));
        }

        if board.side_to_move() != self.color {
            return Err(MoveError::OutOfTurn(self.color));
        }

        match self.castle {
            Some(side) => {
                let plan = board
                    .legal_castle(side)
                    .filter(|plan| plan.king_to == self.destination)
                    .ok_or_else(|| {
                        MoveError::IllegalMove(format!("{} can't castle {}", self.color, side))
                    })?;
                self.castle_rook = Some(CastleRook {
                    rook: plan.rook,
                    from: plan.rook_from,
                    to: plan.rook_to,
                });
            }
            None => {
                if !board.piece(self.piece).destinations.contains(self.destination) {
                    return Err(MoveError::IllegalMove(format!(
                        "{} can't move from {} to {}",
                        self.kind, self.origin, self.destination
                    )));
                }
            }
        }

        if self.kind == PieceKind::Pawn && self.destination.rank() == self.color.promotion_rank() {
            self.promotion.get_or_insert(PieceKind::Queen);
        }

        let (file_unique, rank_unique) = board.disambiguation(self.piece, self.destination);
        self.file_unique = file_unique;
        self.rank_unique = rank_unique;
        let casualty = self.find_casualty(board);
        self.casualty = casualty.map(|(id, _)| id);
        self.casualty_square = casualty.map(|(_, sq)| sq);

        self.prev_en_passant = board.en_passant_file;
        self.prev_halfmove = board.halfmove_clock;
        self.prev_fullmove = board.fullmove_number;
        let rank_delta =
            self.destination.rank().as_index() as i32 - self.origin.rank().as_index() as i32;
        board.en_passant_file = if self.kind == PieceKind::Pawn && rank_delta.abs() == 2 {
            Some(self.origin.file())
        } else {
            None
        };

        if self.kind == PieceKind::Pawn || self.casualty.is_some() {
            board.halfmove_clock = 0;
        } else {
            board.halfmove_clock += 1;
        }

        if let Some(casualty) = self.casualty {
            board.capture(casualty);
        }

        match self.castle_rook {
            Some(rook) if self.castle.is_some() => {
                board.lift(self.piece);
                board.lift(rook.rook);
                board.put(self.piece, self.destination);
                board.put(rook.rook, rook.to);
                board.pieces[rook.rook.index()].move_count += 1;
            }
            _ => {
                board.lift(self.piece);
                board.put(self.piece, self.destination);
            }
        }

        board.pieces[self.piece.index()].move_count += 1;
        if let Some(kind) = self.promotion {
            let promoted = match self.promoted {
                Some(id) if is_orphan(board, id, kind, self.color) => id,
                _ => board.create_piece(kind, self.color),
            };

            board.lift(self.piece);
            board.put(promoted, self.destination);
            board.pieces[promoted.index()].move_count = 1;
            board.replace_in_roster(self.piece, promoted);
            self.promoted = Some(promoted);
        }

        board.side_to_move = self.color.toggle();
        if self.color == Color::Black {
            board.fullmove_number += 1;
        }

        board.played.push((self.origin, self.destination));
        board.regenerate();
        if self.outcome.is_none() {
            self.outcome = Some(Outcome {
                check: board.is_check(),
                double_check: board.is_double_check(),
                checkmate: board.is_checkmate(),
                stalemate: board.is_stalemate(),
            });
        }

        self.executed = true;
        self.verified = true;
        board.started = true;
        debug!("executed {} ({}{})", self, self.origin, self.destination);
        board.fire(BoardEvent::Move);
        Ok(())
    }

    /// Takes back the move. It must be the last move played on `board`.
    pub fn unexecute(&mut self, board: &mut Board) -> Result<(), MoveError> {
        if board.id() != self.board_id {
            return Err(MoveError::IllegalState(
                "move belongs to another board".to_owned(),
            ));
        }

        if !self.executed {
            return Err(MoveError::IllegalState(format!("{} is not executed", self)));
        }

        if board.last_move() != Some((self.origin, self.destination)) {
            return Err(MoveError::IllegalState(format!(
                "{} is not the last move played",
                self
            )));
        }

        board.played.pop();
        board.side_to_move = self.color;
        if let Some(promoted) = self.promoted {
            board.lift(promoted);
            board.replace_in_roster(promoted, self.piece);
            board.put(self.piece, self.destination);
        }

        board.pieces[self.piece.index()].move_count -= 1;
        match self.castle_rook {
            Some(rook) if self.castle.is_some() => {
                board.lift(self.piece);
                board.lift(rook.rook);
                board.put(self.piece, self.origin);
                board.put(rook.rook, rook.from);
                board.pieces[rook.rook.index()].move_count -= 1;
            }
            _ => {
                board.lift(self.piece);
                board.put(self.piece, self.origin);
            }
        }

        if let (Some(casualty), Some(square)) = (self.casualty, self.casualty_square) {
            board.uncapture(casualty, square);
        }

        board.en_passant_file = self.prev_en_passant;
        board.halfmove_clock = self.prev_halfmove;
        board.fullmove_number = self.prev_fullmove;
        board.regenerate();
        self.executed = false;
        debug!("unexecuted {} ({}{})", self, self.origin, self.destination);
        board.fire(BoardEvent::Unmove);
        Ok(())
    }
}

/// A piece left over from an earlier execution of a promotion that can be
/// put back on the board.
fn is_orphan(board: &Board, id: PieceId, kind: PieceKind, color: Color) -> bool {
    if id.index() >= board.pieces.len() {
        return false;
    }

    let piece = board.piece(id);
    piece.kind() == kind
        && piece.color() == color
        && !piece.is_on_board()
        && !piece.is_captured()
        && !board.roster(color).contains(&id)
}

/// Reads a king move as a castle, returning the wing and where the king
/// lands.
fn castle_intent(
    board: &Board,
    king: PieceId,
    origin: Square,
    destination: Square,
) -> Option<(CastleSide, Square)> {
    let piece = board.piece(king);
    if piece.destinations.contains(destination) {
        return None;
    }

    if let Some(&(side, to)) = board
        .castle_destinations()
        .iter()
        .find(|&&(_, to)| to == destination)
    {
        return Some((side, to));
    }

    let color = piece.color();
    let back = color.back_rank();
    if origin.rank() != back || destination.rank() != back {
        return None;
    }

    if let Some(occupant) = board.occupant(destination) {
        return CASTLE_SIDES
            .iter()
            .find(|&&side| board.castle_rook(color, side) == Some(occupant))
            .map(|&side| (side, Square::of(back, side.king_destination())));
    }

    let distance =
        (destination.file().as_index() as i32 - origin.file().as_index() as i32).abs();
    if distance < 2 {
        return None;
    }

    CASTLE_SIDES
        .iter()
        .find(|&&side| side.king_destination() == destination.file())
        .map(|&side| (side, destination))
}

//
// Move state getters
//

impl Move {
    pub fn origin(&self) -> Square {
        self.origin
    }

    pub fn destination(&self) -> Square {
        self.destination
    }

    pub fn piece(&self) -> PieceId {
        self.piece
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn promotion(&self) -> Option<PieceKind> {
        self.promotion
    }

    pub fn castle_side(&self) -> Option<CastleSide> {
        self.castle
    }

    pub fn is_castle(&self) -> bool {
        self.castle.is_some()
    }

    /// The piece this move captures, as of when it was built or last
    /// executed.
    pub fn casualty(&self) -> Option<PieceId> {
        self.casualty
    }

    pub fn is_capture(&self) -> bool {
        self.casualty.is_some()
    }

    pub fn is_en_passant(&self) -> bool {
        self.casualty_square.map_or(false, |sq| sq != self.destination)
    }

    pub fn board_id(&self) -> u64 {
        self.board_id
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    fn outcome(&self) -> Result<Outcome, MoveError> {
        self.outcome.ok_or(MoveError::Unverified)
    }

    pub fn is_check(&self) -> Result<bool, MoveError> {
        self.outcome().map(|o| o.check)
    }

    pub fn is_double_check(&self) -> Result<bool, MoveError> {
        self.outcome().map(|o| o.double_check)
    }

    pub fn is_checkmate(&self) -> Result<bool, MoveError> {
        self.outcome().map(|o| o.checkmate)
    }

    pub fn is_stalemate(&self) -> Result<bool, MoveError> {
        self.outcome().map(|o| o.stalemate)
    }

    /// How the game ends with this move, if it does.
    pub fn result(&self) -> Result<Option<GameResult>, MoveError> {
        let outcome = self.outcome()?;
        if outcome.checkmate {
            Ok(Some(GameResult::win_for(self.color)))
        } else if outcome.stalemate {
            Ok(Some(GameResult::Draw))
        } else {
            Ok(None)
        }
    }

    /// Standard algebraic notation for this move. The check suffix is only
    /// present once the move has been played at least once.
    pub fn san(&self) -> String {
        let mut buf = String::new();
        if let Some(side) = self.castle {
            let _ = write!(&mut buf, "{}", side);
        } else if self.kind == PieceKind::Pawn {
            if self.is_capture() {
                let _ = write!(&mut buf, "{}x", self.origin.file());
            }

            let _ = write!(&mut buf, "{}", self.destination);
            if let Some(kind) = self.promotion {
                if let Some(c) = kind.san_char() {
                    let _ = write!(&mut buf, "={}", c);
                }
            }
        } else {
            if let Some(c) = self.kind.san_char() {
                buf.push(c);
            }

            match (self.file_unique, self.rank_unique) {
                (true, true) => {}
                (true, false) => {
                    let _ = write!(&mut buf, "{}", self.origin.file());
                }
                (false, true) => {
                    let _ = write!(&mut buf, "{}", self.origin.rank());
                }
                (false, false) => {
                    let _ = write!(&mut buf, "{}", self.origin);
                }
            }

            if self.is_capture() {
                buf.push('x');
            }

            let _ = write!(&mut buf, "{}", self.destination);
        }

        match self.outcome {
            Some(o) if o.checkmate => buf.push('#'),
            Some(o) if o.check => buf.push('+'),
            _ => {}
        }

        buf
    }

    /// The piece a pawn turns into, counting the default queen for a
    /// promoting move built without a choice.
    fn promotion_piece(&self) -> Option<PieceKind> {
        if self.kind == PieceKind::Pawn && self.destination.rank() == self.color.promotion_rank() {
            Some(self.promotion.unwrap_or(PieceKind::Queen))
        } else {
            None
        }
    }

    /// Whether both moves play the same thing on the board: same squares,
    /// same promotion piece and the same castle.
    pub(crate) fn plays_same(&self, other: &Move) -> bool {
        self == other
            && self.castle == other.castle
            && self.promotion_piece() == other.promotion_piece()
    }

    /// Long algebraic (UCI) notation: origin, destination and promotion. A
    /// castle whose king does not travel two files is written as the king
    /// moving onto its rook.
    pub fn uci(&self) -> String {
        let file_distance = (self.destination.file().as_index() as i32
            - self.origin.file().as_index() as i32)
            .abs();
        let destination = match self.castle_rook {
            Some(rook) if self.castle.is_some() && file_distance != 2 => rook.from,
            _ => self.destination,
        };
        let mut buf = format!("{}{}", self.origin, destination);
        if let Some(kind) = self.promotion {
            let _ = write!(&mut buf, "{}", kind);
        }

        buf
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.san())
    }
}

/// Moves are equal when they go from the same square to the same square.
impl PartialEq for Move {
    fn eq(&self, other: &Move) -> bool {
        self.origin == other.origin && self.destination == other.destination
    }
}

impl Eq for Move {}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    fn play(board: &mut Board, origin: Square, destination: Square) -> Move {
        let mut mov = Move::new(board, origin, destination, None).unwrap();
        mov.execute(board).unwrap();
        mov
    }

    mod execution {
        use super::*;

        #[test]
        fn double_push_sets_en_passant_file() {
            let mut board = Board::new();
            play(&mut board, Square::E2, Square::E4);
            assert_eq!(Some(File::E), board.en_passant_file());
            assert_eq!(Color::Black, board.side_to_move());
            assert_eq!(1, board.fullmove_number());
            assert_eq!(0, board.halfmove_clock());
            assert_eq!(Some((Square::E2, Square::E4)), board.last_move());
        }

        #[test]
        fn fullmove_advances_after_black() {
            let mut board = Board::new();
            play(&mut board, Square::G1, Square::F3);
            play(&mut board, Square::G8, Square::F6);
            assert_eq!(2, board.fullmove_number());
            assert_eq!(2, board.halfmove_clock());
        }

        #[test]
        fn unexecute_restores_position() {
            let mut board = Board::new();
            let before = board.dump();
            let mut mov = play(&mut board, Square::E2, Square::E4);
            mov.unexecute(&mut board).unwrap();
            assert_eq!(before, board.dump());
            assert!(!mov.is_executed());
            assert!(mov.is_verified());
        }

        #[test]
        fn out_of_turn() {
            let board = Board::new();
            match Move::new(&board, Square::E7, Square::E5, None) {
                Err(MoveError::OutOfTurn(Color::Black)) => {}
                other => panic!("unexpected {:?}", other),
            }
        }

        #[test]
        fn foreign_board_rejected() {
            let board = Board::new();
            let mut other = Board::new();
            let mut mov = Move::new(&board, Square::E2, Square::E4, None).unwrap();
            match mov.execute(&mut other) {
                Err(MoveError::IllegalState(_)) => {}
                other => panic!("unexpected {:?}", other),
            }
        }

        #[test]
        fn clone_accepts_moves_of_original() {
            let board = Board::new();
            let mut copy = board.clone();
            let mut mov = Move::new(&board, Square::E2, Square::E4, None).unwrap();
            mov.execute(&mut copy).unwrap();
            assert!(!board.has_started());
            assert!(copy.has_started());
        }

        #[test]
        fn illegal_geometry() {
            let board = Board::new();
            match Move::new(&board, Square::E2, Square::E5, None) {
                Err(MoveError::IllegalMove(_)) => {}
                other => panic!("unexpected {:?}", other),
            }
        }

        #[test]
        fn unexecute_must_be_last_move() {
            let mut board = Board::new();
            let mut first = play(&mut board, Square::E2, Square::E4);
            play(&mut board, Square::E7, Square::E5);
            assert!(first.unexecute(&mut board).is_err());
        }

        #[test]
        fn unverified_outcome() {
            let board = Board::new();
            let mov = Move::prepare(&board, Square::E2, Square::E4, None).unwrap();
            assert_eq!(Err(MoveError::Unverified), mov.is_check());
            assert!(!mov.is_verified());
        }

        #[test]
        fn fools_mate() {
            let mut board = Board::new();
            play(&mut board, Square::F2, Square::F3);
            play(&mut board, Square::E7, Square::E5);
            play(&mut board, Square::G2, Square::G4);
            let mate = play(&mut board, Square::D8, Square::H4);
            assert_eq!(Ok(true), mate.is_checkmate());
            assert_eq!(Ok(Some(GameResult::BlackWins)), mate.result());
            assert_eq!("Qh4#", mate.san());
            assert!(board.is_checkmate());
            assert_eq!(0, board.legal_move_count());
        }
    }

    mod special {
        use super::*;

        #[test]
        fn kingside_castle_and_back() {
            let mut board = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
            let before = board.dump();
            let mut castle = Move::castle(&board, CastleSide::Kingside).unwrap();
            castle.execute(&mut board).unwrap();
            assert_eq!(PieceKind::King, board.piece_at(Square::G1).unwrap().kind());
            assert_eq!(PieceKind::Rook, board.piece_at(Square::F1).unwrap().kind());
            assert!(!board.can_castle(Color::White, CastleSide::Queenside));
            assert_eq!("O-O", castle.san());
            castle.unexecute(&mut board).unwrap();
            assert_eq!(before, board.dump());
        }

        #[test]
        fn castle_by_king_two_squares() {
            let board = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
            let mov = Move::new(&board, Square::E1, Square::C1, None).unwrap();
            assert_eq!(Some(CastleSide::Queenside), mov.castle_side());
        }

        #[test]
        fn castle_by_king_onto_rook() {
            let board = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
            let mov = Move::new(&board, Square::E1, Square::H1, None).unwrap();
            assert_eq!(Some(CastleSide::Kingside), mov.castle_side());
            assert_eq!(Square::G1, mov.destination());
        }

        #[test]
        fn castle_through_attack_refused() {
            let board = board("r3k2r/8/8/8/8/8/5r2/R3K2R w KQ - 0 1");
            match Move::castle(&board, CastleSide::Kingside) {
                Err(MoveError::IllegalMove(_)) => {}
                other => panic!("unexpected {:?}", other),
            }
        }

        #[test]
        fn forfeited_castle_refused() {
            let board = board("r3k2r/8/8/8/8/8/8/R3K2R w Qkq - 0 1");
            assert!(Move::castle(&board, CastleSide::Kingside).is_err());
            assert!(Move::castle(&board, CastleSide::Queenside).is_ok());
        }

        #[test]
        fn promotion_and_back() {
            let mut board = board("8/P6k/8/8/8/8/8/K7 w - - 0 1");
            let pawn = board.occupant(Square::A7).unwrap();
            let mut mov = Move::new(&board, Square::A7, Square::A8, Some(PieceKind::Rook)).unwrap();
            mov.execute(&mut board).unwrap();
            let rook = board.occupant(Square::A8).unwrap();
            assert_eq!(PieceKind::Rook, board.piece(rook).kind());
            assert!(board.roster(Color::White).contains(&rook));
            assert!(!board.roster(Color::White).contains(&pawn));
            assert_eq!("a8=R", mov.san());

            mov.unexecute(&mut board).unwrap();
            assert_eq!(Some(pawn), board.occupant(Square::A7));
            assert!(board.roster(Color::White).contains(&pawn));

            mov.execute(&mut board).unwrap();
            assert_eq!(Some(rook), board.occupant(Square::A8));
        }

        #[test]
        fn promotion_defaults_to_queen() {
            let mut board = board("8/P6k/8/8/8/8/8/K7 w - - 0 1");
            play(&mut board, Square::A7, Square::A8);
            assert_eq!(PieceKind::Queen, board.piece_at(Square::A8).unwrap().kind());
        }

        #[test]
        fn promotion_to_king_refused() {
            let board = board("8/P6k/8/8/8/8/8/K7 w - - 0 1");
            match Move::new(&board, Square::A7, Square::A8, Some(PieceKind::King)) {
                Err(MoveError::IllegalMove(_)) => {}
                other => panic!("unexpected {:?}", other),
            }
        }

        #[test]
        fn en_passant_and_back() {
            let mut board = board("4k3/8/8/3Pp3/8/8/8/4K3 w - e6 0 1");
            let before = board.dump();
            let victim = board.occupant(Square::E5).unwrap();
            let mut mov = play(&mut board, Square::D5, Square::E6);
            assert!(mov.is_en_passant());
            assert_eq!(Some(victim), mov.casualty());
            assert!(board.occupant(Square::E5).is_none());
            assert!(board.piece(victim).is_captured());
            assert_eq!("dxe6", mov.san());

            mov.unexecute(&mut board).unwrap();
            assert_eq!(before, board.dump());
        }
    }

    mod notation {
        use super::*;

        #[test]
        fn file_disambiguation() {
            let quiet = board("1k6/8/8/8/8/8/4K3/R6R w - - 0 1");
            let mov = Move::new(&quiet, Square::A1, Square::D1, None).unwrap();
            assert_eq!("Rad1", mov.san());

            let checking = board("3k4/8/8/8/8/8/4K3/R6R w - - 0 1");
            let mov = Move::new(&checking, Square::A1, Square::D1, None).unwrap();
            assert_eq!("Rad1+", mov.san());
        }

        #[test]
        fn rank_disambiguation() {
            let board = board("7k/8/8/8/8/R7/4K3/R7 w - - 0 1");
            let mov = Move::new(&board, Square::A1, Square::A2, None).unwrap();
            assert_eq!("R1a2", mov.san());
        }

        #[test]
        fn full_disambiguation() {
            let board = board("7k/8/8/8/Q1Q5/8/Q7/4K3 w - - 0 1");
            let mov = Move::new(&board, Square::A4, Square::B3, None).unwrap();
            assert_eq!("Qa4b3", mov.san());
        }

        #[test]
        fn check_suffix() {
            let board = board("k7/8/8/8/8/8/8/1R2K3 w - - 0 1");
            let mov = Move::new(&board, Square::B1, Square::A1, None).unwrap();
            assert_eq!("Ra1+", mov.san());
            assert_eq!("b1a1", mov.uci());
        }

        #[test]
        fn castle_in_place_written_onto_rook() {
            let in_place = board("4k3/8/8/8/8/8/8/6KR w H - 0 1");
            let mov = Move::castle(&in_place, CastleSide::Kingside).unwrap();
            assert_eq!(Square::G1, mov.destination());
            assert_eq!("g1h1", mov.uci());
            assert_eq!("O-O", mov.san());

            let again = Move::new(&in_place, Square::G1, Square::H1, None).unwrap();
            assert!(again.is_castle());
            assert_eq!(mov, again);

            let standard = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
            let listed: Vec<String> = standard
                .legal_moves()
                .iter()
                .filter(|mov| mov.is_castle())
                .map(|mov| mov.uci())
                .collect();
            assert_eq!(vec!["e1g1".to_owned(), "e1c1".to_owned()], listed);
        }

        #[test]
        fn equality_ignores_everything_but_squares() {
            let board = Board::new();
            let a = Move::prepare(&board, Square::E2, Square::E4, None).unwrap();
            let b = Move::new(&board, Square::E2, Square::E4, None).unwrap();
            assert_eq!(a, b);
        }
    }
}
