// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A game as a tree of moves. Every position has a list of continuations;
//! the first one is the main line and the rest are variations. The history
//! owns the board and keeps it in the position of its current node.
use std::sync::Arc;

use crate::board::{Board, BoardEvent, BoardListener};
use crate::error::MoveError;
use crate::moves::Move;
use crate::types::{Color, PieceKind, Square};

/// Handle to a node in a `History`. Stays valid until the node is removed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The continuations of one position. Index 0 is the main line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContinuationList {
    lines: Vec<NodeId>,
}

impl ContinuationList {
    pub fn main_line(&self) -> Option<NodeId> {
        self.lines.first().cloned()
    }

    pub fn variations(&self) -> &[NodeId] {
        if self.lines.is_empty() {
            &[]
        } else {
            &self.lines[1..]
        }
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.lines.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.lines.iter().cloned()
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.lines.iter().position(|&line| line == id)
    }
}

#[derive(Clone, Debug)]
struct Node {
    mov: Move,
    parent: Option<NodeId>,
    continuations: ContinuationList,
}

pub struct History {
    board: Board,
    nodes: Vec<Option<Node>>,
    root: ContinuationList,
    current: Option<NodeId>,
    start_fen: String,
    start_side: Color,
    start_fullmove: u32,
}

impl History {
    /// Starts an empty history at the board's current position.
    pub fn new(board: Board) -> History {
        History {
            start_fen: board.as_fen(),
            start_side: board.side_to_move(),
            start_fullmove: board.fullmove_number(),
            board,
            nodes: Vec::new(),
            root: ContinuationList::default(),
            current: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// FEN of the position the history starts from.
    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    /// Move number and side to move of the ply that follows `at`.
    pub fn move_number(&self, at: Option<NodeId>) -> (u32, Color) {
        let plies = self.line_to(at).len() as u32;
        let offset = match self.start_side {
            Color::White => 0,
            Color::Black => 1,
        };
        let side = if (plies + offset) % 2 == 0 {
            Color::White
        } else {
            Color::Black
        };
        (self.start_fullmove + (plies + offset) / 2, side)
    }

    /// The node whose move was played last, or `None` at the start.
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    pub fn get(&self, id: NodeId) -> Option<&Move> {
        self.node(id).map(|node| &node.mov)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    /// The continuations after `at`; `None` means the starting position.
    pub fn continuations(&self, at: Option<NodeId>) -> Option<&ContinuationList> {
        match at {
            None => Some(&self.root),
            Some(id) => self.node(id).map(|node| &node.continuations),
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(|slot| slot.as_ref())
    }

    fn list_mut(&mut self, at: Option<NodeId>) -> Option<&mut ContinuationList> {
        match at {
            None => Some(&mut self.root),
            Some(id) => self
                .nodes
                .get_mut(id.0)
                .and_then(|slot| slot.as_mut())
                .map(|node| &mut node.continuations),
        }
    }

    fn missing(id: NodeId) -> MoveError {
        MoveError::IllegalState(format!("no history node {}", id.0))
    }

    pub fn add_listener(&mut self, listener: Arc<dyn BoardListener>) {
        self.board.add_listener(listener);
    }

    pub fn remove_listener(&mut self, listener: &Arc<dyn BoardListener>) {
        self.board.remove_listener(listener);
    }
}

//
// Growing the tree
//

impl History {
    /// Plays `mov` from the current position and makes it the current node.
    /// A move that already continues the current position is not added
    /// twice; the history steps onto the existing node instead. Nothing is
    /// added when the move fails to execute.
    pub fn add(&mut self, mut mov: Move) -> Result<NodeId, MoveError> {
        let existing = self
            .continuations(self.current)
            .and_then(|list| {
                list.iter()
                    .find(|&id| self.get(id).map_or(false, |other| other.plays_same(&mov)))
            });
        if let Some(id) = existing {
            self.step_into(id)?;
            return Ok(id);
        }

        if let Err(err) = mov.execute(&mut self.board) {
            warn!("rejected move {}: {}", mov.uci(), err);
            return Err(err);
        }

        let id = NodeId(self.nodes.len());
        debug!("adding {} as node {}", mov, id.0);
        self.nodes.push(Some(Node {
            mov,
            parent: self.current,
            continuations: ContinuationList::default(),
        }));

        if let Some(list) = self.list_mut(self.current) {
            list.lines.push(id);
        }

        self.current = Some(id);
        Ok(id)
    }

    /// Builds, verifies and adds a move from coordinates.
    pub fn add_move(
        &mut self,
        origin: Square,
        destination: Square,
        promotion: Option<PieceKind>,
    ) -> Result<NodeId, MoveError> {
        let mov = Move::new(&self.board, origin, destination, promotion)?;
        self.add(mov)
    }

    /// Makes `id` the main line of the list it belongs to.
    pub fn promote(&mut self, id: NodeId) -> Result<(), MoveError> {
        let parent = self.node(id).ok_or_else(|| History::missing(id))?.parent;
        let list = self.list_mut(parent).ok_or_else(|| History::missing(id))?;
        if let Some(index) = list.position(id) {
            let promoted = list.lines.remove(index);
            list.lines.insert(0, promoted);
        }

        Ok(())
    }

    /// Drops `id` and everything after it. If the current node is inside
    /// the dropped subtree, the history first steps back to `id`'s parent.
    pub fn remove(&mut self, id: NodeId) -> Result<(), MoveError> {
        let parent = self.node(id).ok_or_else(|| History::missing(id))?.parent;
        if self.current_line().contains(&id) {
            self.go_to(parent)?;
        }

        if let Some(list) = self.list_mut(parent) {
            list.lines.retain(|&line| line != id);
        }

        self.drop_subtree(id);
        Ok(())
    }

    /// Drops every continuation of the current position.
    pub fn truncate(&mut self) {
        let lines = match self.list_mut(self.current) {
            Some(list) => std::mem::replace(&mut list.lines, Vec::new()),
            None => return,
        };

        for id in lines {
            self.drop_subtree(id);
        }
    }

    fn drop_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(next.0).and_then(|slot| slot.take()) {
                pending.extend(node.continuations.lines);
            }
        }
    }
}

//
// Traversal
//

impl History {
    fn step_into(&mut self, id: NodeId) -> Result<(), MoveError> {
        let node = self
            .nodes
            .get_mut(id.0)
            .and_then(|slot| slot.as_mut())
            .ok_or_else(|| History::missing(id))?;
        node.mov.execute(&mut self.board)?;
        self.current = Some(id);
        Ok(())
    }

    /// Plays the main-line continuation of the current position.
    pub fn next(&mut self) -> Result<Option<NodeId>, MoveError> {
        self.next_variation(0)
    }

    /// Plays continuation `index` of the current position, 0 being the main
    /// line. Returns `None` if there is no such continuation.
    pub fn next_variation(&mut self, index: usize) -> Result<Option<NodeId>, MoveError> {
        let id = match self.continuations(self.current).and_then(|l| l.get(index)) {
            Some(id) => id,
            None => return Ok(None),
        };

        self.step_into(id)?;
        Ok(Some(id))
    }

    /// Takes back the current move. Returns false at the start of the game.
    pub fn prev(&mut self) -> Result<bool, MoveError> {
        let id = match self.current {
            Some(id) => id,
            None => return Ok(false),
        };

        let node = self
            .nodes
            .get_mut(id.0)
            .and_then(|slot| slot.as_mut())
            .ok_or_else(|| History::missing(id))?;
        node.mov.unexecute(&mut self.board)?;
        self.current = node.parent;
        Ok(true)
    }

    /// Moves the board to the position after `target` (`None` for the start)
    /// by taking moves back to the common ancestor and playing forward from
    /// there.
    pub fn go_to(&mut self, target: Option<NodeId>) -> Result<(), MoveError> {
        if let Some(id) = target {
            if !self.contains(id) {
                return Err(History::missing(id));
            }
        }

        self.board.fire(BoardEvent::TraversalBegin);
        let result = self.walk_to(target);
        self.board.fire(BoardEvent::TraversalEnd);
        result
    }

    fn walk_to(&mut self, target: Option<NodeId>) -> Result<(), MoveError> {
        let from = self.current_line();
        let to = self.line_to(target);
        let common = from
            .iter()
            .zip(to.iter())
            .take_while(|(a, b)| a == b)
            .count();
        debug!(
            "traversing {} back and {} forward",
            from.len() - common,
            to.len() - common
        );

        for _ in common..from.len() {
            self.prev()?;
        }

        for &id in &to[common..] {
            self.step_into(id)?;
        }

        Ok(())
    }

    /// Back to the starting position.
    pub fn rewind(&mut self) -> Result<(), MoveError> {
        self.go_to(None)
    }

    /// Plays main-line continuations from the current node until there are
    /// none left.
    pub fn fastforward(&mut self) -> Result<(), MoveError> {
        self.board.fire(BoardEvent::TraversalBegin);
        let mut result = Ok(());
        loop {
            match self.next() {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }

        self.board.fire(BoardEvent::TraversalEnd);
        result
    }

    fn line_to(&self, target: Option<NodeId>) -> Vec<NodeId> {
        let mut line = Vec::new();
        let mut cursor = target;
        while let Some(id) = cursor {
            line.push(id);
            cursor = self.parent(id);
        }

        line.reverse();
        line
    }

    /// The nodes from the start to the current node.
    pub fn current_line(&self) -> Vec<NodeId> {
        self.line_to(self.current)
    }

    /// The nodes of the main line, from the start to its end.
    pub fn main_line(&self) -> Vec<NodeId> {
        let mut line = Vec::new();
        let mut cursor = self.root.main_line();
        while let Some(id) = cursor {
            line.push(id);
            cursor = self.node(id).and_then(|node| node.continuations.main_line());
        }

        line
    }

    /// Whether `id` lies on the main line.
    pub fn is_main_line(&self, id: NodeId) -> bool {
        self.main_line().contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn history() -> History {
        History::new(Board::new())
    }

    fn add(history: &mut History, origin: Square, destination: Square) -> NodeId {
        history.add_move(origin, destination, None).unwrap()
    }

    #[test]
    fn add_and_walk() {
        let mut history = history();
        let e4 = add(&mut history, Square::E2, Square::E4);
        let e5 = add(&mut history, Square::E7, Square::E5);
        assert_eq!(vec![e4, e5], history.main_line());
        assert_eq!(Some(e5), history.current());

        assert!(history.prev().unwrap());
        assert_eq!(Some(e4), history.current());
        assert_eq!(Some((Square::E2, Square::E4)), history.board().last_move());

        assert_eq!(Some(e5), history.next().unwrap());
        assert_eq!(None, history.next().unwrap());
    }

    #[test]
    fn rejected_move_is_not_added() {
        let mut history = history();
        let other = Board::new();
        let foreign = Move::new(&other, Square::E2, Square::E4, None).unwrap();
        assert!(history.add(foreign).is_err());
        assert!(history.main_line().is_empty());
        assert_eq!(None, history.current());
    }

    #[test]
    fn readding_steps_onto_existing_node() {
        let mut history = history();
        let e4 = add(&mut history, Square::E2, Square::E4);
        history.prev().unwrap();
        let again = add(&mut history, Square::E2, Square::E4);
        assert_eq!(e4, again);
        assert_eq!(1, history.continuations(None).unwrap().len());
    }

    #[test]
    fn readding_respects_promotion_piece() {
        let board = Board::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let mut history = History::new(board);
        let queen = history
            .add_move(Square::A7, Square::A8, Some(PieceKind::Queen))
            .unwrap();
        history.prev().unwrap();

        let knight = history
            .add_move(Square::A7, Square::A8, Some(PieceKind::Knight))
            .unwrap();
        assert_ne!(queen, knight);
        assert_eq!(
            Some(PieceKind::Knight),
            history.board().piece_at(Square::A8).map(|p| p.kind())
        );
        assert_eq!(2, history.continuations(None).unwrap().len());

        history.prev().unwrap();
        let default = history.add_move(Square::A7, Square::A8, None).unwrap();
        assert_eq!(queen, default);
        assert_eq!(
            Some(PieceKind::Queen),
            history.board().piece_at(Square::A8).map(|p| p.kind())
        );
    }

    #[test]
    fn variations_and_go_to() {
        let mut history = history();
        let e4 = add(&mut history, Square::E2, Square::E4);
        let e5 = add(&mut history, Square::E7, Square::E5);
        history.prev().unwrap();
        let c5 = add(&mut history, Square::C7, Square::C5);
        let nf3 = add(&mut history, Square::G1, Square::F3);

        assert_eq!(vec![e4, e5], history.main_line());
        assert_eq!(vec![e4, c5, nf3], history.current_line());

        history.go_to(Some(e5)).unwrap();
        assert_eq!(Some(e5), history.current());
        assert_eq!(Some((Square::E7, Square::E5)), history.board().last_move());

        history.rewind().unwrap();
        assert_eq!(None, history.current());
        assert!(history.board().is_standard_start());

        assert_eq!(Some(e4), history.next().unwrap());
        assert_eq!(Some(c5), history.next_variation(1).unwrap());
        history.fastforward().unwrap();
        assert_eq!(Some(nf3), history.current());
    }

    #[test]
    fn move_numbers() {
        let mut history = history();
        assert_eq!((1, Color::White), history.move_number(None));
        let e4 = add(&mut history, Square::E2, Square::E4);
        assert_eq!((1, Color::Black), history.move_number(Some(e4)));
        let e5 = add(&mut history, Square::E7, Square::E5);
        assert_eq!((2, Color::White), history.move_number(Some(e5)));

        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 7").unwrap();
        let history = History::new(board);
        assert_eq!((7, Color::Black), history.move_number(None));
    }

    #[test]
    fn promote_variation() {
        let mut history = history();
        let e4 = add(&mut history, Square::E2, Square::E4);
        history.prev().unwrap();
        let d4 = add(&mut history, Square::D2, Square::D4);
        assert_eq!(vec![e4], history.main_line());
        history.promote(d4).unwrap();
        assert_eq!(vec![d4], history.main_line());
        assert!(history.is_main_line(d4));
        assert!(!history.is_main_line(e4));
    }

    #[test]
    fn remove_current_subtree() {
        let mut history = history();
        let e4 = add(&mut history, Square::E2, Square::E4);
        let e5 = add(&mut history, Square::E7, Square::E5);
        let nf3 = add(&mut history, Square::G1, Square::F3);
        history.remove(e5).unwrap();
        assert_eq!(Some(e4), history.current());
        assert!(!history.contains(e5));
        assert!(!history.contains(nf3));
        assert_eq!(vec![e4], history.main_line());
        assert_eq!(Color::Black, history.board().side_to_move());
    }

    #[test]
    fn truncate_drops_continuations() {
        let mut history = history();
        let e4 = add(&mut history, Square::E2, Square::E4);
        let e5 = add(&mut history, Square::E7, Square::E5);
        history.rewind().unwrap();
        history.next().unwrap();
        history.truncate();
        assert_eq!(Some(e4), history.current());
        assert!(!history.contains(e5));
        assert_eq!(vec![e4], history.main_line());
    }

    struct Recorder {
        events: Mutex<Vec<BoardEvent>>,
    }

    impl BoardListener for Recorder {
        fn board_event(&self, _board: &Board, event: BoardEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn listener_event_order() {
        let mut history = history();
        let recorder = Arc::new(Recorder {
            events: Mutex::new(Vec::new()),
        });
        let listener: Arc<dyn BoardListener> = recorder.clone();
        history.add_listener(listener.clone());

        add(&mut history, Square::E2, Square::E4);
        add(&mut history, Square::E7, Square::E5);
        history.rewind().unwrap();

        assert_eq!(
            vec![
                BoardEvent::Move,
                BoardEvent::Move,
                BoardEvent::TraversalBegin,
                BoardEvent::Unmove,
                BoardEvent::Unmove,
                BoardEvent::TraversalEnd,
            ],
            *recorder.events.lock().unwrap()
        );

        history.remove_listener(&listener);
        history.fastforward().unwrap();
        assert_eq!(6, recorder.events.lock().unwrap().len());
    }
}
