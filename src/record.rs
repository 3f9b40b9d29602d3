// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A JSON-friendly record of a game tree. Moves are stored in coordinate
//! notation, so a record can be replayed into a `History`; SAN is carried
//! along for readers.
use thiserror::Error;

use crate::board::Board;
use crate::error::{FenParseError, MoveError};
use crate::history::{History, NodeId};
use crate::notation::san;
use crate::types::GameResult;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad starting position: {0}")]
    Fen(#[from] FenParseError),
    #[error("move {uci}: {source}")]
    Move {
        uci: String,
        #[source]
        source: MoveError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMove {
    pub uci: String,
    pub san: String,
    /// Lines played instead of this move.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variations: Vec<Vec<RecordMove>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub fen: String,
    pub moves: Vec<RecordMove>,
    #[serde(default)]
    pub result: Option<GameResult>,
}

impl GameRecord {
    pub fn from_history(history: &History, result: Option<GameResult>) -> GameRecord {
        let moves = match history.continuations(None).and_then(|l| l.main_line()) {
            Some(first) => record_line(history, first),
            None => Vec::new(),
        };

        GameRecord {
            fen: history.start_fen().to_owned(),
            moves,
            result,
        }
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<GameRecord, RecordError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replays the record into a fresh history, left at the start.
    pub fn to_history(&self) -> Result<History, RecordError> {
        let board = Board::from_fen(&self.fen)?;
        let mut history = History::new(board);
        replay_line(&mut history, &self.moves)?;
        history.rewind().map_err(|source| RecordError::Move {
            uci: String::new(),
            source,
        })?;
        Ok(history)
    }
}

fn record_line(history: &History, first: NodeId) -> Vec<RecordMove> {
    let mut line = Vec::new();
    let mut cursor = Some(first);
    while let Some(id) = cursor {
        let mov = match history.get(id) {
            Some(mov) => mov,
            None => break,
        };

        let mut variations = Vec::new();
        if let Some(siblings) = history.continuations(history.parent(id)) {
            if siblings.main_line() == Some(id) {
                for &variation in siblings.variations() {
                    variations.push(record_line(history, variation));
                }
            }
        }

        line.push(RecordMove {
            uci: mov.uci(),
            san: mov.san(),
            variations,
        });
        cursor = history
            .continuations(Some(id))
            .and_then(|list| list.main_line());
    }

    line
}

fn replay_line(history: &mut History, moves: &[RecordMove]) -> Result<(), RecordError> {
    let fail = |uci: &str, source: MoveError| RecordError::Move {
        uci: uci.to_owned(),
        source,
    };

    for record in moves {
        let parent = history.current();
        let mov = san::parse_uci(history.board(), &record.uci).map_err(|e| fail(&record.uci, e))?;
        let node = history.add(mov).map_err(|e| fail(&record.uci, e))?;
        for variation in &record.variations {
            history.go_to(parent).map_err(|e| fail(&record.uci, e))?;
            replay_line(history, variation)?;
            history.go_to(Some(node)).map_err(|e| fail(&record.uci, e))?;
        }
    }

    Ok(())
}
