// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Portable Game Notation. Games are read into a `History`, recursive
//! annotation variations included; comments and NAGs are skipped.
use pest::iterators::Pair;
use pest::Parser;
use thiserror::Error;

use crate::board::Board;
use crate::error::{FenParseError, MoveError};
use crate::history::{History, NodeId};
use crate::notation::san;
use crate::types::{Color, GameResult};

mod grammar {
    #[derive(Parser)]
    #[grammar = "notation/pgn.pest"]
    pub struct PgnParser;
}

use self::grammar::{PgnParser, Rule};

#[derive(Debug, Error)]
pub enum PgnError {
    #[error("PGN syntax error: {0}")]
    Syntax(String),
    #[error("bad FEN tag: {0}")]
    Fen(#[from] FenParseError),
    #[error("move '{text}' at ply {ply}: {source}")]
    Move {
        ply: usize,
        text: String,
        #[source]
        source: MoveError,
    },
    #[error("variation with no move before it")]
    OrphanVariation,
}

pub struct PgnGame {
    pub tags: Vec<(String, String)>,
    pub history: History,
    /// `None` for an unfinished game (`*`).
    pub result: Option<GameResult>,
}

impl PgnGame {
    pub fn new(history: History) -> PgnGame {
        PgnGame {
            tags: Vec::new(),
            history,
            result: None,
        }
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_tag<S: Into<String>>(&mut self, name: &str, value: S) {
        let value = value.into();
        match self.tags.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value,
            None => self.tags.push((name.to_owned(), value)),
        }
    }
}

fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    inner.replace("\\\"", "\"").replace("\\\\", "\\")
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Reads every game in `text`.
pub fn read_pgn(text: &str) -> Result<Vec<PgnGame>, PgnError> {
    let mut parsed =
        PgnParser::parse(Rule::pgn, text).map_err(|e| PgnError::Syntax(e.to_string()))?;
    let mut games = Vec::new();
    let file = match parsed.next() {
        Some(file) => file,
        None => return Ok(games),
    };

    for game in file.into_inner() {
        if game.as_rule() != Rule::game {
            continue;
        }

        let mut tags = Vec::new();
        let mut result = None;
        let mut movetext = Vec::new();
        for item in game.into_inner() {
            match item.as_rule() {
                Rule::tag_pair => {
                    let mut inner = item.into_inner();
                    if let (Some(name), Some(value)) = (inner.next(), inner.next()) {
                        tags.push((name.as_str().to_owned(), unescape(value.as_str())));
                    }
                }
                Rule::result => {
                    result = match item.as_str() {
                        "1-0" => Some(GameResult::WhiteWins),
                        "0-1" => Some(GameResult::BlackWins),
                        "1/2-1/2" => Some(GameResult::Draw),
                        _ => None,
                    };
                }
                _ => movetext.push(item),
            }
        }

        let board = match tags.iter().find(|(key, _)| key == "FEN") {
            Some((_, fen)) => Board::from_fen(fen)?,
            None => Board::new(),
        };

        let mut history = History::new(board);
        let mut ply = 0;
        play_line(&mut history, movetext, &mut ply)?;
        history.rewind().map_err(|source| PgnError::Move {
            ply,
            text: String::new(),
            source,
        })?;
        debug!("read PGN game with {} tags", tags.len());
        games.push(PgnGame {
            tags,
            history,
            result,
        });
    }

    Ok(games)
}

fn play_line<'i, I>(history: &mut History, items: I, ply: &mut usize) -> Result<(), PgnError>
where
    I: IntoIterator<Item = Pair<'i, Rule>>,
{
    let fail = |ply: usize, text: &str, source: MoveError| PgnError::Move {
        ply,
        text: text.to_owned(),
        source,
    };

    // The position before the last move of this line; a variation replaces
    // that move.
    let mut before_last: Option<Option<NodeId>> = None;
    for item in items {
        match item.as_rule() {
            Rule::san_move => {
                *ply += 1;
                let parent = history.current();
                let text = item.as_str();
                let mov = san::parse_san(history.board(), text).map_err(|e| fail(*ply, text, e))?;
                history.add(mov).map_err(|e| fail(*ply, text, e))?;
                before_last = Some(parent);
            }
            Rule::variation => {
                let start = before_last.ok_or(PgnError::OrphanVariation)?;
                let resume = history.current();
                history.go_to(start).map_err(|e| fail(*ply, "(", e))?;
                play_line(history, item.into_inner(), ply)?;
                history.go_to(resume).map_err(|e| fail(*ply, ")", e))?;
            }
            _ => {}
        }
    }

    Ok(())
}

/// Writes a game as PGN: tags, then movetext with variations in
/// parentheses, then the result.
pub fn write_pgn(game: &PgnGame) -> String {
    let mut out = String::new();
    for (name, value) in &game.tags {
        out.push_str(&format!("[{} \"{}\"]\n", name, escape(value)));
    }

    if !game.tags.is_empty() {
        out.push('\n');
    }

    let mut tokens = Vec::new();
    if let Some(first) = game.history.continuations(None).and_then(|l| l.main_line()) {
        write_line(&game.history, &mut tokens, first, true);
    }

    tokens.push(match game.result {
        Some(result) => result.to_string(),
        None => "*".to_owned(),
    });

    let mut line_len = 0;
    let mut glue = false;
    for token in tokens {
        let attach = glue || token == ")";
        if !attach && line_len > 0 {
            if line_len + token.len() + 1 > 79 {
                out.push('\n');
                line_len = 0;
            } else {
                out.push(' ');
                line_len += 1;
            }
        }

        glue = token == "(";
        line_len += token.len();
        out.push_str(&token);
    }

    out.push('\n');
    out
}

fn write_line(history: &History, tokens: &mut Vec<String>, first: NodeId, mut numbered: bool) {
    let mut cursor = Some(first);
    while let Some(id) = cursor {
        let mov = match history.get(id) {
            Some(mov) => mov,
            None => return,
        };

        let parent = history.parent(id);
        let (number, side) = history.move_number(parent);
        match side {
            Color::White => tokens.push(format!("{}.", number)),
            Color::Black if numbered => tokens.push(format!("{}...", number)),
            Color::Black => {}
        }

        tokens.push(mov.san());
        numbered = false;
        if let Some(siblings) = history.continuations(parent) {
            if siblings.main_line() == Some(id) {
                for &variation in siblings.variations() {
                    tokens.push("(".to_owned());
                    write_line(history, tokens, variation, true);
                    tokens.push(")".to_owned());
                    numbered = true;
                }
            }
        }

        cursor = history
            .continuations(Some(id))
            .and_then(|list| list.main_line());
    }
}
