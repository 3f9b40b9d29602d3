// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::path::Path;

use csv::Reader;
use hashbrown::HashMap;
use rayon::prelude::*;

use crate::board::Board;
use crate::error::MoveError;

/// One row of a perft suite: the number of leaf nodes expected `depth` plies
/// below the position `fen`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerftCase {
    pub fen: String,
    pub depth: u32,
    pub nodes: u64,
}

/// Counts the leaves of the legal move tree `depth` plies deep. Every move
/// is really executed and unexecuted, so this exercises the whole
/// make/unmake path and not just the generator.
pub fn perft(board: &Board, depth: u32) -> Result<u64, MoveError> {
    if depth == 0 {
        return Ok(1);
    }

    if depth == 1 {
        return Ok(u64::from(board.legal_move_count()));
    }

    board
        .legal_moves()
        .into_par_iter()
        .map(|mut mov| {
            let mut child = board.clone();
            mov.execute(&mut child)?;
            walk(&mut child, depth - 1)
        })
        .sum()
}

fn walk(board: &mut Board, depth: u32) -> Result<u64, MoveError> {
    if depth == 1 {
        return Ok(u64::from(board.legal_move_count()));
    }

    let mut nodes = 0;
    for mut mov in board.legal_moves() {
        mov.execute(board)?;
        let below = walk(board, depth - 1);
        mov.unexecute(board)?;
        nodes += below?;
    }

    Ok(nodes)
}

/// Perft split by root move, keyed by the move in coordinate notation.
pub fn perft_divide(board: &Board, depth: u32) -> Result<HashMap<String, u64>, MoveError> {
    let mut split = HashMap::new();
    if depth == 0 {
        return Ok(split);
    }

    for mut mov in board.legal_moves() {
        let mut child = board.clone();
        mov.execute(&mut child)?;
        let nodes = perft(&child, depth - 1)?;
        split.insert(mov.uci(), nodes);
    }

    Ok(split)
}

/// Reads a perft suite from a CSV file with `fen,depth,nodes` columns.
pub fn load_suite<P: AsRef<Path>>(path: P) -> Result<Vec<PerftCase>, csv::Error> {
    let mut reader = Reader::from_path(path)?;
    let mut cases = vec![];
    for result in reader.deserialize() {
        let case: PerftCase = result?;
        cases.push(case);
    }

    debug!("loaded {} perft cases", cases.len());
    Ok(cases)
}
