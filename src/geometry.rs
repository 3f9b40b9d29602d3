// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Board geometry shared by every piece kind: precomputed step tables for
//! kings, knights and pawn attacks, and ray walking for sliding pieces.
use arrayvec::ArrayVec;

use crate::square_set::SquareSet;
use crate::types::{Color, Direction, Square, TableIndex, COLORS, DIRECTIONS, SQUARES};

/// An ordered run of squares along one line. The origin always comes first.
pub type Line = ArrayVec<[Square; 8]>;

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

struct StepTable {
    table: [SquareSet; 64],
}

impl StepTable {
    fn new(offsets: &[(i32, i32)]) -> StepTable {
        let mut st = StepTable {
            table: [SquareSet::empty(); 64],
        };

        for &sq in SQUARES.iter() {
            st.table[sq.as_index()] = offsets
                .iter()
                .filter_map(|&(df, dr)| sq.try_step(df, dr))
                .collect();
        }

        st
    }

    fn steps(&self, sq: Square) -> SquareSet {
        self.table[sq.as_index()]
    }
}

struct PawnTable {
    table: [[SquareSet; 2]; 64],
}

impl PawnTable {
    fn new() -> PawnTable {
        let mut pt = PawnTable {
            table: [[SquareSet::empty(); 2]; 64],
        };

        for &sq in SQUARES.iter() {
            for &color in COLORS.iter() {
                let forward = color.forward();
                pt.table[sq.as_index()][color.as_index()] = [-1, 1]
                    .iter()
                    .filter_map(|&df| sq.try_step(df, forward))
                    .collect();
            }
        }

        pt
    }

    fn attacks(&self, sq: Square, color: Color) -> SquareSet {
        self.table[sq.as_index()][color.as_index()]
    }
}

lazy_static! {
    static ref KING_TABLE: StepTable = {
        let offsets: Vec<(i32, i32)> = DIRECTIONS.iter().map(|d| d.delta()).collect();
        StepTable::new(&offsets)
    };
    static ref KNIGHT_TABLE: StepTable = StepTable::new(&KNIGHT_OFFSETS);
    static ref PAWN_TABLE: PawnTable = PawnTable::new();
}

pub fn king_steps(sq: Square) -> SquareSet {
    KING_TABLE.steps(sq)
}

pub fn knight_steps(sq: Square) -> SquareSet {
    KNIGHT_TABLE.steps(sq)
}

/// The two diagonal squares a pawn of the given color on `sq` attacks.
pub fn pawn_attacks(sq: Square, color: Color) -> SquareSet {
    PAWN_TABLE.attacks(sq, color)
}

/// Iterator over the squares reached by repeatedly stepping from `from` in
/// direction `dir`, not including `from` itself.
pub struct Ray {
    cursor: Square,
    dir: Direction,
}

impl Iterator for Ray {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        let next = self.cursor.towards(self.dir)?;
        self.cursor = next;
        Some(next)
    }
}

pub fn ray(from: Square, dir: Direction) -> Ray {
    Ray { cursor: from, dir }
}

/// Returns the direction of travel from `from` to `to`, if the two squares
/// share a rank, file or diagonal.
pub fn direction_between(from: Square, to: Square) -> Option<Direction> {
    if from == to {
        return None;
    }

    let df = to.file().as_index() as i32 - from.file().as_index() as i32;
    let dr = to.rank().as_index() as i32 - from.rank().as_index() as i32;
    if df != 0 && dr != 0 && df.abs() != dr.abs() {
        return None;
    }

    let step = (df.signum(), dr.signum());
    DIRECTIONS.iter().cloned().find(|d| d.delta() == step)
}

/// The squares strictly between two co-linear squares. Empty when the
/// squares are adjacent or not co-linear.
pub fn squares_between(from: Square, to: Square) -> SquareSet {
    match direction_between(from, to) {
        Some(dir) => ray(from, dir).take_while(|&sq| sq != to).collect(),
        None => SquareSet::empty(),
    }
}

/// The line from `from` to `to` travelling in one of `directions`, with
/// `from` first. `to` is included only when `inclusive` is set. Returns
/// `None` if `to` is not reachable along any of the given directions.
pub fn line_of_sight(
    from: Square,
    to: Square,
    directions: &[Direction],
    inclusive: bool,
) -> Option<Line> {
    let dir = direction_between(from, to)?;
    if !directions.contains(&dir) {
        return None;
    }

    let mut line = Line::new();
    line.push(from);
    for sq in ray(from, dir) {
        if sq == to {
            if inclusive {
                line.push(sq);
            }
            break;
        }

        line.push(sq);
    }

    Some(line)
}
