// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Text formats for positions, moves and games.
pub mod fen;
pub mod pgn;
pub mod san;

pub use self::fen::{parse_fen, START_FEN};
pub use self::pgn::{read_pgn, write_pgn, PgnError, PgnGame};
pub use self::san::{parse_san, parse_uci};
