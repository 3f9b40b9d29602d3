// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Definitions of the `SquareSet` type, a set of squares on the board.
//! Every piece carries three of these per ply: the squares it may legally
//! move to, the friendly squares it guards, and the subset of its
//! destinations that are not attacks (pawn pushes and castling hops).
//!
//! A set is a single 64-bit integer with one bit per square, so the usual
//! set operations (union, intersection, difference) are bitwise operations.
use std::fmt;
use std::iter::{FromIterator, Iterator};
use std::ops;

use crate::types::{self, Square, TableIndex};

#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct SquareSet {
    bits: u64,
}

impl SquareSet {
    pub const fn from_bits(bits: u64) -> SquareSet {
        SquareSet { bits }
    }

    pub const fn empty() -> SquareSet {
        SquareSet::from_bits(0)
    }

    pub const fn all() -> SquareSet {
        SquareSet::from_bits(!0)
    }

    pub fn single(square: Square) -> SquareSet {
        SquareSet::from_bits(1u64 << square.as_index())
    }

    pub fn contains(self, square: Square) -> bool {
        (self.bits & (1u64 << square.as_index())) != 0
    }

    pub fn insert(&mut self, square: Square) {
        self.bits |= 1u64 << square.as_index();
    }

    pub fn remove(&mut self, square: Square) {
        self.bits &= !(1u64 << square.as_index());
    }

    pub const fn and(self, other: SquareSet) -> SquareSet {
        SquareSet::from_bits(self.bits & other.bits)
    }

    pub const fn or(self, other: SquareSet) -> SquareSet {
        SquareSet::from_bits(self.bits | other.bits)
    }

    /// Squares in this set that are not in `other`.
    pub const fn without(self, other: SquareSet) -> SquareSet {
        SquareSet::from_bits(self.bits & !other.bits)
    }

    pub const fn bits(self) -> u64 {
        self.bits
    }

    pub const fn len(self) -> u32 {
        self.bits.count_ones()
    }

    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    pub fn iter(self) -> SquareSetIterator {
        SquareSetIterator { bits: self.bits }
    }

    pub fn first(self) -> Option<Square> {
        self.iter().next()
    }
}

impl fmt::Debug for SquareSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for SquareSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &rank in types::RANKS.iter().rev() {
            for &file in &types::FILES {
                if self.contains(Square::of(rank, file)) {
                    write!(f, " 1 ")?
                } else {
                    write!(f, " . ")?
                }
            }

            writeln!(f, "| {}", rank)?;
        }

        for _ in &types::FILES {
            write!(f, "---")?;
        }

        writeln!(f)?;
        for file in &types::FILES {
            write!(f, " {} ", file)?;
        }

        writeln!(f)
    }
}

impl ops::BitAnd for SquareSet {
    type Output = SquareSet;

    fn bitand(self, rhs: SquareSet) -> SquareSet {
        self.and(rhs)
    }
}

impl ops::BitAndAssign for SquareSet {
    fn bitand_assign(&mut self, rhs: SquareSet) {
        *self = self.and(rhs);
    }
}

impl ops::BitOr for SquareSet {
    type Output = SquareSet;

    fn bitor(self, rhs: SquareSet) -> SquareSet {
        self.or(rhs)
    }
}

impl ops::BitOrAssign for SquareSet {
    fn bitor_assign(&mut self, rhs: SquareSet) {
        *self = self.or(rhs);
    }
}

pub struct SquareSetIterator {
    bits: u64,
}

impl Iterator for SquareSetIterator {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        if self.bits == 0 {
            return None;
        }

        let next = self.bits.trailing_zeros();
        self.bits &= self.bits - 1;
        Some(Square::from_index(next as usize))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.bits.count_ones() as usize;
        (count, Some(count))
    }
}

impl IntoIterator for SquareSet {
    type Item = Square;
    type IntoIter = SquareSetIterator;

    fn into_iter(self) -> SquareSetIterator {
        self.iter()
    }
}

impl FromIterator<Square> for SquareSet {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> SquareSet {
        let mut set = SquareSet::empty();
        for square in iter {
            set.insert(square);
        }

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_test() {
        let mut set = SquareSet::default();
        assert!(!set.contains(Square::A1));

        set.insert(Square::A1);
        assert!(set.contains(Square::A1));
        set.remove(Square::A1);
        assert!(set.is_empty());
    }

    #[test]
    fn intersection_and_difference() {
        let one: SquareSet = vec![Square::A2, Square::B2].into_iter().collect();
        let two: SquareSet = vec![Square::A2, Square::C2].into_iter().collect();

        let both = one & two;
        assert!(both.contains(Square::A2));
        assert!(!both.contains(Square::B2));
        assert!(!both.contains(Square::C2));

        let diff = one.without(two);
        assert_eq!(1, diff.len());
        assert_eq!(Some(Square::B2), diff.first());
    }

    #[test]
    fn iteration_is_square_ordered() {
        let set: SquareSet = vec![Square::H8, Square::A1, Square::E4].into_iter().collect();
        let squares: Vec<_> = set.iter().collect();
        assert_eq!(vec![Square::A1, Square::E4, Square::H8], squares);
    }
}
