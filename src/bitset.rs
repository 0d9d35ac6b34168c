//!
//! `BitSet`: resizable bit vector
//!
//! Used to represent
//!
//! * the active states of a trellis column
//! * adjacency of the model graph (`to`/`from` states of each state)
//! * defined positions of a `SparseArray`
//!
//! Bits are packed into `u64` words, bit `i` lives in word `i / 64` at
//! offset `i % 64`. Bits of the last word beyond `len` (the "buffer") are
//! always zero, so whole-word operations (count, scan, equality) never need
//! to mask them.
//!
pub mod sparse_array;
pub use sparse_array::SparseArray;

use crate::error::BitSetError;
use std::str::FromStr;

type Result<T> = std::result::Result<T, BitSetError>;

const WORD_BITS: usize = 64;

/// de Bruijn sequence B(2, 6)
const DEBRUIJN_64: u64 = 0x03f7_9d71_b4cb_0a89;

/// `DEBRUIJN_INDEX[(lowest_bit * DEBRUIJN_64) >> 58]` is the index of the
/// lowest set bit.
const DEBRUIJN_INDEX: [u8; 64] = debruijn_table();

const fn debruijn_table() -> [u8; 64] {
    let mut table = [0u8; 64];
    let mut i = 0;
    while i < 64 {
        table[((1u64 << i).wrapping_mul(DEBRUIJN_64) >> 58) as usize] = i as u8;
        i += 1;
    }
    table
}

/// index of the lowest set bit of a non-zero word
#[inline]
fn lowest_bit(word: u64) -> usize {
    debug_assert!(word != 0);
    let isolated = word & word.wrapping_neg();
    DEBRUIJN_INDEX[(isolated.wrapping_mul(DEBRUIJN_64) >> 58) as usize] as usize
}

/// index of the highest set bit of a non-zero word
#[inline]
fn highest_bit(word: u64) -> usize {
    debug_assert!(word != 0);
    WORD_BITS - 1 - word.leading_zeros() as usize
}

#[inline]
fn n_words(len: usize) -> usize {
    (len + WORD_BITS - 1) / WORD_BITS
}

/// mask of the bits `[0, bit)` of a word
#[inline]
fn mask_below(bit: usize) -> u64 {
    if bit >= WORD_BITS {
        !0
    } else {
        (1u64 << bit) - 1
    }
}

///
/// Resizable bit vector with rank (`count_before`) and scan
/// (`find_first`/`find_last`) queries.
///
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BitSet {
    words: Vec<u64>,
    len: usize,
}

//
// constructors
//
impl BitSet {
    ///
    /// Create a bitset of `len` bits, all zero.
    ///
    pub fn new(len: usize) -> BitSet {
        BitSet {
            words: vec![0; n_words(len)],
            len,
        }
    }
    ///
    /// Create a bitset whose bit `i` is `bits[i]`.
    ///
    pub fn from_bools(bits: &[bool]) -> BitSet {
        let mut bs = BitSet::new(bits.len());
        for (i, &bit) in bits.iter().enumerate() {
            if bit {
                bs.words[i / WORD_BITS] |= 1 << (i % WORD_BITS);
            }
        }
        bs
    }
    ///
    /// Create a bitset of `len` bits with the given positions set.
    ///
    pub fn from_ones<I>(len: usize, ones: I) -> Result<BitSet>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut bs = BitSet::new(len);
        for pos in ones {
            bs.set(pos)?;
        }
        Ok(bs)
    }
}

//
// single bit access
//
impl BitSet {
    /// The number of bits (logical size)
    pub fn len(&self) -> usize {
        self.len
    }
    /// `true` if the logical size is zero
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    #[inline]
    fn check(&self, pos: usize) -> Result<()> {
        if pos < self.len {
            Ok(())
        } else {
            Err(BitSetError::OutOfRange { pos, len: self.len })
        }
    }
    ///
    /// Value of the bit at `pos`; out of range is an error.
    ///
    pub fn at(&self, pos: usize) -> Result<bool> {
        self.check(pos)?;
        Ok(self.get_unchecked(pos))
    }
    ///
    /// Value of the bit at `pos`; positions out of range read as `false`.
    ///
    #[inline]
    pub fn contains(&self, pos: usize) -> bool {
        pos < self.len && self.get_unchecked(pos)
    }
    #[inline]
    fn get_unchecked(&self, pos: usize) -> bool {
        (self.words[pos / WORD_BITS] >> (pos % WORD_BITS)) & 1 == 1
    }
    /// Set the bit at `pos` to 1
    pub fn set(&mut self, pos: usize) -> Result<()> {
        self.check(pos)?;
        self.words[pos / WORD_BITS] |= 1 << (pos % WORD_BITS);
        Ok(())
    }
    /// Set the bit at `pos` to 0
    pub fn unset(&mut self, pos: usize) -> Result<()> {
        self.check(pos)?;
        self.words[pos / WORD_BITS] &= !(1 << (pos % WORD_BITS));
        Ok(())
    }
    /// Set the bit at `pos` to `value`
    pub fn set_value(&mut self, pos: usize, value: bool) -> Result<()> {
        if value {
            self.set(pos)
        } else {
            self.unset(pos)
        }
    }
    /// Toggle the bit at `pos`
    pub fn flip(&mut self, pos: usize) -> Result<()> {
        self.check(pos)?;
        self.words[pos / WORD_BITS] ^= 1 << (pos % WORD_BITS);
        Ok(())
    }
    /// Toggle every bit
    pub fn flip_all(&mut self) {
        for w in self.words.iter_mut() {
            *w = !*w;
        }
        self.clear_excess_bits();
    }
    /// Set every bit to 0, keeping the size
    pub fn clear(&mut self) {
        for w in self.words.iter_mut() {
            *w = 0;
        }
    }
    /// `true` if at least one bit is set
    pub fn any(&self) -> bool {
        self.words.iter().any(|&w| w != 0)
    }
    /// `true` if no bit is set
    pub fn none(&self) -> bool {
        !self.any()
    }
    ///
    /// Append a bit at the end, growing the size by one.
    ///
    pub fn push(&mut self, value: bool) {
        if self.len % WORD_BITS == 0 {
            self.words.push(0);
        }
        let pos = self.len;
        self.len += 1;
        if value {
            self.words[pos / WORD_BITS] |= 1 << (pos % WORD_BITS);
        }
    }
    ///
    /// Change the size to `len`. Existing bits below `len` are preserved,
    /// new bits are zero.
    ///
    pub fn resize(&mut self, len: usize) {
        self.words.resize(n_words(len), 0);
        self.len = len;
        self.clear_excess_bits();
    }
    ///
    /// Reserve capacity for at least `len` bits in total.
    ///
    pub fn reserve(&mut self, len: usize) {
        let additional = n_words(len).saturating_sub(self.words.len());
        self.words.reserve(additional);
    }
    fn clear_excess_bits(&mut self) {
        let rem = self.len % WORD_BITS;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= mask_below(rem);
            }
        }
    }
    /// clear every bit at position `>= pos`
    fn clear_from(&mut self, pos: usize) {
        let w = pos / WORD_BITS;
        if w < self.words.len() {
            self.words[w] &= mask_below(pos % WORD_BITS);
            for word in self.words[w + 1..].iter_mut() {
                *word = 0;
            }
        }
    }
    /// clear every bit at position `< pos`
    fn clear_below(&mut self, pos: usize) {
        let w = (pos / WORD_BITS).min(self.words.len());
        for word in self.words[..w].iter_mut() {
            *word = 0;
        }
        if w < self.words.len() {
            self.words[w] &= !mask_below(pos % WORD_BITS);
        }
    }
}

//
// counting and scanning
//
impl BitSet {
    ///
    /// Population count
    ///
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
    ///
    /// Rank query: the number of set bits at positions `< pos`.
    /// `pos == len` is allowed (gives `count()`).
    ///
    /// Maps a sparse bit position to its index in a dense array of the
    /// set positions.
    ///
    pub fn count_before(&self, pos: usize) -> Result<usize> {
        if pos > self.len {
            return Err(BitSetError::OutOfRange { pos, len: self.len });
        }
        let w = pos / WORD_BITS;
        let full: usize = self.words[..w]
            .iter()
            .map(|x| x.count_ones() as usize)
            .sum();
        let partial = if pos % WORD_BITS != 0 {
            (self.words[w] & mask_below(pos % WORD_BITS)).count_ones() as usize
        } else {
            0
        };
        Ok(full + partial)
    }
    /// `true` if an odd number of bits are set
    pub fn parity(&self) -> bool {
        self.words
            .iter()
            .fold(0u32, |acc, w| acc ^ (w.count_ones() & 1))
            == 1
    }
    ///
    /// Lowest set position
    ///
    pub fn find_first(&self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .find(|(_, &w)| w != 0)
            .map(|(i, &w)| i * WORD_BITS + lowest_bit(w))
    }
    ///
    /// Lowest set position at or after `pos`
    ///
    pub fn find_first_from(&self, pos: usize) -> Option<usize> {
        if pos >= self.len {
            return None;
        }
        let w = pos / WORD_BITS;
        let head = self.words[w] & !mask_below(pos % WORD_BITS);
        if head != 0 {
            return Some(w * WORD_BITS + lowest_bit(head));
        }
        self.words[w + 1..]
            .iter()
            .enumerate()
            .find(|(_, &x)| x != 0)
            .map(|(i, &x)| (w + 1 + i) * WORD_BITS + lowest_bit(x))
    }
    ///
    /// Highest set position
    ///
    pub fn find_last(&self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .rev()
            .find(|(_, &w)| w != 0)
            .map(|(i, &w)| i * WORD_BITS + highest_bit(w))
    }
    ///
    /// Highest set position at or before `pos`.
    /// `pos` beyond the end searches the whole bitset.
    ///
    pub fn find_last_before(&self, pos: usize) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let pos = pos.min(self.len - 1);
        let w = pos / WORD_BITS;
        let head = self.words[w] & mask_below(pos % WORD_BITS + 1);
        if head != 0 {
            return Some(w * WORD_BITS + highest_bit(head));
        }
        self.words[..w]
            .iter()
            .enumerate()
            .rev()
            .find(|(_, &x)| x != 0)
            .map(|(i, &x)| i * WORD_BITS + highest_bit(x))
    }
    ///
    /// Iterator over the set positions in increasing order
    ///
    pub fn ones(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }
    ///
    /// Convert into `Vec<bool>` of length `len`
    ///
    pub fn to_bools(&self) -> Vec<bool> {
        (0..self.len).map(|i| self.get_unchecked(i)).collect()
    }
}

///
/// Iterator of set positions (`BitSet::ones`)
///
pub struct Ones<'a> {
    words: &'a [u64],
    index: usize,
    current: u64,
}

impl<'a> Iterator for Ones<'a> {
    type Item = usize;
    fn next(&mut self) -> Option<usize> {
        while self.current == 0 {
            self.index += 1;
            if self.index >= self.words.len() {
                return None;
            }
            self.current = self.words[self.index];
        }
        let bit = lowest_bit(self.current);
        // drop the lowest set bit
        self.current &= self.current - 1;
        Some(self.index * WORD_BITS + bit)
    }
}

//
// bitwise operations
//
impl BitSet {
    fn check_same_size(&self, other: &BitSet) -> Result<()> {
        if self.len == other.len {
            Ok(())
        } else {
            Err(BitSetError::SizeMismatch {
                left: self.len,
                right: other.len,
            })
        }
    }
    /// `self &= other`
    pub fn intersect_with(&mut self, other: &BitSet) -> Result<()> {
        self.check_same_size(other)?;
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a &= *b;
        }
        Ok(())
    }
    /// `self |= other`
    pub fn union_with(&mut self, other: &BitSet) -> Result<()> {
        self.check_same_size(other)?;
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a |= *b;
        }
        Ok(())
    }
    /// `self ^= other`
    pub fn xor_with(&mut self, other: &BitSet) -> Result<()> {
        self.check_same_size(other)?;
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a ^= *b;
        }
        Ok(())
    }
    /// `self &= !other` (bits set in self but not in other)
    pub fn difference_with(&mut self, other: &BitSet) -> Result<()> {
        self.check_same_size(other)?;
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a &= !*b;
        }
        Ok(())
    }
    /// `self & other`
    pub fn and(&self, other: &BitSet) -> Result<BitSet> {
        let mut r = self.clone();
        r.intersect_with(other)?;
        Ok(r)
    }
    /// `self | other`
    pub fn or(&self, other: &BitSet) -> Result<BitSet> {
        let mut r = self.clone();
        r.union_with(other)?;
        Ok(r)
    }
    /// `self ^ other`
    pub fn xor(&self, other: &BitSet) -> Result<BitSet> {
        let mut r = self.clone();
        r.xor_with(other)?;
        Ok(r)
    }
    ///
    /// Move every bit `n` positions toward higher indices, keeping the
    /// size. Bits moved beyond the end are dropped, vacated low bits are
    /// zero.
    ///
    pub fn shift_up(&mut self, n: usize) {
        let nw = self.words.len();
        let word_shift = n / WORD_BITS;
        let bit_shift = n % WORD_BITS;
        for i in (0..nw).rev() {
            self.words[i] = if i < word_shift {
                0
            } else {
                let src = i - word_shift;
                let mut v = self.words[src] << bit_shift;
                if bit_shift > 0 && src > 0 {
                    v |= self.words[src - 1] >> (WORD_BITS - bit_shift);
                }
                v
            };
        }
        self.clear_excess_bits();
    }
    ///
    /// Move every bit `n` positions toward lower indices, keeping the size.
    /// Vacated high bits are zero.
    ///
    pub fn shift_down(&mut self, n: usize) {
        let nw = self.words.len();
        let word_shift = n / WORD_BITS;
        let bit_shift = n % WORD_BITS;
        for i in 0..nw {
            let src = i + word_shift;
            self.words[i] = if src < nw {
                let mut v = self.words[src] >> bit_shift;
                if bit_shift > 0 && src + 1 < nw {
                    v |= self.words[src + 1] << (WORD_BITS - bit_shift);
                }
                v
            } else {
                0
            };
        }
    }
    ///
    /// Insert `n` zero bits at `pos`. Bits at `pos` and above move up by
    /// `n`; the size grows by `n`. `pos == len` appends.
    ///
    pub fn insert(&mut self, pos: usize, n: usize) -> Result<()> {
        if pos > self.len {
            return Err(BitSetError::OutOfRange { pos, len: self.len });
        }
        let new_len = self.len + n;
        let mut high = self.clone();
        high.clear_below(pos);
        high.resize(new_len);
        high.shift_up(n);
        self.clear_from(pos);
        self.resize(new_len);
        for (a, b) in self.words.iter_mut().zip(high.words.iter()) {
            *a |= *b;
        }
        Ok(())
    }
    ///
    /// Remove the bit at `pos`. Bits above `pos` move down by one; the
    /// size shrinks by one.
    ///
    pub fn erase(&mut self, pos: usize) -> Result<()> {
        self.check(pos)?;
        let mut high = self.clone();
        high.clear_below(pos + 1);
        high.shift_down(1);
        self.clear_from(pos);
        for (a, b) in self.words.iter_mut().zip(high.words.iter()) {
            *a |= *b;
        }
        self.resize(self.len - 1);
        Ok(())
    }
}

impl std::ops::Not for &BitSet {
    type Output = BitSet;
    fn not(self) -> BitSet {
        let mut r = self.clone();
        r.flip_all();
        r
    }
}

impl std::ops::Not for BitSet {
    type Output = BitSet;
    fn not(mut self) -> BitSet {
        self.flip_all();
        self
    }
}

//
// Display
//

/// highest position first (`"100"` has bit 2 set)
impl std::fmt::Display for BitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for i in (0..self.len).rev() {
            write!(f, "{}", if self.get_unchecked(i) { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for BitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "BitSet({}, \"{}\")", self.len, self)
    }
}

impl FromStr for BitSet {
    type Err = BitSetError;
    fn from_str(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.chars().collect();
        let mut bs = BitSet::new(chars.len());
        for (i, &c) in chars.iter().rev().enumerate() {
            match c {
                '1' => bs.set(i)?,
                '0' => {}
                _ => return Err(BitSetError::InvalidChar(c)),
            }
        }
        Ok(bs)
    }
}
