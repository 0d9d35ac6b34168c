//!
//! `SparseArray<T>`: array with mostly undefined positions
//!
//! A `BitSet` flags the defined positions and the values are stored densely
//! in position order. The dense index of a position is its rank
//! `flag.count_before(pos)`.
//!
use super::BitSet;
use crate::error::BitSetError;

type Result<T> = std::result::Result<T, BitSetError>;

#[derive(Clone, Debug, PartialEq)]
pub struct SparseArray<T> {
    flag: BitSet,
    values: Vec<T>,
}

impl<T> Default for SparseArray<T> {
    fn default() -> Self {
        SparseArray::new(0)
    }
}

impl<T> SparseArray<T> {
    /// Create an array of `len` undefined positions
    pub fn new(len: usize) -> Self {
        SparseArray {
            flag: BitSet::new(len),
            values: Vec::new(),
        }
    }
    /// Logical length (defined and undefined positions)
    pub fn len(&self) -> usize {
        self.flag.len()
    }
    pub fn is_empty(&self) -> bool {
        self.flag.is_empty()
    }
    /// Number of defined positions
    pub fn n_defined(&self) -> usize {
        self.values.len()
    }
    /// `true` if a value is stored at `pos`
    pub fn defined(&self, pos: usize) -> bool {
        self.flag.contains(pos)
    }
    /// Bitset of defined positions
    pub fn flags(&self) -> &BitSet {
        &self.flag
    }
    fn dense_index(&self, pos: usize) -> Option<usize> {
        if self.flag.contains(pos) {
            self.flag.count_before(pos).ok()
        } else {
            None
        }
    }
    ///
    /// Value at `pos`, `None` if undefined or out of range.
    ///
    pub fn get(&self, pos: usize) -> Option<&T> {
        self.dense_index(pos).map(|i| &self.values[i])
    }
    pub fn get_mut(&mut self, pos: usize) -> Option<&mut T> {
        match self.dense_index(pos) {
            Some(i) => Some(&mut self.values[i]),
            None => None,
        }
    }
    ///
    /// Define `pos` with `value`. Returns the previous value if `pos` was
    /// already defined.
    ///
    pub fn insert(&mut self, pos: usize, value: T) -> Result<Option<T>> {
        let index = self.flag.count_before(pos)?;
        if self.flag.at(pos)? {
            Ok(Some(std::mem::replace(&mut self.values[index], value)))
        } else {
            self.flag.set(pos)?;
            self.values.insert(index, value);
            Ok(None)
        }
    }
    ///
    /// Undefine `pos`, returning its value.
    ///
    pub fn remove(&mut self, pos: usize) -> Result<Option<T>> {
        if !self.flag.at(pos)? {
            return Ok(None);
        }
        let index = self.flag.count_before(pos)?;
        self.flag.unset(pos)?;
        Ok(Some(self.values.remove(index)))
    }
    ///
    /// Append one position at the end, defined if `value` is `Some`.
    ///
    pub fn push(&mut self, value: Option<T>) {
        match value {
            Some(v) => {
                self.flag.push(true);
                self.values.push(v);
            }
            None => self.flag.push(false),
        }
    }
    ///
    /// Change the logical length. Values at positions `>= len` are dropped.
    ///
    pub fn resize(&mut self, len: usize) {
        self.flag.resize(len);
        self.values.truncate(self.flag.count());
    }
    ///
    /// Insert `n` undefined positions at `pos`, moving later values up.
    ///
    pub fn insert_gap(&mut self, pos: usize, n: usize) -> Result<()> {
        self.flag.insert(pos, n)
    }
    ///
    /// Delete position `pos` entirely, moving later values down by one.
    ///
    pub fn erase(&mut self, pos: usize) -> Result<Option<T>> {
        let removed = self.remove(pos)?;
        self.flag.erase(pos)?;
        Ok(removed)
    }
    /// Undefine every position, keeping the length
    pub fn clear(&mut self) {
        self.flag.clear();
        self.values.clear();
    }
    ///
    /// Iterator of `(pos, &value)` of the defined positions in order
    ///
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.flag.ones().zip(self.values.iter())
    }
}
