//! Operational transformation primitives for document editing.
//!
//! Changes are represented as a sequence of [`Operation`]s applied from the
//! start of the document:
//!
//! - **Retain(n)** - Keep `n` characters unchanged
//! - **Delete(n)** - Remove `n` characters
//! - **Insert(s)** - Insert string `s`
//!
//! A [`ChangeSet`] transforms a document of one specific length into a new
//! document. A [`Transaction`] wraps a change set built from `(from, to,
//! replacement)` triples expressed in the coordinates of the old document.
//!
//! ```ignore
//! use the_lib::transaction::Transaction;
//! use ropey::Rope;
//!
//! let mut doc = Rope::from("hello world");
//! let tx = Transaction::change(&doc, vec![(6, 11, Some("rust".into()))]).unwrap();
//! tx.apply(&mut doc).unwrap();
//! assert_eq!(doc.to_string(), "hello rust");
//! ```
//!
//! # Position Mapping
//!
//! Offsets held across an edit (cursors, range markers) are carried forward
//! with [`ChangeSet::map_pos`]. [`Assoc`] decides which side of an insertion
//! made exactly at the position the mapped offset lands on.
//!
//! # Composition
//!
//! Two change sets compose when the output length of the first matches the
//! input length of the second. Documents use this to accumulate every edit
//! made since the last commit into a single change set.

use std::iter::Peekable;

use ropey::{
  Rope,
  RopeSlice,
};
use thiserror::Error;

use crate::Tendril;

pub type Result<T> = std::result::Result<T, TransactionError>;

/// (from, to) replacement.
pub type Change = (usize, usize, Option<Tendril>);
pub type Deletion = (usize, usize);

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransactionError {
  #[error("changeset length mismatch: expected {expected}, got {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error(
    "changeset compose length mismatch: left output {left_len_after}, right input {right_len}"
  )]
  ComposeLengthMismatch {
    left_len_after: usize,
    right_len:      usize,
  },
  #[error("invalid change range: start {from} is after end {to}")]
  InvalidRange { from: usize, to: usize },
  #[error("change range {from}..{to} is out of bounds for document length {len}")]
  RangeOutOfBounds {
    from: usize,
    to:   usize,
    len:  usize,
  },
  #[error("change range {from}..{to} overlaps previous end {prev_end}")]
  OverlappingRange {
    prev_end: usize,
    from:     usize,
    to:       usize,
  },
  #[error("position {pos} is out of bounds for changeset length {len}")]
  PositionOutOfBounds { pos: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
  /// Move cursor by n characters.
  Retain(usize),

  /// Delete n characters.
  Delete(usize),

  /// Insert text at position.
  Insert(Tendril),
}

impl Operation {
  pub fn len_chars(&self) -> usize {
    match self {
      Operation::Retain(n) | Operation::Delete(n) => *n,
      Operation::Insert(s) => s.chars().count(),
    }
  }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
  /// Stay before text inserted at the position.
  Before,
  /// Move past text inserted at the position.
  After,
}

impl Assoc {
  fn insert_offset(self, s: &str) -> usize {
    match self {
      Assoc::Before => 0,
      Assoc::After => s.chars().count(),
    }
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
  pub(crate) changes: Vec<Operation>,
  /// The required document length. Will refuse to apply changes unless it
  /// matches.
  len:                usize,
  len_after:          usize,
}

impl ChangeSet {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      changes:   Vec::with_capacity(capacity),
      len:       0,
      len_after: 0,
    }
  }

  #[must_use]
  pub fn new(doc: RopeSlice) -> Self {
    let len = doc.len_chars();
    Self {
      changes: Vec::new(),
      len,
      len_after: len,
    }
  }

  pub fn changes(&self) -> &[Operation] {
    &self.changes
  }

  /// Returns the expected document length for this changeset
  pub fn len(&self) -> usize {
    self.len
  }

  /// Returns the document length after this changeset is applied
  pub fn len_after(&self) -> usize {
    self.len_after
  }

  // Changeset builder operations: delete/insert/retain.
  //

  pub fn delete(&mut self, n: usize) {
    use Operation::*;

    if n == 0 {
      return;
    }

    self.len += n;

    if let Some(Delete(count)) = self.changes.last_mut() {
      *count += n;
    } else {
      self.changes.push(Delete(n))
    }
  }

  pub fn insert(&mut self, fragment: Tendril) {
    use Operation::*;

    if fragment.is_empty() {
      return;
    }

    self.len_after += fragment.chars().count();

    // Inserts are kept in front of deletes so that a replacement always reads
    // as `Insert, Delete`.
    let new_last = match self.changes.as_mut_slice() {
      [.., Insert(prev)] | [.., Insert(prev), Delete(_)] => {
        prev.push_str(&fragment);
        return;
      },
      [.., last @ Delete(_)] => std::mem::replace(last, Insert(fragment)),
      _ => Insert(fragment),
    };

    self.changes.push(new_last);
  }

  pub fn retain(&mut self, n: usize) {
    use Operation::*;

    if n == 0 {
      return;
    }

    self.len += n;
    self.len_after += n;

    if let Some(Retain(count)) = self.changes.last_mut() {
      *count += n;
    } else {
      self.changes.push(Retain(n))
    }
  }

  /// Combine two `ChangeSet` together.
  pub fn compose(self, other: Self) -> Result<Self> {
    if self.len_after != other.len {
      return Err(TransactionError::ComposeLengthMismatch {
        left_len_after: self.len_after,
        right_len:      other.len,
      });
    }

    // Composing fails in weird ways if one of the sets is empty
    if self.changes.is_empty() {
      return Ok(other);
    }
    if other.changes.is_empty() {
      return Ok(self);
    }

    let len = self.len;
    let capacity = self.changes.len();
    let mut changes_a = self.changes.into_iter();
    let mut changes_b = other.changes.into_iter();

    let mut head_a = changes_a.next();
    let mut head_b = changes_b.next();

    let mut changes = Self::with_capacity(capacity);

    loop {
      use std::cmp::Ordering;

      use Operation::*;
      match (head_a, head_b) {
        (None, None) => break,
        // deletion in A
        (Some(Delete(i)), b) => {
          changes.delete(i);
          head_a = changes_a.next();
          head_b = b;
        },
        // insertion in B
        (a, Some(Insert(current))) => {
          changes.insert(current);
          head_a = a;
          head_b = changes_b.next();
        },
        (None, val) | (val, None) => unreachable!("({:?})", val),
        (Some(Retain(i)), Some(Retain(j))) => {
          match i.cmp(&j) {
            Ordering::Less => {
              changes.retain(i);
              head_a = changes_a.next();
              head_b = Some(Retain(j - i));
            },
            Ordering::Equal => {
              changes.retain(i);
              head_a = changes_a.next();
              head_b = changes_b.next();
            },
            Ordering::Greater => {
              changes.retain(j);
              head_a = Some(Retain(i - j));
              head_b = changes_b.next();
            },
          }
        },
        (Some(Insert(mut s)), Some(Delete(j))) => {
          let len = s.chars().count();
          match len.cmp(&j) {
            Ordering::Less => {
              head_a = changes_a.next();
              head_b = Some(Delete(j - len));
            },
            Ordering::Equal => {
              head_a = changes_a.next();
              head_b = changes_b.next();
            },
            Ordering::Greater => {
              s.replace_range(0..char_to_byte(&s, j), "");
              head_a = Some(Insert(s));
              head_b = changes_b.next();
            },
          }
        },
        (Some(Insert(s)), Some(Retain(j))) => {
          let len = s.chars().count();
          match len.cmp(&j) {
            Ordering::Less => {
              changes.insert(s);
              head_a = changes_a.next();
              head_b = Some(Retain(j - len));
            },
            Ordering::Equal => {
              changes.insert(s);
              head_a = changes_a.next();
              head_b = changes_b.next();
            },
            Ordering::Greater => {
              let mut before = s;
              let after = before.split_off(char_to_byte(&before, j));

              changes.insert(before);
              head_a = Some(Insert(after));
              head_b = changes_b.next();
            },
          }
        },
        (Some(Retain(i)), Some(Delete(j))) => {
          match i.cmp(&j) {
            Ordering::Less => {
              changes.delete(i);
              head_a = changes_a.next();
              head_b = Some(Delete(j - i));
            },
            Ordering::Equal => {
              changes.delete(j);
              head_a = changes_a.next();
              head_b = changes_b.next();
            },
            Ordering::Greater => {
              changes.delete(j);
              head_a = Some(Retain(i - j));
              head_b = changes_b.next();
            },
          }
        },
      };
    }

    debug_assert!(changes.len == len);

    Ok(changes)
  }

  fn ensure_len(&self, text_len: usize) -> Result<()> {
    if text_len != self.len {
      return Err(TransactionError::LengthMismatch {
        expected: self.len,
        actual:   text_len,
      });
    }
    Ok(())
  }

  /// Apply this changeset in-place.
  pub fn apply(&self, text: &mut Rope) -> Result<()> {
    self.ensure_len(text.len_chars())?;
    let mut pos = 0;

    for change in &self.changes {
      use Operation::*;
      match change {
        Retain(n) => pos += n,
        Delete(n) => text.remove(pos..pos + *n),
        Insert(s) => {
          text.insert(pos, s);
          pos += s.chars().count();
        },
      }
    }

    Ok(())
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.changes.is_empty() || self.changes == [Operation::Retain(self.len)]
  }

  /// Map a position through the changes.
  ///
  /// A position inside deleted text collapses onto the start of the
  /// deletion. A position sitting exactly where text is inserted stays in
  /// front of it with [`Assoc::Before`] and moves past it with
  /// [`Assoc::After`]. A position at the start of a replacement stays at the
  /// start; one strictly inside the replaced text lands before or after the
  /// new text according to `assoc`.
  pub fn map_pos(&self, pos: usize, assoc: Assoc) -> Result<usize> {
    use Operation::*;

    if pos > self.len {
      return Err(TransactionError::PositionOutOfBounds { pos, len: self.len });
    }

    let mut old_pos = 0;
    let mut new_pos = 0;
    let mut iter = self.changes.iter().peekable();

    while let Some(change) = iter.next() {
      match change {
        Retain(n) => {
          if pos < old_pos + n {
            return Ok(new_pos + (pos - old_pos));
          }
          old_pos += n;
          new_pos += n;
        },
        Delete(n) => {
          if pos < old_pos + n {
            return Ok(new_pos);
          }
          old_pos += n;
        },
        Insert(s) => {
          // a subsequent delete means a replace, consume it
          if let Some(Delete(n)) = iter.peek() {
            let n = *n;
            iter.next();
            if pos < old_pos + n {
              return Ok(if pos == old_pos {
                new_pos
              } else {
                new_pos + assoc.insert_offset(s)
              });
            }
            old_pos += n;
          } else if pos == old_pos {
            return Ok(new_pos + assoc.insert_offset(s));
          }
          new_pos += s.chars().count();
        },
      }
    }

    Ok(new_pos + (pos - old_pos))
  }

  pub fn changes_iter(&self) -> ChangeIterator<'_> {
    ChangeIterator::new(self)
  }
}

fn char_to_byte(s: &str, char_idx: usize) -> usize {
  s.char_indices()
    .nth(char_idx)
    .map_or(s.len(), |(byte, _)| byte)
}

/// Iterates the changes of a [`ChangeSet`] as `(from, to, replacement)`
/// triples in the coordinates of the old document.
pub struct ChangeIterator<'a> {
  iter: Peekable<std::slice::Iter<'a, Operation>>,
  pos:  usize,
}

impl<'a> ChangeIterator<'a> {
  fn new(changeset: &'a ChangeSet) -> Self {
    let iter = changeset.changes.iter().peekable();
    Self { iter, pos: 0 }
  }
}

impl Iterator for ChangeIterator<'_> {
  type Item = Change;

  fn next(&mut self) -> Option<Self::Item> {
    use Operation::*;

    loop {
      match self.iter.next()? {
        Retain(len) => {
          self.pos += len;
        },
        Delete(len) => {
          let start = self.pos;
          self.pos += len;
          return Some((start, self.pos, None));
        },
        Insert(s) => {
          let start = self.pos;
          if let Some(Delete(len)) = self.iter.peek() {
            self.iter.next();

            self.pos += len;
            return Some((start, self.pos, Some(s.clone())));
          } else {
            return Some((start, start, Some(s.clone())));
          }
        },
      }
    }
  }
}

fn validate_change_bounds(from: usize, to: usize, len: usize) -> Result<()> {
  if from > to {
    return Err(TransactionError::InvalidRange { from, to });
  }
  if to > len {
    return Err(TransactionError::RangeOutOfBounds { from, to, len });
  }
  Ok(())
}

impl From<ChangeSet> for Transaction {
  fn from(changes: ChangeSet) -> Self {
    Self { changes }
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transaction {
  changes: ChangeSet,
}

impl Transaction {
  pub fn new(doc: &Rope) -> Self {
    Self {
      changes: ChangeSet::new(doc.slice(..)),
    }
  }

  /// Changes made to the buffer.
  pub fn changes(&self) -> &ChangeSet {
    &self.changes
  }

  /// Apply this transaction in-place.
  pub fn apply(&self, doc: &mut Rope) -> Result<()> {
    self.changes.apply(doc)
  }

  pub fn compose(mut self, other: Self) -> Result<Self> {
    self.changes = self.changes.compose(other.changes)?;
    Ok(self)
  }

  /// Generate a transaction from a set of changes. Changes must be sorted by
  /// position and must not overlap.
  pub fn change<I>(doc: &Rope, changes: I) -> Result<Self>
  where
    I: IntoIterator<Item = Change>,
  {
    let len = doc.len_chars();
    let changes = changes.into_iter();
    let (lower, upper) = changes.size_hint();
    let size = upper.unwrap_or(lower);
    let mut changeset = ChangeSet::with_capacity(2 * size + 1); // rough estimate

    let mut last = 0;
    for (from, to, tendril) in changes {
      validate_change_bounds(from, to, len)?;
      if from < last {
        return Err(TransactionError::OverlappingRange {
          prev_end: last,
          from,
          to,
        });
      }

      // Retain from last "to" to current "from"
      changeset.retain(from - last);
      let span = to - from;
      match tendril {
        Some(text) => {
          changeset.insert(text);
          changeset.delete(span);
        },
        None => changeset.delete(span),
      }
      last = to;
    }

    changeset.retain(len - last);

    Ok(Self::from(changeset))
  }

  /// Replace a single range.
  pub fn replace(doc: &Rope, from: usize, to: usize, text: impl Into<Tendril>) -> Result<Self> {
    Self::change(doc, [(from, to, Some(text.into()))])
  }

  /// Generate a transaction from a set of potentially overlapping deletions
  /// by merging overlapping deletions together.
  pub fn delete<I>(doc: &Rope, deletions: I) -> Result<Self>
  where
    I: IntoIterator<Item = Deletion>,
  {
    let len = doc.len_chars();

    let mut deletions: Vec<_> = deletions.into_iter().collect();
    deletions.sort_by_key(|(from, to)| (*from, *to));

    let mut merged = Vec::with_capacity(deletions.len());
    for (from, to) in deletions {
      validate_change_bounds(from, to, len)?;
      match merged.last_mut() {
        Some((_, last_end)) if from <= *last_end => {
          *last_end = (*last_end).max(to);
        },
        _ => merged.push((from, to)),
      }
    }

    Self::change(doc, merged.into_iter().map(|(from, to)| (from, to, None)))
  }

  pub fn changes_iter(&self) -> ChangeIterator<'_> {
    self.changes.changes_iter()
  }
}
