//! Document text, range markers, and the commit point for structural models.
//!
//! A [`Document`] owns a rope, the changes applied since the last
//! [`commit`](Document::commit), and every live [`RangeMarker`]. Syntax
//! layers and resolvers look at a document only after a commit, so callers
//! that edit and then query must commit in between.
//!
//! # Postponed edits
//!
//! Formatters running on behalf of another edit can queue their changes with
//! [`Document::postpone`] instead of applying them immediately. While the
//! queue is non-empty the document is blocked: direct edits fail with
//! [`DocumentError::Blocked`] until [`Document::flush_postponed`] applies the
//! queue as one transaction.
//!
//! # Example
//!
//! ```no_run
//! use ropey::Rope;
//! use the_lib::document::Document;
//!
//! let mut doc = Document::new(Rope::from("val x = com.foo.Bar"));
//! let marker = doc.create_marker(8, 19).unwrap();
//! doc.delete(8, 16).unwrap();
//! assert_eq!(doc.marker(marker).unwrap().range(), 8..11);
//! doc.commit();
//! ```

use std::ops::Range;

use ropey::{
  Rope,
  RopeSlice,
};
use slotmap::SlotMap;
use thiserror::Error;

use crate::{
  Tendril,
  marker::{
    MarkerId,
    MarkerState,
    RangeMarker,
    Stickiness,
  },
  transaction::{
    Change,
    ChangeSet,
    Transaction,
    TransactionError,
  },
};

#[derive(Debug, Error)]
pub enum DocumentError {
  #[error("document is blocked by {pending} postponed edit(s)")]
  Blocked { pending: usize },
  #[error("range {from}..{to} is invalid for document length {len}")]
  InvalidRange { from: usize, to: usize, len: usize },
  #[error(transparent)]
  Transaction(#[from] TransactionError),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

#[derive(Debug)]
pub struct Document {
  text:      Rope,
  language:  Option<Tendril>,
  /// Changes applied since the last commit.
  changes:   ChangeSet,
  postponed: Vec<Change>,
  markers:   SlotMap<MarkerId, MarkerState>,
  version:   u64,
}

impl Document {
  pub fn new(text: Rope) -> Self {
    let changes = ChangeSet::new(text.slice(..));
    Self {
      text,
      language: None,
      changes,
      postponed: Vec::new(),
      markers: SlotMap::with_key(),
      version: 0,
    }
  }

  pub fn text(&self) -> &Rope {
    &self.text
  }

  pub fn len_chars(&self) -> usize {
    self.text.len_chars()
  }

  pub fn slice(&self, range: Range<usize>) -> Option<RopeSlice<'_>> {
    self.text.get_slice(range)
  }

  /// Name of the language the text is written in, as used by language
  /// configuration.
  pub fn language(&self) -> Option<&str> {
    self.language.as_deref()
  }

  pub fn set_language(&mut self, language: impl Into<Tendril>) {
    self.language = Some(language.into());
  }

  /// Incremented by every applied change.
  pub fn version(&self) -> u64 {
    self.version
  }

  /// Whether every applied change has been committed.
  pub fn is_committed(&self) -> bool {
    self.changes.is_empty()
  }

  pub fn is_blocked(&self) -> bool {
    !self.postponed.is_empty()
  }

  pub fn apply_transaction(&mut self, transaction: &Transaction) -> Result<()> {
    if self.is_blocked() {
      return Err(DocumentError::Blocked {
        pending: self.postponed.len(),
      });
    }
    self.apply_unblocked(transaction)
  }

  fn apply_unblocked(&mut self, transaction: &Transaction) -> Result<()> {
    let changes = transaction.changes();
    if changes.is_empty() {
      return Ok(());
    }

    transaction.apply(&mut self.text)?;

    for marker in self.markers.values_mut() {
      marker.track(changes)?;
    }

    let prior = std::mem::take(&mut self.changes);
    self.changes = prior.compose(changes.clone())?;
    self.version = self.version.saturating_add(1);

    Ok(())
  }

  pub fn replace(&mut self, from: usize, to: usize, text: impl Into<Tendril>) -> Result<()> {
    let tx = Transaction::replace(&self.text, from, to, text)?;
    self.apply_transaction(&tx)
  }

  pub fn insert(&mut self, at: usize, text: impl Into<Tendril>) -> Result<()> {
    self.replace(at, at, text)
  }

  pub fn delete(&mut self, from: usize, to: usize) -> Result<()> {
    let tx = Transaction::delete(&self.text, [(from, to)])?;
    self.apply_transaction(&tx)
  }

  /// Hand the changes applied since the last commit to the caller and start
  /// a new, empty change set. This is the point where structural models
  /// resynchronize with the text.
  pub fn commit(&mut self) -> ChangeSet {
    let committed = std::mem::replace(&mut self.changes, ChangeSet::new(self.text.slice(..)));
    if !committed.is_empty() {
      tracing::trace!(version = self.version, "document committed");
    }
    committed
  }

  /// Queue an edit expressed in current coordinates. The document stays
  /// blocked until [`Document::flush_postponed`] runs.
  pub fn postpone(&mut self, from: usize, to: usize, text: impl Into<Tendril>) -> Result<()> {
    self.check_range(from, to)?;
    let text: Tendril = text.into();
    self
      .postponed
      .push((from, to, (!text.is_empty()).then_some(text)));
    Ok(())
  }

  /// Apply every postponed edit as one transaction and unblock the document.
  /// Returns the number of edits applied. The queue is cleared even when the
  /// edits conflict with each other.
  pub fn flush_postponed(&mut self) -> Result<usize> {
    let mut postponed = std::mem::take(&mut self.postponed);
    if postponed.is_empty() {
      return Ok(0);
    }
    postponed.sort_by_key(|(from, to, _)| (*from, *to));
    let count = postponed.len();
    let tx = Transaction::change(&self.text, postponed)?;
    self.apply_unblocked(&tx)?;
    tracing::trace!(count, "applied postponed edits");
    Ok(count)
  }

  pub fn create_marker(&mut self, from: usize, to: usize) -> Result<MarkerId> {
    self.create_marker_with(from, to, Stickiness::default())
  }

  pub fn create_marker_with(
    &mut self,
    from: usize,
    to: usize,
    stickiness: Stickiness,
  ) -> Result<MarkerId> {
    self.check_range(from, to)?;
    Ok(self.markers.insert(MarkerState::new(from, to, stickiness)))
  }

  /// Current state of a marker, `None` once it has been released.
  pub fn marker(&self, id: MarkerId) -> Option<RangeMarker> {
    self.markers.get(id).map(MarkerState::snapshot)
  }

  /// Current state of a marker that is still valid.
  pub fn valid_marker(&self, id: MarkerId) -> Option<RangeMarker> {
    self.marker(id).filter(|marker| marker.valid)
  }

  pub fn release_marker(&mut self, id: MarkerId) -> Option<RangeMarker> {
    self.markers.remove(id).map(|state| state.snapshot())
  }

  pub fn marker_count(&self) -> usize {
    self.markers.len()
  }

  fn check_range(&self, from: usize, to: usize) -> Result<()> {
    let len = self.text.len_chars();
    if from > to || to > len {
      return Err(DocumentError::InvalidRange { from, to, len });
    }
    Ok(())
  }
}

impl From<&str> for Document {
  fn from(text: &str) -> Self {
    Self::new(Rope::from(text))
  }
}
