//! Range markers: spans that follow the text they were created over.
//!
//! A marker is created over `[start, end)` in a [`Document`] and is carried
//! through every change the document applies afterwards. Text inserted
//! before the span shifts it, text deleted inside it shrinks it, and a change
//! that removes the whole span invalidates the marker for good.
//!
//! Markers are non-greedy by default: text inserted exactly at `start` or at
//! `end` lands outside the span. [`Stickiness`] opts into absorbing it.
//!
//! [`Document`]: crate::document::Document

use std::ops::Range;

use slotmap::new_key_type;

use crate::transaction::{
  Assoc,
  ChangeSet,
  Result,
};

new_key_type! {
  /// Handle to a marker owned by a [`Document`](crate::document::Document).
  pub struct MarkerId;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stickiness {
  /// Absorb text inserted exactly at the start of the span.
  pub greedy_to_left:  bool,
  /// Absorb text inserted exactly at the end of the span.
  pub greedy_to_right: bool,
}

impl Stickiness {
  fn start_assoc(self) -> Assoc {
    if self.greedy_to_left {
      Assoc::Before
    } else {
      Assoc::After
    }
  }

  fn end_assoc(self) -> Assoc {
    if self.greedy_to_right {
      Assoc::After
    } else {
      Assoc::Before
    }
  }
}

/// Point-in-time view of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeMarker {
  pub start: usize,
  pub end:   usize,
  pub valid: bool,
}

impl RangeMarker {
  pub fn range(&self) -> Range<usize> {
    self.start..self.end
  }

  pub fn len(&self) -> usize {
    self.end - self.start
  }

  pub fn is_empty(&self) -> bool {
    self.start == self.end
  }

  /// Whether `other` lies within this span.
  pub fn contains(&self, other: &RangeMarker) -> bool {
    self.start <= other.start && other.end <= self.end
  }
}

#[derive(Debug, Clone)]
pub(crate) struct MarkerState {
  start:      usize,
  end:        usize,
  stickiness: Stickiness,
  valid:      bool,
}

impl MarkerState {
  pub(crate) fn new(start: usize, end: usize, stickiness: Stickiness) -> Self {
    debug_assert!(start <= end);
    Self {
      start,
      end,
      stickiness,
      valid: true,
    }
  }

  pub(crate) fn snapshot(&self) -> RangeMarker {
    RangeMarker {
      start: self.start,
      end:   self.end,
      valid: self.valid,
    }
  }

  /// Carry the span through `changes`, which must apply to the document the
  /// span currently refers to.
  pub(crate) fn track(&mut self, changes: &ChangeSet) -> Result<()> {
    if !self.valid {
      return Ok(());
    }

    if self.start < self.end
      && changes
        .changes_iter()
        .any(|(from, to, _)| from < to && from <= self.start && self.end <= to)
    {
      self.valid = false;
      return Ok(());
    }

    let start = changes.map_pos(self.start, self.stickiness.start_assoc())?;
    let end = changes.map_pos(self.end, self.stickiness.end_assoc())?;
    self.start = start;
    // an empty non-greedy span sees an insertion on both sides
    self.end = end.max(start);
    Ok(())
  }
}
