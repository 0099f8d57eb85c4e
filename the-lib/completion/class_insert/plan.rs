use std::ops::Range;

use the_core::qualified::QualifiedName;

use crate::{
  Tendril,
  completion::config::Scaffold,
};

/// The text written over the completed range: `prefix + name + suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPlan {
  prefix:         Tendril,
  suffix:         Tendril,
  qualified_name: QualifiedName,
}

impl EditPlan {
  /// `anchored` tells whether a reference node already exists at the
  /// insertion point.
  pub fn new(scaffold: &Scaffold, anchored: bool, qualified_name: QualifiedName) -> Self {
    let prefix = if anchored {
      &scaffold.anchored_prefix
    } else {
      &scaffold.detached_prefix
    };
    Self {
      prefix: prefix.as_str().into(),
      suffix: scaffold.suffix.as_str().into(),
      qualified_name,
    }
  }

  pub fn prefix(&self) -> &str {
    &self.prefix
  }

  pub fn suffix(&self) -> &str {
    &self.suffix
  }

  pub fn qualified_name(&self) -> &QualifiedName {
    &self.qualified_name
  }

  pub fn text(&self) -> Tendril {
    let mut text = self.prefix.clone();
    text.push_str(self.qualified_name.as_str());
    text.push_str(&self.suffix);
    text
  }

  /// Where the qualified name lands once the plan is written at `start`.
  pub fn class_name_range(&self, start: usize) -> Range<usize> {
    let name_start = start + self.prefix.chars().count();
    name_start..name_start + self.qualified_name.len_chars()
  }

  /// Everything the plan writes at `start`.
  pub fn whole_range(&self, start: usize) -> Range<usize> {
    start..self.class_name_range(start).end + self.suffix.chars().count()
  }
}
