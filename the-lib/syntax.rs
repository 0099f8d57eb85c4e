//! Seams to the structural and semantic models of a document.
//!
//! The editor core does not parse or resolve anything itself. Whatever hosts
//! the language support implements these traits; completion handlers only
//! talk to them.

use std::ops::Range;

use thiserror::Error;

use crate::{
  Tendril,
  document::{
    Document,
    DocumentError,
  },
};

/// A name reference node in the syntax tree, such as the `Bar` in
/// `val x: Bar`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceNode {
  pub range: Range<usize>,
  pub name:  Tendril,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
  Class,
  Function,
  Property,
  Package,
  Other,
}

/// The declaration a reference binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntity {
  pub kind:           EntityKind,
  /// `None` for declarations without a stable qualified name, e.g. local
  /// or anonymous classes.
  pub qualified_name: Option<Tendril>,
}

impl ResolvedEntity {
  pub fn new(kind: EntityKind, qualified_name: impl Into<Tendril>) -> Self {
    Self {
      kind,
      qualified_name: Some(qualified_name.into()),
    }
  }

  pub fn class(qualified_name: impl Into<Tendril>) -> Self {
    Self::new(EntityKind::Class, qualified_name)
  }

  pub fn is_class(&self) -> bool {
    self.kind == EntityKind::Class
  }

  pub fn qualified_name(&self) -> Option<&str> {
    self.qualified_name.as_deref()
  }
}

#[derive(Debug, Error)]
pub enum ShortenError {
  #[error("no reference found in {}..{}", range.start, range.end)]
  NoReference { range: Range<usize> },
  #[error("reference `{name}` could not be resolved")]
  Unresolved { name: String },
  #[error(transparent)]
  Document(#[from] DocumentError),
}

/// Locates the reference node covering an offset.
pub trait ReferenceFinder {
  fn reference_at(&self, doc: &Document, offset: usize) -> Option<ReferenceNode>;
}

/// Resolves a single reference without analyzing the rest of the file.
pub trait Resolver {
  /// Best-effort resolution of `node`. `None` covers both unresolvable and
  /// ambiguous references.
  fn partial_resolve(&self, doc: &Document, node: &ReferenceNode) -> Option<ResolvedEntity>;
}

/// Rewrites qualified references to the shortest form that still resolves
/// to the same declaration, adding imports where needed.
pub trait ReferenceShortener {
  /// Shorten the references within `range`. Implementations may edit the
  /// document anywhere, and may queue formatting through
  /// [`Document::postpone`].
  fn shorten(&self, doc: &mut Document, range: Range<usize>) -> Result<(), ShortenError>;
}
