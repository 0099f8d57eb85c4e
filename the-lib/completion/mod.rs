//! Completion acceptance: what happens to the buffer once the user picks a
//! completion item.

pub mod class_insert;
pub mod config;
pub mod item;

use the_core::qualified::QualifiedNameError;
use thiserror::Error;

use crate::{
  document::DocumentError,
  syntax::EntityKind,
};

#[derive(Debug, Error)]
pub enum InsertError {
  /// The completion engine handed over a payload this handler was never
  /// registered for.
  #[error("unrecognized completion payload `{kind}` for class name insertion")]
  UnrecognizedPayload { kind: String },
  #[error("completion payload is a {kind:?} declaration, not a class")]
  NotAClass { kind: EntityKind },
  #[error("completion payload has no qualified name")]
  MissingQualifiedName,
  #[error("insertion range {start}..{tail} is invalid for document length {len}")]
  InvalidRange {
    start: usize,
    tail:  usize,
    len:   usize,
  },
  #[error(transparent)]
  QualifiedName(#[from] QualifiedNameError),
  #[error(transparent)]
  Document(#[from] DocumentError),
}

pub type Result<T> = std::result::Result<T, InsertError>;
