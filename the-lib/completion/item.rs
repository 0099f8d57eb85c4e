use std::{
  borrow::Cow,
  fmt,
};

use the_core::qualified::QualifiedName;

use super::{
  InsertError,
  Result,
};
use crate::{
  Tendril,
  syntax::ResolvedEntity,
};

/// Symbols that come from outside the analyzed sources, such as classes read
/// from compiled libraries.
pub trait QualifiedNameProvider: fmt::Debug {
  /// `None` for symbols without a stable qualified name.
  fn qualified_name(&self) -> Option<Cow<'_, str>>;
}

/// What a completion item stands for.
#[derive(Debug)]
pub enum CompletionPayload {
  /// A declaration from the analyzed sources.
  Descriptor(ResolvedEntity),
  /// A symbol from outside the analyzed sources.
  ExternalSymbol(Box<dyn QualifiedNameProvider>),
  /// Anything else a completion source attached. Handlers that need a
  /// qualified name cannot work with it.
  Unrecognized { kind: String },
}

impl CompletionPayload {
  /// The qualified name to write into source for this payload. Segments for
  /// which `needs_quoting` holds are back-quoted.
  pub fn qualified_name(&self, needs_quoting: impl Fn(&str) -> bool) -> Result<QualifiedName> {
    let name = match self {
      CompletionPayload::Descriptor(entity) => {
        if !entity.is_class() {
          return Err(InsertError::NotAClass { kind: entity.kind });
        }
        entity
          .qualified_name()
          .map(Cow::Borrowed)
          .ok_or(InsertError::MissingQualifiedName)?
      },
      CompletionPayload::ExternalSymbol(symbol) => symbol
        .qualified_name()
        .ok_or(InsertError::MissingQualifiedName)?,
      CompletionPayload::Unrecognized { kind } => {
        return Err(InsertError::UnrecognizedPayload { kind: kind.clone() });
      },
    };
    Ok(QualifiedName::parse(&name)?.to_source(needs_quoting))
  }
}

#[derive(Debug)]
pub struct CompletionItem {
  pub label:   Tendril,
  /// Text the completion engine writes before any handler runs. Defaults to
  /// the label.
  pub lookup:  Option<Tendril>,
  pub payload: CompletionPayload,
}

impl CompletionItem {
  pub fn new(label: impl Into<Tendril>, payload: CompletionPayload) -> Self {
    Self {
      label: label.into(),
      lookup: None,
      payload,
    }
  }

  pub fn with_lookup(mut self, lookup: impl Into<Tendril>) -> Self {
    self.lookup = Some(lookup.into());
    self
  }

  pub fn lookup_string(&self) -> &str {
    self.lookup.as_deref().unwrap_or(&self.label)
  }
}
