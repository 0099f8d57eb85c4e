//! Class-name completion: insert the fully qualified name, then contract it.
//!
//! When a class-name completion is accepted, the completion engine has
//! already written the short name. That name may not resolve to the class
//! the user picked, so [`ClassInsertHandler`] rewrites it:
//!
//! 1. Nothing happens after a `.`: the user is completing a member of an
//!    expression that is already qualified.
//! 2. Nothing happens if the reference at the insertion point already
//!    resolves to the picked class.
//! 3. Otherwise the range is replaced with `prefix + qualified name + suffix`
//!    (see [`EditPlan`]), the [`ReferenceShortener`] contracts the qualified
//!    name, possibly adding an import, and the scaffold around it is removed.
//!
//! The shortener edits the document in ways the handler cannot predict, so
//! the name and the whole written region are tracked with range markers, not
//! offsets. If the shortener removes either span entirely, the scaffold is
//! left in place and the run ends as [`InsertOutcome::Degraded`].
//!
//! ```text
//! val x = Bar|            completion engine wrote `Bar`
//! val x =  com.foo.Bar.xxx  plan written over `Bar`
//! val x =  Bar.xxx         shortener dropped the qualifier, added an import
//! val x = Bar              scaffold removed
//! ```
//!
//! [`ReferenceShortener`]: crate::syntax::ReferenceShortener

mod plan;

use std::{
  collections::{
    HashMap,
    HashSet,
  },
  ops::Range,
};

pub use plan::EditPlan;
use ropey::RopeSlice;
use the_core::{
  chars::char_is_token_separator,
  qualified::QualifiedName,
};

use super::{
  InsertError,
  Result,
  config::{
    Configuration,
    Scaffold,
  },
  item::CompletionItem,
};
use crate::{
  document::Document,
  marker::{
    MarkerId,
    RangeMarker,
  },
  syntax::{
    ReferenceFinder,
    ReferenceNode,
    ReferenceShortener,
    Resolver,
  },
};

const KOTLIN: &str = "kotlin";

const KOTLIN_KEYWORDS: &[&str] = &[
  "as",
  "break",
  "class",
  "continue",
  "do",
  "else",
  "false",
  "for",
  "fun",
  "if",
  "in",
  "interface",
  "is",
  "null",
  "object",
  "package",
  "return",
  "super",
  "this",
  "throw",
  "true",
  "try",
  "typealias",
  "typeof",
  "val",
  "var",
  "when",
  "while",
];

/// Whether the closest non-whitespace character before `offset` is a `.`.
pub fn is_after_dot(text: RopeSlice, offset: usize) -> bool {
  let mut chars = text.chars_at(offset.min(text.len_chars()));
  while let Some(ch) = chars.prev() {
    if !char_is_token_separator(ch) {
      return ch == '.';
    }
  }
  false
}

/// One accepted class-name completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionRequest {
  qualified_name: QualifiedName,
  start:          usize,
  tail:           usize,
  after_dot:      bool,
}

impl InsertionRequest {
  /// `start..tail` is the text the completion engine wrote for the item.
  pub fn new(
    doc: &Document,
    qualified_name: QualifiedName,
    start: usize,
    tail: usize,
  ) -> Result<Self> {
    let len = doc.len_chars();
    if start > tail || tail > len {
      return Err(InsertError::InvalidRange { start, tail, len });
    }
    Ok(Self {
      qualified_name,
      start,
      tail,
      after_dot: is_after_dot(doc.text().slice(..), start),
    })
  }

  pub fn qualified_name(&self) -> &QualifiedName {
    &self.qualified_name
  }

  pub fn start(&self) -> usize {
    self.start
  }

  pub fn tail(&self) -> usize {
    self.tail
  }

  pub fn after_dot(&self) -> bool {
    self.after_dot
  }
}

/// The document and the language services a handler works with for one
/// accepted completion.
pub struct InsertHost<'a> {
  pub doc:       &'a mut Document,
  pub finder:    &'a dyn ReferenceFinder,
  pub resolver:  &'a dyn Resolver,
  pub shortener: &'a dyn ReferenceShortener,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
  /// The document's language has no class insertion rules.
  Unsupported,
  /// The name follows a `.`; nothing was edited.
  AfterDot,
  /// The written name already resolves to the class; nothing was edited.
  AlreadyResolved,
  /// The scaffold was removed. `range` covers the name as it now reads.
  /// `shortened` is false when the shortener failed and the qualified name
  /// was left in place.
  Completed {
    range:     Range<usize>,
    shortened: bool,
  },
  /// The shortener removed a tracked span; the scaffold is still there.
  Degraded,
}

/// Class insertion rules for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageRules {
  pub scaffold:        Scaffold,
  pub quoted_keywords: HashSet<String>,
}

impl LanguageRules {
  pub fn needs_quoting(&self, segment: &str) -> bool {
    self.quoted_keywords.contains(segment)
  }
}

#[derive(Debug, Clone)]
pub struct ClassInsertHandler {
  languages: HashMap<String, LanguageRules>,
}

impl Default for ClassInsertHandler {
  fn default() -> Self {
    let kotlin = LanguageRules {
      scaffold:        Scaffold::default(),
      quoted_keywords: KOTLIN_KEYWORDS.iter().map(|kw| kw.to_string()).collect(),
    };
    Self {
      languages: HashMap::from([(KOTLIN.to_string(), kotlin)]),
    }
  }
}

impl ClassInsertHandler {
  /// Rules for every configured language with a `class-insert` table.
  pub fn new(config: &Configuration) -> Self {
    let languages = config
      .language
      .iter()
      .filter_map(|lang| {
        let scaffold = lang.class_insert.clone()?;
        let rules = LanguageRules {
          scaffold,
          quoted_keywords: lang.quoted_keywords.iter().cloned().collect(),
        };
        Some((lang.name.clone(), rules))
      })
      .collect();
    Self { languages }
  }

  pub fn rules(&self, language: &str) -> Option<&LanguageRules> {
    self.languages.get(language)
  }

  fn rules_for(&self, doc: &Document) -> Option<&LanguageRules> {
    doc.language().and_then(|language| self.rules(language))
  }

  /// Run the whole acceptance: write the item's lookup string over
  /// `start..caret` as the completion engine does, then qualify and shorten
  /// it.
  pub fn accept(
    &self,
    host: &mut InsertHost<'_>,
    item: &CompletionItem,
    start: usize,
    caret: usize,
  ) -> Result<InsertOutcome> {
    let lookup = item.lookup_string();
    host.doc.replace(start, caret, lookup)?;
    let tail = start + lookup.chars().count();

    let Some(rules) = self.rules_for(host.doc) else {
      return Ok(InsertOutcome::Unsupported);
    };
    // member completion: the payload is never consulted
    if is_after_dot(host.doc.text().slice(..), start) {
      tracing::trace!(offset = start, "class name follows a dot");
      return Ok(InsertOutcome::AfterDot);
    }
    let qualified_name = item
      .payload
      .qualified_name(|segment| rules.needs_quoting(segment))?;
    let request = InsertionRequest::new(host.doc, qualified_name, start, tail)?;
    self.handle(host, &request)
  }

  pub fn handle(
    &self,
    host: &mut InsertHost<'_>,
    request: &InsertionRequest,
  ) -> Result<InsertOutcome> {
    let Some(rules) = self.rules_for(host.doc) else {
      tracing::trace!(language = ?host.doc.language(), "no class insertion rules");
      return Ok(InsertOutcome::Unsupported);
    };

    if request.after_dot() {
      tracing::trace!(offset = request.start(), "class name follows a dot");
      return Ok(InsertOutcome::AfterDot);
    }

    host.doc.commit();

    let reference = host.finder.reference_at(host.doc, request.start());
    if let Some(node) = &reference
      && resolves_to(host, node, request.qualified_name())
    {
      tracing::trace!(
        name = %request.qualified_name(),
        "reference already resolves to the class"
      );
      return Ok(InsertOutcome::AlreadyResolved);
    }

    let plan = EditPlan::new(
      &rules.scaffold,
      reference.is_some(),
      request.qualified_name().clone(),
    );
    host
      .doc
      .replace(request.start(), request.tail(), plan.text())?;
    host.doc.commit();
    tracing::debug!(
      start = request.start(),
      text = %plan.text(),
      "wrote qualified class name"
    );

    let name_range = plan.class_name_range(request.start());
    let whole_range = plan.whole_range(request.start());
    let name_marker = host.doc.create_marker(name_range.start, name_range.end)?;
    let whole_marker = match host.doc.create_marker(whole_range.start, whole_range.end) {
      Ok(marker) => marker,
      Err(err) => {
        host.doc.release_marker(name_marker);
        return Err(err.into());
      },
    };

    let outcome = shorten_and_clean(host, name_range, name_marker, whole_marker);
    host.doc.release_marker(name_marker);
    host.doc.release_marker(whole_marker);
    outcome
  }
}

fn resolves_to(host: &InsertHost<'_>, node: &ReferenceNode, target: &QualifiedName) -> bool {
  match host.resolver.partial_resolve(host.doc, node) {
    Some(entity) if entity.is_class() => entity
      .qualified_name()
      .is_some_and(|name| target.matches(name)),
    Some(entity) => {
      tracing::trace!(kind = ?entity.kind, "reference resolves to a non-class");
      false
    },
    None => false,
  }
}

fn shorten_and_clean(
  host: &mut InsertHost<'_>,
  name_range: Range<usize>,
  name_marker: MarkerId,
  whole_marker: MarkerId,
) -> Result<InsertOutcome> {
  let shortened = match host.shortener.shorten(host.doc, name_range) {
    Ok(()) => true,
    Err(err) => {
      tracing::warn!(%err, "failed to shorten qualified class name");
      false
    },
  };
  host.doc.flush_postponed()?;
  host.doc.commit();

  let Some((name, whole)) = valid_markers(host.doc, name_marker, whole_marker) else {
    tracing::debug!("shortening removed the tracked name, leaving scaffold in place");
    return Ok(InsertOutcome::Degraded);
  };
  host.doc.delete(name.end, whole.end)?;

  let Some((name, whole)) = valid_markers(host.doc, name_marker, whole_marker) else {
    return Ok(InsertOutcome::Degraded);
  };
  host.doc.delete(whole.start, name.start)?;

  let name = host
    .doc
    .valid_marker(name_marker)
    .map_or(whole.start..whole.start, |name| name.range());
  Ok(InsertOutcome::Completed {
    range: name,
    shortened,
  })
}

fn valid_markers(
  doc: &Document,
  name: MarkerId,
  whole: MarkerId,
) -> Option<(RangeMarker, RangeMarker)> {
  Some((doc.valid_marker(name)?, doc.valid_marker(whole)?))
}
