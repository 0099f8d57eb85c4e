//! Class name insertion against a small Kotlin-like host.
//!
//! The host understands just enough of the language to exercise the
//! protocol: identifiers are references unless they sit in a `//` comment,
//! `import` lines resolve names, and shortening drops the qualifier and adds
//! an import after the `package` line.

use std::ops::Range;

use the_core::{
  chars::char_is_ident_part,
  qualified::QualifiedName,
};
use the_lib::{
  completion::{
    InsertError,
    class_insert::{
      ClassInsertHandler,
      InsertHost,
      InsertOutcome,
      InsertionRequest,
    },
    config::Configuration,
    item::{
      CompletionItem,
      CompletionPayload,
    },
  },
  document::Document,
  syntax::{
    EntityKind,
    ReferenceFinder,
    ReferenceNode,
    ReferenceShortener,
    ResolvedEntity,
    Resolver,
    ShortenError,
  },
};

const KEYWORDS: &[&str] = &["package", "import", "val", "var", "fun", "class"];

fn last_segment(name: &str) -> &str {
  name.rsplit('.').next().unwrap_or(name)
}

fn imports(doc: &Document) -> Vec<String> {
  doc
    .text()
    .lines()
    .filter_map(|line| {
      let line = line.to_string();
      line
        .strip_prefix("import ")
        .map(|name| name.trim().to_string())
    })
    .collect()
}

fn package(doc: &Document) -> Option<String> {
  doc.text().lines().find_map(|line| {
    let line = line.to_string();
    line
      .strip_prefix("package ")
      .map(|name| name.trim().to_string())
  })
}

/// Imports go on the line after `package`, or at the top of the file.
fn import_offset(doc: &Document) -> usize {
  let text = doc.text();
  text
    .lines()
    .position(|line| line.to_string().starts_with("package "))
    .map_or(0, |line| text.line_to_char(line + 1))
}

#[derive(Default)]
struct Kotlin {
  /// Queue a space in front of the shortened name, the way a formatter would.
  pad: bool,
}

impl ReferenceFinder for Kotlin {
  fn reference_at(&self, doc: &Document, offset: usize) -> Option<ReferenceNode> {
    let text = doc.text();
    let line_start = text.line_to_char(text.char_to_line(offset));
    if text.slice(line_start..offset).to_string().contains("//") {
      return None;
    }

    let mut start = offset;
    while start > 0 && char_is_ident_part(text.char(start - 1)) {
      start -= 1;
    }
    let mut end = offset;
    while end < text.len_chars() && char_is_ident_part(text.char(end)) {
      end += 1;
    }
    let name = text.slice(start..end).to_string();
    if name.is_empty() || KEYWORDS.contains(&name.as_str()) {
      return None;
    }
    Some(ReferenceNode {
      range: start..end,
      name:  name.as_str().into(),
    })
  }
}

impl Resolver for Kotlin {
  fn partial_resolve(&self, doc: &Document, node: &ReferenceNode) -> Option<ResolvedEntity> {
    if let Some(import) = imports(doc)
      .into_iter()
      .find(|import| last_segment(import) == node.name.as_str())
    {
      let kind = if node.name.starts_with(char::is_uppercase) {
        EntityKind::Class
      } else {
        EntityKind::Function
      };
      return Some(ResolvedEntity::new(kind, import));
    }

    let declaration = format!("class {}", node.name);
    if doc.text().to_string().contains(&declaration) {
      let name = match package(doc) {
        Some(package) => format!("{package}.{}", node.name),
        None => node.name.to_string(),
      };
      return Some(ResolvedEntity::class(name));
    }
    None
  }
}

impl ReferenceShortener for Kotlin {
  fn shorten(&self, doc: &mut Document, range: Range<usize>) -> Result<(), ShortenError> {
    let name = doc
      .slice(range.clone())
      .ok_or(ShortenError::NoReference {
        range: range.clone(),
      })?
      .to_string();
    let Some(dot) = name.rfind('.') else {
      return Ok(());
    };
    let imports = imports(doc);
    let short = &name[dot + 1..];
    if imports
      .iter()
      .any(|import| *import != name && last_segment(import) == short)
    {
      // the short name would bind to another class
      return Ok(());
    }

    let mut start = range.start;
    if !imports.contains(&name) {
      let line = format!("import {name}\n");
      let at = import_offset(doc);
      doc.insert(at, line.as_str())?;
      if at <= start {
        start += line.chars().count();
      }
    }
    let qualifier = name[..=dot].chars().count();
    doc.delete(start, start + qualifier)?;
    if self.pad {
      doc.postpone(start, start, " ")?;
    }
    Ok(())
  }
}

/// Rewrites the whole name span, taking the tracked name with it.
struct ReplaceWhole;

impl ReferenceShortener for ReplaceWhole {
  fn shorten(&self, doc: &mut Document, range: Range<usize>) -> Result<(), ShortenError> {
    doc.replace(range.start, range.end, "Bar")?;
    Ok(())
  }
}

struct Unresolvable;

impl ReferenceShortener for Unresolvable {
  fn shorten(&self, _doc: &mut Document, _range: Range<usize>) -> Result<(), ShortenError> {
    Err(ShortenError::Unresolved {
      name: "com.foo.Bar".into(),
    })
  }
}

fn kotlin_doc(text: &str) -> Document {
  let mut doc = Document::from(text);
  doc.set_language("kotlin");
  doc
}

fn bar() -> QualifiedName {
  QualifiedName::parse("com.foo.Bar").unwrap()
}

fn handle_with(
  doc: &mut Document,
  shortener: &dyn ReferenceShortener,
  name: QualifiedName,
  start: usize,
  tail: usize,
) -> Result<InsertOutcome, InsertError> {
  let request = InsertionRequest::new(doc, name, start, tail)?;
  let host_lang = Kotlin::default();
  let mut host = InsertHost {
    doc,
    finder: &host_lang,
    resolver: &host_lang,
    shortener,
  };
  ClassInsertHandler::default().handle(&mut host, &request)
}

fn handle(doc: &mut Document, start: usize, tail: usize) -> InsertOutcome {
  handle_with(doc, &Kotlin::default(), bar(), start, tail).unwrap()
}

#[test]
fn anchored_round_trip() {
  let mut doc = kotlin_doc("package app\n\nval x = Bar\n");
  let outcome = handle(&mut doc, 21, 24);

  assert_eq!(
    doc.text().to_string(),
    "package app\nimport com.foo.Bar\n\nval x = Bar\n"
  );
  assert_eq!(outcome, InsertOutcome::Completed {
    range:     40..43,
    shortened: true,
  });
  assert_eq!(doc.slice(40..43).unwrap(), "Bar");
  assert_eq!(doc.marker_count(), 0);
}

#[test]
fn detached_round_trip() {
  let mut doc = kotlin_doc("package app\n\nfun f() {} // Bar\n");
  let outcome = handle(&mut doc, 27, 30);

  assert_eq!(
    doc.text().to_string(),
    "package app\nimport com.foo.Bar\n\nfun f() {} // Bar\n"
  );
  assert_eq!(outcome, InsertOutcome::Completed {
    range:     46..49,
    shortened: true,
  });
  assert_eq!(doc.marker_count(), 0);
}

#[test]
fn detached_keeps_ambiguous_name_qualified() {
  let mut doc = kotlin_doc("import org.other.Bar\n\nfun f() {} // Bar\n");
  let outcome = handle(&mut doc, 36, 39);

  assert_eq!(
    doc.text().to_string(),
    "import org.other.Bar\n\nfun f() {} // com.foo.Bar\n"
  );
  assert_eq!(outcome, InsertOutcome::Completed {
    range:     36..47,
    shortened: true,
  });
}

#[test]
fn after_dot_makes_no_edits() {
  let mut doc = kotlin_doc("val x = foo. Bar\n");
  let outcome = handle(&mut doc, 13, 16);

  assert_eq!(outcome, InsertOutcome::AfterDot);
  assert_eq!(doc.text().to_string(), "val x = foo. Bar\n");
  assert_eq!(doc.version(), 0);
}

#[test]
fn after_dot_on_previous_line() {
  let mut doc = kotlin_doc("val x = foo.\n    Bar\n");
  assert_eq!(handle(&mut doc, 17, 20), InsertOutcome::AfterDot);
  assert_eq!(doc.version(), 0);
}

#[test]
fn already_resolved_makes_no_edits() {
  let text = "import com.foo.Bar\n\nval x = Bar\n";
  let mut doc = kotlin_doc(text);
  let outcome = handle(&mut doc, 28, 31);

  assert_eq!(outcome, InsertOutcome::AlreadyResolved);
  assert_eq!(doc.text().to_string(), text);
  assert_eq!(doc.version(), 0);
  assert_eq!(doc.marker_count(), 0);
}

#[test]
fn same_file_class_is_already_resolved() {
  let mut doc = kotlin_doc("package com.foo\n\nclass Bar\n\nval x = Bar\n");
  assert_eq!(handle(&mut doc, 36, 39), InsertOutcome::AlreadyResolved);
  assert_eq!(doc.version(), 0);
}

#[test]
fn other_class_with_same_name_is_replaced() {
  // `Bar` resolves, but to a different class
  let mut doc = kotlin_doc("package app\n\nclass Bar\n\nval x = Bar\n");
  let outcome = handle(&mut doc, 32, 35);

  assert!(matches!(outcome, InsertOutcome::Completed { .. }));
  assert!(doc.version() > 0);
  assert!(doc.text().to_string().contains("import com.foo.Bar\n"));
}

#[test]
fn non_class_resolution_falls_through() {
  let mut doc = kotlin_doc("import com.foo.bar\n\nval x = bar\n");
  let name = QualifiedName::parse("com.foo.bar").unwrap();
  let outcome = handle_with(&mut doc, &Kotlin::default(), name, 28, 31).unwrap();

  assert_eq!(outcome, InsertOutcome::Completed {
    range:     28..31,
    shortened: true,
  });
  assert_eq!(doc.text().to_string(), "import com.foo.bar\n\nval x = bar\n");
  assert!(doc.version() > 0);
}

#[test]
fn postponed_whitespace_is_removed() {
  let mut doc = kotlin_doc("package app\n\nval x = Bar\n");
  let request = InsertionRequest::new(&doc, bar(), 21, 24).unwrap();
  let kotlin = Kotlin { pad: true };
  let mut host = InsertHost {
    doc:       &mut doc,
    finder:    &kotlin,
    resolver:  &kotlin,
    shortener: &kotlin,
  };
  let outcome = ClassInsertHandler::default()
    .handle(&mut host, &request)
    .unwrap();

  assert_eq!(outcome, InsertOutcome::Completed {
    range:     40..43,
    shortened: true,
  });
  assert_eq!(
    doc.text().to_string(),
    "package app\nimport com.foo.Bar\n\nval x = Bar\n"
  );
  assert!(!doc.is_blocked());
}

#[test]
fn degraded_leaves_scaffold() {
  let mut doc = kotlin_doc("val x = Bar\n");
  let outcome = handle_with(&mut doc, &ReplaceWhole, bar(), 8, 11).unwrap();

  assert_eq!(outcome, InsertOutcome::Degraded);
  assert_eq!(doc.text().to_string(), "val x =  Bar.xxx\n");
  assert_eq!(doc.marker_count(), 0);
}

#[test]
fn failed_shortening_still_cleans_up() {
  let mut doc = kotlin_doc("val x = Bar\n");
  let outcome = handle_with(&mut doc, &Unresolvable, bar(), 8, 11).unwrap();

  assert_eq!(outcome, InsertOutcome::Completed {
    range:     8..19,
    shortened: false,
  });
  assert_eq!(doc.text().to_string(), "val x = com.foo.Bar\n");
  assert_eq!(doc.marker_count(), 0);
}

#[test]
fn unsupported_language() {
  let mut doc = Document::from("val x = Bar\n");
  assert_eq!(handle(&mut doc, 8, 11), InsertOutcome::Unsupported);

  doc.set_language("java");
  assert_eq!(handle(&mut doc, 8, 11), InsertOutcome::Unsupported);
  assert_eq!(doc.version(), 0);
}

#[test]
fn blocked_document_is_an_error() {
  let mut doc = kotlin_doc("val x = Bar\n");
  doc.postpone(0, 0, " ").unwrap();
  let err = handle_with(&mut doc, &Kotlin::default(), bar(), 8, 11).unwrap_err();

  assert!(matches!(err, InsertError::Document(_)));
  assert_eq!(doc.marker_count(), 0);
}

fn accept(
  doc: &mut Document,
  item: &CompletionItem,
  start: usize,
  caret: usize,
) -> Result<InsertOutcome, InsertError> {
  let kotlin = Kotlin::default();
  let mut host = InsertHost {
    doc,
    finder: &kotlin,
    resolver: &kotlin,
    shortener: &kotlin,
  };
  ClassInsertHandler::default().accept(&mut host, item, start, caret)
}

#[test]
fn accept_writes_lookup_string_first() {
  let mut doc = kotlin_doc("package app\n\nval x = Ba\n");
  let item = CompletionItem::new(
    "Bar",
    CompletionPayload::Descriptor(ResolvedEntity::class("com.foo.Bar")),
  );
  let outcome = accept(&mut doc, &item, 21, 23).unwrap();

  assert_eq!(outcome, InsertOutcome::Completed {
    range:     40..43,
    shortened: true,
  });
  assert_eq!(
    doc.text().to_string(),
    "package app\nimport com.foo.Bar\n\nval x = Bar\n"
  );
}

#[test]
fn accept_quotes_keyword_segments() {
  let mut doc = kotlin_doc("val x = \n");
  let item = CompletionItem::new(
    "Bar",
    CompletionPayload::Descriptor(ResolvedEntity::class("com.in.Bar")),
  );
  let outcome = accept(&mut doc, &item, 8, 8).unwrap();

  assert!(matches!(outcome, InsertOutcome::Completed { .. }));
  assert_eq!(doc.text().to_string(), "import com.`in`.Bar\nval x = Bar\n");
}

#[test]
fn accept_rejects_unrecognized_payload() {
  let mut doc = kotlin_doc("val x = \n");
  let item = CompletionItem::new("when", CompletionPayload::Unrecognized {
    kind: "keyword".into(),
  });
  let err = accept(&mut doc, &item, 8, 8).unwrap_err();

  assert!(matches!(err, InsertError::UnrecognizedPayload { .. }));
  assert_eq!(doc.marker_count(), 0);
}

#[test]
fn accept_after_dot_ignores_payload() {
  let mut doc = kotlin_doc("val x = foo.\n");
  let item = CompletionItem::new("Bar", CompletionPayload::Unrecognized {
    kind: "psi-class".into(),
  });
  assert_eq!(
    accept(&mut doc, &item, 12, 12).unwrap(),
    InsertOutcome::AfterDot
  );
  assert_eq!(doc.text().to_string(), "val x = foo.Bar\n");

  // a local class has no qualified name
  let mut doc = kotlin_doc("val x = foo.\n");
  let item = CompletionItem::new(
    "Local",
    CompletionPayload::Descriptor(ResolvedEntity {
      kind:           EntityKind::Class,
      qualified_name: None,
    }),
  );
  assert_eq!(
    accept(&mut doc, &item, 12, 12).unwrap(),
    InsertOutcome::AfterDot
  );
  assert_eq!(doc.text().to_string(), "val x = foo.Local\n");
  assert_eq!(doc.marker_count(), 0);
}

#[test]
fn configured_scaffold() {
  let config: Configuration = toml::from_str(
    r#"
    [[language]]
    name = "kotlin"
    [language.class-insert]
    anchored-prefix = "  "
    "#,
  )
  .unwrap();
  let handler = ClassInsertHandler::new(&config);
  let mut doc = kotlin_doc("val x = Bar\n");
  let request = InsertionRequest::new(&doc, bar(), 8, 11).unwrap();
  let mut host = InsertHost {
    doc:       &mut doc,
    finder:    &Kotlin::default(),
    resolver:  &Kotlin::default(),
    shortener: &ReplaceWhole,
  };

  assert_eq!(
    handler.handle(&mut host, &request).unwrap(),
    InsertOutcome::Degraded
  );
  assert_eq!(doc.text().to_string(), "val x =   Bar.xxx\n");
}
