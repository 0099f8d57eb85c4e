//! Benchmarks for range marker tracking and class name insertion.
//!
//! Run with: `cargo bench -p the-lib --bench marker`

use std::ops::Range;

use divan::{
  Bencher,
  black_box,
};
use the_core::qualified::QualifiedName;
use the_lib::{
  completion::class_insert::{
    ClassInsertHandler,
    InsertHost,
    InsertionRequest,
  },
  document::Document,
  syntax::{
    ReferenceFinder,
    ReferenceNode,
    ReferenceShortener,
    ResolvedEntity,
    Resolver,
    ShortenError,
  },
};

fn main() {
  divan::main();
}

fn make_text(size: usize) -> String {
  let line = "val quick = brown.fox(jumps, over).lazy.dog\n";
  let mut s = String::with_capacity(size);
  while s.len() < size {
    s.push_str(line);
  }
  s.truncate(size);
  s
}

fn make_document(size: usize, markers: usize) -> Document {
  let mut doc = Document::from(make_text(size).as_str());
  let len = doc.len_chars();
  let step = len / (markers + 1);
  for i in 0..markers {
    let start = (i + 1) * step;
    doc.create_marker(start, (start + 8).min(len)).unwrap();
  }
  doc
}

// `Document` edits with live markers.

mod track {
  use super::*;

  const SIZE: usize = 64 * 1024;

  #[divan::bench(args = [0, 16, 256])]
  fn insert_at_start(bencher: Bencher, markers: usize) {
    bencher
      .with_inputs(|| make_document(SIZE, markers))
      .bench_local_values(|mut doc| {
        for _ in 0..32 {
          doc.insert(0, "import com.foo.Bar\n").unwrap();
        }
        black_box(doc);
      });
  }

  #[divan::bench(args = [0, 16, 256])]
  fn delete_in_middle(bencher: Bencher, markers: usize) {
    bencher
      .with_inputs(|| make_document(SIZE, markers))
      .bench_local_values(|mut doc| {
        let mid = doc.len_chars() / 2;
        for _ in 0..32 {
          doc.delete(mid, mid + 4).unwrap();
        }
        black_box(doc);
      });
  }
}

// Full insertion runs against a trivial host.

struct Nothing;

impl ReferenceFinder for Nothing {
  fn reference_at(&self, _doc: &Document, _offset: usize) -> Option<ReferenceNode> {
    None
  }
}

impl Resolver for Nothing {
  fn partial_resolve(&self, _doc: &Document, _node: &ReferenceNode) -> Option<ResolvedEntity> {
    None
  }
}

/// Drops the qualifier without adding imports.
struct DropQualifier;

impl ReferenceShortener for DropQualifier {
  fn shorten(&self, doc: &mut Document, range: Range<usize>) -> Result<(), ShortenError> {
    let text = doc
      .slice(range.clone())
      .ok_or(ShortenError::NoReference { range: range.clone() })?
      .to_string();
    if let Some(dot) = text.rfind('.') {
      let qualifier = text[..=dot].chars().count();
      doc.delete(range.start, range.start + qualifier)?;
    }
    Ok(())
  }
}

mod class_insert {
  use super::*;

  #[divan::bench(args = [1024, 64 * 1024])]
  fn detached(bencher: Bencher, size: usize) {
    let handler = ClassInsertHandler::default();
    let name = QualifiedName::parse("com.foo.bar.Baz").unwrap();

    bencher
      .with_inputs(|| {
        let mut doc = Document::from(make_text(size).as_str());
        doc.set_language("kotlin");
        let at = doc.len_chars() / 2;
        doc.insert(at, "Baz").unwrap();
        (doc, at)
      })
      .bench_local_values(|(mut doc, at)| {
        let request = InsertionRequest::new(&doc, name.clone(), at, at + 3).unwrap();
        let mut host = InsertHost {
          doc:       &mut doc,
          finder:    &Nothing,
          resolver:  &Nothing,
          shortener: &DropQualifier,
        };
        black_box(handler.handle(&mut host, &request).unwrap());
        black_box(doc);
      });
  }
}
