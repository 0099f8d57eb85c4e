#![no_main]

mod common;

use libfuzzer_sys::fuzz_target;
use the_lib::document::Document;

use crate::common::{
  resolve_edit,
  resolve_range,
  scenario_from_bytes,
};

fuzz_target!(|data: &[u8]| {
  let scenario = scenario_from_bytes(data);
  let mut doc = Document::from(scenario.initial.as_str());

  let len = doc.len_chars();
  let markers: Vec<_> = scenario
    .markers
    .iter()
    .filter_map(|&seed| {
      let (from, to) = resolve_range(len, seed);
      doc.create_marker(from, to).ok()
    })
    .collect();

  for op in &scenario.ops {
    let (from, to, text) = resolve_edit(&doc, op);

    let before: Vec<_> = markers
      .iter()
      .map(|&id| {
        let marker = doc.marker(id).expect("marker is live");
        let text = doc
          .valid_marker(id)
          .and_then(|marker| doc.slice(marker.range()))
          .map(|text| text.to_string())
          .unwrap_or_default();
        (marker, text)
      })
      .collect();

    doc.replace(from, to, text.as_str()).expect("edit in bounds");
    let len = doc.len_chars();

    for (&id, (old, old_text)) in markers.iter().zip(before) {
      let marker = doc.marker(id).expect("marker is live");
      if !old.valid {
        assert!(!marker.valid, "invalidated marker came back");
        continue;
      }
      if !marker.valid {
        continue;
      }
      assert!(marker.start <= marker.end && marker.end <= len, "{marker:?} out of {len}");
      // an edit that does not touch the marker leaves its text alone
      if to < old.start || from > old.end {
        let text = doc.slice(marker.range()).expect("marker in bounds").to_string();
        assert_eq!(text, old_text);
      }
    }

    if op.anchor % 7 == 0 {
      doc.commit();
      assert!(doc.is_committed());
    }
  }

  for id in markers {
    assert!(doc.release_marker(id).is_some());
  }
  assert_eq!(doc.marker_count(), 0);
});
