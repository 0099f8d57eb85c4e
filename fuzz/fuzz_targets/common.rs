use the_lib::document::Document;

const MAX_INITIAL_BYTES: usize = 4 * 1024;
const MAX_MARKERS: usize = 16;
const MAX_OPS: usize = 128;
const MAX_INSERT_BYTES: usize = 64;

#[derive(Debug, Clone)]
pub struct EditOp {
  pub anchor: u16,
  pub delete: u16,
  pub insert: Vec<u8>,
}

pub struct Scenario {
  pub initial: String,
  pub markers: Vec<(u16, u16)>,
  pub ops:     Vec<EditOp>,
}

pub fn scenario_from_bytes(data: &[u8]) -> Scenario {
  let mut cursor = ByteCursor::new(data);
  let initial_len = cursor.next_usize(MAX_INITIAL_BYTES);
  let initial = lossy_text(cursor.next_bytes(initial_len));
  let marker_count = cursor.next_usize(MAX_MARKERS);
  let markers = (0..marker_count)
    .map(|_| (cursor.next_u16(), cursor.next_u16()))
    .collect();
  let op_count = cursor.next_usize(MAX_OPS);
  let mut ops = Vec::with_capacity(op_count);
  for _ in 0..op_count {
    let anchor = cursor.next_u16();
    let delete = cursor.next_u16();
    let insert_len = cursor.next_usize(MAX_INSERT_BYTES);
    let insert = cursor.next_bytes(insert_len).to_vec();
    ops.push(EditOp {
      anchor,
      delete,
      insert,
    });
  }

  Scenario {
    initial,
    markers,
    ops,
  }
}

/// Clamp `op` to the document and return the `(from, to, text)` it stands for.
pub fn resolve_edit(doc: &Document, op: &EditOp) -> (usize, usize, String) {
  let len_chars = doc.len_chars();
  let from = (op.anchor as usize) % (len_chars + 1);
  let max_delete = len_chars - from;
  let to = from + (op.delete as usize) % (max_delete + 1);
  (from, to, lossy_text(&op.insert))
}

/// Clamp a marker seed to an ordered in-bounds range.
pub fn resolve_range(len_chars: usize, (a, b): (u16, u16)) -> (usize, usize) {
  let a = (a as usize) % (len_chars + 1);
  let b = (b as usize) % (len_chars + 1);
  (a.min(b), a.max(b))
}

fn lossy_text(bytes: &[u8]) -> String {
  String::from_utf8_lossy(bytes).into_owned()
}

struct ByteCursor<'a> {
  data: &'a [u8],
  pos:  usize,
}

impl<'a> ByteCursor<'a> {
  fn new(data: &'a [u8]) -> Self {
    Self { data, pos: 0 }
  }

  fn next_u8(&mut self) -> u8 {
    let value = self.data.get(self.pos).copied().unwrap_or(0);
    self.pos = self.pos.saturating_add(1);
    value
  }

  fn next_u16(&mut self) -> u16 {
    let lo = self.next_u8() as u16;
    let hi = self.next_u8() as u16;
    lo | (hi << 8)
  }

  fn next_usize(&mut self, max: usize) -> usize {
    (self.next_u16() as usize) % (max + 1)
  }

  fn next_bytes(&mut self, len: usize) -> &'a [u8] {
    let start = self.pos.min(self.data.len());
    let end = start.saturating_add(len).min(self.data.len());
    self.pos = self.pos.saturating_add(len);
    &self.data[start..end]
  }
}
