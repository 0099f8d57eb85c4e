//! Character classification used when scanning source text.

#[inline]
pub fn char_is_line_ending(ch: char) -> bool {
  matches!(
    ch,
    '\u{000A}' // LineFeed
      | '\u{000B}' // VerticalTab
      | '\u{000C}' // FormFeed
      | '\u{000D}' // CarriageReturn
      | '\u{0085}' // NextLine
      | '\u{2028}' // Line Separator
      | '\u{2029}' // ParagraphSeparator
  )
}

/// Whitespace as source scanners see it: line endings count, and so does
/// every other Unicode `White_Space` character.
#[inline]
pub fn char_is_whitespace(ch: char) -> bool {
  char_is_line_ending(ch) || ch.is_whitespace()
}

/// Whitespace that separates tokens. No-break spaces glue the characters
/// around them and do not count; the ASCII information separators do.
#[inline]
pub fn char_is_token_separator(ch: char) -> bool {
  match ch {
    '\u{00A0}' | '\u{2007}' | '\u{202F}' => false,
    '\u{001C}'..='\u{001F}' => true,
    _ => char_is_whitespace(ch),
  }
}

#[inline]
pub fn char_is_word(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_'
}

/// First character of an unquoted identifier.
#[inline]
pub fn char_is_ident_start(ch: char) -> bool {
  ch.is_alphabetic() || ch == '_' || ch == '$'
}

/// Any later character of an unquoted identifier.
#[inline]
pub fn char_is_ident_part(ch: char) -> bool {
  char_is_word(ch) || ch == '$'
}
