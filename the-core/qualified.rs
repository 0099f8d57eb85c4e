//! Fully qualified declaration names.
//!
//! A [`QualifiedName`] is a dotted path such as `com.foo.Bar`. Segments are
//! either plain identifiers or backtick-quoted names (`` com.`fun`.Bar ``),
//! which is how sources spell segments that collide with keywords.
//!
//! Two names are equal when their unquoted segments are equal, so
//! `` com.`foo`.Bar `` and `com.foo.Bar` denote the same declaration even
//! though they render differently.

use std::{
  fmt,
  hash::{
    Hash,
    Hasher,
  },
  str::FromStr,
};

use thiserror::Error;

use crate::chars::{
  char_is_ident_part,
  char_is_ident_start,
  char_is_line_ending,
};

const QUOTE: char = '`';
const SEPARATOR: char = '.';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QualifiedNameError {
  #[error("qualified name is empty")]
  Empty,
  #[error("segment {index} of qualified name is empty")]
  EmptySegment { index: usize },
  #[error("unexpected character {ch:?} at offset {offset} in qualified name")]
  InvalidChar { ch: char, offset: usize },
  #[error("unterminated quoted segment starting at offset {offset}")]
  UnterminatedQuote { offset: usize },
}

pub type Result<T> = std::result::Result<T, QualifiedNameError>;

#[derive(Debug, Clone)]
pub struct QualifiedName {
  /// The name exactly as it was parsed or rendered.
  text:     String,
  /// Unquoted segments, outermost package first.
  segments: Vec<String>,
}

impl QualifiedName {
  pub fn parse(text: &str) -> Result<Self> {
    if text.is_empty() {
      return Err(QualifiedNameError::Empty);
    }

    let mut segments = Vec::new();
    let mut chars = text.char_indices().peekable();

    loop {
      let index = segments.len();
      let segment = match chars.peek().copied() {
        None => return Err(QualifiedNameError::EmptySegment { index }),
        Some((_, SEPARATOR)) => return Err(QualifiedNameError::EmptySegment { index }),
        Some((start, QUOTE)) => {
          chars.next();
          let mut segment = String::new();
          loop {
            match chars.next() {
              Some((_, QUOTE)) => break,
              Some((offset, ch)) if char_is_line_ending(ch) => {
                return Err(QualifiedNameError::InvalidChar { ch, offset });
              },
              Some((_, ch)) => segment.push(ch),
              None => return Err(QualifiedNameError::UnterminatedQuote { offset: start }),
            }
          }
          if segment.is_empty() {
            return Err(QualifiedNameError::EmptySegment { index });
          }
          segment
        },
        Some((offset, ch)) if !char_is_ident_start(ch) => {
          return Err(QualifiedNameError::InvalidChar { ch, offset });
        },
        Some(_) => {
          let mut segment = String::new();
          while let Some(&(_, ch)) = chars.peek() {
            if !char_is_ident_part(ch) {
              break;
            }
            segment.push(ch);
            chars.next();
          }
          segment
        },
      };
      segments.push(segment);

      match chars.next() {
        None => break,
        Some((_, SEPARATOR)) => continue,
        Some((offset, ch)) => return Err(QualifiedNameError::InvalidChar { ch, offset }),
      }
    }

    Ok(Self {
      text: text.to_owned(),
      segments,
    })
  }

  /// Build a name from unquoted segments. Segments that are not plain
  /// identifiers are quoted in the rendered text.
  pub fn from_segments<I, S>(segments: I) -> Result<Self>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
    if segments.is_empty() {
      return Err(QualifiedNameError::Empty);
    }
    for (index, segment) in segments.iter().enumerate() {
      if segment.is_empty() {
        return Err(QualifiedNameError::EmptySegment { index });
      }
      if let Some(ch) = segment
        .chars()
        .find(|&ch| ch == QUOTE || char_is_line_ending(ch))
      {
        return Err(QualifiedNameError::InvalidChar { ch, offset: 0 });
      }
    }
    let text = render(&segments, |_| false);
    Ok(Self { text, segments })
  }

  pub fn as_str(&self) -> &str {
    &self.text
  }

  /// Length of the rendered text in chars, which is how documents measure.
  pub fn len_chars(&self) -> usize {
    self.text.chars().count()
  }

  pub fn segments(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
    self.segments.iter().map(String::as_str)
  }

  /// The last segment: the simple name of the declaration.
  pub fn short_name(&self) -> &str {
    self.segments.last().map(String::as_str).unwrap_or_default()
  }

  /// The enclosing package or class, `None` for a top-level name.
  pub fn parent(&self) -> Option<Self> {
    let (_, parent) = self.segments.split_last()?;
    if parent.is_empty() {
      return None;
    }
    let segments = parent.to_vec();
    Some(Self {
      text: render(&segments, |_| false),
      segments,
    })
  }

  pub fn is_top_level(&self) -> bool {
    self.segments.len() == 1
  }

  /// Whether `other` names the same declaration, comparing unquoted segments.
  /// Text that does not parse as a qualified name never matches.
  pub fn matches(&self, other: &str) -> bool {
    Self::parse(other).is_ok_and(|other| other == *self)
  }

  /// Render the name the way it must be written in source: segments for
  /// which `needs_quoting` holds, and segments that are not plain
  /// identifiers, are wrapped in backticks.
  pub fn to_source(&self, needs_quoting: impl Fn(&str) -> bool) -> Self {
    Self {
      text:     render(&self.segments, needs_quoting),
      segments: self.segments.clone(),
    }
  }
}

fn is_plain_identifier(segment: &str) -> bool {
  let mut chars = segment.chars();
  chars.next().is_some_and(char_is_ident_start) && chars.all(char_is_ident_part)
}

fn render(segments: &[String], needs_quoting: impl Fn(&str) -> bool) -> String {
  let mut text = String::new();
  for (i, segment) in segments.iter().enumerate() {
    if i > 0 {
      text.push(SEPARATOR);
    }
    if needs_quoting(segment) || !is_plain_identifier(segment) {
      text.push(QUOTE);
      text.push_str(segment);
      text.push(QUOTE);
    } else {
      text.push_str(segment);
    }
  }
  text
}

impl PartialEq for QualifiedName {
  fn eq(&self, other: &Self) -> bool {
    self.segments == other.segments
  }
}

impl Eq for QualifiedName {}

impl Hash for QualifiedName {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.segments.hash(state);
  }
}

impl FromStr for QualifiedName {
  type Err = QualifiedNameError;

  fn from_str(s: &str) -> Result<Self> {
    Self::parse(s)
  }
}

impl fmt::Display for QualifiedName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.text)
  }
}

impl AsRef<str> for QualifiedName {
  fn as_ref(&self) -> &str {
    &self.text
  }
}
