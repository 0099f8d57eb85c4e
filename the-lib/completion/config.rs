//! Per-language completion settings, read from `languages.toml`.
//!
//! ```toml
//! [[language]]
//! name = "kotlin"
//! file-types = ["kt", "kts"]
//! quoted-keywords = ["in", "is", "object"]
//!
//! [language.class-insert]
//! anchored-prefix = " "
//! detached-prefix = "$;val v:"
//! suffix = ".xxx"
//! ```

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
  #[serde(default)]
  pub language: Vec<LanguageConfiguration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LanguageConfiguration {
  pub name:            String,
  #[serde(default)]
  pub file_types:      Vec<String>,
  /// Identifiers that must be back-quoted when they appear as a segment of a
  /// qualified name written into source.
  #[serde(default)]
  pub quoted_keywords: Vec<String>,
  /// Present for languages whose class-name completions insert a qualified
  /// name and shorten it.
  #[serde(default)]
  pub class_insert:    Option<Scaffold>,
}

/// Throwaway text written around a qualified name so that the parser sees a
/// reference the shortener can work on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Scaffold {
  /// Used when a reference node already exists at the insertion point.
  /// Absorbs separators the shortener's formatting may delete.
  pub anchored_prefix: String,
  /// Used when there is nothing to anchor to. Must force a type or reference
  /// expression context in the language's grammar.
  pub detached_prefix: String,
  /// Written after the name so it parses as a qualifier of a member access.
  pub suffix:          String,
}

impl Default for Scaffold {
  // Kotlin grammar.
  fn default() -> Self {
    Self {
      anchored_prefix: " ".into(),
      detached_prefix: "$;val v:".into(),
      suffix:          ".xxx".into(),
    }
  }
}

impl Configuration {
  pub fn language(&self, name: &str) -> Option<&LanguageConfiguration> {
    self.language.iter().find(|lang| lang.name == name)
  }

  /// Look a language up by the extension of `path`.
  pub fn language_for_file(&self, path: &Path) -> Option<&LanguageConfiguration> {
    let extension = path.extension()?.to_str()?;
    self
      .language
      .iter()
      .find(|lang| lang.file_types.iter().any(|ft| ft == extension))
  }

  /// The built-in `languages.toml` merged with user and workspace overrides.
  #[cfg(feature = "runtime-loader")]
  pub fn load() -> eyre::Result<Self> {
    use eyre::WrapErr;

    the_loader::config::user_lang_config()?
      .try_into()
      .wrap_err("failed to deserialize language configuration")
  }
}
