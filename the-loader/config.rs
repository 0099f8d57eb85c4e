use std::str::from_utf8;

use eyre::{
  Context,
  Result,
};

/// Default built-in languages.toml.
pub fn default_lang_config() -> Result<toml::Value> {
  let default_config = include_bytes!("../languages.toml");
  let config_str =
    from_utf8(default_config).context("built-in languages.toml contains invalid UTF-8")?;
  toml::from_str(config_str).context("failed to parse built-in languages.toml")
}

/// The built-in languages.toml with the user's and then the workspace's
/// `languages.toml` merged on top. Missing files are skipped.
pub fn user_lang_config() -> Result<toml::Value> {
  let default = default_lang_config()?;

  let files = [
    crate::lang_config_file()?,
    crate::find_workspace()
      .0
      .join(".the-editor")
      .join("languages.toml"),
  ];

  let mut config = default;
  for file in files {
    let Ok(text) = std::fs::read_to_string(&file) else {
      continue;
    };
    let value: toml::Value =
      toml::from_str(&text).with_context(|| format!("failed to parse {}", file.display()))?;
    tracing::debug!(path = %file.display(), "merging language configuration");
    config = crate::merge_toml_values(config, value, 3);
  }

  Ok(config)
}
