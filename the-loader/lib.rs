pub mod config;

use std::path::{
  Path,
  PathBuf,
};

use etcetera::base_strategy::{
  BaseStrategy,
  choose_base_strategy,
};
use eyre::{
  Context,
  Result,
};

/// Directory holding the user's `languages.toml`.
///
/// `THE_EDITOR_CONFIG_DIR` takes precedence over the platform config
/// directory. A leading `~` in the variable is expanded.
pub fn config_dir() -> Result<PathBuf> {
  let strategy = choose_base_strategy().context("unable to find the config directory")?;
  if let Ok(dir) = std::env::var("THE_EDITOR_CONFIG_DIR") {
    return Ok(expand_tilde(Path::new(&dir), strategy.home_dir()));
  }
  Ok(strategy.config_dir().join("the-editor"))
}

pub fn lang_config_file() -> Result<PathBuf> {
  Ok(config_dir()?.join("languages.toml"))
}

fn expand_tilde(path: &Path, home: &Path) -> PathBuf {
  match path.strip_prefix("~") {
    Ok(rest) => home.join(rest),
    Err(_) => path.to_owned(),
  }
}

/// Merge two TOML documents, merging values from `right` onto `left`
///
/// `merge_depth` sets the nesting depth up to which values are merged instead
/// of overridden. Arrays of tables are merged entry by entry, matching
/// entries on their `name` key.
///
/// `merge_toml_values(a, b, 3)` combines
///
/// ```toml
/// # a
/// [[language]]
/// name = "kotlin"
/// quoted-keywords = ["in"]
/// [language.class-insert]
/// suffix = ".xxx"
/// ```
///
/// ```toml
/// # b
/// [[language]]
/// name = "kotlin"
/// [language.class-insert]
/// anchored-prefix = "  "
/// ```
///
/// into a `kotlin` entry that keeps `quoted-keywords` and whose
/// `class-insert` table holds both keys.
pub fn merge_toml_values(left: toml::Value, right: toml::Value, merge_depth: usize) -> toml::Value {
  use toml::Value;

  fn get_name(v: &Value) -> Option<&str> {
    v.get("name").and_then(Value::as_str)
  }

  match (left, right) {
    (Value::Array(mut left_items), Value::Array(right_items)) if merge_depth > 0 => {
      left_items.reserve(right_items.len());
      for rvalue in right_items {
        let lvalue = get_name(&rvalue)
          .and_then(|rname| left_items.iter().position(|v| get_name(v) == Some(rname)))
          .map(|lpos| left_items.remove(lpos));
        let mvalue = match lvalue {
          Some(lvalue) => merge_toml_values(lvalue, rvalue, merge_depth - 1),
          None => rvalue,
        };
        left_items.push(mvalue);
      }
      Value::Array(left_items)
    },
    (Value::Table(mut left_map), Value::Table(right_map)) if merge_depth > 0 => {
      for (rname, rvalue) in right_map {
        let merged = match left_map.remove(&rname) {
          Some(lvalue) => merge_toml_values(lvalue, rvalue, merge_depth - 1),
          None => rvalue,
        };
        left_map.insert(rname, merged);
      }
      Value::Table(left_map)
    },
    (_, value) => value,
  }
}

/// Finds the current workspace folder.
///
/// Searches upward from the current directory for a directory containing
/// `.git`, `.jj` or `.the-editor`. Returns `(workspace, false)` when one is
/// found and `(cwd, true)` otherwise.
pub fn find_workspace() -> (PathBuf, bool) {
  match std::env::current_dir() {
    Ok(current_dir) => find_workspace_in(current_dir),
    Err(_) => (PathBuf::new(), true),
  }
}

pub fn find_workspace_in(dir: impl AsRef<Path>) -> (PathBuf, bool) {
  let dir = dir.as_ref();
  for ancestor in dir.ancestors() {
    if ancestor.join(".git").exists()
      || ancestor.join(".jj").exists()
      || ancestor.join(".the-editor").exists()
    {
      return (ancestor.to_owned(), false);
    }
  }

  (dir.to_owned(), true)
}

#[cfg(test)]
mod merge_toml_tests {
  use toml::Value;

  use super::*;

  fn parse(text: &str) -> Value {
    toml::from_str(text).unwrap()
  }

  fn language<'a>(config: &'a Value, name: &str) -> &'a Value {
    config
      .get("language")
      .and_then(Value::as_array)
      .and_then(|langs| langs.iter().find(|v| v.get("name").and_then(Value::as_str) == Some(name)))
      .unwrap()
  }

  #[test]
  fn language_toml_map_merges() {
    const USER: &str = r#"
        [[language]]
        name = "kotlin"
        [language.class-insert]
        anchored-prefix = "  "
        "#;

    let base = config::default_lang_config().unwrap();
    let merged = merge_toml_values(base, parse(USER), 3);
    let kotlin = language(&merged, "kotlin");
    let class_insert = kotlin.get("class-insert").unwrap();

    assert_eq!(
      class_insert.get("anchored-prefix").and_then(Value::as_str),
      Some("  ")
    );
    // keys the user left alone survive
    assert_eq!(class_insert.get("suffix").and_then(Value::as_str), Some(".xxx"));
    assert!(kotlin.get("quoted-keywords").is_some());
  }

  #[test]
  fn nested_arrays_are_replaced() {
    const USER: &str = r#"
        [[language]]
        name = "kotlin"
        quoted-keywords = ["object"]
        "#;

    let base = config::default_lang_config().unwrap();
    let merged = merge_toml_values(base, parse(USER), 3);
    let kotlin = language(&merged, "kotlin");
    assert_eq!(
      kotlin.get("quoted-keywords").and_then(Value::as_array),
      Some(&vec![Value::String("object".into())])
    );
  }

  #[test]
  fn new_languages_are_appended() {
    const USER: &str = r#"
        [[language]]
        name = "scala"
        file-types = ["scala"]
        "#;

    let base = config::default_lang_config().unwrap();
    let merged = merge_toml_values(base, parse(USER), 3);
    assert_eq!(
      language(&merged, "scala").get("file-types").and_then(Value::as_array).map(Vec::len),
      Some(1)
    );
    language(&merged, "kotlin");
  }

  #[test]
  fn zero_depth_overrides() {
    let merged = merge_toml_values(parse("a = { b = 1 }"), parse("a = { c = 2 }"), 1);
    let a = merged.get("a").unwrap();
    assert!(a.get("b").is_none());
    assert_eq!(a.get("c").and_then(Value::as_integer), Some(2));
  }

  #[test]
  fn tilde_expansion() {
    let home = Path::new("/home/me");
    assert_eq!(
      expand_tilde(Path::new("~/cfg"), home),
      PathBuf::from("/home/me/cfg")
    );
    assert_eq!(expand_tilde(Path::new("/etc/cfg"), home), PathBuf::from("/etc/cfg"));
  }

  #[test]
  fn workspace_marker() {
    let root = std::env::temp_dir().join(format!("the-loader-ws-{}", std::process::id()));
    let nested = root.join("src").join("main");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::create_dir_all(root.join(".the-editor")).unwrap();

    let (found, fallback) = find_workspace_in(&nested);
    assert_eq!(found, root);
    assert!(!fallback);

    std::fs::remove_dir_all(&root).unwrap();
  }
}
