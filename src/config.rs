//! Output settings that can vary between toolchains.

use std::env;

/// Environment variable overriding the name of the emitted entry symbol.
pub const ENTRY_SYMBOL_VAR: &str = "STACKCC_ENTRY_SYMBOL";

const DEFAULT_ENTRY_SYMBOL: &str = "main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// Label the generated program is exported under. Darwin linkers expect `_main`.
  pub entry_symbol: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      entry_symbol: DEFAULT_ENTRY_SYMBOL.to_string(),
    }
  }
}

impl Config {
  /// Read overrides from the process environment, falling back to defaults.
  pub fn from_env() -> Self {
    Self::from_entry_symbol(env::var(ENTRY_SYMBOL_VAR).ok())
  }

  fn from_entry_symbol(value: Option<String>) -> Self {
    match value.map(|symbol| symbol.trim().to_string()) {
      Some(symbol) if !symbol.is_empty() => Self {
        entry_symbol: symbol,
      },
      _ => Self::default(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_to_main() {
    assert_eq!(Config::default().entry_symbol, "main");
    assert_eq!(Config::from_entry_symbol(None), Config::default());
  }

  #[test]
  fn blank_override_is_ignored() {
    assert_eq!(
      Config::from_entry_symbol(Some("  ".into())),
      Config::default()
    );
  }

  #[test]
  fn override_is_trimmed() {
    let config = Config::from_entry_symbol(Some(" _main\n".into()));
    assert_eq!(config.entry_symbol, "_main");
  }
}
