//! Environment file loading utilities

use std::collections::HashMap;
use std::path::Path;

/// Variables resolved from the process environment and `.env` files.
///
/// Precedence follows the usual dotenv rules: `.env` never overrides a
/// variable that is already set in the process, `.env.{APP_ENV}` does.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    base: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl EnvVars {
    /// Load `.env` first, then `.env.{APP_ENV}` if APP_ENV is set.
    pub fn load(folder: &Path) -> Self {
        let base = read_env_file(folder, ".env");
        let overrides = match std::env::var("APP_ENV") {
            Ok(app_env) => read_env_file(folder, &format!(".env.{}", app_env)),
            Err(_) => HashMap::new(),
        };
        Self { base, overrides }
    }

    /// Build from explicit maps (used in tests and embedded setups).
    pub fn from_maps(base: HashMap<String, String>, overrides: HashMap<String, String>) -> Self {
        Self { base, overrides }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.overrides.get(key) {
            return Some(value.clone());
        }
        std::env::var(key)
            .ok()
            .or_else(|| self.base.get(key).cloned())
    }
}

/// Read a single .env file into a map. Missing or unreadable files yield an empty map.
pub fn read_env_file(folder: &Path, filename: &str) -> HashMap<String, String> {
    let env_file = folder.join(filename);
    let Ok(content) = std::fs::read_to_string(&env_file) else {
        return HashMap::new();
    };
    parse_env(&content)
}

/// Parse `KEY=value` lines, skipping blanks and comments.
pub fn parse_env(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim();
        let value = value.trim().trim_matches('"').trim_matches('\'');
        vars.insert(key.to_string(), value.to_string());
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_skips_comments_and_quotes() {
        let vars = parse_env("# comment\n\nSCHORLE_PORT=9000\nSCHORLE_TITLE=\"My App\"\nbroken line\n");
        assert_eq!(vars.get("SCHORLE_PORT"), Some(&"9000".to_string()));
        assert_eq!(vars.get("SCHORLE_TITLE"), Some(&"My App".to_string()));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_overrides_win_over_base() {
        let mut base = HashMap::new();
        base.insert("SCHORLE_TEST_ONLY_KEY".to_string(), "base".to_string());
        let mut overrides = HashMap::new();
        overrides.insert("SCHORLE_TEST_ONLY_KEY".to_string(), "override".to_string());
        let vars = EnvVars::from_maps(base, overrides);
        assert_eq!(vars.get("SCHORLE_TEST_ONLY_KEY"), Some("override".to_string()));
    }

    #[test]
    fn test_read_env_file_from_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "SCHORLE_LANG=de\n").unwrap();
        let vars = read_env_file(dir.path(), ".env");
        assert_eq!(vars.get("SCHORLE_LANG"), Some(&"de".to_string()));
        assert!(read_env_file(dir.path(), ".env.missing").is_empty());
    }
}
