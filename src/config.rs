use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::diagnostics::Error;
use crate::handles::{HandleTypeSet, DEFAULT_HANDLE_TYPES};
use crate::loader::LoadOptions;

pub const CONFIG_FILE: &str = "ctxfirst.toml";

/// Settings for one run. Built from defaults, then `ctxfirst.toml`, then
/// command-line overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub handle_types: Vec<String>,
    /// Roots of stub packages, relative to the project root unless absolute.
    pub stub_paths: Vec<PathBuf>,
    pub exclude: Vec<String>,
    pub include_tests: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            handle_types: DEFAULT_HANDLE_TYPES.iter().map(|s| s.to_string()).collect(),
            stub_paths: Vec::new(),
            exclude: vec!["vendor".to_string(), "testdata".to_string()],
            include_tests: true,
        }
    }
}

// ---- TOML deserialization types ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    handle_types: Option<Vec<String>>,
    stub_paths: Option<Vec<PathBuf>>,
    exclude: Option<Vec<String>>,
    include_tests: Option<bool>,
}

impl Config {
    /// Parse configuration text. `path` is only used in error messages.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, Error> {
        let raw: TomlConfig = toml::from_str(text)
            .map_err(|e| Error::config(format!("failed to parse {}: {e}", CONFIG_FILE), path))?;
        let defaults = Config::default();
        let config = Config {
            handle_types: raw.handle_types.unwrap_or(defaults.handle_types),
            stub_paths: raw.stub_paths.unwrap_or(defaults.stub_paths),
            exclude: raw.exclude.unwrap_or(defaults.exclude),
            include_tests: raw.include_tests.unwrap_or(defaults.include_tests),
        };
        config.validate(path)?;
        Ok(config)
    }

    /// Read `ctxfirst.toml` from `dir`, falling back to defaults when absent.
    pub fn load_from_dir(dir: &Path) -> Result<Self, Error> {
        let path = dir.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Config::default());
        }
        Self::load_file(&path)
    }

    pub fn load_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("failed to read config: {e}"), path))?;
        Self::from_toml(&text, path)
    }

    pub fn validate(&self, path: &Path) -> Result<(), Error> {
        if self.handle_types.is_empty() {
            return Err(Error::config("handle_types must not be empty", path));
        }
        for name in &self.handle_types {
            validate_handle_type(name).map_err(|msg| Error::config(msg, path))?;
        }
        Ok(())
    }

    pub fn handles(&self) -> HandleTypeSet {
        HandleTypeSet::new(self.handle_types.iter().cloned())
    }

    pub fn load_options(&self, root: &Path) -> LoadOptions {
        LoadOptions {
            root: root.to_path_buf(),
            stub_roots: self
                .stub_paths
                .iter()
                .map(|p| if p.is_absolute() { p.clone() } else { root.join(p) })
                .collect(),
            exclude: self.exclude.clone(),
            include_tests: self.include_tests,
        }
    }
}

/// A handle type must be `import/path.Name`.
fn validate_handle_type(name: &str) -> Result<(), String> {
    let Some((path, ident)) = name.rsplit_once('.') else {
        return Err(format!("handle type '{name}' must be qualified as 'import/path.Name'"));
    };
    // The last path segment may itself contain dots (`gopkg.in/yaml.v3.Node`),
    // so only the part after the final dot is the type name.
    if path.is_empty() || path.ends_with('/') {
        return Err(format!("handle type '{name}' has an empty import path"));
    }
    let mut chars = ident.chars();
    let valid_start = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_alphanumeric() || c == '_') {
        return Err(format!("handle type '{name}' does not end in a type name"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Config, Error> {
        Config::from_toml(text, Path::new("ctxfirst.toml"))
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse("").unwrap(), Config::default());
    }

    #[test]
    fn values_override_defaults() {
        let config = parse(
            "handle_types = [\"example.com/db.Tx\"]\nstub_paths = [\"stubs\"]\nexclude = []\ninclude_tests = false\n",
        )
        .unwrap();
        assert_eq!(config.handle_types, ["example.com/db.Tx"]);
        assert_eq!(config.stub_paths, [PathBuf::from("stubs")]);
        assert!(config.exclude.is_empty());
        assert!(!config.include_tests);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse("handle_type = [\"context.Context\"]\n").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn handle_types_must_be_qualified() {
        assert!(parse("handle_types = [\"Context\"]\n").is_err());
        assert!(parse("handle_types = [\".Context\"]\n").is_err());
        assert!(parse("handle_types = [\"context.\"]\n").is_err());
        assert!(parse("handle_types = []\n").is_err());
        assert!(parse("handle_types = [\"gopkg.in/yaml.v3.Node\"]\n").is_ok());
    }

    #[test]
    fn stub_paths_resolve_against_root() {
        let config = Config { stub_paths: vec![PathBuf::from("stubs")], ..Config::default() };
        let opts = config.load_options(Path::new("/work/app"));
        assert_eq!(opts.stub_roots, [PathBuf::from("/work/app/stubs")]);
        assert_eq!(opts.exclude, ["vendor", "testdata"]);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_from_dir(dir.path()).unwrap(), Config::default());
        std::fs::write(dir.path().join(CONFIG_FILE), "include_tests = false\n").unwrap();
        assert!(!Config::load_from_dir(dir.path()).unwrap().include_tests);
    }
}
