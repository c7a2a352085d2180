use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming the config file to load.
pub const CONFIG_ENV_VAR: &str = "TUTORLINK_CONFIG";
/// File looked up next to the executable when the variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "tutorlink.conf";

/// INI-like configuration: `[Section]` headers, `key = value` pairs,
/// `#` or `;` comments, optional double quotes around values. Keys before the
/// first section are globals.
#[derive(Debug, Default, Clone)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    /// Reads and parses the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Error reading file {}: {e}", path.display()))?;
        Ok(Self::parse(&content))
    }

    /// Loads from `TUTORLINK_CONFIG`, then `tutorlink.conf` next to the
    /// executable, and falls back to an empty config (built-in defaults).
    ///
    /// Returns the config and the path it came from, if any.
    #[must_use]
    pub fn load_default() -> (Self, Option<PathBuf>) {
        let candidates = std::env::var(CONFIG_ENV_VAR)
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .into_iter()
            .chain(exe_dir().map(|d| d.join(DEFAULT_CONFIG_FILE)));

        for path in candidates {
            if let Ok(cfg) = Self::load(&path) {
                return (cfg, Some(path));
            }
        }
        (Self::empty(), None)
    }

    /// Parses config text. Malformed lines (no `=`, no closing `]`) are skipped.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut globals = HashMap::new();
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current_section = Some(name.trim().to_string());
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_string();
                let value = value.trim().trim_matches('"').to_string();

                match &current_section {
                    None => {
                        globals.insert(key, value);
                    }
                    Some(sec) => {
                        sections.entry(sec.clone()).or_default().insert(key, value);
                    }
                }
            }
        }
        Config { globals, sections }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(|s| s.as_str())
    }

    /// Section value, then global value, then `default`.
    #[must_use]
    pub fn get_or_default<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key)
            .or_else(|| self.get_global(key))
            .unwrap_or(default)
    }

    /// Parses a value with `FromStr`.
    ///
    /// `Ok(None)` when the key is absent or empty; `Err` names the key when the
    /// value does not parse.
    pub fn get_parsed<T: FromStr>(&self, section: &str, key: &str) -> Result<Option<T>, String> {
        match self.get_non_empty(section, key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| format!("[{section}] {key}: invalid value '{raw}'")),
        }
    }

    /// Comma-separated list; empty items are dropped.
    #[must_use]
    pub fn get_list(&self, section: &str, key: &str) -> Vec<String> {
        self.get(section, key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn exe_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    const SAMPLE: &str = r#"
log_level = info

[Signaling]
bind_addr = "127.0.0.1:7000"
max_frame_len = 4096

; ICE servers
[Ice]
stun_urls = stun:a.example:3478, stun:b.example:3478 ,
candidate_pool_size = ten
turn_username =
"#;

    #[test]
    fn sections_and_globals() {
        let cfg = Config::parse(SAMPLE);
        assert_eq!(cfg.get_global("log_level"), Some("info"));
        assert_eq!(cfg.get("Signaling", "bind_addr"), Some("127.0.0.1:7000"));
        assert_eq!(cfg.get("Signaling", "missing"), None);
        assert_eq!(cfg.get_or_default("Ice", "log_level", "warn"), "info");
        assert_eq!(cfg.get_or_default("Ice", "nope", "warn"), "warn");
    }

    #[test]
    fn empty_values_are_not_non_empty() {
        let cfg = Config::parse(SAMPLE);
        assert_eq!(cfg.get("Ice", "turn_username"), Some(""));
        assert_eq!(cfg.get_non_empty("Ice", "turn_username"), None);
    }

    #[test]
    fn parsed_values() {
        let cfg = Config::parse(SAMPLE);
        let len: Option<u32> = cfg.get_parsed("Signaling", "max_frame_len").unwrap();
        assert_eq!(len, Some(4096));

        let missing: Option<u32> = cfg.get_parsed("Signaling", "nope").unwrap();
        assert_eq!(missing, None);

        let err = cfg.get_parsed::<u8>("Ice", "candidate_pool_size").unwrap_err();
        assert!(err.contains("candidate_pool_size"));
    }

    #[test]
    fn lists_trim_and_skip_empty_items() {
        let cfg = Config::parse(SAMPLE);
        assert_eq!(
            cfg.get_list("Ice", "stun_urls"),
            vec!["stun:a.example:3478".to_string(), "stun:b.example:3478".to_string()]
        );
        assert!(cfg.get_list("Ice", "turn_urls").is_empty());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load("/definitely/not/here.conf").unwrap_err();
        assert!(err.contains("/definitely/not/here.conf"));
    }
}
