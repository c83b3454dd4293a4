use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.25;
pub const DEFAULT_TRIES: usize = 4;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    read_env: bool,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut map = default_map();
        let config_path = default_config_path();

        // Read .lazydsgenrc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    if let Some((k, v)) = parse_line(&line) {
                        map.insert(k, v);
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, read_env: true, config_path }
    }

    /// Defaults plus the given pairs, ignoring the rc file and the environment.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = default_map();
        for (k, v) in pairs {
            map.insert(k.into(), v.into());
        }
        Self { inner: map, read_env: false, config_path: default_config_path() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if self.read_env {
            if let Ok(v) = env::var(key) {
                return Some(v);
            }
        }
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(|v| v.trim().parse::<f32>().ok())
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(PathBuf::from)
    }

    /// API key, treating blank values as missing.
    pub fn api_key(&self) -> Option<String> {
        self.get("OPENAI_API_KEY").filter(|s| !s.trim().is_empty())
    }

    pub fn default_model(&self) -> String {
        self.get("DEFAULT_MODEL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn default_temperature(&self) -> f32 {
        self.get_f32("DEFAULT_TEMPERATURE").unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn n_tries(&self) -> usize {
        self.get_usize("N_TRIES").unwrap_or(DEFAULT_TRIES)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.get("REQUEST_TIMEOUT")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(60),
        )
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(
            self.get("EXECUTION_TIMEOUT")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(120),
        )
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.get_path("ARTIFACT_PATH")
            .unwrap_or_else(|| PathBuf::from("generated.py"))
    }

    pub fn python_bin(&self) -> String {
        self.get("PYTHON_BIN").unwrap_or_else(|| "python3".into())
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    line.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
}

fn is_config_key(k: &str) -> bool {
    // Accept known keys or LAZYDSGEN_*/OPENAI_* for forward-compat
    const KEYS: &[&str] = &[
        "OPENAI_API_KEY",
        "API_BASE_URL",
        "REQUEST_TIMEOUT",
        "DEFAULT_MODEL",
        "DEFAULT_TEMPERATURE",
        "N_TRIES",
        "MAX_TOKENS",
        "PYTHON_BIN",
        "ARTIFACT_PATH",
        "EXECUTION_TIMEOUT",
        "PRETTIFY_MARKDOWN",
    ];

    KEYS.contains(&k) || k.starts_with("LAZYDSGEN_") || k.starts_with("OPENAI_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("lazydsgen").join(".lazydsgenrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    // Paths
    m.insert("ARTIFACT_PATH".into(), "generated.py".into());

    // Numbers
    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m.insert("EXECUTION_TIMEOUT".into(), "120".into());
    m.insert("N_TRIES".into(), DEFAULT_TRIES.to_string());
    m.insert("DEFAULT_TEMPERATURE".into(), DEFAULT_TEMPERATURE.to_string());

    // Strings
    m.insert("DEFAULT_MODEL".into(), DEFAULT_MODEL.into());
    m.insert("API_BASE_URL".into(), "default".into());
    m.insert("PYTHON_BIN".into(), "python3".into());

    // Bools as strings
    m.insert("PRETTIFY_MARKDOWN".into(), "true".into());

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_rc_or_env() {
        let cfg = Config::from_pairs(Vec::<(String, String)>::new());
        assert_eq!(cfg.default_model(), "gpt-3.5-turbo");
        assert_eq!(cfg.n_tries(), 4);
        assert!((cfg.default_temperature() - 0.25).abs() < f32::EPSILON);
        assert_eq!(cfg.artifact_path(), PathBuf::from("generated.py"));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(60));
        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn pairs_override_defaults() {
        let cfg = Config::from_pairs([("N_TRIES", "7"), ("DEFAULT_MODEL", "gpt-4o-mini")]);
        assert_eq!(cfg.n_tries(), 7);
        assert_eq!(cfg.default_model(), "gpt-4o-mini");
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let cfg = Config::from_pairs([("OPENAI_API_KEY", "   ")]);
        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn rc_lines_skip_comments_and_blanks() {
        assert_eq!(parse_line("# comment"), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(
            parse_line(" N_TRIES = 3 "),
            Some(("N_TRIES".to_string(), "3".to_string()))
        );
    }
}
