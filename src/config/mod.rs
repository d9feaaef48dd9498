use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;

use crate::unmarshal::ResponseShape;

pub const DEFAULT_ENDPOINT: &str = "http://localhost/ocpu/library/base/R/do.call/json";

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut map = default_map();
        let config_path = default_config_path();

        // Read .ocpurc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                read_rc(BufReader::new(file), &mut map);
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    /// Defaults plus the given pairs; ignores the rc file and the environment.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = default_map();
        for (k, v) in pairs {
            map.insert(k.into(), v.into());
        }
        Self { inner: map, config_path: default_config_path() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn endpoint(&self) -> String {
        self.get("OCPU_ENDPOINT")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// `None` leaves the transport default in place (0 or unset).
    pub fn request_timeout(&self) -> Option<Duration> {
        self.get_u64("REQUEST_TIMEOUT")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn response_shape(&self) -> Result<ResponseShape, String> {
        match self.get("RESPONSE_SHAPE") {
            Some(v) => v.parse(),
            None => Ok(ResponseShape::default()),
        }
    }
}

/// `KEY=VALUE` lines; blanks and `#` comments are skipped, later keys win.
fn read_rc(reader: impl BufRead, map: &mut HashMap<String, String>) {
    for line in reader.lines().map_while(Result::ok) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            map.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &["OCPU_ENDPOINT", "REQUEST_TIMEOUT", "RESPONSE_SHAPE"];

    KEYS.contains(&k) || k.starts_with("OCPU_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("ocpu_bridge").join(".ocpurc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("OCPU_ENDPOINT".into(), DEFAULT_ENDPOINT.into());
    m.insert("REQUEST_TIMEOUT".into(), "0".into());
    m.insert("RESPONSE_SHAPE".into(), "broadcast".into());
    m
}
