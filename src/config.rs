//! ipconfig configuration file parser.
//!
//! Optional `key = value` file, `/etc/ipconfig.conf` by default.  Every key
//! that is absent keeps its compiled-in default.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{IpError, Result};

/// Default location of the optional configuration file.
pub const DEFAULT_CONFIG: &str = "/etc/ipconfig.conf";

/// dhcpcd configuration read at startup.
const CONF_FILE: &str = "/etc/dhcpcd.conf";

/// Staged copy of the new configuration, relative to `home_dir`.
/// The generated scripts refer to it as `$HOME/temp`.
const STAGED_NAME: &str = "temp";

/// Generated script, relative to `home_dir`.
const SCRIPT_NAME: &str = "ipconfig-script";

/// Full program configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// dhcpcd configuration file the fields are loaded from.
    pub conf_file: PathBuf,
    /// Directory holding the staged file and the script (`$HOME`).
    pub home_dir: PathBuf,
    pub log_syslog: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            conf_file:  PathBuf::from(CONF_FILE),
            home_dir:   std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default(),
            log_syslog: false,
        }
    }
}

impl AppConfig {
    /// Path of the staged replacement file (`$HOME/temp`).
    pub fn staged_file(&self) -> PathBuf {
        self.home_dir.join(STAGED_NAME)
    }

    /// Path of the generated script (`$HOME/ipconfig-script`).
    pub fn script_file(&self) -> PathBuf {
        self.home_dir.join(SCRIPT_NAME)
    }
}

/// Load the configuration for this run.
///
/// With `path == None` the default file is read if it exists, otherwise the
/// defaults are used.  An explicitly given file must exist.
pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(p) => load_config(p),
        None => match fs::read_to_string(DEFAULT_CONFIG) {
            Ok(content) => Ok(parse_config(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(AppConfig::default()),
            Err(e) => Err(IpError::Config(format!("cannot read {DEFAULT_CONFIG}: {e}"))),
        },
    }
}

/// Parse `path` as an `ipconfig.conf` key=value configuration file.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| IpError::Config(format!("cannot read {}: {e}", path.display())))?;
    Ok(parse_config(&content))
}

fn parse_config(content: &str) -> AppConfig {
    let mut cfg = AppConfig::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, '=');
        let key = match parts.next() {
            Some(k) => k.trim().to_ascii_lowercase(),
            None => continue,
        };
        let val = match parts.next() {
            Some(v) => v.trim().to_string(),
            None => continue,
        };
        if val.is_empty() {
            continue;
        }

        match key.as_str() {
            "conf_file"  => cfg.conf_file  = PathBuf::from(&val),
            "home_dir"   => cfg.home_dir   = PathBuf::from(&val),
            "log_syslog" => cfg.log_syslog = val == "true" || val == "1" || val == "yes",
            _ => {} // ignore unknown keys
        }
    }

    cfg
}

/// Validate that required fields are populated.
pub fn validate_config(cfg: &AppConfig) -> Result<()> {
    if cfg.conf_file.as_os_str().is_empty() {
        return Err(IpError::Config("conf_file is required".into()));
    }
    if cfg.home_dir.as_os_str().is_empty() {
        return Err(IpError::Config(
            "home_dir is required (set it or export HOME)".into(),
        ));
    }
    Ok(())
}
