//! One editing session over the dhcpcd configuration.
//!
//! Flow:
//!   1. Read the configuration file and populate the fields
//!   2. Let the caller edit the fields
//!   3. Save: write the fields back, stage the new file at `$HOME/temp`,
//!      write the apply script and run it
//!
//! Recover skips the fields entirely and stages a stock
//! `/etc/network/interfaces` instead.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::block;
use crate::config::AppConfig;
use crate::error::{IpError, Result};
use crate::fields::{self, InterfaceConfig, NetworkSettings};
use crate::lines::LineStore;
use crate::report::Reporter;
use crate::runner::{self, ScriptRun};
use crate::script::{self, ScriptMode};

/// File content and script prepared for one save or recover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staged {
    pub mode:    ScriptMode,
    pub content: Vec<u8>,
    pub script:  String,
}

#[derive(Debug)]
pub struct Session {
    cfg:      AppConfig,
    store:    LineStore,
    settings: NetworkSettings,
}

impl Session {
    /// Read `cfg.conf_file` and populate the fields from it.
    pub fn load(cfg: AppConfig) -> Result<Self> {
        let store = LineStore::read(&cfg.conf_file).map_err(|e| match e {
            IpError::Io(io) => IpError::Io(std::io::Error::new(
                io.kind(),
                format!("cannot read {}: {io}", cfg.conf_file.display()),
            )),
            other => other,
        })?;
        if store.is_empty() {
            warn!("{} is empty", cfg.conf_file.display());
        }
        info!("loaded {} lines from {}", store.len(), cfg.conf_file.display());
        Ok(Self::from_store(cfg, store))
    }

    /// Session over lines that are already in memory.
    pub fn from_store(cfg: AppConfig, store: LineStore) -> Self {
        for iface in fields::TRACKED {
            if let Some(header) = block::locate(&store, iface) {
                debug!("{iface} block at line {}", header + 1);
            }
        }
        let settings = fields::populate(&store, NetworkSettings::default());
        Session { cfg, store, settings }
    }

    pub fn settings(&self) -> &NetworkSettings {
        &self.settings
    }

    /// Fields of `iface`, `None` if it is not tracked.
    pub fn interface_mut(&mut self, iface: &str) -> Option<&mut InterfaceConfig> {
        self.settings.get_mut(iface)
    }

    /// Empty every field of `iface`.  The next save removes its block.
    pub fn clear(&mut self, iface: &str) -> Result<()> {
        let cfg = self
            .interface_mut(iface)
            .ok_or_else(|| IpError::Config(format!("unknown interface {iface}")))?;
        cfg.clear();
        info!("cleared {iface}");
        Ok(())
    }

    /// Write the fields into the lines and prepare the apply script.
    /// Nothing is written to disk.
    pub fn stage_save(&mut self) -> Staged {
        fields::depopulate(&mut self.store, &self.settings);
        Staged {
            mode:    ScriptMode::Apply,
            content: self.store.render(),
            script:  script::build_script(ScriptMode::Apply),
        }
    }

    /// Prepare the recovery file and script.  Nothing is written to disk.
    pub fn stage_recover(&self) -> Staged {
        Staged {
            mode:    ScriptMode::Recover,
            content: script::recovery_interfaces().as_bytes().to_vec(),
            script:  script::build_script(ScriptMode::Recover),
        }
    }

    /// Write the staged file and the script.  Both are complete and closed
    /// when this returns.  Returns the script path.
    pub async fn write_staged(&self, staged: &Staged) -> Result<PathBuf> {
        let staged_file = self.cfg.staged_file();
        tokio::fs::write(&staged_file, &staged.content)
            .await
            .map_err(|e| with_path(e, &staged_file))?;

        let script_file = self.cfg.script_file();
        runner::write_script(&script_file, &staged.script)
            .await
            .map_err(|e| match e {
                IpError::Io(io) => with_path(io, &script_file),
                other => other,
            })?;

        info!(
            "{:?}: staged {} and {}",
            staged.mode,
            staged_file.display(),
            script_file.display()
        );
        Ok(script_file)
    }

    /// Save the fields and run the apply script.
    pub async fn save<W>(&mut self, sink: W, reporter: Arc<dyn Reporter>) -> Result<ScriptRun>
    where
        W: Write + Send + 'static,
    {
        let staged = self.stage_save();
        let script = self.write_staged(&staged).await?;
        runner::run_script(&script, sink, reporter)
    }

    /// Stage the stock interfaces file and run the recover script.
    pub async fn recover<W>(&self, sink: W, reporter: Arc<dyn Reporter>) -> Result<ScriptRun>
    where
        W: Write + Send + 'static,
    {
        let staged = self.stage_recover();
        let script = self.write_staged(&staged).await?;
        runner::run_script(&script, sink, reporter)
    }
}

fn with_path(e: std::io::Error, path: &std::path::Path) -> IpError {
    IpError::Io(std::io::Error::new(
        e.kind(),
        format!("cannot write {}: {e}", path.display()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{self, Recorder, Severity};
    use std::os::unix::fs::PermissionsExt;

    const CONF: &str = "\
hostname
clientid
interface eth0
static ip_address=192.168.1.5/24
static routers=192.168.1.1
static domain_name_servers=8.8.8.8 8.8.4.4
slaac private
";

    fn setup() -> (tempfile::TempDir, AppConfig) {
        let dir = tempfile::tempdir().unwrap();
        let conf_file = dir.path().join("dhcpcd.conf");
        std::fs::write(&conf_file, CONF).unwrap();
        let cfg = AppConfig {
            conf_file,
            home_dir: dir.path().to_path_buf(),
            log_syslog: false,
        };
        (dir, cfg)
    }

    #[test]
    fn load_populates_fields() {
        let (_dir, cfg) = setup();
        let session = Session::load(cfg).unwrap();
        let eth0 = &session.settings().eth0;
        assert_eq!(eth0.address, "192.168.1.5");
        assert_eq!(eth0.prefix, "24");
        assert_eq!(eth0.dns, "8.8.8.8 8.8.4.4");
        assert!(session.settings().wlan0.is_cleared());
    }

    #[test]
    fn load_missing_file_names_it_once() {
        let (dir, mut cfg) = setup();
        cfg.conf_file = dir.path().join("missing.conf");
        let err = Session::load(cfg).unwrap_err();
        assert_eq!(err.to_string().matches("missing.conf").count(), 1, "{err}");
    }

    #[test]
    fn load_keeps_non_utf8_lines() {
        let (dir, cfg) = setup();
        let mut content = b"# R\xe9seau\n".to_vec();
        content.extend_from_slice(CONF.as_bytes());
        std::fs::write(dir.path().join("dhcpcd.conf"), &content).unwrap();

        let mut session = Session::load(cfg).unwrap();
        assert_eq!(session.settings().eth0.address, "192.168.1.5");
        assert_eq!(session.stage_save().content, content);
    }

    #[test]
    fn stage_save_without_edits_reproduces_file() {
        let (_dir, cfg) = setup();
        let mut session = Session::load(cfg).unwrap();
        let staged = session.stage_save();
        assert_eq!(staged.content, CONF.as_bytes());
        assert_eq!(staged.script, script::build_script(ScriptMode::Apply));
    }

    #[test]
    fn clear_then_save_drops_block() {
        let (_dir, cfg) = setup();
        let mut session = Session::load(cfg).unwrap();
        session.clear("eth0").unwrap();
        let staged = session.stage_save();
        assert_eq!(staged.content, b"hostname\nclientid\nslaac private\n");
    }

    #[test]
    fn clear_unknown_interface() {
        let (_dir, cfg) = setup();
        let mut session = Session::load(cfg).unwrap();
        assert!(session.clear("eth1").is_err());
    }

    #[test]
    fn edit_wlan0_appends_block() {
        let (_dir, cfg) = setup();
        let mut session = Session::load(cfg).unwrap();
        let wlan0 = session.interface_mut("wlan0").unwrap();
        wlan0.address = "192.168.1.6".into();
        wlan0.prefix = "24".into();
        let staged = session.stage_save();
        assert!(staged.content.starts_with(CONF.as_bytes()));
        assert!(staged.content.ends_with(
            b"interface wlan0\nstatic ip_address=192.168.1.6/24\nstatic routers=\n\
             static domain_name_servers=\n"
        ));
    }

    #[tokio::test]
    async fn write_staged_files() {
        let (dir, cfg) = setup();
        let mut session = Session::load(cfg).unwrap();
        let staged = session.stage_save();
        let script_path = session.write_staged(&staged).await.unwrap();

        assert_eq!(script_path, dir.path().join("ipconfig-script"));
        assert_eq!(std::fs::read_to_string(dir.path().join("temp")).unwrap(), CONF);
        let meta = std::fs::metadata(&script_path).unwrap();
        assert_ne!(meta.permissions().mode() & 0o100, 0);
        // The live file is never touched.
        assert_eq!(std::fs::read_to_string(dir.path().join("dhcpcd.conf")).unwrap(), CONF);
    }

    #[tokio::test]
    async fn write_staged_recover() {
        let (dir, cfg) = setup();
        let session = Session::load(cfg).unwrap();
        let staged = session.stage_recover();
        session.write_staged(&staged).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("temp")).unwrap(),
            script::recovery_interfaces()
        );
        let script_text = std::fs::read_to_string(dir.path().join("ipconfig-script")).unwrap();
        assert!(script_text.contains("/etc/network/interfaces"));
    }

    #[tokio::test]
    async fn write_failure_aborts_before_script() {
        let (dir, mut cfg) = setup();
        cfg.home_dir = dir.path().join("no-such-home");
        let mut session = Session::load(cfg).unwrap();
        let staged = session.stage_save();
        let err = session.write_staged(&staged).await.unwrap_err();
        assert!(err.to_string().contains("no-such-home"), "{err}");
        assert!(!dir.path().join("ipconfig-script").exists());
    }

    #[tokio::test]
    async fn save_failure_reaches_reporter_as_error() {
        let (dir, mut cfg) = setup();
        cfg.home_dir = dir.path().join("no-such-home");
        let mut session = Session::load(cfg).unwrap();

        let recorder = Arc::new(Recorder::default());
        let res = session.save(std::io::sink(), recorder.clone()).await;
        assert!(report::check(&*recorder, res).is_none());

        let reports = recorder.take();
        assert_eq!(reports.len(), 1, "reports: {reports:?}");
        assert_eq!(reports[0].0, Severity::Error);
        assert!(reports[0].1.contains("no-such-home"), "{}", reports[0].1);
    }
}
