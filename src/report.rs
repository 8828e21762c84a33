//! User-facing notifications.
//!
//! The core never decides how a failure is shown.  It hands a severity and
//! a message to a [`Reporter`]; the front end renders it.

use std::fmt;

use log::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info    => "info",
            Severity::Warning => "warning",
            Severity::Error   => "error",
        })
    }
}

pub trait Reporter: Send + Sync {
    fn report(&self, severity: Severity, message: &str);
}

/// Reports through the `log` facade (stderr or syslog, see `main`).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info    => info!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error   => error!("{message}"),
        }
    }
}

/// Report the error of `res`, if any, at `Error` severity.  Returns the
/// success value.
pub fn check<T, E: fmt::Display>(reporter: &dyn Reporter, res: Result<T, E>) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(e) => {
            reporter.report(Severity::Error, &format!("{e:#}"));
            None
        }
    }
}

/// Collects reports in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Recorder(pub std::sync::Mutex<Vec<(Severity, String)>>);

#[cfg(test)]
impl Recorder {
    pub fn take(&self) -> Vec<(Severity, String)> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

#[cfg(test)]
impl Reporter for Recorder {
    fn report(&self, severity: Severity, message: &str) {
        self.0.lock().unwrap().push((severity, message.to_string()));
    }
}
