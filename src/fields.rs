//! Static IP fields of the tracked interfaces and their mapping onto
//! dhcpcd.conf blocks.

use std::ffi::OsStr;

use serde::{Deserialize, Serialize};

use crate::block::{self, ADDRESS_MARKER, DNS_MARKER, ROUTERS_MARKER};
use crate::lines::LineStore;

/// Interfaces managed by ipconfig, in save order.
pub const TRACKED: [&str; 2] = ["eth0", "wlan0"];

/// Static configuration of one interface.  All values are kept as text;
/// nothing here validates them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    pub address: String,
    pub prefix:  String,
    pub router:  String,
    pub dns:     String,
}

impl InterfaceConfig {
    /// An empty address means "no static configuration".
    pub fn is_cleared(&self) -> bool {
        self.address.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn address_line(&self) -> String {
        format!("{ADDRESS_MARKER}{}/{}", self.address, self.prefix)
    }

    fn routers_line(&self) -> String {
        format!("{ROUTERS_MARKER}{}", self.router)
    }

    fn dns_line(&self) -> String {
        format!("{DNS_MARKER}{}", self.dns)
    }
}

/// Fields of every tracked interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSettings {
    pub eth0:  InterfaceConfig,
    pub wlan0: InterfaceConfig,
}

impl NetworkSettings {
    pub fn get(&self, iface: &str) -> Option<&InterfaceConfig> {
        match iface {
            "eth0" => Some(&self.eth0),
            "wlan0" => Some(&self.wlan0),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, iface: &str) -> Option<&mut InterfaceConfig> {
        match iface {
            "eth0" => Some(&mut self.eth0),
            "wlan0" => Some(&mut self.wlan0),
            _ => None,
        }
    }
}

/// Value between the first and second `=` of `line`.
fn value(line: &str) -> &str {
    line.split('=').nth(1).unwrap_or("")
}

/// Apply the data lines following the header at `header` onto `cfg`.
/// A line that is missing or does not carry its expected marker leaves the
/// corresponding field alone.  Bytes that are not UTF-8 are replaced with
/// U+FFFD; save rewrites these lines in any case.
fn apply_block(store: &LineStore, header: usize, cfg: &mut InterfaceConfig) {
    let data = |offset: usize, marker: &str| {
        store
            .get(header + offset)
            .map(OsStr::to_string_lossy)
            .filter(|l| l.trim().starts_with(marker))
    };

    if let Some(line) = data(1, ADDRESS_MARKER) {
        let mut parts = value(&line).split('/');
        cfg.address = parts.next().unwrap_or("").to_string();
        if let Some(prefix) = parts.next() {
            cfg.prefix = prefix.to_string();
        }
    }
    if let Some(line) = data(2, ROUTERS_MARKER) {
        cfg.router = value(&line).to_string();
    }
    if let Some(line) = data(3, DNS_MARKER) {
        cfg.dns = value(&line).to_string();
    }
}

/// Fill `cfg` from the blocks of `iface` found in `store`.
///
/// Every exact-match header is applied in file order, so with duplicate
/// blocks the later one wins field by field.
pub fn populate_interface(store: &LineStore, iface: &str, mut cfg: InterfaceConfig) -> InterfaceConfig {
    for header in block::locate_all(store, iface) {
        apply_block(store, header, &mut cfg);
    }
    cfg
}

/// Read the fields of all tracked interfaces, starting from `settings`.
pub fn populate(store: &LineStore, settings: NetworkSettings) -> NetworkSettings {
    NetworkSettings {
        eth0:  populate_interface(store, "eth0", settings.eth0),
        wlan0: populate_interface(store, "wlan0", settings.wlan0),
    }
}

/// Write the block of `iface`, appending a new one if none exists.
fn upsert(store: &mut LineStore, iface: &str, cfg: &InterfaceConfig) {
    match block::locate_for_save(store, iface) {
        Some(header) => {
            store.replace_block(header, cfg.address_line(), cfg.routers_line(), cfg.dns_line())
        }
        None => {
            let end = store.len();
            store.insert_block(
                end,
                block::header(iface),
                cfg.address_line(),
                cfg.routers_line(),
                cfg.dns_line(),
            );
        }
    }
}

/// Drop the block of `iface` if its address was cleared.
fn remove_if_cleared(store: &mut LineStore, iface: &str, cfg: &InterfaceConfig) {
    if !cfg.is_cleared() {
        return;
    }
    if let Some(header) = block::locate_for_save(store, iface) {
        store.remove_block(header);
    }
}

/// Write `settings` back into `store`.
///
/// Every tracked interface is written first (eth0, then wlan0), then the
/// cleared ones are removed in reverse order.  Each step looks its header
/// up again because the previous step may have shifted it.
pub fn depopulate(store: &mut LineStore, settings: &NetworkSettings) {
    for iface in TRACKED {
        if let Some(cfg) = settings.get(iface) {
            upsert(store, iface, cfg);
        }
    }
    for iface in TRACKED.iter().rev() {
        if let Some(cfg) = settings.get(iface) {
            remove_if_cleared(store, iface, cfg);
        }
    }
}
