//! Locating `interface <name>` blocks in a [`LineStore`].
//!
//! A block is four consecutive lines:
//!
//! ```text
//! interface eth0
//! static ip_address=192.168.1.5/24
//! static routers=192.168.1.1
//! static domain_name_servers=8.8.8.8
//! ```
//!
//! Two lookups exist and they deliberately disagree.  Loading matches the
//! trimmed header exactly; saving matches it as a prefix, so on save
//! `interface eth0.1` is taken for the `eth0` block.  Both return the last
//! header when several are present.  Existing dhcpcd.conf files edited by
//! earlier releases depend on this, so it stays.

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;

use crate::lines::LineStore;

pub const ADDRESS_MARKER: &str = "static ip_address=";
pub const ROUTERS_MARKER: &str = "static routers=";
pub const DNS_MARKER: &str = "static domain_name_servers=";

/// Header line for `iface`.
pub fn header(iface: &str) -> String {
    format!("interface {iface}")
}

/// Interface name of a header line, surrounding whitespace ignored.
fn header_name(line: &OsStr) -> Option<&[u8]> {
    line.as_bytes().trim_ascii().strip_prefix(b"interface ")
}

/// True if `line` is exactly the header of `iface`, ignoring surrounding
/// whitespace.
pub fn is_header(line: &OsStr, iface: &str) -> bool {
    header_name(line).is_some_and(|name| name == iface.as_bytes())
}

/// True if `line` starts with the header of `iface`, ignoring surrounding
/// whitespace.
pub fn is_header_prefix(line: &OsStr, iface: &str) -> bool {
    header_name(line).is_some_and(|name| name.starts_with(iface.as_bytes()))
}

/// Exact-match lookup used when loading.  Last header wins.
pub fn locate(store: &LineStore, iface: &str) -> Option<usize> {
    store.rfind(|l| is_header(l, iface))
}

/// Every exact-match header of `iface`, in file order.
pub fn locate_all<'a>(store: &'a LineStore, iface: &'a str) -> impl Iterator<Item = usize> + 'a {
    let matches = move |l: &OsStr| is_header(l, iface);
    std::iter::successors(store.find(0, matches), move |&prev| store.find(prev + 1, matches))
}

/// Prefix-match lookup used when saving.  Last header wins.
pub fn locate_for_save(store: &LineStore, iface: &str) -> Option<usize> {
    store.rfind(|l| is_header_prefix(l, iface))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(lines: &[&str]) -> LineStore {
        let mut s = LineStore::new();
        s.load(lines.iter().copied());
        s
    }

    fn exact(line: &str, iface: &str) -> bool {
        is_header(OsStr::new(line), iface)
    }

    fn prefix(line: &str, iface: &str) -> bool {
        is_header_prefix(OsStr::new(line), iface)
    }

    #[test]
    fn header_matching() {
        assert!(exact("interface eth0", "eth0"));
        assert!(exact("  interface eth0\t", "eth0"));
        assert!(!exact("interface eth0.1", "eth0"));
        assert!(!exact("#interface eth0", "eth0"));
        assert!(!exact("interface  eth0", "eth0"));

        assert!(prefix("interface eth0", "eth0"));
        assert!(prefix("interface eth0.1", "eth0"));
        assert!(!prefix("interface wlan0", "eth0"));
    }

    #[test]
    fn non_utf8_lines_never_match() {
        use std::os::unix::ffi::OsStrExt;
        let line = OsStr::from_bytes(b"interface eth\xe9");
        assert!(!is_header(line, "eth0"));
        assert!(!is_header_prefix(line, "eth0"));
    }

    #[test]
    fn last_header_wins() {
        let s = store(&["interface eth0", "x", "interface eth0", "y"]);
        assert_eq!(locate(&s, "eth0"), Some(2));
        assert_eq!(locate_for_save(&s, "eth0"), Some(2));
        assert_eq!(locate_all(&s, "eth0").collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn header_on_first_line_is_found() {
        let s = store(&["interface wlan0", "a", "b", "c"]);
        assert_eq!(locate(&s, "wlan0"), Some(0));
        assert_eq!(locate_for_save(&s, "wlan0"), Some(0));
    }

    #[test]
    fn load_and_save_lookups_disagree_on_suffixed_names() {
        let s = store(&["interface eth0", "a", "b", "c", "interface eth0.1", "d", "e", "f"]);
        assert_eq!(locate(&s, "eth0"), Some(0));
        assert_eq!(locate_for_save(&s, "eth0"), Some(4));
    }

    #[test]
    fn absent() {
        let s = store(&["hostname", "clientid"]);
        assert_eq!(locate(&s, "eth0"), None);
        assert_eq!(locate_for_save(&s, "eth0"), None);
    }
}
