//! Privileged helper scripts.
//!
//! ipconfig never writes the live configuration itself.  It stages the new
//! file at `$HOME/temp` and generates a script that moves it into place with
//! `sudo`.

/// What the generated script installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptMode {
    /// Install the staged file as `/etc/dhcpcd.conf` and restart dhcpcd.
    Apply,
    /// Install the staged file as `/etc/network/interfaces`.
    Recover,
}

/// Text of the script for `mode`.
pub fn build_script(mode: ScriptMode) -> String {
    let mut lines = vec!["#!/bin/bash"];
    match mode {
        ScriptMode::Apply => lines.extend([
            "chmod 664 $HOME/temp",
            "sudo chown root:netdev $HOME/temp",
            "sudo mv $HOME/temp /etc/dhcpcd.conf",
            "echo dhcpcd script complete!",
            "sudo service dhcpcd stop",
            "sudo dhclient -r eth0",
            "sudo dhclient -r wlan0",
            "sudo service dhcpcd start",
        ]),
        ScriptMode::Recover => lines.extend([
            "chmod 644 $HOME/temp",
            "sudo chown root:root $HOME/temp",
            "sudo mv $HOME/temp /etc/network/interfaces",
            "echo recover script complete!",
        ]),
    }

    let mut script = lines.join("\n");
    script.push('\n');
    script
}

/// Stock Raspbian `/etc/network/interfaces`, staged by Recover to undo
/// manual edits that conflict with dhcpcd.
pub fn recovery_interfaces() -> &'static str {
    "# interfaces(5) file used by ifup(8) and ifdown(8)\n\
     \n\
     # Please note that this file is written to be used with dhcpcd\n\
     # For static IP, consult /etc/dhcpcd.conf and 'man dhcpcd.conf'\n\
     \n\
     # Include files from /etc/network/interfaces.d:\n\
     source-directory /etc/network/interfaces.d\n\
     \n\
     auto lo\n\
     iface lo inet loopback\n\
     \n\
     iface eth0 inet manual\n\
     \n\
     allow-hotplug wlan0\n\
     iface wlan0 inet manual\n\
     \x20   wpa-conf /etc/wpa_supplicant/wpa_supplicant.conf\n\
     \n\
     allow-hotplug wlan1\n\
     iface wlan1 inet manual\n\
     \x20   wpa-conf /etc/wpa_supplicant/wpa_supplicant.conf"
}
