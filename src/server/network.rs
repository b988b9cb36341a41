// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Best-effort probe of the currently connected Wi-Fi network. Purely
//! informational; every failure path degrades to "Not Connected".

use serde::{Deserialize, Serialize};
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub ssid: String,
    pub connected: bool,
}

impl NetworkInfo {
    fn connected(ssid: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            connected: true,
        }
    }

    fn disconnected() -> Self {
        Self {
            ssid: "Not Connected".to_string(),
            connected: false,
        }
    }
}

/// Returns the SSID of the active Wi-Fi connection, if any.
pub async fn current_ssid() -> NetworkInfo {
    if cfg!(target_os = "windows") {
        windows_ssid().await
    } else if cfg!(target_os = "macos") {
        macos_ssid().await
    } else {
        linux_ssid().await
    }
}

async fn run(cmd: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(cmd).args(args).output().await.ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

async fn windows_ssid() -> NetworkInfo {
    let Some(out) = run("netsh", &["wlan", "show", "interfaces"]).await else {
        return NetworkInfo::disconnected();
    };

    for line in out.lines() {
        let line = line.trim();
        // "SSID" but not "BSSID"
        if line.starts_with("SSID")
            && let Some((_, value)) = line.split_once(':')
        {
            let ssid = value.trim();
            if !ssid.is_empty() {
                return NetworkInfo::connected(ssid);
            }
        }
    }
    NetworkInfo::disconnected()
}

async fn macos_ssid() -> NetworkInfo {
    let airport = "/System/Library/PrivateFrameworks/Apple80211.framework/Versions/Current/Resources/airport";
    let Some(out) = run(airport, &["-I"]).await else {
        return NetworkInfo::disconnected();
    };

    for line in out.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("SSID:") {
            let ssid = value.trim();
            if !ssid.is_empty() {
                return NetworkInfo::connected(ssid);
            }
        }
    }
    NetworkInfo::disconnected()
}

async fn linux_ssid() -> NetworkInfo {
    if let Some(out) = run("nmcli", &["-t", "-f", "active,ssid", "dev", "wifi"]).await {
        for line in out.lines() {
            if let Some(ssid) = line.strip_prefix("yes:")
                && !ssid.is_empty()
            {
                return NetworkInfo::connected(ssid);
            }
        }
    }

    if let Some(out) = run("iwgetid", &["-r"]).await {
        let ssid = out.trim();
        if !ssid.is_empty() {
            return NetworkInfo::connected(ssid);
        }
    }

    NetworkInfo::disconnected()
}
