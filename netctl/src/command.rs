//! The nmcli command lines the manager issues, built as plain strings so
//! they can be inspected without a shell.

/// IPv4 prefix length used for the point-to-point link.
pub const ADHOC_PREFIX: u8 = 24;

/// Lists wireless device names, one per line.
pub fn list_wifi_devices() -> String {
    "nmcli --get-values GENERAL.DEVICE,GENERAL.TYPE device show | sed '/^wifi/!{h;d;};x'"
        .to_owned()
}

/// The connection currently active on `device`.
pub fn active_connection(device: &str) -> String {
    format!(
        "nmcli -t -f GENERAL.CONNECTION device show {device} | grep -oP 'GENERAL.CONNECTION:\\K\\w+'"
    )
}

/// Probe for a profile by name. Exit code 10 means no such connection.
pub fn show_connection(ssid: &str) -> String {
    format!("nmcli -t -f connection.id con show {ssid}")
}

/// Probe for a profile via the connection list; an empty grep exits
/// non-zero.
pub fn grep_connection(ssid: &str) -> String {
    format!("nmcli connection show | grep {ssid}")
}

pub fn delete_connection(ssid: &str) -> String {
    format!("nmcli con delete {ssid}")
}

pub fn add_wifi_profile(device: &str, ssid: &str) -> String {
    format!("nmcli con add type wifi ifname {device} con-name {ssid} autoconnect yes ssid {ssid}")
}

/// Ad-hoc mode, manual IPv4 on a /24, IPv6 off.
pub fn modify_adhoc(ssid: &str, ip: &str) -> String {
    format!(
        "nmcli con modify {ssid} 802-11-wireless.mode adhoc ipv4.addresses {ip}/{ADHOC_PREFIX} ipv4.method manual ipv6.method ignore"
    )
}

pub fn connection_up(name: &str) -> String {
    format!("nmcli con up {name}")
}

pub fn connection_down(name: &str) -> String {
    format!("nmcli con down {name}")
}
