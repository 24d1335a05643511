//! Device identity derived from the factory MAC address.

// ---------------------------------------------------------------------------
// MAC source
// ---------------------------------------------------------------------------

#[cfg(target_os = "espidf")]
/// Base MAC address burned into eFuse.
pub fn read_mac() -> [u8; 6] {
    let mut mac = [0u8; 6];
    // SAFETY: mac is a valid 6-byte out buffer for the call.
    let err = unsafe { esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr()) };
    if err != 0 {
        log::warn!("eFuse MAC read failed, using zero MAC");
    }
    mac
}

#[cfg(not(target_os = "espidf"))]
/// Fixed MAC for host-side runs.
pub fn read_mac() -> [u8; 6] {
    [0xde, 0xad, 0xbe, 0xef, 0xca, 0xfe]
}

// ---------------------------------------------------------------------------
// Derived names
// ---------------------------------------------------------------------------

/// Provisioning AP name: `PinMonitor-XXYYZZ` from the low three MAC bytes.
pub fn ap_ssid(mac: &[u8; 6]) -> heapless::String<32> {
    let mut s = heapless::String::new();
    // Cannot overflow: "PinMonitor-" plus six hex digits is 17 bytes.
    let _ = core::fmt::write(
        &mut s,
        format_args!("PinMonitor-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]),
    );
    s
}
