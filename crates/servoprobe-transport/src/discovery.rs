use std::fmt;

use serialport::SerialPortType;
use tracing::debug;

use crate::error::{Result, TransportError};

/// Description substrings that identify the usual USB-serial bridges found on
/// servo controller boards.
pub const DEFAULT_DESCRIPTION_TAGS: &[&str] = &["CH340", "USB", "ESP32"];

/// Kind of serial device, as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Usb,
    Pci,
    Bluetooth,
    Unknown,
}

impl PortKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PortKind::Usb => "usb",
            PortKind::Pci => "pci",
            PortKind::Bluetooth => "bluetooth",
            PortKind::Unknown => "unknown",
        }
    }
}

/// An enumerated serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device path or name to pass to [`crate::SerialStream::open`].
    pub name: String,
    /// Free-form description (manufacturer/product for USB devices).
    pub description: String,
    pub kind: PortKind,
}

impl PortInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: PortKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
        }
    }
}

impl From<serialport::SerialPortInfo> for PortInfo {
    fn from(info: serialport::SerialPortInfo) -> Self {
        let (kind, description) = match info.port_type {
            SerialPortType::UsbPort(usb) => {
                let parts: Vec<String> = [usb.manufacturer, usb.product]
                    .into_iter()
                    .flatten()
                    .filter(|s| !s.is_empty())
                    .collect();
                let description = if parts.is_empty() {
                    format!("USB VID:PID={:04X}:{:04X}", usb.vid, usb.pid)
                } else {
                    parts.join(" ")
                };
                (PortKind::Usb, description)
            }
            SerialPortType::PciPort => (PortKind::Pci, "PCI serial".to_string()),
            SerialPortType::BluetoothPort => (PortKind::Bluetooth, "Bluetooth serial".to_string()),
            SerialPortType::Unknown => (PortKind::Unknown, "n/a".to_string()),
        };

        Self {
            name: info.port_name,
            description,
            kind,
        }
    }
}

/// Predicate used to pick a port during auto-detection.
pub struct PortMatcher {
    label: String,
    predicate: Box<dyn Fn(&PortInfo) -> bool + Send + Sync>,
}

impl PortMatcher {
    /// Build a matcher from an arbitrary predicate.
    pub fn new(
        label: impl Into<String>,
        predicate: impl Fn(&PortInfo) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Match ports whose description contains any of `tags` (case-sensitive).
    pub fn description_contains<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        let label = format!("description contains any of [{}]", tags.join(", "));
        Self::new(label, move |port| {
            tags.iter().any(|tag| port.description.contains(tag.as_str()))
        })
    }

    /// Match every port.
    pub fn any() -> Self {
        Self::new("any port", |_| true)
    }

    pub fn matches(&self, port: &PortInfo) -> bool {
        (self.predicate)(port)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for PortMatcher {
    fn default() -> Self {
        Self::description_contains(DEFAULT_DESCRIPTION_TAGS.iter().copied())
    }
}

impl fmt::Debug for PortMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortMatcher")
            .field("label", &self.label)
            .finish()
    }
}

/// Enumerate the serial ports visible to this process.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    Ok(ports.into_iter().map(PortInfo::from).collect())
}

/// Find the first port accepted by `matcher`.
///
/// `Ok(None)` means enumeration worked but nothing matched; the caller has to
/// ask for an explicit port.
pub fn find_port(matcher: &PortMatcher) -> Result<Option<PortInfo>> {
    let ports = list_ports()?;
    Ok(select_port(ports, matcher))
}

/// Pick the first entry of `ports` accepted by `matcher`.
pub fn select_port(ports: Vec<PortInfo>, matcher: &PortMatcher) -> Option<PortInfo> {
    let found = ports.into_iter().find(|port| matcher.matches(port));
    match &found {
        Some(port) => debug!(port = %port.name, description = %port.description, "port matched"),
        None => debug!(matcher = matcher.label(), "no port matched"),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports() -> Vec<PortInfo> {
        vec![
            PortInfo::new("/dev/ttyS0", "n/a", PortKind::Unknown),
            PortInfo::new("/dev/ttyUSB0", "QinHeng Electronics CH340 serial converter", PortKind::Usb),
            PortInfo::new("/dev/ttyACM0", "Espressif ESP32-C6", PortKind::Usb),
        ]
    }

    #[test]
    fn default_matcher_picks_first_bridge() {
        let found = select_port(ports(), &PortMatcher::default()).unwrap();
        assert_eq!(found.name, "/dev/ttyUSB0");
    }

    #[test]
    fn custom_predicate_is_used() {
        let matcher = PortMatcher::new("acm only", |p| p.name.contains("ACM"));
        let found = select_port(ports(), &matcher).unwrap();
        assert_eq!(found.name, "/dev/ttyACM0");
    }

    #[test]
    fn no_match_is_none() {
        let matcher = PortMatcher::description_contains(["FTDI"]);
        assert!(select_port(ports(), &matcher).is_none());
        assert!(select_port(Vec::new(), &PortMatcher::any()).is_none());
    }

    #[test]
    fn matcher_label_lists_tags() {
        let matcher = PortMatcher::description_contains(["CH340", "CP210"]);
        assert_eq!(matcher.label(), "description contains any of [CH340, CP210]");
    }

    #[test]
    fn usb_info_builds_description() {
        let info = serialport::SerialPortInfo {
            port_name: "/dev/ttyUSB1".to_string(),
            port_type: SerialPortType::UsbPort(serialport::UsbPortInfo {
                vid: 0x1a86,
                pid: 0x7523,
                serial_number: None,
                manufacturer: Some("QinHeng".to_string()),
                product: Some("CH340".to_string()),
            }),
        };
        let port = PortInfo::from(info);
        assert_eq!(port.kind, PortKind::Usb);
        assert_eq!(port.description, "QinHeng CH340");
    }
}
