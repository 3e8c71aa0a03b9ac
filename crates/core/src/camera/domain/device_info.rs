use std::str::FromStr;

/// Where a camera is mounted on the enclosure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Front,
    Back,
    /// No location information; treated as an external camera.
    Unknown,
}

impl FromStr for Panel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(Panel::Front),
            "back" => Ok(Panel::Back),
            "unknown" | "external" => Ok(Panel::Unknown),
            other => Err(format!(
                "Panel must be one of: front, back, unknown, got '{other}'"
            )),
        }
    }
}

impl std::fmt::Display for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Panel::Front => write!(f, "front"),
            Panel::Back => write!(f, "back"),
            Panel::Unknown => write!(f, "unknown"),
        }
    }
}

/// A video capture device as reported by enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    pub panel: Panel,
}

impl DeviceInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, panel: Panel) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            panel,
        }
    }

    pub fn is_external(&self) -> bool {
        self.panel == Panel::Unknown
    }
}

/// Picks the front camera if there is one, otherwise the first device listed.
pub fn select_preferred(devices: &[DeviceInfo]) -> Option<&DeviceInfo> {
    devices
        .iter()
        .find(|d| d.panel == Panel::Front)
        .or_else(|| devices.first())
}
