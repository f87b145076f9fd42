use std::fmt;

/// Every mapping strategy a host can be dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapperKind {
    CambiumCanopyPmp,
    CambiumEpmp,
    CambiumPtp250,
    CambiumPtp500,
    CambiumPtp600,
    CambiumPtp650,
    CambiumPtp670,
    CambiumPtp700,
    CambiumPtp800,
    UbiquitiAirMax,
    UbiquitiEdge,
    MimosaBx,
    MimosaAx,
    EtherwanSwitch,
    MikroTik,
    /// Fallback for unrecognised identifiers.
    Generic { network_site: bool },
}

impl MapperKind {
    pub const VENDOR: [MapperKind; 15] = [
        Self::CambiumCanopyPmp,
        Self::CambiumEpmp,
        Self::CambiumPtp250,
        Self::CambiumPtp500,
        Self::CambiumPtp600,
        Self::CambiumPtp650,
        Self::CambiumPtp670,
        Self::CambiumPtp700,
        Self::CambiumPtp800,
        Self::UbiquitiAirMax,
        Self::UbiquitiEdge,
        Self::MimosaBx,
        Self::MimosaAx,
        Self::EtherwanSwitch,
        Self::MikroTik,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::CambiumCanopyPmp => "cambium-canopy-pmp",
            Self::CambiumEpmp => "cambium-epmp",
            Self::CambiumPtp250 => "cambium-ptp250",
            Self::CambiumPtp500 => "cambium-ptp500",
            Self::CambiumPtp600 => "cambium-ptp600",
            Self::CambiumPtp650 => "cambium-ptp650",
            Self::CambiumPtp670 => "cambium-ptp670",
            Self::CambiumPtp700 => "cambium-ptp700",
            Self::CambiumPtp800 => "cambium-ptp800",
            Self::UbiquitiAirMax => "ubiquiti-airmax",
            Self::UbiquitiEdge => "ubiquiti-edge",
            Self::MimosaBx => "mimosa-bx",
            Self::MimosaAx => "mimosa-ax",
            Self::EtherwanSwitch => "etherwan-switch",
            Self::MikroTik => "mikrotik",
            Self::Generic { network_site: true } => "generic-site",
            Self::Generic { network_site: false } => "generic",
        }
    }

    pub fn is_generic(self) -> bool {
        matches!(self, Self::Generic { .. })
    }
}

impl fmt::Display for MapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
