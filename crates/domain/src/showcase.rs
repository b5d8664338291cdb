//! Macro-type showcase — the catalog of automation types the hub offers.
//!
//! Every type shares the lifecycle framework in [`crate::macros`]; only the
//! cover engine is implemented in this crate. The catalog is what the
//! management surface lists when a user picks a macro type to configure.

use serde::{Deserialize, Serialize};

/// The closed set of macro types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MacroKind {
    Lighting,
    Cover,
    Heating,
    WaterSupply,
    HeatedTowelRails,
    Ventilation,
    Humidification,
    Conditioning,
    HeatingCable,
    GateOpening,
    Security,
    Accounting,
    AutomaticReserveEntry,
    MasterSwitch,
}

impl MacroKind {
    /// All catalog entries, in display order.
    pub const ALL: [Self; 14] = [
        Self::Lighting,
        Self::Cover,
        Self::Heating,
        Self::WaterSupply,
        Self::HeatedTowelRails,
        Self::Ventilation,
        Self::Humidification,
        Self::Conditioning,
        Self::HeatingCable,
        Self::GateOpening,
        Self::Security,
        Self::Accounting,
        Self::AutomaticReserveEntry,
        Self::MasterSwitch,
    ];

    /// Human-readable name for the catalog.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Lighting => "Lighting",
            Self::Cover => "Covers",
            Self::Heating => "Heating",
            Self::WaterSupply => "Water supply",
            Self::HeatedTowelRails => "Heated towel rails",
            Self::Ventilation => "Ventilation",
            Self::Humidification => "Humidification",
            Self::Conditioning => "Conditioning",
            Self::HeatingCable => "Heating cable",
            Self::GateOpening => "Gate opening",
            Self::Security => "Security",
            Self::Accounting => "Metering",
            Self::AutomaticReserveEntry => "Automatic reserve entry",
            Self::MasterSwitch => "Master switch",
        }
    }

    /// Short description for the catalog.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Lighting => "Relay and RGBW lighting control.",
            Self::Cover => {
                "Relay and positional control of curtains, blinds, and other covers, \
                 driven by buttons, contacts, illumination, motion, noise, \
                 temperature, and time."
            }
            Self::Heating => {
                "Surface and air heating via boilers, pump groups, thermostatic \
                 actuators, and mixing units."
            }
            Self::WaterSupply => {
                "Hot and cold water supply, DHW recirculation, leak protection, \
                 and cold-water metering."
            }
            Self::HeatedTowelRails => "Relay control of electric towel-rail heaters.",
            Self::Ventilation => {
                "Room air quality via fans, damper actuators, and the heating system."
            }
            Self::Humidification => "Room humidity via relay-controlled humidifiers.",
            Self::Conditioning => "Room cooling and heating via air conditioners.",
            Self::HeatingCable => "Relay control of heating cable lines.",
            Self::GateOpening => "Relay and bus control of gates and roller shutters.",
            Self::Security => "Open-door and open-window detection.",
            Self::Accounting => "Pulse-counter metering of electricity, water, gas, and heat.",
            Self::AutomaticReserveEntry => {
                "Automatic switch-over between mains and generator supply."
            }
            Self::MasterSwitch => "Switching off lines that are unused when nobody is home.",
        }
    }
}

impl std::fmt::Display for MacroKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_as_screaming_snake_case() {
        let json = serde_json::to_string(&MacroKind::WaterSupply).unwrap();
        assert_eq!(json, "\"WATER_SUPPLY\"");
    }

    #[test]
    fn should_list_every_kind_exactly_once() {
        let mut seen = std::collections::HashSet::new();
        for kind in MacroKind::ALL {
            assert!(seen.insert(kind), "{kind} listed twice");
        }
        assert_eq!(seen.len(), MacroKind::ALL.len());
    }

    #[test]
    fn should_provide_nonempty_catalog_text() {
        for kind in MacroKind::ALL {
            assert!(!kind.name().is_empty());
            assert!(!kind.description().is_empty());
        }
    }
}
