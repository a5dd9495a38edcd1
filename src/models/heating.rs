use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A physical location reported by the heating controller.
///
/// Variant order is the fixed order in which zone updates are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Zone {
    #[serde(rename = "main")]
    Main,
    #[serde(rename = "Stua1")]
    Stua1,
    #[serde(rename = "Stua2")]
    Stua2,
    #[serde(rename = "Sov1")]
    Sov1,
}

impl Zone {
    pub const ALL: [Zone; 4] = [Zone::Main, Zone::Stua1, Zone::Stua2, Zone::Sov1];

    /// Rooms that can appear as quoted names in a message.
    pub const ROOMS: [Zone; 3] = [Zone::Stua1, Zone::Stua2, Zone::Sov1];

    /// Identifier as it appears in controller messages.
    pub fn name(&self) -> &'static str {
        match self {
            Zone::Main => "main",
            Zone::Stua1 => "Stua1",
            Zone::Stua2 => "Stua2",
            Zone::Sov1 => "Sov1",
        }
    }

    /// Record id of the zone in the `heating_state` collection.
    pub fn storage_key(&self) -> String {
        self.name().to_lowercase()
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Zone::ALL
            .into_iter()
            .find(|zone| zone.name() == s)
            .ok_or_else(|| format!("Unknown zone: {}", s))
    }
}

/// Structured state extracted from one controller SMS.
///
/// A zone is present in `temperatures` only if a line for it was recognised.
/// `None` inside the map means the controller reported the unknown token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMessage {
    pub text: String,
    pub temperatures: BTreeMap<Zone, Option<i32>>,
    pub is_heating_on: BTreeMap<Zone, bool>,
    pub is_frost_protection_on: BTreeMap<Zone, bool>,
}

impl ParsedMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Zones mentioned in the message, in write order.
    pub fn zones(&self) -> impl Iterator<Item = Zone> + '_ {
        Zone::ALL
            .into_iter()
            .filter(|zone| self.temperatures.contains_key(zone))
    }

    /// Builds the persisted record for a zone, or `None` if the zone was not mentioned.
    pub fn heating_state(&self, zone: Zone) -> Option<HeatingState> {
        let temperature = *self.temperatures.get(&zone)?;

        Some(HeatingState {
            temperature,
            is_heating_on: self.is_heating_on.get(&zone).copied().unwrap_or(false),
            is_frost_protection_on: self
                .is_frost_protection_on
                .get(&zone)
                .copied()
                .unwrap_or(false),
            last_command: self.text.clone(),
            last_command_success: true,
        })
    }
}

/// Body written to the `heating_state` collection for one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatingState {
    pub temperature: Option<i32>,
    pub is_heating_on: bool,
    pub is_frost_protection_on: bool,
    pub last_command: String,
    pub last_command_success: bool,
}
