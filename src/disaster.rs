//! Disaster catalog and the publish/resolve state machine held by the world.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A player response: a fixed head-count change for one target species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterAction {
    pub label: String,
    #[serde(alias = "targetSpeciesName")]
    pub target: String,
    #[serde(alias = "deltaPopulation", alias = "populationDelta")]
    pub delta_population: f64,
}

impl DisasterAction {
    pub fn new(label: impl Into<String>, target: impl Into<String>, delta_population: f64) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
            delta_population,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disaster {
    #[serde(default)]
    pub key: String,
    pub title: String,
    pub description: String,
    #[serde(alias = "impactDescription")]
    pub impact: String,
    pub actions: Vec<DisasterAction>,
}

/// Disaster definitions keyed by a stable identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Disaster>", into = "BTreeMap<String, Disaster>")]
pub struct DisasterCatalog {
    entries: BTreeMap<String, Disaster>,
}

impl From<BTreeMap<String, Disaster>> for DisasterCatalog {
    fn from(mut entries: BTreeMap<String, Disaster>) -> Self {
        for (key, disaster) in entries.iter_mut() {
            disaster.key = key.clone();
        }
        Self { entries }
    }
}

impl From<DisasterCatalog> for BTreeMap<String, Disaster> {
    fn from(catalog: DisasterCatalog) -> Self {
        catalog.entries
    }
}

impl Default for DisasterCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DisasterCatalog {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Disaster> {
        self.entries.get(key)
    }

    /// Entry at `index` in key order.
    pub fn nth(&self, index: usize) -> Option<&Disaster> {
        self.entries.values().nth(index)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, mut disaster: Disaster) {
        let key = key.into();
        disaster.key = key.clone();
        self.entries.insert(key, disaster);
    }

    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        catalog.insert(
            "wildfire",
            disaster(
                "Wildfire",
                "Extreme heat and prolonged drought ignited a wildfire.",
                "Forest loss, wildlife displacement, and reduced air quality.",
                [("Replant Trees", "Grass", 200.0), ("Protect Nesting Zones", "Hawk", 10.0)],
            ),
        );
        catalog.insert(
            "landslide",
            disaster(
                "Landslide",
                "Heavy rainfall destabilized hillside terrain.",
                "Severe soil erosion and blocked waterways.",
                [("Stabilize Slopes", "Rabbit", 30.0), ("Save Cliff Fox Nests", "Fox", 25.0)],
            ),
        );
        catalog.insert(
            "flood",
            disaster(
                "Flood",
                "Overflowing rivers flooded the ecosystem.",
                "Plant loss and water contamination.",
                [("Build Safe Burrows", "Rabbit", 45.0), ("Divert Flooding", "Grass", -180.0)],
            ),
        );
        catalog.insert(
            "drought",
            disaster(
                "Drought",
                "Extended lack of rainfall stressed the biome.",
                "Crop failure and wildlife decline.",
                [("Conserve Water", "Fox", 20.0), ("Protect Watering Holes", "Rabbit", 25.0)],
            ),
        );
        catalog.insert(
            "invasive",
            disaster(
                "Invasive Species",
                "A non-native species spread rapidly.",
                "Native species populations declined.",
                [("Remove Invaders", "Grass", -40.0), ("Allow Spread", "Hawk", 5.0)],
            ),
        );
        catalog
    }
}

fn disaster<const N: usize>(
    title: &str,
    description: &str,
    impact: &str,
    actions: [(&str, &str, f64); N],
) -> Disaster {
    Disaster {
        key: String::new(),
        title: title.to_string(),
        description: description.to_string(),
        impact: impact.to_string(),
        actions: actions
            .into_iter()
            .map(|(label, target, delta)| DisasterAction::new(label, target, delta))
            .collect(),
    }
}

/// Either nothing is happening, or a published disaster waits for the
/// player's response. The response, once chosen, travels with the disaster.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DisasterState {
    #[default]
    Idle,
    AwaitingResolution {
        disaster: Disaster,
        response: Option<DisasterAction>,
    },
}

impl DisasterState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DisasterState::Idle)
    }

    pub fn disaster(&self) -> Option<&Disaster> {
        match self {
            DisasterState::Idle => None,
            DisasterState::AwaitingResolution { disaster, .. } => Some(disaster),
        }
    }

    pub fn response(&self) -> Option<&DisasterAction> {
        match self {
            DisasterState::Idle => None,
            DisasterState::AwaitingResolution { response, .. } => response.as_ref(),
        }
    }
}
