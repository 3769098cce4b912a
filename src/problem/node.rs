//! Routing nodes: the depot plus one copy of each POI per available day.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Role;
use crate::window::Window;
use crate::Id;

/// Role of a routing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Depot,
    Attraction,
    Meal,
    Accommodation,
}

impl From<Role> for NodeRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Attraction => NodeRole::Attraction,
            Role::Meal => NodeRole::Meal,
            Role::Accommodation => NodeRole::Accommodation,
        }
    }
}

/// Composite id for the day-`k` copy of a POI.
pub fn composite_id(base: &str, day: usize) -> Id {
    format!("{base}#day{day}")
}

/// One routing node.
///
/// Every POI copy is day-specific: `windows_by_day` holds the days on
/// which this node may be visited and the usable opening windows for
/// each. Copies sharing `base_id` form a disjunction group in the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub idx: usize,
    /// Composite id (`<base>#day<k>`); the depot keeps its plain id.
    pub poi_id: Id,
    pub base_id: Id,
    pub name: String,
    pub role: NodeRole,
    pub lat: f64,
    pub lon: f64,
    /// Visit duration in minutes.
    pub service: u32,
    /// First selected theme carried by the POI, for the same-theme penalty.
    pub theme_primary: Option<String>,
    pub is_mandatory: bool,
    pub windows_by_day: BTreeMap<usize, Vec<Window>>,
}

impl Node {
    pub fn is_depot(&self) -> bool {
        self.role == NodeRole::Depot
    }

    pub fn is_meal(&self) -> bool {
        self.role == NodeRole::Meal
    }

    /// Days on which the node may be visited.
    pub fn available_days(&self) -> impl Iterator<Item = usize> + '_ {
        self.windows_by_day.keys().copied()
    }

    /// The binding day when the node is available on exactly one.
    pub fn day_binding(&self) -> Option<usize> {
        if self.windows_by_day.len() == 1 {
            self.windows_by_day.keys().next().copied()
        } else {
            None
        }
    }

    /// The solver binds the cumul to the first window of the day.
    pub fn first_window(&self, day: usize) -> Option<Window> {
        self.windows_by_day.get(&day).and_then(|w| w.first().copied())
    }

    /// All usable windows for a day, for post-hoc validation.
    pub fn windows(&self, day: usize) -> &[Window] {
        self.windows_by_day
            .get(&day)
            .map(|w| w.as_slice())
            .unwrap_or(&[])
    }
}
