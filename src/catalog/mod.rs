//! Point-of-Interest catalog entities and the oracle seam.
//!
//! A [`Poi`] is immutable for the lifetime of one planning request. The
//! catalog itself lives behind the [`source::CatalogSource`] trait; the
//! in-process [`memory::MemoryCatalog`] implementation backs the test
//! suites.

pub mod hours;
pub mod memory;
pub mod source;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Id;

/// Role a POI can play in an itinerary. A POI may carry several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Attraction,
    Meal,
    Accommodation,
}

/// WGS84 decimal-degree position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Boolean suitability attributes from catalog metadata.
///
/// Missing attributes deserialize to `false`: the selector treats booleans
/// as neutral-unfavourable when the catalog says nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub kids_friendly: bool,
    pub pets_friendly: bool,
    pub halal_food: bool,
    pub vegan_options: bool,
    pub vegetarian_options: bool,
    pub wheelchair_entrance: bool,
    pub wheelchair_seating: bool,
    pub wheelchair_toilet: bool,
}

impl Attributes {
    /// Any of the three wheelchair flags.
    pub fn wheelchair_accessible(&self) -> bool {
        self.wheelchair_entrance || self.wheelchair_seating || self.wheelchair_toilet
    }
}

/// Catalog entity for one Point of Interest.
///
/// `open_hours` maps weekday names (`"Monday"`, ...) to raw label lists as
/// scraped; see [`hours`] for the grammar. An empty map means no opening
/// information at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: Id,
    pub name: String,
    pub roles: Vec<Role>,
    pub themes: Vec<String>,
    pub coordinates: Option<Coordinates>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub price_level: Option<u8>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub open_hours: HashMap<String, Vec<String>>,
}

impl Poi {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Attraction role without meal or accommodation roles; only these
    /// earn an interest score.
    pub fn is_pure_attraction(&self) -> bool {
        self.has_role(Role::Attraction)
            && !self.has_role(Role::Meal)
            && !self.has_role(Role::Accommodation)
    }

    /// Accommodation role without attraction or meal roles; depot
    /// candidates are picked from these.
    pub fn is_pure_accommodation(&self) -> bool {
        self.has_role(Role::Accommodation)
            && !self.has_role(Role::Attraction)
            && !self.has_role(Role::Meal)
    }

    pub fn has_theme(&self, theme: &str) -> bool {
        self.themes.iter().any(|t| t == theme)
    }
}
