/// Core data types for the charging site analysis.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no logic beyond small accessors and no I/O.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Tag keys
// ---------------------------------------------------------------------------

/// Feature tag carried by every charging station.
pub const TAG_AMENITY: &str = "amenity";

/// Value of `amenity` for charging stations.
pub const AMENITY_CHARGING_STATION: &str = "charging_station";

/// Number of vehicles that can charge at the same time.
pub const TAG_CAPACITY: &str = "capacity";

/// Group size marker written on every synthetic site.
pub const TAG_GROUP: &str = "GROUP";

/// Marker written on charge points that were merged into a synthetic site.
/// Upper case so that it stands out for manual review in an editor.
pub const TAG_MERGED_MARKER: &str = "MAN_MADE";
pub const MERGED_MARKER_VALUE: &str = "CHARGE_POINT";

/// Tags voted on across the members of a group.
pub const TAG_NAME: &str = "name";
pub const TAG_BRAND: &str = "brand";
pub const TAG_OPERATOR: &str = "operator";

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// OSM element type. Identifiers are only unique within one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Node,
    Way,
    Relation,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Node => "node",
            ElementType::Way => "way",
            ElementType::Relation => "relation",
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of a source element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    pub element_type: ElementType,
    pub id: i64,
}

impl ElementId {
    pub fn node(id: i64) -> Self {
        Self { element_type: ElementType::Node, id }
    }

    pub fn way(id: i64) -> Self {
        Self { element_type: ElementType::Way, id }
    }

    pub fn relation(id: i64) -> Self {
        Self { element_type: ElementType::Relation, id }
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.element_type, self.id)
    }
}

// ---------------------------------------------------------------------------
// Point entities
// ---------------------------------------------------------------------------

/// One raw charging station element, reduced to what clustering needs.
///
/// Ways and relations are represented by their Overpass `center`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargePoint {
    pub id: ElementId,
    pub lon: f64,
    pub lat: f64,
    pub tags: BTreeMap<String, String>,
    /// Set once the point has been relabeled as a member of a synthetic site.
    pub modified: bool,
}

impl ChargePoint {
    pub fn new(id: ElementId, lon: f64, lat: f64) -> Self {
        Self {
            id,
            lon,
            lat,
            tags: BTreeMap::new(),
            modified: false,
        }
    }

    /// Builder-style helper, mostly used to set up tests and fixtures.
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    /// Coordinate as `(lon, lat)`.
    pub fn point(&self) -> (f64, f64) {
        (self.lon, self.lat)
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Composite elements (relations) describe a whole site rather than
    /// a single charger.
    pub fn is_composite(&self) -> bool {
        self.id.element_type == ElementType::Relation
    }
}

/// Connected component of charge points under the grouping distance.
///
/// Member order is insertion order and carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub members: Vec<ElementId>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// New charging station node representing a group of two or more points.
///
/// Identifiers are negative so that they can never collide with source
/// elements.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSite {
    pub id: i64,
    pub lon: f64,
    pub lat: f64,
    pub tags: BTreeMap<String, String>,
}

impl SyntheticSite {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Exclusions
// ---------------------------------------------------------------------------

/// Why a point was kept out of grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Relations describe a whole site already.
    CompositeElement,
    /// Carries a `capacity` tag above the per-charger limit.
    HighCapacity(u32),
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::CompositeElement => write!(f, "composite element"),
            ExclusionReason::HighCapacity(n) => write!(f, "capacity {}", n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exclusion {
    pub id: ElementId,
    pub reason: ExclusionReason,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can end a charging site analysis run.
///
/// Data-quality problems inside tags are never errors; they are treated
/// as missing values.
#[derive(Debug, PartialEq)]
pub enum SiteError {
    /// Non-2xx HTTP response from the Overpass API.
    HttpError(u16),
    /// The request could not be sent or the response body not read.
    RequestFailed(String),
    /// The response or cache body could not be deserialized.
    ParseError(String),
    /// The cache file could not be read or written.
    CacheError(String),
    /// The OSM output file could not be written.
    OutputError(String),
    /// Invalid configuration value or unreadable configuration file.
    ConfigError(String),
    /// The loaded data contains no charging stations at all.
    NoStations,
}

impl std::fmt::Display for SiteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SiteError::HttpError(code) => write!(f, "HTTP error: {}", code),
            SiteError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            SiteError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            SiteError::CacheError(msg) => write!(f, "Cache error: {}", msg),
            SiteError::OutputError(msg) => write!(f, "Output error: {}", msg),
            SiteError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            SiteError::NoStations => write!(f, "No stations"),
        }
    }
}

impl std::error::Error for SiteError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_ids_with_same_number_but_different_type_are_distinct() {
        assert_ne!(ElementId::node(42), ElementId::way(42));
        assert_eq!(ElementId::way(42).to_string(), "way/42");
    }

    #[test]
    fn test_only_relations_are_composite() {
        assert!(ChargePoint::new(ElementId::relation(1), 0.0, 0.0).is_composite());
        assert!(!ChargePoint::new(ElementId::way(1), 0.0, 0.0).is_composite());
        assert!(!ChargePoint::new(ElementId::node(1), 0.0, 0.0).is_composite());
    }

    #[test]
    fn test_error_display_is_readable() {
        assert_eq!(SiteError::HttpError(504).to_string(), "HTTP error: 504");
        assert_eq!(SiteError::NoStations.to_string(), "No stations");
    }
}
