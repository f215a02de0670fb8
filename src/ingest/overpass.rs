/// Overpass API Client
///
/// Retrieves every OSM charging station and charge point in the world,
/// together with the nodes, ways and relations they belong to or consist
/// of, in Overpass JSON format (`out center meta`).
///
/// API Documentation: https://wiki.openstreetmap.org/wiki/Overpass_API

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::model::{ElementId, ElementType, SiteError};

/// Extra time allowed on top of the server side query timeout.
const CLIENT_TIMEOUT_MARGIN_SECS: u64 = 60;

// ============================================================================
// Overpass Response Structures
// ============================================================================

/// Top level Overpass JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverpassResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    pub elements: Vec<OsmElement>,
}

/// Center of a way or relation, as returned by `out center`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

/// Relation member reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "type")]
    pub member_type: ElementType,
    #[serde(rename = "ref")]
    pub member_ref: i64,
    #[serde(default)]
    pub role: String,
}

/// Single OSM element with its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsmElement {
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Center>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<Member>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changeset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u64>,
}

impl OsmElement {
    pub fn element_id(&self) -> ElementId {
        ElementId {
            element_type: self.element_type,
            id: self.id,
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Representative `(lon, lat)`: the center for ways and relations,
    /// the node position otherwise.
    pub fn point(&self) -> Option<(f64, f64)> {
        if let Some(center) = self.center {
            return Some((center.lon, center.lat));
        }
        match (self.lon, self.lat) {
            (Some(lon), Some(lat)) => Some((lon, lat)),
            _ => None,
        }
    }
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Builds the Overpass QL query for all charging stations and charge points
/// plus their parents and children.
pub fn build_query(timeout_secs: u64) -> String {
    format!(
        "[out:json][timeout:{}];\
         (\
         nwr[\"amenity\"=\"charging_station\"];\
         nwr[\"man_made\"=\"charge_point\"];\
         )->.a;\
         (.a; .a>; .a<;);\
         out center meta;",
        timeout_secs
    )
}

/// Blocking HTTP client with a timeout matching the query timeout.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, SiteError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs + CLIENT_TIMEOUT_MARGIN_SECS))
        .build()
        .map_err(|e| SiteError::RequestFailed(e.to_string()))
}

/// Run a query against an Overpass endpoint
///
/// # Parameters
/// - `client`: HTTP client
/// - `endpoint`: interpreter URL, e.g. `https://overpass-api.de/api/interpreter`
/// - `query`: Overpass QL with `[out:json]`
pub fn fetch_elements(
    client: &reqwest::blocking::Client,
    endpoint: &str,
    query: &str,
) -> Result<OverpassResponse, SiteError> {
    let response = client
        .get(endpoint)
        .query(&[("data", query)])
        .header("Accept", "application/json")
        .send()
        .map_err(|e| SiteError::RequestFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(SiteError::HttpError(response.status().as_u16()));
    }

    let body = response
        .text()
        .map_err(|e| SiteError::RequestFailed(e.to_string()))?;

    parse_response(&body)
}

/// Parse an Overpass JSON body
pub fn parse_response(body: &str) -> Result<OverpassResponse, SiteError> {
    serde_json::from_str(body).map_err(|e| SiteError::ParseError(e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
