//! Charging site analysis for OpenStreetMap.
//!
//! Charge points that are mapped as separate `amenity=charging_station`
//! elements but stand at the same physical site are grouped, and each group
//! gets one new charging station node with merged tags. The result is an OSM
//! file for review in an editor.
//!
//! Pipeline: `ingest` → `cluster` → `output` and `report`.

pub mod cluster;
pub mod config;
pub mod geo;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod output;
pub mod report;
pub mod tags;
