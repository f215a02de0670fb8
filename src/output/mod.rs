/// Publication of the analysis result.
///
/// - `osm`: OSM XML file for review in an OSM editor.

pub mod osm;

pub use osm::{GENERATOR, save_osm, write_osm};
