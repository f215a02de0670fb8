/// Integration tests against a live Overpass API instance
///
/// Tests verify:
/// 1. The Overpass endpoint answers a bounded charging station query
/// 2. The response extracts into charging stations
/// 3. Real data runs through grouping and the OSM writer
///
/// Prerequisites:
/// - Internet access to overpass-api.de (or CHARGING_SITES_OVERPASS_URL)
///
/// Run with: cargo test --test overpass_integration -- --ignored

use charging_sites::cluster::{self, ClusterOptions};
use charging_sites::config::Config;
use charging_sites::ingest::{extract, overpass};
use charging_sites::output;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Central Oslo, dense enough to contain multi-point sites.
const OSLO_BBOX: &str = "59.89,10.69,59.95,10.80";

fn fetch_oslo() -> Vec<overpass::OsmElement> {
    let mut config = Config::default();
    config.apply_env();

    let client = overpass::build_client(120).expect("client should build");
    let query = format!(
        "[out:json][timeout:120];\
         (nwr[\"amenity\"=\"charging_station\"]({bbox});\
          nwr[\"man_made\"=\"charge_point\"]({bbox}););\
         out center meta;",
        bbox = OSLO_BBOX
    );

    overpass::fetch_elements(&client, &config.overpass_url, &query)
        .expect("Overpass request should succeed")
        .elements
}

// ---------------------------------------------------------------------------
// Live Tests
// ---------------------------------------------------------------------------

#[test]
#[ignore] // Don't run in CI - depends on external API
fn test_oslo_stations_extract() {
    let elements = fetch_oslo();
    let extraction = extract::extract_stations(&elements).expect("Oslo has charging stations");

    assert!(
        extraction.stations.len() > 10,
        "expected more than 10 charging stations in central Oslo, got {}",
        extraction.stations.len()
    );
    for station in &extraction.stations {
        assert!((59.8..60.0).contains(&station.lat), "{} outside bbox", station.id);
        assert!((10.6..10.9).contains(&station.lon), "{} outside bbox", station.id);
    }
}

#[test]
#[ignore] // Don't run in CI - depends on external API
fn test_oslo_stations_group_and_write() {
    let elements = fetch_oslo();
    let stations = extract::extract_stations(&elements).unwrap().stations;

    let analysis = cluster::analyze(&stations, &ClusterOptions::default(), &mut |_| {});
    let grouping = &analysis.grouping;

    let placed: usize = grouping.groups.iter().map(|g| g.len()).sum();
    assert_eq!(
        placed + grouping.excluded.len(),
        stations.len(),
        "every station is grouped or excluded"
    );
    assert_eq!(analysis.sites.len(), grouping.groups.len() - grouping.singleton_count());

    let mut buf = Vec::new();
    output::write_osm(&mut buf, &elements, &analysis).expect("OSM output should be written");
    let xml = String::from_utf8(buf).unwrap();
    assert!(xml.contains("<osm version=\"0.6\""));
}
