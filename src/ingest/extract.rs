/// Selection of charging stations from raw OSM elements.
///
/// Every element tagged `amenity=charging_station` becomes a `ChargePoint`
/// at its node position or, for ways and relations, at its center.
/// Elements tagged `man_made=charge_point` are only counted.

use crate::ingest::overpass::OsmElement;
use crate::logging::{self, Stage};
use crate::model::{AMENITY_CHARGING_STATION, ChargePoint, SiteError, TAG_AMENITY};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub stations: Vec<ChargePoint>,
    /// Number of `man_made=charge_point` elements.
    pub charge_point_count: usize,
    /// Charging stations without any usable coordinate.
    pub skipped: usize,
}

/// Collects the charging stations of `elements`.
///
/// Returns `SiteError::NoStations` when there are none, so that an empty
/// or failed download ends the run instead of producing an empty result.
pub fn extract_stations(elements: &[OsmElement]) -> Result<Extraction, SiteError> {
    let mut extraction = Extraction::default();

    for element in elements {
        if element.tag(TAG_AMENITY) == Some(AMENITY_CHARGING_STATION) {
            match element.point() {
                Some((lon, lat)) => extraction.stations.push(ChargePoint {
                    id: element.element_id(),
                    lon,
                    lat,
                    tags: element.tags.clone(),
                    modified: false,
                }),
                None => {
                    logging::warn(
                        Stage::Extract,
                        Some(element.element_id().to_string().as_str()),
                        "charging station without coordinates skipped",
                    );
                    extraction.skipped += 1;
                }
            }
        }

        if element.tag("man_made") == Some("charge_point") {
            extraction.charge_point_count += 1;
        }
    }

    if extraction.stations.is_empty() {
        return Err(SiteError::NoStations);
    }

    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::overpass::parse_response;
    use crate::model::ElementId;

    #[test]
    fn test_stations_are_extracted_with_centers_and_charge_points_counted() {
        let response = parse_response(
            r#"{ "elements": [
                { "type": "node", "id": 1, "lat": 60.0, "lon": 10.0,
                  "tags": { "amenity": "charging_station", "name": "A" } },
                { "type": "way", "id": 1, "center": { "lat": 61.0, "lon": 11.0 },
                  "tags": { "amenity": "charging_station" } },
                { "type": "node", "id": 2, "lat": 60.0, "lon": 10.0,
                  "tags": { "man_made": "charge_point" } },
                { "type": "node", "id": 3, "lat": 60.0, "lon": 10.0 }
            ] }"#,
        )
        .unwrap();

        let extraction = extract_stations(&response.elements).expect("two stations");
        assert_eq!(extraction.stations.len(), 2);
        assert_eq!(extraction.charge_point_count, 1);
        assert_eq!(extraction.skipped, 0);

        assert_eq!(extraction.stations[0].id, ElementId::node(1));
        assert_eq!(extraction.stations[0].tag("name"), Some("A"));
        assert_eq!(extraction.stations[1].id, ElementId::way(1));
        assert_eq!(extraction.stations[1].point(), (11.0, 61.0));
    }

    #[test]
    fn test_station_without_coordinates_is_skipped() {
        let response = parse_response(
            r#"{ "elements": [
                { "type": "node", "id": 1, "lat": 60.0, "lon": 10.0,
                  "tags": { "amenity": "charging_station" } },
                { "type": "way", "id": 9, "tags": { "amenity": "charging_station" } }
            ] }"#,
        )
        .unwrap();

        let extraction = extract_stations(&response.elements).unwrap();
        assert_eq!(extraction.stations.len(), 1);
        assert_eq!(extraction.skipped, 1);
    }

    #[test]
    fn test_no_stations_is_an_error() {
        let response = parse_response(
            r#"{ "elements": [
                { "type": "node", "id": 2, "lat": 60.0, "lon": 10.0,
                  "tags": { "man_made": "charge_point" } }
            ] }"#,
        )
        .unwrap();
        assert_eq!(extract_stations(&response.elements), Err(SiteError::NoStations));
        assert_eq!(extract_stations(&[]), Err(SiteError::NoStations));
    }
}
