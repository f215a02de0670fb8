//! OSM XML output.
//!
//! Writes every loaded element back out, with merged charge points replaced
//! by their relabeled version, followed by one new node per synthetic site.
//! Changed and new elements carry `action="modify"` so that an editor such
//! as JOSM shows them as pending edits. `upload="false"` keeps the file from
//! being uploaded as is.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::cluster::SiteAnalysis;
use crate::ingest::overpass::OsmElement;
use crate::model::{ElementType, SiteError, SyntheticSite};

pub const GENERATOR: &str = "charging_analysis";

/// Writes `elements` and the sites of `analysis` to `path`.
pub fn save_osm(path: &Path, elements: &[OsmElement], analysis: &SiteAnalysis) -> Result<(), SiteError> {
    let file = File::create(path)
        .map_err(|e| SiteError::OutputError(format!("cannot create {}: {}", path.display(), e)))?;
    write_osm(BufWriter::new(file), elements, analysis)
}

/// Writes the OSM document to any writer.
pub fn write_osm<W: Write>(
    inner: W,
    elements: &[OsmElement],
    analysis: &SiteAnalysis,
) -> Result<(), SiteError> {
    let mut writer = Writer::new_with_indent(inner, b' ', 2);

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("osm");
    root.push_attribute(("version", "0.6"));
    root.push_attribute(("generator", GENERATOR));
    root.push_attribute(("upload", "false"));
    emit(&mut writer, Event::Start(root))?;

    for element in elements {
        write_element(&mut writer, element, analysis)?;
    }
    for site in &analysis.sites {
        write_site(&mut writer, site)?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("osm")))?;

    let mut inner = writer.into_inner();
    inner
        .flush()
        .map_err(|e| SiteError::OutputError(e.to_string()))
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &OsmElement,
    analysis: &SiteAnalysis,
) -> Result<(), SiteError> {
    let relabeled = analysis.relabeled.get(&element.element_id());
    let tags = relabeled.map(|p| &p.tags).unwrap_or(&element.tags);
    let name = element.element_type.as_str();

    let mut start = BytesStart::new(name);
    start.push_attribute(("id", element.id.to_string().as_str()));
    if relabeled.is_some() {
        start.push_attribute(("action", "modify"));
    }
    if let Some(timestamp) = &element.timestamp {
        start.push_attribute(("timestamp", timestamp.as_str()));
    }
    if let Some(uid) = element.uid {
        start.push_attribute(("uid", uid.to_string().as_str()));
    }
    if let Some(user) = &element.user {
        start.push_attribute(("user", user.as_str()));
    }
    start.push_attribute(("visible", "true"));
    if let Some(version) = element.version {
        start.push_attribute(("version", version.to_string().as_str()));
    }
    if let Some(changeset) = element.changeset {
        start.push_attribute(("changeset", changeset.to_string().as_str()));
    }
    if element.element_type == ElementType::Node {
        if let (Some(lat), Some(lon)) = (element.lat, element.lon) {
            start.push_attribute(("lat", format_coordinate(lat).as_str()));
            start.push_attribute(("lon", format_coordinate(lon).as_str()));
        }
    }

    let nodes = element.nodes.as_deref().unwrap_or_default();
    let members = element.members.as_deref().unwrap_or_default();

    if tags.is_empty() && nodes.is_empty() && members.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for node_ref in nodes {
        let mut nd = BytesStart::new("nd");
        nd.push_attribute(("ref", node_ref.to_string().as_str()));
        emit(writer, Event::Empty(nd))?;
    }
    for member in members {
        let mut m = BytesStart::new("member");
        m.push_attribute(("type", member.member_type.as_str()));
        m.push_attribute(("ref", member.member_ref.to_string().as_str()));
        m.push_attribute(("role", member.role.as_str()));
        emit(writer, Event::Empty(m))?;
    }
    write_tags(writer, tags)?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn write_site<W: Write>(writer: &mut Writer<W>, site: &SyntheticSite) -> Result<(), SiteError> {
    let mut start = BytesStart::new("node");
    start.push_attribute(("id", site.id.to_string().as_str()));
    start.push_attribute(("action", "modify"));
    start.push_attribute(("visible", "true"));
    start.push_attribute(("lat", format_coordinate(site.lat).as_str()));
    start.push_attribute(("lon", format_coordinate(site.lon).as_str()));

    emit(writer, Event::Start(start))?;
    write_tags(writer, &site.tags)?;
    emit(writer, Event::End(BytesEnd::new("node")))
}

fn write_tags<W: Write>(writer: &mut Writer<W>, tags: &BTreeMap<String, String>) -> Result<(), SiteError> {
    for (key, value) in tags {
        let mut tag = BytesStart::new("tag");
        tag.push_attribute(("k", key.as_str()));
        tag.push_attribute(("v", value.as_str()));
        emit(writer, Event::Empty(tag))?;
    }
    Ok(())
}

fn format_coordinate(value: f64) -> String {
    format!("{:.7}", value)
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), SiteError> {
    writer
        .write_event(event)
        .map_err(|e| SiteError::OutputError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterOptions, analyze};
    use crate::ingest::extract::extract_stations;
    use crate::ingest::overpass::parse_response;

    fn render(elements: &[OsmElement], analysis: &SiteAnalysis) -> String {
        let mut buf = Vec::new();
        write_osm(&mut buf, elements, analysis).expect("writing to memory should not fail");
        String::from_utf8(buf).expect("output should be UTF-8")
    }

    #[test]
    fn test_empty_document_has_header_and_root() {
        let xml = render(&[], &SiteAnalysis::default());
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<osm version="0.6" generator="charging_analysis" upload="false">"#));
        assert!(xml.trim_end().ends_with("</osm>"));
    }

    #[test]
    fn test_merged_members_are_relabeled_and_site_is_appended() {
        let response = parse_response(
            r#"{ "elements": [
                { "type": "node", "id": 1, "lat": 60.0, "lon": 10.0, "version": 2,
                  "tags": { "amenity": "charging_station", "name": "Fish & Chips" } },
                { "type": "node", "id": 2, "lat": 60.00001, "lon": 10.0,
                  "tags": { "amenity": "charging_station", "name": "Fish & Chips" } },
                { "type": "node", "id": 3, "lat": 61.0, "lon": 11.0,
                  "tags": { "amenity": "charging_station" } },
                { "type": "way", "id": 7, "nodes": [10, 11],
                  "tags": { "highway": "service" } },
                { "type": "node", "id": 10, "lat": 60.5, "lon": 10.5 }
            ] }"#,
        )
        .unwrap();
        let stations = extract_stations(&response.elements).unwrap().stations;
        let analysis = analyze(&stations, &ClusterOptions::default(), &mut |_| {});
        let xml = render(&response.elements, &analysis);

        // Members: relabeled and marked as modified.
        assert!(xml.contains(r#"<node id="1" action="modify" visible="true" version="2" lat="60.0000000" lon="10.0000000">"#));
        assert!(xml.contains(r#"<tag k="MAN_MADE" v="CHARGE_POINT"/>"#));
        // Singleton: untouched.
        assert!(xml.contains(r#"<node id="3" visible="true" lat="61.0000000" lon="11.0000000">"#));
        assert!(xml.contains(r#"<tag k="amenity" v="charging_station"/>"#));
        // Way keeps its node references, bare node is empty.
        assert!(xml.contains(r#"<nd ref="10"/>"#));
        assert!(xml.contains(r#"<node id="10" visible="true" lat="60.5000000" lon="10.5000000"/>"#));
        // New site with escaped consensus name.
        assert!(xml.contains(r#"<node id="-1001" action="modify" visible="true""#));
        assert!(xml.contains(r#"<tag k="GROUP" v="2"/>"#));
        assert!(xml.contains(r#"<tag k="name" v="Fish &amp; Chips"/>"#));
    }

    #[test]
    fn test_save_osm_writes_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("out.osm");
        save_osm(&path, &[], &SiteAnalysis::default()).expect("save should succeed");
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("<osm "));
    }
}
