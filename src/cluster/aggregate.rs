//! Aggregation of a group into one synthetic charging station.
//!
//! The synthetic station is placed at the centroid of the group and carries
//! tags derived from its members:
//!
//! - `GROUP`: number of members
//! - `capacity`: sum of member capacities, only if every member has one
//! - `socket:<type>`: summed socket counts, implausible counts dropped
//! - `socket:<type>:output`: strongest output of that type, in kW
//! - `name`, `brand`, `operator`: clear majority value, if there is one
//!
//! Members are not modified; `relabel_member` returns the new version of a
//! member that the output should use instead.

use std::collections::{BTreeMap, HashMap};

use crate::model::{
    AMENITY_CHARGING_STATION, ChargePoint, ElementId, Group, MERGED_MARKER_VALUE, SyntheticSite,
    TAG_AMENITY, TAG_BRAND, TAG_CAPACITY, TAG_GROUP, TAG_MERGED_MARKER, TAG_NAME, TAG_OPERATOR,
};
use crate::tags::{self, SocketKey};

/// Socket counts of this value or more are typing errors, not sockets.
pub const MAX_PLAUSIBLE_SOCKET_COUNT: u32 = 11;

/// Lookup from element identity to point, built once per run.
pub type PointIndex<'a> = HashMap<ElementId, &'a ChargePoint>;

// ---------------------------------------------------------------------------
// Site identifiers
// ---------------------------------------------------------------------------

/// Hands out negative identifiers for new sites: -1001, -1002, ...
#[derive(Debug, Clone)]
pub struct SiteIdAllocator {
    last: i64,
}

impl Default for SiteIdAllocator {
    fn default() -> Self {
        Self { last: -1000 }
    }
}

impl SiteIdAllocator {
    pub fn next_id(&mut self) -> i64 {
        self.last -= 1;
        self.last
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SocketSummary {
    count: u32,
    output_kw: u32,
}

/// Builds the synthetic site for `group`. Members missing from `index`
/// are ignored.
pub fn aggregate(group: &Group, index: &PointIndex<'_>, site_id: i64, min_common: f64) -> SyntheticSite {
    let members: Vec<&ChargePoint> = group
        .members
        .iter()
        .filter_map(|id| index.get(id).copied())
        .collect();
    aggregate_members(&members, site_id, min_common)
}

/// Builds the synthetic site for an already resolved list of members.
pub fn aggregate_members(members: &[&ChargePoint], site_id: i64, min_common: f64) -> SyntheticSite {
    let n = members.len().max(1) as f64;
    let lon = members.iter().map(|p| p.lon).sum::<f64>() / n;
    let lat = members.iter().map(|p| p.lat).sum::<f64>() / n;

    let mut site_tags = BTreeMap::new();
    site_tags.insert(TAG_AMENITY.to_string(), AMENITY_CHARGING_STATION.to_string());
    site_tags.insert(TAG_GROUP.to_string(), members.len().to_string());

    if let Some(capacity) = total_capacity(members) {
        if capacity > 0 {
            site_tags.insert(TAG_CAPACITY.to_string(), capacity.to_string());
        }
    }

    for (socket_type, summary) in socket_summaries(members) {
        if summary.count > 0 {
            site_tags.insert(format!("socket:{}", socket_type), summary.count.to_string());
        }
        if summary.output_kw > 0 {
            site_tags.insert(
                format!("socket:{}:output", socket_type),
                format!("{} kW", summary.output_kw),
            );
        }
    }

    for key in [TAG_NAME, TAG_OPERATOR, TAG_BRAND] {
        let values: Vec<&str> = members.iter().filter_map(|p| p.tag(key)).collect();
        if let Some(value) = common_value(&values, min_common) {
            site_tags.insert(key.to_string(), value.to_string());
        }
    }

    SyntheticSite {
        id: site_id,
        lon,
        lat,
        tags: site_tags,
    }
}

/// Sum of member capacities, or `None` as soon as one member has no
/// numeric capacity. A partial sum would under-report the site.
pub fn total_capacity(members: &[&ChargePoint]) -> Option<u32> {
    members
        .iter()
        .map(|p| tags::capacity(&p.tags))
        .try_fold(0u32, |sum, capacity| capacity.map(|c| sum.saturating_add(c)))
}

fn socket_summaries(members: &[&ChargePoint]) -> BTreeMap<String, SocketSummary> {
    let mut sockets: BTreeMap<String, SocketSummary> = BTreeMap::new();

    for member in members {
        for (key, value) in &member.tags {
            match tags::socket_key(key) {
                Some(SocketKey::Count(socket_type)) => {
                    if let Some(count) = tags::leading_count(value) {
                        if count < MAX_PLAUSIBLE_SOCKET_COUNT {
                            let entry = sockets.entry(socket_type.to_string()).or_default();
                            entry.count += count;
                        }
                    }
                }
                Some(SocketKey::Output(socket_type)) => {
                    if let Some(kw) = tags::first_integer(value) {
                        let entry = sockets.entry(socket_type.to_string()).or_default();
                        entry.output_kw = entry.output_kw.max(kw);
                    }
                }
                None => {}
            }
        }
    }

    sockets
}

/// Most frequent value, accepted only if it makes up more than
/// `min_common` of all values and no other value is equally frequent.
pub fn common_value<'a>(values: &[&'a str], min_common: f64) -> Option<&'a str> {
    if values.is_empty() {
        return None;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(*value).or_insert(0) += 1;
    }

    let top = counts.values().copied().max()?;
    let mut leaders = counts.iter().filter(|(_, count)| **count == top);
    let (winner, _) = leaders.next()?;
    if leaders.next().is_some() {
        return None;
    }

    if top as f64 > values.len() as f64 * min_common {
        Some(*winner)
    } else {
        None
    }
}

/// New version of a member charge point: the charging station feature tag
/// is replaced by the merge marker.
pub fn relabel_member(point: &ChargePoint) -> ChargePoint {
    let mut relabeled = point.clone();
    relabeled.tags.remove(TAG_AMENITY);
    relabeled
        .tags
        .insert(TAG_MERGED_MARKER.to_string(), MERGED_MARKER_VALUE.to_string());
    relabeled.modified = true;
    relabeled
}
