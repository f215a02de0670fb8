//! Grouping of charge points into sites.
//!
//! Within one partition, points are merged into connected components: two
//! points belong to the same site if a chain of points links them with every
//! step shorter than `max_gap` meters (single linkage). The components are
//! built incrementally in one pass over the points instead of from a full
//! distance matrix.

use crate::geo::distance;
use crate::model::{ChargePoint, Exclusion, ExclusionReason, Group};
use crate::tags;

// ---------------------------------------------------------------------------
// Exclusion policy
// ---------------------------------------------------------------------------

/// Decides which points are whole sites already and must not be merged
/// with their neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionPolicy {
    /// A numeric `capacity` above this marks a multi-charger site.
    pub max_member_capacity: u32,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self { max_member_capacity: 2 }
    }
}

impl ExclusionPolicy {
    /// Returns why `point` is kept out of grouping, or `None` if eligible.
    ///
    /// Malformed capacities do not exclude a point.
    pub fn exclusion_reason(&self, point: &ChargePoint) -> Option<ExclusionReason> {
        if point.is_composite() {
            return Some(ExclusionReason::CompositeElement);
        }
        match tags::capacity(&point.tags) {
            Some(capacity) if capacity > self.max_member_capacity => {
                Some(ExclusionReason::HighCapacity(capacity))
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Groups and exclusions of one partition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionGroups {
    pub groups: Vec<Group>,
    pub excluded: Vec<Exclusion>,
}

/// Groups the eligible points of one partition.
///
/// Points are visited in input order. A point joins the first existing
/// group that has a member closer than `max_gap`; every other group it is
/// also close to is merged into that one. A point close to no group starts
/// a new one. The resulting components do not depend on the visiting order,
/// only the order of groups and members does.
pub fn group_partition(
    points: &[&ChargePoint],
    max_gap: f64,
    policy: &ExclusionPolicy,
) -> PartitionGroups {
    let mut groups: Vec<Vec<&ChargePoint>> = Vec::new();
    let mut excluded = Vec::new();

    for &point in points {
        if let Some(reason) = policy.exclusion_reason(point) {
            excluded.push(Exclusion { id: point.id, reason });
            continue;
        }

        let mut found: Option<usize> = None;
        let mut i = 0;
        while i < groups.len() {
            let close = groups[i]
                .iter()
                .any(|member| distance(point.point(), member.point()) < max_gap);

            if !close {
                i += 1;
                continue;
            }

            match found {
                None => {
                    groups[i].push(point);
                    found = Some(i);
                    i += 1;
                }
                Some(target) => {
                    // target < i, so removing i keeps target valid
                    let merged = groups.remove(i);
                    groups[target].extend(merged);
                }
            }
        }

        if found.is_none() {
            groups.push(vec![point]);
        }
    }

    PartitionGroups {
        groups: groups
            .into_iter()
            .map(|members| Group {
                members: members.into_iter().map(|p| p.id).collect(),
            })
            .collect(),
        excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementId;
    use std::collections::BTreeSet;

    fn node(id: i64, lon: f64, lat: f64) -> ChargePoint {
        ChargePoint::new(ElementId::node(id), lon, lat)
    }

    fn as_sets(groups: &[Group]) -> BTreeSet<BTreeSet<i64>> {
        groups
            .iter()
            .map(|g| g.members.iter().map(|m| m.id).collect())
            .collect()
    }

    fn sets(raw: &[&[i64]]) -> BTreeSet<BTreeSet<i64>> {
        raw.iter().map(|g| g.iter().copied().collect()).collect()
    }

    #[test]
    fn test_close_pair_grouped_and_far_point_alone() {
        // 1 and 2 are ~5.6 m apart, 3 is ~28 m from 2.
        let points = [
            node(1, 0.0, 0.0),
            node(2, 0.0, 0.00005),
            node(3, 0.0, 0.0003),
        ];
        let refs: Vec<&ChargePoint> = points.iter().collect();
        let result = group_partition(&refs, 20.0, &ExclusionPolicy::default());

        assert_eq!(as_sets(&result.groups), sets(&[&[1, 2], &[3]]));
        assert!(result.excluded.is_empty());
    }

    #[test]
    fn test_high_capacity_point_is_excluded_even_when_co_located() {
        let points = [
            node(1, 10.0, 60.0),
            node(2, 10.0, 60.0).with_tag("capacity", "5"),
            node(3, 10.0, 60.00001),
        ];
        let refs: Vec<&ChargePoint> = points.iter().collect();
        let result = group_partition(&refs, 20.0, &ExclusionPolicy::default());

        assert_eq!(as_sets(&result.groups), sets(&[&[1, 3]]));
        assert_eq!(
            result.excluded,
            vec![Exclusion {
                id: ElementId::node(2),
                reason: ExclusionReason::HighCapacity(5),
            }]
        );
    }

    #[test]
    fn test_relations_are_excluded() {
        let points = [
            node(1, 10.0, 60.0),
            ChargePoint::new(ElementId::relation(1), 10.0, 60.0),
        ];
        let refs: Vec<&ChargePoint> = points.iter().collect();
        let result = group_partition(&refs, 20.0, &ExclusionPolicy::default());

        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.excluded[0].reason, ExclusionReason::CompositeElement);
    }

    #[test]
    fn test_capacity_at_limit_or_malformed_stays_eligible() {
        let policy = ExclusionPolicy::default();
        assert_eq!(policy.exclusion_reason(&node(1, 0.0, 0.0).with_tag("capacity", "2")), None);
        assert_eq!(policy.exclusion_reason(&node(1, 0.0, 0.0).with_tag("capacity", "6 ")), None);
        assert_eq!(policy.exclusion_reason(&node(1, 0.0, 0.0).with_tag("capacity", "many")), None);
    }

    #[test]
    fn test_point_within_gap_of_second_member_joins_group() {
        // 3 is ~22 m from 1 but ~17 m from 2, so all three form one site.
        let points = [
            node(1, 0.0, 0.0),
            node(2, 0.0, 0.00005),
            node(3, 0.0, 0.0002),
        ];
        let refs: Vec<&ChargePoint> = points.iter().collect();
        let result = group_partition(&refs, 20.0, &ExclusionPolicy::default());

        assert_eq!(as_sets(&result.groups), sets(&[&[1, 2, 3]]));
    }

    #[test]
    fn test_point_bridging_two_groups_merges_them() {
        // 1 and 3 are ~33 m apart and start separate groups; 2 sits in the
        // middle and links them.
        let points = [
            node(1, 0.0, 0.0),
            node(3, 0.0, 0.0003),
            node(2, 0.0, 0.00015),
        ];
        let refs: Vec<&ChargePoint> = points.iter().collect();
        let result = group_partition(&refs, 20.0, &ExclusionPolicy::default());

        assert_eq!(as_sets(&result.groups), sets(&[&[1, 2, 3]]));
    }

    #[test]
    fn test_chain_is_grouped_transitively() {
        // Every step is ~11 m, end to end ~44 m.
        let points: Vec<ChargePoint> = (0..5).map(|i| node(i, 0.0, i as f64 * 0.0001)).collect();
        let refs: Vec<&ChargePoint> = points.iter().collect();
        let result = group_partition(&refs, 20.0, &ExclusionPolicy::default());

        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].len(), 5);
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let points: Vec<ChargePoint> = (0..40)
            .map(|i| node(i, (i % 7) as f64 * 0.0001, (i % 5) as f64 * 0.00013))
            .collect();
        let refs: Vec<&ChargePoint> = points.iter().collect();
        let first = group_partition(&refs, 15.0, &ExclusionPolicy::default());
        let second = group_partition(&refs, 15.0, &ExclusionPolicy::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_larger_gap_never_splits_groups() {
        let points: Vec<ChargePoint> = (0..60)
            .map(|i| {
                let lon = ((i * 37) % 23) as f64 * 0.00007;
                let lat = ((i * 11) % 19) as f64 * 0.00009;
                node(i, lon, lat)
            })
            .collect();
        let refs: Vec<&ChargePoint> = points.iter().collect();
        let policy = ExclusionPolicy::default();

        let mut previous: Option<PartitionGroups> = None;
        for gap in [1.0, 5.0, 10.0, 20.0, 40.0, 80.0] {
            let current = group_partition(&refs, gap, &policy);
            if let Some(prev) = &previous {
                assert!(
                    current.groups.len() <= prev.groups.len(),
                    "gap {} produced more groups than a smaller gap",
                    gap
                );
                // Every smaller-gap group must sit inside one larger-gap group.
                for small in &prev.groups {
                    let containing = current
                        .groups
                        .iter()
                        .find(|g| g.members.contains(&small.members[0]))
                        .expect("every point is grouped");
                    assert!(small.members.iter().all(|m| containing.members.contains(m)));
                }
            }
            previous = Some(current);
        }
    }

    #[test]
    fn test_empty_partition_gives_no_groups() {
        let result = group_partition(&[], 20.0, &ExclusionPolicy::default());
        assert!(result.groups.is_empty());
        assert!(result.excluded.is_empty());
    }
}
