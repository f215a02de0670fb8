/// Identification of charging sites.
///
/// Submodules:
/// - `partition`: cuts the global point set into tractable boxes.
/// - `grouping`: single-linkage grouping within one box.
/// - `aggregate`: one synthetic charging station per group.
///
/// `identify_groups` and `build_sites` chain them; `analyze` runs both.

pub mod aggregate;
pub mod grouping;
pub mod partition;

use std::collections::HashMap;

use crate::config::Config;
use crate::logging::{self, Stage};
use crate::model::{ChargePoint, ElementId, Exclusion, Group, SyntheticSite};

pub use aggregate::{PointIndex, SiteIdAllocator};
pub use grouping::ExclusionPolicy;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Clustering parameters, normally taken from `Config`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOptions {
    pub max_sample: usize,
    pub max_gap: f64,
    pub min_common: f64,
    pub policy: ExclusionPolicy,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ClusterOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_sample: config.max_sample,
            max_gap: config.max_gap,
            min_common: config.min_common,
            policy: ExclusionPolicy {
                max_member_capacity: config.max_member_capacity,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Groups of all partitions together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupingResult {
    pub groups: Vec<Group>,
    /// Points kept out of every group by the exclusion policy.
    pub excluded: Vec<Exclusion>,
}

impl GroupingResult {
    pub fn singleton_count(&self) -> usize {
        self.groups.iter().filter(|g| g.is_singleton()).count()
    }

    /// Number of points in groups of two or more.
    pub fn grouped_point_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| !g.is_singleton())
            .map(Group::len)
            .sum()
    }
}

/// Full outcome of a clustering run.
#[derive(Debug, Clone, Default)]
pub struct SiteAnalysis {
    pub grouping: GroupingResult,
    /// One new charging station per group of two or more.
    pub sites: Vec<SyntheticSite>,
    /// New versions of the charge points that were merged into a site.
    pub relabeled: HashMap<ElementId, ChargePoint>,
}

impl SiteAnalysis {
    /// Version of `point` to publish: relabeled if merged, else unchanged.
    pub fn resolve<'a>(&'a self, point: &'a ChargePoint) -> &'a ChargePoint {
        self.relabeled.get(&point.id).unwrap_or(point)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Partitions `points` and groups every partition.
///
/// `progress` is called after each partition with the number of points
/// still waiting to be grouped.
pub fn identify_groups(
    points: &[ChargePoint],
    options: &ClusterOptions,
    progress: &mut dyn FnMut(usize),
) -> GroupingResult {
    let partitions = partition::partition(points.iter().collect(), options.max_sample);
    logging::debug(
        Stage::Group,
        None,
        &format!("{} points in {} partitions", points.len(), partitions.len()),
    );

    let mut result = GroupingResult::default();
    let mut remaining = points.len();

    for part in &partitions {
        let found = grouping::group_partition(part, options.max_gap, &options.policy);
        result.groups.extend(found.groups);
        result.excluded.extend(found.excluded);

        remaining -= part.len();
        progress(remaining);
    }

    logging::log_exclusion_summary(points.len(), result.excluded.len());
    result
}

/// Aggregates every group of two or more into a synthetic site and
/// relabels its members. Singleton groups are left alone.
pub fn build_sites(
    points: &[ChargePoint],
    groups: &[Group],
    min_common: f64,
) -> (Vec<SyntheticSite>, HashMap<ElementId, ChargePoint>) {
    let index: PointIndex = points.iter().map(|p| (p.id, p)).collect();
    let mut ids = SiteIdAllocator::default();
    let mut sites = Vec::new();
    let mut relabeled = HashMap::new();

    for group in groups.iter().filter(|g| g.len() > 1) {
        let site = aggregate::aggregate(group, &index, ids.next_id(), min_common);
        logging::debug(
            Stage::Aggregate,
            Some(site.id.to_string().as_str()),
            &format!("site of {} charge points", group.len()),
        );
        sites.push(site);

        for id in &group.members {
            if let Some(point) = index.get(id) {
                relabeled.insert(*id, aggregate::relabel_member(point));
            }
        }
    }

    (sites, relabeled)
}

/// Runs grouping and aggregation.
pub fn analyze(
    points: &[ChargePoint],
    options: &ClusterOptions,
    progress: &mut dyn FnMut(usize),
) -> SiteAnalysis {
    let grouping = identify_groups(points, options, progress);
    let (sites, relabeled) = build_sites(points, &grouping.groups, options.min_common);
    SiteAnalysis {
        grouping,
        sites,
        relabeled,
    }
}
