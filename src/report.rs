/// Run summaries printed at the end of an analysis.
///
/// Two tables are produced:
///   - the group-size histogram: for every size, the number of groups, the
///     number of charging stations in them and their share of all stations
///   - statistics over single (ungrouped) stations, keyed by one metric
///     selected with `SingleAnalysis`
///
/// The builders are pure; the `print_*` functions only format their output.

use std::collections::BTreeMap;

use crate::cluster::PointIndex;
use crate::config::SingleAnalysis;
use crate::model::{ChargePoint, Group};
use crate::tags::{self, SocketKey};

// ---------------------------------------------------------------------------
// Group-size histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeRow {
    /// Number of charging stations per group.
    pub size: usize,
    /// Number of groups of this size.
    pub groups: usize,
    /// `size * groups`.
    pub points: usize,
    /// Share of all charging stations in groups of this size, in percent.
    pub percent: f64,
}

/// Histogram of group sizes, ascending, sizes without groups omitted.
///
/// `total_stations` is the number of extracted charging stations, including
/// those kept out of grouping.
pub fn size_histogram(groups: &[Group], total_stations: usize) -> Vec<SizeRow> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for group in groups.iter().filter(|g| !g.is_empty()) {
        *counts.entry(group.len()).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(size, count)| SizeRow {
            size,
            groups: count,
            points: size * count,
            percent: percent_of(size * count, total_stations),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Single station statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRow {
    pub value: u32,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SinglePointStats {
    pub mode: SingleAnalysis,
    /// Single stations with a usable metric value.
    pub total: usize,
    /// Ascending by value.
    pub rows: Vec<MetricRow>,
}

/// Metric of one charging station, if it has a positive one.
///
/// - `Capacity`: the numeric `capacity` tag
/// - `Socket`: total sockets across socket types
/// - `Output`: highest `socket:<type>:output` in kW
pub fn single_point_metric(point: &ChargePoint, mode: SingleAnalysis) -> Option<u32> {
    let value = match mode {
        SingleAnalysis::Capacity => tags::capacity(&point.tags)?,
        SingleAnalysis::Socket => point
            .tags
            .iter()
            .filter(|(key, _)| matches!(tags::socket_key(key), Some(SocketKey::Count(_))))
            .filter_map(|(_, value)| tags::leading_count(value))
            .sum::<u32>(),
        SingleAnalysis::Output => point
            .tags
            .iter()
            .filter(|(key, _)| matches!(tags::socket_key(key), Some(SocketKey::Output(_))))
            .filter_map(|(_, value)| tags::first_integer(value))
            .max()?,
    };
    (value > 0).then_some(value)
}

/// Distribution of `mode` over the stations of singleton groups.
///
/// Returns `None` when no single station has a value, so that the caller
/// can skip the section instead of printing an empty table.
pub fn single_point_stats(
    groups: &[Group],
    index: &PointIndex<'_>,
    mode: SingleAnalysis,
) -> Option<SinglePointStats> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();

    for group in groups.iter().filter(|g| g.is_singleton()) {
        let Some(point) = index.get(&group.members[0]) else {
            continue;
        };
        if let Some(value) = single_point_metric(point, mode) {
            *counts.entry(value).or_default() += 1;
        }
    }

    let total: usize = counts.values().sum();
    if total == 0 {
        return None;
    }

    let rows = counts
        .into_iter()
        .map(|(value, count)| MetricRow {
            value,
            count,
            percent: percent_of(count, total),
        })
        .collect();

    Some(SinglePointStats { mode, total, rows })
}

fn percent_of(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

// ---------------------------------------------------------------------------
// Printing
// ---------------------------------------------------------------------------

pub fn print_size_histogram(rows: &[SizeRow]) {
    if rows.is_empty() {
        return;
    }
    println!("\nNumber of groups for each charge point size:");
    for row in rows {
        println!(
            "\t{:6}  {:6}  {:6}  {:4.1}%",
            row.size, row.groups, row.points, row.percent
        );
    }
}

pub fn print_single_point_stats(stats: Option<&SinglePointStats>) {
    let Some(stats) = stats else {
        return;
    };
    println!(
        "\nTotal {} points with {} tag in single groups",
        stats.total, stats.mode
    );
    for row in &stats.rows {
        println!("\t{:6}   {:6}  {:4.1}%", row.value, row.count, row.percent);
    }
}

pub fn print_run_summary(total_stations: usize, charge_points: usize, excluded: usize, sites: usize) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 CHARGING SITE SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("Charging stations:  {}", total_stations);
    println!("Charge points:      {}", charge_points);
    println!("Kept out of groups: {}", excluded);
    println!("New sites:          {}", sites);
    println!("═══════════════════════════════════════════════════════════");
}
