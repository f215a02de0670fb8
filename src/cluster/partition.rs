//! Spatial partitioning of charge points.
//!
//! Pairwise grouping is quadratic, so the global point set is first cut into
//! boxes of at most `max_size` points. Each cut halves the current bounding
//! box across its physically longer side. Points close to a cut but on
//! different sides are never grouped together; with a 20 m grouping distance
//! and boxes of thousands of points this loss is negligible.

use crate::geo::{Axis, BoundingBox};
use crate::logging::{self, Stage};
use crate::model::ChargePoint;

/// Splits `points` into partitions of at most `max_size` points.
///
/// Every input point ends up in exactly one partition. An empty input gives
/// no partitions. The only partitions allowed to exceed `max_size` are sets
/// that cannot be cut at all, i.e. more than `max_size` points sharing one
/// coordinate.
pub fn partition<'a>(points: Vec<&'a ChargePoint>, max_size: usize) -> Vec<Vec<&'a ChargePoint>> {
    let mut partitions = Vec::new();
    split_into(points, max_size.max(1), 0, &mut partitions);
    partitions
}

fn split_into<'a>(
    points: Vec<&'a ChargePoint>,
    max_size: usize,
    level: usize,
    out: &mut Vec<Vec<&'a ChargePoint>>,
) {
    if points.is_empty() {
        return;
    }
    if points.len() <= max_size {
        out.push(points);
        return;
    }

    let Some(bbox) = BoundingBox::around(points.iter().map(|p| p.point())) else {
        return;
    };

    let axis = bbox.longer_axis();
    let halves = split_at_center(&points, &bbox, axis)
        .or_else(|| split_at_center(&points, &bbox, axis.other()));

    match halves {
        Some((lower, upper)) => {
            split_into(lower, max_size, level + 1, out);
            split_into(upper, max_size, level + 1, out);
        }
        None => {
            logging::warn(
                Stage::Group,
                None,
                &format!(
                    "{} co-located points cannot be partitioned further (level {})",
                    points.len(),
                    level
                ),
            );
            out.push(points);
        }
    }
}

/// Cuts at the midpoint of `axis`: `< center` and `>= center`.
/// Returns `None` when one side would be empty.
fn split_at_center<'a>(
    points: &[&'a ChargePoint],
    bbox: &BoundingBox,
    axis: Axis,
) -> Option<(Vec<&'a ChargePoint>, Vec<&'a ChargePoint>)> {
    let center = bbox.center(axis);
    let (lower, upper): (Vec<&ChargePoint>, Vec<&ChargePoint>) =
        points.iter().copied().partition(|p| axis.of(p.point()) < center);

    if lower.is_empty() || upper.is_empty() {
        None
    } else {
        Some((lower, upper))
    }
}
