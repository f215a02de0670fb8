/// Short-range geometry on `(lon, lat)` degree coordinates.
///
/// The distance is an equirectangular approximation. It is accurate to well
/// under a meter at the grouping scale (tens of meters) and must not be used
/// for long-range distances.

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Approximate distance in meters between two `(lon, lat)` points.
///
/// Identical coordinates give exactly 0.
pub fn distance(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let (lon1, lat1) = (p1.0.to_radians(), p1.1.to_radians());
    let (lon2, lat2) = (p2.0.to_radians(), p2.1.to_radians());
    let x = (lon2 - lon1) * (0.5 * (lat2 + lat1)).cos();
    let y = lat2 - lat1;
    EARTH_RADIUS_M * (x * x + y * y).sqrt()
}

/// Axis of a `(lon, lat)` coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Lon,
    Lat,
}

impl Axis {
    pub fn of(&self, point: (f64, f64)) -> f64 {
        match self {
            Axis::Lon => point.0,
            Axis::Lat => point.1,
        }
    }

    pub fn other(&self) -> Axis {
        match self {
            Axis::Lon => Axis::Lat,
            Axis::Lat => Axis::Lon,
        }
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Smallest box containing every point. `None` for no points.
    pub fn around<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let (lon, lat) = iter.next()?;
        let mut bbox = BoundingBox {
            min_lon: lon,
            min_lat: lat,
            max_lon: lon,
            max_lat: lat,
        };
        for (lon, lat) in iter {
            bbox.min_lon = bbox.min_lon.min(lon);
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lon = bbox.max_lon.max(lon);
            bbox.max_lat = bbox.max_lat.max(lat);
        }
        Some(bbox)
    }

    /// Physical length in meters of the box edge along `axis`, measured
    /// from the minimum corner.
    pub fn span_m(&self, axis: Axis) -> f64 {
        let corner = (self.min_lon, self.min_lat);
        match axis {
            Axis::Lon => distance(corner, (self.max_lon, self.min_lat)),
            Axis::Lat => distance(corner, (self.min_lon, self.max_lat)),
        }
    }

    /// Axis with the strictly longer physical span; longitude on ties.
    ///
    /// Compares meters rather than degrees because longitude degrees
    /// shrink toward the poles.
    pub fn longer_axis(&self) -> Axis {
        if self.span_m(Axis::Lat) > self.span_m(Axis::Lon) {
            Axis::Lat
        } else {
            Axis::Lon
        }
    }

    /// Midpoint of the coordinate range along `axis`.
    pub fn center(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Lon => 0.5 * (self.min_lon + self.max_lon),
            Axis::Lat => 0.5 * (self.min_lat + self.max_lat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points_are_zero_meters_apart() {
        assert_eq!(distance((10.75, 59.91), (10.75, 59.91)), 0.0);
    }

    #[test]
    fn test_small_latitude_step_at_equator() {
        // 0.00005 degrees of latitude is about 5.56 m.
        let d = distance((0.0, 0.0), (0.0, 0.00005));
        assert!((d - 5.56).abs() < 0.01, "expected ~5.56 m, got {}", d);
    }

    #[test]
    fn test_longitude_step_shrinks_with_latitude() {
        let at_equator = distance((0.0, 0.0), (0.001, 0.0));
        let at_sixty = distance((0.0, 60.0), (0.001, 60.0));
        assert!(
            (at_sixty - 0.5 * at_equator).abs() < 0.01,
            "one degree of longitude at 60N should be half of the equator, got {} vs {}",
            at_sixty,
            at_equator
        );
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = (10.7522, 59.9139);
        let b = (10.7530, 59.9141);
        assert!((distance(a, b) - distance(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_bounding_box_of_nothing_is_none() {
        assert!(BoundingBox::around(Vec::<(f64, f64)>::new()).is_none());
    }

    #[test]
    fn test_longer_axis_uses_meters_not_degrees() {
        // 2 degrees of longitude at 70N (~76 km) is shorter than
        // 1 degree of latitude (~111 km).
        let bbox = BoundingBox::around(vec![(10.0, 70.0), (12.0, 71.0)]).unwrap();
        assert_eq!(bbox.longer_axis(), Axis::Lat);

        let bbox = BoundingBox::around(vec![(10.0, 0.0), (12.0, 1.0)]).unwrap();
        assert_eq!(bbox.longer_axis(), Axis::Lon);
    }

    #[test]
    fn test_square_box_at_equator_splits_on_longitude() {
        let bbox = BoundingBox::around(vec![(0.0, 0.0), (1.0, 1.0)]).unwrap();
        assert_eq!(bbox.longer_axis(), Axis::Lon);
        assert_eq!(bbox.center(Axis::Lon), 0.5);
    }
}
