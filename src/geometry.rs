pub type Point = (f64, f64);

/// A closed path. The last point implicitly connects back to the first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon(pub Vec<Point>);

/// An open path, drawn as a thin stroke.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline(pub Vec<Point>);

impl Polygon {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// A polygon needs at least three finite points to enclose any area.
    pub fn is_renderable(&self) -> bool {
        self.0.len() >= 3 && self.is_finite()
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|&(x, y)| x.is_finite() && y.is_finite())
    }

    /// Iterates over `(current, next)` vertex pairs, wrapping around at the end.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.0.len();
        (0..n).map(move |i| (self.0[i], self.0[(i + 1) % n]))
    }

    pub fn centroid(&self) -> Option<Point> {
        if self.0.is_empty() {
            return None;
        }
        let n = self.0.len() as f64;
        let (sx, sy) = self
            .0
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
        Some((sx / n, sy / n))
    }
}

impl Polyline {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_edges_wrap() {
        let p = Polygon(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let edges: Vec<_> = p.edges().collect();
        assert_eq!(
            edges,
            vec![
                ((0.0, 0.0), (1.0, 0.0)),
                ((1.0, 0.0), (0.0, 1.0)),
                ((0.0, 1.0), (0.0, 0.0)),
            ]
        );
    }

    #[test]
    fn test_renderable() {
        assert!(!Polygon(vec![(0.0, 0.0), (1.0, 1.0)]).is_renderable());
        assert!(Polygon(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]).is_renderable());
        assert!(!Polygon(vec![(0.0, 0.0), (f64::NAN, 1.0), (2.0, 0.0)]).is_renderable());
    }

    #[test]
    fn test_centroid() {
        assert_eq!(Polygon::default().centroid(), None);
        let p = Polygon(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        assert_eq!(p.centroid(), Some((1.0, 1.0)));
    }
}
