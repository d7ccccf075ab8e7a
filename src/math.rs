use std::f64::consts::PI;

#[inline(always)]
pub fn pi(v: f64) -> f64 {
    PI * v
}

/// Linearly maps `value` from `(old_min, old_max)` onto `(new_min, new_max)` without clamping.
///
/// Either range may be reversed; `map(d, (0.0, max), (0.4, 0.0))` is how influence falls off with
/// distance. A zero-width source range maps everything to `new_min`.
pub fn map(value: f64, (old_min, old_max): (f64, f64), (new_min, new_max): (f64, f64)) -> f64 {
    let old_spread = old_max - old_min;
    if old_spread == 0.0 {
        return new_min;
    }
    new_min + (value - old_min) * ((new_max - new_min) / old_spread)
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Computes the distance between two points.
pub fn dist((x1, y1): (f64, f64), (x2, y2): (f64, f64)) -> f64 {
    f64::hypot(x2 - x1, y2 - y1)
}

/// Computes the angle from `(x1, y1)` to `(x2, y2)`, as a value in radians from -π to π.
pub fn angle((x1, y1): (f64, f64), (x2, y2): (f64, f64)) -> f64 {
    f64::atan2(y2 - y1, x2 - x1)
}

pub fn add_polar_offset((x, y): (f64, f64), theta: f64, r: f64) -> (f64, f64) {
    (x + r * theta.cos(), y + r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pi() {
        assert_eq!(pi(0.0), 0.0);
        assert_eq!(pi(1.0), PI);
        assert_eq!(pi(-3.7), -3.7 * PI);
        assert!(pi(f64::NAN).is_nan());
    }

    #[test]
    fn test_map() {
        assert_eq!(map(2.0625, (1.0625, 5.0625), (10.0, 20.0)), 12.5);
        assert_eq!(map(0.0, (0.0, 10.0), (0.4, 0.0)), 0.4);
        assert_eq!(map(10.0, (0.0, 10.0), (0.4, 0.0)), 0.0);
        // Unclamped.
        assert_eq!(map(20.0, (0.0, 10.0), (0.0, 1.0)), 2.0);
        assert_eq!(map(3.0, (5.0, 5.0), (7.0, 9.0)), 7.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(10.0, 20.0, 0.0), 10.0);
        assert_eq!(lerp(10.0, 20.0, 0.25), 12.5);
        assert_eq!(lerp(10.0, 20.0, 1.0), 20.0);
    }

    #[test]
    fn test_dist_symmetric() {
        assert_eq!(dist((0.0, 0.0), (3.0, 4.0)), 5.0);
        assert_eq!(dist((3.0, 4.0), (0.0, 0.0)), 5.0);
        assert_eq!(dist((10.0, 20.0), (15.0, 32.0)), 13.0);
    }

    #[test]
    fn test_angle() {
        assert_eq!(angle((0.0, 0.0), (1.0, 0.0)), 0.0);
        assert!((angle((1.0, 1.0), (1.0, 3.0)) - PI / 2.0).abs() < 1e-12);
        assert!((angle((0.0, 0.0), (-1.0, 0.0)) - PI).abs() < 1e-12);
    }

    #[test]
    fn test_add_polar_offset() {
        let (x, y) = add_polar_offset((10.0, 20.0), PI / 2.0, 2.0);
        assert!((x - 10.0).abs() < 1e-12);
        assert!((y - 22.0).abs() < 1e-12);
    }
}
