use std::fmt;
use serde::{Deserialize, Serialize};
use crate::config_err;
use crate::errors::Result;

/// Step of the reference grid the fitted boxes move by
pub const DEFAULT_FIT_STEP: f64 = 10.0;

/// Axis aligned rectangle in the units of some CRS
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl BoundingBox {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        BoundingBox { left, bottom, right, top }
    }

    pub fn from_array(b: [f64; 4]) -> Self {
        BoundingBox::new(b[0], b[1], b[2], b[3])
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.left, self.bottom, self.right, self.top]
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// Empty boxes include inverted ones, which fitting can produce
    pub fn is_empty(&self) -> bool {
        !(self.left < self.right && self.bottom < self.top)
    }

    pub fn contains(&self, rhs: &BoundingBox) -> bool {
        rhs.left >= self.left && rhs.bottom >= self.bottom &&
            rhs.right <= self.right && rhs.top <= self.top
    }

    /// Smallest box containing both
    pub fn union(&self, rhs: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(rhs.left),
            bottom: self.bottom.min(rhs.bottom),
            right: self.right.max(rhs.right),
            top: self.top.max(rhs.top),
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.left, self.bottom, self.right, self.top)
    }
}

impl From<geo::Rect<f64>> for BoundingBox {
    fn from(r: geo::Rect<f64>) -> Self {
        BoundingBox::new(r.min().x, r.min().y, r.max().x, r.max().y)
    }
}

/// Moves the edges of `box1` inward by `DEFAULT_FIT_STEP` until it lies inside `box2`
pub fn fit_box(box1: &BoundingBox, box2: &BoundingBox) -> Result<BoundingBox> {
    fit_box_with_step(box1, box2, DEFAULT_FIT_STEP)
}

/// Each edge of box1 steps independently towards the inside until it no longer
/// crosses the corresponding edge of box2.  When box1 starts on a grid, the result
/// stays on that grid.
pub fn fit_box_with_step(box1: &BoundingBox, box2: &BoundingBox, step: f64) -> Result<BoundingBox> {
    if !box1.is_finite() || !box2.is_finite() {
        return Err(config_err!("Cannot fit {} into {}, coordinates must be finite", box1, box2));
    }
    if !(step.is_finite() && step > 0.0) {
        return Err(config_err!("Fit step must be positive, got {}", step));
    }

    let mut fitted = *box1;

    while fitted.left < box2.left {
        fitted.left += step;
    }

    while fitted.bottom < box2.bottom {
        fitted.bottom += step;
    }

    while fitted.right > box2.right {
        fitted.right -= step;
    }

    while fitted.top > box2.top {
        fitted.top -= step;
    }

    Ok(fitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;

    fn is_multiple_of_step(d: f64, step: f64) -> bool {
        let n = d / step;
        d >= 0.0 && (n - n.round()).abs() < 1e-9
    }

    #[test]
    fn test_fit_box_example() {
        let fitted = fit_box(
            &BoundingBox::new(0., 0., 100., 100.),
            &BoundingBox::new(20., 20., 80., 80.)).unwrap();

        assert_eq!(BoundingBox::new(20., 20., 80., 80.), fitted);
    }

    #[test]
    fn test_fit_box_already_inside() {
        let inner = BoundingBox::new(25., 31., 47., 60.);
        let fitted = fit_box(&inner, &BoundingBox::new(0., 0., 100., 100.)).unwrap();

        assert_eq!(inner, fitted);
    }

    #[test]
    fn test_fit_box_non_multiple_offsets() {
        let fitted = fit_box(
            &BoundingBox::new(0., 0., 100., 100.),
            &BoundingBox::new(13., 5., 81., 99.5)).unwrap();

        assert_eq!(BoundingBox::new(20., 10., 80., 90.), fitted);
    }

    #[test]
    fn test_fit_box_contained_and_stepped() {
        let outers = [
            BoundingBox::new(0., 0., 100., 100.),
            BoundingBox::new(-55.5, -3., 212., 97.25),
            BoundingBox::new(4016026.363042, 2654919.607965, 4676026.363042001, 3554919.607965),
        ];

        for (outer, (dl, db, dr, dt)) in iproduct!(outers.iter(),
            [(1.0, 1.0, 1.0, 1.0), (10.0, 0.5, 33.3, 9.99), (0.0, 20.0, 5.0, 0.0)])
        {
            let inner = BoundingBox::new(outer.left + dl, outer.bottom + db,
                                         outer.right - dr, outer.top - dt);

            let fitted = fit_box(outer, &inner).unwrap();

            assert!(inner.contains(&fitted), "{} not in {}", fitted, inner);

            assert!(is_multiple_of_step(fitted.left - outer.left, DEFAULT_FIT_STEP));
            assert!(is_multiple_of_step(fitted.bottom - outer.bottom, DEFAULT_FIT_STEP));
            assert!(is_multiple_of_step(outer.right - fitted.right, DEFAULT_FIT_STEP));
            assert!(is_multiple_of_step(outer.top - fitted.top, DEFAULT_FIT_STEP));

            //fixed point
            assert_eq!(fitted, fit_box(&fitted, &inner).unwrap());
        }
    }

    #[test]
    fn test_fit_box_disjoint_is_empty() {
        //box1 entirely left of box2, the left edge walks past the right edge
        let fitted = fit_box(
            &BoundingBox::new(0., 0., 30., 30.),
            &BoundingBox::new(45., 0., 100., 30.)).unwrap();

        assert_eq!(50., fitted.left);
        assert_eq!(30., fitted.right);
        assert!(fitted.is_empty());
    }

    #[test]
    fn test_fit_box_rejects_non_finite() {
        let r = fit_box(
            &BoundingBox::new(0., 0., 30., 30.),
            &BoundingBox::new(f64::INFINITY, 0., 100., 30.));

        assert!(matches!(r, Err(crate::GeoUtilError::Configuration(_))));
    }
}
