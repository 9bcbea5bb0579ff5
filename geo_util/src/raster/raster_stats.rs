/*
This file is part of the Building Aggregration Tool
Copyright (C) 2022 Novel-T

The Building Aggregration Tool is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/
use core::fmt;
use gdal::Dataset;
use gdal::raster::GdalDataType;

use crate::config_err;
use crate::errors::Result;
use crate::raster::{is_nodata, is_nodata_f64};
use crate::vector::BoundingBox;

/// Helper struct to hold stats of a raster
/// Only north up rasters without rotation are supported, so pixel_height is negative
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStats {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub num_rows: usize,
    pub num_cols: usize,
    pub no_data_value: Option<f64>,
    pub data_type: GdalDataType,

    //WKT projection string
    pub projection: String
}

//const SMALL_EPSILON: f64 = 5.0 * f64::EPSILON;
pub const MEDIUM_EPSILON: f64 = 1e-10;

// In projected meters this is a micrometer
pub const LARGE_EPSILON: f64 = 1e-6;

pub fn assert_float_within_eps(a: f64, b: f64, eps: f64, msg: &str) {
    let diff =  (a-b).abs();
    if diff > eps {
        let message = format!("{} Val 1: {} Val 2: {} Abs. Difference: {}  Eps: {}", msg,
                              a, b, diff, eps);
        panic!("{}", message);
    }
}

impl fmt::Display for RasterStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {

        write!(f, "Origin X,Y: {}, {}\nRight/Bottom: {},{}\nPixel Width/Height: {},{}\nRows: {} Cols: {}\nNo data value: {:?}\nGdal Type: {}\nProjection: {}",
               self.origin_x,
               self.origin_y,
               self.right_x_coord(),
               self.bottom_y_coord(),
               self.pixel_width,
               self.pixel_height,
               self.num_rows,
               self.num_cols,
               self.no_data_value,
               self.data_type,
               &self.projection
        )
    }
}

impl RasterStats {

    #[allow(clippy::too_many_arguments)]
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64,
               num_rows: usize, num_cols: usize,
               no_data_value: Option<f64>, data_type: GdalDataType, projection: &str) -> Self {
        RasterStats {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            num_rows,
            num_cols,
            no_data_value,
            data_type,
            projection: projection.to_string(),
        }
    }

    /// Grid of `num_cols` x `num_rows` stretched over the bounding box,
    /// pixel sizes are derived from the extent
    pub fn from_bounds(bbox: &BoundingBox, num_cols: usize, num_rows: usize,
                       no_data_value: Option<f64>, data_type: GdalDataType, projection: &str) -> Result<Self> {
        if num_cols == 0 || num_rows == 0 {
            return Err(config_err!("Raster over {} would have {} columns and {} rows", bbox, num_cols, num_rows));
        }
        if !bbox.is_finite() || bbox.is_empty() {
            return Err(config_err!("Cannot build a raster over the degenerate box {}", bbox));
        }

        Ok(RasterStats::new(
            bbox.left,
            bbox.top,
            bbox.width() / num_cols as f64,
            -bbox.height() / num_rows as f64,
            num_rows,
            num_cols,
            no_data_value,
            data_type,
            projection))
    }

    /// Reads the geo transform, size and band 1 attributes
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let geotransform = dataset.geo_transform()?;

        if geotransform[2] != 0.0 || geotransform[4] != 0.0 {
            return Err(config_err!("Rotated rasters are not supported, geo transform {:?}", geotransform));
        }
        if geotransform[1] <= 0.0 || geotransform[5] >= 0.0 {
            return Err(config_err!("Only north up rasters are supported, geo transform {:?}", geotransform));
        }

        let (num_cols, num_rows) = dataset.raster_size();

        let band = dataset.rasterband(1)?;
        let no_data_value = band.no_data_value();
        let data_type = band.band_type();

        Ok(RasterStats {
            origin_x: geotransform[0],
            origin_y: geotransform[3],
            pixel_width: geotransform[1],
            pixel_height: geotransform[5],
            num_rows,
            num_cols,
            no_data_value,
            data_type,
            projection: dataset.projection(),
        })
    }

    pub fn geo_transform(&self) -> [f64; 6] {
        [self.origin_x, self.pixel_width, 0.0, self.origin_y, 0.0, self.pixel_height]
    }

    /// Calculates the left side
    /// Calculates projected x coordinate from raster_x
    pub fn calc_x_coord(&self, raster_x: i64) -> f64 {
        self.origin_x + self.pixel_width * raster_x as f64
    }
    pub fn right_x_coord(&self) -> f64 {
        self.calc_x_coord(self.num_cols as i64)
    }
    ///calculates the top side
    /// Note pixel height is negative
    pub fn calc_y_coord(&self, raster_y: i64) -> f64 {
        self.origin_y + self.pixel_height * raster_y as f64
    }
    pub fn bottom_y_coord(&self) -> f64 {
        self.calc_y_coord(self.num_rows as i64)
    }

    //Converts projected coordinate to raster_x
    pub fn calc_x(&self, x_coord: f64) -> i64 {
        ((x_coord - self.origin_x) / self.pixel_width).floor() as _
    }
    pub fn calc_y(&self, y_coord: f64) -> i64 {
        ((y_coord - self.origin_y) / self.pixel_height).floor() as _
    }

    pub fn bounds_x(&self, raster_x: i64) -> i64 {
        raster_x.clamp(0, self.num_cols as i64 - 1)
    }

    pub fn bounds_y(&self, raster_y: i64) -> i64 {
        raster_y.clamp(0, self.num_rows as i64 - 1)
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.origin_x, self.bottom_y_coord(), self.right_x_coord(), self.origin_y)
    }

    /// (x, y) resolution, both positive
    pub fn resolution(&self) -> (f64, f64) {
        (self.pixel_width, -self.pixel_height)
    }

    pub fn pixel_area(&self) -> f64 {
        (self.pixel_width * self.pixel_height).abs()
    }

    //Shortcut when dealing with f64 values & nodata.  Handles f32 case
    pub fn is_nodata(&self, in_value: f64) -> bool {
        if in_value.is_nan() {
            return true;
        }
        let Some(no_data_value) = self.no_data_value else {
            return false;
        };
        if is_nodata_f64(in_value, no_data_value) {
            return true;
        }
        //We need to do this since the comparison with f64 doesn't work since a f32
        //rounding error will be much migger than the "Unit of least precision" of f64
        if self.data_type == GdalDataType::Float32 && is_nodata(in_value as f32, no_data_value as f32) {
            return true;
        }
        false
    }

    pub fn assert_equals_except_no_data(&self, rhs: &Self) {

        assert_eq!(self.num_cols, rhs.num_cols);
        assert_eq!(self.num_rows, rhs.num_rows);
        assert_float_within_eps(self.origin_x, rhs.origin_x, LARGE_EPSILON, "Origin X");
        assert_float_within_eps(self.origin_y, rhs.origin_y, LARGE_EPSILON, "Origin Y");

        assert_float_within_eps(self.pixel_height, rhs.pixel_height, MEDIUM_EPSILON, "pixel height");
        assert_float_within_eps(self.pixel_width, rhs.pixel_width, MEDIUM_EPSILON, "pixel width");

    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GeoUtilError;

    fn r1() -> RasterStats {
        RasterStats::new(4.0, 5.0, 1.0, -2.0, 4, 5, Some(3.2), GdalDataType::Float32, "")
    }

    #[test]
    fn test_coords() {
        let r1 = r1();

        assert_eq!(r1.calc_x(4.0), 0);
        assert_eq!(r1.calc_x(4.999), 0);
        assert_eq!(r1.calc_x(5.0), 1);
        assert_eq!(r1.calc_x(3.5), -1);

        assert_eq!(r1.calc_y(5.0), 0);
        assert_eq!(r1.calc_y(3.1), 0);
        assert_eq!(r1.calc_y(3.0), 1);

        assert_eq!(r1.bounds_x(-1), 0);
        assert_eq!(r1.bounds_x(7), 4);
        assert_eq!(r1.bounds_y(7), 3);

        assert_eq!(r1.bounds(), BoundingBox::new(4.0, -3.0, 9.0, 5.0));
        assert_eq!(r1.resolution(), (1.0, 2.0));
        assert_eq!(r1.geo_transform(), [4.0, 1.0, 0.0, 5.0, 0.0, -2.0]);
    }

    #[test]
    fn test_nodata() {
        let r1 = r1();

        assert!(r1.is_nodata(3.2));
        // value as stored in a f32 band
        assert!(r1.is_nodata(3.2f32 as f64));
        assert!(r1.is_nodata(f64::NAN));
        assert!(!r1.is_nodata(3.0));

        let r2 = RasterStats { no_data_value: None, ..r1 };
        assert!(!r2.is_nodata(3.2));
        assert!(r2.is_nodata(f64::NAN));
    }

    #[test]
    fn test_from_bounds() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 5.0);
        let r = RasterStats::from_bounds(&bbox, 4, 2, None, GdalDataType::UInt8, "").unwrap();

        assert_float_within_eps(r.pixel_width, 2.5, MEDIUM_EPSILON, "pixel width");
        assert_float_within_eps(r.pixel_height, -2.5, MEDIUM_EPSILON, "pixel height");
        assert_eq!(r.bounds(), bbox);

        assert!(matches!(RasterStats::from_bounds(&bbox, 0, 2, None, GdalDataType::UInt8, ""),
            Err(GeoUtilError::Configuration(_))));
        assert!(matches!(RasterStats::from_bounds(&BoundingBox::new(0.0, 0.0, 0.0, 5.0), 1, 2, None, GdalDataType::UInt8, ""),
            Err(GeoUtilError::Configuration(_))));
    }
}
