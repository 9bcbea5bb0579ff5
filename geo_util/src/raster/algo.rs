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
use std::fs::{create_dir_all, remove_file};
use std::path::Path;

use gdal::{Dataset, DriverManager};
use gdal::raster::{GdalDataType, RasterCreationOptions};
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use float_cmp::{ApproxEq, F32Margin, F64Margin};
use log::debug;

use crate::config_err;
use crate::errors::{GeoUtilError, Result};
use crate::raster::RasterStats;
use crate::vector::BoundingBox;

pub const GTIFF_DRIVER: &str = "GTiff";
pub const MEM_DRIVER: &str = "MEM";

// recommended by the GDAL OCTTransformBounds doc
pub const DENSIFY_POINTS: i32 = 21;

/// Creates a single band GeoTIFF, the data type, geo transform, projection and no data
/// value come from `stats`.  The band is left as created by the driver (all 0)
pub fn create_empty_raster(raster_path: &Path,
                           stats: &RasterStats,
                           options: &RasterCreationOptions
) -> Result<Dataset>
{
    create_empty_raster_with_driver(GTIFF_DRIVER, raster_path, stats, options)
}

/// Same as [create_empty_raster] for any raster driver, MEM takes an empty path
pub fn create_empty_raster_with_driver(driver_name: &str,
                                       raster_path: &Path,
                                       stats: &RasterStats,
                                       options: &RasterCreationOptions
) -> Result<Dataset>
{
    debug!("Creating {} raster {:?}", driver_name, raster_path);

    if let Some(a) = raster_path.parent() {
        if !a.as_os_str().is_empty() && !a.exists() {
            create_dir_all(a).map_err(|e| GeoUtilError::io(a, e))?;
        }
    }

    let drv = DriverManager::get_driver_by_name(driver_name)?;

    let (w, h) = (stats.num_cols, stats.num_rows);
    let mut ds = match stats.data_type {
        GdalDataType::UInt8 => drv.create_with_band_type_with_options::<u8, _>(raster_path, w, h, 1, options)?,
        GdalDataType::Int16 => drv.create_with_band_type_with_options::<i16, _>(raster_path, w, h, 1, options)?,
        GdalDataType::Int32 => drv.create_with_band_type_with_options::<i32, _>(raster_path, w, h, 1, options)?,
        GdalDataType::Float32 => drv.create_with_band_type_with_options::<f32, _>(raster_path, w, h, 1, options)?,
        GdalDataType::Float64 => drv.create_with_band_type_with_options::<f64, _>(raster_path, w, h, 1, options)?,
        other => return Err(config_err!("Unsupported raster data type {} for {:?}", other, raster_path)),
    };

    {
        let mut band = ds.rasterband(1)?;
        if let Some(no_data_value) = stats.no_data_value {
            band.set_no_data_value(Some(no_data_value))?;
        }
    }

    ds.set_geo_transform(&stats.geo_transform())?;

    if !stats.projection.is_empty() {
        ds.set_projection(&stats.projection)?;
    }

    debug!("Created {} raster {:?} with {} cols {} rows", driver_name, raster_path, w, h);

    Ok(ds)
}

/// Builds GDAL creation options from KEY=VALUE strings
pub fn creation_options(options: &[String]) -> Result<RasterCreationOptions> {
    let mut co = RasterCreationOptions::new();
    for o in options {
        co.add_string(o)?;
    }
    Ok(co)
}

/// Output files are never silently replaced, `overwrite` removes a previous output
pub fn prepare_output(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() {
        if !overwrite {
            return Err(config_err!("Output {:?} already exists, use the clean/overwrite option to replace it", path));
        }
        debug!("Removing existing output {:?}", path);
        remove_file(path).map_err(|e| GeoUtilError::io(path, e))?;
    }
    Ok(())
}

/// Spatial reference with x = easting/longitude whatever the authority says
pub fn srs_from_epsg(epsg: u32) -> Result<SpatialRef> {
    let mut srs = SpatialRef::from_epsg(epsg)?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

pub fn srs_from_wkt(wkt: &str) -> Result<SpatialRef> {
    if wkt.is_empty() {
        return Err(config_err!("Missing coordinate reference system"));
    }
    let mut srs = SpatialRef::from_wkt(wkt)?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

/// Transforms the box edges (densified) and returns the envelope, no resampling is involved
pub fn transform_bounds(bbox: &BoundingBox, s_srs: &SpatialRef, t_srs: &SpatialRef) -> Result<BoundingBox> {
    if s_srs == t_srs {
        return Ok(*bbox);
    }
    let transform = CoordTransform::new(s_srs, t_srs)?;
    let b = transform.transform_bounds(&bbox.to_array(), DENSIFY_POINTS)?;
    Ok(BoundingBox::from_array(b))
}

#[inline]
pub fn is_nodata(val: f32, no_data_value: f32) -> bool {

    //seems like Gdal can read nodata values as NaN
    if !val.is_finite() {
        return true;
    }

    if !no_data_value.is_finite() {
        return false;
    }

    no_data_value.approx_eq(val, F32Margin{ ulps: 5, epsilon: f32::EPSILON * 5.0})
}

#[inline]
pub fn is_nodata_f64(val: f64, no_data_value: f64) -> bool {

    //seems like Gdal can read nodata values as NaN
    if !val.is_finite() {
        return true;
    }

    if !no_data_value.is_finite() {
        return false;
    }

    no_data_value.approx_eq(val, F64Margin{ ulps: 5, epsilon: f64::EPSILON * 5.0})
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::raster::get_temp_filename;

    #[test]
    fn test_is_nodata()  {
        let nodata = -9999f32;

        assert!(is_nodata(nodata, nodata));
        assert!(is_nodata(f32::NAN, nodata));
        assert!(is_nodata(f32::INFINITY, nodata));
        assert!(!is_nodata(-9998.9, nodata));
        assert!(!is_nodata(0.0, nodata));

        let nodata = f32::NAN;

        assert!(is_nodata(f32::NAN , nodata));
        assert!(!is_nodata( 1e30, nodata));
    }

    #[test]
    fn test_is_nodata_64()  {
        let nodata = -9999f64;

        assert!(is_nodata_f64(nodata, nodata));
        assert!(is_nodata_f64(-9999f32 as f64, nodata));
        assert!(is_nodata_f64(f64::NAN, nodata));
        assert!(!is_nodata_f64(-9999.001, nodata));

        let nodata = f64::MIN;

        assert!(is_nodata_f64(nodata + 10000., nodata));
        assert!(!is_nodata_f64(nodata + 1e306, nodata));

        let nodata = f64::NAN;

        assert!(is_nodata_f64(f64::NAN , nodata));
        assert!(!is_nodata_f64( 1e306, nodata));
    }

    #[test]
    fn test_create_empty_raster() {
        let path = get_temp_filename("empty.tif");
        let bbox = BoundingBox::new(100.0, 200.0, 140.0, 220.0);
        let srs = srs_from_epsg(3035).unwrap();
        let stats = RasterStats::from_bounds(&bbox, 4, 2, Some(-9999.0), GdalDataType::Float32,
                                             &srs.to_wkt().unwrap()).unwrap();

        {
            create_empty_raster(&path, &stats, &RasterCreationOptions::new()).unwrap();
        }

        let ds = Dataset::open(&path).unwrap();
        let read_stats = RasterStats::from_dataset(&ds).unwrap();

        read_stats.assert_equals_except_no_data(&stats);
        assert_eq!(read_stats.no_data_value, Some(-9999.0));
        assert_eq!(read_stats.data_type, GdalDataType::Float32);
        assert_eq!(srs_from_wkt(&read_stats.projection).unwrap().auth_code().unwrap(), 3035);

        assert!(matches!(prepare_output(&path, false), Err(GeoUtilError::Configuration(_))));
        prepare_output(&path, true).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_transform_bounds() {
        let lonlat = srs_from_epsg(4326).unwrap();
        let laea = srs_from_epsg(3035).unwrap();

        // projection centre of EPSG:3035 is 10E 52N with false easting/northing 4321000/3210000
        let b = transform_bounds(&BoundingBox::new(9.99, 51.99, 10.01, 52.01), &lonlat, &laea).unwrap();
        assert!(b.contains(&BoundingBox::new(4321000.0, 3210000.0, 4321000.0, 3210000.0)));
        assert!(b.width() < 2000.0 && b.height() < 3000.0);

        let same = transform_bounds(&b, &laea, &srs_from_epsg(3035).unwrap()).unwrap();
        assert_eq!(same, b);
    }
}
