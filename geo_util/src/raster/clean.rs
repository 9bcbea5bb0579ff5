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
use std::path::Path;

use gdal::raster::GdalDataType;
use ndarray::Array2;
use log::{debug, info};

use crate::errors::Result;
use crate::raster::{is_nodata_f64, srs_from_epsg, srs_from_wkt, transform_bounds, Raster, RasterSource, RasterStats};
use crate::vector::BoundingBox;

pub const DEFAULT_NO_DATA: f64 = -9999.0;
pub const REFERENCE_EPSG: u32 = 3035;

/// Source no data (and NaN) becomes `no_data_value`, any other negative value becomes 0
#[inline]
pub fn clean_value(value: f64, source_stats: &RasterStats, no_data_value: f64) -> f64 {
    if source_stats.is_nodata(value) || is_nodata_f64(value, no_data_value) {
        no_data_value
    } else if value < 0.0 {
        0.0
    } else {
        value
    }
}

pub fn clean_block(block: &mut Array2<f64>, source_stats: &RasterStats, no_data_value: f64) {
    block.par_mapv_inplace(|v| clean_value(v, source_stats, no_data_value));
}

/// Cleans blocks as they are read, the stats declare the new no data value
pub struct CleanedRaster<S: RasterSource> {
    source: S,
    stats: RasterStats,
}

impl<S: RasterSource> CleanedRaster<S> {
    pub fn new(source: S, no_data_value: f64) -> Self {
        let stats = RasterStats {
            no_data_value: Some(no_data_value),
            data_type: GdalDataType::Float32,
            ..source.stats().clone()
        };
        CleanedRaster { source, stats }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: RasterSource> RasterSource for CleanedRaster<S> {
    fn stats(&self) -> &RasterStats {
        &self.stats
    }

    fn read_block(&self, offset: (usize, usize), size: (usize, usize)) -> Result<Array2<f64>> {
        let mut block = self.source.read_block(offset, size)?;
        // stats here always have a no data value
        let no_data_value = self.stats.no_data_value.unwrap_or(DEFAULT_NO_DATA);
        clean_block(&mut block, self.source.stats(), no_data_value);
        Ok(block)
    }
}

pub struct CleanedRasterInfo {
    pub raster: CleanedRaster<Raster>,
    /// Raster bounds in the reference CRS
    pub bounds: BoundingBox,
    pub no_data_value: f64,
    /// (x, y) resolution in the raster CRS
    pub resolution: (f64, f64),
}

impl CleanedRasterInfo {
    pub fn stats(&self) -> &RasterStats {
        self.raster.stats()
    }
}

/// Opens the raster lazily cleaned and reports its bounds in the reference CRS
pub fn open_damage_raster(path: &Path, reference_epsg: u32, no_data_value: f64) -> Result<CleanedRasterInfo> {
    let raster = Raster::read(path)?;

    debug!("Source no data value of {:?} is {:?}", path, raster.stats.no_data_value);

    let s_srs = srs_from_wkt(&raster.stats.projection)?;
    let t_srs = srs_from_epsg(reference_epsg)?;
    let bounds = transform_bounds(&raster.stats.bounds(), &s_srs, &t_srs)?;

    let resolution = raster.stats.resolution();
    let raster = CleanedRaster::new(raster, no_data_value);

    info!("Opened {:?}, bounds in EPSG:{} {}, resolution {:?}", path, reference_epsg, bounds, resolution);

    Ok(CleanedRasterInfo {
        raster,
        bounds,
        no_data_value,
        resolution,
    })
}
