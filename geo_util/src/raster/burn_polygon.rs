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

use gdal::Dataset;
use gdal::raster::{rasterize, GdalDataType, RasterCreationOptions, RasterizeOptions};
use gdal::vector::{Geometry, ToGdal};
use log::{debug, info};

use crate::config_err;
use crate::errors::Result;
use crate::raster::{prepare_output, MemRaster, Raster, RasterSource, RasterStats};
use crate::vector::{BoundingBox, PolygonSet};

pub const BURN_VALUE: f64 = 1.0;

/// Grid covering the bounds at roughly `resolution`, the pixel size is stretched so the
/// floor of the cell count fits the extent exactly
pub fn rasterize_grid(bounds: &BoundingBox, resolution: f64, projection: &str) -> Result<RasterStats> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(config_err!("Resolution must be a positive number, got {}", resolution));
    }
    if !bounds.is_finite() {
        return Err(config_err!("Polygon extent {} is not finite", bounds));
    }

    let num_cols = (bounds.width() / resolution).floor();
    let num_rows = (bounds.height() / resolution).floor();

    if num_cols < 1.0 || num_rows < 1.0 {
        return Err(config_err!("Resolution {} is too coarse for extent {}, the raster would be {}x{} (cols x rows)",
            resolution, bounds, num_cols.max(0.0), num_rows.max(0.0)));
    }

    RasterStats::from_bounds(bounds, num_cols as usize, num_rows as usize, None, GdalDataType::UInt8, projection)
}

fn polygon_set_grid(polygon_set: &PolygonSet, resolution: f64) -> Result<RasterStats> {
    let bounds = polygon_set.total_bounds()
        .ok_or_else(|| config_err!("Nothing to rasterize, polygon set is empty"))?;

    rasterize_grid(&bounds, resolution, &polygon_set.projection)
}

/// Fills band 1 with `fill_value` and lets GDAL burn the polygons with all touched on
fn burn_polygons(dataset: &mut Dataset, polygon_set: &PolygonSet, fill_value: u8) -> Result<()> {
    dataset.rasterband(1)?.fill(fill_value as f64, None)?;

    let geometries = polygon_set.polygons.iter()
        .map(|p| p.to_gdal())
        .collect::<gdal::errors::Result<Vec<Geometry>>>()?;
    let burn_values = vec![BURN_VALUE; geometries.len()];

    debug!("Burning {} polygons", geometries.len());

    let options = RasterizeOptions {
        all_touched: true,
        ..Default::default()
    };
    rasterize(dataset, &[1], &geometries, &burn_values, Some(options))?;

    Ok(())
}

/// Rasterizes with the all touched rule over the total bounds of the polygons.
/// Burned pixels are 1, everything else `fill_value`.  The result carries the
/// polygon CRS and no no data value
pub fn rasterize_polygons(polygon_set: &PolygonSet, resolution: f64, fill_value: u8) -> Result<MemRaster> {
    let grid = polygon_set_grid(polygon_set, resolution)?;

    debug!("Rasterizing {} polygons onto\n{}", polygon_set.polygons.len(), grid);

    let mut raster = Raster::create_in_memory(&grid)?;
    burn_polygons(&mut raster.dataset, polygon_set, fill_value)?;

    raster.materialize()
}

/// Reads the polygons of `input_path` and burns them straight into the 8 bit mask at `output_path`
pub fn rasterize_polygon_file(input_path: &Path, output_path: &Path,
                              resolution: f64, fill_value: u8, overwrite: bool) -> Result<RasterStats>
{
    prepare_output(output_path, overwrite)?;

    let polygon_set = PolygonSet::read(input_path)?;

    let grid = polygon_set_grid(&polygon_set, resolution)?;

    {
        let mut output = Raster::create(output_path, &grid, &RasterCreationOptions::new())?;
        burn_polygons(&mut output.dataset, &polygon_set, fill_value)?;
    }

    info!("Rasterized {} polygons from {:?} into {:?} ({}x{} cols x rows)",
        polygon_set.polygons.len(), input_path, output_path,
        grid.num_cols, grid.num_rows);

    Ok(grid)
}
