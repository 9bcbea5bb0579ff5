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
use std::fmt;

use gdal::raster::GdalDataType;
use gdal::spatial_ref::CoordTransform;
use ndarray::Array2;
use log::{debug, info};

use crate::config_err;
use crate::errors::Result;
use crate::raster::{srs_from_epsg, srs_from_wkt, MemRaster, RasterSink, RasterSource, RasterStats,
                    DEFAULT_NO_DATA, REFERENCE_EPSG};
use crate::util::{format_duration, ProgressTicker, RasterBlockIterator};
use crate::vector::BoundingBox;

pub const DEFAULT_TARGET_RESOLUTION: f64 = 10.0;
pub const DEFAULT_CHUNK_SIZE: usize = 64;

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub resolution: f64,
    pub chunk_size: usize,
    pub no_data_value: f64,
    pub target_epsg: u32,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        AggregateOptions {
            resolution: DEFAULT_TARGET_RESOLUTION,
            chunk_size: DEFAULT_CHUNK_SIZE,
            no_data_value: DEFAULT_NO_DATA,
            target_epsg: REFERENCE_EPSG,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Extent<T>
{
    min_x: T,
    max_x: T,
    min_y: T,
    max_y: T
}

impl <T> Extent<T>
where T : PartialOrd + fmt::Display
{
    fn check(&self) -> Result<()> {
        if self.min_x > self.max_x {
            return Err(config_err!("min x {} > max x {}", self.min_x, self.max_x));
        }
        if self.min_y > self.max_y {
            return Err(config_err!("min y {} > max y {}", self.min_y, self.max_y));
        }
        Ok(())
    }
}

impl Extent<i64> {
    fn pixel(raster_x: i64, raster_y: i64) -> Self {
        Extent { min_x: raster_x, max_x: raster_x, min_y: raster_y, max_y: raster_y }
    }
    fn window_size(&self) -> (usize, usize) {
        ((1+self.max_x - self.min_x) as usize, (1+self.max_y-self.min_y) as usize)
    }
    fn window_offset(&self) -> (usize, usize) {
        (self.min_x as usize, self.min_y as usize)
    }
}

impl <T> fmt::Display for Extent<T>
where T: fmt::Display
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x: ({}, {}) y: ({}, {})", self.min_x, self.max_x, self.min_y, self.max_y)
    }
}

/// Output grid with its origin at the top left of `bbox`, cells of `resolution`
pub fn aggregation_grid(bbox: &BoundingBox, resolution: f64, projection: &str, no_data_value: f64) -> Result<RasterStats> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(config_err!("Target resolution must be a positive number, got {}", resolution));
    }
    if !bbox.is_finite() || bbox.is_empty() {
        return Err(config_err!("Cannot aggregate onto the empty or inverted box {}", bbox));
    }

    let num_cols = (bbox.width() / resolution).round() as usize;
    let num_rows = (bbox.height() / resolution).round() as usize;

    if num_cols == 0 || num_rows == 0 {
        return Err(config_err!("Box {} is too small for resolution {}, grid would be {}x{} (cols x rows)",
            bbox, resolution, num_cols, num_rows));
    }

    Ok(RasterStats::new(bbox.left, bbox.top, resolution, -resolution, num_rows, num_cols,
                        Some(no_data_value), GdalDataType::Float32, projection))
}

/// None when both grids share a CRS (or one of them has none)
fn target_to_source_transform(target: &RasterStats, source: &RasterStats) -> Result<Option<CoordTransform>> {
    if target.projection.is_empty() || source.projection.is_empty() || target.projection == source.projection {
        return Ok(None);
    }

    let t_srs = srs_from_wkt(&target.projection)?;
    let s_srs = srs_from_wkt(&source.projection)?;

    if t_srs == s_srs {
        return Ok(None);
    }

    debug!("Output pixels are transformed into the source CRS");
    Ok(Some(CoordTransform::new(&t_srs, &s_srs)?))
}

/// Averages `source` onto the grid of `target`, area weighted.
/// Each output cell is sum(overlap * value) / sum(overlap) over the valid source cells it
/// overlaps, cells without any valid overlap get the target no data value.
/// With differing CRSs the output cell corners are transformed into the source CRS and
/// their envelope is used.
pub fn aggregate_average<S, K>(source: &S, target: &RasterStats, chunk_size: usize, sink: &mut K) -> Result<()>
where S: RasterSource + ?Sized, K: RasterSink + ?Sized
{
    if chunk_size == 0 {
        return Err(config_err!("Chunk size must be greater than 0"));
    }
    if target.num_cols == 0 || target.num_rows == 0 {
        return Err(config_err!("Target grid is empty"));
    }

    let source_stats = source.stats();

    info!("Aggregating {}x{} source cells onto {}x{} cells (cols x rows)",
        source_stats.num_cols, source_stats.num_rows, target.num_cols, target.num_rows);

    let xform = target_to_source_transform(target, source_stats)?;

    let output_no_data = target.no_data_value.unwrap_or(DEFAULT_NO_DATA);
    let input_square_area = source_stats.pixel_area();

    let input_raster_proj_extent: Extent<f64> =
        Extent {
            min_x: source_stats.origin_x,
            max_x: source_stats.right_x_coord(),
            max_y: source_stats.origin_y,
            min_y: source_stats.bottom_y_coord()
        };
    input_raster_proj_extent.check()?;

    let mut ticker = ProgressTicker::new(3);

    for raster_window in RasterBlockIterator::new(target.num_rows, target.num_cols, chunk_size)
    {
        let output_window_extent: Extent<i64> = Extent {
            min_x: raster_window.x_range_inclusive.0 as i64,
            max_x: raster_window.x_range_inclusive.1 as i64,
            min_y: raster_window.y_range_inclusive.0 as i64,
            max_y: raster_window.y_range_inclusive.1 as i64
        };

        let (output_width, output_height) = raster_window.window_size;
        let mut output_data = Array2::from_elem((output_height, output_width), output_no_data);

        //First fetch all the input data we might need
        let mut input_proj_extent = get_projected_coordinates(&output_window_extent, target, xform.as_ref())?;

        //The output window, in input coordinates, may be curved, so add some margin
        input_proj_extent.min_y -= source_stats.pixel_height.abs();
        input_proj_extent.max_y += source_stats.pixel_height.abs();
        input_proj_extent.min_x -= source_stats.pixel_width.abs();
        input_proj_extent.max_x += source_stats.pixel_width.abs();

        if extent_ranges_overlap(&input_proj_extent, &input_raster_proj_extent) {
            let input_window_extent = coords_to_raster(source_stats, &input_proj_extent)?;

            let input_window_data = source.read_block(
                input_window_extent.window_offset(),
                input_window_extent.window_size())?;

            for output_pixel_y in output_window_extent.min_y..=output_window_extent.max_y {
                for output_pixel_x in output_window_extent.min_x..=output_window_extent.max_x {

                    //These are the coordinates of the output pixel in the input raster projection
                    let input_proj_extent_of_output_pixel = get_projected_coordinates(
                        &Extent::pixel(output_pixel_x, output_pixel_y),
                        target,
                        xform.as_ref()
                    )?;

                    if !extent_ranges_overlap(&input_proj_extent_of_output_pixel, &input_raster_proj_extent) {
                        continue;
                    }

                    let input_pixel_extent = coords_to_raster(
                        source_stats,
                        &input_proj_extent_of_output_pixel
                    )?;

                    let mut weighted_sum = 0.0;
                    let mut total_weight = 0.0;

                    //loop through each input square that intersects with the output square
                    for i_y in input_pixel_extent.min_y.max(input_window_extent.min_y)..=input_pixel_extent.max_y.min(input_window_extent.max_y) {
                        for i_x in input_pixel_extent.min_x.max(input_window_extent.min_x)..=input_pixel_extent.max_x.min(input_window_extent.max_x) {

                            let input_raster_value = input_window_data[[
                                (i_y - input_window_extent.min_y) as usize,
                                (i_x - input_window_extent.min_x) as usize
                            ]];

                            //Ignore No Data
                            if source_stats.is_nodata(input_raster_value) {
                                continue;
                            }

                            //Get the input square coordinates in the input raster projection
                            let input_extent = get_projected_coordinates(
                                &Extent::pixel(i_x, i_y),
                                source_stats,
                                None
                            )?;

                            //Overlap of the envelopes, exact when both grids share a CRS
                            let x_overlap = 0f64.max(input_extent.max_x.min( input_proj_extent_of_output_pixel.max_x) -
                                input_extent.min_x.max(input_proj_extent_of_output_pixel.min_x));

                            let y_overlap = 0f64.max(input_extent.max_y.min( input_proj_extent_of_output_pixel.max_y) -
                                input_extent.min_y.max(input_proj_extent_of_output_pixel.min_y));

                            let ratio = x_overlap * y_overlap / input_square_area;

                            //We don't want rounding errors at the edges to include too much
                            if ratio < 1e-6 {
                                continue;
                            }

                            weighted_sum += ratio * input_raster_value;
                            total_weight += ratio;
                        }
                    }

                    if total_weight > 0.0 {
                        let output_window_row = (output_pixel_y - output_window_extent.min_y) as usize;
                        let output_window_col = (output_pixel_x - output_window_extent.min_x) as usize;

                        output_data[[output_window_row, output_window_col]] = weighted_sum / total_weight;
                    }
                }
            }
        }

        //done with a block
        sink.write_block(raster_window.window_offset, &output_data)?;

        ticker.tick(raster_window.current_step + 1, raster_window.num_steps, "Aggregating blocks");
    }

    info!("Aggregation done in {}", format_duration(ticker.elapsed()));

    Ok(())
}

/// Averages `source` into memory on a grid over `bbox` in the target CRS of `options`
pub fn aggregate_to_grid<S>(source: &S, bbox: &BoundingBox, options: &AggregateOptions) -> Result<MemRaster>
where S: RasterSource + ?Sized
{
    let t_srs = srs_from_epsg(options.target_epsg)?;
    let grid = aggregation_grid(bbox, options.resolution, &t_srs.to_wkt()?, options.no_data_value)?;

    debug!("Aggregation grid\n{}", grid);

    let mut output = MemRaster::filled(grid.clone(), options.no_data_value);

    aggregate_average(source, &grid, options.chunk_size, &mut output)?;

    Ok(output)
}

/// Gets coordinates of a raster squares and transform them
fn get_projected_coordinates(
    //inclusive range of the raster x's & y's
    raster_point_extent: &Extent<i64>,

    //stats associated with the coordinates above
    stats: &RasterStats,
    xform: Option<&CoordTransform>,
) -> Result<Extent<f64>> {
    //Get the 4 rectangular projected coordinates in the output raster projection
    let output_x_coords = [
        stats.calc_x_coord(raster_point_extent.min_x),
        stats.calc_x_coord(1 + raster_point_extent.max_x)
    ];
    let output_y_coords = [
        //smallest y will be the greatest raster y
        stats.calc_y_coord(1 + raster_point_extent.max_y),
        stats.calc_y_coord(raster_point_extent.min_y),
    ];

    let mut x_coords = [
        output_x_coords[0],
        output_x_coords[0],
        output_x_coords[1],
        output_x_coords[1],
    ];
    let mut y_coords = [
        output_y_coords[0],
        output_y_coords[1],
        output_y_coords[1],
        output_y_coords[0],
    ];
    let mut z_coords = [0.,0.,0.,0.,];

    if let Some(xform) = xform {
        xform.transform_coords(&mut x_coords, &mut y_coords, &mut z_coords)?;
    }

    let e = Extent {
        min_x: x_coords.iter().copied().fold(f64::INFINITY, f64::min),
        max_x: x_coords.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        min_y: y_coords.iter().copied().fold(f64::INFINITY, f64::min),
        max_y: y_coords.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };
    e.check()?;

    Ok(e)
}

fn coords_to_raster(
    stats: &RasterStats,
    coords: &Extent<f64>
) -> Result<Extent<i64>>
{
    coords.check()?;

    //Now we need the input squares this covers, with bounds check.
    let pixel = Extent {
        min_x: stats.bounds_x(stats.calc_x(coords.min_x)),
        max_x: stats.bounds_x(stats.calc_x(coords.max_x)),
        min_y: stats.bounds_y(stats.calc_y(coords.max_y)),
        max_y: stats.bounds_y(stats.calc_y(coords.min_y)),
    };

    pixel.check()?;

    Ok( pixel )
}

fn ranges_overlap(x1: f64, x2: f64, y1: f64, y2: f64) -> bool {
    x1 <= y2 && y1 <= x2
}

fn extent_ranges_overlap( e1: &Extent<f64>, e2: &Extent<f64>) -> bool {
    ranges_overlap(
        e1.min_x, e1.max_x, e2.min_x, e2.max_x
    ) && ranges_overlap(
        e1.min_y, e1.max_y, e2.min_y, e2.max_y
    )
}
