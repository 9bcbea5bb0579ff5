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
use std::path::{PathBuf, Path};
use gdal::Dataset;
use gdal::raster::{Buffer, GdalType, RasterCreationOptions};
use ndarray::{s, Array2};
use log::debug;

use crate::errors::{GeoUtilError, Result};
use crate::resource_err;

mod raster_stats;
mod raster_resample;
mod burn_polygon;
mod algo;
mod clean;
mod export;

#[cfg(test)]
mod test_util;

pub use raster_stats::*;
pub use raster_resample::*;
pub use burn_polygon::*;
pub use algo::*;
pub use clean::*;
pub use export::*;
#[cfg(test)]
pub use test_util::*;

/// Block level access to raster cells, values are always handed out as f64.
/// Offsets and sizes are in (column, row) order, arrays are (rows, columns).
pub trait RasterSource {
    fn stats(&self) -> &RasterStats;

    fn read_block(&self, offset: (usize, usize), size: (usize, usize)) -> Result<Array2<f64>>;

    /// Reads everything into memory
    fn materialize(&self) -> Result<MemRaster> {
        let stats = self.stats().clone();
        let data = self.read_block((0, 0), (stats.num_cols, stats.num_rows))?;
        MemRaster::new(stats, data)
    }
}

pub trait RasterSink {
    fn write_block(&mut self, offset: (usize, usize), data: &Array2<f64>) -> Result<()>;
}

fn check_window(stats: &RasterStats, offset: (usize, usize), size: (usize, usize)) -> Result<()> {
    if offset.0 + size.0 > stats.num_cols || offset.1 + size.1 > stats.num_rows {
        return Err(resource_err!("Window at {:?} of size {:?} is outside of raster {}x{} (cols x rows)",
            offset, size, stats.num_cols, stats.num_rows));
    }
    Ok(())
}

/// Single band raster backed by a GDAL dataset
pub struct Raster
{
    pub path: PathBuf,
    pub stats: RasterStats,
    pub dataset: Dataset,
}

impl Raster {
    pub fn read(path: &Path) -> Result<Raster> {
        if !path.is_file() {
            return Err(GeoUtilError::not_found(path));
        }

        let dataset = Dataset::open(path)?;

        Raster::from_dataset(path, dataset)
    }

    /// Creates the file with the geo transform, projection and no data value of `stats`
    pub fn create(path: &Path, stats: &RasterStats, options: &RasterCreationOptions) -> Result<Raster> {
        let dataset = create_empty_raster(path, stats, options)?;

        Ok(Raster {
            path: path.to_path_buf(),
            stats: stats.clone(),
            dataset,
        })
    }

    /// MEM driver raster laid out like `stats`, the path stays empty
    pub fn create_in_memory(stats: &RasterStats) -> Result<Raster> {
        let dataset = create_empty_raster_with_driver(MEM_DRIVER, Path::new(""), stats, &RasterCreationOptions::new())?;

        Ok(Raster {
            path: PathBuf::new(),
            stats: stats.clone(),
            dataset,
        })
    }

    fn from_dataset(path: &Path, dataset: Dataset) -> Result<Raster> {
        let stats = RasterStats::from_dataset(&dataset)?;

        debug!("Opened raster {:?} with stats {}", path, stats);

        Ok(Raster {
            path: path.to_path_buf(),
            stats,
            dataset,
        })
    }

    /// Writes the block with the given cell type, GDAL converts to the band type if they differ
    pub fn write_block_as<T: GdalType + Copy>(&mut self, offset: (usize, usize), data: &Array2<T>) -> Result<()> {
        let (num_rows, num_cols) = data.dim();
        check_window(&self.stats, offset, (num_cols, num_rows))?;

        let mut buffer = Buffer::new((num_cols, num_rows), data.iter().copied().collect());

        let mut band = self.dataset.rasterband(1)?;
        band.write((offset.0 as isize, offset.1 as isize), (num_cols, num_rows), &mut buffer)?;

        Ok(())
    }
}

impl RasterSource for Raster {
    fn stats(&self) -> &RasterStats {
        &self.stats
    }

    fn read_block(&self, offset: (usize, usize), size: (usize, usize)) -> Result<Array2<f64>> {
        check_window(&self.stats, offset, size)?;

        let band = self.dataset.rasterband(1)?;
        let buffer = band.read_as::<f64>((offset.0 as isize, offset.1 as isize), size, size, None)?;

        Array2::from_shape_vec((size.1, size.0), buffer.data().to_vec())
            .map_err(|e| resource_err!("Block of {:?} read from {:?} has the wrong shape: {}", size, self.path, e))
    }
}

impl RasterSink for Raster {
    fn write_block(&mut self, offset: (usize, usize), data: &Array2<f64>) -> Result<()> {
        self.write_block_as(offset, data)
    }
}

/// Raster held entirely in memory
#[derive(Debug, Clone)]
pub struct MemRaster {
    pub stats: RasterStats,
    pub data: Array2<f64>,
}

impl MemRaster {
    pub fn new(stats: RasterStats, data: Array2<f64>) -> Result<MemRaster> {
        if data.dim() != (stats.num_rows, stats.num_cols) {
            return Err(resource_err!("Data of shape {:?} does not match raster {}x{} (rows x cols)",
                data.dim(), stats.num_rows, stats.num_cols));
        }
        Ok(MemRaster { stats, data })
    }

    pub fn filled(stats: RasterStats, value: f64) -> MemRaster {
        let data = Array2::from_elem((stats.num_rows, stats.num_cols), value);
        MemRaster { stats, data }
    }
}

impl RasterSource for MemRaster {
    fn stats(&self) -> &RasterStats {
        &self.stats
    }

    fn read_block(&self, offset: (usize, usize), size: (usize, usize)) -> Result<Array2<f64>> {
        check_window(&self.stats, offset, size)?;

        Ok(self.data.slice(s![offset.1..offset.1 + size.1, offset.0..offset.0 + size.0]).to_owned())
    }

    fn materialize(&self) -> Result<MemRaster> {
        Ok(self.clone())
    }
}

impl RasterSink for MemRaster {
    fn write_block(&mut self, offset: (usize, usize), data: &Array2<f64>) -> Result<()> {
        let (num_rows, num_cols) = data.dim();
        check_window(&self.stats, offset, (num_cols, num_rows))?;

        self.data.slice_mut(s![offset.1..offset.1 + num_rows, offset.0..offset.0 + num_cols]).assign(data);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdal::raster::GdalDataType;
    use ndarray::array;

    fn stats_3x4() -> RasterStats {
        RasterStats::new(0.0, 3.0, 1.0, -1.0, 3, 4, None, GdalDataType::Float64, "")
    }

    #[test]
    fn test_mem_raster_blocks() {
        let mut r = MemRaster::filled(stats_3x4(), 0.0);

        r.write_block((1, 1), &array![[1., 2.], [3., 4.]]).unwrap();

        assert_eq!(array![[0., 0.], [0., 1.]], r.read_block((0, 0), (2, 2)).unwrap());
        assert_eq!(array![[2., 0.], [4., 0.]], r.read_block((2, 1), (2, 2)).unwrap());

        assert!(matches!(r.read_block((3, 0), (2, 2)), Err(GeoUtilError::Resource(_))));
        assert!(matches!(r.write_block((0, 2), &array![[1.], [1.]]), Err(GeoUtilError::Resource(_))));

        let m = r.materialize().unwrap();
        assert_eq!(r.data, m.data);
    }

    #[test]
    fn test_in_memory_raster() {
        let mut r = Raster::create_in_memory(&stats_3x4()).unwrap();
        assert_eq!(r.path, PathBuf::new());
        assert_eq!(r.dataset.geo_transform().unwrap(), [0.0, 1.0, 0.0, 3.0, 0.0, -1.0]);

        r.write_block((2, 1), &array![[5., 6.], [7., 8.]]).unwrap();

        let m = r.materialize().unwrap();
        assert_eq!(array![[0., 0., 0., 0.], [0., 0., 5., 6.], [0., 0., 7., 8.]], m.data);

        assert!(matches!(r.write_block((3, 0), &array![[1., 1.]]), Err(GeoUtilError::Resource(_))));
    }

    #[test]
    fn test_mem_raster_shape_mismatch() {
        let r = MemRaster::new(stats_3x4(), Array2::zeros((4, 3)));
        assert!(r.is_err());
    }
}
