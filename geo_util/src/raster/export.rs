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
use std::fs::{remove_file, rename};
use std::path::{Path, PathBuf};
use std::time::Instant;

use gdal::{Dataset, DriverManager};
use gdal::raster::GdalDataType;
use log::{debug, info, warn};

use crate::{config_err, resource_err};
use crate::errors::{GeoUtilError, Result};
use crate::raster::{creation_options, prepare_output, Raster, RasterSource, RasterStats, DEFAULT_CHUNK_SIZE,
                    DEFAULT_NO_DATA, GTIFF_DRIVER};
use crate::util::{format_duration, ProgressTicker, RasterBlockIterator};

pub const DEFAULT_NUM_WORKERS: usize = 16;

// GeoTIFF tiles must be a multiple of 16
const TILE_MULTIPLE: usize = 16;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub chunk_size: usize,
    pub num_workers: usize,
    pub no_data_value: f64,
    pub overwrite: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
            num_workers: DEFAULT_NUM_WORKERS,
            no_data_value: DEFAULT_NO_DATA,
            overwrite: false,
        }
    }
}

pub fn check_chunk_size(chunk_size: usize, stats: &RasterStats) -> Result<()> {
    if chunk_size == 0 || chunk_size % TILE_MULTIPLE != 0 {
        return Err(config_err!("Chunk size {} must be a positive multiple of {}", chunk_size, TILE_MULTIPLE));
    }
    if chunk_size > stats.num_cols || chunk_size > stats.num_rows {
        return Err(resource_err!("Chunk size {} is larger than the raster ({}x{} cols x rows), decrease the chunk size",
            chunk_size, stats.num_cols, stats.num_rows));
    }
    Ok(())
}

/// `<stem>_temp.<ext>` next to `path`
pub fn temp_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}_temp.{}", stem, ext.to_string_lossy()),
        None => format!("{}_temp", stem),
    };
    path.with_file_name(file_name)
}

/// Writes `source` as a tiled Float32 GeoTIFF block by block, source no data becomes the
/// export no data value.  The file is then recompressed with LZW into a temporary file which
/// replaces the original.
pub fn export_raster<S>(source: &S, path: &Path, options: &ExportOptions) -> Result<RasterStats>
where S: RasterSource + ?Sized
{
    let source_stats = source.stats();

    check_chunk_size(options.chunk_size, source_stats)?;
    prepare_output(path, options.overwrite)?;

    let stats = RasterStats {
        no_data_value: Some(options.no_data_value),
        data_type: GdalDataType::Float32,
        ..source_stats.clone()
    };

    let tiling = vec![
        "TILED=YES".to_string(),
        format!("BLOCKXSIZE={}", options.chunk_size),
        format!("BLOCKYSIZE={}", options.chunk_size),
        format!("NUM_THREADS={}", options.num_workers),
    ];

    let now = Instant::now();
    {
        let mut output = Raster::create(path, &stats, &creation_options(&tiling)?)?;

        let mut ticker = ProgressTicker::new(3);

        for block in RasterBlockIterator::new(stats.num_rows, stats.num_cols, options.chunk_size) {
            let data = source.read_block(block.window_offset, block.window_size)?;
            let data = data.mapv(|v| if source_stats.is_nodata(v) { options.no_data_value as f32 } else { v as f32 });

            output.write_block_as(block.window_offset, &data)?;

            ticker.tick(block.current_step + 1, block.num_steps, "Writing blocks");
        }
    }
    info!("Wrote {:?} in {}", path, format_duration(now.elapsed()));

    let now = Instant::now();
    compress_in_place(path, &tiling)?;
    info!("Compressed {:?} in {}", path, format_duration(now.elapsed()));

    Ok(stats)
}

/// Copies to the temporary path with LZW and BigTIFF, then renames over `path`
pub fn compress_in_place(path: &Path, extra_options: &[String]) -> Result<()> {
    let temp = temp_path(path);
    debug!("Compressing {:?} via {:?}", path, temp);

    let mut options = vec!["COMPRESS=LZW".to_string(), "BIGTIFF=YES".to_string()];
    options.extend_from_slice(extra_options);

    let result = copy_compressed(path, &temp, &options)
        .and_then(|_| rename(&temp, path).map_err(|e| GeoUtilError::io(path, e)));

    if result.is_err() && temp.exists() {
        debug!("Removing partial copy {:?}", temp);
        if let Err(e) = remove_file(&temp) {
            warn!("Could not remove {:?}: {}", temp, e);
        }
    }

    result
}

fn copy_compressed(path: &Path, temp: &Path, options: &[String]) -> Result<()> {
    let dataset = Dataset::open(path)?;
    let driver = DriverManager::get_driver_by_name(GTIFF_DRIVER)?;
    dataset.create_copy(&driver, temp, &creation_options(options)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdal::Metadata;
    use ndarray::Array2;
    use crate::raster::{get_temp_filename, srs_from_epsg, srs_from_wkt, MemRaster};

    fn source(num_cols: usize, num_rows: usize) -> MemRaster {
        let wkt = srs_from_epsg(3035).unwrap().to_wkt().unwrap();
        let stats = RasterStats::new(4000000.0, 3000000.0, 10.0, -10.0, num_rows, num_cols,
                                     Some(-1.0), GdalDataType::Float64, &wkt);
        let data = Array2::from_shape_fn((num_rows, num_cols), |(r, c)| {
            if r == c { -1.0 } else { (r * num_cols + c) as f64 / 7.0 }
        });
        MemRaster::new(stats, data).unwrap()
    }

    #[test]
    fn test_export_round_trip() {
        let src = source(40, 35);
        let path = get_temp_filename("export.tif");
        let options = ExportOptions { chunk_size: 16, num_workers: 2, ..Default::default() };

        let stats = export_raster(&src, &path, &options).unwrap();
        assert_eq!(stats.no_data_value, Some(DEFAULT_NO_DATA));
        assert!(!temp_path(&path).exists());

        let r = Raster::read(&path).unwrap();
        r.stats.assert_equals_except_no_data(&src.stats);
        assert_eq!(r.stats.no_data_value, Some(DEFAULT_NO_DATA));
        assert_eq!(r.stats.data_type, GdalDataType::Float32);
        assert_eq!(srs_from_wkt(&r.stats.projection).unwrap().auth_code().unwrap(), 3035);

        let read = r.materialize().unwrap().data;
        for ((idx, v), expected) in read.indexed_iter().zip(src.data.iter()) {
            if idx.0 == idx.1 {
                assert_eq!(*v, DEFAULT_NO_DATA);
            } else {
                assert_eq!(*v as f32, *expected as f32);
            }
        }

        let ds = Dataset::open(&path).unwrap();
        let compression = ds.metadata_item("COMPRESSION", "IMAGE_STRUCTURE");
        assert_eq!(compression.as_deref(), Some("LZW"));
        assert_eq!(ds.rasterband(1).unwrap().block_size(), (16, 16));
    }

    #[test]
    fn test_existing_output() {
        let src = source(16, 16);
        let path = get_temp_filename("existing.tif");
        let options = ExportOptions { chunk_size: 16, ..Default::default() };

        export_raster(&src, &path, &options).unwrap();
        assert!(matches!(export_raster(&src, &path, &options), Err(GeoUtilError::Configuration(_))));

        export_raster(&src, &path, &ExportOptions { overwrite: true, ..options }).unwrap();
    }

    #[test]
    fn test_chunk_size_checks() {
        let src = source(40, 20);
        let path = get_temp_filename("chunks.tif");

        for (chunk_size, is_config) in [(0, true), (24, true), (32, false), (48, false)] {
            let r = export_raster(&src, &path, &ExportOptions { chunk_size, ..Default::default() });
            if is_config {
                assert!(matches!(r, Err(GeoUtilError::Configuration(_))), "chunk {}", chunk_size);
            } else {
                assert!(matches!(r, Err(GeoUtilError::Resource(_))), "chunk {}", chunk_size);
            }
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_compress_leaves_no_temp() {
        let path = get_temp_filename("not_a_raster.tif");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not a tiff").unwrap();

        let temp = temp_path(&path);
        std::fs::write(&temp, "stale").unwrap();

        assert!(compress_in_place(&path, &[]).is_err());
        assert!(!temp.exists());
        assert!(path.exists());
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(temp_path(Path::new("/a/b/out.tif")), PathBuf::from("/a/b/out_temp.tif"));
        assert_eq!(temp_path(Path::new("out")), PathBuf::from("out_temp"));
    }
}
