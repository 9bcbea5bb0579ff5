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

use gdal::raster::RasterCreationOptions;
use ndarray::Array2;
use uuid::Uuid;

use crate::errors::Result;
use crate::raster::{Raster, RasterStats};

pub fn get_temp_filename(file_name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push("geo_util_tests");
    path.push(Uuid::new_v4().to_string());
    path.push(file_name);
    path
}

pub fn create_test_raster(in_file_name: &str, input_raster_stats: &RasterStats, input_raster_data: &Array2<f64>) -> Result<PathBuf> {
    create_test_raster_with_path(
        &get_temp_filename(in_file_name),
            input_raster_stats, input_raster_data)
}

pub fn create_test_raster_with_path(input_path: &Path, input_raster_stats: &RasterStats, input_raster_data: &Array2<f64>) -> Result<PathBuf> {

    assert!(!input_path.exists());

    {
        let mut raster = Raster::create(input_path, input_raster_stats, &RasterCreationOptions::new())?;
        raster.write_block_as((0, 0), input_raster_data)?;
    }

    assert!(input_path.exists());

    Ok(input_path.to_path_buf())
}
