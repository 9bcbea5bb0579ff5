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
use gdal::vector::LayerAccess;
use geo::{BoundingRect, Geometry, Polygon};
use log::{debug, warn};

use crate::config_err;
use crate::errors::{GeoUtilError, Result};
use crate::vector::BoundingBox;

/// Polygons of one vector layer, multi polygons are flattened
#[derive(Debug, Clone, Default)]
pub struct PolygonSet {
    pub polygons: Vec<Polygon<f64>>,

    //WKT projection string, empty if the layer has none
    pub projection: String,
}

impl PolygonSet {
    pub fn new(polygons: Vec<Polygon<f64>>, projection: &str) -> Self {
        PolygonSet {
            polygons,
            projection: projection.to_string(),
        }
    }

    /// Reads every polygon of the first layer of an OGR data source
    pub fn read(vector_path: &Path) -> Result<PolygonSet> {
        if !vector_path.exists() {
            return Err(GeoUtilError::not_found(vector_path));
        }

        let dataset = Dataset::open(vector_path)?;

        if dataset.layer_count() == 0 {
            return Err(config_err!("{:?} does not contain any vector layer", vector_path));
        }

        let mut layer = dataset.layer(0)?;

        let projection = match layer.spatial_ref() {
            Some(srs) => srs.to_wkt()?,
            None => {
                warn!("Layer {} of {:?} has no spatial reference", layer.name(), vector_path);
                String::new()
            }
        };

        let mut polygons = Vec::new();
        let mut num_skipped = 0;

        for feature in layer.features() {
            let Some(gdal_geom) = feature.geometry() else {
                num_skipped += 1;
                continue;
            };

            match gdal_geom.to_geo()? {
                Geometry::Polygon(p) => polygons.push(p),
                Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
                other => {
                    debug!("Skipping non polygon geometry {:?}", other);
                    num_skipped += 1;
                }
            }
        }

        if num_skipped > 0 {
            warn!("Skipped {} features without polygon geometry in {:?}", num_skipped, vector_path);
        }

        debug!("Read {} polygons from {:?}", polygons.len(), vector_path);

        Ok(PolygonSet {
            polygons,
            projection,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Extent of all polygons together, None when there are none
    pub fn total_bounds(&self) -> Option<BoundingBox> {
        self.polygons.iter()
            .filter_map(|p| p.bounding_rect())
            .map(BoundingBox::from)
            .reduce(|acc, b| acc.union(&b))
    }
}
