#![allow(dead_code)]

//! Shared fixtures: synthetic rasters, GCP tables, overlay shapefiles and
//! job tables, all rooted in one scoped temporary directory.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use gdal::vector::{FieldValue, Geometry, LayerAccess, LayerOptions};
use gdal::DriverManager;
use gdal_sys::{OGRFieldType, OGRwkbGeometryType};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Geographic WGS84, so map coordinates in fixtures stay human-readable.
pub const TEST_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs";

pub struct TestEnv {
    pub root: PathBuf,
    _tmp: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        Self {
            root: tmp.path().to_path_buf(),
            _tmp: tmp,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// A blank single-band 100x100 GTiff with no georeferencing. The content
/// never matters to the pipeline, only the geometry attached to it.
pub fn write_plain_raster(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create raster parent");
    }
    let driver = DriverManager::get_driver_by_name("GTiff").expect("GTiff driver");
    let dataset = driver.create(path, 100, 100, 1).expect("create raster");
    drop(dataset);
}

/// 3x3 control point grid over the 100x100 fixture raster, linear mapping
/// pixel (x, y) -> (5.0 + x e-5, 45.001 - y e-5). Quadruples are in file
/// order `(map_x, map_y, source_x, raw_source_y)` with the raw Y negated
/// the way digitizers write it.
pub fn grid_gcps() -> Vec<(f64, f64, f64, f64)> {
    let mut points = Vec::new();
    for row in 0..3 {
        for col in 0..3 {
            let px = f64::from(col) * 50.0;
            let py = f64::from(row) * 50.0;
            points.push((5.0 + px * 1e-5, 45.001 - py * 1e-5, px, -py));
        }
    }
    points
}

/// Write a GCP table in the current `sourceX`/`sourceY` scheme, with the
/// leading CRS comment line real exports carry.
pub fn write_gcp_table(path: &Path, points: &[(f64, f64, f64, f64)]) {
    let mut table = String::from("#CRS: +proj=longlat +datum=WGS84 +no_defs\n");
    table.push_str("mapX,mapY,sourceX,sourceY,enable,dX,dY,residual\n");
    for (map_x, map_y, source_x, source_y) in points {
        table.push_str(&format!("{map_x},{map_y},{source_x},{source_y},1,0,0,0\n"));
    }
    write_file(path, table.as_bytes());
}

/// Write a GCP table in the older `pixelX`/`pixelY` scheme.
pub fn write_gcp_table_legacy(path: &Path, points: &[(f64, f64, f64, f64)]) {
    let mut table = String::from("mapX,mapY,pixelX,pixelY,enable\n");
    for (map_x, map_y, source_x, source_y) in points {
        table.push_str(&format!("{map_x},{map_y},{source_x},{source_y},1\n"));
    }
    write_file(path, table.as_bytes());
}

/// Overlay shapefile with the three name part fields and three point
/// features in raw digitizer coordinates (Y negated):
///
/// - `Rue` / - / `Haute` at `(10, -10)`, which the fixture GCP grid maps
///   to `(5.0001, 45.0009)`
/// - only `Basse`
/// - `Rue` / `du` / `Port`
pub fn write_overlay_shapefile(dir: &Path, base: &str) -> PathBuf {
    fs::create_dir_all(dir).expect("create shapefile dir");
    let path = dir.join(format!("{base}.shp"));
    let driver = DriverManager::get_driver_by_name("ESRI Shapefile").expect("shapefile driver");
    let mut dataset = driver.create_vector_only(&path).expect("create shapefile");
    let mut layer = dataset
        .create_layer(LayerOptions {
            name: base,
            ty: OGRwkbGeometryType::wkbPoint,
            ..LayerOptions::default()
        })
        .expect("create layer");
    layer
        .create_defn_fields(&[
            ("prefix1", OGRFieldType::OFTString),
            ("prefix2", OGRFieldType::OFTString),
            ("streetName", OGRFieldType::OFTString),
        ])
        .expect("create name fields");

    let features: [(&str, &[(&str, &str)]); 3] = [
        ("POINT (10 -10)", &[("prefix1", "Rue"), ("streetName", "Haute")]),
        ("POINT (30 -60)", &[("streetName", "Basse")]),
        (
            "POINT (80 -40)",
            &[("prefix1", "Rue"), ("prefix2", "du"), ("streetName", "Port")],
        ),
    ];
    for (wkt, fields) in features {
        let geometry = Geometry::from_wkt(wkt).expect("point wkt");
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        let values: Vec<FieldValue> = fields
            .iter()
            .map(|(_, value)| FieldValue::StringValue((*value).to_string()))
            .collect();
        layer
            .create_feature_fields(geometry, &names, &values)
            .expect("create feature");
    }
    drop(layer);
    drop(dataset);
    path
}

/// Zip every sidecar of `base` in `dir` into `zip_path`, members at the
/// archive root.
pub fn zip_shapefile(zip_path: &Path, dir: &Path, base: &str) {
    if let Some(parent) = zip_path.parent() {
        fs::create_dir_all(parent).expect("create zip parent");
    }
    let mut zip = ZipWriter::new(File::create(zip_path).expect("create zip"));
    for entry in fs::read_dir(dir).expect("read shapefile dir") {
        let entry = entry.expect("dir entry");
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(&format!("{base}.")) {
            continue;
        }
        let mut content = Vec::new();
        File::open(entry.path())
            .expect("open sidecar")
            .read_to_end(&mut content)
            .expect("read sidecar");
        zip.start_file(name, SimpleFileOptions::default())
            .expect("start member");
        zip.write_all(&content).expect("write member");
    }
    zip.finish().expect("finish zip");
}

/// Write a job table with the required header and the given data rows.
pub fn write_jobs_csv(path: &Path, rows: &[String]) {
    let mut table = String::from("source,gcp_file,id,ignore,numeros,numeros_output\n");
    for row in rows {
        table.push_str(row);
        table.push('\n');
    }
    write_file(path, table.as_bytes());
}

fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, content).expect("write fixture");
}
