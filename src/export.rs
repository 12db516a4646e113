// raster, mosaic and vector output for checkpoints and the final result

use image::{imageops, Rgb, RgbImage};
use std::path::Path;
use svg::node::element::{Polygon as SvgPolygon, Rectangle};
use svg::Document;

use crate::dna::Genome;
use crate::error::ExportError;
use crate::render::Raster;

/// longest side of one mosaic tile
pub const THUMBNAIL_MAX: u32 = 200;

pub fn to_image(raster: &Raster) -> Result<RgbImage, ExportError> {
    RgbImage::from_raw(raster.width, raster.height, raster.to_rgb()).ok_or(ExportError::Raster {
        width: raster.width,
        height: raster.height,
    })
}

/// write a raster as PNG (format from the extension)
pub fn save_raster(raster: &Raster, path: &Path) -> Result<(), ExportError> {
    profiling::scope!("save_raster");
    to_image(raster)?.save(path)?;
    Ok(())
}

/// every raster as a thumbnail on a two-row sheet: even indices on the top
/// row, odd ones below, in order.
pub fn mosaic(rasters: &[&Raster]) -> Result<RgbImage, ExportError> {
    profiling::scope!("mosaic");
    let Some(first) = rasters.first() else {
        return Ok(RgbImage::new(1, 1));
    };
    let longest = first.width.max(first.height).max(1);
    let scale = (THUMBNAIL_MAX as f64 / longest as f64).min(1.0);
    let tw = ((first.width as f64 * scale).round() as u32).max(1);
    let th = ((first.height as f64 * scale).round() as u32).max(1);

    let rows = if rasters.len() > 1 { 2 } else { 1 };
    let cols = rasters.len().div_ceil(2) as u32;
    let mut sheet = RgbImage::from_pixel(cols * tw, rows * th, Rgb([255, 255, 255]));
    for (i, raster) in rasters.iter().enumerate() {
        let img = to_image(raster)?;
        let thumb = if (img.width(), img.height()) == (tw, th) {
            img
        } else {
            imageops::resize(&img, tw, th, imageops::FilterType::Triangle)
        };
        let (col, row) = ((i / 2) as u32, (i % 2) as u32);
        imageops::replace(&mut sheet, &thumb, (col * tw) as i64, (row * th) as i64);
    }
    Ok(sheet)
}

pub fn save_mosaic(rasters: &[&Raster], path: &Path) -> Result<(), ExportError> {
    mosaic(rasters)?.save(path)?;
    Ok(())
}

/// vector form of a genome: a background rect plus one polygon per slot, in paint order
pub fn svg_document(genome: &Genome, scale: f32) -> Document {
    let (w, h) = (genome.width as f32 * scale, genome.height as f32 * scale);
    let [r, g, b] = genome.background;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0u32, 0u32, genome.width, genome.height))
        .add(
            Rectangle::new()
                .set("width", genome.width)
                .set("height", genome.height)
                .set("fill", format!("rgb({r},{g},{b})")),
        );

    for poly in &genome.polys {
        let points = poly
            .points
            .iter()
            .map(|(x, y)| format!("{x},{y}"))
            .collect::<Vec<_>>()
            .join(" ");
        let [r, g, b, a] = poly.rgba;
        doc = doc.add(
            SvgPolygon::new()
                .set("points", points)
                .set("fill", format!("rgb({r},{g},{b})"))
                .set("fill-opacity", a as f32 / 255.0)
                .set("stroke", "none"),
        );
    }
    doc
}

pub fn save_svg(genome: &Genome, scale: f32, path: &Path) -> Result<(), ExportError> {
    profiling::scope!("save_svg");
    svg::save(path, &svg_document(genome, scale))?;
    Ok(())
}
