//! Surface transform builder
//!
//! Builds the single matrix that maps a surface's unit quad onto an
//! output: translate to the surface centre, rotate, translate back, scale
//! to the device-pixel size, then apply the output's own projection and
//! rotation/flip.

use kurbo::Affine;

use crate::compositor::geometry::Rect;
use crate::compositor::{Output, OutputLayout};

/// Compose the surface matrix from output-local device coordinates.
///
/// `(ox, oy)` is the surface origin in device pixels of the output,
/// `width`/`height` its size in device pixels and `rotation` the view
/// rotation in radians about the surface centre.
pub fn surface_matrix(
    base: &Affine,
    ox: f64,
    oy: f64,
    width: i32,
    height: i32,
    rotation: f32,
) -> Affine {
    let half_width = f64::from(width) / 2.0;
    let half_height = f64::from(height) / 2.0;

    let translate_origin = Affine::translate((ox.round() + half_width, oy.round() + half_height));
    let rotate = Affine::rotate(f64::from(rotation));
    let translate_center = Affine::translate((-half_width, -half_height));
    let scale = Affine::scale_non_uniform(f64::from(width), f64::from(height));

    *base * translate_origin * rotate * translate_center * scale
}

/// Matrix for a surface of logical size `width` x `height` placed at
/// layout position `(lx, ly)` on `output`
pub fn surface_transform(
    output: &Output,
    layout: &OutputLayout,
    lx: f64,
    ly: f64,
    width: f64,
    height: f64,
    rotation: f32,
) -> Affine {
    let (ox, oy) = layout.output_coords(output.id, lx, ly);
    let render_width = (width * output.scale) as i32;
    let render_height = (height * output.scale) as i32;

    surface_matrix(
        &output.transform_matrix(),
        ox * output.scale,
        oy * output.scale,
        render_width,
        render_height,
        rotation,
    )
}

/// Layout-space bounding box of a surface rotated about its centre
pub fn rotated_bounds(lx: f64, ly: f64, width: f64, height: f64, rotation: f32) -> Rect {
    if rotation == 0.0 {
        return Rect::from_extent(lx, ly, lx + width, ly + height);
    }

    let (sin, cos) = f64::from(rotation).sin_cos();
    let half_width = (cos.abs() * width + sin.abs() * height) / 2.0;
    let half_height = (sin.abs() * width + cos.abs() * height) / 2.0;
    let (cx, cy) = (lx + width / 2.0, ly + height / 2.0);

    Rect::from_extent(cx - half_width, cy - half_height, cx + half_width, cy + half_height)
}
