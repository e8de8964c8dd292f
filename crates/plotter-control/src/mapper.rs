//! Bidirectional affine transform between canvas pixels and workspace
//! millimeters, parameterized by one metadata generation.

use plotter_types::{DeviceMetadata, PanelError, PanelResult, Vec2};

/// Pure px↔mm converter. Construction fails when the metadata carries a zero
/// scale factor, so a mapper in hand is proof the conversion is defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    origin_px: Vec2,
    xy_scale: Vec2,
}

impl CoordinateMapper {
    pub fn from_metadata(meta: &DeviceMetadata) -> PanelResult<Self> {
        if !meta.has_valid_scale() {
            return Err(PanelError::StaleMetadata);
        }
        Ok(Self {
            origin_px: meta.original_point_coordinates,
            xy_scale: meta.xy_factors,
        })
    }

    /// Millimeters to canvas pixels: `mm * scale + origin`, component-wise.
    pub fn to_pixels(&self, mm: Vec2) -> Vec2 {
        Vec2::new(
            mm.x * self.xy_scale.x + self.origin_px.x,
            mm.y * self.xy_scale.y + self.origin_px.y,
        )
    }

    /// Canvas pixels to millimeters: `(px - origin) / scale`, component-wise.
    pub fn to_millimeters(&self, px: Vec2) -> Vec2 {
        Vec2::new(
            (px.x - self.origin_px.x) / self.xy_scale.x,
            (px.y - self.origin_px.y) / self.xy_scale.y,
        )
    }
}
