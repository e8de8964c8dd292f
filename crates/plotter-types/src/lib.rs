//! Shared types for the plotter panel
//!
//! This crate contains the data model shared between the control logic and
//! the WASM bridge: vectors, device metadata, machine status snapshots, and
//! the wire-level request bodies. Field names on serde structs match the
//! device's JSON surface exactly.

use serde::{Deserialize, Serialize};

pub mod errors;

pub use errors::{PanelError, PanelResult};

/// 2D vector used for both pixel-space and millimeter-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 3D vector, used for the machine position reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Device geometry fetched from the `metadata` endpoint.
///
/// Replaced wholesale on every successful refresh; a cache generation never
/// mixes fields from two fetches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    /// Physical travel area of the plotter, in millimeters.
    pub workspace_size_mm: Vec2,
    /// Physical size of one preview pixel, in millimeters.
    pub pixel_size_mm: Vec2,
    /// Resolution of the preview image the device emits.
    pub output_resolution: Vec2,
    /// On-canvas pixel location of physical millimeter {0,0}.
    pub original_point_coordinates: Vec2,
    /// Per-axis pixels-per-millimeter scale factors.
    pub xy_factors: Vec2,
}

impl DeviceMetadata {
    /// Coordinate conversion divides by the scale factors; a zero on either
    /// axis means the metadata cannot back a mapper.
    pub fn has_valid_scale(&self) -> bool {
        self.xy_factors.x != 0.0 && self.xy_factors.y != 0.0
    }
}

/// Transient machine state, sourced from the response headers that accompany
/// each preview image. Overwritten on every successful poll.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotterStatus {
    pub state: String,
    pub position: Vec3,
}

/// How a requested move combines with the current target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveType {
    Absolute,
    Incremental,
}

/// Body of a POST to the `move` endpoint.
///
/// Incremental accumulation happens client-side; the device only ever sees
/// absolute targets, so `move_type` is always `Absolute` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub move_type: MoveType,
    pub position: Vec2,
    pub feed: f64,
}

impl MoveRequest {
    pub fn absolute(position: Vec2, feed: f64) -> Self {
        Self {
            move_type: MoveType::Absolute,
            position,
            feed,
        }
    }
}

/// Body of a POST to the `zero` endpoint: which axes to re-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeroRequest {
    pub x_flag: bool,
    pub y_flag: bool,
    pub z_flag: bool,
}

impl ZeroRequest {
    pub fn all_axes() -> Self {
        Self {
            x_flag: true,
            y_flag: true,
            z_flag: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_request_wire_shape() {
        let req = MoveRequest::absolute(Vec2::new(50.0, 100.0), 1000.0);
        let json: serde_json::Value = serde_json::to_value(req).unwrap();

        assert_eq!(json["move_type"], "absolute");
        assert_eq!(json["position"]["x"], 50.0);
        assert_eq!(json["position"]["y"], 100.0);
        assert_eq!(json["feed"], 1000.0);
    }

    #[test]
    fn metadata_deserializes_device_field_names() {
        let body = r#"{
            "workspace_size_mm": {"x": 200.0, "y": 150.0},
            "pixel_size_mm": {"x": 0.5, "y": 0.5},
            "output_resolution": {"x": 1000, "y": 500},
            "original_point_coordinates": {"x": 50.0, "y": 50.0},
            "xy_factors": {"x": 2.0, "y": 2.0}
        }"#;

        let meta: DeviceMetadata = serde_json::from_str(body).unwrap();
        assert_eq!(meta.workspace_size_mm, Vec2::new(200.0, 150.0));
        assert_eq!(meta.original_point_coordinates, Vec2::new(50.0, 50.0));
        assert!(meta.has_valid_scale());
    }

    #[test]
    fn zero_scale_is_invalid() {
        let meta = DeviceMetadata {
            workspace_size_mm: Vec2::new(200.0, 150.0),
            pixel_size_mm: Vec2::default(),
            output_resolution: Vec2::default(),
            original_point_coordinates: Vec2::default(),
            xy_factors: Vec2::new(0.0, 2.0),
        };
        assert!(!meta.has_valid_scale());
    }

    #[test]
    fn zero_request_serializes_flags() {
        let json = serde_json::to_string(&ZeroRequest::all_axes()).unwrap();
        assert_eq!(json, r#"{"x_flag":true,"y_flag":true,"z_flag":true}"#);
    }
}
