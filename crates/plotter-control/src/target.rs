//! Client-side tracking of the commanded target position.

use crate::mapper::CoordinateMapper;
use plotter_types::{MoveType, Vec2};

/// The current target in both representations: millimeters for transmission
/// and pixels for rendering the overlay marker.
///
/// Both fields are recomputed inside a single `apply` call, so after any
/// update `point_px == mapper.to_pixels(position_mm)` for the mapper that was
/// passed in. Callers commit updates synchronously, before any await point;
/// overlapping gestures therefore land in issue order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TargetTracker {
    position_mm: Vec2,
    point_px: Vec2,
}

impl TargetTracker {
    /// Combine `delta` with the current target and re-project the pixel
    /// representation. Returns the new millimeter target.
    pub fn apply(&mut self, mode: MoveType, delta: Vec2, mapper: &CoordinateMapper) -> Vec2 {
        self.position_mm = match mode {
            MoveType::Absolute => delta,
            MoveType::Incremental => {
                Vec2::new(self.position_mm.x + delta.x, self.position_mm.y + delta.y)
            }
        };
        self.point_px = mapper.to_pixels(self.position_mm);
        self.position_mm
    }

    /// Set the target directly from a canvas click, deriving millimeters from
    /// the clicked pixel instead of the other way around.
    pub fn set_from_pixels(&mut self, px: Vec2, mapper: &CoordinateMapper) -> Vec2 {
        self.point_px = px;
        self.position_mm = mapper.to_millimeters(px);
        self.position_mm
    }

    /// Re-project the pixel representation after a metadata change without
    /// moving the millimeter target.
    pub fn reproject(&mut self, mapper: &CoordinateMapper) {
        self.point_px = mapper.to_pixels(self.position_mm);
    }

    pub fn position_mm(&self) -> Vec2 {
        self.position_mm
    }

    pub fn point_px(&self) -> Vec2 {
        self.point_px
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotter_types::DeviceMetadata;

    fn mapper() -> CoordinateMapper {
        let meta = DeviceMetadata {
            workspace_size_mm: Vec2::new(200.0, 150.0),
            pixel_size_mm: Vec2::new(0.5, 0.5),
            output_resolution: Vec2::new(1000.0, 500.0),
            original_point_coordinates: Vec2::new(50.0, 50.0),
            xy_factors: Vec2::new(2.0, 2.0),
        };
        CoordinateMapper::from_metadata(&meta).unwrap()
    }

    #[test]
    fn incremental_moves_accumulate() {
        let m = mapper();
        let mut target = TargetTracker::default();
        target.apply(MoveType::Absolute, Vec2::new(10.0, 10.0), &m);

        target.apply(MoveType::Incremental, Vec2::new(5.0, -2.0), &m);
        let final_mm = target.apply(MoveType::Incremental, Vec2::new(5.0, -2.0), &m);

        assert_eq!(final_mm, Vec2::new(20.0, 6.0));
    }

    #[test]
    fn representations_stay_in_lockstep() {
        let m = mapper();
        let mut target = TargetTracker::default();

        target.apply(MoveType::Absolute, Vec2::new(50.0, 100.0), &m);
        assert_eq!(target.point_px(), m.to_pixels(target.position_mm()));

        target.set_from_pixels(Vec2::new(150.0, 250.0), &m);
        assert_eq!(target.position_mm(), Vec2::new(50.0, 100.0));
        assert_eq!(target.point_px(), Vec2::new(150.0, 250.0));
    }

    #[test]
    fn reproject_keeps_millimeters_fixed() {
        let m = mapper();
        let mut target = TargetTracker::default();
        target.apply(MoveType::Absolute, Vec2::new(25.0, 30.0), &m);

        let before = target.position_mm();
        target.reproject(&m);
        assert_eq!(target.position_mm(), before);
        assert_eq!(target.point_px(), m.to_pixels(before));
    }
}
