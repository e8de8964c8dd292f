//! Workspace boundary policy for commanded targets.

use plotter_types::{PanelError, PanelResult, Vec2};

/// Decides whether a millimeter target may be forwarded to the device.
///
/// With enforcement disabled every target passes and the device firmware is
/// the last line of defense.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryValidator {
    workspace_size_mm: Vec2,
    enabled: bool,
}

impl BoundaryValidator {
    pub fn new(workspace_size_mm: Vec2, enabled: bool) -> Self {
        Self {
            workspace_size_mm,
            enabled,
        }
    }

    /// Inclusive on both edges: `{0,0}` and the full workspace corner are
    /// valid targets.
    pub fn is_within_workspace(&self, mm: Vec2) -> bool {
        mm.x >= 0.0
            && mm.y >= 0.0
            && mm.x <= self.workspace_size_mm.x
            && mm.y <= self.workspace_size_mm.y
    }

    pub fn validate(&self, mm: Vec2) -> PanelResult<()> {
        if !self.enabled || self.is_within_workspace(mm) {
            return Ok(());
        }
        Err(PanelError::validation(format!(
            "Out of workspace boundary: ({:.3}, {:.3}) mm outside {} x {} mm",
            mm.x, mm.y, self.workspace_size_mm.x, self.workspace_size_mm.y
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(enabled: bool) -> BoundaryValidator {
        BoundaryValidator::new(Vec2::new(200.0, 150.0), enabled)
    }

    #[test]
    fn bounds_are_inclusive() {
        let v = validator(true);
        assert!(v.validate(Vec2::new(0.0, 0.0)).is_ok());
        assert!(v.validate(Vec2::new(200.0, 150.0)).is_ok());
    }

    #[test]
    fn out_of_bounds_rejected_when_enabled() {
        let v = validator(true);
        assert!(v.validate(Vec2::new(200.01, 0.0)).is_err());
        assert!(v.validate(Vec2::new(-0.01, 0.0)).is_err());
    }

    #[test]
    fn everything_passes_when_disabled() {
        let v = validator(false);
        assert!(v.validate(Vec2::new(200.01, 0.0)).is_ok());
        assert!(v.validate(Vec2::new(-0.01, 0.0)).is_ok());
        assert!(v.validate(Vec2::new(-5000.0, 9000.0)).is_ok());
    }

    #[test]
    fn rejection_reason_is_human_readable() {
        let err = validator(true)
            .validate(Vec2::new(250.0, 10.0))
            .unwrap_err();
        assert!(err.to_string().contains("Out of workspace boundary"));
    }
}
