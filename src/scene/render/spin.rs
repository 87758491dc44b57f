use glam::{Mat4, Quat};

const RATE: f64 = 0.001;
const STEP: f64 = 0.01;

/// Slow wobbling rotation applied to the whole model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    rotation: Quat,
}

impl Default for Spin {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
        }
    }
}

impl Spin {
    /// Advance by one step for a frame drawn at `now_ms`.
    pub fn advance(&mut self, now_ms: f64) {
        let phase = now_ms * RATE;
        let about_x = Quat::from_rotation_x(((phase).sin() * STEP) as f32);
        let about_y = Quat::from_rotation_y(((phase).cos() * STEP) as f32);
        self.rotation = (self.rotation * about_x * about_y).normalize();
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_at_time_zero_turns_about_y_only() {
        let mut spin = Spin::default();
        spin.advance(0.0);

        let expected = Quat::from_rotation_y(0.01);
        assert!(spin.rotation().angle_between(expected) < 1e-6);
    }

    #[test]
    fn steps_accumulate() {
        let mut spin = Spin::default();
        for frame in 0..10 {
            spin.advance(f64::from(frame) * 16.0);
        }
        assert!(spin.rotation().angle_between(Quat::IDENTITY) > 0.05);
    }
}
