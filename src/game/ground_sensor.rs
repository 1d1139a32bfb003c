use nalgebra::Vector3;

use super::backend::{PhysicsBackend, SweepQuery};
use super::constants::sensor as sensor_consts;

/// Contact sample taken once per step for a capsule body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactSample {
    pub ground: bool,
    pub ceiling: bool,
}

/// Sweeps a sphere down from the bottom of the capsule and up from its top.
///
/// The body origin sits at the feet, so the bottom hemisphere center is one
/// radius above it and the top hemisphere center one radius below the head.
/// This is a pure query; transition detection belongs to the caller.
#[derive(Debug, Clone, Copy)]
pub struct GroundSensor {
    radius: f32,
    height: f32,
    probe_distance: f32,
}

impl GroundSensor {
    pub fn new(radius: f32, height: f32, probe_distance: f32) -> Self {
        Self {
            radius,
            height,
            probe_distance,
        }
    }

    /// Follows collider resizes (crouch).
    pub fn set_height(&mut self, height: f32) {
        self.height = height;
    }

    pub fn probe<B: PhysicsBackend>(&self, backend: &B, body: B::Body) -> ContactSample {
        let Some(feet) = backend.body_position(body) else {
            return ContactSample::default();
        };
        ContactSample {
            ground: self.sweep(backend, body, self.bottom_center(feet), -Vector3::y(), self.probe_distance),
            ceiling: self.sweep(backend, body, self.top_center(feet), Vector3::y(), self.probe_distance),
        }
    }

    /// True when a capsule standing `extra_height` taller would fit.
    pub fn has_headroom<B: PhysicsBackend>(&self, backend: &B, body: B::Body, extra_height: f32) -> bool {
        let Some(feet) = backend.body_position(body) else {
            return false;
        };
        if extra_height <= 0.0 {
            return true;
        }
        !self.sweep(backend, body, self.top_center(feet), Vector3::y(), extra_height)
    }

    fn bottom_center(&self, feet: Vector3<f32>) -> Vector3<f32> {
        feet + Vector3::y() * self.radius
    }

    fn top_center(&self, feet: Vector3<f32>) -> Vector3<f32> {
        feet + Vector3::y() * (self.height - self.radius)
    }

    fn sweep<B: PhysicsBackend>(
        &self,
        backend: &B,
        body: B::Body,
        origin: Vector3<f32>,
        direction: Vector3<f32>,
        distance: f32,
    ) -> bool {
        backend.sweep_sphere(&SweepQuery {
            origin,
            radius: self.radius * sensor_consts::PROBE_RADIUS_SCALE,
            direction,
            distance,
            exclude: Some(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testing::FakeBackend;

    #[test]
    fn test_probe_geometry() {
        let mut backend = FakeBackend::new();
        let body = backend.add_body(Vector3::new(2.0, 1.0, 0.0));
        let sensor = GroundSensor::new(0.5, 2.0, 0.1);

        sensor.probe(&backend, body);

        let sweeps = backend.sweeps.borrow();
        assert_eq!(sweeps.len(), 2);
        let down = sweeps[0];
        assert_eq!(down.origin, Vector3::new(2.0, 1.5, 0.0));
        assert_eq!(down.direction, -Vector3::y());
        assert!((down.radius - 0.45).abs() < 1e-6);
        assert_eq!(down.distance, 0.1);
        assert_eq!(down.exclude, Some(body));
        let up = sweeps[1];
        assert_eq!(up.origin, Vector3::new(2.0, 2.5, 0.0));
        assert_eq!(up.direction, Vector3::y());
    }

    #[test]
    fn test_probe_reports_backend_hits() {
        let mut backend = FakeBackend::new();
        let body = backend.add_body(Vector3::zeros());
        let sensor = GroundSensor::new(0.5, 2.0, 0.1);

        assert_eq!(sensor.probe(&backend, body), ContactSample { ground: false, ceiling: false });
        backend.ground = true;
        assert_eq!(sensor.probe(&backend, body), ContactSample { ground: true, ceiling: false });
        backend.ceiling = true;
        assert_eq!(sensor.probe(&backend, body), ContactSample { ground: true, ceiling: true });
    }

    #[test]
    fn test_missing_body_is_a_miss() {
        let backend = FakeBackend::new();
        let sensor = GroundSensor::new(0.5, 2.0, 0.1);
        assert_eq!(sensor.probe(&backend, 7), ContactSample::default());
        assert!(!sensor.has_headroom(&backend, 7, 1.0));
    }

    #[test]
    fn test_headroom_uses_ceiling_sweep() {
        let mut backend = FakeBackend::new();
        let body = backend.add_body(Vector3::zeros());
        let sensor = GroundSensor::new(0.5, 1.0, 0.1);

        assert!(sensor.has_headroom(&backend, body, 1.0));
        backend.ceiling = true;
        assert!(!sensor.has_headroom(&backend, body, 1.0));
        assert_eq!(backend.sweeps.borrow().last().unwrap().distance, 1.0);
    }
}
