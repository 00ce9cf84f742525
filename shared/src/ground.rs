use serde::{Deserialize, Serialize};

use crate::math::Vec3;
use crate::physics::{BodyHandle, LayerMask, PhysicsBackend, SphereCast};

/// Tuning for the downward ground probe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundCheckSettings {
    /// Probe sphere radius as a multiple of the body's collider radius.
    pub radius_multiplier: f32,
    pub ground_layer: LayerMask,
    /// Probe length; also the distance reported when nothing is hit (meters).
    /// Any hit within it counts as grounded.
    pub max_check_distance: f32,
}

impl Default for GroundCheckSettings {
    fn default() -> Self {
        Self {
            radius_multiplier: 1.5,
            ground_layer: LayerMask::layer(0),
            max_check_distance: 3.0,
        }
    }
}

/// Result of one ground probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundReading {
    pub is_grounded: bool,
    /// Distance the probe sphere travelled before touching ground.
    pub distance: f32,
    pub hit_point: Option<Vec3>,
}

impl GroundReading {
    pub fn airborne(max_distance: f32) -> Self {
        Self {
            is_grounded: false,
            distance: max_distance,
            hit_point: None,
        }
    }
}

/// Sphere-casts down from a body's center and remembers the last reading.
#[derive(Clone, Debug)]
pub struct GroundSensor {
    body: BodyHandle,
    settings: GroundCheckSettings,
    last: GroundReading,
    last_hit_point: Option<Vec3>,
}

impl GroundSensor {
    pub fn new(body: BodyHandle, settings: GroundCheckSettings) -> Self {
        let last = GroundReading::airborne(settings.max_check_distance);
        Self {
            body,
            settings,
            last,
            last_hit_point: None,
        }
    }

    /// Runs the probe. A missing body reads as airborne.
    pub fn check(&mut self, physics: &dyn PhysicsBackend) -> GroundReading {
        let max = self.settings.max_check_distance;
        let Some(origin) = physics.position(self.body) else {
            self.last = GroundReading::airborne(max);
            return self.last;
        };

        let radius = physics.collider_radius(self.body).unwrap_or(0.0) * self.settings.radius_multiplier;
        let hit = physics.sphere_cast(&SphereCast {
            origin,
            radius,
            direction: -Vec3::y(),
            max_distance: max,
            layer_mask: self.settings.ground_layer,
            exclude: Some(self.body),
        });

        self.last = match hit {
            Some(hit) if hit.distance <= max => {
                self.last_hit_point = Some(hit.point);
                GroundReading {
                    is_grounded: true,
                    distance: hit.distance,
                    hit_point: Some(hit.point),
                }
            }
            _ => GroundReading::airborne(max),
        };
        self.last
    }

    #[inline]
    pub fn reading(&self) -> GroundReading {
        self.last
    }

    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.last.is_grounded
    }

    #[inline]
    pub fn distance(&self) -> f32 {
        self.last.distance
    }

    /// Contact point of the most recent probe that hit anything. Kept across
    /// airborne readings for debug drawing.
    #[inline]
    pub fn last_hit_point(&self) -> Option<Vec3> {
        self.last_hit_point
    }

    pub fn settings(&self) -> &GroundCheckSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPhysics;

    #[test]
    fn reads_distance_to_ground() {
        let mut physics = MockPhysics::with_ground(0.0);
        let body = physics.add_body(Vec3::new(0.0, 2.0, 0.0), 1.0, 0.5);
        let mut sensor = GroundSensor::new(body, GroundCheckSettings::default());

        let reading = sensor.check(&physics);
        assert!(reading.is_grounded);
        // Probe radius 0.75 from a center at 2.0 touches y = 0 after 1.25 m.
        assert!((reading.distance - 1.25).abs() < 1.0e-5);
        assert_eq!(sensor.last_hit_point(), Some(Vec3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn out_of_range_reports_max_distance_and_keeps_last_hit() {
        let mut physics = MockPhysics::with_ground(0.0);
        let body = physics.add_body(Vec3::new(0.0, 2.0, 0.0), 1.0, 0.5);
        let mut sensor = GroundSensor::new(body, GroundCheckSettings::default());
        sensor.check(&physics);

        physics.set_position(body, Vec3::new(0.0, 10.0, 0.0));
        let reading = sensor.check(&physics);
        assert!(!reading.is_grounded);
        assert_eq!(reading.distance, 3.0);
        assert!(reading.hit_point.is_none());
        assert!(sensor.last_hit_point().is_some());
    }

    #[test]
    fn any_hit_within_probe_length_is_grounded() {
        let mut physics = MockPhysics::with_ground(0.0);
        // Center at 3.7 with a 0.75 probe: contact after 2.95 of 3.0 m.
        let body = physics.add_body(Vec3::new(0.0, 3.7, 0.0), 1.0, 0.5);
        let mut sensor = GroundSensor::new(body, GroundCheckSettings::default());

        let reading = sensor.check(&physics);
        assert!(reading.is_grounded);
        assert!((reading.distance - 2.95).abs() < 1.0e-5);
    }

    #[test]
    fn ignores_ground_outside_layer_mask() {
        let mut physics = MockPhysics::with_ground(0.0);
        let body = physics.add_body(Vec3::new(0.0, 1.0, 0.0), 1.0, 0.5);
        let settings = GroundCheckSettings {
            ground_layer: LayerMask::layer(5),
            ..GroundCheckSettings::default()
        };
        let mut sensor = GroundSensor::new(body, settings);
        assert!(!sensor.check(&physics).is_grounded);
    }
}
