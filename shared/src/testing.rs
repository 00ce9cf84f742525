//! In-memory [`PhysicsBackend`] for unit and scenario tests.
//!
//! Bodies are points with a radius over an optional infinite ground plane.
//! Every command is logged so tests can assert on exactly what a component
//! applied; [`MockPhysics::step`] integrates with semi-implicit Euler.

use rapier3d::prelude::RigidBodyHandle;

use crate::math::{Quat, Vec3};
use crate::physics::{
    BodyHandle, ForceMode, LayerMask, PhysicsBackend, ProjectileDesc, SphereCast, SphereCastHit,
};

#[derive(Clone, Debug, PartialEq)]
pub struct MockBody {
    pub position: Vec3,
    pub rotation: Quat,
    pub linvel: Vec3,
    pub angvel: Vec3,
    pub mass: f32,
    pub radius: f32,
    force: Vec3,
    torque: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AppliedForce {
    pub body: BodyHandle,
    pub force: Vec3,
    pub mode: ForceMode,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnedProjectile {
    pub body: BodyHandle,
    pub position: Vec3,
    pub rotation: Quat,
}

#[derive(Debug, Default)]
pub struct MockPhysics {
    bodies: Vec<(BodyHandle, MockBody)>,
    next_index: u32,
    ground: Option<(f32, LayerMask)>,
    pub forces: Vec<AppliedForce>,
    pub torques: Vec<(BodyHandle, Vec3)>,
    pub projectiles: Vec<SpawnedProjectile>,
}

impl MockPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// World with a horizontal ground plane at `height` on layer 0.
    pub fn with_ground(height: f32) -> Self {
        Self {
            ground: Some((height, LayerMask::layer(0))),
            ..Self::default()
        }
    }

    pub fn add_body(&mut self, position: Vec3, mass: f32, radius: f32) -> BodyHandle {
        let handle = RigidBodyHandle::from_raw_parts(self.next_index, 0);
        self.next_index += 1;
        self.bodies.push((
            handle,
            MockBody {
                position,
                rotation: Quat::identity(),
                linvel: Vec3::zeros(),
                angvel: Vec3::zeros(),
                mass,
                radius,
                force: Vec3::zeros(),
                torque: Vec3::zeros(),
            },
        ));
        handle
    }

    pub fn remove_body(&mut self, body: BodyHandle) -> bool {
        let before = self.bodies.len();
        self.bodies.retain(|(h, _)| *h != body);
        before != self.bodies.len()
    }

    pub fn body(&self, body: BodyHandle) -> Option<&MockBody> {
        self.bodies.iter().find(|(h, _)| *h == body).map(|(_, b)| b)
    }

    fn body_mut(&mut self, body: BodyHandle) -> Option<&mut MockBody> {
        self.bodies
            .iter_mut()
            .find(|(h, _)| *h == body)
            .map(|(_, b)| b)
    }

    pub fn set_position(&mut self, body: BodyHandle, position: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.position = position;
        }
    }

    pub fn set_rotation(&mut self, body: BodyHandle, rotation: Quat) {
        if let Some(b) = self.body_mut(body) {
            b.rotation = rotation;
        }
    }

    pub fn set_angular_velocity(&mut self, body: BodyHandle, angvel: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.angvel = angvel;
        }
    }

    /// Forget logged commands without touching body state.
    pub fn clear_log(&mut self) {
        self.forces.clear();
        self.torques.clear();
        self.projectiles.clear();
    }

    /// Sum of every logged force-mode vector applied to `body` with `mode`.
    pub fn total_applied(&self, body: BodyHandle, mode: ForceMode) -> Vec3 {
        self.forces
            .iter()
            .filter(|f| f.body == body && f.mode == mode)
            .fold(Vec3::zeros(), |acc, f| acc + f.force)
    }

    /// Integrates accumulated forces over `dt`, then resolves ground contact
    /// by clamping bodies above the plane.
    pub fn step(&mut self, dt: f32) {
        let ground = self.ground;
        for (_, b) in self.bodies.iter_mut() {
            if b.mass > 0.0 {
                b.linvel += b.force / b.mass * dt;
                b.angvel += b.torque / b.mass * dt;
            }
            b.position += b.linvel * dt;
            if let Some(axis) = (b.angvel * dt).try_normalize(1.0e-9) {
                let angle = b.angvel.norm() * dt;
                b.rotation =
                    Quat::from_axis_angle(&nalgebra::Unit::new_unchecked(axis), angle) * b.rotation;
            }
            if let Some((height, _)) = ground {
                if b.position.y < height + b.radius {
                    b.position.y = height + b.radius;
                    b.linvel.y = b.linvel.y.max(0.0);
                }
            }
            b.force = Vec3::zeros();
            b.torque = Vec3::zeros();
        }
    }
}

impl PhysicsBackend for MockPhysics {
    fn position(&self, body: BodyHandle) -> Option<Vec3> {
        self.body(body).map(|b| b.position)
    }

    fn rotation(&self, body: BodyHandle) -> Option<Quat> {
        self.body(body).map(|b| b.rotation)
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.body(body).map(|b| b.linvel)
    }

    fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.body(body).map(|b| b.angvel)
    }

    fn mass(&self, body: BodyHandle) -> Option<f32> {
        self.body(body).map(|b| b.mass)
    }

    fn collider_radius(&self, body: BodyHandle) -> Option<f32> {
        self.body(body).map(|b| b.radius)
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.linvel = velocity;
        }
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec3, mode: ForceMode) {
        let Some(b) = self.body_mut(body) else {
            return;
        };
        match mode {
            ForceMode::Force => b.force += force,
            ForceMode::Acceleration => b.force += force * b.mass,
            ForceMode::Impulse => {
                if b.mass > 0.0 {
                    b.linvel += force / b.mass;
                }
            }
            ForceMode::VelocityChange => b.linvel += force,
        }
        self.forces.push(AppliedForce { body, force, mode });
    }

    fn apply_torque(&mut self, body: BodyHandle, torque: Vec3) {
        let Some(b) = self.body_mut(body) else {
            return;
        };
        b.torque += torque;
        self.torques.push((body, torque));
    }

    fn sphere_cast(&self, cast: &SphereCast) -> Option<SphereCastHit> {
        let (height, layer) = self.ground?;
        if !cast.layer_mask.intersects(layer) || cast.direction.y >= 0.0 {
            return None;
        }
        let distance = (cast.origin.y - cast.radius - height) / -cast.direction.y;
        if !(0.0..=cast.max_distance).contains(&distance) {
            return None;
        }
        let center = cast.origin + cast.direction * distance;
        Some(SphereCastHit {
            distance,
            point: Vec3::new(center.x, height, center.z),
            normal: Vec3::y(),
        })
    }

    fn spawn_projectile(
        &mut self,
        desc: &ProjectileDesc,
        position: Vec3,
        rotation: Quat,
    ) -> Option<BodyHandle> {
        let body = self.add_body(position, desc.mass, desc.radius);
        self.set_rotation(body, rotation);
        self.projectiles.push(SpawnedProjectile {
            body,
            position,
            rotation,
        });
        Some(body)
    }
}
