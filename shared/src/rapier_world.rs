//! Rapier-backed physics world implementing [`PhysicsBackend`].
//!
//! Holds the full simulation pipeline (not just scene queries): static world
//! geometry built from [`WorldStaticDef`]s, dynamic bodies inserted at runtime,
//! and a fixed-step [`RapierPhysicsWorld::step`].
//!
//! Design notes
//! - Deterministic: statics are sorted by `id` before insertion.
//! - Layers map onto collider collision-group memberships (bit `n` = layer `n`).
//! - Forces added through the backend last exactly one step; accumulators are
//!   reset after every `step`.

// Re-export Rapier so downstream crates can use Rapier types without depending
// on `rapier3d` directly.
pub use rapier3d;

use std::collections::HashMap;

use rapier3d::geometry::{Group, InteractionGroups};
use rapier3d::na::Translation3;
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::prelude::*;

use crate::math::{Quat, Vec3};
use crate::physics::{
    BodyHandle, ForceMode, LayerMask, PhysicsBackend, ProjectileDesc, SphereCast, SphereCastHit,
};

/// Canonical definition of an immutable world collider.
///
/// Conventions
/// - Units are meters.
/// - For planes the normal is the pose's local +Y.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    pub translation: Vector<f32>,
    pub rotation: Quat,
    pub shape: ColliderShapeDef,
    /// Collision layer index.
    pub layer: u8,
}

/// Supported collider shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space), offset along its normal.
    Plane { offset_along_normal: f32 },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vector<f32> },

    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },

    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },
}

impl ColliderShapeDef {
    /// Horizontal radius used by sphere probes and proxies.
    pub fn radius(&self) -> Option<f32> {
        match self {
            Self::Sphere { radius }
            | Self::CapsuleY { radius, .. }
            | Self::CylinderY { radius, .. } => Some(*radius),
            Self::Cuboid { half_extents } => Some(half_extents.x.min(half_extents.z)),
            Self::Plane { .. } => None,
        }
    }
}

/// A dynamic body to insert into a running world.
#[derive(Clone, Debug)]
pub struct DynamicBodyDef {
    pub translation: Vector<f32>,
    pub rotation: Quat,
    pub shape: ColliderShapeDef,
    pub mass: f32,
    pub layer: u8,
    /// 0.0 for bodies whose gravity is applied by a controller.
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub ccd: bool,
}

impl DynamicBodyDef {
    pub fn new(translation: Vector<f32>, shape: ColliderShapeDef) -> Self {
        Self {
            translation,
            rotation: Quat::identity(),
            shape,
            mass: 1.0,
            layer: 0,
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            ccd: false,
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }
}

/// Rapier sets plus the pipeline state needed to step them.
pub struct RapierPhysicsWorld {
    pub gravity: Vector<f32>,
    pub integration_parameters: IntegrationParameters,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
    islands: IslandManager,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    pipeline: PhysicsPipeline,
    shapes: HashMap<RigidBodyHandle, ColliderShapeDef>,
}

impl RapierPhysicsWorld {
    pub fn new(gravity: Vec3, dt: f32) -> Self {
        Self {
            gravity,
            integration_parameters: IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            islands: IslandManager::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            pipeline: PhysicsPipeline::new(),
            shapes: HashMap::new(),
        }
    }

    /// Builds a world whose static geometry is `statics`, inserted in `id` order.
    pub fn build(mut statics: Vec<WorldStaticDef>, gravity: Vec3, dt: f32) -> Self {
        statics.sort_by_key(|d| d.id);

        let mut world = Self::new(gravity, dt);
        for def in statics {
            world.insert_static(def);
        }
        log::debug!("Built physics world with {} static bodies", world.bodies.len());
        world
    }

    /// Inserts one static as a fixed rigid-body with an attached collider.
    pub fn insert_static(&mut self, def: WorldStaticDef) -> RigidBodyHandle {
        let iso = Isometry::from_parts(Translation3::from(def.translation), def.rotation);
        let rb = RigidBodyBuilder::fixed().pose(iso).build();
        let handle = self.bodies.insert(rb);

        let collider = collider_builder(&def.shape)
            .collision_groups(layer_groups(def.layer))
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        self.shapes.insert(handle, def.shape);
        handle
    }

    pub fn insert_dynamic(&mut self, def: DynamicBodyDef) -> RigidBodyHandle {
        let iso = Isometry::from_parts(Translation3::from(def.translation), def.rotation);
        let rb = RigidBodyBuilder::dynamic()
            .pose(iso)
            .gravity_scale(def.gravity_scale)
            .linear_damping(def.linear_damping)
            .angular_damping(def.angular_damping)
            .ccd_enabled(def.ccd)
            .build();
        let handle = self.bodies.insert(rb);

        let collider = collider_builder(&def.shape)
            .mass(def.mass)
            .collision_groups(layer_groups(def.layer))
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        // Mass is otherwise only known after the next step.
        if let Some(rb) = self.bodies.get_mut(handle) {
            rb.recompute_mass_properties_from_colliders(&self.colliders);
        }
        self.shapes.insert(handle, def.shape);
        handle
    }

    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.shapes.remove(&handle);
        self.bodies
            .remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    /// Shape the body was created with.
    pub fn shape_of(&self, handle: RigidBodyHandle) -> Option<&ColliderShapeDef> {
        self.shapes.get(&handle)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Advances the simulation by one fixed step, then clears force and torque
    /// accumulators.
    pub fn step(&mut self) {
        let hooks = ();
        let events = ();

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &hooks,
            &events,
        );

        for (_, rb) in self.bodies.iter_mut() {
            rb.reset_forces(false);
            rb.reset_torques(false);
        }
    }

    /// Borrowed `QueryPipeline` view over the current state.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }
}

impl PhysicsBackend for RapierPhysicsWorld {
    fn position(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(body).map(|rb| *rb.translation())
    }

    fn rotation(&self, body: BodyHandle) -> Option<Quat> {
        self.bodies.get(body).map(|rb| *rb.rotation())
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(body).map(|rb| *rb.linvel())
    }

    fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(body).map(|rb| *rb.angvel())
    }

    fn mass(&self, body: BodyHandle) -> Option<f32> {
        self.bodies.get(body).map(|rb| rb.mass())
    }

    fn collider_radius(&self, body: BodyHandle) -> Option<f32> {
        let rb = self.bodies.get(body)?;
        let collider = self.colliders.get(*rb.colliders().first()?)?;
        match collider.shape().as_typed_shape() {
            TypedShape::Ball(ball) => Some(ball.radius),
            TypedShape::Capsule(capsule) => Some(capsule.radius),
            TypedShape::Cylinder(cylinder) => Some(cylinder.radius),
            TypedShape::Cuboid(cuboid) => Some(cuboid.half_extents.x.min(cuboid.half_extents.z)),
            _ => None,
        }
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(rb) = self.bodies.get_mut(body) {
            rb.set_linvel(velocity, true);
        }
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec3, mode: ForceMode) {
        let Some(rb) = self.bodies.get_mut(body) else {
            return;
        };
        match mode {
            ForceMode::Force => rb.add_force(force, true),
            ForceMode::Acceleration => {
                let mass = rb.mass();
                rb.add_force(force * mass, true);
            }
            ForceMode::Impulse => rb.apply_impulse(force, true),
            ForceMode::VelocityChange => {
                let v = *rb.linvel() + force;
                rb.set_linvel(v, true);
            }
        }
    }

    fn apply_torque(&mut self, body: BodyHandle, torque: Vec3) {
        if let Some(rb) = self.bodies.get_mut(body) {
            rb.add_torque(torque, true);
        }
    }

    fn sphere_cast(&self, cast: &SphereCast) -> Option<SphereCastHit> {
        let mask = cast.layer_mask;
        let on_layer = move |_: ColliderHandle, co: &Collider| {
            mask.intersects(LayerMask(co.collision_groups().memberships.bits()))
        };
        let mut filter = QueryFilter::default().predicate(&on_layer);
        if let Some(exclude) = cast.exclude {
            filter = filter.exclude_rigid_body(exclude);
        }

        let query = self.query_pipeline(filter);
        let ball = Ball::new(cast.radius.max(0.0));
        let origin = Isometry::from_parts(Translation3::from(cast.origin), Quat::identity());
        let mut options = ShapeCastOptions::with_max_time_of_impact(cast.max_distance);
        options.stop_at_penetration = false;

        let (_, hit) = query.cast_shape(&origin, &cast.direction, &ball, options)?;

        // The ball has identity rotation, so its local contact normal is also
        // the world-space direction from its center to the contact.
        let toward_contact = hit.normal2.into_inner();
        let center = cast.origin + cast.direction * hit.time_of_impact;
        Some(SphereCastHit {
            distance: hit.time_of_impact,
            point: center + toward_contact * cast.radius,
            normal: -toward_contact,
        })
    }

    fn spawn_projectile(
        &mut self,
        desc: &ProjectileDesc,
        position: Vec3,
        rotation: Quat,
    ) -> Option<BodyHandle> {
        let def = DynamicBodyDef::new(position, ColliderShapeDef::Sphere { radius: desc.radius })
            .with_rotation(rotation)
            .with_mass(desc.mass)
            .with_layer(desc.layer)
            .with_ccd(true);
        let handle = self.insert_dynamic(def);
        log::debug!("Spawned projectile {handle:?} at {position:?}");
        Some(handle)
    }
}

fn layer_groups(layer: u8) -> InteractionGroups {
    InteractionGroups {
        memberships: Group::from_bits_truncate(LayerMask::layer(layer).0),
        filter: Group::ALL,
        ..InteractionGroups::all()
    }
}

/// Collider builder for a shape, with identity local transform relative to
/// its parent body (planes are offset along their local normal).
fn collider_builder(shape: &ColliderShapeDef) -> ColliderBuilder {
    match shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => ColliderBuilder::halfspace(Vector::y_axis())
            .translation(Vector::y() * *offset_along_normal),

        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }

        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),

        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),

        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 50.0;

    fn ground_world() -> RapierPhysicsWorld {
        RapierPhysicsWorld::build(
            vec![WorldStaticDef {
                id: 0,
                translation: Vector::zeros(),
                rotation: Quat::identity(),
                shape: ColliderShapeDef::Plane {
                    offset_along_normal: 0.0,
                },
                layer: 0,
            }],
            Vec3::new(0.0, -9.81, 0.0),
            DT,
        )
    }

    fn down_cast(origin: Vec3, mask: LayerMask, exclude: Option<BodyHandle>) -> SphereCast {
        SphereCast {
            origin,
            radius: 0.5,
            direction: -Vec3::y(),
            max_distance: 10.0,
            layer_mask: mask,
            exclude,
        }
    }

    #[test]
    fn sphere_cast_hits_ground_plane() {
        let mut world = ground_world();
        world.step();

        let hit = world
            .sphere_cast(&down_cast(Vec3::new(0.0, 3.0, 0.0), LayerMask::layer(0), None))
            .expect("plane below the origin");
        // Sphere of radius 0.5 touches the plane after travelling 2.5 m.
        assert!((hit.distance - 2.5).abs() < 1.0e-3);
        assert!(hit.point.y.abs() < 1.0e-3);
        assert!((hit.normal - Vec3::y()).norm() < 1.0e-3);
    }

    #[test]
    fn sphere_cast_respects_layer_mask() {
        let mut world = ground_world();
        world.step();
        let hit = world.sphere_cast(&down_cast(Vec3::new(0.0, 3.0, 0.0), LayerMask::layer(4), None));
        assert!(hit.is_none());
    }

    #[test]
    fn sphere_cast_ignores_excluded_body() {
        let mut world = ground_world();
        let body = world.insert_dynamic(
            DynamicBodyDef::new(
                Vec3::new(0.0, 3.0, 0.0),
                ColliderShapeDef::CapsuleY {
                    radius: 0.5,
                    half_height: 0.5,
                },
            )
            .with_gravity_scale(0.0),
        );
        world.step();

        let hit = world
            .sphere_cast(&down_cast(Vec3::new(0.0, 3.0, 0.0), LayerMask::ALL, Some(body)))
            .expect("ground under the capsule");
        assert!(hit.distance > 2.0);
        assert_eq!(world.collider_radius(body), Some(0.5));
    }

    #[test]
    fn forces_last_a_single_step() {
        let mut world = RapierPhysicsWorld::new(Vec3::zeros(), DT);
        let body = world.insert_dynamic(
            DynamicBodyDef::new(Vec3::zeros(), ColliderShapeDef::Sphere { radius: 0.5 })
                .with_mass(2.0),
        );
        world.step();

        world.apply_force(body, Vec3::new(0.0, 10.0, 0.0), ForceMode::Acceleration);
        world.step();
        let v1 = world.linear_velocity(body).unwrap();
        world.step();
        let v2 = world.linear_velocity(body).unwrap();

        // a = 10 m/s² for one step of 0.02 s, then no further acceleration.
        assert!((v1.y - 0.2).abs() < 1.0e-3);
        assert!((v2.y - v1.y).abs() < 1.0e-4);
    }

    #[test]
    fn velocity_change_ignores_mass() {
        let mut world = RapierPhysicsWorld::new(Vec3::zeros(), DT);
        let body = world.insert_dynamic(
            DynamicBodyDef::new(Vec3::zeros(), ColliderShapeDef::Sphere { radius: 0.5 })
                .with_mass(5.0),
        );
        world.apply_force(body, Vec3::new(1.0, 0.0, 0.0), ForceMode::VelocityChange);
        assert_eq!(world.linear_velocity(body), Some(Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn spawned_projectile_is_tracked() {
        let mut world = RapierPhysicsWorld::new(Vec3::zeros(), DT);
        let handle = world
            .spawn_projectile(&ProjectileDesc::default(), Vec3::new(1.0, 2.0, 3.0), Quat::identity())
            .unwrap();
        assert_eq!(world.position(handle), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(
            world.shape_of(handle),
            Some(&ColliderShapeDef::Sphere { radius: 0.2 })
        );
        assert!(world.remove_body(handle));
        assert!(world.position(handle).is_none());
    }
}
