//! Test arena: a ground plane, a few loose crates and the player capsule.

use replay::{MemorySink, TrackedBody};
use shared::{
    BodyHandle, ColliderShapeDef, DynamicBodyDef, GRAVITY_MPS2, Quat, RapierPhysicsWorld, Vec3,
    WorldStaticDef,
};

pub const FIXED_DT: f32 = 1.0 / 50.0;

const GROUND_LAYER: u8 = 0;
const PLAYER_LAYER: u8 = 1;

pub struct Scene {
    pub world: RapierPhysicsWorld,
    pub player: TrackedBody,
    pub props: Vec<TrackedBody>,
}

impl Scene {
    pub fn build() -> Self {
        let statics = vec![WorldStaticDef {
            id: 0,
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            shape: ColliderShapeDef::Plane {
                offset_along_normal: 0.0,
            },
            layer: GROUND_LAYER,
        }];
        let mut world =
            RapierPhysicsWorld::build(statics, Vec3::new(0.0, -GRAVITY_MPS2, 0.0), FIXED_DT);

        // Controller gravity replaces the engine's for the player.
        let player = world.insert_dynamic(
            DynamicBodyDef::new(
                Vec3::new(0.0, 2.75, 0.0),
                ColliderShapeDef::CapsuleY {
                    radius: 0.5,
                    half_height: 0.5,
                },
            )
            .with_layer(PLAYER_LAYER)
            .with_gravity_scale(0.0)
            .with_damping(0.0, 1.0),
        );

        let props = (0..3)
            .map(|i| {
                let x = 3.0 + 2.0 * i as f32;
                let body = world.insert_dynamic(
                    DynamicBodyDef::new(
                        Vec3::new(x, 0.5 + i as f32, 6.0),
                        ColliderShapeDef::Cuboid {
                            half_extents: Vec3::new(0.5, 0.5, 0.5),
                        },
                    )
                    .with_layer(GROUND_LAYER)
                    .with_mass(5.0),
                );
                TrackedBody::new(format!("Crate_{i}"), body)
            })
            .collect();

        Self {
            world,
            player: TrackedBody::new("Player", player),
            props,
        }
    }

    pub fn player_body(&self) -> BodyHandle {
        self.player.body
    }

    /// Presentation sink that knows the live shape of every tracked body.
    pub fn proxy_sink(&self) -> MemorySink {
        let mut sink = MemorySink::new();
        for tracked in std::iter::once(&self.player).chain(&self.props) {
            if let Some(shape) = self.world.shape_of(tracked.body) {
                sink.add_live_shape(tracked.name.clone(), shape.clone());
            }
        }
        sink
    }
}
