//! Presentation side of playback: ghost objects that mirror recorded bodies.

use std::collections::HashMap;

use shared::{ColliderShapeDef, Quat, Vec3};

/// RGBA tint of player proxies.
pub const PLAYER_COLOR: [f32; 4] = [0.2, 0.6, 1.0, 0.8];
/// RGBA tint of every other proxy.
pub const NORMAL_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 0.8];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(pub u64);

/// What the player asks the presentation layer to create for one object.
#[derive(Clone, Debug, PartialEq)]
pub struct ProxyDesc {
    /// `Replay_<object name>`.
    pub name: String,
    pub shape: ColliderShapeDef,
    pub color: [f32; 4],
    pub is_player: bool,
}

impl ProxyDesc {
    /// Mirrors `live_shape` when the original object still exists, otherwise a
    /// capsule for players and a unit box for everything else.
    pub fn for_object(object_name: &str, is_player: bool, live_shape: Option<ColliderShapeDef>) -> Self {
        let shape = live_shape.unwrap_or_else(|| fallback_shape(is_player));
        Self {
            name: format!("Replay_{object_name}"),
            shape,
            color: if is_player { PLAYER_COLOR } else { NORMAL_COLOR },
            is_player,
        }
    }
}

fn fallback_shape(is_player: bool) -> ColliderShapeDef {
    if is_player {
        ColliderShapeDef::CapsuleY {
            radius: 0.5,
            half_height: 0.5,
        }
    } else {
        ColliderShapeDef::Cuboid {
            half_extents: Vec3::new(0.5, 0.5, 0.5),
        }
    }
}

/// Receiver of proxy commands. Proxies never take part in physics.
pub trait ProxySink {
    /// Shape of the live object named `name`, if the presentation layer has one.
    fn find_live_shape(&self, name: &str) -> Option<ColliderShapeDef>;
    fn spawn_proxy(&mut self, desc: &ProxyDesc) -> ProxyId;
    fn despawn_proxy(&mut self, id: ProxyId);
    fn set_proxy_transform(&mut self, id: ProxyId, position: Vec3, rotation: Quat);
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProxyState {
    pub desc: ProxyDesc,
    pub position: Vec3,
    pub rotation: Quat,
}

/// Keeps proxies in memory. Used headless and in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    live_shapes: HashMap<String, ColliderShapeDef>,
    proxies: HashMap<ProxyId, ProxyState>,
    next_id: u64,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a live object whose shape proxies should copy.
    pub fn add_live_shape(&mut self, name: impl Into<String>, shape: ColliderShapeDef) {
        self.live_shapes.insert(name.into(), shape);
    }

    pub fn proxy(&self, id: ProxyId) -> Option<&ProxyState> {
        self.proxies.get(&id)
    }

    pub fn proxy_named(&self, name: &str) -> Option<&ProxyState> {
        self.proxies.values().find(|p| p.desc.name == name)
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

impl ProxySink for MemorySink {
    fn find_live_shape(&self, name: &str) -> Option<ColliderShapeDef> {
        self.live_shapes.get(name).cloned()
    }

    fn spawn_proxy(&mut self, desc: &ProxyDesc) -> ProxyId {
        let id = ProxyId(self.next_id);
        self.next_id += 1;
        self.proxies.insert(
            id,
            ProxyState {
                desc: desc.clone(),
                position: Vec3::zeros(),
                rotation: Quat::identity(),
            },
        );
        id
    }

    fn despawn_proxy(&mut self, id: ProxyId) {
        self.proxies.remove(&id);
    }

    fn set_proxy_transform(&mut self, id: ProxyId, position: Vec3, rotation: Quat) {
        if let Some(proxy) = self.proxies.get_mut(&id) {
            proxy.position = position;
            proxy.rotation = rotation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desc_prefers_live_shape() {
        let live = ColliderShapeDef::Sphere { radius: 2.0 };
        let desc = ProxyDesc::for_object("ball", false, Some(live.clone()));
        assert_eq!(desc.shape, live);
        assert_eq!(desc.name, "Replay_ball");
        assert_eq!(desc.color, NORMAL_COLOR);
    }

    #[test]
    fn fallback_depends_on_class() {
        let player = ProxyDesc::for_object("p", true, None);
        assert!(matches!(player.shape, ColliderShapeDef::CapsuleY { .. }));
        assert_eq!(player.color, PLAYER_COLOR);

        let other = ProxyDesc::for_object("o", false, None);
        assert!(matches!(other.shape, ColliderShapeDef::Cuboid { .. }));
    }
}
