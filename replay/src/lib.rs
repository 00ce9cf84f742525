//! Recording and playback of rigid-body motion.
//!
//! [`ReplayRecorder`] samples tracked bodies from a [`shared::PhysicsBackend`]
//! into a working buffer, [`SessionStore`] persists saved sessions as JSON, and
//! [`ReplayPlayer`] interpolates a session back onto presentation proxies.

pub mod error;
pub mod player;
pub mod proxy;
pub mod recorder;
pub mod session;
pub mod store;

pub use error::ReplayError;
pub use player::{PlaybackState, ReplayPlayer, sample_at};
pub use proxy::{MemorySink, NORMAL_COLOR, PLAYER_COLOR, ProxyDesc, ProxyId, ProxySink, ProxyState};
pub use recorder::{RecorderSettings, ReplayRecorder};
pub use session::{RecordedObject, ReplaySession, TrackedBody, TransformSample};
pub use store::{SessionStore, safe_file_name};
