/*!
Plays a saved session back through proxies.

Playback time advances by the clock time elapsed since the last reference
point, scaled by the playback speed. Seeking and resuming reset the reference
to "now". A speed change first banks the time elapsed at the old speed, so a
slider moved every frame never stalls playback.
*/

use std::sync::Arc;

use shared::math::{inverse_lerp, lerp_vec3, slerp};
use shared::{Clock, MAX_PLAYBACK_SPEED, MIN_PLAYBACK_SPEED, Quat, Vec3};

use crate::proxy::{ProxyDesc, ProxyId, ProxySink};
use crate::session::{ReplaySession, TransformSample};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Interpolated pose at `time` on a timeline sorted by timestamp.
///
/// Uses the first pair that brackets `time`. Before the first sample the first
/// pose is held; after the last, the last. `None` for an empty timeline.
pub fn sample_at(samples: &[TransformSample], time: f32) -> Option<(Vec3, Quat)> {
    let first = samples.first()?;
    let last = samples.last()?;
    if time > last.timestamp {
        return Some((last.position, last.rotation));
    }

    let (prev, next) = samples
        .windows(2)
        .find(|w| w[0].timestamp <= time && time <= w[1].timestamp)
        .map_or((first, first), |w| (&w[0], &w[1]));

    let t = inverse_lerp(prev.timestamp, next.timestamp, time);
    Some((
        lerp_vec3(&prev.position, &next.position, t),
        slerp(&prev.rotation, &next.rotation, t),
    ))
}

#[derive(Debug)]
pub struct ReplayPlayer<C: Clock, S: ProxySink> {
    clock: C,
    sink: S,
    session: Option<Arc<ReplaySession>>,
    /// One entry per recorded object, in session order.
    proxies: Vec<ProxyId>,
    state: PlaybackState,
    time: f32,
    speed: f32,
    reference: f64,
}

impl<C: Clock, S: ProxySink> ReplayPlayer<C, S> {
    pub fn new(clock: C, sink: S) -> Self {
        Self {
            clock,
            sink,
            session: None,
            proxies: Vec::new(),
            state: PlaybackState::Stopped,
            time: 0.0,
            speed: 1.0,
            reference: 0.0,
        }
    }

    /// Replaces the current session, rebuilds the proxies and shows frame 0.
    pub fn load_session(&mut self, session: Arc<ReplaySession>) {
        self.stop();
        self.despawn_proxies();

        for object in &session.recorded_objects {
            let live = self.sink.find_live_shape(&object.name);
            let desc = ProxyDesc::for_object(&object.name, object.is_player, live);
            self.proxies.push(self.sink.spawn_proxy(&desc));
        }
        log::info!(
            "Loaded replay session: {} with {} objects",
            session.name,
            session.object_count()
        );
        self.session = Some(session);
        self.time = 0.0;
        self.render();
    }

    /// Plays from the beginning. No-op without a session or while playing.
    pub fn start(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        if self.state == PlaybackState::Playing {
            return;
        }
        log::info!("Started playback of session: {}", session.name);
        self.reference = self.clock.now();
        self.time = 0.0;
        self.state = PlaybackState::Playing;
        self.render();
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Continues from the current time.
    pub fn resume(&mut self) {
        if self.session.is_none() {
            return;
        }
        self.reference = self.clock.now();
        self.state = PlaybackState::Playing;
    }

    /// Stops and rewinds to frame 0.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.time = 0.0;
        self.render();
    }

    /// Jumps to `normalized` (0..=1) of the session. Non-finite input is
    /// ignored.
    pub fn set_progress(&mut self, normalized: f32) {
        let Some(session) = &self.session else {
            return;
        };
        if !normalized.is_finite() {
            log::warn!("Ignoring non-finite playback progress {normalized}");
            return;
        }
        self.time = normalized.clamp(0.0, 1.0) * session.duration;
        self.reference = self.clock.now();
        self.render();
    }

    /// Sets the playback speed, clamped to the supported range. Time elapsed
    /// since the last advance still counts at the old speed.
    pub fn set_speed(&mut self, speed: f32) {
        if !speed.is_finite() {
            log::warn!("Ignoring non-finite playback speed {speed}");
            return;
        }
        if self.state == PlaybackState::Playing {
            self.advance();
        }
        self.speed = speed.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED);
    }

    /// Moves playback forward to the clock's current time. Call once per frame.
    pub fn advance(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(duration) = self.session.as_ref().map(|s| s.duration) else {
            return;
        };
        let now = self.clock.now();
        let real_dt = (now - self.reference).max(0.0) as f32;
        self.reference = now;

        self.time += real_dt * self.speed;
        if self.time >= duration {
            self.time = duration;
            self.state = PlaybackState::Stopped;
            log::info!("Playback reached the end of the session");
        }
        self.render();
    }

    /// Stops playback, destroys the proxies and forgets the session.
    pub fn unload(&mut self) {
        self.stop();
        self.despawn_proxies();
        self.session = None;
    }

    /// Alias of [`unload`](Self::unload) for application teardown.
    pub fn clean_up(&mut self) {
        self.unload();
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Playback time over duration, in `[0, 1]`.
    pub fn playback_progress(&self) -> f32 {
        match &self.session {
            Some(s) if s.duration > 0.0 => (self.time / s.duration).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    pub fn playback_time(&self) -> f32 {
        self.time
    }

    pub fn playback_speed(&self) -> f32 {
        self.speed
    }

    pub fn session_duration(&self) -> f32 {
        self.session.as_ref().map_or(0.0, |s| s.duration)
    }

    pub fn current_session_name(&self) -> Option<&str> {
        self.session.as_deref().map(|s| s.name.as_str())
    }

    pub fn session(&self) -> Option<&Arc<ReplaySession>> {
        self.session.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn proxy_ids(&self) -> &[ProxyId] {
        &self.proxies
    }

    fn render(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        for (object, id) in session.recorded_objects.iter().zip(&self.proxies) {
            if let Some((position, rotation)) = sample_at(&object.samples, self.time) {
                self.sink.set_proxy_transform(*id, position, rotation);
            }
        }
    }

    fn despawn_proxies(&mut self) {
        for id in self.proxies.drain(..) {
            self.sink.despawn_proxy(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::MemorySink;
    use crate::session::RecordedObject;
    use chrono::Utc;
    use shared::ManualClock;

    fn sample(t: f32, x: f32) -> TransformSample {
        TransformSample {
            position: Vec3::new(x, 0.0, 0.0),
            rotation: Quat::identity(),
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            timestamp: t,
        }
    }

    fn session() -> Arc<ReplaySession> {
        Arc::new(ReplaySession {
            name: "test".into(),
            duration: 1.0,
            created_at: Utc::now(),
            recorded_objects: vec![
                RecordedObject {
                    name: "player".into(),
                    is_player: true,
                    samples: vec![sample(0.0, 0.0), sample(0.5, 5.0), sample(1.0, 10.0)],
                    body: None,
                },
                RecordedObject {
                    name: "empty".into(),
                    is_player: false,
                    samples: Vec::new(),
                    body: None,
                },
            ],
        })
    }

    fn position(player: &ReplayPlayer<ManualClock, MemorySink>) -> Vec3 {
        let id = player.proxy_ids()[0];
        player.sink().proxy(id).unwrap().position
    }

    #[test]
    fn sample_at_interpolates_and_holds_ends() {
        let samples = [sample(0.2, 2.0), sample(0.4, 4.0), sample(0.4, 8.0)];
        assert_eq!(sample_at(&samples, 0.0).unwrap().0.x, 2.0);
        assert!((sample_at(&samples, 0.3).unwrap().0.x - 3.0).abs() < 1e-5);
        // The first bracketing pair wins over the zero-length one after it.
        assert_eq!(sample_at(&samples, 0.4).unwrap().0.x, 4.0);
        assert_eq!(sample_at(&samples, 9.0).unwrap().0.x, 8.0);
        assert!(sample_at(&[], 0.0).is_none());
    }

    #[test]
    fn load_spawns_proxies_at_frame_zero() {
        let clock = ManualClock::new();
        let mut player = ReplayPlayer::new(clock, MemorySink::new());
        player.load_session(session());

        assert_eq!(player.sink().len(), 2);
        assert_eq!(position(&player), Vec3::zeros());
        assert_eq!(player.current_session_name(), Some("test"));

        player.load_session(session());
        assert_eq!(player.sink().len(), 2, "previous proxies are destroyed");
    }

    #[test]
    fn pause_keeps_time_and_resume_ignores_paused_interval() {
        let clock = ManualClock::new();
        let mut player = ReplayPlayer::new(clock.clone(), MemorySink::new());
        player.load_session(session());
        player.start();

        clock.advance(0.25);
        player.advance();
        player.pause();
        clock.advance(10.0);
        player.advance();
        assert!((player.playback_time() - 0.25).abs() < 1e-5);
        assert_eq!(player.state(), PlaybackState::Paused);

        player.resume();
        clock.advance(0.25);
        player.advance();
        assert!((player.playback_time() - 0.5).abs() < 1e-5);
        assert!((position(&player).x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn progress_endpoints_show_first_and_last_sample() {
        let clock = ManualClock::new();
        let mut player = ReplayPlayer::new(clock, MemorySink::new());
        player.load_session(session());

        player.set_progress(1.0);
        assert_eq!(position(&player).x, 10.0);
        assert_eq!(player.playback_progress(), 1.0);
        player.set_progress(0.0);
        assert_eq!(position(&player).x, 0.0);
    }

    #[test]
    fn speed_is_clamped() {
        let mut player = ReplayPlayer::new(ManualClock::new(), MemorySink::new());
        player.set_speed(10.0);
        assert_eq!(player.playback_speed(), MAX_PLAYBACK_SPEED);
        player.set_speed(0.0);
        assert_eq!(player.playback_speed(), MIN_PLAYBACK_SPEED);
    }

    #[test]
    fn speed_change_keeps_elapsed_time() {
        let clock = ManualClock::new();
        let mut player = ReplayPlayer::new(clock.clone(), MemorySink::new());
        player.load_session(session());
        player.start();

        clock.advance(0.5);
        player.set_speed(1.0);
        player.advance();
        assert!((player.playback_time() - 0.5).abs() < 1e-5);

        // Time before the change runs at the old speed, after it at the new.
        clock.advance(0.1);
        player.set_speed(2.0);
        clock.advance(0.1);
        player.advance();
        assert!((player.playback_time() - 0.8).abs() < 1e-5);
    }

    #[test]
    fn speed_slider_moved_every_frame_keeps_playing() {
        let clock = ManualClock::new();
        let mut player = ReplayPlayer::new(clock.clone(), MemorySink::new());
        player.load_session(session());
        player.start();

        for _ in 0..10 {
            clock.advance(0.05);
            player.set_speed(1.0);
            player.advance();
        }
        assert!((player.playback_time() - 0.5).abs() < 1e-4);
        assert!(player.is_playing());
    }

    #[test]
    fn resume_recalibrates_after_a_paused_interval() {
        let clock = ManualClock::new();
        let mut player = ReplayPlayer::new(clock.clone(), MemorySink::new());
        player.load_session(session());
        player.start();

        clock.advance(0.2);
        player.advance();
        player.pause();
        clock.advance(1.0);
        player.resume();
        clock.advance(0.1);
        player.advance();

        assert!((player.playback_time() - 0.3).abs() < 1e-5);
        assert!((position(&player).x - 3.0).abs() < 1e-4);
    }

    #[test]
    fn non_finite_progress_and_speed_are_ignored() {
        let clock = ManualClock::new();
        let mut player = ReplayPlayer::new(clock, MemorySink::new());
        player.load_session(session());
        player.set_progress(0.5);
        player.set_speed(2.0);

        player.set_progress(f32::NAN);
        player.set_speed(f32::INFINITY);
        player.set_speed(f32::NAN);
        assert_eq!(player.playback_time(), 0.5);
        assert_eq!(player.playback_speed(), 2.0);
        assert_eq!(position(&player).x, 5.0);
    }

    #[test]
    fn start_without_session_does_nothing() {
        let mut player = ReplayPlayer::new(ManualClock::new(), MemorySink::new());
        player.start();
        assert_eq!(player.state(), PlaybackState::Stopped);
        assert_eq!(player.playback_progress(), 0.0);
    }

    #[test]
    fn unload_destroys_proxies() {
        let mut player = ReplayPlayer::new(ManualClock::new(), MemorySink::new());
        player.load_session(session());
        player.unload();
        assert!(player.sink().is_empty());
        assert!(player.current_session_name().is_none());
        assert_eq!(player.session_duration(), 0.0);
    }
}
