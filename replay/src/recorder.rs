/*!
Samples tracked bodies into a working buffer.

Two object classes are sampled on independent cadences: players (default
50 Hz) and everything else (default 10 Hz). Each cadence keeps a due time on
the recording's own timeline. A tick at or after the due time takes one sample
of every object in that class and moves the due time forward by exactly one
interval, so rounding in the caller's frame times does not accumulate. If the
caller falls more than an interval behind, the schedule restarts from the
current tick instead of bursting.
*/

use std::sync::Arc;

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use shared::error::ensure_positive;
use shared::{
    Clock, ConfigError, DEFAULT_NORMAL_RECORD_INTERVAL, DEFAULT_PLAYER_RECORD_INTERVAL,
    PhysicsBackend, TIME_EPS,
};

use crate::error::ReplayError;
use crate::session::{RecordedObject, ReplaySession, TrackedBody, TransformSample};
use crate::store::SessionStore;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    /// Seconds between player samples.
    pub player_record_interval: f32,
    /// Seconds between samples of non-player objects.
    pub normal_record_interval: f32,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            player_record_interval: DEFAULT_PLAYER_RECORD_INTERVAL,
            normal_record_interval: DEFAULT_NORMAL_RECORD_INTERVAL,
        }
    }
}

impl RecorderSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("player_record_interval", self.player_record_interval)?;
        ensure_positive("normal_record_interval", self.normal_record_interval)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Cadence {
    interval: f64,
    next_due: f64,
}

impl Cadence {
    fn new(interval: f32) -> Self {
        let interval = interval as f64;
        Self {
            interval,
            next_due: interval,
        }
    }

    /// Whether a sample is due at `elapsed`; advances the schedule if so.
    fn poll(&mut self, elapsed: f64) -> bool {
        if elapsed + f64::from(TIME_EPS) < self.next_due {
            return false;
        }
        self.next_due += self.interval;
        if self.next_due <= elapsed {
            self.next_due = elapsed + self.interval;
        }
        true
    }
}

#[derive(Debug)]
pub struct ReplayRecorder<C: Clock> {
    clock: C,
    settings: RecorderSettings,
    objects: Vec<RecordedObject>,
    recording: bool,
    start_time: f64,
    end_time: f64,
    players: Cadence,
    normals: Cadence,
}

impl<C: Clock> ReplayRecorder<C> {
    pub fn new(clock: C) -> Self {
        Self::with_settings(clock, RecorderSettings::default())
    }

    /// Invalid intervals are logged and replaced by the defaults.
    pub fn with_settings(clock: C, settings: RecorderSettings) -> Self {
        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                log::error!("Invalid recorder settings, using defaults: {e}");
                RecorderSettings::default()
            }
        };
        Self {
            clock,
            players: Cadence::new(settings.player_record_interval),
            normals: Cadence::new(settings.normal_record_interval),
            settings,
            objects: Vec::new(),
            recording: false,
            start_time: 0.0,
            end_time: 0.0,
        }
    }

    pub fn settings(&self) -> &RecorderSettings {
        &self.settings
    }

    /// Starts a new recording of `players` and `normals`, discarding any data
    /// in the buffer. Does nothing while already recording.
    pub fn start_recording(&mut self, players: &[TrackedBody], normals: &[TrackedBody]) {
        if self.recording {
            return;
        }
        self.objects.clear();
        self.start_time = self.clock.now();
        self.end_time = self.start_time;
        self.players = Cadence::new(self.settings.player_record_interval);
        self.normals = Cadence::new(self.settings.normal_record_interval);

        self.objects.extend(players.iter().map(|t| RecordedObject::new(t, true)));
        self.objects.extend(normals.iter().map(|t| RecordedObject::new(t, false)));
        self.recording = true;

        log::info!(
            "Started recording {} objects at time {:.3}",
            self.objects.len(),
            self.start_time
        );
    }

    pub fn stop_recording(&mut self) {
        if !self.recording {
            return;
        }
        self.end_time = self.clock.now();
        self.recording = false;
        log::info!("Stopped recording. Duration: {:.2}s", self.recording_duration());
    }

    /// Samples every class whose cadence is due. Call once per frame.
    pub fn tick(&mut self, physics: &dyn PhysicsBackend) {
        if !self.recording {
            return;
        }
        let elapsed = self.clock.now() - self.start_time;
        let players_due = self.players.poll(elapsed);
        let normals_due = self.normals.poll(elapsed);
        if !players_due && !normals_due {
            return;
        }

        let timestamp = elapsed as f32;
        for object in self.objects.iter_mut() {
            let due = if object.is_player { players_due } else { normals_due };
            if !due {
                continue;
            }
            let Some(body) = object.body else { continue };
            if let Some(sample) = TransformSample::capture(physics, body, timestamp) {
                object.push_sample(sample);
            }
        }
    }

    /// Deep copy of the buffer as a session. `None` if nothing is registered.
    /// An empty `name` becomes `Replay_HH_MM_SS` in local time.
    pub fn snapshot_session(&self, name: &str) -> Option<ReplaySession> {
        if self.objects.is_empty() {
            log::warn!("No recording data to save");
            return None;
        }
        let name = if name.is_empty() {
            Local::now().format("Replay_%H_%M_%S").to_string()
        } else {
            name.to_owned()
        };
        Some(ReplaySession {
            name,
            duration: self.recording_duration(),
            created_at: Utc::now(),
            recorded_objects: self.objects.clone(),
        })
    }

    /// Copies the buffer into a new session and adds it to `store`. The buffer
    /// is left untouched, so the same data can be saved again.
    pub fn save_current_recording(
        &self,
        name: &str,
        store: &mut SessionStore,
    ) -> Result<Option<Arc<ReplaySession>>, ReplayError> {
        let Some(session) = self.snapshot_session(name) else {
            return Ok(None);
        };
        let session = store.add(session)?;
        log::info!(
            "Saved replay session: {} with duration {:.2}s and {} objects",
            session.name,
            session.duration,
            session.object_count()
        );
        Ok(Some(session))
    }

    /// Stops recording and drops every object and sample.
    pub fn clear_current_recording(&mut self) {
        self.recording = false;
        self.objects.clear();
        self.start_time = 0.0;
        self.end_time = 0.0;
    }

    #[inline]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Seconds recorded so far, or the length of the last stopped recording.
    pub fn recording_duration(&self) -> f32 {
        let end = if self.recording {
            self.clock.now()
        } else {
            self.end_time
        };
        (end - self.start_time) as f32
    }

    pub fn recorded_objects_count(&self) -> usize {
        self.objects.len()
    }

    pub fn has_recording_data(&self) -> bool {
        self.objects.iter().any(|o| !o.samples.is_empty())
    }

    /// Snapshot copy of the working buffer.
    pub fn current_recording_data(&self) -> Vec<RecordedObject> {
        self.objects.clone()
    }
}
