//! Headless run of the character controller with replay.
//!
//! Usage: `sim [controller-config.json] [session-dir]`
//!
//! Drives a scripted player through the lobby, walking, a jump, shooting and a
//! stun on a fixed 50 Hz physics step with 60 Hz frames, records everything,
//! saves the session, reopens the store and plays the session back at double
//! speed.

mod scene;
mod script;

use std::path::PathBuf;
use std::process::ExitCode;

use controller::{CharacterController, ControllerConfig};
use replay::{ReplayPlayer, ReplayRecorder, SessionStore};
use shared::{Clock, ManualClock};

use crate::scene::{FIXED_DT, Scene};

const FRAME_DT: f64 = 1.0 / 60.0;
const RUN_SECONDS: f64 = 7.0;
const SESSION_NAME: &str = "sim_run";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ControllerConfig::load_or_default(path),
        None => ControllerConfig::default(),
    };
    let session_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("replay_sessions"));

    let mut store = match SessionStore::open(&session_dir) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Cannot open session store: {e}");
            return ExitCode::FAILURE;
        }
    };

    let clock = ManualClock::new();
    let mut scene = Scene::build();
    let mut character = CharacterController::new(scene.player_body(), &config);
    let mut recorder = ReplayRecorder::new(clock.clone());
    recorder.start_recording(std::slice::from_ref(&scene.player), &scene.props);

    let mut accumulator = 0.0;
    let mut stunned = false;
    while clock.now() < RUN_SECONDS {
        clock.advance(FRAME_DT);
        let now = clock.now();
        character.set_input(script::input_at(now));

        if !stunned && now >= script::STUN_AT {
            character.stun(script::STUN_FOR, now);
            stunned = true;
        }

        accumulator += FRAME_DT;
        while accumulator >= FIXED_DT as f64 {
            character.fixed_update(&mut scene.world, now, FIXED_DT);
            scene.world.step();
            accumulator -= FIXED_DT as f64;
        }

        character.update(&mut scene.world, now, FRAME_DT as f32);
        character.late_update(&mut scene.world, now, FRAME_DT as f32);
        recorder.tick(&scene.world);

        if let Some(cue) = character.take_animation_cue() {
            log::debug!("Animation cue {cue:?} at {now:.2}s");
        }
    }
    recorder.stop_recording();
    log::info!(
        "Final state {:?} with ground reading {:?}",
        character.state(),
        character.ground_reading()
    );

    if let Err(e) = recorder.save_current_recording(SESSION_NAME, &mut store) {
        log::error!("Cannot save session: {e}");
        return ExitCode::FAILURE;
    }
    drop(store);

    let store = match SessionStore::open(&session_dir) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Cannot reopen session store: {e}");
            return ExitCode::FAILURE;
        }
    };
    let Some(session) = store.get(SESSION_NAME) else {
        log::error!("Session {SESSION_NAME} missing after reload");
        return ExitCode::FAILURE;
    };

    let mut player = ReplayPlayer::new(clock.clone(), scene.proxy_sink());
    player.load_session(session);
    player.set_speed(2.0);
    player.start();
    while player.is_playing() {
        clock.advance(FRAME_DT);
        player.advance();
    }

    if let Some(ghost) = player.sink().proxy_named("Replay_Player") {
        log::info!(
            "Playback finished at {:.2}s, player ghost at {:?}",
            player.playback_time(),
            ghost.position
        );
    }
    player.clean_up();
    ExitCode::SUCCESS
}
