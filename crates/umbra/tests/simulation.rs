//! Integration tests for the simulation driver.

use std::rc::Rc;
use std::time::Duration;

use umbra::prelude::*;
use umbra::round::keys;

// =========================================================================
// Helpers
// =========================================================================

const P1: PlayerId = PlayerId(1);
const FRAME: Duration = Duration::from_millis(100);

/// One player spawning right in front of a stationary light.
fn exposed_arena() -> Rc<SandboxArena> {
    let arena = Rc::new(SandboxArena::new());
    arena.set_lobby(Vec3::new(0.0, 0.0, -50.0));
    arena.add_spawn_point(Vec3::new(0.0, 0.0, 10.0));
    arena.add_light_path(LightPath {
        start: Vec3::ZERO,
        end: Vec3::ZERO,
        forward: Vec3::Z,
    });
    arena.connect(P1);
    arena
}

fn steps(sim: &Simulation, n: usize) {
    for _ in 0..n {
        sim.step(FRAME);
    }
}

// =========================================================================
// Bootstrap
// =========================================================================

#[test]
fn test_bootstrap_registers_services_in_order() {
    let sim = Simulation::bootstrap(GameConfig::default(), exposed_arena()).unwrap();

    let names: Vec<&str> = sim.registry().names().collect();
    assert_eq!(names, vec!["StateStore", "RoundService", "DetectionService"]);
    assert!(sim.store().is_started());
    assert!(sim.round().is_started());
    assert!(sim.detection().is_started());
    assert_eq!(sim.round_state(), RoundState::Intermission);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = GameConfig {
        tick_rate_hz: 0,
        ..GameConfig::default()
    };
    let result = Simulation::bootstrap(config, exposed_arena());
    assert!(matches!(result, Err(UmbraError::Config(ConfigError::Invalid(_)))));
}

// =========================================================================
// Stepping
// =========================================================================

#[test]
fn test_step_drives_a_full_round() {
    let sim = Simulation::bootstrap(GameConfig::default(), exposed_arena()).unwrap();

    steps(&sim, 100);
    assert_eq!(sim.round_state(), RoundState::Playing);
    assert_eq!(sim.round().alive_players(), vec![P1]);
    assert!(sim.detection().is_running());
    // Playing began inside the last step's timer pass, before its frame.
    assert_eq!(sim.detection().exposure_of(P1), Some(FRAME));

    steps(&sim, 4);
    assert_eq!(sim.round_state(), RoundState::RoundEnd);
    assert_eq!(sim.store().get(keys::SURVIVORS), Some(Value::Players(Vec::new())));
    assert!(!sim.detection().is_running());

    steps(&sim, 50);
    assert_eq!(sim.round_state(), RoundState::Intermission);
    assert_eq!(sim.now(), Duration::from_millis(15_500));
}

#[test]
fn test_custom_threshold_is_applied() {
    let config = GameConfig::from_json_str(r#"{ "detection": { "exposure_threshold_secs": 1.0 } }"#).unwrap();
    let sim = Simulation::bootstrap(config, exposed_arena()).unwrap();

    steps(&sim, 100);
    steps(&sim, 8);
    assert_eq!(sim.round_state(), RoundState::Playing);
    assert_eq!(sim.detection().exposure_of(P1), Some(Duration::from_millis(900)));

    sim.step(FRAME);
    assert_eq!(sim.round_state(), RoundState::RoundEnd);
}

#[test]
fn test_simulations_are_independent() {
    let a = Simulation::bootstrap(GameConfig::default(), exposed_arena()).unwrap();
    let b = Simulation::bootstrap(GameConfig::default(), exposed_arena()).unwrap();

    steps(&a, 100);

    assert_eq!(a.round_state(), RoundState::Playing);
    assert_eq!(b.round_state(), RoundState::Intermission);
    assert_eq!(b.now(), Duration::ZERO);
}

// =========================================================================
// Shutdown
// =========================================================================

#[test]
fn test_shutdown_stops_everything() {
    let mut sim = Simulation::bootstrap(GameConfig::default(), exposed_arena()).unwrap();
    steps(&sim, 100);

    sim.shutdown();

    assert!(sim.is_shut_down());
    assert_eq!(sim.round_state(), RoundState::Shutdown);
    assert_eq!(sim.context().timers.pending(), 0);
    assert_eq!(sim.context().heartbeat.connection_count(), 0);
    assert!(!sim.store().is_started());

    // Idempotent.
    sim.shutdown();
    assert!(sim.is_shut_down());
}

#[test]
fn test_shutdown_disarms_timers_before_services_stop() {
    let mut sim = Simulation::bootstrap(GameConfig::default(), exposed_arena()).unwrap();
    steps(&sim, 100);
    let _external = sim.context().timers.schedule(Duration::from_secs(30), || {});
    assert!(sim.round().has_armed_phase_timer());

    let pending_at_teardown = Rc::new(std::cell::Cell::new(None));
    let seen = Rc::clone(&pending_at_teardown);
    let timers = sim.context().timers.clone();
    let _sub = sim.store().subscribe(keys::ROUND_STATE, move |new, _| {
        if new.as_round() == Some(RoundState::Shutdown) {
            seen.set(Some(timers.pending()));
        }
    });

    sim.shutdown();

    assert_eq!(pending_at_teardown.get(), Some(0));
    assert!(!sim.round().has_armed_phase_timer());
    assert_eq!(sim.context().timers.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_until_paces_frames_and_shuts_down() {
    let mut sim = Simulation::bootstrap(GameConfig::default(), exposed_arena()).unwrap();

    let stats = sim.run_until(tokio::time::sleep(Duration::from_secs(11))).await;

    assert!(stats.frames >= 300, "only {} frames", stats.frames);
    assert!(sim.is_shut_down());
    assert_eq!(sim.round_state(), RoundState::Shutdown);
    assert_eq!(sim.store().get(keys::ROUND_NUMBER), Some(Value::Int(1)));
}
