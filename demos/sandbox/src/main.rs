use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Notify;
use umbra::prelude::*;
use umbra::round::keys;

/// Rounds played before the demo stops on its own.
const DEFAULT_ROUNDS: u32 = 3;
/// How fast sandbox players drift around, in units per second.
const WANDER_SPEED: f64 = 4.0;
/// Half-width of the walkable floor.
const FLOOR: f64 = 20.0;

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// A square room with a light sweeping along the north wall, a few crates
/// to hide behind and two players.
fn build_arena() -> Rc<SandboxArena> {
    let arena = Rc::new(SandboxArena::new());
    arena.set_lobby(Vec3::new(0.0, 2.0, -40.0));

    for x in [-12.0, 0.0, 12.0] {
        arena.add_spawn_point(Vec3::new(x, 2.0, 15.0));
    }

    arena.add_light_path(LightPath {
        start: Vec3::new(-15.0, 4.0, -5.0),
        end: Vec3::new(15.0, 4.0, -5.0),
        forward: Vec3::Z,
    });

    for x in [-8.0, 8.0] {
        arena.add_obstacle(Aabb::from_center(Vec3::new(x, 1.5, 6.0), Vec3::new(3.0, 3.0, 3.0)));
    }

    arena.connect(PlayerId(1));
    arena.connect(PlayerId(2));
    arena
}

/// Nudges every live character a random step each frame, kept on the floor.
fn wander(arena: &SandboxArena, dt: Duration) {
    let mut rng = rand::rng();
    let step = WANDER_SPEED * dt.as_secs_f64();
    for player in arena.connected_players() {
        let Some(at) = arena.reference_point(player) else {
            continue;
        };
        if at.z < -FLOOR {
            // Still in the lobby.
            continue;
        }
        let next = Vec3::new(
            (at.x + rng.random_range(-step..=step)).clamp(-FLOOR, FLOOR),
            at.y,
            (at.z + rng.random_range(-step..=step)).clamp(-FLOOR, FLOOR),
        );
        step_to(arena, player, next);
    }
}

/// Moves one character. Returns `false` if the arena rejected the move.
fn step_to(arena: &SandboxArena, player: PlayerId, next: Vec3) -> bool {
    match arena.set_position(player, next) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(%player, error = %e, "wander step rejected");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    umbra::logging::init("umbra=info,sandbox=info")?;

    // Usage: sandbox [config.json] [rounds]
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let rounds: u32 = match args.next() {
        Some(n) => n.parse()?,
        None => DEFAULT_ROUNDS,
    };

    let arena = build_arena();
    let mut sim = Simulation::bootstrap(config, arena.clone())?;

    let walker = Rc::clone(&arena);
    let _wander = sim.context().heartbeat.connect(move |dt| wander(&walker, dt));

    let done = Rc::new(Notify::new());
    let _rounds = {
        let done = Rc::clone(&done);
        let ended = Cell::new(0);
        sim.store().subscribe(keys::ROUND_STATE, move |new, _old| {
            if new.as_round() != Some(RoundState::RoundEnd) {
                return;
            }
            ended.set(ended.get() + 1);
            if ended.get() >= rounds {
                done.notify_one();
            }
        })
    };
    let _results = sim.store().subscribe(keys::SURVIVORS, |new, _old| {
        if let Some(survivors) = new.as_players() {
            tracing::info!(?survivors, "survivors changed");
        }
    });

    let stats = sim
        .run_until(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
                _ = done.notified() => tracing::info!(rounds, "played every round"),
            }
        })
        .await;

    tracing::info!(
        frames = stats.frames,
        late = stats.late_frames,
        skipped = stats.skipped_frames,
        "sandbox finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wander_leaves_lobby_alone() {
        let arena = build_arena();
        let lobby = arena.reference_point(PlayerId(1)).unwrap();

        wander(&arena, Duration::from_secs(1));

        assert_eq!(arena.reference_point(PlayerId(1)), Some(lobby));
    }

    #[test]
    fn test_wander_stays_on_the_floor() {
        let arena = build_arena();
        arena.set_position(PlayerId(1), Vec3::new(FLOOR, 2.0, FLOOR)).unwrap();

        for _ in 0..50 {
            wander(&arena, Duration::from_millis(500));
        }

        let at = arena.reference_point(PlayerId(1)).unwrap();
        assert!(at.x.abs() <= FLOOR && at.z.abs() <= FLOOR);
        assert_eq!(at.y, 2.0);
    }

    #[test]
    fn test_step_for_unknown_player_is_rejected() {
        let arena = build_arena();

        assert!(!step_to(&arena, PlayerId(9), Vec3::ZERO));
        assert_eq!(arena.connected_players(), vec![PlayerId(1), PlayerId(2)]);
        assert_eq!(arena.reference_point(PlayerId(9)), None);

        assert!(step_to(&arena, PlayerId(1), Vec3::ZERO));
        assert_eq!(arena.reference_point(PlayerId(1)), Some(Vec3::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sandbox_plays_a_round() {
        let arena = build_arena();
        let mut sim = Simulation::bootstrap(GameConfig::default(), arena).unwrap();

        sim.run_until(tokio::time::sleep(Duration::from_secs(12))).await;

        assert_eq!(sim.store().get(keys::ROUND_NUMBER), Some(Value::Int(1)));
    }
}
