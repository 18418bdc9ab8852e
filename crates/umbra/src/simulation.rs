//! The simulation driver: bootstrap, frame loop and teardown.
//!
//! ```text
//! Simulation::bootstrap(config, arena)
//!   ├─ register StateStore, RoundService, DetectionService
//!   ├─ init_all()   (fatal on a missing dependency)
//!   └─ start_all()  (round controller enters Intermission)
//!
//! run_until(shutdown)            every frame:
//!   FrameLoop ──dt──→ step(dt) ──→ timers.advance(dt) ──→ heartbeat.fire(dt)
//!
//! shutdown()
//!   └─ shutdown_all() in reverse order, then disarm leftover timers
//! ```

use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use umbra_detect::{DETECTION_SERVICE, DetectionEngine};
use umbra_round::{ROUND_SERVICE, RoundController};
use umbra_service::{Service, ServiceError, ServiceRegistry};
use umbra_store::{STATE_STORE, StateStore};
use umbra_tick::{FrameLoop, FrameStats};
use umbra_types::RoundState;
use umbra_world::{Arena, SimContext};

use crate::{GameConfig, UmbraError};

/// One running simulation. Two `Simulation`s share nothing.
pub struct Simulation {
    config: GameConfig,
    ctx: SimContext,
    registry: ServiceRegistry,
    store: Rc<StateStore>,
    round: Rc<RoundController>,
    detection: Rc<DetectionEngine>,
    shut_down: bool,
}

impl Simulation {
    /// Builds, wires and starts every service.
    ///
    /// # Errors
    ///
    /// An invalid config, or any bootstrap failure. Nothing keeps running
    /// after an error.
    pub fn bootstrap(config: GameConfig, arena: Rc<dyn Arena>) -> Result<Self, UmbraError> {
        config.validate()?;
        let ctx = SimContext::new(arena);

        let mut registry = ServiceRegistry::new();
        registry.register(STATE_STORE, || Ok(StateStore::new()));
        {
            let ctx = ctx.clone();
            let round_config = config.round.clone();
            registry.register(ROUND_SERVICE, move || {
                Ok(RoundController::new(ctx.clone(), round_config.clone()))
            });
        }
        {
            let ctx = ctx.clone();
            let detection_config = config.detection.clone();
            registry.register(DETECTION_SERVICE, move || {
                Ok(DetectionEngine::new(ctx.clone(), detection_config.clone()))
            });
        }

        registry.init_all()?;
        registry.start_all()?;

        let store = lookup::<StateStore>(&registry, STATE_STORE)?;
        let round = lookup::<RoundController>(&registry, ROUND_SERVICE)?;
        let detection = lookup::<DetectionEngine>(&registry, DETECTION_SERVICE)?;

        tracing::info!(
            tick_rate_hz = config.tick_rate_hz,
            services = registry.len(),
            "simulation bootstrapped"
        );

        Ok(Self {
            config,
            ctx,
            registry,
            store,
            round,
            detection,
            shut_down: false,
        })
    }

    /// Advances the simulation by one frame of length `dt`: due timers
    /// first, then every per-frame callback.
    pub fn step(&self, dt: Duration) {
        self.ctx.timers.advance(dt);
        self.ctx.heartbeat.fire(dt);
    }

    /// Runs frames in real time until `shutdown` resolves, then shuts the
    /// simulation down. Returns the frame loop's statistics.
    pub async fn run_until<F>(&mut self, shutdown: F) -> FrameStats
    where
        F: Future<Output = ()>,
    {
        let mut frames = FrameLoop::new(self.config.frame_config());
        tokio::pin!(shutdown);

        tracing::info!(rate_hz = frames.rate_hz(), "simulation running");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(frames = frames.frame_count(), "shutdown requested");
                    break;
                }
                frame = frames.wait_for_frame() => {
                    self.step(frame.dt);
                }
            }
        }

        self.shutdown();
        frames.stats().clone()
    }

    /// Stops every service in reverse order, then disarms leftover timers.
    /// A second call only warns.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            tracing::warn!("simulation already shut down");
            return;
        }
        self.shut_down = true;
        // No timer may fire into a service that is being torn down.
        let disarmed = self.ctx.timers.cancel_all();
        self.registry.shutdown_all();
        tracing::info!(disarmed_timers = disarmed, "simulation shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Current round phase.
    pub fn round_state(&self) -> RoundState {
        self.round.current_state()
    }

    /// Virtual time since bootstrap.
    pub fn now(&self) -> Duration {
        self.ctx.timers.now()
    }

    /// The shared state store.
    pub fn store(&self) -> &Rc<StateStore> {
        &self.store
    }

    /// The round controller.
    pub fn round(&self) -> &Rc<RoundController> {
        &self.round
    }

    /// The detection engine.
    pub fn detection(&self) -> &Rc<DetectionEngine> {
        &self.detection
    }

    /// The service registry.
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// The process-scoped context.
    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    /// The configuration this simulation was built with.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}

fn lookup<T: Service>(registry: &ServiceRegistry, name: &str) -> Result<Rc<T>, ServiceError> {
    registry.get_as::<T>(name).ok_or_else(|| ServiceError::WrongType {
        service: name.to_string(),
    })
}
