//! The detection engine service.

use std::any::Any;
use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use umbra_round::{ROUND_SERVICE, RoundController, keys};
use umbra_service::{Service, ServiceBase, ServiceError, ServiceMap};
use umbra_store::{STATE_STORE, StateStore, Subscription};
use umbra_tick::HeartbeatConnection;
use umbra_types::{PlayerId, RoundState};
use umbra_world::SimContext;

use crate::{DetectionConfig, ExposureTracker, Light};

/// Registered name of the detection engine.
pub const DETECTION_SERVICE: &str = "DetectionService";

/// Elimination reason reported to the round controller.
const EXPOSED: &str = "exposed to light";

struct DetectionState {
    lights: Vec<Light>,
    exposure: ExposureTracker,
    /// Present while the per-frame update is connected.
    frame: Option<HeartbeatConnection>,
}

/// Moves lights every frame, checks who they see, and eliminates players
/// who stay lit past the threshold.
///
/// Runs only while the round is Playing. It follows the phase through the
/// state store's `RoundState` key and never asks the round controller.
pub struct DetectionEngine {
    base: ServiceBase,
    ctx: SimContext,
    config: DetectionConfig,
    this: Weak<DetectionEngine>,
    round: OnceCell<Rc<RoundController>>,
    subscription: RefCell<Option<Subscription>>,
    state: RefCell<DetectionState>,
}

impl DetectionEngine {
    /// Creates an idle engine.
    pub fn new(ctx: SimContext, config: DetectionConfig) -> Rc<Self> {
        let exposure = ExposureTracker::new(config.exposure_threshold());
        Rc::new_cyclic(|this| Self {
            base: ServiceBase::new(DETECTION_SERVICE, &[STATE_STORE, ROUND_SERVICE]),
            ctx,
            config,
            this: this.clone(),
            round: OnceCell::new(),
            subscription: RefCell::new(None),
            state: RefCell::new(DetectionState {
                lights: Vec::new(),
                exposure,
                frame: None,
            }),
        })
    }

    /// Whether the per-frame update is running.
    pub fn is_running(&self) -> bool {
        self.state.borrow().frame.is_some()
    }

    /// Number of active lights.
    pub fn light_count(&self) -> usize {
        self.state.borrow().lights.len()
    }

    /// Snapshot of the active lights.
    pub fn lights(&self) -> Vec<Light> {
        self.state.borrow().lights.clone()
    }

    /// Current continuous exposure of `player`, if lit.
    pub fn exposure_of(&self, player: PlayerId) -> Option<Duration> {
        self.state.borrow().exposure.get(player)
    }

    /// The detection settings.
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// One simulation frame: move lights, test every alive player, then
    /// eliminate whoever crossed the threshold.
    ///
    /// Normally driven by the heartbeat; exposed for callers that step
    /// the engine by hand.
    pub fn update(&self, dt: Duration) {
        let Some(round) = self.round.get() else {
            return;
        };

        let crossed = {
            let mut state = self.state.borrow_mut();
            let state = &mut *state;
            if state.frame.is_none() {
                return;
            }

            let secs = dt.as_secs_f64();
            for light in &mut state.lights {
                light.advance(secs);
            }

            let members = round.alive_players();
            let obstacles = self.ctx.arena.obstacles();
            state.exposure.retain(|player| members.contains(&player));

            let mut crossed = Vec::new();
            for &player in &members {
                let lit = self.ctx.arena.reference_point(player).is_some_and(|point| {
                    state
                        .lights
                        .iter()
                        .any(|light| light.detects(player, point, &obstacles))
                });
                tracing::trace!(%player, lit, "detection");
                if state.exposure.record(player, lit, dt) {
                    crossed.push(player);
                }
            }
            crossed
        };

        // `members` is in id order, so `crossed` is too.
        for player in crossed {
            round.eliminate_player(player, EXPOSED);
        }
    }

    fn on_round_state(&self, state: RoundState) {
        match state {
            RoundState::Playing => self.activate(),
            RoundState::Intermission | RoundState::RoundEnd | RoundState::Shutdown => self.deactivate(),
            RoundState::Lobby => {}
        }
    }

    fn activate(&self) {
        if self.is_running() {
            return;
        }
        let lights: Vec<Light> = self
            .ctx
            .arena
            .light_paths()
            .iter()
            .filter_map(|path| {
                let light = Light::spawn(path, &self.config.light);
                if light.is_none() {
                    tracing::warn!(?path, "light path has no facing, skipping");
                }
                light
            })
            .collect();

        let this = self.this.clone();
        let frame = self.ctx.heartbeat.connect(move |dt| {
            if let Some(this) = this.upgrade() {
                this.update(dt);
            }
        });

        let count = lights.len();
        {
            let mut state = self.state.borrow_mut();
            state.lights = lights;
            state.exposure.clear();
            state.frame = Some(frame);
        }
        tracing::info!(lights = count, "detection started");
    }

    fn deactivate(&self) {
        let (frame, despawned) = {
            let mut state = self.state.borrow_mut();
            state.exposure.clear();
            let despawned = std::mem::take(&mut state.lights).len();
            (state.frame.take(), despawned)
        };
        if let Some(frame) = frame {
            frame.disconnect();
            tracing::info!(lights = despawned, "detection stopped");
        }
    }
}

impl Service for DetectionEngine {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    fn init(&self, deps: &ServiceMap) -> Result<(), ServiceError> {
        if !self.base.init(deps)? {
            return Ok(());
        }
        let store = deps.resolve::<StateStore>(DETECTION_SERVICE, STATE_STORE)?;
        let round = deps.resolve::<RoundController>(DETECTION_SERVICE, ROUND_SERVICE)?;
        let _ = self.round.set(round);

        let this = self.this.clone();
        let subscription = store.subscribe(keys::ROUND_STATE, move |new, _| {
            if let (Some(this), Some(state)) = (this.upgrade(), new.as_round()) {
                this.on_round_state(state);
            }
        });
        *self.subscription.borrow_mut() = Some(subscription);
        Ok(())
    }

    fn start(&self) -> Result<(), ServiceError> {
        self.base.start().map(|_| ())
    }

    fn shutdown(&self) {
        if !self.base.shutdown() {
            return;
        }
        if let Some(subscription) = self.subscription.borrow_mut().take() {
            subscription.unsubscribe();
        }
        self.deactivate();
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl fmt::Debug for DetectionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("DetectionEngine")
            .field("running", &state.frame.is_some())
            .field("lights", &state.lights.len())
            .field("exposed", &state.exposure.len())
            .finish_non_exhaustive()
    }
}
