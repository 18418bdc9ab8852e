//! The round controller service.
//!
//! Owns the round state and the set of players alive this round. Every
//! change is published to the [`StateStore`]; nothing else writes those
//! keys.
//!
//! ```text
//!   Lobby ──start──→ Intermission ──timer, ≥1 player──→ Playing
//!                      ▲    │                              │
//!                      │    └──timer, 0 players──┐         │ timer, or nobody left
//!                      │         (re-arm)  ◄─────┘         ▼
//!                      └────────────timer──────────── RoundEnd
//!
//!   any ──shutdown──→ Shutdown
//! ```

use std::any::Any;
use std::cell::{OnceCell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use umbra_service::{Service, ServiceBase, ServiceError, ServiceMap};
use umbra_store::{STATE_STORE, StateStore};
use umbra_tick::TimerHandle;
use umbra_types::{PlayerId, RoundState, Value};
use umbra_world::SimContext;

use crate::{RoundConfig, keys};

/// Registered name of the round controller.
pub const ROUND_SERVICE: &str = "RoundService";

/// Mutable round data. Only the controller touches it, and never while a
/// store listener or arena call is running.
#[derive(Default)]
struct RoundInner {
    state: RoundState,
    alive: BTreeSet<PlayerId>,
    round_number: u32,
    /// The one timer of the current phase (intermission, round, round end).
    phase_timer: Option<TimerHandle>,
    respawns: HashMap<PlayerId, TimerHandle>,
}

impl RoundInner {
    /// Disarms the phase timer, if any.
    fn cancel_phase_timer(&mut self) {
        if let Some(timer) = self.phase_timer.take() {
            if timer.cancel() {
                tracing::debug!(timer = %timer.id(), "phase timer cancelled");
            }
        }
    }

    fn alive_list(&self) -> Vec<PlayerId> {
        self.alive.iter().copied().collect()
    }
}

/// Drives rounds: intermission, play, results, repeat.
pub struct RoundController {
    base: ServiceBase,
    ctx: SimContext,
    config: RoundConfig,
    this: Weak<RoundController>,
    store: OnceCell<Rc<StateStore>>,
    inner: RefCell<RoundInner>,
}

impl RoundController {
    /// Creates a controller in the Lobby state.
    pub fn new(ctx: SimContext, config: RoundConfig) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            base: ServiceBase::new(ROUND_SERVICE, &[STATE_STORE]),
            ctx,
            config,
            this: this.clone(),
            store: OnceCell::new(),
            inner: RefCell::new(RoundInner::default()),
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The current round state.
    pub fn current_state(&self) -> RoundState {
        self.inner.borrow().state
    }

    /// Players alive in the current round, in id order.
    pub fn alive_players(&self) -> Vec<PlayerId> {
        self.inner.borrow().alive_list()
    }

    /// Whether `player` is alive in the current round.
    pub fn is_alive(&self, player: PlayerId) -> bool {
        self.inner.borrow().alive.contains(&player)
    }

    /// Number of rounds started so far.
    pub fn round_number(&self) -> u32 {
        self.inner.borrow().round_number
    }

    /// Whether the current phase has a timer waiting to fire.
    pub fn has_armed_phase_timer(&self) -> bool {
        self.inner
            .borrow()
            .phase_timer
            .as_ref()
            .is_some_and(TimerHandle::is_pending)
    }

    /// Whether a respawn is scheduled for `player`.
    pub fn has_pending_respawn(&self, player: PlayerId) -> bool {
        self.inner
            .borrow()
            .respawns
            .get(&player)
            .is_some_and(TimerHandle::is_pending)
    }

    /// The round settings.
    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Ends the current round. The only way from Playing to RoundEnd.
    ///
    /// Idempotent: while already in RoundEnd this logs a warning and
    /// changes nothing, which settles the race between the round timer and
    /// the last elimination.
    pub fn end_round(&self, reason: &str) {
        let survivors = {
            let mut inner = self.inner.borrow_mut();
            match inner.state {
                RoundState::Playing => {}
                RoundState::RoundEnd => {
                    tracing::warn!(%reason, "round already ended, ignoring");
                    return;
                }
                other => {
                    tracing::warn!(state = %other, %reason, "end_round outside Playing, ignoring");
                    return;
                }
            }
            inner.cancel_phase_timer();
            inner.state = RoundState::RoundEnd;
            inner.phase_timer = Some(self.arm(self.config.round_end(), Self::on_round_end_elapsed));
            inner.alive_list()
        };

        tracing::info!(
            round = self.round_number(),
            %reason,
            survivors = survivors.len(),
            "round ended"
        );
        self.publish(keys::SURVIVORS, survivors);
        self.publish(keys::ROUND_END_REASON, reason);
        self.publish(keys::ROUND_STATE, RoundState::RoundEnd);
    }

    /// Removes `player` from the round and schedules their respawn.
    ///
    /// A player who is not alive this round (already eliminated, joined
    /// late, never connected) is ignored with a warning. Removing the last
    /// player while Playing ends the round.
    pub fn eliminate_player(&self, player: PlayerId, reason: &str) {
        let round_over = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_terminal() {
                tracing::warn!(%player, %reason, "elimination after shutdown, ignoring");
                return;
            }
            if !inner.alive.remove(&player) {
                tracing::warn!(%player, %reason, "player is not alive this round, ignoring");
                return;
            }
            let respawn = self.arm(self.config.respawn_delay(), move |this| this.respawn(player));
            if let Some(previous) = inner.respawns.insert(player, respawn) {
                previous.cancel();
            }
            inner.alive.is_empty() && inner.state.is_playing()
        };

        tracing::info!(%player, %reason, "player eliminated");
        self.ctx.arena.remove_character(player);
        self.publish_alive();

        if round_over {
            self.end_round("all players eliminated");
        }
    }

    /// A player joined the server. While Playing they join the round at a
    /// safe spawn; otherwise they wait for the next one.
    pub fn player_connected(&self, player: PlayerId) {
        if !self.join_round(player) {
            tracing::debug!(%player, state = %self.current_state(), "player connected, waiting for next round");
        }
    }

    /// A player left the server. They leave the round without a respawn;
    /// if nobody is left while Playing, the round ends.
    pub fn player_disconnected(&self, player: PlayerId) {
        let (removed, round_over, respawn) = {
            let mut inner = self.inner.borrow_mut();
            let removed = inner.alive.remove(&player);
            let round_over = removed && inner.alive.is_empty() && inner.state.is_playing();
            (removed, round_over, inner.respawns.remove(&player))
        };
        if let Some(timer) = respawn {
            timer.cancel();
        }
        if !removed {
            return;
        }

        tracing::info!(%player, "player left the round");
        self.publish_alive();
        if round_over {
            self.end_round("all players gone");
        }
    }

    /// Respawn hook: a character for `player` has just appeared. While
    /// Playing the player is put back into the round at a safe spawn.
    pub fn character_spawned(&self, player: PlayerId) {
        if !self.join_round(player) {
            tracing::trace!(%player, "character spawned outside Playing");
        }
    }

    // -----------------------------------------------------------------------
    // Phase transitions
    // -----------------------------------------------------------------------

    fn enter_intermission(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.state.can_transition_to(RoundState::Intermission) {
                tracing::warn!(state = %inner.state, "cannot enter intermission");
                return;
            }
            inner.cancel_phase_timer();
            inner.alive.clear();
            inner.state = RoundState::Intermission;
            inner.phase_timer = Some(self.arm(self.config.intermission(), Self::on_intermission_elapsed));
        }

        tracing::info!(wait_secs = self.config.intermission_secs, "intermission");
        self.publish(keys::ALIVE_PLAYERS, Vec::<PlayerId>::new());
        self.publish(keys::ROUND_STATE, RoundState::Intermission);
    }

    fn enter_playing(&self, players: Vec<PlayerId>) {
        for &player in &players {
            if let Err(e) = self.ctx.arena.place_at_safe_spawn(player) {
                tracing::warn!(%player, error = %e, "could not place player at a safe spawn");
            }
        }

        let round = {
            let mut inner = self.inner.borrow_mut();
            if !inner.state.can_transition_to(RoundState::Playing) {
                tracing::warn!(state = %inner.state, "cannot start playing");
                return;
            }
            inner.alive = players.iter().copied().collect();
            inner.round_number += 1;
            inner.state = RoundState::Playing;
            inner.phase_timer = Some(self.arm(self.config.round_length(), Self::on_round_elapsed));
            inner.round_number
        };

        tracing::info!(round, players = players.len(), "round started");
        self.publish(keys::ROUND_NUMBER, i64::from(round));
        self.publish_alive();
        self.publish(keys::ROUND_STATE, RoundState::Playing);
    }

    fn on_intermission_elapsed(&self) {
        if self.current_state() != RoundState::Intermission {
            return;
        }
        let players = self.ctx.arena.connected_players();
        if players.is_empty() {
            tracing::debug!("no players connected, extending intermission");
            let timer = self.arm(self.config.intermission(), Self::on_intermission_elapsed);
            self.inner.borrow_mut().phase_timer = Some(timer);
            return;
        }
        self.enter_playing(players);
    }

    fn on_round_elapsed(&self) {
        if self.current_state() != RoundState::Playing {
            return;
        }
        self.inner.borrow_mut().phase_timer = None;
        self.end_round("time up");
    }

    fn on_round_end_elapsed(&self) {
        if self.current_state() != RoundState::RoundEnd {
            return;
        }
        self.inner.borrow_mut().phase_timer = None;
        self.enter_intermission();
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Adds `player` to the round if Playing. Returns `false` otherwise.
    fn join_round(&self, player: PlayerId) -> bool {
        let joined = {
            let mut inner = self.inner.borrow_mut();
            if !inner.state.is_playing() {
                return false;
            }
            inner.alive.insert(player)
        };

        if let Err(e) = self.ctx.arena.place_at_safe_spawn(player) {
            tracing::warn!(%player, error = %e, "could not place player at a safe spawn");
        }
        if joined {
            tracing::info!(%player, "player joined the round");
            self.publish_alive();
        }
        true
    }

    fn respawn(&self, player: PlayerId) {
        self.inner.borrow_mut().respawns.remove(&player);
        if self.current_state().is_terminal() {
            return;
        }
        if !self.ctx.arena.connected_players().contains(&player) {
            tracing::debug!(%player, "player left before respawn");
            return;
        }
        if let Err(e) = self.ctx.arena.spawn_character(player) {
            tracing::warn!(%player, error = %e, "respawn failed");
            return;
        }
        tracing::debug!(%player, "player respawned");
        self.character_spawned(player);
    }

    /// Schedules `f` on this controller after `delay`. The timer holds only
    /// a weak reference, so a dropped controller never fires.
    fn arm<F>(&self, delay: Duration, f: F) -> TimerHandle
    where
        F: FnOnce(&Self) + 'static,
    {
        let this = self.this.clone();
        let timer = self.ctx.timers.schedule(delay, move || {
            if let Some(this) = this.upgrade() {
                f(&this);
            }
        });
        tracing::debug!(timer = %timer.id(), delay_ms = delay.as_millis(), "round timer armed");
        timer
    }

    fn publish(&self, key: &str, value: impl Into<Value>) {
        if let Some(store) = self.store.get() {
            store.set(key, value);
        }
    }

    fn publish_alive(&self) {
        let alive = self.alive_players();
        self.publish(keys::ALIVE_PLAYERS, alive);
    }
}

impl Service for RoundController {
    fn base(&self) -> &ServiceBase {
        &self.base
    }

    fn init(&self, deps: &ServiceMap) -> Result<(), ServiceError> {
        if !self.base.init(deps)? {
            return Ok(());
        }
        let store = deps.resolve::<StateStore>(ROUND_SERVICE, STATE_STORE)?;
        store.set(keys::ROUND_STATE, RoundState::Lobby);
        store.set(keys::ROUND_NUMBER, 0_i64);
        // The OnceCell is empty here: the base guard admits init once.
        let _ = self.store.set(store);
        Ok(())
    }

    fn start(&self) -> Result<(), ServiceError> {
        if self.base.start()? {
            self.enter_intermission();
        }
        Ok(())
    }

    fn shutdown(&self) {
        if !self.base.shutdown() {
            return;
        }
        let respawns = {
            let mut inner = self.inner.borrow_mut();
            inner.cancel_phase_timer();
            inner.state = RoundState::Shutdown;
            std::mem::take(&mut inner.respawns)
        };
        for timer in respawns.values() {
            timer.cancel();
        }
        tracing::info!(pending_respawns = respawns.len(), "round controller shut down");
        self.publish(keys::ROUND_STATE, RoundState::Shutdown);
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl fmt::Debug for RoundController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("RoundController")
            .field("state", &inner.state)
            .field("round", &inner.round_number)
            .field("alive", &inner.alive)
            .finish_non_exhaustive()
    }
}
