//! Owner of one live encounter and its paced steps

use std::time::Duration;

use crate::action::{Action, ActionKind};
use crate::config::Pacing;
use crate::engine::{Encounter, Phase};
use crate::error::EncounterError;
use crate::schedule::{EncounterKey, Scheduler};
use crate::sink::PresentationSink;
use crate::strategy::OpponentDecision;

/// A deferred transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Ask the oracle and resolve the round
    OpponentDecision,
    /// Reopen player input after the round result has been shown
    NextRound,
    /// Hand the post-encounter route to the sink
    Navigate,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Encounter(#[from] EncounterError),

    #[error("input is closed until the pending {0:?} step runs")]
    NotAccepting(Step),

    #[error("session was abandoned")]
    Abandoned,
}

/// Drives one encounter with presentation pauses between phases.
///
/// Pending steps are scheduled under this session's encounter key;
/// [`Session::abandon`] retires the key so nothing queued can touch the
/// encounter afterwards.
pub struct Session<S, O> {
    encounter: Encounter<S>,
    oracle: O,
    pacing: Pacing,
    scheduler: Scheduler<Step>,
    key: EncounterKey,
    pending: Option<Step>,
    navigated: bool,
}

impl<S: PresentationSink, O: OpponentDecision> Session<S, O> {
    /// Take ownership of `encounter`. Later rounds are announced to its
    /// sink only when their `NextRound` step fires.
    pub fn new(mut encounter: Encounter<S>, oracle: O, pacing: Pacing) -> Self {
        encounter.defer_round_opening();
        let mut scheduler = Scheduler::new();
        let key = scheduler.register();
        Self {
            encounter,
            oracle,
            pacing,
            scheduler,
            key,
            pending: None,
            navigated: false,
        }
    }

    /// Submit the player's move; the opponent answers after the think delay
    pub fn submit(&mut self, kind: ActionKind, now: Duration) -> Result<Action, SessionError> {
        if self.is_abandoned() {
            return Err(SessionError::Abandoned);
        }
        if let Some(step) = self.pending {
            return Err(SessionError::NotAccepting(step));
        }

        let action = self.encounter.submit_player_choice(kind)?;
        self.schedule(Step::OpponentDecision, now, self.pacing.opponent_think());
        Ok(action)
    }

    /// Run every step due at `now`, including steps they schedule with no
    /// delay. Returns the steps that ran, in order.
    pub fn tick(&mut self, now: Duration) -> Result<Vec<Step>, SessionError> {
        let mut ran = Vec::new();
        loop {
            let due = self.scheduler.drain_due(now);
            if due.is_empty() {
                break;
            }
            for (key, step) in due {
                debug_assert_eq!(key, self.key);
                self.pending = None;
                self.run(step, now)?;
                ran.push(step);
            }
        }
        Ok(ran)
    }

    fn run(&mut self, step: Step, now: Duration) -> Result<(), SessionError> {
        tracing::debug!(?step, round = self.encounter.round(), "running step");
        match step {
            Step::OpponentDecision => {
                self.encounter.resolve_opponent_choice(&mut self.oracle)?;
                let report = self.encounter.resolve_round()?;
                if report.outcome.is_some() {
                    self.schedule(Step::Navigate, now, self.pacing.result_display());
                } else {
                    self.schedule(Step::NextRound, now, self.pacing.round_result());
                }
            }
            Step::NextRound => {
                self.encounter.enter_player_choice_phase()?;
            }
            Step::Navigate => {
                if let Some(route) = self.encounter.conclusion().map(|c| c.route.clone()) {
                    self.encounter.sink_mut().navigate(&route);
                    self.navigated = true;
                }
            }
        }
        Ok(())
    }

    fn schedule(&mut self, step: Step, now: Duration, delay: Duration) {
        if self.scheduler.schedule(self.key, now, delay, step).is_some() {
            self.pending = Some(step);
        }
    }

    /// Drop the encounter's pending steps. Returns how many were dropped.
    pub fn abandon(&mut self) -> usize {
        self.pending = None;
        let dropped = self.scheduler.cancel_encounter(self.key);
        tracing::info!(
            round = self.encounter.round(),
            dropped,
            "encounter abandoned"
        );
        dropped
    }
}

impl<S, O> Session<S, O> {
    pub fn encounter(&self) -> &Encounter<S> {
        &self.encounter
    }

    pub fn into_encounter(self) -> Encounter<S> {
        self.encounter
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.encounter.sink_mut()
    }

    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    pub fn pending(&self) -> Option<Step> {
        self.pending
    }

    /// When the next pending step is due
    pub fn next_due(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    pub fn is_abandoned(&self) -> bool {
        !self.scheduler.is_live(self.key)
    }

    /// The player may submit a move right now
    pub fn is_accepting(&self) -> bool {
        !self.is_abandoned()
            && self.pending.is_none()
            && self.encounter.phase() == Phase::PlayerChoice
    }

    /// The route has been handed to the sink
    pub fn is_finished(&self) -> bool {
        self.navigated
    }
}
