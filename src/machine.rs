//! Session state machine.
//!
//! ```text
//! Setup -> Work <-> Choose -> MindWander -> Post -> Results -> Setup
//!            \         \          |   \________________^
//!             \         \_________|___/  (exit)
//!              \___ back to Work _/
//! ```
//!
//! The machine is driven by discrete [`SessionEvent`]s. Button presses map to
//! explicit events and are handled before the periodic [`SessionEvent::Tick`]
//! that detects timer expiry, so a navigation request is never overtaken by an
//! expiry in the same tick.

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

use crate::bandit::BanditModel;
use crate::config::{validate_rest_minutes, validate_work_minutes};
use crate::error::{LogError, SessionError};
use crate::log_store::LogRepository;
use crate::report::DaySummary;
use crate::scoring::{compute_easy_mwi, compute_mwi_for, has_paired_measurement};
use crate::session::{EasyAnswers, Measurements, Phase, SessionRecord, SessionState};
use crate::stimulus::{Stimulus, StimulusContext};
use crate::timer::{Clock, SessionTimer};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StartWork {
        pre: Measurements,
        easy_pre_q1: Option<u8>,
    },
    BreakNow,
    ConfirmBreak {
        stimulus: Stimulus,
        rest_minutes: u32,
    },
    ReturnToWork,
    EndBreak,
    SubmitPost {
        post: Measurements,
        easy: EasyAnswers,
    },
    Exit,
    Reset,
    Tick,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::StartWork { .. } => "start work",
            SessionEvent::BreakNow => "break now",
            SessionEvent::ConfirmBreak { .. } => "confirm break",
            SessionEvent::ReturnToWork => "return to work",
            SessionEvent::EndBreak => "end break",
            SessionEvent::SubmitPost { .. } => "submit measurements",
            SessionEvent::Exit => "exit",
            SessionEvent::Reset => "reset",
            SessionEvent::Tick => "tick",
        }
    }
}

pub struct SessionMachine {
    state: SessionState,
    timer: SessionTimer,
    bandit: BanditModel,
    log: Box<dyn LogRepository>,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    warning: Option<String>,
    default_rest_minutes: u32,
}

impl SessionMachine {
    pub fn new(
        state: SessionState,
        bandit: BanditModel,
        log: Box<dyn LogRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            default_rest_minutes: state.rest_minutes,
            state,
            timer: SessionTimer::new(),
            bandit,
            log,
            clock,
            rng: StdRng::from_entropy(),
            warning: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn bandit(&self) -> &BanditModel {
        &self.bandit
    }

    pub fn log(&self) -> &dyn LogRepository {
        self.log.as_ref()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.timer.remaining(self.clock.now())
    }

    /// Storage problem from the last transition, if any. Cleared on read.
    pub fn take_warning(&mut self) -> Option<String> {
        self.warning.take()
    }

    /// Inputs for the stimulus renderer while a break is running.
    pub fn stimulus_context(&self) -> Option<(Stimulus, StimulusContext)> {
        if self.state.phase != Phase::MindWander {
            return None;
        }
        let now = self.clock.now();
        let elapsed = self
            .state
            .break_started_at
            .map(|s| now.duration_since(s).unwrap_or_default())
            .unwrap_or(Duration::ZERO);
        Some((
            self.state.chosen_stimulus,
            StimulusContext {
                now,
                elapsed,
                rest_minutes: self.state.rest_minutes,
            },
        ))
    }

    pub fn anchors_mut(&mut self) -> &mut crate::session::Anchors {
        &mut self.state.anchors
    }

    /// Today's log rows; read failures become the pending warning.
    pub fn today(&mut self) -> DaySummary {
        let today = self.local_now().date();
        match self.log.filter_by_day(today) {
            Ok(rows) => DaySummary::new(today, rows),
            Err(e) => {
                self.warn_storage("could not read session log", &e);
                DaySummary::new(today, Vec::new())
            }
        }
    }

    pub fn set_work_minutes(&mut self, minutes: u32) -> Result<(), SessionError> {
        if self.state.phase != Phase::Setup {
            return Err(self.invalid("set work duration"));
        }
        self.state.work_minutes = validate_work_minutes(minutes)?;
        Ok(())
    }

    pub fn handle(&mut self, event: SessionEvent) -> Result<Phase, SessionError> {
        let from = self.state.phase;
        let name = event.name();
        let now = self.clock.now();

        let next = match (from, event) {
            (Phase::Setup, SessionEvent::StartWork { pre, easy_pre_q1 }) => {
                self.state.pre = Some(pre);
                self.state.easy_pre_q1 = easy_pre_q1;
                self.state.anchors.clear();
                self.state.work_remaining_secs = None;
                self.timer.start_minutes(self.state.work_minutes, now);
                Phase::Work
            }

            (Phase::Work, SessionEvent::BreakNow) => {
                self.state.work_remaining_secs = Some(self.timer.remaining(now));
                self.timer.stop();
                self.enter_choose();
                Phase::Choose
            }

            (Phase::Work, SessionEvent::Tick) if self.timer.is_expired(now) => {
                self.state.work_remaining_secs = Some(0);
                self.timer.stop();
                self.enter_choose();
                Phase::Choose
            }

            (Phase::Choose, SessionEvent::ConfirmBreak { stimulus, rest_minutes }) => {
                self.state.rest_minutes = validate_rest_minutes(rest_minutes)?;
                self.state.chosen_stimulus = stimulus;
                self.state.anchors.clear();
                self.state.break_started_at = Some(now);
                self.timer.start_minutes(rest_minutes, now);
                Phase::MindWander
            }

            (Phase::Choose, SessionEvent::ReturnToWork) => {
                self.resume_work(now);
                Phase::Work
            }

            (Phase::MindWander, SessionEvent::EndBreak) => {
                self.timer.stop();
                Phase::Post
            }

            (Phase::MindWander, SessionEvent::Tick) if self.timer.is_expired(now) => {
                self.timer.stop();
                Phase::Post
            }

            (Phase::MindWander, SessionEvent::ReturnToWork) => {
                self.timer.stop();
                self.resume_work(now);
                Phase::Work
            }

            (Phase::Post, SessionEvent::SubmitPost { post, easy }) => {
                self.finish(post, easy);
                Phase::Results
            }

            (Phase::Results, SessionEvent::Reset) => {
                self.timer = SessionTimer::new();
                self.state = SessionState::new(self.state.work_minutes, self.default_rest_minutes);
                Phase::Setup
            }

            (p, SessionEvent::Exit) if p != Phase::Results => {
                self.timer.stop();
                Phase::Results
            }

            (p, SessionEvent::Tick) => p,

            (p, _) => {
                tracing::debug!(phase = %p, event = name, "event ignored");
                return Err(SessionError::InvalidTransition { phase: p, event: name });
            }
        };

        if next != from {
            tracing::info!(from = %from, to = %next, event = name, "phase transition");
        }
        self.state.phase = next;
        Ok(next)
    }

    fn enter_choose(&mut self) {
        self.state.anchors.clear();
        let rec = self.bandit.recommend(&mut self.rng);
        tracing::info!(stimulus = %rec.stimulus, reason = %rec.reason, "stimulus recommended");
        self.state.recommendation = Some(rec);
        self.state.chosen_stimulus = rec.stimulus;
    }

    fn resume_work(&mut self, now: std::time::SystemTime) {
        match self.state.work_remaining_secs {
            Some(secs) => self.timer.start(secs, now),
            None => self.timer.start_minutes(self.state.work_minutes, now),
        }
    }

    fn finish(&mut self, post: Measurements, easy: EasyAnswers) {
        let pre = self.state.pre.unwrap_or_default();
        let rest = self.state.rest_minutes;
        let stimulus = self.state.chosen_stimulus;

        let breakdown = has_paired_measurement(&pre, &post).then(|| compute_mwi_for(&pre, &post, rest));
        match breakdown {
            Some(b) if b.is_usable() => self.bandit.update(stimulus, b.mwi),
            Some(b) => tracing::warn!(mwi = b.mwi, "MWI not finite, bandit left unchanged"),
            None => tracing::info!("not enough measurements for MWI, bandit left unchanged"),
        }

        let easy_mwi = easy
            .complete()
            .map(|(q1, q2, q3)| compute_easy_mwi(q1, q2, q3, rest));

        let rec = self.state.recommendation;
        let record = SessionRecord {
            timestamp: self.local_now(),
            work_minutes: self.state.work_minutes,
            rest_minutes: rest,
            recommended_stimulus: rec.map(|r| r.stimulus),
            recommend_reason: rec.map(|r| r.reason),
            chosen_stimulus: stimulus,
            pre_rt: pre.reaction_time,
            post_rt: post.reaction_time,
            pre_err: pre.errors,
            post_err: post.errors,
            pre_idea: pre.ideas,
            post_idea: post.ideas,
            d_rt: breakdown.map(|b| b.d_rt),
            d_err: breakdown.map(|b| b.d_err),
            d_idea: breakdown.map(|b| b.d_idea),
            mwi: breakdown.map(|b| b.mwi),
            easy_pre_q1: self.state.easy_pre_q1,
            easy_q1: easy.q1,
            easy_q2: easy.q2,
            easy_q3: easy.q3,
            easy_mwi,
        };

        if let Err(e) = self.log.append(&record) {
            self.warn_storage("session was not saved to the log", &e);
        }

        self.state.post = Some(post);
        self.state.easy = easy;
        self.state.last_result = Some(record);
    }

    fn warn_storage(&mut self, what: &str, e: &LogError) {
        tracing::warn!(error = %e, "{what}");
        self.warning = Some(format!("{what}: {e}"));
    }

    fn invalid(&self, event: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            phase: self.state.phase,
            event,
        }
    }

    fn local_now(&self) -> NaiveDateTime {
        let now: DateTime<Local> = self.clock.now().into();
        let now = now.naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }
}

impl std::fmt::Debug for SessionMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionMachine")
            .field("state", &self.state)
            .field("timer", &self.timer)
            .field("bandit", &self.bandit)
            .finish_non_exhaustive()
    }
}
