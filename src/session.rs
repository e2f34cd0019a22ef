use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::bandit::{RecommendReason, Recommendation};
use crate::scoring::{EASY_Q1_LABELS, EASY_Q2_LABELS, EASY_Q3_LABELS};
use crate::stimulus::Stimulus;

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const WORK_MINUTES_MIN: u32 = 5;
pub const WORK_MINUTES_MAX: u32 = 90;
pub const WORK_MINUTES_STEP: u32 = 5;

pub const DEFAULT_REST_MINUTES: u32 = 3;
pub const REST_CHOICES: [u32; 5] = [1, 2, 3, 4, 5];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Phase {
    Setup,
    Work,
    Choose,
    #[strum(serialize = "Mind-wander")]
    MindWander,
    Post,
    Results,
}

impl Phase {
    /// Phases during which the session timer is counting down.
    pub fn is_timed(&self) -> bool {
        matches!(self, Phase::Work | Phase::MindWander)
    }
}

/// Quantitative self-report taken before work and after the break.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurements {
    /// Mean reaction time in seconds.
    pub reaction_time: Option<f64>,
    pub errors: Option<u32>,
    pub ideas: Option<u32>,
}

impl Measurements {
    /// A non-positive reaction time means "not measured".
    pub fn new(reaction_time: Option<f64>, errors: Option<u32>, ideas: Option<u32>) -> Self {
        Self {
            reaction_time: reaction_time.filter(|rt| *rt > 0.0 && rt.is_finite()),
            errors,
            ideas,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reaction_time.is_none() && self.errors.is_none() && self.ideas.is_none()
    }
}

/// Answers to the three-question Easy-MWI check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EasyAnswers {
    pub q1: Option<u8>,
    pub q2: Option<u8>,
    pub q3: Option<u8>,
}

impl EasyAnswers {
    pub fn new(q1: Option<u8>, q2: Option<u8>, q3: Option<u8>) -> Self {
        Self { q1, q2, q3 }
    }

    /// Pins each answer to the top of its scale.
    pub fn clamped(self) -> Self {
        Self {
            q1: self.q1.map(|v| v.min((EASY_Q1_LABELS.len() - 1) as u8)),
            q2: self.q2.map(|v| v.min((EASY_Q2_LABELS.len() - 1) as u8)),
            q3: self.q3.map(|v| v.min((EASY_Q3_LABELS.len() - 1) as u8)),
        }
    }

    pub fn complete(&self) -> Option<(u8, u8, u8)> {
        Some((self.q1?, self.q2?, self.q3?))
    }
}

/// Timing checkpoints owned by individual stimuli. All of them reset when a
/// new mind-wandering break begins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Anchors {
    pub prompt: Option<SystemTime>,
    pub prompt_index: Option<usize>,
    pub breath: Option<SystemTime>,
}

impl Anchors {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_clear(&self) -> bool {
        *self == Self::default()
    }
}

/// Everything scoped to the session in progress. Owned by the state machine.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: Phase,
    pub work_minutes: u32,
    pub rest_minutes: u32,
    /// Unused work time saved when a break starts early.
    /// `None` means the next work interval runs the full `work_minutes`.
    pub work_remaining_secs: Option<u64>,
    pub chosen_stimulus: Stimulus,
    pub recommendation: Option<Recommendation>,
    pub pre: Option<Measurements>,
    pub post: Option<Measurements>,
    pub easy_pre_q1: Option<u8>,
    pub easy: EasyAnswers,
    pub anchors: Anchors,
    pub break_started_at: Option<SystemTime>,
    pub last_result: Option<SessionRecord>,
}

impl SessionState {
    pub fn new(work_minutes: u32, rest_minutes: u32) -> Self {
        Self {
            phase: Phase::Setup,
            work_minutes,
            rest_minutes,
            work_remaining_secs: None,
            chosen_stimulus: Stimulus::VisualPulse,
            recommendation: None,
            pre: None,
            post: None,
            easy_pre_q1: None,
            easy: EasyAnswers::default(),
            anchors: Anchors::default(),
            break_started_at: None,
            last_result: None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_WORK_MINUTES, DEFAULT_REST_MINUTES)
    }
}

/// One row of the session log. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub timestamp: NaiveDateTime,
    pub work_minutes: u32,
    pub rest_minutes: u32,
    pub recommended_stimulus: Option<Stimulus>,
    pub recommend_reason: Option<RecommendReason>,
    pub chosen_stimulus: Stimulus,
    #[serde(rename = "preRT")]
    pub pre_rt: Option<f64>,
    #[serde(rename = "postRT")]
    pub post_rt: Option<f64>,
    pub pre_err: Option<u32>,
    pub post_err: Option<u32>,
    pub pre_idea: Option<u32>,
    pub post_idea: Option<u32>,
    #[serde(rename = "dRT")]
    pub d_rt: Option<f64>,
    pub d_err: Option<f64>,
    pub d_idea: Option<f64>,
    pub mwi: Option<f64>,
    pub easy_pre_q1: Option<u8>,
    pub easy_q1: Option<u8>,
    pub easy_q2: Option<u8>,
    pub easy_q3: Option<u8>,
    pub easy_mwi: Option<f64>,
}

impl SessionRecord {
    /// MWI if it was computed and is a real number.
    pub fn usable_mwi(&self) -> Option<f64> {
        self.mwi.filter(|v| v.is_finite())
    }

    pub fn recommendation(&self) -> Option<Recommendation> {
        Some(Recommendation {
            stimulus: self.recommended_stimulus?,
            reason: self.recommend_reason?,
        })
    }
}
