use serde::{Deserialize, Serialize};

use crate::session::Measurements;

pub const W_RT: f64 = 0.4;
pub const W_ERR: f64 = 0.4;
pub const W_IDEA: f64 = 0.2;

/// Ordinal answer scales for the Easy-MWI questionnaire.
pub const EASY_Q1_LABELS: [&str; 5] = ["Foggy", "A bit dull", "Neutral", "Clear", "Very clear"];
pub const EASY_Q2_LABELS: [&str; 4] = ["Not at all", "A little", "Quite a bit", "Completely"];
pub const EASY_Q3_LABELS: [&str; 4] = ["Not ready", "Somewhat", "Ready", "Eager"];

pub const EASY_Q1_PROMPT: &str = "How clear does your head feel?";
pub const EASY_Q2_PROMPT: &str = "How freely did your mind wander?";
pub const EASY_Q3_PROMPT: &str = "How ready are you to get back to work?";

/// Result of [`compute_mwi`]: the composite index plus its three relative deltas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MwiBreakdown {
    pub mwi: f64,
    pub d_rt: f64,
    pub d_err: f64,
    pub d_idea: f64,
}

impl MwiBreakdown {
    pub fn is_usable(&self) -> bool {
        self.mwi.is_finite()
    }
}

/// Mind-Wandering Index: weighted before/after improvement divided by the
/// rest length in minutes. A term whose before or after value is missing
/// contributes zero.
pub fn compute_mwi(
    pre_rt: Option<f64>,
    post_rt: Option<f64>,
    pre_err: Option<u32>,
    post_err: Option<u32>,
    pre_idea: Option<u32>,
    post_idea: Option<u32>,
    rest_minutes: u32,
) -> MwiBreakdown {
    let d_rt = match (pre_rt, post_rt) {
        (Some(pre), Some(post)) if pre > 0.0 => (pre - post) / pre,
        _ => 0.0,
    };

    let d_err = match (pre_err, post_err) {
        (Some(pre), Some(post)) => (pre as f64 - post as f64) / pre.max(1) as f64,
        _ => 0.0,
    };

    let d_idea = match (pre_idea, post_idea) {
        (Some(pre), Some(post)) => (post as f64 - pre as f64) / pre.max(1) as f64,
        _ => 0.0,
    };

    let core = W_RT * d_rt + W_ERR * d_err + W_IDEA * d_idea;

    MwiBreakdown {
        mwi: core / rest_minutes.max(1) as f64,
        d_rt,
        d_err,
        d_idea,
    }
}

/// Convenience over [`compute_mwi`] for a pair of measurement triples.
pub fn compute_mwi_for(pre: &Measurements, post: &Measurements, rest_minutes: u32) -> MwiBreakdown {
    compute_mwi(
        pre.reaction_time,
        post.reaction_time,
        pre.errors,
        post.errors,
        pre.ideas,
        post.ideas,
        rest_minutes,
    )
}

/// True when at least one MWI term has both a before and an after value.
/// Without one the index carries no information and is reported as missing.
pub fn has_paired_measurement(pre: &Measurements, post: &Measurements) -> bool {
    let rt = matches!((pre.reaction_time, post.reaction_time), (Some(a), Some(_)) if a > 0.0);
    let err = pre.errors.is_some() && post.errors.is_some();
    let idea = pre.ideas.is_some() && post.ideas.is_some();
    rt || err || idea
}

pub fn compute_easy_mwi(q1: u8, q2: u8, q3: u8, rest_minutes: u32) -> f64 {
    (q1 as f64 + q2 as f64 + q3 as f64) / rest_minutes.max(1) as f64
}
