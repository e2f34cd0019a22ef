use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::stimulus::Stimulus;

pub const DEFAULT_EPSILON: f64 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecommendReason {
    /// Picked at random to keep learning about every stimulus.
    Explore,
    /// Picked because it has the best average reward so far.
    Exploit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub stimulus: Stimulus,
    pub reason: RecommendReason,
}

/// Running estimate for one stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arm {
    pub stimulus: Stimulus,
    pub average_reward: f64,
    pub selection_count: u32,
}

/// Epsilon-greedy recommender over the stimulus catalog.
///
/// Each arm keeps the arithmetic mean of every reward it has received, updated
/// incrementally. The model lives in memory and restarts from zero each run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanditModel {
    epsilon: f64,
    arms: Vec<Arm>,
}

impl BanditModel {
    pub fn new(epsilon: f64) -> Self {
        let arms = Stimulus::ALL
            .iter()
            .map(|&stimulus| Arm {
                stimulus,
                average_reward: 0.0,
                selection_count: 0,
            })
            .collect();
        Self { epsilon, arms }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Arms in catalog order.
    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    pub fn arm(&self, stimulus: Stimulus) -> &Arm {
        &self.arms[stimulus.index()]
    }

    pub fn recommend<R: Rng>(&self, rng: &mut R) -> Recommendation {
        if rng.gen::<f64>() < self.epsilon {
            let stimulus = *Stimulus::ALL
                .choose(rng)
                .unwrap_or(&Stimulus::VisualPulse);
            return Recommendation {
                stimulus,
                reason: RecommendReason::Explore,
            };
        }

        Recommendation {
            stimulus: self.best(),
            reason: RecommendReason::Exploit,
        }
    }

    /// Highest average reward; the earliest catalog entry wins ties.
    pub fn best(&self) -> Stimulus {
        let mut best = &self.arms[0];
        for arm in &self.arms[1..] {
            if arm.average_reward > best.average_reward {
                best = arm;
            }
        }
        best.stimulus
    }

    /// Folds one finite reward into the stimulus' running mean. Callers must
    /// filter out undefined rewards before calling.
    pub fn update(&mut self, stimulus: Stimulus, reward: f64) {
        let arm = &mut self.arms[stimulus.index()];
        arm.selection_count += 1;
        let n = arm.selection_count as f64;
        arm.average_reward += (reward - arm.average_reward) / n;

        tracing::debug!(
            stimulus = %stimulus,
            reward,
            average = arm.average_reward,
            count = arm.selection_count,
            "bandit updated"
        );
    }
}

impl Default for BanditModel {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON)
    }
}
