pub mod render;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::UnknownStimulus;

pub use render::{StimulusBody, StimulusContent, StimulusContext, StimulusProvider, StimulusRenderer};

/// Relaxation stimuli offered during the mind-wandering break.
///
/// The catalog order ([`Stimulus::ALL`]) is significant: the recommender breaks
/// ties between equally rated stimuli by taking the first one in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
pub enum Stimulus {
    #[serde(rename = "S1_VisualPulse")]
    #[strum(serialize = "S1_VisualPulse")]
    VisualPulse,
    #[serde(rename = "S2_AudioNoise")]
    #[strum(serialize = "S2_AudioNoise")]
    AudioNoise,
    #[serde(rename = "S3_BreathGuide")]
    #[strum(serialize = "S3_BreathGuide")]
    BreathGuide,
    #[serde(rename = "S4_ThoughtPrompt")]
    #[strum(serialize = "S4_ThoughtPrompt")]
    ThoughtPrompt,
}

impl Stimulus {
    pub const ALL: [Stimulus; 4] = [
        Stimulus::VisualPulse,
        Stimulus::AudioNoise,
        Stimulus::BreathGuide,
        Stimulus::ThoughtPrompt,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Stimulus::VisualPulse => "S1_VisualPulse",
            Stimulus::AudioNoise => "S2_AudioNoise",
            Stimulus::BreathGuide => "S3_BreathGuide",
            Stimulus::ThoughtPrompt => "S4_ThoughtPrompt",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stimulus::VisualPulse => "Visual: slow pulse",
            Stimulus::AudioNoise => "Audio: white noise",
            Stimulus::BreathGuide => "Breathing: 4-4-6 guide",
            Stimulus::ThoughtPrompt => "Prompts: new sentence every 10s",
        }
    }

    /// Position in the catalog.
    pub fn index(&self) -> usize {
        match self {
            Stimulus::VisualPulse => 0,
            Stimulus::AudioNoise => 1,
            Stimulus::BreathGuide => 2,
            Stimulus::ThoughtPrompt => 3,
        }
    }

    pub fn from_index(idx: usize) -> Option<Stimulus> {
        Self::ALL.get(idx).copied()
    }
}

impl FromStr for Stimulus {
    type Err = UnknownStimulus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stimulus::ALL
            .iter()
            .find(|st| st.key() == s)
            .copied()
            .ok_or_else(|| UnknownStimulus(s.to_string()))
    }
}
