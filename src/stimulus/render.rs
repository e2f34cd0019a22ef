use include_dir::{include_dir, Dir};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use super::Stimulus;
use crate::noise;
use crate::session::Anchors;

static STIMULUS_DATA: Dir = include_dir!("src/stimulus/data");

pub const PULSE_PERIOD_SECS: f64 = 4.0;
pub const PULSE_MAX_SCALE: f64 = 3.2;

/// 4-4-6 breathing: (cue, seconds).
pub const BREATH_PATTERN: [(&str, u64); 3] = [("Breathe in", 4), ("Hold", 4), ("Breathe out", 6)];

/// What the break screen needs to know to draw a stimulus.
#[derive(Debug, Clone, Copy)]
pub struct StimulusContext {
    pub now: SystemTime,
    /// Time since the break started.
    pub elapsed: Duration,
    pub rest_minutes: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StimulusBody {
    Pulse { scale: f64, opacity: f64 },
    Noise { track: Result<PathBuf, String> },
    Breath { cue: &'static str, seconds_left: u64 },
    Prompt { text: String, seconds_to_next: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StimulusContent {
    pub stimulus: Stimulus,
    pub heading: &'static str,
    pub caption: &'static str,
    pub body: StimulusBody,
}

/// Produces the content of one stimulus for the current tick.
pub trait StimulusRenderer: Send {
    fn render(&mut self, ctx: &StimulusContext, anchors: &mut Anchors) -> StimulusContent;
}

#[derive(Debug, Clone, Default)]
pub struct VisualPulse;

impl StimulusRenderer for VisualPulse {
    fn render(&mut self, ctx: &StimulusContext, _anchors: &mut Anchors) -> StimulusContent {
        let (scale, opacity) = pulse_at(ctx.elapsed.as_secs_f64());
        StimulusContent {
            stimulus: Stimulus::VisualPulse,
            heading: "Slow pulse",
            caption: "Just watch the movement. Let thoughts pass without holding on.",
            body: StimulusBody::Pulse { scale, opacity },
        }
    }
}

/// Ease-in-out swell from 1.0 to [`PULSE_MAX_SCALE`] and back every period.
pub fn pulse_at(elapsed_secs: f64) -> (f64, f64) {
    let phase = (elapsed_secs % PULSE_PERIOD_SECS) / PULSE_PERIOD_SECS;
    let t = if phase < 0.5 { phase * 2.0 } else { (1.0 - phase) * 2.0 };
    let eased = (1.0 - (PI * t).cos()) / 2.0;
    let scale = 1.0 + (PULSE_MAX_SCALE - 1.0) * eased;
    let opacity = 0.55 - 0.35 * eased;
    (scale, opacity)
}

#[derive(Debug)]
pub struct AudioNoise {
    dir: Option<PathBuf>,
    tracks: HashMap<u32, Result<PathBuf, String>>,
    rng: StdRng,
}

impl AudioNoise {
    pub fn new(dir: Option<PathBuf>, rng: StdRng) -> Self {
        Self {
            dir,
            tracks: HashMap::new(),
            rng,
        }
    }
}

impl StimulusRenderer for AudioNoise {
    fn render(&mut self, ctx: &StimulusContext, _anchors: &mut Anchors) -> StimulusContent {
        let minutes = ctx.rest_minutes.max(1);
        let track = match self.tracks.get(&minutes) {
            Some(t) => t.clone(),
            None => {
                let t = match &self.dir {
                    Some(dir) => noise::ensure_noise_file(dir, minutes, &mut self.rng).map_err(|e| {
                        tracing::warn!(error = %e, "could not write white noise track");
                        e.to_string()
                    }),
                    None => Err("no data directory available for the noise track".to_string()),
                };
                self.tracks.insert(minutes, t.clone());
                t
            }
        };

        StimulusContent {
            stimulus: Stimulus::AudioNoise,
            heading: "White noise",
            caption: "Play the track for the whole break. Keep the volume low.",
            body: StimulusBody::Noise { track },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BreathGuide;

impl StimulusRenderer for BreathGuide {
    fn render(&mut self, ctx: &StimulusContext, anchors: &mut Anchors) -> StimulusContent {
        let anchor = *anchors.breath.get_or_insert(ctx.now);
        let t = ctx.now.duration_since(anchor).unwrap_or_default().as_secs();
        let (cue, seconds_left) = breath_at(t);
        StimulusContent {
            stimulus: Stimulus::BreathGuide,
            heading: "Breathing 4-4-6",
            caption: "In for 4, hold for 4, out for 6. Repeat.",
            body: StimulusBody::Breath { cue, seconds_left },
        }
    }
}

/// Cue and seconds left in it, `t` whole seconds into the pattern.
pub fn breath_at(t: u64) -> (&'static str, u64) {
    let cycle: u64 = BREATH_PATTERN.iter().map(|(_, d)| d).sum();
    let x = t % cycle;
    let mut acc = 0;
    for (cue, dur) in BREATH_PATTERN {
        if x < acc + dur {
            return (cue, acc + dur - x);
        }
        acc += dur;
    }
    (BREATH_PATTERN[0].0, BREATH_PATTERN[0].1)
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptSet {
    pub name: String,
    pub rotate_secs: u64,
    pub prompts: Vec<String>,
}

impl PromptSet {
    pub fn embedded() -> Self {
        let parsed = STIMULUS_DATA
            .get_file("prompts.json")
            .and_then(|f| f.contents_utf8())
            .map(serde_json::from_str::<PromptSet>);

        match parsed {
            Some(Ok(set)) if !set.prompts.is_empty() => set,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "embedded prompt set is malformed");
                Self::fallback()
            }
            _ => Self::fallback(),
        }
    }

    fn fallback() -> Self {
        Self {
            name: "fallback".to_string(),
            rotate_secs: 10,
            prompts: vec!["Let whatever comes up drift past.".to_string()],
        }
    }
}

#[derive(Debug)]
pub struct ThoughtPrompt {
    set: PromptSet,
    rng: StdRng,
}

impl ThoughtPrompt {
    pub fn new(set: PromptSet, rng: StdRng) -> Self {
        Self { set, rng }
    }

    fn pick(&mut self) -> usize {
        self.rng.gen_range(0..self.set.prompts.len().max(1))
    }
}

impl StimulusRenderer for ThoughtPrompt {
    fn render(&mut self, ctx: &StimulusContext, anchors: &mut Anchors) -> StimulusContent {
        let rotate = self.set.rotate_secs.max(1);

        if anchors.prompt.is_none() || anchors.prompt_index.is_none() {
            anchors.prompt = Some(ctx.now);
            anchors.prompt_index = Some(self.pick());
        }

        let mut elapsed = anchors
            .prompt
            .map(|a| ctx.now.duration_since(a).unwrap_or_default().as_secs())
            .unwrap_or(0);

        if elapsed >= rotate {
            anchors.prompt = Some(ctx.now);
            anchors.prompt_index = Some(self.pick());
            elapsed = 0;
        }

        let text = anchors
            .prompt_index
            .and_then(|i| self.set.prompts.get(i))
            .cloned()
            .unwrap_or_default();

        StimulusContent {
            stimulus: Stimulus::ThoughtPrompt,
            heading: "Drifting prompts",
            caption: "Read it once, slowly. Don't grab the thoughts that follow.",
            body: StimulusBody::Prompt {
                text,
                seconds_to_next: rotate - elapsed,
            },
        }
    }
}

/// Lookup table from stimulus to its renderer.
pub struct StimulusProvider {
    renderers: HashMap<Stimulus, Box<dyn StimulusRenderer>>,
}

impl StimulusProvider {
    pub fn new(noise_dir: Option<PathBuf>, seed: Option<u64>) -> Self {
        let rng = |salt: u64| match seed {
            Some(s) => StdRng::seed_from_u64(s.wrapping_add(salt)),
            None => StdRng::from_entropy(),
        };

        let mut renderers: HashMap<Stimulus, Box<dyn StimulusRenderer>> = HashMap::new();
        renderers.insert(Stimulus::VisualPulse, Box::new(VisualPulse));
        renderers.insert(Stimulus::AudioNoise, Box::new(AudioNoise::new(noise_dir, rng(1))));
        renderers.insert(Stimulus::BreathGuide, Box::new(BreathGuide));
        renderers.insert(
            Stimulus::ThoughtPrompt,
            Box::new(ThoughtPrompt::new(PromptSet::embedded(), rng(2))),
        );
        Self { renderers }
    }

    pub fn render(
        &mut self,
        stimulus: Stimulus,
        ctx: &StimulusContext,
        anchors: &mut Anchors,
    ) -> Option<StimulusContent> {
        self.renderers
            .get_mut(&stimulus)
            .map(|r| r.render(ctx, anchors))
    }
}

impl std::fmt::Debug for StimulusProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StimulusProvider")
            .field("stimuli", &self.renderers.len())
            .finish()
    }
}
