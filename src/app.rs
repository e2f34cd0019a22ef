use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::SessionError;
use crate::machine::{SessionEvent, SessionMachine};
use crate::report::DaySummary;
use crate::runtime::AppEvent;
use crate::scoring::{
    EASY_Q1_LABELS, EASY_Q1_PROMPT, EASY_Q2_LABELS, EASY_Q2_PROMPT, EASY_Q3_LABELS, EASY_Q3_PROMPT,
};
use crate::session::{
    EasyAnswers, Measurements, Phase, REST_CHOICES, WORK_MINUTES_MAX, WORK_MINUTES_MIN,
    WORK_MINUTES_STEP,
};
use crate::stimulus::{Stimulus, StimulusContent, StimulusProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text accepting a non-negative decimal.
    Decimal,
    /// Free text accepting a non-negative integer.
    Count,
    /// One of a fixed set of labelled levels, or unanswered.
    Scale(&'static [&'static str]),
    Stepper { min: u32, max: u32, step: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: &'static str,
    pub kind: FieldKind,
    pub text: String,
    pub value: Option<u32>,
}

impl FormField {
    pub fn decimal(label: &'static str) -> Self {
        Self::with_kind(label, FieldKind::Decimal)
    }

    pub fn count(label: &'static str) -> Self {
        Self::with_kind(label, FieldKind::Count)
    }

    pub fn scale(label: &'static str, levels: &'static [&'static str]) -> Self {
        Self::with_kind(label, FieldKind::Scale(levels))
    }

    pub fn stepper(label: &'static str, min: u32, max: u32, step: u32, value: u32) -> Self {
        Self {
            value: Some(value.clamp(min, max)),
            ..Self::with_kind(label, FieldKind::Stepper { min, max, step })
        }
    }

    fn with_kind(label: &'static str, kind: FieldKind) -> Self {
        Self {
            label,
            kind,
            text: String::new(),
            value: None,
        }
    }

    /// Returns true if the key changed the field.
    pub fn on_key(&mut self, code: KeyCode) -> bool {
        match (self.kind, code) {
            (FieldKind::Decimal, KeyCode::Char(c)) if c.is_ascii_digit() => self.push(c),
            (FieldKind::Decimal, KeyCode::Char('.')) if !self.text.contains('.') => self.push('.'),
            (FieldKind::Count, KeyCode::Char(c)) if c.is_ascii_digit() => self.push(c),
            (FieldKind::Decimal | FieldKind::Count, KeyCode::Backspace) => self.text.pop().is_some(),

            (FieldKind::Scale(levels), KeyCode::Right) => {
                let top = levels.len() as u32 - 1;
                self.value = Some(self.value.map_or(0, |v| (v + 1).min(top)));
                true
            }
            // Stepping left past the lowest level clears the answer.
            (FieldKind::Scale(_), KeyCode::Left) => {
                self.value = self.value.and_then(|v| v.checked_sub(1));
                true
            }
            (FieldKind::Scale(_), KeyCode::Backspace) => self.value.take().is_some(),
            (FieldKind::Scale(levels), KeyCode::Char(c)) => match c.to_digit(10) {
                Some(d) if d >= 1 && (d as usize) <= levels.len() => {
                    self.value = Some(d - 1);
                    true
                }
                _ => false,
            },

            (FieldKind::Stepper { min, max, step }, KeyCode::Right) => {
                self.value = Some(self.value.map_or(min, |v| (v + step).min(max)));
                true
            }
            (FieldKind::Stepper { min, step, .. }, KeyCode::Left) => {
                self.value = Some(self.value.map_or(min, |v| v.saturating_sub(step).max(min)));
                true
            }
            _ => false,
        }
    }

    fn push(&mut self, c: char) -> bool {
        if self.text.len() >= 8 {
            return false;
        }
        self.text.push(c);
        true
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.text.parse().ok()
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self.kind {
            FieldKind::Scale(_) | FieldKind::Stepper { .. } => self.value,
            _ => self.text.parse().ok(),
        }
    }

    pub fn as_level(&self) -> Option<u8> {
        self.value.and_then(|v| u8::try_from(v).ok())
    }

    pub fn display(&self) -> String {
        match self.kind {
            FieldKind::Decimal | FieldKind::Count if self.text.is_empty() => "-".to_string(),
            FieldKind::Decimal | FieldKind::Count => self.text.clone(),
            FieldKind::Scale(levels) => match self.value {
                Some(v) => format!("{} ({}/{})", levels[v as usize], v, levels.len() - 1),
                None => "skip".to_string(),
            },
            FieldKind::Stepper { .. } => self.value.map(|v| format!("{v} min")).unwrap_or_default(),
        }
    }
}

/// A vertical list of fields with one focused entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub focus: usize,
}

impl Form {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields, focus: 0 }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    pub fn on_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_prev(),
            _ => {
                return self
                    .fields
                    .get_mut(self.focus)
                    .is_some_and(|f| f.on_key(code))
            }
        }
        true
    }

    fn measurements(&self, from: usize) -> Measurements {
        Measurements::new(
            self.fields[from].as_f64(),
            self.fields[from + 1].as_u32(),
            self.fields[from + 2].as_u32(),
        )
    }
}

const SETUP_WORK: usize = 0;
const SETUP_MEASURE: usize = 1;
const SETUP_EASY_Q1: usize = 4;

const POST_MEASURE: usize = 0;
const POST_EASY: usize = 3;

pub fn setup_form(work_minutes: u32) -> Form {
    Form::new(vec![
        FormField::stepper(
            "Work duration",
            WORK_MINUTES_MIN,
            WORK_MINUTES_MAX,
            WORK_MINUTES_STEP,
            work_minutes,
        ),
        FormField::decimal("Reaction time (s)"),
        FormField::count("Errors"),
        FormField::count("Ideas"),
        FormField::scale(EASY_Q1_PROMPT, &EASY_Q1_LABELS),
    ])
}

pub fn post_form() -> Form {
    Form::new(vec![
        FormField::decimal("Reaction time (s)"),
        FormField::count("Errors"),
        FormField::count("Ideas"),
        FormField::scale(EASY_Q1_PROMPT, &EASY_Q1_LABELS),
        FormField::scale(EASY_Q2_PROMPT, &EASY_Q2_LABELS),
        FormField::scale(EASY_Q3_PROMPT, &EASY_Q3_LABELS),
    ])
}

/// Stimulus and rest length picked on the Choose screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakChoice {
    pub stimulus: Stimulus,
    pub rest_minutes: u32,
}

impl BreakChoice {
    fn cycle_stimulus(&mut self, forward: bool) {
        let n = Stimulus::ALL.len();
        let i = self.stimulus.index();
        let next = if forward { (i + 1) % n } else { (i + n - 1) % n };
        self.stimulus = Stimulus::from_index(next).unwrap_or(self.stimulus);
    }

    fn step_rest(&mut self, forward: bool) {
        let pos = REST_CHOICES
            .iter()
            .position(|&r| r == self.rest_minutes)
            .unwrap_or(0);
        let pos = if forward {
            (pos + 1).min(REST_CHOICES.len() - 1)
        } else {
            pos.saturating_sub(1)
        };
        self.rest_minutes = REST_CHOICES[pos];
    }
}

/// Presentation state around the session machine.
#[derive(Debug)]
pub struct App {
    pub machine: SessionMachine,
    pub stimuli: StimulusProvider,
    pub setup: Form,
    pub choice: BreakChoice,
    pub post: Form,
    /// Stimulus content as of the last tick of the break.
    pub content: Option<StimulusContent>,
    pub today: Option<DaySummary>,
    pub status: Option<String>,
}

impl App {
    pub fn new(machine: SessionMachine, stimuli: StimulusProvider) -> Self {
        let state = machine.state();
        let setup = setup_form(state.work_minutes);
        let choice = BreakChoice {
            stimulus: state.chosen_stimulus,
            rest_minutes: state.rest_minutes,
        };
        Self {
            machine,
            stimuli,
            setup,
            choice,
            post: post_form(),
            content: None,
            today: None,
            status: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn on_event(&mut self, event: AppEvent) -> Control {
        match event {
            AppEvent::Key(key) => self.on_key(key),
            AppEvent::Tick => {
                self.on_tick();
                Control::Continue
            }
            AppEvent::Resize => Control::Continue,
            AppEvent::InputClosed => {
                tracing::warn!(phase = %self.phase(), "terminal input closed, quitting");
                Control::Quit
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Control {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Control::Quit;
        }

        let phase = self.phase();
        if key.code == KeyCode::Esc {
            if phase == Phase::Results {
                return Control::Quit;
            }
            self.dispatch(SessionEvent::Exit);
            return Control::Continue;
        }

        match phase {
            Phase::Setup => match key.code {
                KeyCode::Enter => self.start_work(),
                code => {
                    self.setup.on_key(code);
                }
            },
            Phase::Work => match key.code {
                KeyCode::Char('b') => self.dispatch(SessionEvent::BreakNow),
                KeyCode::Char('e') => self.dispatch(SessionEvent::Exit),
                _ => {}
            },
            Phase::Choose => match key.code {
                KeyCode::Up => self.choice.cycle_stimulus(false),
                KeyCode::Down => self.choice.cycle_stimulus(true),
                KeyCode::Left => self.choice.step_rest(false),
                KeyCode::Right => self.choice.step_rest(true),
                KeyCode::Enter => self.dispatch(SessionEvent::ConfirmBreak {
                    stimulus: self.choice.stimulus,
                    rest_minutes: self.choice.rest_minutes,
                }),
                KeyCode::Char('w') => self.dispatch(SessionEvent::ReturnToWork),
                KeyCode::Char('e') => self.dispatch(SessionEvent::Exit),
                _ => {}
            },
            Phase::MindWander => match key.code {
                KeyCode::Enter | KeyCode::Char('d') => self.dispatch(SessionEvent::EndBreak),
                KeyCode::Char('w') => self.dispatch(SessionEvent::ReturnToWork),
                KeyCode::Char('e') => self.dispatch(SessionEvent::Exit),
                _ => {}
            },
            Phase::Post => match key.code {
                KeyCode::Enter => self.submit_post(),
                code => {
                    self.post.on_key(code);
                }
            },
            Phase::Results => match key.code {
                KeyCode::Char('n') => self.dispatch(SessionEvent::Reset),
                KeyCode::Char('q') => return Control::Quit,
                _ => {}
            },
        }
        Control::Continue
    }

    /// Expiry checks first, then the stimulus refresh.
    pub fn on_tick(&mut self) {
        if self.phase().is_timed() {
            self.dispatch(SessionEvent::Tick);
        }
        self.refresh_stimulus();
    }

    pub fn refresh_stimulus(&mut self) {
        self.content = match self.machine.stimulus_context() {
            Some((stimulus, ctx)) => {
                self.stimuli
                    .render(stimulus, &ctx, self.machine.anchors_mut())
            }
            None => None,
        };
    }

    fn start_work(&mut self) {
        let minutes = self.setup.fields[SETUP_WORK]
            .as_u32()
            .unwrap_or(self.machine.state().work_minutes);
        if let Err(e) = self.machine.set_work_minutes(minutes) {
            self.report(e);
            return;
        }
        let pre = self.setup.measurements(SETUP_MEASURE);
        let easy_pre_q1 = EasyAnswers::new(self.setup.fields[SETUP_EASY_Q1].as_level(), None, None)
            .clamped()
            .q1;
        self.dispatch(SessionEvent::StartWork { pre, easy_pre_q1 });
    }

    fn submit_post(&mut self) {
        let post = self.post.measurements(POST_MEASURE);
        let level = |i: usize| self.post.fields[POST_EASY + i].as_level();
        let easy = EasyAnswers::new(level(0), level(1), level(2)).clamped();
        self.dispatch(SessionEvent::SubmitPost { post, easy });
    }

    fn dispatch(&mut self, event: SessionEvent) {
        let before = self.phase();
        match self.machine.handle(event) {
            Ok(after) => {
                if after != before {
                    self.status = None;
                    self.entered(after);
                }
            }
            Err(e) => self.report(e),
        }
        if let Some(warning) = self.machine.take_warning() {
            self.status = Some(warning);
        }
    }

    fn entered(&mut self, phase: Phase) {
        match phase {
            Phase::Setup => {
                self.setup = setup_form(self.machine.state().work_minutes);
                self.post = post_form();
                self.today = None;
            }
            Phase::Choose => {
                let state = self.machine.state();
                self.choice = BreakChoice {
                    stimulus: state.chosen_stimulus,
                    rest_minutes: state.rest_minutes,
                };
            }
            Phase::MindWander => self.refresh_stimulus(),
            Phase::Post => {
                self.content = None;
                self.post = post_form();
            }
            Phase::Results => {
                self.content = None;
                self.today = Some(self.machine.today());
            }
            Phase::Work => self.content = None,
        }
    }

    fn report(&mut self, e: SessionError) {
        self.status = Some(e.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bandit::BanditModel;
    use crate::log_store::MemoryLogRepository;
    use crate::session::SessionState;
    use crate::stimulus::StimulusBody;
    use crate::timer::ManualClock;
    use std::sync::Arc;
    use std::time::Duration;

    fn app() -> (App, ManualClock) {
        let clock = ManualClock::default();
        let machine = SessionMachine::new(
            SessionState::default(),
            BanditModel::new(0.0),
            Box::new(MemoryLogRepository::new()),
            Arc::new(clock.clone()),
        )
        .with_seed(3);
        (App::new(machine, StimulusProvider::new(None, Some(3))), clock)
    }

    fn press(app: &mut App, code: KeyCode) -> Control {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_text_fields_accept_only_their_characters() {
        let mut f = FormField::decimal("rt");
        for c in "1a.2.5".chars() {
            f.on_key(KeyCode::Char(c));
        }
        assert_eq!(f.text, "1.25");
        assert_eq!(f.as_f64(), Some(1.25));
        f.on_key(KeyCode::Backspace);
        assert_eq!(f.text, "1.2");

        let mut c = FormField::count("n");
        for ch in "4.2".chars() {
            c.on_key(KeyCode::Char(ch));
        }
        assert_eq!(c.as_u32(), Some(42));
        assert_eq!(FormField::count("n").as_u32(), None);
    }

    #[test]
    fn test_scale_field_steps_and_clears() {
        let mut f = FormField::scale("q", &EASY_Q2_LABELS);
        assert_eq!(f.display(), "skip");
        for _ in 0..10 {
            f.on_key(KeyCode::Right);
        }
        assert_eq!(f.as_level(), Some(3));
        f.on_key(KeyCode::Char('2'));
        assert_eq!(f.as_level(), Some(1));
        assert!(!f.on_key(KeyCode::Char('9')));
        f.on_key(KeyCode::Left);
        f.on_key(KeyCode::Left);
        assert_eq!(f.as_level(), None);
    }

    #[test]
    fn test_stepper_stays_in_range() {
        let mut f = FormField::stepper("work", 5, 90, 5, 25);
        f.on_key(KeyCode::Right);
        assert_eq!(f.as_u32(), Some(30));
        for _ in 0..20 {
            f.on_key(KeyCode::Left);
        }
        assert_eq!(f.as_u32(), Some(5));
        assert_eq!(f.display(), "5 min");
    }

    #[test]
    fn test_form_focus_wraps() {
        let mut form = post_form();
        form.on_key(KeyCode::Up);
        assert_eq!(form.focus, form.fields.len() - 1);
        form.on_key(KeyCode::Tab);
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn test_setup_form_feeds_start_work() {
        let (mut app, _clock) = app();
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Down);
        type_str(&mut app, "0.8");
        press(&mut app, KeyCode::Down);
        type_str(&mut app, "3");
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.phase(), Phase::Work);
        let state = app.machine.state();
        assert_eq!(state.work_minutes, 30);
        assert_eq!(state.pre, Some(Measurements::new(Some(0.8), Some(3), None)));
        assert_eq!(state.easy_pre_q1, Some(0));
        assert_eq!(app.machine.remaining_secs(), 30 * 60);
    }

    #[test]
    fn test_choose_screen_starts_from_recommendation() {
        let (mut app, _clock) = app();
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.phase(), Phase::Choose);
        assert_eq!(app.choice.stimulus, Stimulus::VisualPulse);

        press(&mut app, KeyCode::Up);
        assert_eq!(app.choice.stimulus, Stimulus::ThoughtPrompt);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.choice.rest_minutes, 5);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.phase(), Phase::MindWander);
        assert_eq!(app.machine.state().rest_minutes, 5);
        assert_matches::assert_matches!(
            app.content.as_ref().map(|c| &c.body),
            Some(StimulusBody::Prompt { seconds_to_next: 10, .. })
        );
    }

    #[test]
    fn test_break_ends_on_tick_and_post_submits() {
        let (mut app, clock) = app();
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('b'));
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.machine.state().rest_minutes, 1);

        clock.advance(Duration::from_secs(61));
        app.on_event(AppEvent::Tick);
        assert_eq!(app.phase(), Phase::Post);
        assert!(app.content.is_none());

        press(&mut app, KeyCode::Down);
        type_str(&mut app, "2");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.phase(), Phase::Results);
        let today = app.today.as_ref().unwrap();
        assert_eq!(today.rows.len(), 1);
        assert_eq!(today.rows[0].post_err, Some(2));
        assert_eq!(today.rows[0].mwi, None);
    }

    #[test]
    fn test_closed_input_quits_from_work() {
        let (mut app, _clock) = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.phase(), Phase::Work);
        assert_eq!(app.on_event(AppEvent::InputClosed), Control::Quit);
    }

    #[test]
    fn test_escape_exits_then_quits() {
        let (mut app, _clock) = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(press(&mut app, KeyCode::Esc), Control::Continue);
        assert_eq!(app.phase(), Phase::Results);
        assert!(!app.machine.timer().is_running());
        assert_eq!(press(&mut app, KeyCode::Esc), Control::Quit);
    }

    #[test]
    fn test_ctrl_c_quits_from_anywhere() {
        let (mut app, _clock) = app();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.on_key(key), Control::Quit);
    }

    #[test]
    fn test_new_session_keeps_work_minutes() {
        let (mut app, _clock) = app();
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.phase(), Phase::Results);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.phase(), Phase::Setup);
        assert_eq!(app.setup.fields[SETUP_WORK].as_u32(), Some(20));
        assert!(app.today.is_none());
    }

    #[test]
    fn test_rejected_event_sets_status() {
        let (mut app, _clock) = app();
        app.dispatch(SessionEvent::EndBreak);
        assert!(app.status.as_deref().unwrap().contains("Setup"));
        assert_eq!(app.phase(), Phase::Setup);
    }
}
