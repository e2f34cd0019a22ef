use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use mindswitch::{
    report::fmt_opt,
    session::REST_CHOICES,
    stimulus::{render::PULSE_MAX_SCALE, StimulusBody, StimulusContent},
    timer::format_mmss,
    App, Phase, SessionRecord, Stimulus,
};

use super::{charting, render_form};

/// One phase's view.
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect);
    fn legend(&self) -> &'static str;
}

pub struct SetupScreen;
pub struct WorkScreen;
pub struct ChooseScreen;
pub struct BreakScreen;
pub struct PostScreen;
pub struct ResultsScreen;

pub fn current_screen(phase: Phase) -> Box<dyn Screen> {
    match phase {
        Phase::Setup => Box::new(SetupScreen),
        Phase::Work => Box::new(WorkScreen),
        Phase::Choose => Box::new(ChooseScreen),
        Phase::MindWander => Box::new(BreakScreen),
        Phase::Post => Box::new(PostScreen),
        Phase::Results => Box::new(ResultsScreen),
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_italic() -> Style {
    Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC)
}

/// Big countdown with a progress bar underneath.
fn render_countdown(app: &App, title: &str, f: &mut Frame, area: Rect) {
    let remaining = app.machine.remaining_secs();
    let total = app.machine.timer().total_secs();
    let ratio = if total == 0 {
        1.0
    } else {
        1.0 - remaining as f64 / total as f64
    };

    let rows = Layout::vertical([Constraint::Length(2), Constraint::Length(1)]).split(area);
    let clock = Paragraph::new(vec![
        Line::from(Span::styled(title.to_string(), dim_italic())),
        Line::from(Span::styled(format_mmss(remaining), bold())),
    ])
    .alignment(Alignment::Center);
    f.render_widget(clock, rows[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{} / {}", format_mmss(total - remaining.min(total)), format_mmss(total)));
    f.render_widget(gauge, rows[1]);
}

impl Screen for SetupScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        let rows = Layout::vertical([Constraint::Length(3), Constraint::Min(7)]).split(area);
        let intro = Paragraph::new(
            "Measure yourself before you start. Every field is optional; \
             reaction time, errors and ideas that you also fill in after the break are scored.",
        )
        .style(dim_italic())
        .wrap(Wrap { trim: true });
        f.render_widget(intro, rows[0]);
        render_form(&app.setup, "Before work", f, rows[1]);
    }

    fn legend(&self) -> &'static str {
        "(↑/↓) field  (←/→) adjust  (0-9) type  (enter) start work  (esc) results"
    }
}

impl Screen for WorkScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        let rows = Layout::vertical([
            Constraint::Percentage(40),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);
        render_countdown(app, "focus", f, rows[1]);
    }

    fn legend(&self) -> &'static str {
        "(b)reak now  (e)nd to results  (esc) results"
    }
}

impl Screen for ChooseScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        let state = app.machine.state();
        let recommended = state.recommendation.map(|r| r.stimulus);

        let mut lines = vec![];
        if let Some(rec) = state.recommendation {
            lines.push(Line::from(vec![
                Span::raw("recommended: "),
                Span::styled(rec.stimulus.label(), bold().fg(Color::Cyan)),
                Span::styled(format!("  ({})", rec.reason), dim_italic()),
            ]));
        }
        if let Some(secs) = state.work_remaining_secs.filter(|s| *s > 0) {
            lines.push(Line::from(Span::styled(
                format!("{} of work left for later", format_mmss(secs)),
                dim_italic(),
            )));
        }
        lines.push(Line::default());

        for s in Stimulus::ALL {
            let selected = s == app.choice.stimulus;
            let marker = if selected { "› " } else { "  " };
            let star = if Some(s) == recommended { " ★" } else { "" };
            let style = if selected { bold() } else { Style::default() };
            lines.push(Line::from(vec![
                Span::raw(marker),
                Span::styled(s.label(), style),
                Span::styled(star, Style::default().fg(Color::Yellow)),
            ]));
        }
        lines.push(Line::default());

        let mut rest = vec![Span::raw("rest  ")];
        for r in REST_CHOICES {
            let style = if r == app.choice.rest_minutes {
                bold().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            rest.push(Span::styled(format!(" {r} "), style));
        }
        rest.push(Span::raw(" min"));
        lines.push(Line::from(rest));

        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Choose a break "),
        );
        f.render_widget(widget, area);
    }

    fn legend(&self) -> &'static str {
        "(↑/↓) stimulus  (←/→) rest  (enter) start break  (w)ork  (e)xit"
    }
}

impl Screen for BreakScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        let rows = Layout::vertical([Constraint::Length(3), Constraint::Min(5)]).split(area);
        render_countdown(app, "mind-wander", f, rows[0]);
        if let Some(content) = &app.content {
            render_stimulus(content, f, rows[1]);
        }
    }

    fn legend(&self) -> &'static str {
        "(enter/d) end break  (w)ork  (e)xit"
    }
}

fn render_stimulus(content: &StimulusContent, f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", content.heading));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::vertical([Constraint::Min(3), Constraint::Length(2)]).split(inner);
    let caption = Paragraph::new(content.caption)
        .style(dim_italic())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(caption, rows[1]);

    let body = rows[0];
    match &content.body {
        StimulusBody::Pulse { .. } if body.width == 0 || body.height == 0 => {}
        StimulusBody::Pulse { scale, opacity } => {
            let frac = scale / PULSE_MAX_SCALE;
            let w = ((body.width as f64 * 0.8 * frac).round() as u16).clamp(1, body.width);
            let h = ((body.height as f64 * frac).round() as u16).clamp(1, body.height);
            let shade = (255.0 * opacity.clamp(0.0, 1.0) / 0.55).round() as u8;
            let cell = Rect {
                x: body.x + (body.width - w) / 2,
                y: body.y + (body.height - h) / 2,
                width: w,
                height: h,
            };
            let fill = vec![Line::from("█".repeat(w as usize)); h as usize];
            f.render_widget(
                Paragraph::new(fill).style(Style::default().fg(Color::Rgb(shade / 2, shade / 2, shade))),
                cell,
            );
        }
        StimulusBody::Noise { track } => {
            let lines = match track {
                Ok(path) => vec![
                    Line::from(Span::styled("white noise track ready", bold())),
                    Line::from(path.display().to_string()),
                    Line::from(Span::styled(
                        "open it in any audio player",
                        dim_italic(),
                    )),
                ],
                Err(e) => vec![Line::from(Span::styled(
                    format!("no track: {e}"),
                    Style::default().fg(Color::Red),
                ))],
            };
            f.render_widget(
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: false }),
                body,
            );
        }
        StimulusBody::Breath { cue, seconds_left } => {
            let lines = vec![
                Line::default(),
                Line::from(Span::styled(cue.to_string(), bold().fg(Color::Cyan))),
                Line::from(format!("{seconds_left}")),
            ];
            f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), body);
        }
        StimulusBody::Prompt {
            text,
            seconds_to_next,
        } => {
            let lines = vec![
                Line::default(),
                Line::from(Span::styled(text.clone(), bold())),
                Line::default(),
                Line::from(Span::styled(
                    format!("next prompt in {seconds_to_next}s"),
                    dim_italic(),
                )),
            ];
            f.render_widget(
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true }),
                body,
            );
        }
    }
}

impl Screen for PostScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        render_form(&app.post, "After the break", f, area);
    }

    fn legend(&self) -> &'static str {
        "(↑/↓) field  (←/→) answer  (0-9) type  (enter) submit  (esc) results"
    }
}

fn last_session_lines(record: &SessionRecord) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(format!(
        "work {} min · rest {} min · {}",
        record.work_minutes,
        record.rest_minutes,
        record.chosen_stimulus.label()
    ))];
    if let Some(rec) = record.recommendation() {
        lines.push(Line::from(Span::styled(
            format!("recommended {} ({})", rec.stimulus.label(), rec.reason),
            dim_italic(),
        )));
    }
    lines.push(match record.usable_mwi() {
        Some(mwi) => Line::from(vec![
            Span::styled(format!("MWI {mwi:+.4}"), bold()),
            Span::styled(
                format!(
                    "  (ΔRT {} · Δerr {} · Δideas {})",
                    fmt_opt(record.d_rt),
                    fmt_opt(record.d_err),
                    fmt_opt(record.d_idea)
                ),
                dim_italic(),
            ),
        ]),
        None => Line::from(Span::styled(
            "MWI not computed: no measurement taken both before and after",
            Style::default().fg(Color::Yellow),
        )),
    });
    lines.push(Line::from(format!("Easy-MWI {}", fmt_opt(record.easy_mwi))));
    lines
}

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        let rows = Layout::vertical([
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Min(3),
        ])
        .split(area);

        let last = match &app.machine.state().last_result {
            Some(record) => last_session_lines(record),
            None => vec![Line::from(Span::styled(
                "session ended before the break was measured",
                dim_italic(),
            ))],
        };
        f.render_widget(
            Paragraph::new(last)
                .block(Block::default().borders(Borders::ALL).title(" This session "))
                .wrap(Wrap { trim: true }),
            rows[0],
        );

        let Some(today) = &app.today else {
            return;
        };

        let chart_block = Block::default()
            .borders(Borders::ALL)
            .title(" Today: mean MWI by stimulus ");
        let chart_area = chart_block.inner(rows[1]);
        let chart = if today.by_stimulus.is_empty() {
            vec![Line::from(Span::styled("no scored sessions yet", dim_italic()))]
        } else {
            charting::mwi_bars(&today.by_stimulus, chart_area.width)
        };
        f.render_widget(Paragraph::new(chart).block(chart_block), rows[1]);

        let history: Vec<Line> = today
            .rows
            .iter()
            .map(|r| {
                Line::from(format!(
                    "{}  {:<24} mwi {:>8}  easy {:>7}",
                    r.timestamp.format("%H:%M"),
                    charting::fit_width(r.chosen_stimulus.label(), 24),
                    fmt_opt(r.usable_mwi()),
                    fmt_opt(r.easy_mwi),
                ))
            })
            .collect();
        let mut history_block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Today's sessions ({}) ", today.rows.len()));
        if let Some(path) = app.machine.log().location() {
            history_block = history_block.title_bottom(Line::from(format!(" full log: {} ", path.display())));
        }
        f.render_widget(Paragraph::new(history).block(history_block), rows[2]);
    }

    fn legend(&self) -> &'static str {
        "(n)ew session  (q)uit"
    }
}
