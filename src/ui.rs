pub mod charting;
pub mod screen;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use mindswitch::{app::Form, timer::format_mmss, App};

const SIDE_PANEL_WIDTH: u16 = 36;

pub fn draw(app: &App, f: &mut Frame) {
    let rows = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(8),
        Constraint::Length(2),
    ])
    .split(f.area());

    let cols = Layout::horizontal([Constraint::Min(40), Constraint::Length(SIDE_PANEL_WIDTH)])
        .split(rows[1]);

    let screen = screen::current_screen(app.phase());
    render_header(app, f, rows[0]);
    screen.render(app, f, cols[0]);
    render_learning_panel(app, f, cols[1]);
    render_footer(app, screen.legend(), f, rows[2]);
}

fn render_header(app: &App, f: &mut Frame, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut spans = vec![
        Span::styled("mindswitch", bold.fg(Color::Cyan)),
        Span::raw("  ·  "),
        Span::styled(app.phase().to_string(), bold),
    ];
    if app.phase().is_timed() {
        spans.push(Span::raw("  ·  "));
        spans.push(Span::styled(format_mmss(app.machine.remaining_secs()), bold));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Running reward estimates, one row per stimulus.
fn render_learning_panel(app: &App, f: &mut Frame, area: Rect) {
    let bandit = app.machine.bandit();
    let label_width = (SIDE_PANEL_WIDTH as usize).saturating_sub(18);

    let mut lines = vec![Line::from(Span::styled(
        format!("explore rate {:.2}", bandit.epsilon()),
        Style::default().add_modifier(Modifier::ITALIC),
    ))];
    lines.push(Line::default());
    for arm in bandit.arms() {
        lines.push(Line::from(vec![
            Span::raw(charting::fit_width(arm.stimulus.label(), label_width)),
            Span::styled(
                format!(" {:+.3}", arm.average_reward),
                Style::default().fg(if arm.average_reward < 0.0 {
                    Color::Red
                } else {
                    Color::Green
                }),
            ),
            Span::raw(format!(" n={}", arm.selection_count)),
        ]));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::LEFT)
            .title(" learning status "),
    );
    f.render_widget(panel, area);
}

fn render_footer(app: &App, legend: &str, f: &mut Frame, area: Rect) {
    let mut lines = vec![Line::from(Span::styled(
        legend.to_string(),
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))];
    if let Some(status) = &app.status {
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        )));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

/// Field list with the focused row highlighted.
pub(crate) fn render_form(form: &Form, title: &str, f: &mut Frame, area: Rect) {
    let label_width = form
        .fields
        .iter()
        .map(|fld| fld.label.len())
        .max()
        .unwrap_or(0)
        .min(area.width as usize / 2);

    let lines: Vec<Line> = form
        .fields
        .iter()
        .enumerate()
        .map(|(i, fld)| {
            let focused = i == form.focus;
            let marker = if focused { "› " } else { "  " };
            let value_style = if focused {
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(marker),
                Span::raw(charting::fit_width(fld.label, label_width)),
                Span::raw("  "),
                Span::styled(fld.display(), value_style),
            ])
        })
        .collect();

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(format!(" {title} ")))
        .alignment(Alignment::Left);
    f.render_widget(widget, area);
}
