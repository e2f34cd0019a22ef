use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use mindswitch::report::StimulusSummary;

const BAR: &str = "█";
const LABEL_WIDTH: usize = 24;

/// Largest magnitude among `values`, never below a small floor so an
/// all-zero chart still has a scale.
pub fn bar_scale(values: &[f64]) -> f64 {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold(1e-3, |acc, v| acc.max(v.abs()))
}

/// Cells for one bar; any non-zero value gets at least one.
pub fn bar_len(value: f64, scale: f64, width: usize) -> usize {
    if !value.is_finite() || value == 0.0 || scale <= 0.0 {
        return 0;
    }
    ((value.abs() / scale) * width as f64).round().clamp(1.0, width as f64) as usize
}

/// Pads or cuts `s` to exactly `width` terminal columns.
pub fn fit_width(s: &str, width: usize) -> String {
    if s.width() <= width {
        return format!("{s}{}", " ".repeat(width - s.width()));
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Horizontal bars of mean MWI per stimulus. Negative means are drawn in red.
pub fn mwi_bars(rows: &[StimulusSummary], width: u16) -> Vec<Line<'static>> {
    let scale = bar_scale(&rows.iter().map(|r| r.mean_mwi).collect::<Vec<_>>());
    let bar_width = (width as usize).saturating_sub(LABEL_WIDTH + 18).max(1);

    rows.iter()
        .map(|r| {
            let color = if r.mean_mwi < 0.0 { Color::Red } else { Color::Green };
            let len = bar_len(r.mean_mwi, scale, bar_width);
            Line::from(vec![
                Span::styled(
                    fit_width(r.stimulus.label(), LABEL_WIDTH),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::styled(BAR.repeat(len), Style::default().fg(color)),
                Span::raw(format!(" {:+.3} (n={})", r.mean_mwi, r.sessions)),
            ])
        })
        .collect()
}
