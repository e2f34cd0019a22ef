use chrono::NaiveDate;
use itertools::Itertools;
use std::fmt::Write;

use crate::session::SessionRecord;
use crate::stimulus::Stimulus;

pub fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        n => Some(data.iter().sum::<f64>() / n as f64),
    }
}

/// Population standard deviation.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let variance = data.iter().map(|v| (m - v).powi(2)).sum::<f64>() / data.len() as f64;
    Some(variance.sqrt())
}

#[derive(Debug, Clone, PartialEq)]
pub struct StimulusSummary {
    pub stimulus: Stimulus,
    pub sessions: usize,
    pub mean_mwi: f64,
    pub spread: f64,
}

/// One day of the session log as shown on the results screen.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub day: NaiveDate,
    /// Newest first.
    pub rows: Vec<SessionRecord>,
    /// Best mean MWI first; only rows with a usable MWI count.
    pub by_stimulus: Vec<StimulusSummary>,
}

impl DaySummary {
    pub fn new(day: NaiveDate, records: Vec<SessionRecord>) -> Self {
        let rows: Vec<SessionRecord> = records
            .into_iter()
            .filter(|r| r.timestamp.date() == day)
            .sorted_by(|a, b| b.timestamp.cmp(&a.timestamp))
            .collect();

        let by_stimulus = rows
            .iter()
            .filter_map(|r| r.usable_mwi().map(|m| (r.chosen_stimulus, m)))
            .into_group_map()
            .into_iter()
            .filter_map(|(stimulus, scores)| {
                Some(StimulusSummary {
                    stimulus,
                    sessions: scores.len(),
                    mean_mwi: mean(&scores)?,
                    spread: std_dev(&scores)?,
                })
            })
            .sorted_by(|a, b| {
                b.mean_mwi
                    .partial_cmp(&a.mean_mwi)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.stimulus.index().cmp(&b.stimulus.index()))
            })
            .collect();

        Self {
            day,
            rows,
            by_stimulus,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn scored_sessions(&self) -> usize {
        self.by_stimulus.iter().map(|s| s.sessions).sum()
    }

    /// Plain-text rendition for non-interactive output.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Sessions on {}: {}", self.day, self.rows.len());
        if self.is_empty() {
            let _ = writeln!(out, "No sessions logged today.");
            return out;
        }

        for r in &self.rows {
            let _ = writeln!(
                out,
                "  {}  work {:>2}m  rest {}m  {:<34} mwi {}  easy {}",
                r.timestamp.format("%H:%M:%S"),
                r.work_minutes,
                r.rest_minutes,
                r.chosen_stimulus.label(),
                fmt_opt(r.usable_mwi()),
                fmt_opt(r.easy_mwi),
            );
        }

        if !self.by_stimulus.is_empty() {
            let _ = writeln!(out, "Mean MWI by stimulus ({} scored):", self.scored_sessions());
            for s in &self.by_stimulus {
                let _ = writeln!(
                    out,
                    "  {:<34} {:>8.4}  ±{:.4}  (n={})",
                    s.stimulus.label(),
                    s.mean_mwi,
                    s.spread,
                    s.sessions
                );
            }
        }
        out
    }
}

pub fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn record(at: &str, stimulus: Stimulus, mwi: Option<f64>) -> SessionRecord {
        SessionRecord {
            timestamp: NaiveDateTime::parse_from_str(at, "%Y-%m-%dT%H:%M:%S").unwrap(),
            work_minutes: 25,
            rest_minutes: 2,
            recommended_stimulus: None,
            recommend_reason: None,
            chosen_stimulus: stimulus,
            pre_rt: None,
            post_rt: None,
            pre_err: None,
            post_err: None,
            pre_idea: None,
            post_idea: None,
            d_rt: None,
            d_err: None,
            d_idea: None,
            mwi,
            easy_pre_q1: None,
            easy_q1: None,
            easy_q2: None,
            easy_q3: None,
            easy_mwi: None,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[-5.0, -10.0, -15.0]), Some(-10.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[5.0, 5.0, 5.0]), Some(0.0));
        assert_eq!(std_dev(&[]), None);
        let sd = std_dev(&[-10.0, -5.0, -15.0]).unwrap();
        assert!((sd - 4.08248290463863).abs() < 1e-10);
    }

    #[test]
    fn test_rows_are_today_newest_first() {
        let summary = DaySummary::new(
            day(),
            vec![
                record("2026-10-18T23:00:00", Stimulus::VisualPulse, Some(1.0)),
                record("2026-10-19T08:00:00", Stimulus::VisualPulse, Some(0.2)),
                record("2026-10-19T12:00:00", Stimulus::AudioNoise, None),
            ],
        );
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].chosen_stimulus, Stimulus::AudioNoise);
        assert_eq!(summary.scored_sessions(), 1);
    }

    #[test]
    fn test_means_by_stimulus_sorted_descending() {
        let summary = DaySummary::new(
            day(),
            vec![
                record("2026-10-19T08:00:00", Stimulus::VisualPulse, Some(0.1)),
                record("2026-10-19T09:00:00", Stimulus::BreathGuide, Some(0.4)),
                record("2026-10-19T10:00:00", Stimulus::VisualPulse, Some(0.3)),
                record("2026-10-19T11:00:00", Stimulus::ThoughtPrompt, Some(f64::NAN)),
            ],
        );
        assert_eq!(summary.by_stimulus.len(), 2);
        assert_eq!(summary.by_stimulus[0].stimulus, Stimulus::BreathGuide);
        assert_eq!(summary.by_stimulus[1].stimulus, Stimulus::VisualPulse);
        assert_eq!(summary.by_stimulus[1].sessions, 2);
        assert!((summary.by_stimulus[1].mean_mwi - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_text_rendering() {
        let empty = DaySummary::new(day(), vec![]);
        assert!(empty.to_text().contains("No sessions logged today."));

        let summary = DaySummary::new(
            day(),
            vec![record("2026-10-19T08:00:00", Stimulus::BreathGuide, Some(0.25))],
        );
        let text = summary.to_text();
        assert!(text.contains("Sessions on 2026-10-19: 1"));
        assert!(text.contains("0.2500"));
        assert!(text.contains(Stimulus::BreathGuide.label()));
    }
}
