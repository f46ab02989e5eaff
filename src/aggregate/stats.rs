//! Study summary statistics

use serde::Serialize;

use crate::store::StudyCounts;

/// Survey counts per status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub in_progress: u64,
    pub completed: u64,
    pub abandoned: u64,
}

/// Analytics payload for one study
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStats {
    pub study_id: String,
    pub total_surveys: u64,
    pub unique_patients: u64,
    pub total_responses: u64,
    /// Rounded to two decimals
    pub avg_responses_per_survey: f64,
    pub first_survey_at: Option<String>,
    pub last_survey_at: Option<String>,
    pub status_breakdown: StatusBreakdown,
    /// completed / total, in [0, 1], rounded to four decimals
    pub completion_rate: f64,
}

impl StudyStats {
    pub fn from_counts(study_id: impl Into<String>, counts: StudyCounts) -> Self {
        let avg = ratio(counts.total_responses, counts.total_surveys);
        let completion = ratio(counts.completed, counts.total_surveys);

        Self {
            study_id: study_id.into(),
            total_surveys: counts.total_surveys,
            unique_patients: counts.unique_patients,
            total_responses: counts.total_responses,
            avg_responses_per_survey: round_to(avg, 2),
            first_survey_at: counts.first_survey_at,
            last_survey_at: counts.last_survey_at,
            status_breakdown: StatusBreakdown {
                in_progress: counts.in_progress,
                completed: counts.completed,
                abandoned: counts.abandoned,
            },
            completion_rate: round_to(completion, 4),
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
