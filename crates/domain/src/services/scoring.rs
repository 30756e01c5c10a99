//! Time-based answer scoring.

/// Scores an answer given after `latency_secs` on a question with an optional deadline.
///
/// Open questions (no deadline) score 0. Otherwise the score decays linearly
/// from 1 at display time to 0 at the deadline, multiplied by the answer level
/// when one is set.
pub fn score(latency_secs: f64, question_time: Option<i32>, answer_level: Option<i32>) -> f64 {
    let Some(time) = question_time.filter(|t| *t > 0) else {
        return 0.0;
    };
    let base = (1.0 - latency_secs / f64::from(time)).clamp(0.0, 1.0);
    match answer_level {
        Some(level) => base * f64::from(level),
        None => base,
    }
}

/// Whether an answer given after `latency_secs` still counts.
pub fn within_deadline(latency_secs: f64, question_time: Option<i32>) -> bool {
    question_time.map_or(true, |time| latency_secs <= f64::from(time))
}
