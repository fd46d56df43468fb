//! Leaderboard score
//!
//! One weight set is used everywhere. Category leaderboards sort by a raw
//! field instead of re-weighting.

/// Points per completed task
pub const TASK_WEIGHT: f64 = 10.0;
/// Points per hour studied
pub const HOUR_WEIGHT: f64 = 5.0;
/// Points per day of streak
pub const STREAK_WEIGHT: f64 = 2.0;
/// Points per achievement
pub const ACHIEVEMENT_WEIGHT: f64 = 20.0;

/// Weighted score of a user's aggregate stats
///
/// Non-decreasing in every input. Negative or NaN hours count as zero.
pub fn score(completed_tasks: usize, total_hours: f64, streak: u32, achievements: usize) -> f64 {
    let hours = if total_hours.is_nan() { 0.0 } else { total_hours.max(0.0) };
    completed_tasks as f64 * TASK_WEIGHT
        + hours * HOUR_WEIGHT
        + f64::from(streak) * STREAK_WEIGHT
        + achievements as f64 * ACHIEVEMENT_WEIGHT
}
