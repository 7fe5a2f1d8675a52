use super::round_to;
use serde::Serialize;

const ATTENDANCE_WEIGHT: f64 = 0.4;
const COMPLETION_WEIGHT: f64 = 0.4;
const PUNCTUALITY_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn for_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::A
        } else if score >= 75.0 {
            Grade::B
        } else if score >= 60.0 {
            Grade::C
        } else {
            Grade::D
        }
    }
}

/// Weighted productivity score, rounded to one decimal. Attendance rate is
/// capped at 100 before weighting.
pub fn productivity_score(attendance_rate: f64, completion_rate: f64, on_time_rate: f64) -> f64 {
    let score = ATTENDANCE_WEIGHT * attendance_rate.min(100.0)
        + COMPLETION_WEIGHT * completion_rate
        + PUNCTUALITY_WEIGHT * on_time_rate;
    round_to(score, 1)
}

/// Score and the grade of the rounded score, so the two always agree.
pub fn score_and_grade(attendance_rate: f64, completion_rate: f64, on_time_rate: f64) -> (f64, Grade) {
    let score = productivity_score(attendance_rate, completion_rate, on_time_rate);
    (score, Grade::for_score(score))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_and_cap() {
        assert_eq!(productivity_score(100.0, 100.0, 100.0), 100.0);
        assert_eq!(productivity_score(150.0, 100.0, 100.0), 100.0);
        assert_eq!(productivity_score(50.0, 50.0, 0.0), 40.0);
        assert_eq!(productivity_score(0.0, 0.0, 100.0), 20.0);
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(Grade::for_score(90.0), Grade::A);
        assert_eq!(Grade::for_score(89.9), Grade::B);
        assert_eq!(Grade::for_score(75.0), Grade::B);
        assert_eq!(Grade::for_score(60.0), Grade::C);
        assert_eq!(Grade::for_score(59.9), Grade::D);
    }

    #[test]
    fn grade_follows_rounded_score() {
        // 0.4*100 + 0.4*87.45 + 0.2*75.0 = 89.98 -> 90.0
        let (score, grade) = score_and_grade(100.0, 87.45, 75.0);
        assert_eq!(score, 90.0);
        assert_eq!(grade, Grade::A);
    }
}
