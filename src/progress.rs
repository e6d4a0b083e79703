use std::collections::HashSet;

use mongodb::bson::oid::ObjectId;
use serde::Serialize;

/// How far a user has gotten through one course.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub progress: u32,
    pub completed_count: usize,
    pub total_lectures: usize,
    pub is_completed: bool,
}

/// Intersects a course's lecture list with a user's completed set.
///
/// The completed set is global across courses; lectures deleted after being
/// completed simply drop out of the intersection. A course with no lectures
/// reports 0% progress.
pub fn course_progress(lectures: &[ObjectId], completed: &[ObjectId]) -> ProgressSummary {
    let completed_set: HashSet<&ObjectId> = completed.iter().collect();
    let completed_count = lectures
        .iter()
        .filter(|id| completed_set.contains(id))
        .count();
    let total_lectures = lectures.len();

    let progress = if total_lectures > 0 {
        ((completed_count as f64 / total_lectures as f64) * 100.0).round() as u32
    } else {
        0
    };

    ProgressSummary {
        progress,
        completed_count,
        total_lectures,
        is_completed: progress == 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<ObjectId> {
        (0..n).map(|_| ObjectId::new()).collect()
    }

    #[test]
    fn empty_course_is_zero_percent() {
        let summary = course_progress(&[], &ids(3));
        assert_eq!(summary.progress, 0);
        assert_eq!(summary.completed_count, 0);
        assert_eq!(summary.total_lectures, 0);
        assert!(!summary.is_completed);
    }

    #[test]
    fn two_of_three_rounds_to_67() {
        let lectures = ids(3);
        let completed = vec![lectures[0], lectures[1]];
        let summary = course_progress(&lectures, &completed);
        assert_eq!(summary.progress, 67);
        assert_eq!(summary.completed_count, 2);
        assert_eq!(summary.total_lectures, 3);
        assert!(!summary.is_completed);
    }

    #[test]
    fn one_of_three_rounds_to_33() {
        let lectures = ids(3);
        let summary = course_progress(&lectures, &lectures[..1]);
        assert_eq!(summary.progress, 33);
    }

    #[test]
    fn all_completed_is_100() {
        let lectures = ids(4);
        let summary = course_progress(&lectures, &lectures);
        assert_eq!(summary.progress, 100);
        assert!(summary.is_completed);
    }

    #[test]
    fn foreign_completions_are_ignored() {
        let lectures = ids(2);
        let mut completed = ids(5); // other courses / deleted lectures
        completed.push(lectures[0]);
        let summary = course_progress(&lectures, &completed);
        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.progress, 50);
    }

    #[test]
    fn progress_stays_in_range_and_completes_only_when_full() {
        for total in 1..=20 {
            let lectures = ids(total);
            for done in 0..=total {
                let summary = course_progress(&lectures, &lectures[..done]);
                assert!(summary.progress <= 100);
                assert_eq!(summary.is_completed, done == total);
                assert_eq!(summary.progress == 100, done == total);
            }
        }
    }
}
