//! Earliest-deadline-first ordering of the pending queue

use crate::models::job::{Job, JobId};

/// Ids of not-yet-started jobs, earliest SLA deadline first
///
/// The sort is stable, so jobs with equal deadlines keep arrival order.
pub fn edf_order(pending: &[Job]) -> Vec<JobId> {
    let mut order: Vec<&Job> = pending.iter().filter(|j| j.is_pending()).collect();
    order.sort_by(|a, b| a.sla_deadline().total_cmp(&b.sla_deadline()));
    order.into_iter().map(Job::id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobRequest;

    #[test]
    fn test_orders_by_deadline_then_arrival() {
        let jobs = vec![
            Job::new(1, JobRequest::new(4, 50, 20.0, 220.0, 50.0), 0.0),
            Job::new(2, JobRequest::new(1, 16, 5.0, 45.0, 20.0), 1.0),
            Job::new(3, JobRequest::new(2, 32, 12.0, 120.0, 35.0), 0.0),
            Job::new(4, JobRequest::new(1, 16, 5.0, 45.0, 20.0), 1.0),
        ];
        assert_eq!(edf_order(&jobs), vec![2, 4, 3, 1]);
    }
}
