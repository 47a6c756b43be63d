//! Read-side projections over the catalog and session state. Pure functions,
//! recomputed in full on every render; nothing here is incrementally
//! maintained.

use std::collections::BTreeMap;

use gaiabench_types::{truncate, StatusCounts, SummaryRow};

use crate::catalog::Catalog;
use crate::session::Session;

const PROMPT_PREVIEW_LEN: usize = 64;

/// One row per catalog task, in catalog order. Unassigned tasks show
/// "Untested"; missing feedback shows "N/A".
pub fn table_rows(catalog: &Catalog, session: &Session) -> Vec<SummaryRow> {
    catalog
        .tasks()
        .iter()
        .enumerate()
        .map(|(idx, task)| SummaryRow {
            index: idx + 1,
            task_id: task.task_id.clone(),
            prompt: truncate(&task.question, PROMPT_PREVIEW_LEN),
            file_attached: if task.has_file() { "Yes" } else { "No" }.to_string(),
            level: task.level.clone(),
            status: session
                .outcome_of(&task.task_id)
                .map(|o| o.to_string())
                .unwrap_or_else(|| "Untested".to_string()),
            feedback: session.feedback_of(&task.task_id).unwrap_or("N/A").to_string(),
        })
        .collect()
}

/// Counts per assignable outcome category. Tasks without an assignment are
/// excluded, not shown as a fourth bucket.
pub fn status_counts(session: &Session) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for outcome in session.outcomes().values() {
        counts.bump(*outcome);
    }
    counts
}

/// Level × outcome cross-tabulation, ordered by level. Only tasks with a
/// recorded outcome contribute.
pub fn counts_by_level(catalog: &Catalog, session: &Session) -> Vec<(String, StatusCounts)> {
    let mut by_level: BTreeMap<String, StatusCounts> = BTreeMap::new();
    for task in catalog.tasks() {
        if let Some(outcome) = session.outcome_of(&task.task_id) {
            by_level.entry(task.level.clone()).or_default().bump(outcome);
        }
    }
    by_level.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaiabench_types::{Outcome, TaskRecord};

    fn catalog() -> Catalog {
        let records = [("A", 1), ("B", 1), ("C", 2), ("D", 2), ("E", 3)]
            .iter()
            .map(|(id, level)| {
                serde_json::from_value::<TaskRecord>(serde_json::json!({
                    "task_id": id,
                    "Question": format!("question for {id}"),
                    "Final answer": "x",
                    "Level": level
                }))
                .unwrap()
            })
            .collect();
        Catalog::from_records(records)
    }

    fn session_with_outcomes(catalog: &Catalog) -> Session {
        let mut session = Session::new();
        session.record_outcome(catalog, "A", Outcome::AsIs).unwrap();
        session.record_outcome(catalog, "B", Outcome::WithSteps).unwrap();
        session.record_outcome(catalog, "C", Outcome::WithSteps).unwrap();
        session
    }

    #[test]
    fn category_counts_exclude_unassigned_tasks() {
        let catalog = catalog();
        let session = session_with_outcomes(&catalog);
        let counts = status_counts(&session);
        assert_eq!(counts.as_is, 1);
        assert_eq!(counts.with_steps, 2);
        assert_eq!(counts.inconclusive, 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn table_shows_untested_for_unassigned() {
        let catalog = catalog();
        let session = session_with_outcomes(&catalog);
        let rows = table_rows(&catalog, &session);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].status, "As is");
        assert_eq!(rows[3].status, "Untested");
        assert_eq!(rows[4].status, "Untested");
        assert_eq!(rows[4].feedback, "N/A");
        assert_eq!(rows[0].index, 1);
    }

    #[test]
    fn cross_tab_groups_by_level_in_order() {
        let catalog = catalog();
        let session = session_with_outcomes(&catalog);
        let by_level = counts_by_level(&catalog, &session);
        // Level 3 has no recorded outcome and therefore no row.
        assert_eq!(by_level.len(), 2);
        assert_eq!(by_level[0].0, "1");
        assert_eq!(by_level[0].1.as_is, 1);
        assert_eq!(by_level[0].1.with_steps, 1);
        assert_eq!(by_level[1].0, "2");
        assert_eq!(by_level[1].1.with_steps, 1);
    }

    #[test]
    fn empty_session_degrades_to_empty_projections() {
        let catalog = catalog();
        let session = Session::new();
        assert!(status_counts(&session).is_empty());
        assert!(counts_by_level(&catalog, &session).is_empty());
        let rows = table_rows(&catalog, &session);
        assert!(rows.iter().all(|r| r.status == "Untested"));
    }
}
