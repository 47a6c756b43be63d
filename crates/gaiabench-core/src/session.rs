//! Per-operator review state, held in memory for the lifetime of the session.
//!
//! Restarting the process discards everything here; durability is a
//! deliberate non-goal. The session is an explicit context object so that
//! concurrent operators would each own one, rather than sharing globals.

use std::collections::HashMap;

use anyhow::{bail, Result};

use gaiabench_types::Outcome;

use crate::catalog::Catalog;

#[derive(Debug, Default)]
pub struct Session {
    selected: Option<String>,
    answer: Option<String>,
    revised_answer: Option<String>,
    outcomes: HashMap<String, Outcome>,
    feedback: HashMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a task. Switching to a different task clears the transient
    /// answer slots; recorded outcomes and feedback are never touched.
    pub fn select(&mut self, catalog: &Catalog, task_id: &str) -> Result<()> {
        if !catalog.contains(task_id) {
            bail!("unknown task id '{task_id}'");
        }
        if self.selected.as_deref() != Some(task_id) {
            self.answer = None;
            self.revised_answer = None;
        }
        self.selected = Some(task_id.to_string());
        Ok(())
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn set_answer(&mut self, answer: impl Into<String>) {
        self.answer = Some(answer.into());
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn set_revised_answer(&mut self, answer: impl Into<String>) {
        self.revised_answer = Some(answer.into());
    }

    pub fn revised_answer(&self) -> Option<&str> {
        self.revised_answer.as_deref()
    }

    /// Assign an outcome, overwriting any previous assignment for the task.
    /// The id must exist in the catalog; the maps never hold orphan keys.
    pub fn record_outcome(&mut self, catalog: &Catalog, task_id: &str, outcome: Outcome) -> Result<()> {
        if !catalog.contains(task_id) {
            bail!("unknown task id '{task_id}'");
        }
        self.outcomes.insert(task_id.to_string(), outcome);
        Ok(())
    }

    /// Record free-text feedback, independently of the outcome. Overwrites on
    /// resubmission.
    pub fn record_feedback(
        &mut self,
        catalog: &Catalog,
        task_id: &str,
        text: impl Into<String>,
    ) -> Result<()> {
        if !catalog.contains(task_id) {
            bail!("unknown task id '{task_id}'");
        }
        self.feedback.insert(task_id.to_string(), text.into());
        Ok(())
    }

    pub fn outcome_of(&self, task_id: &str) -> Option<Outcome> {
        self.outcomes.get(task_id).copied()
    }

    pub fn feedback_of(&self, task_id: &str) -> Option<&str> {
        self.feedback.get(task_id).map(String::as_str)
    }

    pub fn outcomes(&self) -> &HashMap<String, Outcome> {
        &self.outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaiabench_types::TaskRecord;

    fn catalog() -> Catalog {
        let records = ["a", "b", "c"]
            .iter()
            .map(|id| {
                serde_json::from_value::<TaskRecord>(serde_json::json!({
                    "task_id": id,
                    "Question": format!("question {id}"),
                    "Final answer": "x",
                    "Level": 1
                }))
                .unwrap()
            })
            .collect();
        Catalog::from_records(records)
    }

    #[test]
    fn outcome_assignment_overwrites() {
        let catalog = catalog();
        let mut session = Session::new();
        session.record_outcome(&catalog, "a", Outcome::AsIs).unwrap();
        session.record_outcome(&catalog, "a", Outcome::Inconclusive).unwrap();
        assert_eq!(session.outcome_of("a"), Some(Outcome::Inconclusive));
        assert_eq!(session.outcomes().len(), 1);
    }

    #[test]
    fn unknown_task_id_is_rejected() {
        let catalog = catalog();
        let mut session = Session::new();
        assert!(session.record_outcome(&catalog, "zzz", Outcome::AsIs).is_err());
        assert!(session.record_feedback(&catalog, "zzz", "note").is_err());
        assert!(session.select(&catalog, "zzz").is_err());
        assert!(session.outcomes().is_empty());
    }

    #[test]
    fn switching_task_clears_transient_answers_only() {
        let catalog = catalog();
        let mut session = Session::new();
        session.select(&catalog, "a").unwrap();
        session.set_answer("first answer");
        session.set_revised_answer("revised answer");
        session.record_outcome(&catalog, "a", Outcome::WithSteps).unwrap();
        session.record_feedback(&catalog, "a", "looks ok").unwrap();

        session.select(&catalog, "b").unwrap();
        assert!(session.answer().is_none());
        assert!(session.revised_answer().is_none());
        assert_eq!(session.outcome_of("a"), Some(Outcome::WithSteps));
        assert_eq!(session.feedback_of("a"), Some("looks ok"));
    }

    #[test]
    fn reselecting_the_same_task_keeps_answers() {
        let catalog = catalog();
        let mut session = Session::new();
        session.select(&catalog, "a").unwrap();
        session.set_answer("kept");
        session.select(&catalog, "a").unwrap();
        assert_eq!(session.answer(), Some("kept"));
    }

    #[test]
    fn feedback_is_independent_of_outcome() {
        let catalog = catalog();
        let mut session = Session::new();
        session.record_feedback(&catalog, "b", "only feedback").unwrap();
        assert_eq!(session.outcome_of("b"), None);
        assert_eq!(session.feedback_of("b"), Some("only feedback"));
    }
}
