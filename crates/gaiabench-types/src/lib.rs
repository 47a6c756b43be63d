use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tabled::Tabled;

/// One benchmark item from the GAIA validation catalog.
///
/// Field names follow the upstream `metadata.jsonl` schema, which mixes
/// snake_case and capitalized keys. Records are immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
	pub task_id: String,
	#[serde(rename = "Question")]
	pub question: String,
	#[serde(rename = "Final answer")]
	pub final_answer: String,
	/// Difficulty level. The upstream data carries this as either a JSON
	/// number or a string, so it is normalized to a string here.
	#[serde(rename = "Level", deserialize_with = "level_as_string")]
	pub level: String,
	/// Name of the attached file, if any. An empty string in the source
	/// data means "no attachment" and deserializes to `None`.
	#[serde(default, deserialize_with = "empty_as_none")]
	pub file_name: Option<String>,
	#[serde(default, rename = "Annotator Metadata")]
	pub annotator_metadata: AnnotatorMetadata,
}

impl TaskRecord {
	pub fn has_file(&self) -> bool {
		self.file_name.is_some()
	}

	/// The reference solution path written by the annotator.
	pub fn annotator_steps(&self) -> &str {
		&self.annotator_metadata.steps
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotatorMetadata {
	#[serde(default, rename = "Steps")]
	pub steps: String,
}

fn level_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Value::deserialize(deserializer)?;
	match value {
		Value::String(s) => Ok(s),
		Value::Number(n) => Ok(n.to_string()),
		other => Err(serde::de::Error::custom(format!(
			"expected string or number for Level, got {other}"
		))),
	}
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Option::<String>::deserialize(deserializer)?;
	Ok(value.filter(|s| !s.is_empty()))
}

/// Manual review outcome assigned by the operator. Absence of an assignment
/// renders as "Untested" but is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
	AsIs,
	WithSteps,
	Inconclusive,
}

impl Outcome {
	/// Display order used by counts, tables and charts.
	pub const ALL: [Outcome; 3] = [Outcome::AsIs, Outcome::WithSteps, Outcome::Inconclusive];

	pub fn label(&self) -> &'static str {
		match self {
			Outcome::AsIs => "As is",
			Outcome::WithSteps => "With steps",
			Outcome::Inconclusive => "Inconclusive",
		}
	}
}

impl fmt::Display for Outcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Counts per assignable outcome. Tasks without an assignment are excluded,
/// not counted as a fourth category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
	pub as_is: usize,
	pub with_steps: usize,
	pub inconclusive: usize,
}

impl StatusCounts {
	pub fn bump(&mut self, outcome: Outcome) {
		match outcome {
			Outcome::AsIs => self.as_is += 1,
			Outcome::WithSteps => self.with_steps += 1,
			Outcome::Inconclusive => self.inconclusive += 1,
		}
	}

	pub fn get(&self, outcome: Outcome) -> usize {
		match outcome {
			Outcome::AsIs => self.as_is,
			Outcome::WithSteps => self.with_steps,
			Outcome::Inconclusive => self.inconclusive,
		}
	}

	pub fn total(&self) -> usize {
		self.as_is + self.with_steps + self.inconclusive
	}

	pub fn is_empty(&self) -> bool {
		self.total() == 0
	}
}

/// One row of the per-task summary table.
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
pub struct SummaryRow {
	#[tabled(rename = "#")]
	pub index: usize,
	#[tabled(rename = "Test Case")]
	pub task_id: String,
	#[tabled(rename = "Prompt")]
	pub prompt: String,
	#[tabled(rename = "File Attached")]
	pub file_attached: String,
	#[tabled(rename = "Level")]
	pub level: String,
	#[tabled(rename = "Status")]
	pub status: String,
	#[tabled(rename = "User Feedback")]
	pub feedback: String,
}

pub fn truncate(s: &str, max_len: usize) -> String {
	if s.chars().count() <= max_len {
		return s.to_string();
	}
	let mut truncated = s.chars().take(max_len.saturating_sub(1)).collect::<String>();
	truncated.push('…');
	truncated
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn task_record_parses_upstream_schema() {
		let record: TaskRecord = serde_json::from_value(json!({
			"task_id": "c61d22de-5f6c-4958-a7f6-5e9707bd3466",
			"Question": "How many studio albums?",
			"Final answer": "3",
			"Level": 2,
			"file_name": "albums.xlsx",
			"Annotator Metadata": { "Steps": "1. Search discography" }
		}))
		.unwrap();

		assert_eq!(record.level, "2");
		assert_eq!(record.file_name.as_deref(), Some("albums.xlsx"));
		assert_eq!(record.annotator_steps(), "1. Search discography");
	}

	#[test]
	fn level_accepts_string_form() {
		let record: TaskRecord = serde_json::from_value(json!({
			"task_id": "t",
			"Question": "q",
			"Final answer": "a",
			"Level": "1"
		}))
		.unwrap();
		assert_eq!(record.level, "1");
	}

	#[test]
	fn empty_file_name_is_none() {
		let record: TaskRecord = serde_json::from_value(json!({
			"task_id": "t",
			"Question": "q",
			"Final answer": "a",
			"Level": 1,
			"file_name": ""
		}))
		.unwrap();
		assert!(!record.has_file());
		assert_eq!(record.annotator_steps(), "");
	}

	#[test]
	fn outcome_labels() {
		assert_eq!(Outcome::AsIs.to_string(), "As is");
		assert_eq!(Outcome::WithSteps.to_string(), "With steps");
		assert_eq!(Outcome::Inconclusive.to_string(), "Inconclusive");
	}

	#[test]
	fn counts_bump_and_total() {
		let mut counts = StatusCounts::default();
		assert!(counts.is_empty());
		counts.bump(Outcome::WithSteps);
		counts.bump(Outcome::WithSteps);
		counts.bump(Outcome::AsIs);
		assert_eq!(counts.get(Outcome::WithSteps), 2);
		assert_eq!(counts.total(), 3);
	}

	#[test]
	fn truncate_keeps_short_strings() {
		assert_eq!(truncate("short", 10), "short");
		assert_eq!(truncate("a longer string", 8), "a longe…");
	}
}
