//! Exchange history for a solving session
//!
//! A `HistoryEntry` is an audit snapshot of one user/assistant exchange. It is
//! created with the prompt and reply only; extracted code and an evaluation are
//! layered on later through `with_*` methods that return new entries, so an
//! entry already shown to the user never changes underneath it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kata_common::{Error, Result};

use super::require_text;

/// Evaluation result produced by the kata evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KataEvaluation {
    pub ordinal: u32,
    pub response_string: String,
    pub evaluated_code: String,
    pub timestamp: DateTime<Utc>,
}

impl KataEvaluation {
    pub fn new(
        ordinal: u32,
        response_string: impl Into<String>,
        evaluated_code: impl Into<String>,
    ) -> Self {
        Self {
            ordinal,
            response_string: response_string.into(),
            evaluated_code: evaluated_code.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Evaluation data stored alongside a history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "HistoryEvaluationRecord")]
pub struct HistoryEvaluation {
    ordinal: u32,
    response_string: String,
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEvaluationRecord {
    ordinal: u32,
    response_string: String,
    timestamp: DateTime<Utc>,
}

impl TryFrom<HistoryEvaluationRecord> for HistoryEvaluation {
    type Error = Error;

    fn try_from(record: HistoryEvaluationRecord) -> Result<Self> {
        HistoryEvaluation::new(record.ordinal, record.response_string, record.timestamp)
    }
}

impl HistoryEvaluation {
    pub fn new(
        ordinal: u32,
        response_string: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        if ordinal < 1 {
            return Err(Error::InvalidArgument(
                "Ordinal must be at least 1".to_string(),
            ));
        }
        let response_string = response_string.into();
        require_text(&response_string, "Response string")?;

        Ok(Self {
            ordinal,
            response_string,
            timestamp,
        })
    }

    /// Map an evaluator result onto the history model
    pub fn from_kata_evaluation(evaluation: &KataEvaluation) -> Result<Self> {
        Self::new(
            evaluation.ordinal,
            evaluation.response_string.clone(),
            evaluation.timestamp,
        )
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn response_string(&self) -> &str {
        &self.response_string
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// One user/assistant exchange, optionally enriched with code and evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "HistoryEntryRecord")]
pub struct HistoryEntry {
    user_prompt: String,
    assistant_response: String,
    extracted_code: Option<String>,
    evaluation: Option<HistoryEvaluation>,
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEntryRecord {
    user_prompt: String,
    assistant_response: String,
    extracted_code: Option<String>,
    evaluation: Option<HistoryEvaluation>,
    timestamp: DateTime<Utc>,
}

impl TryFrom<HistoryEntryRecord> for HistoryEntry {
    type Error = Error;

    fn try_from(record: HistoryEntryRecord) -> Result<Self> {
        HistoryEntry::restore(
            record.user_prompt,
            record.assistant_response,
            record.extracted_code,
            record.evaluation,
            record.timestamp,
        )
    }
}

impl HistoryEntry {
    /// Record a fresh exchange, stamped with the current time
    pub fn new(
        user_prompt: impl Into<String>,
        assistant_response: impl Into<String>,
    ) -> Result<Self> {
        Self::restore(user_prompt, assistant_response, None, None, Utc::now())
    }

    /// Rebuild an entry with every field supplied
    pub fn restore(
        user_prompt: impl Into<String>,
        assistant_response: impl Into<String>,
        extracted_code: Option<String>,
        evaluation: Option<HistoryEvaluation>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let user_prompt = user_prompt.into();
        let assistant_response = assistant_response.into();
        require_text(&user_prompt, "User prompt")?;
        require_text(&assistant_response, "Assistant response")?;

        Ok(Self {
            user_prompt,
            assistant_response,
            extracted_code,
            evaluation,
            timestamp,
        })
    }

    /// A copy of this entry carrying the given extracted code
    #[must_use]
    pub fn with_extracted_code(&self, code: impl Into<String>) -> Self {
        Self {
            extracted_code: Some(code.into()),
            ..self.clone()
        }
    }

    /// A copy of this entry carrying the given evaluation
    #[must_use]
    pub fn with_evaluation(&self, evaluation: HistoryEvaluation) -> Self {
        Self {
            evaluation: Some(evaluation),
            ..self.clone()
        }
    }

    pub fn has_extracted_code(&self) -> bool {
        self.extracted_code.is_some()
    }

    pub fn has_evaluation(&self) -> bool {
        self.evaluation.is_some()
    }

    pub fn user_prompt(&self) -> &str {
        &self.user_prompt
    }

    pub fn assistant_response(&self) -> &str {
        &self.assistant_response
    }

    pub fn extracted_code(&self) -> Option<&str> {
        self.extracted_code.as_deref()
    }

    pub fn evaluation(&self) -> Option<&HistoryEvaluation> {
        self.evaluation.as_ref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Ordered history of one dialogue session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Swap the most recent entry for an enriched copy
    pub fn replace_latest(&mut self, entry: HistoryEntry) -> Result<()> {
        let slot = self.entries.last_mut().ok_or_else(|| {
            Error::NotFound("Session history has no entry to replace".to_string())
        })?;
        *slot = entry;
        Ok(())
    }

    /// Ordinal to give the next evaluation in this session
    pub fn next_evaluation_ordinal(&self) -> u32 {
        let evaluated = self.entries.iter().filter(|e| e.has_evaluation()).count();
        evaluated as u32 + 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry, used when the session restarts
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
