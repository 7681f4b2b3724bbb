//! Append-only audit trail of one equivalence run.
//!
//! Every generator, scorer, combiner, filter and extractor invocation appends one
//! [`TraceComponent`], including invocations that selected nothing or failed. The trail
//! is never read back by the decision logic; it ships inside the result so a reader can
//! reconstruct why a decision was (or was not) made.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::{ContentId, EquivalenceContent};
use crate::score::ScoredCandidate;


/// Pipeline stage a trace component belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Generator,
    Scorer,
    Combiner,
    Filter,
    Extractor,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StageKind::Generator => "generator",
            StageKind::Scorer => "scorer",
            StageKind::Combiner => "combiner",
            StageKind::Filter => "filter",
            StageKind::Extractor => "extractor",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub candidate: ContentId,
    /// Rendered score, `NullScore` for the sentinel.
    pub score: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceComponent {
    pub stage: StageKind,
    pub name: String,
    pub entries: Vec<TraceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TraceComponent {
    pub fn new(stage: StageKind, name: impl Into<String>) -> Self {
        Self {
            stage,
            name: name.into(),
            entries: Vec::new(),
            note: None,
        }
    }

    pub fn with_candidates<T: EquivalenceContent>(mut self, selected: &[ScoredCandidate<T>]) -> Self {
        self.entries.extend(selected.iter().map(|c| TraceEntry {
            candidate: c.id().clone(),
            score: c.score.to_string(),
        }));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TraceResult {
    components: Vec<TraceComponent>,
}

impl TraceResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, component: TraceComponent) {
        self.components.push(component);
    }

    /// Records the candidates one stage selected or produced.
    pub fn record<T: EquivalenceContent>(
        &mut self,
        stage: StageKind,
        name: &str,
        selected: &[ScoredCandidate<T>],
    ) {
        self.push(TraceComponent::new(stage, name).with_candidates(selected));
    }

    /// Records an attempt that produced nothing, with a reason.
    pub fn record_note(&mut self, stage: StageKind, name: &str, note: impl Into<String>) {
        self.push(TraceComponent::new(stage, name).with_note(note));
    }

    /// Appends everything recorded in `other`, in order.
    pub fn extend(&mut self, other: TraceResult) {
        self.components.extend(other.components);
    }

    pub fn components(&self) -> &[TraceComponent] {
        &self.components
    }

    pub fn stage(&self, stage: StageKind) -> impl Iterator<Item = &TraceComponent> {
        self.components.iter().filter(move |c| c.stage == stage)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
