//! The guided-input state machine
//!
//! Two linear flows share one ordered step list:
//! - creation walks Id → Title → … → Learnings, with `/skip` leaving a
//!   field at its empty default (the Id step cannot be skipped)
//! - editing starts at Title with the draft pre-loaded from the existing
//!   record, `/keep` leaving a field at its pre-loaded value
//!
//! Escape tokens only have meaning in their own flow: `/keep` typed
//! during creation is stored verbatim, as is `/skip` during editing.

use folio_content::{CaseDetails, CaseId, CaseRecord, CaseStudy, ContentDocument};
use std::time::{Duration, Instant};

/// Token that leaves a creation field empty
pub const SKIP_COMMAND: &str = "/skip";
/// Token that keeps an edit field at its existing value
pub const KEEP_COMMAND: &str = "/keep";
/// Token that discards the active conversation
pub const CANCEL_COMMAND: &str = "/cancel";

/// Which guided flow is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// Creating a new case study
    AddCase,
    /// Editing an existing case study
    EditCase,
}

/// One prompt in the guided flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Unique case id (creation only)
    Id,
    /// Project title
    Title,
    /// Short description
    Desc,
    /// Headline metric string
    Metrics,
    /// Comma-separated tags
    Tags,
    /// Problem statement
    Challenge,
    /// Approach steps, one per line
    Approach,
    /// Solution description
    Solution,
    /// Result items, one per line
    Results,
    /// Retrospective notes; terminal step
    Learnings,
}

impl Step {
    const ORDER: [Self; 10] = [
        Self::Id,
        Self::Title,
        Self::Desc,
        Self::Metrics,
        Self::Tags,
        Self::Challenge,
        Self::Approach,
        Self::Solution,
        Self::Results,
        Self::Learnings,
    ];

    fn next(self) -> Option<Self> {
        let index = Self::ORDER.iter().position(|s| *s == self)?;
        Self::ORDER.get(index + 1).copied()
    }

    /// Field label shown in prompts
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Id => "case id",
            Self::Title => "title",
            Self::Desc => "description",
            Self::Metrics => "metrics",
            Self::Tags => "tags (comma-separated)",
            Self::Challenge => "challenge",
            Self::Approach => "approach steps (one per line)",
            Self::Solution => "solution",
            Self::Results => "results (one per line)",
            Self::Learnings => "learnings",
        }
    }

    /// Position within a flow as `(current, total)`
    ///
    /// Creation counts ten steps starting at Id; editing counts nine
    /// starting at Title.
    #[must_use]
    pub fn position(self, kind: FlowKind) -> (usize, usize) {
        let index = Self::ORDER
            .iter()
            .position(|s| *s == self)
            .unwrap_or_default();
        match kind {
            FlowKind::AddCase => (index + 1, Self::ORDER.len()),
            FlowKind::EditCase => (index, Self::ORDER.len() - 1),
        }
    }
}

/// Result of feeding one message into a conversation
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    /// Input accepted; prompt the user for `step` next
    Prompted {
        /// The step to prompt for
        step: Step,
    },
    /// Input rejected; re-prompt the same step with this reason
    Rejected {
        /// Operator-facing rejection message
        reason: String,
    },
    /// Terminal step reached; persist the record and drop the state
    Completed(Box<CaseRecord>),
}

/// Per-user conversation state
#[derive(Debug, Clone)]
pub struct Conversation {
    kind: FlowKind,
    step: Step,
    id: Option<CaseId>,
    study: CaseStudy,
    details: CaseDetails,
    started_at: Instant,
}

impl Conversation {
    /// Start a creation flow at the Id step
    #[must_use]
    pub fn add_case() -> Self {
        Self {
            kind: FlowKind::AddCase,
            step: Step::Id,
            id: None,
            study: CaseStudy::default(),
            details: CaseDetails::default(),
            started_at: Instant::now(),
        }
    }

    /// Start an edit flow pre-loaded from an existing record
    #[must_use]
    pub fn edit_case(record: CaseRecord) -> Self {
        Self {
            kind: FlowKind::EditCase,
            step: Step::Title,
            id: Some(record.id),
            study: record.study,
            details: record.details,
            started_at: Instant::now(),
        }
    }

    /// Which flow this conversation runs
    #[inline]
    #[must_use]
    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    /// The step currently awaiting input
    #[inline]
    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    /// The id collected so far (always set in edit flows)
    #[inline]
    #[must_use]
    pub fn case_id(&self) -> Option<&CaseId> {
        self.id.as_ref()
    }

    /// How long ago the conversation started
    #[must_use]
    pub fn age(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// The draft value currently held for a step, as prompt-ready text
    ///
    /// Edit prompts show this next to the `/keep` hint so the operator
    /// sees what the field holds before deciding to overwrite it.
    #[must_use]
    pub fn draft_field(&self, step: Step) -> String {
        match step {
            Step::Id => self
                .id
                .as_ref()
                .map(|id| id.as_str().to_string())
                .unwrap_or_default(),
            Step::Title => self.study.title.clone(),
            Step::Desc => self.study.desc.clone(),
            Step::Metrics => self.study.metrics.clone(),
            Step::Tags => self.study.tags.join(", "),
            Step::Challenge => self.details.challenge.clone(),
            Step::Approach => self.details.approach.join("\n"),
            Step::Solution => self.details.solution.clone(),
            Step::Results => self.details.results.join("\n"),
            Step::Learnings => self.details.learnings.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn backdate(&mut self, by: Duration) {
        self.started_at -= by;
    }

    /// Feed one user message into the flow
    ///
    /// `doc` is consulted only for the duplicate-id check on the Id
    /// step. Completion returns the finished record; the caller persists
    /// it and discards this conversation.
    pub fn advance(&mut self, input: &str, doc: &ContentDocument) -> FlowOutcome {
        if self.step == Step::Id {
            return self.accept_id(input, doc);
        }

        let skip = self.kind == FlowKind::AddCase && input == SKIP_COMMAND;
        let keep = self.kind == FlowKind::EditCase && input == KEEP_COMMAND;
        if !skip && !keep {
            self.store_field(input);
        }

        match self.step.next() {
            Some(next) => {
                self.step = next;
                FlowOutcome::Prompted { step: next }
            }
            None => {
                let id = self.id.clone().expect("id is set before the terminal step");
                FlowOutcome::Completed(Box::new(CaseRecord {
                    id,
                    study: self.study.clone(),
                    details: self.details.clone(),
                }))
            }
        }
    }

    fn accept_id(&mut self, input: &str, doc: &ContentDocument) -> FlowOutcome {
        if input == SKIP_COMMAND {
            return FlowOutcome::Rejected {
                reason: "the case id is required and cannot be skipped".to_string(),
            };
        }
        let id = match CaseId::parse(input) {
            Ok(id) => id,
            Err(_) => {
                return FlowOutcome::Rejected {
                    reason: format!(
                        "invalid id {input:?}: use only lowercase letters, digits, and underscores"
                    ),
                };
            }
        };
        if doc.case_exists(id.as_str()) {
            return FlowOutcome::Rejected {
                reason: format!("a case with id {input:?} already exists"),
            };
        }
        self.id = Some(id);
        self.step = Step::Title;
        FlowOutcome::Prompted { step: Step::Title }
    }

    fn store_field(&mut self, input: &str) {
        match self.step {
            Step::Id => unreachable!("id step handled separately"),
            Step::Title => self.study.title = input.to_string(),
            Step::Desc => self.study.desc = input.to_string(),
            Step::Metrics => self.study.metrics = input.to_string(),
            Step::Tags => self.study.tags = split_items(input, ','),
            Step::Challenge => self.details.challenge = input.to_string(),
            Step::Approach => self.details.approach = split_lines(input),
            Step::Solution => self.details.solution = input.to_string(),
            Step::Results => self.details.results = split_lines(input),
            Step::Learnings => self.details.learnings = input.to_string(),
        }
    }
}

fn split_items(input: &str, separator: char) -> Vec<String> {
    input
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn split_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc_with_case(id: &str) -> ContentDocument {
        ContentDocument::new(json!({
            "GLOBAL_DATA": {
                "menu": [], "experience": {}, "skills": [],
                "case_studies": {id: {"title": "Existing"}},
                "case_details": {id: {"challenge": "c"}}
            },
            "ACME": {"meta": {"company": "Acme", "timeline": "a"}}
        }))
        .unwrap()
    }

    fn empty_doc() -> ContentDocument {
        ContentDocument::new(json!({
            "GLOBAL_DATA": {"menu": [], "experience": {}, "skills": []},
            "ACME": {"meta": {"company": "Acme", "timeline": "a"}}
        }))
        .unwrap()
    }

    #[test]
    fn creation_with_all_skips_yields_defaults() {
        let doc = empty_doc();
        let mut conv = Conversation::add_case();

        assert_eq!(
            conv.advance("gmx_v2", &doc),
            FlowOutcome::Prompted { step: Step::Title }
        );
        let mut outcome = conv.advance("GMX V2 Trading Interface", &doc);
        for _ in 0..8 {
            assert!(matches!(outcome, FlowOutcome::Prompted { .. }));
            outcome = conv.advance("/skip", &doc);
        }

        let FlowOutcome::Completed(record) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(record.id.as_str(), "gmx_v2");
        assert_eq!(record.study.title, "GMX V2 Trading Interface");
        assert_eq!(record.study.desc, "");
        assert!(record.study.tags.is_empty());
        assert!(record.details.approach.is_empty());
        assert!(record.details.results.is_empty());
        assert_eq!(record.details.learnings, "");
    }

    #[test]
    fn id_step_rejects_skip() {
        let doc = empty_doc();
        let mut conv = Conversation::add_case();
        assert!(matches!(
            conv.advance("/skip", &doc),
            FlowOutcome::Rejected { .. }
        ));
        assert_eq!(conv.step(), Step::Id);
    }

    #[test]
    fn id_step_rejects_bad_slug_without_advancing() {
        let doc = empty_doc();
        let mut conv = Conversation::add_case();
        for bad in ["GMX V2", "dash-ed", ""] {
            assert!(matches!(
                conv.advance(bad, &doc),
                FlowOutcome::Rejected { .. }
            ));
            assert_eq!(conv.step(), Step::Id);
        }
    }

    #[test]
    fn id_step_rejects_duplicate_without_advancing() {
        let doc = doc_with_case("gmx_v2");
        let mut conv = Conversation::add_case();
        let outcome = conv.advance("gmx_v2", &doc);
        assert!(matches!(outcome, FlowOutcome::Rejected { .. }));
        assert_eq!(conv.step(), Step::Id);

        // A free id is still accepted afterwards.
        assert_eq!(
            conv.advance("gmx_v3", &doc),
            FlowOutcome::Prompted { step: Step::Title }
        );
    }

    #[test]
    fn tags_split_on_commas_and_trim() {
        let doc = empty_doc();
        let mut conv = Conversation::add_case();
        conv.advance("tagged", &doc);
        conv.advance("T", &doc);
        conv.advance("/skip", &doc);
        conv.advance("/skip", &doc);
        let outcome = conv.advance("defi, trading , ,ui", &doc);
        assert!(matches!(outcome, FlowOutcome::Prompted { step: Step::Challenge }));

        // Finish to inspect the record.
        conv.advance("/skip", &doc);
        conv.advance("step one\n\n  step two  ", &doc);
        conv.advance("/skip", &doc);
        conv.advance("r1\nr2", &doc);
        let FlowOutcome::Completed(record) = conv.advance("/skip", &doc) else {
            panic!("expected completion");
        };
        assert_eq!(record.study.tags, vec!["defi", "trading", "ui"]);
        assert_eq!(record.details.approach, vec!["step one", "step two"]);
        assert_eq!(record.details.results, vec!["r1", "r2"]);
    }

    #[test]
    fn edit_with_all_keeps_is_identity() {
        let doc = doc_with_case("gmx_v2");
        let id = CaseId::parse("gmx_v2").unwrap();
        let original = doc.case(&id).unwrap();
        let mut conv = Conversation::edit_case(original.clone());

        assert_eq!(conv.step(), Step::Title);
        let mut outcome = FlowOutcome::Prompted { step: Step::Title };
        for _ in 0..9 {
            assert!(matches!(outcome, FlowOutcome::Prompted { .. }));
            outcome = conv.advance("/keep", &doc);
        }
        let FlowOutcome::Completed(record) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(*record, original);
    }

    #[test]
    fn edit_overwrites_only_answered_fields() {
        let doc = doc_with_case("gmx_v2");
        let id = CaseId::parse("gmx_v2").unwrap();
        let original = doc.case(&id).unwrap();
        let mut conv = Conversation::edit_case(original.clone());

        conv.advance("New Title", &doc);
        for _ in 0..8 {
            conv.advance("/keep", &doc);
        }
        // advance returned Completed on the ninth call above; replay to
        // capture it explicitly
        let mut conv = Conversation::edit_case(original.clone());
        conv.advance("New Title", &doc);
        let mut outcome = FlowOutcome::Prompted { step: Step::Desc };
        for _ in 0..8 {
            outcome = conv.advance("/keep", &doc);
        }
        let FlowOutcome::Completed(record) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(record.study.title, "New Title");
        assert_eq!(record.details.challenge, original.details.challenge);
    }

    #[test]
    fn skip_is_literal_text_in_edit_flow() {
        let doc = doc_with_case("gmx_v2");
        let id = CaseId::parse("gmx_v2").unwrap();
        let mut conv = Conversation::edit_case(doc.case(&id).unwrap());
        conv.advance("/skip", &doc);
        let mut outcome = FlowOutcome::Prompted { step: Step::Desc };
        for _ in 0..8 {
            outcome = conv.advance("/keep", &doc);
        }
        let FlowOutcome::Completed(record) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(record.study.title, "/skip");
    }

    #[test]
    fn draft_field_reflects_preloaded_record() {
        let doc = doc_with_case("gmx_v2");
        let id = CaseId::parse("gmx_v2").unwrap();
        let conv = Conversation::edit_case(doc.case(&id).unwrap());
        assert_eq!(conv.draft_field(Step::Title), "Existing");
        assert_eq!(conv.draft_field(Step::Challenge), "c");
        assert_eq!(conv.draft_field(Step::Tags), "");
        assert_eq!(conv.case_id().unwrap().as_str(), "gmx_v2");
    }

    #[test]
    fn step_positions() {
        assert_eq!(Step::Id.position(FlowKind::AddCase), (1, 10));
        assert_eq!(Step::Learnings.position(FlowKind::AddCase), (10, 10));
        assert_eq!(Step::Title.position(FlowKind::EditCase), (1, 9));
        assert_eq!(Step::Learnings.position(FlowKind::EditCase), (9, 9));
    }
}
