//! Cumulative summary state
//!
//! The summary only ever grows: a candidate replaces it only after it has
//! passed the local prefix check and the reviewer approved it.
//!
//! ```text
//!            propose ok           approved            commit
//!   (start) ───────────▶ Proposed ────────▶ Reviewed ───────▶ Committed
//!      │                    │
//!      │ prefix violation   │ rejected / unusable verdict
//!      ▼                    ▼
//!   Retrying ◀──────────────┘
//! ```

use recurrent_gatekeeper::{check_prefix_extension, PrefixViolation};
use thiserror::Error;
use tracing::debug;

/// Why a candidate could not be committed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    /// The reviewer has not approved the candidate
    #[error("candidate summary has not been approved by the reviewer")]
    NotReviewed,

    /// The candidate does not extend the current summary
    #[error("{0}")]
    Prefix(PrefixViolation),
}

/// Where the current chunk's candidate is in the review cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryState {
    /// Nothing proposed for the current chunk yet
    Idle,
    /// A candidate passed the local prefix check
    Proposed,
    /// The reviewer approved the candidate
    Reviewed,
    /// The candidate replaced the summary
    Committed,
    /// The last candidate was rejected; a new attempt is due
    Retrying,
}

/// Running summary owned by the driving loop
#[derive(Debug, Clone)]
pub struct CumulativeSummary {
    text: String,
    state: SummaryState,
    commits: usize,
}

impl Default for CumulativeSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl CumulativeSummary {
    /// Start with an empty summary
    pub fn new() -> Self {
        Self {
            text: String::new(),
            state: SummaryState::Idle,
            commits: 0,
        }
    }

    /// Current committed summary
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Current state
    pub fn state(&self) -> SummaryState {
        self.state
    }

    /// Number of committed transitions
    pub fn commits(&self) -> usize {
        self.commits
    }

    /// Check a candidate locally before it goes to the reviewer
    pub fn propose(&mut self, candidate: &str) -> Result<(), PrefixViolation> {
        match check_prefix_extension(&self.text, candidate) {
            Ok(()) => {
                self.state = SummaryState::Proposed;
                Ok(())
            }
            Err(violation) => {
                debug!("Candidate summary failed prefix check: {}", violation);
                self.state = SummaryState::Retrying;
                Err(violation)
            }
        }
    }

    /// Record the reviewer's decision on the proposed candidate
    pub fn record_review(&mut self, approved: bool) {
        self.state = if approved && self.state == SummaryState::Proposed {
            SummaryState::Reviewed
        } else {
            SummaryState::Retrying
        };
    }

    /// Replace the summary with a reviewed candidate
    ///
    /// The prefix invariant is checked again so no code path can commit a
    /// rewrite.
    pub fn commit(&mut self, candidate: String) -> Result<(), CommitError> {
        if self.state != SummaryState::Reviewed {
            self.state = SummaryState::Retrying;
            return Err(CommitError::NotReviewed);
        }
        check_prefix_extension(&self.text, &candidate).map_err(|violation| {
            self.state = SummaryState::Retrying;
            CommitError::Prefix(violation)
        })?;

        self.text = candidate;
        self.state = SummaryState::Committed;
        self.commits += 1;
        Ok(())
    }

    /// Consume the summary, returning the final text
    pub fn into_string(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut summary = CumulativeSummary::new();
        assert_eq!(summary.state(), SummaryState::Idle);

        summary.propose("Alice leaves.").unwrap();
        assert_eq!(summary.state(), SummaryState::Proposed);

        summary.record_review(true);
        assert_eq!(summary.state(), SummaryState::Reviewed);

        summary.commit("Alice leaves.".to_string()).unwrap();
        assert_eq!(summary.state(), SummaryState::Committed);
        assert_eq!(summary.as_str(), "Alice leaves.");
        assert_eq!(summary.commits(), 1);
    }

    #[test]
    fn test_rewrite_rejected_locally() {
        let mut summary = CumulativeSummary::new();
        summary.propose("Alice leaves.").unwrap();
        summary.record_review(true);
        summary.commit("Alice leaves.".to_string()).unwrap();

        let err = summary.propose("Alice left. Bob arrives.").unwrap_err();
        assert!(matches!(err, PrefixViolation::Rewritten { offset: 8 }));
        assert_eq!(summary.state(), SummaryState::Retrying);
        assert_eq!(summary.as_str(), "Alice leaves.");
    }

    #[test]
    fn test_reviewer_rejection() {
        let mut summary = CumulativeSummary::new();
        summary.propose("Draft.").unwrap();
        summary.record_review(false);
        assert_eq!(summary.state(), SummaryState::Retrying);
        assert_eq!(
            summary.commit("Draft.".to_string()),
            Err(CommitError::NotReviewed)
        );
        assert_eq!(summary.as_str(), "");
    }

    #[test]
    fn test_commit_requires_review() {
        let mut summary = CumulativeSummary::new();
        summary.propose("Unreviewed.").unwrap();
        assert!(summary.commit("Unreviewed.".to_string()).is_err());
        assert_eq!(summary.commits(), 0);
    }

    #[test]
    fn test_every_commit_extends_previous() {
        let mut summary = CumulativeSummary::new();
        let candidates = ["A.", "A. B.", "A. B. C."];

        for candidate in candidates {
            let before = summary.as_str().to_string();
            summary.propose(candidate).unwrap();
            summary.record_review(true);
            summary.commit(candidate.to_string()).unwrap();
            assert!(summary.as_str().starts_with(&before));
        }
        assert_eq!(summary.into_string(), "A. B. C.");
    }

    #[test]
    fn test_whitespace_is_significant() {
        let mut summary = CumulativeSummary::new();
        summary.propose("A. ").unwrap();
        summary.record_review(true);
        summary.commit("A. ".to_string()).unwrap();

        // Trimmed prior text is a rewrite, not an extension
        assert!(summary.propose("A.\nB.").is_err());
    }
}
