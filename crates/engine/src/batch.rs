//! Per-item outcomes of best-effort batch operations.
//!
//! Batches (settlement generation, bulk withdrawal audits) process items
//! sequentially and keep going when one item fails. The report records what
//! happened to every item instead of collapsing failures into one result.

use serde::{Deserialize, Serialize};

use crate::{EngineError, ErrorKind};

/// Why a batch item was left untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A settlement already exists for the target and period.
    AlreadySettled,
    /// Nothing to pay out for the period.
    NothingToSettle,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlreadySettled => "already_settled",
            Self::NothingToSettle => "nothing_to_settle",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ItemOutcome<T> {
    Done(T),
    Skipped(SkipReason),
    Failed { kind: ErrorKind, message: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct BatchItem<T> {
    /// Target or withdrawal id the outcome belongs to.
    pub id: i64,
    pub outcome: ItemOutcome<T>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BatchReport<T> {
    pub items: Vec<BatchItem<T>>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> BatchReport<T> {
    pub(crate) fn done(&mut self, id: i64, value: T) {
        self.items.push(BatchItem {
            id,
            outcome: ItemOutcome::Done(value),
        });
    }

    pub(crate) fn skipped(&mut self, id: i64, reason: SkipReason) {
        self.items.push(BatchItem {
            id,
            outcome: ItemOutcome::Skipped(reason),
        });
    }

    pub(crate) fn failed(&mut self, id: i64, err: &EngineError) {
        self.items.push(BatchItem {
            id,
            outcome: ItemOutcome::Failed {
                kind: err.kind(),
                message: err.to_string(),
            },
        });
    }

    /// Values of the items that went through.
    pub fn succeeded(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter_map(|item| match &item.outcome {
            ItemOutcome::Done(value) => Some(value),
            _ => None,
        })
    }

    pub fn failed_ids(&self) -> Vec<i64> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Failed { .. }))
            .map(|item| item.id)
            .collect()
    }

    pub fn skipped_ids(&self) -> Vec<i64> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Skipped(_)))
            .map(|item| item.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_keeps_every_outcome_in_order() {
        let mut report = BatchReport::default();
        report.done(1, "ST1");
        report.skipped(2, SkipReason::NothingToSettle);
        report.failed(3, &EngineError::MerchantNotFound("3".to_string()));

        assert_eq!(report.items.len(), 3);
        assert_eq!(report.succeeded().copied().collect::<Vec<_>>(), vec!["ST1"]);
        assert_eq!(report.skipped_ids(), vec![2]);
        assert_eq!(report.failed_ids(), vec![3]);
        assert_eq!(
            report.items[2].outcome,
            ItemOutcome::Failed {
                kind: ErrorKind::NotFound,
                message: "merchant 3 not found".to_string(),
            }
        );
    }
}
