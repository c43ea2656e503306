use api_types::batch::{BatchItemView, BatchResponse};
use engine::{BatchReport, ItemOutcome};

/// Flattens an engine batch report into its wire shape, mapping every
/// successful value with `map`.
pub(crate) fn batch_response<T, V>(
    report: BatchReport<T>,
    map: impl Fn(T) -> V,
) -> BatchResponse<V> {
    let (mut succeeded, mut skipped, mut failed) = (0, 0, 0);
    let items = report
        .items
        .into_iter()
        .map(|item| match item.outcome {
            ItemOutcome::Done(value) => {
                succeeded += 1;
                BatchItemView::Done {
                    id: item.id,
                    value: map(value),
                }
            }
            ItemOutcome::Skipped(reason) => {
                skipped += 1;
                BatchItemView::Skipped {
                    id: item.id,
                    reason: reason.as_str().to_string(),
                }
            }
            ItemOutcome::Failed { kind, message } => {
                failed += 1;
                BatchItemView::Failed {
                    id: item.id,
                    kind: kind.as_str().to_string(),
                    message,
                }
            }
        })
        .collect();

    BatchResponse {
        succeeded,
        skipped,
        failed,
        items,
    }
}
