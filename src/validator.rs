// ✅ Movement Validator - form gate for entry/exit submissions
//
// Invalid submissions are dropped silently: no record, no error.

use crate::record::{MovementKind, MovementRecord};
use crate::registry::ProductName;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Entry,
    Exit,
}

impl From<Flow> for MovementKind {
    fn from(flow: Flow) -> Self {
        match flow {
            Flow::Entry => MovementKind::Entry,
            Flow::Exit => MovementKind::Exit,
        }
    }
}

/// Build an entry/exit record if the submission passes the form gate.
///
/// # Arguments
/// * `product` - Selected product; blank means nothing was selected
/// * `flow` - Entry or Exit
/// * `quantity` - Must be strictly positive (and finite)
/// * `note` - Free text, stored verbatim
/// * `now` - Timestamp supplied by the caller
///
/// # Returns
/// * `Some(record)` - Record ready to append
/// * `None` - Submission rejected
pub fn build_entry(
    product: &str,
    flow: Flow,
    quantity: f64,
    note: &str,
    now: NaiveDateTime,
) -> Option<MovementRecord> {
    let Some(product) = ProductName::parse(product) else {
        warn!(?flow, quantity, "submission rejected: no product selected");
        return None;
    };

    if !(quantity.is_finite() && quantity > 0.0) {
        warn!(product = %product, ?flow, quantity, "submission rejected: quantity must be positive");
        return None;
    }

    Some(MovementRecord::new(
        now,
        product.as_str(),
        flow.into(),
        quantity,
        note,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 20)
            .unwrap()
            .and_hms_opt(16, 45, 0)
            .unwrap()
    }

    #[test]
    fn test_build_entry_accepts_positive_quantity() {
        let record = build_entry("parafuso m8", Flow::Entry, 100.0, "compra", now()).unwrap();

        assert_eq!(record.product, "PARAFUSO M8");
        assert_eq!(record.kind, MovementKind::Entry);
        assert_eq!(record.quantity, 100.0);
        assert_eq!(record.note, "compra");
        assert_eq!(record.timestamp, now());
    }

    #[test]
    fn test_build_entry_keeps_quantity_verbatim() {
        let record = build_entry("PORCA", Flow::Exit, 0.333, "", now()).unwrap();
        assert_eq!(record.kind, MovementKind::Exit);
        assert_eq!(record.quantity, 0.333);
    }

    #[test]
    fn test_build_entry_rejects_non_positive_quantity() {
        assert!(build_entry("PORCA", Flow::Exit, 0.0, "", now()).is_none());
        assert!(build_entry("PORCA", Flow::Entry, -5.0, "", now()).is_none());
        assert!(build_entry("PORCA", Flow::Entry, f64::NAN, "", now()).is_none());
        assert!(build_entry("PORCA", Flow::Entry, f64::INFINITY, "", now()).is_none());
    }

    #[test]
    fn test_build_entry_rejects_missing_product() {
        assert!(build_entry("", Flow::Entry, 50.0, "", now()).is_none());
        assert!(build_entry("   ", Flow::Entry, 50.0, "", now()).is_none());
    }
}
