//! Quality control point and quality check models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{NotConformFate, QcMeasurements, ReconciliationConsistency};

selection! {
    /// Outcome of a quality check
    #[derive(Default)]
    pub enum QualityState {
        #[default]
        Todo => ("none", "To do"),
        Pass => ("pass", "Passed"),
        Fail => ("fail", "Failed"),
    }
}

/// Control point generating quality checks on transfers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityPoint {
    pub id: Uuid,
    pub name: String,
    /// R&R forms must be validated before checks of this point are processed
    pub is_form_validation_required: bool,
}

/// A quality check on a product, usually attached to a transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityCheck {
    pub id: Uuid,
    pub name: String,
    pub point_id: Uuid,
    pub product_id: Uuid,
    pub picking_id: Option<Uuid>,
    pub quality_state: QualityState,
    pub qty_conform: Decimal,
    pub qty_not_conform: Decimal,
    pub qc_reconciliation_consistency: Option<ReconciliationConsistency>,
    pub qc_reconciliation_comment: Option<String>,
    pub not_conform_fate: Option<NotConformFate>,
    pub not_conform_custom_fate: Option<String>,
    pub final_packaging_size: Option<String>,
}

impl QualityCheck {
    /// Measurements as copied on a QC result form
    pub fn measurements(&self, qty_tested: Decimal) -> QcMeasurements {
        QcMeasurements {
            qty_tested,
            qty_conform: self.qty_conform,
            qty_not_conform: self.qty_not_conform,
            qc_reconciliation_consistency: self.qc_reconciliation_consistency,
            qc_reconciliation_comment: self.qc_reconciliation_comment.clone(),
            not_conform_fate: self.not_conform_fate,
            not_conform_custom_fate: self.not_conform_custom_fate.clone(),
            final_packaging_size: self.final_packaging_size.clone(),
        }
    }
}

/// Parent form and tested quantity derived for a check
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QcInfo {
    pub parent_form_id: Option<Uuid>,
    pub qty_tested: Decimal,
    /// Critical product on a transfer without move lines
    pub show_warning_message: bool,
}

/// Editable QC fields of a check; `None` leaves a value untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityCheckChanges {
    pub qty_conform: Option<Decimal>,
    pub qty_not_conform: Option<Decimal>,
    pub qc_reconciliation_consistency: Option<ReconciliationConsistency>,
    pub qc_reconciliation_comment: Option<String>,
    pub not_conform_fate: Option<NotConformFate>,
    pub not_conform_custom_fate: Option<String>,
    pub final_packaging_size: Option<String>,
}

impl QualityCheckChanges {
    /// Names of the provided fields whose value differs from the QC result form
    pub fn diverging_fields(&self, form: &QcMeasurements) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.qty_conform.is_some_and(|v| v != form.qty_conform) {
            fields.push("qty_conform");
        }
        if self.qty_not_conform.is_some_and(|v| v != form.qty_not_conform) {
            fields.push("qty_not_conform");
        }
        if self.qc_reconciliation_consistency.is_some()
            && self.qc_reconciliation_consistency != form.qc_reconciliation_consistency
        {
            fields.push("qc_reconciliation_consistency");
        }
        if self.qc_reconciliation_comment.is_some()
            && self.qc_reconciliation_comment != form.qc_reconciliation_comment
        {
            fields.push("qc_reconciliation_comment");
        }
        if self.not_conform_fate.is_some() && self.not_conform_fate != form.not_conform_fate {
            fields.push("not_conform_fate");
        }
        if self.not_conform_custom_fate.is_some()
            && self.not_conform_custom_fate != form.not_conform_custom_fate
        {
            fields.push("not_conform_custom_fate");
        }
        if self.final_packaging_size.is_some()
            && self.final_packaging_size != form.final_packaging_size
        {
            fields.push("final_packaging_size");
        }
        fields
    }

    /// Write the provided values on the check
    pub fn apply_to(self, check: &mut QualityCheck) {
        if let Some(v) = self.qty_conform {
            check.qty_conform = v;
        }
        if let Some(v) = self.qty_not_conform {
            check.qty_not_conform = v;
        }
        if self.qc_reconciliation_consistency.is_some() {
            check.qc_reconciliation_consistency = self.qc_reconciliation_consistency;
        }
        if self.qc_reconciliation_comment.is_some() {
            check.qc_reconciliation_comment = self.qc_reconciliation_comment;
        }
        if self.not_conform_fate.is_some() {
            check.not_conform_fate = self.not_conform_fate;
        }
        if self.not_conform_custom_fate.is_some() {
            check.not_conform_custom_fate = self.not_conform_custom_fate;
        }
        if self.final_packaging_size.is_some() {
            check.final_packaging_size = self.final_packaging_size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diverging_fields_ignores_equal_values() {
        let form = QcMeasurements {
            qty_tested: Decimal::from(10),
            qty_conform: Decimal::from(8),
            qty_not_conform: Decimal::from(2),
            ..Default::default()
        };
        let changes = QualityCheckChanges {
            qty_conform: Some(Decimal::from(8)),
            qty_not_conform: Some(Decimal::from(3)),
            final_packaging_size: Some("10 x 1 mL".to_string()),
            ..Default::default()
        };
        assert_eq!(
            changes.diverging_fields(&form),
            vec!["qty_not_conform", "final_packaging_size"]
        );
    }
}
