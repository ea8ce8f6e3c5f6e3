//! Lot model, certificate of analysis sheet and R&R counters

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    AppendixState, Conformity, Consistency, CriticalLevel, FormStatus, LotStatus, PackagingState,
    ReceptionForm, StorageTemperature,
};

selection! {
    /// Whether the label count reconciles exactly
    pub enum LabelReconciliation {
        Yes => ("yes", "Yes"),
        No => ("no", "No**"),
    }
}

/// A traceable batch of a received product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    pub id: Uuid,
    pub name: String,
    pub product_id: Uuid,
    pub company_id: Uuid,
    pub expiration_date: Option<NaiveDate>,
    /// Quantity on hand
    pub product_qty: Decimal,
    /// Certificate of analysis prefill
    pub coa: CoaSheet,
    /// Completion date of the last incoming purchase transfer
    pub arrival_date: Option<NaiveDate>,
    /// Vendor of that transfer
    pub partner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values used to prefill the certificate of analysis of a lot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoaSheet {
    // Reception
    pub packaging_state: Option<PackagingState>,
    pub coa_appendix: Option<AppendixState>,
    pub temperature_appendix: Option<AppendixState>,
    pub materials_conformity: Option<Conformity>,
    pub supplier_consistency: Option<Consistency>,
    pub items_consistency: Option<Consistency>,
    pub reception_comment: Option<String>,

    // Labels
    pub following_template: bool,
    /// n + 1
    pub total_labels: i32,
    pub specimen_sticked: bool,

    // Status
    pub lot_status: Option<LotStatus>,
    pub products_sticked: bool,
    pub label_reconciliation: Option<LabelReconciliation>,
    pub items_stored: bool,
    pub storage_location: Option<String>,
    pub storage_temperature: Option<StorageTemperature>,
    pub manual_temperature: Option<String>,
    pub status_comment: Option<String>,
    pub table_update: bool,
}

/// R&R counters of a lot
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LotFormCounters {
    /// Forms past draft
    pub reception_form_count: usize,
    /// Forms confirmed but not sent
    pub form_to_send_count: usize,
    /// Forms sent and waiting for validation
    pub form_to_validate_count: usize,
    pub is_form_mandatory: bool,
}

impl LotFormCounters {
    /// Count the forms of one lot
    pub fn compute(forms: &[ReceptionForm], level: Option<CriticalLevel>) -> Self {
        let count = |status: FormStatus| forms.iter().filter(|f| f.status == status).count();
        Self {
            reception_form_count: forms
                .iter()
                .filter(|f| f.status != FormStatus::Draft)
                .count(),
            form_to_send_count: count(FormStatus::Confirmed),
            form_to_validate_count: count(FormStatus::Sent),
            is_form_mandatory: level.map(|l| l.requires_form()).unwrap_or(false),
        }
    }

    /// Mandatory form still missing
    pub fn needs_processing(&self) -> bool {
        self.is_form_mandatory && self.reception_form_count == 0
    }
}
