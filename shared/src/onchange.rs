//! Field clearing rules
//!
//! Dependent fields lose their value once the field they depend on no longer
//! calls for them. The same rules run in the web client (through the WASM
//! module) while a form is being edited and on the server before every write.

use crate::models::{
    reception_needs_explanation, CoaSheet, Closure, LabelReconciliation, QcMeasurements,
    QualityCheck, ReceptionChecklist, ReconciliationConsistency, ReleaseDetails,
    StorageTemperature,
};

/// Clears the fields whose controlling field does not require them
pub trait ClearDependentFields {
    fn clear_dependent_fields(&mut self);
}

impl ClearDependentFields for ReceptionChecklist {
    fn clear_dependent_fields(&mut self) {
        if !reception_needs_explanation(
            self.form_appendix,
            self.temperature_appendix,
            self.materials_conformity,
        ) {
            self.reception_comment = None;
        }
    }
}

impl ClearDependentFields for ReleaseDetails {
    fn clear_dependent_fields(&mut self) {
        if !self.items_stored {
            self.storage_location = None;
            self.storage_temperature = None;
        }
        if self.storage_temperature != Some(StorageTemperature::Rt) {
            self.manual_temperature = None;
        }
    }
}

impl ClearDependentFields for QcMeasurements {
    fn clear_dependent_fields(&mut self) {
        if self.qc_reconciliation_consistency == Some(ReconciliationConsistency::Consistent) {
            self.qc_reconciliation_comment = None;
        }
    }
}

impl ClearDependentFields for QualityCheck {
    fn clear_dependent_fields(&mut self) {
        if self.qc_reconciliation_consistency == Some(ReconciliationConsistency::Consistent) {
            self.qc_reconciliation_comment = None;
        }
    }
}

impl ClearDependentFields for Closure {
    fn clear_dependent_fields(&mut self) {
        if self.reconciliation_consistency != ReconciliationConsistency::NotConsistent {
            self.reconciliation_comment = None;
        }
    }
}

impl ClearDependentFields for CoaSheet {
    fn clear_dependent_fields(&mut self) {
        if !reception_needs_explanation(
            self.coa_appendix,
            self.temperature_appendix,
            self.materials_conformity,
        ) {
            self.reception_comment = None;
        }
        if !self.following_template {
            self.total_labels = 0;
        }
        if !self.products_sticked {
            self.label_reconciliation = None;
        }
        if !self.items_stored {
            self.storage_location = None;
            self.storage_temperature = None;
        }
        if self.label_reconciliation != Some(LabelReconciliation::No) {
            self.status_comment = None;
        }
        if self.storage_temperature != Some(StorageTemperature::Rt) {
            self.manual_temperature = None;
        }
    }
}
