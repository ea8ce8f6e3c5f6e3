//! Reception and Release (R&R) form models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    AppendixState, Conformity, Consistency, LotStatus, NotConformFate, PackagingState,
    ReconciliationConsistency, StorageTemperature,
};

selection! {
    /// Kind of R&R form
    pub enum FormType {
        /// Reception of a lot that goes through no quality control
        RcWithoutQc => ("rc_without_qc", "RC Without QC"),
        /// Reception of a critical lot; closed once every QC result is in
        RcWithQc => ("rc_with_qc", "RC With QC"),
        /// Result of one quality check, child of an `rc_with_qc` form
        QcResult => ("qc_result", "QC Results"),
    }
}

selection! {
    /// Status of an R&R form
    pub enum FormStatus {
        Draft => ("draft", "Draft"),
        Confirmed => ("confirmed", "Confirmed"),
        Sent => ("sent", "Sent"),
        Approved => ("approved", "Approved"),
        ToClose => ("to_close", "To Close"),
        Closed => ("closed", "Closed"),
    }
}

impl FormStatus {
    /// Content can still be edited
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            FormStatus::Draft | FormStatus::Confirmed | FormStatus::Sent
        )
    }
}

/// Reception part of a form, filled by the reception team
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReceptionChecklist {
    pub packaging_state: Option<PackagingState>,
    /// Form attached as appendix 1
    pub form_appendix: Option<AppendixState>,
    /// Shipping temperature chart attached as appendix 2
    pub temperature_appendix: Option<AppendixState>,
    pub materials_conformity: Option<Conformity>,
    pub supplier_consistency: Option<Consistency>,
    pub items_consistency: Option<Consistency>,
    /// Why materials do not conform and/or appendixes are not done
    pub reception_comment: Option<String>,
    pub arrival_date: Option<NaiveDate>,
    pub specification_reference: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub product_qty: Decimal,
}

/// Release part of a form, filled by the quality team
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReleaseDetails {
    pub lot_status: Option<LotStatus>,
    pub items_stored: bool,
    pub storage_location: Option<String>,
    pub storage_temperature: Option<StorageTemperature>,
    pub manual_temperature: Option<String>,
}

/// Quantities and outcome of a quality check, copied on QC result forms
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QcMeasurements {
    pub qty_tested: Decimal,
    pub qty_conform: Decimal,
    pub qty_not_conform: Decimal,
    pub qc_reconciliation_consistency: Option<ReconciliationConsistency>,
    pub qc_reconciliation_comment: Option<String>,
    pub not_conform_fate: Option<NotConformFate>,
    pub not_conform_custom_fate: Option<String>,
    pub final_packaging_size: Option<String>,
}

/// Who signed, when, and with which signature
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignatureStamp {
    pub user_id: Uuid,
    pub user_name: String,
    pub job_title: Option<String>,
    pub signature: Option<String>,
    pub at: DateTime<Utc>,
}

/// Closure of an `rc_with_qc` form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Closure {
    pub closed_by: Uuid,
    pub closed_by_name: String,
    pub closed_on: DateTime<Utc>,
    pub reconciliation_consistency: ReconciliationConsistency,
    pub reconciliation_comment: Option<String>,
}

/// Audited record of the reception and release of one lot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceptionForm {
    pub id: Uuid,
    /// Sequence reference
    pub name: String,
    pub form_type: FormType,
    pub status: FormStatus,
    pub company_id: Uuid,
    /// Incoming transfer
    pub picking_id: Uuid,
    pub picking_type_id: Uuid,
    pub lot_id: Uuid,
    pub product_id: Uuid,
    /// Vendor of the purchase order
    pub partner_id: Option<Uuid>,
    pub seller_product_code: String,
    pub parent_id: Option<Uuid>,
    /// Quality check a QC result form was created from
    pub check_id: Option<Uuid>,
    pub last_child: bool,
    pub reception: ReceptionChecklist,
    pub release: ReleaseDetails,
    /// Present on QC result forms only
    pub qc: Option<QcMeasurements>,
    pub tested: Option<SignatureStamp>,
    /// Set when the form is sent by the reception team
    pub receipt: Option<SignatureStamp>,
    /// Set when the form is signed by the quality team
    pub approval: Option<SignatureStamp>,
    pub closure: Option<Closure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReceptionForm {
    /// Name of the PDF attached to the form chatter
    pub fn attachment_name(&self, lot_name: &str) -> String {
        format!(
            "[{}]Reception_and_release_form-lot{}.pdf",
            self.status.as_str().to_uppercase(),
            lot_name.replace('/', "")
        )
    }

    /// Quantity tested on this form, zero when it is not a QC result
    pub fn qty_tested(&self) -> Decimal {
        self.qc.as_ref().map(|qc| qc.qty_tested).unwrap_or_default()
    }
}

/// Editable content of a form; `None` leaves a value untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceptionFormChanges {
    pub packaging_state: Option<PackagingState>,
    pub form_appendix: Option<AppendixState>,
    pub temperature_appendix: Option<AppendixState>,
    pub materials_conformity: Option<Conformity>,
    pub supplier_consistency: Option<Consistency>,
    pub items_consistency: Option<Consistency>,
    pub reception_comment: Option<String>,
    pub arrival_date: Option<NaiveDate>,
    pub specification_reference: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub product_qty: Option<Decimal>,
    pub lot_status: Option<LotStatus>,
    pub items_stored: Option<bool>,
    pub storage_location: Option<String>,
    pub storage_temperature: Option<StorageTemperature>,
    pub manual_temperature: Option<String>,
}

impl ReceptionFormChanges {
    /// Write the provided values on the form
    pub fn apply_to(self, form: &mut ReceptionForm) {
        let reception = &mut form.reception;
        if let Some(v) = self.packaging_state {
            reception.packaging_state = Some(v);
        }
        if let Some(v) = self.form_appendix {
            reception.form_appendix = Some(v);
        }
        if let Some(v) = self.temperature_appendix {
            reception.temperature_appendix = Some(v);
        }
        if let Some(v) = self.materials_conformity {
            reception.materials_conformity = Some(v);
        }
        if let Some(v) = self.supplier_consistency {
            reception.supplier_consistency = Some(v);
        }
        if let Some(v) = self.items_consistency {
            reception.items_consistency = Some(v);
        }
        if self.reception_comment.is_some() {
            reception.reception_comment = self.reception_comment;
        }
        if self.arrival_date.is_some() {
            reception.arrival_date = self.arrival_date;
        }
        if self.specification_reference.is_some() {
            reception.specification_reference = self.specification_reference;
        }
        if self.expiration_date.is_some() {
            reception.expiration_date = self.expiration_date;
        }
        if let Some(v) = self.product_qty {
            reception.product_qty = v;
        }

        let release = &mut form.release;
        if self.lot_status.is_some() {
            release.lot_status = self.lot_status;
        }
        if let Some(v) = self.items_stored {
            release.items_stored = v;
        }
        if self.storage_location.is_some() {
            release.storage_location = self.storage_location;
        }
        if self.storage_temperature.is_some() {
            release.storage_temperature = self.storage_temperature;
        }
        if self.manual_temperature.is_some() {
            release.manual_temperature = self.manual_temperature;
        }
    }
}
