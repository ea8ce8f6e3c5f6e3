//! Creation and validation of R&R forms from a transfer

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    Actor, AppendixState, Conformity, Consistency, FormStatus, FormType, Lot, LotStatus,
    PackagingState, Picking, ReceptionChecklist, ReceptionForm, ReleaseDetails,
};
use crate::ports::{ChatterMessage, Ports, RecordRef};
use crate::services::reception_form::apply_send;
use crate::services::{CounterService, ReceptionFormService};

/// Which lots the wizard offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardMode {
    /// Lots whose mandatory form is missing
    Process,
    /// Lots with forms waiting for validation
    Validate,
}

/// Input for creating forms on the selected lots of a transfer
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFormsInput {
    pub form_type: FormType,

    #[validate(length(min = 1, message = "Select at least one lot"))]
    pub lot_ids: Vec<Uuid>,

    /// Send the created forms to the quality team
    #[serde(default)]
    pub send: bool,

    pub packaging_state: Option<PackagingState>,
    pub form_appendix: Option<AppendixState>,
    pub temperature_appendix: Option<AppendixState>,
    pub materials_conformity: Option<Conformity>,
    pub supplier_consistency: Option<Consistency>,
    pub items_consistency: Option<Consistency>,
    pub reception_comment: Option<String>,
    pub lot_status: Option<LotStatus>,
}

/// Input for signing several sent forms at once
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ValidateFormsInput {
    #[validate(length(min = 1, message = "Select at least one form"))]
    pub form_ids: Vec<Uuid>,
    pub lot_status: Option<LotStatus>,
}

/// Form creation wizard service
#[derive(Clone)]
pub struct FormWizardService {
    ports: Ports,
    forms: ReceptionFormService,
    counters: CounterService,
}

impl FormWizardService {
    pub fn new(ports: Ports) -> Self {
        Self {
            forms: ReceptionFormService::new(ports.clone()),
            counters: CounterService::new(ports.clone()),
            ports,
        }
    }

    /// Lots the wizard opens with
    pub async fn wizard_lots(&self, picking_id: Uuid, mode: WizardMode) -> AppResult<Vec<Lot>> {
        let lot_ids = match mode {
            WizardMode::Process => self.counters.lots_to_process(picking_id).await?,
            WizardMode::Validate => self.counters.lots_to_validate(picking_id).await?,
        };
        self.ports.inventory.lots(&lot_ids).await
    }

    /// Lots to process whose category level accepts `form_type`
    pub async fn available_lots(&self, picking_id: Uuid, form_type: FormType) -> AppResult<Vec<Lot>> {
        if form_type == FormType::QcResult {
            return Err(AppError::validation(
                "form_type",
                "QC result forms are created from quality checks",
            ));
        }

        let lots = self.wizard_lots(picking_id, WizardMode::Process).await?;
        let mut available = Vec::with_capacity(lots.len());
        for lot in lots {
            let level = self.counters.critical_level(lot.product_id).await?;
            if level.unwrap_or_default().accepts(form_type) {
                available.push(lot);
            }
        }
        Ok(available)
    }

    /// One confirmed form per selected lot, optionally sent right away
    pub async fn create_forms(
        &self,
        actor: &Actor,
        picking_id: Uuid,
        input: CreateFormsInput,
    ) -> AppResult<Vec<ReceptionForm>> {
        input.validate()?;

        let picking = self
            .ports
            .inventory
            .find_picking(picking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Picking".to_string()))?;
        let available = self.available_lots(picking.id, input.form_type).await?;

        let mut selected = Vec::with_capacity(input.lot_ids.len());
        for lot_id in &input.lot_ids {
            let lot = available.iter().find(|l| l.id == *lot_id).ok_or_else(|| {
                AppError::validation(
                    "lot_ids",
                    format!(
                        "Lot {} is not available for {} forms on {}",
                        lot_id,
                        input.form_type.label(),
                        picking.name
                    ),
                )
            })?;
            selected.push(lot.clone());
        }

        let mut batch = Vec::with_capacity(selected.len());
        for lot in selected {
            let product = self
                .ports
                .inventory
                .find_product(lot.product_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

            let now = Utc::now();
            let form = ReceptionForm {
                id: Uuid::new_v4(),
                name: String::new(),
                form_type: input.form_type,
                status: FormStatus::Confirmed,
                company_id: lot.company_id,
                picking_id: picking.id,
                picking_type_id: picking.picking_type_id,
                lot_id: lot.id,
                product_id: product.id,
                partner_id: picking.partner_id,
                seller_product_code: product.seller_product_code(picking.partner_id),
                parent_id: None,
                check_id: None,
                last_child: false,
                reception: ReceptionChecklist {
                    packaging_state: input.packaging_state,
                    form_appendix: input.form_appendix,
                    temperature_appendix: input.temperature_appendix,
                    materials_conformity: input.materials_conformity,
                    supplier_consistency: input.supplier_consistency,
                    items_consistency: input.items_consistency,
                    reception_comment: input.reception_comment.clone(),
                    arrival_date: picking.date_done.map(|d| d.date_naive()),
                    specification_reference: product.specification_ref.clone(),
                    expiration_date: lot.expiration_date,
                    product_qty: lot.product_qty,
                },
                release: ReleaseDetails {
                    lot_status: input.lot_status,
                    storage_temperature: product.storage_temperature,
                    manual_temperature: product.manual_temperature.clone(),
                    ..Default::default()
                },
                qc: None,
                tested: None,
                receipt: None,
                approval: None,
                closure: None,
                created_at: now,
                updated_at: now,
            };
            batch.push(self.forms.prepare_new(form).await?);
        }

        // Sent forms are stored sent; the batch is written at once or not at all
        let now = Utc::now();
        let mut previous = Vec::with_capacity(batch.len());
        if input.send {
            for form in &mut batch {
                previous.push(apply_send(actor, form, true, now)?);
            }
        }
        self.ports.forms.insert(&batch).await?;

        tracing::info!(picking = %picking.name, count = batch.len(), send = input.send, "Reception forms created from wizard");
        self.post_created_message(&picking, &batch).await;
        if input.send {
            for (form, previous) in batch.iter().zip(previous) {
                self.forms.after_send(actor, form, previous, true, now).await;
            }
        } else {
            for form in &batch {
                self.forms.after_create(form).await;
            }
        }
        Ok(batch)
    }

    async fn post_created_message(&self, picking: &Picking, forms: &[ReceptionForm]) {
        let mut body = if forms.len() <= 1 {
            format!("{} form has been created:", forms.len())
        } else {
            format!("{} forms have been created:", forms.len())
        };
        for form in forms {
            body.push('\n');
            body.push_str(&form.name);
        }

        if let Err(err) = self
            .ports
            .chatter
            .post_message(RecordRef::picking(picking.id), ChatterMessage::text(body))
            .await
        {
            tracing::warn!(picking = %picking.name, error = %err, "Failed to post created forms message");
        }
    }

    /// Sign every selected form with the same lot outcome
    pub async fn validate_forms(
        &self,
        actor: &Actor,
        input: ValidateFormsInput,
    ) -> AppResult<Vec<ReceptionForm>> {
        input.validate()?;

        let mut forms = Vec::with_capacity(input.form_ids.len());
        for form_id in &input.form_ids {
            forms.push(self.forms.get(*form_id).await?);
        }
        let unsent: Vec<&str> = forms
            .iter()
            .filter(|f| f.status != FormStatus::Sent)
            .map(|f| f.name.as_str())
            .collect();
        if !unsent.is_empty() {
            return Err(AppError::validation(
                "form_ids",
                format!("Only sent forms can be validated: {}", unsent.join(", ")),
            ));
        }

        self.forms
            .sign_many(actor, &input.form_ids, input.lot_status)
            .await
    }
}
