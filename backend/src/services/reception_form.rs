//! R&R form lifecycle
//!
//! Every status change goes through the shared transition table. The form,
//! and for the last-child cascade its parent, are written in one repository
//! call; chatter side effects run after the write and never undo it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    next_status, validate_form_links, validate_quantities, ClearDependentFields, Pagination,
    PaginatedResponse, Transition,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    ActionKind, Actor, Closure, FormStatus, FormType, LotStatus, ReceptionForm,
    ReceptionFormChanges, ReconciliationConsistency,
};
use crate::ports::{
    Attachment, ChatterMessage, FormFilter, Ports, RecordRef, FORM_REPORT, FORM_SEQUENCE,
};

/// Subject of the notification sent to control point followers
pub const VALIDATION_SUBJECT: &str = "R&R form to Validate";

/// Query parameters for listing forms
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormQuery {
    pub lot_id: Option<Uuid>,
    pub picking_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub check_id: Option<Uuid>,
    pub status: Option<FormStatus>,
    pub form_type: Option<FormType>,
}

impl From<FormQuery> for FormFilter {
    fn from(query: FormQuery) -> Self {
        FormFilter {
            lot_ids: query.lot_id.map(|id| vec![id]),
            picking_id: query.picking_id,
            parent_id: query.parent_id,
            check_id: query.check_id,
            status: query.status,
            form_type: query.form_type,
        }
    }
}

/// Input for sending a form
#[derive(Debug, Clone, Deserialize)]
pub struct SendFormInput {
    /// Send to the quality team; otherwise the form stays confirmed
    #[serde(default = "default_notify")]
    pub notify: bool,
}

fn default_notify() -> bool {
    true
}

/// Input for signing a form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignFormInput {
    pub lot_status: Option<LotStatus>,
}

/// Input for closing an `rc_with_qc` form
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CloseFormInput {
    pub reconciliation_consistency: ReconciliationConsistency,
    #[validate(length(max = 2000, message = "Reconciliation comment is too long"))]
    pub reconciliation_comment: Option<String>,
}

/// Quantities shown before closing a form
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClosingSummary {
    pub form_id: Uuid,
    pub product_qty: Decimal,
    pub total_qty_tested: Decimal,
}

/// R&R form lifecycle service
#[derive(Clone)]
pub struct ReceptionFormService {
    ports: Ports,
}

impl ReceptionFormService {
    pub fn new(ports: Ports) -> Self {
        Self { ports }
    }

    /// Get a form by id
    pub async fn get(&self, form_id: Uuid) -> AppResult<ReceptionForm> {
        self.ports
            .forms
            .find(form_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Reception form".to_string()))
    }

    /// List forms matching a filter, one page at a time
    pub async fn list(
        &self,
        filter: &FormFilter,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<ReceptionForm>> {
        let forms = self.ports.forms.list(filter).await?;
        Ok(PaginatedResponse::from_items(forms, pagination))
    }

    /// Store a new form under the next sequence reference
    pub async fn create(&self, form: ReceptionForm) -> AppResult<ReceptionForm> {
        let form = self.prepare_new(form).await?;
        self.ports.forms.insert(std::slice::from_ref(&form)).await?;
        self.after_create(&form).await;
        Ok(form)
    }

    /// Checked, numbered and cleared form, not stored yet
    pub(crate) async fn prepare_new(&self, mut form: ReceptionForm) -> AppResult<ReceptionForm> {
        validate_form_links(form.form_type, form.parent_id, form.check_id)
            .map_err(|message| AppError::validation("parent_id", message))?;
        if let Some(qc) = &form.qc {
            validate_quantities(qc).map_err(|message| AppError::validation("qc", message))?;
        }

        form.name = self.ports.sequences.next_by_code(FORM_SEQUENCE).await?;
        form.reception.clear_dependent_fields();
        Ok(form)
    }

    pub(crate) async fn after_create(&self, form: &ReceptionForm) {
        tracing::info!(form = %form.name, form_type = %form.form_type, lot_id = %form.lot_id, "Reception form created");
        if form.status != FormStatus::Draft {
            self.run_notify_actions(form).await;
        }
    }

    /// draft → confirmed
    pub async fn confirm(&self, actor: &Actor, form_id: Uuid) -> AppResult<ReceptionForm> {
        let mut form = self.get(form_id).await?;
        form.status = next_status(form.form_type, form.status, Transition::Confirm)?;
        form.updated_at = Utc::now();
        self.ports.forms.save(std::slice::from_ref(&form)).await?;

        tracing::info!(form = %form.name, user = %actor.name, "Reception form confirmed");
        self.run_notify_actions(&form).await;
        Ok(form)
    }

    /// Stamp the reception signature; with `notify` the form goes to the quality team
    pub async fn send(&self, actor: &Actor, form_id: Uuid, notify: bool) -> AppResult<ReceptionForm> {
        let mut form = self.get(form_id).await?;
        let now = Utc::now();

        let previous = apply_send(actor, &mut form, notify, now)?;
        self.ports.forms.save(std::slice::from_ref(&form)).await?;

        self.after_send(actor, &form, previous, notify, now).await;
        Ok(form)
    }

    /// Chatter side effects of a stored send
    pub(crate) async fn after_send(
        &self,
        actor: &Actor,
        form: &ReceptionForm,
        previous: FormStatus,
        notify: bool,
        now: DateTime<Utc>,
    ) {
        tracing::info!(form = %form.name, user = %actor.name, notify, "Reception form sent");
        if notify {
            let body = format!("Form generated by {} on {}", actor.name, display_time(now));
            self.attach_pdf(form, body).await;
            self.notify_control_points(form).await;
        }
        if form.status != previous {
            self.run_notify_actions(form).await;
        }
    }

    /// sent → approved, cascading `to_close` on the parent of a last child
    pub async fn sign(
        &self,
        actor: &Actor,
        form_id: Uuid,
        lot_status: Option<LotStatus>,
    ) -> AppResult<ReceptionForm> {
        self.sign_many(actor, &[form_id], lot_status)
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound("Reception form".to_string()))
    }

    /// Sign several forms at once. Every signed form and cascaded parent is
    /// written in one repository call, so a refused form leaves all unchanged.
    pub async fn sign_many(
        &self,
        actor: &Actor,
        form_ids: &[Uuid],
        lot_status: Option<LotStatus>,
    ) -> AppResult<Vec<ReceptionForm>> {
        let now = Utc::now();

        let mut signed: Vec<ReceptionForm> = Vec::with_capacity(form_ids.len());
        for form_id in form_ids {
            if signed.iter().any(|f| f.id == *form_id) {
                continue;
            }
            let mut form = self.get(*form_id).await?;
            form.status = next_status(form.form_type, form.status, Transition::Sign)?;
            form.approval = Some(actor.stamp(now));
            if lot_status.is_some() {
                form.release.lot_status = lot_status;
            }
            form.updated_at = now;
            signed.push(form);
        }

        // Parents of last children, signed in this batch or already stored
        let last_children: Vec<(String, Option<Uuid>)> = signed
            .iter()
            .filter(|f| f.last_child)
            .map(|f| (f.name.clone(), f.parent_id))
            .collect();
        let mut parents: Vec<ReceptionForm> = Vec::new();
        for (child_name, parent_id) in last_children {
            let parent_id = parent_id.ok_or_else(|| {
                AppError::validation(
                    "parent_id",
                    format!("Last child form {} needs a parent", child_name),
                )
            })?;
            if let Some(parent) = signed.iter_mut().find(|f| f.id == parent_id) {
                mark_to_close(parent, &child_name, now)?;
            } else {
                let mut parent = self.get(parent_id).await?;
                mark_to_close(&mut parent, &child_name, now)?;
                parents.push(parent);
            }
        }

        let mut batch = signed.clone();
        batch.extend(parents.iter().cloned());
        self.ports.forms.save(&batch).await?;

        for form in &signed {
            tracing::info!(form = %form.name, user = %actor.name, "Reception form signed");
            let body = format!("Form signed by {} on {}", actor.name, display_time(now));
            self.attach_pdf(form, body).await;
            self.run_notify_actions(form).await;
        }
        for parent in &parents {
            tracing::info!(form = %parent.name, "Reception form ready to close");
            self.run_notify_actions(parent).await;
        }
        Ok(signed)
    }

    /// approved/to_close → closed, `rc_with_qc` only
    pub async fn close(
        &self,
        actor: &Actor,
        form_id: Uuid,
        input: CloseFormInput,
    ) -> AppResult<ReceptionForm> {
        input.validate()?;

        let mut form = self.get(form_id).await?;
        let now = Utc::now();

        form.status = next_status(form.form_type, form.status, Transition::Close)?;
        let mut closure = Closure {
            closed_by: actor.user_id,
            closed_by_name: actor.name.clone(),
            closed_on: now,
            reconciliation_consistency: input.reconciliation_consistency,
            reconciliation_comment: input.reconciliation_comment,
        };
        closure.clear_dependent_fields();
        form.closure = Some(closure);
        form.updated_at = now;
        self.ports.forms.save(std::slice::from_ref(&form)).await?;

        tracing::info!(form = %form.name, user = %actor.name, "Reception form closed");
        let body = format!("Form closed by {} on {}", actor.name, display_time(now));
        self.attach_pdf(&form, body).await;
        self.run_notify_actions(&form).await;
        Ok(form)
    }

    /// Received and tested quantities of a form
    pub async fn closing_summary(&self, form_id: Uuid) -> AppResult<ClosingSummary> {
        let form = self.get(form_id).await?;
        let children = self
            .ports
            .forms
            .list(&FormFilter::children_of(form.id))
            .await?;

        Ok(ClosingSummary {
            form_id: form.id,
            product_qty: form.reception.product_qty,
            total_qty_tested: children.iter().map(ReceptionForm::qty_tested).sum(),
        })
    }

    /// Edit form content while it is draft, confirmed or sent
    pub async fn update_form(
        &self,
        actor: &Actor,
        form_id: Uuid,
        changes: ReceptionFormChanges,
    ) -> AppResult<ReceptionForm> {
        let mut form = self.get(form_id).await?;

        if !form.status.is_editable() {
            return Err(AppError::validation(
                "status",
                format!("Form {} can no longer be edited once {}", form.name, form.status.label()),
            ));
        }
        if changes.product_qty.is_some_and(|qty| qty < Decimal::ZERO) {
            return Err(AppError::validation("product_qty", "Quantity cannot be negative"));
        }
        self.ensure_unlocked(actor, &form).await?;

        // Clearing rules react to the controlling fields only
        let reception_touched = changes.form_appendix.is_some()
            || changes.temperature_appendix.is_some()
            || changes.materials_conformity.is_some();
        let release_touched =
            changes.items_stored.is_some() || changes.storage_temperature.is_some();

        changes.apply_to(&mut form);
        if reception_touched {
            form.reception.clear_dependent_fields();
        }
        if release_touched {
            form.release.clear_dependent_fields();
        }
        form.updated_at = Utc::now();
        self.ports.forms.save(std::slice::from_ref(&form)).await?;

        tracing::debug!(form = %form.name, user = %actor.name, "Reception form updated");
        Ok(form)
    }

    /// Lock actions matching the form restrict edits to their groups
    async fn ensure_unlocked(&self, actor: &Actor, form: &ReceptionForm) -> AppResult<()> {
        let locks: Vec<_> = self
            .ports
            .actions
            .list(form.company_id)
            .await?
            .into_iter()
            .filter(|a| {
                a.action == ActionKind::Lock
                    && a.applies_to(form.form_type, form.status, form.picking_type_id, form.company_id)
            })
            .collect();

        if locks.is_empty() || locks.iter().any(|a| a.group_id.is_some_and(|g| actor.in_group(g))) {
            return Ok(());
        }
        Err(AppError::FormLocked(format!(
            "Form {} is locked while {}",
            form.name,
            form.status.label()
        )))
    }

    async fn lot_name(&self, lot_id: Uuid) -> AppResult<String> {
        Ok(self
            .ports
            .inventory
            .find_lot(lot_id)
            .await?
            .map(|lot| lot.name)
            .unwrap_or_default())
    }

    /// Post the rendered form on its chatter
    async fn attach_pdf(&self, form: &ReceptionForm, body: String) {
        if let Err(err) = self.try_attach_pdf(form, body).await {
            tracing::warn!(form = %form.name, error = %err, "Failed to attach form PDF");
        }
    }

    async fn try_attach_pdf(&self, form: &ReceptionForm, body: String) -> AppResult<()> {
        let lot_name = self.lot_name(form.lot_id).await?;
        let pdf = self
            .ports
            .reports
            .render_pdf(FORM_REPORT, RecordRef::form(form.id))
            .await?;

        let message = ChatterMessage {
            subject: None,
            body,
            attachments: vec![Attachment {
                name: form.attachment_name(&lot_name),
                mimetype: "application/x-pdf".to_string(),
                datas: STANDARD.encode(pdf),
            }],
        };
        self.ports
            .chatter
            .post_message(RecordRef::form(form.id), message)
            .await
    }

    /// Tell the followers of the transfer's control points a form waits for validation
    async fn notify_control_points(&self, form: &ReceptionForm) {
        if let Err(err) = self.try_notify_control_points(form).await {
            tracing::warn!(form = %form.name, error = %err, "Failed to notify control points");
        }
    }

    async fn try_notify_control_points(&self, form: &ReceptionForm) -> AppResult<()> {
        let checks = self.ports.quality.checks_for_picking(form.picking_id).await?;
        let mut points: Vec<Uuid> = Vec::new();
        for check in &checks {
            if !points.contains(&check.point_id) {
                points.push(check.point_id);
            }
        }
        if points.is_empty() {
            return Ok(());
        }

        let lot_name = self.lot_name(form.lot_id).await?;
        let body = format!(
            "Reception and release form of lot {} is waiting for a validation: {}",
            lot_name,
            self.ports.lot_url(form.lot_id)
        );
        for point_id in points {
            self.ports
                .chatter
                .notify_followers(RecordRef::quality_point(point_id), VALIDATION_SUBJECT, &body)
                .await?;
        }
        Ok(())
    }

    /// Notify the groups of the notify actions matching the form's new status
    pub(crate) async fn run_notify_actions(&self, form: &ReceptionForm) {
        if let Err(err) = self.try_run_notify_actions(form).await {
            tracing::warn!(form = %form.name, error = %err, "Failed to run notify actions");
        }
    }

    async fn try_run_notify_actions(&self, form: &ReceptionForm) -> AppResult<()> {
        let actions = self.ports.actions.list(form.company_id).await?;
        let subject = format!("R&R form {} is {}", form.name, form.status.label());
        let body = format!(
            "Reception and release form {} ({}) moved to status {}",
            form.name,
            form.form_type.label(),
            form.status.label()
        );

        for action in actions.iter().filter(|a| {
            a.action == ActionKind::Notify
                && a.applies_to(form.form_type, form.status, form.picking_type_id, form.company_id)
        }) {
            if let Some(group_id) = action.group_id {
                self.ports.chatter.notify_group(group_id, &subject, &body).await?;
            }
        }
        Ok(())
    }
}

/// Send transition with the reception stamp; returns the status before it
pub(crate) fn apply_send(
    actor: &Actor,
    form: &mut ReceptionForm,
    notify: bool,
    now: DateTime<Utc>,
) -> AppResult<FormStatus> {
    let previous = form.status;
    form.status = next_status(form.form_type, form.status, Transition::Send { notify })?;
    form.receipt = Some(actor.stamp(now));
    form.updated_at = now;
    Ok(previous)
}

fn mark_to_close(parent: &mut ReceptionForm, child_name: &str, now: DateTime<Utc>) -> AppResult<()> {
    if parent.status != FormStatus::Approved {
        return Err(AppError::validation(
            "parent_id",
            format!(
                "Parent form {} is currently {} and must be approved before its last QC result {} is signed",
                parent.name,
                parent.status.label(),
                child_name
            ),
        ));
    }
    parent.status = next_status(parent.form_type, parent.status, Transition::MarkToClose)?;
    parent.updated_at = now;
    Ok(())
}

fn display_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
