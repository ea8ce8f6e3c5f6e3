//! Quality check processing
//!
//! A check on a transfer cannot pass, fail or be measured while the R&R
//! forms of the transfers it originates from are missing, unsent or, when
//! the control point asks for it, unvalidated. Critical checks produce a
//! QC result form, child of the lot's `rc_with_qc` form.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{tested_quantity_reached, ClearDependentFields};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Actor, CriticalLevel, FormStatus, FormType, Picking, QcInfo, QualityCheck,
    QualityCheckChanges, QualityState, ReceptionChecklist, ReceptionForm, ReleaseDetails,
};
use crate::ports::{Activity, ChatterMessage, FormFilter, Ports, RecordRef};
use crate::services::reception_form::apply_send;
use crate::services::{CounterService, ReceptionFormService};

/// Title of the warning shown when a guard blocks a check
pub const BLOCKED_TITLE: &str = "Unable to process Quality Checks";

/// A processed check and the QC result form it produced, if any
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub check: QualityCheck,
    pub child_form: Option<ReceptionForm>,
}

/// QC result form built for a check, waiting to be stored
struct ChildForm {
    form: ReceptionForm,
    previous: FormStatus,
    picking: Picking,
    sent_at: DateTime<Utc>,
}

/// A check with its derived QC info
#[derive(Debug, Clone, Serialize)]
pub struct CheckDetail {
    #[serde(flatten)]
    pub check: QualityCheck,
    pub qc_info: QcInfo,
}

/// Quality check service
#[derive(Clone)]
pub struct QualityCheckService {
    ports: Ports,
    forms: ReceptionFormService,
    counters: CounterService,
}

impl QualityCheckService {
    pub fn new(ports: Ports) -> Self {
        Self {
            forms: ReceptionFormService::new(ports.clone()),
            counters: CounterService::new(ports.clone()),
            ports,
        }
    }

    pub async fn get(&self, check_id: Uuid) -> AppResult<QualityCheck> {
        self.ports
            .quality
            .find_check(check_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quality check".to_string()))
    }

    pub async fn detail(&self, check_id: Uuid) -> AppResult<CheckDetail> {
        let check = self.get(check_id).await?;
        let qc_info = self.qc_info(&check).await?;
        Ok(CheckDetail { check, qc_info })
    }

    /// Parent form and tested quantity of a check
    pub async fn qc_info(&self, check: &QualityCheck) -> AppResult<QcInfo> {
        let level = self.counters.critical_level(check.product_id).await?;
        let Some(picking_id) = check.picking_id else {
            return Ok(QcInfo::default());
        };
        if level != Some(CriticalLevel::Critical) {
            return Ok(QcInfo::default());
        }

        let lines = self.ports.inventory.move_lines(picking_id).await?;
        if lines.is_empty() {
            return Ok(QcInfo {
                show_warning_message: true,
                ..Default::default()
            });
        }

        let product_lines: Vec<_> = lines
            .iter()
            .filter(|l| l.product_id == check.product_id && l.lot_id.is_some())
            .collect();
        let lot_ids: Vec<Uuid> = product_lines.iter().filter_map(|l| l.lot_id).collect();
        if lot_ids.is_empty() {
            return Ok(QcInfo::default());
        }

        let parents = self
            .ports
            .forms
            .list(&FormFilter {
                form_type: Some(FormType::RcWithQc),
                ..FormFilter::lots(lot_ids)
            })
            .await?;

        // Without exactly one parent there is nothing to attach a result to
        let [parent] = parents.as_slice() else {
            return Ok(QcInfo::default());
        };

        let parent_lots: HashSet<Uuid> = parents.iter().map(|f| f.lot_id).collect();
        let qty_tested = product_lines
            .iter()
            .filter(|l| l.lot_id.is_some_and(|lot| parent_lots.contains(&lot)))
            .map(|l| l.qty_done)
            .sum();

        Ok(QcInfo {
            parent_form_id: Some(parent.id),
            qty_tested,
            show_warning_message: false,
        })
    }

    /// Pass a check, creating its QC result form when due
    pub async fn pass(&self, actor: &Actor, check_id: Uuid) -> AppResult<CheckOutcome> {
        self.process(actor, check_id, QualityState::Pass).await
    }

    /// Fail a check, creating its QC result form when due
    pub async fn fail(&self, actor: &Actor, check_id: Uuid) -> AppResult<CheckOutcome> {
        self.process(actor, check_id, QualityState::Fail).await
    }

    /// Run the guards before a measure is taken
    pub async fn measure(&self, actor: &Actor, check_id: Uuid) -> AppResult<QualityCheck> {
        let check = self.get(check_id).await?;
        self.run_guards(actor, &check).await?;
        Ok(check)
    }

    async fn process(
        &self,
        actor: &Actor,
        check_id: Uuid,
        state: QualityState,
    ) -> AppResult<CheckOutcome> {
        let mut check = self.get(check_id).await?;
        self.run_guards(actor, &check).await?;

        let child = self.prepare_child_form(actor, &check).await?;

        // The check is stored first so a QC result never outlives an unprocessed check
        check.quality_state = state;
        self.ports.quality.save_check(&check).await?;
        tracing::info!(check = %check.name, state = %state, user = %actor.name, "Quality check processed");

        let child_form = match child {
            Some(child) => Some(self.store_child_form(actor, child).await?),
            None => None,
        };
        Ok(CheckOutcome { check, child_form })
    }

    async fn run_guards(&self, actor: &Actor, check: &QualityCheck) -> AppResult<()> {
        self.check_form_to_process(actor, check).await?;

        let point = self.ports.quality.find_point(check.point_id).await?;
        if point.is_some_and(|p| p.is_form_validation_required) {
            self.check_form_validation(actor, check).await?;
        }
        Ok(())
    }

    /// Transfers the check's transfer originates from, following origin moves
    pub async fn origin_pickings(&self, picking_id: Uuid) -> AppResult<Vec<Uuid>> {
        let mut pending = self.ports.inventory.moves(picking_id).await?;
        let mut visited: HashSet<Uuid> = pending.iter().map(|m| m.id).collect();
        let mut pickings = Vec::new();

        while let Some(stock_move) = pending.pop() {
            if stock_move.origin_move_ids.is_empty() {
                if let Some(id) = stock_move.picking_id {
                    if !pickings.contains(&id) {
                        pickings.push(id);
                    }
                }
                continue;
            }

            let unseen: Vec<Uuid> = stock_move
                .origin_move_ids
                .iter()
                .filter(|id| visited.insert(**id))
                .copied()
                .collect();
            if !unseen.is_empty() {
                pending.extend(self.ports.inventory.find_moves(&unseen).await?);
            }
        }
        Ok(pickings)
    }

    /// Blocks while an originating transfer has forms to create or to send
    async fn check_form_to_process(&self, actor: &Actor, check: &QualityCheck) -> AppResult<()> {
        let Some(picking_id) = check.picking_id else {
            return Ok(());
        };
        let origin_ids = self.origin_pickings(picking_id).await?;
        if origin_ids.is_empty() {
            return Ok(());
        }

        let mut to_process = Vec::new();
        let mut to_send = Vec::new();
        for id in &origin_ids {
            if !self.counters.lots_to_process(*id).await?.is_empty() {
                to_process.push(*id);
            }
            if !self.counters.lots_to_send(*id).await?.is_empty() {
                to_send.push(*id);
            }
        }

        if !to_process.is_empty() {
            let pickings = self.ports.inventory.pickings(&to_process).await?;
            self.schedule_pending(actor, &pickings, "pending R&R to create", None)
                .await;
            return Err(blocked(format!(
                "You still have Reception and Release form(s) to fill before processing this quality check (see picking(s): {})",
                names(pickings.iter().map(|p| p.name.as_str()))
            )));
        }

        if !to_send.is_empty() {
            let pickings = self.ports.inventory.pickings(&to_send).await?;
            let forms = self
                .counters
                .picking_forms(&origin_ids, FormStatus::Confirmed)
                .await?;
            let form_names = names(forms.iter().map(|f| f.name.as_str()));
            self.schedule_pending(actor, &pickings, "pending R&R to send", Some(&form_names))
                .await;
            return Err(blocked(format!(
                "You still have {} Reception and Release form(s) to send before processing this quality check (see form(s): {})",
                forms.len(),
                form_names
            )));
        }
        Ok(())
    }

    /// Blocks while the check's transfer has forms waiting for validation
    async fn check_form_validation(&self, actor: &Actor, check: &QualityCheck) -> AppResult<()> {
        let Some(picking_id) = check.picking_id else {
            return Ok(());
        };
        if self.counters.lots_to_validate(picking_id).await?.is_empty() {
            return Ok(());
        }

        let pickings = self.ports.inventory.pickings(&[picking_id]).await?;
        let forms = self
            .counters
            .picking_forms(&[picking_id], FormStatus::Sent)
            .await?;
        let form_names = names(forms.iter().map(|f| f.name.as_str()));
        self.schedule_pending(actor, &pickings, "pending R&R validation", Some(&form_names))
            .await;
        Err(blocked(format!(
            "You still have {} Reception and Release form(s) to validate before processing this quality check (see form(s): {})",
            forms.len(),
            form_names
        )))
    }

    /// Warning activity on each blocking transfer
    async fn schedule_pending(
        &self,
        actor: &Actor,
        pickings: &[Picking],
        reason: &str,
        records: Option<&str>,
    ) {
        let note = match records {
            Some(records) => format!(
                "Unable to process quality checks because of {} ({}).",
                reason, records
            ),
            None => format!("Unable to process quality checks because of {}.", reason),
        };

        for picking in pickings {
            let activity = Activity {
                summary: title_case(reason),
                note: note.clone(),
                deadline: Utc::now().date_naive(),
                user_id: actor.user_id,
            };
            if let Err(err) = self
                .ports
                .chatter
                .schedule_activity(RecordRef::picking(picking.id), activity)
                .await
            {
                tracing::warn!(picking = %picking.name, error = %err, "Failed to schedule pending activity");
            }
        }
    }

    /// QC result form of a critical check, flagged last child once the
    /// tested quantities cover the received quantity
    async fn prepare_child_form(
        &self,
        actor: &Actor,
        check: &QualityCheck,
    ) -> AppResult<Option<ChildForm>> {
        let Some(picking_id) = check.picking_id else {
            return Ok(None);
        };
        if self.counters.critical_level(check.product_id).await? != Some(CriticalLevel::Critical) {
            return Ok(None);
        }
        let info = self.qc_info(check).await?;
        let Some(parent_id) = info.parent_form_id else {
            return Ok(None);
        };
        if !self
            .ports
            .forms
            .list(&FormFilter::check(check.id))
            .await?
            .is_empty()
        {
            return Ok(None);
        }

        let parent = self.forms.get(parent_id).await?;
        let picking = self
            .ports
            .inventory
            .find_picking(picking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Picking".to_string()))?;
        let seller_product_code = self
            .ports
            .inventory
            .find_product(parent.product_id)
            .await?
            .map(|p| p.seller_product_code(picking.partner_id))
            .unwrap_or_default();

        let now = Utc::now();
        let form = ReceptionForm {
            id: Uuid::new_v4(),
            name: String::new(),
            form_type: FormType::QcResult,
            status: FormStatus::Confirmed,
            company_id: parent.company_id,
            picking_id,
            picking_type_id: picking.picking_type_id,
            lot_id: parent.lot_id,
            product_id: parent.product_id,
            partner_id: picking.partner_id,
            seller_product_code,
            parent_id: Some(parent.id),
            check_id: Some(check.id),
            last_child: false,
            reception: ReceptionChecklist {
                specification_reference: parent.reception.specification_reference.clone(),
                ..Default::default()
            },
            release: ReleaseDetails {
                items_stored: parent.release.items_stored,
                storage_location: parent.release.storage_location.clone(),
                storage_temperature: parent.release.storage_temperature,
                ..Default::default()
            },
            qc: Some(check.measurements(info.qty_tested)),
            tested: Some(actor.stamp(now)),
            receipt: None,
            approval: None,
            closure: None,
            created_at: now,
            updated_at: now,
        };

        let mut form = self.forms.prepare_new(form).await?;
        let previous = apply_send(actor, &mut form, true, now)?;

        let siblings = self
            .ports
            .forms
            .list(&FormFilter::children_of(parent.id))
            .await?;
        let total_tested: Decimal = siblings
            .iter()
            .map(ReceptionForm::qty_tested)
            .sum::<Decimal>()
            + form.qty_tested();
        let has_last_child = siblings.iter().any(|f| f.last_child);
        if !has_last_child && tested_quantity_reached(total_tested, parent.reception.product_qty) {
            form.last_child = true;
        }

        Ok(Some(ChildForm {
            form,
            previous,
            picking,
            sent_at: now,
        }))
    }

    /// Store a prepared QC result form, already sent
    async fn store_child_form(&self, actor: &Actor, child: ChildForm) -> AppResult<ReceptionForm> {
        let ChildForm {
            form,
            previous,
            picking,
            sent_at,
        } = child;
        self.ports.forms.insert(std::slice::from_ref(&form)).await?;
        tracing::info!(form = %form.name, last_child = form.last_child, "QC result form created");
        self.forms.after_send(actor, &form, previous, true, sent_at).await;

        let body = format!("A QC result form has been created: {}", form.name);
        if let Err(err) = self
            .ports
            .chatter
            .post_message(RecordRef::picking(picking.id), ChatterMessage::text(body))
            .await
        {
            tracing::warn!(picking = %picking.name, error = %err, "Failed to post QC result message");
        }

        Ok(form)
    }

    /// Edit QC fields, flagging divergences with the QC result form
    pub async fn update_check(
        &self,
        actor: &Actor,
        check_id: Uuid,
        changes: QualityCheckChanges,
    ) -> AppResult<QualityCheck> {
        let mut check = self.get(check_id).await?;
        if changes.qty_conform.is_some_and(|q| q < Decimal::ZERO) {
            return Err(AppError::validation("qty_conform", "Conformed quantity cannot be negative"));
        }
        if changes.qty_not_conform.is_some_and(|q| q < Decimal::ZERO) {
            return Err(AppError::validation(
                "qty_not_conform",
                "Not conformed quantity cannot be negative",
            ));
        }

        if let Some(picking_id) = check.picking_id {
            let child = self.ports.forms.list(&FormFilter::check(check.id)).await?;
            if let Some((form, qc)) = child.first().and_then(|f| f.qc.as_ref().map(|qc| (f, qc))) {
                for field in changes.diverging_fields(qc) {
                    let activity = Activity {
                        summary: "Quality check info have changed".to_string(),
                        note: format!(
                            "Information on quality check ({}) are no longer consistent with those on QC Results form {} ({}).",
                            check.name, form.name, field
                        ),
                        deadline: Utc::now().date_naive(),
                        user_id: actor.user_id,
                    };
                    if let Err(err) = self
                        .ports
                        .chatter
                        .schedule_activity(RecordRef::picking(picking_id), activity)
                        .await
                    {
                        tracing::warn!(check = %check.name, error = %err, "Failed to schedule divergence activity");
                    }
                }
            }
        }

        changes.apply_to(&mut check);
        check.clear_dependent_fields();
        self.ports.quality.save_check(&check).await?;
        Ok(check)
    }
}

fn blocked(description: String) -> AppError {
    AppError::ProcessingBlocked {
        title: BLOCKED_TITLE.to_string(),
        description,
    }
}

fn names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Capitalize each word, keeping the rest of the word as is
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
