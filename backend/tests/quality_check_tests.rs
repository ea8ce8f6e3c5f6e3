//! Quality check processing tests
//!
//! Guards blocking checks while R&R forms are missing, unsent or unvalidated,
//! and QC result forms created from critical checks.

mod common;

use async_trait::async_trait;
use common::{dec, Fixture, Transfer};
use rnr_backend::adapters::{MemoryStore, PlatformEvent};
use rnr_backend::error::{AppError, AppResult};
use rnr_backend::models::{
    CriticalLevel, FormStatus, FormType, Lot, Product, QualityCheck, QualityCheckChanges,
    QualityPoint, QualityState, ReceptionForm, ReconciliationConsistency,
};
use rnr_backend::ports::{FormFilter, QualityRepository, ReceptionFormRepository as _, RecordRef};
use std::sync::Arc;
use uuid::Uuid;
use rnr_backend::services::quality_check::BLOCKED_TITLE;
use rnr_backend::services::{QualityCheckService, ReceptionFormService};

struct Reception {
    fx: Fixture,
    forms: ReceptionFormService,
    checks: QualityCheckService,
    product: Product,
    lot: Lot,
    receipt: Transfer,
}

fn reception(level: CriticalLevel, qty: &str) -> Reception {
    let fx = Fixture::new();
    let product = fx.product(level);
    let lot = fx.lot(&product, qty);
    let receipt = fx.receipt(&[(&lot, qty)]);
    Reception {
        forms: ReceptionFormService::new(fx.ports.clone()),
        checks: QualityCheckService::new(fx.ports.clone()),
        fx,
        product,
        lot,
        receipt,
    }
}

impl Reception {
    async fn reception_form(&self, form_type: FormType, notify: bool) -> ReceptionForm {
        let form = self
            .forms
            .create(self.fx.form(form_type, &self.receipt, &self.lot))
            .await
            .unwrap();
        self.forms
            .send(&self.fx.actor(), form.id, notify)
            .await
            .unwrap()
    }

    fn activities(&self) -> Vec<(RecordRef, String, String)> {
        self.fx
            .events()
            .into_iter()
            .filter_map(|e| match e {
                PlatformEvent::Activity { target, activity } => {
                    Some((target, activity.summary, activity.note))
                }
                _ => None,
            })
            .collect()
    }
}

fn blocked_description(err: AppError) -> String {
    match err {
        AppError::ProcessingBlocked { title, description } => {
            assert_eq!(title, BLOCKED_TITLE);
            description
        }
        other => panic!("expected a blocked check, got {other:?}"),
    }
}

#[tokio::test]
async fn test_check_blocked_until_forms_exist() {
    let r = reception(CriticalLevel::Critical, "10");
    let qc = r.fx.qc_transfer(&r.receipt, &[(&r.lot, "4")]);
    let check = r.fx.check(&qc, &r.product, false);

    let err = r.checks.pass(&r.fx.actor(), check.id).await.unwrap_err();
    let description = blocked_description(err);
    assert!(description.contains("to fill"));
    assert!(description.contains(&r.receipt.picking.name));

    let activities = r.activities();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].0, RecordRef::picking(r.receipt.picking.id));
    assert_eq!(activities[0].1, "Pending R&R To Create");

    let check = r.checks.get(check.id).await.unwrap();
    assert_eq!(check.quality_state, QualityState::Todo);
}

#[tokio::test]
async fn test_check_blocked_until_forms_sent() {
    let r = reception(CriticalLevel::Critical, "10");
    let parent = r.reception_form(FormType::RcWithQc, false).await;
    let qc = r.fx.qc_transfer(&r.receipt, &[(&r.lot, "4")]);
    let check = r.fx.check(&qc, &r.product, false);

    let err = r.checks.measure(&r.fx.actor(), check.id).await.unwrap_err();
    let description = blocked_description(err);
    assert!(description.contains("1 Reception and Release form(s) to send"));
    assert!(description.contains(&parent.name));

    let activities = r.activities();
    assert_eq!(activities[0].1, "Pending R&R To Send");
    assert!(activities[0].2.contains(&parent.name));
}

#[tokio::test]
async fn test_validation_required_by_control_point() {
    let r = reception(CriticalLevel::Intermediary, "10");
    let form = r.reception_form(FormType::RcWithoutQc, true).await;
    let check = r.fx.check(&r.receipt, &r.product, true);

    let err = r.checks.pass(&r.fx.actor(), check.id).await.unwrap_err();
    assert!(blocked_description(err).contains("to validate"));
    assert_eq!(r.activities()[0].1, "Pending R&R Validation");

    r.forms.sign(&r.fx.actor(), form.id, None).await.unwrap();
    let outcome = r.checks.pass(&r.fx.actor(), check.id).await.unwrap();
    assert_eq!(outcome.check.quality_state, QualityState::Pass);
    assert!(outcome.child_form.is_none());
}

#[tokio::test]
async fn test_sent_forms_are_enough_without_validation() {
    let r = reception(CriticalLevel::Intermediary, "10");
    r.reception_form(FormType::RcWithoutQc, true).await;
    let check = r.fx.check(&r.receipt, &r.product, false);

    let outcome = r.checks.fail(&r.fx.actor(), check.id).await.unwrap();
    assert_eq!(outcome.check.quality_state, QualityState::Fail);
    assert!(r.activities().is_empty());
}

#[tokio::test]
async fn test_critical_check_creates_sent_qc_result() {
    let r = reception(CriticalLevel::Critical, "10");
    let parent = r.reception_form(FormType::RcWithQc, true).await;
    let qc = r.fx.qc_transfer(&r.receipt, &[(&r.lot, "4")]);
    let check = r.fx.check(&qc, &r.product, false);

    let info = r.checks.qc_info(&check).await.unwrap();
    assert_eq!(info.parent_form_id, Some(parent.id));
    assert_eq!(info.qty_tested, dec("4"));

    let outcome = r.checks.pass(&r.fx.actor(), check.id).await.unwrap();
    let child = outcome.child_form.expect("QC result form");
    assert_eq!(child.form_type, FormType::QcResult);
    assert_eq!(child.status, FormStatus::Sent);
    assert_eq!(child.parent_id, Some(parent.id));
    assert_eq!(child.check_id, Some(check.id));
    assert_eq!(child.picking_id, qc.picking.id);
    assert_eq!(child.seller_product_code, "ACME-CS");
    assert_eq!(child.qty_tested(), dec("4"));
    assert!(child.tested.is_some());
    assert!(!child.last_child);

    assert!(r
        .fx
        .message_bodies()
        .contains(&format!("A QC result form has been created: {}", child.name)));

    // A check yields one QC result at most
    let again = r.checks.pass(&r.fx.actor(), check.id).await.unwrap();
    assert!(again.child_form.is_none());
}

#[tokio::test]
async fn test_qc_result_covering_received_quantity_is_last_child() {
    let r = reception(CriticalLevel::Critical, "10");
    r.reception_form(FormType::RcWithQc, true).await;

    let first_qc = r.fx.qc_transfer(&r.receipt, &[(&r.lot, "6")]);
    let first = r.fx.check(&first_qc, &r.product, false);
    let first = r.checks.pass(&r.fx.actor(), first.id).await.unwrap();
    assert!(!first.child_form.unwrap().last_child);

    let second_qc = r.fx.qc_transfer(&r.receipt, &[(&r.lot, "4")]);
    let second = r.fx.check(&second_qc, &r.product, false);
    let second = r.checks.pass(&r.fx.actor(), second.id).await.unwrap();
    assert!(second.child_form.unwrap().last_child);
}

#[tokio::test]
async fn test_covered_parent_keeps_a_single_last_child() {
    let r = reception(CriticalLevel::Critical, "10");
    let parent = r.reception_form(FormType::RcWithQc, true).await;

    for qty in ["6", "4", "2"] {
        let qc = r.fx.qc_transfer(&r.receipt, &[(&r.lot, qty)]);
        let check = r.fx.check(&qc, &r.product, false);
        r.checks.pass(&r.fx.actor(), check.id).await.unwrap();
    }

    let children = r
        .fx
        .ports
        .forms
        .list(&FormFilter::children_of(parent.id))
        .await
        .unwrap();
    assert_eq!(children.len(), 3);
    let flagged: Vec<_> = children
        .iter()
        .filter(|f| f.last_child)
        .map(|f| f.qty_tested())
        .collect();
    assert_eq!(flagged, vec![dec("4")]);
}

/// Reads checks from the store but refuses to save them
struct UnsavableChecks(MemoryStore);

#[async_trait]
impl QualityRepository for UnsavableChecks {
    async fn find_check(&self, id: Uuid) -> AppResult<Option<QualityCheck>> {
        self.0.find_check(id).await
    }

    async fn save_check(&self, _check: &QualityCheck) -> AppResult<()> {
        Err(AppError::Internal("check storage unavailable".to_string()))
    }

    async fn checks_for_picking(&self, picking_id: Uuid) -> AppResult<Vec<QualityCheck>> {
        self.0.checks_for_picking(picking_id).await
    }

    async fn find_point(&self, id: Uuid) -> AppResult<Option<QualityPoint>> {
        self.0.find_point(id).await
    }
}

#[tokio::test]
async fn test_unsaved_check_leaves_no_qc_result() {
    let r = reception(CriticalLevel::Critical, "10");
    r.reception_form(FormType::RcWithQc, true).await;
    let qc = r.fx.qc_transfer(&r.receipt, &[(&r.lot, "4")]);
    let check = r.fx.check(&qc, &r.product, false);

    let mut ports = r.fx.ports.clone();
    ports.quality = Arc::new(UnsavableChecks(r.fx.store.clone()));
    let checks = QualityCheckService::new(ports);

    let err = checks.pass(&r.fx.actor(), check.id).await.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));

    let children = r
        .fx
        .ports
        .forms
        .list(&FormFilter::check(check.id))
        .await
        .unwrap();
    assert!(children.is_empty());
    assert_eq!(
        r.checks.get(check.id).await.unwrap().quality_state,
        QualityState::Todo
    );

    // A later pass creates the QC result
    let outcome = r.checks.pass(&r.fx.actor(), check.id).await.unwrap();
    assert!(outcome.child_form.is_some());
}

#[tokio::test]
async fn test_non_critical_checks_create_no_form() {
    let r = reception(CriticalLevel::Intermediary, "10");
    r.reception_form(FormType::RcWithoutQc, true).await;
    let qc = r.fx.qc_transfer(&r.receipt, &[(&r.lot, "10")]);
    let check = r.fx.check(&qc, &r.product, false);

    let outcome = r.checks.pass(&r.fx.actor(), check.id).await.unwrap();
    assert!(outcome.child_form.is_none());
    assert_eq!(r.checks.qc_info(&check).await.unwrap().parent_form_id, None);
}

#[tokio::test]
async fn test_warning_when_critical_transfer_has_no_lines() {
    let r = reception(CriticalLevel::Critical, "10");
    let empty = r.fx.qc_transfer(&r.receipt, &[]);
    let check = r.fx.check(&empty, &r.product, false);

    let info = r.checks.qc_info(&check).await.unwrap();
    assert!(info.show_warning_message);
    assert_eq!(info.parent_form_id, None);
}

#[tokio::test]
async fn test_origin_pickings_follow_chained_moves() {
    let r = reception(CriticalLevel::Critical, "10");
    let qc = r.fx.qc_transfer(&r.receipt, &[(&r.lot, "10")]);
    let stock = r.fx.qc_transfer(&qc, &[(&r.lot, "10")]);

    let origins = r.checks.origin_pickings(stock.picking.id).await.unwrap();
    assert_eq!(origins, vec![r.receipt.picking.id]);

    let origins = r.checks.origin_pickings(r.receipt.picking.id).await.unwrap();
    assert_eq!(origins, vec![r.receipt.picking.id]);
}

#[tokio::test]
async fn test_diverging_check_schedules_activity_per_field() {
    let r = reception(CriticalLevel::Critical, "10");
    r.reception_form(FormType::RcWithQc, true).await;
    let qc = r.fx.qc_transfer(&r.receipt, &[(&r.lot, "4")]);
    let check = r.fx.check(&qc, &r.product, false);
    let child = r
        .checks
        .pass(&r.fx.actor(), check.id)
        .await
        .unwrap()
        .child_form
        .unwrap();

    let check = r
        .checks
        .update_check(
            &r.fx.actor(),
            check.id,
            QualityCheckChanges {
                qty_conform: Some(dec("3")),
                qty_not_conform: Some(dec("1")),
                qc_reconciliation_consistency: Some(ReconciliationConsistency::Consistent),
                qc_reconciliation_comment: Some("all good".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(check.qty_conform, dec("3"));
    assert_eq!(check.qc_reconciliation_comment, None);

    let changed: Vec<_> = r
        .activities()
        .into_iter()
        .filter(|(_, summary, _)| summary == "Quality check info have changed")
        .collect();
    assert_eq!(changed.len(), 4);
    assert!(changed
        .iter()
        .all(|(target, _, note)| *target == RecordRef::picking(qc.picking.id)
            && note.contains(&child.name)));
}

#[tokio::test]
async fn test_negative_check_quantity_rejected() {
    let r = reception(CriticalLevel::Critical, "10");
    let check = r.fx.check(&r.receipt, &r.product, false);

    let err = r
        .checks
        .update_check(
            &r.fx.actor(),
            check.id,
            QualityCheckChanges {
                qty_not_conform: Some(dec("-2")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}
