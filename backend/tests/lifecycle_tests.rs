//! R&R form lifecycle tests
//!
//! confirm, send, sign and close against the in-memory store, including the
//! last child cascade and the chatter traffic each step produces.

mod common;

use common::{dec, Fixture, WEB_BASE_URL};
use rnr_backend::adapters::PlatformEvent;
use rnr_backend::error::AppError;
use rnr_backend::models::{
    AppendixState, Conformity, CriticalLevel, FormStatus, FormType, LotStatus, QcMeasurements,
    ReceptionForm, ReceptionFormChanges, ReconciliationConsistency, StorageTemperature,
};
use rnr_backend::ports::{FormFilter, ReceptionFormRepository as _};
use rnr_backend::services::reception_form::{CloseFormInput, VALIDATION_SUBJECT};
use rnr_backend::services::ReceptionFormService;
use uuid::Uuid;

struct Critical {
    fx: Fixture,
    service: ReceptionFormService,
    parent: ReceptionForm,
}

/// An approved `rc_with_qc` form on a received critical lot of 10 units
async fn approved_parent() -> Critical {
    let fx = Fixture::new();
    let service = ReceptionFormService::new(fx.ports.clone());
    let product = fx.product(CriticalLevel::Critical);
    let lot = fx.lot(&product, "10");
    let receipt = fx.receipt(&[(&lot, "10")]);

    let actor = fx.actor();
    let parent = service
        .create(fx.form(FormType::RcWithQc, &receipt, &lot))
        .await
        .unwrap();
    service.send(&actor, parent.id, true).await.unwrap();
    let parent = service.sign(&actor, parent.id, None).await.unwrap();

    Critical {
        fx,
        service,
        parent,
    }
}

/// A sent QC result of `parent` covering `qty_tested`
async fn sent_child(c: &Critical, qty_tested: &str, last_child: bool) -> ReceptionForm {
    let mut child = c.parent.clone();
    child.id = Uuid::new_v4();
    child.form_type = FormType::QcResult;
    child.status = FormStatus::Draft;
    child.parent_id = Some(c.parent.id);
    child.check_id = Some(Uuid::new_v4());
    child.last_child = last_child;
    child.receipt = None;
    child.approval = None;
    child.qc = Some(QcMeasurements {
        qty_tested: dec(qty_tested),
        qty_conform: dec(qty_tested),
        ..Default::default()
    });

    let child = c.service.create(child).await.unwrap();
    c.service
        .send(&c.fx.actor(), child.id, true)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_created_forms_are_numbered_from_sequence() {
    let fx = Fixture::new();
    let service = ReceptionFormService::new(fx.ports.clone());
    let product = fx.product(CriticalLevel::LessCritical);
    let lot = fx.lot(&product, "4");
    let receipt = fx.receipt(&[(&lot, "4")]);

    let first = service
        .create(fx.form(FormType::RcWithoutQc, &receipt, &lot))
        .await
        .unwrap();
    let second = service
        .create(fx.form(FormType::RcWithoutQc, &receipt, &lot))
        .await
        .unwrap();

    assert_eq!(first.name, "RR/00001");
    assert_eq!(second.name, "RR/00002");
    assert_eq!(first.status, FormStatus::Draft);
}

#[tokio::test]
async fn test_qc_result_requires_parent_and_check() {
    let fx = Fixture::new();
    let service = ReceptionFormService::new(fx.ports.clone());
    let product = fx.product(CriticalLevel::Critical);
    let lot = fx.lot(&product, "4");
    let receipt = fx.receipt(&[(&lot, "4")]);

    let orphan = fx.form(FormType::QcResult, &receipt, &lot);
    let err = service.create(orphan).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn test_confirm_only_from_draft() {
    let fx = Fixture::new();
    let service = ReceptionFormService::new(fx.ports.clone());
    let product = fx.product(CriticalLevel::LessCritical);
    let lot = fx.lot(&product, "4");
    let receipt = fx.receipt(&[(&lot, "4")]);
    let actor = fx.actor();

    let form = service
        .create(fx.form(FormType::RcWithoutQc, &receipt, &lot))
        .await
        .unwrap();
    let form = service.confirm(&actor, form.id).await.unwrap();
    assert_eq!(form.status, FormStatus::Confirmed);

    let err = service.confirm(&actor, form.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition(_)));
}

#[tokio::test]
async fn test_send_without_notify_keeps_form_confirmed() {
    let fx = Fixture::new();
    let service = ReceptionFormService::new(fx.ports.clone());
    let product = fx.product(CriticalLevel::LessCritical);
    let lot = fx.lot(&product, "4");
    let receipt = fx.receipt(&[(&lot, "4")]);
    let actor = fx.actor();

    let form = service
        .create(fx.form(FormType::RcWithoutQc, &receipt, &lot))
        .await
        .unwrap();
    let form = service.send(&actor, form.id, false).await.unwrap();

    assert_eq!(form.status, FormStatus::Confirmed);
    let receipt_stamp = form.receipt.expect("reception signature");
    assert_eq!(receipt_stamp.user_id, actor.user_id);
    assert_eq!(receipt_stamp.job_title.as_deref(), Some("Quality Manager"));
    assert!(fx.message_bodies().is_empty());
}

#[tokio::test]
async fn test_send_attaches_pdf_and_notifies_control_points() {
    let fx = Fixture::new();
    let service = ReceptionFormService::new(fx.ports.clone());
    let product = fx.product(CriticalLevel::Intermediary);
    let lot = fx.lot(&product, "4");
    let receipt = fx.receipt(&[(&lot, "4")]);
    let check = fx.check(&receipt, &product, false);

    let form = service
        .create(fx.form(FormType::RcWithoutQc, &receipt, &lot))
        .await
        .unwrap();
    let form = service.send(&fx.actor(), form.id, true).await.unwrap();
    assert_eq!(form.status, FormStatus::Sent);

    let events = fx.events();
    let attachment = events
        .iter()
        .find_map(|e| match e {
            PlatformEvent::Message { message, .. } => message.attachments.first().cloned(),
            _ => None,
        })
        .expect("form PDF posted");
    assert_eq!(
        attachment.name,
        format!(
            "[SENT]Reception_and_release_form-lot{}.pdf",
            lot.name.replace('/', "")
        )
    );
    assert!(fx.message_bodies()[0].starts_with("Form generated by Marie Curie on "));

    let (target, subject, body) = events
        .iter()
        .find_map(|e| match e {
            PlatformEvent::FollowersNotified {
                target,
                subject,
                body,
            } => Some((target, subject, body)),
            _ => None,
        })
        .expect("control point followers notified");
    assert_eq!(target.id, check.point_id);
    assert_eq!(subject, VALIDATION_SUBJECT);
    assert!(body.contains(&format!("{}/lots/{}", WEB_BASE_URL, lot.id)));
}

#[tokio::test]
async fn test_sign_records_approval_and_lot_status() {
    let fx = Fixture::new();
    let service = ReceptionFormService::new(fx.ports.clone());
    let product = fx.product(CriticalLevel::LessCritical);
    let lot = fx.lot(&product, "4");
    let receipt = fx.receipt(&[(&lot, "4")]);
    let actor = fx.actor();

    let form = service
        .create(fx.form(FormType::RcWithoutQc, &receipt, &lot))
        .await
        .unwrap();

    // Only sent forms can be signed
    let err = service.sign(&actor, form.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition(_)));

    service.send(&actor, form.id, true).await.unwrap();
    let form = service
        .sign(&actor, form.id, Some(LotStatus::Released))
        .await
        .unwrap();

    assert_eq!(form.status, FormStatus::Approved);
    assert_eq!(form.release.lot_status, Some(LotStatus::Released));
    assert_eq!(form.approval.map(|s| s.user_id), Some(actor.user_id));
    assert!(fx
        .message_bodies()
        .iter()
        .any(|b| b.starts_with("Form signed by Marie Curie on ")));
}

#[tokio::test]
async fn test_only_rc_with_qc_forms_close() {
    let fx = Fixture::new();
    let service = ReceptionFormService::new(fx.ports.clone());
    let product = fx.product(CriticalLevel::LessCritical);
    let lot = fx.lot(&product, "4");
    let receipt = fx.receipt(&[(&lot, "4")]);
    let actor = fx.actor();

    let form = service
        .create(fx.form(FormType::RcWithoutQc, &receipt, &lot))
        .await
        .unwrap();
    service.send(&actor, form.id, true).await.unwrap();
    service.sign(&actor, form.id, None).await.unwrap();

    let input = CloseFormInput {
        reconciliation_consistency: ReconciliationConsistency::Consistent,
        reconciliation_comment: None,
    };
    let err = service.close(&actor, form.id, input).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition(_)));
}

#[tokio::test]
async fn test_close_drops_comment_of_consistent_reconciliation() {
    let c = approved_parent().await;
    let actor = c.fx.actor();

    let input = CloseFormInput {
        reconciliation_consistency: ReconciliationConsistency::Consistent,
        reconciliation_comment: Some("counted twice".to_string()),
    };
    let form = c.service.close(&actor, c.parent.id, input).await.unwrap();

    assert_eq!(form.status, FormStatus::Closed);
    let closure = form.closure.expect("closure recorded");
    assert_eq!(closure.closed_by, actor.user_id);
    assert_eq!(closure.reconciliation_comment, None);
    assert!(c
        .fx
        .message_bodies()
        .iter()
        .any(|b| b.starts_with("Form closed by Marie Curie on ")));
}

#[tokio::test]
async fn test_signing_last_child_marks_parent_to_close() {
    let c = approved_parent().await;
    let first = sent_child(&c, "4", false).await;
    let last = sent_child(&c, "6", true).await;

    c.service.sign(&c.fx.actor(), first.id, None).await.unwrap();
    let parent = c.service.get(c.parent.id).await.unwrap();
    assert_eq!(parent.status, FormStatus::Approved);

    c.service.sign(&c.fx.actor(), last.id, None).await.unwrap();
    let parent = c.service.get(c.parent.id).await.unwrap();
    assert_eq!(parent.status, FormStatus::ToClose);

    let summary = c.service.closing_summary(c.parent.id).await.unwrap();
    assert_eq!(summary.product_qty, dec("10"));
    assert_eq!(summary.total_qty_tested, dec("10"));
}

#[tokio::test]
async fn test_last_child_waits_for_parent_approval() {
    let fx = Fixture::new();
    let service = ReceptionFormService::new(fx.ports.clone());
    let product = fx.product(CriticalLevel::Critical);
    let lot = fx.lot(&product, "10");
    let receipt = fx.receipt(&[(&lot, "10")]);
    let actor = fx.actor();

    // Parent stays sent
    let parent = service
        .create(fx.form(FormType::RcWithQc, &receipt, &lot))
        .await
        .unwrap();
    let parent = service.send(&actor, parent.id, true).await.unwrap();
    let c = Critical {
        fx,
        service,
        parent,
    };
    let last = sent_child(&c, "10", true).await;

    let err = c.service.sign(&actor, last.id, None).await.unwrap_err();
    match err {
        AppError::Validation { field, message } => {
            assert_eq!(field, "parent_id");
            assert!(message.contains(&c.parent.name));
            assert!(message.contains("currently Sent"));
        }
        other => panic!("unexpected error {other:?}"),
    }

    // Nothing was written
    let last = c.service.get(last.id).await.unwrap();
    assert_eq!(last.status, FormStatus::Sent);
    assert_eq!(
        c.service.get(c.parent.id).await.unwrap().status,
        FormStatus::Sent
    );
}

#[tokio::test]
async fn test_store_keeps_one_last_child_per_parent() {
    let c = approved_parent().await;
    let mut last = sent_child(&c, "6", true).await;
    let mut other = sent_child(&c, "4", false).await;

    other.last_child = true;
    let err = c
        .fx
        .ports
        .forms
        .save(std::slice::from_ref(&other))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict { .. }));
    assert!(!c.service.get(other.id).await.unwrap().last_child);

    // Moving the flag within one write is fine
    last.last_child = false;
    c.fx.ports
        .forms
        .save(&[last, other.clone()])
        .await
        .unwrap();
    let flagged: Vec<Uuid> = c
        .fx
        .ports
        .forms
        .list(&FormFilter::children_of(c.parent.id))
        .await
        .unwrap()
        .into_iter()
        .filter(|f| f.last_child)
        .map(|f| f.id)
        .collect();
    assert_eq!(flagged, vec![other.id]);
}

#[tokio::test]
async fn test_parent_to_close_still_closes() {
    let c = approved_parent().await;
    let last = sent_child(&c, "10", true).await;
    c.service.sign(&c.fx.actor(), last.id, None).await.unwrap();

    let input = CloseFormInput {
        reconciliation_consistency: ReconciliationConsistency::NotConsistent,
        reconciliation_comment: Some("2 units missing".to_string()),
    };
    let form = c
        .service
        .close(&c.fx.actor(), c.parent.id, input)
        .await
        .unwrap();

    assert_eq!(form.status, FormStatus::Closed);
    assert_eq!(
        form.closure.and_then(|cl| cl.reconciliation_comment).as_deref(),
        Some("2 units missing")
    );
}

#[tokio::test]
async fn test_update_clears_comment_once_explanation_is_moot() {
    let fx = Fixture::new();
    let service = ReceptionFormService::new(fx.ports.clone());
    let product = fx.product(CriticalLevel::LessCritical);
    let lot = fx.lot(&product, "4");
    let receipt = fx.receipt(&[(&lot, "4")]);
    let actor = fx.actor();

    let form = service
        .create(fx.form(FormType::RcWithoutQc, &receipt, &lot))
        .await
        .unwrap();

    let form = service
        .update_form(
            &actor,
            form.id,
            ReceptionFormChanges {
                materials_conformity: Some(Conformity::No),
                reception_comment: Some("Torn blister".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(form.reception.reception_comment.as_deref(), Some("Torn blister"));

    let form = service
        .update_form(
            &actor,
            form.id,
            ReceptionFormChanges {
                materials_conformity: Some(Conformity::Yes),
                form_appendix: Some(AppendixState::Done),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(form.reception.reception_comment, None);

    let form = service
        .update_form(
            &actor,
            form.id,
            ReceptionFormChanges {
                items_stored: Some(false),
                storage_temperature: Some(StorageTemperature::Rt),
                storage_location: Some("Shelf B".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(form.release.storage_location, None);
    assert_eq!(form.release.storage_temperature, None);
}

#[tokio::test]
async fn test_signed_forms_are_read_only() {
    let c = approved_parent().await;
    let err = c
        .service
        .update_form(
            &c.fx.actor(),
            c.parent.id,
            ReceptionFormChanges {
                product_qty: Some(dec("12")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn test_negative_quantity_rejected() {
    let fx = Fixture::new();
    let service = ReceptionFormService::new(fx.ports.clone());
    let product = fx.product(CriticalLevel::LessCritical);
    let lot = fx.lot(&product, "4");
    let receipt = fx.receipt(&[(&lot, "4")]);

    let form = service
        .create(fx.form(FormType::RcWithoutQc, &receipt, &lot))
        .await
        .unwrap();
    let err = service
        .update_form(
            &fx.actor(),
            form.id,
            ReceptionFormChanges {
                product_qty: Some(dec("-1")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "product_qty"));
}
