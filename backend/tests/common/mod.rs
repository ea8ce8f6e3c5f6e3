//! Test fixtures: an in-memory store seeded with the stock records R&R
//! forms hang off, and a platform that records chatter traffic.
#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use rnr_backend::adapters::{MemoryStore, PlatformEvent, RecordingPlatform};
use rnr_backend::models::{
    Actor, CoaSheet, CriticalLevel, FormStatus, FormType, Lot, MoveLine, Picking, PickingKind,
    Product, ProductCategory, QualityCheck, QualityPoint, QualityState, ReceptionChecklist,
    ReceptionForm, ReleaseDetails, StockMove, StockState, SupplierInfo,
};
use rnr_backend::ports::Ports;

pub const WEB_BASE_URL: &str = "https://erp.example.test/web";

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// A transfer and the moves created on it
pub struct Transfer {
    pub picking: Picking,
    pub move_ids: Vec<Uuid>,
}

pub struct Fixture {
    pub store: MemoryStore,
    pub platform: Arc<RecordingPlatform>,
    pub ports: Ports,
    pub company_id: Uuid,
    pub picking_type_id: Uuid,
    pub partner_id: Uuid,
}

impl Fixture {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let platform = Arc::new(RecordingPlatform::new());
        let ports = store.ports(platform.clone(), WEB_BASE_URL);
        Self {
            store,
            platform,
            ports,
            company_id: Uuid::new_v4(),
            picking_type_id: Uuid::new_v4(),
            partner_id: Uuid::new_v4(),
        }
    }

    pub fn actor(&self) -> Actor {
        self.actor_in(vec![])
    }

    pub fn actor_in(&self, groups: Vec<Uuid>) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            name: "Marie Curie".to_string(),
            company_id: self.company_id,
            job_title: Some("Quality Manager".to_string()),
            signature: Some("c2lnbmF0dXJl".to_string()),
            groups,
        }
    }

    pub fn product(&self, level: CriticalLevel) -> Product {
        let category = ProductCategory {
            id: Uuid::new_v4(),
            name: format!("{} implants", level.label()),
            critical_level: level,
        };
        let product = Product {
            id: Uuid::new_v4(),
            name: "Cortical screw".to_string(),
            default_code: Some("P000042".to_string()),
            category_id: category.id,
            specification_ref: Some("SPEC-CS-01".to_string()),
            storage_temperature: None,
            manual_temperature: None,
            sellers: vec![SupplierInfo {
                partner_id: self.partner_id,
                product_code: Some("ACME-CS".to_string()),
            }],
            created_at: Utc::now(),
        };
        self.store.add_category(category).unwrap();
        self.store.add_product(product.clone()).unwrap();
        product
    }

    pub fn lot(&self, product: &Product, qty: &str) -> Lot {
        let now = Utc::now();
        let lot = Lot {
            id: Uuid::new_v4(),
            name: format!("LOT/{}", &Uuid::new_v4().simple().to_string()[..6]),
            product_id: product.id,
            company_id: self.company_id,
            expiration_date: None,
            product_qty: dec(qty),
            coa: CoaSheet::default(),
            arrival_date: None,
            partner_id: None,
            created_at: now,
            updated_at: now,
        };
        self.store.add_lot(lot.clone()).unwrap();
        lot
    }

    fn transfer(
        &self,
        name: &str,
        kind: PickingKind,
        lines: &[(&Lot, &str)],
        origin_move_ids: Vec<Uuid>,
    ) -> Transfer {
        let picking = Picking {
            id: Uuid::new_v4(),
            name: name.to_string(),
            company_id: self.company_id,
            picking_type_id: self.picking_type_id,
            kind,
            state: StockState::Done,
            date_done: Some(Utc::now()),
            purchase_id: (kind == PickingKind::Incoming).then(Uuid::new_v4),
            partner_id: Some(self.partner_id),
        };
        self.store.add_picking(picking.clone()).unwrap();

        let mut move_ids = Vec::new();
        for (lot, qty) in lines {
            let stock_move = StockMove {
                id: Uuid::new_v4(),
                picking_id: Some(picking.id),
                origin_move_ids: origin_move_ids.clone(),
            };
            move_ids.push(stock_move.id);
            self.store
                .add_move_line(MoveLine {
                    id: Uuid::new_v4(),
                    picking_id: picking.id,
                    move_id: Some(stock_move.id),
                    product_id: lot.product_id,
                    lot_id: Some(lot.id),
                    qty_done: dec(qty),
                    state: StockState::Done,
                })
                .unwrap();
            self.store.add_move(stock_move).unwrap();
        }
        Transfer { picking, move_ids }
    }

    /// Done receipt with one move line per lot
    pub fn receipt(&self, lines: &[(&Lot, &str)]) -> Transfer {
        self.transfer("WH/IN/00001", PickingKind::Incoming, lines, vec![])
    }

    /// Internal QC transfer chained to the moves of `origin`
    pub fn qc_transfer(&self, origin: &Transfer, lines: &[(&Lot, &str)]) -> Transfer {
        self.transfer(
            "WH/QC/00001",
            PickingKind::Internal,
            lines,
            origin.move_ids.clone(),
        )
    }

    pub fn check(
        &self,
        transfer: &Transfer,
        product: &Product,
        validation_required: bool,
    ) -> QualityCheck {
        let point = QualityPoint {
            id: Uuid::new_v4(),
            name: "Incoming sterility check".to_string(),
            is_form_validation_required: validation_required,
        };
        let check = QualityCheck {
            id: Uuid::new_v4(),
            name: "QC/00001".to_string(),
            point_id: point.id,
            product_id: product.id,
            picking_id: Some(transfer.picking.id),
            quality_state: QualityState::Todo,
            qty_conform: dec("0"),
            qty_not_conform: dec("0"),
            qc_reconciliation_consistency: None,
            qc_reconciliation_comment: None,
            not_conform_fate: None,
            not_conform_custom_fate: None,
            final_packaging_size: None,
        };
        self.store.add_point(point).unwrap();
        self.store.add_check(check.clone()).unwrap();
        check
    }

    /// Unsaved reception form of `lot` on `transfer`
    pub fn form(&self, form_type: FormType, transfer: &Transfer, lot: &Lot) -> ReceptionForm {
        let now = Utc::now();
        ReceptionForm {
            id: Uuid::new_v4(),
            name: String::new(),
            form_type,
            status: FormStatus::Draft,
            company_id: self.company_id,
            picking_id: transfer.picking.id,
            picking_type_id: transfer.picking.picking_type_id,
            lot_id: lot.id,
            product_id: lot.product_id,
            partner_id: transfer.picking.partner_id,
            seller_product_code: String::new(),
            parent_id: None,
            check_id: None,
            last_child: false,
            reception: ReceptionChecklist {
                product_qty: lot.product_qty,
                ..Default::default()
            },
            release: ReleaseDetails::default(),
            qc: None,
            tested: None,
            receipt: None,
            approval: None,
            closure: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn events(&self) -> Vec<PlatformEvent> {
        self.platform.events()
    }

    /// Bodies of the chatter messages posted so far
    pub fn message_bodies(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlatformEvent::Message { message, .. } => Some(message.body),
                _ => None,
            })
            .collect()
    }
}
