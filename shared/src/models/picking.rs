//! Transfer (picking), stock move and move line models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

selection! {
    /// Direction of a transfer
    pub enum PickingKind {
        Incoming => ("incoming", "Receipt"),
        Outgoing => ("outgoing", "Delivery"),
        Internal => ("internal", "Internal Transfer"),
    }
}

selection! {
    /// Progress of a transfer or one of its lines
    pub enum StockState {
        Draft => ("draft", "Draft"),
        Waiting => ("waiting", "Waiting"),
        Assigned => ("assigned", "Ready"),
        Done => ("done", "Done"),
        Cancel => ("cancel", "Cancelled"),
    }
}

/// An inventory transfer, e.g. the receipt of a purchase order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Picking {
    pub id: Uuid,
    pub name: String,
    pub company_id: Uuid,
    /// Operation type
    pub picking_type_id: Uuid,
    pub kind: PickingKind,
    pub state: StockState,
    pub date_done: Option<DateTime<Utc>>,
    pub purchase_id: Option<Uuid>,
    /// Vendor of the purchase order
    pub partner_id: Option<Uuid>,
}

/// A stock move; chained moves keep the moves they originate from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMove {
    pub id: Uuid,
    pub picking_id: Option<Uuid>,
    pub origin_move_ids: Vec<Uuid>,
}

/// Detailed operation of a move: one product/lot and the quantity done
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveLine {
    pub id: Uuid,
    pub picking_id: Uuid,
    pub move_id: Option<Uuid>,
    pub product_id: Uuid,
    pub lot_id: Option<Uuid>,
    pub qty_done: Decimal,
    pub state: StockState,
}

/// R&R counters of a transfer
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PickingFormCounters {
    /// Lots received without a mandatory form
    pub count_lots_to_process: usize,
    /// Lots with confirmed forms not sent yet
    pub count_lots_to_send: usize,
    /// Lots with sent forms waiting for validation
    pub count_lots_to_validate: usize,
}

impl PickingFormCounters {
    /// True when nothing blocks quality checks on this transfer
    pub fn is_clear(&self) -> bool {
        self.count_lots_to_process == 0
            && self.count_lots_to_send == 0
            && self.count_lots_to_validate == 0
    }
}
