//! Lot details, certificate of analysis prefill and arrival information

use chrono::Utc;
use serde::Serialize;
use shared::ClearDependentFields;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CoaSheet, Lot, LotFormCounters, PickingKind, ReceptionForm, StockState};
use crate::ports::{FormFilter, Ports};
use crate::services::CounterService;

/// Lot with its R&R counters
#[derive(Debug, Clone, Serialize)]
pub struct LotDetail {
    #[serde(flatten)]
    pub lot: Lot,
    pub counters: LotFormCounters,
}

/// Lot service
#[derive(Clone)]
pub struct LotService {
    ports: Ports,
    counters: CounterService,
}

impl LotService {
    pub fn new(ports: Ports) -> Self {
        Self {
            counters: CounterService::new(ports.clone()),
            ports,
        }
    }

    async fn find(&self, lot_id: Uuid) -> AppResult<Lot> {
        self.ports
            .inventory
            .find_lot(lot_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lot".to_string()))
    }

    /// Get a lot with its counters
    pub async fn get(&self, lot_id: Uuid) -> AppResult<LotDetail> {
        let lot = self.find(lot_id).await?;
        let counters = self.counters.lot_counters(lot.id).await?;
        Ok(LotDetail { lot, counters })
    }

    /// Every form of a lot, oldest first
    pub async fn forms(&self, lot_id: Uuid) -> AppResult<Vec<ReceptionForm>> {
        let lot = self.find(lot_id).await?;
        self.ports.forms.list(&FormFilter::lots(vec![lot.id])).await
    }

    /// Replace the CoA prefill, dropping values their controlling field no longer calls for
    pub async fn update_coa(&self, lot_id: Uuid, mut coa: CoaSheet) -> AppResult<Lot> {
        if coa.total_labels < 0 {
            return Err(AppError::validation("total_labels", "Label count cannot be negative"));
        }

        let mut lot = self.find(lot_id).await?;
        coa.clear_dependent_fields();
        lot.coa = coa;
        lot.updated_at = Utc::now();
        self.ports.inventory.save_lot(&lot).await?;

        tracing::debug!(lot = %lot.name, "CoA prefill updated");
        Ok(lot)
    }

    /// Arrival date and vendor from the latest done purchase receipt of the lot
    pub async fn refresh_arrival(&self, lot_id: Uuid) -> AppResult<Lot> {
        let mut lot = self.find(lot_id).await?;

        let mut picking_ids: Vec<Uuid> = Vec::new();
        for line in self.ports.inventory.move_lines_for_lot(lot.id).await? {
            if !picking_ids.contains(&line.picking_id) {
                picking_ids.push(line.picking_id);
            }
        }

        let latest = self
            .ports
            .inventory
            .pickings(&picking_ids)
            .await?
            .into_iter()
            .filter(|p| {
                p.kind == PickingKind::Incoming
                    && p.state == StockState::Done
                    && p.purchase_id.is_some()
            })
            .filter_map(|p| p.date_done.map(|done| (done, p)))
            .max_by_key(|(done, _)| *done);

        match latest {
            Some((done, picking)) => {
                lot.arrival_date = Some(done.date_naive());
                lot.partner_id = picking.partner_id;
            }
            None => {
                lot.arrival_date = None;
                lot.partner_id = None;
            }
        }
        lot.updated_at = Utc::now();
        self.ports.inventory.save_lot(&lot).await?;
        Ok(lot)
    }
}
