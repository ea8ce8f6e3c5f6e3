//! R&R counters of lots and transfers
//!
//! Counters are computed on read from the forms, so they are always
//! consistent with the latest transition.

use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    CriticalLevel, FormStatus, LotFormCounters, MoveLine, PickingFormCounters, ReceptionForm,
    StockState,
};
use crate::ports::{FormFilter, Ports};

/// Computes lot and transfer counters
#[derive(Clone)]
pub struct CounterService {
    ports: Ports,
}

impl CounterService {
    pub fn new(ports: Ports) -> Self {
        Self { ports }
    }

    /// Critical level of a product's category, `None` when either is unknown
    pub async fn critical_level(&self, product_id: Uuid) -> AppResult<Option<CriticalLevel>> {
        let Some(product) = self.ports.inventory.find_product(product_id).await? else {
            return Ok(None);
        };
        let category = self.ports.inventory.find_category(product.category_id).await?;
        Ok(category.map(|c| c.critical_level))
    }

    /// Counters of one lot
    pub async fn lot_counters(&self, lot_id: Uuid) -> AppResult<LotFormCounters> {
        let lot = self
            .ports
            .inventory
            .find_lot(lot_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;

        let forms = self.ports.forms.list(&FormFilter::lots(vec![lot.id])).await?;
        let level = self.critical_level(lot.product_id).await?;
        Ok(LotFormCounters::compute(&forms, level))
    }

    /// Counters of every lot in `lot_ids`
    async fn counters_by_lot(&self, lot_ids: &[Uuid]) -> AppResult<HashMap<Uuid, LotFormCounters>> {
        if lot_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let forms = self
            .ports
            .forms
            .list(&FormFilter::lots(lot_ids.to_vec()))
            .await?;
        let mut forms_by_lot: HashMap<Uuid, Vec<ReceptionForm>> = HashMap::new();
        for form in forms {
            forms_by_lot.entry(form.lot_id).or_default().push(form);
        }

        let mut levels: HashMap<Uuid, Option<CriticalLevel>> = HashMap::new();
        let mut counters = HashMap::with_capacity(lot_ids.len());
        for lot in self.ports.inventory.lots(lot_ids).await? {
            let level = match levels.get(&lot.product_id) {
                Some(level) => *level,
                None => {
                    let level = self.critical_level(lot.product_id).await?;
                    levels.insert(lot.product_id, level);
                    level
                }
            };
            let lot_forms = forms_by_lot.remove(&lot.id).unwrap_or_default();
            counters.insert(lot.id, LotFormCounters::compute(&lot_forms, level));
        }
        Ok(counters)
    }

    /// Counters of a transfer
    pub async fn picking_counters(&self, picking_id: Uuid) -> AppResult<PickingFormCounters> {
        let lines = self.ports.inventory.move_lines(picking_id).await?;
        let lot_ids = distinct_lots(&lines, false);
        let counters = self.counters_by_lot(&lot_ids).await?;

        Ok(PickingFormCounters {
            count_lots_to_process: lots_to_process(&lines, &counters).len(),
            count_lots_to_send: filter_lots(&lot_ids, &counters, |c| c.form_to_send_count > 0)
                .len(),
            count_lots_to_validate: filter_lots(&lot_ids, &counters, |c| {
                c.form_to_validate_count > 0
            })
            .len(),
        })
    }

    /// Lots of done move lines whose mandatory form is missing
    pub async fn lots_to_process(&self, picking_id: Uuid) -> AppResult<Vec<Uuid>> {
        let lines = self.ports.inventory.move_lines(picking_id).await?;
        let counters = self.counters_by_lot(&distinct_lots(&lines, true)).await?;
        Ok(lots_to_process(&lines, &counters))
    }

    /// Lots of a transfer with confirmed forms
    pub async fn lots_to_send(&self, picking_id: Uuid) -> AppResult<Vec<Uuid>> {
        let lot_ids = self.picking_lots(picking_id).await?;
        let counters = self.counters_by_lot(&lot_ids).await?;
        Ok(filter_lots(&lot_ids, &counters, |c| c.form_to_send_count > 0))
    }

    /// Lots of a transfer with sent forms
    pub async fn lots_to_validate(&self, picking_id: Uuid) -> AppResult<Vec<Uuid>> {
        let lot_ids = self.picking_lots(picking_id).await?;
        let counters = self.counters_by_lot(&lot_ids).await?;
        Ok(filter_lots(&lot_ids, &counters, |c| c.form_to_validate_count > 0))
    }

    /// Forms in `status` on the lots of the given transfers
    pub async fn picking_forms(
        &self,
        picking_ids: &[Uuid],
        status: FormStatus,
    ) -> AppResult<Vec<ReceptionForm>> {
        let mut lot_ids = Vec::new();
        for picking_id in picking_ids {
            for lot_id in self.picking_lots(*picking_id).await? {
                if !lot_ids.contains(&lot_id) {
                    lot_ids.push(lot_id);
                }
            }
        }
        if lot_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.ports
            .forms
            .list(&FormFilter::lots(lot_ids).with_status(status))
            .await
    }

    async fn picking_lots(&self, picking_id: Uuid) -> AppResult<Vec<Uuid>> {
        let lines = self.ports.inventory.move_lines(picking_id).await?;
        Ok(distinct_lots(&lines, false))
    }
}

/// Lots of the lines in first-seen order
fn distinct_lots(lines: &[MoveLine], done_only: bool) -> Vec<Uuid> {
    let mut lots = Vec::new();
    for line in lines {
        if done_only && line.state != StockState::Done {
            continue;
        }
        if let Some(lot_id) = line.lot_id {
            if !lots.contains(&lot_id) {
                lots.push(lot_id);
            }
        }
    }
    lots
}

fn lots_to_process(lines: &[MoveLine], counters: &HashMap<Uuid, LotFormCounters>) -> Vec<Uuid> {
    filter_lots(&distinct_lots(lines, true), counters, |c| c.needs_processing())
}

fn filter_lots(
    lot_ids: &[Uuid],
    counters: &HashMap<Uuid, LotFormCounters>,
    keep: impl Fn(&LotFormCounters) -> bool,
) -> Vec<Uuid> {
    lot_ids
        .iter()
        .filter(|id| counters.get(*id).is_some_and(&keep))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn line(lot_id: Option<Uuid>, state: StockState) -> MoveLine {
        MoveLine {
            id: Uuid::new_v4(),
            picking_id: Uuid::nil(),
            move_id: None,
            product_id: Uuid::nil(),
            lot_id,
            qty_done: Decimal::ONE,
            state,
        }
    }

    #[test]
    fn test_distinct_lots_keeps_first_seen_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let lines = vec![
            line(Some(b), StockState::Done),
            line(None, StockState::Done),
            line(Some(a), StockState::Assigned),
            line(Some(b), StockState::Done),
        ];
        assert_eq!(distinct_lots(&lines, false), vec![b, a]);
        assert_eq!(distinct_lots(&lines, true), vec![b]);
    }

    #[test]
    fn test_lots_to_process_requires_mandatory_form() {
        let (mandatory, furniture) = (Uuid::new_v4(), Uuid::new_v4());
        let lines = vec![
            line(Some(mandatory), StockState::Done),
            line(Some(furniture), StockState::Done),
        ];
        let counters = HashMap::from([
            (
                mandatory,
                LotFormCounters {
                    is_form_mandatory: true,
                    ..Default::default()
                },
            ),
            (furniture, LotFormCounters::default()),
        ]);
        assert_eq!(lots_to_process(&lines, &counters), vec![mandatory]);
    }
}
