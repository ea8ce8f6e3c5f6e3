//! In-memory adapters for the `memory` storage backend and tests

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Employee, Lot, MoveLine, Picking, Product, ProductCategory, QualityCheck, QualityPoint,
    ReceptionForm, ReceptionFormAction, StockMove,
};
use crate::ports::{
    Activity, Chatter, ChatterMessage, EmployeeRepository, FormActionRepository, FormFilter,
    InventoryRepository, Ports, QualityRepository, ReceptionFormRepository, RecordRef,
    ReportRenderer, SequenceAllocator, FORM_SEQUENCE, PRODUCT_CODE_SEQUENCE,
};

/// Thread-safe in-memory store for every repository port
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    forms: Vec<ReceptionForm>,
    lots: HashMap<Uuid, Lot>,
    products: HashMap<Uuid, Product>,
    categories: HashMap<Uuid, ProductCategory>,
    pickings: HashMap<Uuid, Picking>,
    moves: Vec<StockMove>,
    move_lines: Vec<MoveLine>,
    checks: Vec<QualityCheck>,
    points: HashMap<Uuid, QualityPoint>,
    actions: Vec<ReceptionFormAction>,
    employees: HashMap<Uuid, Employee>,
    sequences: HashMap<String, u64>,
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> AppError {
    AppError::Internal(format!("memory store lock poisoned: {}", err))
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(poisoned)
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(poisoned)
    }

    /// Ports backed by this store and the given platform services
    pub fn ports<P>(&self, platform: Arc<P>, web_base_url: &str) -> Ports
    where
        P: Chatter + ReportRenderer + 'static,
    {
        let store = Arc::new(self.clone());
        Ports {
            forms: store.clone(),
            inventory: store.clone(),
            quality: store.clone(),
            actions: store.clone(),
            employees: store.clone(),
            sequences: store,
            reports: platform.clone(),
            chatter: platform,
            web_base_url: web_base_url.to_string(),
        }
    }

    // Seeding, for records owned by other applications

    pub fn add_category(&self, category: ProductCategory) -> AppResult<()> {
        self.write()?.categories.insert(category.id, category);
        Ok(())
    }

    pub fn add_product(&self, product: Product) -> AppResult<()> {
        self.write()?.products.insert(product.id, product);
        Ok(())
    }

    pub fn add_lot(&self, lot: Lot) -> AppResult<()> {
        self.write()?.lots.insert(lot.id, lot);
        Ok(())
    }

    pub fn add_picking(&self, picking: Picking) -> AppResult<()> {
        self.write()?.pickings.insert(picking.id, picking);
        Ok(())
    }

    pub fn add_move(&self, stock_move: StockMove) -> AppResult<()> {
        self.write()?.moves.push(stock_move);
        Ok(())
    }

    pub fn add_move_line(&self, line: MoveLine) -> AppResult<()> {
        self.write()?.move_lines.push(line);
        Ok(())
    }

    pub fn add_point(&self, point: QualityPoint) -> AppResult<()> {
        self.write()?.points.insert(point.id, point);
        Ok(())
    }

    pub fn add_check(&self, check: QualityCheck) -> AppResult<()> {
        self.write()?.checks.push(check);
        Ok(())
    }

    pub fn add_employee(&self, employee: Employee) -> AppResult<()> {
        self.write()?.employees.insert(employee.id, employee);
        Ok(())
    }
}

#[async_trait]
impl ReceptionFormRepository for MemoryStore {
    async fn find(&self, id: Uuid) -> AppResult<Option<ReceptionForm>> {
        Ok(self.read()?.forms.iter().find(|f| f.id == id).cloned())
    }

    async fn list(&self, filter: &FormFilter) -> AppResult<Vec<ReceptionForm>> {
        Ok(self
            .read()?
            .forms
            .iter()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect())
    }

    async fn insert(&self, forms: &[ReceptionForm]) -> AppResult<()> {
        let mut state = self.write()?;
        for form in forms {
            let duplicate = state.forms.iter().any(|f| f.id == form.id)
                || forms.iter().filter(|f| f.id == form.id).count() > 1;
            if duplicate {
                return Err(AppError::Conflict {
                    resource: "reception_form".to_string(),
                    message: format!("Form {} already exists", form.id),
                });
            }
        }
        ensure_single_last_child(&state.forms, forms)?;

        state.forms.extend(forms.iter().cloned());
        Ok(())
    }

    async fn save(&self, forms: &[ReceptionForm]) -> AppResult<()> {
        let mut state = self.write()?;
        let positions = forms
            .iter()
            .map(|form| {
                state
                    .forms
                    .iter()
                    .position(|f| f.id == form.id)
                    .ok_or_else(|| AppError::NotFound(format!("Reception form {}", form.id)))
            })
            .collect::<AppResult<Vec<_>>>()?;
        ensure_single_last_child(&state.forms, forms)?;

        for (position, form) in positions.into_iter().zip(forms) {
            state.forms[position] = form.clone();
        }
        Ok(())
    }
}

/// At most one last child per parent, checked against the state after `written`
fn ensure_single_last_child(stored: &[ReceptionForm], written: &[ReceptionForm]) -> AppResult<()> {
    let after = |f: &ReceptionForm| {
        written
            .iter()
            .find(|w| w.id == f.id)
            .map_or(f.last_child, |w| w.last_child)
    };

    for form in written.iter().filter(|f| f.last_child) {
        let clash = stored
            .iter()
            .filter(|f| f.id != form.id && f.parent_id == form.parent_id)
            .any(|f| after(f))
            || written
                .iter()
                .any(|f| f.id != form.id && f.parent_id == form.parent_id && f.last_child);
        if clash {
            return Err(AppError::Conflict {
                resource: "reception_form".to_string(),
                message: "A parent form can only have one last child".to_string(),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl InventoryRepository for MemoryStore {
    async fn find_lot(&self, id: Uuid) -> AppResult<Option<Lot>> {
        Ok(self.read()?.lots.get(&id).cloned())
    }

    async fn lots(&self, ids: &[Uuid]) -> AppResult<Vec<Lot>> {
        let state = self.read()?;
        Ok(ids.iter().filter_map(|id| state.lots.get(id).cloned()).collect())
    }

    async fn save_lot(&self, lot: &Lot) -> AppResult<()> {
        let mut state = self.write()?;
        let existing = state
            .lots
            .get_mut(&lot.id)
            .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;
        *existing = lot.clone();
        Ok(())
    }

    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn insert_product(&self, product: &Product) -> AppResult<()> {
        self.write()?.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn find_category(&self, id: Uuid) -> AppResult<Option<ProductCategory>> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn find_picking(&self, id: Uuid) -> AppResult<Option<Picking>> {
        Ok(self.read()?.pickings.get(&id).cloned())
    }

    async fn pickings(&self, ids: &[Uuid]) -> AppResult<Vec<Picking>> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.pickings.get(id).cloned())
            .collect())
    }

    async fn moves(&self, picking_id: Uuid) -> AppResult<Vec<StockMove>> {
        Ok(self
            .read()?
            .moves
            .iter()
            .filter(|m| m.picking_id == Some(picking_id))
            .cloned()
            .collect())
    }

    async fn find_moves(&self, ids: &[Uuid]) -> AppResult<Vec<StockMove>> {
        Ok(self
            .read()?
            .moves
            .iter()
            .filter(|m| ids.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn move_lines(&self, picking_id: Uuid) -> AppResult<Vec<MoveLine>> {
        Ok(self
            .read()?
            .move_lines
            .iter()
            .filter(|l| l.picking_id == picking_id)
            .cloned()
            .collect())
    }

    async fn move_lines_for_lot(&self, lot_id: Uuid) -> AppResult<Vec<MoveLine>> {
        Ok(self
            .read()?
            .move_lines
            .iter()
            .filter(|l| l.lot_id == Some(lot_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl QualityRepository for MemoryStore {
    async fn find_check(&self, id: Uuid) -> AppResult<Option<QualityCheck>> {
        Ok(self.read()?.checks.iter().find(|c| c.id == id).cloned())
    }

    async fn save_check(&self, check: &QualityCheck) -> AppResult<()> {
        let mut state = self.write()?;
        let existing = state
            .checks
            .iter_mut()
            .find(|c| c.id == check.id)
            .ok_or_else(|| AppError::NotFound("Quality check".to_string()))?;
        *existing = check.clone();
        Ok(())
    }

    async fn checks_for_picking(&self, picking_id: Uuid) -> AppResult<Vec<QualityCheck>> {
        Ok(self
            .read()?
            .checks
            .iter()
            .filter(|c| c.picking_id == Some(picking_id))
            .cloned()
            .collect())
    }

    async fn find_point(&self, id: Uuid) -> AppResult<Option<QualityPoint>> {
        Ok(self.read()?.points.get(&id).cloned())
    }
}

#[async_trait]
impl FormActionRepository for MemoryStore {
    async fn list(&self, company_id: Uuid) -> AppResult<Vec<ReceptionFormAction>> {
        let mut actions: Vec<_> = self
            .read()?
            .actions
            .iter()
            .filter(|a| a.company_id == company_id)
            .cloned()
            .collect();
        actions.sort_by_key(|a| a.sequence);
        Ok(actions)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<ReceptionFormAction>> {
        Ok(self.read()?.actions.iter().find(|a| a.id == id).cloned())
    }

    async fn insert(&self, action: &ReceptionFormAction) -> AppResult<()> {
        self.write()?.actions.push(action.clone());
        Ok(())
    }

    async fn update(&self, action: &ReceptionFormAction) -> AppResult<()> {
        let mut state = self.write()?;
        let existing = state
            .actions
            .iter_mut()
            .find(|a| a.id == action.id)
            .ok_or_else(|| AppError::NotFound("Form action".to_string()))?;
        *existing = action.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.write()?;
        let before = state.actions.len();
        state.actions.retain(|a| a.id != id);
        Ok(state.actions.len() != before)
    }
}

#[async_trait]
impl EmployeeRepository for MemoryStore {
    async fn find(&self, id: Uuid) -> AppResult<Option<Employee>> {
        Ok(self.read()?.employees.get(&id).cloned())
    }

    async fn save(&self, employee: &Employee) -> AppResult<()> {
        self.write()?
            .employees
            .insert(employee.id, employee.clone());
        Ok(())
    }
}

#[async_trait]
impl SequenceAllocator for MemoryStore {
    async fn next_by_code(&self, code: &str) -> AppResult<String> {
        let (prefix, padding) = match code {
            FORM_SEQUENCE => ("RR/", 5),
            PRODUCT_CODE_SEQUENCE => ("P", 6),
            _ => return Err(AppError::Configuration(format!("Unknown sequence {}", code))),
        };
        let mut state = self.write()?;
        let number = state.sequences.entry(code.to_string()).or_insert(0);
        *number += 1;
        Ok(format!("{}{:0width$}", prefix, number, width = padding))
    }
}

/// Something the platform was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    Message {
        target: RecordRef,
        message: ChatterMessage,
    },
    Activity {
        target: RecordRef,
        activity: Activity,
    },
    FollowersNotified {
        target: RecordRef,
        subject: String,
        body: String,
    },
    GroupNotified {
        group_id: Uuid,
        subject: String,
        body: String,
    },
    Rendered {
        report: String,
        record: RecordRef,
    },
}

/// Chatter and report renderer that logs and records every request
/// instead of calling the platform
#[derive(Debug, Clone, Default)]
pub struct RecordingPlatform {
    events: Arc<RwLock<Vec<PlatformEvent>>>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event recorded so far
    pub fn events(&self) -> Vec<PlatformEvent> {
        self.events
            .read()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn record(&self, event: PlatformEvent) -> AppResult<()> {
        self.events.write().map_err(poisoned)?.push(event);
        Ok(())
    }
}

#[async_trait]
impl ReportRenderer for RecordingPlatform {
    async fn render_pdf(&self, report: &str, record: RecordRef) -> AppResult<Vec<u8>> {
        tracing::debug!(report, model = record.model.as_str(), id = %record.id, "Rendering report locally");
        self.record(PlatformEvent::Rendered {
            report: report.to_string(),
            record,
        })?;
        Ok(format!("%PDF-1.4\n% {} {} {}\n", report, record.id, Utc::now().to_rfc3339())
            .into_bytes())
    }
}

#[async_trait]
impl Chatter for RecordingPlatform {
    async fn post_message(&self, target: RecordRef, message: ChatterMessage) -> AppResult<()> {
        tracing::info!(model = target.model.as_str(), id = %target.id, body = %message.body, "Chatter message");
        self.record(PlatformEvent::Message { target, message })
    }

    async fn schedule_activity(&self, target: RecordRef, activity: Activity) -> AppResult<()> {
        tracing::info!(model = target.model.as_str(), id = %target.id, summary = %activity.summary, "Activity scheduled");
        self.record(PlatformEvent::Activity { target, activity })
    }

    async fn notify_followers(
        &self,
        target: RecordRef,
        subject: &str,
        body: &str,
    ) -> AppResult<()> {
        tracing::info!(model = target.model.as_str(), id = %target.id, subject, "Followers notified");
        self.record(PlatformEvent::FollowersNotified {
            target,
            subject: subject.to_string(),
            body: body.to_string(),
        })
    }

    async fn notify_group(&self, group_id: Uuid, subject: &str, body: &str) -> AppResult<()> {
        tracing::info!(%group_id, subject, "Group notified");
        self.record(PlatformEvent::GroupNotified {
            group_id,
            subject: subject.to_string(),
            body: body.to_string(),
        })
    }
}
