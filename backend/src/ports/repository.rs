//! Repository ports for the records read and written by the services

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    Employee, FormStatus, FormType, Lot, MoveLine, Picking, Product, ProductCategory,
    QualityCheck, QualityPoint, ReceptionForm, ReceptionFormAction, StockMove,
};

/// Criteria for listing R&R forms; unset criteria match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFilter {
    pub lot_ids: Option<Vec<Uuid>>,
    pub picking_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub check_id: Option<Uuid>,
    pub status: Option<FormStatus>,
    pub form_type: Option<FormType>,
}

impl FormFilter {
    pub fn lots(lot_ids: Vec<Uuid>) -> Self {
        Self {
            lot_ids: Some(lot_ids),
            ..Default::default()
        }
    }

    pub fn children_of(parent_id: Uuid) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Default::default()
        }
    }

    pub fn check(check_id: Uuid) -> Self {
        Self {
            check_id: Some(check_id),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: FormStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// In-process evaluation, used by adapters without a query engine
    pub fn matches(&self, form: &ReceptionForm) -> bool {
        self.lot_ids.as_ref().map_or(true, |ids| ids.contains(&form.lot_id))
            && self.picking_id.map_or(true, |id| form.picking_id == id)
            && self.parent_id.map_or(true, |id| form.parent_id == Some(id))
            && self.check_id.map_or(true, |id| form.check_id == Some(id))
            && self.status.map_or(true, |s| form.status == s)
            && self.form_type.map_or(true, |t| form.form_type == t)
    }
}

/// R&R form persistence. Forms are never deleted.
#[async_trait]
pub trait ReceptionFormRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> AppResult<Option<ReceptionForm>>;

    /// Forms matching the filter, oldest first
    async fn list(&self, filter: &FormFilter) -> AppResult<Vec<ReceptionForm>>;

    /// Stores new forms in a single transaction
    async fn insert(&self, forms: &[ReceptionForm]) -> AppResult<()>;

    /// Persists changes to existing forms in a single transaction
    async fn save(&self, forms: &[ReceptionForm]) -> AppResult<()>;
}

/// Inventory records owned by the stock application
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn find_lot(&self, id: Uuid) -> AppResult<Option<Lot>>;

    async fn lots(&self, ids: &[Uuid]) -> AppResult<Vec<Lot>>;

    async fn save_lot(&self, lot: &Lot) -> AppResult<()>;

    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>>;

    async fn insert_product(&self, product: &Product) -> AppResult<()>;

    async fn find_category(&self, id: Uuid) -> AppResult<Option<ProductCategory>>;

    async fn find_picking(&self, id: Uuid) -> AppResult<Option<Picking>>;

    async fn pickings(&self, ids: &[Uuid]) -> AppResult<Vec<Picking>>;

    /// Moves of a transfer
    async fn moves(&self, picking_id: Uuid) -> AppResult<Vec<StockMove>>;

    async fn find_moves(&self, ids: &[Uuid]) -> AppResult<Vec<StockMove>>;

    /// Move lines of a transfer
    async fn move_lines(&self, picking_id: Uuid) -> AppResult<Vec<MoveLine>>;

    async fn move_lines_for_lot(&self, lot_id: Uuid) -> AppResult<Vec<MoveLine>>;
}

/// Quality control records
#[async_trait]
pub trait QualityRepository: Send + Sync {
    async fn find_check(&self, id: Uuid) -> AppResult<Option<QualityCheck>>;

    async fn save_check(&self, check: &QualityCheck) -> AppResult<()>;

    async fn checks_for_picking(&self, picking_id: Uuid) -> AppResult<Vec<QualityCheck>>;

    async fn find_point(&self, id: Uuid) -> AppResult<Option<QualityPoint>>;
}

/// Lock/notify configuration
#[async_trait]
pub trait FormActionRepository: Send + Sync {
    /// Actions of a company, ordered by sequence
    async fn list(&self, company_id: Uuid) -> AppResult<Vec<ReceptionFormAction>>;

    async fn find(&self, id: Uuid) -> AppResult<Option<ReceptionFormAction>>;

    async fn insert(&self, action: &ReceptionFormAction) -> AppResult<()>;

    async fn update(&self, action: &ReceptionFormAction) -> AppResult<()>;

    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> AppResult<Option<Employee>>;

    async fn save(&self, employee: &Employee) -> AppResult<()>;
}
