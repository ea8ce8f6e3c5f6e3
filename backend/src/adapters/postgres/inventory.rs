use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use uuid::Uuid;

use super::PgStore;
use crate::error::{AppError, AppResult};
use crate::models::{
    CoaSheet, Lot, MoveLine, Picking, Product, ProductCategory, StockMove, SupplierInfo,
};
use crate::ports::InventoryRepository;

#[derive(Debug, sqlx::FromRow)]
struct LotRow {
    id: Uuid,
    name: String,
    product_id: Uuid,
    company_id: Uuid,
    expiration_date: Option<NaiveDate>,
    product_qty: Decimal,
    coa: Json<CoaSheet>,
    arrival_date: Option<NaiveDate>,
    partner_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LotRow> for Lot {
    fn from(row: LotRow) -> Self {
        Lot {
            id: row.id,
            name: row.name,
            product_id: row.product_id,
            company_id: row.company_id,
            expiration_date: row.expiration_date,
            product_qty: row.product_qty,
            coa: row.coa.0,
            arrival_date: row.arrival_date,
            partner_id: row.partner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    default_code: Option<String>,
    category_id: Uuid,
    specification_ref: Option<String>,
    storage_temperature: Option<String>,
    manual_temperature: Option<String>,
    sellers: Json<Vec<SupplierInfo>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = AppError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: row.id,
            name: row.name,
            default_code: row.default_code,
            category_id: row.category_id,
            specification_ref: row.specification_ref,
            storage_temperature: row.storage_temperature.map(|t| t.parse()).transpose()?,
            manual_temperature: row.manual_temperature,
            sellers: row.sellers.0,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PickingRow {
    id: Uuid,
    name: String,
    company_id: Uuid,
    picking_type_id: Uuid,
    kind: String,
    state: String,
    date_done: Option<DateTime<Utc>>,
    purchase_id: Option<Uuid>,
    partner_id: Option<Uuid>,
}

impl TryFrom<PickingRow> for Picking {
    type Error = AppError;

    fn try_from(row: PickingRow) -> Result<Self, Self::Error> {
        Ok(Picking {
            id: row.id,
            name: row.name,
            company_id: row.company_id,
            picking_type_id: row.picking_type_id,
            kind: row.kind.parse()?,
            state: row.state.parse()?,
            date_done: row.date_done,
            purchase_id: row.purchase_id,
            partner_id: row.partner_id,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MoveLineRow {
    id: Uuid,
    picking_id: Uuid,
    move_id: Option<Uuid>,
    product_id: Uuid,
    lot_id: Option<Uuid>,
    qty_done: Decimal,
    state: String,
}

impl TryFrom<MoveLineRow> for MoveLine {
    type Error = AppError;

    fn try_from(row: MoveLineRow) -> Result<Self, Self::Error> {
        Ok(MoveLine {
            id: row.id,
            picking_id: row.picking_id,
            move_id: row.move_id,
            product_id: row.product_id,
            lot_id: row.lot_id,
            qty_done: row.qty_done,
            state: row.state.parse()?,
        })
    }
}

const LOT_COLUMNS: &str = "id, name, product_id, company_id, expiration_date, product_qty, coa, \
                           arrival_date, partner_id, created_at, updated_at";
const PICKING_COLUMNS: &str =
    "id, name, company_id, picking_type_id, kind, state, date_done, purchase_id, partner_id";
const MOVE_LINE_COLUMNS: &str = "id, picking_id, move_id, product_id, lot_id, qty_done, state";

fn move_lines(rows: Vec<MoveLineRow>) -> AppResult<Vec<MoveLine>> {
    rows.into_iter().map(MoveLine::try_from).collect()
}

#[async_trait]
impl InventoryRepository for PgStore {
    async fn find_lot(&self, id: Uuid) -> AppResult<Option<Lot>> {
        let row = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {} FROM lots WHERE id = $1",
            LOT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Lot::from))
    }

    async fn lots(&self, ids: &[Uuid]) -> AppResult<Vec<Lot>> {
        let rows = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {} FROM lots WHERE id = ANY($1) ORDER BY name",
            LOT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Lot::from).collect())
    }

    async fn save_lot(&self, lot: &Lot) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE lots
            SET coa = $2, arrival_date = $3, partner_id = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(lot.id)
        .bind(Json(&lot.coa))
        .bind(lot.arrival_date)
        .bind(lot.partner_id)
        .bind(lot.updated_at)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Lot".to_string()));
        }
        Ok(())
    }

    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, default_code, category_id, specification_ref, storage_temperature,
                   manual_temperature, sellers, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn insert_product(&self, product: &Product) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, default_code, category_id, specification_ref,
                                  storage_temperature, manual_temperature, sellers, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.default_code)
        .bind(product.category_id)
        .bind(&product.specification_ref)
        .bind(product.storage_temperature.map(|t| t.as_str()))
        .bind(&product.manual_temperature)
        .bind(Json(&product.sellers))
        .bind(product.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn find_category(&self, id: Uuid) -> AppResult<Option<ProductCategory>> {
        let row = sqlx::query_as::<_, (Uuid, String, String)>(
            "SELECT id, name, critical_level FROM product_categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(|(id, name, level)| {
            Ok(ProductCategory {
                id,
                name,
                critical_level: level.parse()?,
            })
        })
        .transpose()
    }

    async fn find_picking(&self, id: Uuid) -> AppResult<Option<Picking>> {
        let row = sqlx::query_as::<_, PickingRow>(&format!(
            "SELECT {} FROM pickings WHERE id = $1",
            PICKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Picking::try_from).transpose()
    }

    async fn pickings(&self, ids: &[Uuid]) -> AppResult<Vec<Picking>> {
        let rows = sqlx::query_as::<_, PickingRow>(&format!(
            "SELECT {} FROM pickings WHERE id = ANY($1) ORDER BY name",
            PICKING_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Picking::try_from).collect()
    }

    async fn moves(&self, picking_id: Uuid) -> AppResult<Vec<StockMove>> {
        let rows = sqlx::query_as::<_, (Uuid, Option<Uuid>, Vec<Uuid>)>(
            "SELECT id, picking_id, origin_move_ids FROM stock_moves WHERE picking_id = $1",
        )
        .bind(picking_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, picking_id, origin_move_ids)| StockMove {
                id,
                picking_id,
                origin_move_ids,
            })
            .collect())
    }

    async fn find_moves(&self, ids: &[Uuid]) -> AppResult<Vec<StockMove>> {
        let rows = sqlx::query_as::<_, (Uuid, Option<Uuid>, Vec<Uuid>)>(
            "SELECT id, picking_id, origin_move_ids FROM stock_moves WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, picking_id, origin_move_ids)| StockMove {
                id,
                picking_id,
                origin_move_ids,
            })
            .collect())
    }

    async fn move_lines(&self, picking_id: Uuid) -> AppResult<Vec<MoveLine>> {
        let rows = sqlx::query_as::<_, MoveLineRow>(&format!(
            "SELECT {} FROM stock_move_lines WHERE picking_id = $1",
            MOVE_LINE_COLUMNS
        ))
        .bind(picking_id)
        .fetch_all(&self.db)
        .await?;

        move_lines(rows)
    }

    async fn move_lines_for_lot(&self, lot_id: Uuid) -> AppResult<Vec<MoveLine>> {
        let rows = sqlx::query_as::<_, MoveLineRow>(&format!(
            "SELECT {} FROM stock_move_lines WHERE lot_id = $1",
            MOVE_LINE_COLUMNS
        ))
        .bind(lot_id)
        .fetch_all(&self.db)
        .await?;

        move_lines(rows)
    }
}
