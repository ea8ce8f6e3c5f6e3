use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::PgStore;
use crate::error::{AppError, AppResult};
use crate::models::{QualityCheck, QualityPoint};
use crate::ports::QualityRepository;

#[derive(Debug, sqlx::FromRow)]
struct CheckRow {
    id: Uuid,
    name: String,
    point_id: Uuid,
    product_id: Uuid,
    picking_id: Option<Uuid>,
    quality_state: String,
    qty_conform: Decimal,
    qty_not_conform: Decimal,
    qc_reconciliation_consistency: Option<String>,
    qc_reconciliation_comment: Option<String>,
    not_conform_fate: Option<String>,
    not_conform_custom_fate: Option<String>,
    final_packaging_size: Option<String>,
}

impl TryFrom<CheckRow> for QualityCheck {
    type Error = AppError;

    fn try_from(row: CheckRow) -> Result<Self, Self::Error> {
        Ok(QualityCheck {
            id: row.id,
            name: row.name,
            point_id: row.point_id,
            product_id: row.product_id,
            picking_id: row.picking_id,
            quality_state: row.quality_state.parse()?,
            qty_conform: row.qty_conform,
            qty_not_conform: row.qty_not_conform,
            qc_reconciliation_consistency: row
                .qc_reconciliation_consistency
                .map(|v| v.parse())
                .transpose()?,
            qc_reconciliation_comment: row.qc_reconciliation_comment,
            not_conform_fate: row.not_conform_fate.map(|v| v.parse()).transpose()?,
            not_conform_custom_fate: row.not_conform_custom_fate,
            final_packaging_size: row.final_packaging_size,
        })
    }
}

const CHECK_COLUMNS: &str = r#"
    id, name, point_id, product_id, picking_id, quality_state, qty_conform, qty_not_conform,
    qc_reconciliation_consistency, qc_reconciliation_comment, not_conform_fate,
    not_conform_custom_fate, final_packaging_size
"#;

#[async_trait]
impl QualityRepository for PgStore {
    async fn find_check(&self, id: Uuid) -> AppResult<Option<QualityCheck>> {
        let row = sqlx::query_as::<_, CheckRow>(&format!(
            "SELECT {} FROM quality_checks WHERE id = $1",
            CHECK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(QualityCheck::try_from).transpose()
    }

    async fn save_check(&self, check: &QualityCheck) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE quality_checks
            SET quality_state = $2, qty_conform = $3, qty_not_conform = $4,
                qc_reconciliation_consistency = $5, qc_reconciliation_comment = $6,
                not_conform_fate = $7, not_conform_custom_fate = $8, final_packaging_size = $9
            WHERE id = $1
            "#,
        )
        .bind(check.id)
        .bind(check.quality_state.as_str())
        .bind(check.qty_conform)
        .bind(check.qty_not_conform)
        .bind(check.qc_reconciliation_consistency.map(|v| v.as_str()))
        .bind(&check.qc_reconciliation_comment)
        .bind(check.not_conform_fate.map(|v| v.as_str()))
        .bind(&check.not_conform_custom_fate)
        .bind(&check.final_packaging_size)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Quality check".to_string()));
        }
        Ok(())
    }

    async fn checks_for_picking(&self, picking_id: Uuid) -> AppResult<Vec<QualityCheck>> {
        let rows = sqlx::query_as::<_, CheckRow>(&format!(
            "SELECT {} FROM quality_checks WHERE picking_id = $1 ORDER BY name",
            CHECK_COLUMNS
        ))
        .bind(picking_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(QualityCheck::try_from).collect()
    }

    async fn find_point(&self, id: Uuid) -> AppResult<Option<QualityPoint>> {
        let row = sqlx::query_as::<_, (Uuid, String, bool)>(
            "SELECT id, name, is_form_validation_required FROM quality_points WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|(id, name, is_form_validation_required)| QualityPoint {
            id,
            name,
            is_form_validation_required,
        }))
    }
}
