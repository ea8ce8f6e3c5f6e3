use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use super::{unique_violation, PgStore};
use crate::error::{AppError, AppResult};
use crate::models::{
    Closure, QcMeasurements, ReceptionChecklist, ReceptionForm, ReleaseDetails, SignatureStamp,
};
use crate::ports::{FormFilter, ReceptionFormRepository};

const FORM_COLUMNS: &str = r#"
    id, name, form_type, status, company_id, picking_id, picking_type_id, lot_id,
    product_id, partner_id, seller_product_code, parent_id, check_id, last_child,
    reception, release, qc, tested, receipt, approval, closure, created_at, updated_at
"#;

/// Database row for an R&R form
#[derive(Debug, sqlx::FromRow)]
struct FormRow {
    id: Uuid,
    name: String,
    form_type: String,
    status: String,
    company_id: Uuid,
    picking_id: Uuid,
    picking_type_id: Uuid,
    lot_id: Uuid,
    product_id: Uuid,
    partner_id: Option<Uuid>,
    seller_product_code: String,
    parent_id: Option<Uuid>,
    check_id: Option<Uuid>,
    last_child: bool,
    reception: Json<ReceptionChecklist>,
    release: Json<ReleaseDetails>,
    qc: Option<Json<QcMeasurements>>,
    tested: Option<Json<SignatureStamp>>,
    receipt: Option<Json<SignatureStamp>>,
    approval: Option<Json<SignatureStamp>>,
    closure: Option<Json<Closure>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FormRow> for ReceptionForm {
    type Error = AppError;

    fn try_from(row: FormRow) -> Result<Self, Self::Error> {
        Ok(ReceptionForm {
            id: row.id,
            name: row.name,
            form_type: row.form_type.parse()?,
            status: row.status.parse()?,
            company_id: row.company_id,
            picking_id: row.picking_id,
            picking_type_id: row.picking_type_id,
            lot_id: row.lot_id,
            product_id: row.product_id,
            partner_id: row.partner_id,
            seller_product_code: row.seller_product_code,
            parent_id: row.parent_id,
            check_id: row.check_id,
            last_child: row.last_child,
            reception: row.reception.0,
            release: row.release.0,
            qc: row.qc.map(|j| j.0),
            tested: row.tested.map(|j| j.0),
            receipt: row.receipt.map(|j| j.0),
            approval: row.approval.map(|j| j.0),
            closure: row.closure.map(|j| j.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_forms(rows: Vec<FormRow>) -> AppResult<Vec<ReceptionForm>> {
    rows.into_iter().map(ReceptionForm::try_from).collect()
}

#[async_trait]
impl ReceptionFormRepository for PgStore {
    async fn find(&self, id: Uuid) -> AppResult<Option<ReceptionForm>> {
        let row = sqlx::query_as::<_, FormRow>(&format!(
            "SELECT {} FROM reception_forms WHERE id = $1",
            FORM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(ReceptionForm::try_from).transpose()
    }

    async fn list(&self, filter: &FormFilter) -> AppResult<Vec<ReceptionForm>> {
        let rows = sqlx::query_as::<_, FormRow>(&format!(
            r#"
            SELECT {} FROM reception_forms
            WHERE ($1::uuid[] IS NULL OR lot_id = ANY($1))
              AND ($2::uuid IS NULL OR picking_id = $2)
              AND ($3::uuid IS NULL OR parent_id = $3)
              AND ($4::uuid IS NULL OR check_id = $4)
              AND ($5::text IS NULL OR status = $5)
              AND ($6::text IS NULL OR form_type = $6)
            ORDER BY created_at, name
            "#,
            FORM_COLUMNS
        ))
        .bind(filter.lot_ids.as_deref())
        .bind(filter.picking_id)
        .bind(filter.parent_id)
        .bind(filter.check_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.form_type.map(|t| t.as_str()))
        .fetch_all(&self.db)
        .await?;

        into_forms(rows)
    }

    async fn insert(&self, forms: &[ReceptionForm]) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        for form in forms {
            sqlx::query(
                r#"
                INSERT INTO reception_forms (
                    id, name, form_type, status, company_id, picking_id, picking_type_id, lot_id,
                    product_id, partner_id, seller_product_code, parent_id, check_id, last_child,
                    reception, release, qc, tested, receipt, approval, closure, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                        $15, $16, $17, $18, $19, $20, $21, $22, $23)
                "#,
            )
            .bind(form.id)
            .bind(&form.name)
            .bind(form.form_type.as_str())
            .bind(form.status.as_str())
            .bind(form.company_id)
            .bind(form.picking_id)
            .bind(form.picking_type_id)
            .bind(form.lot_id)
            .bind(form.product_id)
            .bind(form.partner_id)
            .bind(&form.seller_product_code)
            .bind(form.parent_id)
            .bind(form.check_id)
            .bind(form.last_child)
            .bind(Json(&form.reception))
            .bind(Json(&form.release))
            .bind(form.qc.as_ref().map(Json))
            .bind(form.tested.as_ref().map(Json))
            .bind(form.receipt.as_ref().map(Json))
            .bind(form.approval.as_ref().map(Json))
            .bind(form.closure.as_ref().map(Json))
            .bind(form.created_at)
            .bind(form.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(unique_violation("reception_form"))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn save(&self, forms: &[ReceptionForm]) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        for form in forms {
            let result = sqlx::query(
                r#"
                UPDATE reception_forms
                SET status = $2, partner_id = $3, seller_product_code = $4, last_child = $5,
                    reception = $6, release = $7, qc = $8, tested = $9, receipt = $10,
                    approval = $11, closure = $12, updated_at = $13
                WHERE id = $1
                "#,
            )
            .bind(form.id)
            .bind(form.status.as_str())
            .bind(form.partner_id)
            .bind(&form.seller_product_code)
            .bind(form.last_child)
            .bind(Json(&form.reception))
            .bind(Json(&form.release))
            .bind(form.qc.as_ref().map(Json))
            .bind(form.tested.as_ref().map(Json))
            .bind(form.receipt.as_ref().map(Json))
            .bind(form.approval.as_ref().map(Json))
            .bind(form.closure.as_ref().map(Json))
            .bind(form.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(unique_violation("reception_form"))?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!("Reception form {}", form.id)));
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
