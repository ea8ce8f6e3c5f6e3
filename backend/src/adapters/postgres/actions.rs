use async_trait::async_trait;
use uuid::Uuid;

use super::{unique_violation, PgStore};
use crate::error::{AppError, AppResult};
use crate::models::ReceptionFormAction;
use crate::ports::FormActionRepository;

#[derive(Debug, sqlx::FromRow)]
struct ActionRow {
    id: Uuid,
    sequence: i32,
    form_type: String,
    action: String,
    form_state: String,
    picking_type_id: Option<Uuid>,
    group_id: Option<Uuid>,
    company_id: Uuid,
}

impl TryFrom<ActionRow> for ReceptionFormAction {
    type Error = AppError;

    fn try_from(row: ActionRow) -> Result<Self, Self::Error> {
        Ok(ReceptionFormAction {
            id: row.id,
            sequence: row.sequence,
            form_type: row.form_type.parse()?,
            action: row.action.parse()?,
            form_state: row.form_state.parse()?,
            picking_type_id: row.picking_type_id,
            group_id: row.group_id,
            company_id: row.company_id,
        })
    }
}

#[async_trait]
impl FormActionRepository for PgStore {
    async fn list(&self, company_id: Uuid) -> AppResult<Vec<ReceptionFormAction>> {
        let rows = sqlx::query_as::<_, ActionRow>(
            r#"
            SELECT id, sequence, form_type, action, form_state, picking_type_id, group_id, company_id
            FROM reception_form_actions
            WHERE company_id = $1
            ORDER BY sequence, id
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ReceptionFormAction::try_from).collect()
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<ReceptionFormAction>> {
        let row = sqlx::query_as::<_, ActionRow>(
            r#"
            SELECT id, sequence, form_type, action, form_state, picking_type_id, group_id, company_id
            FROM reception_form_actions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(ReceptionFormAction::try_from).transpose()
    }

    async fn insert(&self, action: &ReceptionFormAction) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reception_form_actions
                (id, sequence, form_type, action, form_state, picking_type_id, group_id, company_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(action.id)
        .bind(action.sequence)
        .bind(action.form_type.as_str())
        .bind(action.action.as_str())
        .bind(action.form_state.as_str())
        .bind(action.picking_type_id)
        .bind(action.group_id)
        .bind(action.company_id)
        .execute(&self.db)
        .await
        .map_err(unique_violation("reception_form_action"))?;

        Ok(())
    }

    async fn update(&self, action: &ReceptionFormAction) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE reception_form_actions
            SET sequence = $2, form_type = $3, action = $4, form_state = $5,
                picking_type_id = $6, group_id = $7
            WHERE id = $1
            "#,
        )
        .bind(action.id)
        .bind(action.sequence)
        .bind(action.form_type.as_str())
        .bind(action.action.as_str())
        .bind(action.form_state.as_str())
        .bind(action.picking_type_id)
        .bind(action.group_id)
        .execute(&self.db)
        .await
        .map_err(unique_violation("reception_form_action"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Form action".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM reception_form_actions WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
