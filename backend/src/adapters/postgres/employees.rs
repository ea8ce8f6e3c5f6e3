use async_trait::async_trait;
use uuid::Uuid;

use super::PgStore;
use crate::error::AppResult;
use crate::models::Employee;
use crate::ports::EmployeeRepository;

#[async_trait]
impl EmployeeRepository for PgStore {
    async fn find(&self, id: Uuid) -> AppResult<Option<Employee>> {
        let row = sqlx::query_as::<_, (Uuid, String, Option<String>)>(
            "SELECT id, name, trigram FROM employees WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|(id, name, trigram)| Employee { id, name, trigram }))
    }

    async fn save(&self, employee: &Employee) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO employees (id, name, trigram)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, trigram = EXCLUDED.trigram
            "#,
        )
        .bind(employee.id)
        .bind(&employee.name)
        .bind(&employee.trigram)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}
