use async_trait::async_trait;

use super::PgStore;
use crate::error::{AppError, AppResult};
use crate::ports::SequenceAllocator;

#[async_trait]
impl SequenceAllocator for PgStore {
    async fn next_by_code(&self, code: &str) -> AppResult<String> {
        // Row lock keeps concurrent allocations gap-free
        let row = sqlx::query_as::<_, (String, i32, i64)>(
            r#"
            UPDATE sequences
            SET number_next = number_next + 1
            WHERE code = $1
            RETURNING prefix, padding, number_next - 1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.db)
        .await?;

        let (prefix, padding, number) =
            row.ok_or_else(|| AppError::Configuration(format!("Unknown sequence {}", code)))?;

        Ok(format!(
            "{}{:0width$}",
            prefix,
            number,
            width = padding.max(0) as usize
        ))
    }
}
