//! PostgreSQL adapters
//!
//! Selection fields are stored as their text keys and parsed back with
//! `FromStr`; grouped form content lives in JSONB columns.

mod actions;
mod employees;
mod forms;
mod inventory;
mod quality;
mod sequences;

use sqlx::PgPool;
use std::sync::Arc;

use crate::error::AppError;
use crate::ports::{Chatter, Ports, ReportRenderer};

/// Repository ports backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
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
}


/// Maps unique constraint violations to a conflict on `resource`
fn unique_violation(resource: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |err| match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => AppError::Conflict {
            resource: resource.to_string(),
            message: db.message().to_string(),
        },
        _ => AppError::DatabaseError(err),
    }
}
