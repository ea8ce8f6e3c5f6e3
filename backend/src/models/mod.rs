//! Domain models for the Reception and Release Management service
//!
//! Re-exports models from the shared crate and adds backend-specific models

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use shared::models::*;

/// The authenticated user performing an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub name: String,
    pub company_id: Uuid,
    pub job_title: Option<String>,
    /// Stored signature image (base64)
    pub signature: Option<String>,
    pub groups: Vec<Uuid>,
}

impl Actor {
    /// Signature stamp of this user at `at`
    pub fn stamp(&self, at: DateTime<Utc>) -> SignatureStamp {
        SignatureStamp {
            user_id: self.user_id,
            user_name: self.name.clone(),
            job_title: self.job_title.clone(),
            signature: self.signature.clone(),
            at,
        }
    }

    pub fn in_group(&self, group_id: Uuid) -> bool {
        self.groups.contains(&group_id)
    }
}
