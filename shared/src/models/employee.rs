//! Employee model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An employee signing forms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    /// Initials printed next to signatures
    pub trigram: Option<String>,
}
