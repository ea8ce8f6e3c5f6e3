//! Host platform services: sequences, report rendering and the chatter

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;

/// Sequence code of R&R form references
pub const FORM_SEQUENCE: &str = "reception_form";
/// Sequence code of product internal references
pub const PRODUCT_CODE_SEQUENCE: &str = "product_default_code";
/// Report printing an R&R form
pub const FORM_REPORT: &str = "reception_and_release_form";

/// Kind of record a chatter entry is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordModel {
    ReceptionForm,
    Picking,
    Lot,
    QualityCheck,
    QualityPoint,
}

impl RecordModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordModel::ReceptionForm => "reception_form",
            RecordModel::Picking => "picking",
            RecordModel::Lot => "lot",
            RecordModel::QualityCheck => "quality_check",
            RecordModel::QualityPoint => "quality_point",
        }
    }
}

/// Reference to a record on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    pub model: RecordModel,
    pub id: Uuid,
}

impl RecordRef {
    pub fn form(id: Uuid) -> Self {
        Self {
            model: RecordModel::ReceptionForm,
            id,
        }
    }

    pub fn picking(id: Uuid) -> Self {
        Self {
            model: RecordModel::Picking,
            id,
        }
    }

    pub fn quality_point(id: Uuid) -> Self {
        Self {
            model: RecordModel::QualityPoint,
            id,
        }
    }
}

/// Binary file posted with a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub mimetype: String,
    /// Base64 content
    pub datas: String,
}

/// Message posted on a record's chatter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatterMessage {
    pub subject: Option<String>,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl ChatterMessage {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            subject: None,
            body: body.into(),
            attachments: Vec::new(),
        }
    }
}

/// To-do scheduled on a record for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub summary: String,
    pub note: String,
    pub deadline: NaiveDate,
    pub user_id: Uuid,
}

/// Allocates human readable references
#[async_trait]
pub trait SequenceAllocator: Send + Sync {
    async fn next_by_code(&self, code: &str) -> AppResult<String>;
}

/// Renders records to PDF
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    async fn render_pdf(&self, report: &str, record: RecordRef) -> AppResult<Vec<u8>>;
}

/// Messaging, activities and notifications
#[async_trait]
pub trait Chatter: Send + Sync {
    async fn post_message(&self, target: RecordRef, message: ChatterMessage) -> AppResult<()>;

    async fn schedule_activity(&self, target: RecordRef, activity: Activity) -> AppResult<()>;

    /// Notify the followers of a record
    async fn notify_followers(&self, target: RecordRef, subject: &str, body: &str)
        -> AppResult<()>;

    /// Notify every member of an access group
    async fn notify_group(&self, group_id: Uuid, subject: &str, body: &str) -> AppResult<()>;
}
