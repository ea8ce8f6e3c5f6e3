//! Configurable actions triggered by R&R form statuses

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FormStatus, FormType};

selection! {
    /// What happens when a form reaches the configured status
    pub enum ActionKind {
        /// Only members of the group may edit the form
        Lock => ("lock", "Lock"),
        /// Members of the group are notified
        Notify => ("notify", "Notify"),
    }
}

/// Status of a form an action reacts to
pub const ACTION_FORM_STATES: &[FormStatus] = &[
    FormStatus::Confirmed,
    FormStatus::Sent,
    FormStatus::Approved,
    FormStatus::Closed,
];

/// Lock or notify rule for one form type and status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReceptionFormAction {
    pub id: Uuid,
    pub sequence: i32,
    pub form_type: FormType,
    pub action: ActionKind,
    pub form_state: FormStatus,
    /// Restrict to transfers of this operation type
    pub picking_type_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub company_id: Uuid,
}

impl ReceptionFormAction {
    /// The action applies to a form of this type, status and operation type
    pub fn applies_to(
        &self,
        form_type: FormType,
        status: FormStatus,
        picking_type_id: Uuid,
        company_id: Uuid,
    ) -> bool {
        self.form_type == form_type
            && self.form_state == status
            && self.company_id == company_id
            && self.picking_type_id.map_or(true, |t| t == picking_type_id)
    }

    /// Both actions configure the same combination
    pub fn same_combination(&self, other: &ReceptionFormAction) -> bool {
        self.form_type == other.form_type
            && self.action == other.action
            && self.form_state == other.form_state
            && self.picking_type_id == other.picking_type_id
            && self.group_id == other.group_id
            && self.company_id == other.company_id
    }
}
