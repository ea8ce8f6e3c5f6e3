//! Lock and notify actions configured per form type and status

use serde::Deserialize;
use shared::{ensure_unique_action, validate_action_state};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ActionKind, Actor, FormStatus, FormType, ReceptionFormAction};
use crate::ports::Ports;

/// Input for creating or updating a form action
#[derive(Debug, Clone, Deserialize)]
pub struct FormActionInput {
    #[serde(default = "default_sequence")]
    pub sequence: i32,
    pub form_type: FormType,
    pub action: ActionKind,
    pub form_state: FormStatus,
    pub picking_type_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
}

fn default_sequence() -> i32 {
    10
}

#[derive(Clone)]
pub struct FormActionService {
    ports: Ports,
}

impl FormActionService {
    pub fn new(ports: Ports) -> Self {
        Self { ports }
    }

    /// Actions of the actor's company
    pub async fn list(&self, actor: &Actor) -> AppResult<Vec<ReceptionFormAction>> {
        self.ports.actions.list(actor.company_id).await
    }

    pub async fn get(&self, actor: &Actor, action_id: Uuid) -> AppResult<ReceptionFormAction> {
        self.ports
            .actions
            .find(action_id)
            .await?
            .filter(|a| a.company_id == actor.company_id)
            .ok_or_else(|| AppError::NotFound("Form action".to_string()))
    }

    pub async fn create(
        &self,
        actor: &Actor,
        input: FormActionInput,
    ) -> AppResult<ReceptionFormAction> {
        let action = ReceptionFormAction {
            id: Uuid::new_v4(),
            sequence: input.sequence,
            form_type: input.form_type,
            action: input.action,
            form_state: input.form_state,
            picking_type_id: input.picking_type_id,
            group_id: input.group_id,
            company_id: actor.company_id,
        };
        self.check(&action).await?;
        self.ports.actions.insert(&action).await?;

        tracing::info!(action = %action.action, form_type = %action.form_type, state = %action.form_state, "Form action created");
        Ok(action)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        action_id: Uuid,
        input: FormActionInput,
    ) -> AppResult<ReceptionFormAction> {
        let mut action = self.get(actor, action_id).await?;
        action.sequence = input.sequence;
        action.form_type = input.form_type;
        action.action = input.action;
        action.form_state = input.form_state;
        action.picking_type_id = input.picking_type_id;
        action.group_id = input.group_id;

        self.check(&action).await?;
        self.ports.actions.update(&action).await?;
        Ok(action)
    }

    pub async fn delete(&self, actor: &Actor, action_id: Uuid) -> AppResult<()> {
        let action = self.get(actor, action_id).await?;
        if !self.ports.actions.delete(action.id).await? {
            return Err(AppError::NotFound("Form action".to_string()));
        }
        Ok(())
    }

    async fn check(&self, action: &ReceptionFormAction) -> AppResult<()> {
        validate_action_state(action).map_err(|m| AppError::validation("form_state", m))?;

        let existing = self.ports.actions.list(action.company_id).await?;
        ensure_unique_action(action, &existing).map_err(|message| AppError::Conflict {
            resource: "reception_form_action".to_string(),
            message: message.to_string(),
        })
    }
}
