//! R&R form status transition table
//!
//! Every status change of a form goes through [`next_status`]. The table is
//! total: any transition not listed is rejected with a [`TransitionError`].
//!
//! ```text
//! draft ──confirm──▶ confirmed
//! draft/confirmed ──send(notify)──▶ sent      (confirmed without notify)
//! sent ──sign──▶ approved
//! approved ──mark_to_close──▶ to_close        (rc_with_qc only)
//! approved/to_close ──close──▶ closed         (rc_with_qc only)
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{FormStatus, FormType};

/// A named status change of an R&R form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    Confirm,
    Send { notify: bool },
    Sign,
    /// Parent reaction to the signature of its last QC result
    MarkToClose,
    Close,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Confirm => "confirm",
            Transition::Send { .. } => "send",
            Transition::Sign => "sign",
            Transition::MarkToClose => "mark_to_close",
            Transition::Close => "close",
        }
    }

    /// Statuses the transition may start from
    pub fn allowed_from(&self) -> &'static [FormStatus] {
        match self {
            Transition::Confirm => &[FormStatus::Draft],
            Transition::Send { .. } => &[FormStatus::Draft, FormStatus::Confirmed],
            Transition::Sign => &[FormStatus::Sent],
            Transition::MarkToClose => &[FormStatus::Approved],
            Transition::Close => &[FormStatus::Approved, FormStatus::ToClose],
        }
    }

    /// Form types the transition is defined for
    pub fn allowed_types(&self) -> &'static [FormType] {
        match self {
            Transition::MarkToClose | Transition::Close => &[FormType::RcWithQc],
            _ => &[FormType::RcWithoutQc, FormType::RcWithQc, FormType::QcResult],
        }
    }
}

/// Rejected status change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {transition} a form in status {status}")]
    InvalidStatus {
        transition: &'static str,
        status: FormStatus,
    },

    #[error("cannot {transition} a form of type {form_type}")]
    InvalidType {
        transition: &'static str,
        form_type: FormType,
    },
}

/// Status reached by applying `transition` to a form of `form_type` in `status`
pub fn next_status(
    form_type: FormType,
    status: FormStatus,
    transition: Transition,
) -> Result<FormStatus, TransitionError> {
    if !transition.allowed_types().contains(&form_type) {
        return Err(TransitionError::InvalidType {
            transition: transition.name(),
            form_type,
        });
    }
    if !transition.allowed_from().contains(&status) {
        return Err(TransitionError::InvalidStatus {
            transition: transition.name(),
            status,
        });
    }

    Ok(match transition {
        Transition::Confirm => FormStatus::Confirmed,
        Transition::Send { notify: true } => FormStatus::Sent,
        Transition::Send { notify: false } => FormStatus::Confirmed,
        Transition::Sign => FormStatus::Approved,
        Transition::MarkToClose => FormStatus::ToClose,
        Transition::Close => FormStatus::Closed,
    })
}
