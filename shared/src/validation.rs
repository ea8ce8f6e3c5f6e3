//! Validation utilities for R&R forms and related records

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{
    FormType, QcMeasurements, ReceptionFormAction, ACTION_FORM_STATES,
};

/// Digits used when comparing tested quantities with the received quantity
pub const QUANTITY_PRECISION_DIGITS: u32 = 3;

// ============================================================================
// Form Validations
// ============================================================================

/// A QC result form needs one parent and one quality check; reception forms have neither
pub fn validate_form_links(
    form_type: FormType,
    parent_id: Option<Uuid>,
    check_id: Option<Uuid>,
) -> Result<(), &'static str> {
    match (form_type, parent_id, check_id) {
        (FormType::QcResult, Some(_), Some(_)) => Ok(()),
        (FormType::QcResult, None, _) => Err("A QC result form must reference a parent form"),
        (FormType::QcResult, _, None) => Err("A QC result form must reference a quality check"),
        (_, None, None) => Ok(()),
        _ => Err("Only QC result forms can reference a parent form or a quality check"),
    }
}

/// Quantities on a QC result cannot be negative
pub fn validate_quantities(qc: &QcMeasurements) -> Result<(), &'static str> {
    if qc.qty_tested < Decimal::ZERO {
        return Err("Tested quantity cannot be negative");
    }
    if qc.qty_conform < Decimal::ZERO {
        return Err("Conformed quantity cannot be negative");
    }
    if qc.qty_not_conform < Decimal::ZERO {
        return Err("Not conformed quantity cannot be negative");
    }
    Ok(())
}

/// Tested quantities cover the received quantity
pub fn tested_quantity_reached(total_tested: Decimal, product_qty: Decimal) -> bool {
    total_tested.round_dp(QUANTITY_PRECISION_DIGITS)
        >= product_qty.round_dp(QUANTITY_PRECISION_DIGITS)
}

// ============================================================================
// Configuration Validations
// ============================================================================

/// Form actions react to confirmed, sent, approved or closed forms only
pub fn validate_action_state(action: &ReceptionFormAction) -> Result<(), &'static str> {
    if ACTION_FORM_STATES.contains(&action.form_state) {
        Ok(())
    } else {
        Err("Form actions can only react to confirmed, sent, approved or closed forms")
    }
}

/// No other action may configure the same combination
pub fn ensure_unique_action(
    candidate: &ReceptionFormAction,
    existing: &[ReceptionFormAction],
) -> Result<(), &'static str> {
    if existing
        .iter()
        .any(|a| a.id != candidate.id && a.same_combination(candidate))
    {
        return Err("Action combination must be unique, please try to change one parameter.");
    }
    Ok(())
}

// ============================================================================
// Employee Validations
// ============================================================================

/// Trigram, when set, is 2 or 3 characters long
pub fn validate_trigram(employee_name: &str, trigram: Option<&str>) -> Result<(), String> {
    match trigram {
        Some(t) if !t.is_empty() && (t.chars().count() < 2 || t.chars().count() > 3) => Err(
            format!(
                "Employee's trigram should be 3 letters long (employee: {}, trigram: {}).",
                employee_name, t
            ),
        ),
        _ => Ok(()),
    }
}
