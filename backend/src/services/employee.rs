use serde::Deserialize;
use shared::validate_trigram;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::Employee;
use crate::ports::Ports;

/// Input for creating or updating an employee
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmployeeInput {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
    pub trigram: Option<String>,
}

#[derive(Clone)]
pub struct EmployeeService {
    ports: Ports,
}

impl EmployeeService {
    pub fn new(ports: Ports) -> Self {
        Self { ports }
    }

    pub async fn get(&self, employee_id: Uuid) -> AppResult<Employee> {
        self.ports
            .employees
            .find(employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee".to_string()))
    }

    /// Create or replace an employee
    pub async fn save(&self, employee_id: Uuid, input: EmployeeInput) -> AppResult<Employee> {
        input.validate()?;

        let trigram = input.trigram.filter(|t| !t.is_empty());
        validate_trigram(&input.name, trigram.as_deref())
            .map_err(|message| AppError::validation("trigram", message))?;

        let employee = Employee {
            id: employee_id,
            name: input.name,
            trigram,
        };
        self.ports.employees.save(&employee).await?;
        Ok(employee)
    }
}
