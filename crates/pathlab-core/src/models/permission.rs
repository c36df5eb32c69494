//! Access-control vocabulary: roles and the employee permission catalog.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PortalError;

/// Coarse actor role. Patients and admins are `user` accounts; staff
/// accounts live in the employee table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Employee,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Employee => "employee",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "employee" => Ok(Role::Employee),
            "admin" => Ok(Role::Admin),
            other => Err(PortalError::Validation {
                message: format!("unknown role: {other}"),
            }),
        }
    }
}

/// Fine-grained employee capability, drawn from a closed catalog.
///
/// The wire form is the snake_case name; anything outside the catalog
/// is rejected with [`PortalError::InvalidPermission`] at the boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewAppointments,
    EditAppointments,
    ViewReports,
    EditReports,
    ManageServices,
    ManageUsers,
    ManageEmployees,
    ViewAuditLogs,
}

impl Permission {
    /// The full grantable catalog, in display order.
    pub const CATALOG: [Permission; 8] = [
        Permission::ViewAppointments,
        Permission::EditAppointments,
        Permission::ViewReports,
        Permission::EditReports,
        Permission::ManageServices,
        Permission::ManageUsers,
        Permission::ManageEmployees,
        Permission::ViewAuditLogs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewAppointments => "view_appointments",
            Permission::EditAppointments => "edit_appointments",
            Permission::ViewReports => "view_reports",
            Permission::EditReports => "edit_reports",
            Permission::ManageServices => "manage_services",
            Permission::ManageUsers => "manage_users",
            Permission::ManageEmployees => "manage_employees",
            Permission::ViewAuditLogs => "view_audit_logs",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::CATALOG
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| PortalError::InvalidPermission { name: s.to_string() })
    }
}
