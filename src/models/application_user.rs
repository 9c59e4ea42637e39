//! Dashboard accounts with admin/user permissions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::filter::{EntitySpec, ExportColumn, FilterField};
use crate::models::record::{FieldValue, Record};

pub static APPLICATION_USERS: EntitySpec = EntitySpec {
    name: "application_users",
    table: "application_users",
    columns: &["id", "full_name", "user_name", "permission", "date_assigned"],
    filters: &[
        FilterField::like("search", "user_name"),
        FilterField::equals("permission", "permission"),
        FilterField::date_range("date_filter", "date_assigned"),
    ],
    order_by: &["user_name"],
    page_size: 15,
    export: &[
        ExportColumn {
            column: "full_name",
            header: "Full Name",
        },
        ExportColumn {
            column: "user_name",
            header: "Username",
        },
        ExportColumn {
            column: "permission",
            header: "Permission",
        },
        ExportColumn {
            column: "date_assigned",
            header: "Date Assigned",
        },
    ],
};

/// Stored as lowercase text (`admin` / `user`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Admin,
    #[default]
    User,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Admin => "admin",
            Permission::User => "user",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Permission::Admin),
            "user" => Ok(Permission::User),
            other => Err(format!("unknown permission '{other}'")),
        }
    }
}

/// Full account row, including `password_hash`. Never serialized to the API.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationUser {
    pub id: Uuid,
    pub full_name: String,
    pub user_name: String,
    pub password_hash: String,
    pub permission: String,
    pub date_assigned: DateTime<Utc>,
}

impl ApplicationUser {
    /// Parsed permission; unknown values are treated as the least privileged.
    pub fn permission(&self) -> Permission {
        self.permission.parse().unwrap_or_default()
    }
}

/// Account row as listed and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ApplicationUserSummary {
    pub id: Uuid,
    pub full_name: String,
    pub user_name: String,
    pub permission: String,
    pub date_assigned: DateTime<Utc>,
}

impl From<ApplicationUser> for ApplicationUserSummary {
    fn from(u: ApplicationUser) -> Self {
        Self {
            id: u.id,
            full_name: u.full_name,
            user_name: u.user_name,
            permission: u.permission,
            date_assigned: u.date_assigned,
        }
    }
}

impl Record for ApplicationUserSummary {
    fn field(&self, column: &str) -> Option<FieldValue<'_>> {
        match column {
            "full_name" => Some(FieldValue::Text(&self.full_name)),
            "user_name" => Some(FieldValue::Text(&self.user_name)),
            "permission" => Some(FieldValue::Text(&self.permission)),
            "date_assigned" => Some(FieldValue::Timestamp(self.date_assigned)),
            _ => None,
        }
    }
}

/// Names are stored trimmed, so whitespace alone counts as empty.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateApplicationUser {
    #[validate(custom(function = "not_blank", message = "full name is required"))]
    pub full_name: String,
    #[validate(custom(function = "not_blank", message = "username is required"))]
    pub user_name: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[serde(default)]
    pub permission: Permission,
}

/// Self-registration; the permission is decided by the server.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterAccount {
    #[validate(custom(function = "not_blank", message = "full name is required"))]
    pub full_name: String,
    #[validate(custom(function = "not_blank", message = "username is required"))]
    pub user_name: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateApplicationUser {
    #[validate(custom(function = "not_blank", message = "full name is required"))]
    pub full_name: String,
    pub permission: Permission,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfile {
    #[validate(custom(function = "not_blank", message = "full name is required"))]
    pub full_name: String,
    #[validate(custom(function = "not_blank", message = "username is required"))]
    pub user_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePassword {
    #[validate(length(min = 1, message = "current password is required"))]
    pub current_password: String,
    #[validate(length(min = 1, message = "new password is required"))]
    pub new_password: String,
    #[validate(must_match(other = "new_password", message = "new passwords do not match"))]
    pub confirm_new_password: String,
}
