//! Users imported from the Xpert system.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::filter::{EntitySpec, ExportColumn, FilterField};
use crate::models::record::{self, FieldValue, Record};

pub static XPERT_USERS: EntitySpec = EntitySpec {
    name: "users",
    table: "xpert_users",
    columns: &["username", "description", "menu"],
    filters: &[
        FilterField::like("search", "username"),
        FilterField::equals("menu", "menu"),
    ],
    order_by: &["username"],
    page_size: 15,
    export: &[
        ExportColumn {
            column: "username",
            header: "Username",
        },
        ExportColumn {
            column: "description",
            header: "Description",
        },
        ExportColumn {
            column: "menu",
            header: "Menu",
        },
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct XpertUser {
    pub username: String,
    pub description: Option<String>,
    pub menu: Option<String>,
}

impl Record for XpertUser {
    fn field(&self, column: &str) -> Option<FieldValue<'_>> {
        match column {
            "username" => Some(FieldValue::Text(&self.username)),
            "description" => record::text(&self.description),
            "menu" => record::text(&self.menu),
            _ => None,
        }
    }
}
