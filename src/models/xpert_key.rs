//! Key assignments imported from the Xpert system.
//!
//! Column names follow the upstream export: `bbbenu` is the user, `bbprog`
//! the programme, `bblfn3` the sequence and `bbpaNN` the key parameters.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::filter::{EntitySpec, ExportColumn, FilterField};
use crate::models::record::{self, FieldValue, Record};

pub static XPERT_KEYS: EntitySpec = EntitySpec {
    name: "keys",
    table: "xpert_keys",
    columns: &[
        "bbbenu", "bbprog", "bblfn3", "bbpa02", "bbpa06", "bbpa07", "bbpa08", "bbpa09", "bbpa10",
        "bbpa11",
    ],
    filters: &[
        FilterField::like("search", "bbbenu"),
        FilterField::equals("sequence", "bblfn3"),
        FilterField::equals("programme", "bbprog"),
    ],
    order_by: &["bbbenu", "bbprog", "bblfn3"],
    page_size: 15,
    export: &[
        ExportColumn {
            column: "bbbenu",
            header: "Username",
        },
        ExportColumn {
            column: "bbprog",
            header: "Programme",
        },
        ExportColumn {
            column: "bblfn3",
            header: "Sequence",
        },
        ExportColumn {
            column: "bbpa02",
            header: "PA02",
        },
        ExportColumn {
            column: "bbpa06",
            header: "PA06",
        },
        ExportColumn {
            column: "bbpa07",
            header: "PA07",
        },
        ExportColumn {
            column: "bbpa08",
            header: "PA08",
        },
        ExportColumn {
            column: "bbpa09",
            header: "PA09",
        },
        ExportColumn {
            column: "bbpa10",
            header: "PA10",
        },
        ExportColumn {
            column: "bbpa11",
            header: "PA11",
        },
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct XpertKey {
    pub bbbenu: String,
    pub bbprog: String,
    pub bblfn3: String,
    pub bbpa02: Option<String>,
    pub bbpa06: Option<String>,
    pub bbpa07: Option<String>,
    pub bbpa08: Option<String>,
    pub bbpa09: Option<String>,
    pub bbpa10: Option<String>,
    pub bbpa11: Option<String>,
}

impl Record for XpertKey {
    fn field(&self, column: &str) -> Option<FieldValue<'_>> {
        match column {
            "bbbenu" => Some(FieldValue::Text(&self.bbbenu)),
            "bbprog" => Some(FieldValue::Text(&self.bbprog)),
            "bblfn3" => Some(FieldValue::Text(&self.bblfn3)),
            "bbpa02" => record::text(&self.bbpa02),
            "bbpa06" => record::text(&self.bbpa06),
            "bbpa07" => record::text(&self.bbpa07),
            "bbpa08" => record::text(&self.bbpa08),
            "bbpa09" => record::text(&self.bbpa09),
            "bbpa10" => record::text(&self.bbpa10),
            "bbpa11" => record::text(&self.bbpa11),
            _ => None,
        }
    }
}

/// Distinct values offered by the keys filter dropdowns.
#[derive(Debug, Clone, Serialize)]
pub struct KeyFilterOptions {
    pub programmes: Vec<String>,
    pub sequences: Vec<String>,
}
