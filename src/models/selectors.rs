// src/models/selectors.rs

//! CSS selectors describing the statistics portal markup.

use serde::{Deserialize, Serialize};

/// Where subjects and course rows live in the portal's pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSelectors {
    /// The subject `<select>` control on the portal root page
    #[serde(default = "default_subject_select")]
    pub subject_select: String,

    /// Options within the subject control
    #[serde(default = "default_subject_option")]
    pub subject_option: String,

    /// Separator between subject code and its display name in option text
    #[serde(default = "default_subject_separator")]
    pub subject_separator: String,

    /// The per-subject results table
    #[serde(default = "default_table")]
    pub table: String,

    /// Data rows within the results table
    #[serde(default = "default_row")]
    pub row: String,

    /// Cells within a row
    #[serde(default = "default_cell")]
    pub cell: String,

    /// Attribute on the first cell holding the order key
    #[serde(default = "default_order_attr")]
    pub order_attr: String,

    /// Zero-based index of the enrollment cell
    #[serde(default = "default_enrollment_column")]
    pub enrollment_column: usize,
}

fn default_subject_select() -> String {
    "#subjectCode".to_string()
}

fn default_subject_option() -> String {
    "option".to_string()
}

fn default_subject_separator() -> String {
    " - ".to_string()
}

fn default_table() -> String {
    "#coursesTable".to_string()
}

fn default_row() -> String {
    "tbody tr".to_string()
}

fn default_cell() -> String {
    "td".to_string()
}

fn default_order_attr() -> String {
    "data-order".to_string()
}

fn default_enrollment_column() -> usize {
    7
}

impl Default for PortalSelectors {
    fn default() -> Self {
        Self {
            subject_select: default_subject_select(),
            subject_option: default_subject_option(),
            subject_separator: default_subject_separator(),
            table: default_table(),
            row: default_row(),
            cell: default_cell(),
            order_attr: default_order_attr(),
            enrollment_column: default_enrollment_column(),
        }
    }
}
