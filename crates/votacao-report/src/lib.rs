//! votacao-report: Exports of the full voting state.
//!
//! JSON mirrors the persisted collections; the spreadsheet flattens them
//! into one summary sheet plus one row per vote and per star.

pub mod json;
pub mod rows;
pub mod xlsx;

pub use json::{generate_json, write_json_export};
pub use xlsx::{generate_xlsx, write_xlsx_export};

/// Download name of the JSON export.
pub const JSON_EXPORT_FILENAME: &str = "dados-votacao.json";

/// Download name of the spreadsheet export.
pub const XLSX_EXPORT_FILENAME: &str = "relatorio-votacao-completo.xlsx";

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
