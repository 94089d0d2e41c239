//! Spreadsheet export.

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use votacao_core::repository::Repository;

use crate::rows::{star_rows, summary_rows, vote_rows};

pub const SUMMARY_SHEET: &str = "ResumoTopicos";
pub const VOTES_SHEET: &str = "VotosDetalhados";
pub const STARS_SHEET: &str = "EstrelasDetalhadas";

const SUMMARY_HEADERS: [&str; 7] = [
    "Turma",
    "TopicoId",
    "Topico",
    "Apresentador",
    "MediaNotas",
    "QtdeVotos",
    "TotalEstrelas",
];
const VOTE_HEADERS: [&str; 7] = [
    "Turma",
    "TopicoId",
    "Topico",
    "Apresentador",
    "VotanteCodigo",
    "VotanteNome",
    "Nota",
];
const STAR_HEADERS: [&str; 6] = [
    "Turma",
    "TopicoId",
    "Topico",
    "Apresentador",
    "VotanteCodigo",
    "VotanteNome",
];

fn write_headers(sheet: &mut Worksheet, headers: &[&str], bold: &Format) -> Result<(), XlsxError> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, bold)?;
    }
    Ok(())
}

fn write_strings(sheet: &mut Worksheet, row: u32, cells: &[&str]) -> Result<(), XlsxError> {
    for (col, cell) in cells.iter().enumerate() {
        sheet.write_string(row, col as u16, *cell)?;
    }
    Ok(())
}

fn build_workbook(repo: &Repository) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SUMMARY_SHEET)?;
    write_headers(sheet, &SUMMARY_HEADERS, &bold)?;
    for (i, r) in summary_rows(repo).iter().enumerate() {
        let row = i as u32 + 1;
        write_strings(
            sheet,
            row,
            &[
                r.turma.as_str(),
                r.topico_id.as_str(),
                r.topico.as_str(),
                r.apresentador.as_str(),
            ],
        )?;
        sheet.write_number(row, 4, r.media_notas)?;
        sheet.write_number(row, 5, r.qtde_votos as f64)?;
        sheet.write_number(row, 6, r.total_estrelas as f64)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name(VOTES_SHEET)?;
    write_headers(sheet, &VOTE_HEADERS, &bold)?;
    for (i, r) in vote_rows(repo).iter().enumerate() {
        let row = i as u32 + 1;
        write_strings(
            sheet,
            row,
            &[
                r.turma.as_str(),
                r.topico_id.as_str(),
                r.topico.as_str(),
                r.apresentador.as_str(),
                r.votante_codigo.as_str(),
                r.votante_nome.as_str(),
            ],
        )?;
        sheet.write_number(row, 6, r.nota)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name(STARS_SHEET)?;
    write_headers(sheet, &STAR_HEADERS, &bold)?;
    for (i, r) in star_rows(repo).iter().enumerate() {
        write_strings(
            sheet,
            i as u32 + 1,
            &[
                r.turma.as_str(),
                r.topico_id.as_str(),
                r.topico.as_str(),
                r.apresentador.as_str(),
                r.votante_codigo.as_str(),
                r.votante_nome.as_str(),
            ],
        )?;
    }

    Ok(workbook)
}

/// Render the three-sheet workbook into an in-memory `.xlsx` file.
pub fn generate_xlsx(repo: &Repository) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(repo).context("failed to build workbook")?;
    workbook
        .save_to_buffer()
        .context("failed to render workbook")
}

/// Write the spreadsheet export to a file.
pub fn write_xlsx_export(repo: &Repository, path: &Path) -> Result<()> {
    let bytes = generate_xlsx(repo)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
        .with_context(|| format!("failed to write export to {}", path.display()))?;
    Ok(())
}
