//! Integration tests for CLI

use assert_cmd::Command;
use calamine::{open_workbook_auto, Data, Range, Reader};
use predicates::prelude::*;
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("incident-classifier"))
}

fn write_workbook(path: &Path, rows: &[&[&str]]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();
    for (r, cells) in rows.iter().enumerate() {
        for (c, value) in cells.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            if r == 0 {
                sheet.write_string_with_format(r as u32, c as u16, *value, &bold).expect("write header");
            } else {
                sheet.write_string(r as u32, c as u16, *value).expect("write cell");
            }
        }
    }
    workbook.save(path).expect("save workbook");
}

fn incidents(dir: &Path) -> PathBuf {
    let path = dir.join("hechos.xlsx");
    write_workbook(
        &path,
        &[
            &["id_hecho", "calle", "Relato del Hecho"],
            &["H-1", "Mitre", "Robo a mano armada con arma de fuego en comercio"],
            &["H-2", "Belgrano", ""],
            &["H-3", "Sarmiento", "Riña entre varias personas, resultó una persona fallecida"],
        ],
    );
    path
}

fn first_sheet(path: &Path) -> Range<Data> {
    let mut workbook = open_workbook_auto(path).expect("open output");
    let name = workbook.sheet_names()[0].clone();
    workbook.worksheet_range(&name).expect("range")
}

fn cell(range: &Range<Data>, row: u32, col: u32) -> String {
    range.get_value((row, col)).map(|v| v.to_string()).unwrap_or_default()
}

fn column(range: &Range<Data>, label: &str) -> u32 {
    (0..range.width() as u32)
        .find(|c| cell(range, 0, *c) == label)
        .unwrap_or_else(|| panic!("column {label} not found"))
}

#[test]
fn test_cli_version() {
    cli().arg("--version").assert().success().stdout(predicate::str::contains("incident-classifier"));
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Classify free-text incident narratives"))
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("explain"))
        .stdout(predicate::str::contains("vocab"));
}

#[test]
fn test_classify_writes_workbook_log_and_report() {
    let tmp = TempDir::new().expect("tmp");
    let input = incidents(tmp.path());
    let output = tmp.path().join("out").join("clasificado.xlsx");
    let log = tmp.path().join("out").join("log.txt");
    let report = tmp.path().join("out").join("report.json");

    cli()
        .args(["classify", "--no-progress", "-o"])
        .arg(&output)
        .arg("--log")
        .arg(&log)
        .arg("--report")
        .arg(&report)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Classification complete!"))
        .stdout(predicate::str::contains("Relato del Hecho"))
        .stdout(predicate::str::contains("Empty narrative:  1"));

    let range = first_sheet(&output);
    assert_eq!(cell(&range, 0, 0), "id_hecho");
    let offense = column(&range, "CALIFICACIÓN");
    let weapon = column(&range, "ARMAS");
    let street = column(&range, "calle");
    assert_eq!(cell(&range, 1, offense), "ROBO");
    assert_eq!(cell(&range, 1, weapon), "FUEGO");
    assert_eq!(cell(&range, 1, street), "Mitre");
    assert_eq!(cell(&range, 2, offense), "NINGUNO DE INTERÉS");
    assert_eq!(cell(&range, 3, offense), "HOMICIDIO");
    assert_eq!(cell(&range, 3, column(&range, "MODALIDAD")), "EN RIÑA");

    let log = fs::read_to_string(log).expect("log");
    assert!(log.contains("--- ROW 2 (id: H-1) ---"));
    assert!(log.contains("--- ROW 3 (id: H-2) ---"));
    assert!(log.contains("empty narrative, defaults applied"));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(report).expect("report")).expect("json");
    assert_eq!(report["rows"]["total"], 3);
    assert_eq!(report["merge_mode"], "fresh");
    assert_eq!(report["offenses"]["ROBO"], 1);
}

#[test]
fn test_classify_default_output_paths() {
    let tmp = TempDir::new().expect("tmp");
    let input = incidents(tmp.path());

    cli().args(["classify", "--no-progress"]).arg(&input).assert().success();

    assert!(tmp.path().join("hechos_clasificado.xlsx").exists());
    assert!(tmp.path().join("hechos_clasificado_log.txt").exists());
}

#[test]
fn test_classify_into_template_keeps_headers() {
    let tmp = TempDir::new().expect("tmp");
    let input = incidents(tmp.path());
    let template = tmp.path().join("plantilla.xlsx");
    write_workbook(
        &template,
        &[&["id_hecho", "CALIFICACIÓN", "ARMAS", "LUGAR"], &["Número", "Lista", "Lista", "Lista"]],
    );
    let output = tmp.path().join("salida.xlsx");

    cli()
        .args(["classify", "--no-progress", "-t"])
        .arg(&template)
        .arg("-o")
        .arg(&output)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output (template)"))
        .stderr(predicate::str::contains("has no column for JURISDICCIÓN"));

    let range = first_sheet(&output);
    assert_eq!(cell(&range, 0, 1), "CALIFICACIÓN");
    assert_eq!(cell(&range, 1, 1), "Lista");
    assert_eq!(cell(&range, 2, 0), "H-1");
    assert_eq!(cell(&range, 2, 1), "ROBO");
    assert_eq!(cell(&range, 2, 3), "COMERCIO");
    assert_eq!(cell(&range, 4, 1), "HOMICIDIO");
}

#[test]
fn test_classify_with_broken_template_warns_and_succeeds() {
    let tmp = TempDir::new().expect("tmp");
    let input = incidents(tmp.path());
    let template = tmp.path().join("roto.xlsx");
    fs::write(&template, b"not a workbook").expect("write");
    let output = tmp.path().join("salida.xlsx");

    cli()
        .args(["classify", "--no-progress", "-t"])
        .arg(&template)
        .arg("-o")
        .arg(&output)
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("roto.xlsx"))
        .stdout(predicate::str::contains("Output (new workbook)"));

    let range = first_sheet(&output);
    assert_eq!(cell(&range, 0, 0), "id_hecho");
}

#[test]
fn test_classify_numbers_rows_as_shown_in_the_sheet() {
    let tmp = TempDir::new().expect("tmp");
    let input = tmp.path().join("desplazado.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    // Header on sheet row 2, first record on sheet row 3.
    sheet.write_string(1, 0, "id_hecho").expect("header");
    sheet.write_string(1, 1, "relato").expect("header");
    sheet.write_string(2, 0, "H-9").expect("cell");
    sheet.write_string(2, 1, "hurto de celular").expect("cell");
    workbook.save(&input).expect("save workbook");
    let log = tmp.path().join("log.txt");

    cli()
        .args(["classify", "--no-progress", "--sheet-name", "Hechos", "--log"])
        .arg(&log)
        .arg(&input)
        .assert()
        .success();

    let log = fs::read_to_string(log).expect("log");
    assert!(log.contains("--- ROW 3 (id: H-9) ---"));

    let output = open_workbook_auto(tmp.path().join("desplazado_clasificado.xlsx")).expect("open output");
    assert_eq!(output.sheet_names(), vec!["Hechos".to_string()]);
}

#[test]
fn test_classify_fails_without_narrative_column() {
    let tmp = TempDir::new().expect("tmp");
    let input = tmp.path().join("sin_relato.xlsx");
    write_workbook(&input, &[&["id_hecho", "calle"], &["H-1", "Mitre"]]);

    cli()
        .args(["classify", "--no-progress"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no narrative column found"));
    assert!(!tmp.path().join("sin_relato_clasificado.xlsx").exists());
}

#[test]
fn test_classify_honors_narrative_keywords_flag() {
    let tmp = TempDir::new().expect("tmp");
    let input = tmp.path().join("hechos.xlsx");
    write_workbook(&input, &[&["id_hecho", "Descripción"], &["H-1", "hurto de bicicleta sin violencia"]]);

    cli()
        .args(["classify", "--no-progress", "-k", "descripcion"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Narrative column: Descripción"));
}

#[test]
fn test_classify_rejects_invalid_vocabulary_config() {
    let tmp = TempDir::new().expect("tmp");
    let input = incidents(tmp.path());
    fs::write(
        tmp.path().join("incident-classifier.toml"),
        "[vocabulary.ARMA]\nallowed = ['FUEGO']\ndefault = 'NINGUNA'\n",
    )
    .expect("write");

    cli()
        .args(["classify", "--no-progress"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_explain_prints_facets() {
    cli()
        .args(["explain", "Robo a mano armada con arma de fuego en comercio"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ROBO"))
        .stdout(predicate::str::contains("FUEGO"))
        .stdout(predicate::str::contains("COMERCIO"))
        .stdout(predicate::str::contains("CP art. 164/166"));
}

#[test]
fn test_explain_json_for_empty_narrative() {
    let output = cli().args(["explain", "--json", "   "]).output().expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["outcome"], "empty_narrative");
    assert_eq!(value["classification"]["offense"], "NINGUNO DE INTERÉS");
    assert_eq!(value["diagnostics"][0], "empty narrative, defaults applied");
}

#[test]
fn test_vocab_lists_facet_values() {
    cli()
        .args(["vocab", "armas"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ARMAS (key: ARMA"))
        .stdout(predicate::str::contains("FUEGO"))
        .stdout(predicate::str::contains("(default)"));
}

#[test]
fn test_vocab_rejects_unknown_facet() {
    cli()
        .args(["vocab", "color"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown facet 'color'"));
}
