#![allow(dead_code)]

use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Cut-off scores in the shape of the published spreadsheet, `Digit` included.
pub fn scores_frame() -> DataFrame {
    df!(
        "Digit" => &[1i64, 2, 3, 4, 5],
        "Universitat" => &["UB, UAB", "UPC", "UdG/UB", "UAB", "URV"],
        "Ciutat" => &["Barcelona", "Terrassa", "Girona", "Bellaterra", "Tarragona"],
        "Estudi" => &["Medicina", "Enginyeria Informàtica", "Infermeria", "Dret", "Química"],
        "Nota" => &[12.5, 9.0, 7.25, 9.0, 5.0]
    )
    .unwrap()
}

pub fn write_csv(dir: &Path, name: &str, df: &mut DataFrame) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
    path
}

/// Temp dir holding the default scores file; keep the dir alive for the test.
pub fn scores_csv() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_csv(
        dir.path(),
        "NotesDeTall.xlsx - Table 1.csv",
        &mut scores_frame(),
    );
    (dir, path)
}
