//! Dataset explorer listing

use sqlab_schema::SampleDataset;
use std::fmt::Write as _;

/// Human-readable listing of datasets, tables and columns
pub(crate) fn render_datasets(datasets: &[SampleDataset]) -> String {
    let mut out = String::new();
    for dataset in datasets {
        let _ = writeln!(
            out,
            "{} [{}] ({})",
            dataset.name, dataset.difficulty, dataset.id
        );
        let _ = writeln!(out, "  {}", dataset.description);
        for table in dataset.tables {
            let _ = writeln!(
                out,
                "  - {} ({} rows): {}",
                table.name,
                table.row_count(),
                table.column_names().join(", ")
            );
        }
        out.push('\n');
    }
    out
}

/// Names of every table in registry order
pub(crate) fn table_names(datasets: &[SampleDataset]) -> Vec<&'static str> {
    datasets
        .iter()
        .flat_map(|d| d.tables.iter().map(|t| t.name))
        .collect()
}
