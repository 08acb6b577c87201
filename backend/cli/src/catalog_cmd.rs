//! `aoiguard catalog`: inspect the loaded reference catalog.

use anyhow::{bail, Result};
use clap::Subcommand;

use crate::runtime::Runtime;
use crate::terminal_output::{dim, render_table, Column};

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List every part number in catalog order
    List,
    /// Show the reference markings for one part
    Show {
        /// Exact part number, e.g. ATMEGA328P
        part: String,
    },
}

pub fn run(cmd: CatalogCommands, runtime: &Runtime) -> Result<()> {
    let catalog = runtime.verifier.catalog();
    match cmd {
        CatalogCommands::List => {
            let rows: Vec<Vec<String>> = catalog
                .iter()
                .map(|r| {
                    vec![
                        r.part_number.clone(),
                        r.manufacturer.clone(),
                        r.expected_marking_lines().join(" / "),
                        r.valid_countries.join(", "),
                    ]
                })
                .collect();
            let columns = [
                Column::left("Part"),
                Column::left("Manufacturer"),
                Column::left("Expected markings").max_width(40),
                Column::left("Valid origins"),
            ];
            print!("{}", render_table(&columns, &rows));
            println!("{}", dim(&format!("{} parts", catalog.len())));
        }
        CatalogCommands::Show { part } => {
            let Some(record) = catalog.lookup(part.trim()) else {
                bail!("Part number not in catalog: {part}");
            };
            println!("{} ({})", record.part_number, record.manufacturer);
            println!();
            let rows: Vec<Vec<String>> = record
                .expected_markings
                .iter()
                .map(|m| vec![format!("{:?}", m.role), m.value.clone()])
                .collect();
            print!("{}", render_table(&[Column::left("Role"), Column::left("Marking")], &rows));
            println!();
            println!("Valid origins: {}", record.valid_countries.join(", "));
            if !record.datasheet_url.is_empty() {
                println!("Datasheet:     {}", record.datasheet_url);
            }
            if !record.notes.is_empty() {
                println!("{}", dim(&record.notes));
            }
        }
    }
    Ok(())
}
