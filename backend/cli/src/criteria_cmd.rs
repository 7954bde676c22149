//! CLI Criteria Command

use anyhow::Result;

use skyaudit_core::CriteriaSet;

use crate::terminal_output::{render_table, Column};

pub fn run(set: Option<&str>) -> Result<()> {
    match set {
        Some(name) => {
            let set: CriteriaSet = name.parse()?;
            println!("\n{} ({})\n", set.title(), set.key());
            for criterion in set.criteria() {
                println!("  - {criterion}");
            }
        }
        None => {
            let rows: Vec<Vec<String>> = CriteriaSet::ALL
                .iter()
                .map(|s| {
                    vec![
                        s.key().to_string(),
                        s.title().to_string(),
                        s.criteria().len().to_string(),
                    ]
                })
                .collect();
            let columns = [Column::new("Set"), Column::new("Title"), Column::new("Criteria")];
            println!("\n{}", render_table(&columns, &rows));
        }
    }
    Ok(())
}
