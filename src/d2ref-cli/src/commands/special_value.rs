//! Special value command handler

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use d2ref::SpecialBonusValue;

/// Parse every value, failing on the first invalid one
pub fn handle(values: &[String], format: OutputFormat) -> Result<()> {
    let parsed = SpecialBonusValue::parse_all(values).context("Failed to parse special values")?;

    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = values
                .iter()
                .zip(&parsed)
                .map(|(input, value)| serde_json::json!({ "input": input, "parsed": value }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => {
            println!(
                "{:<12} {:>12}  {:<6} {:<10} {:<7}",
                "input", "value", "equals", "multiplier", "percent"
            );
            for (input, value) in values.iter().zip(&parsed) {
                println!("{}", table_row(input, value));
            }
        }
    }

    Ok(())
}

fn table_row(input: &str, value: &SpecialBonusValue) -> String {
    let flag = |set: bool| if set { "yes" } else { "" };
    format!(
        "{:<12} {:>12}  {:<6} {:<10} {:<7}",
        input,
        value.value,
        flag(value.is_equals),
        flag(value.is_multiplier),
        flag(value.is_percent)
    )
}
