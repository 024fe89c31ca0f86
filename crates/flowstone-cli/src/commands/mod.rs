pub mod single_server;
pub mod workshop;

use anyhow::Result;
use flowstone::Report;

/// Renders a finished report the way the user asked for it.
pub fn emit(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}
