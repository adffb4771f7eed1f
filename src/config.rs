use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "sales-forecast")]
#[command(about = "Sales forecasting dashboard for grocery store data", long_about = None)]
pub struct Config {
    /// SQLite database or CSV file with date, store_nbr, family and sales columns
    #[arg(long, env = "SALES_DATA", default_value = "sales.db")]
    pub data: PathBuf,

    /// Table to read when the data source is SQLite
    #[arg(long, env = "SALES_TABLE", default_value = "sales")]
    pub table: String,
}
