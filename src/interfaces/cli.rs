use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::application::NarrativeTemplate;

#[derive(Parser, Debug)]
#[command(name = "sar-assistant")]
#[command(about = "SAR investigation assistant: analyze a transaction spreadsheet and export a report", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to ./sar-assistant.toml when present)
    #[arg(long, global = true, env = "SAR_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Investigate a CSV/XLSX/XLS file and print the SAR narrative and red flags
    Investigate {
        /// Input file; the extension selects the parser
        file: PathBuf,

        /// Write the report CSV here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Skip the simulated investigation delay
        #[arg(long)]
        no_delay: bool,

        /// Narrative template (elder_exploitation, elder_exploitation_high_risk, cash_structuring)
        #[arg(long)]
        template: Option<NarrativeTemplate>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_investigate() {
        let cli = Cli::parse_from([
            "sar-assistant",
            "investigate",
            "tx.xlsx",
            "--output",
            "out.csv",
            "--no-delay",
            "--template",
            "cash_structuring",
        ]);

        match cli.command {
            Commands::Investigate {
                file,
                output,
                json,
                no_delay,
                template,
            } => {
                assert_eq!(file, PathBuf::from("tx.xlsx"));
                assert_eq!(output, Some(PathBuf::from("out.csv")));
                assert!(!json);
                assert!(no_delay);
                assert_eq!(template, Some(NarrativeTemplate::CashStructuring));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from(["sar-assistant", "serve", "--port", "8080"]);
        assert!(matches!(
            cli.command,
            Commands::Serve {
                host: None,
                port: Some(8080)
            }
        ));
    }
}
