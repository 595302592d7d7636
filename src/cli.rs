use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "otel-probe", version, about = "Observability pipeline probe")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the instrumented demo service (default)
    Serve,

    /// Send steady traffic at the demo service
    Loadgen {
        /// Base URL of the target service (overrides configuration)
        #[arg(short, long)]
        url: Option<String>,

        /// Stop after this many requests instead of running forever
        #[arg(short, long)]
        count: Option<u64>,
    },

    /// Wait for the stack, send sample traffic and verify ingestion
    Verify,

    /// Show version information
    Version,
}

impl Cli {
    /// Get the command to execute, defaulting to Serve if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_serve() {
        let cli = Cli { command: None };

        match cli.get_command() {
            Commands::Serve => {}
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parsing_loadgen_with_overrides() {
        let args = vec![
            "otel-probe",
            "loadgen",
            "--url",
            "http://localhost:9999",
            "--count",
            "25",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.get_command() {
            Commands::Loadgen { url, count } => {
                assert_eq!(url.as_deref(), Some("http://localhost:9999"));
                assert_eq!(count, Some(25));
            }
            _ => panic!("Expected Loadgen command"),
        }
    }

    #[test]
    fn test_cli_parsing_verify() {
        let args = vec!["otel-probe", "verify"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.get_command() {
            Commands::Verify => {}
            _ => panic!("Expected Verify command"),
        }
    }
}
