mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "sonatalink", version, about = "SonATA message transport toolkit")]
struct Cli {
    /// Output format (default: table on a terminal, json otherwise).
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "SONATALINK_LOG_LEVEL",
        default_value = "info",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_status() {
        let cli = Cli::try_parse_from([
            "sonatalink",
            "log-status",
            "/tmp/chan.log",
            "--state",
            "running",
            "--center-freq",
            "-1",
            "--count",
            "3",
        ])
        .expect("log-status args should parse");

        match cli.command {
            Command::LogStatus(args) => {
                assert_eq!(args.status.count, 3);
                assert_eq!(args.status.center_freq, -1.0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn send_status_requires_port() {
        let err = Cli::try_parse_from(["sonatalink", "send-status"])
            .expect_err("missing --port should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sonatalink",
            "layout",
            "--check",
            "--format",
            "json",
            "--log-level",
            "off",
        ])
        .expect("layout args should parse");
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.log_level, LogLevel::Off);
    }
}
