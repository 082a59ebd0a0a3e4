mod cmd;
mod exit;
mod history;
mod logging;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "framelink", version, about = "Framed TCP transport server and client shell")]
struct Cli {
    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_format, cli.log_level);

    match cmd::run(cli.command) {
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
    fn parses_serve_subcommand() {
        let cli = Cli::try_parse_from([
            "framelink",
            "serve",
            "--address",
            "127.0.0.1:10601",
            "--buf-len",
            "1024",
        ])
        .expect("serve args should parse");

        assert!(matches!(cli.command, Command::Serve(_)));
    }

    #[test]
    fn parses_send_subcommand_with_params() {
        let cli = Cli::try_parse_from(["framelink", "send", "ping", "a", "b"])
            .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.cmd, "ping");
                assert_eq!(args.params, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(args.address, cmd::DEFAULT_ADDRESS);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["framelink", "bogus"]).is_err());
    }
}
