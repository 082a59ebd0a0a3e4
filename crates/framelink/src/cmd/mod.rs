use clap::{Args, Subcommand};

use crate::exit::CliResult;

pub mod send;
pub mod serve;
pub mod shell;

/// Default endpoint shared by server and client commands.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:10601";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the framed TCP server.
    Serve(ServeArgs),
    /// Open an interactive command shell against a server.
    Shell(ShellArgs),
    /// Send a single command and print the reply.
    Send(SendArgs),
}

pub fn run(command: Command) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Shell(args) => shell::run(args),
        Command::Send(args) => send::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// TCP listen address.
    #[arg(long, env = "FRAMELINK_ADDRESS", default_value = DEFAULT_ADDRESS)]
    pub address: String,
    /// Initial per-connection receive buffer length in bytes.
    #[arg(long, default_value_t = 16 * 1024)]
    pub buf_len: usize,
    /// Upper bound on per-connection receive buffer growth in bytes.
    #[arg(long, default_value_t = 10 * 1024 * 1024)]
    pub buf_max_len: usize,
}

#[derive(Args, Debug)]
pub struct ShellArgs {
    /// Remote server address.
    #[arg(long, env = "FRAMELINK_ADDRESS", default_value = DEFAULT_ADDRESS)]
    pub address: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Remote server address.
    #[arg(long, env = "FRAMELINK_ADDRESS", default_value = DEFAULT_ADDRESS)]
    pub address: String,
    /// Command name.
    pub cmd: String,
    /// Command parameters.
    pub params: Vec<String>,
    /// Maximum seconds to wait for the reply.
    #[arg(long, default_value_t = 5)]
    pub wait_secs: u64,
}
