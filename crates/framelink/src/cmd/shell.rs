use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::time::Duration;

use framelink_net::{connect, ConnConfig, Connection, Request};

use crate::cmd::ShellArgs;
use crate::exit::{io_error, net_error, CliResult, SUCCESS};
use crate::history::BoundedFifo;

/// Slots in the command history ring (one kept empty).
const HISTORY_CAPACITY: usize = 64;

/// How long a remote command waits for its reply.
const RESPONSE_WAIT: Duration = Duration::from_secs(5);

/// One tokenized shell line: first token is the command, the rest parameters.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedCmd {
    pub cmd: String,
    pub params: Vec<String>,
}

/// Tokenize a line on whitespace. `None` for blank input.
pub fn parse(line: &str) -> Option<ParsedCmd> {
    let mut tokens = line.split_whitespace();
    let cmd = tokens.next()?.to_string();
    Some(ParsedCmd {
        cmd,
        params: tokens.map(str::to_string).collect(),
    })
}

/// Routes parsed commands to local handlers or the remote connection, and
/// records every command in the history ring.
pub struct Dispatcher {
    history: BoundedFifo<String>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            history: BoundedFifo::new(HISTORY_CAPACITY),
        }
    }

    pub fn dispatch(&mut self, parsed: &ParsedCmd, conn: &Connection) -> String {
        self.history.push(parsed.cmd.clone());
        match parsed.cmd.as_str() {
            "help" => help_text(parsed.params.first().map(String::as_str)),
            "history" => self.history_text(),
            "ping" => remote_command(conn, "ping", &parsed.params),
            other => format!("unknown command: {other} (try `help`)"),
        }
    }

    fn history_text(&self) -> String {
        let mut out = String::new();
        for (idx, cmd) in self.history.snapshot().iter().enumerate() {
            let _ = writeln!(out, "{idx}    {cmd}");
        }
        out.truncate(out.trim_end().len());
        out
    }
}

/// Send a command envelope and wait for the reply.
fn remote_command(conn: &Connection, cmd: &str, params: &[String]) -> String {
    let request = match Request::new(cmd, params.to_vec()).to_bytes() {
        Ok(bytes) => bytes,
        Err(err) => return format!("request encoding failed: {err}"),
    };
    if let Err(err) = conn.send(request) {
        return format!("send failed: {err}");
    }
    match conn.recv_timeout(RESPONSE_WAIT) {
        Ok(reply) => String::from_utf8_lossy(&reply).into_owned(),
        Err(err) => format!("no response: {err}"),
    }
}

fn help_text(topic: Option<&str>) -> String {
    let entries: &[(&str, &str)] = &[
        ("help", "help [cmd] - describe available commands"),
        ("history", "history - list recently entered commands"),
        ("ping", "ping - probe the remote server"),
        ("quit", "quit - leave the shell"),
    ];
    if let Some(topic) = topic {
        if let Some((_, desc)) = entries.iter().find(|(name, _)| *name == topic) {
            return (*desc).to_string();
        }
    }
    entries
        .iter()
        .map(|(_, desc)| *desc)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn run(args: ShellArgs) -> CliResult<i32> {
    let conn = connect(args.address.as_str(), ConnConfig::default())
        .map_err(|err| net_error("connect failed", err))?;
    let mut dispatcher = Dispatcher::new();

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => return Err(io_error("stdin read failed", err)),
        }
        let Some(parsed) = parse(&line) else {
            continue;
        };
        if matches!(parsed.cmd.as_str(), "quit" | "exit") {
            break;
        }
        println!("{}", dispatcher.dispatch(&parsed, &conn));
    }
    conn.close();
    Ok(SUCCESS)
}
