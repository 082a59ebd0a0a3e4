use std::time::Duration;

use framelink_net::{connect, ConnConfig, Request};

use crate::cmd::SendArgs;
use crate::exit::{net_error, CliError, CliResult, DATA_INVALID, SUCCESS};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let config = ConnConfig {
        keepalive_interval: Duration::ZERO,
        ..ConnConfig::default()
    };
    let conn = connect(args.address.as_str(), config)
        .map_err(|err| net_error("connect failed", err))?;

    let request = Request::new(args.cmd, args.params)
        .to_bytes()
        .map_err(|err| CliError::new(DATA_INVALID, format!("request encoding failed: {err}")))?;
    conn.send(request)
        .map_err(|err| net_error("send failed", err))?;

    let reply = conn
        .recv_timeout(Duration::from_secs(args.wait_secs))
        .map_err(|err| net_error("receive failed", err))?;
    println!("{}", String::from_utf8_lossy(&reply));

    conn.close();
    Ok(SUCCESS)
}
