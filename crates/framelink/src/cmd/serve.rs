use framelink_net::{Config, Server};
use tracing::info;

use crate::cmd::ServeArgs;
use crate::exit::{io_error, CliError, CliResult, INTERNAL, SUCCESS};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let config = Config {
        address: args.address,
        buf_len: args.buf_len,
        buf_max_len: args.buf_max_len,
    };
    let server = Server::bind(&config).map_err(|err| io_error("bind failed", err))?;

    install_ctrlc_handler()?;

    server.serve().map_err(|err| io_error("serve failed", err))?;
    Ok(SUCCESS)
}

fn install_ctrlc_handler() -> CliResult<()> {
    ctrlc::set_handler(|| {
        info!("interrupt received, shutting down");
        std::process::exit(SUCCESS);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
