//! Console entry point and composition root.
//!
//! # Responsibility
//! - Resolve configuration, start logging, open the store.
//! - Wire repository and service, hand them to the menu loop.
//! - Close the store on the way out.

mod config;
mod console;
mod input;

use config::{CliConfig, StoreLocation};
use console::Console;
use log::{error, info};
use std::io;
use std::process::ExitCode;
use usersvc_core::db::{close_db, open_db, open_db_in_memory};
use usersvc_core::{core_version, init_logging, SqliteUserRepository, UserService};

fn main() -> ExitCode {
    let config = CliConfig::from_env();

    let logging = config
        .log_dir_utf8()
        .and_then(|log_dir| init_logging(&config.log_level, log_dir));
    if let Err(err) = logging {
        eprintln!("File logging disabled: {err}");
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        core_version()
    );

    let opened = match &config.store {
        StoreLocation::Memory => open_db_in_memory(),
        StoreLocation::File(path) => open_db(path),
    };
    let conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("Failed to open user store: {err}");
            return ExitCode::FAILURE;
        }
    };

    let session = match SqliteUserRepository::try_new(&conn) {
        Ok(repo) => {
            let service = UserService::new(repo);
            let stdin = io::stdin();
            Console::new(stdin.lock(), io::stdout())
                .run(&service)
                .map_err(|err| format!("console i/o failed: {err}"))
        }
        Err(err) => Err(format!("user store is not usable: {err}")),
    };

    let closed = close_db(conn);

    if let Err(message) = session {
        error!("event=cli_stop module=cli status=error error={message}");
        eprintln!("{message}");
        return ExitCode::FAILURE;
    }
    if let Err(err) = closed {
        eprintln!("Failed to close user store: {err}");
        return ExitCode::FAILURE;
    }

    info!("event=cli_stop module=cli status=ok");
    ExitCode::SUCCESS
}
