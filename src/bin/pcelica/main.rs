use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::error;

use pcelica::RegistryError;

mod cli;
mod util;
mod cmd_status;
mod cmd_list;
mod cmd_add;
mod cmd_edit;
mod cmd_delete;
mod cmd_reserve;
mod cmd_search;
mod cmd_years;
mod cmd_backups;
mod cmd_view_backup;
mod cmd_restore_startup;
mod cmd_import;
mod cmd_export;
mod cmd_close;
mod cmd_metrics;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт: info.
    // Пример: RUST_LOG=debug pcelica --data-dir ./data list
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        error!("{:#}", e);
        // 2: request rejected, nothing applied; 1: everything else
        let rejected = e
            .downcast_ref::<RegistryError>()
            .map(RegistryError::is_validation)
            .unwrap_or(false);
        std::process::exit(if rejected { 2 } else { 1 });
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    let dir = cli.data_dir;
    match cli.cmd {
        cli::Cmd::Status { json } =>
            cmd_status::exec(dir, json),

        cli::Cmd::List { year, json } =>
            cmd_list::exec(dir, year, json),

        cli::Cmd::Add { year, first, last, fields, json } =>
            cmd_add::exec(dir, year, first, last, fields, json),

        cli::Cmd::Edit { id, year, first, last, fields } =>
            cmd_edit::exec(dir, id, year, first, last, fields),

        cli::Cmd::Delete { id, year } =>
            cmd_delete::exec(dir, id, year),

        cli::Cmd::Reserve { year } =>
            cmd_reserve::exec(dir, year),

        cli::Cmd::Search { year, query, json } =>
            cmd_search::exec(dir, year, query, json),

        cli::Cmd::Years { json } =>
            cmd_years::exec(dir, json),

        cli::Cmd::Backups { json, limit } =>
            cmd_backups::exec(dir, json, limit),

        cli::Cmd::ViewBackup { file, year, query, commit, json } =>
            cmd_view_backup::exec(dir, file, year, query, commit, json),

        cli::Cmd::RestoreStartup =>
            cmd_restore_startup::exec(dir),

        cli::Cmd::Import { file, replace } =>
            cmd_import::exec(dir, file, replace),

        cli::Cmd::Export { out } =>
            cmd_export::exec(dir, out),

        cli::Cmd::Close =>
            cmd_close::exec(dir),

        cli::Cmd::Metrics { json } =>
            cmd_metrics::exec(dir, json),
    }
}
