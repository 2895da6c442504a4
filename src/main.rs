mod auth;
mod categories;
mod cli;
mod db;
mod demo;
mod entry;
mod error;
mod export;
mod filter;
mod fmt;
mod form;
mod ledger;
mod logging;
mod models;
#[cfg(feature = "pdf")]
mod pdf;
mod remote;
mod reports;
mod settings;
mod statement;
mod stats;
mod tui;
mod views;

use std::path::PathBuf;

use clap::{CommandFactory, Parser};

use cli::{Cli, Commands, RemoteCommands, UsersCommands};

fn main() {
    let cli = Cli::parse();

    let settings = settings::load_settings();
    logging::init(&PathBuf::from(&settings.data_dir), cli.command.is_none());

    let result = match cli.command {
        None => cli::dashboard::run(),
        Some(command) => match command {
            Commands::Init {
                data_dir,
                no_sample,
                company,
            } => cli::init::run(data_dir, no_sample, company),
            Commands::Status => cli::status::run(),
            Commands::Add {
                name,
                particular,
                amount,
                kind,
                date,
                description,
            } => cli::entries::add(&name, &particular, &amount, kind, date.as_deref(), description.as_deref()),
            Commands::Edit {
                id,
                name,
                particular,
                amount,
                kind,
                date,
                description,
            } => cli::entries::edit(
                &id,
                cli::entries::EntryChanges {
                    name,
                    particular,
                    amount,
                    kind,
                    date,
                    description,
                },
            ),
            Commands::Delete { id, yes } => cli::entries::delete(&id, yes),
            Commands::List { filters, limit } => cli::entries::list(&filters, limit),
            Commands::Summary { filters } => cli::summary::run(&filters),
            Commands::Categories => cli::categories::run(),
            Commands::Report {
                command,
                pdf,
                output,
            } => cli::report::run(command, pdf, output),
            Commands::Export { filters, output } => cli::export::run(&filters, output),
            Commands::Sync => cli::remote::sync(),
            Commands::Remote { command } => match command {
                RemoteCommands::Set { url, key } => cli::remote::set(&url, &key),
                RemoteCommands::Clear => cli::remote::clear(),
                RemoteCommands::Show => cli::remote::show(),
            },
            Commands::Users {
                command,
                admin,
                password_stdin,
            } => {
                let auth = cli::users::AdminAuth {
                    username: admin,
                    password_stdin,
                };
                match command {
                    UsersCommands::List => cli::users::list(&auth),
                    UsersCommands::Add {
                        username,
                        name,
                        role,
                    } => cli::users::add(&auth, &username, &name, role),
                    UsersCommands::Remove { user } => cli::users::remove(&auth, &user),
                }
            }
            Commands::Schema => {
                print!("{}", remote::SCHEMA_SQL);
                Ok(())
            }
            Commands::Backup { output } => cli::backup::run(output),
            Commands::Completions { shell } => {
                clap_complete::generate(shell, &mut Cli::command(), "cashbook", &mut std::io::stdout());
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        log::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
