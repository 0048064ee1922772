use clap::Parser;
use passman::cli::commands::{add::AddArgs, edit::EditArgs};
use passman::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => passman::cli::commands::init::execute(&cli),
        Commands::Status => passman::cli::commands::status::execute(&cli),
        Commands::Add {
            ref title,
            ref username,
            ref url,
            ref notes,
            generate,
        } => passman::cli::commands::add::execute(
            &cli,
            AddArgs {
                title,
                username,
                url,
                notes,
                generate,
            },
        ),
        Commands::Edit {
            ref entry,
            ref title,
            ref username,
            ref url,
            ref notes,
            password,
        } => passman::cli::commands::edit::execute(
            &cli,
            entry,
            EditArgs {
                title: title.as_deref(),
                username: username.as_deref(),
                url: url.as_deref(),
                notes: notes.as_deref(),
                password,
            },
        ),
        Commands::Get { ref entry } => passman::cli::commands::get::execute(&cli, entry),
        Commands::List { ref query } => {
            passman::cli::commands::list::execute(&cli, query.as_deref())
        }
        Commands::Delete { ref entry, force } => {
            passman::cli::commands::delete::execute(&cli, entry, force)
        }
        #[cfg(feature = "legacy-sqlite")]
        Commands::Migrate => passman::cli::commands::migrate::execute(&cli),
    };

    if let Err(e) = result {
        passman::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Library events go to stderr, filtered by `PASSMAN_LOG` (default: warn).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("PASSMAN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
