use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use std::path::Path;
use todo_canvas::{
    Config, Profile, Storage,
    ai::AiAssistant,
    cli::{self, Cli, Commands},
    logging::{self, LogTarget},
};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };
    let config = Config::load_with_profile(profile, cli.config.as_deref().map(Path::new))?;

    let command = cli.command.unwrap_or(Commands::Tui);

    // The canvas owns the terminal, so it logs to a file
    let log_target = match command {
        Commands::Tui => LogTarget::File(
            config
                .get_log_path(profile)
                .ok_or_else(|| eyre!("Could not determine log file location"))?,
        ),
        _ => LogTarget::Stderr,
    };
    logging::init(&config.log.level, log_target)?;

    let storage_path = config.get_storage_path();
    let storage = Storage::new(
        storage_path
            .to_str()
            .ok_or_else(|| eyre!("Storage path contains invalid UTF-8"))?,
    )
    .wrap_err_with(|| format!("Failed to open storage at {}", storage_path.display()))?;
    let mut store = storage.into_store();

    match command {
        Commands::Tui => {
            let ai = AiAssistant::from_config(&config.ai);
            let app = todo_canvas::tui::App::new(config, store, ai)?;
            todo_canvas::tui::run_event_loop(app)?;
        }
        Commands::Add { title, priority, category } => {
            cli::handle_add(&mut store, title, priority, category)?;
        }
        Commands::List { search, priority, category, json } => {
            cli::handle_list(&mut store, search, priority, category, json)?;
        }
        Commands::Move { id, x, y } => {
            cli::handle_move(&mut store, id, x, y)?;
        }
        Commands::Edit { id, title, priority, category } => {
            cli::handle_edit(&mut store, id, title, priority, category)?;
        }
        Commands::Delete { ids } => {
            cli::handle_delete(&mut store, ids)?;
        }
        Commands::Bulk { ids, priority, category, delete } => {
            cli::handle_bulk(&mut store, ids, priority, category, delete)?;
        }
        Commands::Template { action } => {
            cli::handle_template(&mut store, action)?;
        }
        Commands::Ai { action } => {
            let ai = AiAssistant::from_config(&config.ai);
            cli::handle_ai(&mut store, &ai, action)?;
        }
    }

    Ok(())
}
