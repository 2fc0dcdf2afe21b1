use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use saildeck::{
    format_size, load_mods, relative_to_root, toggle_folder, toggle_state, CatalogClient,
    ConsoleReporter, InstallConfig, InstallRequest, Installer, IntoInstallCallback,
};

#[derive(Parser, Debug)]
#[command(name = "saildeck")]
#[command(about = "Ship of Harkinian mod manager")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Print per-chunk download progress
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse the GameBanana mod feed
    Browse {
        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Records per page
        #[arg(short = 'n', long, default_value = "15")]
        per_page: u32,

        /// Sort order: new or updated
        #[arg(short, long, default_value = "new")]
        sort: String,
    },

    /// Search mods by name
    Search {
        /// Search term
        term: String,

        #[arg(short, long, default_value = "1")]
        page: u32,

        #[arg(short = 'n', long, default_value = "15")]
        per_page: u32,
    },

    /// List the downloadable files of a mod
    Files {
        /// Mod id as shown by browse/search
        mod_id: u64,
    },

    /// Download and install a mod into the library
    Install {
        /// Mod id as shown by browse/search
        mod_id: u64,

        /// Library root, usually the game's mods directory
        #[arg(short, long)]
        mods_dir: PathBuf,

        /// Pick a specific file id instead of the first file
        #[arg(short, long)]
        file_id: Option<u64>,
    },

    /// Flip one mod file between enabled and disabled
    Toggle {
        /// Path to a .otr/.o2r file or its disabled counterpart
        path: PathBuf,
    },

    /// Enable or disable every mod in a folder at once
    ToggleFolder {
        /// Mod folder inside the library
        path: PathBuf,
    },

    /// List installed mods and their state
    List {
        /// Library root, usually the game's mods directory
        mods_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = InstallConfig::default();

    match args.command {
        Commands::Browse {
            page,
            per_page,
            sort,
        } => {
            let catalog = CatalogClient::new(&config)?;
            let results = catalog.browse(page, per_page, &sort).await?;
            print_records(&results.records);
            println!(
                "page {} of {} mod(s){}",
                page,
                results.total_count,
                if results.has_more { ", more available" } else { "" }
            );
        }

        Commands::Search {
            term,
            page,
            per_page,
        } => {
            let catalog = CatalogClient::new(&config)?;
            let results = catalog.search(&term, page, per_page).await?;
            if results.records.is_empty() {
                println!("no mods matched '{}'", term);
            } else {
                print_records(&results.records);
            }
        }

        Commands::Files { mod_id } => {
            let catalog = CatalogClient::new(&config)?;
            let files = catalog.mod_files(mod_id).await?;
            if files.is_empty() {
                println!("mod {} has no downloadable files", mod_id);
            }
            for file in files {
                let safety = match file.safety_veto() {
                    Some(reason) => format!("  [{}]", reason),
                    None => String::new(),
                };
                println!(
                    "{:>10}  {:<40} {:>10}  {} download(s){}",
                    file.file_id,
                    file.filename,
                    format_size(file.filesize),
                    file.download_count,
                    safety
                );
            }
        }

        Commands::Install {
            mod_id,
            mods_dir,
            file_id,
        } => {
            let catalog = CatalogClient::new(&config)?;
            let record = find_record(&catalog, mod_id).await?;
            let files = catalog.mod_files(mod_id).await?;
            let file = match file_id {
                Some(id) => files
                    .into_iter()
                    .find(|f| f.file_id == id)
                    .with_context(|| format!("mod {} has no file {}", mod_id, id))?,
                None => files
                    .into_iter()
                    .next()
                    .with_context(|| format!("mod {} has no downloadable files", mod_id))?,
            };

            let installer = Installer::new(config)?;
            let request = InstallRequest::new(&record.name, file, mods_dir);
            let callback = ConsoleReporter::new(args.verbose).into_callback();
            let outcome = installer.install(&request, Some(callback)).await;
            if !outcome.success {
                bail!("{}", outcome.message);
            }
        }

        Commands::Toggle { path } => match toggle_state(&path)? {
            Some(new_path) => println!("{} -> {}", path.display(), new_path.display()),
            None => println!("not a mod file, nothing to do: {}", path.display()),
        },

        Commands::ToggleFolder { path } => {
            let changed = toggle_folder(&path)?;
            println!("toggled {} file(s)", changed.len());
        }

        Commands::List { mods_dir } => {
            let mut mods = load_mods(&mods_dir);
            if mods.is_empty() {
                println!("no mods installed under {}", mods_dir.display());
                return Ok(());
            }
            mods.sort_by(|a, b| a.path.cmp(&b.path));
            for entry in mods {
                let state = if entry.enabled { "enabled " } else { "disabled" };
                println!(
                    "{}  {}",
                    state,
                    relative_to_root(&mods_dir, &entry.path).display()
                );
            }
        }
    }

    Ok(())
}

fn print_records(records: &[saildeck::ModRecord]) {
    for record in records {
        println!(
            "{:>10}  {:<45} by {:<20} [{}] {} view(s), {} like(s)",
            record.id, record.name, record.author, record.category, record.view_count,
            record.like_count
        );
    }
}

/// Look the mod up by id so the install folder carries its display name.
/// Search results do not support id lookup, so scan recent feed pages and
/// fall back to a generic name when the mod is older than the scan window.
async fn find_record(catalog: &CatalogClient, mod_id: u64) -> Result<saildeck::ModRecord> {
    for page in 1..=5 {
        let results = catalog.browse(page, 50, "new").await?;
        if let Some(record) = results.records.iter().find(|r| r.id == mod_id) {
            return Ok(record.clone());
        }
        if !results.has_more {
            break;
        }
    }
    Ok(saildeck::ModRecord {
        id: mod_id,
        name: format!("Mod #{}", mod_id),
        author: "Unknown".to_string(),
        image_url: None,
        category: "Unknown".to_string(),
        view_count: 0,
        like_count: 0,
        profile_url: format!("https://gamebanana.com/mods/{}", mod_id),
        date_added: None,
        date_updated: None,
        has_files: true,
    })
}
