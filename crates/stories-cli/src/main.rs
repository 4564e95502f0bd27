//! stories CLI
//!
//! Inspect and maintain a local stories storage.

use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use stories_core::{
    Publisher, ShowStoriesOption, SortKey, SortOrder, StoriesStorage, Story,
};

type CliResult<T> = Result<T, Box<dyn Error>>;

// ============================================================================
// CLI Types
// ============================================================================

/// Inspect and maintain a local stories storage
#[derive(Parser, Debug)]
#[command(name = "stories", version, about, long_about = None)]
struct Cli {
    /// Storage root (defaults to $STORIES_DATA_DIR, then ~/.local/share/stories)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still applies otherwise)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List stored stories
    List {
        /// Which stories to list (all, valid, seen, not-seen); defaults to the configured option
        #[arg(long)]
        show: Option<ShowStoriesOption>,

        /// Print stories as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import stories from a JSON file (one story or an array)
    Import {
        file: PathBuf,

        /// Drop every stored story first
        #[arg(long, conflicts_with = "update")]
        replace: bool,

        /// Update stories with matching ids instead of adding copies
        #[arg(long)]
        update: bool,

        /// Lifetime in seconds (defaults to the configured lifetime)
        #[arg(long, allow_negative_numbers = true)]
        lifetime: Option<f64>,
    },

    /// Delete a story by id (an unknown id deletes nothing)
    Delete { id: String },

    /// Mark a story as seen
    Seen {
        id: String,

        /// Mark as not seen instead
        #[arg(long)]
        unseen: bool,
    },

    /// Remove expired stories now
    Purge,

    /// Remove every stored story
    Clear,

    /// Show or change the storage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Change one or more settings
    Set(ConfigSetArgs),
    /// Forget saved settings and use the defaults
    Reset,
}

#[derive(Args, Debug, Default)]
struct ConfigSetArgs {
    /// Default lifetime in seconds for new stories ("inf" for never)
    #[arg(long, allow_negative_numbers = true)]
    lifetime: Option<f64>,

    /// Sort keys in priority order, comma separated (date, seen)
    #[arg(long, value_delimiter = ',')]
    sort: Option<Vec<SortKey>>,

    /// Directions per sort key, comma separated (asc, desc)
    #[arg(long, value_delimiter = ',')]
    order: Option<Vec<SortOrder>>,

    /// Purge expired stories on every read
    #[arg(long)]
    delete_expired: Option<bool>,

    /// Default show option (all, valid, seen, not-seen)
    #[arg(long)]
    show: Option<ShowStoriesOption>,

    /// Warm the image cache when stories are added
    #[arg(long)]
    prefetch_images: Option<bool>,
}

impl ConfigSetArgs {
    fn is_empty(&self) -> bool {
        self.lifetime.is_none()
            && self.sort.is_none()
            && self.order.is_none()
            && self.delete_expired.is_none()
            && self.show.is_none()
            && self.prefetch_images.is_none()
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let stdout = io::stdout();
    if let Err(e) = run(cli, &mut stdout.lock()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn open_storage(root: Option<&Path>) -> CliResult<StoriesStorage> {
    let storage = match root {
        Some(root) => StoriesStorage::open(root),
        None => StoriesStorage::open_default()?,
    };
    storage.subscribe(Arc::new(|| log::debug!("Stories storage changed")));
    Ok(storage)
}

fn run(cli: Cli, out: &mut impl Write) -> CliResult<()> {
    let storage = open_storage(cli.root.as_deref())?;

    match cli.command {
        Commands::List { show, json } => {
            let stories = match show {
                Some(show) => stories_for(&storage, show)?,
                None => storage.get_stories_to_show(None)?,
            };
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&stories)?)?;
            } else {
                for story in &stories {
                    writeln!(out, "{}", format_story(story))?;
                }
            }
        }
        Commands::Import {
            file,
            replace,
            update,
            lifetime,
        } => {
            let stories = read_stories(&file)?;
            let count = stories.len();
            if replace {
                storage.replace(stories, lifetime)?;
            } else if update {
                storage.create_or_update(stories, lifetime)?;
            } else {
                storage.add_all(stories, lifetime)?;
            }
            writeln!(out, "Imported {} stories from {}", count, file.display())?;
        }
        Commands::Delete { id } => {
            let count = storage
                .get_stories_where(|options| options.story.id == id)?
                .len();
            storage.delete_where(|options| options.story.id == id)?;
            writeln!(out, "Deleted {} stories with id {}", count, id)?;
        }
        Commands::Seen { id, unseen } => {
            let story = find_story(&storage, &id)?;
            storage.set_story_seen_state(&story, !unseen)?;
            let state = if unseen { "not seen" } else { "seen" };
            writeln!(out, "Marked {} as {}", id, state)?;
        }
        Commands::Purge => {
            let count = storage.purge_expired()?;
            writeln!(out, "Purged {} expired stories", count)?;
        }
        Commands::Clear => {
            storage.clear()?;
            writeln!(out, "Cleared all stories")?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let configuration = storage.configuration();
                writeln!(out, "{}", serde_json::to_string_pretty(&configuration)?)?;
            }
            ConfigAction::Set(args) => {
                if args.is_empty() {
                    return Err("nothing to set; pass at least one option".into());
                }
                apply_settings(&storage, args);
                let configuration = storage.configuration();
                writeln!(out, "{}", serde_json::to_string_pretty(&configuration)?)?;
            }
            ConfigAction::Reset => {
                storage.clear_configuration();
                writeln!(out, "Configuration reset to defaults")?;
            }
        },
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Stories selected by an explicit show option. Validity uses each record's
/// own lifetime.
fn stories_for(storage: &StoriesStorage, show: ShowStoriesOption) -> CliResult<Vec<Story>> {
    let stories = match show {
        ShowStoriesOption::All => storage.get_stories()?,
        ShowStoriesOption::Valid => storage.get_valid_stories(None)?,
        ShowStoriesOption::Seen => storage.get_seen_stories()?,
        ShowStoriesOption::NotSeen => storage.get_not_seen_stories()?,
    };
    Ok(stories)
}

fn find_story(storage: &StoriesStorage, id: &str) -> CliResult<Story> {
    storage
        .get_stories_where(|options| options.story.id == id)?
        .into_iter()
        .next()
        .ok_or_else(|| format!("no story with id '{}'", id).into())
}

fn read_stories(path: &Path) -> CliResult<Vec<Story>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_stories(&raw).map_err(|e| format!("invalid stories in {}: {}", path.display(), e).into())
}

fn parse_stories(raw: &str) -> Result<Vec<Story>, serde_json::Error> {
    match serde_json::from_str::<Vec<Story>>(raw) {
        Ok(stories) => Ok(stories),
        Err(list_error) => serde_json::from_str::<Story>(raw)
            .map(|story| vec![story])
            .map_err(|_| list_error),
    }
}

fn apply_settings(storage: &StoriesStorage, args: ConfigSetArgs) {
    let configurator = storage.configurator();
    if let Some(lifetime) = args.lifetime {
        configurator.set_stories_lifetime(lifetime);
    }
    if let Some(keys) = args.sort {
        configurator.order_by_keys(keys);
    }
    if let Some(directions) = args.order {
        configurator.order_directions(directions);
    }
    if let Some(should_delete) = args.delete_expired {
        configurator.delete_expired_stories(should_delete);
    }
    if let Some(show) = args.show {
        configurator.show(show);
    }
    if let Some(should_prefetch) = args.prefetch_images {
        configurator.prefetch_images(should_prefetch);
    }
    configurator.reload();
}

fn format_story(story: &Story) -> String {
    let seen = if story.is_seen { "seen" } else { "new" };
    format!(
        "{}\t{}\t{} frames\t{}",
        story.id,
        seen,
        story.frames.len(),
        story.title
    )
}

// ============================================================================
// TESTS
// ============================================================================
