//! CLI tool for extracting, searching and bookmarking presentation slides.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use slidemark_core::{
    normalize::safe_file_stem, now_millis, parse_fragment, BookmarkFilter, BookmarkStore,
    CollectionDraft, Error, JsonFileStore, MarkdownExporter, PageContext, SlideIndex,
};
use slidemark_reveal::{HtmlDocument, SlideDocument, SlideExtractor};
use slidemark_search::{build_pool, RankingEngine, SearchOptions};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extract, search and bookmark slides from saved reveal.js / slides.com pages.
#[derive(Parser, Debug)]
#[command(name = "slidemark")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bookmark store file
    #[arg(short, long, global = true, default_value = "slidemark-store.json")]
    store: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract every slide of a saved page
    Extract {
        /// Saved HTML page
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,

        /// Output directory (default: same as input file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print output to stdout instead of writing to file
        #[arg(short, long)]
        print: bool,
    },

    /// Show the slide currently on screen
    Current {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Search the page's slides and saved bookmarks
    Search {
        /// Search query (empty lists the page's first slides)
        #[arg(default_value = "")]
        query: String,

        /// Saved HTML page; without it only bookmarks are searched
        #[arg(long)]
        page: Option<PathBuf>,

        /// Page URL, used to skip this presentation's own bookmarks
        #[arg(short, long, default_value = "")]
        url: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Fuzzy threshold (0 = exact only)
        #[arg(long, default_value_t = 0.3)]
        threshold: f64,
    },

    /// Manage bookmarks
    #[command(subcommand)]
    Bookmark(BookmarkCommand),

    /// Manage collections
    #[command(subcommand)]
    Collection(CollectionCommand),
}

#[derive(Subcommand, Debug)]
enum BookmarkCommand {
    /// Bookmark the current slide of a page
    Save {
        #[command(flatten)]
        page: PageArgs,

        /// Target collection id
        #[arg(short, long, default_value = "default")]
        collection: String,
    },
    /// Remove a bookmark by id
    Remove { bookmark_id: String },
    /// List bookmarks
    List {
        /// Only this collection
        #[arg(short, long)]
        collection: Option<String>,

        /// Substring filter over title, content and presentation title
        #[arg(short, long, default_value = "")]
        query: String,
    },
}

#[derive(Subcommand, Debug)]
enum CollectionCommand {
    /// Create a collection
    Add(CollectionFields),
    /// Rename or recolor a collection
    Update {
        id: String,
        #[command(flatten)]
        fields: CollectionFields,
    },
    /// Delete a collection, moving its bookmarks to General
    Delete { id: String },
    /// List collections
    List,
}

#[derive(ClapArgs, Debug)]
struct PageArgs {
    /// Saved HTML page
    input: PathBuf,

    /// Page URL; its fragment selects the slide position
    #[arg(short, long)]
    url: String,
}

#[derive(ClapArgs, Debug)]
struct CollectionFields {
    name: String,

    /// Display color
    #[arg(long, default_value = "#94a3b8")]
    color: String,

    /// Exclude from quick search
    #[arg(long)]
    hidden: bool,
}

impl From<CollectionFields> for CollectionDraft {
    fn from(fields: CollectionFields) -> Self {
        CollectionDraft {
            name: fields.name,
            color: fields.color,
            show_in_quick_search: !fields.hidden,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Markdown,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Markdown => "md",
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let mut store = BookmarkStore::new(JsonFileStore::open(&args.store));
    let extractor = SlideExtractor::new();

    match args.command {
        Command::Extract {
            input,
            format,
            output,
            print,
        } => {
            let document = load_page(&input)?;
            let data = extractor.slides_data(&document);
            if args.verbose {
                eprintln!("  Found {} slides", data.slides.len());
            }

            let rendered = match format {
                Format::Json => serde_json::to_string_pretty(&data)?,
                Format::Markdown => MarkdownExporter::new().export(&data),
            };

            if print {
                println!("{}", rendered);
            } else {
                let output_path = get_output_path(&input, output.as_ref(), &data.title, format)?;
                write_output(&output_path, &rendered)?;
                if args.verbose {
                    eprintln!("Written to: {}", output_path.display());
                }
            }
        }

        Command::Current { page } => {
            let slide = current_slide(&extractor, &page)?;
            println!("{}", serde_json::to_string_pretty(&slide)?);
        }

        Command::Search {
            query,
            page,
            url,
            limit,
            threshold,
        } => {
            let document = page.as_deref().map(load_page).transpose()?;
            let current_id = PageContext::new(url, "").presentation_id();
            let pool = build_pool(
                document.is_some(),
                || {
                    document
                        .as_ref()
                        .map(|d| extractor.extract_slides(d))
                        .unwrap_or_default()
                },
                &store,
                &current_id,
            );

            let engine = RankingEngine::new().with_options(SearchOptions {
                threshold,
                limit,
                ..SearchOptions::default()
            });
            for hit in engine.search(&pool, &query) {
                println!(
                    "{:>6.2}  [{}] {}  {}  ({})",
                    hit.score,
                    hit.item.slide_label(),
                    hit.item.title(),
                    hit.item.id(),
                    hit.item.presentation_title()
                );
            }
        }

        Command::Bookmark(BookmarkCommand::Save { page, collection }) => {
            let slide = current_slide(&extractor, &page)?;
            let title = load_page(&page.input)?.title();
            let context = PageContext::new(page.url, title);
            let bookmark = store
                .save_bookmark(slide, &context, &collection, now_millis())
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Saved {}", bookmark.bookmark_id);
        }

        Command::Bookmark(BookmarkCommand::Remove { bookmark_id }) => {
            if !store.remove_bookmark(&bookmark_id)? {
                bail!("No bookmark with id '{}'", bookmark_id);
            }
            println!("Removed {}", bookmark_id);
        }

        Command::Bookmark(BookmarkCommand::List { collection, query }) => {
            let filter = BookmarkFilter {
                collection_id: collection,
                query,
            };
            for bookmark in store.filter_bookmarks(&filter)? {
                println!(
                    "{}  {}  [{}]  {}",
                    bookmark.bookmark_id,
                    bookmark.slide.title,
                    bookmark.collection_id,
                    bookmark.presentation_title
                );
            }
        }

        Command::Collection(CollectionCommand::Add(fields)) => {
            let collection = store.create_collection(fields.into(), now_millis())?;
            println!("Created {} ({})", collection.name, collection.id);
        }

        Command::Collection(CollectionCommand::Update { id, fields }) => {
            let collection = store
                .update_collection(&id, fields.into())
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Updated {} ({})", collection.name, collection.id);
        }

        Command::Collection(CollectionCommand::Delete { id }) => {
            let moved = store
                .delete_collection(&id)
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Deleted {}; {} bookmark(s) moved to General", id, moved);
        }

        Command::Collection(CollectionCommand::List) => {
            for collection in store.collections()? {
                let visibility = if collection.show_in_quick_search {
                    ""
                } else {
                    "  (hidden from search)"
                };
                println!(
                    "{}  {}  {}{}",
                    collection.id, collection.name, collection.color, visibility
                );
            }
        }
    }

    Ok(())
}

/// Read and parse a saved HTML page.
fn load_page(path: &Path) -> Result<HtmlDocument> {
    let html = std::fs::read_to_string(path)
        .map_err(|e| Error::PageUnreachable(format!("{}: {}", path.display(), e)))?;
    Ok(HtmlDocument::parse(&html))
}

/// Resolve the current slide of a page at the URL's position.
fn current_slide(extractor: &SlideExtractor, page: &PageArgs) -> Result<SlideIndex> {
    let document = load_page(&page.input)?;
    let fragment = fragment_of(&page.url);
    log::debug!("Resolving current slide at {:?}", parse_fragment(fragment));
    extractor
        .extract_current_slide(&document, fragment)
        .ok_or_else(|| anyhow!("No slide is marked as present in {}", page.input.display()))
}

/// The `#...` part of a URL, or an empty string.
fn fragment_of(url: &str) -> &str {
    url.find('#').map_or("", |i| &url[i..])
}

/// Determine the output path for an exported page.
fn get_output_path(
    input_path: &Path,
    output_dir: Option<&PathBuf>,
    title: &str,
    format: Format,
) -> Result<PathBuf> {
    let output_filename = format!("{}.{}", safe_file_stem(title), format.extension());

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => {
            if let Some(parent) = input_path.parent() {
                parent.join(output_filename)
            } else {
                PathBuf::from(output_filename)
            }
        }
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
