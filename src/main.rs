use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bookmarks::cli::{Cli, Commands};
use bookmarks::config::{http_timeout, Config, Credentials};
use bookmarks::domain::{BookmarkRecord, BookmarkType, NewBookmark};
use bookmarks::errors::{BookmarkError, BookmarkResult};
use bookmarks::http::{HttpTransport, ReqwestTransport};
use bookmarks::services::{BookmarkService, CrawlService};
use bookmarks::sources::SourceRegistry;
use bookmarks::storage::StorageManager;

const PREVIEW_CHARS: usize = 200;
const NAME_COLUMN_WIDTH: usize = 40;

fn main() {
    // Logs go to stderr so they never mix with command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> BookmarkResult<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    let credentials = Credentials::from_env();
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(http_timeout()));
    let storage = StorageManager::new(config, credentials, Arc::clone(&transport));

    match cli.command {
        Commands::Show { collection, id } => cmd_show(&storage, &collection, &id),
        Commands::Add {
            collection,
            url,
            name,
            category,
            note,
            description,
        } => cmd_add(
            &storage,
            transport,
            &collection,
            &url,
            AddOptions {
                name,
                category,
                note,
                description,
            },
        ),
        Commands::Delete {
            collection,
            id,
            yes,
        } => cmd_delete(&storage, &collection, &id, yes),
        Commands::List {
            collection,
            ascending,
            all,
        } => cmd_list(&storage, &collection, ascending, all),
        Commands::Crawl { collection, id } => cmd_crawl(&storage, transport, &collection, &id),
    }
}

struct AddOptions {
    name: Option<String>,
    category: Option<String>,
    note: Option<String>,
    description: Option<String>,
}

/// Print `label` and read one trimmed line; EOF reads as empty
fn prompt(label: &str) -> BookmarkResult<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn cmd_add(
    storage: &StorageManager,
    transport: Arc<dyn HttpTransport>,
    collection: &str,
    url: &str,
    options: AddOptions,
) -> BookmarkResult<()> {
    // Resolve first so config and credential problems surface before any fetch
    let service = BookmarkService::new(storage.resolve(collection)?);
    let registry = SourceRegistry::with_transport(transport);

    println!("Extracting metadata: {}", url);
    // A URL its handler rejects is still saved, with generic metadata
    let extraction = registry.extract_or_generic(url)?;

    if let Some(error) = extraction.error() {
        println!("Warning: metadata lookup failed ({}), saving with defaults", error);
    }
    let metadata = extraction.into_metadata();

    println!("  Title: {}", metadata.title.as_deref().unwrap_or("-"));
    println!("  Type: {}", metadata.bookmark_type);

    let description = match options.description {
        Some(description) => Some(description),
        None => {
            let generated = metadata.description.clone().unwrap_or_default();
            println!("  Description: {}", generated);
            let input = prompt("Press enter to accept, or type a new description: ")?;
            if input.is_empty() {
                Some(generated).filter(|d| !d.is_empty())
            } else {
                Some(input)
            }
        }
    };

    let category = match options.category {
        Some(category) => Some(category),
        None => choose_category(&service.collection().categories)?,
    };

    let record = service.add(NewBookmark {
        url: url.to_string(),
        name: options.name,
        description,
        category,
        note: options.note,
        metadata,
    })?;

    println!("\nBookmark added!");
    println!("  ID: {}", record.id);
    println!("  Name: {}", record.display_name());
    println!("  Type: {}", record.bookmark_type);
    if let Some(category) = &record.category {
        println!("  Category: {}", category);
    }

    Ok(())
}

fn choose_category(categories: &[String]) -> BookmarkResult<Option<String>> {
    if categories.is_empty() {
        return Ok(None);
    }

    println!("\nCategories:");
    for (i, category) in categories.iter().enumerate() {
        println!("  {}. {}", i + 1, category);
    }

    let input = prompt("Enter number (or leave empty for none): ")?;
    if input.is_empty() {
        return Ok(None);
    }

    let index: usize = input
        .parse()
        .map_err(|_| BookmarkError::InvalidInput("Invalid number".to_string()))?;

    if index == 0 || index > categories.len() {
        return Err(BookmarkError::InvalidInput("Number out of range".to_string()));
    }

    Ok(Some(categories[index - 1].clone()))
}

fn cmd_show(storage: &StorageManager, collection: &str, id: &str) -> BookmarkResult<()> {
    let service = BookmarkService::new(storage.resolve(collection)?);
    let bookmark = service.show(id)?;

    println!("{}", bookmark.display_name());
    println!("  ID: {}", bookmark.id);
    println!("  URL: {}", bookmark.url);
    println!("  Type: {}", bookmark.bookmark_type);
    print_field("Title", bookmark.title.as_deref());
    print_field("Description", bookmark.description.as_deref());
    print_field("Category", bookmark.category.as_deref());
    print_field("Note", bookmark.note.as_deref());
    println!("  Created: {}", format_created(&bookmark));
    println!("  Visibility: {}", visibility(&bookmark));

    match bookmark.bookmark_type {
        BookmarkType::Youtube => {
            print_field("Channel", bookmark.author.as_deref());
            print_field("Video ID", bookmark.data_str("video_id"));
        }
        BookmarkType::Reddit => {
            if let Some(subreddit) = bookmark.data_str("subreddit") {
                println!("  Subreddit: r/{}", subreddit);
            }
            print_field("Author", bookmark.author.as_deref());
            if let Some(score) = bookmark.data.get("score") {
                println!("  Score: {}", score);
            }
            if let Some(comments) = bookmark.data.get("num_comments") {
                println!("  Comments: {}", comments);
            }
        }
        BookmarkType::Article | BookmarkType::Generic => {
            print_field("Author", bookmark.author.as_deref());
            print_field("Published", bookmark.data_str("publish_date"));
        }
    }

    if let Some(error) = bookmark.data_str("error") {
        println!("  Extraction error: {}", error);
    }

    if let Some(content) = &bookmark.content {
        println!("\nContent ({}):", content.source);
        match &content.error {
            Some(error) => println!("  Error: {}", error),
            None => println!("  {}", content.preview(PREVIEW_CHARS)),
        }
    }

    Ok(())
}

fn print_field(label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        println!("  {}: {}", label, value);
    }
}

fn format_created(bookmark: &BookmarkRecord) -> String {
    bookmark
        .created_at
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn visibility(bookmark: &BookmarkRecord) -> &'static str {
    if bookmark.is_private {
        "private"
    } else {
        "public"
    }
}

fn cmd_list(
    storage: &StorageManager,
    collection: &str,
    ascending: bool,
    all: bool,
) -> BookmarkResult<()> {
    let service = BookmarkService::new(storage.resolve(collection)?);

    let bookmarks = if all {
        service.list_all(ascending)?
    } else {
        service.list_page(ascending, None)?
    };

    if bookmarks.is_empty() {
        println!("No bookmarks in {}.", collection);
        return Ok(());
    }

    println!(
        "{:<24} {:<width$} {:<16} {}",
        "ID",
        "NAME",
        "CREATED",
        "VISIBILITY",
        width = NAME_COLUMN_WIDTH
    );
    for bookmark in &bookmarks {
        println!(
            "{:<24} {:<width$} {:<16} {}",
            bookmark.id,
            clip(bookmark.display_name(), NAME_COLUMN_WIDTH),
            format_created(bookmark),
            visibility(bookmark),
            width = NAME_COLUMN_WIDTH
        );
    }

    if !all {
        println!("\n{} bookmarks shown (first page; use --all for more)", bookmarks.len());
    } else {
        println!("\n{} bookmarks", bookmarks.len());
    }

    Ok(())
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let head: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", head)
}

fn cmd_delete(storage: &StorageManager, collection: &str, id: &str, yes: bool) -> BookmarkResult<()> {
    let service = BookmarkService::new(storage.resolve(collection)?);

    if !yes {
        let answer = prompt(&format!("Delete bookmark {} from {}? [y/N]: ", id, collection))?;
        if !answer.eq_ignore_ascii_case("y") && !answer.eq_ignore_ascii_case("yes") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    service.delete(id)?;
    println!("Deleted: {}", id);

    Ok(())
}

fn cmd_crawl(
    storage: &StorageManager,
    transport: Arc<dyn HttpTransport>,
    collection: &str,
    id: &str,
) -> BookmarkResult<()> {
    let service = CrawlService::new(storage.resolve(collection)?, transport);

    println!("Crawling {}...", id);
    let outcome = service.crawl(id)?;
    let content = outcome.content();

    println!("Stored content from {}", content.source);
    match &content.error {
        Some(error) => println!("  Error: {}", error),
        None => {
            println!("  Length: {} characters", content.text.chars().count());
            println!("  Preview: {}", content.preview(PREVIEW_CHARS));
        }
    }

    Ok(())
}
