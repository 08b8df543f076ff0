use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod controller;
mod detail;
mod display;
mod form;
mod query;
mod tui;
mod upload;

#[cfg(test)]
mod tests;

use api::{ApiClient, GalleryApi};
use config::Config;
use controller::{Completion, GalleryController, GalleryView};
use detail::DetailView;
use form::FormField;
use query::{FilterCriteria, Featured, ListQuery, SortBy, SortOrder};
use upload::{SelectedFile, UploadForm};

#[derive(Parser)]
#[command(name = "gallery")]
#[command(about = "Image gallery client", long_about = None)]
struct Cli {
    /// Backend host, overrides config file and GALLERY_BACKEND_URL
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the gallery interactively
    Browse,
    /// List one page of images
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Page size (defaults to config page_limit)
        #[arg(long)]
        limit: Option<u32>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show one image
    Show { id: String },
    /// Edit an image's metadata
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        featured: Option<bool>,
    },
    /// Delete an image
    Delete {
        id: String,
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Upload a new image
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        category: String,
        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
        #[arg(long)]
        featured: bool,
    },
    /// List known categories
    Categories,
    /// List known tags
    Tags,
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set the backend host
    SetUrl { url: String },
    /// Set the listing page size
    SetLimit { limit: u32 },
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    tags: String,
    /// true, false or all
    #[arg(long, default_value = "")]
    featured: Featured,
    #[arg(long, default_value = "")]
    search: String,
    /// createdAt, title or fileSize
    #[arg(long, default_value = "createdAt")]
    sort_by: SortBy,
    /// asc or desc
    #[arg(long, default_value = "desc")]
    sort_order: SortOrder,
}

impl From<FilterArgs> for FilterCriteria {
    fn from(args: FilterArgs) -> Self {
        FilterCriteria {
            category: args.category,
            tags: args.tags,
            featured: args.featured,
            search: args.search,
            sort_by: args.sort_by,
            sort_order: args.sort_order,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(url) = &cli.backend_url {
        config.set_api_base_url(url);
    }

    // The browser owns the terminal; logging would draw over it.
    if matches!(cli.command, None | Some(Commands::Browse)) {
        return tui::run_browser(config).await;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gallery=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Some(Commands::Browse) | None => unreachable!(),
        Some(Commands::List {
            page,
            limit,
            filters,
        }) => {
            list(&config, page, limit, filters.into()).await?;
        }
        Some(Commands::Show { id }) => {
            show(&config, &id).await?;
        }
        Some(Commands::Edit {
            id,
            title,
            description,
            category,
            tags,
            featured,
        }) => {
            let mut edits = Vec::new();
            edits.extend(title.map(FormField::Title));
            edits.extend(description.map(FormField::Description));
            edits.extend(category.map(FormField::Category));
            edits.extend(tags.map(FormField::Tags));
            edits.extend(featured.map(FormField::Featured));
            edit(&config, &id, edits).await?;
        }
        Some(Commands::Delete { id, yes }) => {
            delete(&config, &id, yes).await?;
        }
        Some(Commands::Upload {
            file,
            title,
            description,
            category,
            tags,
            featured,
        }) => {
            let fields = vec![
                FormField::Title(title),
                FormField::Description(description),
                FormField::Category(category),
                FormField::Tags(tags),
                FormField::Featured(featured),
            ];
            upload(&config, &file, fields).await?;
        }
        Some(Commands::Categories) => {
            let client = ApiClient::new(&config)?;
            print_options(client.categories().await, "no categories")?;
        }
        Some(Commands::Tags) => {
            let client = ApiClient::new(&config)?;
            print_options(client.tags().await, "no tags")?;
        }
        Some(Commands::Config { command }) => {
            configure(config, command)?;
        }
    }

    Ok(())
}

async fn list(
    config: &Config,
    page: u32,
    limit: Option<u32>,
    filters: FilterCriteria,
) -> anyhow::Result<()> {
    let client = ApiClient::new(config)?;
    let query = ListQuery {
        page,
        limit: limit.unwrap_or(config.page_limit),
        filters,
    };
    let mut controller = GalleryController::with_query(client, query);

    if controller.fetch().await == Completion::Failed {
        anyhow::bail!(controller.error().unwrap_or("Failed to fetch images").to_string());
    }

    match controller.view() {
        GalleryView::Empty => println!("No images found"),
        GalleryView::Grid { items, pager, .. } => {
            for image in items {
                println!("{}", display::card_line(image));
            }
            if let Some(pager) = pager {
                println!();
                println!(
                    "page {} of {} ({} images)",
                    pager.page,
                    pager.total_pages,
                    controller.pagination().total
                );
                if pager.next_enabled {
                    println!("next: gallery list --page {}", pager.page + 1);
                }
            }
        }
        GalleryView::Spinner | GalleryView::Error { .. } => unreachable!(),
    }
    Ok(())
}

async fn show(config: &Config, id: &str) -> anyhow::Result<()> {
    let client = ApiClient::new(config)?;
    let mut view = DetailView::new(client, id);
    let image = view.load().await?;

    for (label, value) in display::detail_rows(image, config) {
        println!("{:>12}: {}", label, value);
    }
    Ok(())
}

async fn edit(config: &Config, id: &str, edits: Vec<FormField>) -> anyhow::Result<()> {
    if edits.is_empty() {
        anyhow::bail!("nothing to change. pass at least one of --title, --description, --category, --tags, --featured");
    }

    let client = ApiClient::new(config)?;
    let mut view = DetailView::new(client, id);
    view.load().await?;
    view.start_edit();
    for field in edits {
        view.edit(field);
    }
    let image = view.save().await?;

    println!("updated {}", image.summary.id);
    for (label, value) in display::detail_rows(image, config) {
        println!("{:>12}: {}", label, value);
    }
    Ok(())
}

async fn delete(config: &Config, id: &str, yes: bool) -> anyhow::Result<()> {
    let client = ApiClient::new(config)?;
    let mut view = DetailView::new(client, id);
    let title = view.load().await?.summary.title.clone();

    if !yes {
        println!("delete '{}'? this cannot be undone.", title);
        println!("type 'yes' to confirm: ");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if input.trim() != "yes" {
            println!("aborted");
            return Ok(());
        }
    }

    view.delete().await?;
    println!("deleted {}", id);
    Ok(())
}

async fn upload(config: &Config, path: &Path, fields: Vec<FormField>) -> anyhow::Result<()> {
    let client = ApiClient::new(config)?;
    let mut form = UploadForm::new();
    form.select_file(SelectedFile::from_path(path)?)?;
    for field in fields {
        form.edit(field);
    }

    form.load_suggestions(&client).await;
    for hint in form.hints() {
        println!("{}", hint);
    }

    let image = form.submit(&client).await?;
    println!("uploaded {} ({})", image.summary.title, image.summary.id);
    println!("url: {}", config.image_url(&image.summary.image_path));
    Ok(())
}

fn print_options(result: Result<Vec<String>, api::ApiError>, empty: &str) -> anyhow::Result<()> {
    let values = result?;
    if values.is_empty() {
        println!("{}", empty);
    }
    for value in values {
        println!("{}", value);
    }
    Ok(())
}

fn configure(mut config: Config, command: Option<ConfigCommands>) -> anyhow::Result<()> {
    match command {
        None => {
            println!("config: {}", Config::config_path()?.display());
            println!("api: {}", config.gallery_api_base());
            println!("uploads: {}", config.image_url(""));
            println!("page limit: {}", config.page_limit);
            println!("credentials: {}", config.include_credentials);
        }
        Some(ConfigCommands::SetUrl { url }) => {
            config.set_api_base_url(&url);
            config.save()?;
            println!("backend: {}", config.api_base_url);
        }
        Some(ConfigCommands::SetLimit { limit }) => {
            config.page_limit = limit;
            config.validate()?;
            config.save()?;
            println!("page limit: {}", limit);
        }
    }
    Ok(())
}
