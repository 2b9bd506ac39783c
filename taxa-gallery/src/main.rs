//! taxa-gallery - headless taxon image gallery
//!
//! Drives a gallery session from the command line: browse filtered pages,
//! export the rendered markup, try autocomplete, or build the reference
//! mapping used by the local filter.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use taxa_common::config::{load_config, DataFolderResolver, DataSource, TomlConfig};
use taxa_common::events::EventBus;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use taxa_gallery::dataset::MappingBuilder;
use taxa_gallery::services::{image_feed, GbifClient, ImageSource, JsonFileFeed};
use taxa_gallery::taxonomy::MAPPING_FILE;
use taxa_gallery::url_state::UrlFilters;
use taxa_gallery::view::HtmlView;
use taxa_gallery::{build_app, GalleryApp};

#[derive(Parser)]
#[command(name = "taxa-gallery", version, about = "Browse taxon-tagged Commons images")]
struct Cli {
    /// Config file (default: TAXA_GALLERY_CONFIG or the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Folder with gbif_mapping.json and the continent rule files
    #[arg(long, global = true)]
    data_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render gallery pages and print the items
    Browse(FilterArgs),

    /// Render gallery pages and write the markup to a file
    ExportHtml {
        #[arg(long)]
        out: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Print autocomplete suggestions for a query
    Suggest { query: String },

    /// Build gbif_mapping.json from an image list
    BuildMapping {
        /// JSON image list (default: the configured image feed)
        #[arg(long)]
        images: Option<PathBuf>,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// GBIF taxon key, or ALL
    #[arg(long)]
    taxon_key: Option<String>,

    /// Continent name
    #[arg(long)]
    continent: Option<String>,

    /// local or occurrence-api
    #[arg(long)]
    data_source: Option<DataSource>,

    /// Pages to render
    #[arg(long, default_value_t = 1)]
    pages: usize,
}

impl FilterArgs {
    fn url_query(&self, default_source: DataSource) -> String {
        UrlFilters {
            taxon_key: self.taxon_key.clone(),
            continent: self.continent.clone(),
            data_source: self.data_source,
        }
        .to_query(default_source)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    init_tracing(&config)?;
    info!(
        "Starting taxa-gallery v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let data_folder = DataFolderResolver::new(cli.data_folder.clone()).resolve(&config);
    info!("Data folder: {}", data_folder.display());

    let events = EventBus::new(100);
    spawn_event_logger(&events);

    match cli.command {
        Command::Browse(filters) => {
            let app = run_session(&config, &data_folder, events, &filters).await?;
            print_items(app.view());
        }
        Command::ExportHtml { out, filters } => {
            let mut app = run_session(&config, &data_folder, events, &filters).await?;
            let revealed = app.reveal_all_images();
            debug!(revealed, "Images revealed for export");
            write_html(&out, app.view())?;
            info!("Gallery written to {}", out.display());
        }
        Command::Suggest { query } => {
            let mut app = build_app(HtmlView::new(), &config, &data_folder, events)?;
            app.input_changed(&query).await;
            for s in app.view().suggestions() {
                println!("{}\t{}\t{}", s.key, s.rank.as_deref().unwrap_or("-"), s.name);
            }
        }
        Command::BuildMapping { images } => {
            let source: Arc<dyn ImageSource> = match images {
                Some(path) => Arc::new(JsonFileFeed::new(path)),
                None => image_feed::from_config(&config)?,
            };
            let records = source.load_images().await?;
            std::fs::create_dir_all(&data_folder)
                .with_context(|| format!("creating {}", data_folder.display()))?;

            let gbif = Arc::new(GbifClient::new(config.endpoints.gbif_api.clone())?);
            let builder = MappingBuilder::new(gbif, data_folder.join(MAPPING_FILE));
            let summary = builder.build(&records).await?;
            println!(
                "{}: {} entries ({} fetched, {} already present, {} failed lookups)",
                builder.output().display(),
                summary.total,
                summary.fetched,
                summary.skipped,
                summary.failures
            );
        }
    }

    Ok(())
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn spawn_event_logger(events: &EventBus) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => debug!(event = event.event_type(), "{}", json),
                Err(e) => warn!("Unserialisable event: {}", e),
            }
        }
    });
}

async fn run_session(
    config: &TomlConfig,
    data_folder: &Path,
    events: EventBus,
    filters: &FilterArgs,
) -> Result<GalleryApp<HtmlView>> {
    let mut app = build_app(HtmlView::new(), config, data_folder, events)?;
    app.load(&filters.url_query(config.data_source)).await?;

    let extra = filters.pages.saturating_sub(1);
    let added = app.scroll_pages(extra).await;
    if added < extra {
        info!(pages = added + 1, "All results shown");
    }

    for message in app.view().errors() {
        warn!("{}", message);
    }
    Ok(app)
}

fn print_items(view: &HtmlView) {
    if let Some(count) = view.image_count() {
        println!("{} images", count);
    }
    for rendered in view.items() {
        let item = &rendered.item;
        println!(
            "{}\t{}\t{}",
            item.taxon_name,
            item.qid.as_deref().unwrap_or("-"),
            item.image_url
        );
    }
}

fn write_html(out: &Path, view: &HtmlView) -> Result<()> {
    let page = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>taxa-gallery</title></head>\n<body>\n{}</body>\n</html>\n",
        view.to_html()
    );
    std::fs::write(out, page).with_context(|| format!("writing {}", out.display()))?;
    Ok(())
}
