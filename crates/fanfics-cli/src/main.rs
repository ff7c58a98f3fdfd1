use clap::{Parser, Subcommand};
use fanfics_renderer::{
    BlobResolver, BlobUrlTemplate, HandleResolver, Record, RecordFetcher, RecordUri, RenderSession,
    StaticResolver, SubjectView, ToHtml, XrpcResolver,
};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};

mod config;

use config::Config;

#[derive(Parser)]
#[command(version, about = "Fanfics - render leaflet documents and bluesky posts to HTML", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a KDL config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Never touch the network; embedded posts and handles stay unresolved
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a record stored as JSON
    Render {
        /// Path to the record JSON
        file: PathBuf,

        /// AT URI the record lives at (decides the collection and blob owner)
        #[arg(long)]
        uri: String,
    },
    /// Fetch a record and render it
    Fetch {
        /// AT URI of a leaflet document or bluesky post
        uri: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();
    init_tracing();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    let mut session = RenderSession::new(config.render.clone());
    match cli.command {
        Commands::Render { file, uri } => show_file(&mut session, &file, &uri)?,
        Commands::Fetch { uri } => {
            session.open(&uri)?;
        }
    }

    let html = if cli.offline {
        let resolver = StaticResolver::new()
            .with_template(BlobUrlTemplate::new(config.services.blob_url_template.clone()));
        render(&mut session, &resolver).await?
    } else {
        let resolver = XrpcResolver::new(config.services.clone());
        render(&mut session, &resolver).await?
    };
    println!("{html}");

    Ok(())
}

fn show_file(session: &mut RenderSession, file: &Path, uri: &str) -> Result<()> {
    let parsed = RecordUri::parse(uri)?;
    let collection = parsed
        .collection
        .clone()
        .ok_or_else(|| miette::miette!("{uri} does not name a collection"))?;
    let text = std::fs::read_to_string(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .into_diagnostic()
        .wrap_err_with(|| format!("parsing {}", file.display()))?;
    let record = Record::from_value(&collection, value)?;
    session.show(uri, record)?;
    Ok(())
}

#[tracing::instrument(skip_all, fields(generation = session.generation()))]
async fn render<R>(session: &mut RenderSession, resolver: &R) -> Result<String>
where
    R: BlobResolver + RecordFetcher + HandleResolver,
{
    let start = std::time::Instant::now();
    let rendered = session.resolve_all(resolver).await;
    tracing::info!(
        lookups = session.table().len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "rendered"
    );
    if let SubjectView::Failed(reason) = &rendered.view {
        return Err(miette::miette!("could not load record: {reason}"));
    }
    Ok(rendered.view.to_html())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "fanfics",
            "fetch",
            "at://did:plc:abc/app.bsky.feed.post/3k",
            "--offline",
        ])
        .unwrap();
        assert!(cli.offline);
        assert!(matches!(cli.command, Commands::Fetch { .. }));
    }

    #[test]
    fn render_requires_uri() {
        assert!(Cli::try_parse_from(["fanfics", "render", "post.json"]).is_err());
    }
}
