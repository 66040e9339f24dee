//! Command line front end driving the facet view controller.

use std::path::PathBuf;

use anyhow::{Context, bail};
use backend::SearchClient;
use backend::api::search::search_facets;
use clap::{Args, Parser, Subcommand};
use common::data_series::facet_data_series;
use common::facet::{RangeValue, TermValue};
use frontend::FacetView;
use frontend::lifecycle::TracingLifecycle;
use frontend::options::WidgetOptions;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "facetview", about = "Faceted search from the command line")]
struct Cli {
    /// Widget options as a JSON file.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Search endpoint, overrides the options and FACETVIEW_SEARCH_URL.
    #[arg(long)]
    search_url: Option<Url>,

    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Start from a shared link (`?source=...`).
    #[arg(long)]
    shared: Option<Url>,

    /// Start from a state token printed by `token`.
    #[arg(long, conflicts_with = "shared")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a search and print the rendered view.
    Search(SearchArgs),
    /// Print a link that reproduces the search.
    Share {
        #[command(flatten)]
        search: SearchArgs,
        /// Base of the link; the search url when unset.
        #[arg(long)]
        base: Option<Url>,
    },
    /// Print the facet counts as chart data series (JSON).
    Report(SearchArgs),
    /// Print a compact token holding the whole state, facet settings included.
    Token(SearchArgs),
}

#[derive(Args, Debug, Default)]
struct SearchArgs {
    #[arg(short, long)]
    q: Option<String>,

    /// Field the free text searches in.
    #[arg(long)]
    field: Option<String>,

    /// Select a term, `field=value`. Repeatable.
    #[arg(long = "filter")]
    filters: Vec<String>,

    /// Select a range, `field=from..to` with either side optional. Repeatable.
    #[arg(long = "range")]
    ranges: Vec<String>,

    #[arg(long)]
    from: Option<u64>,

    #[arg(long)]
    size: Option<u64>,
}

impl SearchArgs {
    fn apply(&self, view: &mut FacetView) -> anyhow::Result<()> {
        let state = view.state_mut();
        if let Some(q) = &self.q {
            state.set_query_text(q.clone());
        }
        if let Some(field) = &self.field {
            state.set_search_field(field.clone());
        }
        for filter in &self.filters {
            let (field, value) = split_assignment(filter)?;
            state.select_term(field, term_value(value))?;
        }
        for range in &self.ranges {
            let (field, bounds) = split_assignment(range)?;
            state.set_range(field, range_value(bounds)?)?;
        }
        if let Some(size) = self.size {
            state.set_page_size(size);
        }
        if let Some(from) = self.from {
            state.set_from(from);
        }
        Ok(())
    }
}

fn split_assignment(arg: &str) -> anyhow::Result<(&str, &str)> {
    arg.split_once('=').with_context(|| format!("expected field=value, got {arg:?}"))
}

fn term_value(value: &str) -> TermValue {
    if let Ok(i) = value.parse::<i64>() {
        TermValue::Int(i)
    } else if let Ok(x) = value.parse::<f64>() {
        TermValue::Float(x)
    } else {
        TermValue::from(value)
    }
}

fn range_value(bounds: &str) -> anyhow::Result<RangeValue> {
    let Some((from, to)) = bounds.split_once("..") else {
        bail!("expected from..to, got {bounds:?}");
    };
    let bound = |s: &str| (!s.is_empty()).then(|| term_value(s));
    Ok(RangeValue::new(bound(from), bound(to)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut options = match &cli.options {
        Some(path) => WidgetOptions::from_file(path)?,
        None => WidgetOptions::default(),
    };
    if let Some(url) = &cli.search_url {
        options.search_url = Some(url.to_string());
    }
    if let Some(ms) = cli.timeout_ms {
        options.search_timeout_ms = Some(ms);
    }
    // the command decides when to search
    options.initialsearch = false;

    let endpoint = options.endpoint()?;
    tracing::info!("search endpoint {} (timeout {:?})", endpoint.search_url, endpoint.timeout);
    let share_base = options.share_base(&endpoint)?;
    let client = SearchClient::new(endpoint);

    let mut view = FacetView::new(options, client.clone());
    view.subscribe(TracingLifecycle);
    view.init(cli.shared.as_ref()).await?;
    if let Some(token) = &cli.token {
        view.restore_token(token).context("invalid state token")?;
    }

    match cli.command {
        Command::Search(args) => {
            args.apply(&mut view)?;
            view.do_search().await?;
            println!("{}", view.rendered());
        }
        Command::Share { search, base } => {
            search.apply(&mut view)?;
            let base = base.unwrap_or(share_base);
            println!("{}", view.shareable_url(&base)?);
        }
        Command::Report(args) => {
            args.apply(&mut view)?;
            let facets = search_facets(&client, view.state()).await?;
            println!("{}", serde_json::to_string_pretty(&facet_data_series(&facets))?);
        }
        Command::Token(args) => {
            args.apply(&mut view)?;
            println!("{}", view.state_token()?);
        }
    }

    Ok(())
}
