use std::{
    io::{self, Write},
    path::PathBuf,
    time::Instant,
};

use clap::Args;
use humanize_duration::{Truncate, prelude::DurationExt};
use product_picker::{
    catalog::{CatalogClient, FixtureCatalog, HttpCatalogClient},
    config::{CatalogConfig, PickerConfig},
    picker::{LoadFailure, LoadStatus, PageOutcome, PickerSession, SessionId},
    products::Product,
};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

#[derive(Debug, Args)]
pub(crate) struct SearchArgs {
    /// Search text; empty lists the whole catalog
    #[arg(default_value = "")]
    query: String,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// Search a YAML product fixture instead of the remote catalog
    #[arg(long)]
    fixture: Option<PathBuf>,

    #[command(flatten)]
    catalog: CatalogConfig,

    #[command(flatten)]
    picker: PickerConfig,
}

pub(crate) async fn run(args: SearchArgs) -> Result<(), String> {
    let client: Box<dyn CatalogClient> = match &args.fixture {
        Some(path) => Box::new(
            FixtureCatalog::from_path(path)
                .map_err(|error| format!("failed to load fixture: {error}"))?,
        ),
        None => Box::new(
            HttpCatalogClient::new(&args.catalog)
                .map_err(|error| format!("failed to build catalog client: {error}"))?,
        ),
    };

    let started = Instant::now();
    let mut session = PickerSession::add(SessionId(1), &args.picker);

    session.set_search_text(args.query, started);

    let mut request = session.poll(started);
    let mut loaded = 0;

    while let Some(current) = request.take() {
        let result = current.fetch(client.as_ref()).await;

        if session.apply_page(&current, result) == PageOutcome::Failed {
            if let LoadStatus::Failed(failure) = session.results().status() {
                return Err(describe_failure(failure));
            }
        }

        loaded += 1;

        if loaded < args.pages {
            request = session.load_more();
        }
    }

    let elapsed = started.elapsed();
    let results = session.results();

    let mut out = io::stdout().lock();

    write_results(&mut out, results.products())
        .and_then(|()| {
            writeln!(
                out,
                "{} products from {loaded} page(s) in {}{}",
                results.products().len(),
                elapsed.human(Truncate::Nano),
                if results.has_more() {
                    ", more available"
                } else {
                    ""
                }
            )
        })
        .map_err(|error| format!("failed to write results: {error}"))
}

fn describe_failure(failure: &LoadFailure) -> String {
    if failure.is_credential_error() {
        format!(
            "{}\nset CATALOG_API_KEY (or pass --api-key) to a valid catalog API key",
            failure.message()
        )
    } else {
        format!("failed to load products: {}", failure.message())
    }
}

fn write_results(out: &mut impl Write, products: &[Product]) -> io::Result<()> {
    let mut builder = Builder::default();

    builder.push_record(["Product", "Title", "Variant", "Variant title", "Price"]);

    for product in products {
        if product.variants.is_empty() {
            builder.push_record([
                product.id.to_string(),
                product.title.clone(),
                String::new(),
                String::new(),
                String::new(),
            ]);
        }

        for variant in &product.variants {
            builder.push_record([
                product.id.to_string(),
                product.title.clone(),
                variant.id.to_string(),
                variant.title.clone(),
                variant.price.to_string(),
            ]);
        }
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(4..5), Alignment::right());

    writeln!(out, "{table}")
}
