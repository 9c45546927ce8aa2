mod cli;

use std::fmt::Display;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use fanfetch::core::retry_rate;
use fanfetch::{
    Endpoint, EndpointBuilder, EndpointConfig, JsonParser, Outcome, ReqwestClient, ResponseParser,
    TextParser,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{App, Format, Mode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = App::parse();
    init_tracing(app.verbose);

    let config = app.endpoint_config()?;
    match app.format {
        Format::Text => run(&app, &config, TextParser).await,
        Format::Json => run(&app, &config, JsonParser::<serde_json::Value>::new()).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run<P>(app: &App, config: &EndpointConfig, parser: P) -> anyhow::Result<()>
where
    P: ResponseParser + 'static,
    P::Output: Display,
{
    let endpoint = EndpointBuilder::from_config(config)?
        .parser(parser)
        .build()
        .context("building endpoint")?;
    let ids = app.identifiers()?;
    debug!(
        base_url = %config.base_url,
        method = %config.method,
        identifiers = ids.len(),
        "endpoint ready"
    );

    if let Some(data) = &app.data {
        let id = ids.first().map(String::as_str).unwrap_or_default();
        return send_one(&endpoint, id, data).await;
    }
    if ids.is_empty() {
        anyhow::bail!("no identifiers given");
    }

    let mut results = Vec::new();
    if matches!(app.mode, Mode::Sequential | Mode::Both) {
        results = timed(&endpoint, &ids, false).await;
    }
    if matches!(app.mode, Mode::Concurrent | Mode::Both) {
        results = timed(&endpoint, &ids, true).await;
    }

    println!("== Results ==");
    for result in &results {
        println!("* {result}");
    }
    Ok(())
}

async fn timed<P>(
    endpoint: &Endpoint<P, ReqwestClient>,
    ids: &[String],
    concurrent: bool,
) -> Vec<Outcome<P::Output>>
where
    P: ResponseParser + 'static,
{
    endpoint.reset_retries();
    let mode = if concurrent { "run_concurrent" } else { "run_sequential" };
    println!("== Calling {mode} [{} entries] ==", ids.len());

    let started = Instant::now();
    let results = if concurrent {
        endpoint.run_concurrent(ids).await
    } else {
        endpoint.run_sequential(ids).await
    };
    let retries = endpoint.retries();

    println!("Elapsed: {:?}", started.elapsed());
    println!(
        "Error Rate: {retries} retries, {:.2} percent\n",
        retry_rate(retries, ids.len())
    );
    results
}

async fn send_one<P>(
    endpoint: &Endpoint<P, ReqwestClient>,
    id: &str,
    data: &str,
) -> anyhow::Result<()>
where
    P: ResponseParser + 'static,
    P::Output: Display,
{
    let started = Instant::now();
    let result = endpoint.execute(id, data).await;
    println!("Elapsed: {:?}", started.elapsed());
    println!("Error Rate: {} retries\n", endpoint.retries());

    let value = result?;
    println!("{value}");
    Ok(())
}
