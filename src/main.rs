mod cli;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cli::{Cli, Command};
use cloud_search::{CompileError, SavedSearches, compile, parse_query};
use search_catalog::{
    Direction, MemoryCatalog, OrderKey, ViewerId, read_catalog_from_file, write_catalog_to_file,
};
use std::{
    io::{BufRead, Write},
    path::Path,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();
    let catalog = load_catalog(&cli)?;
    let viewer = ViewerId(cli.viewer);
    let order = OrderKey::from_name(&cli.order)
        .ok_or_else(|| anyhow!("unknown order key {:?}", cli.order))?;
    let direction = if cli.descending {
        Direction::Descending
    } else {
        Direction::Ascending
    };
    let search = Search {
        catalog: &catalog,
        viewer,
        order,
        direction,
        per_page: cli.per_page,
    };

    if let Some(query) = &cli.query {
        return search.run(query, 0).map_err(Into::into);
    }

    let mut saved = match &cli.saved {
        Some(path) => SavedSearches::load(path)?,
        None => SavedSearches::new(),
    };

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        stdout.flush().context("Failed to flush stdout")?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match Command::parse(line) {
            Command::Bye => break,
            Command::Query(query) => report(search.run(query, 0)),
            Command::Page { page, query } => report(search.run(query, page)),
            Command::Ast(query) => match parse_query(query) {
                Ok(root) => println!(
                    "{}",
                    serde_json::to_string_pretty(&root).context("Failed to encode AST")?
                ),
                Err(e) => eprintln!("Failed to parse: {e}"),
            },
            Command::Save { name, query } => match saved.save(viewer, name, query) {
                Ok(previous) => {
                    match previous {
                        Some(previous) => println!("Replaced {name:?} (was {previous})"),
                        None => println!("Saved {name:?}"),
                    }
                    persist(&saved, cli.saved.as_deref());
                }
                Err(e) => eprintln!("Failed to save: {e}"),
            },
            Command::Run(name) => match saved.get(viewer, name) {
                Some(query) => report(search.run(query, 0)),
                None => eprintln!("No saved search named {name:?}"),
            },
            Command::Saved => {
                for entry in saved.list(viewer) {
                    println!("{}: {}", entry.name, entry.query);
                }
            }
            Command::Forget(name) => match saved.remove(viewer, name) {
                Some(_) => {
                    println!("Forgot {name:?}");
                    persist(&saved, cli.saved.as_deref());
                }
                None => eprintln!("No saved search named {name:?}"),
            },
            Command::Invalid(message) => eprintln!("{message}"),
        }
    }

    Ok(())
}

/// Writes the store after every change so a failing path shows up at once.
fn persist(saved: &SavedSearches, path: Option<&Path>) {
    if let Some(path) = path {
        if let Err(e) = saved.store(path) {
            eprintln!("Failed to write saved searches: {e:?}");
        }
    }
}

fn load_catalog(cli: &Cli) -> Result<MemoryCatalog> {
    if let Some(cache) = &cli.cache {
        if cache.exists() {
            match read_catalog_from_file(cache) {
                Ok(catalog) => return Ok(catalog),
                Err(e) => warn!("Failed to read catalog cache: {e:?}. Reloading snapshot..."),
            }
        }
    }
    let catalog = MemoryCatalog::from_json_file(&cli.catalog)?;
    if let Some(cache) = &cli.cache {
        write_catalog_to_file(cache, &catalog).context("Failed to write catalog cache")?;
    }
    Ok(catalog)
}

struct Search<'a> {
    catalog: &'a MemoryCatalog,
    viewer: ViewerId,
    order: OrderKey,
    direction: Direction,
    per_page: usize,
}

impl Search<'_> {
    fn run(&self, query: &str, page: usize) -> Result<(), CompileError> {
        let query = compile(query, self.catalog, self.viewer)?
            .order_by(self.order, self.direction)
            .page(page, self.per_page);
        let total = query.count();
        let views = query.execute();
        for (i, view) in views.iter().enumerate() {
            println!("[{}] {view}", page * self.per_page + i);
        }
        println!("{} of {total} matches", views.len());
        Ok(())
    }
}

fn report(result: Result<(), CompileError>) {
    if let Err(e) = result {
        eprintln!("Failed to search: {e}");
    }
}
