use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// JSON catalog snapshot.
    #[clap(long, env = "COF_CATALOG")]
    pub catalog: PathBuf,
    /// Viewer queries run as. Libraries owned by other viewers stay hidden.
    #[clap(long, env = "COF_VIEWER", default_value_t = 0)]
    pub viewer: u64,
    #[clap(long, env = "COF_ITEMS_PER_PAGE", default_value_t = 20)]
    pub per_page: usize,
    /// One of name, rating, width, height, size or id.
    #[clap(long, default_value = "name")]
    pub order: String,
    #[clap(long, default_value = "false")]
    pub descending: bool,
    /// Saved searches are kept in this file when given.
    #[clap(long, env = "COF_SAVED_SEARCHES")]
    pub saved: Option<PathBuf>,
    /// Binary catalog cache. Read instead of the snapshot when present,
    /// written after loading the snapshot otherwise.
    #[clap(long, env = "COF_CATALOG_CACHE")]
    pub cache: Option<PathBuf>,
    /// Run one query, print the first page and exit.
    #[clap(long)]
    pub query: Option<String>,
}

/// One REPL line.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Query(&'a str),
    Page { page: usize, query: &'a str },
    Ast(&'a str),
    Save { name: &'a str, query: &'a str },
    Run(&'a str),
    Saved,
    Forget(&'a str),
    Bye,
    Invalid(String),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let Some(command) = line.strip_prefix('/') else {
            return Command::Query(line);
        };
        let (word, rest) = match command.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (command, ""),
        };
        match (word, rest) {
            ("bye", "") => Command::Bye,
            ("saved", "") => Command::Saved,
            ("ast", query) => Command::Ast(query),
            ("page", rest) => {
                let (page, query) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                match page.parse() {
                    Ok(page) => Command::Page {
                        page,
                        query: query.trim(),
                    },
                    Err(_) => Command::Invalid(format!("invalid page number {page:?}")),
                }
            }
            ("save", rest) => match rest.split_once(char::is_whitespace) {
                Some((name, query)) => Command::Save {
                    name,
                    query: query.trim(),
                },
                None => Command::Invalid("usage: /save <name> <query>".to_string()),
            },
            ("run", "") | ("forget", "") => Command::Invalid(format!("usage: /{word} <name>")),
            ("run", name) => Command::Run(name),
            ("forget", name) => Command::Forget(name),
            _ => Command::Invalid(format!("unknown command /{word}")),
        }
    }
}
