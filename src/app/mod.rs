use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::document::{CONTENT_TYPE, write_document};
use crate::dsl::{BBox, parse_id_list, parse_predicate};
use crate::elements::ElementKind;
use crate::error::QueryError;
use crate::ingest;
use crate::query::{self, Operation, QueryPlan, SearchTarget};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input OSM file (.osm.pbf or .osm XML)
    #[arg(short, long, env = "XAPI_INPUT")]
    pub input: PathBuf,

    /// Document settings file (YAML)
    #[arg(short, long, env = "XAPI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output file, or - for stdout
    #[arg(short, long, default_value = "-")]
    pub output: PathBuf,

    /// Number of threads used while loading the input (default: all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the SQL equivalent of each selection to stderr
    #[arg(long)]
    pub explain: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Nodes by id (comma separated)
    Node { ids: String },
    /// Ways by id, with their nodes
    Way { ids: String },
    /// Relations by id
    Relation { ids: String },
    /// Elements matching a predicate such as [amenity=cafe][bbox=...]
    Search {
        #[arg(value_enum)]
        target: SearchTarget,
        predicate: String,
    },
    /// Everything inside a bounding box, with referenced nodes and relations
    Map {
        /// left,bottom,right,top
        #[arg(long, allow_hyphen_values = true)]
        bbox: String,
    },
}

impl Command {
    pub fn operation(&self) -> Result<Operation, QueryError> {
        let lookup = |kind: ElementKind, ids: &str| -> Result<Operation, QueryError> {
            Ok(Operation::Lookup {
                kind,
                ids: parse_id_list(ids)?,
            })
        };

        match self {
            Command::Node { ids } => lookup(ElementKind::Node, ids),
            Command::Way { ids } => lookup(ElementKind::Way, ids),
            Command::Relation { ids } => lookup(ElementKind::Relation, ids),
            Command::Search { target, predicate } => Ok(Operation::Search {
                target: *target,
                filter: parse_predicate(predicate)?,
            }),
            Command::Map { bbox } => Ok(Operation::Map {
                bbox: BBox::parse(bbox)?,
            }),
        }
    }
}

/// Plan, load, execute and stream one request. Returns the number of document
/// fragments written.
pub fn run(cli: &Cli) -> Result<usize> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Config: Failed to load {:?}", path))?,
        None => Settings::default(),
    };

    let plan = QueryPlan::for_operation(&cli.command.operation()?)?;
    if cli.explain {
        for sql in plan.explain() {
            eprintln!("{sql}");
        }
    }

    let store = ingest::load_store(&cli.input)?;
    let stream = query::execute(&store, &plan, &settings.document)?;

    let mut output = open_output(&cli.output)?;
    let fragments = write_document(stream, &mut output)?;
    tracing::info!("Output: {} fragment(s) of {}", fragments, CONTENT_TYPE);
    tracing::debug!("Store: {} session(s) open after request", store.open_sessions());
    Ok(fragments)
}

fn open_output(path: &Path) -> Result<BufWriter<Box<dyn Write>>> {
    let writer: Box<dyn Write> = if path == Path::new("-") {
        Box::new(std::io::stdout().lock())
    } else {
        let file = File::create(path)
            .with_context(|| format!("Output: Failed to create {:?}", path))?;
        Box::new(file)
    };
    Ok(BufWriter::new(writer))
}
