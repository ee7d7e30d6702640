use anyhow::{Context, Result};
use ast_select::schema::{self, FieldKind, Registry};
use ast_select::{Handle, QueryEngine, Selector, Tree, Value};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "ast-select")]
#[command(about = "Query typed syntax trees with CSS-style selectors", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every value a selector finds below each tree root
    Search {
        /// Tree JSON file, or a directory searched for *.json files
        path: PathBuf,

        /// Selector expression, e.g. "FunctionDeclaration > id"
        selector: String,

        /// Node-type catalogue to build with (bundled ESTree otherwise)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Print matches as a JSON array
        #[arg(short, long)]
        json: bool,

        /// Only print the number of matches per file
        #[arg(short, long)]
        count: bool,
    },

    /// Print every node a selector matches
    Matches {
        /// Tree JSON file, or a directory searched for *.json files
        path: PathBuf,

        /// Selector expression
        selector: String,

        /// Node-type catalogue to build with (bundled ESTree otherwise)
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// List the node types of a catalogue
    Types {
        /// Node-type catalogue (bundled ESTree otherwise)
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            path,
            selector,
            schema,
            json,
            count,
        } => cmd_search(&path, &selector, schema, json, count),
        Commands::Matches {
            path,
            selector,
            schema,
        } => cmd_matches(&path, &selector, schema),
        Commands::Types { schema } => cmd_types(schema),
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("AST_SELECT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_registry(schema: Option<PathBuf>) -> Result<Arc<Registry>> {
    match schema {
        Some(path) => Ok(Arc::new(schema::load_from_path(&path)?)),
        None => Ok(schema::estree()?),
    }
}

/// A single file, or every `*.json` file below a directory in sorted order.
fn collect_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        anyhow::bail!("No such file or directory: {}", path.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.path().extension().is_some_and(|ext| ext == "json"))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No .json files found in {}", path.display());
    }
    Ok(files)
}

/// Builds one input file into a fresh tree and returns the root.
fn load_tree(registry: &Arc<Registry>, file: &Path) -> Result<(Tree, Handle)> {
    let text =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let mut tree = Tree::new(Arc::clone(registry));
    let root = tree
        .parse_json(&text)
        .with_context(|| format!("failed to build {}", file.display()))?;
    match root.as_handle() {
        Some(handle) => Ok((tree, handle)),
        None => anyhow::bail!("{} does not hold a tree (found {})", file.display(), root),
    }
}

fn cmd_search(
    path: &Path,
    selector: &str,
    schema: Option<PathBuf>,
    json: bool,
    count: bool,
) -> Result<()> {
    let parsed: Selector = selector.parse()?;
    let registry = load_registry(schema)?;
    let files = collect_inputs(path)?;

    let mut total = 0;
    let mut collected = Vec::new();

    for file in &files {
        let (tree, root) = load_tree(&registry, file)?;
        let found = QueryEngine::new(&tree).search_selector(root, &parsed)?;
        total += found.len();

        if json {
            for value in &found {
                collected.push(serde_json::json!({
                    "file": file.display().to_string(),
                    "uid": value.as_handle().map(|h| tree.uid(h).get()),
                    "value": tree.value_to_json(value),
                }));
            }
            continue;
        }

        if count {
            println!("{}: {}", file.display(), found.len());
            continue;
        }

        if found.is_empty() {
            continue;
        }
        println!("{}", file.display().to_string().bold());
        for value in &found {
            println!("  {}", tree.describe(value).green());
            println!("    {}", tree.value_to_json(value).to_string().dimmed());
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&collected)?);
    } else if count && files.len() > 1 {
        println!("{}", format!("total: {}", total).bold());
    } else if !count && total == 0 {
        println!("{}", "No matches".yellow());
    }

    Ok(())
}

fn cmd_matches(path: &Path, selector: &str, schema: Option<PathBuf>) -> Result<()> {
    selector.parse::<Selector>()?;
    let registry = load_registry(schema)?;

    let mut total = 0;
    for file in collect_inputs(path)? {
        let (tree, _) = load_tree(&registry, &file)?;
        let engine = QueryEngine::new(&tree);

        let mut matched = Vec::new();
        for node in tree.node_ids() {
            if engine.matches(node.into(), selector)? {
                matched.push(node);
            }
        }
        if matched.is_empty() {
            continue;
        }

        total += matched.len();
        println!("{}", file.display().to_string().bold());
        for node in matched {
            println!("  {}", tree.describe(&Value::Node(node)).green());
        }
    }

    if total == 0 {
        println!("{}", "No matches".yellow());
    }
    Ok(())
}

fn kind_label(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Node => "node",
        FieldKind::List => "list",
        FieldKind::Native => "native",
        FieldKind::Strict => "strict",
    }
}

fn cmd_types(schema: Option<PathBuf>) -> Result<()> {
    let registry = load_registry(schema)?;

    println!("{} {}", "Catalogue:".bold(), registry.name());
    println!();

    for node_type in registry.types().filter(|t| !t.is_abstract) {
        let ancestors: Vec<&str> = registry
            .ancestors(node_type.id)
            .into_iter()
            .map(|id| registry.node_type(id).name.as_str())
            .collect();

        if ancestors.is_empty() {
            println!("{}", node_type.name.bold());
        } else {
            println!(
                "{} {}",
                node_type.name.bold(),
                format!("< {}", ancestors.join(" < ")).dimmed()
            );
        }

        for field in &node_type.fields {
            let default = if field.default == Value::Undefined {
                String::new()
            } else {
                format!(" = {}", field.default)
            };
            println!(
                "  {} {} {}{}",
                field.name.cyan(),
                kind_label(field.kind).dimmed(),
                field.accepts,
                default.dimmed()
            );
        }
    }

    let categories: Vec<_> = registry.categories().collect();
    if !categories.is_empty() {
        println!();
        println!("{}", "Categories:".bold());
        for category in categories {
            let members: Vec<&str> = category
                .members
                .iter()
                .map(|id| registry.node_type(*id).name.as_str())
                .collect();
            println!("  {} {}", category.name.cyan(), members.join(", ").dimmed());
        }
    }

    Ok(())
}
