use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use famtree_core::render::DelayScheduler;
use famtree_core::{calculate_tree, SoloPlacement, Store, Tree, TreeOptions};

#[derive(Parser)]
#[command(name = "famtree")]
#[command(version)]
#[command(about = "Compute family trees from relational person datasets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a dataset for integrity problems
    Validate {
        /// Path to the dataset (.json, or .csv with columns id, gender, father, mother, spouses)
        #[arg(short, long)]
        data: String,

        /// Output format: "text" (default) or "json"
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Compute the tree around one person
    Tree {
        /// Path to the dataset (.json or .csv)
        #[arg(short, long)]
        data: String,

        /// Id of the person the tree is anchored at
        #[arg(short, long)]
        main: String,

        /// Maximum generations shown above the anchor
        #[arg(long)]
        ancestry_depth: Option<usize>,

        /// Maximum generations shown below the anchor
        #[arg(long)]
        progeny_depth: Option<usize>,

        /// Also show the anchor's siblings
        #[arg(long)]
        siblings: bool,

        /// Put children with a single known parent before their half-siblings
        #[arg(long)]
        solo_first: bool,

        /// Lay generations out left to right
        #[arg(long)]
        horizontal: bool,

        /// Animation transition duration used for the delay column, in ms
        #[arg(long, default_value = "2000")]
        transition_ms: f64,

        /// Output format: "text" (default) or "json"
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Print the dataset as JSON, each record in the shape it was loaded in
    Export {
        /// Path to the dataset (.json or .csv)
        #[arg(short, long)]
        data: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { data, format } => cmd_validate(&data, &format),
        Commands::Tree {
            data,
            main,
            ancestry_depth,
            progeny_depth,
            siblings,
            solo_first,
            horizontal,
            transition_ms,
            format,
        } => {
            let mut options = TreeOptions::new(main)
                .show_siblings_of_main(siblings)
                .horizontal(horizontal);
            options.ancestry_depth = ancestry_depth;
            options.progeny_depth = progeny_depth;
            if solo_first {
                options = options.solo_children(SoloPlacement::First);
            }
            cmd_tree(&data, &options, transition_ms, &format)
        }
        Commands::Export { data } => cmd_export(&data),
    }
}

fn load_store(path: &str) -> Result<Store> {
    let is_csv = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let store = if is_csv {
        Store::from_csv(path)
    } else {
        Store::from_json_path(path)
    }
    .with_context(|| format!("Failed to load dataset from '{}'", path))?;

    log::info!("Loaded {} persons from '{}'", store.len(), path);
    Ok(store)
}

fn cmd_validate(data_path: &str, output_format: &str) -> Result<()> {
    let store = load_store(data_path)?;
    let findings = store.validate();

    match output_format.to_lowercase().as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&findings)?),
        _ => {
            if findings.is_empty() {
                println!("No problems found in {} persons", store.len());
            }
            for finding in &findings {
                println!("{}", finding);
            }
        }
    }
    Ok(())
}

fn cmd_tree(
    data_path: &str,
    options: &TreeOptions,
    transition_ms: f64,
    output_format: &str,
) -> Result<()> {
    let store = load_store(data_path)?;

    let findings = store.validate();
    if !findings.is_empty() {
        log::warn!(
            "Dataset has {} integrity problems; run `famtree validate` for details",
            findings.len()
        );
    }

    let tree = calculate_tree(&store, options)
        .with_context(|| format!("Failed to compute tree for '{}'", options.main_id))?;

    match output_format.to_lowercase().as_str() {
        "json" => print_json(&tree, transition_ms)?,
        _ => print_text(&tree, transition_ms),
    }
    Ok(())
}

fn print_text(tree: &Tree<'_>, transition_ms: f64) {
    let scheduler = DelayScheduler::new(tree, transition_ms);
    println!(
        "{:<16} {:<10} {:>5} {:<16} {:>9} {:>9} {:>9}",
        "id", "side", "depth", "spouse of", "x", "y", "delay"
    );
    for node in tree.nodes() {
        let side = if node.is_main() {
            "main"
        } else if node.is_sibling() {
            "sibling"
        } else if node.is_ancestry() {
            "ancestry"
        } else {
            "progeny"
        };
        let spouse_of = node
            .spouse()
            .and_then(|t| tree.node(t))
            .map(|n| n.id())
            .unwrap_or("-");
        println!(
            "{:<16} {:<10} {:>5} {:<16} {:>9.1} {:>9.1} {:>9.0}",
            node.id(),
            side,
            node.depth(),
            spouse_of,
            node.x(),
            node.y(),
            scheduler.delay(node)
        );
    }
}

fn print_json(tree: &Tree<'_>, transition_ms: f64) -> Result<()> {
    let scheduler = DelayScheduler::new(tree, transition_ms);
    let mut value = tree.to_json();
    if let Some(nodes) = value["nodes"].as_array_mut() {
        for (json, node) in nodes.iter_mut().zip(tree.nodes()) {
            json["delay_ms"] = serde_json::json!(scheduler.delay(node));
        }
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn cmd_export(data_path: &str) -> Result<()> {
    let store = load_store(data_path)?;
    println!("{}", store.to_json_string()?);
    Ok(())
}
