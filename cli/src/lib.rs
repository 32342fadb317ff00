mod config;

use std::{io, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use comfy_table::Table;
use thiserror::Error;
use tokio::{io::AsyncReadExt, sync::mpsc, task::JoinError};
use tracing::{debug, info};
use twig_tree::{NodeHandle, Tree, TreeError};
use twig_view::Render;

pub use crate::config::{Config, ConfigError};

#[derive(Parser, Debug)]
#[command(name = "twig", version, about = "Inspect compact JSON trees")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file listing type names, the root type first.
    #[arg(long = "types", global = true, env = "TWIG_TYPES")]
    pub types_path: Option<PathBuf>,

    #[arg(long = "log", global = true, default_value = "warn")]
    pub log: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Re-emit a tree in compact form
    Compact {
        /// Input file, stdin when omitted
        file: Option<PathBuf>,
    },
    /// Print a tree with type names and indentation
    Pretty { file: Option<PathBuf> },
    /// Print a tree as a box-drawing outline
    Outline { file: Option<PathBuf> },
    /// Count branches, leaves and null nodes
    Stats {
        file: Option<PathBuf>,

        /// Maximum number of nodes inspected at once
        #[arg(long = "limit", default_value_t = 16)]
        limit: usize,
    },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read stdin: {0}")]
    ReadStdin(#[source] io::Error),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("limit must be 2 or more, got {limit}")]
    InvalidLimit { limit: usize },

    #[error("stats collector failed: {0}")]
    Collect(#[from] JoinError),
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::load(cli.types_path.as_deref()).await?;
    match cli.command {
        Command::Compact { file } => {
            let tree = read_tree(file, &config).await?;
            println!("{}", tree.node(tree.root()));
        }
        Command::Pretty { file } => {
            let tree = read_tree(file, &config).await?;
            println!("{}", tree.pretty(tree.root()));
        }
        Command::Outline { file } => {
            let tree = read_tree(file, &config).await?;
            print!("{}", tree.node(tree.root()).render());
        }
        Command::Stats { file, limit } => {
            if limit < 2 {
                return Err(AppError::InvalidLimit { limit });
            }
            let tree = Arc::new(read_tree(file, &config).await?);
            let stats = stats(&tree, limit).await?;
            stats.print();
        }
    }
    Ok(())
}

async fn read_tree(file: Option<PathBuf>, config: &Config) -> Result<Tree, AppError> {
    let bytes = match file {
        Some(path) => {
            info!(path = %path.display(), "reading tree");
            tokio::fs::read(&path)
                .await
                .map_err(|source| AppError::Read { path, source })?
        }
        None => {
            info!("reading tree from stdin");
            let mut bytes = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut bytes)
                .await
                .map_err(AppError::ReadStdin)?;
            bytes
        }
    };
    Ok(Tree::parse(&bytes, config.registry.clone())?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Branch,
    Leaf,
    Null,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub branches: usize,
    pub leaves: usize,
    pub nulls: usize,
}

impl Stats {
    pub fn total(&self) -> usize {
        self.branches + self.leaves + self.nulls
    }

    pub fn print(&self) {
        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::UTF8_FULL)
            .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
            .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
            .set_header(vec!["kind", "count"]);
        table.add_row(vec!["branch".to_owned(), self.branches.to_string()]);
        table.add_row(vec!["leaf".to_owned(), self.leaves.to_string()]);
        table.add_row(vec!["null".to_owned(), self.nulls.to_string()]);
        table.add_row(vec!["total".to_owned(), self.total().to_string()]);
        println!("{table}")
    }
}

/// Classifies every node of the tree concurrently, at most `limit` at once.
pub async fn stats(tree: &Arc<Tree>, limit: usize) -> Result<Stats, AppError> {
    let (sender, mut receiver) = mpsc::channel(limit);
    let collector = tokio::spawn(async move {
        let mut stats = Stats::default();
        while let Some(kind) = receiver.recv().await {
            match kind {
                Kind::Branch => stats.branches += 1,
                Kind::Leaf => stats.leaves += 1,
                Kind::Null => stats.nulls += 1,
            }
        }
        stats
    });

    tree.visit_async(tree.root(), classify, limit, Some(sender))
        .await;
    let stats = collector.await?;
    debug!(?stats, "counted");
    Ok(stats)
}

async fn classify(handle: NodeHandle) -> Kind {
    let node = handle.node();
    if node.is_branch() {
        Kind::Branch
    } else if node.is_leaf() {
        Kind::Leaf
    } else {
        Kind::Null
    }
}
