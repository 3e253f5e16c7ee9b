//! Command-line interface for the mutation engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use celmut::DEFAULT_MAX_ITERATIONS;

#[derive(Parser)]
#[command(name = "celmut")]
#[command(about = "Edit serialized expression trees", long_about = None)]
pub struct Cli {
    /// Maximum number of nodes a single walk may visit
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print an AST as concrete syntax
    Unparse {
        /// JSON-serialized AST
        file: PathBuf,
    },
    /// Print the debug tree of an AST
    Dump {
        /// JSON-serialized AST
        file: PathBuf,
    },
    /// Replace a subtree and print the resulting AST as JSON
    Replace {
        /// JSON-serialized AST
        file: PathBuf,
        /// Id of the node to replace
        #[arg(long)]
        target: u64,
        /// JSON-serialized AST to splice in
        #[arg(long = "with")]
        donor: PathBuf,
    },
    /// Rename comprehension variables and print the resulting AST as JSON
    Mangle {
        /// JSON-serialized AST
        file: PathBuf,
        #[arg(long, default_value = "@it")]
        iter_prefix: String,
        #[arg(long, default_value = "@ac")]
        accu_prefix: String,
    },
}
