//! celmut CLI entry point.

mod cli;

use std::path::{Path, PathBuf};

use celmut::celmut_ast::{Ast, ExprId, UnparseError, unparse};
use celmut::{AstMutator, MutableAst, MutationError};
use clap::Parser;
use cli::{Cli, Command};
use derive_more::{Display, Error, From};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Display, Error, From)]
enum CliError {
    #[display("{}: {source}", path.display())]
    #[from(ignore)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[display("invalid AST JSON: {_0}")]
    Json(serde_json::Error),

    #[display("{_0}")]
    Mutation(MutationError),

    #[display("{_0}")]
    Unparse(UnparseError),
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mutator = AstMutator::new(cli.max_iterations);

    match run(&mutator, cli.command) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

fn load(path: &Path) -> Result<Ast, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_owned(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

fn run(mutator: &AstMutator, command: Command) -> Result<String, CliError> {
    match command {
        Command::Unparse { file } => Ok(unparse(&load(&file)?)?),
        Command::Dump { file } => Ok(load(&file)?.expr().to_string()),
        Command::Replace {
            file,
            target,
            donor,
        } => {
            let ast = MutableAst::from(load(&file)?);
            let donor = MutableAst::from(load(&donor)?);
            let result = mutator.replace_subtree_with_ast(&ast, &donor, ExprId::new(target))?;
            Ok(serde_json::to_string_pretty(&result.to_parsed_ast())?)
        }
        Command::Mangle {
            file,
            iter_prefix,
            accu_prefix,
        } => {
            let ast = MutableAst::from(load(&file)?);
            let result =
                mutator.mangle_comprehension_identifier_names(&ast, &iter_prefix, &accu_prefix)?;
            Ok(serde_json::to_string_pretty(&result.ast.to_parsed_ast())?)
        }
    }
}
