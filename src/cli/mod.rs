use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod commands;

use commands::SourceArgs;

#[derive(Parser, Debug)]
#[command(
    name = "pnpgen",
    version,
    about = "Generate a Plug'n'Play map for a JavaScript project",
    long_about = "pnpgen resolves every dependency of a project once, records where each package instance lives and what it may require, and writes a static lookup file (.pnp.js) a runtime loader can use instead of probing node_modules.\n\nExamples:\n  pnpgen generate --graph graph.json\n  pnpgen generate --cache ~/.cache/pkgs --out .pnp.cjs\n  pnpgen locate node_modules/lib/index.js\n  pnpgen ls"
)]
pub struct PnpgenCli {
    #[command(subcommand)]
    pub(crate) command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the package store and write the lookup file
    Generate {
        #[command(flatten)]
        source: SourceArgs,
        /// Output file (default from .pnpgenrc.json, else .pnp.js)
        #[arg(long)]
        out: Option<String>,
        /// Template containing the $$SETUP_STATIC_TABLES(); marker
        #[arg(long)]
        template: Option<String>,
        /// Interpreter line for the generated file, e.g. "/usr/bin/env node"
        #[arg(long)]
        shebang: Option<String>,
        /// Resolve and report without creating aliases or writing output
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the package instance owning each path
    Locate {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// List every package instance and its dependencies
    Ls {
        #[command(flatten)]
        source: SourceArgs,
    },
}

impl PnpgenCli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.command {
            None => {
                self.print_help();
                Ok(())
            }
            Some(Commands::Generate { source, out, template, shebang, dry_run }) => {
                commands::cmd_generate(
                    source,
                    commands::GenerateOptions {
                        out: out.clone(),
                        template: template.clone(),
                        shebang: shebang.clone(),
                        dry_run: *dry_run,
                    },
                )
            }
            Some(Commands::Locate { source, paths }) => commands::cmd_locate(source, paths),
            Some(Commands::Ls { source }) => commands::cmd_ls(source),
        }
    }

    fn print_help(&self) {
        println!("pnpgen - Plug'n'Play map generator\n");
        println!(
            "Commands:\n  generate [--graph FILE|--cache DIR] [--out FILE] [--template FILE] [--shebang CMD] [--dry-run]\n  locate <path..> [--graph FILE|--cache DIR]\n  ls [--graph FILE|--cache DIR]"
        );
    }
}
