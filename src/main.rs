//! Manview - parse, search and serve converted HTML manuals.

use anyhow::Result;
use clap::Parser;
use manview::{
    cli::{Cli, Commands},
    commands,
    config::{ManviewConfig, cfg, init_config},
    serve::serve_library,
};
use std::io::{self, BufWriter, Write};

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    init_config(ManviewConfig::load(cli)?);
    let config = cfg();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match &cli.command {
        Commands::Outline { source, json } => commands::outline(source, *json, &config, &mut out)?,
        Commands::Search {
            source,
            query,
            json,
            html,
        } => commands::search(source, query, *json, html.as_deref(), &config, &mut out)?,
        Commands::Render { source, output } => {
            commands::render(source, output.as_deref(), &config, &mut out)?
        }
        Commands::Serve { .. } => return serve_library(),
    }

    out.flush()?;
    Ok(())
}
