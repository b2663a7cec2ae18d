//! Single-document commands: `outline`, `search` and `render`.
//!
//! Each writes its report to the given writer (stdout in the binary) and
//! logs progress to stderr.

use crate::{
    config::ManviewConfig,
    document::{DocumentSource, LoadedDocument},
    library::Catalog,
    log,
    search::SearchResult,
};
use anyhow::{Context, Result};
use serde_json::json;
use std::{fs, io::Write, path::Path};

/// A library id if the catalog knows it, otherwise a path or URL.
pub fn resolve_source(source: &str, config: &ManviewConfig) -> DocumentSource {
    Catalog::from_config(config)
        .get(source)
        .map(|entry| entry.source.clone())
        .unwrap_or_else(|| DocumentSource::parse(source))
}

fn load(source: &str, config: &ManviewConfig) -> Result<LoadedDocument> {
    let source = resolve_source(source, config);
    source
        .load()
        .with_context(|| format!("failed to load manual from {source}"))
}

pub fn outline(source: &str, json: bool, config: &ManviewConfig, out: &mut impl Write) -> Result<()> {
    let doc = load(source, config)?;
    if json {
        serde_json::to_writer_pretty(&mut *out, doc.parsed.as_ref())?;
        writeln!(out)?;
        return Ok(());
    }

    if doc.parsed.is_empty() {
        log!("outline"; "no level-1 headings in {}", doc.source);
        return Ok(());
    }
    for section in &doc.parsed.sections {
        writeln!(out, "{}  #{}", section.text, section.id)?;
        for sub in &section.subsections {
            writeln!(out, "    {}  #{}", sub.text, sub.id)?;
        }
    }
    Ok(())
}

fn write_result(out: &mut impl Write, result: &SearchResult) -> std::io::Result<()> {
    match &result.parent {
        None => writeln!(out, "{}  #{}", result.text, result.id),
        Some(parent) => writeln!(out, "    {}  #{}  (in {})", result.text, result.id, parent.text),
    }
}

pub fn search(
    source: &str,
    query: &str,
    json: bool,
    html_out: Option<&Path>,
    config: &ManviewConfig,
    out: &mut impl Write,
) -> Result<()> {
    let doc = load(source, config)?;
    let output = doc.search.run(query);

    if let Some(path) = html_out {
        fs::write(path, &output.highlighted_html)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log!("search"; "highlighted document written to {}", path.display());
    }

    if json {
        let value = json!({ "query": query, "results": output.results });
        serde_json::to_writer_pretty(&mut *out, &value)?;
        writeln!(out)?;
        return Ok(());
    }

    log!("search"; "{} matches for \"{}\"", output.results.len(), query);
    for result in &output.results {
        write_result(out, result)?;
    }
    Ok(())
}

pub fn render(source: &str, output: Option<&Path>, config: &ManviewConfig, out: &mut impl Write) -> Result<()> {
    let doc = load(source, config)?;
    let html = doc.parsed.base_html();
    match output {
        Some(path) => {
            fs::write(path, &html).with_context(|| format!("failed to write {}", path.display()))?;
            log!("render"; "{} sections written to {}", doc.parsed.sections.len(), path.display());
        }
        None => out.write_all(html.as_bytes())?,
    }
    Ok(())
}
