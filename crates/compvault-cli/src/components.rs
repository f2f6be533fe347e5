use std::io::{self, BufRead, Write};

use color_eyre::Result;
use compvault_core::{
    component::{Component, ComponentDraft},
    contents::ContentsApi,
};
use compvault_records::ComponentSession;

use crate::{
    cli::{AddArgs, EditArgs},
    session::report,
};

/// Print the collection, optionally filtered.
pub async fn list<C: ContentsApi>(
    session: &mut ComponentSession<C>,
    search: Option<&str>,
) -> Result<()> {
    session.load().await.map_err(report)?;
    let matches = session.search(search.unwrap_or_default());
    if matches.is_empty() {
        if session.components().is_empty() {
            println!("No components yet. Add one with `compvault add --name <name> --type <type>`.");
        } else {
            println!("No components match your search.");
        }
        return Ok(());
    }
    for component in matches {
        println!("{}", format_component(component));
    }
    Ok(())
}

pub async fn add<C: ContentsApi>(session: &mut ComponentSession<C>, args: AddArgs) -> Result<()> {
    session.load().await.map_err(report)?;
    let mut draft = ComponentDraft::new(args.name, args.kind);
    draft.description = args.description;
    draft.version = args.version;
    draft.author = args.author;
    let component = session.add(draft).await.map_err(report)?;
    println!("Added component {}: {}", component.id, component.name);
    Ok(())
}

pub async fn edit<C: ContentsApi>(session: &mut ComponentSession<C>, args: EditArgs) -> Result<()> {
    session.load().await.map_err(report)?;
    let current = session
        .get(&args.id)
        .cloned()
        .ok_or_else(|| color_eyre::eyre::eyre!("component not found: {}", args.id))?;
    let draft = merge_draft(&current, &args);
    let component = session.update(&args.id, draft).await.map_err(report)?;
    println!("Updated component {}: {}", component.id, component.name);
    Ok(())
}

pub async fn delete<C: ContentsApi>(
    session: &mut ComponentSession<C>,
    id: &str,
    confirmed: bool,
) -> Result<()> {
    session.load().await.map_err(report)?;
    let Some(component) = session.get(id) else {
        color_eyre::eyre::bail!("component not found: {id}");
    };
    if !confirmed && !confirm(&format!("Delete \"{}\"?", component.name))? {
        println!("Aborted.");
        return Ok(());
    }
    let removed = session.delete(id).await.map_err(report)?;
    println!("Deleted component {}: {}", removed.id, removed.name);
    Ok(())
}

/// Start from the stored values and overlay whatever was passed on the command line.
fn merge_draft(current: &Component, args: &EditArgs) -> ComponentDraft {
    ComponentDraft {
        name: args.name.clone().unwrap_or_else(|| current.name.clone()),
        kind: args.kind.clone().unwrap_or_else(|| current.kind.clone()),
        description: args.description.clone().or_else(|| current.description.clone()),
        version: args.version.clone().or_else(|| current.version.clone()),
        author: args.author.clone().or_else(|| current.author.clone()),
    }
}

pub fn format_component(component: &Component) -> String {
    format!(
        "{} [{}] {}\n    {}\n    version: {}  author: {}  created: {}",
        component.id,
        component.kind,
        component.name,
        component
            .description
            .as_deref()
            .unwrap_or("No description provided"),
        component.version.as_deref().unwrap_or("N/A"),
        component.author.as_deref().unwrap_or("Unknown"),
        component.created_at.format("%Y-%m-%d"),
    )
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
