use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::{ProfileArgs, ProfileCommand, TemplateArgs, TemplateCommand};
use crate::commands::{load_academic_config, open_store};
use crate::template::{BUILTIN_TEMPLATE_IDS, Template};
use crate::util::{print_json, read_text};

#[derive(Serialize)]
struct TemplateSummary<'a> {
    id: &'a str,
    name: &'a str,
    builtin: bool,
}

pub fn run_template(args: TemplateArgs) -> Result<()> {
    let store = open_store(&args.store)?;

    match args.command {
        TemplateCommand::List => {
            let templates = store.list_templates()?;
            let summaries = templates
                .iter()
                .map(|template| TemplateSummary {
                    id: &template.id,
                    name: &template.name,
                    builtin: BUILTIN_TEMPLATE_IDS.contains(&template.id.as_str()),
                })
                .collect::<Vec<TemplateSummary>>();
            print_json(&summaries)?;
        }
        TemplateCommand::Show { id } => print_json(&store.get_template(&id)?)?,
        TemplateCommand::Save { input } => {
            let raw = read_text(&input)?;
            let template: Template = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse {}", input.display()))?;
            store.save_template(&template)?;
            info!(template = %template.id, "saved template");
        }
    }
    Ok(())
}

pub fn run_profile(args: ProfileArgs) -> Result<()> {
    let store = open_store(&args.store)?;

    match args.command {
        ProfileCommand::List => print_json(&store.list_profiles()?)?,
        ProfileCommand::Show { name } => print_json(&store.get_profile(&name)?)?,
        ProfileCommand::Save { name, input } => {
            let config = load_academic_config(&input)?;
            store.save_profile(&name, &config)?;
            info!(profile = %name, "saved academic profile");
        }
    }
    Ok(())
}
