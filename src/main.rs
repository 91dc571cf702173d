// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use formninja::fbgfc_config;
use formninja::{Application, Entry, FormBuilder, FormError, NodeRef, PropertyValue};

#[derive(Parser)]
#[command(name = "formninja", about = "Inspect and edit form builder documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy the default document into the config directory
    Init {
        /// Archive any existing document first
        #[arg(long)]
        fresh: bool,
    },
    /// Print the page/section/control outline with indices
    Show {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Re-export a document as normalized XML
    Export {
        #[arg(long)]
        file: Option<PathBuf>,
        /// Write here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Append a page and save the document
    AddPage {
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        label: Option<String>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_env("FORMNINJA_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), FormError> {
    match cli.command {
        Command::Init { fresh } => {
            let path = fbgfc_config::ensure_default_document(&fbgfc_config::config_dir(), fresh)?;
            println!("{}", path.display());
        }
        Command::Show { file } => {
            let app = load(file)?;
            print!("{}", outline(&app));
        }
        Command::Export { file, out } => {
            let xml = load(file)?.export_xml_string()?;
            match out {
                Some(path) => fbgfc_config::save_document_file(&path, &xml)?,
                None => println!("{}", xml),
            }
        }
        Command::AddPage { file, label } => {
            let path = file.unwrap_or_else(fbgfc_config::config_path);
            let mut builder = FormBuilder::new(load(Some(path.clone()))?);
            let index = builder.add_page()?;

            if let Some(label) = label {
                builder.begin_edit(NodeRef::Page(index))?;
                let mut values = formninja::EditValues::new();
                values.insert("label".to_string(), PropertyValue::Text(label));
                builder.submit_edit(&values)?;
            }

            let xml = builder.export_xml().to_xml_string()?;
            fbgfc_config::save_document_file(&path, &xml)?;
            println!("added page {}", index);
        }
    }
    Ok(())
}

fn load(file: Option<PathBuf>) -> Result<Application, FormError> {
    let path = file.unwrap_or_else(fbgfc_config::config_path);
    let xml = fbgfc_config::load_document_file(&path)?;
    let mut app = Application::default();
    app.import_xml(&xml)?;
    Ok(app)
}

fn outline(app: &Application) -> String {
    let mut out = format!("{}\n", app.name);
    for (p, page) in app.pages.iter().enumerate() {
        out.push_str(&format!("  [{}] page '{}'\n", p, page.label));
        for (e, entry) in page.entries.iter().enumerate() {
            match entry {
                Entry::Control(c) => {
                    out.push_str(&format!("    [{}] {} '{}'{}\n", e, c.kind().tag(), c.label,
                        if c.required { " *" } else { "" }));
                }
                Entry::Section(s) => {
                    out.push_str(&format!("    [{}] section '{}'\n", e, s.label));
                    for (i, c) in s.controls.iter().enumerate() {
                        out.push_str(&format!("      [{}] {} '{}'{}\n", i, c.kind().tag(), c.label,
                            if c.required { " *" } else { "" }));
                    }
                }
            }
        }
    }
    out
}
