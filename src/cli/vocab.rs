//! Vocab command implementation

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use crate::config::load_config;
use crate::domain::Facet;
use crate::vocab::{FacetVocabulary, VocabularyRegistry};

#[derive(Args)]
pub struct VocabArgs {
    /// Facet to print, by column name or internal key (all facets when omitted)
    #[arg(value_name = "FACET")]
    pub facet: Option<String>,

    /// Path to config file (incident-classifier.toml or .yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn run(args: VocabArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = load_config(&cwd, args.config.as_deref())?;
    let registry = VocabularyRegistry::from_config(&config)?;

    match args.facet.as_deref() {
        Some(name) => {
            let Some(facet) = Facet::from_key(name) else {
                let known: Vec<&str> = Facet::ALL.iter().map(|f| f.column()).collect();
                anyhow::bail!("Unknown facet '{}'. Known facets: {}", name, known.join(", "));
            };
            print_facet(registry.vocabulary(facet));
        }
        None => {
            for (i, vocabulary) in registry.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_facet(vocabulary);
            }
        }
    }
    Ok(())
}

fn print_facet(vocabulary: &FacetVocabulary) {
    let facet = vocabulary.facet();
    println!(
        "{} (key: {}, {} values)",
        style(facet.column()).bold(),
        facet.internal_key(),
        vocabulary.allowed().len()
    );
    for value in vocabulary.allowed() {
        if value == vocabulary.default_value() {
            println!("  * {value} {}", style("(default)").dim());
        } else {
            println!("    {value}");
        }
    }
}
