//! Tagged SSR CLI
//!
//! Usage:
//!   tagged-ssr [OPTIONS] [FILE]
//!
//! The input is markup with `${...}` placeholders. Each placeholder holds a
//! JSON literal (anything else is taken as a plain string).
//!
//! Options:
//!   -c, --config <FILE>    Render configuration (TOML format)
//!   -e, --elements <FILE>  Custom elements to hydrate (TOML manifest)
//!   -p, --parts            List the parts found in the template
//!   -t, --tree             Print the parsed node tree of the rendered output
//!   -n, --normalize        Parse the input as plain HTML and serialize it back
//!   -v, --verbose          Enable debug logging
//!   -h, --help             Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tagged_ssr::{
    html, ElementManifest, Registry, RenderConfig, Renderer, TemplateResult, TemplateSource, Value,
};

#[derive(Parser)]
#[command(name = "tagged-ssr")]
#[command(about = "Render tagged-template markup to HTML")]
struct Cli {
    /// Input file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Render configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Custom element manifest (TOML format); registered elements are hydrated
    #[arg(short, long)]
    elements: Option<PathBuf>,

    /// List the parts found in the template instead of rendering
    #[arg(short, long)]
    parts: bool,

    /// Print the node tree of the rendered output
    #[arg(short, long)]
    tree: bool,

    /// Treat the input as plain HTML: parse and serialize it back
    #[arg(short, long)]
    normalize: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    let config = match &cli.config {
        Some(path) => match RenderConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => RenderConfig::default(),
    };

    let mut registry = Registry::new();
    if let Some(path) = &cli.elements {
        match ElementManifest::from_file(path) {
            Ok(manifest) => {
                let added = manifest.register_all(&mut registry);
                tracing::debug!(elements = added, "registered elements from {}", path.display());
            }
            Err(e) => {
                eprintln!("Error loading elements '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    let (filename, text) = match read_input(&cli.input) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if cli.normalize {
        let nodes = html::parse(&text);
        if cli.tree {
            print!("{}", html::outline(&nodes));
        } else {
            println!("{}", html::serialize(&nodes));
        }
        return;
    }

    let source = TemplateSource::split(text);
    let template = match source.template() {
        Ok(template) => template,
        Err(e) => {
            eprint!("{}", e.format(&source, &filename));
            std::process::exit(1);
        }
    };

    if cli.parts {
        print_parts(&source, &template);
        return;
    }

    let values = source.expressions().into_iter().map(literal).collect();
    let result = TemplateResult::new(Rc::new(template), values);
    match Renderer::new(&registry).with_config(config).render(&result) {
        Ok(markup) if cli.tree => print!("{}", html::outline(&html::parse(&markup))),
        Ok(markup) => println!("{}", markup),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(input: &Option<PathBuf>) -> Result<(String, String), String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .map(|text| (path.display().to_string(), text))
            .map_err(|e| format!("reading file '{}': {}", path.display(), e)),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map(|_| ("<stdin>".to_string(), buffer))
                .map_err(|e| format!("reading from stdin: {}", e))
        }
    }
}

/// A placeholder's value: a JSON literal, or the raw text as a string
fn literal(expression: &str) -> Value {
    match serde_json::from_str::<serde_json::Value>(expression) {
        Ok(json) => Value::from_json(&json),
        Err(_) => Value::from(expression),
    }
}

fn print_parts(source: &TemplateSource, template: &tagged_ssr::Template) {
    let expressions = source.expressions();
    for (index, part) in template.parts().iter().enumerate() {
        let expression = expressions.get(index).copied().unwrap_or_default();
        match part {
            Some(part) => println!("{:>3}  {:<40} ${{{}}}", index, part.to_string(), expression),
            None => println!("{:>3}  {:<40} ${{{}}}", index, "(merged into previous)", expression),
        }
    }
}

fn print_intro() {
    println!(
        r#"Tagged SSR - render tagged-template markup to HTML

USAGE:
    tagged-ssr [OPTIONS] [FILE]
    echo '<markup>' | tagged-ssr

OPTIONS:
    -c, --config      Render configuration (TOML file)
    -e, --elements    Custom elements to hydrate (TOML manifest)
    -p, --parts       List template parts
    -t, --tree        Print the node tree of the output
    -n, --normalize   Parse plain HTML and serialize it back
    -v, --verbose     Debug logging
    -h, --help        Print help

QUICK START:
    echo '<p class="${{"note"}}">${{[1, 2, 3]}}</p>' | tagged-ssr

Placeholders hold JSON literals. Objects in attributes render with single
quotes, e.g. ${{{{"a": 1}}}} becomes {{'a':1}}.

ELEMENTS:
    [elements.app-item]
    template = "<span>${{meta.index}}</span>"
    attrs = {{ meta = "object" }}"#
    );
}
