#![forbid(unsafe_code)]

use clap::Parser;
use mansite::config::SiteConfig;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mansite", version, about = "Render roff-style manual pages as HTML")]
struct Cli {
    /// Page source; `-` reads standard input.
    #[arg(value_name = "INPUT", default_value = "index.1")]
    input: String,

    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,

    /// Site configuration file (YAML).
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long = "schema", value_name = "PATH", requires = "config")]
    schema: Option<PathBuf>,

    #[arg(long = "stylesheet", value_name = "PATH")]
    stylesheet: Option<PathBuf>,

    #[arg(long = "background", value_name = "DEGREES")]
    background: Option<String>,

    #[arg(long = "text", value_name = "DEGREES")]
    text: Option<String>,

    #[arg(long = "accent", value_name = "DEGREES")]
    accent: Option<String>,

    #[arg(long = "escape-html")]
    escape_html: bool,

    /// Print the parsed structure instead of HTML.
    #[arg(long = "summary", conflicts_with = "json")]
    summary: bool,

    /// Print the parsed structure as JSON.
    #[arg(long = "json")]
    json: bool,

    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn read_input(path: &str) -> io::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(path)
    }
}

fn write_output(path: Option<PathBuf>, contents: &str) -> io::Result<()> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "writing output");
            fs::write(path, contents)
        }
        None => {
            print!("{contents}");
            Ok(())
        }
    }
}

fn site_config(cli: &Cli) -> Result<SiteConfig, mansite::MansiteError> {
    let mut config = match (&cli.config, &cli.schema) {
        (Some(path), Some(schema)) => mansite::load_config_with_schema(path, schema)?,
        (Some(path), None) => mansite::load_config(path)?,
        (None, _) => SiteConfig::default(),
    };
    if let Some(stylesheet) = &cli.stylesheet {
        config.stylesheet = Some(stylesheet.clone());
    }
    if let Some(background) = &cli.background {
        config.background = Some(background.clone());
    }
    if let Some(text) = &cli.text {
        config.text = Some(text.clone());
    }
    if let Some(accent) = &cli.accent {
        config.accent = Some(accent.clone());
    }
    if cli.escape_html {
        config.escape_text = Some(true);
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let input = read_input(&cli.input).map_err(|err| mansite::MansiteError::Io {
        path: cli.input.clone(),
        message: err.to_string(),
    })?;
    let document = mansite::parse_document(&input, &cli.input)?;

    let output = if cli.summary {
        mansite::render_summary(&document)
    } else if cli.json {
        mansite::render_summary_json(&document)?
    } else {
        let options = site_config(&cli)?.render_options()?;
        mansite::render_html(&document, &options)
    };
    write_output(cli.output, &output)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_replace_config_values() {
        let cli = Cli::parse_from(["mansite", "--accent", "90", "--escape-html", "page.1"]);
        let config = site_config(&cli).expect("site config");
        assert_eq!(config.accent.as_deref(), Some("90"));
        assert_eq!(config.escape_text, Some(true));
        assert!(config.background.is_none());
        assert_eq!(cli.input, "page.1");
    }

    #[test]
    fn input_defaults_to_index_page() {
        let cli = Cli::parse_from(["mansite"]);
        assert_eq!(cli.input, "index.1");
        assert!(!cli.summary && !cli.json);
    }

    #[test]
    fn summary_and_json_conflict() {
        assert!(Cli::try_parse_from(["mansite", "--summary", "--json"]).is_err());
    }
}
