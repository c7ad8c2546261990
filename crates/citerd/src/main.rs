use citer::{
  clients::{Credentials, OpenAccessClient},
  subject::{Output, Resolver, Subject},
};
use clap::{builder::ArgAction, Parser, Subcommand};
use console::{style, Emoji};
use errors::CiterdError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub mod errors;

static LOOKING_GLASS: Emoji<'_, '_> = Emoji("🔍 ", "");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "");
static SUCCESS: Emoji<'_, '_> = Emoji("✨ ", "");

#[derive(Parser)]
#[command(author, version, about = "CLI for resolving software and dataset citations")]
struct Cli {
  /// Verbose mode (-v, -vv, -vvv)
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve one subject and print its citation
  Resolve {
    /// Subject identifier (URL, repository URL, or DOI)
    input: String,
    /// Citation style name
    #[arg(long, short)]
    style: Option<String>,
    /// Print the full output record as JSON
    #[arg(long)]
    json:  bool,
  },
  /// Resolve a batch of subjects and enrich them with open-access links
  Batch {
    /// Subject identifiers (URLs, repository URLs, or DOIs)
    #[arg(required = true)]
    inputs: Vec<String>,
    /// Citation style name applied to every subject
    #[arg(long, short)]
    style:  Option<String>,
    /// Print the full output records as JSON
    #[arg(long)]
    json:   bool,
    /// Static-IP proxy for the open-access index (defaults to the
    /// STATIC_IP_PROXY environment variable)
    #[arg(long)]
    proxy:  Option<String>,
  },
}

/// Setup logging with the specified verbosity level
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .init();
}

/// Prints one resolved subject in human-readable form
fn print_output(output: &Output) {
  println!("\n{} {}", style(SUCCESS).green(), style(&output.citation).white());
  if let Some(url) = &output.url {
    println!("   {} {}", style("URL:").green().bold(), style(url).blue().underlined());
  }
  if let Some(doi) = &output.doi {
    println!("   {} {}", style("DOI:").green().bold(), style(doi).blue().underlined());
  }
  if let Some(license) = &output.metadata.license {
    println!("   {} {}", style("License:").green().bold(), style(license).white());
  }
  if let Some(fulltext_url) = &output.metadata.fulltext_url {
    println!("   {} {}", style("Full text:").green().bold(), style(fulltext_url).blue().underlined());
  }
}

#[tokio::main]
async fn main() -> Result<(), CiterdError> {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  let resolver = Resolver::new(Credentials::from_env());

  match cli.command {
    Commands::Resolve { input, style: style_name, json } => {
      println!("{} Resolving: {}", style(LOOKING_GLASS).cyan(), style(&input).yellow());

      let mut subject = resolver.resolve(&input).await?;
      if let Some(name) = style_name {
        subject = subject.with_style(&name);
      }
      debug!("Subject details: {:?}", subject);

      let output = subject.output()?;
      if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
      } else {
        print_output(&output);
      }
      Ok(())
    },

    Commands::Batch { inputs, style: style_name, json, proxy } => {
      let proxy = proxy.or_else(|| std::env::var("STATIC_IP_PROXY").ok());
      let open_access = OpenAccessClient::new(proxy.as_deref())?;

      let mut subjects: Vec<Subject> = Vec::new();
      for input in &inputs {
        println!("{} Resolving: {}", style(LOOKING_GLASS).cyan(), style(input).yellow());
        match resolver.resolve(input).await {
          Ok(mut subject) => {
            if let Some(name) = &style_name {
              subject = subject.with_style(name);
            }
            subjects.push(subject);
          },
          Err(e) => println!("{} Skipping {}: {}", style(WARNING).yellow(), style(input).yellow(), e),
        }
      }

      open_access.enrich(&mut subjects).await;

      if json {
        let outputs = subjects.iter().map(Subject::output).collect::<Result<Vec<_>, _>>()?;
        println!("{}", serde_json::to_string_pretty(&outputs)?);
      } else {
        for subject in &subjects {
          match subject.output() {
            Ok(output) => print_output(&output),
            Err(e) => println!("{} {}", style(WARNING).yellow(), e),
          }
        }
      }
      Ok(())
    },
  }
}
