use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use trellis_core::plugin_registry::loader::{DirectorySource, RegistrySource};
use trellis_core::{PluginRegistry, RegistryResolver, ResolutionStatus};

#[derive(Parser)]
#[command(name = "trellis", version, about = "Plugin registry resolver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load plugin manifests from a directory and resolve the registry
    Resolve {
        /// Directory whose child directories hold plugin/fragment manifests
        dir: PathBuf,
        /// Keep disabled plugins in the final registry
        #[arg(long)]
        no_trim: bool,
        /// Skip extension / extension-point cross-linking
        #[arg(long)]
        no_cross_link: bool,
        /// Trace resolution on the log facade
        #[arg(long)]
        debug: bool,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the descriptors found in a manifest directory
    List {
        /// Directory whose child directories hold plugin/fragment manifests
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cli.command {
        Command::Resolve {
            dir,
            no_trim,
            no_cross_link,
            debug,
            json,
        } => {
            let mut registry = PluginRegistry::new();
            DirectorySource::new(dir).populate(&mut registry).await?;

            let mut resolver = RegistryResolver::new();
            resolver.set_trim_plugins(!no_trim);
            resolver.set_cross_link(!no_cross_link);
            resolver.set_debug(debug);
            let status = resolver.resolve(&mut registry);

            if json {
                print_json_report(&registry, &status);
            } else {
                print_report(&registry, &status);
            }
            Ok(if status.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Command::List { dir } => {
            let mut registry = PluginRegistry::new();
            DirectorySource::new(dir).populate(&mut registry).await?;
            for (_, descriptor) in registry.descriptors() {
                println!("plugin {} {}", descriptor.id, descriptor.version);
            }
            for fid in registry.fragment_ids() {
                let fragment = registry.fragment(fid);
                println!(
                    "fragment {} {} -> {} {}",
                    fragment.id, fragment.version, fragment.plugin_id, fragment.plugin_version
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Plugin rows sorted by id and version so the report is stable.
fn plugin_rows(registry: &PluginRegistry) -> Vec<(String, String, bool)> {
    let mut rows: Vec<(String, String, bool)> = registry
        .descriptors()
        .map(|(_, pd)| (pd.id.clone(), pd.version.clone(), pd.enabled))
        .collect();
    rows.sort();
    rows
}

fn print_report(registry: &PluginRegistry, status: &ResolutionStatus) {
    if status.is_ok() {
        println!("status: ok");
    } else {
        println!("status: {} diagnostic(s)", status.diagnostics().len());
        for diagnostic in status.diagnostics() {
            println!("  {diagnostic}");
        }
    }
    println!("plugins:");
    for (id, version, enabled) in plugin_rows(registry) {
        let state = if enabled { "enabled" } else { "disabled" };
        println!("  {id} {version} {state}");
    }
}

fn print_json_report(registry: &PluginRegistry, status: &ResolutionStatus) {
    let report = serde_json::json!({
        "ok": status.is_ok(),
        "diagnostics": status
            .diagnostics()
            .iter()
            .map(|d| {
                serde_json::json!({
                    "code": d.kind.code(),
                    "severity": d.severity.to_string(),
                    "message": d.message,
                })
            })
            .collect::<Vec<_>>(),
        "plugins": plugin_rows(registry)
            .into_iter()
            .map(|(id, version, enabled)| {
                serde_json::json!({ "id": id, "version": version, "enabled": enabled })
            })
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
}
