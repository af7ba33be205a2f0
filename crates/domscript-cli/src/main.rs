use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use domscript_ai::Generator;
use domscript_api::{init_tracing, ScriptStore, Server, Userscript};
use domscript_core::{ConfigManager, DomScriptConfig};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "domscript")]
#[command(about = "DomScript CLI - turn plain-language commands into browser snippets", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (json, pretty)
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Config file (defaults to ./.domscript.toml, then ~/.domscript/config.toml)
    #[arg(short, long, global = true, env = "DOMSCRIPT_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a snippet for a command
    Generate {
        /// Command words, e.g. `make buttons red`
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },

    /// Run the model quality gate and print its report
    Probe,

    /// Start the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Saved script management
    #[command(subcommand)]
    Scripts(ScriptCommands),

    /// Write a default config file
    Init {
        /// Target path
        #[arg(default_value = ".domscript.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ScriptCommands {
    /// List saved scripts
    List,

    /// Export a saved script as a userscript
    Export {
        /// Script ID
        id: u64,

        /// Directory to write the `.user.js` file into (prints when omitted)
        #[arg(short = 'd', long)]
        out_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::load_from_path(path),
        None => ConfigManager::load(),
    }
    .context("Failed to load configuration")?;
    domscript_patterns::validate_config(manager.config()).context("Invalid configuration")?;

    let mut config = manager.config().clone();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_tracing(&config.logging);

    match execute_command(&cli, config).await {
        Ok(Some(output)) => {
            print_output(&cli.output, &output)?;
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn execute_command(cli: &Cli, config: DomScriptConfig) -> Result<Option<serde_json::Value>> {
    match &cli.command {
        Commands::Generate { words } => {
            let command = words.join(" ");
            let result = Generator::from_config(&config).generate(&command).await;
            Ok(Some(serde_json::to_value(result)?))
        }
        Commands::Probe => {
            let generator = Generator::from_config(&config);
            let available = generator.provider_available().await;
            let report = generator.probe().await.ok_or_else(|| {
                anyhow!("No completion provider configured; set [model] enabled = true")
            })?;
            Ok(Some(serde_json::json!({
                "provider": generator.provider_name(),
                "model": generator.model_name(),
                "available": available,
                "model_phase": generator.model_phase(),
                "report": report,
            })))
        }
        Commands::Serve { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }

            let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
                .parse()
                .with_context(|| {
                    format!(
                        "Invalid listen address {}:{}",
                        config.server.host, config.server.port
                    )
                })?;

            println!(
                "{} http://{}",
                "DomScript API listening on".green().bold(),
                addr
            );
            Server::new(addr, &config).run().await?;
            Ok(None)
        }
        Commands::Scripts(cmd) => execute_scripts_command(cmd, &config).await,
        Commands::Init { path, force } => {
            if path.exists() && !force {
                return Err(anyhow!(
                    "{} already exists, use --force to overwrite",
                    path.display()
                ));
            }
            ConfigManager::create_default_config(path)?;
            Ok(Some(serde_json::json!({
                "message": "Config file written",
                "path": path.display().to_string(),
            })))
        }
    }
}

async fn execute_scripts_command(
    cmd: &ScriptCommands,
    config: &DomScriptConfig,
) -> Result<Option<serde_json::Value>> {
    let store = ScriptStore::new(config.storage.scripts_path.clone());

    match cmd {
        ScriptCommands::List => {
            let scripts = store.list().await?;
            Ok(Some(serde_json::to_value(scripts)?))
        }
        ScriptCommands::Export { id, out_dir } => {
            let script = store
                .get(*id)
                .await?
                .ok_or_else(|| anyhow!("Script {} not found in {}", id, store.path().display()))?;
            let export = Userscript::from_script(&script);

            match out_dir {
                Some(dir) => {
                    std::fs::create_dir_all(dir)
                        .with_context(|| format!("Failed to create {}", dir.display()))?;
                    let path = dir.join(&export.filename);
                    std::fs::write(&path, &export.userscript)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    Ok(Some(serde_json::json!({
                        "message": "Userscript exported",
                        "path": path.display().to_string(),
                    })))
                }
                None => {
                    println!("{}", export.userscript);
                    Ok(None)
                }
            }
        }
    }
}

fn print_output(format: &OutputFormat, value: &serde_json::Value) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Pretty => {
            print_pretty(value)?;
        }
    }
    Ok(())
}

fn print_pretty(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    serde_json::Value::String(s) => {
                        println!("{}: {}", key_colored, s.green());
                    }
                    serde_json::Value::Number(n) => {
                        println!("{}: {}", key_colored, n.to_string().yellow());
                    }
                    serde_json::Value::Bool(b) => {
                        let val_colored = if *b {
                            "true".green()
                        } else {
                            "false".red()
                        };
                        println!("{}: {}", key_colored, val_colored);
                    }
                    serde_json::Value::Null => {
                        println!("{}: {}", key_colored, "-".dimmed());
                    }
                    _ => {
                        println!("{}:", key_colored);
                        println!("{}", serde_json::to_string_pretty(val)?);
                    }
                }
            }
        }
        serde_json::Value::Array(arr) if arr.is_empty() => {
            println!("{}", "(none)".dimmed());
        }
        serde_json::Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                println!("\n{}{}:", "Item ".cyan(), (i + 1).to_string().yellow());
                print_pretty(item)?;
            }
        }
        _ => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
    }
    Ok(())
}
