use anyhow::Context;
use armplot::job::{self, OutputPaths};
use armplot::{init_logging, CancelToken, Config, StreamOutcome, StreamReport, YAxis};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "armplot", version, about = "Draw SVG files with a two-link arm")]
struct Cli {
    /// Configuration file (.json or .toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an SVG into a command file
    Generate {
        svg: PathBuf,

        /// Y axis of the drawing: `down` for SVG screen coordinates, `up` for math coordinates
        #[arg(long)]
        y_axis: Option<YAxis>,

        /// Command file to write
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the mapped point stream here
        #[arg(long)]
        points: Option<PathBuf>,
    },

    /// Stream a command file to the controller
    Send {
        commands: PathBuf,

        #[arg(long)]
        port: Option<String>,

        #[arg(long)]
        baud: Option<u32>,
    },

    /// Generate and send every input listed in the configuration
    Run,

    /// List serial ports that look like controllers
    Ports,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading configuration {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn cancel_on_ctrl_c() -> anyhow::Result<CancelToken> {
    let token = CancelToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        tracing::warn!("Interrupted, stopping after the current read");
        handler_token.cancel();
    })
    .context("installing Ctrl-C handler")?;
    Ok(token)
}

fn print_report(report: &StreamReport) {
    match report.outcome {
        StreamOutcome::Completed => println!(
            "Sent {} commands in {} batches",
            report.sent,
            report.batches.len()
        ),
        StreamOutcome::Cancelled => println!("Cancelled after {} commands", report.sent),
    }
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Generate {
            svg,
            y_axis,
            output,
            points,
        } => {
            let y_axis = y_axis.unwrap_or(config.workspace.y_axis);
            let paths = OutputPaths {
                commands: output,
                points,
            };
            let drawing = job::generate(&config, &svg, y_axis, &paths)?;
            let stats = drawing.output.stats;
            println!(
                "{}: {} strokes, {} nodes, {} commands, {} dropped -> {}",
                svg.display(),
                stats.strokes,
                stats.nodes,
                drawing.output.commands.len(),
                stats.dropped,
                drawing.commands_path.display()
            );
        }
        Commands::Send {
            commands,
            port,
            baud,
        } => {
            let cancel = cancel_on_ctrl_c()?;
            let report = job::send_file(&config, &commands, port.as_deref(), baud, cancel)?;
            print_report(&report);
        }
        Commands::Run => {
            let cancel = cancel_on_ctrl_c()?;
            let summary = job::run(&config, cancel)?;
            for (input, report) in &summary.sent {
                print!("{}: ", input.display());
                print_report(report);
            }
            if !summary.skipped.is_empty() {
                for (input, reason) in &summary.skipped {
                    eprintln!("Skipped {}: {}", input.display(), reason);
                }
                anyhow::bail!("{} input(s) could not be converted", summary.skipped.len());
            }
        }
        Commands::Ports => {
            let ports = armplot::list_ports()?;
            if ports.is_empty() {
                println!("No controller ports found");
            }
            for port in ports {
                println!("{}\t{}", port.port_name, port.description);
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    tracing::debug!("armplot {} (built {})", armplot::VERSION, armplot::BUILD_DATE);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
