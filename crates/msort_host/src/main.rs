mod generator;
mod runner;
mod stats;
mod sweep;

use anyhow::Result;
use clap::{Parser, Subcommand};
use generator::Order;
use runner::{RunConfig, SortPath};

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Gen {
        #[arg(short, long, default_value = "words.txt")]
        out: String,
        #[arg(short, long, default_value_t = 3000)]
        n: usize,
        #[arg(long, value_enum, default_value_t = Order::Descending)]
        order: Order,
        #[arg(long, default_value_t = 12345)]
        seed: u64,
    },
    Run {
        #[arg(short, long)]
        input: Option<String>,
        #[arg(short, long, default_value_t = 3000)]
        n: usize,
        #[arg(long, value_enum, default_value_t = Order::Descending)]
        order: Order,
        #[arg(long, default_value_t = 12345)]
        seed: u64,
        #[arg(short, long, value_enum, default_value_t = SortPath::Both)]
        path: SortPath,
        #[arg(short, long, default_value_t = 1)]
        repeat: usize,
        #[arg(long, default_value_t = 0)]
        latency_us: u64,
    },
    Sweep {
        #[arg(long, default_value_t = 4096)]
        max_n: usize,
        #[arg(short, long, default_value_t = 4)]
        trials: usize,
        #[arg(long, default_value_t = 12345)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Gen {
            out,
            n,
            order,
            seed,
        } => {
            generator::generate_workload(&out, n, order, seed)?;
        }
        Commands::Run {
            input,
            n,
            order,
            seed,
            path,
            repeat,
            latency_us,
        } => {
            runner::run(&RunConfig {
                input,
                n,
                order,
                seed,
                path,
                repeat,
                latency_us,
            })?;
        }
        Commands::Sweep {
            max_n,
            trials,
            seed,
        } => {
            sweep::run_sweep(max_n, trials, seed)?;
        }
    }
    Ok(())
}
