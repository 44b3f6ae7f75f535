use clap::Parser;
use hebbgrid::{init_logging, GridResult, HopfieldMemory, HopfieldServer, MemoryConfig, ServerConfig};
use log::info;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "hebbgrid",
    about = "Hopfield associative memory over bipolar grids, served over HTTP"
)]
struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    #[arg(short = 'n', long, default_value_t = 35)]
    grid_size: usize, // Side length N; patterns hold N² cells

    #[arg(long, default_value_t = 50)]
    max_iterations: usize,

    #[arg(short, long, default_value_t = 4)]
    workers: usize,

    #[arg(long, default_value_t = 1 << 20)]
    max_body_bytes: usize,

    /// Accept 0-valued cells as literal zeros instead of rejecting them
    #[arg(long)]
    allow_zero_cells: bool,
}

fn main() -> GridResult<()> {
    let args = Cli::parse();
    init_logging();

    let memory_config = MemoryConfig {
        grid_size: args.grid_size,
        max_iterations: args.max_iterations,
        allow_zero_cells: args.allow_zero_cells,
    };
    let server_config = ServerConfig {
        host: args.host,
        port: args.port,
        workers: args.workers,
        max_body_bytes: args.max_body_bytes,
    };

    info!(
        "Starting hebbgrid on {} (grid {}x{}, {} workers)",
        server_config.bind_address(),
        memory_config.grid_size,
        memory_config.grid_size,
        server_config.workers
    );

    let memory = Arc::new(HopfieldMemory::new(memory_config)?);
    let server = HopfieldServer::new(server_config, memory)?;
    server.run()
}
