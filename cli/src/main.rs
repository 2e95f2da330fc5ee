mod commands;
mod terminal;

use commands::{CommandLine, Commands, scan, serve};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose, commands.quiet);

    match commands.command {
        Commands::Scan(args) => {
            print::banner(commands.quiet);
            scan::scan(args, commands.verbose, commands.quiet).await
        }
        Commands::Serve { bind } => {
            print::header("starting status endpoint", commands.quiet);
            serve::serve(bind).await
        }
    }
}
