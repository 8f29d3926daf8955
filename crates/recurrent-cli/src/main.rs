//! Recurrent CLI - process a text file chunk by chunk with a language model.

use clap::Parser;
use recurrent_cli::{init_logging, run, Cli, Formatter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let formatter = Formatter::new(cli.format, !cli.no_color);

    match run(&cli).await {
        Ok((mode, output)) => println!("{}", formatter.format_run(mode, &output)),
        Err(e) => {
            eprintln!("{}", formatter.error(&e));
            std::process::exit(e.exit_code());
        }
    }
}
