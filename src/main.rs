use anyhow::Result;
use pnpgen::cli::PnpgenCli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(e) = real_main() {
        eprintln!("pnpgen error: {:#}", e);
        std::process::exit(1);
    }
}

fn real_main() -> Result<()> {
    let cli = PnpgenCli::parse();
    cli.run()
}
