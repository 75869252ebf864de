use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = copyllm::cli::Cli::parse();
    copyllm::init(cli.verbosity());
    copyllm::cli::run(cli)
}
