use clap::Parser;

fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = warden_search::Args::parse();
	warden_search::run(args)
}
