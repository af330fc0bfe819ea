use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

use atopflux::commands;
use atopflux::core::config::Config;

fn sink_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("InfluxDB host (default: localhost)"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT")
                .help("InfluxDB HTTP port (default: 8086)")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("NAME")
                .help("Database to write into (default: performance)"),
        )
        .arg(
            Arg::new("flush-on-close")
                .long("flush-on-close")
                .help("Write the unterminated last interval when the input ends")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Print line protocol to stdout instead of writing to InfluxDB")
                .action(ArgAction::SetTrue),
        )
}

fn cli() -> Command {
    Command::new("atopflux")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Streams atop performance samples into InfluxDB")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (default: <config dir>/atopflux/config.json)")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            sink_args(
                Command::new("collect")
                    .about("Run atop and store its CPU, load, memory and disk samples"),
            )
            .arg(
                Arg::new("interval")
                    .short('i')
                    .long("interval")
                    .value_name("SECONDS")
                    .help("atop sampling interval (default: 1)")
                    .value_parser(clap::value_parser!(u64).range(1..)),
            )
            .arg(
                Arg::new("atop")
                    .long("atop")
                    .value_name("PATH")
                    .help("Path to the atop binary (default: looked up in PATH)"),
            ),
        )
        .subcommand(
            sink_args(
                Command::new("replay")
                    .about("Feed recorded `atop -P` output through the collector"),
            )
            .arg(
                Arg::new("file")
                    .help("File with atop parseable output (default: stdin)")
                    .index(1),
            ),
        )
        .subcommand(
            Command::new("config")
                .about("Show or change stored settings")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(
                    Command::new("set")
                        .about("Persist a single setting")
                        .arg(
                            Arg::new("key")
                                .help("host, port, database, verbose, interval, atop or flush-on-close")
                                .required(true)
                                .index(1),
                        )
                        .arg(
                            Arg::new("value")
                                .help("New value")
                                .required(true)
                                .index(2),
                        ),
                ),
        )
        .subcommand(Command::new("version").about("Shows version information"))
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    let config_path = matches.get_one::<PathBuf>("config").cloned();

    match matches.subcommand() {
        Some(("collect", sub_matches)) => {
            let config = load_config(sub_matches)?;
            atopflux::init_logging(config.verbose || sub_matches.get_flag("verbose"));
            commands::collect::execute(sub_matches, config)
        }
        Some(("replay", sub_matches)) => {
            let config = load_config(sub_matches)?;
            atopflux::init_logging(config.verbose || sub_matches.get_flag("verbose"));
            commands::replay::execute(sub_matches, config)
        }
        Some(("config", sub_matches)) => {
            let config_path = sub_matches
                .get_one::<PathBuf>("config")
                .cloned()
                .or(config_path);
            commands::config::execute(sub_matches, config_path.as_deref())
        }
        Some(("version", _)) => commands::version::execute(),
        _ => {
            println!("Welcome to atopflux!");
            println!("Use 'atopflux --help' for more information.");
            Ok(())
        }
    }
}
