use anyhow::{anyhow, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use projectpages::build::{build_page, build_site};
use projectpages::catalogue::fetch_catalogue;
use projectpages::config::{Config, Overrides};
use projectpages::fetch::HttpRemote;
use projectpages::paths::BuildMatrix;
use projectpages::project::ProjectId;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let project_dir = Arg::with_name("PROJECT_DIR")
        .help("The directory holding projectpages.yaml (or one of its children)")
        .default_value(".");

    let matches = App::new("projectpages")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds the data for crowd-mapping project pages")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds every project page")
                .arg(project_dir.clone())
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .default_value("_output")
                        .help("The directory pages are written to"),
                )
                .arg(
                    Arg::with_name("threads")
                        .short("j")
                        .long("threads")
                        .takes_value(true)
                        .help("The number of project pages built at once"),
                )
                .arg(
                    Arg::with_name("keep-going")
                        .long("keep-going")
                        .help("Skip project pages that fail instead of aborting"),
                ),
        )
        .subcommand(
            SubCommand::with_name("paths")
                .about("Prints the (project, locale) pairs a build would produce")
                .arg(project_dir.clone()),
        )
        .subcommand(
            SubCommand::with_name("page")
                .about("Builds a single project page and prints its data")
                .arg(
                    Arg::with_name("PROJECT_ID")
                        .required(true)
                        .help("The identifier of the project"),
                )
                .arg(project_dir),
        )
        .get_matches();

    match matches.subcommand() {
        ("build", Some(m)) => {
            let config = load_config(m, overrides(m)?)?;
            let output = PathBuf::from(m.value_of("output").unwrap_or("_output"));
            let report = build_site(&config, &output).await?;
            if !report.omitted.is_empty() {
                eprintln!(
                    "omitted {} project(s): {}",
                    report.omitted.len(),
                    report
                        .omitted
                        .iter()
                        .map(ProjectId::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            Ok(())
        }
        ("paths", Some(m)) => {
            let config = load_config(m, Overrides::default())?;
            let remote = HttpRemote::new(config.request_timeout)?;
            let summaries = fetch_catalogue(&remote, &config.catalogue_url).await?;
            let matrix = BuildMatrix::new(&summaries, &config.locales);
            let pairs: Vec<_> = matrix.pairs().collect();
            println!("{}", serde_json::to_string_pretty(&pairs)?);
            Ok(())
        }
        ("page", Some(m)) => {
            let config = load_config(m, Overrides::default())?;
            let id = ProjectId::new(m.value_of("PROJECT_ID").unwrap_or_default());
            let page = build_page(&config, &id).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
            Ok(())
        }
        (name, _) => Err(anyhow!("unknown subcommand `{}`", name)),
    }
}

fn load_config(m: &ArgMatches, overrides: Overrides) -> Result<Config> {
    let dir = Path::new(m.value_of("PROJECT_DIR").unwrap_or("."));
    Config::from_directory(&std::fs::canonicalize(dir)?, overrides)
}

fn overrides(m: &ArgMatches) -> Result<Overrides> {
    let concurrency = match m.value_of("threads") {
        Some(n) => Some(
            n.parse::<usize>()
                .map_err(|e| anyhow!("invalid `--threads` value `{}`: {}", n, e))?,
        ),
        None => None,
    };
    Ok(Overrides {
        concurrency,
        keep_going: m.is_present("keep-going"),
    })
}
