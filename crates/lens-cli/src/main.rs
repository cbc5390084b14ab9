//! `repolens`: inspect tree listings, render cached diagrams and fetch
//! repository metrics

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

fn cli() -> Command {
    Command::new("repolens")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Derived artifacts for ingested repositories")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(
            Command::new("graph")
                .about("Parse a tree listing and print its graph")
                .arg(
                    Arg::new("tree")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("File holding the tree text"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the full graph as JSON"),
                ),
        )
        .subcommand(
            Command::new("diagram")
                .about("Render a tree listing through the diagram cache")
                .arg(
                    Arg::new("tree")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("File holding the tree text"),
                )
                .arg(Arg::new("owner").long("owner").required(true))
                .arg(Arg::new("repo").long("repo").required(true))
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Cache directory (default from config)"),
                ),
        )
        .subcommand(
            Command::new("metrics")
                .about("Fetch repository metrics from GitHub")
                .arg(
                    Arg::new("repository")
                        .required(true)
                        .help("owner/repo or repository URL"),
                )
                .arg(
                    Arg::new("token")
                        .long("token")
                        .help("GitHub token (default: GITHUB_TOKEN)"),
                ),
        )
}

async fn run(matches: &ArgMatches) -> Result<String> {
    let config = commands::load_config(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    match matches.subcommand() {
        Some(("graph", args)) => {
            let tree = args
                .get_one::<PathBuf>("tree")
                .ok_or_else(|| anyhow::anyhow!("missing tree file"))?;
            commands::graph(tree, args.get_flag("json")).await
        }
        Some(("diagram", args)) => {
            let tree = args
                .get_one::<PathBuf>("tree")
                .ok_or_else(|| anyhow::anyhow!("missing tree file"))?;
            let owner = args
                .get_one::<String>("owner")
                .ok_or_else(|| anyhow::anyhow!("missing --owner"))?;
            let repo = args
                .get_one::<String>("repo")
                .ok_or_else(|| anyhow::anyhow!("missing --repo"))?;
            let dir = args.get_one::<PathBuf>("dir").cloned();
            commands::diagram(tree, owner, repo, dir, &config).await
        }
        Some(("metrics", args)) => {
            let source = args
                .get_one::<String>("repository")
                .ok_or_else(|| anyhow::anyhow!("missing repository"))?;
            let token = args
                .get_one::<String>("token")
                .cloned()
                .or_else(|| std::env::var("GITHUB_TOKEN").ok());
            commands::metrics(source, token).await
        }
        _ => Err(anyhow::anyhow!("unknown command")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let output = run(&matches).await?;
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn diagram_requires_owner_and_repo() {
        let err = cli()
            .try_get_matches_from(["repolens", "diagram", "tree.txt", "--owner", "octo"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn global_config_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["repolens", "graph", "t.txt", "--json", "--config", "lens.toml"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("lens.toml"))
        );
    }
}
