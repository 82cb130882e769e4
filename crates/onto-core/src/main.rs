use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use onto_core::snapshot::{load_changes, load_graph, load_json, save_graph};
use onto_core::{EditorConfig, OntologyEditor};
use onto_diff::{Improvement, MarkedCollection, PropertyDiff};
use onto_model::NodeId;
use onto_store::InMemoryStore;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

fn graph_arg() -> Arg {
    Arg::new("graph")
        .long("graph")
        .short('g')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("JSON snapshot of node documents")
}

fn out_arg() -> Arg {
    Arg::new("out")
        .long("out")
        .short('o')
        .value_parser(value_parser!(PathBuf))
        .help("Write the updated snapshot here")
}

fn actor_arg() -> Arg {
    Arg::new("actor")
        .long("actor")
        .default_value("")
        .help("Username credited for the change")
}

fn required(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).required(true).help(help)
}

fn cli() -> Command {
    Command::new("onto")
        .version(onto_core::VERSION)
        .about("Inheritance-aware ontology editing over JSON snapshots")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("max-batch")
                .long("max-batch")
                .global(true)
                .value_parser(value_parser!(usize))
                .help("Override the mutation limit per commit"),
        )
        .subcommand(
            Command::new("check")
                .about("Check for specialization cycles and invalid inheritance refs")
                .arg(graph_arg()),
        )
        .subcommand(
            Command::new("repoint")
                .about("Repoint a property to another generalization")
                .arg(graph_arg())
                .arg(required("node", "Node whose inheritance changes"))
                .arg(required("property", "Property name"))
                .arg(required("to", "New generalization id"))
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("link")
                .about("Add a specialization edge and propagate properties")
                .arg(graph_arg())
                .arg(required("generalization", "Generalization id"))
                .arg(required("specialization", "Specialization id"))
                .arg(
                    Arg::new("collection")
                        .long("collection")
                        .default_value(onto_model::MAIN_COLLECTION)
                        .help("Collection on the generalization"),
                )
                .arg(actor_arg())
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("unlink")
                .about("Remove a specialization edge and reconcile inheritance")
                .arg(graph_arg())
                .arg(required("generalization", "Generalization id"))
                .arg(required("specialization", "Specialization id"))
                .arg(actor_arg())
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("diff")
                .about("Compare a node against an improvement")
                .arg(graph_arg())
                .arg(required("node", "Node id"))
                .arg(
                    Arg::new("improvement")
                        .long("improvement")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Improvement JSON"),
                )
                .arg(
                    Arg::new("accept")
                        .long("accept")
                        .action(ArgAction::SetTrue)
                        .help("Apply the improvement and log the changes"),
                )
                .arg(actor_arg())
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("describe")
                .about("Render change-log entries as phrases")
                .arg(
                    Arg::new("log")
                        .long("log")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of change-log entries"),
                ),
        )
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn id(args: &ArgMatches, name: &str) -> NodeId {
    args.get_one::<String>(name).map(String::as_str).unwrap_or_default().into()
}

fn text<'a>(args: &'a ArgMatches, name: &str) -> &'a str {
    args.get_one::<String>(name).map_or("", String::as_str)
}

/// A diff as printed by `diff`, with relationship changes merged for review
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DiffView<'a> {
    #[serde(flatten)]
    diff: &'a PropertyDiff,
    #[serde(skip_serializing_if = "Option::is_none")]
    links: Option<Vec<MarkedCollection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    collections: Option<Vec<MarkedCollection>>,
}

impl<'a> DiffView<'a> {
    fn of(diff: &'a PropertyDiff) -> Self {
        Self {
            diff,
            links: diff.marked_links(),
            collections: diff.marked_order(),
        }
    }
}

struct Session {
    editor: OntologyEditor<InMemoryStore>,
    out: Option<PathBuf>,
}

impl Session {
    fn open(args: &ArgMatches, config: &EditorConfig) -> anyhow::Result<Self> {
        let path = args
            .get_one::<PathBuf>("graph")
            .context("--graph is required")?;
        let graph = load_graph(path).with_context(|| format!("loading {}", path.display()))?;
        let store = Arc::new(
            InMemoryStore::from_graph(graph).with_max_batch_mutations(config.store.max_batch_mutations),
        );
        Ok(Self {
            editor: OntologyEditor::new(store, config.clone()),
            out: args.try_get_one::<PathBuf>("out").ok().flatten().cloned(),
        })
    }

    fn save(&self) -> anyhow::Result<()> {
        if let Some(out) = &self.out {
            save_graph(&self.editor.store().graph(), out)
                .with_context(|| format!("writing {}", out.display()))?;
            tracing::info!(path = %out.display(), "snapshot written");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EditorConfig::from_file(path)?,
        None => EditorConfig::new(),
    };
    if let Some(limit) = matches.get_one::<usize>("max-batch") {
        config = config.with_max_batch_mutations(*limit);
    }
    onto_core::telemetry::init(&config.log_filter);

    match matches.subcommand() {
        Some(("check", args)) => {
            let session = Session::open(args, &config)?;
            let report = session.editor.check().await?;
            print_json(&report)?;
            if !report.is_clean() {
                std::process::exit(1);
            }
        }
        Some(("repoint", args)) => {
            let session = Session::open(args, &config)?;
            let outcome = session
                .editor
                .change_inheritance(&id(args, "node"), text(args, "property"), &id(args, "to"))
                .await?;
            print_json(&outcome)?;
            session.save()?;
        }
        Some(("link", args)) => {
            let session = Session::open(args, &config)?;
            let outcome = session
                .editor
                .link(
                    &id(args, "generalization"),
                    &id(args, "specialization"),
                    text(args, "collection"),
                    text(args, "actor"),
                )
                .await?;
            print_json(&outcome)?;
            session.save()?;
        }
        Some(("unlink", args)) => {
            let session = Session::open(args, &config)?;
            let outcome = session
                .editor
                .unlink(
                    &id(args, "generalization"),
                    &id(args, "specialization"),
                    text(args, "actor"),
                )
                .await?;
            print_json(&outcome)?;
            session.save()?;
        }
        Some(("diff", args)) => {
            let session = Session::open(args, &config)?;
            let path = args
                .get_one::<PathBuf>("improvement")
                .context("--improvement is required")?;
            let improvement: Improvement = load_json(path)?;
            let node = id(args, "node");
            if args.get_flag("accept") {
                let accepted = session
                    .editor
                    .accept_improvement(&node, &improvement, text(args, "actor"))
                    .await?;
                print_json(&accepted)?;
                session.save()?;
            } else {
                let diffs = session.editor.compare(&node, &improvement).await?;
                print_json(&diffs.iter().map(DiffView::of).collect::<Vec<_>>())?;
            }
        }
        Some(("describe", args)) => {
            let path = args.get_one::<PathBuf>("log").context("--log is required")?;
            for change in load_changes(path)? {
                println!(
                    "{} {} {}",
                    change.modified_by,
                    onto_diff::change_description(&change, &change.modified_by),
                    change.node_id
                );
            }
        }
        _ => {}
    }
    Ok(())
}
