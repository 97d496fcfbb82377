use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use listweave_config::{Config, ListKind};
use listweave_engine::editing::{
    Document, ListCmd, lift_list_item, sink_list_item, split_list_item, wrap_in_list,
};
use listweave_model::{AttrValue, Attrs, NodeType, Schema};
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "listweave")]
#[command(about = "Apply a list command to a document written in notation", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.config/listweave/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output, including why a command did not apply
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Wrap the selected blocks in a list
    Wrap {
        /// Kind of list to create (default from config)
        #[arg(long, value_enum)]
        list: Option<ListArg>,

        /// Number of the first item of an ordered list
        #[arg(long)]
        order: Option<i64>,

        #[command(flatten)]
        input: InputArgs,
    },
    /// Split the list item at the cursor
    Split(InputArgs),
    /// Lift the selected list items out one level
    Lift(InputArgs),
    /// Sink the selected list items into the item above
    Sink(InputArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Only report whether the command applies
    #[arg(long)]
    dry_run: bool,

    /// Document in notation with <a> and <b> marking the selection, or - for stdin
    doc: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ListArg {
    Bullet,
    Ordered,
}

impl From<ListArg> for ListKind {
    fn from(arg: ListArg) -> Self {
        match arg {
            ListArg::Bullet => ListKind::Bullet,
            ListArg::Ordered => ListKind::Ordered,
        }
    }
}

impl Commands {
    fn input(&self) -> &InputArgs {
        match self {
            Commands::Wrap { input, .. } => input,
            Commands::Split(input) | Commands::Lift(input) | Commands::Sink(input) => input,
        }
    }

    fn to_cmd(&self, schema: &Schema, config: &Config) -> Result<ListCmd> {
        let item = node_type(schema, "list_item")?;
        Ok(match self {
            Commands::Wrap { list, order, .. } => {
                let kind = list.map(ListKind::from).unwrap_or(config.commands.default_list);
                let attrs = match (kind, order) {
                    (_, None) => None,
                    (ListKind::Ordered, Some(order)) => {
                        Some(Attrs::from([("order".to_string(), AttrValue::Int(*order))]))
                    }
                    (ListKind::Bullet, Some(_)) => bail!("--order only applies to ordered lists"),
                };
                wrap_in_list(node_type(schema, kind.type_name())?, attrs)
            }
            Commands::Split(_) => split_list_item(item, None),
            Commands::Lift(_) => lift_list_item(item),
            Commands::Sink(_) => sink_list_item(item),
        })
    }
}

fn node_type(schema: &Schema, name: &str) -> Result<NodeType> {
    schema
        .node_type(name)
        .with_context(|| format!("schema has no {name} node type"))
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::load()?.unwrap_or_default());
    };
    let path = Config::expand_path(path).unwrap_or_else(|| path.clone());
    match Config::load_from_path(&path)? {
        Some(config) => Ok(config),
        None => bail!("config file {} not found", path.display()),
    }
}

/// Run `command` on `source` and describe the outcome.
fn execute(command: &Commands, config: &Config, source: &str) -> Result<String> {
    let schema = config.schema.build_schema()?;
    let cmd = command.to_cmd(&schema, config)?;
    let mut doc = Document::from_notation(&schema, source.trim()).context("Failed to read document")?;

    if command.input().dry_run {
        let applies = doc.can_apply(&cmd)?;
        return Ok(if applies { "applies" } else { "not applicable" }.to_string());
    }

    match doc.apply(&cmd)? {
        Some(patch) => {
            log::info!(
                "{} changed {} range(s), selection now {:?}",
                cmd.name(),
                patch.changed.len(),
                patch.new_selection
            );
            Ok(doc.to_notation())
        }
        None => Ok("not applicable".to_string()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let config = load_config(cli.config.as_ref())?;
    log::debug!("Config: {config:?}");

    let input = cli.command.input();
    let source = if input.doc == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read document from stdin")?;
        source
    } else {
        input.doc.clone()
    };

    println!("{}", execute(&cli.command, &config, &source)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn run(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("listweave").chain(args.iter().copied()))?;
        execute(&cli.command, &Config::default(), &cli.command.input().doc)
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_wrap_defaults_to_bullet_list() {
        let out = run(&["wrap", r#"doc(p("<a>foo"))"#]).unwrap();
        assert_snapshot!(out, @r#"doc(bullet_list(list_item(paragraph("<a>foo"))))"#);
    }

    #[test]
    fn test_wrap_ordered_with_start() {
        let out = run(&["wrap", "--list", "ordered", "--order", "4", r#"doc(p("<a>foo"))"#]).unwrap();
        assert_snapshot!(out, @r#"doc(ordered_list[order=4](list_item(paragraph("<a>foo"))))"#);
    }

    #[test]
    fn test_wrap_uses_configured_default_list() {
        let mut config = Config::default();
        config.commands.default_list = ListKind::Ordered;
        let cli = Cli::try_parse_from(["listweave", "wrap", r#"doc(p("<a>foo"))"#]).unwrap();
        let out = execute(&cli.command, &config, &cli.command.input().doc).unwrap();
        assert_eq!(out, r#"doc(ordered_list(list_item(paragraph("<a>foo"))))"#);
    }

    #[test]
    fn test_order_on_bullet_list_is_an_error() {
        let err = run(&["wrap", "--order", "2", r#"doc(p("<a>foo"))"#]).unwrap_err();
        assert_eq!(err.to_string(), "--order only applies to ordered lists");
    }

    #[rstest]
    #[case(&["split", r#"doc(ul(li(p("foo<a>bar"))))"#], r#"doc(bullet_list(list_item(paragraph("foo")), list_item(paragraph("<a>bar"))))"#)]
    #[case(&["lift", r#"doc(ul(li(p("a<a>"))))"#], r#"doc(paragraph("a<a>"))"#)]
    #[case(&["sink", r#"doc(ul(li(p("a")), li(p("<a>b"))))"#], r#"doc(bullet_list(list_item(paragraph("a"), bullet_list(list_item(paragraph("<a>b"))))))"#)]
    #[case(&["sink", r#"doc(ul(li(p("<a>a"))))"#], "not applicable")]
    #[case(&["split", "--dry-run", r#"doc(p("a<a>b"))"#], "not applicable")]
    #[case(&["lift", "--dry-run", r#"doc(ul(li(p("a<a>"))))"#], "applies")]
    fn test_commands(#[case] args: &[&str], #[case] expected: &str) {
        assert_eq!(run(args).unwrap(), expected);
    }

    #[test]
    fn test_bad_document_is_an_error() {
        let err = run(&["split", "doc(p(\"unclosed"]).unwrap_err();
        assert!(err.to_string().contains("Failed to read document"));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let path = PathBuf::from("/nonexistent/listweave/config.toml");
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
