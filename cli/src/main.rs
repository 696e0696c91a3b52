use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::{Map, Value};

use jaxn_config::{DeletePolicy, Document, ErrorKind, Location, Node, ReduceOptions, Rule};

#[derive(Parser, Debug)]
#[command(name = "jaxnc", version, about = "Config file parser and reducer")]
struct Args {
    /// Input configuration files, processed independently.
    #[arg(required = true, value_name = "file")]
    files: Vec<PathBuf>,

    /// Print the retained parse tree instead of reducing.
    #[arg(long)]
    tree: bool,

    /// Print a JSON summary of the reduced document.
    #[arg(long)]
    json: bool,

    /// What a delete statement removes: the exact entry or its whole subtree.
    #[arg(long = "delete-policy", value_enum, value_name = "policy", default_value_t = DeletePolicyArg::Subtree)]
    delete_policy: DeletePolicyArg,

    /// Refuse include statements instead of resolving them from disk.
    #[arg(long = "no-include")]
    no_include: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DeletePolicyArg {
    Exact,
    Subtree,
}

impl From<DeletePolicyArg> for DeletePolicy {
    fn from(value: DeletePolicyArg) -> Self {
        match value {
            DeletePolicyArg::Exact => DeletePolicy::Exact,
            DeletePolicyArg::Subtree => DeletePolicy::Subtree,
        }
    }
}

struct Failure {
    text: String,
    fatal: bool,
}

impl Failure {
    fn from_error(err: jaxn_config::Error, file: &Path, input: Option<&str>) -> Self {
        let fatal = err.kind == ErrorKind::Invariant;
        let text = match input {
            Some(input) => format!("{}: {}", file.display(), err.render(input)),
            None => format!("{}: {err}", file.display()),
        };
        Failure { text, fatal }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let mut failed = false;
    for file in &args.files {
        match process(file, &args) {
            Ok(output) => print!("{output}"),
            Err(failure) => {
                eprintln!("{}", failure.text);
                if failure.fatal {
                    return ExitCode::from(2);
                }
                failed = true;
            }
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn process(file: &Path, args: &Args) -> Result<String, Failure> {
    let input = fs::read_to_string(file).map_err(|err| Failure {
        text: format!("{}: {err}", file.display()),
        fatal: false,
    })?;
    let root = jaxn_config::parse_str(&input)
        .map_err(|err| Failure::from_error(err, file, Some(&input)))?;

    if args.tree {
        let mut out = String::new();
        render_tree(&root, &input, "", &mut out);
        return Ok(out);
    }

    let mut options = ReduceOptions::new().with_delete(args.delete_policy.into());
    if !args.no_include {
        let base = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        options = options.with_include_base(base);
    }
    let doc = jaxn_config::reduce_with_options(root, &options)
        .map_err(|err| Failure::from_error(err, file, Some(&input)))?;

    if args.json {
        return json_summary(file, &doc)
            .map_err(|err| Failure::from_error(jaxn_config::Error::io(err.to_string()), file, None));
    }

    let mut out = String::new();
    for path in doc.keys() {
        let _ = writeln!(out, "{path}");
    }
    Ok(out)
}

/// One line per retained node: rule name, leaf content, source position.
fn render_tree(node: &Node, input: &str, indent: &str, out: &mut String) {
    match node.rule() {
        None => out.push_str("document\n"),
        Some(rule) => {
            let at = Location::of(input, node.span().start);
            match node.content() {
                Some(content) => {
                    let _ = writeln!(
                        out,
                        "{indent}{} {content:?} at {}:{}",
                        rule.name(),
                        at.line,
                        at.column
                    );
                }
                None => {
                    let _ = writeln!(out, "{indent}{} at {}:{}", rule.name(), at.line, at.column);
                }
            }
        }
    }
    let deeper = format!("{indent}  ");
    for child in node.children() {
        render_tree(child, input, &deeper, out);
    }
}

#[derive(Serialize)]
struct Summary<'a> {
    file: String,
    entries: usize,
    document: &'a Map<String, Value>,
}

fn json_summary(file: &Path, doc: &Document) -> serde_json::Result<String> {
    let mut document = Map::new();
    for (path, value) in doc.iter() {
        document.insert(path.to_string(), value_summary(value));
    }
    let summary = Summary {
        file: file.display().to_string(),
        entries: doc.len(),
        document: &document,
    };
    let mut out = serde_json::to_string_pretty(&summary)?;
    out.push('\n');
    Ok(out)
}

/// Leaves keep their source text; structural values show their kind.
fn value_summary(node: &Node) -> Value {
    match node.content() {
        Some(text) => Value::String(text.to_string()),
        None => {
            let kind = node.rule().map_or("document", Rule::name);
            Value::String(format!("<{kind}>"))
        }
    }
}
