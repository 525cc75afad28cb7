use std::path::{Path, PathBuf};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::document_io::{self, TextFile};
use crate::model::config::{OutlineConfig, ValidStates};
use crate::model::node::Node;
use crate::ops::diff::{self, Edit};
use crate::ops::node_ops;
use crate::ops::transition::TransitionHooks;
use crate::parse::{parse_outline, serialize_outline};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Flags shared by every subcommand
struct Global {
    json: bool,
    config: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let global = Global {
        json: cli.json,
        config: cli.config,
    };

    match cli.command {
        // Read commands
        Commands::Show(args) => cmd_show(args, &global),
        Commands::Diff(args) => cmd_diff(args, &global),
        Commands::Check(args) => cmd_check(args, &global),

        // Write commands
        Commands::State(args) => cmd_state(args, &global),
        Commands::Prop(args) => cmd_prop(args, &global),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read a document and the config that applies to it
fn load_document(path: &Path, global: &Global) -> Result<(OutlineConfig, TextFile), Box<dyn std::error::Error>> {
    let start = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    let config = config_io::load_config(global.config.as_deref(), &start)?;
    let file = document_io::read_document(path)?;
    Ok((config, file))
}

fn count_headings(root: &Node) -> usize {
    let mut count = 0;
    node_ops::for_each_heading(root, &mut |_| count += 1);
    count
}

/// Resolve the state argument: "none" clears, anything else must be a
/// configured state.
fn parse_state_arg(arg: &str, states: &ValidStates) -> Result<Option<String>, String> {
    if arg.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    if states.contains(arg) {
        return Ok(Some(arg.to_string()));
    }
    let valid: Vec<&str> = states.iter().collect();
    Err(format!(
        "unknown state: {} (expected one of: {}, none)",
        arg,
        valid.join(", ")
    ))
}

/// Serialize the edited tree, diff it against the file, and apply the
/// edits (unless this is a dry run).
fn write_back(
    file: &mut TextFile,
    root: &Node,
    heading: &str,
    dry_run: bool,
    json: bool,
) -> CmdResult {
    let updated = serialize_outline(root);
    let edits = diff::diff_lines(&file.lines, &updated);
    let written = if dry_run {
        false
    } else {
        document_io::apply_to_file(file, &edits)? > 0
    };

    if json {
        let out = WriteJson {
            file: file.path.display().to_string(),
            heading: heading.to_string(),
            edits,
            written,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if dry_run {
        print_edits(&edits);
    } else if edits.is_empty() {
        println!("{}: unchanged", file.path.display());
    } else {
        println!("{}: {} edit(s)", file.path.display(), edits.len());
    }
    Ok(())
}

fn print_edits(edits: &[Edit]) {
    for edit in edits {
        for line in format_edit(edit) {
            println!("{}", line);
        }
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_show(args: ShowArgs, global: &Global) -> CmdResult {
    let (config, file) = load_document(&args.file, global)?;
    let root = parse_outline(&file.lines, &config.valid_states());

    if global.json {
        let out = DocumentJson {
            file: file.path.display().to_string(),
            headings: count_headings(&root),
            children: visible_children(&root, args.depth)
                .map(|c| node_to_json(c, args.depth))
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for line in format_tree(&root, args.depth) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_diff(args: DiffArgs, global: &Global) -> CmdResult {
    let old = document_io::read_document(&args.old)?;
    let new = document_io::read_document(&args.new)?;
    let edits = diff::diff_lines(&old.lines, &new.lines);

    if global.json {
        println!("{}", serde_json::to_string_pretty(&edits)?);
    } else {
        print_edits(&edits);
    }
    Ok(())
}

fn cmd_check(args: CheckArgs, global: &Global) -> CmdResult {
    let (config, file) = load_document(&args.file, global)?;
    let root = parse_outline(&file.lines, &config.valid_states());
    let edits = diff::diff_lines(&file.lines, &serialize_outline(&root));
    let headings = count_headings(&root);
    let round_trip = edits.is_empty();

    if global.json {
        let out = CheckJson {
            file: file.path.display().to_string(),
            headings,
            round_trip,
            edits,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if round_trip {
        println!("{}: ok ({} headings)", file.path.display(), headings);
    } else {
        print_edits(&edits);
    }

    if round_trip {
        Ok(())
    } else {
        Err(format!(
            "{} does not read back unchanged; property lines must follow content in key order",
            file.path.display()
        )
        .into())
    }
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_state(args: StateArgs, global: &Global) -> CmdResult {
    let (config, mut file) = load_document(&args.file, global)?;
    let states = config.valid_states();
    let new_state = parse_state_arg(&args.state, &states)?;
    let hooks = TransitionHooks::from_config(&config);

    let mut root = parse_outline(&file.lines, &states);
    let node = node_ops::find_heading_by_text_mut(&mut root, &args.heading)
        .ok_or_else(|| format!("heading not found: {}", args.heading))?;
    node_ops::set_state(node, new_state.as_deref(), &hooks)?;
    tracing::info!(heading = %args.heading, state = %args.state, "state set");

    write_back(&mut file, &root, &args.heading, args.dry_run, global.json)
}

fn cmd_prop(args: PropArgs, global: &Global) -> CmdResult {
    let (config, mut file) = load_document(&args.file, global)?;

    let mut root = parse_outline(&file.lines, &config.valid_states());
    let node = node_ops::find_heading_by_text_mut(&mut root, &args.heading)
        .ok_or_else(|| format!("heading not found: {}", args.heading))?;
    node_ops::set_property(node, &args.key, args.value.as_deref())?;
    tracing::info!(heading = %args.heading, key = %args.key, "property updated");

    write_back(&mut file, &root, &args.heading, args.dry_run, global.json)
}
