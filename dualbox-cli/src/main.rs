use std::env;
use std::fs;
use std::io::{self, Read};

use dualbox_core::{
    build_skeleton, check_data, fill, flatten_records, infer_keys, merge_trees, reshape,
    reshape_records, FlattenDepth, GroupKey, GroupNode, KeyCase, ReshapeConfig, DebugVerbosity,
    Schema,
};
use serde_json::Value;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "trace")]
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    run_cli(env::args().collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Reshape,
    Skeleton,
    Fill,
    Check,
}

#[derive(Debug, Default)]
struct CliArgs {
    config: ReshapeConfig,
    data_file: Option<String>,
    schema_file: Option<String>,
    merge_file: Option<String>,
    id_key: Option<String>,
    mode: Option<Mode>,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs, Box<dyn std::error::Error>> {
    let mut parsed = CliArgs::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                parsed.help = true;
            }
            "--schema" => {
                parsed.schema_file = Some(value_for(args, i, "--schema")?);
                i += 1;
            }
            "--group-by" => {
                let keys: Vec<String> = value_for(args, i, "--group-by")?
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(String::from)
                    .collect();
                if keys.is_empty() {
                    return Err("--group-by needs at least one key".into());
                }
                parsed.config.group_by = Some(keys);
                i += 1;
            }
            "--flatten-depth" => {
                let raw = value_for(args, i, "--flatten-depth")?;
                parsed.config.flatten_depth = if raw == "full" {
                    FlattenDepth::Full
                } else {
                    FlattenDepth::Levels(
                        raw.parse::<usize>()
                            .map_err(|_| format!("Invalid value for --flatten-depth: {raw}"))?,
                    )
                };
                i += 1;
            }
            "--merge" => {
                parsed.merge_file = Some(value_for(args, i, "--merge")?);
                i += 1;
            }
            "--id-key" => {
                parsed.id_key = Some(value_for(args, i, "--id-key")?);
                i += 1;
            }
            "--skeleton" => set_mode(&mut parsed, Mode::Skeleton)?,
            "--fill" => set_mode(&mut parsed, Mode::Fill)?,
            "--check" => set_mode(&mut parsed, Mode::Check)?,
            "--lowercase-keys" => {
                parsed.config.key_case = KeyCase::Lowercase;
            }
            "--debug" => {
                parsed.config.debug = true;
            }
            "--verbose" => {
                parsed.config.debug = true;
                parsed.config.verbosity = DebugVerbosity::Verbose;
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {other}").into());
            }
            other => {
                if parsed.data_file.is_some() {
                    return Err(format!("Unexpected argument: {other}").into());
                }
                parsed.data_file = Some(other.to_string());
            }
        }
        i += 1;
    }
    Ok(parsed)
}

fn value_for(args: &[String], i: usize, flag: &str) -> Result<String, String> {
    args.get(i + 1)
        .cloned()
        .ok_or_else(|| format!("Missing value for {flag}"))
}

fn set_mode(parsed: &mut CliArgs, mode: Mode) -> Result<(), String> {
    match parsed.mode {
        Some(existing) if existing != mode => Err(format!(
            "Options {} and {} cannot be combined",
            mode_flag(existing),
            mode_flag(mode)
        )),
        _ => {
            parsed.mode = Some(mode);
            Ok(())
        }
    }
}

fn mode_flag(mode: Mode) -> &'static str {
    match mode {
        Mode::Reshape => "(default)",
        Mode::Skeleton => "--skeleton",
        Mode::Fill => "--fill",
        Mode::Check => "--check",
    }
}

fn read_json(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path).map_err(|e| format!("Failed to read {path}: {e}"))?;
    Ok(serde_json::from_str(&text).map_err(|e| format!("Invalid JSON input in {path}: {e}"))?)
}

fn read_data(path: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    match path {
        Some(path) => read_json(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(serde_json::from_str(&buffer).map_err(|e| format!("Invalid JSON input: {e}"))?)
        }
    }
}

fn run_cli(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_args(&args)?;
    if cli.help {
        print_help();
        return Ok(());
    }
    let config = cli.config.clone();
    let schema = cli.schema_file.as_deref().map(read_json).transpose()?;
    let mode = cli.mode.unwrap_or(Mode::Reshape);

    if mode != Mode::Reshape && cli.merge_file.is_some() {
        return Err(format!("--merge cannot be combined with {}", mode_flag(mode)).into());
    }

    match mode {
        Mode::Skeleton => {
            let schema = schema.ok_or("--skeleton requires --schema")?;
            let parsed = Schema::parse_with_case(&schema, config.key_case)
                .map_err(|e| format!("Invalid schema: {e}"))?;
            let skeleton = build_skeleton(&parsed);
            println!("{}", serde_json::to_string_pretty(&skeleton)?);
            anstream::eprintln!("Built skeleton with {} propert(ies)", skeleton.len());
        }
        Mode::Fill => {
            let schema = schema.ok_or("--fill requires --schema")?;
            let data = read_data(cli.data_file.as_deref())?;
            let filled = fill(data, &schema, &config).map_err(|e| format!("Fill failed: {e}"))?;
            println!("{}", serde_json::to_string_pretty(&filled)?);
            anstream::eprintln!("Filled {} propert(ies)", filled.len());
        }
        Mode::Check => {
            let schema = schema.ok_or("--check requires --schema")?;
            let data = read_data(cli.data_file.as_deref())?;
            match check_data(data, &schema, &config).map_err(|e| format!("Check failed: {e}"))? {
                None => {
                    println!("true");
                    anstream::eprintln!("Data conforms to schema");
                }
                Some(mismatch) => {
                    println!("false");
                    return Err(format!("Data does not conform: {mismatch}").into());
                }
            }
        }
        Mode::Reshape => {
            let data = read_data(cli.data_file.as_deref())?;
            let (tree, id_key) = build_tree(data, schema.as_ref(), &cli)?;
            let tree = match &cli.merge_file {
                Some(path) => {
                    let other: Vec<GroupNode> = serde_json::from_value(read_json(path)?)
                        .map_err(|e| format!("Invalid tree in {path}: {e}"))?;
                    merge_trees(tree, other, &id_key)
                }
                None => tree,
            };
            let leaves: usize = tree.iter().map(|g| g.level2.len()).sum();
            println!("{}", serde_json::to_string_pretty(&tree)?);
            anstream::eprintln!("Built {} group(s) with {} leaf/leaves", tree.len(), leaves);
        }
    }
    Ok(())
}

/// Reshape the data and pick the identifier used for any later merge.
fn build_tree(
    data: Value,
    schema: Option<&Value>,
    cli: &CliArgs,
) -> Result<(Vec<GroupNode>, String), Box<dyn std::error::Error>> {
    let config = &cli.config;
    let explicit_id = cli
        .id_key
        .as_deref()
        .map(|k| config.key_case.apply(k).into_owned());

    match (schema, &config.group_by) {
        (Some(schema), _) => {
            let tree = reshape(data, schema, config).map_err(|e| format!("Reshape failed: {e}"))?;
            let id_key = match (explicit_id, &config.group_by) {
                (Some(id), _) => id,
                (None, Some(keys)) => config.key_case.apply(&keys[0]).into_owned(),
                (None, None) => {
                    let parsed = Schema::parse_with_case(schema, config.key_case)?;
                    infer_keys(&parsed)?.0
                }
            };
            Ok((tree, id_key))
        }
        (None, Some(keys)) => {
            let key = GroupKey::new(keys.iter().map(|k| config.key_case.apply(k).into_owned()));
            let records = flatten_records(data, config.flatten_depth)
                .map_err(|e| format!("Reshape failed: {e}"))?;
            let tree = reshape_records(records, &key, config);
            let id_key = explicit_id.unwrap_or_else(|| key.names()[0].clone());
            Ok((tree, id_key))
        }
        (None, None) => Err("Either --schema or --group-by is required".into()),
    }
}

fn print_help() {
    println!("dualbox - reshape nested records into grouped dual list box trees");
    println!();
    println!("USAGE:");
    println!("    dualbox [OPTIONS] [DATA_FILE]");
    println!();
    println!("ARGS:");
    println!("    <DATA_FILE>    Input JSON data (reads from stdin if not provided)");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help               Print this help message");
    println!("    --schema <FILE>          Schema describing the group and leaf properties");
    println!("    --group-by a,b           Group by these keys instead of the inferred id/name");
    println!("    --flatten-depth <N|full> How many array levels to unwrap (default full)");
    println!("    --skeleton               Print the empty schema skeleton");
    println!("    --fill                   Fill the schema skeleton from the data");
    println!("    --check                  Check the data against the schema; fails on mismatch");
    println!("    --merge <FILE>           Merge an already-built tree into the result");
    println!("    --id-key <KEY>           Group identifier used by --merge (default first key)");
    println!("    --lowercase-keys         Fold every property name to lowercase");
    println!("    --debug                  Print diagnostics to stderr");
    println!("    --verbose                Print per-group diagnostics to stderr");
    println!();
    println!("EXAMPLES:");
    println!("    dualbox --schema schema.json sessions.json");
    println!("    dualbox --group-by idcategory,categoryname sessions.json");
    println!("    dualbox --schema schema.json --merge previous.json sessions.json");
    println!("    cat sessions.json | dualbox --schema schema.json --check");
}
