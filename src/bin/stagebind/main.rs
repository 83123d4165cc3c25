//! stagebind CLI - Tool for inspecting saved scenes.

use std::collections::BTreeMap;
use std::env;
use std::process;

use stagebind::prelude::{Path, Scene, TimeCode, Value};
use stagebind::util::init_logging;
use tracing::{debug, info, trace};

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut filter = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => filter = "debug",
            "-vv" | "--trace" => filter = "trace",
            "-q" | "--quiet" => filter = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(filter);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "info" | "i" => {
            let file = require(&filtered_args, 1, "stagebind info <file>");
            cmd_info(file)
        }
        "tree" | "t" => {
            let file = require(&filtered_args, 1, "stagebind tree <file>");
            cmd_tree(file)
        }
        "dump" | "d" => {
            let file = require(&filtered_args, 1, "stagebind dump <file> <path> [--time t]");
            let path = require(&filtered_args, 2, "stagebind dump <file> <path> [--time t]");
            let time = match parse_time(&filtered_args[3..]) {
                Ok(t) => t,
                Err(msg) => fail(&msg),
            };
            cmd_dump(file, path, time)
        }
        "keys" | "k" => {
            let file = require(&filtered_args, 1, "stagebind keys <file> <attr> [root]");
            let attr = require(&filtered_args, 2, "stagebind keys <file> <attr> [root]");
            let root = filtered_args.get(3).copied().unwrap_or("/");
            cmd_keys(file, attr, root)
        }
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        // A bare scene file is treated as `info`
        other if other.ends_with(".json") || other.ends_with(".gz") => cmd_info(other),
        other => fail(&format!("unknown command '{}'", other)),
    };

    if let Err(e) = result {
        fail(&e.to_string());
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("Error: {}", msg);
    process::exit(1);
}

fn require<'a>(args: &[&'a str], idx: usize, usage: &str) -> &'a str {
    match args.get(idx) {
        Some(a) => a,
        None => {
            eprintln!("Error: missing argument");
            eprintln!("Usage: {}", usage);
            process::exit(1);
        }
    }
}

fn parse_time(rest: &[&str]) -> Result<TimeCode, String> {
    match rest {
        [] => Ok(TimeCode::Default),
        ["--time", t] | ["-t", t] => t
            .parse::<f64>()
            .map(TimeCode::At)
            .map_err(|_| format!("invalid time '{}'", t)),
        _ => Err(format!("unexpected arguments: {}", rest.join(" "))),
    }
}

fn print_help() {
    println!("stagebind - scene inspection toolkit (built {})", env!("STAGEBIND_BUILD_DATE"));
    println!();
    println!("USAGE:");
    println!("    stagebind [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info  <file>                      Show stage metadata and prim counts");
    println!("    t, tree  <file>                      Show full prim hierarchy");
    println!("    d, dump  <file> <path> [--time t]    Dump attribute values of one prim");
    println!("    k, keys  <file> <attr> [root]        List key frames of an attribute");
    println!("    h, help                              Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Errors only");
    println!();
    println!("EXAMPLES:");
    println!("    stagebind info shot.json");
    println!("    stagebind dump shot.json.gz /World/Cube --time 12");
    println!("    stagebind keys shot.json xformOp:transform /World");
    println!();
    println!("NOTES:");
    println!("    - Passing a .json/.json.gz file directly is equivalent to 'info'");
    println!("    - RUST_LOG overrides the verbosity flags");
}

fn open(file: &str) -> stagebind::Result<Scene> {
    info!("Opening scene: {}", file);
    let scene = Scene::open(file)?;
    debug!("Scene opened successfully");
    Ok(scene)
}

fn cmd_info(file: &str) -> stagebind::Result<()> {
    let scene = open(file)?;

    println!("Scene: {}", scene.identifier());
    println!("Up axis:         {:?}", scene.up_axis()?);
    println!("Meters per unit: {}", scene.meters_per_unit()?);
    println!("Frame rate:      {}", scene.frame_rate()?);
    println!("Time range:      {} .. {}", scene.start_time()?, scene.end_time()?);
    println!();

    let paths = scene.all_paths()?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for path in &paths {
        let type_name = scene.prim_type(path)?.unwrap_or_default();
        trace!("Counting {} [{}]", path, type_name);
        let key = if type_name.is_empty() { "(untyped)".to_string() } else { type_name };
        *counts.entry(key).or_default() += 1;
    }

    println!("Prims:");
    for (type_name, count) in &counts {
        println!("  {:<12} {}", type_name, count);
    }
    println!();
    println!("Total prims: {}", paths.len());
    Ok(())
}

fn cmd_tree(file: &str) -> stagebind::Result<()> {
    let scene = open(file)?;
    println!("/");
    for path in scene.all_paths()? {
        let indent = "  ".repeat(path.depth());
        let type_name = scene.prim_type(&path)?.unwrap_or_default();
        if type_name.is_empty() {
            println!("{}{}", indent, path.name());
        } else {
            println!("{}{} [{}]", indent, path.name(), type_name);
        }
    }
    Ok(())
}

fn cmd_dump(file: &str, path: &str, time: TimeCode) -> stagebind::Result<()> {
    let scene = open(file)?;
    let path = Path::parse(path)?;
    let type_name = scene
        .prim_type(&path)?
        .ok_or_else(|| stagebind::Error::NotFound(path.clone()))?;
    scene.set_time(time)?;

    println!("{} [{}] @ {:?}", path, type_name, time);
    for name in scene.attribute_names(&path)? {
        match scene.attribute_value(&path, &name)? {
            Some(value) => println!("  {:<28} {:<10} {}", name, value.type_name(), format_value(&value)),
            None => println!("  {:<28} (no value)", name),
        }
    }
    Ok(())
}

fn cmd_keys(file: &str, attr: &str, root: &str) -> stagebind::Result<()> {
    let scene = open(file)?;
    let keys = scene.compute_key_frames(&Path::parse(root)?, attr)?;
    if keys.is_empty() {
        println!("No key frames for '{}' under {}", attr, root);
    }
    for (path, times) in &keys {
        let times: Vec<String> = times.iter().map(|t| t.to_string()).collect();
        println!("{}: {}", path, times.join(", "));
    }
    Ok(())
}

/// Short form of a value; long arrays are elided.
fn format_value(value: &Value) -> String {
    const MAX_LEN: usize = 8;
    match value.len() {
        Some(n) if n > MAX_LEN => format!("[{} elements]", n),
        _ => match value {
            Value::String(s) | Value::Token(s) => format!("{:?}", s),
            other => serde_json::to_value(other)
                .ok()
                .and_then(|v| v.get("value").map(|inner| inner.to_string()))
                .unwrap_or_default(),
        },
    }
}
