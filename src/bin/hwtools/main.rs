//! hwtools CLI - inspect and convert unpacked Halo Wars resources.

use hwtools::prelude::*;
use rayon::prelude::*;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_DATE: &str = env!("HWTOOLS_BUILD_DATE");

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    match filtered_args[0] {
        "c" | "chunks" => {
            let json = filtered_args.contains(&"--json");
            let rest: Vec<&str> = filtered_args[1..].iter().copied().filter(|a| *a != "--json").collect();
            if rest.len() < 2 {
                eprintln!("Error: missing arguments");
                eprintln!("Usage: hwtools-cli chunks <scratch> <resource> [--json]");
                std::process::exit(1);
            }
            cmd_chunks(rest[0], rest[1], json);
        }
        "x" | "convert" => match ConvertArgs::parse(&filtered_args[1..]) {
            Ok(opts) => {
                if !cmd_convert(&opts) {
                    std::process::exit(1);
                }
            }
            Err(msg) => {
                eprintln!("Error: {}", msg);
                eprintln!("Usage: hwtools-cli convert <scratch> <out> <resource>... [--stride N] [--flat|--smooth]");
                std::process::exit(1);
            }
        },
        "h" | "help" | "--help" | "-h" => print_help(),
        "--version" | "-V" => println!("hwtools-cli {} ({})", VERSION, BUILD_DATE),
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            eprintln!("Run 'hwtools-cli help' for usage");
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!("hwtools-cli {} ({}) - Halo Wars resource toolkit", VERSION, BUILD_DATE);
    println!();
    println!("USAGE:");
    println!("    hwtools-cli [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    c, chunks  <scratch> <res> [--json]     List the chunk table of a binary resource");
    println!("    x, convert <scratch> <out> <res>...     Decode resources to PNG / OBJ / MTL");
    println!("    h, help                                 Show this help");
    println!();
    println!("CONVERT OPTIONS:");
    println!("    --stride N       Terrain sampling stride (default 1)");
    println!("    --flat           Recompute flat normals before export");
    println!("    --smooth         Recompute smooth normals before export");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!("    RUST_LOG         Overrides the level flags");
    println!();
    println!("EXAMPLES:");
    println!("    hwtools-cli chunks /tmp/hw art/unit/warthog.ugx");
    println!("    hwtools-cli convert /tmp/hw out scenario/skirmish/design/blood_gulch/blood_gulch.xtd");
    println!("    hwtools-cli convert /tmp/hw out maps/a.xtt maps/a.xtd --stride 4 --smooth");
}

fn cmd_chunks(scratch: &str, rel: &str, json: bool) {
    let ctx = Context::new(scratch);
    let resource = match ctx.resource(rel) {
        Ok(Some(r)) => r,
        Ok(None) => {
            eprintln!("Not a known resource kind: {}", rel);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to open {}: {}", rel, e);
            std::process::exit(1);
        }
    };
    let chunks = match resource.chunks() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to read chunks of {}: {}", resource, e);
            std::process::exit(1);
        }
    };

    if json {
        let records: Vec<serde_json::Value> = chunks
            .records()
            .iter()
            .map(|r| {
                serde_json::json!({
                    "tag": format!("0x{:04X}", r.tag),
                    "type": format!("{:?}", r.kind),
                    "offset": r.offset,
                    "size": r.size,
                })
            })
            .collect();
        let doc = serde_json::json!({
            "resource": resource.path(),
            "kind": resource.kind().to_string(),
            "chunks": records,
        });
        match serde_json::to_string_pretty(&doc) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("JSON error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!("Resource: {}", resource);
    println!("Chunks:   {}", chunks.len());
    println!();
    println!("{:>4}  {:>8}  {:<22}  {:>10}  {:>10}", "#", "tag", "type", "offset", "size");
    for (i, r) in chunks.records().iter().enumerate() {
        println!(
            "{:>4}  {:>8}  {:<22}  {:>10}  {:>10}",
            i,
            format!("0x{:04X}", r.tag),
            format!("{:?}", r.kind),
            r.offset,
            r.size
        );
    }
}

#[derive(Debug)]
struct ConvertArgs {
    scratch: PathBuf,
    out: PathBuf,
    resources: Vec<String>,
    stride: usize,
    normal_mode: NormalMode,
}

impl ConvertArgs {
    fn parse(args: &[&str]) -> std::result::Result<Self, String> {
        let mut stride = TERRAIN_DEFAULT_STRIDE;
        let mut normal_mode = NormalMode::Unchanged;
        let mut positional = Vec::new();

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match *arg {
                "--stride" => {
                    let value = iter.next().ok_or("--stride needs a value")?;
                    stride = value
                        .parse()
                        .map_err(|_| format!("invalid stride: {}", value))?;
                }
                "--flat" => normal_mode = NormalMode::Flat,
                "--smooth" => normal_mode = NormalMode::Smooth,
                other => positional.push(other),
            }
        }
        if positional.len() < 3 {
            return Err("missing arguments".into());
        }
        Ok(Self {
            scratch: PathBuf::from(positional[0]),
            out: PathBuf::from(positional[1]),
            resources: positional[2..].iter().map(|s| s.to_string()).collect(),
            stride,
            normal_mode,
        })
    }
}

/// Convert every listed resource; returns false if any failed.
fn cmd_convert(opts: &ConvertArgs) -> bool {
    let ctx = Context::new(&opts.scratch);
    if let Err(e) = fs::create_dir_all(&opts.out) {
        eprintln!("Failed to create {}: {}", opts.out.display(), e);
        return false;
    }

    let failures: Vec<(String, Error)> = opts
        .resources
        .par_iter()
        .filter_map(|rel| convert_one(&ctx, rel, opts).err().map(|e| (rel.clone(), e)))
        .collect();

    for (rel, e) in &failures {
        eprintln!("FAILED {}: {}", rel, e);
    }
    info!(
        converted = opts.resources.len() - failures.len(),
        failed = failures.len(),
        "conversion finished"
    );
    failures.is_empty()
}

fn convert_one(ctx: &Context, rel: &str, opts: &ConvertArgs) -> Result<()> {
    let resource = ctx
        .resource(rel)?
        .ok_or_else(|| Error::other(format!("not a known resource kind: {}", rel)))?;
    let stem = resource.stem().to_string();
    let out = &opts.out;
    let _span = tracing::info_span!("convert", resource = resource.path()).entered();

    match resource.kind() {
        ResourceKind::Xtt => {
            let albedo = resource.albedo_texture()?;
            save_png(&albedo, &out.join(format!("{}_albedo.png", stem)))?;
        }
        ResourceKind::Xtd => {
            let ao = resource.ambient_occlusion_texture()?;
            save_png(&ao, &out.join(format!("{}_ao.png", stem)))?;
            let opacity = resource.opacity_texture()?;
            save_png(&opacity, &out.join(format!("{}_opacity.png", stem)))?;

            let mut mesh = (*resource.terrain_mesh(opts.stride)?).clone();
            if let Some(material) = mesh.materials.first_mut() {
                material
                    .textures
                    .insert(TextureSlot::Albedo, format!("{}_albedo.png", stem));
            }
            export_mesh(mesh, opts, &out.join(format!("{}_vismesh", stem)))?;
        }
        ResourceKind::Ugx => {
            let mesh = (*resource.mesh()?).clone();
            export_mesh(mesh, opts, &out.join(&stem))?;
            match resource.texture_names() {
                Ok(names) => debug!(textures = ?names, "material textures"),
                Err(e) => warn!(error = %e, "could not read material textures"),
            }
        }
        ResourceKind::Gls => {
            let l = resource.lighting()?;
            println!(
                "{}: sun {:?} color {:?} background {:?}",
                resource.path(),
                l.sun_direction.to_array(),
                l.sun_color,
                l.background_color
            );
        }
        kind => {
            warn!(%kind, "nothing to convert");
        }
    }
    Ok(())
}

fn export_mesh(mut mesh: GenericMesh, opts: &ConvertArgs, path: &Path) -> Result<()> {
    mesh.export_options.normal_mode = opts.normal_mode;
    mesh.export_obj(path)?;
    let bounds = mesh.bounds();
    info!(
        vertices = mesh.num_vertices(),
        min = ?bounds.min.to_array(),
        max = ?bounds.max.to_array(),
        "mesh bounds"
    );
    Ok(())
}

fn save_png(image: &DecodedImage, path: &Path) -> Result<()> {
    image.save(path)?;
    info!(path = %path.display(), width = image.width(), height = image.height(), "wrote texture");
    Ok(())
}
