use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use sole_engine::geom::{Mesh, NoiseKind, NoiseParameters, ScaleParameters, Target, Zone, ZoneSelector};
use sole_engine::io::{read_stl_file, write_stl_file};
use sole_engine::{JsonPresetStore, PresetStore, ShaperConfig, ShaperSession};

const USAGE: &str = r"sole_cli (sole-engine)

USAGE:
  sole_cli signature [shape options]
  sole_cli run [shape options] [--obj <path>] [--stl <path>] [--overwrite]
  sole_cli preset save <name> --store <path> [--noise ..] [--scale ..] [--zone ..] [--target ..]
  sole_cli preset load <name> --store <path>
  sole_cli preset delete <name> --store <path>
  sole_cli preset list --store <path>
  sole_cli preset replay <name> --store <path> [--input <obj>] [--select ..] [--obj <path>] [--stl <path>]

SHAPE OPTIONS:
  --input <path>            Start from an OBJ or STL mesh instead of the built-in sole
  --config <path>           JSON engine configuration (zone layout, tolerance)
  --noise KIND,FREQ,AMP,SEED
                            e.g. SIMPLEX,3.0,0.01,42
  --scale SX,SY,SZ          e.g. 1.10,0.95,1.05
  --zone <FULL|HEEL|MIDFOOT|TOE>
  --target <ALL|SELECTED>
  --select I,J,...          Vertex indices selected in the host (0-based)
  -h, --help                Show this help

ENVIRONMENT:
  SOLE_LOG=<error|warn|info|debug|trace>   Log level on stderr (default: warn)
";

fn main() {
    env_logger::Builder::from_env(log_env()).init();
    if let Err(err) = run() {
        eprintln!("sole_cli error: {err}");
        std::process::exit(1);
    }
}

fn log_env() -> env_logger::Env<'static> {
    env_logger::Env::new().filter_or("SOLE_LOG", "warn")
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut args = Args::new(args);

    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };

    match command.as_str() {
        "signature" => cmd_signature(&mut args),
        "run" => cmd_run(&mut args),
        "preset" => cmd_preset(&mut args),
        "-h" | "--help" | "help" => {
            print_usage();
            Ok(())
        }
        other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
    }
}

fn print_usage() {
    println!("{USAGE}");
}

/// Everything the shaping commands accept.
#[derive(Debug, Default)]
struct ShapeOptions {
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    noise: Option<NoiseParameters>,
    scale: Option<ScaleParameters>,
    zone: Option<Zone>,
    target: Option<Target>,
    selection: BTreeSet<usize>,
    obj: Option<PathBuf>,
    stl: Option<PathBuf>,
    store: Option<PathBuf>,
    overwrite: bool,
    positional: Vec<String>,
}

impl ShapeOptions {
    fn parse(args: &mut Args) -> Result<Option<Self>, String> {
        let mut opts = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--input" => opts.input = Some(PathBuf::from(args.value("--input")?)),
                "--config" => opts.config = Some(PathBuf::from(args.value("--config")?)),
                "--noise" => opts.noise = Some(parse_noise(&args.value("--noise")?)?),
                "--scale" => opts.scale = Some(parse_scale(&args.value("--scale")?)?),
                "--zone" => opts.zone = Some(parse_enum(&args.value("--zone")?)?),
                "--target" => opts.target = Some(parse_enum(&args.value("--target")?)?),
                "--select" => opts.selection = parse_selection(&args.value("--select")?)?,
                "--obj" => opts.obj = Some(PathBuf::from(args.value("--obj")?)),
                "--stl" => opts.stl = Some(PathBuf::from(args.value("--stl")?)),
                "--store" => opts.store = Some(PathBuf::from(args.value("--store")?)),
                "--overwrite" => opts.overwrite = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(None);
                }
                other if other.starts_with("--") => {
                    return Err(format!("unknown option `{other}`\n\n{USAGE}"));
                }
                _ => opts.positional.push(arg),
            }
        }
        Ok(Some(opts))
    }

    fn selector(&self) -> ZoneSelector {
        ZoneSelector::new(
            self.zone.unwrap_or(Zone::Full),
            self.target.unwrap_or(Target::All),
        )
    }

    fn session(&self) -> Result<ShaperSession, String> {
        let config = match self.config.as_deref() {
            Some(path) => ShaperConfig::from_path(path).map_err(|e| format!("config {}: {e}", path.display()))?,
            None => ShaperConfig::default(),
        };
        let mut session = ShaperSession::new(config).map_err(|e| e.to_string())?;
        let loaded = match self.input.as_deref() {
            Some(path) => session.load_mesh(read_mesh_file(path)?),
            None => session.load_default(),
        };
        loaded.map_err(|e| e.to_string())?;
        Ok(session)
    }

    fn store(&self) -> Result<JsonPresetStore, String> {
        let path = self.store.as_deref().ok_or("missing --store <path>")?;
        JsonPresetStore::open(path).map_err(|e| format!("preset store {}: {e}", path.display()))
    }

    fn name(&self) -> Result<&str, String> {
        match self.positional.as_slice() {
            [name] => Ok(name.as_str()),
            [] => Err("missing preset name".to_string()),
            more => Err(format!("expected one preset name, got {}", more.len())),
        }
    }
}

/// Scale first, then noise, matching preset replay.
fn shape(opts: &ShapeOptions) -> Result<ShaperSession, String> {
    let mut session = opts.session()?;
    if let Some(scale) = opts.scale.as_ref() {
        let report = session
            .apply_scale(scale, opts.selector(), &opts.selection)
            .map_err(|e| e.to_string())?;
        eprintln!(
            "scale: {} vertices ({} blended)",
            report.scaling.scaled_count, report.scaling.blended_count
        );
    }
    if let Some(noise) = opts.noise.as_ref() {
        let diag = session.apply_noise(noise).map_err(|e| e.to_string())?;
        eprintln!(
            "noise: {} vertices, offset [{:.6}, {:.6}]",
            diag.vertex_count, diag.min_offset, diag.max_offset
        );
    }
    Ok(session)
}

fn cmd_signature(args: &mut Args) -> Result<(), String> {
    let Some(opts) = ShapeOptions::parse(args)? else {
        return Ok(());
    };
    let session = shape(&opts)?;
    println!("{}", session.signature().map_err(|e| e.to_string())?);
    Ok(())
}

fn cmd_run(args: &mut Args) -> Result<(), String> {
    let Some(opts) = ShapeOptions::parse(args)? else {
        return Ok(());
    };
    let session = shape(&opts)?;
    finish(&session, &opts)
}

fn finish(session: &ShaperSession, opts: &ShapeOptions) -> Result<(), String> {
    let mesh = session.live_mesh().ok_or("no mesh loaded")?;
    if let Some(path) = opts.obj.as_deref() {
        write_obj_file(path, mesh, "SoleShaper", opts.overwrite)?;
        eprintln!("wrote {}", path.display());
    }
    if let Some(path) = opts.stl.as_deref() {
        prepare_output(path, opts.overwrite)?;
        write_stl_file(path, mesh).map_err(|e| format!("write stl {}: {e}", path.display()))?;
        eprintln!("wrote {}", path.display());
    }
    eprintln!(
        "mesh: vertices={} faces={}",
        mesh.vertex_count(),
        mesh.face_count()
    );
    println!("{}", session.signature().map_err(|e| e.to_string())?);
    Ok(())
}

fn cmd_preset(args: &mut Args) -> Result<(), String> {
    let action = args.next().ok_or("missing preset action (save|load|delete|list|replay)")?;
    let Some(opts) = ShapeOptions::parse(args)? else {
        return Ok(());
    };
    let mut store = opts.store()?;
    let session = ShaperSession::default();

    match action.as_str() {
        "save" => {
            let record = session
                .save_preset(
                    &mut store,
                    opts.name()?,
                    opts.noise.unwrap_or_default(),
                    opts.scale.unwrap_or_default(),
                    opts.selector(),
                )
                .map_err(|e| e.to_string())?;
            eprintln!("saved `{}` to {}", record.name, store.path().display());
            Ok(())
        }
        "load" => {
            let record = session
                .load_preset(&store, opts.name()?)
                .map_err(|e| e.to_string())?;
            let json = serde_json::to_string_pretty(&record).map_err(|e| e.to_string())?;
            println!("{json}");
            Ok(())
        }
        "delete" => {
            session
                .delete_preset(&mut store, opts.name()?)
                .map_err(|e| e.to_string())?;
            eprintln!("deleted `{}`", opts.name()?);
            Ok(())
        }
        "list" => {
            for name in store.list() {
                println!("{name}");
            }
            Ok(())
        }
        "replay" => {
            let mut session = opts.session()?;
            session
                .replay_preset(&store, opts.name()?, &opts.selection)
                .map_err(|e| e.to_string())?;
            finish(&session, &opts)
        }
        other => Err(format!("unknown preset action `{other}`\n\n{USAGE}")),
    }
}

fn parse_f64(field: &str, text: &str) -> Result<f64, String> {
    text.trim()
        .parse()
        .map_err(|e| format!("{field}: `{text}` is not a number ({e})"))
}

fn parse_enum<T>(text: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text.parse().map_err(|e: T::Err| e.to_string())
}

fn parse_noise(text: &str) -> Result<NoiseParameters, String> {
    let parts: Vec<&str> = text.split(',').collect();
    let [kind, frequency, amplitude, seed] = parts.as_slice() else {
        return Err(format!("--noise expects KIND,FREQ,AMP,SEED, got `{text}`"));
    };
    let kind: NoiseKind = parse_enum(kind)?;
    let seed: i64 = seed
        .trim()
        .parse()
        .map_err(|e| format!("seed: `{seed}` is not an integer ({e})"))?;
    Ok(NoiseParameters::new(
        kind,
        parse_f64("frequency", frequency)?,
        parse_f64("amplitude", amplitude)?,
        seed,
    ))
}

fn parse_scale(text: &str) -> Result<ScaleParameters, String> {
    let parts: Vec<&str> = text.split(',').collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("--scale expects SX,SY,SZ, got `{text}`"));
    };
    Ok(ScaleParameters::new(
        parse_f64("scale_x", x)?,
        parse_f64("scale_y", y)?,
        parse_f64("scale_z", z)?,
    ))
}

fn parse_selection(text: &str) -> Result<BTreeSet<usize>, String> {
    text.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse()
                .map_err(|e| format!("--select: `{s}` is not a vertex index ({e})"))
        })
        .collect()
}

fn write_obj_file(path: &Path, mesh: &Mesh, name: &str, overwrite: bool) -> Result<(), String> {
    mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;
    prepare_output(path, overwrite)?;

    let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
    let mut w = BufWriter::new(file);
    let err = |e: std::io::Error| format!("write obj: {e}");

    writeln!(w, "# sole-engine sole_cli").map_err(err)?;
    writeln!(w, "o {name}").map_err(err)?;
    for p in &mesh.positions {
        writeln!(w, "v {} {} {}", p[0], p[1], p[2]).map_err(err)?;
    }
    for face in &mesh.faces {
        write!(w, "f").map_err(err)?;
        for &i in face {
            write!(w, " {}", i + 1).map_err(err)?;
        }
        writeln!(w).map_err(err)?;
    }
    w.flush().map_err(err)
}

fn prepare_output(path: &Path, overwrite: bool) -> Result<(), String> {
    if path.exists() && !overwrite {
        return Err(format!(
            "refusing to overwrite existing file {} (use --overwrite)",
            path.display()
        ));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
    }
    Ok(())
}

/// STL by extension, OBJ otherwise.
fn read_mesh_file(path: &Path) -> Result<Mesh, String> {
    let is_stl = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("stl"));
    if is_stl {
        read_stl_file(path).map_err(|e| format!("read {}: {e}", path.display()))
    } else {
        read_obj_file(path)
    }
}

/// Minimal OBJ reader: `v` and `f` records only. Face corners may carry
/// `/vt/vn` suffixes and negative (relative) indices.
fn read_obj_file(path: &Path) -> Result<Mesh, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
    let mut positions = Vec::new();
    let mut faces = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let mut fields = line.split_whitespace();
        let at = |msg: String| format!("{}:{}: {msg}", path.display(), line_no + 1);
        match fields.next() {
            Some("v") => {
                let coords: Vec<f64> = fields
                    .take(3)
                    .map(|f| parse_f64("vertex", f))
                    .collect::<Result<_, _>>()
                    .map_err(at)?;
                let [x, y, z] = coords.as_slice() else {
                    return Err(at("vertex needs three coordinates".to_string()));
                };
                positions.push([*x, *y, *z]);
            }
            Some("f") => {
                let face = fields
                    .map(|corner| obj_index(corner, positions.len()))
                    .collect::<Result<Vec<u32>, String>>()
                    .map_err(at)?;
                faces.push(face);
            }
            _ => {}
        }
    }

    Ok(Mesh::new(positions, faces))
}

fn obj_index(corner: &str, vertex_count: usize) -> Result<u32, String> {
    let head = corner.split('/').next().unwrap_or(corner);
    let raw: i64 = head
        .parse()
        .map_err(|e| format!("bad face index `{corner}` ({e})"))?;
    let index = match raw {
        0 => return Err("face index 0 is not valid in OBJ".to_string()),
        r if r > 0 => r - 1,
        r => i64::try_from(vertex_count).map_err(|e| e.to_string())? + r,
    };
    u32::try_from(index).map_err(|_| format!("face index `{corner}` out of range"))
}

struct Args {
    args: Vec<String>,
    pos: usize,
}

impl Args {
    fn new(args: Vec<String>) -> Self {
        Self { args, pos: 0 }
    }

    fn next(&mut self) -> Option<String> {
        let arg = self.args.get(self.pos)?.clone();
        self.pos += 1;
        Some(arg)
    }

    fn value(&mut self, flag: &str) -> Result<String, String> {
        self.next().ok_or_else(|| format!("missing value for {flag}"))
    }
}
