// Entry point and high-level CLI flow.
//
// - Option [1] loads the payload file (a backend response already on disk)
//   and prints a short summary.
// - Option [2] shapes the loaded payload with every selected shape, exports
//   JSON and CSV per shape and prints a Markdown preview of each chart.
// - `--batch` runs [1] then [2] once and exits.
use clap::Parser;
use once_cell::sync::Lazy;
use serde_json::Value;
use solar_charts::shapes::{self, BUILTIN_SHAPES};
use solar_charts::types::PayloadShape;
use solar_charts::util::format_int;
use solar_charts::{aggregate_payloads, loader, output};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Mutex, PoisonError};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "solar-charts",
    about = "Shape energy report payloads into chart-ready datasets"
)]
struct Args {
    /// Response body saved from the reporting backend.
    #[arg(short, long, default_value = "payload.json")]
    payload: PathBuf,

    /// Payload shape to apply. Repeat to build several charts from one payload.
    #[arg(short, long = "shape", default_value = "monthly-performance-ratio")]
    shapes: Vec<String>,

    /// JSON file with additional shape descriptors.
    #[arg(long)]
    shapes_file: Option<PathBuf>,

    /// Directory for exported JSON and CSV files.
    #[arg(short, long, default_value = "charts")]
    out_dir: PathBuf,

    /// Rows shown in console previews.
    #[arg(long, default_value_t = 3)]
    preview_rows: usize,

    /// Print the built-in shape names and exit.
    #[arg(long, default_value_t = false)]
    list_shapes: bool,

    /// Load and generate once, without the menu.
    #[arg(long, default_value_t = false)]
    batch: bool,
}

// The loaded payload survives between menu actions so charts can be
// regenerated without reading the file again.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { payload: None }));

struct AppState {
    payload: Option<Value>,
}

fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Returns `true` for `Y`, `false` for `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to menu (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        if io::stdin().read_line(&mut buf).unwrap_or(0) == 0 {
            return false;
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load(args: &Args) -> bool {
    match loader::load_payload(&args.payload) {
        Ok(payload) => {
            let top_level = match &payload {
                Value::Object(map) => map.len(),
                Value::Array(rows) => rows.len(),
                _ => 0,
            };
            println!(
                "Loaded {} ({} top-level entries)\n",
                args.payload.display(),
                format_int(top_level)
            );
            APP_STATE
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .payload = Some(payload);
            true
        }
        Err(e) => {
            eprintln!("Failed to load {}: {}\n", args.payload.display(), e);
            false
        }
    }
}

fn handle_generate(args: &Args, custom: &[PayloadShape]) -> bool {
    let payload = APP_STATE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .payload
        .clone();
    let Some(payload) = payload else {
        println!("Error: No payload loaded. Please load a payload first (option 1).\n");
        return false;
    };

    let mut ok = true;
    for name in &args.shapes {
        let shape = match shapes::resolve(name, custom) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{}", e);
                ok = false;
                continue;
            }
        };
        let aggregation = match aggregate_payloads(std::slice::from_ref(&payload), &shape) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("Shape '{}' failed: {}", name, e);
                ok = false;
                continue;
            }
        };
        for chart in &aggregation.charts {
            output::print_preview(chart, args.preview_rows);
        }
        if !aggregation.diagnostics.is_empty() {
            println!(
                "Note: {} records skipped or ambiguous (see {}.diagnostics.json).",
                format_int(aggregation.diagnostics.len()),
                name
            );
        }
        match output::export(&args.out_dir, name, &aggregation) {
            Ok(files) => println!(
                "(Exported {} files to {})\n",
                files.len(),
                args.out_dir.display()
            ),
            Err(e) => {
                eprintln!("Write error: {}", e);
                ok = false;
            }
        }
    }
    ok
}

fn list_shapes() {
    for shape in BUILTIN_SHAPES.iter() {
        println!("{:<32} {}", shape.name, shape.title);
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if args.list_shapes {
        list_shapes();
        return ExitCode::SUCCESS;
    }

    let custom = match &args.shapes_file {
        Some(path) => match shapes::load_shapes(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to read shapes from {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Vec::new(),
    };

    if args.batch {
        let ok = handle_load(&args) && handle_generate(&args, &custom);
        return if ok {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    loop {
        println!("Select an action:");
        println!("[1] Load the payload");
        println!("[2] Generate charts\n");
        match read_choice().as_str() {
            "1" => {
                handle_load(&args);
            }
            "2" => {
                println!();
                handle_generate(&args, &custom);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "" => break,
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
    ExitCode::SUCCESS
}
