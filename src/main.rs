//! paged – command-line HTML paginator.
//!
//! Usage:
//!   paged <input.html> [output.html] [--landscape] [--config pagination.json]
//!         [--font face.ttf] [--report report.json]
//!
//! If `output.html` is omitted the result is written next to the input file
//! with a `.paged.html` suffix (e.g. `report.html` → `report.paged.html`).
//! Set `RUST_LOG=paged=info` to see the diagnostic log.

use std::{env, fs, path::PathBuf, process};

use paged::dom::parse_html;
use paged::fonts::FontManager;
use paged::layout::TaffyHost;
use paged::paper::PageOrientation;
use paged::pipeline::{PaginationConfig, Paginator, PassOutcome};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut report_path: Option<PathBuf> = None;
    let mut font_paths: Vec<PathBuf> = Vec::new();
    let mut landscape = false;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--landscape" | "-l" => landscape = true,
            "--config" | "-c" => config_path = Some(flag_value(&mut iter, arg, &args[0])),
            "--report" | "-r" => report_path = Some(flag_value(&mut iter, arg, &args[0])),
            "--font" | "-f" => font_paths.push(flag_value(&mut iter, arg, &args[0])),
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no input file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let output = output_path.unwrap_or_else(|| {
        let mut o = input.clone();
        o.set_extension("paged.html");
        o
    });

    let mut config = match &config_path {
        Some(path) => {
            let json = read_or_exit(path);
            match PaginationConfig::from_json(&json) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Error in '{}': {e}", path.display());
                    process::exit(1);
                }
            }
        }
        None => PaginationConfig::default(),
    };
    if landscape {
        config.paper.orientation = PageOrientation::Landscape;
    }

    let mut fonts = FontManager::new();
    for path in &font_paths {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("Error reading '{}': {e}", path.display());
                process::exit(1);
            }
        };
        let family = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Helvetica");
        if let Err(e) = fonts.load_font(family, false, false, bytes) {
            eprintln!("Error loading '{}': {e}", path.display());
            process::exit(1);
        }
    }

    let html = read_or_exit(&input);
    let mut doc = parse_html(&html);
    let paginator = Paginator::with_host(TaffyHost::new(fonts), config);

    let report = match paginator.run(&mut doc) {
        Ok(PassOutcome::Committed(report)) => report,
        Ok(PassOutcome::Superseded) => {
            eprintln!("Error: pass was superseded");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error paginating '{}': {e}", input.display());
            process::exit(1);
        }
    };

    write_or_exit(&output, &doc.to_html());
    if let Some(path) = &report_path {
        match report.to_json() {
            Ok(json) => write_or_exit(path, &json),
            Err(e) => {
                eprintln!("Error serialising report: {e}");
                process::exit(1);
            }
        }
    }

    let pages = report.page_count;
    eprintln!(
        "Wrote '{}' ({} page{}{})",
        output.display(),
        pages,
        if pages == 1 { "" } else { "s" },
        if report.success { "" } else { ", with unsupported layout cases" }
    );
}

fn flag_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str, prog: &str) -> PathBuf {
    match iter.next() {
        Some(v) => PathBuf::from(v),
        None => {
            eprintln!("Missing value for {flag}");
            print_usage(prog);
            process::exit(1);
        }
    }
}

fn read_or_exit(path: &PathBuf) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", path.display());
            process::exit(1);
        }
    }
}

fn write_or_exit(path: &PathBuf, contents: &str) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating output directory: {e}");
                process::exit(1);
            }
        }
    }
    if let Err(e) = fs::write(path, contents) {
        eprintln!("Error writing '{}': {e}", path.display());
        process::exit(1);
    }
}

fn print_usage(prog: &str) {
    eprintln!("paged – split flowing HTML into virtual pages");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <input.html> [output.html] [--landscape] [--config pagination.json] [--font face.ttf] [--report report.json]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <input.html>    HTML file to paginate (images must be base64 data URIs to be measured)");
    eprintln!("  [output.html]   Output path (default: input stem with .paged.html)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --config, -c    PaginationConfig JSON (paper, split, max_attempts)");
    eprintln!("  --font, -f      TTF/OTF face used for text measurement; family = file stem (repeatable)");
    eprintln!("  --report, -r    Write the pass report as JSON");
    eprintln!("  --landscape     Swap paper width and height");
    eprintln!("  --help          Print this message");
}
