//! forge – command-line proposal → HTML generator.
//!
//! Usage:
//!   forge <fields.json> [output.html] [--config cfg.json] [--landscape]
//!         [--title "My Proposal"] [--layout-json]
//!
//! If `output.html` is omitted the document is written next to the input file
//! with the same stem (e.g. `acme.json` → `acme.html`). With `--layout-json`
//! the paginated layout is written instead (`acme.layout.json`).

use std::{env, fs, path::Path, path::PathBuf, process};

use proposal_forge::fields::ProposalFields;
use proposal_forge::model::PageOrientation;
use proposal_forge::pipeline::{compute_page_layout, generate_html, PipelineConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut landscape = false;
    let mut layout_json = false;
    let mut title: Option<String> = None;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1).peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--landscape" | "-l" => landscape = true,
            "--layout-json" => layout_json = true,
            "--title" | "-t" => match iter.next() {
                Some(v) => title = Some(v.clone()),
                None => fail_usage(&args[0], "--title needs a value"),
            },
            "--config" | "-c" => match iter.next() {
                Some(v) => config_path = Some(PathBuf::from(v)),
                None => fail_usage(&args[0], "--config needs a path"),
            },
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                fail_usage(&args[0], &format!("Unknown flag: {other}"));
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    fail_usage(&args[0], &format!("Unexpected argument: {path}"));
                }
                positional += 1;
            }
        }
    }

    let input = match input_path {
        Some(p) => p,
        None => fail_usage(&args[0], "Error: no input file specified."),
    };

    let output = output_path.unwrap_or_else(|| {
        let mut o = input.clone();
        o.set_extension(if layout_json { "layout.json" } else { "html" });
        o
    });

    let mut config = match &config_path {
        Some(path) => PipelineConfig::from_file(path).unwrap_or_else(|e| {
            eprintln!("Error reading config '{}': {e}", path.display());
            process::exit(1);
        }),
        None => PipelineConfig::default(),
    };
    if landscape {
        config.orientation = PageOrientation::Landscape;
    }
    if title.is_some() {
        config.title = title;
    }

    let fields = match fs::read_to_string(&input)
        .map_err(proposal_forge::Error::from)
        .and_then(|json| ProposalFields::from_json(&json))
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };

    let (body, pages) = if layout_json {
        if let Err(e) = config.validate() {
            eprintln!("Error: {e}");
            process::exit(1);
        }
        let layout = compute_page_layout(&fields, &config);
        (layout.to_json(), layout.page_count)
    } else {
        match generate_html(&fields, &config) {
            Ok((html, rendered)) => (html, rendered.meta.page_count),
            Err(e) => {
                eprintln!("Error generating document: {e}");
                process::exit(1);
            }
        }
    };

    write_output(&output, &body);
    eprintln!(
        "Wrote '{}' ({} bytes, {} page{})",
        output.display(),
        body.len(),
        pages,
        if pages == 1 { "" } else { "s" }
    );
}

fn write_output(output: &Path, body: &str) {
    // Create output directory if necessary.
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating output directory: {e}");
                process::exit(1);
            }
        }
    }
    if let Err(e) = fs::write(output, body) {
        eprintln!("Error writing '{}': {e}", output.display());
        process::exit(1);
    }
}

fn fail_usage(prog: &str, msg: &str) -> ! {
    eprintln!("{msg}");
    print_usage(prog);
    process::exit(1);
}

fn print_usage(prog: &str) {
    eprintln!("forge – proposal document generator (proposal-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <fields.json> [output.html] [--config cfg.json] [--landscape] [--title \"My Proposal\"] [--layout-json]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <fields.json>  Proposal fields record (clientName, projectTitle, scopeOfWork, ...)");
    eprintln!("  [output.html]  Output path  (default: same stem as input with .html)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --config, -c   Pipeline config JSON (pageWidth, pageHeight, orientation, title, timestamp)");
    eprintln!("  --title, -t    Document <title> (default: project title)");
    eprintln!("  --landscape    Use landscape page orientation (1123×794 px)");
    eprintln!("  --layout-json  Write the paginated layout as JSON instead of HTML");
    eprintln!("  --help         Print this message");
}
