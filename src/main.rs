//! Entry point for the oceandap tool.
//! Handles CLI parsing and logging setup, then dispatches to the library helpers.

use clap::Parser;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{AlignArgs, Args, Command};
use oceandap::prelude::*;
use oceandap::{align_file, plot};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("oceandap=debug")
    } else {
        EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match args.command {
        Command::Dims { url, keys, vars } => {
            let source = HttpSource::with_timeout(Duration::from_secs(args.timeout))?;
            let sizes = retrieve_dds_info(&source, &url).await?;
            println!("Dimensions: {sizes}");
            println!("Query string: {}", query_string(&sizes, &keys));
            if !vars.is_empty() {
                let dataset_url = url.strip_suffix(".dds").unwrap_or(&url);
                println!("Fetch URL: {}", fetch_url(dataset_url, &vars, &sizes, &keys));
            }
        }
        Command::Fetch { url, year, json } => {
            let dataset = fetch_data(&url, year)?;
            let mut catalog = DataCatalog::new();
            catalog.insert(dataset);
            let table = AttributeTable::from_catalog(&catalog);
            if json {
                println!("{}", table.to_json()?);
            } else {
                table.print();
            }
        }
        Command::Align(align) => run_align(align)?,
        Command::Plot {
            file,
            var,
            output,
            png,
            title,
        } => {
            let path = file.to_string_lossy();
            let dataset = fetch_data(&path, 0)?;
            let variable = dataset.variable(&var)?;
            let title = title.unwrap_or_else(|| var.clone());
            let svg = plot::variable_svg(variable, &title)?;
            std::fs::write(&output, &svg)?;
            println!("✅ Saved plot to {}", output.display());
            if let Some(png) = png {
                plot::render_png(&svg, &png)?;
                println!("✅ Saved PNG to {}", png.display());
            }
        }
        Command::Margin { value, flag } => match apply_margin(value, &flag) {
            Some(v) => println!("{v}"),
            None => println!("Wrong margin flag, must be \"low\" or \"high\"."),
        },
        Command::Reproject { from, to, lat, lon } => {
            let from: Crs = from.parse()?;
            let to: Crs = to.parse()?;
            let (x, y) = reproject(from, to, lat, lon)?;
            println!("x: {x}");
            println!("y: {y}");
        }
    }

    Ok(())
}

fn run_align(args: AlignArgs) -> Result<()> {
    let mode = AlignMode::from_flag(!args.upstream);
    let outcome = align_file(
        &args.file,
        args.year,
        &args.var,
        mode,
        args.state.as_deref(),
        args.output.as_deref(),
    )?;
    println!("File: {}; Var: {}; Outcome: {outcome:?}", args.file.display(), args.var);

    if let Some(output) = &args.output {
        println!("✅ Saved aligned dataset to {}", output.display());
    }
    if let Some(state_path) = &args.state {
        println!("✅ Saved alignment state to {}", state_path.display());
    }
    Ok(())
}
