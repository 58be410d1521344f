use clap::Parser;
use miette::{IntoDiagnostic, Result};
use segen_driver::Driver;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "segen")]
#[command(author, version, about = "SWIG-style Cocos script-engine glue generator")]
struct Cli {
    /// Annotated declaration tree (JSON) produced by the front-end
    input: PathBuf,

    /// C++ implementation output (default: the tree's 'outfile' attribute)
    #[arg(short, long)]
    outfile: Option<PathBuf>,

    /// C++ header output (default: the tree's 'outfile_h' attribute)
    #[arg(long)]
    outfile_h: Option<PathBuf>,

    /// Script engine to target
    #[arg(long, default_value = "cocos")]
    engine: String,

    /// Generate information about the origin of code templates
    #[arg(long = "debug-codetemplates")]
    debug_codetemplates: bool,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    let mut driver = Driver::with_engine_name(&cli.engine)
        .into_diagnostic()?
        .debug_templates(cli.debug_codetemplates);

    if let Some(outfile) = cli.outfile {
        driver = driver.outfile(outfile);
    }
    if let Some(outfile_h) = cli.outfile_h {
        driver = driver.outfile_h(outfile_h);
    }

    let module = driver.run_file(&cli.input).into_diagnostic()?;

    if module.warnings > 0 {
        eprintln!("segen: {} warning(s)", module.warnings);
    }

    Ok(())
}
