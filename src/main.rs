// scriptlet: template renderer with a step-by-step trace explorer

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use scriptlet::interpreter::constants::DEFAULT_SNAPSHOT_LIMIT;
use scriptlet::logging::init_logging;
use scriptlet::parser::ast::DocumentNode;
use scriptlet::ui::App;
use scriptlet::{parse, Engine, RequestContext};

/// Render a template to stdout, or step through its execution
#[derive(Parser, Debug)]
#[command(name = "scriptlet", version, about)]
struct Cli {
    /// Template file
    template: PathBuf,

    /// Request parameter (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    params: Vec<(String, String)>,

    /// Persistent parameter (repeatable)
    #[arg(long = "pparam", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    persistent_params: Vec<(String, String)>,

    /// Temporary parameter (repeatable)
    #[arg(long = "tparam", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    temporary_params: Vec<(String, String)>,

    /// Print the parsed template in canonical form instead of running it
    #[arg(long, conflicts_with = "explore")]
    tree: bool,

    /// Record a trace and open the terminal explorer
    #[arg(long)]
    explore: bool,

    /// Memory budget for the explorer's trace
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_SNAPSHOT_LIMIT)]
    snapshot_limit: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, found '{}'", arg))
}

fn seed<W: Write>(mut context: RequestContext<W>, cli: &Cli) -> RequestContext<W> {
    for (name, value) in &cli.params {
        context = context.with_parameter(name.as_str(), value.as_str());
    }
    for (name, value) in &cli.persistent_params {
        context = context.with_persistent_parameter(name.as_str(), value.as_str());
    }
    for (name, value) in &cli.temporary_params {
        context = context.with_temporary_parameter(name.as_str(), value.as_str());
    }
    context
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs would corrupt the alternate screen
    if !cli.explore {
        init_logging(cli.verbose);
    }

    let source = match fs::read_to_string(&cli.template) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", cli.template.display(), e);
            std::process::exit(1);
        }
    };

    let document = match parse(&source) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    info!(
        template = %cli.template.display(),
        nodes = document.node_count(),
        "parsed template"
    );

    if cli.tree {
        print!("{}", document);
        return Ok(());
    }

    if cli.explore {
        return explore(&document, &source, &cli);
    }

    let mut context = seed(RequestContext::new(io::stdout().lock()), &cli);
    let result = Engine::new(&document, &mut context).execute();
    context.flush()?;

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    info!(mime_type = context.mime_type(), "rendered template");
    for (name, value) in context.persistent_parameters() {
        info!(name, value, "persistent parameter");
    }
    for (name, value) in context.temporary_parameters() {
        info!(name, value, "temporary parameter");
    }
    Ok(())
}

fn explore(document: &DocumentNode, source: &str, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut context = seed(RequestContext::new(io::sink()), cli);
    let mut engine = Engine::new(document, &mut context).with_trace(cli.snapshot_limit);
    let error = engine.execute().err().map(|e| e.to_string());
    let Some(history) = engine.into_history() else {
        return Ok(());
    };

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(history, source, error);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
