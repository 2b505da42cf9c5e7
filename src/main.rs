use clap::{Args, Parser, Subcommand};
use sciio::{
    FormatTag, Mode, Precision, Registry, RegistryOptions, Scanner, Schema, Value,
};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sciio", about = "Read, write and convert tagged scientific data files")]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalOpts {
    /// Store portable-binary reals as 4-byte floats
    #[arg(long, global = true, conflicts_with = "double")]
    single: bool,
    /// Store portable-binary reals as 8-byte doubles
    #[arg(long, global = true)]
    double: bool,
    /// Annotate text output and report failing items
    #[arg(long, global = true)]
    debug: bool,
    /// Overwrite portable-binary outputs without keeping a backup
    #[arg(long, global = true)]
    no_backup: bool,
    /// Annotation prefix written before each item description in debug mode
    #[arg(long, global = true)]
    comment: Option<String>,
    /// Log registry activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show format tag and family of each path
    Info {
        #[arg(required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },
    /// Print the whitespace tokens of a text file, one per line ("-" for stdin)
    Tokens {
        input: PathBuf,
    },
    /// Read items described by a schema and print them as JSON
    Dump {
        input: PathBuf,
        /// Comma-separated item list, e.g. "int,real,nrvec:10,string"
        #[arg(short, long)]
        schema: Schema,
        /// Repeat the schema until the input ends
        #[arg(short, long)]
        repeat: bool,
    },
    /// Write a JSON array of items to a file of any supported format
    Load {
        input:  PathBuf,
        output: PathBuf,
    },
    /// Re-encode a sequence of items in another format
    Convert {
        input:  PathBuf,
        output: PathBuf,
        #[arg(short, long)]
        schema: Schema,
        #[arg(short, long)]
        repeat: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let level = if cli.opts.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();

    let mut reg = Registry::with_options(registry_options(&cli.opts));
    if let Some(comment) = &cli.opts.comment {
        reg.set_comment(comment.as_str());
    }

    match cli.command {

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            println!("{:<32} {:<6} {:<16} Extension", "Path", "Tag", "Family");
            for path in &input {
                let tag = FormatTag::from_path(path);
                println!("{:<32} {:<6} {:<16} .{}", path.display(), tag, family_label(tag), tag.extension());
            }
        }

        // ── Tokens ───────────────────────────────────────────────────────────
        Commands::Tokens { input } => {
            let mut scanner = Scanner::new();
            let mut src: Box<dyn io::BufRead> = if input.as_os_str() == "-" {
                Box::new(io::stdin().lock())
            } else {
                Box::new(BufReader::new(File::open(&input)?))
            };
            loop {
                match scanner.next_token(&mut *src) {
                    Ok(tok) => println!("{tok}"),
                    Err(e) if e.is_eof() => break,
                    Err(e) => return Err(e.into()),
                }
            }
        }

        // ── Dump ─────────────────────────────────────────────────────────────
        Commands::Dump { input, schema, repeat } => {
            let values = read_items(&mut reg, &input, &schema, repeat)?;
            println!("{}", serde_json::to_string_pretty(&values)?);
        }

        // ── Load ─────────────────────────────────────────────────────────────
        Commands::Load { input, output } => {
            let values: Vec<Value> = serde_json::from_reader(BufReader::new(File::open(&input)?))?;
            write_items(&mut reg, &output, &values)?;
            eprintln!("Wrote {} item(s) to {}", values.len(), output.display());
        }

        // ── Convert ──────────────────────────────────────────────────────────
        Commands::Convert { input, output, schema, repeat } => {
            let values = read_items(&mut reg, &input, &schema, repeat)?;
            write_items(&mut reg, &output, &values)?;
            eprintln!("Converted {} item(s): {} -> {}", values.len(), input.display(), output.display());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn registry_options(opts: &GlobalOpts) -> RegistryOptions {
    let precision = if opts.double {
        Precision::Double
    } else if opts.single {
        Precision::Single
    } else {
        Precision::native()
    };
    RegistryOptions { precision, debug: opts.debug, backups: !opts.no_backup }
}

fn family_label(tag: FormatTag) -> &'static str {
    tag.family().map(|f| f.name()).unwrap_or("-")
}

/// `-` selects the standard streams.
fn target(path: &Path) -> Option<&Path> {
    (path.as_os_str() != "-").then_some(path)
}

fn read_items(reg: &mut Registry, path: &Path, schema: &Schema, repeat: bool) -> sciio::Result<Vec<Value>> {
    let h = reg.open(target(path), Mode::Read)?;
    reg.select(h)?;
    let mut values = Vec::new();
    'frames: loop {
        for (i, spec) in schema.items().iter().enumerate() {
            let desc = format!("item {i}");
            match reg.read_value(spec.kind, spec.count, &desc) {
                Ok(v) => values.push(v),
                // A clean end of input is only allowed at a frame boundary.
                Err(e) if repeat && i == 0 && e.is_eof() => break 'frames,
                Err(e) => return Err(e),
            }
        }
        if !repeat {
            break;
        }
    }
    reg.close(h)?;
    Ok(values)
}

fn write_items(reg: &mut Registry, path: &Path, values: &[Value]) -> sciio::Result<()> {
    let h = reg.open(target(path), Mode::Write)?;
    reg.select(h)?;
    for (i, v) in values.iter().enumerate() {
        reg.write(v.as_item(), &format!("item {i}"))?;
    }
    reg.close(h)
}
