use clap::{Parser, Subcommand};
use randlist::{DecodeOptions, List};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "randlist", about = "Encode and inspect cross-referenced linked lists")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode the 5-node cyclic sample list, read it back and dump it
    Demo {
        #[arg(short, long, default_value = "randlist_demo.dat")]
        output: PathBuf,
    },
    /// Build a list from arguments and encode it
    Pack {
        #[arg(short, long)]
        output: PathBuf,
        /// Node payload, in order (repeatable)
        #[arg(short, long = "node", num_args = 1..)]
        nodes: Vec<String>,
        /// Cross-reference as NODE:TARGET (repeatable)
        #[arg(short, long = "cross", value_parser = parse_cross)]
        cross: Vec<(usize, usize)>,
    },
    /// Decode an encoded list and print it
    Dump {
        input: PathBuf,
        /// Print as JSON instead of one line per node
        #[arg(long)]
        json: bool,
        /// Reject streams declaring more nodes than this
        #[arg(long)]
        max_count: Option<u32>,
        /// Reject payloads declared longer than this many bytes
        #[arg(long)]
        max_payload: Option<u32>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {

        // ── Demo ─────────────────────────────────────────────────────────────
        Commands::Demo { output } => {
            let mut list: List = ["Node1", "Node2", "Node3", "Node4", "Node5"].into_iter().collect();
            for (i, j) in [(0, 2), (1, 4), (2, 0), (3, 3), (4, 1)] {
                list.set_cross(i, j);
            }
            write_list(&list, &output)?;
            let decoded = read_list(&output, &DecodeOptions::default())?;
            println!("Wrote {} node(s) to {}, read back:", list.count(), output.display());
            print!("{decoded}");
        }

        // ── Pack ─────────────────────────────────────────────────────────────
        Commands::Pack { output, nodes, cross } => {
            let mut list: List = nodes.into_iter().collect();
            for (i, j) in cross {
                if !list.set_cross(i, j) {
                    eprintln!("Ignoring cross {i}:{j}, list has {} node(s)", list.count());
                }
            }
            write_list(&list, &output)?;
            println!("Created: {} ({} node(s))", output.display(), list.count());
        }

        // ── Dump ─────────────────────────────────────────────────────────────
        Commands::Dump { input, json, max_count, max_payload } => {
            let options = DecodeOptions { max_count, max_payload_len: max_payload };
            let list = read_list(&input, &options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&list.snapshot())?);
            } else {
                println!("List: {} ({} node(s))", input.display(), list.count());
                print!("{list}");
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn write_list(list: &List, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = BufWriter::new(File::create(path)?);
    list.encode(&mut writer)?;
    writer.flush()?;
    info!(path = %path.display(), count = list.count(), "list written");
    Ok(())
}

fn read_list(path: &Path, options: &DecodeOptions) -> Result<List, Box<dyn std::error::Error>> {
    let mut list = List::new();
    list.decode_with(BufReader::new(File::open(path)?), options)?;
    info!(path = %path.display(), count = list.count(), "list read");
    Ok(list)
}

fn parse_cross(s: &str) -> Result<(usize, usize), String> {
    let (node, target) = s.split_once(':')
        .ok_or_else(|| format!("expected NODE:TARGET, got '{s}'"))?;
    let node   = node.trim().parse().map_err(|e| format!("bad node index '{node}': {e}"))?;
    let target = target.trim().parse().map_err(|e| format!("bad target index '{target}': {e}"))?;
    Ok((node, target))
}
