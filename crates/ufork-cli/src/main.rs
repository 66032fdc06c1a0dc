//! Thin runner for the uFork actor virtual machine (SPEC_FULL.md §0): loads
//! the built-in demo image, runs it to completion (or a tick budget), and
//! prints whatever the demo actor wrote to the console.
//!
//! This binary is the out-of-scope "interactive debugger" / "image
//! production" boundary spec.md §1 names — a convenience wrapped around
//! [`ufork::vm::Runtime`], not part of the VM's own contract.

mod demos;

use anyhow::Context;
use clap::Parser;
use ufork::{clock::SystemClock, console::BufferConsole, Runtime, Settings};
use ufork_interface::{Opcode, StateView, StderrSink, Tracer};

/// Prints a one-line `ip@opcode sp=.. depth=..` trace of every instruction
/// executed, for `--trace`.
struct PrintTracer;

impl Tracer for PrintTracer {
    fn before_instruction(&mut self, opcode: Opcode, state: &dyn StateView) {
        eprintln!(
            "{:>5}  {:<10?} sp={:<5} depth={:<3} self={}",
            state.ip(),
            opcode,
            state.sp(),
            state.stack_depth(),
            state.self_actor(),
        );
    }
}

/// Run the built-in echo-reader demo: it reads from console input and
/// echoes each byte back until end-of-stream.
#[derive(Debug, Parser)]
#[command(name = "ufork", about)]
struct Cli {
    /// Text fed to the demo actor's console input.
    #[arg(long, default_value = "Hello, uFork!")]
    input: String,

    /// Maximum runtime-loop iterations before giving up.
    #[arg(long, default_value_t = 100_000)]
    ticks: usize,

    /// Print a per-instruction trace and heap occupancy after running.
    #[arg(long)]
    trace: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let image = demos::echo_reader();
    let console = Box::new(BufferConsole::with_input(cli.input.into_bytes()));
    let debug = Box::new(StderrSink);
    let clock = Box::new(SystemClock::new());

    let mut runtime = Runtime::new(&image, Settings::default(), console, debug, clock)
        .context("failed to load the demo image")?;
    if cli.trace {
        runtime.set_tracer(Box::new(PrintTracer));
    }
    runtime
        .run_until_idle(cli.ticks)
        .context("runtime loop failed")?;

    let output = runtime
        .console()
        .as_any()
        .downcast_ref::<BufferConsole>()
        .expect("ufork-cli always wires a BufferConsole")
        .output();
    print!("{}", String::from_utf8_lossy(output));

    if cli.trace {
        let stats = runtime.heap_stats();
        eprintln!(
            "heap: {} live / {} capacity ({} free)",
            stats.live_count(),
            stats.capacity,
            stats.free_count
        );
    }

    Ok(())
}
