use std::{env, fs, process};

use casm::interpreter::Interpreter;
use casm::logging::error;

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <path-to-program.casm> [--max-steps N]", program);
    process::exit(1);
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
    }

    let path = &args[1];
    let max_steps = parse_max_steps(&args).unwrap_or_else(|| usage(&args[0]));

    let source = fs::read_to_string(path).unwrap_or_else(|e| {
        error(format!("failed to read input file: {}", e));
        process::exit(2);
    });
    let lines: Vec<String> = source.lines().map(str::to_string).collect();

    let mut interp = Interpreter::new();
    interp.load(&lines).unwrap_or_else(|e| {
        error(e.to_string());
        process::exit(3);
    });

    let mut steps = 0u64;
    loop {
        if let Some(limit) = max_steps {
            if steps >= limit {
                break;
            }
        }
        match interp.step() {
            Ok(true) => steps += 1,
            Ok(false) => break,
            Err(_) => {
                error(interp.format_error().unwrap_or_default());
                process::exit(4);
            }
        }
    }

    let snapshot = interp.snapshot();
    println!("pc = {}", snapshot.pc);
    for (index, value) in snapshot.registers.iter().enumerate() {
        println!("R{} = {}", index + 1, value);
    }
    for (index, cell) in snapshot.memory.iter().enumerate() {
        if let Some(value) = cell {
            println!("mem[{}] = {}", index * 4, value);
        }
    }
    for (index, cell) in snapshot.storage.iter().enumerate() {
        if let Some(value) = cell {
            println!("storage[{}] = {}", index * 4, value);
        }
    }
}

/// Returns `Some(None)` for no `--max-steps` flag, `Some(Some(n))` when
/// parsed, `None` on a malformed flag (caller should print usage).
fn parse_max_steps(args: &[String]) -> Option<Option<u64>> {
    match args.iter().position(|a| a == "--max-steps") {
        None => Some(None),
        Some(index) => {
            let value = args.get(index + 1)?;
            value.parse::<u64>().ok().map(Some)
        }
    }
}
