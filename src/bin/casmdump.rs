use std::{env, fs, process};

use casm::logging::error;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <path-to-dump.csv>", args[0]);
        process::exit(1);
    }

    let contents = fs::read_to_string(&args[1]).unwrap_or_else(|e| {
        error(format!("failed to read input file: {}", e));
        process::exit(2);
    });

    for (line_number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_pair(line) {
            Some((word_index, value)) => println!("mem[{}] = {}", word_index * 4, value),
            None => {
                error(format!("malformed dump line {}: '{}'", line_number + 1, line));
                process::exit(3);
            }
        }
    }
}

fn parse_pair(line: &str) -> Option<(usize, String)> {
    let (index_text, value) = line.split_once(',')?;
    let word_index = index_text.trim().parse::<usize>().ok()?;
    Some((word_index, value.trim().to_string()))
}
