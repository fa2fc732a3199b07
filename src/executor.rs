//! Dispatches the instruction token of one already-lexed line and mutates
//! machine state via the setters in [crate::machine]. Operand parsing is
//! shared across instructions through a handful of combinators
//! (register, comma, label) instead of one bespoke parser per opcode.

use crate::addressing;
use crate::error::{Error, ErrorKind};
use crate::lexer::tokenize_line;
use crate::limits::MAX_LABEL_JUMPS;
use crate::machine::MachineState;
use crate::scanner::Scanner;
use crate::token::TokenKind;

fn expect_register(scanner: &mut Scanner) -> Result<usize, Error> {
    let token = scanner.consume(TokenKind::Register)?;
    let digit = token.text.as_bytes()[1] - b'0';
    let index = digit as usize;
    if (1..=9).contains(&index) {
        Ok(index)
    } else {
        Err(Error::new(
            ErrorKind::RegOutOfRange,
            format!("register '{}' is out of range (only R1..R9 are writable)", token.text),
        ))
    }
}

fn expect_comma(scanner: &mut Scanner) -> Result<(), Error> {
    scanner.consume(TokenKind::Comma)?;
    Ok(())
}

fn expect_label(scanner: &mut Scanner) -> Result<String, Error> {
    let token = scanner.consume(TokenKind::LabelRef)?;
    Ok(token.text.to_string())
}

fn expect_end(scanner: &Scanner) -> Result<(), Error> {
    if scanner.at_end() {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::ParseTrailingTokens,
            "trailing tokens after the instruction's operands".to_string(),
        ))
    }
}

fn resolve_branch_target(state: &mut MachineState, label: &str) -> Result<usize, Error> {
    let target = state
        .label_address(label)
        .ok_or_else(|| Error::new(ErrorKind::UnknownLabel, format!("unknown label '{}'", label)))?;

    if state.num_label_jumps() >= MAX_LABEL_JUMPS {
        return Err(infinite_loop_error(state));
    }
    state.record_branch_evaluation(label);
    Ok(target)
}

fn infinite_loop_error(state: &MachineState) -> Error {
    let mut breakdown: Vec<_> = state.jump_counts().iter().collect();
    breakdown.sort_by(|a, b| a.0.cmp(b.0));
    let breakdown = breakdown
        .into_iter()
        .map(|(label, count)| format!("{}: {}", label, count))
        .collect::<Vec<_>>()
        .join(", ");
    Error::new(
        ErrorKind::PossibleInfiniteLoop,
        format!(
            "possible infinite loop: reached {} label jumps (limit {}). breakdown: {}",
            state.num_label_jumps(),
            MAX_LABEL_JUMPS,
            breakdown
        ),
    )
}

/// Binary signed op used by ADD/SUB/MUL, wrap-on-overflow.
fn binary_op(state: &mut MachineState, x: usize, y: usize, op: fn(i64, i64) -> i64) {
    let result = op(state.register(x), state.register(y));
    state.set_register(x, result);
}

fn div(state: &mut MachineState, x: usize, y: usize) -> Result<(), Error> {
    let a = state.register(x);
    let b = state.register(y);
    if b == 0 {
        return Err(Error::new(ErrorKind::DivByZero, "division by zero".to_string()));
    }
    // a / -1 overflows when a == i64::MIN; wrap like the other arithmetic
    // instead of panicking on the plain operators.
    let (quotient, remainder) = if a == i64::MIN && b == -1 {
        (i64::MIN, 0)
    } else {
        (a / b, a % b)
    };
    // Remainder is written to Ry before the quotient overwrites Rx (§9
    // Open Questions fixes this order).
    state.set_register(y, remainder);
    state.set_register(x, quotient);
    Ok(())
}

fn branch_condition(kind: TokenKind, a: i64, b: i64) -> bool {
    match kind {
        TokenKind::Blt => a < b,
        TokenKind::Bgt => a > b,
        TokenKind::Bleq => a <= b,
        TokenKind::Bgeq => a >= b,
        TokenKind::Beq => a == b,
        TokenKind::Bneq => a != b,
        _ => unreachable!("branch_condition called with a non-conditional-branch token"),
    }
}

/// Execute one already-fetched line. `line` is the raw source text
/// (label prefix included, if any).
pub fn execute_line(state: &mut MachineState, line: &str) -> Result<(), Error> {
    let tokens = tokenize_line(line)?;
    let mut scanner = Scanner::new(&tokens);

    // A preceding label definition was already harvested by the
    // preprocessor; skip it here too, since lines are never rewritten.
    if scanner.check(TokenKind::LabelRef) {
        let mut lookahead = Scanner::new(&tokens);
        lookahead.advance();
        if lookahead.check(TokenKind::Colon) {
            scanner.advance();
            scanner.advance();
        }
    }

    if scanner.at_end() {
        // A line containing only a label definition is a valid no-op.
        return Ok(());
    }

    let instruction = scanner.advance();
    match instruction.kind {
        TokenKind::Load => {
            let x = expect_register(&mut scanner)?;
            expect_comma(&mut scanner)?;
            let value = addressing::load_value(state, &mut scanner)?;
            expect_end(&scanner)?;
            state.set_register(x, value);
        }
        TokenKind::Store => {
            let x = expect_register(&mut scanner)?;
            expect_comma(&mut scanner)?;
            let addr = addressing::store_address(state, &mut scanner)?;
            expect_end(&scanner)?;
            state.set_memory_cell(addr, Some(state.register(x).to_string()));
        }
        TokenKind::Read => {
            let x = expect_register(&mut scanner)?;
            expect_comma(&mut scanner)?;
            let value = addressing::read_value(state, &mut scanner)?;
            expect_end(&scanner)?;
            state.set_register(x, value);
        }
        TokenKind::Write => {
            let x = expect_register(&mut scanner)?;
            expect_comma(&mut scanner)?;
            let addr = addressing::write_address(state, &mut scanner)?;
            expect_end(&scanner)?;
            state.set_storage_cell(addr, Some(state.register(x).to_string()));
        }
        TokenKind::Add => {
            let x = expect_register(&mut scanner)?;
            expect_comma(&mut scanner)?;
            let y = expect_register(&mut scanner)?;
            expect_end(&scanner)?;
            binary_op(state, x, y, i64::wrapping_add);
        }
        TokenKind::Sub => {
            let x = expect_register(&mut scanner)?;
            expect_comma(&mut scanner)?;
            let y = expect_register(&mut scanner)?;
            expect_end(&scanner)?;
            binary_op(state, x, y, i64::wrapping_sub);
        }
        TokenKind::Mul => {
            let x = expect_register(&mut scanner)?;
            expect_comma(&mut scanner)?;
            let y = expect_register(&mut scanner)?;
            expect_end(&scanner)?;
            binary_op(state, x, y, i64::wrapping_mul);
        }
        TokenKind::Div => {
            let x = expect_register(&mut scanner)?;
            expect_comma(&mut scanner)?;
            let y = expect_register(&mut scanner)?;
            expect_end(&scanner)?;
            div(state, x, y)?;
        }
        TokenKind::Inc => {
            let x = expect_register(&mut scanner)?;
            expect_end(&scanner)?;
            let result = state.register(x).wrapping_add(1);
            state.set_register(x, result);
        }
        TokenKind::Br => {
            let label = expect_label(&mut scanner)?;
            expect_end(&scanner)?;
            let target = resolve_branch_target(state, &label)?;
            state.set_pc(target);
        }
        TokenKind::Blt | TokenKind::Bgt | TokenKind::Bleq | TokenKind::Bgeq | TokenKind::Beq | TokenKind::Bneq => {
            let kind = instruction.kind;
            let x = expect_register(&mut scanner)?;
            expect_comma(&mut scanner)?;
            let y = expect_register(&mut scanner)?;
            expect_comma(&mut scanner)?;
            let label = expect_label(&mut scanner)?;
            expect_end(&scanner)?;

            let target = resolve_branch_target(state, &label)?;
            if branch_condition(kind, state.register(x), state.register(y)) {
                state.set_pc(target);
            }
        }
        TokenKind::Halt => {
            expect_end(&scanner)?;
            state.halt();
        }
        _ => {
            return Err(Error::new(
                ErrorKind::ParseUnknownInstruction,
                format!("unknown instruction '{}'", instruction.text),
            ));
        }
    }

    Ok(())
}
