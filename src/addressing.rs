//! Parses and evaluates the five addressing modes, exposed through four
//! context-aware entry points. Each computes a single [Addressing]
//! descriptor (an address), with a separate step to dereference it when
//! the calling context wants a value — replacing the duplicated
//! "resolve address" / "resolve value at address" pairs a naive port of
//! the original would have.

use crate::error::{Error, ErrorKind};
use crate::machine::MachineState;
use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};

/// A resolved, in-range, word-aligned address, tagged by which array it
/// points into.
enum Addressing {
    Memory(usize),
    Storage(usize),
}

impl Addressing {
    fn word_index(&self) -> usize {
        match self {
            Addressing::Memory(i) | Addressing::Storage(i) => *i,
        }
    }
}

fn register_index(token: Token) -> Result<usize, Error> {
    // token.text looks like "R3"; index 0 (the program counter) is never
    // a legal operand, only R1..R9 are.
    let digit = token.text.as_bytes()[1] - b'0';
    let index = digit as usize;
    if (1..=9).contains(&index) {
        Ok(index)
    } else {
        Err(Error::new(
            ErrorKind::RegOutOfRange,
            format!("register '{}' is out of range (only R1..R9 are addressable)", token.text),
        ))
    }
}

fn parse_number_literal(token: Token) -> Result<i64, Error> {
    token.text.parse::<i64>().map_err(|_| {
        Error::new(ErrorKind::ParseExpectedToken, format!("'{}' is not a valid number", token.text))
    })
}

fn word_index_from_byte_address(addr: i64, len: usize) -> Result<usize, Error> {
    if addr < 0 {
        return Err(Error::new(ErrorKind::AddrOutOfRange, format!("address {} is negative", addr)));
    }
    if addr % 4 != 0 {
        return Err(Error::new(
            ErrorKind::AddrMisaligned,
            format!("address {} is not a multiple of 4", addr),
        ));
    }
    let word = (addr / 4) as usize;
    if word >= len {
        return Err(Error::new(
            ErrorKind::AddrOutOfRange,
            format!("address {} is out of range (capacity {} words)", addr, len),
        ));
    }
    Ok(word)
}

fn read_memory_value(state: &MachineState, word_index: usize) -> Result<i64, Error> {
    match state.memory_cell(word_index) {
        Some(text) => Ok(text.parse::<i64>().unwrap_or(0)),
        None => Err(Error::new(
            ErrorKind::MemUninitialized,
            format!("read of uninitialized memory cell {}", word_index),
        )),
    }
}

fn read_storage_value(state: &MachineState, word_index: usize) -> Result<i64, Error> {
    match state.storage_cell(word_index) {
        Some(text) => Ok(text.parse::<i64>().unwrap_or(0)),
        None => Err(Error::new(
            ErrorKind::MemUninitialized,
            format!("read of uninitialized storage cell {}", word_index),
        )),
    }
}

/// Direct mode where the register itself holds a destination address:
/// `Rn` evaluated in an address context. `capacity` is the word count of
/// whichever array `into` targets (memory or storage).
fn direct_address(
    state: &MachineState,
    scanner: &mut Scanner,
    into: fn(usize) -> Addressing,
    capacity: usize,
) -> Result<Addressing, Error> {
    let token = scanner.consume(TokenKind::Register)?;
    let index = register_index(token)?;
    let addr = state.register(index);
    let word = word_index_from_byte_address(addr, capacity)?;
    Ok(into(word))
}

/// Indexed mode `[k, Rn]`: address is `k + Rn`. `capacity` is the word
/// count of whichever array `into` targets (memory or storage).
fn indexed_address(
    state: &MachineState,
    scanner: &mut Scanner,
    into: fn(usize) -> Addressing,
    capacity: usize,
) -> Result<Addressing, Error> {
    scanner.consume(TokenKind::LBracket)?;
    let k_token = scanner.consume(TokenKind::Number)?;
    let k = parse_number_literal(k_token)?;
    scanner.consume(TokenKind::Comma)?;
    let reg_token = scanner.consume(TokenKind::Register)?;
    let index = register_index(reg_token)?;
    scanner.consume(TokenKind::RBracket)?;

    let addr = k + state.register(index);
    let word = word_index_from_byte_address(addr, capacity)?;
    Ok(into(word))
}

/// Relative mode `$Rn`: address is `(pc - 1) * 4 + Rn`, i.e. the
/// byte-address of the currently-executing instruction plus the
/// register's value (pc is pre-incremented at fetch). Memory-only.
fn relative_address(state: &MachineState, scanner: &mut Scanner) -> Result<Addressing, Error> {
    scanner.consume(TokenKind::Dollar)?;
    let reg_token = scanner.consume(TokenKind::Register)?;
    let index = register_index(reg_token)?;

    let current_pc_byte_addr = (state.pc() as i64 - 1) * 4;
    let addr = current_pc_byte_addr + state.register(index);
    let word = word_index_from_byte_address(addr, crate::limits::MEMORY_SIZE)?;
    Ok(Addressing::Memory(word))
}

/// Indirect mode `@Rn`: the register holds an address; the value stored
/// there is the result. Memory-only.
fn indirect_value(state: &MachineState, scanner: &mut Scanner) -> Result<i64, Error> {
    scanner.consume(TokenKind::At)?;
    let reg_token = scanner.consume(TokenKind::Register)?;
    let index = register_index(reg_token)?;
    let addr = state.register(index);
    let word = word_index_from_byte_address(addr, crate::limits::MEMORY_SIZE)?;
    read_memory_value(state, word)
}

fn illegal_mode(found: Token) -> Error {
    Error::new(
        ErrorKind::AddrIllegalMode,
        format!("addressing mode starting with '{}' is not legal here", found.text),
    )
}

/// Direct, Immediate, Indexed-value, Indirect-value, Relative-value.
pub fn load_value(state: &MachineState, scanner: &mut Scanner) -> Result<i64, Error> {
    match scanner.peek().kind {
        TokenKind::Register => {
            let token = scanner.advance();
            Ok(state.register(register_index(token)?))
        }
        TokenKind::Equal => {
            scanner.advance();
            let token = scanner.consume(TokenKind::Number)?;
            parse_number_literal(token)
        }
        TokenKind::LBracket => {
            let addr = indexed_address(state, scanner, Addressing::Memory, crate::limits::MEMORY_SIZE)?;
            read_memory_value(state, addr.word_index())
        }
        TokenKind::At => indirect_value(state, scanner),
        TokenKind::Dollar => {
            let addr = relative_address(state, scanner)?;
            read_memory_value(state, addr.word_index())
        }
        _ => Err(illegal_mode(scanner.peek())),
    }
}

/// Direct (register holds address), Indexed-address, Relative-address.
pub fn store_address(state: &MachineState, scanner: &mut Scanner) -> Result<usize, Error> {
    match scanner.peek().kind {
        TokenKind::Register => Ok(direct_address(state, scanner, Addressing::Memory, crate::limits::MEMORY_SIZE)?.word_index()),
        TokenKind::LBracket => Ok(indexed_address(state, scanner, Addressing::Memory, crate::limits::MEMORY_SIZE)?.word_index()),
        TokenKind::Dollar => Ok(relative_address(state, scanner)?.word_index()),
        _ => Err(illegal_mode(scanner.peek())),
    }
}

/// Direct (register holds a storage address), Indexed-value (from
/// storage). Unlike `load_value`'s Direct mode, a bare register here
/// is always dereferenced: there is no indirect (`@Rn`) mode available
/// for storage, so Direct is the only single-register way to name an
/// address, per the `WRITE Rx, Ry` / `READ Rz, Ry` round-trip law.
pub fn read_value(state: &MachineState, scanner: &mut Scanner) -> Result<i64, Error> {
    match scanner.peek().kind {
        TokenKind::Register => {
            let addr = direct_address(state, scanner, Addressing::Storage, crate::limits::STORAGE_SIZE)?;
            read_storage_value(state, addr.word_index())
        }
        TokenKind::LBracket => {
            let addr = indexed_address(state, scanner, Addressing::Storage, crate::limits::STORAGE_SIZE)?;
            read_storage_value(state, addr.word_index())
        }
        _ => Err(illegal_mode(scanner.peek())),
    }
}

/// Direct, Indexed-address.
pub fn write_address(state: &MachineState, scanner: &mut Scanner) -> Result<usize, Error> {
    match scanner.peek().kind {
        TokenKind::Register => Ok(direct_address(state, scanner, Addressing::Storage, crate::limits::STORAGE_SIZE)?.word_index()),
        TokenKind::LBracket => Ok(indexed_address(state, scanner, Addressing::Storage, crate::limits::STORAGE_SIZE)?.word_index()),
        _ => Err(illegal_mode(scanner.peek())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize_line;

    fn scan(line: &str) -> Vec<Token<'_>> {
        tokenize_line(line).unwrap()
    }

    #[test]
    fn direct_mode_reads_register_value() {
        let mut state = MachineState::new();
        state.set_register(1, 42);
        let tokens = scan("R1");
        let mut scanner = Scanner::new(&tokens);
        assert_eq!(load_value(&state, &mut scanner).unwrap(), 42);
    }

    #[test]
    fn immediate_mode_reads_literal() {
        let state = MachineState::new();
        let tokens = scan("=7");
        let mut scanner = Scanner::new(&tokens);
        assert_eq!(load_value(&state, &mut scanner).unwrap(), 7);
    }

    #[test]
    fn indexed_mode_computes_k_plus_register() {
        let mut state = MachineState::new();
        state.set_register(1, 8);
        state.set_memory_cell(20, Some("28".to_string()));
        let tokens = scan("[72, R1]");
        let mut scanner = Scanner::new(&tokens);
        assert_eq!(load_value(&state, &mut scanner).unwrap(), 28);
    }

    #[test]
    fn indirect_mode_dereferences_through_register() {
        let mut state = MachineState::new();
        state.set_register(4, 80);
        state.set_memory_cell(20, Some("21".to_string()));
        let tokens = scan("@R4");
        let mut scanner = Scanner::new(&tokens);
        assert_eq!(load_value(&state, &mut scanner).unwrap(), 21);
    }

    #[test]
    fn relative_mode_uses_current_instruction_address() {
        let mut state = MachineState::new();
        state.set_pc(5); // instruction at word 4 is "current"
        state.set_register(2, 0);
        state.set_memory_cell(4, Some("99".to_string()));
        let tokens = scan("$R2");
        let mut scanner = Scanner::new(&tokens);
        assert_eq!(load_value(&state, &mut scanner).unwrap(), 99);
    }

    #[test]
    fn misaligned_address_is_an_error() {
        let mut state = MachineState::new();
        state.set_register(1, 3);
        let tokens = scan("[0, R1]");
        let mut scanner = Scanner::new(&tokens);
        let err = load_value(&state, &mut scanner).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AddrMisaligned);
    }

    #[test]
    fn out_of_range_address_is_an_error() {
        let mut state = MachineState::new();
        state.set_register(1, 10_000);
        let tokens = scan("R1");
        let mut scanner = Scanner::new(&tokens);
        let err = store_address(&state, &mut scanner).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AddrOutOfRange);
    }

    #[test]
    fn uninitialized_read_is_an_error() {
        let state = MachineState::new();
        let tokens = scan("[0, R1]");
        let mut scanner = Scanner::new(&tokens);
        let err = load_value(&state, &mut scanner).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MemUninitialized);
    }

    #[test]
    fn immediate_is_illegal_in_store_context() {
        let state = MachineState::new();
        let tokens = scan("=5");
        let mut scanner = Scanner::new(&tokens);
        let err = store_address(&state, &mut scanner).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AddrIllegalMode);
    }

    #[test]
    fn read_value_direct_mode_dereferences_storage() {
        let mut state = MachineState::new();
        state.set_register(2, 8);
        state.set_storage_cell(2, Some("77".to_string()));
        let tokens = scan("R2");
        let mut scanner = Scanner::new(&tokens);
        assert_eq!(read_value(&state, &mut scanner).unwrap(), 77);
    }

    #[test]
    fn r0_is_not_addressable() {
        let state = MachineState::new();
        let tokens = scan("R0");
        let mut scanner = Scanner::new(&tokens);
        let err = load_value(&state, &mut scanner).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RegOutOfRange);
    }
}
