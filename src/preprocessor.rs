//! Walks the full program once, harvesting `LABEL:` definitions into a
//! name -> line-index table. Lines are left untouched; the Executor
//! re-lexes each line at execution time and skips the same
//! `LABEL_REF COLON` pair.

use std::collections::HashMap;

use crate::error::{Error, ErrorKind};
use crate::lexer::tokenize_line;
use crate::limits::MAX_LABELS;
use crate::token::TokenKind;

pub type LabelTable = HashMap<String, usize>;

pub fn preprocess(lines: &[String]) -> Result<LabelTable, Error> {
    let mut labels = LabelTable::new();

    for (index, line) in lines.iter().enumerate() {
        let tokens = tokenize_line(line)?;
        let is_label_def = tokens
            .get(0)
            .map(|t| t.kind == TokenKind::LabelRef)
            .unwrap_or(false)
            && tokens
                .get(1)
                .map(|t| t.kind == TokenKind::Colon)
                .unwrap_or(false);

        if !is_label_def {
            continue;
        }

        let name = tokens[0].text.to_string();
        if labels.contains_key(&name) {
            return Err(Error::new(
                ErrorKind::PreprocessDuplicateLabel,
                format!("duplicate label '{}' at line {}", name, index),
            ));
        }
        if labels.len() >= MAX_LABELS {
            return Err(Error::new(
                ErrorKind::PreprocessTooManyLabels,
                format!("too many labels (limit {})", MAX_LABELS),
            ));
        }
        labels.insert(name, index);
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &[&str]) -> Vec<String> {
        src.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn harvests_labels() {
        let labels = preprocess(&lines(&[
            "LOAD R1, =0",
            "Label: BR Label",
            "End: HALT",
        ]))
        .unwrap();
        assert_eq!(labels.get("Label"), Some(&1));
        assert_eq!(labels.get("End"), Some(&2));
    }

    #[test]
    fn label_only_line_is_a_valid_no_op_address() {
        let labels = preprocess(&lines(&["Start:", "HALT"])).unwrap();
        assert_eq!(labels.get("Start"), Some(&0));
    }

    #[test]
    fn rejects_duplicate_labels() {
        let err = preprocess(&lines(&["A: HALT", "A: HALT"])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PreprocessDuplicateLabel);
    }

    #[test]
    fn rejects_label_table_overflow() {
        let src: Vec<String> = (0..MAX_LABELS + 1)
            .map(|i| format!("L{}: HALT", i))
            .collect();
        let err = preprocess(&src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PreprocessTooManyLabels);
    }

    #[test]
    fn labels_are_case_sensitive() {
        let labels = preprocess(&lines(&["loop: HALT", "Loop: HALT"])).unwrap();
        assert_eq!(labels.len(), 2);
    }
}
