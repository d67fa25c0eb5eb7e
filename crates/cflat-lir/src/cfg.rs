//! CFG builder (component 4): slices the translation vector into labeled
//! basic blocks and prunes blocks unreachable from the entry block.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{LowerError, Result};
use crate::lower::TvItem;
use crate::types::{BasicBlock, Terminator};

pub fn build_cfg(entry: &str, tv: &[TvItem]) -> Result<BTreeMap<String, BasicBlock>> {
    let mut blocks: BTreeMap<String, BasicBlock> = BTreeMap::new();
    let mut current: Option<String> = None;

    for item in tv {
        match item {
            TvItem::Label(label) => {
                blocks.entry(label.clone()).or_insert_with(|| BasicBlock {
                    label: label.clone(),
                    instructions: Vec::new(),
                    terminator: None,
                });
                current = Some(label.clone());
            }
            TvItem::Inst(inst) => {
                // An instruction with no open current block is dead code
                // following an in-block terminator (e.g. `{ return x; y = 2; }`);
                // it lands nowhere, same as an orphan terminator below.
                if let Some(key) = &current {
                    if let Some(block) = blocks.get_mut(key) {
                        block.instructions.push(inst.clone());
                    }
                }
            }
            TvItem::Term(term) => {
                if let Some(key) = current.take() {
                    if let Some(block) = blocks.get_mut(&key) {
                        if block.terminator.is_none() {
                            block.terminator = Some(term.clone());
                        }
                    }
                }
                // A terminator with no open current block is a redundant jump
                // emitted after a branch that had already terminated (the
                // then-branch-already-returns case); it lands nowhere and is
                // dropped here rather than surviving as a dead block.
            }
        }
    }

    let reachable = reachable_from(entry, &blocks);
    blocks.retain(|label, _| reachable.contains(label));

    for (label, block) in &blocks {
        if block.terminator.is_none() {
            return Err(LowerError::MalformedBlock(label.clone()));
        }
    }

    Ok(blocks)
}

fn reachable_from(entry: &str, blocks: &BTreeMap<String, BasicBlock>) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![entry.to_string()];
    while let Some(label) = stack.pop() {
        if !seen.insert(label.clone()) {
            continue;
        }
        let Some(block) = blocks.get(&label) else { continue };
        match &block.terminator {
            Some(Terminator::Jump(target)) => stack.push(target.clone()),
            Some(Terminator::Branch(_, then_label, else_label)) => {
                stack.push(then_label.clone());
                stack.push(else_label.clone());
            }
            Some(Terminator::Ret(_)) | None => {}
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Instruction;

    #[test]
    fn unreachable_block_after_unconditional_return_is_pruned() {
        let tv = vec![
            TvItem::Label("f_entry".to_string()),
            TvItem::Term(Terminator::Ret(None)),
            TvItem::Term(Terminator::Jump("dead".to_string())),
            TvItem::Label("dead".to_string()),
            TvItem::Term(Terminator::Ret(None)),
        ];
        let blocks = build_cfg("f_entry", &tv).unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks.contains_key("f_entry"));
    }

    #[test]
    fn instruction_after_terminator_is_dropped_as_dead_code() {
        // { return x; y = $copy _const_2; } — the Copy has no open block to
        // land in and must not be silently appended to the entry block.
        let tv = vec![
            TvItem::Label("f_entry".to_string()),
            TvItem::Term(Terminator::Ret(Some("x".to_string()))),
            TvItem::Inst(Instruction::Copy("y".to_string(), "_const_2".to_string())),
        ];
        let blocks = build_cfg("f_entry", &tv).unwrap();
        assert!(blocks["f_entry"].instructions.is_empty());
    }

    #[test]
    fn malformed_block_without_terminator_is_an_error() {
        let tv = vec![
            TvItem::Label("f_entry".to_string()),
            TvItem::Inst(Instruction::Const("_const_1".to_string(), 1)),
        ];
        let err = build_cfg("f_entry", &tv).unwrap_err();
        assert!(matches!(err, LowerError::MalformedBlock(_)));
    }

    #[test]
    fn branch_targets_both_kept_reachable() {
        let tv = vec![
            TvItem::Label("f_entry".to_string()),
            TvItem::Term(Terminator::Branch("g".to_string(), "tt".to_string(), "ff".to_string())),
            TvItem::Label("tt".to_string()),
            TvItem::Term(Terminator::Jump("end".to_string())),
            TvItem::Label("ff".to_string()),
            TvItem::Term(Terminator::Jump("end".to_string())),
            TvItem::Label("end".to_string()),
            TvItem::Term(Terminator::Ret(None)),
        ];
        let blocks = build_cfg("f_entry", &tv).unwrap();
        assert_eq!(blocks.len(), 4);
    }
}
