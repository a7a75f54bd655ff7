//! The individual rewriting passes. Each pass scans the sequence once and
//! reports whether it changed anything.

use crate::fold::{fold_binary, fold_unary};
use jsa_ir::{Constant, Opcode, Operand, Quadruple};
use rustc_hash::{FxHashMap, FxHashSet};

// ============================================================================
// Constant folding and propagation
// ============================================================================

/// Fold operations on constants and propagate constant temporaries within a
/// basic block. A conditional jump on a truthy constant never jumps and is
/// dropped.
pub fn fold_constants(code: &mut Vec<Quadruple>) -> bool {
    let definitions = temp_definitions(code);
    let mut known: FxHashMap<u32, Constant> = FxHashMap::default();
    let mut changed = false;

    for quad in code.iter_mut() {
        if quad.op == Opcode::Label {
            known.clear();
            continue;
        }

        for slot in [&mut quad.arg1, &mut quad.arg2] {
            slot.rewrite(&mut |operand: &mut Operand| {
                if let Some(value) = operand.as_temp().and_then(|t| known.get(&t)) {
                    *operand = Operand::Const(value.clone());
                    changed = true;
                }
            });
        }

        if let Some(value) = evaluate(quad) {
            quad.op = Opcode::Assign;
            quad.arg1 = Operand::Const(value);
            quad.arg2 = Operand::Empty;
            changed = true;
        }

        if quad.op == Opcode::Assign {
            if let (Some(temp), Some(value)) = (quad.res.as_temp(), quad.arg1.as_const()) {
                if definitions.get(&temp) == Some(&1) {
                    known.insert(temp, value.clone());
                }
            }
        }

        if quad.op.is_terminator() || quad.op == Opcode::JumpIfFalse {
            known.clear();
        }
    }

    let before = code.len();
    code.retain(|q| {
        !(q.op == Opcode::JumpIfFalse && q.arg1.as_const().is_some_and(Constant::is_truthy))
    });
    changed || code.len() != before
}

fn evaluate(quad: &Quadruple) -> Option<Constant> {
    if quad.op.is_binary() {
        fold_binary(quad.op, quad.arg1.as_const()?, quad.arg2.as_const()?)
    } else if quad.op.is_unary() {
        fold_unary(quad.op, quad.arg1.as_const()?)
    } else {
        None
    }
}

/// How many quadruples write each temporary.
fn temp_definitions(code: &[Quadruple]) -> FxHashMap<u32, u32> {
    let mut counts = FxHashMap::default();
    for quad in code {
        if quad.op == Opcode::SetProp {
            continue;
        }
        if let Some(temp) = quad.res.as_temp() {
            *counts.entry(temp).or_insert(0) += 1;
        }
    }
    counts
}

// ============================================================================
// Dead temporaries
// ============================================================================

/// Remove side-effect-free definitions of temporaries nothing reads.
pub fn remove_dead_temps(code: &mut Vec<Quadruple>) -> bool {
    let mut reads: FxHashSet<u32> = FxHashSet::default();
    for quad in code.iter() {
        let mut record = |t: u32| {
            reads.insert(t);
        };
        quad.arg1.for_each_temp(&mut record);
        quad.arg2.for_each_temp(&mut record);
        if quad.op == Opcode::SetProp {
            quad.res.for_each_temp(&mut record);
        }
    }

    let before = code.len();
    code.retain(|q| match q.res.as_temp() {
        Some(temp) if !q.op.has_side_effects() => reads.contains(&temp),
        _ => true,
    });
    code.len() != before
}

// ============================================================================
// Jump chains
// ============================================================================

/// Retarget jumps whose target label is followed by a `GOTO` to that
/// `GOTO`'s destination, transitively.
pub fn collapse_jump_chains(code: &mut [Quadruple]) -> bool {
    let view: &[Quadruple] = code;
    let positions = label_positions(view);
    let updates: Vec<(usize, u32)> = view
        .iter()
        .enumerate()
        .filter_map(|(i, quad)| {
            let target = quad.jump_target()?;
            let last = follow_chain(view, &positions, target);
            (last != target).then_some((i, last))
        })
        .collect();

    let changed = !updates.is_empty();
    for (index, label) in updates {
        if let Some(slot) = code.get_mut(index).and_then(Quadruple::jump_target_mut) {
            *slot = Operand::Label(label);
        }
    }
    changed
}

fn follow_chain(code: &[Quadruple], positions: &FxHashMap<u32, usize>, start: u32) -> u32 {
    let mut current = start;
    let mut seen = FxHashSet::default();
    while seen.insert(current) {
        let Some(&position) = positions.get(&current) else {
            break;
        };
        let next = code[position + 1..]
            .iter()
            .find(|q| q.op != Opcode::Label || q.is_entry_label());
        match next {
            Some(q) if q.op == Opcode::Goto => match q.arg1.as_label() {
                Some(target) if target != current => current = target,
                _ => break,
            },
            _ => break,
        }
    }
    current
}

// ============================================================================
// Unreachable code
// ============================================================================

/// Drop quadruples after a `GOTO`, `RETURN` or `HALT` up to the next label
/// that something jumps to, and jumps to the label that immediately follows.
pub fn eliminate_unreachable(code: &mut Vec<Quadruple>) -> bool {
    let referenced = referenced_labels(code);
    let before = code.len();

    let mut dead = false;
    code.retain(|quad| {
        if is_live_label(quad, &referenced) {
            dead = false;
        }
        if dead {
            return false;
        }
        dead = quad.op.is_terminator();
        true
    });

    let view: &[Quadruple] = code;
    let redundant: FxHashSet<usize> = view
        .iter()
        .enumerate()
        .filter(|&(i, quad)| {
            quad.jump_target().is_some_and(|target| {
                view[i + 1..]
                    .iter()
                    .take_while(|q| q.op == Opcode::Label && !q.is_entry_label())
                    .any(|q| q.defined_label() == Some(target))
            })
        })
        .map(|(i, _)| i)
        .collect();
    if !redundant.is_empty() {
        let mut index = 0;
        code.retain(|_| {
            let keep = !redundant.contains(&index);
            index += 1;
            keep
        });
    }

    code.len() != before
}

fn is_live_label(quad: &Quadruple, referenced: &FxHashSet<u32>) -> bool {
    quad.is_entry_label() || quad.defined_label().is_some_and(|l| referenced.contains(&l))
}

// ============================================================================
// Labels
// ============================================================================

/// Merge runs of consecutive labels into one and drop plain labels nothing
/// references. Entry labels are always kept; a run containing one merges
/// into it.
pub fn merge_labels(code: &mut Vec<Quadruple>) -> bool {
    let referenced = referenced_labels(code);
    let old = std::mem::take(code);
    let before = old.len();
    let mut renames: FxHashMap<u32, u32> = FxHashMap::default();

    let mut i = 0;
    while i < old.len() {
        if old[i].op != Opcode::Label {
            code.push(old[i].clone());
            i += 1;
            continue;
        }
        let end = old[i..]
            .iter()
            .position(|q| q.op != Opcode::Label)
            .map_or(old.len(), |offset| i + offset);
        let run = &old[i..end];

        let survivor = run
            .iter()
            .find(|q| q.is_entry_label())
            .or_else(|| run.iter().find(|q| is_live_label(q, &referenced)))
            .and_then(Quadruple::defined_label);

        for quad in run {
            let Some(label) = quad.defined_label() else {
                continue;
            };
            if quad.is_entry_label() || Some(label) == survivor {
                code.push(quad.clone());
            } else if let Some(survivor) = survivor {
                if referenced.contains(&label) {
                    renames.insert(label, survivor);
                }
            }
        }
        i = end;
    }

    if !renames.is_empty() {
        for quad in code.iter_mut().filter(|q| q.op != Opcode::Label) {
            for slot in [&mut quad.arg1, &mut quad.arg2] {
                if let Some(renamed) = slot.as_label().and_then(|l| renames.get(&l)) {
                    *slot = Operand::Label(*renamed);
                }
            }
        }
    }

    code.len() != before
}

fn label_positions(code: &[Quadruple]) -> FxHashMap<u32, usize> {
    code.iter()
        .enumerate()
        .filter_map(|(i, q)| q.defined_label().map(|l| (l, i)))
        .collect()
}

/// Labels some quadruple refers to, other than by defining them.
fn referenced_labels(code: &[Quadruple]) -> FxHashSet<u32> {
    code.iter().flat_map(Quadruple::referenced_labels).collect()
}
