//! The optimizer pipeline's three passes (§3, §4.4): Pass 0 (stub), Pass 1
//! (fixed-point local peephole), Pass 2 (finalize).

use std::collections::HashMap;

use poff::reloc::{finalize_relocations, Relocation, RelocationTracker};
use poff::{DOp, LogicalOp, Opcode};

use crate::error::{Error, Result};
use crate::fold::{self, IdentityRewrite};
use crate::window::pointer_list;

/// One decoded opcode plus the offset it was decoded from, in whichever
/// coordinate space the current pass is working in (§4.3: each pass has its
/// own output offset space, paired with the next pass's input by
/// [`RelocationTracker`]).
#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub op: Opcode,
    pub input_offset: u32,
}

/// Decode a program-text section into its slot list, appending the
/// synthetic end-of-stream marker so every later scan can find the end
/// without a separate bounds check.
pub fn decode_stream(bytes: &[u8]) -> Vec<Slot> {
    let mut out = Vec::new();
    let mut offset = 0u32;
    loop {
        let (op, len) = Opcode::decode(&bytes[offset as usize..]);
        let end = op.is_end();
        out.push(Slot {
            op,
            input_offset: offset,
        });
        if end {
            break;
        }
        offset += len as u32;
    }
    out
}

/// Pass 0 (§3's pipeline numbering): the front end's string-stack cleanup
/// pass. Nothing downstream of code generation carries string-stack state
/// by the time a `.o1` reaches this crate, so this stage is a documented
/// no-op rather than an omission.
pub fn pass0(stream: Vec<Slot>) -> Vec<Slot> {
    stream
}

fn is_pure_load(op: LogicalOp) -> bool {
    matches!(
        op,
        LogicalOp::Ld
            | LogicalOp::Ldb
            | LogicalOp::ULdb
            | LogicalOp::Lds
            | LogicalOp::Ldsb
            | LogicalOp::ULdsb
            | LogicalOp::La
            | LogicalOp::Las
            | LogicalOp::Push
            | LogicalOp::PushB
            | LogicalOp::UPushB
            | LogicalOp::Dup
    )
}

/// Map an indexed load/store to its non-indexed counterpart, for the
/// "constant index folds into the opcode's own offset" rule (§4.4). Our
/// opcode table has no non-indexed static byte store to pair `STSXB` with,
/// so that one form is left unfolded (see `DESIGN.md`).
fn indexed_to_plain(op: LogicalOp) -> Option<LogicalOp> {
    Some(match op {
        LogicalOp::Ldx => LogicalOp::Ld,
        LogicalOp::Ldsx => LogicalOp::Lds,
        LogicalOp::Ldxb => LogicalOp::Ldb,
        LogicalOp::Ldsxb => LogicalOp::Ldsb,
        LogicalOp::ULdxb => LogicalOp::ULdb,
        LogicalOp::ULdsxb => LogicalOp::ULdsb,
        LogicalOp::Lax => LogicalOp::La,
        LogicalOp::Lasx => LogicalOp::Las,
        LogicalOp::Stsx => LogicalOp::Sts,
        _ => return None,
    })
}

fn is_long_unary_dop(op: DOp) -> bool {
    matches!(
        op,
        DOp::Neg
            | DOp::Abs
            | DOp::Inc
            | DOp::Dec
            | DOp::Not
            | DOp::EquZ
            | DOp::NeqZ
            | DOp::LtZ
            | DOp::GteZ
            | DOp::GtZ
            | DOp::LteZ
            | DOp::Cnvd
            | DOp::UCnvd
    )
}

fn set_nop(stream: &mut [Slot], i: usize) {
    stream[i].op = Opcode::bare(LogicalOp::Nop);
}

fn try_const_unary(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1) = (list[0], list[1]);
    let Some(v) = stream[i0].op.push_constant_value() else {
        return false;
    };
    let Some(folded) = fold::fold_unary(stream[i1].op.op, v) else {
        return false;
    };
    stream[i1].op = Opcode::narrow_push_constant(folded);
    set_nop(stream, i0);
    true
}

fn try_const_compare_zero(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1) = (list[0], list[1]);
    let Some(v) = stream[i0].op.push_constant_value() else {
        return false;
    };
    let Some(folded) = fold::fold_compare_zero(stream[i1].op.op, v) else {
        return false;
    };
    stream[i1].op = Opcode::narrow_push_constant(folded);
    set_nop(stream, i0);
    true
}

fn try_const_branch(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1) = (list[0], list[1]);
    let Some(v) = stream[i0].op.push_constant_value() else {
        return false;
    };
    let Some(taken) = fold::branch_condition(stream[i1].op.op, v) else {
        return false;
    };
    if taken {
        let target = stream[i1].op.arg2;
        stream[i1].op =
            Opcode::new(LogicalOp::Jmp, 0, target).expect("branch arg2 was already valid");
    } else {
        set_nop(stream, i1);
    }
    set_nop(stream, i0);
    true
}

fn try_inc_dec_cancel(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1) = (list[0], list[1]);
    let cancels = matches!(
        (stream[i0].op.op, stream[i1].op.op),
        (LogicalOp::Inc, LogicalOp::Dec) | (LogicalOp::Dec, LogicalOp::Inc)
    );
    if !cancels {
        return false;
    }
    set_nop(stream, i0);
    set_nop(stream, i1);
    true
}

fn try_inds_merge(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1) = (list[0], list[1]);
    let (a, b) = (stream[i0].op, stream[i1].op);
    let is_adjust = |op: LogicalOp| matches!(op, LogicalOp::Inds | LogicalOp::Incs);
    if !is_adjust(a.op) || !is_adjust(b.op) {
        return false;
    }
    let Ok(merged) = Opcode::new(b.op, 0, a.arg2 + b.arg2) else {
        return false;
    };
    stream[i1].op = merged;
    set_nop(stream, i0);
    true
}

/// `NEG` folded into a following `ADD`/`SUB` (§4.4 misc rules, §9 open
/// question 2): `a; b; NEG; ADD` negates the top of stack before adding,
/// i.e. computes `a - b`, so it becomes `a; b; SUB`; symmetrically
/// `NEG; SUB` becomes `ADD`.
fn try_neg_add_sub(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1) = (list[0], list[1]);
    match (stream[i0].op.op, stream[i1].op.op) {
        (LogicalOp::Neg, LogicalOp::Add) => {
            stream[i1].op = Opcode::bare(LogicalOp::Sub);
            set_nop(stream, i0);
            true
        }
        (LogicalOp::Neg, LogicalOp::Sub) => {
            stream[i1].op = Opcode::bare(LogicalOp::Add);
            set_nop(stream, i0);
            true
        }
        _ => false,
    }
}

fn try_duplicate_load(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1) = (list[0], list[1]);
    let (a, b) = (stream[i0].op, stream[i1].op);
    let eligible = matches!(
        a.op,
        LogicalOp::Ld
            | LogicalOp::Ldb
            | LogicalOp::ULdb
            | LogicalOp::Lds
            | LogicalOp::Ldsb
            | LogicalOp::ULdsb
    );
    if !eligible || a.op != b.op || a.arg1 != b.arg1 || a.arg2 != b.arg2 {
        return false;
    }
    stream[i1].op = Opcode::bare(LogicalOp::Dup);
    true
}

/// `INDS -1` immediately behind a load that pushed exactly one word cancels
/// both (§4.4: "a load immediately discarded"). Only the exact single-word
/// case is handled; partial decrements against multi-word loads are left in
/// place rather than guessed at (`DESIGN.md`).
fn try_inds_cancels_load(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1) = (list[0], list[1]);
    let (load, inds) = (stream[i0].op, stream[i1].op);
    if inds.op != LogicalOp::Inds || inds.arg2 != -1 {
        return false;
    }
    if !is_pure_load(load.op) {
        return false;
    }
    set_nop(stream, i0);
    set_nop(stream, i1);
    true
}

fn try_indexed_load_const_fold(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1) = (list[0], list[1]);
    let Some(k) = stream[i0].op.push_constant_value() else {
        return false;
    };
    let indexed = stream[i1].op;
    let Some(plain) = indexed_to_plain(indexed.op) else {
        return false;
    };
    let Ok(new_op) = Opcode::new(plain, indexed.arg1 as i32, k) else {
        return false;
    };
    stream[i1].op = new_op;
    set_nop(stream, i0);
    true
}

fn try_const_binary_fold(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1, i2) = (list[0], list[1], list[2]);
    let Some(a) = stream[i0].op.push_constant_value() else {
        return false;
    };
    let Some(b) = stream[i1].op.push_constant_value() else {
        return false;
    };
    match fold::fold_binary(stream[i2].op.op, a, b) {
        Some(Ok(v)) => {
            stream[i2].op = Opcode::narrow_push_constant(v);
            set_nop(stream, i0);
            set_nop(stream, i1);
            true
        }
        _ => false,
    }
}

fn try_identity_with_load(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1, i2) = (list[0], list[1], list[2]);
    if stream[i0].op.push_constant_value().is_some() {
        return false; // both-constant: try_const_binary_fold's job.
    }
    let Some(k) = stream[i1].op.push_constant_value() else {
        return false;
    };
    let Some(rewrite) = fold::identity_rewrite(stream[i2].op.op, k) else {
        return false;
    };
    match rewrite {
        IdentityRewrite::DropPair => {
            set_nop(stream, i1);
            set_nop(stream, i2);
        }
        IdentityRewrite::ReplaceWithUnary(op) => {
            stream[i2].op = Opcode::bare(op);
            set_nop(stream, i1);
        }
        IdentityRewrite::Shift { op, k } => {
            stream[i2].op = Opcode::bare(op);
            stream[i1].op =
                Opcode::new(LogicalOp::PushB, k as i32, 0).expect("shift amount fits PUSHB");
        }
        IdentityRewrite::CompareZero(op) => {
            stream[i2].op = Opcode::bare(op);
            set_nop(stream, i1);
        }
        IdentityRewrite::AdjustThenCompareZero { adjust, compare } => {
            stream[i1].op = Opcode::bare(adjust);
            stream[i2].op = Opcode::bare(compare);
        }
    }
    true
}

/// One constant operand against a load, on a transitive operator: swap so
/// the constant ends up directly above the load, letting
/// `try_identity_with_load` match it on a later scan of the same window
/// (§4.4 "One constant operand against a load").
fn try_swap_const_above_load(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1, i2) = (list[0], list[1], list[2]);
    if stream[i0].op.push_constant_value().is_none() {
        return false;
    }
    if stream[i1].op.push_constant_value().is_some() {
        return false; // both-constant: try_const_binary_fold's job.
    }
    if !is_pure_load(stream[i1].op.op) || !fold::is_transitive(stream[i2].op.op) {
        return false;
    }
    let tmp = stream[i0].op;
    stream[i0].op = stream[i1].op;
    stream[i1].op = tmp;
    true
}

/// A constant added to or subtracted from an address load folds into the
/// load's own offset (§4.4). Skipped for `LAC`, which always carries a
/// read-only-data relocation the fold would have to rewrite (`DESIGN.md`).
fn try_address_load_offset_fold(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1, i2) = (list[0], list[1], list[2]);
    let load = stream[i0].op;
    if !matches!(
        load.op,
        LogicalOp::La | LogicalOp::Las | LogicalOp::Lax | LogicalOp::Lasx
    ) {
        return false;
    }
    let Some(k) = stream[i1].op.push_constant_value() else {
        return false;
    };
    let delta = match stream[i2].op.op {
        LogicalOp::Add => k,
        LogicalOp::Sub => -k,
        _ => return false,
    };
    let Ok(new_load) = Opcode::new(load.op, load.arg1 as i32, load.arg2 + delta) else {
        return false;
    };
    stream[i0].op = new_load;
    set_nop(stream, i1);
    set_nop(stream, i2);
    true
}

fn try_xchg_swap(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1, i2) = (list[0], list[1], list[2]);
    if stream[i2].op.op != LogicalOp::Xchg {
        return false;
    }
    if !is_pure_load(stream[i0].op.op) || !is_pure_load(stream[i1].op.op) {
        return false;
    }
    let tmp = stream[i0].op;
    stream[i0].op = stream[i1].op;
    stream[i1].op = tmp;
    set_nop(stream, i2);
    true
}

fn try_long_unary(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1, i2) = (list[0], list[1], list[2]);
    let Some(hi) = stream[i0].op.push_constant_value() else {
        return false;
    };
    let Some(lo) = stream[i1].op.push_constant_value() else {
        return false;
    };
    let longop = stream[i2].op;
    if longop.op != LogicalOp::LongOp8 {
        return false;
    }
    let Some(dop) = DOp::from_u8(longop.arg1) else {
        return false;
    };
    if !is_long_unary_dop(dop) {
        return false;
    }
    let Some(folded) = fold::fold_long_unary(dop, fold::combine32(hi, lo)) else {
        return false;
    };
    let (new_hi, new_lo) = fold::split32(folded);
    stream[i0].op = Opcode::narrow_push_constant(new_hi);
    stream[i1].op = Opcode::narrow_push_constant(new_lo);
    set_nop(stream, i2);
    true
}

fn try_long_binary(stream: &mut [Slot], list: &[usize]) -> bool {
    let (i0, i1, i2, i3, i4) = (list[0], list[1], list[2], list[3], list[4]);
    let Some(hi_a) = stream[i0].op.push_constant_value() else {
        return false;
    };
    let Some(lo_a) = stream[i1].op.push_constant_value() else {
        return false;
    };
    let Some(hi_b) = stream[i2].op.push_constant_value() else {
        return false;
    };
    let Some(lo_b) = stream[i3].op.push_constant_value() else {
        return false;
    };
    let longop = stream[i4].op;
    if longop.op != LogicalOp::LongOp8 {
        return false;
    }
    let Some(dop) = DOp::from_u8(longop.arg1) else {
        return false;
    };
    if is_long_unary_dop(dop) {
        return false;
    }
    let a = fold::combine32(hi_a, lo_a);
    let b = fold::combine32(hi_b, lo_b);
    match fold::fold_long_binary(dop, a, b) {
        Some(Ok(v)) => {
            let (new_hi, new_lo) = fold::split32(v);
            stream[i0].op = Opcode::narrow_push_constant(new_hi);
            stream[i1].op = Opcode::narrow_push_constant(new_lo);
            set_nop(stream, i2);
            set_nop(stream, i3);
            set_nop(stream, i4);
            true
        }
        _ => false,
    }
}

/// Run `rule` and, if it fired, trace which one matched (by name) and where
/// (the window's first offset) before reporting success to the caller.
fn fired(name: &str, stream: &[Slot], list: &[usize], matched: bool) -> bool {
    if matched {
        log::trace!(
            "pass1: rule `{name}` fired at input offset {}",
            stream[list[0]].input_offset
        );
    }
    matched
}

fn apply_rules(stream: &mut [Slot], list: &[usize]) -> bool {
    macro_rules! rule {
        ($name:expr, $try_fn:expr) => {{
            let matched = $try_fn;
            if fired($name, stream, list, matched) {
                return true;
            }
        }};
    }

    if list.len() >= 5 {
        rule!("long_binary", try_long_binary(stream, list));
    }
    if list.len() >= 3 {
        rule!("long_unary", try_long_unary(stream, list));
    }
    if list.len() >= 2 {
        rule!("const_unary", try_const_unary(stream, list));
        rule!("const_compare_zero", try_const_compare_zero(stream, list));
        rule!("const_branch", try_const_branch(stream, list));
        rule!("inc_dec_cancel", try_inc_dec_cancel(stream, list));
        rule!("inds_merge", try_inds_merge(stream, list));
        rule!("neg_add_sub", try_neg_add_sub(stream, list));
        rule!("duplicate_load", try_duplicate_load(stream, list));
        rule!("inds_cancels_load", try_inds_cancels_load(stream, list));
        rule!("indexed_load_const_fold", try_indexed_load_const_fold(stream, list));
    }
    if list.len() >= 3 {
        rule!("const_binary_fold", try_const_binary_fold(stream, list));
        rule!("identity_with_load", try_identity_with_load(stream, list));
        rule!("swap_const_above_load", try_swap_const_above_load(stream, list));
        rule!("address_load_offset_fold", try_address_load_offset_fold(stream, list));
        rule!("xchg_swap", try_xchg_swap(stream, list));
    }
    false
}

/// Pass 1 (§4.4): run the peephole rules to a fixed point, then compact the
/// stream (dropping opcodes turned into `NOP`) and carry every surviving
/// relocation forward to its new offset.
pub fn pass1(mut stream: Vec<Slot>, relocs: Vec<Relocation>) -> Result<(Vec<Slot>, Vec<Relocation>)> {
    let mut sweeps = 0u32;
    loop {
        sweeps += 1;
        let mut changed = false;
        let mut i = 0;
        while !stream[i].op.is_end() {
            let list = pointer_list(&stream, i);
            if list.is_empty() {
                i += 1;
                continue;
            }
            if apply_rules(&mut stream, &list) {
                changed = true;
                continue;
            }
            i = list[0] + 1;
        }
        if !changed {
            break;
        }
    }
    log::debug!("pass1: reached a fixed point after {sweeps} sweep(s)");

    let mut tracker = RelocationTracker::new(relocs);
    let mut out = Vec::with_capacity(stream.len());
    let mut offset = 0u32;
    for slot in &stream {
        if slot.op.is_end() {
            break;
        }
        let taken = tracker
            .take_for_input_offset(slot.input_offset)
            .map_err(Error::relocation)?;
        if slot.op.op == LogicalOp::Nop {
            continue;
        }
        for r in &taken {
            tracker.emit(offset, r.base);
        }
        out.push(Slot {
            op: slot.op,
            input_offset: offset,
        });
        offset += slot.op.len() as u32;
    }
    out.push(Slot {
        op: Opcode::end(),
        input_offset: offset,
    });
    log::debug!(
        "pass1: compacted {} slot(s) down to {} live opcode(s)",
        stream.len(),
        out.len() - 1
    );
    let tracker = tracker.swap_for_next_pass().map_err(Error::relocation)?;
    Ok((out, tracker.into_relocations()))
}

/// Pass 2 (§4.4): resolve `LABEL` pseudo-ops to concrete program offsets,
/// apply the final program/read-only-data relocations, emit line-number
/// entries keyed by output offset, and strip pseudo-ops.
pub fn pass2(
    stream: Vec<Slot>,
    relocs: Vec<Relocation>,
) -> Result<(Vec<Opcode>, Vec<Relocation>, Vec<(u32, u32)>, HashMap<i32, u32>)> {
    let mut label_offsets: HashMap<i32, u32> = HashMap::new();
    let mut lines: Vec<(u32, u32)> = Vec::new();
    let mut offset = 0u32;
    for slot in &stream {
        if slot.op.is_end() {
            break;
        }
        match slot.op.op {
            LogicalOp::Label => {
                label_offsets.insert(slot.op.arg2, offset);
            }
            LogicalOp::Line => {
                lines.push((offset, slot.op.arg2 as u32));
            }
            _ => offset += slot.op.len() as u32,
        }
    }

    let mut tracker = RelocationTracker::new(relocs);
    let mut opcodes = Vec::with_capacity(stream.len());
    let mut out_offset = 0u32;
    for slot in &stream {
        if slot.op.is_end() {
            break;
        }
        let taken = tracker
            .take_for_input_offset(slot.input_offset)
            .map_err(Error::relocation)?;
        if slot.op.op.is_pseudo() {
            continue;
        }
        let mut op = slot.op;
        if op.op.is_branch() {
            let target = *label_offsets
                .get(&op.arg2)
                .ok_or_else(|| Error::invariant("branch target label was never defined"))?;
            op.arg2 = target as i32;
        }
        for r in &taken {
            tracker.emit(out_offset, r.base);
        }
        opcodes.push(op);
        out_offset += op.len() as u32;
    }
    opcodes.push(Opcode::end());

    let tracker = tracker.swap_for_next_pass().map_err(Error::relocation)?;
    let relocs_out = tracker.into_relocations();

    // The program and read-only-data sections both still belong to this
    // same, as-yet-unlinked container, so both bases are 0 here; a later
    // linker combining several units would pass the real ones.
    finalize_relocations(&mut opcodes, &relocs_out, 0, 0).map_err(Error::relocation)?;
    log::debug!(
        "pass2: resolved {} label(s), finalized {} relocation(s), {} line entr(y/ies)",
        label_offsets.len(),
        relocs_out.len(),
        lines.len()
    );

    Ok((opcodes, relocs_out, lines, label_offsets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use poff::RelocationBase;

    fn push(v: i32) -> Opcode {
        Opcode::narrow_push_constant(v)
    }

    fn slots(ops: Vec<Opcode>) -> Vec<Slot> {
        let mut offset = 0u32;
        let mut out: Vec<Slot> = ops
            .into_iter()
            .map(|op| {
                let s = Slot {
                    op,
                    input_offset: offset,
                };
                offset += op.len() as u32;
                s
            })
            .collect();
        out.push(Slot {
            op: Opcode::end(),
            input_offset: offset,
        });
        out
    }

    #[test]
    fn folds_add_of_two_constants() {
        let stream = slots(vec![push(3), push(4), Opcode::bare(LogicalOp::Add)]);
        let (out, relocs) = pass1(stream, Vec::new()).unwrap();
        assert!(relocs.is_empty());
        let live: Vec<_> = out.iter().filter(|s| !s.op.is_end()).collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].op.push_constant_value(), Some(7));
    }

    #[test]
    fn folds_const_mul_add_chain() {
        // 5 * 8 + 2 == 42
        let stream = slots(vec![
            push(5),
            push(8),
            Opcode::bare(LogicalOp::Mul),
            push(2),
            Opcode::bare(LogicalOp::Add),
        ]);
        let (out, _) = pass1(stream, Vec::new()).unwrap();
        let live: Vec<_> = out.iter().filter(|s| !s.op.is_end()).collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].op.push_constant_value(), Some(42));
    }

    #[test]
    fn div_by_zero_is_left_for_the_interpreter() {
        let stream = slots(vec![push(10), push(0), Opcode::bare(LogicalOp::Div)]);
        let (out, _) = pass1(stream, Vec::new()).unwrap();
        let live: Vec<_> = out.iter().filter(|s| !s.op.is_end()).collect();
        assert_eq!(live.len(), 3);
    }

    #[test]
    fn false_conditional_branch_drops_its_relocation() {
        // PUSHB 0 ; JNEQZ <label 5>  -- never taken, both opcodes and the
        // branch's relocation must disappear.
        let branch = Opcode::new(LogicalOp::JNeqZ, 0, 5).unwrap();
        let stream = slots(vec![push(0), branch]);
        let relocs = vec![Relocation {
            program_offset: stream[1].input_offset,
            base: RelocationBase::ProgramText,
        }];
        let (out, relocs_out) = pass1(stream, relocs).unwrap();
        let live: Vec<_> = out.iter().filter(|s| !s.op.is_end()).collect();
        assert!(live.is_empty());
        assert!(relocs_out.is_empty());
    }

    #[test]
    fn pass2_resolves_a_label_and_strips_pseudo_ops() {
        // LABEL 1 ; JMP 1 ; RET
        let stream = slots(vec![
            Opcode::new(LogicalOp::Label, 0, 1).unwrap(),
            Opcode::new(LogicalOp::Jmp, 0, 1).unwrap(),
            Opcode::bare(LogicalOp::Ret),
        ]);
        let relocs = vec![Relocation {
            program_offset: stream[1].input_offset,
            base: RelocationBase::ProgramText,
        }];
        let (opcodes, relocs_out, _lines, _labels) = pass2(stream, relocs).unwrap();
        let live: Vec<_> = opcodes.iter().filter(|o| !o.is_end()).collect();
        assert_eq!(live.len(), 2);
        assert_eq!(live[0].op, LogicalOp::Jmp);
        assert_eq!(live[0].arg2, 0); // the LABEL was at offset 0 and emits no bytes.
        assert_eq!(relocs_out.len(), 1);
    }
}
