//! The fetch-execute loop (§4.5): decode one opcode, execute it against
//! [`Machine`] state, advance the program counter (or branch), repeat
//! until `END` or an `OSOP exit`.

use poff::{DOp, LogicalOp, Opcode};

use crate::error::{Error, Result};
use crate::host::Host;
use crate::machine::Machine;
use crate::subop::{FloatOp, LibOp, OsOp, SetOp, SysIoOp};

const TRUE: i16 = -1;
const FALSE: i16 = 0;

fn bool16(b: bool) -> i16 {
    if b {
        TRUE
    } else {
        FALSE
    }
}

fn sub_opcode<T>(from_u8: impl Fn(u8) -> Option<T>, arg1: u8, namespace: &'static str) -> Result<T> {
    from_u8(arg1).ok_or_else(|| {
        log::warn!("{namespace}: unassigned sub-opcode byte {arg1:#04x}");
        Error::runtime(namespace)
    })
}

/// Run `machine` to completion, returning the program's exit code (`0` if
/// it reached `END` without ever calling `OSOP exit`).
pub fn run<H: Host>(machine: &mut Machine<'_>, host: &mut H) -> Result<i32> {
    loop {
        let (opcode, len) = Opcode::decode(&machine.program()[machine.pc()..]);
        if opcode.is_end() {
            let code = machine.exit_code().unwrap_or(0);
            log::debug!("run: reached END, exit code {code}");
            return Ok(code);
        }
        if opcode.is_invalid() {
            log::warn!("run: invalid opcode byte encountered at pc={}", machine.pc());
            return Err(Error::runtime("invalid opcode byte encountered at runtime"));
        }

        let next_pc = machine.pc() + len;
        machine.set_pc(next_pc);

        match step(machine, host, opcode, next_pc) {
            Ok(Some(code)) => {
                log::debug!("run: OSOP exit with code {code}");
                return Ok(code);
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("run: dispatch error at pc={}: {e}", machine.pc());
                return Err(e);
            }
        }
    }
}

/// Execute one opcode. Returns `Some(exit_code)` if this opcode was
/// `OSOP exit` and the caller's loop should stop.
fn step<H: Host>(
    machine: &mut Machine<'_>,
    host: &mut H,
    opcode: Opcode,
    next_pc: usize,
) -> Result<Option<i32>> {
    use LogicalOp::*;

    match opcode.op {
        Add => binary_arith(machine, |a, b| a.wrapping_add(b))?,
        Sub => binary_arith(machine, |a, b| a.wrapping_sub(b))?,
        Mul => binary_arith(machine, |a, b| a.wrapping_mul(b))?,
        UMul => binary_arith_u(machine, |a, b| a.wrapping_mul(b))?,
        Div => binary_arith_checked(machine, |a, b| a.checked_div(b))?,
        UDiv => binary_arith_u_checked(machine, |a, b| a.checked_div(b))?,
        Mod => binary_arith_checked(machine, |a, b| a.checked_rem(b))?,
        UMod => binary_arith_u_checked(machine, |a, b| a.checked_rem(b))?,
        And => binary_arith(machine, |a, b| a & b)?,
        Or => binary_arith(machine, |a, b| a | b)?,
        Sll => binary_arith(machine, |a, b| a.wrapping_shl(b as u32 & 15))?,
        Srl => binary_arith_u(machine, |a, b| a.wrapping_shr(b as u32 & 15))?,
        Sra => binary_arith(machine, |a, b| a.wrapping_shr(b as u32 & 15))?,
        Neg => unary(machine, |v| v.wrapping_neg())?,
        Abs => unary(machine, |v| v.wrapping_abs())?,
        Inc => unary(machine, |v| v.wrapping_add(1))?,
        Dec => unary(machine, |v| v.wrapping_sub(1))?,
        Not => unary(machine, |v| !v)?,
        EquZ => compare_zero(machine, |v| v == 0)?,
        NeqZ => compare_zero(machine, |v| v != 0)?,
        LtZ => compare_zero(machine, |v| v < 0)?,
        GteZ => compare_zero(machine, |v| v >= 0)?,
        GtZ => compare_zero(machine, |v| v > 0)?,
        LteZ => compare_zero(machine, |v| v <= 0)?,
        Equ => compare(machine, |a, b| a == b)?,
        Neq => compare(machine, |a, b| a != b)?,
        Lt => compare(machine, |a, b| a < b)?,
        Gte => compare(machine, |a, b| a >= b)?,
        Gt => compare(machine, |a, b| a > b)?,
        Lte => compare(machine, |a, b| a <= b)?,
        ULt => compare_u(machine, |a, b| a < b)?,
        UGte => compare_u(machine, |a, b| a >= b)?,
        UGt => compare_u(machine, |a, b| a > b)?,
        ULte => compare_u(machine, |a, b| a <= b)?,

        Dup => machine.dup()?,
        Xchg => machine.xchg()?,
        Ret => machine.ret()?,
        Nop => {}
        PopS => machine.pops()?,
        PushS => machine.pushs()?,

        PushB => machine.push_word(opcode.arg1 as i8 as i16)?,
        UPushB => machine.push_word(opcode.arg1 as i16)?,
        Push => machine.push_word(opcode.arg2 as i32 as u16 as i16)?,

        LongOp8 | LongOp24 => long_op(machine, opcode.arg1)?,

        SysIo => {
            let op = sub_opcode(SysIoOp::from_u8, opcode.arg1, "SYSIO: unassigned sub-opcode")?;
            host.sysio(op, machine)?;
        }
        Lib => {
            let op = sub_opcode(LibOp::from_u8, opcode.arg1, "LIB: unassigned sub-opcode")?;
            host.lib(op, machine)?;
        }
        SetOp => {
            let op = sub_opcode(SetOp::from_u8, opcode.arg1, "SETOP: unassigned sub-opcode")?;
            host.setop(op, machine)?;
        }
        Float => {
            let op = sub_opcode(FloatOp::from_u8, opcode.arg1, "FLOAT: unassigned sub-opcode")?;
            host.float(op, machine)?;
        }
        OsOp => {
            let op = sub_opcode(OsOp::from_u8, opcode.arg1, "OSOP: unassigned sub-opcode")?;
            if let Some(code) = osop(machine, host, op)? {
                return Ok(Some(code));
            }
        }

        Label | Line => {}

        Jmp => machine.set_pc(branch_target(opcode)),
        JEquZ => branch_if(machine, opcode, |v| v == 0)?,
        JNeqZ => branch_if(machine, opcode, |v| v != 0)?,
        JLtZ => branch_if(machine, opcode, |v| v < 0)?,
        JGteZ => branch_if(machine, opcode, |v| v >= 0)?,
        JGtZ => branch_if(machine, opcode, |v| v > 0)?,
        JLteZ => branch_if(machine, opcode, |v| v <= 0)?,

        Inds => machine.inds(opcode.arg2)?,
        Incs => machine.inds(opcode.arg2)?,

        La => push_address(machine, 0, opcode.arg2)?,
        Ld => load_word(machine, 0, opcode.arg2)?,
        Ldb => load_byte(machine, 0, opcode.arg2, true)?,
        ULdb => load_byte(machine, 0, opcode.arg2, false)?,
        Ldx => load_word_indexed(machine, 0, opcode.arg2)?,
        Ldxb => load_byte_indexed(machine, 0, opcode.arg2, true)?,
        ULdxb => load_byte_indexed(machine, 0, opcode.arg2, false)?,
        Lax => push_address_indexed(machine, 0, opcode.arg2)?,
        St => store_word(machine, 0, opcode.arg2)?,
        Stb => store_byte(machine, 0, opcode.arg2)?,
        Ldm => load_multi(machine, 0, opcode.arg2)?,
        Stm => store_multi(machine, 0, opcode.arg2)?,
        Lac => {
            let addr = machine.rodata_address(opcode.arg2 as usize);
            machine.push_long(addr as i32)?;
        }

        Pcal => {
            let target = branch_target(opcode);
            machine.pcal(opcode.arg1, target, next_pc)?;
        }
        Las => push_address(machine, opcode.arg1, opcode.arg2)?,
        Lds => load_word(machine, opcode.arg1, opcode.arg2)?,
        Ldsb => load_byte(machine, opcode.arg1, opcode.arg2, true)?,
        ULdsb => load_byte(machine, opcode.arg1, opcode.arg2, false)?,
        Sts => store_word(machine, opcode.arg1, opcode.arg2)?,
        Lasx => push_address_indexed(machine, opcode.arg1, opcode.arg2)?,
        Ldsx => load_word_indexed(machine, opcode.arg1, opcode.arg2)?,
        Ldsxb => load_byte_indexed(machine, opcode.arg1, opcode.arg2, true)?,
        ULdsxb => load_byte_indexed(machine, opcode.arg1, opcode.arg2, false)?,
        Stsx => store_word_indexed(machine, opcode.arg1, opcode.arg2)?,
        Stsxb => store_byte_indexed(machine, opcode.arg1, opcode.arg2)?,
        Ldsm => load_multi(machine, opcode.arg1, opcode.arg2)?,
        Stsm => store_multi(machine, opcode.arg1, opcode.arg2)?,
    }
    Ok(None)
}

fn branch_target(opcode: Opcode) -> usize {
    opcode.arg2 as usize
}

fn branch_if(machine: &mut Machine<'_>, opcode: Opcode, cond: impl Fn(i16) -> bool) -> Result<()> {
    let v = machine.pop_word()?;
    if cond(v) {
        machine.set_pc(branch_target(opcode));
    }
    Ok(())
}

fn binary_arith(machine: &mut Machine<'_>, f: impl Fn(i16, i16) -> i16) -> Result<()> {
    let b = machine.pop_word()?;
    let a = machine.pop_word()?;
    machine.push_word(f(a, b))
}

fn binary_arith_u(machine: &mut Machine<'_>, f: impl Fn(u16, u16) -> u16) -> Result<()> {
    let b = machine.pop_word()? as u16;
    let a = machine.pop_word()? as u16;
    machine.push_word(f(a, b) as i16)
}

fn binary_arith_checked(machine: &mut Machine<'_>, f: impl Fn(i16, i16) -> Option<i16>) -> Result<()> {
    let b = machine.pop_word()?;
    let a = machine.pop_word()?;
    let v = f(a, b).ok_or(Error::runtime("divide or modulo by zero"))?;
    machine.push_word(v)
}

fn binary_arith_u_checked(machine: &mut Machine<'_>, f: impl Fn(u16, u16) -> Option<u16>) -> Result<()> {
    let b = machine.pop_word()? as u16;
    let a = machine.pop_word()? as u16;
    let v = f(a, b).ok_or(Error::runtime("divide or modulo by zero"))?;
    machine.push_word(v as i16)
}

fn unary(machine: &mut Machine<'_>, f: impl Fn(i16) -> i16) -> Result<()> {
    let v = machine.pop_word()?;
    machine.push_word(f(v))
}

fn compare_zero(machine: &mut Machine<'_>, f: impl Fn(i16) -> bool) -> Result<()> {
    let v = machine.pop_word()?;
    machine.push_word(bool16(f(v)))
}

fn compare(machine: &mut Machine<'_>, f: impl Fn(i16, i16) -> bool) -> Result<()> {
    let b = machine.pop_word()?;
    let a = machine.pop_word()?;
    machine.push_word(bool16(f(a, b)))
}

fn compare_u(machine: &mut Machine<'_>, f: impl Fn(u16, u16) -> bool) -> Result<()> {
    let b = machine.pop_word()? as u16;
    let a = machine.pop_word()? as u16;
    machine.push_word(bool16(f(a, b)))
}

fn load_word(machine: &mut Machine<'_>, level: u8, offset: i32) -> Result<()> {
    let addr = machine.static_address(level, offset)?;
    let v = machine.read_mem_word(addr)?;
    machine.push_word(v)
}

fn load_word_indexed(machine: &mut Machine<'_>, level: u8, offset: i32) -> Result<()> {
    let idx = machine.pop_word()? as i32;
    let addr = machine.static_address(level, offset + idx)?;
    let v = machine.read_mem_word(addr)?;
    machine.push_word(v)
}

fn load_byte(machine: &mut Machine<'_>, level: u8, offset: i32, signed: bool) -> Result<()> {
    let addr = machine.static_address(level, offset)?;
    let byte = machine.read_bytes(addr, 1)?[0];
    machine.push_word(if signed { byte as i8 as i16 } else { byte as i16 })
}

fn load_byte_indexed(machine: &mut Machine<'_>, level: u8, offset: i32, signed: bool) -> Result<()> {
    let idx = machine.pop_word()? as i32;
    let addr = machine.static_address(level, offset + idx)?;
    let byte = machine.read_bytes(addr, 1)?[0];
    machine.push_word(if signed { byte as i8 as i16 } else { byte as i16 })
}

fn store_word(machine: &mut Machine<'_>, level: u8, offset: i32) -> Result<()> {
    let v = machine.pop_word()?;
    let addr = machine.static_address(level, offset)?;
    machine.write_mem_word(addr, v)
}

fn store_word_indexed(machine: &mut Machine<'_>, level: u8, offset: i32) -> Result<()> {
    let idx = machine.pop_word()? as i32;
    let v = machine.pop_word()?;
    let addr = machine.static_address(level, offset + idx)?;
    machine.write_mem_word(addr, v)
}

fn store_byte(machine: &mut Machine<'_>, level: u8, offset: i32) -> Result<()> {
    let v = machine.pop_word()?;
    let addr = machine.static_address(level, offset)?;
    machine.write_bytes(addr, &[v as u8])
}

fn store_byte_indexed(machine: &mut Machine<'_>, level: u8, offset: i32) -> Result<()> {
    let idx = machine.pop_word()? as i32;
    let v = machine.pop_word()?;
    let addr = machine.static_address(level, offset + idx)?;
    machine.write_bytes(addr, &[v as u8])
}

fn push_address(machine: &mut Machine<'_>, level: u8, offset: i32) -> Result<()> {
    let addr = machine.static_address(level, offset)?;
    machine.push_long(addr as i32)
}

fn push_address_indexed(machine: &mut Machine<'_>, level: u8, offset: i32) -> Result<()> {
    let idx = machine.pop_word()? as i32;
    let addr = machine.static_address(level, offset + idx)?;
    machine.push_long(addr as i32)
}

/// `LDM`/`STM`/`LDSM`/`STSM` read their word count from the top of the
/// data stack rather than from an opcode argument (§9 design note: "the
/// byte count rides on the stack").
fn load_multi(machine: &mut Machine<'_>, level: u8, offset: i32) -> Result<()> {
    let count = machine.pop_word()? as i32;
    let base = machine.static_address(level, offset)?;
    for i in 0..count {
        let v = machine.read_mem_word(base + (i as usize) * 2)?;
        machine.push_word(v)?;
    }
    Ok(())
}

fn store_multi(machine: &mut Machine<'_>, level: u8, offset: i32) -> Result<()> {
    let count = machine.pop_word()? as i32;
    let base = machine.static_address(level, offset)?;
    for i in (0..count).rev() {
        let v = machine.pop_word()?;
        machine.write_mem_word(base + (i as usize) * 2, v)?;
    }
    Ok(())
}

fn long_op(machine: &mut Machine<'_>, sub_code: u8) -> Result<()> {
    let op = DOp::from_u8(sub_code).ok_or(Error::runtime("LONGOP: unassigned sub-opcode"))?;
    use DOp::*;
    match op {
        Neg => long_unary(machine, |v| v.wrapping_neg())?,
        Abs => long_unary(machine, |v| v.wrapping_abs())?,
        Inc => long_unary(machine, |v| v.wrapping_add(1))?,
        Dec => long_unary(machine, |v| v.wrapping_sub(1))?,
        Not => long_unary(machine, |v| !v)?,
        EquZ => long_compare_zero(machine, |v| v == 0)?,
        NeqZ => long_compare_zero(machine, |v| v != 0)?,
        LtZ => long_compare_zero(machine, |v| v < 0)?,
        GteZ => long_compare_zero(machine, |v| v >= 0)?,
        GtZ => long_compare_zero(machine, |v| v > 0)?,
        LteZ => long_compare_zero(machine, |v| v <= 0)?,
        Cnvd => {
            let v = machine.pop_word()?;
            machine.push_long(v as i32)?;
        }
        UCnvd => {
            let v = machine.pop_word()? as u16;
            machine.push_long(v as i32)?;
        }
        Add => long_binary(machine, |a, b| Ok(a.wrapping_add(b)))?,
        Sub => long_binary(machine, |a, b| Ok(a.wrapping_sub(b)))?,
        Mul => long_binary(machine, |a, b| Ok(a.wrapping_mul(b)))?,
        UMul => long_binary_u(machine, |a, b| Ok(a.wrapping_mul(b)))?,
        Div => long_binary(machine, |a, b| a.checked_div(b).ok_or(()))?,
        UDiv => long_binary_u(machine, |a, b| a.checked_div(b).ok_or(()))?,
        Mod => long_binary(machine, |a, b| a.checked_rem(b).ok_or(()))?,
        UMod => long_binary_u(machine, |a, b| a.checked_rem(b).ok_or(()))?,
        And => long_binary(machine, |a, b| Ok(a & b))?,
        Or => long_binary(machine, |a, b| Ok(a | b))?,
        Sll => long_binary(machine, |a, b| Ok(a.wrapping_shl(b as u32 & 31)))?,
        Srl => long_binary_u(machine, |a, b| Ok(a.wrapping_shr(b as u32 & 31)))?,
        Sra => long_binary(machine, |a, b| Ok(a.wrapping_shr(b as u32 & 31)))?,
        Equ => long_compare(machine, |a, b| a == b)?,
        Neq => long_compare(machine, |a, b| a != b)?,
        Lt => long_compare(machine, |a, b| a < b)?,
        Gte => long_compare(machine, |a, b| a >= b)?,
        Gt => long_compare(machine, |a, b| a > b)?,
        Lte => long_compare(machine, |a, b| a <= b)?,
        ULt => long_compare_u(machine, |a, b| a < b)?,
        UGte => long_compare_u(machine, |a, b| a >= b)?,
        UGt => long_compare_u(machine, |a, b| a > b)?,
        ULte => long_compare_u(machine, |a, b| a <= b)?,
    }
    Ok(())
}

fn long_unary(machine: &mut Machine<'_>, f: impl Fn(i32) -> i32) -> Result<()> {
    let v = machine.pop_long()?;
    machine.push_long(f(v))
}

fn long_compare_zero(machine: &mut Machine<'_>, f: impl Fn(i32) -> bool) -> Result<()> {
    let v = machine.pop_long()?;
    machine.push_word(bool16(f(v)))
}

fn long_binary(machine: &mut Machine<'_>, f: impl Fn(i32, i32) -> std::result::Result<i32, ()>) -> Result<()> {
    let b = machine.pop_long()?;
    let a = machine.pop_long()?;
    let v = f(a, b).map_err(|()| Error::runtime("long divide or modulo by zero"))?;
    machine.push_long(v)
}

fn long_binary_u(machine: &mut Machine<'_>, f: impl Fn(u32, u32) -> std::result::Result<u32, ()>) -> Result<()> {
    let b = machine.pop_long()? as u32;
    let a = machine.pop_long()? as u32;
    let v = f(a, b).map_err(|()| Error::runtime("long divide or modulo by zero"))?;
    machine.push_long(v as i32)
}

fn long_compare(machine: &mut Machine<'_>, f: impl Fn(i32, i32) -> bool) -> Result<()> {
    let b = machine.pop_long()?;
    let a = machine.pop_long()?;
    machine.push_word(bool16(f(a, b)))
}

fn long_compare_u(machine: &mut Machine<'_>, f: impl Fn(u32, u32) -> bool) -> Result<()> {
    let b = machine.pop_long()? as u32;
    let a = machine.pop_long()? as u32;
    machine.push_word(bool16(f(a, b)))
}

fn osop<H: Host>(machine: &mut Machine<'_>, host: &mut H, op: OsOp) -> Result<Option<i32>> {
    match op {
        OsOp::Exit => {
            let code = machine.pop_word()? as i32;
            machine.set_exit_code(code);
            Ok(Some(code))
        }
        OsOp::New => {
            let size = machine.pop_word()? as usize;
            let addr = machine.heap_allocate(size)?;
            machine.push_long(addr as i32)?;
            Ok(None)
        }
        OsOp::Dispose => {
            let size = machine.pop_word()? as usize;
            let addr = machine.pop_long()? as usize;
            machine.heap_dispose(addr, size);
            Ok(None)
        }
        OsOp::GetEnv => {
            host.getenv(machine)?;
            Ok(None)
        }
        OsOp::Spawn => {
            let target = machine.pop_long()? as usize;
            let mut sub = Machine::new(
                machine.program(),
                &[],
                target,
                crate::machine::DEFAULT_GLOBALS,
                crate::machine::DEFAULT_STACK,
                crate::machine::DEFAULT_STRSTACK,
                crate::machine::DEFAULT_HEAP,
            );
            let code = run(&mut sub, host)?;
            machine.push_long(code)?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{DEFAULT_GLOBALS, DEFAULT_HEAP, DEFAULT_STACK, DEFAULT_STRSTACK};

    fn assemble(ops: &[Opcode]) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut buf = [0u8; 4];
        for op in ops {
            let len = op.encode(&mut buf).expect("encodable in tests");
            bytes.extend_from_slice(&buf[..len]);
        }
        bytes
    }

    fn push_byte(v: i32) -> Opcode {
        Opcode::new(LogicalOp::PushB, v, 0).unwrap()
    }

    #[derive(Default)]
    struct RecordingHost {
        written: Vec<i32>,
        newlines: usize,
    }

    impl Host for RecordingHost {
        fn sysio(&mut self, op: SysIoOp, machine: &mut Machine<'_>) -> Result<()> {
            match op {
                SysIoOp::WriteInt => {
                    let v = machine.pop_word()?;
                    self.written.push(v as i32);
                }
                SysIoOp::WriteLn => {
                    self.newlines += 1;
                }
                SysIoOp::WriteLong | SysIoOp::WriteULong => {
                    let v = machine.pop_long()?;
                    self.written.push(v);
                }
                _ => return Err(Error::runtime("unexpected sysio in test host")),
            }
            Ok(())
        }
        fn lib(&mut self, _op: LibOp, _machine: &mut Machine<'_>) -> Result<()> {
            Err(Error::runtime("unused"))
        }
        fn setop(&mut self, _op: SetOp, _machine: &mut Machine<'_>) -> Result<()> {
            Err(Error::runtime("unused"))
        }
        fn float(&mut self, _op: FloatOp, _machine: &mut Machine<'_>) -> Result<()> {
            Err(Error::runtime("unused"))
        }
        fn getenv(&mut self, _machine: &mut Machine<'_>) -> Result<()> {
            Err(Error::runtime("unused"))
        }
    }

    fn run_program(ops: &[Opcode]) -> (i32, RecordingHost) {
        let bytes = assemble(ops);
        let mut machine = Machine::new(
            &bytes,
            &[],
            0,
            DEFAULT_GLOBALS,
            DEFAULT_STACK,
            DEFAULT_STRSTACK,
            DEFAULT_HEAP,
        );
        let mut host = RecordingHost::default();
        let code = run(&mut machine, &mut host).expect("program runs to completion");
        (code, host)
    }

    #[test]
    fn writeln_three_plus_four_prints_seven() {
        let program = [
            push_byte(3),
            push_byte(4),
            Opcode::bare(LogicalOp::Add),
            Opcode::new(LogicalOp::SysIo, SysIoOp::WriteInt.to_u8() as i32, 0).unwrap(),
            Opcode::new(LogicalOp::SysIo, SysIoOp::WriteLn.to_u8() as i32, 0).unwrap(),
            push_byte(0),
            Opcode::new(LogicalOp::OsOp, OsOp::Exit.to_u8() as i32, 0).unwrap(),
        ];
        let (code, host) = run_program(&program);
        assert_eq!(code, 0);
        assert_eq!(host.written, vec![7]);
        assert_eq!(host.newlines, 1);
    }

    #[test]
    fn bitwise_and() {
        let program = [
            push_byte(0b1100),
            push_byte(0b1010),
            Opcode::bare(LogicalOp::And),
            Opcode::new(LogicalOp::SysIo, SysIoOp::WriteInt.to_u8() as i32, 0).unwrap(),
            push_byte(0),
            Opcode::new(LogicalOp::OsOp, OsOp::Exit.to_u8() as i32, 0).unwrap(),
        ];
        let (_, host) = run_program(&program);
        assert_eq!(host.written, vec![0b1000]);
    }

    #[test]
    fn divide_by_zero_is_a_runtime_error() {
        let program = [
            push_byte(1),
            push_byte(0),
            Opcode::bare(LogicalOp::Div),
            push_byte(0),
            Opcode::new(LogicalOp::OsOp, OsOp::Exit.to_u8() as i32, 0).unwrap(),
        ];
        let bytes = assemble(&program);
        let mut machine = Machine::new(
            &bytes,
            &[],
            0,
            DEFAULT_GLOBALS,
            DEFAULT_STACK,
            DEFAULT_STRSTACK,
            DEFAULT_HEAP,
        );
        let mut host = RecordingHost::default();
        let err = run(&mut machine, &mut host).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Runtime);
    }

    #[test]
    fn pcal_and_ret_round_trip() {
        // main: PCAL 0, <callee>; PUSHB 0; OSOP exit
        // callee (at the offset just past main): RET
        let callee_offset = 4 /* PCAL */ + 2 /* PUSHB */ + 2 /* OSOP */;
        let main_ops = [
            Opcode::new(LogicalOp::Pcal, 0, callee_offset as i32).unwrap(),
            push_byte(0),
            Opcode::new(LogicalOp::OsOp, OsOp::Exit.to_u8() as i32, 0).unwrap(),
        ];
        let callee_ops = [Opcode::bare(LogicalOp::Ret)];
        let mut bytes = assemble(&main_ops);
        assert_eq!(bytes.len(), callee_offset);
        bytes.extend_from_slice(&assemble(&callee_ops));

        let mut machine = Machine::new(
            &bytes,
            &[],
            0,
            DEFAULT_GLOBALS,
            DEFAULT_STACK,
            DEFAULT_STRSTACK,
            DEFAULT_HEAP,
        );
        let mut host = RecordingHost::default();
        let code = run(&mut machine, &mut host).expect("program runs to completion");
        assert_eq!(code, 0);
    }

    #[test]
    fn field_offsets_store_and_load_like_a_record() {
        // ST 0 / ST 2 write two "fields" at offsets 0 and 2 from the
        // current frame; LD 0 / LD 2 read them back, as WITH-record field
        // access lowers to.
        let program = [
            push_byte(42),
            Opcode::new(LogicalOp::St, 0, 0).unwrap(),
            push_byte(7),
            Opcode::new(LogicalOp::St, 0, 2).unwrap(),
            Opcode::new(LogicalOp::Ld, 0, 0).unwrap(),
            Opcode::new(LogicalOp::Ld, 0, 2).unwrap(),
            Opcode::bare(LogicalOp::Add),
            Opcode::new(LogicalOp::SysIo, SysIoOp::WriteInt.to_u8() as i32, 0).unwrap(),
            push_byte(0),
            Opcode::new(LogicalOp::OsOp, OsOp::Exit.to_u8() as i32, 0).unwrap(),
        ];
        let (code, host) = run_program(&program);
        assert_eq!(code, 0);
        assert_eq!(host.written, vec![49]);
    }

    #[test]
    fn cnvd_sign_extends_and_ucnvd_zero_extends() {
        // 0xff as PUSHB's byte is the signed constant -1; CNVD widens it to
        // -1i32, UCNVD widens the same bit pattern to 65535.
        let program = [
            push_byte(0xff),
            Opcode::new(LogicalOp::LongOp8, DOp::Cnvd.to_u8() as i32, 0).unwrap(),
            Opcode::new(LogicalOp::SysIo, SysIoOp::WriteLong.to_u8() as i32, 0).unwrap(),
            push_byte(0xff),
            Opcode::new(LogicalOp::LongOp8, DOp::UCnvd.to_u8() as i32, 0).unwrap(),
            Opcode::new(LogicalOp::SysIo, SysIoOp::WriteULong.to_u8() as i32, 0).unwrap(),
            push_byte(0),
            Opcode::new(LogicalOp::OsOp, OsOp::Exit.to_u8() as i32, 0).unwrap(),
        ];
        let (code, host) = run_program(&program);
        assert_eq!(code, 0);
        assert_eq!(host.written, vec![-1, 0xFFFF]);
    }
}
