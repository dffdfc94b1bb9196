//! Instruction decode.
//!
//! Every instruction is one 16-bit word, occasionally followed by a second
//! word of immediate data. The top bits of the first word select one of
//! four shapes:
//!
//! ```text
//! 0000 ssss rrrrrrrr    miscellaneous (ssss = subcode, rrrrrrrr = operand byte)
//! 001o orrrr0mmmmmm     load/store    (oo = op, rrrr = reg, mmmmmm = addr mode)
//! 01oo oo aaaaaaaaaa    jump          (oooo = condition/call, aa.. = offset)
//! 1ooooo ddddssssss     arithmetic    (ooooo = op, dddd = dest, ssssss = src)
//! ```
//!
//! `0001` is unused and always decodes to [`Instruction::Illegal`].

use modular_bitfield::prelude::*;

#[bitfield(bits = 16)]
#[derive(Debug, Clone, Copy)]
#[repr(u16)]
struct MiscBits {
    rest: B8,
    subcode: B4,
    #[skip]
    __: B4,
}

#[bitfield(bits = 16)]
#[derive(Debug, Clone, Copy)]
#[repr(u16)]
struct LoadStoreBits {
    mem_id: B6,
    #[skip]
    __: B1,
    reg_id: B4,
    op: B2,
    #[skip]
    __: B3,
}

#[bitfield(bits = 16)]
#[derive(Debug, Clone, Copy)]
#[repr(u16)]
struct JumpBits {
    offset: B10,
    op: B4,
    #[skip]
    __: B2,
}

#[bitfield(bits = 16)]
#[derive(Debug, Clone, Copy)]
#[repr(u16)]
struct ArithBits {
    src_idx: B6,
    dest_idx: B4,
    op: B5,
    #[skip]
    __: B1,
}

/// Where an arithmetic instruction's second operand comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Register(u8),
    /// A 4-bit immediate encoded directly in the instruction word.
    SmallImmediate(u8),
    /// A 16-bit immediate in the word immediately following the instruction.
    Immediate,
    /// The literal `0xFFFF` (-1), encoded with no trailing word.
    NegativeOne,
}

fn decode_operand(src_idx: u8) -> Option<Operand> {
    match src_idx {
        0x00..=0x0F => Some(Operand::Register(src_idx & 0xF)),
        0x10..=0x1F => Some(Operand::SmallImmediate(src_idx & 0xF)),
        0x20 => Some(Operand::Immediate),
        0x21 => Some(Operand::NegativeOne),
        _ => None,
    }
}

/// Where a load/store instruction's address comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    Register(u8),
    /// Register plus a 16-bit immediate offset following the instruction.
    RegisterOffset(u8),
    /// A bare 16-bit immediate address following the instruction.
    Absolute,
}

fn decode_addr_mode(mem_id: u8) -> Option<AddrMode> {
    match mem_id {
        0x00..=0x0F => Some(AddrMode::Register(mem_id & 0xF)),
        0x10..=0x1F => Some(AddrMode::RegisterOffset(mem_id & 0xF)),
        0x20 => Some(AddrMode::Absolute),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStoreOp {
    LoadWord,
    LoadByte,
    StoreWord,
    StoreByte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpCond {
    Always,
    Equal,
    NotEqual,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    GreaterThan,
    /// Also pushes the return address, like `Always` with a side effect.
    Call,
}

impl JumpCond {
    fn decode(op: u8) -> Option<Self> {
        Some(match op {
            0 => JumpCond::Always,
            1 => JumpCond::Equal,
            2 => JumpCond::NotEqual,
            3 => JumpCond::LessThan,
            4 => JumpCond::GreaterOrEqual,
            5 => JumpCond::LessOrEqual,
            6 => JumpCond::GreaterThan,
            15 => JumpCond::Call,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiscOp {
    Nop,
    /// Set `WAIT`; the instruction's own PC advance still happens.
    Halt,
    Stop,
    /// Pop the return address off the stack and jump to it.
    Return,
    /// Pop the return address and schedule `INTERRUPT_ENABLE_NEXT`.
    ReturnFromInterrupt,
    DisableInterrupts,
    EnableInterrupts,
    Push(u8),
    Pop(u8),
    /// Jump to the address held in a register.
    JumpRegister(u8),
    Swap(u8, u8),
}

/// The full arithmetic/logic operation table, opcodes `$00`-`$1F`. Each
/// variant owns its flag behavior in `Cpu::exec_arith` rather than sharing
/// a blanket post-instruction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Mov,
    Add,
    Sub,
    MulUnsigned,
    MulSigned,
    DivUnsigned,
    DivSigned,
    ModUnsigned,
    ModSigned,
    And,
    Or,
    Xor,
    Not,
    Neg,
    Inc,
    Dec,
    Shl,
    Shr,
    Sar,
    RotateLeft,
    RotateRight,
    BitTest,
    Adc,
    Sbc,
    MulCarry,
    CmpUnsigned,
    CmpSigned,
}

impl ArithOp {
    fn decode(op: u8) -> Option<Self> {
        Some(match op {
            0x00 => ArithOp::Mov,
            0x01 => ArithOp::Add,
            0x02 => ArithOp::Sub,
            0x03 => ArithOp::MulUnsigned,
            0x04 => ArithOp::MulSigned,
            0x05 => ArithOp::DivUnsigned,
            0x06 => ArithOp::DivSigned,
            0x07 => ArithOp::ModUnsigned,
            0x08 => ArithOp::ModSigned,
            0x09 => ArithOp::And,
            0x0A => ArithOp::Or,
            0x0B => ArithOp::Xor,
            0x0C => ArithOp::Not,
            0x0D => ArithOp::Neg,
            0x0E => ArithOp::Inc,
            0x0F => ArithOp::Dec,
            0x10 => ArithOp::Shl,
            0x11 => ArithOp::Shr,
            0x12 => ArithOp::Sar,
            0x13 => ArithOp::RotateLeft,
            0x14 => ArithOp::RotateRight,
            0x15 => ArithOp::BitTest,
            0x16 => ArithOp::Adc,
            0x17 => ArithOp::Sbc,
            0x18 => ArithOp::MulCarry,
            0x1E => ArithOp::CmpUnsigned,
            0x1F => ArithOp::CmpSigned,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Misc(MiscOp),
    Jump {
        cond: JumpCond,
        /// Signed word offset; `None` means the target follows as an
        /// absolute 16-bit immediate instead.
        offset: Option<i16>,
    },
    LoadStore {
        op: LoadStoreOp,
        reg: u8,
        mode: AddrMode,
    },
    Arithmetic {
        op: ArithOp,
        dest: u8,
        src: Operand,
    },
    Illegal(u16),
}

impl Instruction {
    /// Decode one instruction word. Never fails — anything not recognized
    /// becomes [`Instruction::Illegal`], which the CPU turns into a crash.
    pub fn decode(raw: u16) -> Instruction {
        let instrtype = (raw >> 12) & 0xF;

        if instrtype == 0x0 {
            return Self::decode_misc(raw);
        }
        if instrtype & 0xE == 0x2 {
            return Self::decode_load_store(raw);
        }
        if instrtype & 0xC == 0x4 {
            return Self::decode_jump(raw);
        }
        if instrtype & 0x8 == 0x8 {
            return Self::decode_arith(raw);
        }
        Instruction::Illegal(raw)
    }

    fn decode_misc(raw: u16) -> Instruction {
        let bits = MiscBits::from(raw);
        let rest = bits.rest();
        let subcode = bits.subcode();

        let op = match subcode {
            0 => match rest {
                0x01 => Some(MiscOp::Nop),
                0x02 => Some(MiscOp::Halt),
                0xAA => Some(MiscOp::Return),
                0xAB => Some(MiscOp::ReturnFromInterrupt),
                0xDD => Some(MiscOp::DisableInterrupts),
                0xEE => Some(MiscOp::EnableInterrupts),
                0xFF => Some(MiscOp::Stop),
                _ => None,
            },
            1 => Some(MiscOp::Push((rest >> 4) & 0xF)),
            2 => Some(MiscOp::Pop((rest >> 4) & 0xF)),
            3 => Some(MiscOp::JumpRegister((rest >> 4) & 0xF)),
            4 => Some(MiscOp::Swap((rest >> 4) & 0xF, rest & 0xF)),
            _ => None,
        };

        match op {
            Some(op) => Instruction::Misc(op),
            None => Instruction::Illegal(raw),
        }
    }

    fn decode_load_store(raw: u16) -> Instruction {
        let bits = LoadStoreBits::from(raw);
        let op = match bits.op() {
            0 => LoadStoreOp::LoadWord,
            1 => LoadStoreOp::LoadByte,
            2 => LoadStoreOp::StoreWord,
            3 => LoadStoreOp::StoreByte,
            _ => unreachable!("2-bit field"),
        };
        let mode = match decode_addr_mode(bits.mem_id()) {
            Some(mode) => mode,
            None => return Instruction::Illegal(raw),
        };
        Instruction::LoadStore {
            op,
            reg: bits.reg_id(),
            mode,
        }
    }

    fn decode_jump(raw: u16) -> Instruction {
        let bits = JumpBits::from(raw);
        let cond = match JumpCond::decode(bits.op()) {
            Some(cond) => cond,
            None => return Instruction::Illegal(raw),
        };
        let raw_offset = bits.offset();
        let offset = if raw_offset == 0 {
            None
        } else {
            Some(sign_extend_10(raw_offset))
        };
        Instruction::Jump { cond, offset }
    }

    fn decode_arith(raw: u16) -> Instruction {
        let bits = ArithBits::from(raw);
        let op = match ArithOp::decode(bits.op()) {
            Some(op) => op,
            None => return Instruction::Illegal(raw),
        };
        let src = match decode_operand(bits.src_idx()) {
            Some(src) => src,
            None => return Instruction::Illegal(raw),
        };
        Instruction::Arithmetic {
            op,
            dest: bits.dest_idx(),
            src,
        }
    }
}

/// Sign-extend a 10-bit jump offset (measured in words) to `i16`.
fn sign_extend_10(offset: u16) -> i16 {
    let offset = offset & 0x3FF;
    if offset & 0x200 != 0 {
        (offset as i16) - 0x400
    } else {
        offset as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_stop() {
        assert_eq!(Instruction::decode(0x00FF), Instruction::Misc(MiscOp::Stop));
    }

    #[test]
    fn decodes_nop_and_return() {
        assert_eq!(Instruction::decode(0x0001), Instruction::Misc(MiscOp::Nop));
        assert_eq!(Instruction::decode(0x00AA), Instruction::Misc(MiscOp::Return));
    }

    #[test]
    fn decodes_halt_and_interrupt_misc_ops() {
        assert_eq!(Instruction::decode(0x0002), Instruction::Misc(MiscOp::Halt));
        assert_eq!(
            Instruction::decode(0x00AB),
            Instruction::Misc(MiscOp::ReturnFromInterrupt)
        );
        assert_eq!(
            Instruction::decode(0x00DD),
            Instruction::Misc(MiscOp::DisableInterrupts)
        );
        assert_eq!(
            Instruction::decode(0x00EE),
            Instruction::Misc(MiscOp::EnableInterrupts)
        );
    }

    #[test]
    fn decodes_push_pop_jump_register_swap() {
        // subcode 1, register 5 in bits 4-7 of rest
        assert_eq!(Instruction::decode(0x0150), Instruction::Misc(MiscOp::Push(5)));
        assert_eq!(Instruction::decode(0x0250), Instruction::Misc(MiscOp::Pop(5)));
        assert_eq!(
            Instruction::decode(0x0350),
            Instruction::Misc(MiscOp::JumpRegister(5))
        );
        // subcode 4, xxxx=3, yyyy=7
        assert_eq!(
            Instruction::decode(0x0437),
            Instruction::Misc(MiscOp::Swap(3, 7))
        );
    }

    #[test]
    fn decodes_unconditional_relative_jump() {
        // 01 0000 aaaaaaaaaa, op=0, offset=5
        let raw = 0b0100_0000_0000_0101;
        assert_eq!(
            Instruction::decode(raw),
            Instruction::Jump {
                cond: JumpCond::Always,
                offset: Some(5),
            }
        );
    }

    #[test]
    fn decodes_negative_jump_offset() {
        // offset field = 0x3FF = -1
        let raw = 0b0100_0011_1111_1111;
        assert_eq!(
            Instruction::decode(raw),
            Instruction::Jump {
                cond: JumpCond::Always,
                offset: Some(-1),
            }
        );
    }

    #[test]
    fn zero_offset_jump_means_absolute_follows() {
        let raw = 0b0100_1000_0000_0000; // op=2 (not-equal), offset=0
        assert_eq!(
            Instruction::decode(raw),
            Instruction::Jump {
                cond: JumpCond::NotEqual,
                offset: None,
            }
        );
    }

    #[test]
    fn decodes_call() {
        let raw = 0b0101_1110_0000_0011; // op=15 (call), offset=3
        assert_eq!(
            Instruction::decode(raw),
            Instruction::Jump {
                cond: JumpCond::Call,
                offset: Some(3),
            }
        );
    }

    #[test]
    fn undefined_jump_condition_is_illegal() {
        let raw = 0b0100_1110_0000_0011; // op=14, undefined
        assert_eq!(Instruction::decode(raw), Instruction::Illegal(raw));
    }

    #[test]
    fn decodes_load_store_addressing_modes() {
        // prefix 001, op=1 (load byte), reg=2, reserved=0, mem_id=0
        let raw = 0b001_01_0010_0_000000;
        assert_eq!(
            Instruction::decode(raw),
            Instruction::LoadStore {
                op: LoadStoreOp::LoadByte,
                reg: 2,
                mode: AddrMode::Register(0),
            }
        );

        // mem_id=0x20: absolute address follows
        let raw = 0b001_11_0010_0_100000;
        assert_eq!(
            Instruction::decode(raw),
            Instruction::LoadStore {
                op: LoadStoreOp::StoreByte,
                reg: 2,
                mode: AddrMode::Absolute,
            }
        );
    }

    #[test]
    fn decodes_arithmetic_with_register_operand() {
        // op=0x01 (add), dest=3, src_idx=4 (register 4)
        let raw = 0b1_00001_0011_000100;
        assert_eq!(
            Instruction::decode(raw),
            Instruction::Arithmetic {
                op: ArithOp::Add,
                dest: 3,
                src: Operand::Register(4),
            }
        );
    }

    #[test]
    fn decodes_arithmetic_with_small_immediate() {
        // src_idx = 0x10 | 7 -> SmallImmediate(7)
        let raw = 0b1_10001_0000_010111;
        assert_eq!(
            Instruction::decode(raw),
            Instruction::Arithmetic {
                op: ArithOp::Shr,
                dest: 0,
                src: Operand::SmallImmediate(7),
            }
        );
    }

    #[test]
    fn decodes_arithmetic_with_trailing_immediate() {
        let raw = 0b1_00000_0000_100000; // src_idx = 0x20
        assert_eq!(
            Instruction::decode(raw),
            Instruction::Arithmetic {
                op: ArithOp::Mov,
                dest: 0,
                src: Operand::Immediate,
            }
        );
    }

    #[test]
    fn decodes_arithmetic_negative_one_literal() {
        let raw = 0b1_00000_0000_100001; // src_idx = 0x21
        assert_eq!(
            Instruction::decode(raw),
            Instruction::Arithmetic {
                op: ArithOp::Mov,
                dest: 0,
                src: Operand::NegativeOne,
            }
        );
    }

    #[test]
    fn decodes_new_carry_chained_ops() {
        let adc = 0b1_10110_0000_000001; // op=0x16, dest=0, src=reg1
        assert_eq!(
            Instruction::decode(adc),
            Instruction::Arithmetic {
                op: ArithOp::Adc,
                dest: 0,
                src: Operand::Register(1),
            }
        );
        let sbc = 0b1_10111_0000_000001;
        assert_eq!(
            Instruction::decode(sbc),
            Instruction::Arithmetic {
                op: ArithOp::Sbc,
                dest: 0,
                src: Operand::Register(1),
            }
        );
        let mulc = 0b1_11000_0000_000001;
        assert_eq!(
            Instruction::decode(mulc),
            Instruction::Arithmetic {
                op: ArithOp::MulCarry,
                dest: 0,
                src: Operand::Register(1),
            }
        );
    }

    #[test]
    fn unused_prefix_and_bad_operands_are_illegal() {
        assert_eq!(Instruction::decode(0x1000), Instruction::Illegal(0x1000));
        let bad_src = 0b1_00000_0000_100010; // src_idx = 0x22, undefined
        assert_eq!(Instruction::decode(bad_src), Instruction::Illegal(bad_src));
    }
}
