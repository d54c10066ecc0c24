//! RISC-V mnemonic classifier and operand extraction.
//!
//! Classification works on the host's textual disassembly rather than the
//! raw encoding: the text is tokenized by splitting on non-alphanumeric
//! characters and lowercasing, so `"amoadd.w.aq a0, a1, (a2)"` becomes
//! `["amoadd", "w", "aq", "a0", "a1", "a2"]` after the leading raw-encoding
//! token. Token 0 is that raw encoding, token 1 the mnemonic; the mnemonic
//! selects one of a fixed set of operand shapes, and the shape dictates
//! which token positions hold `rd`, `rs1`, and `rs2`.
//!
//! Each shape also says whether an operand register is known to hold a
//! memory address: loads, stores, atomics, and `sfence` consume an address
//! in `rs1`; `lui`/`auipc`/`jal` synthesize one into `rd`.

/// ABI names of the integer registers x0 to x31.
pub const IREG_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Maps an ABI register name to its index, or `None` for anything that is
/// not an integer register name.
pub fn regno(token: &str) -> Option<u8> {
    IREG_NAMES
        .iter()
        .position(|&name| name == token)
        .map(|i| i as u8)
}

/// Operand shape of a mnemonic, keyed on how registers appear in the
/// disassembly text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsnShape {
    /// `add rd, rs1, rs2` and friends.
    RdRs1Rs2,
    /// `lui rd, imm`: rd receives an address-like value.
    RdImm,
    /// `addi rd, rs1, imm`; `jalr` consumes an address in rs1.
    RdRs1Imm,
    /// Conditional branches: `beq rs1, rs2, offset`.
    Rs1Rs2Offset,
    /// Integer loads: `lw rd, offset(rs1)`.
    RdOffsetRs1,
    /// Integer stores: `sw rs2, offset(rs1)`.
    Rs2OffsetRs1,
    /// Load-reserved: `lr.w[.aq[.rl]] rd, (rs1)`.
    AqrlRdRs1,
    /// Store-conditional and AMOs: `sc.w rd, rs2, (rs1)`.
    AqrlRdRs2Rs1,
    /// `sfence.vma rs1, rs2`.
    Rs1Rs2,
    /// CSR ops with a register source.
    RdCsrRs1,
    /// CSR ops with an immediate source.
    RdCsrZimm,
    /// Float loads: the destination is a float register.
    FrdOffsetRs1,
    /// Float stores: the source is a float register.
    Frs2OffsetRs1,
    /// Float arithmetic; never carries an address.
    Fp,
    /// No integer-register operands (fences, ecall, ...), or an
    /// unrecognized mnemonic.
    None,
}

/// Which operand position of an instruction is known to hold an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrSource {
    /// No operand is known to be an address.
    None,
    /// The destination receives an address (`lui`, `auipc`, `jal`).
    Rd,
    /// `rs1` is consumed as an effective address.
    Rs1,
}

/// A classified instruction, ready for history recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsnDecode {
    /// Textual disassembly, kept for chain output.
    pub disas: String,
    /// Virtual address of the instruction.
    pub vaddr: u64,
    /// Operand shape the mnemonic matched.
    pub shape: InsnShape,
    /// Destination register, when the shape defines one.
    pub rd: Option<u8>,
    /// First source register.
    pub rs1: Option<u8>,
    /// Second source register.
    pub rs2: Option<u8>,
    /// Address-carrying operand position.
    pub addr_source: AddrSource,
}

/// Mnemonic lists per shape, checked in order; the first list containing
/// the mnemonic wins.
const SHAPE_TABLE: &[(InsnShape, &[&str])] = &[
    (
        InsnShape::RdRs1Rs2,
        &[
            "add", "sub", "sll", "slt", "sltu", "xor", "srl", "sra", "or", "and", "addw", "subw",
            "sllw", "srlw", "sraw", "addd", "subd", "slld", "srld", "srad", "mul", "mulh",
            "mulhsu", "mulhu", "div", "divu", "rem", "remu", "mulw", "divw", "divuw", "remw",
            "remuw", "muld", "divd", "divud", "remd", "remud",
        ],
    ),
    (InsnShape::RdImm, &["lui", "auipc", "jal"]),
    (
        InsnShape::RdRs1Imm,
        &[
            "jalr", "addi", "slti", "sltiu", "xori", "ori", "andi", "slli", "srli", "srai",
            "addiw", "slliw", "srliw", "sraiw", "addid", "sllid", "srlid", "sraid",
        ],
    ),
    (
        InsnShape::Rs1Rs2Offset,
        &["beq", "bne", "blt", "bge", "bltu", "bgeu"],
    ),
    (
        InsnShape::RdOffsetRs1,
        &["lb", "lh", "lw", "lbu", "lhu", "lwu", "ld", "ldu", "lq"],
    ),
    (InsnShape::Rs2OffsetRs1, &["sb", "sh", "sw", "sd", "sq"]),
    (InsnShape::AqrlRdRs1, &["lr"]),
    (
        InsnShape::AqrlRdRs2Rs1,
        &[
            "sc", "amoswap", "amoadd", "amoxor", "amoor", "amoand", "amomin", "amomax", "amominu",
            "amomaxu",
        ],
    ),
    (InsnShape::Rs1Rs2, &["sfence"]),
    (InsnShape::RdCsrRs1, &["csrrw", "csrrs", "csrrc"]),
    (InsnShape::RdCsrZimm, &["csrrwi", "csrrsi", "csrrci"]),
    (InsnShape::FrdOffsetRs1, &["flw", "fld", "flq"]),
    (InsnShape::Frs2OffsetRs1, &["fsw", "fsd", "fsq"]),
    (
        InsnShape::Fp,
        &[
            "fmadd", "fmsub", "fnmsub", "fnmadd", "fadd", "fsub", "fmul", "fdiv", "fsgnj",
            "fsgnjn", "fsgnjx", "fmin", "fmax", "fsqrt",
            // These read integer registers, but never as an address.
            "fle", "flt", "feq", "fcvt", "fmv", "fclass",
        ],
    ),
    (
        InsnShape::None,
        &[
            "illegal", "fence", "ecall", "ebreak", "uret", "sret", "hret", "mret", "dret", "wfi",
        ],
    ),
];

/// Splits a disassembly string into lowercase alphanumeric tokens.
pub fn tokenize(disas: &str) -> Vec<String> {
    disas
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Looks up the shape of a mnemonic.
fn shape_of(mnemonic: &str) -> Option<InsnShape> {
    SHAPE_TABLE
        .iter()
        .find(|(_, mnemonics)| mnemonics.contains(&mnemonic))
        .map(|&(shape, _)| shape)
}

/// Classifies one instruction from its disassembly text.
///
/// Unrecognized mnemonics are logged and decoded with shape
/// [`InsnShape::None`], all registers unused, and no address source; they
/// never participate in a dependency chain. If operand extraction leaves
/// `rs1` unused, an `rs1` address source is dropped as well.
pub fn classify(vaddr: u64, disas: &str) -> InsnDecode {
    let tokens = tokenize(disas);

    let mut decode = InsnDecode {
        disas: disas.to_string(),
        vaddr,
        shape: InsnShape::None,
        rd: None,
        rs1: None,
        rs2: None,
        addr_source: AddrSource::None,
    };

    let Some(mnemonic) = tokens.get(1) else {
        return decode;
    };
    let Some(shape) = shape_of(mnemonic) else {
        eprintln!("unrecognized mnemonic, skipping: {}", disas);
        return decode;
    };
    decode.shape = shape;

    let reg = |i: usize| tokens.get(i).and_then(|t| regno(t));
    // Atomics carry width and ordering suffixes before the first register
    // operand; skip tokens until one names an integer register.
    let first_reg_token = || {
        (2..tokens.len())
            .find(|&i| regno(&tokens[i]).is_some())
            .unwrap_or(tokens.len())
    };

    match shape {
        InsnShape::RdRs1Rs2 => {
            decode.rd = reg(2);
            decode.rs1 = reg(3);
            decode.rs2 = reg(4);
        }
        InsnShape::RdImm => {
            decode.rd = reg(2);
            decode.addr_source = AddrSource::Rd;
        }
        InsnShape::RdRs1Imm => {
            decode.rd = reg(2);
            decode.rs1 = reg(3);
            // jalr jumps through rs1; the other immediates are plain
            // arithmetic.
            if mnemonic.starts_with('j') {
                decode.addr_source = AddrSource::Rs1;
            }
        }
        InsnShape::Rs1Rs2Offset => {
            decode.rs1 = reg(2);
            decode.rs2 = reg(3);
        }
        InsnShape::RdOffsetRs1 => {
            decode.rd = reg(2);
            decode.rs1 = reg(4);
            decode.addr_source = AddrSource::Rs1;
        }
        InsnShape::Rs2OffsetRs1 => {
            decode.rs2 = reg(2);
            decode.rs1 = reg(4);
            decode.addr_source = AddrSource::Rs1;
        }
        InsnShape::AqrlRdRs1 => {
            let k = first_reg_token();
            decode.rs2 = reg(k);
            decode.rs1 = reg(k + 1);
            decode.addr_source = AddrSource::Rs1;
        }
        InsnShape::AqrlRdRs2Rs1 => {
            let k = first_reg_token();
            decode.rd = reg(k);
            decode.rs2 = reg(k + 1);
            decode.rs1 = reg(k + 2);
            decode.addr_source = AddrSource::Rs1;
        }
        InsnShape::Rs1Rs2 => {
            decode.rs1 = reg(3);
            decode.rs2 = reg(4);
            decode.addr_source = AddrSource::Rs1;
        }
        InsnShape::RdCsrRs1 => {
            decode.rd = reg(2);
            decode.rs1 = reg(4);
        }
        InsnShape::RdCsrZimm => {
            decode.rd = reg(3);
        }
        InsnShape::FrdOffsetRs1 => {
            decode.rs1 = reg(4);
            decode.addr_source = AddrSource::Rs1;
        }
        InsnShape::Frs2OffsetRs1 => {
            decode.rs1 = reg(3);
            decode.addr_source = AddrSource::Rs1;
        }
        InsnShape::Fp | InsnShape::None => {}
    }

    // An rs1 address source is only meaningful with a known rs1.
    if decode.addr_source == AddrSource::Rs1 && decode.rs1.is_none() {
        decode.addr_source = AddrSource::None;
    }

    decode
}
