//! Mnemonic Classifier Tests.
//!
//! Verifies tokenization, register-name mapping, and per-shape operand
//! extraction from textual disassembly. All inputs carry the raw-encoding
//! token first, the way the host's disassembler emits them.

use rvprobe_core::deptrace::decode::{classify, regno, tokenize, AddrSource, InsnShape};

// ──────────────────────────────────────────────────────────
// ABI register indices used below:
//   ra=1, sp=2, t0=5, t1=6, a0=10, a1=11, a2=12, t3=28
// ──────────────────────────────────────────────────────────

// ══════════════════════════════════════════════════════════
// 1. Tokenizer and Register Names
// ══════════════════════════════════════════════════════════

/// Splitting happens on every non-alphanumeric character and folds case.
#[test]
fn tokenize_splits_and_folds() {
    assert_eq!(
        tokenize("00B50533 AMOADD.W.AQ A0, A1, (A2)"),
        vec!["00b50533", "amoadd", "w", "aq", "a0", "a1", "a2"]
    );
    assert_eq!(tokenize("deadbeef ld a1,-8(sp)"), vec![
        "deadbeef", "ld", "a1", "8", "sp"
    ]);
}

/// All 32 ABI names map to their indices; anything else is unused.
#[test]
fn regno_maps_abi_names() {
    assert_eq!(regno("zero"), Some(0));
    assert_eq!(regno("ra"), Some(1));
    assert_eq!(regno("sp"), Some(2));
    assert_eq!(regno("a0"), Some(10));
    assert_eq!(regno("s11"), Some(27));
    assert_eq!(regno("t6"), Some(31));
    assert_eq!(regno("x10"), None);
    assert_eq!(regno("fa0"), None);
    assert_eq!(regno("8"), None);
}

// ══════════════════════════════════════════════════════════
// 2. Register/Register and Immediate Shapes
// ══════════════════════════════════════════════════════════

/// `add rd, rs1, rs2`: three integer operands, no address.
#[test]
fn classify_register_register() {
    let d = classify(0x1000, "00c58533 add a0, a1, a2");
    assert_eq!(d.shape, InsnShape::RdRs1Rs2);
    assert_eq!(d.rd, Some(10));
    assert_eq!(d.rs1, Some(11));
    assert_eq!(d.rs2, Some(12));
    assert_eq!(d.addr_source, AddrSource::None);
}

/// `lui`/`auipc`/`jal` synthesize an address into rd.
#[test]
fn classify_rd_imm_sets_rd_address() {
    for disas in [
        "000102b7 lui t0, 16",
        "00010297 auipc t0, 16",
        "008002ef jal t0, 8",
    ] {
        let d = classify(0x1000, disas);
        assert_eq!(d.shape, InsnShape::RdImm, "{}", disas);
        assert_eq!(d.rd, Some(5));
        assert_eq!(d.rs1, None);
        assert_eq!(d.rs2, None);
        assert_eq!(d.addr_source, AddrSource::Rd);
    }
}

/// `addi` is plain arithmetic, but `jalr` consumes an address in rs1.
#[test]
fn classify_rd_rs1_imm_distinguishes_jalr() {
    let d = classify(0x1000, "01050513 addi a0, a0, 16");
    assert_eq!(d.shape, InsnShape::RdRs1Imm);
    assert_eq!(d.rd, Some(10));
    assert_eq!(d.rs1, Some(10));
    assert_eq!(d.addr_source, AddrSource::None);

    let d = classify(0x1000, "000300e7 jalr ra, t1, 0");
    assert_eq!(d.shape, InsnShape::RdRs1Imm);
    assert_eq!(d.rd, Some(1));
    assert_eq!(d.rs1, Some(6));
    assert_eq!(d.addr_source, AddrSource::Rs1);
}

/// Branches read two sources and write nothing.
#[test]
fn classify_branch() {
    let d = classify(0x1000, "00b50463 beq a0, a1, 8");
    assert_eq!(d.shape, InsnShape::Rs1Rs2Offset);
    assert_eq!(d.rd, None);
    assert_eq!(d.rs1, Some(10));
    assert_eq!(d.rs2, Some(11));
    assert_eq!(d.addr_source, AddrSource::None);
}

// ══════════════════════════════════════════════════════════
// 3. Loads and Stores
// ══════════════════════════════════════════════════════════

/// `ld rd, offset(rs1)`: the offset token sits between rd and rs1.
#[test]
fn classify_load() {
    let d = classify(0x1000, "0005b503 ld a0, 0(a1)");
    assert_eq!(d.shape, InsnShape::RdOffsetRs1);
    assert_eq!(d.rd, Some(10));
    assert_eq!(d.rs1, Some(11));
    assert_eq!(d.rs2, None);
    assert_eq!(d.addr_source, AddrSource::Rs1);
}

/// `sd rs2, offset(rs1)`: the data register comes first in the text.
#[test]
fn classify_store() {
    let d = classify(0x1000, "00a5b023 sd a0, 0(a1)");
    assert_eq!(d.shape, InsnShape::Rs2OffsetRs1);
    assert_eq!(d.rd, None);
    assert_eq!(d.rs2, Some(10));
    assert_eq!(d.rs1, Some(11));
    assert_eq!(d.addr_source, AddrSource::Rs1);
}

// ══════════════════════════════════════════════════════════
// 4. Atomics
// ══════════════════════════════════════════════════════════

/// `lr` skips width and ordering suffix tokens until a register appears;
/// the first register token is recorded as rs2, the second as rs1.
#[test]
fn classify_load_reserved_skips_suffixes() {
    let d = classify(0x1000, "140525af lr.w.aq a1, (a0)");
    assert_eq!(d.shape, InsnShape::AqrlRdRs1);
    assert_eq!(d.rd, None);
    assert_eq!(d.rs2, Some(11));
    assert_eq!(d.rs1, Some(10));
    assert_eq!(d.addr_source, AddrSource::Rs1);
}

/// `amoadd.d rd, rs2, (rs1)`: three registers after the suffix tokens.
#[test]
fn classify_amo() {
    let d = classify(0x1000, "00b535af amoadd.d a1, a1, (a0)");
    assert_eq!(d.shape, InsnShape::AqrlRdRs2Rs1);
    assert_eq!(d.rd, Some(11));
    assert_eq!(d.rs2, Some(11));
    assert_eq!(d.rs1, Some(10));
    assert_eq!(d.addr_source, AddrSource::Rs1);
}

/// `sc.w.rl rd, rs2, (rs1)` with two suffix tokens.
#[test]
fn classify_store_conditional() {
    let d = classify(0x1000, "1ea5a52f sc.w.rl a0, a0, (a1)");
    assert_eq!(d.shape, InsnShape::AqrlRdRs2Rs1);
    assert_eq!(d.rd, Some(10));
    assert_eq!(d.rs2, Some(10));
    assert_eq!(d.rs1, Some(11));
    assert_eq!(d.addr_source, AddrSource::Rs1);
}

// ══════════════════════════════════════════════════════════
// 5. System and CSR Shapes
// ══════════════════════════════════════════════════════════

/// `sfence.vma rs1, rs2`: the mnemonic suffix shifts the operands.
#[test]
fn classify_sfence() {
    let d = classify(0x1000, "12b50073 sfence.vma a0, a1");
    assert_eq!(d.shape, InsnShape::Rs1Rs2);
    assert_eq!(d.rs1, Some(10));
    assert_eq!(d.rs2, Some(11));
    assert_eq!(d.addr_source, AddrSource::Rs1);
}

/// Bare `sfence.vma` has no register operands; the address source is
/// dropped to keep the rs1 invariant.
#[test]
fn classify_bare_sfence_drops_address_source() {
    let d = classify(0x1000, "12000073 sfence.vma");
    assert_eq!(d.shape, InsnShape::Rs1Rs2);
    assert_eq!(d.rs1, None);
    assert_eq!(d.addr_source, AddrSource::None);
}

/// CSR ops never mark an address.
#[test]
fn classify_csr() {
    let d = classify(0x1000, "300512f3 csrrw t0, mstatus, a0");
    assert_eq!(d.shape, InsnShape::RdCsrRs1);
    assert_eq!(d.rd, Some(5));
    assert_eq!(d.rs1, Some(10));
    assert_eq!(d.addr_source, AddrSource::None);

    let d = classify(0x1000, "30015073 csrrwi zero, mstatus, 2");
    assert_eq!(d.shape, InsnShape::RdCsrZimm);
    assert_eq!(d.addr_source, AddrSource::None);
}

// ══════════════════════════════════════════════════════════
// 6. Floating Point
// ══════════════════════════════════════════════════════════

/// Float loads consume an integer base address in rs1.
#[test]
fn classify_float_load() {
    let d = classify(0x1000, "0005a507 flw fa0, 0(a1)");
    assert_eq!(d.shape, InsnShape::FrdOffsetRs1);
    assert_eq!(d.rd, None);
    assert_eq!(d.rs1, Some(11));
    assert_eq!(d.addr_source, AddrSource::Rs1);
}

/// Float arithmetic carries no integer operands at all.
#[test]
fn classify_float_arith() {
    let d = classify(0x1000, "00b57553 fadd.d fa0, fa0, fa1");
    assert_eq!(d.shape, InsnShape::Fp);
    assert_eq!(d.rd, None);
    assert_eq!(d.rs1, None);
    assert_eq!(d.rs2, None);
    assert_eq!(d.addr_source, AddrSource::None);
}

// ══════════════════════════════════════════════════════════
// 7. No-Operand and Unknown Mnemonics
// ══════════════════════════════════════════════════════════

/// Fences and environment calls have no register operands.
#[test]
fn classify_no_operand_shapes() {
    for disas in ["0ff0000f fence", "00000073 ecall", "10500073 wfi"] {
        let d = classify(0x1000, disas);
        assert_eq!(d.shape, InsnShape::None, "{}", disas);
        assert_eq!(d.addr_source, AddrSource::None);
    }
}

/// Unrecognized mnemonics decode to the zero state: shape none, all
/// registers unused, no address source.
#[test]
fn classify_unknown_mnemonic_is_zeroed() {
    let d = classify(0x1000, "deadbeef frobnicate a0, a1");
    assert_eq!(d.shape, InsnShape::None);
    assert_eq!(d.rd, None);
    assert_eq!(d.rs1, None);
    assert_eq!(d.rs2, None);
    assert_eq!(d.addr_source, AddrSource::None);
}

/// A disassembly too short to carry a mnemonic is also zeroed.
#[test]
fn classify_short_disassembly() {
    let d = classify(0x1000, "0000");
    assert_eq!(d.shape, InsnShape::None);
    assert_eq!(d.addr_source, AddrSource::None);
}

/// The decode keeps the original text and address for chain output.
#[test]
fn classify_preserves_text_and_vaddr() {
    let d = classify(0x8000_1234, "0005b503 ld a0, 0(a1)");
    assert_eq!(d.vaddr, 0x8000_1234);
    assert_eq!(d.disas, "0005b503 ld a0, 0(a1)");
}
