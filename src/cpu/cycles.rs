//! オペコードごとのベースサイクルコスト表
//!
//! ペナルティ（ページ跨ぎ・分岐成立・BCDモード）は各ハンドラが
//! `snap.opcycles`に加算する。未定義スロットは固定7サイクル。

/// 65C02 全256オペコードのベースサイクル数
#[rustfmt::skip]
pub static OPCYCLES: [u8; 256] = [
    // 0  1  2  3  4  5  6  7  8  9  A  B  C  D  E  F
       7, 6, 7, 7, 5, 3, 5, 5, 3, 2, 2, 7, 6, 4, 6, 5, // 0x BRK ORA TSB ASL PHP
       2, 5, 5, 7, 5, 4, 6, 5, 2, 4, 2, 7, 6, 4, 6, 5, // 1x BPL ORA TRB ASL CLC INA
       6, 6, 7, 7, 3, 3, 5, 5, 4, 2, 2, 7, 4, 4, 6, 5, // 2x JSR AND BIT ROL PLP
       2, 5, 5, 7, 4, 4, 6, 5, 2, 4, 2, 7, 4, 4, 6, 5, // 3x BMI AND BIT ROL SEC DEA
       6, 6, 7, 7, 7, 3, 5, 5, 3, 2, 2, 7, 3, 4, 6, 5, // 4x RTI EOR LSR PHA JMP
       2, 5, 5, 7, 7, 4, 6, 5, 2, 4, 3, 7, 7, 4, 6, 5, // 5x BVC EOR LSR CLI PHY
       6, 6, 7, 7, 3, 3, 5, 5, 4, 2, 2, 7, 6, 4, 6, 5, // 6x RTS ADC STZ ROR PLA JMP(ind)
       2, 5, 5, 7, 4, 4, 6, 5, 2, 4, 4, 7, 6, 4, 6, 5, // 7x BVS ADC STZ ROR SEI PLY
       2, 6, 7, 7, 3, 3, 3, 5, 2, 2, 2, 7, 4, 4, 4, 5, // 8x BRA STA STY STX DEY BIT# TXA
       2, 6, 5, 7, 4, 4, 4, 5, 2, 5, 2, 7, 4, 5, 5, 5, // 9x BCC STA TYA TXS STZ
       2, 6, 2, 7, 3, 3, 3, 5, 2, 2, 2, 7, 4, 4, 4, 5, // Ax LDY LDA LDX TAY TAX
       2, 5, 5, 7, 4, 4, 4, 5, 2, 4, 2, 7, 4, 4, 4, 5, // Bx BCS LDA CLV TSX
       2, 6, 7, 7, 3, 3, 5, 5, 2, 2, 2, 7, 4, 4, 6, 5, // Cx CPY CMP DEC INY DEX WAI
       2, 5, 5, 7, 7, 4, 6, 5, 2, 4, 3, 7, 7, 4, 6, 5, // Dx BNE CMP DEC CLD PHX STP
       2, 6, 7, 7, 3, 3, 5, 5, 2, 2, 2, 7, 4, 4, 6, 5, // Ex CPX SBC INC INX NOP
       2, 5, 5, 7, 7, 4, 6, 5, 2, 4, 4, 7, 7, 4, 6, 5, // Fx BEQ SBC INC SED PLX
];
