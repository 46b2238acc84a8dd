//! オペコードの実装
//!
//! 65C02の全オペコードをメソッドとして実装し、256エントリの
//! ディスパッチテーブル`OPCODES`から関数ポインタで呼び出す。
//! 未定義スロットは`unk`（固定7サイクルの1バイトNOP）。

use super::{flags, Cpu, RunState, FLAGS_ENCODE, IRQ_VECTOR};
use crate::vm::Vm;

/// オペコードハンドラの型
pub type OpFn = fn(&mut Cpu, &mut Vm);

impl Cpu {
    //--------------------------------------------------
    // 共通ロジック
    //--------------------------------------------------

    /// ADC共通処理（BCDモードは+1サイクル）
    fn adc(&mut self, value: u8) {
        if self.regs.get_flag(flags::DECIMAL) {
            self.adc_decimal(value);
            self.snap.opcycles += 1;
            return;
        }
        let a = self.regs.a;
        let carry = if self.regs.get_flag(flags::CARRY) { 1u16 } else { 0 };
        let sum = a as u16 + value as u16 + carry;
        let result = sum as u8;
        self.regs.set_flag(flags::CARRY, sum > 0xFF);
        // 同符号の加算で符号が変わったらオーバーフロー
        let sign_a = a & 0x80;
        self.regs.set_flag(
            flags::OVERFLOW,
            sign_a == (value & 0x80) && sign_a != (result & 0x80),
        );
        self.regs.a = result;
        self.regs.update_zero_negative_flags(result);
    }

    /// BCDモードのADC
    ///
    /// ニブル単位の補正。不正なニブル（>9）でも決定的な結果を返す。
    /// Vフラグは変化しない。
    fn adc_decimal(&mut self, value: u8) {
        let a = self.regs.a;
        let mut carry: u8 = if self.regs.get_flag(flags::CARRY) { 1 } else { 0 };

        let mut lo = (a & 0x0F) + (value & 0x0F) + carry;
        carry = 0;
        if lo > 9 {
            lo = lo.wrapping_add(6);
            carry = lo >> 4; // 繰り上がりは1または2
            lo &= 0x0F;
        }
        let mut hi = (a >> 4) + (value >> 4) + carry;
        let mut c = false;
        if hi > 9 {
            c = true;
            hi = hi.wrapping_add(6);
        }
        let result = (hi << 4) | lo;
        self.regs.set_flag(flags::CARRY, c);
        self.regs.update_zero_negative_flags(result);
        self.regs.a = result;
    }

    /// SBC共通処理（BCDモードは+1サイクル）
    fn sbc(&mut self, value: u8) {
        if self.regs.get_flag(flags::DECIMAL) {
            self.sbc_decimal(value);
            self.snap.opcycles += 1;
            return;
        }
        let a = self.regs.a;
        let borrow = if self.regs.get_flag(flags::CARRY) { 0i16 } else { 1 };
        let diff = a as i16 - value as i16 - borrow;
        let result = diff as u8;
        self.regs.set_flag(flags::CARRY, diff >= 0);
        // 異符号の減算で符号が被減数と変わったらオーバーフロー
        let sign_a = a & 0x80;
        self.regs.set_flag(
            flags::OVERFLOW,
            sign_a != (value & 0x80) && sign_a != (result & 0x80),
        );
        self.regs.a = result;
        self.regs.update_zero_negative_flags(result);
    }

    /// BCDモードのSBC
    fn sbc_decimal(&mut self, value: u8) {
        let a = self.regs.a;
        let mut borrow: u8 = if self.regs.get_flag(flags::CARRY) { 0 } else { 1 };

        let mut lo = (a & 0x0F).wrapping_sub(value & 0x0F).wrapping_sub(borrow);
        borrow = 0;
        if lo > 9 {
            borrow = 1;
            lo = lo.wrapping_sub(6);
            lo &= 0x0F;
        }
        let mut hi = (a >> 4).wrapping_sub(value >> 4).wrapping_sub(borrow);
        let mut c = true;
        if hi > 9 {
            c = false;
            hi = hi.wrapping_sub(6);
        }
        let result = (hi << 4) | lo;
        self.regs.set_flag(flags::CARRY, c);
        self.regs.update_zero_negative_flags(result);
        self.regs.a = result;
    }

    /// CMP/CPX/CPY共通処理
    fn compare(&mut self, reg: u8, value: u8) {
        self.regs.set_flag(flags::CARRY, reg >= value);
        self.regs.update_zero_negative_flags(reg.wrapping_sub(value));
    }

    fn asl_core(&mut self, value: u8) -> u8 {
        self.regs.set_flag(flags::CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.regs.update_zero_negative_flags(result);
        result
    }

    fn lsr_core(&mut self, value: u8) -> u8 {
        self.regs.set_flag(flags::CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.regs.update_zero_negative_flags(result);
        result
    }

    fn rol_core(&mut self, value: u8) -> u8 {
        let carry_in = if self.regs.get_flag(flags::CARRY) { 1 } else { 0 };
        self.regs.set_flag(flags::CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.regs.update_zero_negative_flags(result);
        result
    }

    fn ror_core(&mut self, value: u8) -> u8 {
        let carry_in = if self.regs.get_flag(flags::CARRY) { 0x80 } else { 0 };
        self.regs.set_flag(flags::CARRY, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.regs.update_zero_negative_flags(result);
        result
    }

    /// BIT共通処理（即値モード以外）
    fn bit_core(&mut self, value: u8) {
        self.regs.set_flag(flags::ZERO, self.regs.a & value == 0);
        self.regs.set_flag(flags::NEGATIVE, value & 0x80 != 0);
        self.regs.set_flag(flags::OVERFLOW, value & 0x40 != 0);
    }

    //--------------------------------------------------
    // LDA - Load Accumulator
    //--------------------------------------------------
    pub(super) fn lda_immediate(&mut self, vm: &mut Vm) {
        self.regs.a = self.get_immediate(vm);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        self.regs.a = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        self.regs.a = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        self.regs.a = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        self.regs.a = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_absolute_y(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_y_addr(vm, true);
        self.regs.a = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_indirect_x(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_x_addr(vm);
        self.regs.a = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_indirect_y(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_y_addr(vm, true);
        self.regs.a = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_indirect(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_zp_addr(vm);
        self.regs.a = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    //--------------------------------------------------
    // LDX - Load X Register
    //--------------------------------------------------
    pub(super) fn ldx_immediate(&mut self, vm: &mut Vm) {
        self.regs.x = self.get_immediate(vm);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn ldx_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        self.regs.x = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn ldx_zeropage_y(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_y_addr(vm);
        self.regs.x = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn ldx_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        self.regs.x = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn ldx_absolute_y(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_y_addr(vm, true);
        self.regs.x = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    //--------------------------------------------------
    // LDY - Load Y Register
    //--------------------------------------------------
    pub(super) fn ldy_immediate(&mut self, vm: &mut Vm) {
        self.regs.y = self.get_immediate(vm);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    pub(super) fn ldy_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        self.regs.y = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    pub(super) fn ldy_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        self.regs.y = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    pub(super) fn ldy_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        self.regs.y = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    pub(super) fn ldy_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        self.regs.y = self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    //--------------------------------------------------
    // STA / STX / STY / STZ - Store
    //--------------------------------------------------
    pub(super) fn sta_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        self.store(vm, addr, self.regs.a);
    }

    pub(super) fn sta_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        self.store(vm, addr, self.regs.a);
    }

    pub(super) fn sta_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        self.store(vm, addr, self.regs.a);
    }

    pub(super) fn sta_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, false);
        self.store(vm, addr, self.regs.a);
    }

    pub(super) fn sta_absolute_y(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_y_addr(vm, false);
        self.store(vm, addr, self.regs.a);
    }

    pub(super) fn sta_indirect_x(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_x_addr(vm);
        self.store(vm, addr, self.regs.a);
    }

    pub(super) fn sta_indirect_y(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_y_addr(vm, false);
        self.store(vm, addr, self.regs.a);
    }

    pub(super) fn sta_indirect(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_zp_addr(vm);
        self.store(vm, addr, self.regs.a);
    }

    pub(super) fn stx_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        self.store(vm, addr, self.regs.x);
    }

    pub(super) fn stx_zeropage_y(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_y_addr(vm);
        self.store(vm, addr, self.regs.x);
    }

    pub(super) fn stx_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        self.store(vm, addr, self.regs.x);
    }

    pub(super) fn sty_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        self.store(vm, addr, self.regs.y);
    }

    pub(super) fn sty_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        self.store(vm, addr, self.regs.y);
    }

    pub(super) fn sty_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        self.store(vm, addr, self.regs.y);
    }

    pub(super) fn stz_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        self.store(vm, addr, 0);
    }

    pub(super) fn stz_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        self.store(vm, addr, 0);
    }

    pub(super) fn stz_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        self.store(vm, addr, 0);
    }

    pub(super) fn stz_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, false);
        self.store(vm, addr, 0);
    }

    //--------------------------------------------------
    // ORA / AND / EOR - Logical
    //--------------------------------------------------
    pub(super) fn ora_immediate(&mut self, vm: &mut Vm) {
        self.regs.a |= self.get_immediate(vm);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        self.regs.a |= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        self.regs.a |= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        self.regs.a |= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        self.regs.a |= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_absolute_y(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_y_addr(vm, true);
        self.regs.a |= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_indirect_x(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_x_addr(vm);
        self.regs.a |= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_indirect_y(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_y_addr(vm, true);
        self.regs.a |= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_indirect(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_zp_addr(vm);
        self.regs.a |= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_immediate(&mut self, vm: &mut Vm) {
        self.regs.a &= self.get_immediate(vm);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        self.regs.a &= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        self.regs.a &= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        self.regs.a &= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        self.regs.a &= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_absolute_y(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_y_addr(vm, true);
        self.regs.a &= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_indirect_x(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_x_addr(vm);
        self.regs.a &= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_indirect_y(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_y_addr(vm, true);
        self.regs.a &= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_indirect(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_zp_addr(vm);
        self.regs.a &= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_immediate(&mut self, vm: &mut Vm) {
        self.regs.a ^= self.get_immediate(vm);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        self.regs.a ^= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        self.regs.a ^= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        self.regs.a ^= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        self.regs.a ^= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_absolute_y(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_y_addr(vm, true);
        self.regs.a ^= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_indirect_x(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_x_addr(vm);
        self.regs.a ^= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_indirect_y(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_y_addr(vm, true);
        self.regs.a ^= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_indirect(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_zp_addr(vm);
        self.regs.a ^= self.load(vm, addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    //--------------------------------------------------
    // ADC / SBC - Arithmetic
    //--------------------------------------------------
    pub(super) fn adc_immediate(&mut self, vm: &mut Vm) {
        let value = self.get_immediate(vm);
        self.adc(value);
    }

    pub(super) fn adc_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        let value = self.load(vm, addr);
        self.adc(value);
    }

    pub(super) fn adc_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        let value = self.load(vm, addr);
        self.adc(value);
    }

    pub(super) fn adc_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        let value = self.load(vm, addr);
        self.adc(value);
    }

    pub(super) fn adc_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        let value = self.load(vm, addr);
        self.adc(value);
    }

    pub(super) fn adc_absolute_y(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_y_addr(vm, true);
        let value = self.load(vm, addr);
        self.adc(value);
    }

    pub(super) fn adc_indirect_x(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_x_addr(vm);
        let value = self.load(vm, addr);
        self.adc(value);
    }

    pub(super) fn adc_indirect_y(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_y_addr(vm, true);
        let value = self.load(vm, addr);
        self.adc(value);
    }

    pub(super) fn adc_indirect(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_zp_addr(vm);
        let value = self.load(vm, addr);
        self.adc(value);
    }

    pub(super) fn sbc_immediate(&mut self, vm: &mut Vm) {
        let value = self.get_immediate(vm);
        self.sbc(value);
    }

    pub(super) fn sbc_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        let value = self.load(vm, addr);
        self.sbc(value);
    }

    pub(super) fn sbc_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        let value = self.load(vm, addr);
        self.sbc(value);
    }

    pub(super) fn sbc_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        let value = self.load(vm, addr);
        self.sbc(value);
    }

    pub(super) fn sbc_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        let value = self.load(vm, addr);
        self.sbc(value);
    }

    pub(super) fn sbc_absolute_y(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_y_addr(vm, true);
        let value = self.load(vm, addr);
        self.sbc(value);
    }

    pub(super) fn sbc_indirect_x(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_x_addr(vm);
        let value = self.load(vm, addr);
        self.sbc(value);
    }

    pub(super) fn sbc_indirect_y(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_y_addr(vm, true);
        let value = self.load(vm, addr);
        self.sbc(value);
    }

    pub(super) fn sbc_indirect(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_zp_addr(vm);
        let value = self.load(vm, addr);
        self.sbc(value);
    }

    //--------------------------------------------------
    // CMP / CPX / CPY - Compare
    //--------------------------------------------------
    pub(super) fn cmp_immediate(&mut self, vm: &mut Vm) {
        let value = self.get_immediate(vm);
        self.compare(self.regs.a, value);
    }

    pub(super) fn cmp_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        let value = self.load(vm, addr);
        self.compare(self.regs.a, value);
    }

    pub(super) fn cmp_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        let value = self.load(vm, addr);
        self.compare(self.regs.a, value);
    }

    pub(super) fn cmp_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        let value = self.load(vm, addr);
        self.compare(self.regs.a, value);
    }

    pub(super) fn cmp_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        let value = self.load(vm, addr);
        self.compare(self.regs.a, value);
    }

    pub(super) fn cmp_absolute_y(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_y_addr(vm, true);
        let value = self.load(vm, addr);
        self.compare(self.regs.a, value);
    }

    pub(super) fn cmp_indirect_x(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_x_addr(vm);
        let value = self.load(vm, addr);
        self.compare(self.regs.a, value);
    }

    pub(super) fn cmp_indirect_y(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_y_addr(vm, true);
        let value = self.load(vm, addr);
        self.compare(self.regs.a, value);
    }

    pub(super) fn cmp_indirect(&mut self, vm: &mut Vm) {
        let addr = self.get_indirect_zp_addr(vm);
        let value = self.load(vm, addr);
        self.compare(self.regs.a, value);
    }

    pub(super) fn cpx_immediate(&mut self, vm: &mut Vm) {
        let value = self.get_immediate(vm);
        self.compare(self.regs.x, value);
    }

    pub(super) fn cpx_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        let value = self.load(vm, addr);
        self.compare(self.regs.x, value);
    }

    pub(super) fn cpx_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        let value = self.load(vm, addr);
        self.compare(self.regs.x, value);
    }

    pub(super) fn cpy_immediate(&mut self, vm: &mut Vm) {
        let value = self.get_immediate(vm);
        self.compare(self.regs.y, value);
    }

    pub(super) fn cpy_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        let value = self.load(vm, addr);
        self.compare(self.regs.y, value);
    }

    pub(super) fn cpy_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        let value = self.load(vm, addr);
        self.compare(self.regs.y, value);
    }

    //--------------------------------------------------
    // ASL / LSR / ROL / ROR - Shift & Rotate
    //--------------------------------------------------
    pub(super) fn asl_accumulator(&mut self, _vm: &mut Vm) {
        self.regs.a = self.asl_core(self.regs.a);
    }

    pub(super) fn asl_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        let value = self.load(vm, addr);
        let result = self.asl_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn asl_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        let value = self.load(vm, addr);
        let result = self.asl_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn asl_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        let value = self.load(vm, addr);
        let result = self.asl_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn asl_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        let value = self.load(vm, addr);
        let result = self.asl_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn lsr_accumulator(&mut self, _vm: &mut Vm) {
        self.regs.a = self.lsr_core(self.regs.a);
    }

    pub(super) fn lsr_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        let value = self.load(vm, addr);
        let result = self.lsr_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn lsr_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        let value = self.load(vm, addr);
        let result = self.lsr_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn lsr_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        let value = self.load(vm, addr);
        let result = self.lsr_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn lsr_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        let value = self.load(vm, addr);
        let result = self.lsr_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn rol_accumulator(&mut self, _vm: &mut Vm) {
        self.regs.a = self.rol_core(self.regs.a);
    }

    pub(super) fn rol_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        let value = self.load(vm, addr);
        let result = self.rol_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn rol_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        let value = self.load(vm, addr);
        let result = self.rol_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn rol_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        let value = self.load(vm, addr);
        let result = self.rol_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn rol_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        let value = self.load(vm, addr);
        let result = self.rol_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn ror_accumulator(&mut self, _vm: &mut Vm) {
        self.regs.a = self.ror_core(self.regs.a);
    }

    pub(super) fn ror_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        let value = self.load(vm, addr);
        let result = self.ror_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn ror_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        let value = self.load(vm, addr);
        let result = self.ror_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn ror_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        let value = self.load(vm, addr);
        let result = self.ror_core(value);
        self.store(vm, addr, result);
    }

    pub(super) fn ror_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        let value = self.load(vm, addr);
        let result = self.ror_core(value);
        self.store(vm, addr, result);
    }

    //--------------------------------------------------
    // INC / DEC - Increment & Decrement
    //--------------------------------------------------
    pub(super) fn inc_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        let result = self.load(vm, addr).wrapping_add(1);
        self.regs.update_zero_negative_flags(result);
        self.store(vm, addr, result);
    }

    pub(super) fn inc_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        let result = self.load(vm, addr).wrapping_add(1);
        self.regs.update_zero_negative_flags(result);
        self.store(vm, addr, result);
    }

    pub(super) fn inc_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        let result = self.load(vm, addr).wrapping_add(1);
        self.regs.update_zero_negative_flags(result);
        self.store(vm, addr, result);
    }

    pub(super) fn inc_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        let result = self.load(vm, addr).wrapping_add(1);
        self.regs.update_zero_negative_flags(result);
        self.store(vm, addr, result);
    }

    pub(super) fn dec_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        let result = self.load(vm, addr).wrapping_sub(1);
        self.regs.update_zero_negative_flags(result);
        self.store(vm, addr, result);
    }

    pub(super) fn dec_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        let result = self.load(vm, addr).wrapping_sub(1);
        self.regs.update_zero_negative_flags(result);
        self.store(vm, addr, result);
    }

    pub(super) fn dec_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        let result = self.load(vm, addr).wrapping_sub(1);
        self.regs.update_zero_negative_flags(result);
        self.store(vm, addr, result);
    }

    pub(super) fn dec_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        let result = self.load(vm, addr).wrapping_sub(1);
        self.regs.update_zero_negative_flags(result);
        self.store(vm, addr, result);
    }

    /// INA（65C02: INC A）
    pub(super) fn ina(&mut self, _vm: &mut Vm) {
        self.regs.a = self.regs.a.wrapping_add(1);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    /// DEA（65C02: DEC A）
    pub(super) fn dea(&mut self, _vm: &mut Vm) {
        self.regs.a = self.regs.a.wrapping_sub(1);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn inx(&mut self, _vm: &mut Vm) {
        self.regs.x = self.regs.x.wrapping_add(1);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn iny(&mut self, _vm: &mut Vm) {
        self.regs.y = self.regs.y.wrapping_add(1);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    pub(super) fn dex(&mut self, _vm: &mut Vm) {
        self.regs.x = self.regs.x.wrapping_sub(1);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn dey(&mut self, _vm: &mut Vm) {
        self.regs.y = self.regs.y.wrapping_sub(1);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    //--------------------------------------------------
    // BIT / TSB / TRB - Bit test
    //--------------------------------------------------
    pub(super) fn bit_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        let value = self.load(vm, addr);
        self.bit_core(value);
    }

    pub(super) fn bit_zeropage_x(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_x_addr(vm);
        let value = self.load(vm, addr);
        self.bit_core(value);
    }

    pub(super) fn bit_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        let value = self.load(vm, addr);
        self.bit_core(value);
    }

    pub(super) fn bit_absolute_x(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_x_addr(vm, true);
        let value = self.load(vm, addr);
        self.bit_core(value);
    }

    /// BIT即値（65C02）はZフラグのみ変化する
    pub(super) fn bit_immediate(&mut self, vm: &mut Vm) {
        let value = self.get_immediate(vm);
        self.regs.set_flag(flags::ZERO, self.regs.a & value == 0);
    }

    /// TSB（65C02: Test and Set Bits）
    pub(super) fn tsb_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        let value = self.load(vm, addr);
        self.regs.set_flag(flags::ZERO, self.regs.a & value == 0);
        self.store(vm, addr, value | self.regs.a);
    }

    pub(super) fn tsb_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        let value = self.load(vm, addr);
        self.regs.set_flag(flags::ZERO, self.regs.a & value == 0);
        self.store(vm, addr, value | self.regs.a);
    }

    /// TRB（65C02: Test and Reset Bits）
    pub(super) fn trb_zeropage(&mut self, vm: &mut Vm) {
        let addr = self.get_zeropage_addr(vm);
        let value = self.load(vm, addr);
        self.regs.set_flag(flags::ZERO, self.regs.a & value == 0);
        self.store(vm, addr, value & !self.regs.a);
    }

    pub(super) fn trb_absolute(&mut self, vm: &mut Vm) {
        let addr = self.get_absolute_addr(vm);
        let value = self.load(vm, addr);
        self.regs.set_flag(flags::ZERO, self.regs.a & value == 0);
        self.store(vm, addr, value & !self.regs.a);
    }

    //--------------------------------------------------
    // RMB / SMB - Bit clear/set（Rockwell拡張）
    //--------------------------------------------------
    fn rmb(&mut self, vm: &mut Vm, bit: u8) {
        let addr = self.get_zeropage_addr(vm);
        let value = self.load(vm, addr);
        self.store(vm, addr, value & !(1 << bit));
    }

    fn smb(&mut self, vm: &mut Vm, bit: u8) {
        let addr = self.get_zeropage_addr(vm);
        let value = self.load(vm, addr);
        self.store(vm, addr, value | (1 << bit));
    }

    pub(super) fn rmb0(&mut self, vm: &mut Vm) { self.rmb(vm, 0); }
    pub(super) fn rmb1(&mut self, vm: &mut Vm) { self.rmb(vm, 1); }
    pub(super) fn rmb2(&mut self, vm: &mut Vm) { self.rmb(vm, 2); }
    pub(super) fn rmb3(&mut self, vm: &mut Vm) { self.rmb(vm, 3); }
    pub(super) fn rmb4(&mut self, vm: &mut Vm) { self.rmb(vm, 4); }
    pub(super) fn rmb5(&mut self, vm: &mut Vm) { self.rmb(vm, 5); }
    pub(super) fn rmb6(&mut self, vm: &mut Vm) { self.rmb(vm, 6); }
    pub(super) fn rmb7(&mut self, vm: &mut Vm) { self.rmb(vm, 7); }

    pub(super) fn smb0(&mut self, vm: &mut Vm) { self.smb(vm, 0); }
    pub(super) fn smb1(&mut self, vm: &mut Vm) { self.smb(vm, 1); }
    pub(super) fn smb2(&mut self, vm: &mut Vm) { self.smb(vm, 2); }
    pub(super) fn smb3(&mut self, vm: &mut Vm) { self.smb(vm, 3); }
    pub(super) fn smb4(&mut self, vm: &mut Vm) { self.smb(vm, 4); }
    pub(super) fn smb5(&mut self, vm: &mut Vm) { self.smb(vm, 5); }
    pub(super) fn smb6(&mut self, vm: &mut Vm) { self.smb(vm, 6); }
    pub(super) fn smb7(&mut self, vm: &mut Vm) { self.smb(vm, 7); }

    //--------------------------------------------------
    // ブランチ命令
    //--------------------------------------------------
    pub(super) fn bpl(&mut self, vm: &mut Vm) {
        let cond = !self.regs.get_flag(flags::NEGATIVE);
        self.branch(vm, cond);
    }

    pub(super) fn bmi(&mut self, vm: &mut Vm) {
        let cond = self.regs.get_flag(flags::NEGATIVE);
        self.branch(vm, cond);
    }

    pub(super) fn bvc(&mut self, vm: &mut Vm) {
        let cond = !self.regs.get_flag(flags::OVERFLOW);
        self.branch(vm, cond);
    }

    pub(super) fn bvs(&mut self, vm: &mut Vm) {
        let cond = self.regs.get_flag(flags::OVERFLOW);
        self.branch(vm, cond);
    }

    pub(super) fn bcc(&mut self, vm: &mut Vm) {
        let cond = !self.regs.get_flag(flags::CARRY);
        self.branch(vm, cond);
    }

    pub(super) fn bcs(&mut self, vm: &mut Vm) {
        let cond = self.regs.get_flag(flags::CARRY);
        self.branch(vm, cond);
    }

    pub(super) fn bne(&mut self, vm: &mut Vm) {
        let cond = !self.regs.get_flag(flags::ZERO);
        self.branch(vm, cond);
    }

    pub(super) fn beq(&mut self, vm: &mut Vm) {
        let cond = self.regs.get_flag(flags::ZERO);
        self.branch(vm, cond);
    }

    /// BRA（65C02: 無条件ブランチ）
    pub(super) fn bra(&mut self, vm: &mut Vm) {
        self.branch(vm, true);
    }

    /// BBR0-7（Rockwell拡張: ゼロページのビットが0ならブランチ）
    fn bbr(&mut self, vm: &mut Vm, bit: u8) {
        let addr = self.fetch_byte(vm) as u16;
        let value = vm.read(addr);
        self.branch(vm, value & (1 << bit) == 0);
    }

    /// BBS0-7（ビットが1ならブランチ）
    fn bbs(&mut self, vm: &mut Vm, bit: u8) {
        let addr = self.fetch_byte(vm) as u16;
        let value = vm.read(addr);
        self.branch(vm, value & (1 << bit) != 0);
    }

    pub(super) fn bbr0(&mut self, vm: &mut Vm) { self.bbr(vm, 0); }
    pub(super) fn bbr1(&mut self, vm: &mut Vm) { self.bbr(vm, 1); }
    pub(super) fn bbr2(&mut self, vm: &mut Vm) { self.bbr(vm, 2); }
    pub(super) fn bbr3(&mut self, vm: &mut Vm) { self.bbr(vm, 3); }
    pub(super) fn bbr4(&mut self, vm: &mut Vm) { self.bbr(vm, 4); }
    pub(super) fn bbr5(&mut self, vm: &mut Vm) { self.bbr(vm, 5); }
    pub(super) fn bbr6(&mut self, vm: &mut Vm) { self.bbr(vm, 6); }
    pub(super) fn bbr7(&mut self, vm: &mut Vm) { self.bbr(vm, 7); }

    pub(super) fn bbs0(&mut self, vm: &mut Vm) { self.bbs(vm, 0); }
    pub(super) fn bbs1(&mut self, vm: &mut Vm) { self.bbs(vm, 1); }
    pub(super) fn bbs2(&mut self, vm: &mut Vm) { self.bbs(vm, 2); }
    pub(super) fn bbs3(&mut self, vm: &mut Vm) { self.bbs(vm, 3); }
    pub(super) fn bbs4(&mut self, vm: &mut Vm) { self.bbs(vm, 4); }
    pub(super) fn bbs5(&mut self, vm: &mut Vm) { self.bbs(vm, 5); }
    pub(super) fn bbs6(&mut self, vm: &mut Vm) { self.bbs(vm, 6); }
    pub(super) fn bbs7(&mut self, vm: &mut Vm) { self.bbs(vm, 7); }

    //--------------------------------------------------
    // ジャンプ・サブルーチン
    //--------------------------------------------------
    pub(super) fn jmp_absolute(&mut self, vm: &mut Vm) {
        let addr = self.fetch_word(vm);
        self.snap.ea = addr;
        self.regs.pc = addr;
    }

    /// JMP間接。65C02ではポインタがページ境界を正しく跨ぐ
    pub(super) fn jmp_indirect(&mut self, vm: &mut Vm) {
        let ptr = self.fetch_word(vm);
        let addr = self.read_word(vm, ptr);
        self.snap.ea = addr;
        self.regs.pc = addr;
    }

    /// JMP (abs,X)（65C02）
    pub(super) fn jmp_absolute_indirect_x(&mut self, vm: &mut Vm) {
        let ptr = self.fetch_word(vm).wrapping_add(self.regs.x as u16);
        let addr = self.read_word(vm, ptr);
        self.snap.ea = addr;
        self.regs.pc = addr;
    }

    pub(super) fn jsr(&mut self, vm: &mut Vm) {
        let addr = self.fetch_word(vm);
        // 戻り先はオペランド最終バイトのアドレス（RTSが+1する）
        self.push_word(vm, self.regs.pc.wrapping_sub(1));
        self.snap.ea = addr;
        self.regs.pc = addr;
    }

    pub(super) fn rts(&mut self, vm: &mut Vm) {
        self.regs.pc = self.pop_word(vm).wrapping_add(1);
    }

    pub(super) fn rti(&mut self, vm: &mut Vm) {
        let p = self.pop_byte(vm);
        self.regs.set_p(p);
        self.regs.pc = self.pop_word(vm);
    }

    /// BRK: ソフトウェア割り込み
    ///
    /// 戻り先はBRKの2バイト後（パディングバイトを飛ばす）。
    /// プッシュされるPはB|Xセット。ハードウェア割り込み（Bクリア）との
    /// 非対称は実機由来。
    pub(super) fn brk(&mut self, vm: &mut Vm) {
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.push_word(vm, self.regs.pc);
        self.regs.f |= flags::BREAK | flags::XTRA;
        self.push_byte(vm, FLAGS_ENCODE[self.regs.f as usize]);
        self.regs.set_flag(flags::IRQ_DISABLE, true);
        self.regs.set_flag(flags::DECIMAL, false);
        self.regs.pc = self.read_word(vm, IRQ_VECTOR);
    }

    //--------------------------------------------------
    // スタック操作
    //--------------------------------------------------
    pub(super) fn pha(&mut self, vm: &mut Vm) {
        self.push_byte(vm, self.regs.a);
    }

    pub(super) fn pla(&mut self, vm: &mut Vm) {
        self.regs.a = self.pop_byte(vm);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    /// PHP: 現在のPをそのままプッシュ（Bの挿入は行わない）
    pub(super) fn php(&mut self, vm: &mut Vm) {
        let p = self.regs.p();
        self.push_byte(vm, p);
    }

    pub(super) fn plp(&mut self, vm: &mut Vm) {
        let p = self.pop_byte(vm);
        self.regs.set_p(p);
    }

    pub(super) fn phx(&mut self, vm: &mut Vm) {
        self.push_byte(vm, self.regs.x);
    }

    pub(super) fn plx(&mut self, vm: &mut Vm) {
        self.regs.x = self.pop_byte(vm);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn phy(&mut self, vm: &mut Vm) {
        self.push_byte(vm, self.regs.y);
    }

    pub(super) fn ply(&mut self, vm: &mut Vm) {
        self.regs.y = self.pop_byte(vm);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    //--------------------------------------------------
    // レジスタ転送
    //--------------------------------------------------
    pub(super) fn tax(&mut self, _vm: &mut Vm) {
        self.regs.x = self.regs.a;
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn tay(&mut self, _vm: &mut Vm) {
        self.regs.y = self.regs.a;
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    pub(super) fn txa(&mut self, _vm: &mut Vm) {
        self.regs.a = self.regs.x;
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn tya(&mut self, _vm: &mut Vm) {
        self.regs.a = self.regs.y;
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn tsx(&mut self, _vm: &mut Vm) {
        self.regs.x = self.regs.sp;
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    /// TXSはフラグを変化させない
    pub(super) fn txs(&mut self, _vm: &mut Vm) {
        self.regs.sp = self.regs.x;
    }

    //--------------------------------------------------
    // フラグ操作
    //--------------------------------------------------
    pub(super) fn clc(&mut self, _vm: &mut Vm) {
        self.regs.set_flag(flags::CARRY, false);
    }

    pub(super) fn sec(&mut self, _vm: &mut Vm) {
        self.regs.set_flag(flags::CARRY, true);
    }

    pub(super) fn cli(&mut self, _vm: &mut Vm) {
        self.regs.set_flag(flags::IRQ_DISABLE, false);
    }

    pub(super) fn sei(&mut self, _vm: &mut Vm) {
        self.regs.set_flag(flags::IRQ_DISABLE, true);
    }

    pub(super) fn cld(&mut self, _vm: &mut Vm) {
        self.regs.set_flag(flags::DECIMAL, false);
    }

    pub(super) fn sed(&mut self, _vm: &mut Vm) {
        self.regs.set_flag(flags::DECIMAL, true);
    }

    pub(super) fn clv(&mut self, _vm: &mut Vm) {
        self.regs.set_flag(flags::OVERFLOW, false);
    }

    //--------------------------------------------------
    // その他
    //--------------------------------------------------
    pub(super) fn nop(&mut self, _vm: &mut Vm) {}

    /// 未定義オペコード: 固定7サイクルの1バイトNOPとして扱う
    pub(super) fn unk(&mut self, _vm: &mut Vm) {
        log::debug!(
            "undefined opcode ${:02X} at ${:04X}",
            self.snap.opcode,
            self.snap.ea
        );
    }

    /// WAI（65C02: 割り込みまで待機）
    pub(super) fn wai(&mut self, _vm: &mut Vm) {
        self.state = RunState::Waiting;
    }

    /// STP（65C02: RESETまで完全停止）
    pub(super) fn stp(&mut self, _vm: &mut Vm) {
        self.state = RunState::Halted;
    }
}

/// 256エントリのオペコードディスパッチテーブル
#[rustfmt::skip]
pub static OPCODES: [OpFn; 256] = [
    // 0x00
    Cpu::brk,            Cpu::ora_indirect_x, Cpu::unk,            Cpu::unk,
    Cpu::tsb_zeropage,   Cpu::ora_zeropage,   Cpu::asl_zeropage,   Cpu::rmb0,
    Cpu::php,            Cpu::ora_immediate,  Cpu::asl_accumulator, Cpu::unk,
    Cpu::tsb_absolute,   Cpu::ora_absolute,   Cpu::asl_absolute,   Cpu::bbr0,
    // 0x10
    Cpu::bpl,            Cpu::ora_indirect_y, Cpu::ora_indirect,   Cpu::unk,
    Cpu::trb_zeropage,   Cpu::ora_zeropage_x, Cpu::asl_zeropage_x, Cpu::rmb1,
    Cpu::clc,            Cpu::ora_absolute_y, Cpu::ina,            Cpu::unk,
    Cpu::trb_absolute,   Cpu::ora_absolute_x, Cpu::asl_absolute_x, Cpu::bbr1,
    // 0x20
    Cpu::jsr,            Cpu::and_indirect_x, Cpu::unk,            Cpu::unk,
    Cpu::bit_zeropage,   Cpu::and_zeropage,   Cpu::rol_zeropage,   Cpu::rmb2,
    Cpu::plp,            Cpu::and_immediate,  Cpu::rol_accumulator, Cpu::unk,
    Cpu::bit_absolute,   Cpu::and_absolute,   Cpu::rol_absolute,   Cpu::bbr2,
    // 0x30
    Cpu::bmi,            Cpu::and_indirect_y, Cpu::and_indirect,   Cpu::unk,
    Cpu::bit_zeropage_x, Cpu::and_zeropage_x, Cpu::rol_zeropage_x, Cpu::rmb3,
    Cpu::sec,            Cpu::and_absolute_y, Cpu::dea,            Cpu::unk,
    Cpu::bit_absolute_x, Cpu::and_absolute_x, Cpu::rol_absolute_x, Cpu::bbr3,
    // 0x40
    Cpu::rti,            Cpu::eor_indirect_x, Cpu::unk,            Cpu::unk,
    Cpu::unk,            Cpu::eor_zeropage,   Cpu::lsr_zeropage,   Cpu::rmb4,
    Cpu::pha,            Cpu::eor_immediate,  Cpu::lsr_accumulator, Cpu::unk,
    Cpu::jmp_absolute,   Cpu::eor_absolute,   Cpu::lsr_absolute,   Cpu::bbr4,
    // 0x50
    Cpu::bvc,            Cpu::eor_indirect_y, Cpu::eor_indirect,   Cpu::unk,
    Cpu::unk,            Cpu::eor_zeropage_x, Cpu::lsr_zeropage_x, Cpu::rmb5,
    Cpu::cli,            Cpu::eor_absolute_y, Cpu::phy,            Cpu::unk,
    Cpu::unk,            Cpu::eor_absolute_x, Cpu::lsr_absolute_x, Cpu::bbr5,
    // 0x60
    Cpu::rts,            Cpu::adc_indirect_x, Cpu::unk,            Cpu::unk,
    Cpu::stz_zeropage,   Cpu::adc_zeropage,   Cpu::ror_zeropage,   Cpu::rmb6,
    Cpu::pla,            Cpu::adc_immediate,  Cpu::ror_accumulator, Cpu::unk,
    Cpu::jmp_indirect,   Cpu::adc_absolute,   Cpu::ror_absolute,   Cpu::bbr6,
    // 0x70
    Cpu::bvs,            Cpu::adc_indirect_y, Cpu::adc_indirect,   Cpu::unk,
    Cpu::stz_zeropage_x, Cpu::adc_zeropage_x, Cpu::ror_zeropage_x, Cpu::rmb7,
    Cpu::sei,            Cpu::adc_absolute_y, Cpu::ply,            Cpu::unk,
    Cpu::jmp_absolute_indirect_x, Cpu::adc_absolute_x, Cpu::ror_absolute_x, Cpu::bbr7,
    // 0x80
    Cpu::bra,            Cpu::sta_indirect_x, Cpu::unk,            Cpu::unk,
    Cpu::sty_zeropage,   Cpu::sta_zeropage,   Cpu::stx_zeropage,   Cpu::smb0,
    Cpu::dey,            Cpu::bit_immediate,  Cpu::txa,            Cpu::unk,
    Cpu::sty_absolute,   Cpu::sta_absolute,   Cpu::stx_absolute,   Cpu::bbs0,
    // 0x90
    Cpu::bcc,            Cpu::sta_indirect_y, Cpu::sta_indirect,   Cpu::unk,
    Cpu::sty_zeropage_x, Cpu::sta_zeropage_x, Cpu::stx_zeropage_y, Cpu::smb1,
    Cpu::tya,            Cpu::sta_absolute_y, Cpu::txs,            Cpu::unk,
    Cpu::stz_absolute,   Cpu::sta_absolute_x, Cpu::stz_absolute_x, Cpu::bbs1,
    // 0xA0
    Cpu::ldy_immediate,  Cpu::lda_indirect_x, Cpu::ldx_immediate,  Cpu::unk,
    Cpu::ldy_zeropage,   Cpu::lda_zeropage,   Cpu::ldx_zeropage,   Cpu::smb2,
    Cpu::tay,            Cpu::lda_immediate,  Cpu::tax,            Cpu::unk,
    Cpu::ldy_absolute,   Cpu::lda_absolute,   Cpu::ldx_absolute,   Cpu::bbs2,
    // 0xB0
    Cpu::bcs,            Cpu::lda_indirect_y, Cpu::lda_indirect,   Cpu::unk,
    Cpu::ldy_zeropage_x, Cpu::lda_zeropage_x, Cpu::ldx_zeropage_y, Cpu::smb3,
    Cpu::clv,            Cpu::lda_absolute_y, Cpu::tsx,            Cpu::unk,
    Cpu::ldy_absolute_x, Cpu::lda_absolute_x, Cpu::ldx_absolute_y, Cpu::bbs3,
    // 0xC0
    Cpu::cpy_immediate,  Cpu::cmp_indirect_x, Cpu::unk,            Cpu::unk,
    Cpu::cpy_zeropage,   Cpu::cmp_zeropage,   Cpu::dec_zeropage,   Cpu::smb4,
    Cpu::iny,            Cpu::cmp_immediate,  Cpu::dex,            Cpu::wai,
    Cpu::cpy_absolute,   Cpu::cmp_absolute,   Cpu::dec_absolute,   Cpu::bbs4,
    // 0xD0
    Cpu::bne,            Cpu::cmp_indirect_y, Cpu::cmp_indirect,   Cpu::unk,
    Cpu::unk,            Cpu::cmp_zeropage_x, Cpu::dec_zeropage_x, Cpu::smb5,
    Cpu::cld,            Cpu::cmp_absolute_y, Cpu::phx,            Cpu::stp,
    Cpu::unk,            Cpu::cmp_absolute_x, Cpu::dec_absolute_x, Cpu::bbs5,
    // 0xE0
    Cpu::cpx_immediate,  Cpu::sbc_indirect_x, Cpu::unk,            Cpu::unk,
    Cpu::cpx_zeropage,   Cpu::sbc_zeropage,   Cpu::inc_zeropage,   Cpu::smb6,
    Cpu::inx,            Cpu::sbc_immediate,  Cpu::nop,            Cpu::unk,
    Cpu::cpx_absolute,   Cpu::sbc_absolute,   Cpu::inc_absolute,   Cpu::bbs6,
    // 0xF0
    Cpu::beq,            Cpu::sbc_indirect_y, Cpu::sbc_indirect,   Cpu::unk,
    Cpu::unk,            Cpu::sbc_zeropage_x, Cpu::inc_zeropage_x, Cpu::smb7,
    Cpu::sed,            Cpu::sbc_absolute_y, Cpu::plx,            Cpu::unk,
    Cpu::unk,            Cpu::sbc_absolute_x, Cpu::inc_absolute_x, Cpu::bbs7,
];

#[cfg(test)]
mod tests {
    use super::super::{flags, Cpu, RW_NONE, RW_READ, RW_WRITE};
    use crate::interrupts::InterruptSignals;
    use crate::vm::Vm;

    const TEST_LOC: u16 = 0x1F82;

    fn test_rig() -> (Cpu, Vm, InterruptSignals) {
        let mut cpu = Cpu::new();
        cpu.regs.pc = TEST_LOC;
        (cpu, Vm::new(), InterruptSignals::new())
    }

    fn poke(vm: &mut Vm, addr: u16, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            vm.ram[0][addr.wrapping_add(i as u16) as usize] = b;
        }
    }

    /// ADC即値を1回実行して(A, f)を返す
    fn run_adc(a: u8, operand: u8, decimal: bool, carry: bool) -> (u8, u8) {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x69, operand]);
        cpu.regs.a = a;
        cpu.regs.set_flag(flags::DECIMAL, decimal);
        cpu.regs.set_flag(flags::CARRY, carry);
        cpu.execute(&mut vm, &signals, 1);
        (cpu.regs.a, cpu.regs.f)
    }

    fn run_sbc(a: u8, operand: u8, decimal: bool, carry: bool) -> (u8, u8) {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xE9, operand]);
        cpu.regs.a = a;
        cpu.regs.set_flag(flags::DECIMAL, decimal);
        cpu.regs.set_flag(flags::CARRY, carry);
        cpu.execute(&mut vm, &signals, 1);
        (cpu.regs.a, cpu.regs.f)
    }

    #[test]
    fn adc_binary_truth_table() {
        // (a, operand, carry_in) -> (result, C, V, N, Z)
        let cases: &[(u8, u8, bool, u8, bool, bool, bool, bool)] = &[
            (0x00, 0x00, false, 0x00, false, false, false, true),
            (0x00, 0x00, true, 0x01, false, false, false, false),
            (0x7F, 0x01, false, 0x80, false, true, true, false),
            (0x80, 0x80, false, 0x00, true, true, false, true),
            (0xFF, 0x01, false, 0x00, true, false, false, true),
            (0xFF, 0xFF, true, 0xFF, true, false, true, false),
            (0x50, 0x50, false, 0xA0, false, true, true, false),
            (0xD0, 0x90, false, 0x60, true, true, false, false),
        ];
        for &(a, b, cin, result, c, v, n, z) in cases {
            let (got, f) = run_adc(a, b, false, cin);
            assert_eq!(got, result, "ADC {:02X}+{:02X}+{}", a, b, cin as u8);
            assert_eq!(f & flags::CARRY != 0, c, "C for {:02X}+{:02X}", a, b);
            assert_eq!(f & flags::OVERFLOW != 0, v, "V for {:02X}+{:02X}", a, b);
            assert_eq!(f & flags::NEGATIVE != 0, n, "N for {:02X}+{:02X}", a, b);
            assert_eq!(f & flags::ZERO != 0, z, "Z for {:02X}+{:02X}", a, b);
        }
    }

    #[test]
    fn sbc_binary_truth_table() {
        let cases: &[(u8, u8, bool, u8, bool, bool)] = &[
            // (a, operand, carry_in) -> (result, C_out, V)
            (0x00, 0x00, true, 0x00, true, false),
            (0x00, 0x01, true, 0xFF, false, false),
            (0x80, 0x01, true, 0x7F, true, true),
            (0x7F, 0xFF, true, 0x80, false, true),
            (0x50, 0x30, true, 0x20, true, false),
            (0x10, 0x20, false, 0xEF, false, false),
        ];
        for &(a, b, cin, result, c, v) in cases {
            let (got, f) = run_sbc(a, b, false, cin);
            assert_eq!(got, result, "SBC {:02X}-{:02X}-{}", a, b, !cin as u8);
            assert_eq!(f & flags::CARRY != 0, c, "C for {:02X}-{:02X}", a, b);
            assert_eq!(f & flags::OVERFLOW != 0, v, "V for {:02X}-{:02X}", a, b);
        }
    }

    #[test]
    fn adc_decimal_valid_bcd() {
        // 有効なBCD入力はパックドBCDの加算に一致する
        for a in 0..100u32 {
            for b in 0..100u32 {
                let bcd_a = ((a / 10) << 4 | (a % 10)) as u8;
                let bcd_b = ((b / 10) << 4 | (b % 10)) as u8;
                let (got, f) = run_adc(bcd_a, bcd_b, true, false);
                let sum = a + b;
                let expect = ((sum / 10 % 10) << 4 | (sum % 10)) as u8;
                assert_eq!(got, expect, "BCD {} + {}", a, b);
                assert_eq!(f & flags::CARRY != 0, sum > 99, "BCD carry {} + {}", a, b);
            }
        }
    }

    #[test]
    fn sbc_decimal_valid_bcd() {
        for a in 0..100u32 {
            for b in 0..=a {
                let bcd_a = ((a / 10) << 4 | (a % 10)) as u8;
                let bcd_b = ((b / 10) << 4 | (b % 10)) as u8;
                let (got, f) = run_sbc(bcd_a, bcd_b, true, true);
                let diff = a - b;
                let expect = ((diff / 10) << 4 | (diff % 10)) as u8;
                assert_eq!(got, expect, "BCD {} - {}", a, b);
                assert!(f & flags::CARRY != 0, "BCD borrow clear {} - {}", a, b);
            }
        }
    }

    #[test]
    fn adc_decimal_invalid_nibbles_are_deterministic() {
        // 不正ニブルでもパニックせず、常に同じ結果を返す
        let first = run_adc(0x1F, 0x0F, true, false);
        for _ in 0..3 {
            assert_eq!(run_adc(0x1F, 0x0F, true, false), first);
        }
    }

    #[test]
    fn decimal_mode_charges_extra_cycle() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x69, 0x01]);
        cpu.regs.set_flag(flags::DECIMAL, true);
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.snap.opcycles, 3);

        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xE9, 0x01]);
        cpu.regs.set_flag(flags::DECIMAL, true);
        cpu.regs.set_flag(flags::CARRY, true);
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.snap.opcycles, 3);
    }

    #[test]
    fn php_pushes_current_p_unchanged() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x08]); // PHP
        cpu.regs.f = flags::CARRY | flags::NEGATIVE;
        cpu.regs.sp = 0xFF;

        cpu.execute(&mut vm, &signals, 1);

        assert_eq!(cpu.regs.sp, 0xFE);
        assert_eq!(vm.ram[0][0x01FF], cpu.regs.p());
        assert_eq!(cpu.snap.rw, RW_NONE); // スタック操作はスナップショット対象外
        assert_eq!(cpu.snap.opcycles, 3);
    }

    #[test]
    fn plp_restores_flags_through_codec() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x28]); // PLP
        vm.ram[0][0x01FF] = 0xC3; // N|V|Z|C（6502順）
        cpu.regs.sp = 0xFE;

        cpu.execute(&mut vm, &signals, 1);

        assert!(cpu.regs.get_flag(flags::NEGATIVE));
        assert!(cpu.regs.get_flag(flags::OVERFLOW));
        assert!(cpu.regs.get_flag(flags::ZERO));
        assert!(cpu.regs.get_flag(flags::CARRY));
        assert!(!cpu.regs.get_flag(flags::DECIMAL));
    }

    #[test]
    fn jsr_rts_round_trip() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x20, 0x00, 0x30]); // JSR $3000
        poke(&mut vm, 0x3000, &[0x60]); // RTS
        cpu.regs.sp = 0xFF;

        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.regs.pc, 0x3000);
        assert_eq!(cpu.snap.ea, 0x3000);
        assert_eq!(cpu.snap.opcycles, 6);
        // 戻り先-1がプッシュされる
        assert_eq!(vm.ram[0][0x01FF], 0x1F);
        assert_eq!(vm.ram[0][0x01FE], 0x84);

        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.regs.pc, TEST_LOC + 3);
        assert_eq!(cpu.regs.sp, 0xFF);
        assert_eq!(cpu.snap.ea, 0x3000); // RTS命令自身のアドレス
    }

    #[test]
    fn rti_restores_flags_and_pc() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x40]); // RTI
        // スタック: P, PCL, PCH
        vm.ram[0][0x01FD] = 0x03; // C|Z（6502順）
        vm.ram[0][0x01FE] = 0x34;
        vm.ram[0][0x01FF] = 0x12;
        cpu.regs.sp = 0xFC;

        cpu.execute(&mut vm, &signals, 1);

        assert_eq!(cpu.regs.pc, 0x1234);
        assert!(cpu.regs.get_flag(flags::CARRY));
        assert!(cpu.regs.get_flag(flags::ZERO));
        assert_eq!(cpu.regs.sp, 0xFF);
    }

    #[test]
    fn tsb_trb_set_and_clear_bits() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x04, 0x40]); // TSB $40
        poke(&mut vm, 0x0040, &[0x0F]);
        cpu.regs.a = 0xF0;

        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(vm.ram[0][0x0040], 0xFF);
        assert!(cpu.regs.get_flag(flags::ZERO)); // A & old == 0
        assert_eq!(cpu.snap.rw, RW_READ | RW_WRITE);
        assert_eq!(cpu.snap.d, 0xFF);

        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x14, 0x40]); // TRB $40
        poke(&mut vm, 0x0040, &[0xFF]);
        cpu.regs.a = 0x0F;

        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(vm.ram[0][0x0040], 0xF0);
        assert!(!cpu.regs.get_flag(flags::ZERO));
    }

    #[test]
    fn bit_immediate_touches_only_zero_flag() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x89, 0xC0]); // BIT #$C0
        cpu.regs.a = 0x0F;
        cpu.regs.f = 0;

        cpu.execute(&mut vm, &signals, 1);

        assert!(cpu.regs.get_flag(flags::ZERO));
        assert!(!cpu.regs.get_flag(flags::NEGATIVE));
        assert!(!cpu.regs.get_flag(flags::OVERFLOW));
    }

    #[test]
    fn bit_absolute_copies_bits_6_and_7() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x2C, 0x00, 0x30]); // BIT $3000
        poke(&mut vm, 0x3000, &[0xC0]);
        cpu.regs.a = 0xFF;

        cpu.execute(&mut vm, &signals, 1);

        assert!(cpu.regs.get_flag(flags::NEGATIVE));
        assert!(cpu.regs.get_flag(flags::OVERFLOW));
        assert!(!cpu.regs.get_flag(flags::ZERO));
    }

    #[test]
    fn rmb_smb_modify_zero_page_bits() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x07, 0x40]); // RMB0 $40
        poke(&mut vm, 0x0040, &[0xFF]);
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(vm.ram[0][0x0040], 0xFE);
        assert_eq!(cpu.snap.opcycles, 5);

        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xF7, 0x40]); // SMB7 $40
        poke(&mut vm, 0x0040, &[0x00]);
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(vm.ram[0][0x0040], 0x80);
    }

    #[test]
    fn bbr_bbs_branch_on_zero_page_bit() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x0F, 0x40, 0x10]); // BBR0 $40,+$10
        poke(&mut vm, 0x0040, &[0xFE]); // bit0 == 0 → 成立
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.regs.pc, TEST_LOC + 3 + 0x10);

        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x8F, 0x40, 0x10]); // BBS0 $40,+$10
        poke(&mut vm, 0x0040, &[0xFE]); // bit0 == 0 → 不成立
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.regs.pc, TEST_LOC + 3);
    }

    #[test]
    fn jmp_indirect_reads_pointer_across_page() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x6C, 0xFF, 0x30]); // JMP ($30FF)
        poke(&mut vm, 0x30FF, &[0x34]);
        poke(&mut vm, 0x3100, &[0x12]); // 65C02はページを正しく跨ぐ
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.regs.pc, 0x1234);
        assert_eq!(cpu.snap.opcycles, 6);
    }

    #[test]
    fn jmp_absolute_indirect_x() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x7C, 0x00, 0x30]); // JMP ($3000,X)
        poke(&mut vm, 0x3004, &[0x78, 0x56]);
        cpu.regs.x = 0x04;
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.regs.pc, 0x5678);
    }

    #[test]
    fn stz_writes_zero() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x9C, 0x00, 0x30]); // STZ $3000
        poke(&mut vm, 0x3000, &[0xFF]);
        cpu.regs.f = flags::ZERO | flags::NEGATIVE;
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(vm.ram[0][0x3000], 0x00);
        // フラグは変化しない
        assert!(cpu.regs.get_flag(flags::ZERO));
        assert!(cpu.regs.get_flag(flags::NEGATIVE));
        assert_eq!(cpu.snap.d, 0x00);
        assert_eq!(cpu.snap.rw, RW_WRITE);
    }

    #[test]
    fn compare_sets_carry_and_zero() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xC9, 0x40]); // CMP #$40
        cpu.regs.a = 0x40;
        cpu.execute(&mut vm, &signals, 1);
        assert!(cpu.regs.get_flag(flags::CARRY));
        assert!(cpu.regs.get_flag(flags::ZERO));

        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xE0, 0x50]); // CPX #$50
        cpu.regs.x = 0x40;
        cpu.execute(&mut vm, &signals, 1);
        assert!(!cpu.regs.get_flag(flags::CARRY));
        assert!(cpu.regs.get_flag(flags::NEGATIVE));
    }

    #[test]
    fn shifts_and_rotates_move_carry() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x2A]); // ROL A
        cpu.regs.a = 0x80;
        cpu.regs.set_flag(flags::CARRY, true);
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.regs.a, 0x01);
        assert!(cpu.regs.get_flag(flags::CARRY));

        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x6A]); // ROR A
        cpu.regs.a = 0x01;
        cpu.regs.set_flag(flags::CARRY, true);
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.regs.a, 0x80);
        assert!(cpu.regs.get_flag(flags::CARRY));
        assert!(cpu.regs.get_flag(flags::NEGATIVE));
    }

    #[test]
    fn read_does_not_touch_write_latch() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xA5, 0x40]); // LDA $40
        poke(&mut vm, 0x0040, &[0x55]);
        cpu.snap.d = 0xFF;
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.regs.a, 0x55);
        assert_eq!(cpu.snap.d, 0xFF); // 読み取りはdを更新しない
        assert_eq!(cpu.snap.rw, RW_READ);
    }
}
