//! アドレッシングモードの実装
//!
//! 各ヘルパーは実効アドレスを計算してスナップショットの`ea`に記録する。
//! ページ跨ぎペナルティは`snap.opcycles`に直接加算する（ベースコストは
//! `OPCYCLES`表）。ストア系命令はペナルティなしの固定コストなので
//! `penalty=false`で呼ぶ。

use super::Cpu;
use crate::vm::Vm;

impl Cpu {
    /// 即値オペランドを取得
    ///
    /// `ea`はオペランドのアドレスを指し、READが記録される
    pub(super) fn get_immediate(&mut self, vm: &mut Vm) -> u8 {
        self.snap.ea = self.regs.pc;
        self.snap.rw |= super::RW_READ;
        self.fetch_byte(vm)
    }

    /// ゼロページアドレスを取得
    pub(super) fn get_zeropage_addr(&mut self, vm: &mut Vm) -> u16 {
        let addr = self.fetch_byte(vm) as u16;
        self.snap.ea = addr;
        addr
    }

    /// ゼロページ,Xアドレスを取得（ゼロページ内でラップ）
    pub(super) fn get_zeropage_x_addr(&mut self, vm: &mut Vm) -> u16 {
        let addr = self.fetch_byte(vm).wrapping_add(self.regs.x) as u16;
        self.snap.ea = addr;
        addr
    }

    /// ゼロページ,Yアドレスを取得（ゼロページ内でラップ）
    pub(super) fn get_zeropage_y_addr(&mut self, vm: &mut Vm) -> u16 {
        let addr = self.fetch_byte(vm).wrapping_add(self.regs.y) as u16;
        self.snap.ea = addr;
        addr
    }

    /// 絶対アドレスを取得
    pub(super) fn get_absolute_addr(&mut self, vm: &mut Vm) -> u16 {
        let addr = self.fetch_word(vm);
        self.snap.ea = addr;
        addr
    }

    /// 絶対,Xアドレスを取得
    ///
    /// `penalty`が真ならページ境界を越えたとき+1サイクル
    /// （ロードとread-modify-writeは真、ストアは偽）
    pub(super) fn get_absolute_x_addr(&mut self, vm: &mut Vm, penalty: bool) -> u16 {
        let base = self.fetch_word(vm);
        let addr = base.wrapping_add(self.regs.x as u16);
        if penalty && (base & 0xFF00) != (addr & 0xFF00) {
            self.snap.opcycles += 1;
        }
        self.snap.ea = addr;
        addr
    }

    /// 絶対,Yアドレスを取得
    pub(super) fn get_absolute_y_addr(&mut self, vm: &mut Vm, penalty: bool) -> u16 {
        let base = self.fetch_word(vm);
        let addr = base.wrapping_add(self.regs.y as u16);
        if penalty && (base & 0xFF00) != (addr & 0xFF00) {
            self.snap.opcycles += 1;
        }
        self.snap.ea = addr;
        addr
    }

    /// 間接,Xアドレスを取得（ポインタはゼロページ内でラップ）
    pub(super) fn get_indirect_x_addr(&mut self, vm: &mut Vm) -> u16 {
        let ptr = self.fetch_byte(vm).wrapping_add(self.regs.x);
        let low = vm.read(ptr as u16) as u16;
        let high = vm.read(ptr.wrapping_add(1) as u16) as u16;
        let addr = (high << 8) | low;
        self.snap.ea = addr;
        addr
    }

    /// 間接,Yアドレスを取得
    ///
    /// ポインタの上位バイトは(zp+1)&$FFから読む（ページを跨がない）
    pub(super) fn get_indirect_y_addr(&mut self, vm: &mut Vm, penalty: bool) -> u16 {
        let ptr = self.fetch_byte(vm);
        let low = vm.read(ptr as u16) as u16;
        let high = vm.read(ptr.wrapping_add(1) as u16) as u16;
        let base = (high << 8) | low;
        let addr = base.wrapping_add(self.regs.y as u16);
        if penalty && (base & 0xFF00) != (addr & 0xFF00) {
            self.snap.opcycles += 1;
        }
        self.snap.ea = addr;
        addr
    }

    /// 間接アドレス（ゼロページ、65C02用）
    pub(super) fn get_indirect_zp_addr(&mut self, vm: &mut Vm) -> u16 {
        let ptr = self.fetch_byte(vm);
        let low = vm.read(ptr as u16) as u16;
        let high = vm.read(ptr.wrapping_add(1) as u16) as u16;
        let addr = (high << 8) | low;
        self.snap.ea = addr;
        addr
    }

    /// ブランチを実行（共通ロジック）
    ///
    /// `ea`はオペランドのアドレスを指し、rwはNONEのまま。
    /// 分岐成立で+1サイクル、さらに分岐後PCが元の次命令アドレスと
    /// ページを跨ぐ場合+1サイクル
    pub(super) fn branch(&mut self, vm: &mut Vm, condition: bool) {
        self.snap.ea = self.regs.pc;
        let offset = self.fetch_byte(vm) as i8;
        if condition {
            let old_pc = self.regs.pc;
            self.regs.pc = old_pc.wrapping_add(offset as u16);
            self.snap.opcycles += 1;
            if (old_pc & 0xFF00) != (self.regs.pc & 0xFF00) {
                self.snap.opcycles += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::{Cpu, RW_NONE, RW_READ, RW_WRITE};
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

    #[test]
    fn zeropage_x_wraps_within_zero_page() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xB5, 0x80]); // LDA $80,X
        poke(&mut vm, 0x0005, &[0x42]); // 0x80 + 0x85 = 0x05（ラップ）
        cpu.regs.x = 0x85;

        cpu.execute(&mut vm, &signals, 1);

        assert_eq!(cpu.regs.a, 0x42);
        assert_eq!(cpu.snap.ea, 0x0005);
        assert_eq!(cpu.snap.opcycles, 4);
    }

    #[test]
    fn indirect_y_pointer_high_byte_wraps_in_zero_page() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xB1, 0xFF]); // LDA ($FF),Y
        poke(&mut vm, 0x00FF, &[0x10]); // ポインタ下位
        poke(&mut vm, 0x0000, &[0x20]); // ポインタ上位は$0100ではなく$0000から
        poke(&mut vm, 0x2013, &[0x99]);
        cpu.regs.y = 0x03;

        cpu.execute(&mut vm, &signals, 1);

        assert_eq!(cpu.regs.a, 0x99);
        assert_eq!(cpu.snap.ea, 0x2013);
        assert_eq!(cpu.snap.opcycles, 5);
    }

    #[test]
    fn indirect_y_page_cross_charges_penalty() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xB1, 0x40]); // LDA ($40),Y
        poke(&mut vm, 0x0040, &[0xFE, 0x20]);
        poke(&mut vm, 0x2103, &[0x7A]);
        cpu.regs.y = 0x05; // $20FE + 5 = $2103（ページ跨ぎ）

        cpu.execute(&mut vm, &signals, 1);

        assert_eq!(cpu.regs.a, 0x7A);
        assert_eq!(cpu.snap.opcycles, 6);
    }

    #[test]
    fn absolute_x_load_page_cross_charges_penalty() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xBD, 0xFF, 0x20]); // LDA $20FF,X
        poke(&mut vm, 0x2100, &[0x55]);
        cpu.regs.x = 0x01;

        cpu.execute(&mut vm, &signals, 1);

        assert_eq!(cpu.regs.a, 0x55);
        assert_eq!(cpu.snap.opcycles, 5); // 4 + ページ跨ぎ
    }

    #[test]
    fn absolute_x_store_is_fixed_cost() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x9D, 0xFF, 0x20]); // STA $20FF,X
        cpu.regs.a = 0xA5;
        cpu.regs.x = 0x01;

        cpu.execute(&mut vm, &signals, 1);

        assert_eq!(vm.ram[0][0x2100], 0xA5);
        assert_eq!(cpu.snap.opcycles, 5); // ページ跨ぎでも固定
        assert_eq!(cpu.snap.rw, RW_WRITE);
        assert_eq!(cpu.snap.d, 0xA5);
    }

    #[test]
    fn rmw_absolute_x_page_cross_charges_penalty() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xFE, 0xFF, 0x20]); // INC $20FF,X
        poke(&mut vm, 0x2100, &[0x41]);
        cpu.regs.x = 0x01;

        cpu.execute(&mut vm, &signals, 1);

        assert_eq!(vm.ram[0][0x2100], 0x42);
        assert_eq!(cpu.snap.opcycles, 7); // 6 + ページ跨ぎ
        assert_eq!(cpu.snap.rw, RW_READ | RW_WRITE);
        assert_eq!(cpu.snap.d, 0x42);
    }

    #[test]
    fn branch_taken_and_page_cross_penalties() {
        let (mut cpu, mut vm, signals) = test_rig();
        // BEQ +$10（不成立: 2サイクル）
        poke(&mut vm, TEST_LOC, &[0xF0, 0x10]);
        cpu.regs.f = 0;
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.snap.opcycles, 2);
        assert_eq!(cpu.regs.pc, TEST_LOC + 2);
        assert_eq!(cpu.snap.ea, TEST_LOC + 1);
        assert_eq!(cpu.snap.rw, RW_NONE);

        // 成立・同一ページ内: 3サイクル
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xF0, 0x10]);
        cpu.regs.f = crate::cpu::flags::ZERO;
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.snap.opcycles, 3);
        assert_eq!(cpu.regs.pc, TEST_LOC + 2 + 0x10);

        // 成立・ページ跨ぎ: 4サイクル
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xF0, 0x7C]); // $1F84 + $7C = $2000
        cpu.regs.f = crate::cpu::flags::ZERO;
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.snap.opcycles, 4);
        assert_eq!(cpu.regs.pc, 0x2000);
    }
}
