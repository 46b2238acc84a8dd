//! MOS 6502/65C02 CPU エミュレータ
//!
//! Apple IIeで使用される65C02プロセッサのエミュレーション実装。
//! オペコードは256エントリのディスパッチテーブル、サイクル数は
//! ベースコスト表＋ペナルティ（ページ跨ぎ・分岐成立）で計上する。

mod opcodes;
mod cycles;
pub mod addressing;

use crate::interrupts::{self, InterruptSignals};
use crate::vm::Vm;

pub use cycles::OPCYCLES;
pub use opcodes::OPCODES;

/// CPU内部のフラグビット
///
/// インタプリタ内部の並び。正規の6502 Pレジスタとはビット配置が異なり、
/// 相互変換は`FLAGS_ENCODE`/`FLAGS_DECODE`で行う。
pub mod flags {
    pub const CARRY: u8 = 0b0000_0001;       // C: キャリーフラグ
    pub const XTRA: u8 = 0b0000_0010;        // X: 予約ビット（6502のbit5）
    pub const IRQ_DISABLE: u8 = 0b0000_0100; // I: 割り込み禁止フラグ
    pub const OVERFLOW: u8 = 0b0000_1000;    // V: オーバーフローフラグ
    pub const BREAK: u8 = 0b0001_0000;       // B: ブレークフラグ
    pub const DECIMAL: u8 = 0b0010_0000;     // D: BCDモードフラグ
    pub const ZERO: u8 = 0b0100_0000;        // Z: ゼロフラグ
    pub const NEGATIVE: u8 = 0b1000_0000;    // N: 負数フラグ
}

/// 正規の6502 Pレジスタのフラグビット
pub mod flags6502 {
    pub const CARRY: u8 = 0b0000_0001;
    pub const ZERO: u8 = 0b0000_0010;
    pub const IRQ_DISABLE: u8 = 0b0000_0100;
    pub const DECIMAL: u8 = 0b0000_1000;
    pub const BREAK: u8 = 0b0001_0000;
    pub const XTRA: u8 = 0b0010_0000;
    pub const OVERFLOW: u8 = 0b0100_0000;
    pub const NEGATIVE: u8 = 0b1000_0000;
}

const fn build_flag_tables() -> ([u8; 256], [u8; 256]) {
    let mut encode = [0u8; 256];
    let mut decode = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let f = i as u8;
        let mut p = 0u8;
        if f & flags::CARRY != 0 {
            p |= flags6502::CARRY;
        }
        if f & flags::XTRA != 0 {
            p |= flags6502::XTRA;
        }
        if f & flags::IRQ_DISABLE != 0 {
            p |= flags6502::IRQ_DISABLE;
        }
        if f & flags::OVERFLOW != 0 {
            p |= flags6502::OVERFLOW;
        }
        if f & flags::BREAK != 0 {
            p |= flags6502::BREAK;
        }
        if f & flags::DECIMAL != 0 {
            p |= flags6502::DECIMAL;
        }
        if f & flags::ZERO != 0 {
            p |= flags6502::ZERO;
        }
        if f & flags::NEGATIVE != 0 {
            p |= flags6502::NEGATIVE;
        }
        encode[i] = p;
        decode[p as usize] = f;
        i += 1;
    }
    (encode, decode)
}

/// 内部フラグ → 6502 Pレジスタ
pub static FLAGS_ENCODE: [u8; 256] = build_flag_tables().0;
/// 6502 Pレジスタ → 内部フラグ
pub static FLAGS_DECODE: [u8; 256] = build_flag_tables().1;

/// 割り込みベクタ
pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// 診断スナップショットのread/write表示ビット
pub const RW_NONE: u8 = 0x0;
pub const RW_READ: u8 = 0x1;
pub const RW_WRITE: u8 = 0x2;

/// CPUレジスタの状態
#[derive(Debug, Clone)]
pub struct Registers {
    /// アキュムレータ（A）
    pub a: u8,
    /// Xインデックスレジスタ
    pub x: u8,
    /// Yインデックスレジスタ
    pub y: u8,
    /// スタックポインタ
    pub sp: u8,
    /// プログラムカウンタ
    pub pc: u16,
    /// フラグ（内部エンコーディング）
    pub f: u8,
}

impl Default for Registers {
    fn default() -> Self {
        Registers {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFF,
            pc: 0,
            f: 0,
        }
    }
}

impl Registers {
    /// フラグをセット
    pub fn set_flag(&mut self, flag: u8, value: bool) {
        if value {
            self.f |= flag;
        } else {
            self.f &= !flag;
        }
    }

    /// フラグを取得
    pub fn get_flag(&self, flag: u8) -> bool {
        (self.f & flag) != 0
    }

    /// ゼロフラグと負数フラグを値に基づいて更新
    pub fn update_zero_negative_flags(&mut self, value: u8) {
        self.set_flag(flags::ZERO, value == 0);
        self.set_flag(flags::NEGATIVE, (value & 0x80) != 0);
    }

    /// 正規の6502 Pレジスタ値を取得
    pub fn p(&self) -> u8 {
        FLAGS_ENCODE[self.f as usize]
    }

    /// 正規の6502 Pレジスタ値から設定
    pub fn set_p(&mut self, p: u8) {
        self.f = FLAGS_DECODE[p as usize];
    }
}

/// 直前に実行した命令の診断スナップショット
///
/// 命令ごとに作り直される読み取り専用の観測値。テストとデバッガが消費する。
/// `d`は書き込みラッチで、読み取りでは更新されない。
#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
    /// 実効アドレス（暗黙命令では命令自身のアドレス）
    pub ea: u16,
    /// 最後に書き込んだデータ
    pub d: u8,
    /// RW_NONE / RW_READ / RW_WRITE のビット和
    pub rw: u8,
    /// オペコードバイト
    pub opcode: u8,
    /// この命令に課金したサイクル数（ペナルティ込み）
    pub opcycles: u8,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            ea: 0xFFFF,
            d: 0xFF,
            rw: 0xFF,
            opcode: 0xFF,
            opcycles: 0xFF,
        }
    }
}

/// インタプリタの実行状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// 通常実行中
    Running,
    /// WAI実行後。割り込みで再開する
    Waiting,
    /// STP実行後。RESET/NMIでのみ再開する
    Halted,
}

/// 65C02 CPUエミュレータ
#[derive(Debug, Clone)]
pub struct Cpu {
    /// CPUレジスタ
    pub regs: Registers,
    /// 診断スナップショット
    pub snap: Snapshot,
    /// 現在の`execute`呼び出しで消費したサイクル
    pub cycle_count: i32,
    /// 現在の`execute`呼び出しのサイクルバジェット
    pub cycles_to_execute: i32,
    /// 実行状態（WAI/STP）
    pub state: RunState,
}

impl Default for Cpu {
    fn default() -> Self {
        Cpu::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            regs: Registers::default(),
            snap: Snapshot::default(),
            cycle_count: 0,
            cycles_to_execute: 0,
            state: RunState::Running,
        }
    }

    /// CPUとソフトスイッチをリセット
    ///
    /// スタックへのプッシュは行わない。SPは3減り、Iがセットされ、
    /// ソフトスイッチとベース参照が電源投入状態に戻った上で、
    /// PCはリセットベクタ（$FFFC-$FFFD）から読み込まれる。
    /// スイッチを先に戻すことで、ベクタは必ずROM側から読まれる。
    pub fn reset(&mut self, vm: &mut Vm) {
        vm.reset();
        self.regs.sp = self.regs.sp.wrapping_sub(3);
        self.regs.set_flag(flags::IRQ_DISABLE, true);
        self.regs.set_flag(flags::DECIMAL, false);
        self.regs.pc = self.read_word(vm, RESET_VECTOR);
        self.state = RunState::Running;
        self.cycle_count += 7;
        vm.clock.advance(7);
    }

    /// サイクルバジェットを消費するまで命令を実行する
    ///
    /// 消費したサイクル数を返す。失敗を返すことはない：
    /// 未定義オペコードは固定7サイクルのNOP、割り込みは命令境界ごとに
    /// 1回だけチェックされる。ベクタへ飛んだ直後の1命令は
    /// バジェット判定より先に実行される。
    pub fn execute(&mut self, vm: &mut Vm, signals: &InterruptSignals, budget: i32) -> i32 {
        self.cycles_to_execute = budget;
        self.cycle_count = 0;
        loop {
            if self.state == RunState::Running {
                self.step(vm);
            }
            let sig = signals.peek();
            if sig & interrupts::SHUTDOWN != 0 {
                break;
            }
            if sig != 0 && self.service_signals(vm, signals, sig) {
                continue;
            }
            if self.state != RunState::Running {
                // 再開できる割り込みが無い。停止したまま残りバジェットを消化する
                let rest = (self.cycles_to_execute - self.cycle_count).max(0);
                self.cycle_count += rest;
                vm.clock.advance(rest as u64);
                break;
            }
            if self.cycle_count >= self.cycles_to_execute {
                break;
            }
        }
        self.cycle_count
    }

    /// 1命令をフェッチ・デコード・実行する
    fn step(&mut self, vm: &mut Vm) {
        let at = self.regs.pc;
        let opcode = vm.read(at);
        self.regs.pc = at.wrapping_add(1);
        self.snap.ea = at;
        self.snap.rw = RW_NONE;
        self.snap.opcode = opcode;
        self.snap.opcycles = cycles::OPCYCLES[opcode as usize];
        opcodes::OPCODES[opcode as usize](self, vm);
        self.cycle_count += i32::from(self.snap.opcycles);
        vm.clock.advance(u64::from(self.snap.opcycles));
    }

    /// ペンディング中のシグナルを処理する。ベクタへ飛んだらtrue
    fn service_signals(&mut self, vm: &mut Vm, signals: &InterruptSignals, sig: u32) -> bool {
        if sig & interrupts::RESET != 0 {
            signals.clear(interrupts::RESET);
            self.reset(vm);
            return true;
        }
        if sig & interrupts::NMI != 0 {
            signals.clear(interrupts::NMI);
            self.state = RunState::Running;
            self.vector(vm, NMI_VECTOR);
            return true;
        }
        if sig & interrupts::IRQ_MASK != 0 {
            if self.state == RunState::Halted {
                // STPはIRQでは復帰しない
                return false;
            }
            if !self.regs.get_flag(flags::IRQ_DISABLE) {
                self.state = RunState::Running;
                self.vector(vm, IRQ_VECTOR);
                return true;
            }
            if self.state == RunState::Waiting {
                // WAI中のマスク済みIRQ: ベクタへは飛ばず次の命令から再開
                self.state = RunState::Running;
            }
        }
        false
    }

    /// ハードウェア割り込みシーケンス（IRQ/NMI）
    ///
    /// プッシュされるPはBクリア・Xセット。その後ライブフラグにはB|Xが
    /// 立ったまま残る（実機由来の癖。BRKとの非対称はテストが直接検証する）。
    fn vector(&mut self, vm: &mut Vm, vec: u16) {
        self.push_word(vm, self.regs.pc);
        let p = FLAGS_ENCODE[((self.regs.f | flags::XTRA) & !flags::BREAK) as usize];
        self.push_byte(vm, p);
        self.regs.f |= flags::BREAK | flags::XTRA;
        self.regs.set_flag(flags::IRQ_DISABLE, true);
        self.regs.set_flag(flags::DECIMAL, false);
        self.regs.pc = self.read_word(vm, vec);
        self.cycle_count += 7;
        vm.clock.advance(7);
    }

    fn read_word(&mut self, vm: &mut Vm, addr: u16) -> u16 {
        let low = vm.read(addr) as u16;
        let high = vm.read(addr.wrapping_add(1)) as u16;
        (high << 8) | low
    }

    /// PCから1バイトフェッチしてPCをインクリメント
    pub(super) fn fetch_byte(&mut self, vm: &mut Vm) -> u8 {
        let value = vm.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    /// PCから2バイト（ワード）をフェッチ
    pub(super) fn fetch_word(&mut self, vm: &mut Vm) -> u16 {
        let low = self.fetch_byte(vm) as u16;
        let high = self.fetch_byte(vm) as u16;
        (high << 8) | low
    }

    /// 実効アドレスからデータをロード（スナップショットにREADを記録）
    pub(super) fn load(&mut self, vm: &mut Vm, ea: u16) -> u8 {
        self.snap.rw |= RW_READ;
        vm.read(ea)
    }

    /// 実効アドレスへデータをストア（スナップショットにWRITEとデータを記録）
    pub(super) fn store(&mut self, vm: &mut Vm, ea: u16, value: u8) {
        self.snap.rw |= RW_WRITE;
        self.snap.d = value;
        vm.write(ea, value);
    }

    /// スタックに1バイトプッシュ
    pub(super) fn push_byte(&mut self, vm: &mut Vm, value: u8) {
        vm.write(0x0100 | self.regs.sp as u16, value);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
    }

    /// スタックから1バイトポップ
    pub(super) fn pop_byte(&mut self, vm: &mut Vm) -> u8 {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        vm.read(0x0100 | self.regs.sp as u16)
    }

    /// スタックに2バイトプッシュ（上位バイト先）
    pub(super) fn push_word(&mut self, vm: &mut Vm, value: u16) {
        self.push_byte(vm, (value >> 8) as u8);
        self.push_byte(vm, value as u8);
    }

    /// スタックから2バイトポップ
    pub(super) fn pop_word(&mut self, vm: &mut Vm) -> u16 {
        let low = self.pop_byte(vm) as u16;
        let high = self.pop_byte(vm) as u16;
        (high << 8) | low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupts::InterruptSignals;
    use crate::vm::Vm;

    const TEST_LOC: u16 = 0x1F82;

    fn test_rig() -> (Cpu, Vm, InterruptSignals) {
        let mut cpu = Cpu::new();
        cpu.regs.pc = TEST_LOC;
        (cpu, Vm::new(), InterruptSignals::new())
    }

    /// プログラムをメインバンクに直接書き込む
    fn poke(vm: &mut Vm, addr: u16, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            vm.ram[0][addr.wrapping_add(i as u16) as usize] = b;
        }
    }

    #[test]
    fn flag_codec_round_trips_all_256_values() {
        for i in 0..=255u8 {
            assert_eq!(FLAGS_DECODE[FLAGS_ENCODE[i as usize] as usize], i);
            assert_eq!(FLAGS_ENCODE[FLAGS_DECODE[i as usize] as usize], i);
        }
    }

    #[test]
    fn flag_codec_maps_canonical_bits() {
        assert_eq!(FLAGS_ENCODE[flags::CARRY as usize], flags6502::CARRY);
        assert_eq!(FLAGS_ENCODE[flags::ZERO as usize], flags6502::ZERO);
        assert_eq!(FLAGS_ENCODE[flags::XTRA as usize], flags6502::XTRA);
        assert_eq!(FLAGS_ENCODE[flags::BREAK as usize], flags6502::BREAK);
        assert_eq!(FLAGS_ENCODE[flags::DECIMAL as usize], flags6502::DECIMAL);
        assert_eq!(FLAGS_ENCODE[flags::NEGATIVE as usize], flags6502::NEGATIVE);
    }

    #[test]
    fn adc_immediate_end_to_end() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x69, 0x01]); // ADC #$01
        cpu.regs.a = 0x7F;
        cpu.regs.f = 0;

        let cycles = cpu.execute(&mut vm, &signals, 1);

        assert_eq!(cpu.regs.a, 0x80);
        assert!(cpu.regs.get_flag(flags::NEGATIVE));
        assert!(cpu.regs.get_flag(flags::OVERFLOW));
        assert!(!cpu.regs.get_flag(flags::ZERO));
        assert!(!cpu.regs.get_flag(flags::CARRY));
        assert_eq!(cpu.regs.pc, 0x1F84);
        assert_eq!(cpu.snap.opcycles, 2);
        assert_eq!(cycles, 2);
        assert_eq!(cpu.snap.ea, TEST_LOC + 1);
        assert_eq!(cpu.snap.rw, RW_READ);
        assert_eq!(cpu.snap.opcode, 0x69);
    }

    #[test]
    fn brk_pushes_return_address_and_flags_with_break_set() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x00, 0xA5]); // BRK + パディングバイト
        poke(&mut vm, IRQ_VECTOR, &[0x00, 0x98]);
        cpu.regs.f = 0;
        cpu.regs.sp = 0xFF;
        poke(&mut vm, 0x9800, &[0xEA]);

        cpu.execute(&mut vm, &signals, 1);

        assert_eq!(cpu.regs.sp, 0xFC);
        assert_eq!(vm.ram[0][0x01FF], 0x1F);
        assert_eq!(vm.ram[0][0x01FE], 0x84); // TEST_LOC+2 の下位バイト
        assert_eq!(
            vm.ram[0][0x01FD],
            FLAGS_ENCODE[(flags::BREAK | flags::XTRA) as usize]
        );
        assert!(cpu.regs.get_flag(flags::IRQ_DISABLE));
        assert!(cpu.regs.get_flag(flags::BREAK));
        assert!(cpu.regs.get_flag(flags::XTRA));
    }

    #[test]
    fn irq_pushes_flags_with_break_clear() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xEA]); // NOP: まず1命令、その後に割り込み処理
        poke(&mut vm, IRQ_VECTOR, &[0x00, 0x98]);
        poke(&mut vm, 0x9800, &[0xEA]);
        cpu.regs.f = 0;
        cpu.regs.sp = 0xFF;
        signals.raise(crate::interrupts::IRQ_GENERIC);

        cpu.execute(&mut vm, &signals, 1);

        assert_eq!(cpu.regs.sp, 0xFC);
        assert_eq!(vm.ram[0][0x01FF], 0x1F);
        assert_eq!(vm.ram[0][0x01FE], 0x83); // NOPの次のフェッチアドレス
        assert_eq!(vm.ram[0][0x01FD], FLAGS_ENCODE[flags::XTRA as usize]);
        assert!(cpu.regs.get_flag(flags::IRQ_DISABLE));
        // ライブフラグにはB|Xが立つ（BRKとの非対称）
        assert!(cpu.regs.get_flag(flags::BREAK));
        assert!(cpu.regs.get_flag(flags::XTRA));
        // ベクタ直後の1命令はバジェット判定より先に実行される
        assert_eq!(cpu.regs.pc, 0x9801);
        assert_eq!(cpu.snap.opcode, 0xEA);
    }

    #[test]
    fn nmi_vectors_even_with_interrupt_disable() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xEA]);
        poke(&mut vm, NMI_VECTOR, &[0x00, 0x98]);
        poke(&mut vm, 0x9800, &[0xEA]);
        cpu.regs.f = flags::IRQ_DISABLE;
        cpu.regs.sp = 0xFF;
        signals.raise(crate::interrupts::NMI);

        cpu.execute(&mut vm, &signals, 1);

        assert_eq!(cpu.regs.sp, 0xFC);
        assert_eq!(cpu.regs.pc, 0x9801);
        // NMIは消費済み
        assert_eq!(signals.peek() & crate::interrupts::NMI, 0);
    }

    #[test]
    fn irq_masked_by_interrupt_disable() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xEA, 0xEA]);
        cpu.regs.f = flags::IRQ_DISABLE;
        signals.raise(crate::interrupts::IRQ_GENERIC);

        cpu.execute(&mut vm, &signals, 1);

        assert_eq!(cpu.regs.pc, TEST_LOC + 1);
        assert_eq!(cpu.regs.sp, 0xFF);
    }

    #[test]
    fn reset_loads_reset_vector_without_pushing() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xEA]);
        poke(&mut vm, RESET_VECTOR, &[0x00, 0xFA]);
        poke(&mut vm, 0xFA00, &[0xEA]);
        cpu.regs.sp = 0xFF;
        signals.raise(crate::interrupts::RESET);

        cpu.execute(&mut vm, &signals, 1);

        assert_eq!(cpu.regs.sp, 0xFC);
        assert_eq!(vm.ram[0][0x01FF], 0x00); // プッシュされていない
        assert_eq!(cpu.regs.pc, 0xFA01);
        assert_eq!(signals.peek() & crate::interrupts::RESET, 0);
    }

    #[test]
    fn wai_waits_until_interrupt() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xCB, 0xEA]); // WAI; NOP
        cpu.regs.f = flags::IRQ_DISABLE;

        let cycles = cpu.execute(&mut vm, &signals, 100);
        assert_eq!(cpu.state, RunState::Waiting);
        assert_eq!(cycles, 100); // 停止したままバジェットを消化

        // マスク済みIRQ: ベクタへ飛ばず次の命令から再開
        signals.raise(crate::interrupts::IRQ_GENERIC);
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.state, RunState::Running);
        assert_eq!(cpu.regs.pc, TEST_LOC + 2);
    }

    #[test]
    fn stp_halts_until_reset() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xDB]); // STP
        poke(&mut vm, RESET_VECTOR, &[0x00, 0xFA]);
        poke(&mut vm, 0xFA00, &[0xEA]);

        cpu.execute(&mut vm, &signals, 10);
        assert_eq!(cpu.state, RunState::Halted);

        // IRQでは復帰しない
        signals.raise(crate::interrupts::IRQ_GENERIC);
        cpu.execute(&mut vm, &signals, 10);
        assert_eq!(cpu.state, RunState::Halted);
        signals.clear(crate::interrupts::IRQ_GENERIC);

        signals.raise(crate::interrupts::RESET);
        cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cpu.state, RunState::Running);
        assert_eq!(cpu.regs.pc, 0xFA01);
    }

    #[test]
    fn undefined_opcode_is_seven_cycle_nop() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0x02, 0xEA]); // 未定義スロット
        // 0x02は実機ではマルチバイトNOPだが、本コアでは固定7サイクルの
        // 1バイトNOPとして扱う
        let cycles = cpu.execute(&mut vm, &signals, 1);
        assert_eq!(cycles, 7);
        assert_eq!(cpu.regs.pc, TEST_LOC + 1);
        assert_eq!(cpu.snap.opcycles, 7);
    }

    /// 全256オペコードがベースコスト表どおりに課金することを検証する
    ///
    /// レジスタ・フラグ・メモリをすべてゼロにした環境ではページ跨ぎも
    /// BCD補正も発生しないので、期待値はベースコストに分岐成立の+1を
    /// 加えたものだけになる（BCDの+1は別テストで検証）。
    #[test]
    fn every_opcode_charges_tabulated_base_cycles() {
        for op in 0..=255u8 {
            let (mut cpu, mut vm, signals) = test_rig();
            poke(&mut vm, TEST_LOC, &[op]);

            cpu.execute(&mut vm, &signals, 1);

            // フラグ0で成立する分岐: BPL/BVC/BCC/BNE/BRA。
            // ゼロページが0なのでBBR0-7も成立、BBS0-7は不成立
            let taken_branch = matches!(op, 0x10 | 0x50 | 0x80 | 0x90 | 0xD0)
                || (op & 0x0F == 0x0F && op < 0x80);
            let expected = OPCYCLES[op as usize] + u8::from(taken_branch);
            assert_eq!(
                cpu.snap.opcycles, expected,
                "opcode {:02X} charged {} cycles, table says {}",
                op, cpu.snap.opcycles, expected
            );
            assert_eq!(cpu.snap.opcode, op);
        }
    }

    #[test]
    fn shutdown_signal_stops_execution_at_instruction_boundary() {
        let (mut cpu, mut vm, signals) = test_rig();
        poke(&mut vm, TEST_LOC, &[0xEA, 0xEA, 0xEA]);
        signals.raise(crate::interrupts::SHUTDOWN);

        let cycles = cpu.execute(&mut vm, &signals, 1000);
        assert_eq!(cycles, 2); // 1命令だけ実行して戻る
    }
}
