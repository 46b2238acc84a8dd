//! セーブステート機能
//!
//! マシンの状態をserdeでシリアライズ可能な形に写し取り、復元する。
//! ROMイメージ自体は保存しない（復元前に同じROMをロードしておくこと）。

use serde::{Deserialize, Serialize};

use crate::cpu::RunState;
use crate::machine::Machine;

/// CPUレジスタの状態（セーブ用）
#[derive(Serialize, Deserialize, Clone)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    /// 標準6502レイアウトのPレジスタ
    pub p: u8,
    /// 0=実行中, 1=WAI待機, 2=STP停止
    pub run_state: u8,
}

/// メモリとソフトスイッチの状態（セーブ用）
#[derive(Serialize, Deserialize, Clone)]
pub struct VmState {
    pub main_ram: Vec<u8>,
    pub aux_ram: Vec<u8>,
    pub lc_bank_main: Vec<u8>,
    pub lc_bank_aux: Vec<u8>,
    pub lc_card_main: Vec<u8>,
    pub lc_card_aux: Vec<u8>,
    /// ソフトスイッチ語（ベース参照は復元時に再構築する）
    pub switches: u32,
    pub key_latch: u8,
}

/// 完全なマシン状態
#[derive(Serialize, Deserialize, Clone)]
pub struct SaveState {
    pub version: u32,
    pub cpu: CpuState,
    pub vm: VmState,
    pub total_cycles: u64,
    pub frame_count: u64,
}

impl SaveState {
    pub const CURRENT_VERSION: u32 = 1;

    /// 現在のマシン状態を写し取る
    pub fn capture(machine: &Machine) -> SaveState {
        let regs = &machine.cpu.regs;
        SaveState {
            version: Self::CURRENT_VERSION,
            cpu: CpuState {
                a: regs.a,
                x: regs.x,
                y: regs.y,
                sp: regs.sp,
                pc: regs.pc,
                p: regs.p(),
                run_state: match machine.cpu.state {
                    RunState::Running => 0,
                    RunState::Waiting => 1,
                    RunState::Halted => 2,
                },
            },
            vm: VmState {
                main_ram: machine.vm.ram[0].to_vec(),
                aux_ram: machine.vm.ram[1].to_vec(),
                lc_bank_main: machine.vm.lc_bank[0].to_vec(),
                lc_bank_aux: machine.vm.lc_bank[1].to_vec(),
                lc_card_main: machine.vm.lc_card[0].to_vec(),
                lc_card_aux: machine.vm.lc_card[1].to_vec(),
                switches: machine.vm.switches.bits(),
                key_latch: machine.vm.key_latch,
            },
            total_cycles: machine.vm.clock.total,
            frame_count: machine.frame_count,
        }
    }

    /// マシンに状態を復元する
    pub fn restore(&self, machine: &mut Machine) -> Result<(), String> {
        if self.version != Self::CURRENT_VERSION {
            return Err(format!("unsupported savestate version {}", self.version));
        }
        copy_bank(&mut machine.vm.ram[0][..], &self.vm.main_ram, "main_ram")?;
        copy_bank(&mut machine.vm.ram[1][..], &self.vm.aux_ram, "aux_ram")?;
        copy_bank(&mut machine.vm.lc_bank[0][..], &self.vm.lc_bank_main, "lc_bank_main")?;
        copy_bank(&mut machine.vm.lc_bank[1][..], &self.vm.lc_bank_aux, "lc_bank_aux")?;
        copy_bank(&mut machine.vm.lc_card[0][..], &self.vm.lc_card_main, "lc_card_main")?;
        copy_bank(&mut machine.vm.lc_card[1][..], &self.vm.lc_card_aux, "lc_card_aux")?;

        machine.vm.restore_switches(self.vm.switches);
        machine.vm.key_latch = self.vm.key_latch;
        machine.vm.clock.total = self.total_cycles;

        let regs = &mut machine.cpu.regs;
        regs.a = self.cpu.a;
        regs.x = self.cpu.x;
        regs.y = self.cpu.y;
        regs.sp = self.cpu.sp;
        regs.pc = self.cpu.pc;
        regs.set_p(self.cpu.p);
        machine.cpu.state = match self.cpu.run_state {
            0 => RunState::Running,
            1 => RunState::Waiting,
            2 => RunState::Halted,
            other => return Err(format!("invalid run state {}", other)),
        };
        machine.frame_count = self.frame_count;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|e| format!("serialize failed: {}", e))
    }

    pub fn from_json(json: &str) -> Result<SaveState, String> {
        serde_json::from_str(json).map_err(|e| format!("deserialize failed: {}", e))
    }
}

fn copy_bank(dst: &mut [u8], src: &[u8], name: &str) -> Result<(), String> {
    if dst.len() != src.len() {
        return Err(format!(
            "bank {} has wrong size: expected {}, got {}",
            name,
            dst.len(),
            src.len()
        ));
    }
    dst.copy_from_slice(src);
    Ok(())
}
