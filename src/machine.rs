//! マシン統合
//!
//! CPU、メモリディスパッチ、割り込みシグナルを束ねるトップレベル。
//! フレーム単位の実行と、専用CPUスレッドでの実行の両方を提供する。

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::cpu::Cpu;
use crate::interrupts::{self, InterruptSignals};
use crate::sound::SoundChange;
use crate::vm::{Vm, CYCLES_PER_FRAME};

/// 1フレームの実時間（NTSC 60Hz相当）
const FRAME_DURATION: Duration = Duration::from_micros(16_688);

/// シャットダウン時にCPUスレッドの返却を待つ上限
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// エミュレートされるマシン全体
pub struct Machine {
    pub cpu: Cpu,
    pub vm: Vm,
    pub signals: Arc<InterruptSignals>,
    pub frame_count: u64,
}

impl Default for Machine {
    fn default() -> Self {
        Machine::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            cpu: Cpu::new(),
            vm: Vm::new(),
            signals: Arc::new(InterruptSignals::new()),
            frame_count: 0,
        }
    }

    /// 32KB ROMイメージを取り込んでコールドブートする
    pub fn load_rom(&mut self, image: &[u8]) -> Result<(), String> {
        self.vm.load_rom(image)?;
        log::info!("ROM loaded ({} bytes)", image.len());
        let vector = u16::from_le_bytes([image[0x3FFC], image[0x3FFD]]);
        if vector == 0x0000 || vector == 0xFFFF {
            log::warn!("suspicious reset vector {:04X} in ROM image", vector);
        }
        self.cold_boot();
        Ok(())
    }

    /// ROMファイルを読み込む
    pub fn load_rom_file(&mut self, path: &str) -> Result<(), String> {
        let image = std::fs::read(path)
            .map_err(|e| format!("failed to read ROM {}: {}", path, e))?;
        self.load_rom(&image)
    }

    /// 電源投入相当: メモリ・スイッチ・CPUをすべて初期化する
    pub fn cold_boot(&mut self) {
        self.vm.reset_memory();
        self.cpu = Cpu::new();
        // Cpu::resetがソフトスイッチも電源投入状態に戻す
        self.cpu.reset(&mut self.vm);
        self.frame_count = 0;
        log::debug!("cold boot, pc={:04X}", self.cpu.regs.pc);
    }

    /// リセット要求。CPUスレッドが次の命令境界で処理する
    pub fn request_reset(&self) {
        self.signals.raise(interrupts::RESET);
    }

    /// 指定サイクル数だけ実行する
    pub fn run_cycles(&mut self, budget: i32) -> i32 {
        self.cpu.execute(&mut self.vm, &self.signals, budget)
    }

    /// 1フレーム分（17030サイクル）を実行し、溜まったサウンド変化を返す
    pub fn run_frame(&mut self) -> Vec<SoundChange> {
        self.cpu
            .execute(&mut self.vm, &self.signals, CYCLES_PER_FRAME as i32);
        self.frame_count += 1;
        self.vm.sound.drain_frame()
    }
}

/// 専用CPUスレッドで動作中のマシンへのハンドル
///
/// シグナルレジスタ経由で割り込みとシャットダウンを要求できる。
/// シャットダウン時にはマシンの所有権がチャネルで返却される。
pub struct MachineThread {
    signals: Arc<InterruptSignals>,
    handle: JoinHandle<()>,
    receiver: Receiver<Machine>,
}

impl MachineThread {
    /// マシンを専用スレッドに移して60Hzのフレームループを開始する
    pub fn spawn(machine: Machine) -> Self {
        let signals = Arc::clone(&machine.signals);
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("cpu".into())
            .spawn(move || {
                let mut machine = machine;
                log::debug!("cpu thread started");
                loop {
                    let frame_start = Instant::now();
                    machine.run_frame();
                    if machine.signals.peek() & interrupts::SHUTDOWN != 0 {
                        break;
                    }
                    // 実時間60Hzにペーシングする
                    let elapsed = frame_start.elapsed();
                    if elapsed < FRAME_DURATION {
                        thread::sleep(FRAME_DURATION - elapsed);
                    }
                }
                log::debug!(
                    "cpu thread stopping after {} frames",
                    machine.frame_count
                );
                // 受信側が先に消えていても単に捨てるだけでよい
                let _ = sender.send(machine);
            })
            .expect("failed to spawn cpu thread");
        MachineThread {
            signals,
            handle,
            receiver,
        }
    }

    pub fn signals(&self) -> &Arc<InterruptSignals> {
        &self.signals
    }

    /// 協調的に停止させ、マシンの所有権を回収する
    pub fn shutdown(self) -> Result<Machine, String> {
        self.signals.raise(interrupts::SHUTDOWN);
        let machine = self
            .receiver
            .recv_timeout(SHUTDOWN_TIMEOUT)
            .map_err(|e| format!("cpu thread did not return the machine: {}", e))?;
        self.handle
            .join()
            .map_err(|_| "cpu thread panicked".to_string())?;
        Ok(machine)
    }
}
