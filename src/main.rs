//! a2vm - ヘッドレスApple IIeエミュレーションコア
//!
//! ROMをロードして指定フレーム数だけ実行し、最終状態をダンプする。
//! 描画とオーディオ合成は外部コラボレータの責務なので、ここでは
//! サウンド変化数とビデオダーティフラグの統計だけを報告する。

use a2vm::machine::Machine;
use a2vm::savestate::SaveState;
use clap::Parser;

/// a2vm - Apple IIe emulation core
#[derive(Parser, Debug)]
#[command(name = "a2vm")]
#[command(version = "0.2.0")]
#[command(about = "Headless Apple IIe emulation core", long_about = None)]
struct Args {
    /// 32KB ROMイメージファイル
    #[arg(short, long)]
    rom: String,

    /// 実行するフレーム数（1フレーム = 17030サイクル）
    #[arg(short, long, default_value = "60")]
    frames: u64,

    /// フレーム数の代わりに実行するサイクル数
    #[arg(short, long)]
    cycles: Option<i32>,

    /// 実行後にセーブステートを書き出すパス
    #[arg(long)]
    save_state: Option<String>,

    /// 実行前に復元するセーブステートのパス
    #[arg(long)]
    load_state: Option<String>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    let mut machine = Machine::new();
    machine.load_rom_file(&args.rom)?;

    if let Some(path) = &args.load_state {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read state {}: {}", path, e))?;
        SaveState::from_json(&json)?.restore(&mut machine)?;
        log::info!("state restored from {}", path);
    }

    let mut sound_changes = 0usize;
    let mut dirty_frames = 0u64;
    if let Some(budget) = args.cycles {
        machine.run_cycles(budget);
        sound_changes += machine.vm.sound.drain_frame().len();
        if machine.vm.video_dirty {
            dirty_frames += 1;
        }
    } else {
        for _ in 0..args.frames {
            let changes = machine.run_frame();
            sound_changes += changes.len();
            if machine.vm.video_dirty {
                dirty_frames += 1;
                machine.vm.video_dirty = false;
            }
        }
    }

    let regs = &machine.cpu.regs;
    println!(
        "after {} frames ({} cycles):",
        machine.frame_count, machine.vm.clock.total
    );
    println!(
        "  pc={:04X} a={:02X} x={:02X} y={:02X} sp={:02X} p={:02X}",
        regs.pc,
        regs.a,
        regs.x,
        regs.y,
        regs.sp,
        regs.p()
    );
    println!(
        "  sound changes: {}, frames with video writes: {}",
        sound_changes, dirty_frames
    );

    if let Some(path) = &args.save_state {
        let json = SaveState::capture(&machine).to_json()?;
        std::fs::write(path, json)
            .map_err(|e| format!("failed to write state {}: {}", path, e))?;
        log::info!("state saved to {}", path);
    }

    Ok(())
}
