//! A2VM - Apple IIe CPU/メモリコア in Rust
//!
//! Apple IIeの心臓部をサイクル精度でエミュレートする:
//! - 6502/65C02 命令インタプリタ（256エントリのオペコードテーブル）
//! - バンク切り替えメモリディスパッチ（64Kエントリのread/writeテーブル）
//! - ソフトスイッチ（TEXT/PAGE2/RAMRD/ランゲージカード等）
//! - 割り込みシグナルレジスタとCPUスレッド
//!
//! ビデオ描画・ディスクI/O・デバッガは外部コラボレータとして扱い、
//! メモリディスパッチ経由のフックのみを公開する。

pub mod cpu;
pub mod vm;
pub mod interrupts;
pub mod sound;
pub mod machine;
pub mod savestate;
