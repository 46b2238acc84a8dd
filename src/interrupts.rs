//! 割り込みシグナルレジスタ
//!
//! どのスレッドからでも`raise`/`clear`できるアトミックなビットマスク。
//! インタプリタは命令境界ごとに`peek`（relaxedロード）で確認する。
//! シグナルはレベルトリガ: ビットが立っている限り処理対象であり、
//! クリアはデバイス側（またはサービスルーチン側）の責任。

use std::sync::atomic::{AtomicU32, Ordering};

/// リセット要求
pub const RESET: u32 = 1 << 0;
/// ノンマスカブル割り込み
pub const NMI: u32 = 1 << 1;
/// 汎用IRQ（周辺カード）
pub const IRQ_GENERIC: u32 = 1 << 2;
/// マウスカードIRQ
pub const IRQ_MOUSE: u32 = 1 << 3;
/// 音声合成カードIRQ
pub const IRQ_SPEECH: u32 = 1 << 4;
/// CPUスレッドの協調的停止要求
pub const SHUTDOWN: u32 = 1 << 5;

/// IRQ系シグナルの合成マスク
pub const IRQ_MASK: u32 = IRQ_GENERIC | IRQ_MOUSE | IRQ_SPEECH;

/// スレッド間で共有する割り込みシグナル
#[derive(Debug, Default)]
pub struct InterruptSignals {
    bits: AtomicU32,
}

impl InterruptSignals {
    pub fn new() -> Self {
        InterruptSignals {
            bits: AtomicU32::new(0),
        }
    }

    /// シグナルを立てる
    pub fn raise(&self, reason: u32) {
        self.bits.fetch_or(reason, Ordering::SeqCst);
    }

    /// シグナルを下ろす
    pub fn clear(&self, reason: u32) {
        self.bits.fetch_and(!reason, Ordering::SeqCst);
    }

    /// 現在のマスクを読む（relaxed: ホットパス用で取りこぼしは次の境界で拾う）
    pub fn peek(&self) -> u32 {
        self.bits.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_and_clear_are_idempotent() {
        let signals = InterruptSignals::new();
        signals.raise(IRQ_GENERIC);
        signals.raise(IRQ_GENERIC);
        assert_eq!(signals.peek(), IRQ_GENERIC);
        signals.clear(IRQ_GENERIC);
        signals.clear(IRQ_GENERIC);
        assert_eq!(signals.peek(), 0);
    }

    #[test]
    fn reasons_accumulate_independently() {
        let signals = InterruptSignals::new();
        signals.raise(IRQ_MOUSE);
        signals.raise(NMI);
        assert_eq!(signals.peek(), IRQ_MOUSE | NMI);
        signals.clear(IRQ_MOUSE);
        assert_eq!(signals.peek(), NMI);
        assert_eq!(signals.peek() & IRQ_MASK, 0);
    }

    #[test]
    fn raise_is_visible_across_threads() {
        use std::sync::Arc;
        let signals = Arc::new(InterruptSignals::new());
        let other = Arc::clone(&signals);
        let handle = std::thread::spawn(move || other.raise(SHUTDOWN));
        handle.join().unwrap();
        assert_eq!(signals.peek() & SHUTDOWN, SHUTDOWN);
    }
}
