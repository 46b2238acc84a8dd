//! サウンド書き込みブリッジ
//!
//! CPUスレッドはサウンドレジスタへの書き込み（$C030-$C03Fのスピーカー
//! トグルとスロット4/5のサウンドカードレジスタ）を、サイクルスタンプ付きの
//! 変化ログに記録するだけで、波形合成は行わない。オーディオ側の
//! コラボレータがフレーム境界でログをドレインして合成する。

use std::collections::VecDeque;

/// 1フレームで保持する変化の上限
///
/// 上限を超えた書き込みは黙って捨てる（ブロックは決してしない）
const MAX_CHANGES_PER_FRAME: usize = 4096;

/// サウンドレジスタへの1回の書き込み
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundChange {
    /// マシン起動からの累積サイクル
    pub cycle: u64,
    /// 書き込み先アドレス（$C030-$C03F、またはスロット4/5のI/O）
    pub addr: u16,
    /// 書き込まれた値（スピーカートグルは0）
    pub value: u8,
}

/// サイクルスタンプ付きのサウンド変化ログ
#[derive(Debug, Default)]
pub struct SoundLog {
    changes: VecDeque<SoundChange>,
    /// このフレームで捨てた書き込みの数
    dropped: u32,
}

impl SoundLog {
    pub fn new() -> Self {
        SoundLog {
            changes: VecDeque::with_capacity(MAX_CHANGES_PER_FRAME),
            dropped: 0,
        }
    }

    /// 変化を記録する。満杯なら捨てる
    pub fn push(&mut self, cycle: u64, addr: u16, value: u8) {
        if self.changes.len() >= MAX_CHANGES_PER_FRAME {
            self.dropped += 1;
            return;
        }
        self.changes.push_back(SoundChange { cycle, addr, value });
    }

    /// フレーム境界: 溜まった変化をすべて取り出す
    pub fn drain_frame(&mut self) -> Vec<SoundChange> {
        if self.dropped > 0 {
            log::debug!("sound log full, dropped {} writes this frame", self.dropped);
            self.dropped = 0;
        }
        self.changes.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_are_recorded_in_order() {
        let mut log = SoundLog::new();
        log.push(100, 0xC030, 0);
        log.push(250, 0xC030, 0);
        log.push(300, 0xC4A0, 0x7F);

        let frame = log.drain_frame();
        assert_eq!(frame.len(), 3);
        assert_eq!(frame[0], SoundChange { cycle: 100, addr: 0xC030, value: 0 });
        assert_eq!(frame[2].addr, 0xC4A0);
        assert!(log.is_empty());
    }

    #[test]
    fn overflow_drops_without_blocking() {
        let mut log = SoundLog::new();
        for i in 0..(MAX_CHANGES_PER_FRAME + 100) {
            log.push(i as u64, 0xC030, 0);
        }
        assert_eq!(log.len(), MAX_CHANGES_PER_FRAME);

        let frame = log.drain_frame();
        assert_eq!(frame.len(), MAX_CHANGES_PER_FRAME);
        // ドレイン後は再び記録できる
        log.push(0, 0xC030, 0);
        assert_eq!(log.len(), 1);
    }
}
