//! Apple IIeメモリディスパッチサブシステム
//!
//! 読み書きはアドレスごとの関数ポインタテーブル（64Kエントリ×2）で
//! ディスパッチする。バンク切り替えは「ベース参照」（バンクID＋オフセット）の
//! 付け替えだけで行い、テーブル自体は起動時に一度だけ構築する。
//! ソフトスイッチの遷移はO(1)で、影響するベース参照のみを更新する。

use bitflags::bitflags;
use crate::sound::SoundLog;

/// 1走査線あたりのサイクル数
pub const CYCLES_PER_LINE: u64 = 65;
/// 1フレームの走査線数
pub const LINES_PER_FRAME: u64 = 262;
/// 1フレームあたりのサイクル数（65 * 262）
pub const CYCLES_PER_FRAME: u64 = 17030;
/// 6502の実効クロック周波数 (Hz)
pub const CLK_6502: f64 = 1_020_484.45;

/// VBL開始走査線（192以降が垂直帰線期間）
const VBL_SCANLINE: u64 = 192;

/// 読み取りハンドラ
pub type ReadFn = fn(&mut Vm, u16) -> u8;
/// 書き込みハンドラ
pub type WriteFn = fn(&mut Vm, u16, u8);

bitflags! {
    /// ソフトスイッチの状態語
    ///
    /// 下位18ビットがプライマリスイッチ、SCREEN以降は
    /// プライマリから同期的に再計算される疑似スイッチ。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SoftSwitches: u32 {
        const TEXT    = 0x0000_0001;
        const MIXED   = 0x0000_0002;
        const HIRES   = 0x0000_0004;
        const PAGE2   = 0x0000_0008;
        /// ランゲージカード $D000 バンク2選択
        const BANK2   = 0x0000_0010;
        /// ランゲージカードRAM読み取り有効
        const LCRAM   = 0x0000_0020;
        /// ランゲージカード書き込み許可の1段目（2回連続アクセスで確定）
        const LCSEC   = 0x0000_0040;
        /// ランゲージカード書き込み有効
        const LCWRT   = 0x0000_0080;
        const STORE80 = 0x0000_0100;
        const COL80   = 0x0000_0200;
        const RAMRD   = 0x0000_0400;
        const RAMWRT  = 0x0000_0800;
        const ALTZP   = 0x0000_1000;
        const DHIRES  = 0x0000_2000;
        const IOUDIS  = 0x0000_4000;
        /// 内部CXROM選択（クリアでペリフェラル）
        const CXROM   = 0x0000_8000;
        /// スロット3ペリフェラルROM選択（クリアで内部80桁ファームウェア）
        const C3ROM   = 0x0001_0000;
        const ALTCHAR = 0x0002_0000;

        // ---- 疑似スイッチ（recalc_pseudoで再計算） ----
        /// 表示ページ2（PAGE2 && !STORE80）
        const SCREEN  = 0x0004_0000;
        /// テキストページ0の読み取りがAUX側
        const TEXTRD  = 0x0008_0000;
        /// テキストページ0の書き込みがAUX側
        const TEXTWRT = 0x0010_0000;
        /// HIRESページ0の読み取りがAUX側
        const HGRRD   = 0x0020_0000;
        /// HIRESページ0の書き込みがAUX側
        const HGRWRT  = 0x0040_0000;
    }
}

/// ベース参照が指す物理バンク
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    /// メイン64K（$C000以降はROMイメージが常駐）
    Main,
    /// 補助（AUX）64K
    Aux,
    /// ランゲージカード$D000領域（メイン側。bank1がオフセット0、bank2が$1000）
    LcBankMain,
    /// ランゲージカード$D000領域（AUX側）
    LcBankAux,
    /// ランゲージカード$E000-$FFFF領域（メイン側）
    LcCardMain,
    /// ランゲージカード$E000-$FFFF領域（AUX側）
    LcCardAux,
}

/// 付け替え可能なベース参照
///
/// 物理インデックス = アドレス + delta。Cのポインタ演算
/// （`language_banks - 0xD000`のような負のエイリアス）の安全な置き換え。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseRef {
    pub bank: Bank,
    pub delta: i32,
}

impl BaseRef {
    pub const fn main() -> Self {
        BaseRef { bank: Bank::Main, delta: 0 }
    }

    pub const fn aux() -> Self {
        BaseRef { bank: Bank::Aux, delta: 0 }
    }

    fn index(&self, addr: u16) -> usize {
        let idx = addr as i32 + self.delta;
        debug_assert!(idx >= 0, "base delta {:#X} underflows addr {:04X}", self.delta, addr);
        idx as usize
    }
}

/// 名前付きベース参照の束
///
/// ソフトスイッチ遷移はテーブルではなくここだけを書き換える。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bases {
    /// $0200-$BFFF読み取り（メイン/AUX）
    pub ramrd: BaseRef,
    /// $0200-$BFFF書き込み
    pub ramwrt: BaseRef,
    /// テキストページ $0400-$0BFF読み取り
    pub textrd: BaseRef,
    /// テキストページ書き込み
    pub textwrt: BaseRef,
    /// HIRESページ0 $2000-$3FFF読み取り
    pub hgrrd: BaseRef,
    /// HIRESページ0書き込み
    pub hgrwrt: BaseRef,
    /// ゼロページとスタック $0000-$01FF
    pub stackzp: BaseRef,
    /// $D000-$DFFF読み取り
    pub d000_rd: BaseRef,
    /// $D000-$DFFF書き込み（Noneで書き込み禁止）
    pub d000_wrt: Option<BaseRef>,
    /// $E000-$FFFF読み取り
    pub e000_rd: BaseRef,
    /// $E000-$FFFF書き込み
    pub e000_wrt: Option<BaseRef>,
    /// スロット3 ROM $C300-$C3FF
    pub c3rom: BaseRef,
    /// スロットROM $C100-$C7FF
    pub cxrom: BaseRef,
}

impl Default for Bases {
    fn default() -> Self {
        Bases {
            ramrd: BaseRef::main(),
            ramwrt: BaseRef::main(),
            textrd: BaseRef::main(),
            textwrt: BaseRef::main(),
            hgrrd: BaseRef::main(),
            hgrwrt: BaseRef::main(),
            stackzp: BaseRef::main(),
            d000_rd: BaseRef::main(),
            d000_wrt: Some(BaseRef { bank: Bank::LcBankMain, delta: -0xD000 }),
            e000_rd: BaseRef::main(),
            e000_wrt: Some(BaseRef { bank: Bank::LcCardMain, delta: -0xE000 }),
            c3rom: BaseRef::aux(),
            cxrom: BaseRef::main(),
        }
    }
}

/// マシン起動からの累積サイクルとフレーム内位置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleClock {
    pub total: u64,
}

impl CycleClock {
    pub fn advance(&mut self, cycles: u64) {
        self.total += cycles;
    }

    /// フレーム内の現在の走査線（0-261）
    pub fn scanline(&self) -> u64 {
        (self.total % CYCLES_PER_FRAME) / CYCLES_PER_LINE
    }

    /// 垂直帰線期間中か
    pub fn in_vbl(&self) -> bool {
        self.scanline() >= VBL_SCANLINE
    }
}

/// メモリディスパッチを含む仮想マシン状態
pub struct Vm {
    /// メイン/AUXの64Kバンク
    pub ram: [Box<[u8; 0x10000]>; 2],
    /// ランゲージカード$D000領域（メイン/AUX。bank1が先頭4K、bank2が後半4K）
    pub lc_bank: [Box<[u8; 0x2000]>; 2],
    /// ランゲージカード$E000-$FFFF領域（メイン/AUX）
    pub lc_card: [Box<[u8; 0x2000]>; 2],
    /// 32KB ROMイメージ（再シード用に保持）
    pub rom: Box<[u8; 0x8000]>,
    /// ソフトスイッチ状態
    pub switches: SoftSwitches,
    /// ベース参照
    pub bases: Bases,
    /// キーボードラッチ（bit7 = ストローブ）
    pub key_latch: u8,
    /// サイクルクロック
    pub clock: CycleClock,
    /// サウンド変化ログ
    pub sound: SoundLog,
    /// テキスト/HIRESページ0への書き込みがあったか（描画側がクリアする）
    pub video_dirty: bool,
    read_table: Vec<ReadFn>,
    write_table: Vec<WriteFn>,
}

impl Default for Vm {
    fn default() -> Self {
        Vm::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        let mut vm = Vm {
            ram: [Box::new([0; 0x10000]), Box::new([0; 0x10000])],
            lc_bank: [Box::new([0; 0x2000]), Box::new([0; 0x2000])],
            lc_card: [Box::new([0; 0x2000]), Box::new([0; 0x2000])],
            rom: Box::new([0; 0x8000]),
            switches: Self::default_switches(),
            bases: Bases::default(),
            key_latch: 0,
            clock: CycleClock::default(),
            sound: SoundLog::new(),
            video_dirty: false,
            read_table: Vec::new(),
            write_table: Vec::new(),
        };
        vm.build_tables();
        vm.rebase_all();
        vm
    }

    /// 電源投入時のスイッチ状態
    ///
    /// ランゲージカードはROM読み取り・bank2・書き込み有効で起動する
    fn default_switches() -> SoftSwitches {
        SoftSwitches::TEXT | SoftSwitches::BANK2 | SoftSwitches::LCWRT
    }

    /// 32KB ROMイメージを取り込み、メモリをコールドブート状態にする
    pub fn load_rom(&mut self, image: &[u8]) -> Result<(), String> {
        if image.len() != 0x8000 {
            return Err(format!(
                "ROM image must be 32768 bytes, got {}",
                image.len()
            ));
        }
        self.rom.copy_from_slice(image);
        self.reset_memory();
        Ok(())
    }

    /// メモリをリセットしてROMを再シードする
    ///
    /// メイン64Kの$C000未満には0xFF,0xFF,0x00,0x00のストライプを敷く
    /// （これに依存して起動するソフトが実在する）
    pub fn reset_memory(&mut self) {
        self.ram[0].fill(0);
        self.ram[1].fill(0);
        let mut i = 0;
        while i < 0xC000 {
            self.ram[0][i] = 0xFF;
            self.ram[0][i + 1] = 0xFF;
            i += 4;
        }

        // ROM常駐: メインに前半16K、AUXに後半16K
        self.ram[0][0xC000..].copy_from_slice(&self.rom[..0x4000]);
        self.ram[1][0xC000..].copy_from_slice(&self.rom[0x4000..]);

        // ランゲージカード領域もROMからシードする
        self.lc_bank[0][..0x1000].copy_from_slice(&self.rom[0x1000..0x2000]);
        self.lc_bank[1][..0x1000].copy_from_slice(&self.rom[0x5000..0x6000]);
        self.lc_bank[0][0x1000..].fill(0);
        self.lc_bank[1][0x1000..].fill(0);
        self.lc_card[0].copy_from_slice(&self.rom[0x2000..0x4000]);
        self.lc_card[1].copy_from_slice(&self.rom[0x6000..0x8000]);

        // $C000はキーボードラッチなのでROMの値を残さない
        self.ram[0][0xC000] = 0x00;
        self.ram[1][0xC000] = 0x00;
    }

    /// スイッチ語を差し替えてベース参照を再構築する（セーブステート復元用）
    pub fn restore_switches(&mut self, bits: u32) {
        self.switches = SoftSwitches::from_bits_truncate(bits);
        self.rebase_all();
    }

    /// ソフトスイッチとベース参照をリセット状態に戻す
    pub fn reset(&mut self) {
        self.switches = Self::default_switches();
        self.key_latch = 0;
        self.rebase_all();
    }

    /// キー押下。スキャンコードをラッチしストローブを立てる
    pub fn key_down(&mut self, code: u8) {
        self.key_latch = code | 0x80;
    }

    //--------------------------------------------------
    // ディスパッチ入口
    //--------------------------------------------------

    pub fn read(&mut self, addr: u16) -> u8 {
        let handler = self.read_table[addr as usize];
        handler(self, addr)
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        let handler = self.write_table[addr as usize];
        handler(self, addr, value);
    }

    fn base_read(&self, base: BaseRef, addr: u16) -> u8 {
        let idx = base.index(addr);
        match base.bank {
            Bank::Main => self.ram[0][idx],
            Bank::Aux => self.ram[1][idx],
            Bank::LcBankMain => self.lc_bank[0][idx],
            Bank::LcBankAux => self.lc_bank[1][idx],
            Bank::LcCardMain => self.lc_card[0][idx],
            Bank::LcCardAux => self.lc_card[1][idx],
        }
    }

    fn base_write(&mut self, base: BaseRef, addr: u16, value: u8) {
        let idx = base.index(addr);
        match base.bank {
            Bank::Main => self.ram[0][idx] = value,
            Bank::Aux => self.ram[1][idx] = value,
            Bank::LcBankMain => self.lc_bank[0][idx] = value,
            Bank::LcBankAux => self.lc_bank[1][idx] = value,
            Bank::LcCardMain => self.lc_card[0][idx] = value,
            Bank::LcCardAux => self.lc_card[1][idx] = value,
        }
    }

    //--------------------------------------------------
    // ベース参照の付け替え
    //--------------------------------------------------

    /// 疑似スイッチを再計算し、依存するベース参照を付け替える
    ///
    /// {STORE80, PAGE2}は$0400-$07FF/$2000-$3FFFについて
    /// {RAMRD, RAMWRT}より優先される。
    fn recalc_pseudo(&mut self) {
        let sw = self.switches;
        let store80 = sw.contains(SoftSwitches::STORE80);
        let page2 = sw.contains(SoftSwitches::PAGE2);
        let hires = sw.contains(SoftSwitches::HIRES);
        let ramrd = sw.contains(SoftSwitches::RAMRD);
        let ramwrt = sw.contains(SoftSwitches::RAMWRT);

        let screen = page2 && !store80;
        let textrd = (page2 && store80) || (ramrd && !store80);
        let textwrt = (page2 && store80) || (ramwrt && !store80);
        let hgrrd = (page2 && store80 && hires) || (ramrd && !(store80 && hires));
        let hgrwrt = (page2 && store80 && hires) || (ramwrt && !(store80 && hires));

        self.switches.set(SoftSwitches::SCREEN, screen);
        self.switches.set(SoftSwitches::TEXTRD, textrd);
        self.switches.set(SoftSwitches::TEXTWRT, textwrt);
        self.switches.set(SoftSwitches::HGRRD, hgrrd);
        self.switches.set(SoftSwitches::HGRWRT, hgrwrt);

        let side = |aux: bool| if aux { BaseRef::aux() } else { BaseRef::main() };
        self.bases.ramrd = side(ramrd);
        self.bases.ramwrt = side(ramwrt);
        self.bases.textrd = side(textrd);
        self.bases.textwrt = side(textwrt);
        self.bases.hgrrd = side(hgrrd);
        self.bases.hgrwrt = side(hgrwrt);
    }

    /// ランゲージカード関連のベース参照を付け替える
    fn rebase_language_card(&mut self) {
        let altzp = self.switches.contains(SoftSwitches::ALTZP);
        let bank = if altzp { Bank::LcBankAux } else { Bank::LcBankMain };
        let card = if altzp { Bank::LcCardAux } else { Bank::LcCardMain };
        // bank2は$D000領域の後半4Kにマップされる
        let d000_delta = if self.switches.contains(SoftSwitches::BANK2) {
            -0xC000
        } else {
            -0xD000
        };

        self.bases.stackzp = if altzp { BaseRef::aux() } else { BaseRef::main() };

        if self.switches.contains(SoftSwitches::LCRAM) {
            self.bases.d000_rd = BaseRef { bank, delta: d000_delta };
            self.bases.e000_rd = BaseRef { bank: card, delta: -0xE000 };
        } else {
            // ROM読み取り（メイン64KにROMが常駐している）
            self.bases.d000_rd = BaseRef::main();
            self.bases.e000_rd = BaseRef::main();
        }

        if self.switches.contains(SoftSwitches::LCWRT) {
            self.bases.d000_wrt = Some(BaseRef { bank, delta: d000_delta });
            self.bases.e000_wrt = Some(BaseRef { bank: card, delta: -0xE000 });
        } else {
            self.bases.d000_wrt = None;
            self.bases.e000_wrt = None;
        }
    }

    fn rebase_slot_rom(&mut self) {
        // CXROM: 内部ROMはAUXイメージに、ペリフェラルROMはメインに常駐
        self.bases.cxrom = if self.switches.contains(SoftSwitches::CXROM) {
            BaseRef::aux()
        } else {
            BaseRef::main()
        };
        self.bases.c3rom = if self.switches.contains(SoftSwitches::C3ROM) {
            BaseRef::main()
        } else {
            BaseRef::aux()
        };
    }

    fn rebase_all(&mut self) {
        self.recalc_pseudo();
        self.rebase_language_card();
        self.rebase_slot_rom();
    }

    //--------------------------------------------------
    // 読み書きハンドラ
    //--------------------------------------------------

    fn read_ram_default(&mut self, addr: u16) -> u8 {
        if addr < 0xC000 {
            self.base_read(self.bases.ramrd, addr)
        } else {
            self.ram[0][addr as usize]
        }
    }

    fn write_ram_default(&mut self, addr: u16, value: u8) {
        if addr < 0xC000 {
            self.base_write(self.bases.ramwrt, addr, value);
        }
        // $C000以降への既定書き込みはROMなので無視
    }

    fn read_ram_zpage_and_stack(&mut self, addr: u16) -> u8 {
        self.base_read(self.bases.stackzp, addr)
    }

    fn write_ram_zpage_and_stack(&mut self, addr: u16, value: u8) {
        self.base_write(self.bases.stackzp, addr, value);
    }

    fn read_ram_text_page0(&mut self, addr: u16) -> u8 {
        self.base_read(self.bases.textrd, addr)
    }

    fn write_ram_text_page0(&mut self, addr: u16, value: u8) {
        self.base_write(self.bases.textwrt, addr, value);
        self.video_dirty = true;
    }

    fn read_ram_hires_page0(&mut self, addr: u16) -> u8 {
        self.base_read(self.bases.hgrrd, addr)
    }

    fn write_ram_hires_page0(&mut self, addr: u16, value: u8) {
        self.base_write(self.bases.hgrwrt, addr, value);
        self.video_dirty = true;
    }

    fn read_ram_bank(&mut self, addr: u16) -> u8 {
        self.base_read(self.bases.d000_rd, addr)
    }

    fn write_ram_bank(&mut self, addr: u16, value: u8) {
        if let Some(base) = self.bases.d000_wrt {
            self.base_write(base, addr, value);
        }
    }

    fn read_ram_lc(&mut self, addr: u16) -> u8 {
        self.base_read(self.bases.e000_rd, addr)
    }

    fn write_ram_lc(&mut self, addr: u16, value: u8) {
        if let Some(base) = self.bases.e000_wrt {
            self.base_write(base, addr, value);
        }
    }

    /// 未マップのソフトスイッチ読み取りはフローティングバス
    fn read_floating_bus(&mut self, _addr: u16) -> u8 {
        rand::random::<u8>()
    }

    fn write_nop(&mut self, _addr: u16, _value: u8) {}

    //---- キーボード ----

    fn read_keyboard(&mut self, _addr: u16) -> u8 {
        self.key_latch
    }

    /// $C010: 読み取り自体が副作用を持つ（ストローブクリア）
    fn read_keyboard_strobe(&mut self, _addr: u16) -> u8 {
        let value = self.key_latch;
        self.key_latch &= 0x7F;
        value
    }

    fn write_keyboard_strobe(&mut self, _addr: u16, _value: u8) {
        self.key_latch &= 0x7F;
    }

    //---- IIeステータス読み取り $C011-$C01F ----

    fn read_iie_status(&mut self, addr: u16) -> u8 {
        let on = 0x80u8;
        let check = |cond: bool| if cond { on } else { 0x00 };
        match addr & 0xFF {
            0x11 => check(self.switches.contains(SoftSwitches::BANK2)),
            0x12 => check(self.switches.contains(SoftSwitches::LCRAM)),
            0x13 => check(self.switches.contains(SoftSwitches::RAMRD)),
            0x14 => check(self.switches.contains(SoftSwitches::RAMWRT)),
            0x15 => check(self.switches.contains(SoftSwitches::CXROM)),
            0x16 => check(self.switches.contains(SoftSwitches::ALTZP)),
            0x17 => check(self.switches.contains(SoftSwitches::C3ROM)),
            0x18 => check(self.switches.contains(SoftSwitches::STORE80)),
            // RDVBLBAR: 表示期間中にbit7が立つ
            0x19 => check(!self.clock.in_vbl()),
            0x1A => check(self.switches.contains(SoftSwitches::TEXT)),
            0x1B => check(self.switches.contains(SoftSwitches::MIXED)),
            0x1C => check(self.switches.contains(SoftSwitches::PAGE2)),
            0x1D => check(self.switches.contains(SoftSwitches::HIRES)),
            0x1E => check(self.switches.contains(SoftSwitches::ALTCHAR)),
            0x1F => check(self.switches.contains(SoftSwitches::COL80)),
            _ => 0x00,
        }
    }

    //---- IIeバンクスイッチ書き込み $C000-$C00F ----

    fn write_iie_switch(&mut self, addr: u16, _value: u8) {
        match addr & 0xFF {
            0x00 => self.switches.remove(SoftSwitches::STORE80),
            0x01 => self.switches.insert(SoftSwitches::STORE80),
            0x02 => self.switches.remove(SoftSwitches::RAMRD),
            0x03 => self.switches.insert(SoftSwitches::RAMRD),
            0x04 => self.switches.remove(SoftSwitches::RAMWRT),
            0x05 => self.switches.insert(SoftSwitches::RAMWRT),
            0x06 => self.switches.remove(SoftSwitches::CXROM),
            0x07 => self.switches.insert(SoftSwitches::CXROM),
            0x08 => self.switches.remove(SoftSwitches::ALTZP),
            0x09 => self.switches.insert(SoftSwitches::ALTZP),
            // $C00A/$C00Bは他と極性が逆（内部選択が先）
            0x0A => self.switches.remove(SoftSwitches::C3ROM),
            0x0B => self.switches.insert(SoftSwitches::C3ROM),
            0x0C => self.switches.remove(SoftSwitches::COL80),
            0x0D => self.switches.insert(SoftSwitches::COL80),
            0x0E => self.switches.remove(SoftSwitches::ALTCHAR),
            0x0F => self.switches.insert(SoftSwitches::ALTCHAR),
            _ => {}
        }
        self.recalc_pseudo();
        self.rebase_language_card();
        self.rebase_slot_rom();
    }

    //---- 表示スイッチ $C050-$C05F（読み書き両対応） ----

    fn display_switch(&mut self, addr: u16) {
        match addr & 0xFF {
            0x50 => self.switches.remove(SoftSwitches::TEXT),
            0x51 => self.switches.insert(SoftSwitches::TEXT),
            0x52 => self.switches.remove(SoftSwitches::MIXED),
            0x53 => self.switches.insert(SoftSwitches::MIXED),
            0x54 => self.switches.remove(SoftSwitches::PAGE2),
            0x55 => self.switches.insert(SoftSwitches::PAGE2),
            0x56 => self.switches.remove(SoftSwitches::HIRES),
            0x57 => self.switches.insert(SoftSwitches::HIRES),
            0x5E => self.switches.insert(SoftSwitches::DHIRES),
            0x5F => self.switches.remove(SoftSwitches::DHIRES),
            _ => {} // $C058-$C05D アナンシエータは状態を持たない
        }
        self.recalc_pseudo();
        self.video_dirty = true;
    }

    fn read_display_switch(&mut self, addr: u16) -> u8 {
        self.display_switch(addr);
        self.read_floating_bus(addr)
    }

    fn write_display_switch(&mut self, addr: u16, _value: u8) {
        self.display_switch(addr);
    }

    //---- ゲームI/O $C061-$C067 ----

    /// ボタンとパドルは未接続（タイマは常にタイムアウト済み）
    fn read_game_io(&mut self, _addr: u16) -> u8 {
        0x00
    }

    /// $C070-$C07D: パドルタイマのストローブ
    fn read_gc_strobe(&mut self, _addr: u16) -> u8 {
        0x00
    }

    fn write_gc_strobe(&mut self, _addr: u16, _value: u8) {}

    fn read_ioudis(&mut self, _addr: u16) -> u8 {
        if self.switches.contains(SoftSwitches::IOUDIS) { 0x80 } else { 0x00 }
    }

    fn read_dhires(&mut self, _addr: u16) -> u8 {
        if self.switches.contains(SoftSwitches::DHIRES) { 0x80 } else { 0x00 }
    }

    fn write_ioudis_on(&mut self, _addr: u16, _value: u8) {
        self.switches.insert(SoftSwitches::IOUDIS);
    }

    fn write_ioudis_off(&mut self, _addr: u16, _value: u8) {
        self.switches.remove(SoftSwitches::IOUDIS);
    }

    //---- スピーカー $C030-$C03F ----

    fn speaker_toggle(&mut self, addr: u16) {
        let cycle = self.clock.total;
        self.sound.push(cycle, addr, 0);
    }

    fn read_speaker(&mut self, addr: u16) -> u8 {
        self.speaker_toggle(addr);
        self.read_floating_bus(addr)
    }

    fn write_speaker(&mut self, addr: u16, _value: u8) {
        self.speaker_toggle(addr);
    }

    //---- ランゲージカード $C080-$C08F（読み書き両対応） ----

    /// ランゲージカードのバンク選択
    ///
    /// アドレス下位2ビットでREAD/WRITE許可、ビット3でbank1/bank2を選ぶ。
    /// 書き込み有効化は奇数アドレスへの2回連続アクセスが必要（LCSEC）。
    fn lc_switch(&mut self, addr: u16, is_write: bool) {
        self.switches.set(SoftSwitches::BANK2, addr & 0x08 == 0);
        match addr & 0x03 {
            0x00 => {
                // RAM読み取り・書き込み禁止
                self.switches.insert(SoftSwitches::LCRAM);
                self.switches.remove(SoftSwitches::LCWRT | SoftSwitches::LCSEC);
            }
            0x01 => {
                // ROM読み取り・2回目のアクセスで書き込み有効
                self.switches.remove(SoftSwitches::LCRAM);
                self.lc_second_access(is_write);
            }
            0x02 => {
                // ROM読み取り・書き込み禁止
                self.switches.remove(
                    SoftSwitches::LCRAM | SoftSwitches::LCWRT | SoftSwitches::LCSEC,
                );
            }
            _ => {
                // RAM読み取り・2回目のアクセスで書き込み有効
                self.switches.insert(SoftSwitches::LCRAM);
                self.lc_second_access(is_write);
            }
        }
        self.rebase_language_card();
    }

    fn lc_second_access(&mut self, is_write: bool) {
        if is_write {
            // 書き込みアクセスは連続カウントをリセットする
            self.switches.remove(SoftSwitches::LCSEC);
            return;
        }
        if self.switches.contains(SoftSwitches::LCSEC) {
            self.switches.insert(SoftSwitches::LCWRT);
        }
        self.switches.toggle(SoftSwitches::LCSEC);
    }

    fn read_lc_switch(&mut self, addr: u16) -> u8 {
        self.lc_switch(addr, false);
        self.read_floating_bus(addr)
    }

    fn write_lc_switch(&mut self, addr: u16, _value: u8) {
        self.lc_switch(addr, true);
    }

    //---- スロットROM ----

    fn read_slot_x(&mut self, addr: u16) -> u8 {
        self.base_read(self.bases.cxrom, addr)
    }

    /// スロット3はCXROM内部選択が優先され、それ以外はC3ROMで選ぶ
    fn read_slot_3(&mut self, addr: u16) -> u8 {
        if self.switches.contains(SoftSwitches::CXROM) {
            self.base_read(self.bases.cxrom, addr)
        } else {
            self.base_read(self.bases.c3rom, addr)
        }
    }

    /// スロット4/5のI/O窓への書き込みはサウンドカードレジスタとして記録
    fn write_sound_slot(&mut self, addr: u16, value: u8) {
        let cycle = self.clock.total;
        self.sound.push(cycle, addr, value);
    }

    fn read_slot_expansion(&mut self, addr: u16) -> u8 {
        self.base_read(self.bases.cxrom, addr)
    }

    /// $CFFF書き込み: 拡張ROMの解放（状態は持たない）
    fn write_slot_expansion(&mut self, _addr: u16, _value: u8) {}

    //--------------------------------------------------
    // テーブル構築
    //--------------------------------------------------

    /// 64Kエントリのディスパッチテーブルを広い領域から狭い領域の順に重ねる
    fn build_tables(&mut self) {
        let mut r: Vec<ReadFn> = vec![Vm::read_ram_default; 0x10000];
        let mut w: Vec<WriteFn> = vec![Vm::write_ram_default; 0x10000];

        // ランゲージカード領域
        for i in 0xD000..0xE000 {
            r[i] = Vm::read_ram_bank;
            w[i] = Vm::write_ram_bank;
        }
        for i in 0xE000..0x10000 {
            r[i] = Vm::read_ram_lc;
            w[i] = Vm::write_ram_lc;
        }

        // ゼロページとスタック（ALTZPで切り替わる）
        for i in 0x0000..0x0200 {
            r[i] = Vm::read_ram_zpage_and_stack;
            w[i] = Vm::write_ram_zpage_and_stack;
        }

        // テキスト・HIRESページ（80STORE/PAGE2で切り替わる）
        for i in 0x0400..0x0C00 {
            r[i] = Vm::read_ram_text_page0;
            w[i] = Vm::write_ram_text_page0;
        }
        for i in 0x2000..0x4000 {
            r[i] = Vm::read_ram_hires_page0;
            w[i] = Vm::write_ram_hires_page0;
        }

        // ソフトスイッチページの既定値
        for i in 0xC000..0xC100 {
            r[i] = Vm::read_floating_bus;
            w[i] = Vm::write_nop;
        }

        // スロットROMの既定値
        for i in 0xC100..0xD000 {
            r[i] = Vm::read_ram_default;
            w[i] = Vm::write_nop;
        }

        // キーボードとストローブ
        for i in 0xC000..0xC010 {
            r[i] = Vm::read_keyboard;
            w[i] = Vm::write_iie_switch;
        }
        for i in 0xC010..0xC020 {
            r[i] = Vm::read_keyboard_strobe;
            w[i] = Vm::write_keyboard_strobe;
        }

        // IIeステータス読み取りがストローブ読み取りを上書きする
        for i in 0xC011..0xC020 {
            r[i] = Vm::read_iie_status;
        }

        // スピーカー
        for i in 0xC030..0xC040 {
            r[i] = Vm::read_speaker;
            w[i] = Vm::write_speaker;
        }

        // 表示スイッチとアナンシエータ
        for i in 0xC050..0xC060 {
            r[i] = Vm::read_display_switch;
            w[i] = Vm::write_display_switch;
        }

        // ゲームI/O
        for i in 0xC061..0xC068 {
            r[i] = Vm::read_game_io;
        }
        for i in 0xC069..0xC070 {
            r[i] = Vm::read_game_io;
        }
        for i in 0xC070..0xC080 {
            r[i] = Vm::read_gc_strobe;
            w[i] = Vm::write_gc_strobe;
        }
        // IOUDIS/DHIRESのステータスはストローブ読み取りを上書きする
        w[0xC07E] = Vm::write_ioudis_on;
        w[0xC07F] = Vm::write_ioudis_off;
        r[0xC07E] = Vm::read_ioudis;
        r[0xC07F] = Vm::read_dhires;

        // ランゲージカードスイッチ
        for i in 0xC080..0xC090 {
            r[i] = Vm::read_lc_switch;
            w[i] = Vm::write_lc_switch;
        }

        // スロットROM: 1-2と6-7は汎用、3は80桁ファームウェア、4/5はサウンドカード
        for i in 0xC100..0xC300 {
            r[i] = Vm::read_slot_x;
        }
        for i in 0xC300..0xC400 {
            r[i] = Vm::read_slot_3;
        }
        for i in 0xC400..0xC600 {
            r[i] = Vm::read_slot_x;
            w[i] = Vm::write_sound_slot;
        }
        for i in 0xC600..0xC800 {
            r[i] = Vm::read_slot_x;
        }

        // 拡張ROM
        for i in 0xC800..0xD000 {
            r[i] = Vm::read_slot_expansion;
        }
        w[0xCFFF] = Vm::write_slot_expansion;

        self.read_table = r;
        self.write_table = w;
    }
}
