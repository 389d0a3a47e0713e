// screen_buffer.rs - VTE based screen buffer for accurate state detection

use ccstate_shared::log_render;
use unicode_width::UnicodeWidthChar;
use vte::{Params, Parser, Perform};

use crate::screen_text::ScreenText;

/// タブストップの間隔
const TAB_WIDTH: usize = 8;

/// 端末の一文字を表す構造体
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub char: char,
    /// 全角文字の右半分（描画時は読み飛ばす）
    pub wide_spacer: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            char: ' ',
            wide_spacer: false,
        }
    }
}

/// スクリーンバッファ - 実際の端末画面を表現
pub struct ScreenBuffer {
    /// グリッド（行×列）
    grid: Vec<Vec<Cell>>,
    /// 現在のカーソル位置
    cursor_row: usize,
    cursor_col: usize,
    /// 右端に書いた直後で、次の文字で折り返す
    pending_wrap: bool,
    /// 画面サイズ
    rows: usize,
    cols: usize,
    /// スクロール領域（両端含む）
    scroll_top: usize,
    scroll_bottom: usize,
    /// ESC 7 / CSI s で保存したカーソル
    saved_cursor: Option<(usize, usize)>,
    /// VTE Parser
    parser: Parser,
}

impl ScreenBuffer {
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);

        Self {
            grid: vec![vec![Cell::default(); cols]; rows],
            cursor_row: 0,
            cursor_col: 0,
            pending_wrap: false,
            rows,
            cols,
            scroll_top: 0,
            scroll_bottom: rows - 1,
            saved_cursor: None,
            parser: Parser::new(),
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// (row, col)
    pub fn cursor_position(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    /// 画面・カーソル・パーサ状態を初期化
    pub fn reset(&mut self) {
        *self = Self::new(self.rows, self.cols);
    }

    /// PTY出力を処理してスクリーンバッファを更新
    pub fn process_data(&mut self, data: &[u8]) {
        // VTE advanceを呼ぶためにScreenBufferを一時的に借用できるよう分離
        let mut parser = std::mem::replace(&mut self.parser, Parser::new());
        for &byte in data {
            parser.advance(self, byte);
        }
        self.parser = parser;
    }

    /// 生の出力全体を新しい画面に描画してテキスト化する
    pub fn render(&mut self, raw_output: &str) -> ScreenText {
        self.reset();
        self.process_data(raw_output.as_bytes());
        self.screen_text()
    }

    /// 現在の画面内容を文字列の配列として取得
    pub fn get_screen_lines(&self) -> Vec<String> {
        self.grid
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|cell| !cell.wide_spacer)
                    .map(|cell| cell.char)
                    .collect()
            })
            .collect()
    }

    /// 分類器に渡すクリーニング済みテキスト
    pub fn screen_text(&self) -> ScreenText {
        ScreenText::from_lines(self.get_screen_lines())
    }

    /// カーソル位置を安全に設定
    fn set_cursor(&mut self, row: usize, col: usize) {
        self.cursor_row = row.min(self.rows - 1);
        self.cursor_col = col.min(self.cols - 1);
        self.pending_wrap = false;
    }

    /// 文字を現在のカーソル位置に書き込む
    fn insert_char(&mut self, ch: char) {
        let width = match ch.width() {
            Some(w) if w > 0 => w,
            // 制御文字・ゼロ幅文字はセルを占有しない
            _ => return,
        };

        if self.pending_wrap {
            self.carriage_return();
            self.linefeed();
        }

        // 全角文字が右端に収まらない場合は先に折り返す
        if width == 2 && self.cursor_col + 1 >= self.cols {
            if self.cols < 2 {
                return;
            }
            self.grid[self.cursor_row][self.cursor_col] = Cell::default();
            self.carriage_return();
            self.linefeed();
        }

        self.clear_wide_pair(self.cursor_row, self.cursor_col);
        self.grid[self.cursor_row][self.cursor_col] = Cell {
            char: ch,
            wide_spacer: false,
        };
        if width == 2 {
            self.clear_wide_pair(self.cursor_row, self.cursor_col + 1);
            self.grid[self.cursor_row][self.cursor_col + 1] = Cell {
                char: ' ',
                wide_spacer: true,
            };
        }

        // カーソルを右に移動
        let next_col = self.cursor_col + width;
        if next_col >= self.cols {
            self.cursor_col = self.cols - 1;
            self.pending_wrap = true;
        } else {
            self.cursor_col = next_col;
        }
    }

    /// 全角文字の片割れを上書きする場合、もう片方を空白に戻す
    fn clear_wide_pair(&mut self, row: usize, col: usize) {
        let cell = self.grid[row][col];
        if cell.wide_spacer && col > 0 {
            self.grid[row][col - 1] = Cell::default();
        } else if col + 1 < self.cols && self.grid[row][col + 1].wide_spacer {
            self.grid[row][col + 1] = Cell::default();
        }
    }

    fn carriage_return(&mut self) {
        self.cursor_col = 0;
        self.pending_wrap = false;
    }

    /// 改行：スクロール領域の下端ではスクロール
    fn linefeed(&mut self) {
        self.pending_wrap = false;
        if self.cursor_row == self.scroll_bottom {
            self.scroll_up(1);
        } else if self.cursor_row + 1 < self.rows {
            self.cursor_row += 1;
        }
    }

    /// 逆改行：スクロール領域の上端では逆スクロール
    fn reverse_index(&mut self) {
        self.pending_wrap = false;
        if self.cursor_row == self.scroll_top {
            self.scroll_down(1);
        } else {
            self.cursor_row = self.cursor_row.saturating_sub(1);
        }
    }

    fn blank_row(&self) -> Vec<Cell> {
        vec![Cell::default(); self.cols]
    }

    /// スクロール領域を上へ n 行
    fn scroll_up(&mut self, n: usize) {
        let height = self.scroll_bottom - self.scroll_top + 1;
        for _ in 0..n.min(height) {
            self.grid.remove(self.scroll_top);
            let blank = self.blank_row();
            self.grid.insert(self.scroll_bottom, blank);
        }
    }

    /// スクロール領域を下へ n 行
    fn scroll_down(&mut self, n: usize) {
        let height = self.scroll_bottom - self.scroll_top + 1;
        for _ in 0..n.min(height) {
            self.grid.remove(self.scroll_bottom);
            let blank = self.blank_row();
            self.grid.insert(self.scroll_top, blank);
        }
    }

    /// カーソル行に n 行挿入（領域内のみ）
    fn insert_lines(&mut self, n: usize) {
        if self.cursor_row < self.scroll_top || self.cursor_row > self.scroll_bottom {
            return;
        }
        for _ in 0..n.min(self.scroll_bottom - self.cursor_row + 1) {
            self.grid.remove(self.scroll_bottom);
            let blank = self.blank_row();
            self.grid.insert(self.cursor_row, blank);
        }
        self.cursor_col = 0;
    }

    /// カーソル行から n 行削除（領域内のみ）
    fn delete_lines(&mut self, n: usize) {
        if self.cursor_row < self.scroll_top || self.cursor_row > self.scroll_bottom {
            return;
        }
        for _ in 0..n.min(self.scroll_bottom - self.cursor_row + 1) {
            self.grid.remove(self.cursor_row);
            let blank = self.blank_row();
            self.grid.insert(self.scroll_bottom, blank);
        }
        self.cursor_col = 0;
    }

    fn erase_cells(&mut self, row: usize, cols: std::ops::Range<usize>) {
        let end = cols.end.min(self.cols);
        for col in cols.start.min(end)..end {
            self.grid[row][col] = Cell::default();
        }
    }

    /// ED: 0=カーソル以降, 1=カーソルまで, 2/3=全体
    fn erase_in_display(&mut self, mode: u16) {
        match mode {
            0 => {
                self.erase_cells(self.cursor_row, self.cursor_col..self.cols);
                for row in self.cursor_row + 1..self.rows {
                    self.erase_cells(row, 0..self.cols);
                }
            }
            1 => {
                for row in 0..self.cursor_row {
                    self.erase_cells(row, 0..self.cols);
                }
                self.erase_cells(self.cursor_row, 0..self.cursor_col + 1);
            }
            _ => self.clear_screen(),
        }
    }

    /// EL: 0=カーソル以降, 1=カーソルまで, 2=行全体
    fn erase_in_line(&mut self, mode: u16) {
        match mode {
            0 => self.erase_cells(self.cursor_row, self.cursor_col..self.cols),
            1 => self.erase_cells(self.cursor_row, 0..self.cursor_col + 1),
            _ => self.erase_cells(self.cursor_row, 0..self.cols),
        }
    }

    /// DCH: カーソル位置から n 文字削除して左詰め
    fn delete_chars(&mut self, n: usize) {
        let row = &mut self.grid[self.cursor_row];
        let n = n.min(self.cols - self.cursor_col);
        row.drain(self.cursor_col..self.cursor_col + n);
        row.resize(self.cols, Cell::default());
    }

    /// ICH: カーソル位置に n 個の空白を挿入して右へずらす
    fn insert_blanks(&mut self, n: usize) {
        let row = &mut self.grid[self.cursor_row];
        let n = n.min(self.cols - self.cursor_col);
        for _ in 0..n {
            row.insert(self.cursor_col, Cell::default());
        }
        row.truncate(self.cols);
    }

    /// 画面をクリア（カーソルは動かさない）
    fn clear_screen(&mut self) {
        for row in &mut self.grid {
            for cell in row {
                *cell = Cell::default();
            }
        }
    }

    fn save_cursor(&mut self) {
        self.saved_cursor = Some((self.cursor_row, self.cursor_col));
    }

    fn restore_cursor(&mut self) {
        if let Some((row, col)) = self.saved_cursor {
            self.set_cursor(row, col);
        }
    }

    /// DECSTBM: スクロール領域を設定してカーソルを原点へ
    fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        let bottom = bottom.min(self.rows - 1);
        if top < bottom {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        } else {
            self.scroll_top = 0;
            self.scroll_bottom = self.rows - 1;
        }
        self.set_cursor(0, 0);
    }
}

/// 数値パラメータ（0 と省略は既定値）
fn param(params: &Params, index: usize, default: u16) -> usize {
    params
        .iter()
        .nth(index)
        .and_then(|p| p.first().copied())
        .filter(|&v| v != 0)
        .unwrap_or(default) as usize
}

/// モードパラメータ（0 が意味を持つ）
fn mode_param(params: &Params) -> u16 {
    params
        .iter()
        .next()
        .and_then(|p| p.first().copied())
        .unwrap_or(0)
}

/// VTE Performトレイトの実装
impl Perform for ScreenBuffer {
    /// 通常の文字の印刷
    fn print(&mut self, c: char) {
        self.insert_char(c);
    }

    /// 実行文字（制御文字）の処理
    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' | 0x0b | 0x0c => {
                // 改行：次の行の先頭へ（LFだけの出力でも行頭に戻す）
                self.linefeed();
                self.carriage_return();
            }
            b'\r' => self.carriage_return(),
            b'\t' => {
                let next = (self.cursor_col / TAB_WIDTH + 1) * TAB_WIDTH;
                self.cursor_col = next.min(self.cols - 1);
                self.pending_wrap = false;
            }
            0x08 => {
                // バックスペース
                self.cursor_col = self.cursor_col.saturating_sub(1);
                self.pending_wrap = false;
            }
            0x07 => {}
            _ => {
                log_render!(trace, "Unhandled execute: 0x{byte:02x}");
            }
        }
    }

    /// DCS は使用しない
    fn hook(&mut self, _params: &Params, _intermediates: &[u8], _ignore: bool, _c: char) {}

    fn put(&mut self, _byte: u8) {}

    fn unhook(&mut self) {}

    /// OSC（ウィンドウタイトル等）は画面テキストに影響しない
    fn osc_dispatch(&mut self, _params: &[&[u8]], _bell_terminated: bool) {}

    /// CSI（Control Sequence Introducer）ディスパッチ
    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], _ignore: bool, c: char) {
        let private = intermediates.first() == Some(&b'?');

        match c {
            'H' | 'f' => {
                // カーソル位置設定
                let row = param(params, 0, 1);
                let col = param(params, 1, 1);
                self.set_cursor(row - 1, col - 1);
            }
            'A' => {
                let count = param(params, 0, 1);
                self.set_cursor(self.cursor_row.saturating_sub(count), self.cursor_col);
            }
            'B' | 'e' => {
                let count = param(params, 0, 1);
                self.set_cursor(self.cursor_row + count, self.cursor_col);
            }
            'C' | 'a' => {
                let count = param(params, 0, 1);
                self.set_cursor(self.cursor_row, self.cursor_col + count);
            }
            'D' => {
                let count = param(params, 0, 1);
                self.set_cursor(self.cursor_row, self.cursor_col.saturating_sub(count));
            }
            'E' => {
                let count = param(params, 0, 1);
                self.set_cursor(self.cursor_row + count, 0);
            }
            'F' => {
                let count = param(params, 0, 1);
                self.set_cursor(self.cursor_row.saturating_sub(count), 0);
            }
            'G' | '`' => {
                let col = param(params, 0, 1);
                self.set_cursor(self.cursor_row, col - 1);
            }
            'd' => {
                let row = param(params, 0, 1);
                self.set_cursor(row - 1, self.cursor_col);
            }
            'J' => self.erase_in_display(mode_param(params)),
            'K' => self.erase_in_line(mode_param(params)),
            'X' => {
                let count = param(params, 0, 1);
                self.erase_cells(self.cursor_row, self.cursor_col..self.cursor_col + count);
            }
            'P' => self.delete_chars(param(params, 0, 1)),
            '@' => self.insert_blanks(param(params, 0, 1)),
            'L' => self.insert_lines(param(params, 0, 1)),
            'M' => self.delete_lines(param(params, 0, 1)),
            'S' => self.scroll_up(param(params, 0, 1)),
            'T' => self.scroll_down(param(params, 0, 1)),
            'r' if !private => {
                let top = param(params, 0, 1);
                let bottom = param(params, 1, self.rows as u16);
                self.set_scroll_region(top - 1, bottom - 1);
            }
            's' if !private => self.save_cursor(),
            'u' if !private => self.restore_cursor(),
            'h' | 'l' if private => {
                // 代替スクリーンの切替は画面クリアとして扱う
                for p in params.iter() {
                    match p.first().copied() {
                        Some(1049) => {
                            if c == 'h' {
                                self.save_cursor();
                                self.clear_screen();
                            } else {
                                self.clear_screen();
                                self.restore_cursor();
                            }
                        }
                        Some(47) | Some(1047) => self.clear_screen(),
                        _ => {}
                    }
                }
            }
            'm' | 'h' | 'l' => {
                // 文字属性・端末モードは画面テキストに影響しない
            }
            _ => {
                log_render!(trace, "Unhandled CSI: {c} {intermediates:?}");
            }
        }
    }

    /// ESCシーケンスディスパッチ
    fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
        if !intermediates.is_empty() {
            // 文字集合の指定など
            return;
        }
        match byte {
            b'7' => self.save_cursor(),
            b'8' => self.restore_cursor(),
            b'D' => self.linefeed(),
            b'E' => {
                self.linefeed();
                self.carriage_return();
            }
            b'M' => self.reverse_index(),
            b'c' => self.reset(),
            _ => {
                log_render!(trace, "Unhandled ESC: 0x{byte:02x}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(rows: usize, cols: usize, raw: &str) -> Vec<String> {
        let mut buffer = ScreenBuffer::new(rows, cols);
        buffer.render(raw).lines().to_vec()
    }

    #[test]
    fn test_plain_lines() {
        let lines = render(5, 20, "Line 1\nLine 2");
        assert_eq!(lines[0], "Line 1");
        assert_eq!(lines[1], "Line 2");
        assert_eq!(lines.len(), 5);
        assert!(lines[2..].iter().all(|l| l.is_empty()));
    }

    #[test]
    fn test_size_is_clamped_to_one_cell() {
        assert_eq!(ScreenBuffer::new(24, 80).size(), (24, 80));
        let buffer = ScreenBuffer::new(0, 0);
        assert_eq!(buffer.size(), (1, 1));
        assert_eq!(buffer.screen_text().lines().len(), 1);
    }

    #[test]
    fn test_sgr_is_stripped() {
        let lines = render(3, 40, "\x1b[32mgreen text\x1b[0m and \x1b[1;38;2;215;119;87m✻\x1b[39m Thinking");
        assert_eq!(lines[0], "green text and ✻ Thinking");
    }

    #[test]
    fn test_invisible_chars_and_trailing_spaces_removed() {
        let lines = render(2, 40, "Hello\u{200B}World   \r\n\u{FEFF}next");
        assert_eq!(lines[0], "HelloWorld");
        assert_eq!(lines[1], "next");
    }

    #[test]
    fn test_carriage_return_overwrites() {
        let lines = render(2, 20, "abc\rX");
        assert_eq!(lines[0], "Xbc");
    }

    #[test]
    fn test_wide_characters() {
        let lines = render(2, 10, "你好世界ab");
        assert_eq!(lines[0], "你好世界ab");

        // 右端に収まらない全角文字は次の行へ
        let lines = render(3, 5, "ab你好");
        assert_eq!(lines[0], "ab你");
        assert_eq!(lines[1], "好");
    }

    #[test]
    fn test_long_line_wraps() {
        let lines = render(5, 10, &"x".repeat(25));
        assert_eq!(lines[0], "x".repeat(10));
        assert_eq!(lines[1], "x".repeat(10));
        assert_eq!(lines[2], "x".repeat(5));
    }

    #[test]
    fn test_full_width_line_then_newline_has_no_blank_row() {
        let lines = render(4, 5, "abcde\r\nfghij\r\nk");
        assert_eq!(lines[0], "abcde");
        assert_eq!(lines[1], "fghij");
        assert_eq!(lines[2], "k");
    }

    #[test]
    fn test_scrolls_at_bottom() {
        let raw: Vec<String> = (1..=10).map(|i| format!("line {i}")).collect();
        let lines = render(5, 20, &raw.join("\r\n"));
        assert_eq!(lines, vec!["line 6", "line 7", "line 8", "line 9", "line 10"]);
    }

    #[test]
    fn test_cursor_movement_and_erase() {
        let mut buffer = ScreenBuffer::new(5, 20);
        buffer.process_data(b"first\r\nsecond\r\nthird");
        // 2行目に戻って書き換え
        buffer.process_data(b"\x1b[2;1H\x1b[2KSECOND");
        let lines = buffer.screen_text();
        assert_eq!(lines.lines()[1], "SECOND");

        // 1行上を消去して行頭へ
        buffer.process_data(b"\x1b[1A\x1b[2K\x1b[G");
        assert_eq!(buffer.screen_text().lines()[0], "");
        assert_eq!(buffer.cursor_position(), (0, 0));

        buffer.process_data(b"\x1b[2J");
        assert!(buffer.screen_text().is_blank());
    }

    #[test]
    fn test_erase_to_end_of_line() {
        let lines = render(2, 20, "hello world\x1b[6G\x1b[K");
        assert_eq!(lines[0], "hello");
    }

    #[test]
    fn test_delete_and_insert_chars() {
        let lines = render(2, 20, "abcdef\x1b[2G\x1b[2P");
        assert_eq!(lines[0], "adef");

        let lines = render(2, 20, "abcdef\x1b[2G\x1b[2@");
        assert_eq!(lines[0], "a  bcdef");
    }

    #[test]
    fn test_scroll_region_and_reverse_index() {
        let mut buffer = ScreenBuffer::new(4, 10);
        buffer.process_data(b"header\r\na\r\nb\r\nfooter");
        // 2-3行目だけをスクロール領域に
        buffer.process_data(b"\x1b[2;3r\x1b[3;1H\ncc");
        let lines = buffer.screen_text();
        assert_eq!(lines.lines(), &["header", "b", "cc", "footer"]);

        buffer.process_data(b"\x1b[2;1H\x1bM");
        let lines = buffer.screen_text();
        assert_eq!(lines.lines(), &["header", "", "b", "footer"]);
    }

    #[test]
    fn test_save_restore_cursor() {
        let lines = render(3, 20, "ab\x1b7\r\nnext\x1b8c");
        assert_eq!(lines[0], "abc");
        assert_eq!(lines[1], "next");
    }

    #[test]
    fn test_alternate_screen_clears() {
        let lines = render(3, 20, "shell\x1b[?1049hfull screen app");
        assert_eq!(lines[0], "     full screen app");
    }

    #[test]
    fn test_malformed_sequences_do_not_panic() {
        let lines = render(3, 20, "\x1b[999;999H\x1b[\x1b]0;title\x07ok\x1b[99999A\x1b[0;0Hz");
        assert_eq!(lines[0].chars().next(), Some('z'));
        let _ = render(1, 1, "你\x1b[5@\x1b[5P\x1b[5L\x1b[5M\x1b[5S\x1b[5T");
    }

    #[test]
    fn test_render_resets_previous_content() {
        let mut buffer = ScreenBuffer::new(3, 20);
        buffer.render("old content");
        let text = buffer.render("new");
        assert_eq!(text.lines()[0], "new");
    }
}
