//! Console-level behavior tests covering the write path, cursor motion,
//! scroll regions, scrollback, resize/reflow, and device queries.

use super::Console;

fn write(console: &mut Console, data: &str) {
    console.write(data.as_bytes(), &mut |_| {}, &mut || {});
}

fn plain_rows(console: &Console) -> Vec<String> {
    console
        .visible_lines()
        .iter()
        .map(|l| l.to_plain_string())
        .collect()
}

#[test]
fn new_console_is_empty() {
    let c = Console::new(10, 3, 100);
    assert_eq!(plain_rows(&c), vec!["", "", ""]);
}

#[test]
fn process_simple_text() {
    let mut c = Console::new(10, 3, 100);
    write(&mut c, "hello");
    assert_eq!(plain_rows(&c)[0], "hello");
    assert_eq!(c.cursor().x, 5);
}

#[test]
fn process_newline_moves_to_next_row() {
    let mut c = Console::new(10, 3, 100);
    write(&mut c, "a\r\nb");
    assert_eq!(plain_rows(&c), vec!["a", "b", ""]);
    assert_eq!(c.cursor().y, 1);
}

#[test]
fn carriage_return_overwrites() {
    let mut c = Console::new(10, 3, 100);
    write(&mut c, "hello\rHI");
    assert_eq!(plain_rows(&c)[0], "HIllo");
}

#[test]
fn line_wrap_at_width() {
    let mut c = Console::new(5, 3, 100);
    write(&mut c, "abcdefgh");
    let rows = plain_rows(&c);
    assert_eq!(rows[0], "abcde");
    assert_eq!(rows[1], "fgh");
}

#[test]
fn cursor_movement_up() {
    let mut c = Console::new(10, 5, 100);
    write(&mut c, "a\r\nb\r\nc\x1b[2A");
    assert_eq!(c.cursor().y, 1);
}

#[test]
fn cursor_absolute_position() {
    let mut c = Console::new(10, 5, 100);
    write(&mut c, "\x1b[3;4Hx");
    assert_eq!(plain_rows(&c)[2], "   x");
}

#[test]
fn erase_to_end_of_line() {
    let mut c = Console::new(10, 3, 100);
    write(&mut c, "hello\x1b[3D\x1b[K");
    assert_eq!(plain_rows(&c)[0], "he");
}

#[test]
fn clear_screen_blanks_everything() {
    let mut c = Console::new(10, 3, 100);
    write(&mut c, "abc\r\ndef\x1b[2J");
    assert_eq!(plain_rows(&c), vec!["", "", ""]);
}

#[test]
fn scroll_when_full_moves_content_up() {
    let mut c = Console::new(10, 2, 100);
    write(&mut c, "a\r\nb\r\nc");
    assert_eq!(plain_rows(&c), vec!["b", "c"]);
}

#[test]
fn bare_csi_m_erases_entire_line() {
    let mut c = Console::new(10, 3, 100);
    write(&mut c, "hello\x1b[M");
    assert_eq!(plain_rows(&c)[0], "");
}

#[test]
fn reverse_index_moves_cursor_up() {
    let mut c = Console::new(10, 5, 100);
    write(&mut c, "a\r\nb\r\nc\x1bM");
    assert_eq!(c.cursor().y, 1);
}

#[test]
fn reverse_index_scrolls_at_top() {
    let mut c = Console::new(10, 3, 100);
    write(&mut c, "a\r\nb\r\nc\x1b[1;1H\x1bM");
    // cursor was already at the top of the viewport (row 0); reverse index
    // at the scroll region's top edge scrolls the region down instead of
    // moving the cursor off-screen.
    assert_eq!(c.cursor().y, 0);
}

#[test]
fn scroll_region_basic_setup() {
    let mut c = Console::new(10, 10, 100);
    write(&mut c, "\x1b[2;5r");
    write(&mut c, "a\r\nb\r\nc\r\nd\r\ne\r\nf");
    // only rows within [2,5) in 1-based (i.e. 1..4 0-based) scroll within
    // the region once the cursor reaches the bottom margin.
    assert_eq!(c.cursor().x, 1);
}

#[test]
fn scroll_region_scroll_within_region_leaves_rows_outside_untouched() {
    let mut c = Console::new(10, 5, 100);
    write(&mut c, "top\r\n");
    write(&mut c, "\x1b[2;4r");
    write(&mut c, "\x1b[2;1Ha\r\nb\r\nc\r\nd");
    let rows = plain_rows(&c);
    assert_eq!(rows[0], "top");
}

#[test]
fn sgr_reset_clears_colors_and_attrs() {
    let mut c = Console::new(10, 3, 100);
    write(&mut c, "\x1b[1;31mhot\x1b[0mcold");
    assert_eq!(plain_rows(&c)[0], "hotcold");
}

#[test]
fn device_attributes_query_replies() {
    let mut c = Console::new(10, 3, 100);
    let mut replies = Vec::new();
    c.write(b"\x1b[c", &mut |b| replies.push(b.to_vec()), &mut || {});
    assert_eq!(replies, vec![b"\x1b[?1;2c".to_vec()]);
}

#[test]
fn cursor_position_query_replies_with_coordinates() {
    let mut c = Console::new(10, 3, 100);
    write(&mut c, "\x1b[2;3H");
    let mut replies = Vec::new();
    c.write(b"\x1b[6n", &mut |b| replies.push(b.to_vec()), &mut || {});
    assert_eq!(replies, vec![b"\x1b[2;3R".to_vec()]);
}

#[test]
fn bell_invokes_callback() {
    let mut c = Console::new(10, 3, 100);
    let mut rang = false;
    c.write(b"\x07", &mut |_| {}, &mut || rang = true);
    assert!(rang);
}

#[test]
fn scroll_into_history_disables_auto_scroll() {
    let mut c = Console::new(10, 2, 100);
    write(&mut c, "a\r\nb\r\nc\r\nd");
    assert!(c.is_auto_scroll());
    c.scroll(-1);
    assert!(!c.is_auto_scroll());
}

#[test]
fn deactivate_scroll_restores_auto_scroll() {
    let mut c = Console::new(10, 2, 100);
    write(&mut c, "a\r\nb\r\nc\r\nd");
    c.scroll(-2);
    c.deactivate_scroll();
    assert!(c.is_auto_scroll());
}

#[test]
fn history_cap_trims_oldest_lines() {
    let mut c = Console::new(10, 2, 3);
    for i in 0..10 {
        write(&mut c, &format!("{i}\r\n"));
    }
    // the buffer never holds more than history_size real rows
    assert!(c.visible_lines().len() <= 2);
}

#[test]
fn resize_width_reflows_losslessly() {
    let mut c = Console::new(5, 3, 100);
    write(&mut c, "abcdefgh");
    c.resize(10, 3);
    let joined: String = plain_rows(&c).join("").trim_end().to_string();
    assert!(joined.starts_with("abcdefgh"));
}

#[test]
fn resize_width_then_back_preserves_content() {
    let mut c = Console::new(8, 3, 100);
    write(&mut c, "hello world");
    c.resize(4, 3);
    c.resize(8, 3);
    let rows = plain_rows(&c);
    let joined = rows.join("");
    assert!(joined.contains("hello"));
}

#[test]
fn unknown_csi_is_ignored_not_fatal() {
    let mut c = Console::new(10, 3, 100);
    write(&mut c, "before\x1b[55zafter");
    assert_eq!(plain_rows(&c)[0], "beforeafter");
}

#[test]
fn control_code_in_print_stream_is_substituted() {
    let mut c = Console::new(10, 3, 100);
    write(&mut c, "a\x01b");
    assert_eq!(plain_rows(&c)[0], "a^Ab");
}

#[test]
fn tab_expands_to_next_stop() {
    let mut c = Console::new(20, 3, 100);
    write(&mut c, "ab\tc");
    assert_eq!(plain_rows(&c)[0], "ab      c");
}
