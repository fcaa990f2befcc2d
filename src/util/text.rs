use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a string in terminal columns.
///
/// Hangul and other CJK characters count as two columns.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Truncates a string to fit within `max_width` terminal columns.
///
/// Appends "..." when text is cut. Widths of three columns or less have no
/// room for the ellipsis, so as many characters as fit are returned instead.
///
/// # Examples
///
/// ```
/// use tripfeed::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Gyeongbokgung", 20), "Gyeongbokgung");
/// assert_eq!(truncate_to_width("Gyeongbokgung Palace", 10), "Gyeongb...");
/// assert_eq!(truncate_to_width("경복궁 야간개장", 9), "경복궁...");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    if max_width <= ELLIPSIS_WIDTH {
        let mut byte_end = 0;
        let mut current_width = 0;
        for (idx, c) in s.char_indices() {
            let char_width = UnicodeWidthChar::width(c).unwrap_or(0);
            if current_width + char_width > max_width {
                break;
            }
            current_width += char_width;
            byte_end = idx + c.len_utf8();
        }
        if byte_end == s.len() {
            return Cow::Borrowed(s);
        }
        return Cow::Owned(s[..byte_end].to_string());
    }

    let target_width = max_width - ELLIPSIS_WIDTH;
    let mut current_width = 0;
    let mut cut_point = None;

    for (idx, c) in s.char_indices() {
        let char_width = UnicodeWidthChar::width(c).unwrap_or(0);

        if cut_point.is_none() && current_width + char_width > target_width {
            cut_point = Some(idx);
        }

        if current_width + char_width > max_width {
            let cut = cut_point.unwrap_or(idx);
            return Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS));
        }

        current_width += char_width;
    }

    Cow::Borrowed(s)
}

fn is_stripped_control(b: u8) -> bool {
    b == 0x7f || (b < 0x20 && b != 0x09 && b != 0x0a && b != 0x0d)
}

/// Strip terminal control characters and ANSI escape sequences.
///
/// Removes C0 controls (except tab, newline, CR), DEL, CSI sequences
/// (`ESC [` ... final byte), OSC sequences (`ESC ]` ... BEL or `ESC \`) and
/// bare ESC bytes. Returns `Cow::Borrowed` when nothing needs stripping.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let len = bytes.len();

    if !bytes.iter().any(|&b| b == 0x1b || is_stripped_control(b)) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(len);
    let mut i = 0;

    while i < len {
        let b = bytes[i];

        if b == 0x1b {
            if i + 1 < len && bytes[i + 1] == b'[' {
                i += 2;
                while i < len {
                    let c = bytes[i];
                    i += 1;
                    if (0x40..=0x7e).contains(&c) {
                        break;
                    }
                }
            } else if i + 1 < len && bytes[i + 1] == b']' {
                i += 2;
                while i < len {
                    if bytes[i] == 0x07 {
                        i += 1;
                        break;
                    }
                    if bytes[i] == 0x1b && i + 1 < len && bytes[i + 1] == b'\\' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            } else {
                i += 1;
            }
        } else if is_stripped_control(b) {
            i += 1;
        } else {
            let start = i;
            i += 1;
            while i < len && bytes[i] != 0x1b && !is_stripped_control(bytes[i]) {
                i += 1;
            }
            // Only ASCII bytes end a run, so the slice stays on a char boundary.
            out.push_str(&s[start..i]);
        }
    }

    Cow::Owned(out)
}

/// Normalize a single-line field from the upstream API.
///
/// Strips control sequences, collapses every whitespace run (including
/// embedded newlines) into one space, and trims both ends.
pub fn clean_field(raw: &str) -> String {
    strip_control_chars(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_truncation() {
        assert_eq!(truncate_to_width("Bukchon Hanok Village", 10), "Bukchon...");
        assert_eq!(truncate_to_width("Namsan", 10), "Namsan");
    }

    #[test]
    fn test_hangul_truncation() {
        // Each syllable is two columns wide
        assert_eq!(display_width("남산타워"), 8);
        assert_eq!(truncate_to_width("남산서울타워", 7), "남산...");
        assert_eq!(truncate_to_width("남산", 10), "남산");
        assert_eq!(truncate_to_width("남산서울타워", 6), "남...");
    }

    #[test]
    fn test_exact_fit() {
        assert_eq!(truncate_to_width("Jeju", 4), "Jeju");
        assert_eq!(truncate_to_width("Jeju Island", 4), "J...");
    }

    #[test]
    fn test_narrow_widths() {
        assert_eq!(truncate_to_width("Busan", 0), "");
        assert_eq!(truncate_to_width("Busan", 1), "B");
        assert_eq!(truncate_to_width("Busan", 3), "Bus");
        assert_eq!(truncate_to_width("부산", 1), "");
        assert_eq!(truncate_to_width("부산", 3), "부");
    }

    #[test]
    fn test_strip_clean_text_returns_borrowed() {
        let input = "Seoul Forest, Seongdong-gu";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_strip_ansi_and_osc() {
        assert_eq!(strip_control_chars("\x1b[31mRed Gate\x1b[0m"), "Red Gate");
        assert_eq!(
            strip_control_chars("\x1b]0;owned\x07Gwangjang Market"),
            "Gwangjang Market"
        );
        assert_eq!(
            strip_control_chars("\x1b]0;owned\x1b\\Gwangjang Market"),
            "Gwangjang Market"
        );
    }

    #[test]
    fn test_strip_controls_and_del() {
        assert_eq!(strip_control_chars("Hae\x00und\x07ae\x7f"), "Haeundae");
        assert_eq!(strip_control_chars("before\x1bafter"), "beforeafter");
    }

    #[test]
    fn test_strip_preserves_hangul() {
        assert_eq!(strip_control_chars("해운대 \x1b[1m해수욕장\x1b[0m"), "해운대 해수욕장");
    }

    #[test]
    fn test_clean_field_collapses_whitespace() {
        assert_eq!(
            clean_field("  서울특별시 종로구\n  사직로 161 \x1b[0m "),
            "서울특별시 종로구 사직로 161"
        );
        assert_eq!(clean_field(""), "");
        assert_eq!(clean_field("\t\n"), "");
    }
}
