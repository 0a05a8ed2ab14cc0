/// Treat absent and empty cells alike as missing.
pub fn present(cell: Option<&str>) -> Option<&str> {
    cell.filter(|s| !s.trim().is_empty())
}

/// Drop a UTF-8 byte-order mark, which spreadsheet exports like to prepend
/// and which would otherwise end up glued to the first header name.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data)
}

/// `"00501.0"` → `Some(("00501", "0"))`; `None` unless both parts are plain
/// ASCII digits and the integer part is non-empty.
pub fn split_decimal(s: &str) -> Option<(&str, &str)> {
    let (int, frac) = s.split_once('.').unwrap_or((s, ""));
    let digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    (!int.is_empty() && digits(int) && digits(frac)).then_some((int, frac))
}
