use chrono::{DateTime, Local, Utc};

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Signed byte delta, e.g. `+12 B` or `-1.00 KB`.
pub fn format_size_delta(delta: i64) -> String {
    let sign = if delta < 0 { "-" } else { "+" };
    format!("{}{}", sign, format_bytes(delta.unsigned_abs()))
}

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    let local: DateTime<Local> = DateTime::from(*dt);
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Shortens a digest for table output; full digests go to exports.
pub fn abbreviate_digest(digest: &str) -> String {
    match digest.get(..16) {
        Some(head) if head.len() < digest.len() => format!("{}…", head),
        _ => digest.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GB");
        assert_eq!(format_bytes(1024_u64.pow(4)), "1.00 TB");
    }

    #[test]
    fn test_format_size_delta() {
        assert_eq!(format_size_delta(12), "+12 B");
        assert_eq!(format_size_delta(0), "+0 B");
        assert_eq!(format_size_delta(-2048), "-2.00 KB");
    }

    #[test]
    fn test_abbreviate_digest() {
        assert_eq!(abbreviate_digest("abc"), "abc");
        assert_eq!(
            abbreviate_digest("2cf24dba5fb0a30e26e83b2ac5b9e29e"),
            "2cf24dba5fb0a30e…"
        );
        // Byte 16 falls inside a multibyte character.
        assert_eq!(abbreviate_digest("aaaaaaaaaaaaaaaéé"), "aaaaaaaaaaaaaaaéé");
    }
}
