//! Single `Range: bytes=...` support for file responses.

/// What part of a file a request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable range header: send everything.
    Full,
    /// Inclusive byte offsets, already clamped to the file length.
    Partial { start: u64, end: u64 },
    /// The range lies entirely past the end of the file.
    Unsatisfiable,
}

impl ByteRange {
    /// Interprets a `Range` header against a file of `len` bytes.
    ///
    /// Headers that are malformed, use another unit, or list several
    /// ranges are ignored and yield [`ByteRange::Full`].
    pub fn parse(header: Option<&str>, len: u64) -> Self {
        let Some(ranges) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
            return ByteRange::Full;
        };
        if ranges.contains(',') {
            return ByteRange::Full;
        }
        let Some((first, last)) = ranges.trim().split_once('-') else {
            return ByteRange::Full;
        };

        if first.is_empty() {
            // Suffix form: the last `n` bytes.
            let Ok(suffix) = last.parse::<u64>() else {
                return ByteRange::Full;
            };
            if suffix == 0 || len == 0 {
                return ByteRange::Unsatisfiable;
            }
            return ByteRange::Partial {
                start: len.saturating_sub(suffix),
                end: len - 1,
            };
        }

        let Ok(start) = first.parse::<u64>() else {
            return ByteRange::Full;
        };
        let end = if last.is_empty() {
            u64::MAX
        } else {
            match last.parse::<u64>() {
                Ok(end) if end >= start => end,
                _ => return ByteRange::Full,
            }
        };

        if start >= len {
            return ByteRange::Unsatisfiable;
        }
        ByteRange::Partial {
            start,
            end: end.min(len - 1),
        }
    }

    pub fn content_range(&self, len: u64) -> Option<String> {
        match self {
            ByteRange::Full => None,
            ByteRange::Partial { start, end } => Some(format!("bytes {}-{}/{}", start, end, len)),
            ByteRange::Unsatisfiable => Some(format!("bytes */{}", len)),
        }
    }
}
