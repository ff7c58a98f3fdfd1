/// Cumulative UTF-8 byte lengths per code point.
///
/// `prefix[i]` is the byte length of the first `i` code points, so the table
/// has one more entry than the text has code points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytePrefix {
    prefix: Vec<usize>,
}

impl BytePrefix {
    pub fn build(text: &str) -> Self {
        let prefix = std::iter::once(0)
            .chain(text.char_indices().map(|(i, c)| i + c.len_utf8()))
            .collect();
        Self { prefix }
    }

    /// Number of code points in the indexed text.
    pub fn char_len(&self) -> usize {
        self.prefix.len() - 1
    }

    pub fn byte_len(&self) -> usize {
        self.prefix[self.char_len()]
    }

    /// Code point index containing `byte_offset`.
    ///
    /// Offsets inside a multi-byte code point round down to its start;
    /// offsets past the end clamp to [`char_len`](Self::char_len).
    pub fn char_index(&self, byte_offset: usize) -> usize {
        let index = self
            .prefix
            .partition_point(|&b| b <= byte_offset)
            .saturating_sub(1);
        if byte_offset < self.byte_len() && self.prefix[index] != byte_offset {
            tracing::debug!(
                byte_offset,
                rounded = self.prefix[index],
                "facet offset splits a code point"
            );
        }
        index
    }

    /// Byte offset where code point `char_index` starts, clamped to the text.
    pub fn byte_offset(&self, char_index: usize) -> usize {
        self.prefix[char_index.min(self.char_len())]
    }
}
