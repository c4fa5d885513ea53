//! Span overwrites on the original text, plus a source map back to it.
//!
//! Edits always address offsets of the *original* text, so the order in which
//! they are added doesn't matter. Untouched regions map back 1:1 (one mapping
//! per chunk and per line); an overwritten region maps as a whole to the start
//! of the span it replaced.

use crate::error::{Error, Result};
use sourcemap::{SourceMap, SourceMapBuilder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl Edit {
    pub fn new(start: usize, end: usize, replacement: impl Into<String>) -> Self {
        Self {
            start,
            end,
            replacement: replacement.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMapOptions {
    /// Generated file name recorded as the map's `file`.
    pub file: Option<String>,
    /// Name of the original text; also the map's only source.
    pub source: Option<String>,
    pub include_content: bool,
}

impl SourceMapOptions {
    pub fn new(source: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            source: Some(source.into()),
            include_content: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rewritten {
    pub code: String,
    pub map: Option<SourceMap>,
}

/// Wrap a module path in single quotes, escaping what would break the literal.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\u{2028}' => quoted.push_str("\\u2028"),
            '\u{2029}' => quoted.push_str("\\u2029"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

#[derive(Debug, Clone)]
pub struct TextRewriter<'s> {
    original: &'s str,
    /// Sorted by start, never overlapping.
    edits: Vec<Edit>,
}

impl<'s> TextRewriter<'s> {
    pub fn new(original: &'s str) -> Self {
        Self {
            original,
            edits: Vec::new(),
        }
    }

    /// Replace `[start, end)` of the original text.
    ///
    /// Re-adding an identical edit is a no-op; any other overlap is rejected.
    pub fn overwrite(&mut self, start: usize, end: usize, replacement: impl Into<String>) -> Result<()> {
        let len = self.original.len();
        if start >= end
            || end > len
            || !self.original.is_char_boundary(start)
            || !self.original.is_char_boundary(end)
        {
            return Err(Error::rewrite_invalid_span(start, end, len));
        }

        let edit = Edit::new(start, end, replacement);
        let index = self.edits.partition_point(|e| e.start < start);

        for neighbour in [index.checked_sub(1), Some(index)].into_iter().flatten() {
            let Some(existing) = self.edits.get(neighbour) else {
                continue;
            };
            if *existing == edit {
                return Ok(());
            }
            if existing.start < end && start < existing.end {
                return Err(Error::rewrite_overlapping_edits(
                    start,
                    end,
                    (existing.start, existing.end),
                ));
            }
        }

        self.edits.insert(index, edit);
        Ok(())
    }

    pub fn has_changes(&self) -> bool {
        !self.edits.is_empty()
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    fn chunks(&self) -> Vec<Chunk<'_>> {
        let mut chunks = Vec::with_capacity(self.edits.len() * 2 + 1);
        let mut cursor = 0;

        for edit in &self.edits {
            if cursor < edit.start {
                chunks.push(Chunk::Unchanged(&self.original[cursor..edit.start]));
            }
            chunks.push(Chunk::Replaced {
                original: &self.original[edit.start..edit.end],
                content: &edit.replacement,
            });
            cursor = edit.end;
        }
        if cursor < self.original.len() {
            chunks.push(Chunk::Unchanged(&self.original[cursor..]));
        }

        chunks
    }

    pub fn to_text(&self) -> String {
        if self.edits.is_empty() {
            return self.original.to_string();
        }

        let mut text = String::with_capacity(self.original.len());
        for chunk in self.chunks() {
            text.push_str(chunk.content());
        }
        text
    }

    pub fn generate_map(&self, options: &SourceMapOptions) -> SourceMap {
        let mut builder = SourceMapBuilder::new(options.file.as_deref());
        let src_id = builder.add_source(options.source.as_deref().unwrap_or(""));
        if options.include_content {
            builder.set_source_contents(src_id, Some(self.original));
        }

        let mut generated = Position::default();
        let mut original = Position::default();

        for chunk in self.chunks() {
            match chunk {
                Chunk::Unchanged(text) => {
                    let mut line_start = true;
                    for c in text.chars() {
                        if line_start {
                            add_mapping(&mut builder, generated, original, src_id);
                            line_start = false;
                        }
                        generated.advance(c);
                        original.advance(c);
                        if c == '\n' {
                            line_start = true;
                        }
                    }
                }
                Chunk::Replaced {
                    original: replaced,
                    content,
                } => {
                    let anchor = original;
                    let mut line_start = true;
                    for c in content.chars() {
                        if line_start {
                            add_mapping(&mut builder, generated, anchor, src_id);
                            line_start = false;
                        }
                        generated.advance(c);
                        if c == '\n' {
                            line_start = true;
                        }
                    }
                    for c in replaced.chars() {
                        original.advance(c);
                    }
                }
            }
        }

        builder.into_sourcemap()
    }

    pub fn finish(self, map: Option<&SourceMapOptions>) -> Rewritten {
        Rewritten {
            code: self.to_text(),
            map: map.map(|options| self.generate_map(options)),
        }
    }
}

enum Chunk<'a> {
    Unchanged(&'a str),
    Replaced { original: &'a str, content: &'a str },
}

impl<'a> Chunk<'a> {
    fn content(&self) -> &'a str {
        match self {
            Chunk::Unchanged(text) => text,
            Chunk::Replaced { content, .. } => content,
        }
    }
}

/// Zero-based line and UTF-16 column, as source maps count them.
#[derive(Debug, Clone, Copy, Default)]
struct Position {
    line: u32,
    column: u32,
}

impl Position {
    fn advance(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += c.len_utf16() as u32;
        }
    }
}

fn add_mapping(builder: &mut SourceMapBuilder, generated: Position, original: Position, src_id: u32) {
    builder.add_raw(
        generated.line,
        generated.column,
        original.line,
        original.column,
        Some(src_id),
        None,
        false,
    );
}

/// Apply `edits` to `original`; build a map only when `map` is given.
pub fn rewrite<I>(original: &str, edits: I, map: Option<&SourceMapOptions>) -> Result<Rewritten>
where
    I: IntoIterator<Item = Edit>,
{
    let mut rewriter = TextRewriter::new(original);
    for edit in edits {
        rewriter.overwrite(edit.start, edit.end, edit.replacement)?;
    }
    Ok(rewriter.finish(map))
}
