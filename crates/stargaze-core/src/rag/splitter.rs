/// Recursive text splitter for breaking READMEs into embedding-sized chunks.
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: ["\n\n", "\n", " ", ""].iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Splitter that prefers Markdown section boundaries.
    pub fn markdown(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self::new(chunk_size, chunk_overlap).with_separators(
            [
                "\n## ", "\n### ", "\n#### ", "\n##### ", "\n###### ", "\n\n", "\n", " ", "",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
    }

    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    /// Split text into chunks. Blank chunks are dropped.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if text.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        self.recursive_split(text, &self.separators)
            .into_iter()
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    fn recursive_split(&self, text: &str, separators: &[String]) -> Vec<String> {
        let Some((separator, remaining_separators)) = separators.split_first() else {
            return self.split_by_length(text);
        };

        if separator.is_empty() {
            return self.split_by_length(text);
        }

        // Heading separators stay on the section they open
        let marker = heading_marker(separator);
        let joiner = &separator[..separator.len() - marker.len()];
        let splits: Vec<String> = text
            .split(separator.as_str())
            .enumerate()
            .map(|(i, split)| {
                if i == 0 {
                    split.to_string()
                } else {
                    format!("{}{}", marker, split)
                }
            })
            .collect();

        let mut final_chunks = Vec::new();
        let mut current_chunk = String::new();

        for split in &splits {
            let potential_chunk = if current_chunk.is_empty() {
                split.clone()
            } else {
                format!("{}{}{}", current_chunk, joiner, split)
            };

            if potential_chunk.len() <= self.chunk_size {
                current_chunk = potential_chunk;
                continue;
            }

            if !current_chunk.is_empty() {
                final_chunks.push(current_chunk.clone());
                current_chunk = self.overlap_tail(&current_chunk);
            }

            if split.len() > self.chunk_size {
                final_chunks.extend(self.recursive_split(split, remaining_separators));
                current_chunk.clear();
            } else if current_chunk.is_empty()
                || current_chunk.len() + joiner.len() + split.len() > self.chunk_size
            {
                current_chunk = split.clone();
            } else {
                current_chunk = format!("{}{}{}", current_chunk, joiner, split);
            }
        }

        if !current_chunk.is_empty() {
            final_chunks.push(current_chunk);
        }

        final_chunks
    }

    /// Trailing `chunk_overlap` bytes of a finished chunk, on a char boundary.
    fn overlap_tail(&self, chunk: &str) -> String {
        if self.chunk_overlap == 0 || chunk.len() <= self.chunk_overlap {
            return String::new();
        }
        let mut start = chunk.len() - self.chunk_overlap;
        while start < chunk.len() && !chunk.is_char_boundary(start) {
            start += 1;
        }
        chunk[start..].to_string()
    }

    fn split_by_length(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < text.len() {
            let mut end = (start + self.chunk_size).min(text.len());
            while end > start && !text.is_char_boundary(end) {
                end -= 1;
            }
            if end == start {
                // chunk_size smaller than a single char
                end = text[start..]
                    .char_indices()
                    .nth(1)
                    .map(|(i, _)| start + i)
                    .unwrap_or(text.len());
            }

            chunks.push(text[start..end].to_string());

            if end >= text.len() {
                break;
            }

            let mut next = end.saturating_sub(self.chunk_overlap).max(start + 1);
            while next < end && !text.is_char_boundary(next) {
                next += 1;
            }
            start = next;
        }

        chunks
    }
}

/// `## ` for a `"\n## "` separator; empty for non-heading separators.
fn heading_marker(separator: &str) -> &str {
    let trimmed = separator.trim_start_matches('\n');
    if trimmed.starts_with('#') {
        trimmed
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_text_no_splitting() {
        let splitter = TextSplitter::new(100, 10);
        let chunks = splitter.split_text("  Short text\n");
        assert_eq!(chunks, vec!["Short text".to_string()]);
    }

    #[test]
    fn test_empty_text() {
        let splitter = TextSplitter::markdown(100, 10);
        assert!(splitter.split_text("   \n\n ").is_empty());
    }

    #[test]
    fn test_chunks_respect_size() {
        let splitter = TextSplitter::new(20, 5);
        let text = "word1 word2 word3 word4 word5 word6 word7 word8 word9 word10";
        let chunks = splitter.split_text(text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 20, "chunk too long: {:?}", chunk);
        }
        assert!(chunks.last().unwrap().ends_with("word10"));
    }

    #[test]
    fn test_markdown_sections() {
        let splitter = TextSplitter::markdown(60, 0);
        let readme = "# pgai\n\nIntro paragraph.\n\n## Install\nRun the installer.\n\n## Usage\nCall the function from SQL.";
        let chunks = splitter.split_text(readme);

        assert!(chunks.len() >= 2);
        assert!(chunks.iter().any(|c| c.contains("Install")));
        assert!(chunks.iter().any(|c| c.contains("Usage")));
    }

    #[test]
    fn test_markdown_chunks_keep_heading_marker() {
        let splitter = TextSplitter::markdown(40, 0);
        let readme = "# Tool\n\nIntro text here.\n\n## Install\nRun the installer now.\n\n## Usage\nCall it from SQL please.";
        let chunks = splitter.split_text(readme);

        assert_eq!(
            chunks,
            vec![
                "# Tool\n\nIntro text here.".to_string(),
                "## Install\nRun the installer now.".to_string(),
                "## Usage\nCall it from SQL please.".to_string(),
            ]
        );
        assert!(chunks.iter().all(|c| !c.starts_with("Install") && !c.starts_with("Usage")));
    }

    #[test]
    fn test_heading_marker() {
        assert_eq!(heading_marker("\n## "), "## ");
        assert_eq!(heading_marker("\n#### "), "#### ");
        assert_eq!(heading_marker("\n\n"), "");
        assert_eq!(heading_marker(" "), "");
    }

    #[test]
    fn test_long_word_split_by_length() {
        let splitter = TextSplitter::new(4, 1);
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks[0], "abcd");
        assert!(chunks.iter().all(|c| c.len() <= 4));
        assert!(chunks.last().unwrap().ends_with('j'));
    }

    #[test]
    fn test_multibyte_boundaries() {
        let splitter = TextSplitter::new(5, 2);
        let chunks = splitter.split_text("ééééééééé");
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.len() <= 5));
    }
}
