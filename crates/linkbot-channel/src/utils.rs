//! Reply formatting utilities

/// Split a reply into chunks no longer than `max_length` bytes
///
/// Chunks break between lines where possible. A single line longer than the
/// limit is cut on character boundaries.
pub fn split_reply(text: &str, max_length: usize) -> Vec<String> {
    if text.len() <= max_length {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.split('\n') {
        if !current.is_empty() && current.len() + 1 + line.len() > max_length {
            push_chunk(&mut chunks, std::mem::take(&mut current));
        }

        if line.len() > max_length {
            let mut pieces = hard_split(line, max_length);
            current = pieces.pop().unwrap_or_default();
            for piece in pieces {
                push_chunk(&mut chunks, piece);
            }
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }

    push_chunk(&mut chunks, current);
    chunks
}

fn push_chunk(chunks: &mut Vec<String>, chunk: String) {
    let chunk = chunk.trim_matches('\n');
    if !chunk.trim().is_empty() {
        chunks.push(chunk.to_string());
    }
}

fn hard_split(line: &str, max_length: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();

    for c in line.chars() {
        if !piece.is_empty() && piece.len() + c.len_utf8() > max_length {
            pieces.push(std::mem::take(&mut piece));
        }
        piece.push(c);
    }

    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}
