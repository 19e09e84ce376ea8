use unicode_normalization::UnicodeNormalization;

/// Canonical form used for cache keys and semantic-group matching: NFKC,
/// lowercased, whitespace collapsed to single spaces.
pub fn normalize_question(question: &str) -> String {
	let folded: String = question.nfkc().collect::<String>().to_lowercase();

	let mut out = String::with_capacity(folded.len());
	let mut pending_space = false;
	for ch in folded.chars() {
		if ch.is_whitespace() {
			pending_space = !out.is_empty();
			continue;
		}
		if pending_space {
			out.push(' ');
			pending_space = false;
		}
		out.push(ch);
	}

	out
}
