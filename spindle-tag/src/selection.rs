//! Selection expression parsing
//!
//! The file-selection prompt accepts `all`, comma-separated indices, and
//! inclusive ranges, e.g. `1,3,5-8`. Indices are 1-based as displayed;
//! duplicates collapse and the result is ordered by index.

/// Parse a selection expression against a list of `count` items
///
/// Returns 0-based indices. An error message is returned for anything
/// unparseable or out of range so the caller can re-prompt.
pub fn parse_selection(input: &str, count: usize) -> Result<Vec<usize>, String> {
    let input = input.trim().to_lowercase();

    if input == "all" {
        return Ok((0..count).collect());
    }

    if input.is_empty() {
        return Err("Empty selection. Use format: '1,3,5' or '1-10' or 'all'".to_string());
    }

    let mut selected = std::collections::BTreeSet::new();

    for part in input.split(',') {
        let part = part.trim();

        if let Some((start, end)) = part.split_once('-') {
            let start = parse_index(start)?;
            let end = parse_index(end)?;
            if start > end {
                return Err(format!("Invalid range: {}-{}", start, end));
            }
            for n in start..=end {
                selected.insert(n);
            }
        } else {
            selected.insert(parse_index(part)?);
        }
    }

    if let Some(&out_of_range) = selected.iter().find(|&&n| n < 1 || n > count) {
        return Err(format!(
            "Invalid file number {}. Must be between 1 and {}",
            out_of_range, count
        ));
    }

    Ok(selected.into_iter().map(|n| n - 1).collect())
}

fn parse_index(s: &str) -> Result<usize, String> {
    s.trim()
        .parse::<usize>()
        .map_err(|_| "Invalid input. Use format: '1,3,5' or '1-10' or 'all'".to_string())
}
