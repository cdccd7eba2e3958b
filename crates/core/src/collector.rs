use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const MEDIA_EXTENSIONS: &[&str] = &["jpg", "mov", "png"];

pub fn collect_media_paths(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut media_paths = Vec::new();
    for pattern in patterns {
        let mut matches = expand_pattern(pattern)?;
        matches.retain(|path| has_media_extension(path));
        matches.sort();
        media_paths.extend(matches);
    }
    Ok(media_paths)
}

fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let normalized = normalize_pattern(pattern);

    let Some((root, tail_depth)) = split_walk_root(&normalized) else {
        let path = PathBuf::from(normalized);
        if path.is_file() {
            return Ok(vec![path]);
        }
        return Ok(Vec::new());
    };

    let regex = pattern_regex(&normalized)
        .with_context(|| format!("グロブパターンを解釈できませんでした: {pattern}"))?;

    let mut walker = WalkDir::new(&root).min_depth(1);
    if !normalized.contains("**") {
        walker = walker.max_depth(tail_depth);
    }

    let mut matches = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.path()))
        .flatten()
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let candidate = normalize_candidate(entry.path());
        if regex.is_match(&candidate) {
            matches.push(entry.into_path());
        }
    }
    Ok(matches)
}

fn normalize_pattern(pattern: &str) -> String {
    let pattern = pattern.replace('\\', "/");
    pattern.strip_prefix("./").unwrap_or(&pattern).to_string()
}

fn normalize_candidate(path: &Path) -> String {
    let candidate = path.to_string_lossy().replace('\\', "/");
    candidate.strip_prefix("./").unwrap_or(&candidate).to_string()
}

fn split_walk_root(pattern: &str) -> Option<(PathBuf, usize)> {
    let components: Vec<&str> = pattern.split('/').collect();
    let wildcard_start = components
        .iter()
        .position(|component| component.contains(['*', '?', '[']))?;

    let root = if wildcard_start == 0 {
        PathBuf::from(".")
    } else {
        let prefix = components[..wildcard_start].join("/");
        if prefix.is_empty() {
            PathBuf::from("/")
        } else {
            PathBuf::from(prefix)
        }
    };
    Some((root, components.len() - wildcard_start))
}

fn pattern_regex(pattern: &str) -> Result<Regex> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut expr = String::from("^");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    if chars.get(i + 2) == Some(&'/') {
                        expr.push_str("(?:.*/)?");
                        i += 3;
                    } else {
                        expr.push_str(".*");
                        i += 2;
                    }
                } else {
                    expr.push_str("[^/]*");
                    i += 1;
                }
            }
            '?' => {
                expr.push_str("[^/]");
                i += 1;
            }
            '[' => {
                if let Some(end) = find_class_end(&chars, i) {
                    expr.push('[');
                    let mut j = i + 1;
                    if chars.get(j) == Some(&'!') {
                        expr.push('^');
                        j += 1;
                    }
                    while j < end {
                        if matches!(chars[j], '\\' | '^') {
                            expr.push('\\');
                        }
                        expr.push(chars[j]);
                        j += 1;
                    }
                    expr.push(']');
                    i = end + 1;
                } else {
                    expr.push_str("\\[");
                    i += 1;
                }
            }
            other => {
                expr.push_str(&regex::escape(&other.to_string()));
                i += 1;
            }
        }
    }
    expr.push('$');
    Ok(Regex::new(&expr)?)
}

fn find_class_end(chars: &[char], open: usize) -> Option<usize> {
    let mut start = open + 1;
    if chars.get(start) == Some(&'!') {
        start += 1;
    }
    (start + 1..chars.len()).find(|&j| chars[j] == ']')
}

fn has_media_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            MEDIA_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
