//! Raw job posting text to [`JobRecord`]
//!
//! A line-oriented heuristic parser. It recognises a handful of section
//! headers and single-line `Key: value` fields; anything else becomes
//! description text.

use regex::Regex;
use sdk::JobRecord;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Description text kept from the posting body
const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Longest slug produced by [`slugify`]
const MAX_SLUG_CHARS: usize = 80;

struct Patterns {
    title_at_company: Regex,
    header: Regex,
    bullet: Regex,
    requirements: Regex,
    responsibilities: Regex,
    benefits: Regex,
    location: Regex,
    salary: Regex,
    job_type: Regex,
    posted: Regex,
    non_alnum: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        title_at_company: Regex::new(
            r"(?i)(?P<title>[A-Za-z][A-Za-z0-9 &/+-]{2,})\s+at\s+(?P<company>[A-Za-z0-9 .,&'\-]{2,})",
        )
        .expect("Invalid title pattern"),
        header: Regex::new(r"^[A-Za-z].+:$").expect("Invalid header pattern"),
        bullet: Regex::new(r"^[-*•]\s+").expect("Invalid bullet pattern"),
        requirements: Regex::new(r"(?i)^requirements:?$").expect("Invalid requirements pattern"),
        responsibilities: Regex::new(
            r"(?i)^(responsibilities|about the role|what you will do):?$",
        )
        .expect("Invalid responsibilities pattern"),
        benefits: Regex::new(r"(?i)^benefits:?$").expect("Invalid benefits pattern"),
        location: Regex::new(r"(?i)^(location|based in):\s*(.+)$").expect("Invalid location pattern"),
        salary: Regex::new(r"(?i)^(salary|compensation):\s*(.+)$").expect("Invalid salary pattern"),
        job_type: Regex::new(r"(?i)^(type|employment type):\s*(.+)$").expect("Invalid type pattern"),
        posted: Regex::new(r"(?i)^(posted|posted date|date):\s*(.+)$").expect("Invalid posted pattern"),
        non_alnum: Regex::new(r"[^A-Za-z0-9]+").expect("Invalid slug pattern"),
    })
}

/// Parse a pasted job posting.
///
/// Title and company come from a "`<title> at <company>`" phrase in the first
/// three lines, else from the first two lines. `raw_text_hash` is the SHA-256
/// of the input.
pub fn parse_job_text(raw_text: &str) -> JobRecord {
    let p = patterns();
    let lines = split_lines(raw_text);

    let mut job = JobRecord {
        raw_text_hash: hex::encode(Sha256::digest(raw_text.as_bytes())),
        ..Default::default()
    };

    let head = lines.iter().take(3).cloned().collect::<Vec<_>>().join(" ");
    if let Some(caps) = p.title_at_company.captures(&head) {
        job.title = caps["title"].trim().to_string();
        job.company = caps["company"].trim().to_string();
    } else {
        job.title = lines.first().cloned().unwrap_or_default();
        job.company = lines.get(1).cloned().unwrap_or_default();
    }

    let mut description: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].as_str();

        if p.requirements.is_match(line) {
            let (items, next) = collect_section(&lines, i + 1);
            job.requirements = items;
            i = next;
            continue;
        }
        if p.responsibilities.is_match(line) {
            let (items, next) = collect_section(&lines, i + 1);
            job.responsibilities = items;
            i = next;
            continue;
        }
        if p.benefits.is_match(line) {
            let (items, next) = collect_section(&lines, i + 1);
            job.benefits = items;
            i = next;
            continue;
        }

        let fields = [
            (&p.location, &mut job.location),
            (&p.salary, &mut job.salary),
            (&p.job_type, &mut job.job_type),
            (&p.posted, &mut job.posted_date),
        ];
        let mut matched = false;
        for (re, slot) in fields {
            if let Some(caps) = re.captures(line) {
                *slot = caps[2].trim().to_string();
                matched = true;
                break;
            }
        }

        // Unknown headers are skipped, everything else is description
        if !matched && !p.header.is_match(line) {
            description.push(line);
        }
        i += 1;
    }

    let description = description.join(" ");
    job.description = truncate_chars(description.trim(), MAX_DESCRIPTION_CHARS)
        .trim()
        .to_string();

    job
}

/// Normalise line endings and bullets, collapse whitespace, drop blank lines
fn split_lines(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{2022}', "-")
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Gather bullet items from `start` until the next header line.
///
/// A non-bullet line continues the previous item (or starts the first one).
fn collect_section(lines: &[String], start: usize) -> (Vec<String>, usize) {
    let p = patterns();
    let mut items: Vec<String> = Vec::new();
    let mut i = start;

    while i < lines.len() {
        let line = lines[i].as_str();
        if p.header.is_match(line) {
            break;
        }
        if p.bullet.is_match(line) {
            items.push(p.bullet.replace(line, "").trim().to_string());
        } else if let Some(last) = items.last_mut() {
            last.push(' ');
            last.push_str(line);
        } else {
            items.push(line.to_string());
        }
        i += 1;
    }

    (items, i)
}

/// Lowercase ASCII slug: non-alphanumeric runs become `_`, capped at 80 chars.
///
/// Common Latin accented letters are folded to their base letter first.
pub fn slugify(value: &str) -> String {
    let folded: String = value.chars().filter_map(fold_char).collect();
    let slug = patterns().non_alnum.replace_all(&folded, "_");
    let slug = slug.trim_matches('_').to_lowercase();
    let slug: String = slug.chars().take(MAX_SLUG_CHARS).collect();
    slug.trim_end_matches('_').to_string()
}

/// Map a character to ASCII, dropping what has no close equivalent.
fn fold_char(c: char) -> Option<char> {
    if c.is_ascii() {
        return Some(c);
    }
    let base = match c {
        'À'..='Å' => 'A',
        'à'..='å' => 'a',
        'Ç' => 'C',
        'ç' => 'c',
        'È'..='Ë' => 'E',
        'è'..='ë' => 'e',
        'Ì'..='Ï' => 'I',
        'ì'..='ï' => 'i',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ò'..='Ö' | 'Ø' => 'O',
        'ò'..='ö' | 'ø' => 'o',
        'Ù'..='Ü' => 'U',
        'ù'..='ü' => 'u',
        'Ý' => 'Y',
        'ý' | 'ÿ' => 'y',
        c if c.is_whitespace() => ' ',
        _ => return None,
    };
    Some(base)
}

/// `slug(title)_slug(company)`, defaulting to `job` and `company`
pub fn build_filename(job: &JobRecord) -> String {
    let title = if job.title.trim().is_empty() {
        "job"
    } else {
        job.title.as_str()
    };
    let company = if job.company.trim().is_empty() {
        "company"
    } else {
        job.company.as_str()
    };

    let base = format!("{}_{}", slugify(title), slugify(company));
    let base = base.trim_matches('_');
    if base.is_empty() {
        "job_company".to_string()
    } else {
        base.to_string()
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
