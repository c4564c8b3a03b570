//! Pure record extraction from raw page fragments.
//!
//! No network, no state: every function here maps externally-supplied text
//! fragments to typed records and is testable against literals.

use url::Url;

use crate::error::ExtractError;
use crate::traits::{DetailRecord, RowRecord};
use crate::types::{Collaborator, CollaboratorStatus, Profile, DEFAULT_PHOTO_URL};

/// A parsed `"<field>  <specialty>  kw1; kw2"` label line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelLine {
    pub field_label: String,
    pub specialty_label: String,
    pub keywords: Vec<String>,
}

/// Split a directory label line into field label, specialty label and
/// keywords.
///
/// Segments left of the first `;` are separated by two-or-more spaces or
/// tabs; everything behind `;` separators is keywords. A missing segment
/// resolves to `"-"`, and so does an empty keyword set.
pub fn parse_labels_and_keywords(line: &str) -> LabelLine {
    let mut parts = line.split(';');
    let left = parts.next().unwrap_or("").trim();
    let rest: Vec<&str> = parts.map(str::trim).filter(|p| !p.is_empty()).collect();

    let columns = split_columns(left);
    let field_label = columns
        .first()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or("-")
        .to_string();
    let specialty_label = columns
        .get(1)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or("-")
        .to_string();

    let mut keywords: Vec<String> = columns
        .iter()
        .skip(2)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    keywords.extend(rest.into_iter().map(String::from));
    if keywords.is_empty() {
        keywords.push("-".to_string());
    }

    LabelLine {
        field_label,
        specialty_label,
        keywords,
    }
}

/// Split on whitespace runs that contain a tab or span at least two
/// characters; single spaces stay inside a segment.
fn split_columns(s: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut seg_start = 0;
    let mut ws_start: Option<usize> = None;
    let mut ws_len = 0;
    let mut ws_has_tab = false;

    for (idx, ch) in s.char_indices() {
        if ch.is_whitespace() {
            if ws_start.is_none() {
                ws_start = Some(idx);
                ws_len = 0;
                ws_has_tab = false;
            }
            ws_len += 1;
            ws_has_tab |= ch == '\t';
        } else if let Some(start) = ws_start.take() {
            if ws_len >= 2 || ws_has_tab {
                segments.push(&s[seg_start..start]);
                seg_start = idx;
            }
        }
    }
    if let Some(start) = ws_start {
        if ws_len >= 2 || ws_has_tab {
            segments.push(&s[seg_start..start]);
            seg_start = s.len();
        }
    }
    if seg_start < s.len() {
        segments.push(&s[seg_start..]);
    }
    segments
}

/// Turn one candidate row into a fully-populated [`Profile`].
///
/// `id` is the discovery-order position the caller intends for the record.
pub fn extract_profile(row: &RowRecord, id: u32) -> Result<Profile, ExtractError> {
    let link_text = row.name.trim();
    if link_text.is_empty() {
        return Err(ExtractError::MissingName);
    }
    let raw_url = row.url.trim();
    if raw_url.is_empty() {
        return Err(ExtractError::MissingUrl);
    }
    let url = Url::parse(raw_url).map_err(|source| ExtractError::InvalidUrl {
        url: raw_url.to_string(),
        source,
    })?;

    let info_lines: Vec<&str> = row.info.lines().map(str::trim).collect();
    let (title, name) = if info_lines.len() > 1 {
        (info_lines[0].to_string(), info_lines[1].to_string())
    } else {
        (link_text.to_string(), link_text.to_string())
    };
    let header = info_lines.get(2).map(|s| s.to_string()).unwrap_or_default();

    let field_label = row.field_label.trim().to_string();
    let specialty_label = row.specialty_label.trim().to_string();
    let keywords = listing_keywords(&row.info, &field_label, &specialty_label, &header);

    Ok(Profile {
        id,
        name,
        title,
        url,
        header,
        field_label,
        specialty_label,
        keywords,
        email: normalize_email(&row.email),
        photo_url: photo_or_default(row.photo_url.as_deref()),
    })
}

/// Keywords of a listing row live on the last info line, behind the label
/// texts. A line that merely echoes the header carries no keywords.
fn listing_keywords(info: &str, field_label: &str, specialty_label: &str, header: &str) -> Vec<String> {
    let label_text = format!("{field_label}   {specialty_label}");
    let stripped = info.replace(&label_text, "");
    let stripped = stripped
        .trim()
        .trim_start_matches([';', ':', ',', '.', ' ', '\u{000b}', '\n', '\t']);

    let Some(line) = stripped
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
    else {
        return Vec::new();
    };

    let header = header.trim();
    if header == line || line.contains(header) {
        return Vec::new();
    }

    line.split(';')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

/// Turn one graph node plus its optional detail fragment into a
/// [`Collaborator`].
///
/// A missing `url` or a missing detail record yields `deleted = true`
/// with the default photo; absent detail sub-fields resolve to empty
/// strings, never to an error.
pub fn extract_collaborator(
    label: &str,
    url: Option<Url>,
    detail: Option<&DetailRecord>,
    id: u32,
) -> Collaborator {
    let base_name = label.trim().to_string();

    let (Some(url), Some(detail)) = (url, detail) else {
        return Collaborator {
            id,
            name: base_name,
            url: None,
            deleted: true,
            title: String::new(),
            header: String::new(),
            field_label: String::new(),
            specialty_label: String::new(),
            keywords: Vec::new(),
            email: None,
            photo_url: DEFAULT_PHOTO_URL.to_string(),
            status: CollaboratorStatus::Completed,
        };
    };

    let info_lines: Vec<&str> = detail.info.lines().map(str::trim).collect();
    let (title, name) = if info_lines.len() > 1 {
        (info_lines[0].to_string(), info_lines[1].to_string())
    } else {
        (base_name.clone(), base_name.clone())
    };
    let header = info_lines.get(2).map(|s| s.to_string()).unwrap_or_default();

    let (field_label, specialty_label, keywords) = if detail.label_line.trim().is_empty() {
        (String::new(), String::new(), Vec::new())
    } else {
        let parsed = parse_labels_and_keywords(&detail.label_line);
        (parsed.field_label, parsed.specialty_label, parsed.keywords)
    };

    Collaborator {
        id,
        name,
        url: Some(url),
        deleted: false,
        title,
        header,
        field_label,
        specialty_label,
        keywords,
        email: normalize_email(&detail.email),
        photo_url: photo_or_default(detail.photo_url.as_deref()),
        status: CollaboratorStatus::Completed,
    }
}

/// Fallback record when a node's detail page could not be fetched: name
/// and url survive, everything else stays empty.
pub fn partial_collaborator(label: &str, url: Url, id: u32) -> Collaborator {
    Collaborator {
        id,
        name: label.trim().to_string(),
        url: Some(url),
        deleted: false,
        title: String::new(),
        header: String::new(),
        field_label: String::new(),
        specialty_label: String::new(),
        keywords: Vec::new(),
        email: None,
        photo_url: DEFAULT_PHOTO_URL.to_string(),
        status: CollaboratorStatus::Completed,
    }
}

/// Directory pages obfuscate addresses as `name[at]host`.
fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().replace("[at]", "@");
    if email.is_empty() {
        None
    } else {
        Some(email)
    }
}

fn photo_or_default(photo_url: Option<&str>) -> String {
    match photo_url {
        Some(src) if !src.trim().is_empty() => src.to_string(),
        _ => DEFAULT_PHOTO_URL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_line_with_two_labels_and_keywords() {
        let parsed = parse_labels_and_keywords("Fen Bilimleri   Biyoloji   kw1; kw2");
        assert_eq!(parsed.field_label, "Fen Bilimleri");
        assert_eq!(parsed.specialty_label, "Biyoloji");
        assert_eq!(parsed.keywords, vec!["kw1", "kw2"]);
    }

    #[test]
    fn label_line_with_single_segment_falls_back_to_placeholders() {
        let parsed = parse_labels_and_keywords("Fen Bilimleri");
        assert_eq!(parsed.field_label, "Fen Bilimleri");
        assert_eq!(parsed.specialty_label, "-");
        assert_eq!(parsed.keywords, vec!["-"]);
    }

    #[test]
    fn label_line_splits_on_tabs() {
        let parsed = parse_labels_and_keywords("Mühendislik\tBilgisayar\tyapay zeka; veri madenciliği");
        assert_eq!(parsed.field_label, "Mühendislik");
        assert_eq!(parsed.specialty_label, "Bilgisayar");
        assert_eq!(parsed.keywords, vec!["yapay zeka", "veri madenciliği"]);
    }

    #[test]
    fn label_line_keeps_single_spaces_inside_segments() {
        let parsed = parse_labels_and_keywords("Sosyal Bilimler  Tarih");
        assert_eq!(parsed.field_label, "Sosyal Bilimler");
        assert_eq!(parsed.specialty_label, "Tarih");
    }

    fn sample_row() -> RowRecord {
        RowRecord {
            name: "AYŞE YILMAZ".into(),
            url: "https://directory.example/profile/123".into(),
            info: "PROFESÖR\nAYŞE YILMAZ\nÖRNEK ÜNİVERSİTESİ/FEN FAKÜLTESİ\nFen Bilimleri   Biyoloji\nmikrobiyoloji; genetik".into(),
            field_label: "Fen Bilimleri".into(),
            specialty_label: "Biyoloji".into(),
            email: "ayse[at]example.edu".into(),
            photo_url: Some("https://directory.example/photos/123.jpg".into()),
        }
    }

    #[test]
    fn profile_fields_come_from_info_lines() {
        let profile = extract_profile(&sample_row(), 1).unwrap();
        assert_eq!(profile.id, 1);
        assert_eq!(profile.title, "PROFESÖR");
        assert_eq!(profile.name, "AYŞE YILMAZ");
        assert_eq!(profile.header, "ÖRNEK ÜNİVERSİTESİ/FEN FAKÜLTESİ");
        assert_eq!(profile.field_label, "Fen Bilimleri");
        assert_eq!(profile.specialty_label, "Biyoloji");
        assert_eq!(profile.keywords, vec!["mikrobiyoloji", "genetik"]);
    }

    #[test]
    fn profile_email_is_deobfuscated() {
        let profile = extract_profile(&sample_row(), 1).unwrap();
        assert_eq!(profile.email.as_deref(), Some("ayse@example.edu"));

        let mut row = sample_row();
        row.email = String::new();
        let profile = extract_profile(&row, 1).unwrap();
        assert_eq!(profile.email, None);
    }

    #[test]
    fn profile_without_link_fails() {
        let mut row = sample_row();
        row.url = "  ".into();
        assert!(matches!(
            extract_profile(&row, 1),
            Err(ExtractError::MissingUrl)
        ));

        let mut row = sample_row();
        row.name = String::new();
        assert!(matches!(
            extract_profile(&row, 1),
            Err(ExtractError::MissingName)
        ));
    }

    #[test]
    fn profile_photo_falls_back_to_default() {
        let mut row = sample_row();
        row.photo_url = None;
        let profile = extract_profile(&row, 1).unwrap();
        assert_eq!(profile.photo_url, DEFAULT_PHOTO_URL);
    }

    #[test]
    fn keywords_suppressed_when_last_line_echoes_header() {
        let mut row = sample_row();
        row.info = "PROFESÖR\nAYŞE YILMAZ\nÖRNEK ÜNİVERSİTESİ/FEN FAKÜLTESİ".into();
        let profile = extract_profile(&row, 1).unwrap();
        assert!(profile.keywords.is_empty());
    }

    #[test]
    fn collaborator_without_target_is_deleted() {
        let collaborator = extract_collaborator("MEHMET KAYA", None, None, 3);
        assert_eq!(collaborator.id, 3);
        assert_eq!(collaborator.name, "MEHMET KAYA");
        assert!(collaborator.deleted);
        assert_eq!(collaborator.url, None);
        assert_eq!(collaborator.photo_url, DEFAULT_PHOTO_URL);
        assert_eq!(collaborator.status, CollaboratorStatus::Completed);
    }

    #[test]
    fn collaborator_with_empty_detail_page_is_deleted() {
        let url = Url::parse("https://directory.example/profile/9").unwrap();
        let collaborator = extract_collaborator("MEHMET KAYA", Some(url), None, 1);
        assert!(collaborator.deleted);
        assert_eq!(collaborator.url, None);
    }

    #[test]
    fn collaborator_detail_fills_all_fields() {
        let url = Url::parse("https://directory.example/profile/9").unwrap();
        let detail = DetailRecord {
            info: "DOÇENT\nMEHMET KAYA\nBAŞKA ÜNİVERSİTESİ".into(),
            label_line: "Fen Bilimleri   Kimya   analitik kimya".into(),
            email: "mehmet[at]example.edu".into(),
            photo_url: None,
        };
        let collaborator = extract_collaborator("MEHMET KAYA", Some(url.clone()), Some(&detail), 2);
        assert!(!collaborator.deleted);
        assert_eq!(collaborator.url, Some(url));
        assert_eq!(collaborator.title, "DOÇENT");
        assert_eq!(collaborator.name, "MEHMET KAYA");
        assert_eq!(collaborator.header, "BAŞKA ÜNİVERSİTESİ");
        assert_eq!(collaborator.field_label, "Fen Bilimleri");
        assert_eq!(collaborator.specialty_label, "Kimya");
        assert_eq!(collaborator.keywords, vec!["analitik kimya"]);
        assert_eq!(collaborator.email.as_deref(), Some("mehmet@example.edu"));
        assert_eq!(collaborator.photo_url, DEFAULT_PHOTO_URL);
    }

    #[test]
    fn collaborator_detail_without_labels_resolves_to_empty_strings() {
        let url = Url::parse("https://directory.example/profile/9").unwrap();
        let detail = DetailRecord {
            info: "DOKTOR ÖĞRETİM ÜYESİ\nMEHMET KAYA".into(),
            ..Default::default()
        };
        let collaborator = extract_collaborator("MEHMET KAYA", Some(url), Some(&detail), 2);
        assert_eq!(collaborator.field_label, "");
        assert_eq!(collaborator.specialty_label, "");
        assert!(collaborator.keywords.is_empty());
    }

    #[test]
    fn partial_record_keeps_name_and_url_only() {
        let url = Url::parse("https://directory.example/profile/9").unwrap();
        let collaborator = partial_collaborator(" MEHMET KAYA ", url.clone(), 4);
        assert_eq!(collaborator.name, "MEHMET KAYA");
        assert_eq!(collaborator.url, Some(url));
        assert!(!collaborator.deleted);
        assert_eq!(collaborator.title, "");
        assert_eq!(collaborator.photo_url, DEFAULT_PHOTO_URL);
    }
}
