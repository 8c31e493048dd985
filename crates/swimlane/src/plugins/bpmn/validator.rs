//! Structural validation and in-place repair of BPMN documents
//!
//! Validation is deliberately shallow: it checks that a document has the
//! parts a viewer needs (namespaces, a collaboration, a process, a diagram
//! plane, a prolog). Missing collaboration or process is fatal and the
//! caller regenerates; everything else can be patched by [`repair`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Range;
use thiserror::Error;
use tracing::{debug, info, span, warn, Level};

use super::encoder::{BPMN_NAMESPACES, TARGET_NAMESPACE, XML_PROLOG};
use super::scanner::{local_name, tag_close, TagScanner, Token};

/// One structural problem found by [`validate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("missing namespace: {prefix} ({uri})")]
    MissingNamespace {
        prefix: &'static str,
        uri: &'static str,
    },

    #[error("missing collaboration")]
    MissingCollaboration,

    #[error("missing process")]
    MissingProcess,

    #[error("missing diagram plane")]
    MissingDiagramPlane,

    #[error("missing XML prolog")]
    MissingProlog,
}

impl ValidationIssue {
    /// Fatal issues cannot be patched; the document must be regenerated
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ValidationIssue::MissingCollaboration | ValidationIssue::MissingProcess
        )
    }
}

/// Result of validating one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn ok(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn is_fatal(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_fatal)
    }

    pub fn fatal_issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.is_fatal())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ok() {
            return write!(f, "ok");
        }
        let messages: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Change applied by [`repair`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    StrippedCodeFences,
    StrippedLeadingJunk,
    StrippedTrailingJunk,
    AddedProlog,
    AddedNamespace { prefix: &'static str },
    AddedTargetNamespace,
    RenamedDuplicate { from: String, to: String },
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Patch::StrippedCodeFences => write!(f, "stripped code fences"),
            Patch::StrippedLeadingJunk => write!(f, "stripped text before the document"),
            Patch::StrippedTrailingJunk => write!(f, "stripped text after the document"),
            Patch::AddedProlog => write!(f, "added XML prolog"),
            Patch::AddedNamespace { prefix } => write!(f, "declared namespace {}", prefix),
            Patch::AddedTargetNamespace => write!(f, "added targetNamespace"),
            Patch::RenamedDuplicate { from, to } => {
                write!(f, "renamed duplicate id '{}' to '{}'", from, to)
            }
        }
    }
}

/// Output of [`repair`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repaired {
    pub xml: String,
    pub patches: Vec<Patch>,
    /// Issues still present after patching
    pub residual: Vec<ValidationIssue>,
}

impl Repaired {
    pub fn ok(&self) -> bool {
        self.residual.is_empty()
    }
}

/// Attributes of the root element, or `None` when there is no element
fn root_element(xml: &str) -> Option<(usize, usize, Vec<(String, String)>)> {
    TagScanner::new(xml).find_map(|token| match token {
        Token::Start {
            name,
            attrs,
            offset,
            ..
        } => Some((
            offset,
            name.len(),
            attrs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )),
        _ => None,
    })
}

fn declares_namespace(attrs: &[(String, String)], uri: &str) -> bool {
    attrs
        .iter()
        .any(|(key, value)| (key == "xmlns" || key.starts_with("xmlns:")) && value == uri)
}

/// Check a document for the parts every BPMN viewer needs
pub fn validate(xml: &str) -> ValidationReport {
    let validate_span = span!(Level::INFO, "validate_bpmn", input_len = xml.len());
    let _enter = validate_span.enter();

    let mut issues = Vec::new();
    let root_attrs = root_element(xml).map(|(_, _, attrs)| attrs).unwrap_or_default();
    for (prefix, uri) in BPMN_NAMESPACES {
        if !declares_namespace(&root_attrs, uri) {
            issues.push(ValidationIssue::MissingNamespace { prefix, uri });
        }
    }

    let mut has_prolog = false;
    let mut has_collaboration = false;
    let mut has_process = false;
    let mut has_plane = false;
    for (index, token) in TagScanner::new(xml).enumerate() {
        match token {
            Token::Prolog if index == 0 => has_prolog = true,
            Token::Start { name, .. } => match local_name(name) {
                "collaboration" => has_collaboration = true,
                "process" => has_process = true,
                "BPMNPlane" => has_plane = true,
                _ => {}
            },
            _ => {}
        }
    }

    if !has_collaboration {
        issues.push(ValidationIssue::MissingCollaboration);
    }
    if !has_process {
        issues.push(ValidationIssue::MissingProcess);
    }
    if !has_plane {
        issues.push(ValidationIssue::MissingDiagramPlane);
    }
    if !has_prolog || !xml.starts_with("<?xml") {
        issues.push(ValidationIssue::MissingProlog);
    }

    let report = ValidationReport { issues };
    debug!(issue_count = report.issues.len(), fatal = report.is_fatal(), "Validation completed");
    report
}

/// Byte range of the `id` attribute value inside one start tag
///
/// Walks the attribute list so text inside quoted values never matches.
fn id_value_range(tag: &str) -> Option<Range<usize>> {
    let bytes = tag.as_bytes();
    let name_end = |from: usize| {
        (from..bytes.len())
            .find(|&i| bytes[i].is_ascii_whitespace() || matches!(bytes[i], b'=' | b'/' | b'>'))
            .unwrap_or(bytes.len())
    };
    let skip_ws = |from: usize| {
        (from..bytes.len())
            .find(|&i| !bytes[i].is_ascii_whitespace())
            .unwrap_or(bytes.len())
    };

    // Element name
    let mut i = name_end(usize::from(bytes.first() == Some(&b'<')));
    loop {
        i = skip_ws(i);
        if i >= bytes.len() || matches!(bytes[i], b'/' | b'>') {
            return None;
        }
        let key_start = i;
        i = name_end(i);
        if i == key_start {
            // Stray `=` or similar; step over it
            i += 1;
            continue;
        }
        let key = &tag[key_start..i];
        i = skip_ws(i);
        if bytes.get(i) != Some(&b'=') {
            continue;
        }
        i = skip_ws(i + 1);
        let quote = match bytes.get(i) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => continue,
        };
        let value_start = i + 1;
        let value_end = value_start + bytes[value_start..].iter().position(|&b| b == quote)?;
        if key == "id" {
            return Some(value_start..value_end);
        }
        i = value_end + 1;
    }
}

/// Rename every repeated `id` to `{id}_dup{n}`
fn rename_duplicates(xml: &str, patches: &mut Vec<Patch>) -> String {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();

    let tags: Vec<(usize, String)> = TagScanner::new(xml)
        .filter_map(|token| match &token {
            Token::Start { offset, .. } => token.attr("id").map(|id| (*offset, id.to_string())),
            _ => None,
        })
        .collect();
    let all_ids: HashSet<&str> = tags.iter().map(|(_, id)| id.as_str()).collect();

    let mut taken: HashSet<String> = HashSet::new();
    for (offset, id) in &tags {
        let count = seen.entry(id.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            continue;
        }
        let Some(close) = tag_close(xml, *offset) else {
            continue;
        };
        let Some(range) = id_value_range(&xml[*offset..close]) else {
            continue;
        };
        let mut n = *count - 1;
        let mut renamed = format!("{}_dup{}", id, n);
        while all_ids.contains(renamed.as_str()) || taken.contains(&renamed) {
            n += 1;
            renamed = format!("{}_dup{}", id, n);
        }
        taken.insert(renamed.clone());
        warn!(from = %id, to = %renamed, "Renaming duplicate id");
        patches.push(Patch::RenamedDuplicate {
            from: id.clone(),
            to: renamed.clone(),
        });
        let absolute = offset + range.start..offset + range.end;
        edits.push((absolute, htmlize::escape_attribute(renamed.as_str()).into_owned()));
    }

    let mut out = xml.to_string();
    for (range, replacement) in edits.into_iter().rev() {
        out.replace_range(range, &replacement);
    }
    out
}

/// Patch every non-fatal issue in place and validate again
///
/// Fatal issues are left alone and come back in `residual`; callers
/// regenerate in that case.
pub fn repair(xml: &str) -> Repaired {
    let repair_span = span!(Level::INFO, "repair_bpmn", input_len = xml.len());
    let _enter = repair_span.enter();

    let mut patches = Vec::new();

    let mut text = xml.to_string();
    if text.lines().any(|line| line.trim_start().starts_with("```")) {
        text = text
            .lines()
            .filter(|line| !line.trim_start().starts_with("```"))
            .collect::<Vec<_>>()
            .join("\n");
        patches.push(Patch::StrippedCodeFences);
    }

    match text.find('<') {
        Some(0) => {}
        Some(start) => {
            text.drain(..start);
            patches.push(Patch::StrippedLeadingJunk);
        }
        None => {}
    }
    if let Some(end) = text.rfind('>') {
        if !text[end + 1..].trim().is_empty() {
            text.truncate(end + 1);
            patches.push(Patch::StrippedTrailingJunk);
        }
    }

    if !text.starts_with("<?xml") {
        text = format!("{}\n{}", XML_PROLOG, text);
        patches.push(Patch::AddedProlog);
    }

    if let Some((offset, name_len, attrs)) = root_element(&text) {
        let mut injected = String::new();
        for (prefix, uri) in BPMN_NAMESPACES {
            if !declares_namespace(&attrs, uri) {
                let key = format!("xmlns:{}", prefix);
                if attrs.iter().any(|(k, _)| *k == key) {
                    // Prefix bound to a different URI; leave it to the author
                    continue;
                }
                injected.push_str(&format!(" {}=\"{}\"", key, uri));
                patches.push(Patch::AddedNamespace { prefix });
            }
        }
        if !attrs.iter().any(|(k, _)| k == "targetNamespace") {
            injected.push_str(&format!(" targetNamespace=\"{}\"", TARGET_NAMESPACE));
            patches.push(Patch::AddedTargetNamespace);
        }
        if !injected.is_empty() {
            text.insert_str(offset + 1 + name_len, &injected);
        }
    }

    let text = rename_duplicates(&text, &mut patches);

    let residual = validate(&text).issues;
    for issue in &residual {
        warn!(%issue, "Issue remains after repair");
    }
    info!(
        patch_count = patches.len(),
        residual_count = residual.len(),
        "Repair completed"
    );
    Repaired {
        xml: text,
        patches,
        residual,
    }
}
